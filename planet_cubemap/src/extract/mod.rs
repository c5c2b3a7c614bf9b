//! Pixel extraction module
//!
//! Reads pixels out of textures and render targets into a uniform 8-bit
//! buffer, and converts a color channel of that buffer into a heightfield.

mod color_texture;
mod heightfield;

pub use color_texture::ColorTexture;
pub use heightfield::{Channel, Heightfield, u8_to_unit};
