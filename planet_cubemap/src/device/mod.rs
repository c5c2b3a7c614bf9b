/// Graphics device module - render target types and the device seam

pub mod graphics_device;
pub mod render_target;
pub mod texture;
pub mod memory_device;

pub use graphics_device::*;
pub use render_target::*;
pub use texture::*;
pub use memory_device::{
    MemoryGraphicsDevice, MemoryRenderTarget,
    MemoryDeviceConfig, MemoryDeviceStats,
    encode_pixel, decode_pixel,
};
