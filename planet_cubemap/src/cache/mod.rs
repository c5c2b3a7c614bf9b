//! Render target cache module
//!
//! Provides keyed creation and lookup of render targets, the planet
//! resource pairing of a 2D target with its cube target, and memoized
//! heightfields derived from render target pixels.

mod config;
mod render_target_store;
mod texture_cache;

pub use config::{CacheCategories, CacheConfig, PlanetResource, ValidityCheck};
pub use render_target_store::{CachedRenderTarget, RenderTargetHandle, RenderTargetStore};
pub use texture_cache::TextureCache;
