/// GraphicsDevice trait - render target factory interface

use crate::error::Result;
use super::render_target::{RenderTarget, RenderTargetDesc};

/// Graphics device trait
///
/// The factory for GPU render targets. Implemented by backends (a GPU
/// renderer, or `MemoryGraphicsDevice` for headless use). Caches hold
/// a weak reference to the device: once the device is dropped, creation
/// fails with `Error::InvalidContext`.
pub trait GraphicsDevice: Send + Sync {
    /// Create a render target
    ///
    /// # Arguments
    ///
    /// * `desc` - Render target descriptor
    ///
    /// # Returns
    ///
    /// The created render target, exclusively owned by the caller
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<Box<dyn RenderTarget>>;
}
