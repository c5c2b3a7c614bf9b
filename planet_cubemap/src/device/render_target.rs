/// RenderTarget trait, render target descriptor, and render target info

use glam::Vec4;
use crate::error::Result;
use super::texture::{Color, MipGenSettings, TextureCompression, TextureFormat};

/// Render target layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTargetKind {
    /// Single 2D image
    Tex2D,
    /// Six square faces forming a cubemap
    Cube,
}

/// Descriptor for creating a render target
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDesc {
    /// Debug name (the cache key for cached targets)
    pub name: String,
    /// 2D or cube layout
    pub kind: RenderTargetKind,
    /// Width in pixels (cube: face size)
    pub width: u32,
    /// Height in pixels (cube: height of the equirectangular source, width / 2)
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// High dynamic range target
    pub hdr: bool,
    /// Compression used when sampled
    pub compression: TextureCompression,
    /// Mip chain generation
    pub mip_gen: MipGenSettings,
    /// Initial contents and clear color (linear)
    pub clear_color: Vec4,
}

impl RenderTargetDesc {
    /// Descriptor for a plain 2D target
    pub fn tex_2d(name: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            name: name.into(),
            kind: RenderTargetKind::Tex2D,
            width,
            height,
            format,
            hdr: !format.is_8bit(),
            compression: TextureCompression::Default,
            mip_gen: MipGenSettings::NoMipmaps,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

/// Read-only properties of a created render target
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetInfo {
    pub name: String,
    pub kind: RenderTargetKind,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub hdr: bool,
    pub compression: TextureCompression,
    pub mip_levels: u32,
    pub clear_color: Vec4,
}

impl RenderTargetInfo {
    pub fn from_desc(desc: &RenderTargetDesc) -> Self {
        Self {
            name: desc.name.clone(),
            kind: desc.kind,
            width: desc.width,
            height: desc.height,
            format: desc.format,
            hdr: desc.hdr,
            compression: desc.compression,
            mip_levels: desc.mip_gen.mip_levels(desc.width, desc.height),
            clear_color: desc.clear_color,
        }
    }

    /// Number of pixels in the 2D image (width * height)
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_cube(&self) -> bool {
        self.kind == RenderTargetKind::Cube
    }
}

/// Render target resource trait
///
/// Implemented by backend-specific render targets. The GPU memory is
/// freed by `release()` or, at the latest, when the target is dropped.
pub trait RenderTarget: Send + Sync {
    /// Get the read-only properties of this render target
    fn info(&self) -> &RenderTargetInfo;

    /// Synchronous 8-bit readback (8-bit formats only), row-major
    fn read_pixels(&self) -> Result<Vec<Color>>;

    /// Synchronous linear float readback, row-major
    fn read_linear_pixels(&self) -> Result<Vec<Vec4>>;

    /// Replace the contents with raw bytes in the target's format
    fn write_pixels(&mut self, data: &[u8]) -> Result<()>;

    /// Free the GPU memory (idempotent)
    fn release(&mut self);

    /// Returns true once the GPU memory has been freed
    fn is_released(&self) -> bool;
}
