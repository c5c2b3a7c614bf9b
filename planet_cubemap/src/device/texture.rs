/// Pixel formats, 8-bit colors, texture settings, and static textures

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

// ===== FORMATS =====

/// Pixel format of a texture or render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    B8G8R8A8_UNORM,
    R8G8B8A8_UNORM,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,
    R32_SFLOAT,
}

impl TextureFormat {
    /// Size of one pixel in bytes
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            TextureFormat::B8G8R8A8_UNORM => 4,
            TextureFormat::R8G8B8A8_UNORM => 4,
            TextureFormat::R16G16B16A16_SFLOAT => 8,
            TextureFormat::R32G32B32A32_SFLOAT => 16,
            TextureFormat::R32_SFLOAT => 4,
        }
    }

    /// Returns true for 8 bits per channel formats
    pub fn is_8bit(&self) -> bool {
        matches!(self, TextureFormat::B8G8R8A8_UNORM | TextureFormat::R8G8B8A8_UNORM)
    }
}

/// Mip chain generation for a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MipGenSettings {
    /// Use the texture group default (render targets: no mips)
    #[default]
    FromTextureGroup,
    /// Full mip chain down to 1x1
    Simple,
    /// Single level
    NoMipmaps,
}

impl MipGenSettings {
    /// Number of mip levels for the given dimensions
    pub fn mip_levels(&self, width: u32, height: u32) -> u32 {
        match self {
            MipGenSettings::FromTextureGroup | MipGenSettings::NoMipmaps => 1,
            MipGenSettings::Simple => 32 - width.max(height).max(1).leading_zeros(),
        }
    }
}

/// Compression applied when a render target is sampled as a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureCompression {
    #[default]
    Default,
    Grayscale,
    Displacementmap,
    Hdr,
    Masks,
}

// ===== COLOR =====

/// 8-bit color stored in BGRA byte order
///
/// The memory layout matches `TextureFormat::B8G8R8A8_UNORM`, so a BGRA8
/// readback can be cast directly into a `[Color]` slice.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color { b: 0, g: 0, r: 0, a: 0 };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Quantize a linear color to 8 bits per channel.
    ///
    /// No sRGB encoding is applied: each channel is clamped to [0, 1]
    /// and mapped with `floor(v * 255.999)`.
    pub fn from_linear(color: Vec4) -> Self {
        let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.999;
        Self::new(c.x as u8, c.y as u8, c.z as u8, c.w as u8)
    }

    /// Expand to a linear color in [0, 1]
    pub fn to_linear(&self) -> Vec4 {
        Vec4::new(self.r as f32, self.g as f32, self.b as f32, self.a as f32) / 255.0
    }
}

// ===== STATIC TEXTURE =====

/// CPU-side texture with a mip chain (mip 0 first)
///
/// This is the static counterpart of a render target: its pixel data is
/// already resident in memory and can be copied without a GPU readback.
#[derive(Debug, Clone)]
pub struct Texture2D {
    name: String,
    width: u32,
    height: u32,
    format: TextureFormat,
    mips: Vec<Vec<u8>>,
}

impl Texture2D {
    /// Create a texture with a single mip level
    pub fn new(name: impl Into<String>, width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        Self::with_mips(name, width, height, format, vec![data])
    }

    /// Create a texture with an explicit mip chain
    pub fn with_mips(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: TextureFormat,
        mips: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            mips,
        }
    }

    /// Create a BGRA8 texture from colors
    pub fn from_colors(name: impl Into<String>, width: u32, height: u32, colors: &[Color]) -> Self {
        let data = bytemuck::cast_slice::<Color, u8>(colors).to_vec();
        Self::new(name, width, height, TextureFormat::B8G8R8A8_UNORM, data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn mip_count(&self) -> usize {
        self.mips.len()
    }

    /// Raw bytes of a mip level
    pub fn mip(&self, level: usize) -> Option<&[u8]> {
        self.mips.get(level).map(|data| data.as_slice())
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
