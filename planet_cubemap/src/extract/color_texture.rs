/// Pixel extraction into a uniform 8-bit color buffer.
///
/// Two sources are supported:
///
/// - **Texture2D**: the first mip level is copied directly from memory
/// - **RenderTarget**: pixels are read back from the device, either as
///   8-bit colors (8-bit formats) or as linear floats quantized to 8 bits
///   (`R16G16B16A16_SFLOAT`, no sRGB encoding)
///
/// Extraction never needs to fail the caller: the `*_or_placeholder`
/// variants log the error and return a 1x1 transparent buffer instead.

use crate::error::{Error, Result};
use crate::device::{Color, RenderTarget, Texture2D, TextureFormat};

/// Row-major 8-bit color buffer extracted from a texture or render target
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTexture {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    placeholder: bool,
}

impl ColorTexture {
    /// Build a color texture from row-major pixels
    ///
    /// # Errors
    ///
    /// Returns `UnreadableSource` if `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected || expected == 0 {
            return Err(Error::UnreadableSource(format!(
                "{} pixels for a {}x{} texture", pixels.len(), width, height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            placeholder: false,
        })
    }

    /// The 1x1 transparent buffer returned when a source cannot be read
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![Color::TRANSPARENT],
            placeholder: true,
        }
    }

    /// Copy the first mip level of a static texture
    ///
    /// # Errors
    ///
    /// - `UnreadableSource` if the texture has no mip data or too few bytes
    /// - `UnsupportedFormat` if the format is not 8 bits per channel
    pub fn from_texture(texture: &Texture2D) -> Result<Self> {
        let data = match texture.mip(0) {
            Some(data) if !data.is_empty() => data,
            _ => {
                return Err(Error::UnreadableSource(format!(
                    "texture '{}' has no mip data", texture.name()
                )));
            }
        };

        let expected = texture.width() as usize * texture.height() as usize * 4;
        if texture.format().is_8bit() && data.len() < expected {
            return Err(Error::UnreadableSource(format!(
                "texture '{}' holds {} bytes, expected {}", texture.name(), data.len(), expected
            )));
        }

        let pixels = match texture.format() {
            TextureFormat::B8G8R8A8_UNORM => bytemuck::cast_slice::<u8, Color>(&data[..expected]).to_vec(),
            TextureFormat::R8G8B8A8_UNORM => data[..expected]
                .chunks_exact(4)
                .map(|c| Color::new(c[0], c[1], c[2], c[3]))
                .collect(),
            format => return Err(Error::UnsupportedFormat(format)),
        };

        Self::new(texture.width(), texture.height(), pixels)
    }

    /// Read back the pixels of a render target (blocks until the transfer completes)
    ///
    /// # Errors
    ///
    /// - `UnreadableSource` if the target is released or the readback fails
    /// - `UnsupportedFormat` for formats other than 8-bit and RGBA16F
    pub fn from_render_target(target: &dyn RenderTarget) -> Result<Self> {
        let info = target.info();
        if target.is_released() {
            return Err(Error::UnreadableSource(format!(
                "render target '{}' has been released", info.name
            )));
        }

        let readback = match info.format {
            TextureFormat::B8G8R8A8_UNORM | TextureFormat::R8G8B8A8_UNORM => target.read_pixels(),
            TextureFormat::R16G16B16A16_SFLOAT => target
                .read_linear_pixels()
                .map(|linear| linear.into_iter().map(Color::from_linear).collect()),
            format => return Err(Error::UnsupportedFormat(format)),
        };

        let pixels = readback.map_err(|err| match err {
            Error::UnsupportedFormat(format) => Error::UnsupportedFormat(format),
            other => Error::UnreadableSource(format!(
                "readback of '{}' failed: {}", info.name, other
            )),
        })?;

        Self::new(info.width, info.height, pixels)
    }

    /// Same as `from_texture`, degrading to the placeholder on error
    pub fn from_texture_or_placeholder(texture: &Texture2D) -> Self {
        Self::or_placeholder(texture.name(), Self::from_texture(texture))
    }

    /// Same as `from_render_target`, degrading to the placeholder on error
    pub fn from_render_target_or_placeholder(target: &dyn RenderTarget) -> Self {
        Self::or_placeholder(&target.info().name, Self::from_render_target(target))
    }

    fn or_placeholder(name: &str, result: Result<Self>) -> Self {
        match result {
            Ok(texture) => texture,
            Err(err) => {
                crate::engine_warn!("planet::ColorTexture",
                    "Extraction of '{}' failed, using 1x1 placeholder: {}", name, err);
                Self::placeholder()
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixels (`index = y * width + x`)
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// True if this buffer stands in for a source that could not be read
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

#[cfg(test)]
#[path = "color_texture_tests.rs"]
mod tests;
