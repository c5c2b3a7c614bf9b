/// Scalar heightfield derived from one color channel.

use crate::device::Color;
use super::color_texture::ColorTexture;

/// Color channel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    /// Pick this channel's byte out of a color
    pub fn select(&self, color: Color) -> u8 {
        match self {
            Channel::R => color.r,
            Channel::G => color.g,
            Channel::B => color.b,
            Channel::A => color.a,
        }
    }
}

/// Map an 8-bit value to [0, 1]
#[inline]
pub fn u8_to_unit(value: u8) -> f32 {
    value as f32 / 255.0
}

/// Dense row-major grid of floats (`index = y * width + x`)
///
/// The minimum and maximum are tracked at construction so terrain
/// consumers can normalize or bound their sampling without a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightfield {
    width: u32,
    height: u32,
    values: Vec<f32>,
    min: f32,
    max: f32,
}

impl Heightfield {
    /// Convert one channel of a color texture, normalized with `v / 255`
    ///
    /// The grid has exactly the dimensions of the source; no resampling.
    pub fn from_channel(texture: &ColorTexture, channel: Channel) -> Self {
        let width = texture.width() as usize;
        let height = texture.height() as usize;
        let pixels = texture.pixels();

        let mut values = vec![0.0; width * height];
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for y in 0..height {
            for x in 0..width {
                let index = y * width + x;
                let value = u8_to_unit(channel.select(pixels[index]));
                min = min.min(value);
                max = max.max(value);
                values[index] = value;
            }
        }

        Self {
            width: texture.width(),
            height: texture.height(),
            values,
            min,
            max,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn value(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Smallest value in the grid
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Largest value in the grid
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Bilinear sample at pixel coordinates, clamped to the grid edges
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = x - x0 as f32;
        let ty = y - y0 as f32;

        let at = |x: u32, y: u32| self.values[y as usize * self.width as usize + x as usize];
        let top = at(x0, y0) + (at(x1, y0) - at(x0, y0)) * tx;
        let bottom = at(x0, y1) + (at(x1, y1) - at(x0, y1)) * tx;
        top + (bottom - top) * ty
    }
}

#[cfg(test)]
#[path = "heightfield_tests.rs"]
mod tests;
