/// In-memory graphics device (no GPU required)
///
/// Stores render target pixels as raw bytes in the target's own format,
/// so readbacks go through the same decoding paths a GPU backend would
/// need. Used for headless processing and by the test suite.

use std::sync::{Arc, Mutex};
use glam::Vec4;
use half::f16;
use crate::error::{Error, Result};
use crate::engine_bail;
use super::graphics_device::GraphicsDevice;
use super::render_target::{RenderTarget, RenderTargetDesc, RenderTargetInfo, RenderTargetKind};
use super::texture::{Color, TextureFormat};

// ============================================================================
// Configuration and statistics
// ============================================================================

/// In-memory device configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryDeviceConfig {
    /// Maximum bytes of live render target memory (None = unlimited)
    pub memory_budget: Option<u64>,
}

/// Allocation and readback counters, shared between the device and its targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryDeviceStats {
    /// Render targets holding memory right now
    pub live_targets: u32,
    /// Bytes held by live render targets
    pub allocated_bytes: u64,
    /// Render targets created since the device was built
    pub created_targets: u32,
    /// Render targets released since the device was built
    pub released_targets: u32,
    /// Successful pixel readbacks
    pub readbacks: u32,
}

// ============================================================================
// Memory Render Target
// ============================================================================

/// Render target backed by a byte vector
#[derive(Debug)]
pub struct MemoryRenderTarget {
    info: RenderTargetInfo,
    data: Vec<u8>,
    released: bool,
    stats: Arc<Mutex<MemoryDeviceStats>>,
}

impl MemoryRenderTarget {
    fn allocation_size(desc: &RenderTargetDesc) -> u64 {
        let bpp = desc.format.bytes_per_pixel() as u64;
        match desc.kind {
            RenderTargetKind::Tex2D => desc.width as u64 * desc.height as u64 * bpp,
            RenderTargetKind::Cube => 6 * desc.width as u64 * desc.width as u64 * bpp,
        }
    }

    fn check_readable(&self) -> Result<()> {
        if self.released {
            return Err(Error::InvalidResource(format!(
                "render target '{}' has been released", self.info.name
            )));
        }
        if self.info.is_cube() {
            return Err(Error::InvalidResource(format!(
                "cube render target '{}' cannot be read back", self.info.name
            )));
        }
        Ok(())
    }

    fn count_readback(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.readbacks += 1;
        }
    }
}

impl RenderTarget for MemoryRenderTarget {
    fn info(&self) -> &RenderTargetInfo {
        &self.info
    }

    fn read_pixels(&self) -> Result<Vec<Color>> {
        self.check_readable()?;
        let pixels = match self.info.format {
            TextureFormat::B8G8R8A8_UNORM => bytemuck::cast_slice::<u8, Color>(&self.data).to_vec(),
            TextureFormat::R8G8B8A8_UNORM => self.data
                .chunks_exact(4)
                .map(|c| Color::new(c[0], c[1], c[2], c[3]))
                .collect(),
            format => return Err(Error::UnsupportedFormat(format)),
        };
        self.count_readback();
        Ok(pixels)
    }

    fn read_linear_pixels(&self) -> Result<Vec<Vec4>> {
        self.check_readable()?;
        let bpp = self.info.format.bytes_per_pixel();
        let pixels = self.data
            .chunks_exact(bpp)
            .map(|chunk| decode_pixel(self.info.format, chunk))
            .collect();
        self.count_readback();
        Ok(pixels)
    }

    fn write_pixels(&mut self, data: &[u8]) -> Result<()> {
        if self.released {
            return Err(Error::InvalidResource(format!(
                "render target '{}' has been released", self.info.name
            )));
        }
        if data.len() != self.data.len() {
            engine_bail!("planet::MemoryRenderTarget",
                "Upload of {} bytes into '{}' which holds {} bytes",
                data.len(), self.info.name, self.data.len());
        }
        self.data.copy_from_slice(data);
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let bytes = self.data.len() as u64;
        self.data = Vec::new();
        if let Ok(mut stats) = self.stats.lock() {
            stats.live_targets = stats.live_targets.saturating_sub(1);
            stats.allocated_bytes = stats.allocated_bytes.saturating_sub(bytes);
            stats.released_targets += 1;
        }
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for MemoryRenderTarget {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// Pixel encoding
// ============================================================================

/// Encode one linear color into the byte layout of `format`
pub fn encode_pixel(format: TextureFormat, color: Vec4) -> Vec<u8> {
    match format {
        TextureFormat::B8G8R8A8_UNORM => {
            let c = Color::from_linear(color);
            vec![c.b, c.g, c.r, c.a]
        }
        TextureFormat::R8G8B8A8_UNORM => {
            let c = Color::from_linear(color);
            vec![c.r, c.g, c.b, c.a]
        }
        TextureFormat::R16G16B16A16_SFLOAT => color
            .to_array()
            .iter()
            .flat_map(|v| f16::from_f32(*v).to_le_bytes())
            .collect(),
        TextureFormat::R32G32B32A32_SFLOAT => color
            .to_array()
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect(),
        TextureFormat::R32_SFLOAT => color.x.to_le_bytes().to_vec(),
    }
}

/// Decode one pixel from the byte layout of `format` into a linear color
pub fn decode_pixel(format: TextureFormat, bytes: &[u8]) -> Vec4 {
    match format {
        TextureFormat::B8G8R8A8_UNORM => Color::new(bytes[2], bytes[1], bytes[0], bytes[3]).to_linear(),
        TextureFormat::R8G8B8A8_UNORM => Color::new(bytes[0], bytes[1], bytes[2], bytes[3]).to_linear(),
        TextureFormat::R16G16B16A16_SFLOAT => {
            let channel = |i: usize| f16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]).to_f32();
            Vec4::new(channel(0), channel(1), channel(2), channel(3))
        }
        TextureFormat::R32G32B32A32_SFLOAT => {
            let channel = |i: usize| {
                f32::from_le_bytes([bytes[i * 4], bytes[i * 4 + 1], bytes[i * 4 + 2], bytes[i * 4 + 3]])
            };
            Vec4::new(channel(0), channel(1), channel(2), channel(3))
        }
        TextureFormat::R32_SFLOAT => {
            let r = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            Vec4::new(r, 0.0, 0.0, 1.0)
        }
    }
}

// ============================================================================
// Memory Graphics Device
// ============================================================================

/// Graphics device allocating render targets in system memory
pub struct MemoryGraphicsDevice {
    config: MemoryDeviceConfig,
    stats: Arc<Mutex<MemoryDeviceStats>>,
}

impl MemoryGraphicsDevice {
    /// Create a device with an unlimited memory budget
    pub fn new() -> Self {
        Self::with_config(MemoryDeviceConfig::default())
    }

    pub fn with_config(config: MemoryDeviceConfig) -> Self {
        Self {
            config,
            stats: Arc::new(Mutex::new(MemoryDeviceStats::default())),
        }
    }

    /// Snapshot of the allocation counters
    pub fn stats(&self) -> MemoryDeviceStats {
        self.stats.lock().map(|stats| *stats).unwrap_or_default()
    }
}

impl Default for MemoryGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MemoryGraphicsDevice {
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<Box<dyn RenderTarget>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidDimensions { width: desc.width, height: desc.height });
        }

        let size = MemoryRenderTarget::allocation_size(desc);
        let mut stats = match self.stats.lock() {
            Ok(stats) => stats,
            Err(_) => engine_bail!("planet::MemoryGraphicsDevice", "Device statistics lock poisoned"),
        };
        if let Some(budget) = self.config.memory_budget {
            if stats.allocated_bytes + size > budget {
                return Err(Error::OutOfMemory);
            }
        }

        let pixel = encode_pixel(desc.format, desc.clear_color);
        let data = pixel.repeat(size as usize / pixel.len());

        stats.live_targets += 1;
        stats.created_targets += 1;
        stats.allocated_bytes += size;
        drop(stats);

        Ok(Box::new(MemoryRenderTarget {
            info: RenderTargetInfo::from_desc(desc),
            data,
            released: false,
            stats: Arc::clone(&self.stats),
        }))
    }
}

#[cfg(test)]
#[path = "memory_device_tests.rs"]
mod tests;
