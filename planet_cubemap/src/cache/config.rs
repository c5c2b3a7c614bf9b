/// Cache configuration and planet resource token.

use bitflags::bitflags;
use glam::Vec4;
use crate::device::{MipGenSettings, TextureCompression, TextureFormat};

/// How a released planet resource is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidityCheck {
    /// Release removes the entries; a resource is valid while both entries exist
    Existence,
    /// Release keeps the entries but clears their flags; a resource is valid
    /// while both entries exist and are unreleased
    #[default]
    ValidFlag,
}

/// TextureCache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Validity semantics for planet resources
    pub validity: ValidityCheck,
    /// Format of the equirectangular 2D target of a planet resource
    pub planet_texture_format: TextureFormat,
    /// Clear color of planet targets (linear)
    pub clear_color: Vec4,
    /// HDR flag of planet cube targets
    pub cube_hdr: bool,
    /// Mip setting of planet cube targets
    pub cube_mip_gen: MipGenSettings,
    /// Compression of planet cube targets
    pub cube_compression: TextureCompression,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            validity: ValidityCheck::default(),
            planet_texture_format: TextureFormat::R16G16B16A16_SFLOAT,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            cube_hdr: true,
            cube_mip_gen: MipGenSettings::NoMipmaps,
            cube_compression: TextureCompression::Default,
        }
    }
}

bitflags! {
    /// Cache tables affected by `TextureCache::clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CacheCategories: u32 {
        /// Render targets (GPU memory is released)
        const RENDER_TARGETS = 1 << 0;
        /// Heightfields and the color textures they are derived from
        const HEIGHTFIELDS = 1 << 1;
    }
}

impl CacheCategories {
    /// Categories selected by the two "only" flags; both false selects everything
    pub fn from_flags(render_targets_only: bool, heightfields_only: bool) -> Self {
        if !render_targets_only && !heightfields_only {
            return Self::all();
        }
        let mut categories = Self::empty();
        categories.set(Self::RENDER_TARGETS, render_targets_only);
        categories.set(Self::HEIGHTFIELDS, heightfields_only);
        categories
    }
}

/// Lookup token for a planet: an equirectangular 2D target and its cube target
///
/// The token owns nothing; the targets live in the `TextureCache`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanetResource {
    pub cubemap_key: String,
    pub texture_key: String,
}

impl PlanetResource {
    pub fn new(cubemap_key: impl Into<String>, texture_key: impl Into<String>) -> Self {
        Self {
            cubemap_key: cubemap_key.into(),
            texture_key: texture_key.into(),
        }
    }
}
