/// Texture cache: render target factory and derived data caches.
///
/// Owns three tables keyed by the caller's string keys:
///
/// - **Render targets**: created on first request, memoized until released
/// - **Color textures**: pixels read back from a render target (one readback per key)
/// - **Heightfields**: one channel of a color texture as floats
///
/// Derived entries are never recomputed while they are cached, even if the
/// render target is drawn into again. They are dropped when the key's render
/// target is re-allocated, or explicitly through `clear`.
///
/// The cache is bound to the thread that created it (`!Send`, `!Sync`).

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, Weak};
use glam::Vec4;
use rustc_hash::FxHashMap;
use crate::device::{
    GraphicsDevice, MipGenSettings, RenderTarget, RenderTargetDesc, RenderTargetKind,
    Texture2D, TextureCompression, TextureFormat,
};
use crate::error::{Error, Result};
use crate::extract::{Channel, ColorTexture, Heightfield};
use crate::{engine_debug, engine_err, engine_info, engine_warn};
use super::config::{CacheCategories, CacheConfig, PlanetResource, ValidityCheck};
use super::render_target_store::{CachedRenderTarget, RenderTargetHandle, RenderTargetStore};

const SOURCE: &str = "planet::TextureCache";

/// Source a derived entry was extracted from
///
/// Render targets and static textures live in separate namespaces, so a
/// texture named like a render target key never shares its cached data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DerivedKey {
    RenderTarget(String),
    Texture(String),
}

impl DerivedKey {
    fn name(&self) -> &str {
        match self {
            DerivedKey::RenderTarget(name) | DerivedKey::Texture(name) => name,
        }
    }
}

/// Memoized heightfield with the channel it was built from
struct CachedHeightfield {
    channel: Channel,
    heightfield: Arc<Heightfield>,
}

/// Keyed cache of render targets and the data derived from them
pub struct TextureCache {
    /// Graphics device used for creation (weak: the cache does not keep it alive)
    device: Weak<Mutex<dyn GraphicsDevice>>,
    config: CacheConfig,
    render_targets: RenderTargetStore,
    color_textures: FxHashMap<DerivedKey, Arc<ColorTexture>>,
    heightfields: FxHashMap<DerivedKey, CachedHeightfield>,
    _thread_affinity: PhantomData<*const ()>,
}

impl TextureCache {
    /// Create an empty cache bound to `device` and the calling thread
    pub fn new(device: &Arc<Mutex<dyn GraphicsDevice>>, config: CacheConfig) -> Self {
        Self {
            device: Arc::downgrade(device),
            config,
            render_targets: RenderTargetStore::new(),
            color_textures: FxHashMap::default(),
            heightfields: FxHashMap::default(),
            _thread_affinity: PhantomData,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // ===== RENDER TARGET FACTORY =====

    /// Return the valid render target under `desc.name`, or create it
    ///
    /// Returns the handle and whether the target already existed. An existing
    /// target is returned as is, even if `desc` differs from its creation
    /// parameters.
    ///
    /// # Errors
    ///
    /// - `InvalidDimensions` if width or height is zero
    /// - `InvalidContext` if the graphics device has been dropped
    /// - Any device error (e.g. `OutOfMemory`)
    pub fn get_or_create(&mut self, desc: RenderTargetDesc) -> Result<(RenderTargetHandle, bool)> {
        let device = &self.device;
        let (handle, existed) = self.render_targets.get_or_create(&desc.name, || {
            if desc.width == 0 || desc.height == 0 {
                return Err(Error::InvalidDimensions { width: desc.width, height: desc.height });
            }
            create_with_device(device, &desc)
        })?;

        if existed {
            if let Some(entry) = self.render_targets.get(handle) {
                let info = entry.info();
                if info.width != desc.width || info.height != desc.height || info.format != desc.format {
                    engine_warn!(SOURCE,
                        "Render target '{}' reused as {}x{} {:?} (requested {}x{} {:?})",
                        desc.name, info.width, info.height, info.format,
                        desc.width, desc.height, desc.format);
                }
            }
        } else {
            self.drop_derived(&desc.name);
            engine_debug!(SOURCE, "Created {:?} render target '{}' ({}x{} {:?})",
                desc.kind, desc.name, desc.width, desc.height, desc.format);
        }
        Ok((handle, existed))
    }

    /// Create (or reuse) a 2D render target without mips
    pub fn create_render_target_2d(
        &mut self,
        key: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        clear_color: Vec4,
    ) -> Result<RenderTargetHandle> {
        let mut desc = RenderTargetDesc::tex_2d(key, width, height, format);
        desc.clear_color = clear_color;
        self.get_or_create(desc).map(|(handle, _)| handle)
    }

    /// Create (or reuse) a cube render target
    ///
    /// The recorded height is `width / 2`, the height of the equirectangular
    /// source the cube is rendered from. HDR cubes use `R16G16B16A16_SFLOAT`,
    /// others `B8G8R8A8_UNORM`.
    ///
    /// # Errors
    ///
    /// - `InvalidDimensions` if `width / 2` is zero
    /// - `InvalidContext` if the graphics device has been dropped
    pub fn create_cube(
        &mut self,
        width: u32,
        mip_gen: MipGenSettings,
        clear_color: Vec4,
        compression: TextureCompression,
        hdr: bool,
        key: &str,
    ) -> Result<RenderTargetHandle> {
        let desc = RenderTargetDesc {
            name: key.to_string(),
            kind: RenderTargetKind::Cube,
            width,
            height: width / 2,
            format: if hdr { TextureFormat::R16G16B16A16_SFLOAT } else { TextureFormat::B8G8R8A8_UNORM },
            hdr,
            compression,
            mip_gen,
            clear_color,
        };
        self.get_or_create(desc).map(|(handle, _)| handle)
    }

    /// Create the 2D and cube targets of a planet
    ///
    /// Any target under `texture_key` is released first, so the 2D target is
    /// always fresh (`width x width/2`, configured format, no mips). The cube
    /// target goes through `create_cube` and is reused if still valid. The
    /// operation is not transactional: if the cube fails, the 2D target stays
    /// allocated until `release_planet_resource`.
    ///
    /// A still-valid cube is reused at its original size even if `width`
    /// changed (only a warning is logged). Release the pair first to resize it.
    pub fn create_pair(&mut self, cubemap_key: &str, texture_key: &str, width: u32) -> Result<PlanetResource> {
        self.render_targets.release(texture_key);

        let format = self.config.planet_texture_format;
        let clear_color = self.config.clear_color;
        self.create_render_target_2d(texture_key, width, width / 2, format, clear_color)?;

        let CacheConfig { cube_mip_gen, cube_compression, cube_hdr, .. } = self.config;
        self.create_cube(width, cube_mip_gen, clear_color, cube_compression, cube_hdr, cubemap_key)?;

        Ok(PlanetResource::new(cubemap_key, texture_key))
    }

    // ===== LOOKUP =====

    /// Handle of the render target under `key` (None if never created or removed)
    pub fn get_cached(&self, key: &str) -> Option<RenderTargetHandle> {
        self.render_targets.find(key)
    }

    pub fn render_target(&self, handle: RenderTargetHandle) -> Option<&CachedRenderTarget> {
        self.render_targets.get(handle)
    }

    pub fn render_target_mut(&mut self, handle: RenderTargetHandle) -> Option<&mut CachedRenderTarget> {
        self.render_targets.get_mut(handle)
    }

    /// True if `handle` resolves to an unreleased render target
    pub fn is_target_valid(&self, handle: RenderTargetHandle) -> bool {
        self.render_targets.get(handle).is_some_and(|entry| entry.is_valid())
    }

    /// Memoized heightfield of the render target under `key`, if any
    pub fn get_cached_heightfield(&self, key: &str) -> Option<Arc<Heightfield>> {
        self.cached_heightfield(&DerivedKey::RenderTarget(key.to_string()))
    }

    /// Memoized color texture of the render target under `key`, if any
    pub fn get_cached_color_texture(&self, key: &str) -> Option<Arc<ColorTexture>> {
        self.color_textures.get(&DerivedKey::RenderTarget(key.to_string())).cloned()
    }

    /// Memoized heightfield of the static texture named `name`, if any
    pub fn get_cached_texture_heightfield(&self, name: &str) -> Option<Arc<Heightfield>> {
        self.cached_heightfield(&DerivedKey::Texture(name.to_string()))
    }

    /// Memoized color texture of the static texture named `name`, if any
    pub fn get_cached_texture_colors(&self, name: &str) -> Option<Arc<ColorTexture>> {
        self.color_textures.get(&DerivedKey::Texture(name.to_string())).cloned()
    }

    fn cached_heightfield(&self, key: &DerivedKey) -> Option<Arc<Heightfield>> {
        self.heightfields.get(key).map(|cached| Arc::clone(&cached.heightfield))
    }

    pub fn render_target_count(&self) -> usize {
        self.render_targets.len()
    }

    pub fn heightfield_count(&self) -> usize {
        self.heightfields.len()
    }

    // ===== RELEASE =====

    /// Release the render target behind `handle` (the entry is kept)
    pub fn release_texture(&mut self, handle: RenderTargetHandle) -> bool {
        let released = self.render_targets.release_handle(handle);
        if released {
            if let Some(entry) = self.render_targets.get(handle) {
                engine_debug!(SOURCE, "Released render target '{}'", entry.key());
            }
        }
        released
    }

    /// Release the render target under `key` (the entry is kept)
    pub fn release(&mut self, key: &str) -> bool {
        match self.render_targets.find(key) {
            Some(handle) => self.release_texture(handle),
            None => false,
        }
    }

    /// Clear the selected cache tables
    ///
    /// Render targets are released before their entries are dropped.
    pub fn clear(&mut self, categories: CacheCategories) {
        if categories.contains(CacheCategories::HEIGHTFIELDS) {
            let count = self.heightfields.len();
            self.heightfields.clear();
            self.color_textures.clear();
            engine_info!(SOURCE, "Cleared {} heightfields", count);
        }
        if categories.contains(CacheCategories::RENDER_TARGETS) {
            let count = self.render_targets.clear();
            engine_info!(SOURCE, "Cleared {} render targets", count);
        }
    }

    /// Clear by flags: both false clears everything, otherwise only the selected tables
    pub fn clear_cache(&mut self, render_targets_only: bool, heightfields_only: bool) {
        self.clear(CacheCategories::from_flags(render_targets_only, heightfields_only));
    }

    // ===== EXTRACTION =====

    /// Color texture read back from the render target under `key`
    ///
    /// The readback happens once per key. If the target cannot be read (released,
    /// unsupported format, ...) the 1x1 placeholder is memoized and a warning logged.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if there is no render target under `key`.
    pub fn color_texture(&mut self, key: &str) -> Result<Arc<ColorTexture>> {
        let derived = DerivedKey::RenderTarget(key.to_string());
        if let Some(texture) = self.color_textures.get(&derived) {
            return Ok(Arc::clone(texture));
        }
        let entry = self.render_targets
            .get_by_key(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;

        let texture = Arc::new(ColorTexture::from_render_target_or_placeholder(entry.target()));
        self.color_textures.insert(derived, Arc::clone(&texture));
        Ok(texture)
    }

    /// Heightfield from one channel of the render target under `key`
    ///
    /// Memoized per key: once built, the same grid is returned for every later
    /// call. A later call asking for another channel still gets the memoized
    /// grid (a warning is logged); clear the heightfields to rebuild.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if nothing is cached and there is no render target under `key`.
    pub fn heightfield_from_channel(&mut self, key: &str, channel: Channel) -> Result<Arc<Heightfield>> {
        let derived = DerivedKey::RenderTarget(key.to_string());
        if let Some(heightfield) = self.memoized_heightfield(&derived, channel) {
            return Ok(heightfield);
        }
        let texture = self.color_texture(key)?;
        Ok(self.memoize_heightfield(derived, channel, &texture))
    }

    /// Heightfield from one channel of a static texture, memoized under its name
    ///
    /// Static textures are cached apart from render targets: a texture named
    /// like a render target key gets its own grid.
    pub fn heightfield_from_texture(&mut self, texture: &Texture2D, channel: Channel) -> Arc<Heightfield> {
        let derived = DerivedKey::Texture(texture.name().to_string());
        if let Some(heightfield) = self.memoized_heightfield(&derived, channel) {
            return heightfield;
        }
        let color = match self.color_textures.get(&derived) {
            Some(color) => Arc::clone(color),
            None => {
                let color = Arc::new(ColorTexture::from_texture_or_placeholder(texture));
                self.color_textures.insert(derived.clone(), Arc::clone(&color));
                color
            }
        };
        self.memoize_heightfield(derived, channel, &color)
    }

    /// Snapshot the render target under `key` into a static BGRA8 texture
    ///
    /// Unlike `color_texture`, this is not memoized and does not degrade:
    /// extraction errors are returned.
    pub fn texture_from_render_target(&self, key: &str) -> Result<Texture2D> {
        let entry = self.render_targets
            .get_by_key(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;
        let color = ColorTexture::from_render_target(entry.target())?;
        Ok(Texture2D::from_colors(key, color.width(), color.height(), color.pixels()))
    }

    fn memoized_heightfield(&self, key: &DerivedKey, channel: Channel) -> Option<Arc<Heightfield>> {
        let cached = self.heightfields.get(key)?;
        if cached.channel != channel {
            engine_warn!(SOURCE,
                "Heightfield '{}' was built from channel {:?}, returning it for channel {:?}",
                key.name(), cached.channel, channel);
        }
        Some(Arc::clone(&cached.heightfield))
    }

    fn memoize_heightfield(&mut self, key: DerivedKey, channel: Channel, texture: &ColorTexture) -> Arc<Heightfield> {
        let heightfield = Arc::new(Heightfield::from_channel(texture, channel));
        self.heightfields.insert(key, CachedHeightfield {
            channel,
            heightfield: Arc::clone(&heightfield),
        });
        heightfield
    }

    fn drop_derived(&mut self, key: &str) {
        let derived = DerivedKey::RenderTarget(key.to_string());
        self.color_textures.remove(&derived);
        self.heightfields.remove(&derived);
    }

    // ===== PLANET RESOURCES =====

    /// Create the 2D and cube targets of a planet (see `create_pair`)
    pub fn create_planet_resource(&mut self, cubemap_key: &str, texture_key: &str, width: u32) -> Result<PlanetResource> {
        self.create_pair(cubemap_key, texture_key, width)
    }

    /// Release both targets of a planet and drop the 2D target's color texture
    ///
    /// With `ValidityCheck::Existence` both entries are removed; with
    /// `ValidityCheck::ValidFlag` they are kept and marked invalid. The
    /// heightfield memoized for the 2D key is kept.
    pub fn release_planet_resource(&mut self, resource: &PlanetResource) {
        match self.config.validity {
            ValidityCheck::Existence => {
                self.render_targets.remove(&resource.texture_key);
                self.render_targets.remove(&resource.cubemap_key);
            }
            ValidityCheck::ValidFlag => {
                self.render_targets.release(&resource.texture_key);
                self.render_targets.release(&resource.cubemap_key);
            }
        }
        self.color_textures.remove(&DerivedKey::RenderTarget(resource.texture_key.clone()));
        engine_debug!(SOURCE, "Released planet resource '{}' / '{}'",
            resource.texture_key, resource.cubemap_key);
    }

    /// Handle of the planet's 2D target
    pub fn get_2d(&self, resource: &PlanetResource) -> Option<RenderTargetHandle> {
        self.render_targets.find(&resource.texture_key)
    }

    /// Handle of the planet's cube target
    pub fn get_cube(&self, resource: &PlanetResource) -> Option<RenderTargetHandle> {
        self.render_targets.find(&resource.cubemap_key)
    }

    /// True if both targets of the planet are present (and, with
    /// `ValidityCheck::ValidFlag`, unreleased)
    pub fn is_valid(&self, resource: &PlanetResource) -> bool {
        let check = |key: &str| match self.config.validity {
            ValidityCheck::Existence => self.render_targets.find(key).is_some(),
            ValidityCheck::ValidFlag => self.render_targets
                .get_by_key(key)
                .is_some_and(|entry| entry.is_valid()),
        };
        check(&resource.texture_key) && check(&resource.cubemap_key)
    }

    /// Heightfield from one channel of the planet's 2D target
    pub fn planet_heightfield(&mut self, resource: &PlanetResource, channel: Channel) -> Result<Arc<Heightfield>> {
        self.heightfield_from_channel(&resource.texture_key, channel)
    }
}

/// Create a render target through a weakly held device
fn create_with_device(
    device: &Weak<Mutex<dyn GraphicsDevice>>,
    desc: &RenderTargetDesc,
) -> Result<Box<dyn RenderTarget>> {
    let device = device.upgrade().ok_or_else(|| {
        Error::InvalidContext(format!("no graphics device to create '{}'", desc.name))
    })?;
    let mut device = device
        .lock()
        .map_err(|_| engine_err!(SOURCE, "Graphics device lock poisoned"))?;
    device.create_render_target(desc)
}

#[cfg(test)]
#[path = "texture_cache_tests.rs"]
mod tests;
