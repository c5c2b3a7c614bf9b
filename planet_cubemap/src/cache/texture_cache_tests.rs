/// Tests for TextureCache
///
/// These tests validate:
/// - Render target creation, memoization and dimension checks
/// - Heightfield and color texture memoization
/// - Selective clearing
/// - Planet resource release under both validity policies

use std::sync::{Arc, Mutex};
use glam::Vec4;
use half::f16;
use crate::device::{
    Color, GraphicsDevice, MemoryGraphicsDevice, MipGenSettings, Texture2D, TextureCompression, TextureFormat,
};
use crate::error::Error;
use crate::extract::Channel;
use super::*;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn setup(config: CacheConfig) -> (Arc<Mutex<MemoryGraphicsDevice>>, TextureCache) {
    let device = Arc::new(Mutex::new(MemoryGraphicsDevice::new()));
    let dyn_device: Arc<Mutex<dyn GraphicsDevice>> = device.clone();
    let cache = TextureCache::new(&dyn_device, config);
    (device, cache)
}

fn setup_default() -> (Arc<Mutex<MemoryGraphicsDevice>>, TextureCache) {
    setup(CacheConfig::default())
}

fn opaque_black() -> Vec4 {
    Vec4::new(0.0, 0.0, 0.0, 1.0)
}

/// Fill an RGBA16F target with one linear color per pixel
fn fill_half_float(cache: &mut TextureCache, key: &str, pixel: impl Fn(u32, u32) -> [f32; 4]) {
    let handle = cache.get_cached(key).unwrap();
    let entry = cache.render_target_mut(handle).unwrap();
    let (width, height) = (entry.info().width, entry.info().height);
    let mut bytes = Vec::with_capacity((width * height * 8) as usize);
    for y in 0..height {
        for x in 0..width {
            for value in pixel(x, y) {
                bytes.extend_from_slice(&f16::from_f32(value).to_le_bytes());
            }
        }
    }
    entry.target_mut().write_pixels(&bytes).unwrap();
}

// ============================================================================
// Tests: Render target factory
// ============================================================================

#[test]
fn test_create_render_target_2d() {
    let (device, mut cache) = setup_default();
    let handle = cache
        .create_render_target_2d("heights", 64, 32, TextureFormat::R16G16B16A16_SFLOAT, opaque_black())
        .unwrap();

    let info = cache.render_target(handle).unwrap().info();
    assert_eq!(info.width, 64);
    assert_eq!(info.height, 32);
    assert_eq!(info.mip_levels, 1);
    assert!(!info.is_cube());
    assert!(cache.is_target_valid(handle));
    assert_eq!(device.lock().unwrap().stats().live_targets, 1);
}

#[test]
fn test_create_render_target_2d_is_memoized() {
    let (device, mut cache) = setup_default();
    let first = cache
        .create_render_target_2d("heights", 64, 32, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();
    let second = cache
        .create_render_target_2d("heights", 128, 64, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.render_target(second).unwrap().info().width, 64);
    assert_eq!(device.lock().unwrap().stats().created_targets, 1);
}

#[test]
fn test_get_or_create_reports_existence() {
    let (_device, mut cache) = setup_default();
    let desc = RenderTargetDesc::tex_2d("heights", 8, 4, TextureFormat::B8G8R8A8_UNORM);

    let (first, existed_first) = cache.get_or_create(desc.clone()).unwrap();
    let (second, existed_second) = cache.get_or_create(desc).unwrap();

    assert!(!existed_first);
    assert!(existed_second);
    assert_eq!(first, second);
}

#[test]
fn test_create_render_target_2d_zero_size() {
    let (device, mut cache) = setup_default();
    let result = cache.create_render_target_2d("empty", 0, 16, TextureFormat::B8G8R8A8_UNORM, opaque_black());

    assert!(matches!(result, Err(Error::InvalidDimensions { width: 0, height: 16 })));
    assert!(cache.get_cached("empty").is_none());
    assert_eq!(device.lock().unwrap().stats().created_targets, 0);
}

#[test]
fn test_create_cube_dimensions() {
    let (_device, mut cache) = setup_default();
    let handle = cache
        .create_cube(512, MipGenSettings::NoMipmaps, opaque_black(), TextureCompression::Default, true, "cube")
        .unwrap();

    let info = cache.render_target(handle).unwrap().info();
    assert!(info.is_cube());
    assert_eq!(info.width, 512);
    assert_eq!(info.height, 256);
    assert_eq!(info.format, TextureFormat::R16G16B16A16_SFLOAT);
    assert!(info.hdr);
}

#[test]
fn test_create_cube_ldr_format() {
    let (_device, mut cache) = setup_default();
    let handle = cache
        .create_cube(64, MipGenSettings::Simple, opaque_black(), TextureCompression::Hdr, false, "cube")
        .unwrap();

    let info = cache.render_target(handle).unwrap().info();
    assert_eq!(info.format, TextureFormat::B8G8R8A8_UNORM);
    assert_eq!(info.compression, TextureCompression::Hdr);
    assert_eq!(info.mip_levels, 7);
}

#[test]
fn test_create_cube_too_small() {
    let (_device, mut cache) = setup_default();
    for width in [0, 1] {
        let result = cache.create_cube(
            width, MipGenSettings::NoMipmaps, opaque_black(), TextureCompression::Default, true, "cube",
        );
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }
    assert!(cache.get_cached("cube").is_none());
}

#[test]
fn test_create_without_device() {
    let (device, mut cache) = setup_default();
    drop(device);

    let result = cache.create_render_target_2d("heights", 8, 4, TextureFormat::B8G8R8A8_UNORM, opaque_black());
    assert!(matches!(result, Err(Error::InvalidContext(_))));
    assert_eq!(cache.render_target_count(), 0);
}

#[test]
fn test_cached_target_survives_device_drop() {
    let (device, mut cache) = setup_default();
    let handle = cache
        .create_render_target_2d("heights", 8, 4, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();
    drop(device);

    let again = cache
        .create_render_target_2d("heights", 8, 4, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();
    assert_eq!(handle, again);
}

#[test]
fn test_out_of_memory_propagates() {
    use crate::device::MemoryDeviceConfig;

    let device = Arc::new(Mutex::new(MemoryGraphicsDevice::with_config(MemoryDeviceConfig {
        memory_budget: Some(16),
    })));
    let dyn_device: Arc<Mutex<dyn GraphicsDevice>> = device.clone();
    let mut cache = TextureCache::new(&dyn_device, CacheConfig::default());

    let result = cache.create_render_target_2d("big", 64, 32, TextureFormat::B8G8R8A8_UNORM, opaque_black());
    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert!(cache.get_cached("big").is_none());
}

// ============================================================================
// Tests: Release
// ============================================================================

#[test]
fn test_release_keeps_entry_and_recreate_gives_new_handle() {
    let (device, mut cache) = setup_default();
    let handle = cache
        .create_render_target_2d("heights", 8, 4, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();

    assert!(cache.release_texture(handle));
    assert_eq!(cache.get_cached("heights"), Some(handle));
    assert!(!cache.is_target_valid(handle));
    assert_eq!(device.lock().unwrap().stats().live_targets, 0);

    let recreated = cache
        .create_render_target_2d("heights", 8, 4, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();
    assert_ne!(handle, recreated);
    assert!(cache.render_target(handle).is_none());
    assert!(cache.is_target_valid(recreated));
}

#[test]
fn test_release_by_key() {
    let (_device, mut cache) = setup_default();
    cache
        .create_render_target_2d("heights", 8, 4, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();

    assert!(cache.release("heights"));
    assert!(!cache.release("missing"));
}

// ============================================================================
// Tests: Extraction
// ============================================================================

#[test]
fn test_heightfield_from_channel() {
    let (_device, mut cache) = setup_default();
    cache
        .create_render_target_2d("heights", 4, 2, TextureFormat::R16G16B16A16_SFLOAT, opaque_black())
        .unwrap();
    fill_half_float(&mut cache, "heights", |x, _| [if x == 0 { 1.0 } else { 0.0 }, 0.0, 0.0, 1.0]);

    let heightfield = cache.heightfield_from_channel("heights", Channel::R).unwrap();
    assert_eq!(heightfield.width(), 4);
    assert_eq!(heightfield.height(), 2);
    assert_eq!(heightfield.value(0, 1), Some(1.0));
    assert_eq!(heightfield.value(1, 1), Some(0.0));
}

#[test]
fn test_heightfield_is_memoized() {
    let (device, mut cache) = setup_default();
    cache
        .create_render_target_2d("heights", 4, 2, TextureFormat::R16G16B16A16_SFLOAT, opaque_black())
        .unwrap();

    let first = cache.heightfield_from_channel("heights", Channel::R).unwrap();
    fill_half_float(&mut cache, "heights", |_, _| [1.0, 1.0, 1.0, 1.0]);
    let second = cache.heightfield_from_channel("heights", Channel::R).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.max(), 0.0);
    assert_eq!(device.lock().unwrap().stats().readbacks, 1);
    assert_eq!(cache.heightfield_count(), 1);
}

#[test]
fn test_heightfield_other_channel_returns_memoized() {
    let (_device, mut cache) = setup_default();
    cache
        .create_render_target_2d("heights", 2, 1, TextureFormat::R16G16B16A16_SFLOAT, opaque_black())
        .unwrap();

    let red = cache.heightfield_from_channel("heights", Channel::R).unwrap();
    let alpha = cache.heightfield_from_channel("heights", Channel::A).unwrap();

    assert!(Arc::ptr_eq(&red, &alpha));
    assert_eq!(alpha.values(), &[0.0, 0.0]);
}

#[test]
fn test_heightfield_missing_key() {
    let (_device, mut cache) = setup_default();
    assert!(matches!(
        cache.heightfield_from_channel("missing", Channel::R),
        Err(Error::KeyNotFound(_))
    ));
    assert!(matches!(cache.color_texture("missing"), Err(Error::KeyNotFound(_))));
}

#[test]
fn test_color_texture_of_cube_is_placeholder() {
    let (_device, mut cache) = setup_default();
    cache
        .create_cube(8, MipGenSettings::NoMipmaps, opaque_black(), TextureCompression::Default, true, "cube")
        .unwrap();

    let color = cache.color_texture("cube").unwrap();
    assert!(color.is_placeholder());

    let heightfield = cache.heightfield_from_channel("cube", Channel::R).unwrap();
    assert_eq!(heightfield.width(), 1);
    assert_eq!(heightfield.height(), 1);
}

#[test]
fn test_color_texture_of_released_target_is_placeholder() {
    let (_device, mut cache) = setup_default();
    cache
        .create_render_target_2d("heights", 4, 2, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();
    cache.release("heights");

    assert!(cache.color_texture("heights").unwrap().is_placeholder());
}

#[test]
fn test_reallocation_drops_derived_data() {
    let (_device, mut cache) = setup_default();
    cache
        .create_render_target_2d("heights", 4, 2, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();
    let first = cache.heightfield_from_channel("heights", Channel::R).unwrap();

    cache.release("heights");
    cache
        .create_render_target_2d("heights", 4, 2, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();

    assert!(cache.get_cached_heightfield("heights").is_none());
    assert!(cache.get_cached_color_texture("heights").is_none());
    let second = cache.heightfield_from_channel("heights", Channel::R).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_heightfield_from_texture() {
    let (_device, mut cache) = setup_default();
    let colors = [Color::new(0, 0, 0, 255), Color::new(255, 0, 0, 255)];
    let texture = Texture2D::from_colors("static_heights", 2, 1, &colors);

    let first = cache.heightfield_from_texture(&texture, Channel::R);
    let second = cache.heightfield_from_texture(&texture, Channel::R);

    assert_eq!(first.values(), &[0.0, 1.0]);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(cache.get_cached_texture_heightfield("static_heights").is_some());
    assert!(cache.get_cached_heightfield("static_heights").is_none());
}

#[test]
fn test_texture_and_render_target_with_same_name_do_not_share_cache() {
    let (_device, mut cache) = setup_default();
    cache
        .create_render_target_2d("a", 2, 1, TextureFormat::B8G8R8A8_UNORM, Vec4::new(1.0, 0.0, 0.0, 1.0))
        .unwrap();
    let from_target = cache.heightfield_from_channel("a", Channel::R).unwrap();

    let texture = Texture2D::from_colors("a", 2, 1, &[Color::new(0, 0, 0, 255); 2]);
    let from_texture = cache.heightfield_from_texture(&texture, Channel::R);

    assert_eq!(from_target.values(), &[1.0, 1.0]);
    assert_eq!(from_texture.values(), &[0.0, 0.0]);
    assert!(!Arc::ptr_eq(&from_target, &from_texture));
    assert_eq!(cache.heightfield_count(), 2);

    // Each source keeps returning its own memoized grid
    let again = cache.heightfield_from_channel("a", Channel::R).unwrap();
    assert!(Arc::ptr_eq(&again, &from_target));
    assert!(Arc::ptr_eq(&cache.get_cached_texture_heightfield("a").unwrap(), &from_texture));
}

#[test]
fn test_reallocation_keeps_texture_heightfield_with_same_name() {
    let (_device, mut cache) = setup_default();
    let texture = Texture2D::from_colors("a", 1, 1, &[Color::new(255, 0, 0, 255)]);
    let from_texture = cache.heightfield_from_texture(&texture, Channel::R);

    cache
        .create_render_target_2d("a", 2, 1, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();

    let cached = cache.get_cached_texture_heightfield("a").unwrap();
    assert!(Arc::ptr_eq(&cached, &from_texture));
}

#[test]
fn test_heightfield_from_unsupported_texture() {
    let (_device, mut cache) = setup_default();
    let texture = Texture2D::new("float_heights", 1, 1, TextureFormat::R32_SFLOAT, vec![0; 4]);

    let heightfield = cache.heightfield_from_texture(&texture, Channel::R);
    assert_eq!(heightfield.values(), &[0.0]);
    assert!(cache.get_cached_texture_colors("float_heights").unwrap().is_placeholder());
    assert!(cache.get_cached_color_texture("float_heights").is_none());
}

#[test]
fn test_texture_from_render_target() {
    let (_device, mut cache) = setup_default();
    cache
        .create_render_target_2d("heights", 2, 2, TextureFormat::R16G16B16A16_SFLOAT, Vec4::new(0.0, 0.0, 1.0, 1.0))
        .unwrap();

    let texture = cache.texture_from_render_target("heights").unwrap();
    assert_eq!(texture.name(), "heights");
    assert_eq!(texture.width(), 2);
    assert_eq!(texture.height(), 2);
    assert_eq!(texture.format(), TextureFormat::B8G8R8A8_UNORM);
    assert_eq!(texture.mip(0).unwrap().len(), 16);
    assert_eq!(&texture.mip(0).unwrap()[..4], &[255, 0, 0, 255]);
}

#[test]
fn test_texture_from_render_target_errors() {
    let (_device, mut cache) = setup_default();
    assert!(matches!(cache.texture_from_render_target("missing"), Err(Error::KeyNotFound(_))));

    cache
        .create_cube(8, MipGenSettings::NoMipmaps, opaque_black(), TextureCompression::Default, true, "cube")
        .unwrap();
    assert!(cache.texture_from_render_target("cube").is_err());
    assert!(cache.get_cached_color_texture("cube").is_none());
}

// ============================================================================
// Tests: Clearing
// ============================================================================

fn populated_cache() -> (Arc<Mutex<MemoryGraphicsDevice>>, TextureCache) {
    let (device, mut cache) = setup_default();
    cache
        .create_render_target_2d("heights", 4, 2, TextureFormat::B8G8R8A8_UNORM, opaque_black())
        .unwrap();
    cache.heightfield_from_channel("heights", Channel::R).unwrap();
    (device, cache)
}

#[test]
fn test_clear_render_targets_only() {
    let (device, mut cache) = populated_cache();
    cache.clear_cache(true, false);

    assert!(cache.get_cached("heights").is_none());
    assert!(cache.get_cached_heightfield("heights").is_some());
    assert_eq!(device.lock().unwrap().stats().live_targets, 0);
}

#[test]
fn test_clear_heightfields_only() {
    let (device, mut cache) = populated_cache();
    cache.clear_cache(false, true);

    assert!(cache.get_cached("heights").is_some());
    assert!(cache.get_cached_heightfield("heights").is_none());
    assert!(cache.get_cached_color_texture("heights").is_none());
    assert_eq!(device.lock().unwrap().stats().live_targets, 1);
}

#[test]
fn test_clear_everything() {
    let (device, mut cache) = populated_cache();
    cache.clear_cache(false, false);

    assert_eq!(cache.render_target_count(), 0);
    assert_eq!(cache.heightfield_count(), 0);
    assert_eq!(device.lock().unwrap().stats().live_targets, 0);
}

#[test]
fn test_clear_both_flags_clears_everything() {
    let (_device, mut cache) = populated_cache();
    cache.clear(CacheCategories::RENDER_TARGETS | CacheCategories::HEIGHTFIELDS);

    assert_eq!(cache.render_target_count(), 0);
    assert_eq!(cache.heightfield_count(), 0);
}

#[test]
fn test_clear_empty_cache() {
    let (_device, mut cache) = setup_default();
    cache.clear_cache(false, false);
    assert_eq!(cache.render_target_count(), 0);
}

// ============================================================================
// Tests: Planet resources
// ============================================================================

#[test]
fn test_create_planet_resource() {
    let (device, mut cache) = setup_default();
    let resource = cache.create_planet_resource("planetA_cube", "planetA_tex", 512).unwrap();

    assert_eq!(resource, PlanetResource::new("planetA_cube", "planetA_tex"));
    assert!(cache.is_valid(&resource));

    let texture = cache.render_target(cache.get_2d(&resource).unwrap()).unwrap().info();
    assert_eq!((texture.width, texture.height), (512, 256));
    assert_eq!(texture.format, TextureFormat::R16G16B16A16_SFLOAT);
    assert!(!texture.is_cube());

    let cube = cache.render_target(cache.get_cube(&resource).unwrap()).unwrap().info();
    assert!(cube.is_cube());
    assert_eq!(cube.width, 512);
    assert_eq!(device.lock().unwrap().stats().live_targets, 2);
}

#[test]
fn test_create_pair_recreates_texture_and_reuses_cube() {
    let (device, mut cache) = setup_default();
    let resource = cache.create_pair("cube", "tex", 64).unwrap();
    let texture = cache.get_2d(&resource).unwrap();
    let cube = cache.get_cube(&resource).unwrap();

    cache.create_pair("cube", "tex", 64).unwrap();

    assert_ne!(cache.get_2d(&resource).unwrap(), texture);
    assert_eq!(cache.get_cube(&resource).unwrap(), cube);
    let stats = device.lock().unwrap().stats();
    assert_eq!(stats.created_targets, 3);
    assert_eq!(stats.live_targets, 2);
}

#[test]
fn test_create_pair_cube_failure_leaves_texture() {
    use crate::device::MemoryDeviceConfig;

    // Room for the 64x32 RGBA16F texture only, not for the cube
    let device = Arc::new(Mutex::new(MemoryGraphicsDevice::with_config(MemoryDeviceConfig {
        memory_budget: Some(64 * 32 * 8),
    })));
    let dyn_device: Arc<Mutex<dyn GraphicsDevice>> = device.clone();
    let mut cache = TextureCache::new(&dyn_device, CacheConfig::default());

    let result = cache.create_pair("cube", "tex", 64);

    assert!(matches!(result, Err(Error::OutOfMemory)));
    let texture = cache.get_cached("tex").unwrap();
    assert!(cache.is_target_valid(texture));
    assert!(cache.get_cached("cube").is_none());
    assert_eq!(device.lock().unwrap().stats().live_targets, 1);

    let resource = PlanetResource::new("cube", "tex");
    assert!(!cache.is_valid(&resource));
    cache.release_planet_resource(&resource);
    assert!(!cache.is_target_valid(texture));
    assert_eq!(device.lock().unwrap().stats().live_targets, 0);
}

#[test]
fn test_create_pair_new_width_reuses_cube() {
    let (_device, mut cache) = setup_default();
    let resource = cache.create_pair("cube", "tex", 64).unwrap();
    cache.create_pair("cube", "tex", 128).unwrap();

    let texture = cache.render_target(cache.get_2d(&resource).unwrap()).unwrap().info();
    assert_eq!(texture.width, 128);
    let cube = cache.render_target(cache.get_cube(&resource).unwrap()).unwrap().info();
    assert_eq!(cube.width, 64);

    cache.release_planet_resource(&resource);
    cache.create_pair("cube", "tex", 128).unwrap();
    let cube = cache.render_target(cache.get_cube(&resource).unwrap()).unwrap().info();
    assert_eq!(cube.width, 128);
}

#[test]
fn test_create_pair_too_small() {
    let (_device, mut cache) = setup_default();
    assert!(matches!(cache.create_pair("cube", "tex", 1), Err(Error::InvalidDimensions { .. })));
}

#[test]
fn test_planet_heightfield() {
    let (_device, mut cache) = setup_default();
    let resource = cache.create_planet_resource("cube", "tex", 16).unwrap();
    fill_half_float(&mut cache, "tex", |_, y| [0.0, if y == 0 { 0.5 } else { 1.0 }, 0.0, 1.0]);

    let heightfield = cache.planet_heightfield(&resource, Channel::G).unwrap();
    assert_eq!(heightfield.width(), 16);
    assert_eq!(heightfield.height(), 8);
    assert_eq!(heightfield.value(3, 0), Some(127.0 / 255.0));
    assert_eq!(heightfield.value(3, 7), Some(1.0));
}

#[test]
fn test_release_planet_resource_valid_flag() {
    let (device, mut cache) = setup(CacheConfig {
        validity: ValidityCheck::ValidFlag,
        ..CacheConfig::default()
    });
    let resource = cache.create_planet_resource("cube", "tex", 32).unwrap();
    cache.planet_heightfield(&resource, Channel::R).unwrap();

    cache.release_planet_resource(&resource);

    let texture = cache.get_2d(&resource).unwrap();
    assert!(!cache.is_target_valid(texture));
    assert!(cache.get_cube(&resource).is_some());
    assert!(!cache.is_valid(&resource));
    assert!(cache.get_cached_color_texture("tex").is_none());
    assert!(cache.get_cached_heightfield("tex").is_some());
    assert_eq!(device.lock().unwrap().stats().live_targets, 0);
}

#[test]
fn test_release_planet_resource_existence() {
    let (device, mut cache) = setup(CacheConfig {
        validity: ValidityCheck::Existence,
        ..CacheConfig::default()
    });
    let resource = cache.create_planet_resource("cube", "tex", 32).unwrap();

    cache.release_planet_resource(&resource);

    assert!(cache.get_2d(&resource).is_none());
    assert!(cache.get_cube(&resource).is_none());
    assert!(!cache.is_valid(&resource));
    assert_eq!(device.lock().unwrap().stats().live_targets, 0);
}

#[test]
fn test_recreate_after_release_is_valid_again() {
    let (_device, mut cache) = setup_default();
    let resource = cache.create_planet_resource("cube", "tex", 32).unwrap();
    cache.release_planet_resource(&resource);

    let again = cache.create_planet_resource("cube", "tex", 32).unwrap();
    assert!(cache.is_valid(&again));
}

#[test]
fn test_is_valid_for_unknown_resource() {
    let (_device, cache) = setup_default();
    assert!(!cache.is_valid(&PlanetResource::new("cube", "tex")));
}
