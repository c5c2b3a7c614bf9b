/// Pool of pre-allocated 2D render targets bucketed by LOD.
///
/// Slots are keyed by `IVec3(index, lod, 0)`. The pool is filled once by
/// `setup_textures_if_not` and torn down by `deinitialize` (or on drop),
/// which mirrors the lifetime of the world that owns it.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, Weak};
use glam::IVec3;
use rustc_hash::FxHashMap;
use crate::device::{GraphicsDevice, RenderTarget, RenderTargetDesc, RenderTargetInfo, TextureFormat};
use crate::error::{Error, Result};
use crate::{engine_err, engine_info, engine_trace, engine_warn};

const SOURCE: &str = "planet::RenderTargetPool";

/// Number of render targets allocated per LOD when not specified
pub const DEFAULT_TARGETS_PER_LOD: u32 = 3;

// ===== CONFIGURATION =====

/// One LOD bucket of the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetLod {
    /// Target width (height is width / 2)
    pub width: u32,
    /// LOD level
    pub lod: i32,
    /// Number of targets to allocate
    pub count: u32,
}

impl RenderTargetLod {
    pub fn new(width: u32, lod: i32) -> Self {
        Self {
            width,
            lod,
            count: DEFAULT_TARGETS_PER_LOD,
        }
    }
}

/// Pool layout
#[derive(Debug, Clone, Default)]
pub struct RenderTargetConfig {
    pub lods: Vec<RenderTargetLod>,
}

// ===== SLOT =====

/// A pooled render target
pub struct RenderTargetSlot {
    in_use: bool,
    valid: bool,
    target: Box<dyn RenderTarget>,
}

impl RenderTargetSlot {
    fn new(target: Box<dyn RenderTarget>) -> Self {
        Self {
            in_use: false,
            valid: true,
            target,
        }
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn info(&self) -> &RenderTargetInfo {
        self.target.info()
    }

    pub fn target(&self) -> &dyn RenderTarget {
        self.target.as_ref()
    }

    pub fn target_mut(&mut self) -> &mut dyn RenderTarget {
        self.target.as_mut()
    }
}

// ===== POOL =====

/// LOD-bucketed render target pool, bound to the thread that created it
pub struct RenderTargetPool {
    device: Weak<Mutex<dyn GraphicsDevice>>,
    initialized: bool,
    // index - lod - extra
    slots: FxHashMap<IVec3, RenderTargetSlot>,
    _thread_affinity: PhantomData<*const ()>,
}

impl RenderTargetPool {
    /// Create an empty pool allocating from `device`
    pub fn new(device: &Arc<Mutex<dyn GraphicsDevice>>) -> Self {
        Self {
            device: Arc::downgrade(device),
            initialized: false,
            slots: FxHashMap::default(),
            _thread_affinity: PhantomData,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Allocate the configured render targets, once
    ///
    /// Each LOD gets `count` targets of `width x width/2` in
    /// `R16G16B16A16_SFLOAT`, keyed `(index, lod, 0)`. Calls after the first
    /// successful one do nothing. Two buckets with the same LOD overwrite
    /// each other's slots.
    ///
    /// # Errors
    ///
    /// - `InvalidContext` if the graphics device has been dropped
    /// - `InvalidDimensions` if any bucket's `width / 2` is zero (checked
    ///   before anything is allocated)
    /// - Any device error; targets created before the failure stay pooled
    pub fn setup_textures_if_not(&mut self, config: &RenderTargetConfig) -> Result<()> {
        if self.initialized {
            engine_trace!(SOURCE, "Pool already initialized");
            return Ok(());
        }

        if let Some(lod) = config.lods.iter().find(|lod| lod.width / 2 == 0) {
            return Err(Error::InvalidDimensions { width: lod.width, height: lod.width / 2 });
        }

        let device = self.device
            .upgrade()
            .ok_or_else(|| Error::InvalidContext("no graphics device to fill the pool".to_string()))?;
        let mut device = device
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Graphics device lock poisoned"))?;

        for lod in &config.lods {
            let height = lod.width / 2;
            for index in 0..lod.count {
                let desc = RenderTargetDesc::tex_2d(
                    format!("pool_lod{}_{}", lod.lod, index),
                    lod.width,
                    height,
                    TextureFormat::R16G16B16A16_SFLOAT,
                );
                let target = device.create_render_target(&desc)?;
                let key = IVec3::new(index as i32, lod.lod, 0);
                if self.slots.insert(key, RenderTargetSlot::new(target)).is_some() {
                    engine_warn!(SOURCE, "Pool slot {:?} allocated twice, previous target released", key);
                }
            }
        }

        self.initialized = true;
        engine_info!(SOURCE, "Allocated {} pooled render targets over {} LODs",
            self.slots.len(), config.lods.len());
        Ok(())
    }

    /// Take a free slot of `lod` (lowest index first) and mark it in use
    pub fn acquire(&mut self, lod: i32) -> Option<IVec3> {
        let key = self.slots
            .iter()
            .filter(|(key, slot)| key.y == lod && slot.valid && !slot.in_use)
            .map(|(key, _)| *key)
            .min_by_key(|key| key.x)?;
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.in_use = true;
        }
        Some(key)
    }

    /// Return an acquired slot to the pool
    ///
    /// Returns false if the slot does not exist or was not in use.
    pub fn give_back(&mut self, key: IVec3) -> bool {
        match self.slots.get_mut(&key) {
            Some(slot) if slot.in_use => {
                slot.in_use = false;
                true
            }
            _ => false,
        }
    }

    pub fn slot(&self, key: IVec3) -> Option<&RenderTargetSlot> {
        self.slots.get(&key)
    }

    pub fn slot_mut(&mut self, key: IVec3) -> Option<&mut RenderTargetSlot> {
        self.slots.get_mut(&key)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots allocated for `lod`
    pub fn lod_slot_count(&self, lod: i32) -> usize {
        self.slots.keys().filter(|key| key.y == lod).count()
    }

    /// Release every pooled render target and empty the pool
    ///
    /// The pool can be set up again afterwards.
    pub fn deinitialize(&mut self) {
        if !self.initialized && self.slots.is_empty() {
            return;
        }
        let count = self.slots.len();
        for slot in self.slots.values_mut() {
            if slot.valid {
                slot.target.release();
                slot.valid = false;
            }
        }
        self.slots.clear();
        self.initialized = false;
        engine_info!(SOURCE, "Released {} pooled render targets", count);
    }
}

impl Drop for RenderTargetPool {
    fn drop(&mut self) {
        self.deinitialize();
    }
}

#[cfg(test)]
#[path = "render_target_pool_tests.rs"]
mod tests;
