/// Keyed store of render targets.
///
/// Maps caller-chosen string keys to render targets held in a SlotMap.
/// The store is the sole owner of every target: releasing an entry frees
/// its GPU memory but keeps the entry, so "never created" and "created
/// then released" stay distinguishable. Dropping an entry frees the
/// memory as well.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::device::{RenderTarget, RenderTargetInfo};
use crate::error::Result;

new_key_type! {
    /// Stable handle to a cached render target.
    ///
    /// A handle stays valid until its entry is replaced (re-created after a
    /// release) or removed; stale handles resolve to nothing.
    pub struct RenderTargetHandle;
}

/// A render target owned by the store, with its validity flag
pub struct CachedRenderTarget {
    key: String,
    target: Box<dyn RenderTarget>,
    valid: bool,
}

impl CachedRenderTarget {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn info(&self) -> &RenderTargetInfo {
        self.target.info()
    }

    pub fn target(&self) -> &dyn RenderTarget {
        self.target.as_ref()
    }

    /// Mutable access, e.g. for a render pass writing into the target
    pub fn target_mut(&mut self) -> &mut dyn RenderTarget {
        self.target.as_mut()
    }

    /// False once the entry has been released
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    fn release(&mut self) {
        self.valid = false;
        self.target.release();
    }
}

/// Render target store (key -> handle -> target)
pub struct RenderTargetStore {
    entries: SlotMap<RenderTargetHandle, CachedRenderTarget>,
    index: FxHashMap<String, RenderTargetHandle>,
}

impl RenderTargetStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            index: FxHashMap::default(),
        }
    }

    /// Return the valid target under `key`, or create one with `create`
    ///
    /// Returns the handle and whether it already existed. A released entry
    /// is replaced by the newly created target under a new handle. If
    /// `create` fails, the store is left unchanged.
    pub fn get_or_create<F>(&mut self, key: &str, create: F) -> Result<(RenderTargetHandle, bool)>
    where
        F: FnOnce() -> Result<Box<dyn RenderTarget>>,
    {
        if let Some(&handle) = self.index.get(key) {
            if self.entries.get(handle).is_some_and(|entry| entry.valid) {
                return Ok((handle, true));
            }
        }

        let target = create()?;

        if let Some(old) = self.index.remove(key) {
            self.entries.remove(old);
        }
        let handle = self.entries.insert(CachedRenderTarget {
            key: key.to_string(),
            target,
            valid: true,
        });
        self.index.insert(key.to_string(), handle);
        Ok((handle, false))
    }

    /// Handle of the entry under `key`, valid or not
    pub fn find(&self, key: &str) -> Option<RenderTargetHandle> {
        self.index.get(key).copied()
    }

    pub fn get(&self, handle: RenderTargetHandle) -> Option<&CachedRenderTarget> {
        self.entries.get(handle)
    }

    pub fn get_mut(&mut self, handle: RenderTargetHandle) -> Option<&mut CachedRenderTarget> {
        self.entries.get_mut(handle)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&CachedRenderTarget> {
        self.find(key).and_then(|handle| self.entries.get(handle))
    }

    /// Release the target under `key`, keeping the entry
    ///
    /// Returns false if there is no entry under `key`.
    pub fn release(&mut self, key: &str) -> bool {
        match self.find(key) {
            Some(handle) => self.release_handle(handle),
            None => false,
        }
    }

    /// Release the target behind `handle`, keeping the entry
    pub fn release_handle(&mut self, handle: RenderTargetHandle) -> bool {
        match self.entries.get_mut(handle) {
            Some(entry) => {
                entry.release();
                true
            }
            None => false,
        }
    }

    /// Release the target under `key` and drop its entry
    pub fn remove(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(handle) => {
                if let Some(mut entry) = self.entries.remove(handle) {
                    entry.release();
                }
                true
            }
            None => false,
        }
    }

    /// Release every target and drop all entries
    ///
    /// Returns the number of entries removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        for entry in self.entries.values_mut() {
            entry.release();
        }
        self.entries.clear();
        self.index.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys currently in the store
    pub fn keys(&self) -> Vec<&str> {
        self.index.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for RenderTargetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_target_store_tests.rs"]
mod tests;
