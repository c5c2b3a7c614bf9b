//! LOD render target pool module
//!
//! Pre-allocates 2D render targets per level of detail so planets can
//! pick a target without allocating at draw time.

mod render_target_pool;

pub use render_target_pool::{
    RenderTargetPool, RenderTargetSlot,
    RenderTargetConfig, RenderTargetLod,
    DEFAULT_TARGETS_PER_LOD,
};
