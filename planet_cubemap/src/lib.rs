/*!
# Planet Cubemap

Render target caching and heightfield extraction for planetary cubemap textures.

The crate keeps GPU render targets (2D equirectangular targets and the cube
targets derived from them) in a keyed cache, reads their pixels back into an
8-bit color buffer, and converts one color channel of that buffer into a dense
floating point heightfield for terrain sampling.

## Architecture

- **GraphicsDevice**: Backend trait that allocates render targets and reads pixels back
- **TextureCache**: Keyed render target store, factory, and derived data caches
- **ColorTexture / Heightfield**: Pixel extraction and channel conversion
- **RenderTargetPool**: Pre-allocated render targets bucketed by LOD

Every cache is bound to the thread that created it (the types are `!Send`),
and every operation runs synchronously on that thread.
*/

// Internal modules
mod error;
pub mod log;
pub mod device;
pub mod cache;
pub mod extract;
pub mod pool;

// Main planet namespace module
pub mod planet {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types and logger control, NOT macros)
    pub mod log {
        pub use crate::log::{
            Logger, LogEntry, LogSeverity, DefaultLogger,
            set_logger, reset_logger, set_min_severity, min_severity,
        };
    }

    // Graphics device abstraction
    pub mod device {
        pub use crate::device::*;
    }

    // Keyed render target cache
    pub mod cache {
        pub use crate::cache::*;
    }

    // Pixel extraction and heightfield conversion
    pub mod extract {
        pub use crate::extract::*;
    }

    // LOD render target pool
    pub mod pool {
        pub use crate::pool::*;
    }
}

// Re-export math library at crate root
pub use glam;
