//! The kernel's single real failure surface.
//!
//! Every other condition in spec §7's error table (out-of-range sampler
//! reads, unknown palette indices, zero-length gradients, SVD
//! non-convergence, numerical vertex drift) is handled locally — silently,
//! or behind a `tracing` call — rather than surfaced as a `Result`. Nothing
//! in the kernel panics or aborts the host process on malformed-but-valid
//! input; the one thing it does refuse outright is a region whose bounds
//! are inverted, which is a caller precondition violation rather than
//! something a mesher can recover from.

use crate::math::IVec3;

/// Error returned by [`crate::extract`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VoxelCoreError {
    /// `region.mins > region.maxs` on at least one axis.
    #[error("invalid region: mins {mins:?} is not <= maxs {maxs:?}")]
    InvalidRegion {
        /// The rejected region's lower corner.
        mins: IVec3,
        /// The rejected region's upper corner.
        maxs: IVec3,
    },
}
