//! # OROBOROS Voxel Core
//!
//! Surface extraction over padded voxel volumes: four interchangeable
//! meshing algorithms behind one entry point, [`extract`].
//!
//! - **Binary Greedy Mesher** ([`extractors::greedy`]) — bitmask row
//!   scanning with quad merging, for the `Cubic`/`BinaryGreedy` hot path.
//! - **Cubic Surface Extractor** ([`extractors::cubic`]) — one quad per
//!   exposed face, optional merge and vertex reuse.
//! - **Marching Cubes Extractor** ([`extractors::marching_cubes`]) —
//!   isosurface extraction over a binary density field.
//! - **Dual Contouring Extractor** ([`extractors::dual_contouring`]) —
//!   QEF-placed vertices, one per sign-changing grid edge.
//!
//! ## Architecture Rules
//!
//! 1. **Every extractor takes the same shape**: a [`volume::Volume`]
//!    sampler, a [`region::Region`], and an output [`mesh::ChunkMesh`] —
//!    swapping [`extractors::MeshMode`] never changes the caller's data
//!    flow.
//! 2. **No panics on malformed-but-valid input** — the one real failure
//!    mode is an inverted region ([`error::VoxelCoreError`]); everything
//!    else is handled locally per spec §7.
//! 3. **No unsafe code** — bounds-safe sampling through [`volume::Volume`]
//!    everywhere, including at the padded region's edges.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oroboros_voxel_core::{extract, ExtractionOptions, MeshMode};
//! use oroboros_voxel_core::math::IVec3;
//!
//! let mut mesh = ChunkMesh::default();
//! let options = ExtractionOptions { mesh_mode: MeshMode::BinaryGreedy, ..Default::default() };
//! extract(&volume, IVec3::ZERO, IVec3::new(31, 31, 31), &palette, &mut mesh, IVec3::ZERO, &options)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(unused_variables)]
#![deny(unused_must_use)]
#![deny(warnings)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]
#![warn(clippy::complexity)]
#![warn(clippy::cargo)]
#![deny(clippy::perf)]
#![deny(clippy::correctness)]
#![deny(clippy::large_stack_arrays)]

pub mod error;
pub mod extractors;
pub mod math;
pub mod mesh;
pub mod palette;
pub mod qef;
pub mod region;
pub mod volume;
pub mod voxel;

pub use error::VoxelCoreError;
pub use extractors::{extract, ExtractionOptions, MeshMode};
pub use mesh::{ChunkMesh, IndexType, Mesh, VoxelVertex};
pub use palette::{MaterialKind, Palette, PaletteMaterial, Rgba};
pub use region::Region;
pub use volume::{DenseVolume, Sampler, Volume};
pub use voxel::{Material, Voxel, NO_NORMAL};
