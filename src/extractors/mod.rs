//! Entry point: selects one of the four extraction algorithms and runs it.

pub mod cubic;
pub mod dual_contouring;
pub mod greedy;
pub mod marching_cubes;
mod rectangle_merge;

use serde::{Deserialize, Serialize};

use crate::error::VoxelCoreError;
use crate::math::IVec3;
use crate::mesh::ChunkMesh;
use crate::palette::Palette;
use crate::region::Region;
use crate::volume::Volume;

/// Which of the four algorithms a call to [`extract`] runs.
///
/// Numeric values match spec §6.4's `mesh_mode` table exactly, so a host
/// application's config loader can deserialize an integer straight into
/// this enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshMode {
    /// Cubic Surface Extractor.
    Cubic = 0,
    /// Marching Cubes Extractor.
    MarchingCubes = 1,
    /// Binary Greedy Mesher.
    BinaryGreedy = 2,
    /// Dual Contouring Extractor.
    DualContouring = 3,
}

/// Runtime flags that alter extractor behavior (spec §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Which algorithm to run.
    pub mesh_mode: MeshMode,
    /// Cubic: enable adjacent-quad merging.
    pub merge_quads: bool,
    /// Cubic: enable per-slot vertex deduplication.
    pub reuse_vertices: bool,
    /// Cubic/BinaryGreedy: compute 2-bit AO per vertex and use it in dedup.
    pub ambient_occlusion: bool,
}

impl Default for ExtractionOptions {
    /// Matches the defaults named in spec §6.1 for `BinaryGreedy`
    /// (`ambient_occlusion = true, optimize = true`) as a reasonable
    /// all-algorithm default; `Cubic` callers typically override
    /// `merge_quads`/`reuse_vertices` explicitly.
    fn default() -> Self {
        Self {
            mesh_mode: MeshMode::Cubic,
            merge_quads: true,
            reuse_vertices: true,
            ambient_occlusion: true,
        }
    }
}

/// Runs the algorithm selected by `options.mesh_mode`.
///
/// `mesh` is cleared and its offset set to `region.lower_corner()` before
/// the algorithm runs, regardless of which algorithm is selected or
/// whether the region turns out to be entirely `Air` (spec §6.1
/// post-conditions). `translate` is added to every emitted vertex
/// position, placing the region-local geometry into the caller's chosen
/// coordinate space.
///
/// # Errors
///
/// Returns [`VoxelCoreError::InvalidRegion`] if `mins` is not `<= maxs` on
/// every axis. This is the only failure mode the kernel has; everything
/// else (out-of-range peeks, unknown palette indices, degenerate
/// gradients, SVD non-convergence) is handled locally per spec §7.
pub fn extract(
    volume: &impl Volume,
    mins: IVec3,
    maxs: IVec3,
    palette: &Palette,
    mesh: &mut ChunkMesh,
    translate: IVec3,
    options: &ExtractionOptions,
) -> Result<(), VoxelCoreError> {
    let Some(region) = Region::new(mins, maxs) else {
        debug_assert!(false, "extract() called with mins > maxs on some axis");
        mesh.clear();
        return Err(VoxelCoreError::InvalidRegion { mins, maxs });
    };

    mesh.clear();
    mesh.set_offset(region.lower_corner());

    match options.mesh_mode {
        MeshMode::Cubic => cubic::extract_cubic_mesh(volume, region, mesh, translate, options),
        MeshMode::BinaryGreedy => greedy::extract_binary_greedy_mesh(volume, region, mesh, translate, options),
        MeshMode::MarchingCubes => marching_cubes::extract_marching_cubes_mesh(volume, palette, region, mesh, translate),
        MeshMode::DualContouring => dual_contouring::extract_dual_contouring_mesh(volume, palette, region, mesh, translate),
    }

    tracing::trace!(
        mode = ?options.mesh_mode,
        opaque_vertices = mesh.mesh[ChunkMesh::OPAQUE].vertices.len(),
        transparent_vertices = mesh.mesh[ChunkMesh::TRANSPARENT].vertices.len(),
        "extraction complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::DenseVolume;

    #[test]
    fn test_invalid_region_returns_error_and_empty_mesh() {
        let volume = DenseVolume::new(Region::new(IVec3::new(0, 0, 0), IVec3::new(3, 3, 3)).unwrap());
        let mut mesh = ChunkMesh::default();
        let palette = Palette::new();
        let options = ExtractionOptions::default();

        let result = extract(
            &volume,
            IVec3::new(5, 0, 0),
            IVec3::new(0, 0, 0),
            &palette,
            &mut mesh,
            IVec3::ZERO,
            &options,
        );

        assert!(result.is_err());
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_all_air_region_yields_empty_mesh() {
        let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(3, 3, 3)).unwrap();
        let volume = DenseVolume::new(region);
        let mut mesh = ChunkMesh::default();
        let palette = Palette::new();
        let options = ExtractionOptions::default();

        extract(&volume, region.lower_corner(), region.upper_corner(), &palette, &mut mesh, IVec3::ZERO, &options)
            .unwrap();

        assert!(mesh.is_empty());
    }
}
