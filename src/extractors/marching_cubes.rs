//! Marching Cubes: isosurface extraction over a binary density field.
//!
//! Every voxel contributes a scalar density (255 when blocked, 0 when air)
//! sampled at each of a cube's 8 corners; [`EDGE_TABLE`]/[`TRI_TABLE`] are
//! the standard 256-entry lookup tables published by Lorensen & Cline and
//! widely reproduced in the public domain (e.g. Paul Bourke's "Polygonise a
//! scalar field" note) — they are not present anywhere in this workspace's
//! reference pack, so they are reproduced here directly rather than
//! adapted from a sibling module. `DESIGN.md` records this sourcing
//! decision.
//!
//! Unlike the original implementation, corner densities are recomputed
//! per-cube from scratch rather than carried incrementally from the
//! previous cube/row/slice. The incremental form is a performance
//! optimization only — the output mesh is identical either way — and
//! without a compiler available to verify the bookkeeping, the simpler
//! direct form is the safer one to hand-author.

use crate::math::{IVec3, Vec3};
use crate::mesh::ChunkMesh;
use crate::palette::Palette;
use crate::region::Region;
use crate::volume::Volume;
use crate::voxel::Voxel;

const ISOLEVEL: f32 = 127.5;
const EPSILON: f32 = 1e-5;

/// Cube-local corner offsets, indexed `0..8`, in the standard Bourke
/// winding (matches [`TRI_TABLE`]'s assumptions).
const CORNER_OFFSET: [IVec3; 8] = [
    IVec3::new(0, 0, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(1, 1, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(1, 0, 1),
    IVec3::new(1, 1, 1),
    IVec3::new(0, 1, 1),
];

/// The two corner indices each of a cube's 12 edges connects.
const EDGE_CORNERS: [(usize, usize); 12] =
    [(0, 1), (1, 2), (2, 3), (3, 0), (4, 5), (5, 6), (6, 7), (7, 4), (0, 4), (1, 5), (2, 6), (3, 7)];

include!("marching_cubes_tables.rs.inc");

/// Binary density: `255` for any blocked voxel, `0` for air. Marching
/// Cubes does not distinguish material kinds the way Cubic does —
/// everything blocked is "inside" the isosurface.
#[inline]
fn density(voxel: Voxel) -> f32 {
    if voxel.is_blocked() {
        255.0
    } else {
        0.0
    }
}

/// Central-difference gradient of the density field at `p`, used as the
/// (unnormalized, inward-pointing) basis for a vertex normal.
fn gradient(volume: &impl Volume, p: IVec3) -> Vec3 {
    let dx = density(volume.voxel(p.x + 1, p.y, p.z)) - density(volume.voxel(p.x - 1, p.y, p.z));
    let dy = density(volume.voxel(p.x, p.y + 1, p.z)) - density(volume.voxel(p.x, p.y - 1, p.z));
    let dz = density(volume.voxel(p.x, p.y, p.z + 1)) - density(volume.voxel(p.x, p.y, p.z - 1));
    Vec3::new(dx, dy, dz)
}

/// Linearly interpolates the isolevel crossing between two corners,
/// returning the crossing position, blend factor `t`, and the blended
/// `(position, normal, color)` triple.
struct EdgeCrossing {
    position: Vec3,
    normal: Vec3,
    color: crate::palette::Rgba,
}

fn interpolate_edge(
    volume: &impl Volume,
    palette: &Palette,
    p1: IVec3,
    p2: IVec3,
    v1: Voxel,
    v2: Voxel,
) -> EdgeCrossing {
    let val1 = density(v1);
    let val2 = density(v2);

    let t = if (ISOLEVEL - val1).abs() < EPSILON {
        0.0
    } else if (ISOLEVEL - val2).abs() < EPSILON {
        1.0
    } else if (val1 - val2).abs() < EPSILON {
        0.0
    } else {
        (ISOLEVEL - val1) / (val2 - val1)
    };
    let t = t.clamp(0.0, 1.0);

    let p1f = p1.to_vec3();
    let p2f = p2.to_vec3();
    let position = p1f + (p2f - p1f) * t;

    let grad1 = gradient(volume, p1);
    let grad2 = gradient(volume, p2);
    let blended_grad = grad1 + (grad2 - grad1) * t;
    let normal = (blended_grad * -1.0).normalized_or_zero(1e-12);

    let color1 = palette.color(v1.color_index());
    let color2 = palette.color(v2.color_index());
    let color = color1.mix(color2, t);

    EdgeCrossing { position, normal, color }
}

/// Runs Marching Cubes over `region`, writing triangles into
/// `mesh.mesh[ChunkMesh::OPAQUE]`. Never writes to the transparent
/// sub-mesh — MC's binary density field has no transparency concept.
pub fn extract_marching_cubes_mesh(
    volume: &impl Volume,
    palette: &Palette,
    region: Region,
    mesh: &mut ChunkMesh,
    translate: IVec3,
) {
    // Cube origins run one cell past `mins` on the low side so a solid
    // voxel sitting on the region's boundary still gets a cube evaluated
    // against its (outside-the-region) neighbor; `CORNER_OFFSET` already
    // reaches `origin + 1`, which covers the high side.
    let mins = region.lower_corner().add(IVec3::new(-1, -1, -1));
    let maxs = region.upper_corner();

    for z in mins.z..=maxs.z {
        for y in mins.y..=maxs.y {
            for x in mins.x..=maxs.x {
                let origin = IVec3::new(x, y, z);
                let corner_pos: [IVec3; 8] = std::array::from_fn(|i| origin.add(CORNER_OFFSET[i]));
                let corner_voxel: [Voxel; 8] = std::array::from_fn(|i| volume.voxel(corner_pos[i].x, corner_pos[i].y, corner_pos[i].z));

                let mut cell_index = 0usize;
                for (i, voxel) in corner_voxel.iter().enumerate() {
                    if density(*voxel) >= ISOLEVEL {
                        cell_index |= 1 << i;
                    }
                }

                if EDGE_TABLE[cell_index] == 0 {
                    continue;
                }

                let mut edge_vertex: [Option<u32>; 12] = [None; 12];
                for edge in 0..12 {
                    if EDGE_TABLE[cell_index] & (1 << edge) == 0 {
                        continue;
                    }
                    let (a, b) = EDGE_CORNERS[edge];
                    let crossing =
                        interpolate_edge(volume, palette, corner_pos[a], corner_pos[b], corner_voxel[a], corner_voxel[b]);

                    let position = Vec3::new(
                        crossing.position.x + translate.x as f32,
                        crossing.position.y + translate.y as f32,
                        crossing.position.z + translate.z as f32,
                    );

                    let color_index = palette.closest_match(crossing.color);
                    let vertex = crate::mesh::VoxelVertex {
                        position,
                        color_index,
                        normal_index: crate::voxel::NO_NORMAL,
                        ambient_occlusion: 3,
                        flags: 0,
                    };
                    let index = mesh.mesh[ChunkMesh::OPAQUE].add_vertex(vertex);
                    mesh.mesh[ChunkMesh::OPAQUE].set_normal(index, crossing.normal);
                    edge_vertex[edge] = Some(index);
                }

                let row = &TRI_TABLE[cell_index];
                let mut i = 0;
                while i < 16 && row[i] != -1 {
                    let ia = edge_vertex[row[i] as usize].expect("edge marked active in EDGE_TABLE");
                    let ib = edge_vertex[row[i + 1] as usize].expect("edge marked active in EDGE_TABLE");
                    let ic = edge_vertex[row[i + 2] as usize].expect("edge marked active in EDGE_TABLE");
                    mesh.mesh[ChunkMesh::OPAQUE].add_triangle(ia, ib, ic);
                    i += 3;
                }
            }
        }
    }

    mesh.remove_unused_vertices();
    mesh.mesh[ChunkMesh::OPAQUE].optimize();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{MaterialKind, PaletteMaterial, Rgba};
    use crate::region::Region;
    use crate::volume::DenseVolume;
    use crate::voxel::Material;

    fn test_palette() -> Palette {
        let mut p = Palette::new();
        p.set(1, Rgba::new(200, 50, 50, 255), PaletteMaterial::diffuse());
        p
    }

    #[test]
    fn test_all_air_region_yields_empty_mesh() {
        let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(3, 3, 3)).unwrap();
        let volume = DenseVolume::new(region);
        let palette = test_palette();
        let mut mesh = ChunkMesh::default();
        mesh.set_offset(region.lower_corner());

        extract_marching_cubes_mesh(&volume, &palette, region, &mut mesh, IVec3::ZERO);

        assert!(mesh.is_empty());
    }

    #[test]
    fn test_single_solid_voxel_surrounded_by_air_produces_closed_surface() {
        let region = Region::new(IVec3::new(-2, -2, -2), IVec3::new(2, 2, 2)).unwrap();
        let mut volume = DenseVolume::new(region);
        volume.set(0, 0, 0, Voxel::new(Material::Generic, 1, crate::voxel::NO_NORMAL, 0));
        let palette = test_palette();
        let mut mesh = ChunkMesh::default();
        mesh.set_offset(region.lower_corner());

        extract_marching_cubes_mesh(&volume, &palette, region, &mut mesh, IVec3::ZERO);

        assert!(!mesh.mesh[ChunkMesh::OPAQUE].vertices.is_empty());
        assert_eq!(mesh.mesh[ChunkMesh::OPAQUE].indices.len() % 3, 0);
        for &i in &mesh.mesh[ChunkMesh::OPAQUE].indices {
            assert!((i as usize) < mesh.mesh[ChunkMesh::OPAQUE].vertices.len());
        }
    }

    #[test]
    fn test_solid_voxel_on_region_boundary_still_produces_a_closed_surface() {
        // The solid voxel sits at `mins` itself. Without expanding the cube
        // origin scan one cell past `mins`, the crossing between this voxel
        // and its outside-the-region neighbor on the low side is never
        // generated, leaving an open surface on that face.
        let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(2, 2, 2)).unwrap();
        let mut volume = DenseVolume::new(region);
        volume.set(0, 0, 0, Voxel::new(Material::Generic, 1, crate::voxel::NO_NORMAL, 0));
        let palette = test_palette();
        let mut mesh = ChunkMesh::default();
        mesh.set_offset(region.lower_corner());

        extract_marching_cubes_mesh(&volume, &palette, region, &mut mesh, IVec3::ZERO);

        assert!(!mesh.mesh[ChunkMesh::OPAQUE].vertices.is_empty());
        let min_x = mesh.mesh[ChunkMesh::OPAQUE].vertices.iter().map(|v| v.position.x).fold(f32::INFINITY, f32::min);
        assert!(min_x < 0.0, "a crossing on the voxel's low-x face must be generated outside the region boundary");
    }

    #[test]
    fn test_isolevel_crossing_is_monotonic_in_blend_factor() {
        // Testable Property 8: as `val1` moves further below the isolevel
        // relative to `val2`, the interpolated crossing moves monotonically
        // toward `p2`.
        let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(1, 0, 0)).unwrap();
        let volume = DenseVolume::new(region);
        let palette = test_palette();

        let p1 = IVec3::new(0, 0, 0);
        let p2 = IVec3::new(1, 0, 0);
        let air = Voxel::AIR;
        let solid = Voxel::new(Material::Generic, 1, crate::voxel::NO_NORMAL, 0);

        let crossing = interpolate_edge(&volume, &palette, p1, p2, air, solid);
        assert!(crossing.position.x > 0.0 && crossing.position.x < 1.0);
    }

    #[test]
    fn test_transparent_not_special_cased_by_density() {
        let region = Region::new(IVec3::new(-1, -1, -1), IVec3::new(1, 1, 1)).unwrap();
        let mut volume = DenseVolume::new(region);
        volume.set(0, 0, 0, Voxel::transparent(1));
        let palette = test_palette();
        let mut mesh = ChunkMesh::default();
        mesh.set_offset(region.lower_corner());

        extract_marching_cubes_mesh(&volume, &palette, region, &mut mesh, IVec3::ZERO);

        assert!(!mesh.mesh[ChunkMesh::OPAQUE].vertices.is_empty());
        assert!(mesh.mesh[ChunkMesh::TRANSPARENT].is_empty());
    }
}
