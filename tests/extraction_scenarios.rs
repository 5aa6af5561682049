//! End-to-end scenarios S1-S6 from spec §8, run through the public
//! [`oroboros_voxel_core::extract`] dispatcher rather than each
//! extractor's internal function, so these exercise the same path a host
//! application would.

use oroboros_voxel_core::math::{IVec3, Vec3};
use oroboros_voxel_core::{
    extract, ChunkMesh, ExtractionOptions, MaterialKind, MeshMode, Palette, PaletteMaterial, Rgba, Voxel,
    VoxelCoreError,
};
use oroboros_voxel_core::volume::DenseVolume;
use oroboros_voxel_core::region::Region;

fn palette_with(entries: &[(u8, Rgba)]) -> Palette {
    let mut p = Palette::new();
    for &(index, color) in entries {
        p.set(index, color, PaletteMaterial::diffuse());
    }
    p
}

fn cubic_options(merge: bool, ao: bool) -> ExtractionOptions {
    ExtractionOptions { mesh_mode: MeshMode::Cubic, merge_quads: merge, reuse_vertices: true, ambient_occlusion: ao }
}

fn greedy_options(ao: bool) -> ExtractionOptions {
    ExtractionOptions { mesh_mode: MeshMode::BinaryGreedy, merge_quads: true, reuse_vertices: true, ambient_occlusion: ao }
}

#[test]
fn s1_single_voxel_cubic_no_ao_no_merge() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(2, 2, 2)).unwrap();
    let mut volume = DenseVolume::new(region);
    volume.set(1, 1, 1, Voxel::generic(5));
    let palette = palette_with(&[(5, Rgba::new(10, 20, 30, 255))]);
    let mut mesh = ChunkMesh::default();

    extract(
        &volume,
        region.lower_corner(),
        region.upper_corner(),
        &palette,
        &mut mesh,
        IVec3::ZERO,
        &cubic_options(false, false),
    )
    .unwrap();

    assert_eq!(mesh.mesh[ChunkMesh::OPAQUE].vertices.len(), 24);
    assert_eq!(mesh.mesh[ChunkMesh::OPAQUE].indices.len(), 36);
    assert_eq!(mesh.mesh[ChunkMesh::OPAQUE].indices.len() / 6, 6);
    for v in &mesh.mesh[ChunkMesh::OPAQUE].vertices {
        assert_eq!(v.color_index, 5);
    }
    assert!(mesh.mesh[ChunkMesh::TRANSPARENT].is_empty());
}

#[test]
fn s2_flat_slab_greedy_ao() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(9, 0, 9)).unwrap();
    let mut volume = DenseVolume::new(region);
    for x in 0..10 {
        for z in 0..10 {
            volume.set(x, 0, z, Voxel::generic(1));
        }
    }
    let palette = palette_with(&[(1, Rgba::new(80, 80, 80, 255))]);
    let mut mesh = ChunkMesh::default();

    extract(
        &volume,
        region.lower_corner(),
        region.upper_corner(),
        &palette,
        &mut mesh,
        IVec3::ZERO,
        &greedy_options(true),
    )
    .unwrap();

    let top: Vec<_> = mesh.mesh[ChunkMesh::OPAQUE].vertices.iter().filter(|v| v.position.y > 0.5).collect();
    assert_eq!(top.len(), 4, "the 10x10 top plane should merge into a single quad");
    for v in &top {
        assert_eq!(v.ambient_occlusion, 3, "nothing sits above the slab to occlude its top face");
    }

    let bottom: Vec<_> = mesh.mesh[ChunkMesh::OPAQUE].vertices.iter().filter(|v| v.position.y < -0.5).collect();
    assert_eq!(bottom.len(), 4, "the bottom plane should also merge into a single quad");

    // 36 edge-column side faces (4 side directions * 9 boundary faces each = 36),
    // none of which share a color/flags/AO key with a neighbor across a depth
    // step, so none of them merge further than their own 1x1 extent.
    let side_vertex_count = mesh.mesh[ChunkMesh::OPAQUE].vertices.len() - top.len() - bottom.len();
    assert!(side_vertex_count <= 40 * 4, "side faces should not explode past the ~40-quad budget");
}

#[test]
fn s3_cubic_transparency_split() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(2, 1, 1)).unwrap();
    let mut volume = DenseVolume::new(region);
    volume.set(0, 0, 0, Voxel::generic(2));
    volume.set(1, 0, 0, Voxel::transparent(17));
    let palette = palette_with(&[(2, Rgba::new(200, 0, 0, 255)), (17, Rgba::new(0, 0, 200, 128))]);
    let mut mesh = ChunkMesh::default();

    extract(
        &volume,
        region.lower_corner(),
        region.upper_corner(),
        &palette,
        &mut mesh,
        IVec3::ZERO,
        &cubic_options(true, true),
    )
    .unwrap();

    assert!(!mesh.mesh[ChunkMesh::OPAQUE].is_empty(), "the Generic voxel's Air-facing sides go to the opaque mesh");
    assert!(!mesh.mesh[ChunkMesh::TRANSPARENT].is_empty(), "the Transparent voxel's boundary quad goes to the transparent mesh");

    // The Generic/Transparent shared face is not culled (glass never culls),
    // so it shows up in the transparent mesh with the Transparent voxel's color.
    assert!(mesh.mesh[ChunkMesh::TRANSPARENT].vertices.iter().any(|v| v.color_index == 17));
}

#[test]
fn s4_marching_cubes_isosurface_through_2_cube() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(1, 1, 1)).unwrap();
    let mut volume = DenseVolume::new(region);
    volume.set(0, 0, 0, Voxel::generic(1));
    volume.set(1, 0, 0, Voxel::generic(1));
    let palette = palette_with(&[(1, Rgba::new(100, 100, 100, 255))]);
    let mut mesh = ChunkMesh::default();

    let options = ExtractionOptions { mesh_mode: MeshMode::MarchingCubes, ..ExtractionOptions::default() };
    extract(&volume, region.lower_corner(), region.upper_corner(), &palette, &mut mesh, IVec3::ZERO, &options).unwrap();

    assert!(!mesh.mesh[ChunkMesh::OPAQUE].vertices.is_empty());
    assert_eq!(mesh.mesh[ChunkMesh::OPAQUE].indices.len() % 3, 0);
    assert!(mesh.mesh[ChunkMesh::OPAQUE].indices.len() / 3 >= 2, "expect at least two triangles separating solid from air");
    assert!(mesh.mesh[ChunkMesh::TRANSPARENT].is_empty());
}

#[test]
fn s5_dual_contouring_corner_cube() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(15, 15, 15)).unwrap();
    let mut volume = DenseVolume::new(region);
    for x in 4..12 {
        for y in 4..12 {
            for z in 4..12 {
                volume.set(x, y, z, Voxel::generic(1));
            }
        }
    }
    let palette = palette_with(&[(1, Rgba::new(50, 150, 50, 255))]);
    let mut mesh = ChunkMesh::default();

    let options = ExtractionOptions { mesh_mode: MeshMode::DualContouring, ..ExtractionOptions::default() };
    extract(&volume, region.lower_corner(), region.upper_corner(), &palette, &mut mesh, IVec3::ZERO, &options).unwrap();

    assert!(!mesh.mesh[ChunkMesh::OPAQUE].vertices.is_empty());
    assert_eq!(mesh.mesh[ChunkMesh::OPAQUE].indices.len() % 3, 0);
    for &i in &mesh.mesh[ChunkMesh::OPAQUE].indices {
        assert!((i as usize) < mesh.mesh[ChunkMesh::OPAQUE].vertices.len());
    }
}

#[test]
fn s6_greedy_and_cubic_merge_agree_on_a_solid_block() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(9, 9, 9)).unwrap();
    let mut volume = DenseVolume::new(region);
    for x in 0..10 {
        for y in 0..10 {
            for z in 0..10 {
                volume.set(x, y, z, Voxel::generic(3));
            }
        }
    }
    let palette = palette_with(&[(3, Rgba::new(10, 10, 10, 255))]);

    let mut greedy_mesh = ChunkMesh::default();
    extract(
        &volume,
        region.lower_corner(),
        region.upper_corner(),
        &palette,
        &mut greedy_mesh,
        IVec3::ZERO,
        &greedy_options(false),
    )
    .unwrap();

    // A fully-interior-solid 10x10x10 block: every voxel is surrounded by
    // other solids except at the 6 outer faces, each of which is one
    // 10x10 plane that the greedy merge collapses to a single quad.
    assert_eq!(greedy_mesh.mesh[ChunkMesh::OPAQUE].vertices.len(), 24);
    assert_eq!(greedy_mesh.mesh[ChunkMesh::OPAQUE].indices.len() / 3, 12);

    let mut cubic_mesh = ChunkMesh::default();
    extract(
        &volume,
        region.lower_corner(),
        region.upper_corner(),
        &palette,
        &mut cubic_mesh,
        IVec3::ZERO,
        &cubic_options(true, false),
    )
    .unwrap();

    // Cubic with merging enabled runs the same rectangle-merge algorithm
    // over its own per-plane scan, so it agrees with the greedy mesher
    // vertex-for-vertex and triangle-for-triangle on a uniform solid block.
    assert_eq!(cubic_mesh.mesh[ChunkMesh::OPAQUE].vertices.len(), greedy_mesh.mesh[ChunkMesh::OPAQUE].vertices.len());
    assert_eq!(cubic_mesh.mesh[ChunkMesh::OPAQUE].indices.len(), greedy_mesh.mesh[ChunkMesh::OPAQUE].indices.len());
}

#[test]
fn invariant_1_all_air_region_is_empty_for_every_mode() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(4, 4, 4)).unwrap();
    let volume = DenseVolume::new(region);
    let palette = Palette::new();

    for mode in [MeshMode::Cubic, MeshMode::BinaryGreedy, MeshMode::MarchingCubes, MeshMode::DualContouring] {
        let mut mesh = ChunkMesh::default();
        let options = ExtractionOptions { mesh_mode: mode, ..ExtractionOptions::default() };
        extract(&volume, region.lower_corner(), region.upper_corner(), &palette, &mut mesh, IVec3::ZERO, &options).unwrap();
        assert!(mesh.is_empty(), "{mode:?} should yield an empty mesh over all-Air input");
    }
}

#[test]
fn invariant_2_determinism_across_repeated_runs() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(5, 5, 5)).unwrap();
    let mut volume = DenseVolume::new(region);
    for x in 1..4 {
        for y in 1..4 {
            for z in 1..4 {
                if (x + y + z) % 2 == 0 {
                    volume.set(x, y, z, Voxel::generic(1));
                }
            }
        }
    }
    let palette = palette_with(&[(1, Rgba::new(5, 5, 5, 255))]);
    let options = ExtractionOptions { mesh_mode: MeshMode::BinaryGreedy, ..ExtractionOptions::default() };

    let mut a = ChunkMesh::default();
    let mut b = ChunkMesh::default();
    extract(&volume, region.lower_corner(), region.upper_corner(), &palette, &mut a, IVec3::ZERO, &options).unwrap();
    extract(&volume, region.lower_corner(), region.upper_corner(), &palette, &mut b, IVec3::ZERO, &options).unwrap();

    assert_eq!(a.mesh[ChunkMesh::OPAQUE].vertices.len(), b.mesh[ChunkMesh::OPAQUE].vertices.len());
    assert_eq!(a.mesh[ChunkMesh::OPAQUE].indices, b.mesh[ChunkMesh::OPAQUE].indices);
    for (va, vb) in a.mesh[ChunkMesh::OPAQUE].vertices.iter().zip(&b.mesh[ChunkMesh::OPAQUE].vertices) {
        assert_eq!(va.position, vb.position);
        assert_eq!(va.color_index, vb.color_index);
    }
}

#[test]
fn invariant_7_ao_values_stay_in_range() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(3, 3, 3)).unwrap();
    let mut volume = DenseVolume::new(region);
    volume.set(1, 1, 1, Voxel::generic(1));
    volume.set(2, 1, 1, Voxel::generic(1));
    volume.set(1, 2, 1, Voxel::generic(1));
    let palette = palette_with(&[(1, Rgba::new(1, 1, 1, 255))]);
    let mut mesh = ChunkMesh::default();

    extract(
        &volume,
        region.lower_corner(),
        region.upper_corner(),
        &palette,
        &mut mesh,
        IVec3::ZERO,
        &cubic_options(true, true),
    )
    .unwrap();

    for v in mesh.mesh[ChunkMesh::OPAQUE].vertices.iter().chain(&mesh.mesh[ChunkMesh::TRANSPARENT].vertices) {
        assert!(v.ambient_occlusion <= 3);
    }
}

#[test]
fn invariant_3_every_index_points_at_a_real_vertex() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(5, 5, 5)).unwrap();
    let mut volume = DenseVolume::new(region);
    for x in 1..4 {
        for y in 1..4 {
            for z in 1..4 {
                if (x + y) % 2 == 0 {
                    volume.set(x, y, z, Voxel::generic(1));
                }
            }
        }
    }
    let palette = palette_with(&[(1, Rgba::new(1, 1, 1, 255))]);

    for mode in [MeshMode::Cubic, MeshMode::BinaryGreedy, MeshMode::MarchingCubes, MeshMode::DualContouring] {
        let mut mesh = ChunkMesh::default();
        let options = ExtractionOptions { mesh_mode: mode, ..ExtractionOptions::default() };
        extract(&volume, region.lower_corner(), region.upper_corner(), &palette, &mut mesh, IVec3::ZERO, &options).unwrap();

        for target in [ChunkMesh::OPAQUE, ChunkMesh::TRANSPARENT] {
            let bound = mesh.mesh[target].vertices.len();
            for &i in &mesh.mesh[target].indices {
                assert!((i as usize) < bound, "{mode:?} emitted index {i} with only {bound} vertices");
            }
            assert_eq!(mesh.mesh[target].indices.len() % 3, 0, "{mode:?} must emit whole triangles");
        }
    }
}

#[test]
fn invariant_4_cubic_quads_wind_outward() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(2, 2, 2)).unwrap();
    let mut volume = DenseVolume::new(region);
    volume.set(1, 1, 1, Voxel::generic(1));
    let palette = palette_with(&[(1, Rgba::new(1, 1, 1, 255))]);
    let mut mesh = ChunkMesh::default();

    extract(
        &volume,
        region.lower_corner(),
        region.upper_corner(),
        &palette,
        &mut mesh,
        IVec3::ZERO,
        &cubic_options(false, false),
    )
    .unwrap();

    let center = IVec3::new(1, 1, 1).to_vec3();
    let opaque = &mesh.mesh[ChunkMesh::OPAQUE];
    for tri in opaque.indices.chunks_exact(3) {
        let a = opaque.vertices[tri[0] as usize].position;
        let b = opaque.vertices[tri[1] as usize].position;
        let c = opaque.vertices[tri[2] as usize].position;
        let normal = (b - a).cross(c - a);
        let centroid = Vec3::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0, (a.z + b.z + c.z) / 3.0);
        assert!(normal.dot(centroid - center) > 0.0, "triangle {tri:?} winds inward toward the voxel center");
    }
}

#[test]
fn invariant_9_dual_contouring_vertices_stay_within_their_cell() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(7, 7, 7)).unwrap();
    let mut volume = DenseVolume::new(region);
    for x in 2..6 {
        for y in 2..6 {
            for z in 2..6 {
                volume.set(x, y, z, Voxel::generic(1));
            }
        }
    }
    let palette = palette_with(&[(1, Rgba::new(1, 1, 1, 255))]);
    let mut mesh = ChunkMesh::default();

    let options = ExtractionOptions { mesh_mode: MeshMode::DualContouring, ..ExtractionOptions::default() };
    extract(&volume, region.lower_corner(), region.upper_corner(), &palette, &mut mesh, IVec3::ZERO, &options).unwrap();

    for v in &mesh.mesh[ChunkMesh::OPAQUE].vertices {
        let cell = IVec3::new(v.position.x.floor() as i32, v.position.y.floor() as i32, v.position.z.floor() as i32);
        assert!(v.position.x >= cell.x as f32 - 1.0 && v.position.x <= cell.x as f32 + 2.0);
        assert!(v.position.y >= cell.y as f32 - 1.0 && v.position.y <= cell.y as f32 + 2.0);
        assert!(v.position.z >= cell.z as f32 - 1.0 && v.position.z <= cell.z as f32 + 2.0);
    }
}

#[test]
fn invalid_region_is_rejected_before_touching_the_mesh() {
    let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(3, 3, 3)).unwrap();
    let volume = DenseVolume::new(region);
    let palette = Palette::new();
    let mut mesh = ChunkMesh::default();

    let err = extract(
        &volume,
        IVec3::new(5, 0, 0),
        IVec3::new(0, 0, 0),
        &palette,
        &mut mesh,
        IVec3::ZERO,
        &ExtractionOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err, VoxelCoreError::InvalidRegion { mins: IVec3::new(5, 0, 0), maxs: IVec3::new(0, 0, 0) });
    assert!(mesh.is_empty());
}

#[test]
fn palette_material_kind_round_trips() {
    let mut p = Palette::new();
    p.set(9, Rgba::new(1, 2, 3, 255), PaletteMaterial::glass(64.0));
    assert_eq!(p.material(9).kind(), MaterialKind::Glass);
    assert_eq!(p.material(9).value(), 64.0);
}
