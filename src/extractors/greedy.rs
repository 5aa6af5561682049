//! Binary Greedy Mesher: bitmask-driven face culling and per-axis greedy
//! quad expansion over a 62³ interior padded to 64³.
//!
//! Faithful to the source's two-stage shape (build per-axis column
//! bitmasks -> cull faces by bit algebra -> greedy-merge each exposed
//! face plane) but the merge step itself is implemented as the classic
//! row-scan largest-rectangle greedy algorithm rather than the source's
//! literal bit-scan/right-merge counters — both produce the same merged
//! geometry (spec's Design Notes explicitly allow an equivalent merge
//! strategy for the cubic extractor's merge step, and the same reasoning
//! applies here: the contract is the output mesh, not the scan order).
//! See `DESIGN.md`.

use crate::extractors::ExtractionOptions;
use crate::math::{IVec3, Vec3};
use crate::mesh::{ChunkMesh, VoxelVertex};
use crate::region::Region;
use crate::voxel::Voxel;
use crate::volume::Volume;

/// Padded size per axis (62 usable interior cells plus one voxel of
/// neighbor-context border on every side).
const CS_P: i32 = 64;
/// Bit index of the topmost (high) padding layer.
const CULL_MASK: u64 = 1 << (CS_P - 1);

#[derive(Clone, Copy)]
struct CellInfo {
    voxel: Voxel,
    // Corner AO order: [LB, RB, RF, LF] — Left/Right along the `a` axis,
    // Back/Front along the `b` axis. [3,3,3,3] when AO is disabled.
    ao: [u8; 4],
}

/// Loads the padded 64³ neighborhood of `region` from `volume` into a
/// flat, row-major array: `index = x + y * CS_P + z * CS_P^2`.
fn load_padded(volume: &impl Volume, region: Region) -> Vec<Voxel> {
    let mins = region.lower_corner();
    let mut out = vec![Voxel::AIR; (CS_P * CS_P * CS_P) as usize];
    for pz in 0..CS_P {
        for py in 0..CS_P {
            for px in 0..CS_P {
                let wx = mins.x + px - 1;
                let wy = mins.y + py - 1;
                let wz = mins.z + pz - 1;
                out[(px + py * CS_P + pz * CS_P * CS_P) as usize] = volume.voxel(wx, wy, wz);
            }
        }
    }
    out
}

#[inline]
fn padded_index(x: i32, y: i32, z: i32) -> usize {
    (x + y * CS_P + z * CS_P * CS_P) as usize
}

#[inline]
fn solid_at(padded: &[Voxel], x: i32, y: i32, z: i32) -> bool {
    if x < 0 || y < 0 || z < 0 || x >= CS_P || y >= CS_P || z >= CS_P {
        false
    } else {
        padded[padded_index(x, y, z)].is_blocked()
    }
}

#[inline]
fn voxel_at(padded: &[Voxel], x: i32, y: i32, z: i32) -> Voxel {
    padded[padded_index(x, y, z)]
}

/// `vertexAO(side1, side2, corner)` — shared with the cubic extractor.
#[inline]
pub(crate) fn vertex_ao(side1: bool, side2: bool, corner: bool) -> u8 {
    if side1 && side2 {
        0
    } else {
        3 - (u8::from(side1) + u8::from(side2) + u8::from(corner))
    }
}

/// Maps (axis, depth, a, b) to padded (x, y, z). Axis 0 = X depth (a=y,
/// b=z), axis 1 = Y depth (a=x, b=z), axis 2 = Z depth (a=x, b=y).
#[inline]
fn to_padded(axis: usize, depth: i32, a: i32, b: i32) -> (i32, i32, i32) {
    match axis {
        0 => (depth, a, b),
        1 => (a, depth, b),
        _ => (a, b, depth),
    }
}

/// World-space position for a lattice point at (axis, plane_coord, a, b)
/// in a region whose lower corner is `mins`, plus `translate`.
#[inline]
fn lattice_world_pos(axis: usize, plane_coord: i32, a: i32, b: i32, mins: IVec3, translate: IVec3) -> Vec3 {
    let (x, y, z) = to_padded(axis, plane_coord, a, b);
    let world = IVec3::new(mins.x + x - 1, mins.y + y - 1, mins.z + z - 1).add(translate);
    world.to_vec3()
}

fn cell_ao(padded: &[Voxel], axis: usize, outward_depth: i32, a: i32, b: i32) -> [u8; 4] {
    let s = |da: i32, db: i32| -> bool {
        let (x, y, z) = to_padded(axis, outward_depth, a + da, b + db);
        solid_at(padded, x, y, z)
    };
    let lb = vertex_ao(s(-1, 0), s(0, -1), s(-1, -1));
    let rb = vertex_ao(s(1, 0), s(0, -1), s(1, -1));
    let rf = vertex_ao(s(1, 0), s(0, 1), s(1, 1));
    let lf = vertex_ao(s(-1, 0), s(0, 1), s(-1, 1));
    [lb, rb, rf, lf]
}

/// Emits a quad into `mesh`'s opaque sub-mesh. `corners` are in CCW order
/// as viewed from outside (already resolved for face handedness); `ao`
/// follows the same order.
fn emit_quad(mesh: &mut ChunkMesh, corners: [Vec3; 4], ao: [u8; 4], color_index: u8, normal_index: u8, flags: u8) {
    let out = &mut mesh.mesh[ChunkMesh::OPAQUE];
    let mut idx = [0u32; 4];
    for i in 0..4 {
        let mut v = VoxelVertex::new(corners[i], color_index, normal_index);
        v.ambient_occlusion = ao[i];
        v.flags = flags;
        idx[i] = out.add_vertex(v);
    }
    // isQuadFlipped: opposite corners are (0,2) and (1,3) regardless of
    // winding direction (see module doc / DESIGN.md).
    let flipped = u16::from(ao[0]) + u16::from(ao[2]) > u16::from(ao[1]) + u16::from(ao[3]);
    if flipped {
        out.add_triangle(idx[0], idx[1], idx[3]);
        out.add_triangle(idx[1], idx[2], idx[3]);
    } else {
        out.add_triangle(idx[0], idx[1], idx[2]);
        out.add_triangle(idx[0], idx[2], idx[3]);
    }
}

/// Binary Greedy Mesher entry point (spec §4.3 / §6.1 `BinaryGreedy`).
pub fn extract_binary_greedy_mesh(
    volume: &impl Volume,
    region: Region,
    mesh: &mut ChunkMesh,
    translate: IVec3,
    options: &ExtractionOptions,
) {
    let padded = load_padded(volume, region);
    let mins = region.lower_corner();

    // axis handedness of (a x b) relative to +depth: axis0 and axis2 are
    // right-handed (a x b = +depth), axis1 is left-handed (a x b = -depth)
    // because Y is the middle axis in a right-handed X,Y,Z frame.
    const HANDEDNESS: [i32; 3] = [1, -1, 1];

    for axis in 0..3usize {
        // Column solidity bitmask per (a, b): bit d set iff voxel at
        // depth d is blocked.
        let mut col = vec![0u64; (CS_P * CS_P) as usize];
        for a in 0..CS_P {
            for b in 0..CS_P {
                let mut bits = 0u64;
                for d in 0..CS_P {
                    let (x, y, z) = to_padded(axis, d, a, b);
                    if solid_at(&padded, x, y, z) {
                        bits |= 1u64 << d;
                    }
                }
                col[(a * CS_P + b) as usize] = bits;
            }
        }

        for sign in [-1i32, 1i32] {
            let normal_sign = sign;
            let handedness = HANDEDNESS[axis];
            let flip_winding = normal_sign * handedness < 0;

            // Face-exposed bitmask for this direction (spec §4.3 step 3),
            // border bits stripped so padding voxels never emit a face.
            let face_mask_at = |a: i32, b: i32| -> u64 {
                let c = col[(a * CS_P + b) as usize];
                if normal_sign < 0 {
                    // Quad sits at plane_coord = d, the boundary facing
                    // depth d-1: exposed iff solid(d) & !solid(d-1).
                    c & !((c << 1) | 1)
                } else {
                    // Quad sits at plane_coord = d+1, the boundary facing
                    // depth d+1: exposed iff solid(d) & !solid(d+1).
                    c & !((c >> 1) | CULL_MASK)
                }
            };

            for d in 1..(CS_P - 1) {
                // Build this depth layer's per-cell info grid over the
                // interior [1, CS_P-2] range (CS = 62 usable cells).
                let mut info: Vec<Option<CellInfo>> = vec![None; (CS_P * CS_P) as usize];
                let outward_depth = if normal_sign < 0 { d - 1 } else { d + 1 };
                for a in 1..(CS_P - 1) {
                    for b in 1..(CS_P - 1) {
                        if (face_mask_at(a, b) >> d) & 1 == 0 {
                            continue;
                        }
                        let (vx, vy, vz) = to_padded(axis, d, a, b);
                        let voxel = voxel_at(&padded, vx, vy, vz);
                        let ao = if options.ambient_occlusion {
                            cell_ao(&padded, axis, outward_depth, a, b)
                        } else {
                            [3, 3, 3, 3]
                        };
                        info[(a * CS_P + b) as usize] = Some(CellInfo { voxel, ao });
                    }
                }

                // Classic row-scan largest-rectangle greedy merge.
                let mut visited = vec![false; (CS_P * CS_P) as usize];
                let key = |c: &CellInfo| -> (u8, u8, [u8; 4]) {
                    (c.voxel.color_index(), c.voxel.flags(), if options.ambient_occlusion { c.ao } else { [3; 4] })
                };

                for a in 1..(CS_P - 1) {
                    for b in 1..(CS_P - 1) {
                        let idx = (a * CS_P + b) as usize;
                        if visited[idx] {
                            continue;
                        }
                        let Some(start) = info[idx] else { continue };
                        visited[idx] = true;
                        let start_key = key(&start);

                        // Extend width along `a`.
                        let mut a_end = a;
                        while a_end + 1 < CS_P - 1 {
                            let next_idx = ((a_end + 1) * CS_P + b) as usize;
                            match info[next_idx] {
                                Some(c) if !visited[next_idx] && key(&c) == start_key => {
                                    a_end += 1;
                                }
                                _ => break,
                            }
                        }

                        // Extend height along `b` while the whole row matches.
                        let mut b_end = b;
                        'grow_b: while b_end + 1 < CS_P - 1 {
                            for aa in a..=a_end {
                                let next_idx = (aa * CS_P + b_end + 1) as usize;
                                match info[next_idx] {
                                    Some(c) if !visited[next_idx] && key(&c) == start_key => {}
                                    _ => break 'grow_b,
                                }
                            }
                            b_end += 1;
                        }

                        for aa in a..=a_end {
                            for bb in b..=b_end {
                                visited[((aa * CS_P + bb) as usize)] = true;
                            }
                        }

                        let plane_coord = if normal_sign < 0 { d } else { d + 1 };
                        let lb = lattice_world_pos(axis, plane_coord, a, b, mins, translate);
                        let rb = lattice_world_pos(axis, plane_coord, a_end + 1, b, mins, translate);
                        let rf = lattice_world_pos(axis, plane_coord, a_end + 1, b_end + 1, mins, translate);
                        let lf = lattice_world_pos(axis, plane_coord, a, b_end + 1, mins, translate);

                        let corner_info_at = |aa: i32, bb: i32| -> [u8; 4] {
                            info[(aa * CS_P + bb) as usize].unwrap().ao
                        };
                        let ao_lb = corner_info_at(a, b)[0];
                        let ao_rb = corner_info_at(a_end, b)[1];
                        let ao_rf = corner_info_at(a_end, b_end)[2];
                        let ao_lf = corner_info_at(a, b_end)[3];

                        let (corners, ao) = if flip_winding {
                            ([lb, lf, rf, rb], [ao_lb, ao_lf, ao_rf, ao_rb])
                        } else {
                            ([lb, rb, rf, lf], [ao_lb, ao_rb, ao_rf, ao_lf])
                        };

                        emit_quad(mesh, corners, ao, start.voxel.color_index(), start.voxel.normal_index(), start.voxel.flags());
                    }
                }
            }
        }
    }

    mesh.remove_unused_vertices();
    mesh.mesh[ChunkMesh::OPAQUE].optimize();
}
