//! `Mesh` / `ChunkMesh`: the output container every extractor writes into.

use crate::math::{IVec3, Vec3};

/// Index type for mesh triangles. Spec fixes this at 32-bit; the smallest
/// lossless compressed width is decided by [`Mesh::compress_indices`].
pub type IndexType = u32;

/// Per-vertex record emitted by extractors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelVertex {
    /// Position in voxel space (integer-valued for cubic/greedy, possibly
    /// fractional for MC/DC, stored as float either way for a uniform
    /// vertex buffer layout).
    pub position: Vec3,
    /// Palette index of the voxel that produced this vertex (blended for
    /// Marching Cubes).
    pub color_index: u8,
    /// Copied from the source voxel, or [`crate::voxel::NO_NORMAL`] when a
    /// computed normal is supplied separately via [`Mesh::set_normal`].
    pub normal_index: u8,
    /// Ambient occlusion in `{0, 1, 2, 3}`; meaningful only when AO was
    /// requested by the caller.
    pub ambient_occlusion: u8,
    /// Copied verbatim from the source voxel.
    pub flags: u8,
}

impl VoxelVertex {
    /// Creates a vertex with no AO (`3`, "fully lit") and no flags.
    #[must_use]
    pub fn new(position: Vec3, color_index: u8, normal_index: u8) -> Self {
        Self { position, color_index, normal_index, ambient_occlusion: 3, flags: 0 }
    }
}

/// A triangle soup with optional per-vertex UVs and normals.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex buffer.
    pub vertices: Vec<VoxelVertex>,
    /// Index buffer; every index must be `< vertices.len()`.
    pub indices: Vec<IndexType>,
    /// Per-vertex UVs; either empty or `vertices.len()` entries.
    pub uvs: Vec<[f32; 2]>,
    /// Per-vertex normals; either empty or `vertices.len()` entries.
    pub normals: Vec<Vec3>,
}

impl Mesh {
    /// Appends a vertex, returning its (monotonically increasing) index.
    pub fn add_vertex(&mut self, vertex: VoxelVertex) -> IndexType {
        let index = self.vertices.len() as IndexType;
        self.vertices.push(vertex);
        index
    }

    /// Sets (growing `normals` with zero-vectors as needed) the normal for
    /// a previously added vertex.
    pub fn set_normal(&mut self, index: IndexType, normal: Vec3) {
        if self.normals.len() <= index as usize {
            self.normals.resize(index as usize + 1, Vec3::ZERO);
        }
        self.normals[index as usize] = normal;
    }

    /// Appends a triangle. Winding is CCW viewed from outside the solid;
    /// callers are responsible for passing indices in that order (the
    /// extractors' diagonal-flip / face-winding tables do this).
    pub fn add_triangle(&mut self, a: IndexType, b: IndexType, c: IndexType) {
        self.indices.push(a);
        self.indices.push(b);
        self.indices.push(c);
    }

    /// True if the mesh has no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Removes vertices not referenced by any index, remapping indices
    /// stably (referenced vertices keep their relative order).
    pub fn remove_unused_vertices(&mut self) {
        let mut used = vec![false; self.vertices.len()];
        for &i in &self.indices {
            used[i as usize] = true;
        }

        let mut remap = vec![0 as IndexType; self.vertices.len()];
        let mut new_vertices = Vec::with_capacity(self.vertices.len());
        let mut new_normals = if self.normals.is_empty() { Vec::new() } else { Vec::with_capacity(self.vertices.len()) };
        let mut new_uvs = if self.uvs.is_empty() { Vec::new() } else { Vec::with_capacity(self.vertices.len()) };

        for (old_index, &is_used) in used.iter().enumerate() {
            if is_used {
                remap[old_index] = new_vertices.len() as IndexType;
                new_vertices.push(self.vertices[old_index]);
                if !self.normals.is_empty() {
                    new_normals.push(self.normals[old_index]);
                }
                if !self.uvs.is_empty() {
                    new_uvs.push(self.uvs[old_index]);
                }
            }
        }

        for i in &mut self.indices {
            *i = remap[*i as usize];
        }
        self.vertices = new_vertices;
        self.normals = new_normals;
        self.uvs = new_uvs;
    }

    /// Best-effort vertex-cache-friendly reorder of `indices`. Never
    /// changes which triangles exist or their winding — only the order
    /// they (and, trivially, their shared vertices) appear in, and it must
    /// run before [`Mesh::compress_indices`] so the final index width is
    /// computed from the settled index stream (spec §4.2 / `DESIGN.md`
    /// supplemental item 2: `remove_unused_vertices -> optimize ->
    /// compress_indices`, matching the source's call order).
    ///
    /// This is a simple greedy pass: triangles sharing a vertex with the
    /// most-recently-emitted triangle are moved forward, approximating a
    /// small-window vertex cache without the complexity of a full
    /// Tipsify/Forsyth implementation (not needed at the triangle counts a
    /// single region produces).
    pub fn optimize(&mut self) {
        let triangle_count = self.indices.len() / 3;
        if triangle_count < 2 {
            return;
        }

        let mut remaining: Vec<[IndexType; 3]> = self
            .indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let mut ordered = Vec::with_capacity(remaining.len());
        ordered.push(remaining.remove(0));

        while !remaining.is_empty() {
            let last = ordered[ordered.len() - 1];
            let best = remaining
                .iter()
                .enumerate()
                .max_by_key(|(_, tri)| tri.iter().filter(|v| last.contains(v)).count())
                .map(|(i, _)| i)
                .expect("remaining is non-empty");
            ordered.push(remaining.remove(best));
        }

        self.indices = ordered.into_iter().flatten().collect();
    }

    /// Picks the smallest unsigned integer width that represents the
    /// highest index without loss, returning it as a new, equally-long
    /// `u32` buffer re-expanded from that width (the width itself is
    /// reported so a consumer can re-pack for upload; this crate does not
    /// itself narrow the in-memory representation, matching the "index
    /// types are 32-bit" contract of spec §4.2).
    #[must_use]
    pub fn compress_indices(&self) -> CompressedIndexWidth {
        let max = self.indices.iter().copied().max().unwrap_or(0);
        if max <= u32::from(u8::MAX) {
            CompressedIndexWidth::U8
        } else if max <= u32::from(u16::MAX) {
            CompressedIndexWidth::U16
        } else {
            CompressedIndexWidth::U32
        }
    }
}

/// The narrowest lossless integer width for a mesh's current index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressedIndexWidth {
    /// Highest index fits in a `u8`.
    U8,
    /// Highest index fits in a `u16`.
    U16,
    /// Highest index requires the full `u32`.
    U32,
}

/// Two [`Mesh`]es: `mesh[0]` opaque, `mesh[1]` transparent.
///
/// Only the cubic extractor routes quads between the two; binary greedy,
/// Marching Cubes and Dual Contouring always write into the opaque mesh.
#[derive(Debug, Clone, Default)]
pub struct ChunkMesh {
    /// `[opaque, transparent]`.
    pub mesh: [Mesh; 2],
    offset: IVec3,
}

impl ChunkMesh {
    /// Index into `mesh` for the opaque sub-mesh.
    pub const OPAQUE: usize = 0;
    /// Index into `mesh` for the transparent sub-mesh.
    pub const TRANSPARENT: usize = 1;

    /// Clears both sub-meshes, leaving the offset untouched (callers set
    /// the offset explicitly via [`ChunkMesh::set_offset`] as part of the
    /// `clear -> setOffset` prelude every extractor entry performs).
    pub fn clear(&mut self) {
        self.mesh[Self::OPAQUE] = Mesh::default();
        self.mesh[Self::TRANSPARENT] = Mesh::default();
    }

    /// Sets the world-space offset this chunk mesh was extracted at.
    pub fn set_offset(&mut self, offset: IVec3) {
        self.offset = offset;
    }

    /// The offset set by the most recent extraction.
    #[must_use]
    pub const fn offset(&self) -> IVec3 {
        self.offset
    }

    /// True if both sub-meshes are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mesh[Self::OPAQUE].is_empty() && self.mesh[Self::TRANSPARENT].is_empty()
    }

    /// Runs `remove_unused_vertices` on both sub-meshes.
    pub fn remove_unused_vertices(&mut self) {
        self.mesh[Self::OPAQUE].remove_unused_vertices();
        self.mesh[Self::TRANSPARENT].remove_unused_vertices();
    }

    /// Runs `compress_indices` on both sub-meshes.
    #[must_use]
    pub fn compress_indices(&self) -> [CompressedIndexWidth; 2] {
        [self.mesh[Self::OPAQUE].compress_indices(), self.mesh[Self::TRANSPARENT].compress_indices()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vert(x: f32) -> VoxelVertex {
        VoxelVertex::new(Vec3::new(x, 0.0, 0.0), 1, crate::voxel::NO_NORMAL)
    }

    #[test]
    fn test_add_vertex_monotonic() {
        let mut m = Mesh::default();
        let a = m.add_vertex(vert(0.0));
        let b = m.add_vertex(vert(1.0));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
    }

    #[test]
    fn test_remove_unused_vertices_preserves_order() {
        let mut m = Mesh::default();
        let a = m.add_vertex(vert(0.0));
        let _unused = m.add_vertex(vert(1.0));
        let c = m.add_vertex(vert(2.0));
        m.add_triangle(a, c, a);

        m.remove_unused_vertices();
        assert_eq!(m.vertices.len(), 2);
        assert_eq!(m.vertices[0].position.x, 0.0);
        assert_eq!(m.vertices[1].position.x, 2.0);
        for &i in &m.indices {
            assert!((i as usize) < m.vertices.len());
        }
    }

    #[test]
    fn test_compress_indices_width() {
        let mut m = Mesh::default();
        for i in 0..10 {
            m.add_vertex(vert(i as f32));
        }
        m.add_triangle(0, 1, 2);
        assert_eq!(m.compress_indices(), CompressedIndexWidth::U8);
    }

    #[test]
    fn test_optimize_preserves_triangle_set() {
        let mut m = Mesh::default();
        for i in 0..6u32 {
            m.add_vertex(vert(i as f32));
        }
        m.add_triangle(0, 1, 2);
        m.add_triangle(3, 4, 5);
        m.add_triangle(1, 2, 3);

        let mut before: Vec<[u32; 3]> = m.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        m.optimize();
        let mut after: Vec<[u32; 3]> = m.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn test_chunk_mesh_clear_and_offset() {
        let mut cm = ChunkMesh::default();
        cm.mesh[ChunkMesh::OPAQUE].add_vertex(vert(0.0));
        cm.set_offset(IVec3::new(4, 5, 6));
        cm.clear();
        assert!(cm.is_empty());
        assert_eq!(cm.offset(), IVec3::new(4, 5, 6));
    }
}
