//! Dense voxel storage and the bounds-safe neighbor-peek cursor over it.

use crate::region::Region;
use crate::voxel::Voxel;

/// A dense 3D array over a [`Region`]. `voxel(x, y, z)` returns `Voxel::AIR`
/// for any position outside the region — callers never need to bounds-check
/// before reading.
pub trait Volume {
    /// The region this volume covers.
    fn region(&self) -> Region;

    /// Reads the voxel at `(x, y, z)`, or `Voxel::AIR` if outside `region()`.
    fn voxel(&self, x: i32, y: i32, z: i32) -> Voxel;
}

/// A flat, row-major dense volume: `index = (z - mins.z) * width * height
/// + (y - mins.y) * width + (x - mins.x)`.
#[derive(Debug, Clone)]
pub struct DenseVolume {
    region: Region,
    voxels: Vec<Voxel>,
}

impl DenseVolume {
    /// Creates an all-`Air` volume over `region`.
    #[must_use]
    pub fn new(region: Region) -> Self {
        let len = region.volume() as usize;
        Self { region, voxels: vec![Voxel::AIR; len] }
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        let mins = self.region.lower_corner();
        let w = self.region.width() as i64;
        let h = self.region.height() as i64;
        (i64::from(z - mins.z) * w * h + i64::from(y - mins.y) * w + i64::from(x - mins.x)) as usize
    }

    /// Sets the voxel at `(x, y, z)`. Panics if outside `region()` — this
    /// is a construction-time API for test/benchmark fixtures, not part of
    /// the extractor-facing read path.
    pub fn set(&mut self, x: i32, y: i32, z: i32, voxel: Voxel) {
        assert!(self.region.contains(x, y, z), "set() outside volume region");
        let idx = self.index(x, y, z);
        self.voxels[idx] = voxel;
    }

    /// Returns a [`Sampler`] cursor positioned at `(x, y, z)`.
    #[must_use]
    pub fn sampler(&self, x: i32, y: i32, z: i32) -> Sampler<'_> {
        Sampler::new(self, x, y, z)
    }
}

impl Volume for DenseVolume {
    fn region(&self) -> Region {
        self.region
    }

    fn voxel(&self, x: i32, y: i32, z: i32) -> Voxel {
        if self.region.contains(x, y, z) {
            self.voxels[self.index(x, y, z)]
        } else {
            Voxel::AIR
        }
    }
}

/// A cursor over a [`DenseVolume`] with O(1) amortized movement and
/// bounds-safe peeks at all 26 neighbors.
///
/// The cursor is `Copy` so nested loops can snapshot it at row/slice
/// boundaries (`movePositiveY`/`movePositiveZ` on a saved outer copy) and
/// step a local mutable copy along the inner axis — the row-copy pattern
/// the source uses to avoid accumulated arithmetic error.
#[derive(Debug, Clone, Copy)]
pub struct Sampler<'v> {
    volume: &'v DenseVolume,
    x: i32,
    y: i32,
    z: i32,
    idx: i64,
    stride_x: i64,
    stride_y: i64,
    stride_z: i64,
}

impl<'v> Sampler<'v> {
    /// Creates a cursor positioned at `(x, y, z)`.
    #[must_use]
    pub fn new(volume: &'v DenseVolume, x: i32, y: i32, z: i32) -> Self {
        let stride_x = 1i64;
        let stride_y = i64::from(volume.region.width());
        let stride_z = stride_y * i64::from(volume.region.height());
        let mut s = Self { volume, x, y, z, idx: 0, stride_x, stride_y, stride_z };
        s.recompute_index();
        s
    }

    fn recompute_index(&mut self) {
        self.idx = if self.volume.region.contains(self.x, self.y, self.z) {
            self.volume.index(self.x, self.y, self.z) as i64
        } else {
            -1
        };
    }

    /// Current cursor position.
    #[must_use]
    pub const fn position(&self) -> (i32, i32, i32) {
        (self.x, self.y, self.z)
    }

    /// The voxel at the cursor position.
    #[must_use]
    pub fn current(&self) -> Voxel {
        self.peek(0, 0, 0)
    }

    /// Bounds-safe peek at `(x + dx, y + dy, z + dz)`. Read-only: never
    /// advances the cursor. Out-of-range returns `Voxel::AIR`.
    #[must_use]
    pub fn peek(&self, dx: i32, dy: i32, dz: i32) -> Voxel {
        let (px, py, pz) = (self.x + dx, self.y + dy, self.z + dz);
        if self.volume.region.contains(px, py, pz) {
            // Fast path: if the cursor itself is in-bounds, the neighbor's
            // linear index is a simple stride offset from ours (no second
            // division/multiplication chain through `index()`).
            if self.idx >= 0 {
                let offset = i64::from(dx) * self.stride_x
                    + i64::from(dy) * self.stride_y
                    + i64::from(dz) * self.stride_z;
                let i = (self.idx + offset) as usize;
                self.volume.voxels[i]
            } else {
                self.volume.voxel(px, py, pz)
            }
        } else {
            Voxel::AIR
        }
    }

    /// Moves the cursor one step in +X. O(1): increments the linear index.
    pub fn move_positive_x(&mut self) {
        self.x += 1;
        self.step(self.stride_x);
    }

    /// Moves the cursor one step in -X.
    pub fn move_negative_x(&mut self) {
        self.x -= 1;
        self.step(-self.stride_x);
    }

    /// Moves the cursor one step in +Y.
    pub fn move_positive_y(&mut self) {
        self.y += 1;
        self.step(self.stride_y);
    }

    /// Moves the cursor one step in -Y.
    pub fn move_negative_y(&mut self) {
        self.y -= 1;
        self.step(-self.stride_y);
    }

    /// Moves the cursor one step in +Z.
    pub fn move_positive_z(&mut self) {
        self.z += 1;
        self.step(self.stride_z);
    }

    /// Moves the cursor one step in -Z.
    pub fn move_negative_z(&mut self) {
        self.z -= 1;
        self.step(-self.stride_z);
    }

    /// Explicitly repositions the cursor (used when re-snapping to a
    /// snapshotted row/slice origin rather than stepping incrementally).
    pub fn set_position(&mut self, x: i32, y: i32, z: i32) {
        self.x = x;
        self.y = y;
        self.z = z;
        self.recompute_index();
    }

    fn step(&mut self, stride: i64) {
        if self.volume.region.contains(self.x, self.y, self.z) {
            self.idx = if self.idx >= 0 { self.idx + stride } else {
                self.volume.index(self.x, self.y, self.z) as i64
            };
        } else {
            self.idx = -1;
        }
    }
}

/// Generates the 26 hand-named peek accessors (`peek_1nx_1py_1pz`, etc.) as
/// thin wrappers over [`Sampler::peek`]. The names are a readability DSL
/// only — see `DESIGN.md` / spec Design Notes; the real logic is the one
/// branch-free `peek(dx, dy, dz)` helper above.
macro_rules! named_peeks {
    ($( $name:ident => ($dx:expr, $dy:expr, $dz:expr) ),+ $(,)?) => {
        impl<'v> Sampler<'v> {
            $(
                #[doc = concat!("Peeks the neighbor at offset (", stringify!($dx), ", ", stringify!($dy), ", ", stringify!($dz), ").")]
                #[inline]
                #[must_use]
                pub fn $name(&self) -> Voxel {
                    self.peek($dx, $dy, $dz)
                }
            )+
        }
    };
}

named_peeks! {
    peek_1nx_1ny_1nz => (-1, -1, -1),
    peek_1nx_1ny_0pz => (-1, -1, 0),
    peek_1nx_1ny_1pz => (-1, -1, 1),
    peek_1nx_0py_1nz => (-1, 0, -1),
    peek_1nx_0py_0pz => (-1, 0, 0),
    peek_1nx_0py_1pz => (-1, 0, 1),
    peek_1nx_1py_1nz => (-1, 1, -1),
    peek_1nx_1py_0pz => (-1, 1, 0),
    peek_1nx_1py_1pz => (-1, 1, 1),
    peek_0px_1ny_1nz => (0, -1, -1),
    peek_0px_1ny_0pz => (0, -1, 0),
    peek_0px_1ny_1pz => (0, -1, 1),
    peek_0px_0py_1nz => (0, 0, -1),
    peek_0px_0py_1pz => (0, 0, 1),
    peek_0px_1py_1nz => (0, 1, -1),
    peek_0px_1py_0pz => (0, 1, 0),
    peek_0px_1py_1pz => (0, 1, 1),
    peek_1px_1ny_1nz => (1, -1, -1),
    peek_1px_1ny_0pz => (1, -1, 0),
    peek_1px_1ny_1pz => (1, -1, 1),
    peek_1px_0py_1nz => (1, 0, -1),
    peek_1px_0py_0pz => (1, 0, 0),
    peek_1px_0py_1pz => (1, 0, 1),
    peek_1px_1py_1nz => (1, 1, -1),
    peek_1px_1py_0pz => (1, 1, 0),
    peek_1px_1py_1pz => (1, 1, 1),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::IVec3;

    fn filled_volume() -> DenseVolume {
        let region = Region::new(IVec3::new(0, 0, 0), IVec3::new(3, 3, 3)).unwrap();
        let mut v = DenseVolume::new(region);
        v.set(1, 1, 1, Voxel::generic(9));
        v
    }

    #[test]
    fn test_out_of_range_is_air() {
        let v = filled_volume();
        assert!(v.voxel(-1, 0, 0).is_air());
        assert!(v.voxel(100, 0, 0).is_air());
    }

    #[test]
    fn test_sampler_peek_matches_direct_read() {
        let v = filled_volume();
        let s = v.sampler(0, 1, 1);
        assert_eq!(s.peek(1, 0, 0), v.voxel(1, 1, 1));
        assert_eq!(s.peek_1px_0py_0pz(), v.voxel(1, 1, 1));
    }

    #[test]
    fn test_move_positive_x_is_incremental() {
        let v = filled_volume();
        let mut s = v.sampler(0, 1, 1);
        s.move_positive_x();
        assert_eq!(s.current(), v.voxel(1, 1, 1));
        s.move_positive_x();
        assert_eq!(s.current(), v.voxel(2, 1, 1));
    }

    #[test]
    fn test_peek_never_moves_cursor() {
        let v = filled_volume();
        let s = v.sampler(0, 0, 0);
        let before = s.position();
        let _ = s.peek(1, 1, 1);
        assert_eq!(s.position(), before);
    }

    #[test]
    fn test_snapshot_row_copy_pattern() {
        let v = filled_volume();
        let mut row_origin = v.sampler(0, 1, 1);
        let mut inner = row_origin; // Copy snapshot.
        inner.move_positive_x();
        inner.move_positive_x();
        assert_eq!(inner.current(), v.voxel(2, 1, 1));
        // The outer cursor is untouched by the inner copy's movement.
        assert_eq!(row_origin.current(), v.voxel(0, 1, 1));
        row_origin.move_positive_y();
        assert_eq!(row_origin.position(), (0, 2, 1));
    }
}
