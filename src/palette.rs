//! Palette: the 256-entry color table consulted by every extractor.

use bytemuck::{Pod, Zeroable};

/// Number of entries in a palette. Fixed by the voxel's 1-byte color index.
pub const PALETTE_SIZE: usize = 256;

/// An RGBA color, stored as four bytes (not floats) to match the 256-entry
/// palette's role as a lookup table rather than a shading parameter set.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba {
    /// Creates a new color.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black - the "no color" sentinel used at index 0.
    pub const NONE: Self = Self::new(0, 0, 0, 0);

    /// Linearly blends two colors: `self * (1 - t) + other * t`, `t` clamped
    /// to `[0, 1]`. Used by Marching Cubes vertex color blending.
    #[must_use]
    pub fn mix(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| -> u8 {
            (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
        };
        Self::new(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
            lerp(self.a, other.a),
        )
    }

    fn distance_squared(self, other: Self) -> i32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        let da = i32::from(self.a) - i32::from(other.a);
        dr * dr + dg * dg + db * db + da * da
    }
}

/// The kind-specific scalar carried by a [`PaletteMaterial`]. The original
/// source ties one numeric property to a material kind enum (diffuse/
/// metal/glass/emit); `value` is that property, interpreted per-kind.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Plain opaque surface. `value` is unused (kept at 0).
    #[default]
    Diffuse = 0,
    /// Reflective surface. `value` is roughness in `[0, 255]`.
    Metal = 1,
    /// See-through surface. `value` is density in `[0, 255]`.
    Glass = 2,
    /// Light-emitting surface. `value` is emission strength in `[0, 255]`.
    Emit = 3,
}

/// Per-palette-index material metadata, independent of color. `value` is
/// one scalar parameter interpreted per-[`MaterialKind`]: roughness for
/// `Metal`, density for `Glass`, strength for `Emit`, unused for `Diffuse`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PaletteMaterial {
    kind: u8,
    _pad: [u8; 3],
    value: f32,
}

impl PaletteMaterial {
    /// Creates a diffuse material record.
    #[must_use]
    pub const fn diffuse() -> Self {
        Self { kind: MaterialKind::Diffuse as u8, _pad: [0, 0, 0], value: 0.0 }
    }

    /// Creates a metal material record with the given roughness.
    #[must_use]
    pub const fn metal(roughness: f32) -> Self {
        Self { kind: MaterialKind::Metal as u8, _pad: [0, 0, 0], value: roughness }
    }

    /// Creates a glass material record with the given density.
    #[must_use]
    pub const fn glass(density: f32) -> Self {
        Self { kind: MaterialKind::Glass as u8, _pad: [0, 0, 0], value: density }
    }

    /// Creates an emit material record with the given strength.
    #[must_use]
    pub const fn emit(strength: f32) -> Self {
        Self { kind: MaterialKind::Emit as u8, _pad: [0, 0, 0], value: strength }
    }

    /// Returns the material kind.
    #[must_use]
    pub fn kind(self) -> MaterialKind {
        match self.kind {
            1 => MaterialKind::Metal,
            2 => MaterialKind::Glass,
            3 => MaterialKind::Emit,
            _ => MaterialKind::Diffuse,
        }
    }

    /// Returns the kind-specific scalar value.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.value
    }
}

/// A 256-entry color table plus per-index material metadata.
///
/// `color(i)` is consulted by every extractor when writing vertex colors;
/// `closest_match` is used only by Marching Cubes after blending two
/// endpoint colors, to snap the blended color back onto the palette.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Palette {
    colors: [Rgba; PALETTE_SIZE],
    materials: [PaletteMaterial; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    /// Creates a palette with every entry set to [`Rgba::NONE`] /
    /// [`PaletteMaterial::diffuse`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            colors: [Rgba::NONE; PALETTE_SIZE],
            materials: [PaletteMaterial::diffuse(); PALETTE_SIZE],
        }
    }

    /// Sets the color and material at `index`.
    pub fn set(&mut self, index: u8, color: Rgba, material: PaletteMaterial) {
        self.colors[index as usize] = color;
        self.materials[index as usize] = material;
    }

    /// `color(index) -> RGBA`.
    #[inline]
    #[must_use]
    pub fn color(&self, index: u8) -> Rgba {
        self.colors[index as usize]
    }

    /// Material metadata at `index`.
    #[inline]
    #[must_use]
    pub fn material(&self, index: u8) -> PaletteMaterial {
        self.materials[index as usize]
    }

    /// `size() -> 256`.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        PALETTE_SIZE
    }

    /// A palette is never empty; present for API completeness / clippy.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// `getClosestMatch(rgba) -> index`. Unknown/malformed color maps
    /// deterministically to the nearest palette entry by squared channel
    /// distance; ties resolve to the lowest index.
    #[must_use]
    pub fn closest_match(&self, target: Rgba) -> u8 {
        let mut best_index = 0u8;
        let mut best_distance = i32::MAX;
        for (i, &candidate) in self.colors.iter().enumerate() {
            let d = candidate.distance_squared(target);
            if d < best_distance {
                best_distance = d;
                best_index = i as u8;
            }
        }
        best_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_size() {
        let p = Palette::new();
        assert_eq!(p.len(), 256);
    }

    #[test]
    fn test_color_roundtrip() {
        let mut p = Palette::new();
        p.set(5, Rgba::new(10, 20, 30, 255), PaletteMaterial::metal(40.0));
        assert_eq!(p.color(5), Rgba::new(10, 20, 30, 255));
        assert_eq!(p.material(5).kind(), MaterialKind::Metal);
        assert_eq!(p.material(5).value(), 40.0);
    }

    #[test]
    fn test_closest_match() {
        let mut p = Palette::new();
        p.set(1, Rgba::new(255, 0, 0, 255), PaletteMaterial::diffuse());
        p.set(2, Rgba::new(0, 255, 0, 255), PaletteMaterial::diffuse());
        let m = p.closest_match(Rgba::new(250, 10, 5, 255));
        assert_eq!(m, 1);
    }

    #[test]
    fn test_mix() {
        let a = Rgba::new(0, 0, 0, 255);
        let b = Rgba::new(100, 200, 50, 255);
        let mid = a.mix(b, 0.5);
        assert_eq!(mid.r, 50);
        assert_eq!(mid.g, 100);
    }

    #[test]
    fn test_unknown_palette_index_treated_as_zero() {
        // spec §7: "unknown palette index -> silent: treat as index 0".
        // Callers enforce this by clamping before indexing; Palette itself
        // is a plain array so out-of-range is a caller bug, not a runtime
        // path exercised here. Index 0 is always a legal, defined entry.
        let p = Palette::new();
        assert_eq!(p.color(0), Rgba::NONE);
    }
}
