//! 30-bit Morton keys: the spatial sort order of the primitives.

use geometry::bvh::BBox;
use math::float::normalize_to_unit;
use math::hcm::Point3;
use rayon::prelude::*;

/// Bits per axis of a Morton key. The key itself is `3 * MORTON_BITS` bits wide.
pub const MORTON_BITS: u32 = 10;

const GRID_SIZE: f32 = (1 << MORTON_BITS) as f32;

/// Spreads the low 10 bits of `v` so that two zero bits sit between consecutive source bits.
/// ```
/// use lbvh::morton::expand_bits;
/// assert_eq!(expand_bits(0b11), 0b1001);
/// assert_eq!(expand_bits(1023), 0x0924_9249);
/// ```
pub fn expand_bits(v: u32) -> u32 {
    debug_assert!(v < 1 << MORTON_BITS, "{} has more than 10 bits", v);
    let mut v = v;
    v = v.wrapping_mul(0x0001_0001) & 0xFF00_00FF;
    v = v.wrapping_mul(0x0000_0101) & 0x0F00_F00F;
    v = v.wrapping_mul(0x0000_0011) & 0xC30C_30C3;
    v = v.wrapping_mul(0x0000_0005) & 0x4924_9249;
    v
}

fn quantize(x: f32) -> u32 {
    // `max` discards a NaN operand.
    (x * GRID_SIZE).max(0.0).min(GRID_SIZE - 1.0) as u32
}

/// Morton key of a point in the unit cube. Coordinates outside `[0, 1]` are clamped.
pub fn morton3d(p: Point3) -> u32 {
    let (xx, yy, zz) = (
        expand_bits(quantize(p.x)),
        expand_bits(quantize(p.y)),
        expand_bits(quantize(p.z)),
    );
    (xx << 2) | (yy << 1) | zz
}

/// Center of `extent` after normalizing it into the unit cube spanned by `scene`.
///
/// Axes along which the scene is flat map to 0, and so does any coordinate that comes out
/// non-finite.
pub fn representative_point(scene: &BBox, extent: &BBox) -> Point3 {
    let (lo, hi) = (scene.min(), scene.max());
    let mut p = Point3::ORIGIN;
    for axis in 0..3 {
        let a = normalize_to_unit(extent.min()[axis], lo[axis], hi[axis]);
        let b = normalize_to_unit(extent.max()[axis], lo[axis], hi[axis]);
        let mid = 0.5 * (a + b);
        p[axis] = if mid.is_finite() { mid } else { 0.0 };
    }
    p
}

pub fn spatial_key(scene: &BBox, extent: &BBox) -> u32 {
    morton3d(representative_point(scene, extent))
}

/// Computes the key of every extent and returns `(key, original index)` pairs in ascending order.
/// Equal keys are ordered by index, so the result doesn't depend on thread scheduling.
pub fn sorted_keys(scene: &BBox, extents: &[BBox]) -> Vec<(u32, usize)> {
    let mut keys: Vec<(u32, usize)> = extents
        .par_iter()
        .enumerate()
        .map(|(i, extent)| (spatial_key(scene, extent), i))
        .collect();
    keys.par_sort_unstable();
    keys
}
