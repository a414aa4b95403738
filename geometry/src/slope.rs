//! Ray/box overlap tests driven by the ray's sign class ("ray slopes").
//!
//! Every one of the 27 sign classes gets its own predicate, monomorphized from
//! `overlaps::<SX, SY, SZ>`: comparisons that depend on the sign of an axis are resolved at
//! compile time, and no test divides (the division lives in the reciprocal and the cached slopes
//! of the `Ray`). A box is missed when the ray origin is already past the box on a moving axis, or
//! outside the slab of a still axis, or when the ray leaves the slab of one axis before reaching
//! the slab of another (checked on the projected 2D line for every pair of moving axes).

use crate::bvh::BBox;
use crate::ray::{Ray, RayClass, SLOPE_PAIRS};

pub type OverlapTest = fn(&Ray, &BBox) -> bool;
pub type EntryTest = fn(&Ray, &BBox) -> Option<f32>;

fn overlaps<const SX: i8, const SY: i8, const SZ: i8>(r: &Ray, b: &BBox) -> bool {
    let signs = [SX, SY, SZ];
    if SX == 0 && SY == 0 && SZ == 0 {
        return false;
    }
    let (o, lo, hi) = (r.origin(), b.min(), b.max());
    for axis in 0..3 {
        let outside = match signs[axis] {
            -1 => o[axis] < lo[axis],
            1 => o[axis] > hi[axis],
            _ => o[axis] < lo[axis] || o[axis] > hi[axis],
        };
        if outside {
            return false;
        }
    }
    for (k, &(a, c)) in SLOPE_PAIRS.iter().enumerate() {
        if signs[a] == 0 || signs[c] == 0 {
            continue;
        }
        // Coordinate on axis `c` where the ray leaves the slab of axis `a`.
        let exit_a = if signs[a] < 0 { lo[a] } else { hi[a] };
        let at_exit = r.slope(k) * exit_a + r.offset(k);
        let misses = if signs[c] < 0 {
            at_exit > hi[c]
        } else {
            at_exit < lo[c]
        };
        if misses {
            return false;
        }
    }
    true
}

/// Same as `overlaps`, but also returns the ray parameter at which the ray enters the box. The
/// value is negative when the origin lies inside the box.
fn entry_distance<const SX: i8, const SY: i8, const SZ: i8>(r: &Ray, b: &BBox) -> Option<f32> {
    if !overlaps::<SX, SY, SZ>(r, b) {
        return None;
    }
    let signs = [SX, SY, SZ];
    let (o, inv) = (r.origin(), r.inv_dir());
    let mut distance = f32::NEG_INFINITY;
    for axis in 0..3 {
        let face = match signs[axis] {
            -1 => b.max()[axis],
            1 => b.min()[axis],
            _ => continue,
        };
        distance = distance.max((face - o[axis]) * inv[axis]);
    }
    Some(distance)
}

macro_rules! class_table {
    ($f:ident) => {
        [
            $f::<-1, -1, -1>,
            $f::<-1, -1, 0>,
            $f::<-1, -1, 1>,
            $f::<-1, 0, -1>,
            $f::<-1, 0, 0>,
            $f::<-1, 0, 1>,
            $f::<-1, 1, -1>,
            $f::<-1, 1, 0>,
            $f::<-1, 1, 1>,
            $f::<0, -1, -1>,
            $f::<0, -1, 0>,
            $f::<0, -1, 1>,
            $f::<0, 0, -1>,
            $f::<0, 0, 0>,
            $f::<0, 0, 1>,
            $f::<0, 1, -1>,
            $f::<0, 1, 0>,
            $f::<0, 1, 1>,
            $f::<1, -1, -1>,
            $f::<1, -1, 0>,
            $f::<1, -1, 1>,
            $f::<1, 0, -1>,
            $f::<1, 0, 0>,
            $f::<1, 0, 1>,
            $f::<1, 1, -1>,
            $f::<1, 1, 0>,
            $f::<1, 1, 1>,
        ]
    };
}

const OVERLAP_TESTS: [OverlapTest; RayClass::COUNT] = class_table!(overlaps);
const ENTRY_TESTS: [EntryTest; RayClass::COUNT] = class_table!(entry_distance);

/// Looks up the overlap predicate dedicated to the given class.
pub fn overlap_test(class: RayClass) -> OverlapTest {
    OVERLAP_TESTS[class.index()]
}

/// Looks up the entry-distance predicate dedicated to the given class.
pub fn entry_test(class: RayClass) -> EntryTest {
    ENTRY_TESTS[class.index()]
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::{point3, vec3};

    #[test]
    fn table_order_matches_class_index() {
        // A box straddling +x only: rays whose class moves toward it must agree with the table slot.
        let b = BBox::new(point3(2.0, -1.0, -1.0), point3(3.0, 1.0, 1.0));
        let toward = Ray::new(point3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0));
        let away = Ray::new(point3(0.0, 0.0, 0.0), vec3(-1.0, 0.0, 0.0));
        assert_eq!(toward.class().to_string(), "POO");
        assert!(overlap_test(toward.class())(&toward, &b));
        assert!(!overlap_test(away.class())(&away, &b));
        assert_eq!(entry_test(toward.class())(&toward, &b), Some(2.0));
    }

    #[test]
    fn degenerate_direction_never_overlaps() {
        let b = BBox::new(point3(-1.0, -1.0, -1.0), point3(1.0, 1.0, 1.0));
        let r = Ray::new(point3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 0.0));
        assert!(r.class().is_degenerate());
        assert!(!overlap_test(r.class())(&r, &b));
        assert_eq!(entry_test(r.class())(&r, &b), None);
    }

    #[test]
    fn entry_is_negative_from_inside() {
        let b = BBox::new(point3(-1.0, -1.0, -1.0), point3(1.0, 1.0, 1.0));
        let r = Ray::new(point3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 0.0));
        let t = entry_test(r.class())(&r, &b).unwrap();
        assert_eq!(t, -1.0);
    }

    #[test]
    fn diagonal_ray_against_corners() {
        // Moves along +x, -y in the z = 0.5 plane.
        let b = BBox::new(point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 1.0));
        let r = Ray::new(point3(-0.5, 0.9, 0.5), vec3(1.0, -1.0, 0.0));
        assert_eq!(r.class().to_string(), "PNO");
        assert!(overlap_test(r.class())(&r, &b));
        // Reaches x = 0 already below the box.
        let r = Ray::new(point3(-1.0, 0.9, 0.5), vec3(1.0, -1.0, 0.0));
        assert!(!overlap_test(r.class())(&r, &b));
        // Leaves x = 1 while still above the box.
        let r = Ray::new(point3(0.5, 2.6, 0.5), vec3(1.0, -1.0, 0.0));
        assert!(!overlap_test(r.class())(&r, &b));
    }
}
