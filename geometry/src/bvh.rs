use std::fmt::{Debug, Display, Formatter, Result};

use crate::ray::Ray;
use crate::slope;
use math::{
    float::min_max,
    hcm::{Point3, Vec3},
};

/// 3D axis-aligned bounding box. Boundary checks are closed (`[min, max]`) on all axes.
/// - Build one from 2 `Point3`s;
/// - Expand it by `b.union()` or `union(b1, b2)`;
/// - Check if it `contains()` a point or `encloses()` another box, or `overlaps()` a `Ray`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    min: Point3,
    max: Point3,
}

impl BBox {
    /// The identity of `union`: contains nothing, and every union with it yields the other operand.
    pub fn empty() -> BBox {
        BBox {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(-f32::INFINITY, -f32::INFINITY, -f32::INFINITY),
        }
    }
    pub fn new(p0: Point3, p1: Point3) -> BBox {
        let (xmin, xmax) = min_max(p0.x, p1.x);
        let (ymin, ymax) = min_max(p0.y, p1.y);
        let (zmin, zmax) = min_max(p0.z, p1.z);
        BBox {
            min: Point3::new(xmin, ymin, zmin),
            max: Point3::new(xmax, ymax, zmax),
        }
    }
    /// Takes the corners as given, without reordering. Used to rebuild a box from stored bits.
    pub fn from_corners(min: Point3, max: Point3) -> BBox {
        BBox { min, max }
    }

    pub fn union(self, p: Point3) -> BBox {
        BBox {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn midpoint(self) -> Point3 {
        self.min + (self.max - self.min) * 0.5
    }

    pub fn diag(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn min(&self) -> Point3 {
        self.min
    }
    pub fn max(&self) -> Point3 {
        self.max
    }

    /// True if `min > max` on some axis, which is the case for `BBox::empty()`.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    /// True if every corner coordinate is finite. Unbounded shapes (planes) report a box that
    /// isn't.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Reference slab test, clipped to `[0, r.t_max)`. The traversal uses `overlaps()` instead.
    pub fn intersect(&self, r: &Ray) -> bool {
        let (mut t_min, mut t_max) = (0.0f32, r.t_max);
        let (origin, inv_dir) = (r.origin(), r.inv_dir());
        for axis in 0..3 {
            let t0 = (self.min[axis] - origin[axis]) * inv_dir[axis];
            let t1 = (self.max[axis] - origin[axis]) * inv_dir[axis];
            if t0.is_nan() || t1.is_nan() {
                // Still axis with the origin on a slab face.
                continue;
            }
            let (t0, t1) = min_max(t0, t1);
            // Shrinks [t_min, t_max] by intersecting it with [t0, t1].
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return false;
            }
        }
        true
    }

    /// Slope test dispatched on the ray's class. Ignores the ray extent.
    pub fn overlaps(&self, r: &Ray) -> bool {
        slope::overlap_test(r.class())(r, self)
    }

    /// Ray parameter where the ray enters the box, or `None` if it misses. Negative when the
    /// origin is inside.
    pub fn entry_distance(&self, r: &Ray) -> Option<f32> {
        slope::entry_test(r.class())(r, self)
    }

    pub fn encloses(&self, other: Self) -> bool {
        for axis in 0..3 {
            if self.min[axis] > other.min[axis] {
                return false;
            }
            if self.max[axis] < other.max[axis] {
                return false;
            }
        }
        true
    }
    pub fn contains(&self, p: Point3) -> bool {
        for axis in 0..3 {
            if self.min[axis] > p[axis] {
                return false;
            }
            if self.max[axis] < p[axis] {
                return false;
            }
        }
        true
    }
}

impl Default for BBox {
    fn default() -> Self {
        BBox::empty()
    }
}

impl Display for BBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "box[{} -> {}]", self.min, self.max)
    }
}

pub fn union(b0: BBox, b1: BBox) -> BBox {
    BBox {
        min: b0.min.min(b1.min),
        max: b0.max.max(b1.max),
    }
}
