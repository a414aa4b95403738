mod simple;

use enum_dispatch::enum_dispatch;
use geometry::bvh::BBox;
use geometry::interaction::RayIntersection;
use geometry::ray::Ray;

pub use simple::*;

/// The closed set of primitives a scene is made of. Dispatches `Shape` calls without a vtable.
#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum SimpleShape {
    Sphere,
    Cylinder,
    Triangle,
    Plane,
}

/// Represents the characteristics of a shape: has a bounding box, and can interact with a ray.
/// See `simple.rs` for the implementations: `Sphere`, `Cylinder`, `Triangle` and `Plane`.
///
/// Intersections are reported only for ray parameters in `(0, r.t_max)`; the returned record has
/// no primitive index, the owner of the shape list fills it in.
#[enum_dispatch(SimpleShape)]
pub trait Shape: Send + Sync {
    fn summary(&self) -> String;
    /// Axis-aligned extent. Unbounded shapes return a box that isn't finite.
    fn bbox(&self) -> BBox;
    fn intersect(&self, r: &Ray) -> Option<RayIntersection>;
    fn occludes(&self, r: &Ray) -> bool {
        self.intersect(r).is_some()
    }
}

impl SimpleShape {
    /// True for shapes that can be placed in a bounding-volume hierarchy.
    pub fn is_bounded(&self) -> bool {
        self.bbox().is_finite()
    }
}
