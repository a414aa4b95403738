/// Defines the `BBox` bounding-box type.
pub mod bvh;
/// Hit record shared by shapes and the acceleration structure.
pub mod interaction;
pub mod ray;
/// Per-class slope tests between a `Ray` and a `BBox`.
pub mod slope;

pub use interaction::RayIntersection;
