use std::fmt::{Display, Formatter, Result};

use math::hcm::{Point3, Vec3};

/// Hit points are pushed this far off the surface along the normal, so that rays spawned from
/// them don't re-hit the same surface.
pub const SURFACE_OFFSET: f32 = 1e-4;

/// Geometric record of a ray-surface intersection:
///  - `distance`: ray parameter of the hit; `f32::INFINITY` while nothing has been hit;
///  - `point`: hit position, already nudged off the surface;
///  - `normal`: unit surface normal, facing the side the ray came from;
///  - `primitive`: index of the primitive that was hit, filled in by whoever owns the list;
///  - `is_entering`: false when the ray leaves a closed shape (origin inside).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayIntersection {
    pub distance: f32,
    pub point: Point3,
    pub normal: Vec3,
    pub primitive: Option<usize>,
    pub is_entering: bool,
}

impl RayIntersection {
    pub fn new(distance: f32, point: Point3, normal: Vec3, is_entering: bool) -> Self {
        RayIntersection {
            distance,
            point,
            normal,
            primitive: None,
            is_entering,
        }
    }

    /// No hit yet. Every real hit is closer than this.
    pub fn none() -> Self {
        Self::new(f32::INFINITY, Point3::ORIGIN, Vec3::ZERO, true)
    }

    pub fn with_primitive(self, index: usize) -> Self {
        RayIntersection {
            primitive: Some(index),
            ..self
        }
    }

    pub fn is_hit(&self) -> bool {
        self.distance.is_finite()
    }
}

impl Default for RayIntersection {
    fn default() -> Self {
        Self::none()
    }
}

impl Display for RayIntersection {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.primitive {
            Some(index) => write!(f, "#{} ", index)?,
            None => write!(f, "#? ")?,
        }
        write!(
            f,
            "t = {:.3}, pos = {}, normal = {}{}",
            self.distance,
            self.point,
            self.normal,
            if self.is_entering { "" } else { " (exiting)" }
        )
    }
}
