use geometry::bvh::BBox;
use geometry::interaction::RayIntersection;
use geometry::ray::Ray;
use material::Material;
use radiometry::color::Color;
use shape::{Shape, SimpleShape};

use crate::Primitive;

/// A shape placed in the scene together with its surface material.
#[derive(Debug, Clone)]
pub struct Instance {
    pub shape: SimpleShape,
    pub mtl: Material,
}

impl Instance {
    pub fn new(shape: SimpleShape, mtl: Material) -> Self {
        Instance { shape, mtl }
    }
    pub fn from_raw<S>(shape: S, mtl: Material) -> Self
    where
        S: Into<SimpleShape>,
    {
        Instance::new(shape.into(), mtl)
    }
    pub fn bbox(&self) -> BBox {
        self.shape.bbox()
    }
}

impl Primitive for Instance {
    fn extent(&self) -> BBox {
        self.shape.bbox()
    }
    fn intersect(&self, r: &Ray) -> Option<RayIntersection> {
        let hit = self.shape.intersect(r)?;
        debug_assert!(
            !hit.point.has_nan(),
            "shape {} intersect ray {} has nan",
            self.shape.summary(),
            r
        );
        Some(hit)
    }
    fn occludes(&self, r: &Ray) -> bool {
        self.shape.occludes(r)
    }
    fn filter(&self) -> (Color, f32) {
        self.mtl.shadow_filter()
    }
}
