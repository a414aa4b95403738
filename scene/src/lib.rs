pub mod preset;

use geometry::bvh::{self, BBox};
use geometry::interaction::RayIntersection;
use geometry::ray::Ray;
use lbvh::{error::Result, Instance, Lbvh, LbvhConfig, Primitive, TraversalStats};
use material::Material;
use math::hcm::{Point3, Vec3};
use radiometry::color::Color;
use shape::{Cylinder, Plane, Shape, SimpleShape, Sphere, Triangle};

/// Collection of primitives to trace against.
///
/// Bounded primitives go to the list the hierarchy is built over, and grow the scene bounds.
/// Unbounded ones (planes) are kept in a separate list that every query scans linearly.
/// Primitives take the material that was current when they were added.
#[derive(Debug, Clone)]
pub struct Scene {
    bounded: Vec<Instance>,
    planes: Vec<Instance>,
    bounds: BBox,
    material: Material,
}

/// A surface hit, along with the primitive it belongs to. `isect.primitive` indexes the list that
/// primitive lives in (`bounded()` or `planes()`).
#[derive(Debug, Clone, Copy)]
pub struct Hit<'s> {
    pub isect: RayIntersection,
    pub instance: &'s Instance,
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Scene {
            bounded: vec![],
            planes: vec![],
            bounds: BBox::empty(),
            material: Material::default(),
        }
    }

    /// Material given to primitives added from now on.
    pub fn set_material(&mut self, material: Material) -> &mut Self {
        self.material = material;
        self
    }
    pub fn material(&self) -> Material {
        self.material
    }

    pub fn add_shape(&mut self, shape: SimpleShape) -> &mut Self {
        let instance = Instance::new(shape, self.material);
        if instance.shape.is_bounded() {
            self.bounds = bvh::union(self.bounds, instance.bbox());
            self.bounded.push(instance);
        } else {
            log::debug!("{} is unbounded, kept out of the hierarchy", instance.shape.summary());
            self.planes.push(instance);
        }
        self
    }

    /// Adds a sphere. Non-positive radii and non-finite input are dropped with a warning.
    pub fn add_sphere(&mut self, center: Point3, radius: f32) -> &mut Self {
        match Sphere::new(center, radius) {
            Some(sphere) => self.add_shape(sphere.into()),
            None => {
                log::warn!("Dropping degenerate sphere {} r={}", center, radius);
                self
            }
        }
    }
    /// Adds a cylinder. Coinciding caps, non-positive radii and non-finite input are dropped with
    /// a warning.
    pub fn add_cylinder(&mut self, base: Point3, top: Point3, radius: f32) -> &mut Self {
        match Cylinder::new(base, top, radius) {
            Some(cylinder) => self.add_shape(cylinder.into()),
            None => {
                log::warn!("Dropping degenerate cylinder {} -> {} r={}", base, top, radius);
                self
            }
        }
    }
    /// Adds a triangle. Zero-area triangles are dropped with a warning.
    pub fn add_triangle(&mut self, p0: Point3, p1: Point3, p2: Point3) -> &mut Self {
        match Triangle::new(p0, p1, p2) {
            Some(tri) => self.add_shape(tri.into()),
            None => {
                log::warn!("Dropping zero-area triangle [{}, {}, {}]", p0, p1, p2);
                self
            }
        }
    }
    /// Adds the plane `{p | normal . p + offset = 0}`.
    pub fn add_plane(&mut self, normal: Vec3, offset: f32) -> &mut Self {
        self.add_shape(Plane::new(normal, offset).into())
    }

    /// Union of the extents of all bounded primitives.
    pub fn bounds(&self) -> BBox {
        self.bounds
    }
    pub fn bounded(&self) -> &[Instance] {
        &self.bounded
    }
    pub fn planes(&self) -> &[Instance] {
        &self.planes
    }
    pub fn len(&self) -> usize {
        self.bounded.len() + self.planes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a hierarchy over the bounded primitives.
    pub fn build_accel(&self, config: LbvhConfig) -> AcceleratedScene<'_> {
        let mut lbvh = Lbvh::new(config);
        lbvh.build(&self.bounded, self.bounds);
        log::info!(
            "Scene: {} bounded primitives, {} planes, {}",
            self.bounded.len(),
            self.planes.len(),
            lbvh.summary()
        );
        AcceleratedScene { scene: self, lbvh }
    }

    /// Closest hit over every primitive, without the hierarchy.
    pub fn linear_nearest(&self, r: &Ray) -> Option<Hit<'_>> {
        let best = nearest_in(&self.bounded, r, None);
        nearest_in(&self.planes, r, best)
    }

    /// Whether any primitive is hit, without the hierarchy.
    pub fn linear_occluded(&self, r: &Ray) -> bool {
        self.bounded.iter().chain(self.planes.iter()).any(|p| p.occludes(r))
    }
}

/// Scans `list` for a hit closer than `best`.
fn nearest_in<'s>(list: &'s [Instance], r: &Ray, best: Option<Hit<'s>>) -> Option<Hit<'s>> {
    list.iter()
        .enumerate()
        .filter_map(|(i, p)| p.intersect(r).map(|isect| (i, isect, p)))
        .fold(best, |best, (i, isect, instance)| match best {
            Some(b) if b.isect.distance <= isect.distance => Some(b),
            _ => Some(Hit {
                isect: isect.with_primitive(i),
                instance,
            }),
        })
}

/// A scene together with the hierarchy built over its bounded primitives. Queries merge the
/// hierarchy's answer with the unbounded planes.
pub struct AcceleratedScene<'s> {
    scene: &'s Scene,
    lbvh: Lbvh<'s, Instance>,
}

impl<'s> AcceleratedScene<'s> {
    pub fn scene(&self) -> &'s Scene {
        self.scene
    }
    pub fn lbvh(&self) -> &Lbvh<'s, Instance> {
        &self.lbvh
    }

    pub fn nearest_intersection(&self, r: &Ray) -> Result<Option<Hit<'s>>> {
        self.nearest_intersection_with_stats(r, &mut TraversalStats::default())
    }

    /// Same as `nearest_intersection()`, adding the hierarchy's work to `stats`.
    pub fn nearest_intersection_with_stats(
        &self,
        r: &Ray,
        stats: &mut TraversalStats,
    ) -> Result<Option<Hit<'s>>> {
        let mut isect = RayIntersection::none();
        self.lbvh
            .find_nearest_intersection_with_stats(r, &mut isect, stats)?;
        // Only a hit found by the hierarchy carries a primitive index.
        let best = isect.primitive.map(|index| Hit {
            isect,
            instance: &self.scene.bounded[index],
        });
        Ok(nearest_in(&self.scene.planes, r, best))
    }

    /// Whether anything blocks `r` within its extent.
    pub fn occluded(&self, r: &Ray) -> Result<bool> {
        if self.lbvh.find_intersection(r)? {
            return Ok(true);
        }
        Ok(self.scene.planes.iter().any(|p| p.occludes(r)))
    }

    /// Light of the given colour that reaches the end of the shadow feeler `r`, after being
    /// tinted and dimmed by everything in between.
    pub fn shadow_transmittance(&self, r: &Ray, light: Color) -> Result<Color> {
        let (mut color, mut transmittance) = (light, 1.0f32);
        self.lbvh
            .estimate_shadow_transmittance(r, &mut color, &mut transmittance)?;
        for plane in self.scene.planes.iter().filter(|p| p.occludes(r)) {
            let (tint, transparency) = plane.filter();
            transmittance *= transparency;
            color *= tint;
        }
        Ok(color * transmittance)
    }
}
