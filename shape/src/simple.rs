use geometry::bvh::BBox;
use geometry::interaction::{RayIntersection, SURFACE_OFFSET};
use geometry::ray::Ray;
use math::hcm::{Point3, Vec3};

use crate::Shape;

/// Triangles and planes whose determinant falls below this are treated as parallel to the ray.
const PARALLEL_TOLERANCE: f32 = 1e-8;

#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    center: Point3,
    radius: f32,
}

impl Sphere {
    /// Creates a sphere. Returns `None` unless the radius is positive and everything is finite.
    pub fn new(center: Point3, radius: f32) -> Option<Sphere> {
        if !(radius > 0.0 && radius.is_finite() && center.is_finite()) {
            return None;
        }
        Some(Sphere { center, radius })
    }
    pub fn center(&self) -> Point3 {
        self.center
    }
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// Capped cylinder between the centers of its two end caps.
#[derive(Debug, Clone, Copy)]
pub struct Cylinder {
    base: Point3,
    top: Point3,
    radius: f32,
    axis: Vec3,
}

impl Cylinder {
    /// Creates a cylinder. Returns `None` if the caps coincide, or the radius is not positive, or
    /// anything is non-finite.
    pub fn new(base: Point3, top: Point3, radius: f32) -> Option<Cylinder> {
        if !(radius > 0.0 && radius.is_finite() && base.is_finite() && top.is_finite()) {
            return None;
        }
        let axis = (top - base).try_hat()?;
        Some(Cylinder {
            base,
            top,
            radius,
            axis,
        })
    }

    /// Parameter range `(t_in, t_out)` where the ray is inside the infinitely long cylinder.
    /// Rays parallel to the axis get an infinite range if they run inside it.
    fn infinite_span(&self, r: &Ray) -> Option<(f32, f32)> {
        let rc = r.origin() - self.base;
        let n = r.dir().cross(self.axis);
        let ln = n.norm();
        if ln < PARALLEL_TOLERANCE {
            let radial = rc - rc.projected_onto_unit(self.axis);
            return (radial.norm() <= self.radius).then(|| (f32::NEG_INFINITY, f32::INFINITY));
        }
        let n = n / ln;
        let d = rc.dot(n).abs();
        if d > self.radius {
            return None;
        }
        // Closest approach to the axis, then half the chord length in ray units.
        let t = -rc.cross(self.axis).dot(n) / ln;
        let o = n.cross(self.axis).hat();
        let s = ((self.radius * self.radius - d * d).sqrt() / r.dir().dot(o)).abs();
        Some((t - s, t + s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CylinderSide {
    Top,
    Side,
    Base,
}

#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    p0: Point3,
    e1: Vec3,
    e2: Vec3,
    normal: Vec3,
}

impl Triangle {
    /// Creates a triangle. Returns `None` if the three points are collinear.
    pub fn new(p0: Point3, p1: Point3, p2: Point3) -> Option<Triangle> {
        let (e1, e2) = (p1 - p0, p2 - p0);
        let normal = e1.cross(e2).try_hat()?;
        Some(Triangle { p0, e1, e2, normal })
    }
    pub fn vertices(&self) -> [Point3; 3] {
        [self.p0, self.p0 + self.e1, self.p0 + self.e2]
    }
    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

/// Infinite plane `{p | normal . p + offset = 0}`.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    normal: Vec3,
    offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Plane {
        Plane {
            normal: normal.hat(),
            offset,
        }
    }
    pub fn from_point_normal(p: Point3, normal: Vec3) -> Plane {
        let normal = normal.hat();
        Plane {
            normal,
            offset: -normal.dot(Vec3::from(p)),
        }
    }
    /// Plane through 3 points, normal following the right-hand rule. `None` if collinear.
    pub fn from_points(p0: Point3, p1: Point3, p2: Point3) -> Option<Plane> {
        let normal = (p1 - p0).cross(p2 - p1).try_hat()?;
        Some(Plane {
            normal,
            offset: -normal.dot(Vec3::from(p0)),
        })
    }
    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

// Implementation of the `Shape` trait for the shape implementations.

impl Shape for Sphere {
    fn summary(&self) -> String {
        format!("Sphere{{ {}, radius = {} }}", self.center, self.radius)
    }
    fn bbox(&self) -> BBox {
        let half_diagonal = Vec3::splat(self.radius);
        BBox::new(self.center - half_diagonal, self.center + half_diagonal)
    }
    fn intersect(&self, r: &Ray) -> Option<RayIntersection> {
        // r = o + td, sphere: (p-c)^2 = radius^2
        // t^2 d^2 - 2t d.(c-o) + (c-o)^2 - radius^2 = 0
        let f = self.center - r.origin();
        let a = r.dir().norm_squared();
        let b = r.dir().dot(f);
        let c = f.norm_squared() - self.radius * self.radius;
        let delta = b * b - a * c;
        if delta < 0.0 || a == 0.0 {
            return None;
        }
        let root = delta.sqrt();
        let (t_near, t_far) = ((b - root) / a, (b + root) / a);
        // The far root is an exit: the ray starts inside (or on) the sphere.
        let (t, is_entering) = match (r.truncated_t(t_near), r.truncated_t(t_far)) {
            (Some(t), _) => (t, true),
            (None, Some(t)) => (t, false),
            (None, None) => return None,
        };
        let pos = r.position_at(t);
        let outward = (pos - self.center) / self.radius;
        let normal = if is_entering { outward } else { -outward };
        Some(RayIntersection::new(
            t,
            pos + normal * SURFACE_OFFSET,
            normal,
            is_entering,
        ))
    }
    fn occludes(&self, r: &Ray) -> bool {
        let f = self.center - r.origin();
        let a = r.dir().norm_squared();
        let b = r.dir().dot(f);
        let c = f.norm_squared() - self.radius * self.radius;
        let delta = b * b - a * c;
        if delta < 0.0 || a == 0.0 {
            return false;
        }
        let root = delta.sqrt();
        r.truncated_t((b - root) / a).is_some() || r.truncated_t((b + root) / a).is_some()
    }
}

impl Shape for Cylinder {
    fn summary(&self) -> String {
        format!(
            "Cylinder{{ {} -> {}, radius = {} }}",
            self.base, self.top, self.radius
        )
    }
    fn bbox(&self) -> BBox {
        let r = Vec3::splat(self.radius);
        BBox::new(self.base.min(self.top) - r, self.base.max(self.top) + r)
    }
    fn intersect(&self, r: &Ray) -> Option<RayIntersection> {
        let (mut t_in, mut t_out) = self.infinite_span(r)?;
        let (mut side_in, mut side_out) = (CylinderSide::Side, CylinderSide::Side);

        // Clips the span with the two cap planes. Each plane is given by its outward normal and
        // a point on it; `dw < 0` means the origin is on the inner side.
        let caps = [
            (-self.axis, self.base, CylinderSide::Base),
            (self.axis, self.top, CylinderSide::Top),
        ];
        for &(cap_normal, cap_center, side) in caps.iter() {
            let dc = cap_normal.dot(r.dir());
            let dw = cap_normal.dot(r.origin() - cap_center);
            if dc == 0.0 {
                if dw >= 0.0 {
                    return None;
                }
                continue;
            }
            let t = -dw / dc;
            if dc > 0.0 {
                // Leaving through this cap.
                if t > t_in && t < t_out {
                    t_out = t;
                    side_out = side;
                }
                if t < t_in {
                    return None;
                }
            } else {
                // Entering through this cap.
                if t > t_in && t < t_out {
                    t_in = t;
                    side_in = side;
                }
                if t > t_out {
                    return None;
                }
            }
        }

        let (t, side, is_entering) = if let Some(t) = r.truncated_t(t_in) {
            (t, side_in, true)
        } else if let Some(t) = r.truncated_t(t_out) {
            (t, side_out, false)
        } else {
            return None;
        };
        let pos = r.position_at(t);
        let outward = match side {
            CylinderSide::Top => self.axis,
            CylinderSide::Base => -self.axis,
            CylinderSide::Side => {
                let v = pos - self.base;
                (v - v.projected_onto_unit(self.axis)).try_hat()?
            }
        };
        let normal = if is_entering { outward } else { -outward };
        Some(RayIntersection::new(
            t,
            pos + normal * SURFACE_OFFSET,
            normal,
            is_entering,
        ))
    }
}

impl Shape for Triangle {
    fn summary(&self) -> String {
        format!("Triangle boxed by {}", self.bbox())
    }
    fn bbox(&self) -> BBox {
        let [p0, p1, p2] = self.vertices();
        BBox::new(p0, p1).union(p2)
    }
    fn intersect(&self, r: &Ray) -> Option<RayIntersection> {
        // Moller-Trumbore: solves o + td = p0 + u e1 + v e2 by Cramer's rule.
        let h = r.dir().cross(self.e2);
        let det = self.e1.dot(h);
        if det.abs() < PARALLEL_TOLERANCE {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = r.origin() - self.p0;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(self.e1);
        let v = inv_det * r.dir().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = r.truncated_t(inv_det * self.e2.dot(q))?;
        let is_entering = self.normal.dot(r.dir()) < 0.0;
        let normal = if is_entering { self.normal } else { -self.normal };
        Some(RayIntersection::new(
            t,
            r.position_at(t) + normal * SURFACE_OFFSET,
            normal,
            is_entering,
        ))
    }
}

impl Shape for Plane {
    fn summary(&self) -> String {
        format!("Plane{{ normal = {}, offset = {} }}", self.normal, self.offset)
    }
    fn bbox(&self) -> BBox {
        BBox::from_corners(
            Point3::splat(f32::NEG_INFINITY),
            Point3::splat(f32::INFINITY),
        )
    }
    fn intersect(&self, r: &Ray) -> Option<RayIntersection> {
        let n_dot_d = self.normal.dot(r.dir());
        if n_dot_d.abs() < PARALLEL_TOLERANCE {
            return None;
        }
        let n_dot_o = self.normal.dot(Vec3::from(r.origin()));
        let t = r.truncated_t(-(n_dot_o + self.offset) / n_dot_d)?;
        let is_entering = n_dot_d < 0.0;
        let normal = if is_entering { self.normal } else { -self.normal };
        Some(RayIntersection::new(
            t,
            r.position_at(t) + normal * SURFACE_OFFSET,
            normal,
            is_entering,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::{point3, vec3};

    #[test]
    fn sphere_from_inside_exits_with_flipped_normal() {
        let s = Sphere::new(Point3::ORIGIN, 2.0).unwrap();
        let r = Ray::new(Point3::ORIGIN, vec3(0.0, 0.0, 1.0));
        let hit = s.intersect(&r).unwrap();
        assert!(!hit.is_entering);
        assert_eq!(hit.distance, 2.0);
        assert_eq!(hit.normal, vec3(0.0, 0.0, -1.0));
        // Nudged back inside.
        assert!(hit.point.z < 2.0);
    }

    #[test]
    fn sphere_respects_extent() {
        let s = Sphere::new(point3(0.0, 0.0, 5.0), 1.0).unwrap();
        let r = Ray::new(Point3::ORIGIN, vec3(0.0, 0.0, 2.0));
        assert_eq!(s.intersect(&r).unwrap().distance, 2.0);
        assert!(s.occludes(&r));
        let r = r.with_extent(1.5);
        assert!(s.intersect(&r).is_none());
        assert!(!s.occludes(&r));
    }

    #[test]
    fn plane_is_unbounded() {
        let p = Plane::from_point_normal(point3(0.0, -1.0, 0.0), Vec3::Y);
        assert!(!p.bbox().is_finite());
        let hit = p
            .intersect(&Ray::new(Point3::ORIGIN, vec3(0.0, -1.0, 0.0)))
            .unwrap();
        assert_eq!(hit.distance, 1.0);
        assert!(hit.is_entering);
        assert_eq!(hit.normal, Vec3::Y);
        assert!(p.intersect(&Ray::new(Point3::ORIGIN, Vec3::X)).is_none());
    }
}
