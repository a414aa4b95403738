use std::fmt::{Display, Formatter, Result};

use math::hcm::{Point3, Vec3};

/// Ordered axis pairs `(a, b)` for which a ray caches the slope `d_b / d_a` and the offset of
/// the line `b = slope * a + offset` in the plane spanned by the two axes.
pub const SLOPE_PAIRS: [(usize, usize); 6] = [(0, 1), (1, 0), (1, 2), (2, 1), (0, 2), (2, 0)];

/// Sign pattern of a ray direction: each axis is negative, zero or positive, giving 27 classes.
///
/// The class index is `9 * sx + 3 * sy + sz` where each sign is encoded as N = 0, O = 1, P = 2,
/// so that `NNN` is 0 and `PPP` is 26.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RayClass(u8);

impl RayClass {
    pub const COUNT: usize = 27;

    pub fn from_dir(dir: Vec3) -> RayClass {
        let code = |v: f32| -> u8 {
            if v < 0.0 {
                0
            } else if v > 0.0 {
                2
            } else {
                1
            }
        };
        RayClass(code(dir.x) * 9 + code(dir.y) * 3 + code(dir.z))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Per-axis signs as -1, 0 or 1.
    pub fn signs(self) -> [i8; 3] {
        let c = self.0 as i8;
        [c / 9 - 1, (c / 3) % 3 - 1, c % 3 - 1]
    }

    /// Direction with no non-zero component; such rays overlap nothing.
    pub fn is_degenerate(self) -> bool {
        self.0 == 13
    }
}

impl Display for RayClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for s in self.signs().iter() {
            let c = match s {
                -1 => 'N',
                0 => 'O',
                _ => 'P',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Represents a ray:
///
///   origin + t * direction
///
/// where t is positive.
///
/// The extent of the ray is by default infinite, but can be set to a positive number so that
/// shapes ignore hits beyond it (shadow feelers toward a light, for example). Box tests ignore the
/// extent: the traversal kernels order themselves by hit distance instead.
///
/// Construction precomputes everything the slope box test needs (reciprocal direction, cross
/// slopes, offsets, sign class), so origin and direction are only reachable through getters and
/// changed through `update()`.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    origin: Point3,
    dir: Vec3,
    pub t_max: f32,
    inv_dir: Vec3,
    slopes: [f32; 6],
    offsets: [f32; 6],
    class: RayClass,
}

impl Ray {
    pub fn new(origin: Point3, dir: Vec3) -> Self {
        let inv_dir = dir.recip();
        let mut slopes = [0.0; 6];
        let mut offsets = [0.0; 6];
        for (k, &(a, b)) in SLOPE_PAIRS.iter().enumerate() {
            slopes[k] = dir[b] * inv_dir[a];
            offsets[k] = origin[b] - slopes[k] * origin[a];
        }
        Ray {
            origin,
            dir,
            t_max: f32::INFINITY,
            inv_dir,
            slopes,
            offsets,
            class: RayClass::from_dir(dir),
        }
    }

    /// Re-aims the ray, recomputing the cached classification. The extent is kept.
    pub fn update(&mut self, origin: Point3, dir: Vec3) {
        let t_max = self.t_max;
        *self = Ray::new(origin, dir).with_extent(t_max);
    }

    pub fn with_extent(self, t_max: f32) -> Self {
        Ray { t_max, ..self }
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }
    pub fn dir(&self) -> Vec3 {
        self.dir
    }
    pub fn inv_dir(&self) -> Vec3 {
        self.inv_dir
    }
    pub fn class(&self) -> RayClass {
        self.class
    }
    /// Slope of the `k`-th pair in `SLOPE_PAIRS`.
    pub fn slope(&self, k: usize) -> f32 {
        self.slopes[k]
    }
    /// Offset of the `k`-th pair in `SLOPE_PAIRS`.
    pub fn offset(&self, k: usize) -> f32 {
        self.offsets[k]
    }

    /// Returns `None` if the given `t` is outside the ray's extent [0.0, `r.t_max`).
    /// `Some(t)` otherwise.
    pub fn truncated_t(&self, t: f32) -> Option<f32> {
        if t < f32::EPSILON || t >= self.t_max {
            None
        } else {
            Some(t)
        }
    }

    pub fn position_at(&self, t: f32) -> Point3 {
        self.origin + t * self.dir
    }
}

impl Display for Ray {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "{:.precision$} + t{:.precision$} [{}]",
            self.origin,
            self.dir,
            self.class,
            precision = precision
        )
    }
}
