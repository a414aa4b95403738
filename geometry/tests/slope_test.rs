use geometry::bvh::BBox;
use geometry::ray::{Ray, RayClass};
use math::hcm::{point3, vec3, Point3, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_point(rng: &mut StdRng, half_extent: f32) -> Point3 {
    point3(
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
    )
}

fn random_dir_in_class(rng: &mut StdRng, signs: [i8; 3]) -> Vec3 {
    let mut dir = Vec3::ZERO;
    for axis in 0..3 {
        dir[axis] = signs[axis] as f32 * rng.gen_range(0.1..2.0);
    }
    dir
}

fn grown(b: &BBox, by: f32) -> BBox {
    let d = Vec3::splat(by);
    BBox::new(b.min() - d, b.max() + d)
}

/// Unclipped slab entry parameter for a ray known to hit.
fn slab_entry(b: &BBox, r: &Ray) -> f32 {
    let (o, inv) = (r.origin(), r.inv_dir());
    let mut t_min = f32::NEG_INFINITY;
    for axis in 0..3 {
        if r.dir()[axis] == 0.0 {
            continue;
        }
        let t0 = (b.min()[axis] - o[axis]) * inv[axis];
        let t1 = (b.max()[axis] - o[axis]) * inv[axis];
        t_min = t_min.max(t0.min(t1));
    }
    t_min
}

#[test]
fn slope_test_agrees_with_slab_test_in_every_class() {
    let mut rng = StdRng::seed_from_u64(0x5107e);
    let mut compared = [0usize; RayClass::COUNT];
    let mut hits = [0usize; RayClass::COUNT];

    for index in 0..RayClass::COUNT {
        let signs = {
            let i = index as i8;
            [i / 9 - 1, (i / 3) % 3 - 1, i % 3 - 1]
        };
        for _ in 0..3000 {
            let b = BBox::new(random_point(&mut rng, 2.0), random_point(&mut rng, 2.0));
            let r = Ray::new(
                random_point(&mut rng, 4.0),
                random_dir_in_class(&mut rng, signs),
            );
            assert_eq!(r.class().index(), index);
            if r.class().is_degenerate() {
                assert!(!b.overlaps(&r));
                assert_eq!(b.entry_distance(&r), None);
                continue;
            }
            // Skip grazing cases where rounding may legitimately flip the answer.
            let (inner, outer) = (grown(&b, -1e-3), grown(&b, 1e-3));
            let expected = b.intersect(&r);
            if inner.intersect(&r) != outer.intersect(&r) {
                continue;
            }
            compared[index] += 1;
            assert_eq!(
                b.overlaps(&r),
                expected,
                "class {}, ray {:.4}, box {}",
                r.class(),
                r,
                b
            );
            if expected {
                hits[index] += 1;
                let t = b.entry_distance(&r).unwrap();
                let reference = slab_entry(&b, &r);
                assert!(
                    (t - reference).abs() < 1e-3 * reference.abs().max(1.0),
                    "class {}: entry {} vs. slab {}",
                    r.class(),
                    t,
                    reference
                );
            } else {
                assert_eq!(b.entry_distance(&r), None);
            }
        }
    }
    for index in 0..RayClass::COUNT {
        if index == 13 {
            continue;
        }
        assert!(compared[index] > 2000, "class {} only compared {}", index, compared[index]);
        assert!(hits[index] > 0, "class {} never hit", index);
    }
}

#[test]
fn axis_aligned_rays_along_faces() {
    let b = BBox::new(point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 1.0));
    // Sliding exactly along the y = 1 face counts as a hit, closed boundaries.
    let r = Ray::new(point3(-1.0, 1.0, 0.5), vec3(1.0, 0.0, 0.0));
    assert!(b.overlaps(&r));
    assert_eq!(b.entry_distance(&r), Some(1.0));
    let r = Ray::new(point3(-1.0, 1.001, 0.5), vec3(1.0, 0.0, 0.0));
    assert!(!b.overlaps(&r));
}

#[test]
fn origin_past_the_box_misses() {
    let b = BBox::new(point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 1.0));
    for &dir in [vec3(1.0, 1.0, 1.0), vec3(1.0, 0.0, 0.0), vec3(1.0, -0.5, 0.25)].iter() {
        let r = Ray::new(point3(1.5, 0.5, 0.5), dir);
        assert!(!b.overlaps(&r), "{}", r);
    }
}
