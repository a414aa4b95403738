use geometry::bvh::{self, BBox};
use geometry::interaction::RayIntersection;
use geometry::ray::Ray;
use lbvh::{Instance, Lbvh, LbvhConfig, NodeKind, Primitive, TraversalError, TraversalStats};
use material::Material;
use math::hcm::{point3, vec3, Point3, Vec3};
use radiometry::color::Color;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use shape::{Cylinder, Sphere, Triangle};

fn scene_bounds<P: Primitive>(prims: &[P]) -> BBox {
    prims
        .iter()
        .fold(BBox::empty(), |b, p| bvh::union(b, p.extent()))
}

fn random_point(rng: &mut StdRng, half_extent: f32) -> Point3 {
    point3(
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
    )
}

fn random_scene(rng: &mut StdRng, n: usize) -> Vec<Instance> {
    let mtl = Material::matte(Color::white());
    let mut prims = Vec::with_capacity(n);
    while prims.len() < n {
        let center = random_point(rng, 10.0);
        let inst = match rng.gen_range(0..3) {
            0 => Instance::from_raw(Sphere::new(center, rng.gen_range(0.05..0.6)).unwrap(), mtl),
            1 => match Cylinder::new(
                center,
                center + Vec3::from(random_point(rng, 1.0)),
                rng.gen_range(0.05..0.3),
            ) {
                Some(cylinder) => Instance::from_raw(cylinder, mtl),
                None => continue,
            },
            _ => match Triangle::new(
                center,
                center + Vec3::from(random_point(rng, 1.0)),
                center + Vec3::from(random_point(rng, 1.0)),
            ) {
                Some(tri) => Instance::from_raw(tri, mtl),
                None => continue,
            },
        };
        prims.push(inst);
    }
    prims
}

/// Random ray; roughly a third of them have a zero direction component.
fn random_ray(rng: &mut StdRng) -> Ray {
    let origin = random_point(rng, 15.0);
    let mut dir = Vec3::from(random_point(rng, 1.0));
    if rng.gen_bool(0.3) {
        dir[rng.gen_range(0..3)] = 0.0;
    }
    if dir.is_zero() {
        dir = Vec3::X;
    }
    Ray::new(origin, dir)
}

fn linear_nearest<P: Primitive>(prims: &[P], r: &Ray) -> Option<f32> {
    prims
        .iter()
        .filter_map(|p| p.intersect(r))
        .map(|hit| hit.distance)
        .fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.min(t))))
}

fn three_spheres() -> Vec<Instance> {
    let mtl = Material::matte(Color::white());
    [-2.0, 0.0, 2.0]
        .iter()
        .map(|&x| Instance::from_raw(Sphere::new(point3(x, 0.0, 0.0), 1.0).unwrap(), mtl))
        .collect()
}

/// Unit spheres lined up along the x axis.
fn sphere_row(n: usize, mtl: Material) -> Vec<Instance> {
    (0..n)
        .map(|i| Instance::from_raw(Sphere::new(point3(3.0 * i as f32, 0.0, 0.0), 1.0).unwrap(), mtl))
        .collect()
}

#[test]
fn structure_invariants() {
    let mut rng = StdRng::seed_from_u64(7);
    for &n in [1usize, 2, 3, 17, 256, 1000].iter() {
        let prims = random_scene(&mut rng, n);
        let mut bvh = Lbvh::new(LbvhConfig::default());
        bvh.build(&prims, scene_bounds(&prims));
        let nodes = bvh.nodes();

        assert_eq!(bvh.len(), n);
        assert_eq!(nodes.len(), 2 * n - 1);
        let mut seen = vec![false; n];
        for (i, node) in nodes.iter().enumerate() {
            match node.kind {
                NodeKind::Internal { left, right } => {
                    assert!(i < n - 1);
                    assert_eq!(node.bbox, bvh::union(nodes[left].bbox, nodes[right].bbox));
                }
                NodeKind::Leaf { primitive } => {
                    assert!(i >= n - 1);
                    assert!(!seen[primitive], "primitive {} in two leaves", primitive);
                    seen[primitive] = true;
                    assert_eq!(node.bbox, prims[primitive].extent());
                    assert_eq!(bvh.sorted_keys()[i - (n - 1)].1, primitive);
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
        let root = bvh.root_bbox().unwrap();
        assert!(prims.iter().all(|p| root.encloses(p.extent())));
        assert!(bvh.sorted_keys().windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn single_and_pair() {
    let prims = three_spheres();

    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims[..1], scene_bounds(&prims[..1]));
    assert_eq!(bvh.nodes().len(), 1);
    assert_eq!(bvh.nodes()[0].kind, NodeKind::Leaf { primitive: 0 });
    assert_eq!(bvh.height(), 1);
    let r = Ray::new(point3(-2.0, 0.0, -10.0), Vec3::Z);
    assert!(bvh.find_intersection(&r).unwrap());

    bvh.build(&prims[..2], scene_bounds(&prims[..2]));
    let nodes = bvh.nodes();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].kind, NodeKind::Internal { left: 1, right: 2 });
    assert!(nodes[1].is_leaf() && nodes[2].is_leaf());
    assert_eq!(nodes[1].parent, Some(0));
    assert_eq!(bvh.height(), 2);
}

#[test]
fn three_spheres_nearest_hit() {
    let prims = three_spheres();
    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, BBox::new(point3(-3.0, -1.0, -1.0), point3(3.0, 1.0, 1.0)));

    let r = Ray::new(point3(0.0, 0.0, -10.0), vec3(0.0, 0.0, 1.0));
    let mut best = RayIntersection::none();
    assert_eq!(bvh.find_nearest_intersection(&r, &mut best), Ok(true));
    assert_eq!(best.distance, 9.0);
    assert_eq!(best.normal, vec3(0.0, 0.0, -1.0));
    assert_eq!(best.primitive, Some(1));
    assert!(best.is_entering);

    // A closer hit that is already known is kept.
    let mut best = RayIntersection::none();
    best.distance = 5.0;
    assert_eq!(bvh.find_nearest_intersection(&r, &mut best), Ok(false));
    assert_eq!(best.distance, 5.0);
}

#[test]
fn root_miss_costs_one_box_test() {
    let prims = three_spheres();
    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, scene_bounds(&prims));

    let r = Ray::new(point3(0.0, 5.0, -10.0), vec3(0.0, 0.0, 1.0));
    let mut stats = TraversalStats::default();
    let mut best = RayIntersection::none();
    assert_eq!(
        bvh.find_nearest_intersection_with_stats(&r, &mut best, &mut stats),
        Ok(false)
    );
    assert_eq!(
        stats,
        TraversalStats {
            box_tests: 1,
            primitive_tests: 0,
            nodes_visited: 0
        }
    );
    assert!(!best.is_hit());
}

#[test]
fn nearest_hit_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(0xb1d);
    let prims = random_scene(&mut rng, 600);
    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, scene_bounds(&prims));

    let mut hits = 0;
    let mut stats = TraversalStats::default();
    for _ in 0..3000 {
        let r = random_ray(&mut rng);
        let mut best = RayIntersection::none();
        let found = bvh
            .find_nearest_intersection_with_stats(&r, &mut best, &mut stats)
            .unwrap();
        let expected = linear_nearest(&prims, &r);
        assert_eq!(found, expected.is_some(), "ray {}", r);
        assert_eq!(bvh.find_intersection(&r).unwrap(), expected.is_some(), "ray {}", r);
        if let Some(t) = expected {
            hits += 1;
            assert_eq!(best.distance, t, "ray {}", r);
            let index = best.primitive.unwrap();
            assert_eq!(prims[index].intersect(&r).unwrap().distance, t);
        }
    }
    assert!(hits > 300, "only {} hits", hits);
    // The hierarchy must prune: far fewer exact tests than a linear scan would do.
    assert!(stats.primitive_tests < 3000 * prims.len() / 10, "{:?}", stats);
}

#[test]
fn any_hit_respects_extent() {
    let prims = three_spheres();
    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, scene_bounds(&prims));
    let r = Ray::new(point3(2.0, 0.0, -10.0), Vec3::Z);
    assert_eq!(bvh.find_intersection(&r), Ok(true));
    assert_eq!(bvh.find_intersection(&r.with_extent(8.5)), Ok(false));
    assert_eq!(bvh.find_intersection(&r.with_extent(9.5)), Ok(true));
}

#[test]
fn rebuild_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(99);
    let prims = random_scene(&mut rng, 300);
    let bounds = scene_bounds(&prims);
    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, bounds);
    let (nodes, keys) = (bvh.nodes().to_vec(), bvh.sorted_keys().to_vec());
    bvh.build(&prims, bounds);
    assert_eq!(bvh.nodes(), &nodes[..]);
    assert_eq!(bvh.sorted_keys(), &keys[..]);

    // Shrinking the input shrinks the buffer to the exact size.
    bvh.build(&prims[..10], bounds);
    assert_eq!(bvh.nodes().len(), 19);
}

#[test]
fn empty_hierarchy_reports_nothing() {
    let prims: Vec<Instance> = vec![];
    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, BBox::empty());
    assert!(bvh.is_empty());
    assert_eq!(bvh.root_bbox(), None);
    assert_eq!(bvh.height(), 0);

    let r = Ray::new(Point3::ORIGIN, Vec3::X);
    let mut best = RayIntersection::none();
    assert_eq!(bvh.find_nearest_intersection(&r, &mut best), Ok(false));
    assert_eq!(bvh.find_intersection(&r), Ok(false));
    let (mut color, mut transmittance) = (Color::white(), 1.0);
    assert_eq!(
        bvh.estimate_shadow_transmittance(&r, &mut color, &mut transmittance),
        Ok(false)
    );
    assert_eq!(transmittance, 1.0);
}

#[test]
fn transmittance_through_stacked_glass() {
    let glass = Material::glass(Color::new(1.0, 0.5, 0.5), 0.5, 1.5);
    let prims: Vec<Instance> = [0.0, 3.0]
        .iter()
        .map(|&z| Instance::from_raw(Sphere::new(point3(0.0, 0.0, z), 1.0).unwrap(), glass))
        .collect();
    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, scene_bounds(&prims));

    let r = Ray::new(point3(0.0, 0.0, -5.0), Vec3::Z);
    let (mut color, mut transmittance) = (Color::white(), 1.0);
    assert_eq!(
        bvh.estimate_shadow_transmittance(&r, &mut color, &mut transmittance),
        Ok(true)
    );
    assert!((transmittance - 0.25).abs() < 1e-6);
    assert_eq!(color, Color::new(1.0, 0.25, 0.25));
}

#[test]
fn transmittance_stops_at_floor() {
    let glass = Material::glass(Color::white(), 0.5, 1.5);
    let prims = sphere_row(8, glass);
    let mut bvh = Lbvh::new(LbvhConfig::default().with_transmittance_floor(0.3));
    bvh.build(&prims, scene_bounds(&prims));

    let r = Ray::new(point3(-10.0, 0.0, 0.0), Vec3::X);
    let (mut color, mut transmittance) = (Color::white(), 1.0);
    let mut stats = TraversalStats::default();
    bvh.estimate_shadow_transmittance_with_stats(&r, &mut color, &mut transmittance, &mut stats)
        .unwrap();
    // Two crossings bring it to 0.25, below the floor.
    assert_eq!(transmittance, 0.25);
    assert_eq!(stats.primitive_tests, 2);
}

#[test]
fn stack_overflow_is_an_error() {
    let prims = sphere_row(64, Material::default());
    let r = Ray::new(point3(-10.0, 0.0, 0.0), Vec3::X);

    let mut bvh = Lbvh::new(LbvhConfig::default().with_stack_capacity(1));
    bvh.build(&prims, scene_bounds(&prims));
    assert!(bvh.height() > 3);
    let mut best = RayIntersection::none();
    assert_eq!(
        bvh.find_nearest_intersection(&r, &mut best),
        Err(TraversalError::StackOverflow { capacity: 1 })
    );

    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, scene_bounds(&prims));
    let mut best = RayIntersection::none();
    assert_eq!(bvh.find_nearest_intersection(&r, &mut best), Ok(true));
    assert_eq!(best.distance, 9.0);
    assert_eq!(best.primitive, Some(0));
}

#[test]
fn visit_budget_is_enforced() {
    let prims = sphere_row(64, Material::default());
    let mut bvh = Lbvh::new(LbvhConfig::default().with_visit_budget(Some(1)));
    bvh.build(&prims, scene_bounds(&prims));
    let r = Ray::new(point3(-10.0, 0.0, 0.0), Vec3::X);
    assert_eq!(
        bvh.find_intersection(&r),
        Err(TraversalError::VisitBudgetExceeded { budget: 1 })
    );
}

#[test]
fn concurrent_queries_agree_with_sequential_ones() {
    let mut rng = StdRng::seed_from_u64(2024);
    let prims = random_scene(&mut rng, 400);
    let mut bvh = Lbvh::new(LbvhConfig::default());
    bvh.build(&prims, scene_bounds(&prims));
    let rays: Vec<Ray> = (0..2000).map(|_| random_ray(&mut rng)).collect();

    let nearest = |r: &Ray| {
        let mut best = RayIntersection::none();
        bvh.find_nearest_intersection(r, &mut best).map(|_| best)
    };
    let parallel: Vec<_> = rays.par_iter().map(nearest).collect();
    let sequential: Vec<_> = rays.iter().map(nearest).collect();
    assert_eq!(parallel, sequential);
}
