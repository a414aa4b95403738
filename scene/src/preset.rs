use itertools::iproduct;
use material::Material;
use math::hcm::{Point3, Vec3};
use radiometry::color::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Scene;

/// Names accepted by `by_name()`.
pub const PRESET_NAMES: [&str; 5] = [
    "three_spheres",
    "stacked_glass",
    "random_spheres",
    "mixed_primitives",
    "sphere_grid",
];

const RANDOM_SPHERE_COUNT: usize = 20_000;
const GRID_SIDE: usize = 24;

/// Builds one of the preset scenes. Only the random ones look at `seed`.
pub fn by_name(name: &str, seed: u64) -> Option<Scene> {
    match name {
        "three_spheres" => Some(three_spheres()),
        "stacked_glass" => Some(stacked_glass()),
        "random_spheres" => Some(random_spheres(RANDOM_SPHERE_COUNT, seed)),
        "mixed_primitives" => Some(mixed_primitives(seed)),
        "sphere_grid" => Some(sphere_grid(GRID_SIDE)),
        _ => None,
    }
}

fn random_color(rng: &mut StdRng) -> Color {
    Color::new(rng.gen(), rng.gen(), rng.gen())
}

fn random_material(rng: &mut StdRng) -> Material {
    let choose_mtl = rng.gen::<f32>();
    if choose_mtl < 0.6 {
        Material::matte(random_color(rng))
    } else if choose_mtl < 0.8 {
        Material::plastic(random_color(rng), rng.gen_range(10.0..100.0))
    } else {
        let tint = (random_color(rng) + Color::white()) * 0.5;
        Material::glass(tint, rng.gen_range(0.3..0.9), 1.5)
    }
}

fn random_point(rng: &mut StdRng, half_extent: f32) -> Point3 {
    Point3::new(
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
    )
}

/// Three unit spheres on the x axis, at x = -2, 0, 2.
pub fn three_spheres() -> Scene {
    let mut scene = Scene::new();
    scene.set_material(Material::matte(Color::white()));
    for x in [-2.0, 0.0, 2.0].iter() {
        scene.add_sphere(Point3::new(*x, 0.0, 0.0), 1.0);
    }
    scene
}

/// Two half-transparent reddish glass spheres stacked along z, above an opaque floor at y = -2.
pub fn stacked_glass() -> Scene {
    let mut scene = Scene::new();
    scene.set_material(Material::glass(Color::new(1.0, 0.5, 0.5), 0.5, 1.5));
    scene
        .add_sphere(Point3::new(0.0, 0.0, 0.0), 1.0)
        .add_sphere(Point3::new(0.0, 0.0, 3.0), 1.0);
    scene
        .set_material(Material::matte(Color::gray(0.5)))
        .add_plane(Vec3::Y, 2.0);
    scene
}

/// `n` spheres scattered in a 100-unit cube around the origin.
pub fn random_spheres(n: usize, seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scene = Scene::new();
    for _ in 0..n {
        let center = random_point(&mut rng, 50.0);
        let radius = rng.gen_range(0.2..2.0);
        let mtl = random_material(&mut rng);
        scene.set_material(mtl).add_sphere(center, radius);
    }
    scene
}

/// A few hundred spheres, cylinders and triangles of random materials, standing on a floor plane
/// in front of a back wall.
pub fn mixed_primitives(seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scene = Scene::new();

    scene
        .set_material(Material::matte(Color::gray(0.4)))
        .add_plane(Vec3::Y, 20.0)
        .add_plane(Vec3::new(0.0, 0.0, -1.0), 40.0);

    for _ in 0..200 {
        let mtl = random_material(&mut rng);
        scene.set_material(mtl);
        let anchor = random_point(&mut rng, 15.0);
        match rng.gen_range(0..3) {
            0 => {
                scene.add_sphere(anchor, rng.gen_range(0.3..1.5));
            }
            1 => {
                let axis = random_point(&mut rng, 1.0);
                let top = anchor + Vec3::from(axis) * 3.0;
                scene.add_cylinder(anchor, top, rng.gen_range(0.2..0.8));
            }
            _ => {
                let p1 = anchor + Vec3::from(random_point(&mut rng, 2.0));
                let p2 = anchor + Vec3::from(random_point(&mut rng, 2.0));
                scene.add_triangle(anchor, p1, p2);
            }
        }
    }
    scene
}

/// `k * k * k` spheres of radius 0.4 on the integer lattice, coloured by position.
pub fn sphere_grid(k: usize) -> Scene {
    let mut scene = Scene::new();
    let inv = 1.0 / k.max(1) as f32;
    for (i, j, l) in iproduct!(0..k, 0..k, 0..k) {
        let color = Color::new(i as f32 * inv, j as f32 * inv, l as f32 * inv);
        scene
            .set_material(Material::plastic(color, 32.0))
            .add_sphere(Point3::new(i as f32, j as f32, l as f32), 0.4);
    }
    scene
}
