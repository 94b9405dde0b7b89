use super::*;

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

// --- Camera ---

#[test]
fn default_camera_looks_down_negative_z() {
    let camera = Camera::default();
    assert!(approx_vec3(camera.forward, Vec3::NEG_Z));
    assert!(approx_vec3(camera.right, Vec3::X));
    assert!(approx_vec3(camera.up, Vec3::Y));
}

#[test]
fn project_unit_x_at_origin_plane() {
    let camera = Camera::default();
    let ndc = camera.project(Vec3::X);
    assert!(approx(ndc.x, 1.0 / (10.0 * 22.5_f32.to_radians().tan())));
    assert!(approx(ndc.y, 0.0));
}

#[test]
fn ray_through_projected_point_hits_it() {
    let camera = Camera::default();
    let world = Vec3::new(0.7, -0.4, 0.0);
    let ray = camera.ray(camera.project(world));
    let hit = ray.intersect_plane(&Plane::new(Vec3::ZERO, Vec3::Z)).expect("facing plane");
    assert!(approx_vec3(hit, world));
}

#[test]
fn center_ray_is_forward() {
    let camera = Camera::default();
    let ray = camera.ray(Vec2::ZERO);
    assert!(approx_vec3(ray.origin, camera.eye));
    assert!(approx_vec3(ray.direction, Vec3::NEG_Z));
}

#[test]
fn orthographic_rays_are_parallel() {
    let camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 5.0);
    let a = camera.ray(Vec2::new(-1.0, 0.0));
    let b = camera.ray(Vec2::new(1.0, 1.0));
    assert!(approx_vec3(a.direction, b.direction));
    assert!(approx_vec3(a.origin, Vec3::new(-5.0, 0.0, 10.0)));
    assert!(approx_vec3(b.origin, Vec3::new(5.0, 5.0, 10.0)));
    let ndc = camera.project(Vec3::new(2.5, -5.0, 0.0));
    assert!(approx(ndc.x, 0.5));
    assert!(approx(ndc.y, -1.0));
}

#[test]
fn looking_straight_down_still_has_a_basis() {
    let camera = Camera::look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::Y);
    assert!(approx(camera.right.length(), 1.0));
    assert!(approx(camera.up.length(), 1.0));
    assert!(approx(camera.right.dot(camera.forward), 0.0));
}

// --- Ray ---

#[test]
fn parallel_ray_misses_plane() {
    let ray = Ray { origin: Vec3::ZERO, direction: Vec3::X };
    assert!(ray.intersect_plane(&Plane::new(Vec3::Z, Vec3::Z)).is_none());
}

#[test]
fn plane_behind_ray_is_missed() {
    let ray = Ray { origin: Vec3::ZERO, direction: Vec3::Z };
    assert!(ray.intersect_plane(&Plane::new(Vec3::new(0.0, 0.0, -1.0), Vec3::Z)).is_none());
}

#[test]
fn distance_to_point_measures_perpendicular() {
    let ray = Ray { origin: Vec3::ZERO, direction: Vec3::NEG_Z };
    assert!(approx(ray.distance_to_point(Vec3::new(0.3, 0.0, -5.0)), 0.3));
    // Behind the origin the distance is to the origin itself.
    assert!(approx(ray.distance_to_point(Vec3::new(0.0, 0.0, 2.0)), 2.0));
}
