//! Hittable trait and HitRecord for ray-object intersection.

use crate::{Material, Ray};
use lumen_math::{Interval, Vec3};

/// Record of a ray-object intersection.
///
/// Lives only for the evaluation of a single bounce; the material is
/// borrowed from the object that was hit.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record for a hit at `t`, orienting the normal against the ray.
    pub fn new(ray: &Ray, t: f32, outward_normal: Vec3, material: &'a dyn Material) -> Self {
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };

        Self {
            p: ray.at(t),
            normal,
            material,
            t,
            front_face,
        }
    }
}

/// Trait for objects that can be hit by rays.
///
/// The scene is shared read-only by every worker thread during a render.
pub trait Hittable: Send + Sync {
    /// Find the nearest intersection with parameter strictly inside `ray_t`.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>>;
}

/// A list of hittable objects.
#[derive(Default)]
pub struct HittableList {
    objects: Vec<Box<dyn Hittable>>,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: Box<dyn Hittable>) {
        self.objects.push(object);
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let mut closest: Option<HitRecord<'_>> = None;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if let Some(rec) = object.hit(ray, ray_t.with_max(closest_so_far)) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Sphere};

    fn gray() -> Lambertian {
        Lambertian::new(Vec3::splat(0.5))
    }

    #[test]
    fn test_face_normal_orientation() {
        let mat = gray();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let outside = HitRecord::new(&ray, 1.0, Vec3::Z, &mat);
        assert!(outside.front_face);
        assert_eq!(outside.normal, Vec3::Z);

        let inside = HitRecord::new(&ray, 1.0, Vec3::NEG_Z, &mat);
        assert!(!inside.front_face);
        assert_eq!(inside.normal, Vec3::Z);
        assert_eq!(inside.p, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_list_returns_closest_hit() {
        let mut world = HittableList::new();
        world.add(Box::new(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 0.5, gray())));
        world.add(Box::new(Sphere::new(Vec3::new(0.0, 0.0, -2.0), 0.5, gray())));
        assert_eq!(world.len(), 2);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let rec = world
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("ray should hit the near sphere");
        assert!((rec.t - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_empty_list_misses() {
        let mut world = HittableList::new();
        world.add(Box::new(Sphere::new(Vec3::new(0.0, 0.0, -2.0), 0.5, gray())));
        world.clear();
        assert!(world.is_empty());

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(world.hit(&ray, Interval::UNIVERSE).is_none());
    }
}
