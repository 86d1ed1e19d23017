//! Camera settings and the viewport geometry derived from them.

use crate::{gen_f32, RenderError, RenderResult};
use lumen_math::{Ray, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// User-facing camera parameters.
///
/// Changing any of these requires a fresh [`Viewport`]; go through
/// [`Camera::set_settings`](crate::Camera::set_settings) so that happens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Image width over image height
    pub aspect_ratio: f64,
    /// Rendered image width in pixels
    pub image_width: u32,
    /// Vertical field of view in degrees
    pub vfov: f32,
    /// Point the camera is looking from
    pub look_from: Vec3,
    /// Point the camera is looking at
    pub look_at: Vec3,
    /// Camera-relative "up" direction
    pub vup: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: 16.0 / 9.0,
            image_width: 400,
            vfov: 90.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
        }
    }
}

impl CameraSettings {
    /// Set image width and aspect ratio.
    pub fn with_resolution(mut self, image_width: u32, aspect_ratio: f64) -> Self {
        self.image_width = image_width;
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set vertical field of view in degrees.
    pub fn with_vfov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// Image height implied by width and aspect ratio, never below one row.
    pub fn image_height(&self) -> u32 {
        let height = (self.image_width as f64 / self.aspect_ratio) as u32;
        height.max(1)
    }

    /// Reject configurations that would produce NaN or degenerate geometry.
    pub fn validate(&self) -> RenderResult<()> {
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(RenderError::InvalidAspectRatio(self.aspect_ratio));
        }
        if self.image_width == 0 {
            return Err(RenderError::InvalidImageWidth);
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return Err(RenderError::InvalidFieldOfView(self.vfov));
        }
        for (name, vector) in [
            ("look_from", self.look_from),
            ("look_at", self.look_at),
            ("vup", self.vup),
        ] {
            if !vector.is_finite() {
                return Err(RenderError::NonFiniteCamera(name));
            }
        }
        // Written so that NaN lengths fail the check too
        if !((self.look_from - self.look_at).length() > f32::EPSILON) {
            return Err(RenderError::DegenerateView(self.look_from.to_array()));
        }
        Ok(())
    }
}

/// Camera geometry for one set of [`CameraSettings`].
///
/// Read-only while a render is running; shared by every worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    image_width: u32,
    image_height: u32,
    center: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    pixel00_loc: Vec3,
}

impl Viewport {
    /// Derive the viewport from camera settings.
    pub fn new(settings: &CameraSettings) -> RenderResult<Self> {
        settings.validate()?;

        let image_width = settings.image_width;
        let image_height = settings.image_height();
        let center = settings.look_from;

        let view = settings.look_from - settings.look_at;
        let focal_length = view.length();

        let theta = settings.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * focal_length;
        let viewport_width = viewport_height * (image_width as f32 / image_height as f32);

        // Orthonormal basis; w points away from the scene
        let w = view / focal_length;
        let side = settings.vup.cross(w);
        if !(side.length_squared() > 1e-12) {
            return Err(RenderError::ParallelUpVector);
        }
        let u = side.normalize();
        let v = w.cross(u);

        // Edges of the viewport; v is flipped so rows grow downward
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / image_width as f32;
        let pixel_delta_v = viewport_v / image_height as f32;

        let viewport_upper_left = center - focal_length * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        Ok(Self {
            image_width,
            image_height,
            center,
            u,
            v,
            w,
            pixel_delta_u,
            pixel_delta_v,
            pixel00_loc,
        })
    }

    /// Generate a jittered ray through pixel (i, j).
    ///
    /// The sample point is drawn uniformly over the pixel footprint (box
    /// filter) using the caller's stream.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        Ray::new(self.center, pixel_sample - self.center)
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Camera basis `(u, v, w)`: right, up, backward.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    pub fn pixel_delta_u(&self) -> Vec3 {
        self.pixel_delta_u
    }

    pub fn pixel_delta_v(&self) -> Vec3 {
        self.pixel_delta_v
    }

    /// Center of the top-left pixel.
    pub fn pixel00_loc(&self) -> Vec3 {
        self.pixel00_loc
    }
}

/// Sample a random point in the square [-0.5, 0.5) x [-0.5, 0.5).
fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, 0.0)
}
