//! Core path tracing integrator.
//!
//! Implements Monte Carlo path tracing with:
//! - Iterative light-path tracing bounded by a bounce budget
//! - Box-filter anti-aliasing via multi-sampling
//! - Gamma correction and 8-bit quantization

use crate::{Color, Hittable, RenderError, RenderResult, Viewport};
use lumen_math::{Interval, Ray};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Minimum hit distance; keeps bounced rays off the surface they left.
pub const T_MIN: f32 = 0.001;

/// Displayable intensity range before scaling to a byte.
const INTENSITY: Interval = Interval::new(0.000, 0.999);

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum number of bounces along one light path
    pub max_depth: u32,
    /// Base seed for the per-scanline random streams
    pub seed: u64,
    /// Worker thread count; `None` uses the hardware parallelism
    pub threads: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 10,
            max_depth: 10,
            seed: 0,
            threads: None,
        }
    }
}

impl RenderConfig {
    /// Check sampling and threading parameters.
    pub fn validate(&self) -> RenderResult<()> {
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidSampleCount);
        }
        if self.threads == Some(0) {
            return Err(RenderError::NoWorkers);
        }
        Ok(())
    }

    /// Number of workers for an image `image_height` rows tall.
    ///
    /// Never more workers than rows, so no worker is left without a chunk.
    pub fn worker_count(&self, image_height: u32) -> RenderResult<usize> {
        let requested = match self.threads {
            Some(0) => return Err(RenderError::NoWorkers),
            Some(n) => n,
            None => std::thread::available_parallelism()
                .map_err(RenderError::Parallelism)?
                .get(),
        };

        let rows = image_height.max(1) as usize;
        if requested > rows {
            log::warn!(
                "Requested {} threads for {} scanlines, using {}",
                requested,
                image_height,
                rows
            );
        }
        Ok(requested.min(rows))
    }
}

/// Random stream for scanline `y`.
///
/// Every row gets its own deterministically seeded generator, so the image
/// does not depend on which worker rendered the row.
pub fn scanline_rng(seed: u64, y: u32) -> StdRng {
    StdRng::seed_from_u64(seed ^ (y as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Estimate the radiance arriving along `ray`.
///
/// Follows the path bounce by bounce, carrying the product of attenuations.
/// The path ends in the sky on a miss, in black on absorption, and in black
/// once `max_depth` bounces are used up.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    max_depth: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut ray = *ray;
    let mut throughput = Color::ONE;

    for _ in 0..max_depth {
        let Some(rec) = world.hit(&ray, Interval::new(T_MIN, f32::INFINITY)) else {
            return throughput * sky_gradient(&ray);
        };

        match rec.material.scatter(&ray, &rec, rng) {
            Some(result) => {
                throughput *= result.attenuation;
                ray = result.scattered;
            }
            None => return Color::ZERO,
        }
    }

    Color::ZERO
}

/// Sky background: white at the horizon blending to blue overhead.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to display-encoded RGB bytes.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let quantize = |c: f32| (256.0 * INTENSITY.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Average `samples_per_pixel` radiance estimates for pixel (x, y).
pub fn render_pixel(
    viewport: &Viewport,
    world: &dyn Hittable,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..config.samples_per_pixel {
        let ray = viewport.get_ray(x, y, rng);
        pixel_color += ray_color(&ray, world, config.max_depth, rng);
    }

    pixel_color / config.samples_per_pixel as f32
}
