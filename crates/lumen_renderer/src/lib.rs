//! Lumen - multithreaded CPU path tracing.
//!
//! A [`Camera`] derives its [`Viewport`] from [`CameraSettings`], splits the
//! image into one scanline chunk per worker thread, estimates the radiance of
//! every pixel with [`ray_color`], tone maps the averages into a
//! [`FrameBuffer`] and finally hands the bytes to an [`ImageEncoder`].

mod camera;
mod encoder;
mod error;
mod framebuffer;
mod hittable;
mod material;
mod partition;
mod renderer;
mod sphere;
mod viewport;

pub use camera::{Camera, CancelToken};
pub use encoder::{ImageEncoder, PngEncoder, PpmEncoder};
pub use error::{RenderError, RenderResult};
pub use framebuffer::{FrameBuffer, RowsMut, CHANNELS};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{Color, Dielectric, Lambertian, Material, Metal, ScatterResult};
pub use partition::{partition_rows, ScanlineChunk};
pub use renderer::{
    color_to_rgb, linear_to_gamma, ray_color, render_pixel, scanline_rng, sky_gradient,
    RenderConfig, T_MIN,
};
pub use sphere::Sphere;
pub use viewport::{CameraSettings, Viewport};

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Interval, Ray, Vec3};

use rand::{Rng, RngCore};

/// Draw a uniform `f32` in [0, 1) from the given stream.
#[inline]
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}
