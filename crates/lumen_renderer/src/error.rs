//! Errors surfaced by the renderer.

use thiserror::Error;

/// Errors that can occur while configuring or running a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Aspect ratio must be finite and positive, got {0}")]
    InvalidAspectRatio(f64),

    #[error("Image width must be at least 1 pixel")]
    InvalidImageWidth,

    #[error("Vertical field of view must be in (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("Camera {0} vector is not finite")]
    NonFiniteCamera(&'static str),

    #[error("Camera look_from and look_at coincide at {0:?}")]
    DegenerateView([f32; 3]),

    #[error("Camera up vector is parallel to the view direction")]
    ParallelUpVector,

    #[error("Samples per pixel must be at least 1")]
    InvalidSampleCount,

    #[error("Render requires at least one worker thread")]
    NoWorkers,

    #[error("Could not determine hardware parallelism: {0}")]
    Parallelism(#[source] std::io::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Encoder expects {expected} channels, got {actual}")]
    UnsupportedChannels { expected: u8, actual: u8 },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render was cancelled")]
    Cancelled,
}

pub type RenderResult<T> = Result<T, RenderError>;
