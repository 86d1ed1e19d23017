//! Camera: owns the viewport and frame buffer and drives a full render.

use crate::renderer::{color_to_rgb, render_pixel, scanline_rng};
use crate::{
    partition_rows, CameraSettings, FrameBuffer, Hittable, ImageEncoder, RenderConfig,
    RenderError, RenderResult, RowsMut, Viewport, CHANNELS,
};
use lumen_math::Vec3;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation flag, checked by workers between scanlines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Ask the running render to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Camera for rendering a scene into an image.
pub struct Camera {
    /// Sampling and threading options, read at the start of each render
    pub config: RenderConfig,
    settings: CameraSettings,
    viewport: Viewport,
    frame: FrameBuffer,
    cancel: CancelToken,
}

impl Camera {
    /// Create a camera, deriving its viewport and allocating the frame.
    pub fn new(settings: CameraSettings, config: RenderConfig) -> RenderResult<Self> {
        let viewport = Viewport::new(&settings)?;
        let frame = FrameBuffer::new(viewport.image_width(), viewport.image_height());

        Ok(Self {
            config,
            settings,
            viewport,
            frame,
            cancel: CancelToken::default(),
        })
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Replace the camera settings and recompute the viewport.
    ///
    /// The frame buffer is reallocated only when the image dimensions
    /// change. On error the camera keeps its previous settings.
    pub fn set_settings(&mut self, settings: CameraSettings) -> RenderResult<()> {
        let viewport = Viewport::new(&settings)?;
        log::debug!(
            "Viewport recomputed: pixel00={:?} du={:?} dv={:?}",
            viewport.pixel00_loc(),
            viewport.pixel_delta_u(),
            viewport.pixel_delta_v()
        );

        if self
            .frame
            .resize(viewport.image_width(), viewport.image_height())
        {
            log::debug!(
                "Frame buffer reallocated to {}x{}",
                viewport.image_width(),
                viewport.image_height()
            );
        }

        self.settings = settings;
        self.viewport = viewport;
        Ok(())
    }

    /// Move the camera to `look_from`, keeping everything else.
    pub fn set_camera_position(&mut self, look_from: Vec3) -> RenderResult<()> {
        let settings = CameraSettings {
            look_from,
            ..self.settings
        };
        self.set_settings(settings)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /// Raw RGB8 bytes of the last render.
    pub fn pixels(&self) -> &[u8] {
        self.frame.pixels()
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Handle for cancelling renders from another thread.
    ///
    /// Each render clears the flag when it starts, so `cancel()` only stops
    /// a render that is already running. A cancel issued before `render` or
    /// `render_frame` is called is discarded.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Render `world` and hand the finished frame to `encoder`.
    pub fn render(&mut self, world: &dyn Hittable, encoder: &dyn ImageEncoder) -> RenderResult<()> {
        self.render_frame(world)?;
        encoder.encode(
            self.frame.width(),
            self.frame.height(),
            CHANNELS as u8,
            self.frame.pixels(),
        )
    }

    /// Render `world` into the frame buffer.
    ///
    /// Rows are split into one contiguous chunk per worker and each worker
    /// writes only its own chunk. Blocks until every worker has finished.
    pub fn render_frame(&mut self, world: &dyn Hittable) -> RenderResult<()> {
        self.config.validate()?;

        let height = self.viewport.image_height();
        let workers = self.config.worker_count(height)?;
        let chunks = partition_rows(height, workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lumen-worker-{}", i))
            .build()?;

        log::info!(
            "Rendering {}x{} @ {} spp, max depth {}, on {} threads",
            self.viewport.image_width(),
            height,
            self.config.samples_per_pixel,
            self.config.max_depth,
            workers
        );

        self.cancel.reset();
        let remaining = AtomicU32::new(height);
        let start = Instant::now();

        let viewport = &self.viewport;
        let config = &self.config;
        let cancel = &self.cancel;
        let remaining = &remaining;
        let bands = self.frame.split_rows_mut(&chunks);

        pool.scope(|s| {
            for band in bands {
                s.spawn(move |_| render_band(viewport, world, config, band, remaining, cancel));
            }
        });

        if self.cancel.is_cancelled() {
            log::warn!("Render cancelled after {:?}", start.elapsed());
            return Err(RenderError::Cancelled);
        }

        log::info!("Rendered in {:?}", start.elapsed());
        Ok(())
    }
}

/// Worker body: trace every pixel of one band of rows.
fn render_band(
    viewport: &Viewport,
    world: &dyn Hittable,
    config: &RenderConfig,
    mut band: RowsMut<'_>,
    remaining: &AtomicU32,
    cancel: &CancelToken,
) {
    for y in band.rows() {
        if cancel.is_cancelled() {
            return;
        }

        let mut rng = scanline_rng(config.seed, y);
        for x in 0..band.width() {
            let color = render_pixel(viewport, world, x, y, config, &mut rng);
            band.set(x, y, color_to_rgb(color));
        }

        // Progress is advisory only
        let left = remaining.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        log::trace!("Scanlines remaining: {}", left);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Dielectric, HitRecord, HittableList, Lambertian, Metal, Ray, Sphere};
    use lumen_math::Interval;
    use std::cell::RefCell;

    type Captured = (u32, u32, u8, Vec<u8>);

    /// Keeps whatever it is asked to encode.
    #[derive(Default)]
    struct CaptureEncoder {
        frame: RefCell<Option<Captured>>,
    }

    impl ImageEncoder for CaptureEncoder {
        fn encode(&self, width: u32, height: u32, channels: u8, pixels: &[u8]) -> RenderResult<()> {
            *self.frame.borrow_mut() = Some((width, height, channels, pixels.to_vec()));
            Ok(())
        }
    }

    struct FailingEncoder;

    impl ImageEncoder for FailingEncoder {
        fn encode(&self, _: u32, _: u32, _: u8, _: &[u8]) -> RenderResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    /// Empty scene that cancels the render the first time it is queried.
    struct CancellingScene(CancelToken);

    impl Hittable for CancellingScene {
        fn hit(&self, _ray: &Ray, _ray_t: Interval) -> Option<HitRecord<'_>> {
            self.0.cancel();
            None
        }
    }

    fn small_settings() -> CameraSettings {
        CameraSettings::default().with_resolution(16, 2.0)
    }

    fn config(threads: usize) -> RenderConfig {
        RenderConfig {
            samples_per_pixel: 4,
            max_depth: 8,
            seed: 99,
            threads: Some(threads),
        }
    }

    fn three_spheres() -> HittableList {
        let mut world = HittableList::new();
        world.add(Box::new(Sphere::new(
            Vec3::new(0.0, -100.5, -1.0),
            100.0,
            Lambertian::new(Color::new(0.8, 0.8, 0.0)),
        )));
        world.add(Box::new(Sphere::new(
            Vec3::new(0.0, 0.0, -1.2),
            0.5,
            Lambertian::new(Color::new(0.1, 0.2, 0.5)),
        )));
        world.add(Box::new(Sphere::new(Vec3::new(-1.0, 0.0, -1.0), 0.5, Dielectric::new(1.5))));
        world.add(Box::new(Sphere::new(
            Vec3::new(1.0, 0.0, -1.0),
            0.5,
            Metal::new(Color::new(0.8, 0.6, 0.2), 0.3),
        )));
        world
    }

    #[test]
    fn test_new_allocates_frame() {
        let camera = Camera::new(small_settings(), config(1)).unwrap();
        assert_eq!(camera.width(), 16);
        assert_eq!(camera.height(), 8);
        assert_eq!(camera.pixels().len(), 16 * 8 * 3);
    }

    #[test]
    fn test_render_is_deterministic() {
        let world = three_spheres();

        let mut first = Camera::new(small_settings(), config(2)).unwrap();
        first.render_frame(&world).unwrap();

        let mut second = Camera::new(small_settings(), config(2)).unwrap();
        second.render_frame(&world).unwrap();

        assert_eq!(first.pixels(), second.pixels());
        assert!(first.pixels().iter().any(|&b| b != 0));
    }

    #[test]
    fn test_render_independent_of_thread_count() {
        let world = three_spheres();

        let mut single = Camera::new(small_settings(), config(1)).unwrap();
        single.render_frame(&world).unwrap();

        for threads in [2, 3, 8] {
            let mut multi = Camera::new(small_settings(), config(threads)).unwrap();
            multi.render_frame(&world).unwrap();
            assert_eq!(single.pixels(), multi.pixels(), "{} threads", threads);
        }
    }

    #[test]
    fn test_more_threads_than_rows() {
        let settings = CameraSettings::default().with_resolution(8, 4.0);
        let mut camera = Camera::new(settings, config(64)).unwrap();
        assert_eq!(camera.height(), 2);

        camera.render_frame(&HittableList::new()).unwrap();
        assert!(camera.pixels().iter().all(|&b| b > 0));
    }

    #[test]
    fn test_zero_depth_renders_black() {
        let mut camera = Camera::new(
            small_settings(),
            RenderConfig {
                max_depth: 0,
                ..config(3)
            },
        )
        .unwrap();

        camera.render_frame(&three_spheres()).unwrap();
        assert!(camera.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_background_only_scene_is_sky() {
        let mut camera = Camera::new(small_settings(), config(2)).unwrap();
        camera.render_frame(&HittableList::new()).unwrap();

        let frame = camera.frame();
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let [r, g, b] = frame.get(x, y);
                // Blend of white and sky blue: blue channel saturates
                assert_eq!(b, 255);
                assert!(r <= g && g <= b);
                assert!(r >= (256.0 * 0.5f32.sqrt()) as u8);
            }
        }
    }

    #[test]
    fn test_render_hands_frame_to_encoder() {
        let mut camera = Camera::new(small_settings(), config(2)).unwrap();
        let encoder = CaptureEncoder::default();

        camera.render(&three_spheres(), &encoder).unwrap();

        let (width, height, channels, pixels) = encoder.frame.borrow_mut().take().unwrap();
        assert_eq!((width, height, channels), (16, 8, 3));
        assert_eq!(pixels, camera.pixels());
    }

    #[test]
    fn test_encoder_failure_is_surfaced() {
        let mut camera = Camera::new(small_settings(), config(1)).unwrap();
        let result = camera.render(&HittableList::new(), &FailingEncoder);
        assert!(matches!(result, Err(RenderError::Io(_))));
    }

    #[test]
    fn test_cancel_before_render_is_discarded() {
        let mut camera = Camera::new(small_settings(), config(1)).unwrap();
        let token = camera.cancel_token();
        token.cancel();
        assert!(token.is_cancelled());

        camera.render_frame(&HittableList::new()).unwrap();
        assert!(!token.is_cancelled());
        assert!(camera.pixels().iter().all(|&b| b > 0));
    }

    #[test]
    fn test_cancelled_render_skips_encoding() {
        let mut camera = Camera::new(small_settings(), config(1)).unwrap();
        let scene = CancellingScene(camera.cancel_token());
        let encoder = CaptureEncoder::default();

        let result = camera.render(&scene, &encoder);
        assert!(matches!(result, Err(RenderError::Cancelled)));
        assert!(encoder.frame.borrow().is_none());

        // The next render starts with a clear flag
        camera.render_frame(&HittableList::new()).unwrap();
    }

    #[test]
    fn test_reposition_recomputes_viewport_without_realloc() {
        let mut camera = Camera::new(small_settings(), config(2)).unwrap();
        camera.render_frame(&HittableList::new()).unwrap();
        let before = camera.pixels().to_vec();
        let old_viewport = *camera.viewport();

        camera.set_camera_position(Vec3::new(0.0, 0.0, 1.0)).unwrap();

        let expected = Viewport::new(&CameraSettings {
            look_from: Vec3::new(0.0, 0.0, 1.0),
            ..small_settings()
        })
        .unwrap();
        assert_eq!(*camera.viewport(), expected);
        assert_ne!(camera.viewport().pixel00_loc(), old_viewport.pixel00_loc());

        // Same dimensions: the previous frame is kept, not reallocated
        assert_eq!(camera.pixels(), before.as_slice());
    }

    #[test]
    fn test_resolution_change_reallocates() {
        let mut camera = Camera::new(small_settings(), config(2)).unwrap();
        camera
            .set_settings(small_settings().with_resolution(10, 1.0))
            .unwrap();

        assert_eq!((camera.width(), camera.height()), (10, 10));
        assert_eq!(camera.pixels().len(), 10 * 10 * 3);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut camera = Camera::new(small_settings(), config(1)).unwrap();
        let result = camera.set_camera_position(camera.settings().look_at);

        assert!(matches!(result, Err(RenderError::DegenerateView(_))));
        assert_eq!(camera.settings(), &small_settings());

        assert!(Camera::new(small_settings().with_resolution(0, 1.0), config(1)).is_err());
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut camera = Camera::new(
            small_settings(),
            RenderConfig {
                samples_per_pixel: 0,
                ..config(1)
            },
        )
        .unwrap();
        assert!(matches!(
            camera.render_frame(&HittableList::new()),
            Err(RenderError::InvalidSampleCount)
        ));

        camera.config = config(0);
        assert!(matches!(
            camera.render_frame(&HittableList::new()),
            Err(RenderError::NoWorkers)
        ));
    }
}
