//! Viewer builder and host loop.
//!
//! The winit event loop plays the frame scheduler: each `RedrawRequested`
//! runs one frame and requests the next redraw until the window is closed
//! or the [`StopHandle`] is triggered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::animation::{AnimationConfig, Animator, SessionParams};
use crate::backend::RenderBackend;
use crate::driver::FrameDriver;
use crate::error::ViewerError;
use crate::gpu::{self, GpuState};
use crate::sierpinski::{self, PointSet};
use crate::time::FrameClock;

/// Number of points drawn by default: the complete triples of a
/// 2048-float buffer.
pub const DEFAULT_POINT_COUNT: usize = 682;

/// Shared flag that ends the frame loop before the next redraw is
/// scheduled.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Window showing the animated point cloud.
///
/// Use method chaining to configure, then call `.run()` to start.
pub struct Viewer {
    point_count: usize,
    trails: bool,
    config: AnimationConfig,
    session: Option<SessionParams>,
    title: String,
    stop: StopHandle,
}

impl Viewer {
    /// Create a viewer with default settings.
    pub fn new() -> Self {
        Self {
            point_count: DEFAULT_POINT_COUNT,
            trails: true,
            config: AnimationConfig::default(),
            session: None,
            title: "Sierpinski".to_string(),
            stop: StopHandle::new(),
        }
    }

    /// Set the number of generated points.
    pub fn with_point_count(mut self, count: usize) -> Self {
        self.point_count = count;
        self
    }

    /// Keep previous frames on screen (default) or clear every frame.
    pub fn with_trails(mut self, trails: bool) -> Self {
        self.trails = trails;
        self
    }

    /// Override the animation constants.
    pub fn with_config(mut self, config: AnimationConfig) -> Self {
        self.config = config;
        self
    }

    /// Use fixed session parameters instead of random ones.
    pub fn with_session(mut self, session: SessionParams) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Handle that stops the viewer from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run the viewer. This blocks until the window is closed or stopped.
    pub fn run(self) -> Result<(), ViewerError> {
        // The device is requested with default limits.
        gpu::check_point_count(self.point_count, &wgpu::Limits::default())?;

        let mut rng = rand::thread_rng();
        let points = sierpinski::generate_points(self.point_count, &mut rng)?;
        let session = self
            .session
            .unwrap_or_else(|| SessionParams::random(&mut rng));

        log::info!(
            "Generated {} points, phase offset {:.3} ms, rotation rates {:?}",
            points.len(),
            session.phase_offset_ms,
            session.rotation_rates
        );

        let animator = Animator::new(self.config, session, points.vertex_count());

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            window: None,
            gpu_state: None,
            driver: FrameDriver::new(animator),
            clock: FrameClock::new(),
            points,
            trails: self.trails,
            title: self.title,
            stop: self.stop,
            error: None,
        };
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    driver: FrameDriver,
    clock: FrameClock,
    points: PointSet,
    trails: bool,
    title: String,
    stop: StopHandle,
    error: Option<ViewerError>,
}

impl App {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = pollster::block_on(GpuState::new(window.clone(), &self.points, self.trails))?;

        self.gpu_state = Some(gpu_state);
        // Timestamps start with the first frame, not with point generation.
        self.clock = FrameClock::new();
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        let tick = self.clock.tick();
        if let Some(fps) = tick.fps {
            log::info!(
                "FPS: {:.1} ({} frames drawn)",
                fps,
                self.driver.frames_drawn()
            );
        }

        match self.driver.frame(gpu_state, tick.timestamp_ms) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                gpu_state.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        if self.stop.is_stopped() {
            log::info!("Stop requested");
            event_loop.exit();
        } else if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("{}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.stop.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size.into());
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
