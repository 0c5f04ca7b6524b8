//! Window shell.
//!
//! Owns the winit event loop: creates the window and GPU context, blocks
//! the init flow on the one-shot model load (progress surfaces through the
//! status line and the window title), then drives the per-frame loop:
//! input, viewer update, render. A failed load is terminal: the status
//! shows the fixed failure text and frames keep presenting an empty stage.

pub mod input;

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use self::input::Input;
use crate::assets::load_model_blocking;
use crate::config::ViewerConfig;
use crate::errors::Result;
use crate::render::{ForwardRenderer, WgpuContext};
use crate::status::{percent_complete, StatusDisplay};
use crate::utils::{FpsCounter, Timer};
use crate::viewer::{surface_extent, Viewer};

pub struct App {
    config: ViewerConfig,
    source: String,

    window: Option<Arc<Window>>,
    context: Option<WgpuContext>,
    renderer: Option<ForwardRenderer>,
    viewer: Option<Viewer>,

    status: StatusDisplay,
    input: Input,
    timer: Timer,
    fps: FpsCounter,
}

impl App {
    #[must_use]
    pub fn new(config: ViewerConfig, source: impl Into<String>) -> Self {
        Self {
            config,
            source: source.into(),
            window: None,
            context: None,
            renderer: None,
            viewer: None,
            status: StatusDisplay::new(),
            input: Input::new(),
            timer: Timer::new(),
            fps: FpsCounter::new(),
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    /// Logical window size, honoring the fallback for degenerate requests.
    fn logical_size(&self) -> (u32, u32) {
        let (w, h) = self.config.window_size;
        if w == 0 || h == 0 {
            self.config.fallback_size
        } else {
            (w, h)
        }
    }

    /// Blocks until the model is loaded and the viewer exists, or the load
    /// failed and the status line carries the failure text.
    fn load_and_build_viewer(&mut self, window: &Arc<Window>) {
        let title = self.config.window_title.clone();
        let (logical_w, logical_h) = self.logical_size();

        let status = &mut self.status;
        let progress_window = window.clone();
        let mut last_percent = None;
        let result = load_model_blocking(&self.source, |loaded, total| {
            let percent = percent_complete(loaded, total);
            if percent != last_percent {
                last_percent = percent;
                status.set_progress(percent);
                progress_window.set_title(&format!("{title} — {}", status.text()));
                if let Some(p) = percent {
                    log::info!("loading model... {p}%");
                }
            }
        });

        match result {
            Ok(asset) => {
                let aspect = logical_w as f32 / logical_h.max(1) as f32;
                let mut viewer = Viewer::new(self.config.clone(), aspect);
                viewer.insert_model(asset);
                self.viewer = Some(viewer);
                self.status.finish();
                window.set_title(&title);
            }
            Err(err) => {
                log::error!("error loading avatar: {err}");
                self.status.fail();
                window.set_title(&format!("{title} — {}", self.status.text()));
            }
        }
    }

    fn redraw(&mut self) {
        self.timer.tick();
        let dt = self.timer.dt_seconds();

        if let Some(viewer) = &mut self.viewer {
            viewer.update(&self.input, dt);
        }
        self.input.end_frame();

        let (Some(context), Some(renderer)) = (&mut self.context, &mut self.renderer) else {
            return;
        };

        match context.acquire() {
            Ok(frame) => {
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                renderer.render(context, self.viewer.as_ref(), &view, self.config.background);
                frame.present();
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                context.reconfigure();
            }
            Err(err) => {
                log::warn!("surface acquire failed: {err}");
            }
        }

        if self.status.is_visible() {
            return;
        }
        if let (Some(fps), Some(window)) = (self.fps.update(), &self.window) {
            window.set_title(&format!("{} | FPS: {fps:.0}", self.config.window_title));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (logical_w, logical_h) = self.logical_size();
        let attributes = Window::default_attributes()
            .with_title(self.config.window_title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                f64::from(logical_w),
                f64::from(logical_h),
            ));

        // A missing mount point aborts initialization to the log channel;
        // there is nothing to draw an error onto.
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("viewer window unavailable: {err}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let scale = window.scale_factor();
        let extent = surface_extent(
            (logical_w, logical_h),
            scale,
            self.config.pixel_ratio_cap,
        );

        log::info!("initializing renderer backend...");
        let context = match pollster::block_on(WgpuContext::new(window.clone(), extent)) {
            Ok(context) => context,
            Err(err) => {
                log::error!("fatal renderer error: {err}");
                event_loop.exit();
                return;
            }
        };
        self.renderer = Some(ForwardRenderer::new(&context));
        self.context = Some(context);

        let physical = window.inner_size();
        self.input.handle_resize(physical.width, physical.height);

        self.load_and_build_viewer(&window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical) => {
                self.input.handle_resize(physical.width, physical.height);

                if let (Some(window), Some(context)) = (&self.window, &mut self.context) {
                    let scale = window.scale_factor();
                    let logical = physical.to_logical::<f64>(scale);
                    let extent = surface_extent(
                        (logical.width.round() as u32, logical.height.round() as u32),
                        scale,
                        self.config.pixel_ratio_cap,
                    );
                    context.resize(extent);
                }

                if let Some(viewer) = &mut self.viewer {
                    viewer.handle_resize(physical.width, physical.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.handle_cursor_move(position.x, position.y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.handle_mouse_input(state, button);
                if state == ElementState::Pressed && button == MouseButton::Left {
                    if let Some(viewer) = &mut self.viewer {
                        viewer.handle_pointer_down(
                            self.input.cursor_position,
                            self.input.screen_size,
                        );
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.handle_mouse_wheel(delta);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
