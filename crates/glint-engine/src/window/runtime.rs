use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use crate::core::{App, AppControl};
use crate::handle::TargetId;
use crate::renderer::{InitFlags, RendererId, WindowBinding};
use crate::session::{Session, SessionConfig};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Renderer to use; `None` walks the session's renderer order.
    pub renderer: Option<RendererId>,
    pub init_flags: InitFlags,
    pub session: SessionConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "glint".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            renderer: None,
            init_flags: InitFlags::RESIZABLE,
            session: SessionConfig::default(),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, initializes a renderer into it and drives `app`
    /// until the window closes or the app exits.
    pub fn run<A>(config: RuntimeConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.session.quit();
        match state.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct AppState<A> {
    config: RuntimeConfig,
    app: A,
    session: Session,

    window: Option<Arc<Window>>,
    screen: Option<TargetId>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, app: A) -> Self {
        let session = Session::new(config.session.clone());
        Self {
            config,
            app,
            session,
            window: None,
            screen: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.request_exit(event_loop);
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<TargetId> {
        let flags = self.config.init_flags;
        let mut attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(flags.contains(InitFlags::RESIZABLE))
            .with_visible(!flags.contains(InitFlags::HIDDEN));
        if flags.contains(InitFlags::FULLSCREEN) {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        let binding = WindowBinding::new(window.clone());
        let screen = match self.config.renderer {
            Some(id) => self.session.init_renderer_with_window(id, binding, flags),
            None => self.session.init_with_window(binding, flags),
        };
        let Some(screen) = screen else {
            let err = self.session.pop_error();
            if err.is_none() {
                anyhow::bail!("renderer initialization failed");
            }
            anyhow::bail!("{}: {}", err.function, err.details);
        };

        self.window = Some(window);
        Ok(screen)
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(screen) = self.screen else { return };
        let control = self.app.on_frame(&mut self.session, screen);
        self.session.flip(screen);
        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        let screen = match self.create_window(event_loop) {
            Ok(screen) => screen,
            Err(e) => {
                self.fail(event_loop, e.context("failed to start the renderer"));
                return;
            }
        };
        self.screen = Some(screen);

        if self.app.on_init(&mut self.session, screen) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            // Minimized windows report 0x0; keep the last real size.
            WindowEvent::Resized(size) if size.width == 0 || size.height == 0 => {}

            WindowEvent::Resized(size) => {
                self.session
                    .handle_window_resized(u64::from(window_id), size.width, size.height);
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(w) = &self.window {
                    let size = w.inner_size();
                    if size.width > 0 && size.height > 0 {
                        self.session
                            .handle_window_resized(u64::from(window_id), size.width, size.height);
                    }
                }
            }

            WindowEvent::RedrawRequested => self.frame(event_loop),

            _ => {
                if self.app.on_window_event(&mut self.session, &event) == AppControl::Exit {
                    self.request_exit(event_loop);
                }
            }
        }
    }
}
