//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glint_engine::error::BackendError;
use glint_engine::handle::TargetId;
use glint_engine::image::{Format, Sampling};
use glint_engine::renderer::registry::CreateFn;
use glint_engine::renderer::{
    Backend, DrawCall, Features, InitFlags, PixelRect, RendererId, RendererKind, SurfaceHandle,
    TextureDesc, TextureHandle, WindowRequest, WindowSurface,
};
use glint_engine::{Session, SessionConfig};

pub const RECORDING: RendererId = RendererId::new("Recording", RendererKind::User(1), 1, 0);

/// What the recording backend saw, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Clear(SurfaceHandle),
    Draw {
        surface: SurfaceHandle,
        texture: Option<TextureHandle>,
        vertices: usize,
        indices: usize,
    },
    Present(SurfaceHandle),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Backend that keeps sizes only and records every clear, draw and present.
pub struct RecordingBackend {
    log: EventLog,
    sizes: HashMap<SurfaceHandle, (u32, u32)>,
    textures: HashMap<TextureHandle, (u32, u32)>,
    next: u64,
    fail_init: bool,
}

impl RecordingBackend {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            sizes: HashMap::new(),
            textures: HashMap::new(),
            next: 0,
            fail_init: false,
        }
    }

    /// A backend whose device never comes up.
    pub fn failing_init(log: EventLog) -> Self {
        Self {
            fail_init: true,
            ..Self::new(log)
        }
    }

    fn next(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn features(&self) -> Features {
        Features::NON_POWER_OF_TWO | Features::RENDER_TARGETS
    }

    fn init(&mut self, request: &WindowRequest) -> Result<WindowSurface, BackendError> {
        if self.fail_init {
            return Err(BackendError::Device("device lost during init".into()));
        }
        let surface = SurfaceHandle(self.next());
        self.sizes.insert(surface, (request.width, request.height));
        Ok(WindowSurface {
            surface,
            window_id: 9_000 + surface.0,
            width: request.width,
            height: request.height,
        })
    }

    fn quit(&mut self) {
        self.sizes.clear();
        self.textures.clear();
    }

    fn set_window_resolution(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<(), BackendError> {
        self.sizes.insert(surface, (width, height));
        Ok(())
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle, BackendError> {
        let texture = TextureHandle(self.next());
        self.textures.insert(texture, (desc.width, desc.height));
        Ok(texture)
    }

    fn update_texture(&mut self, _texture: TextureHandle, _region: PixelRect, _rgba: &[u8]) -> Result<(), BackendError> {
        Ok(())
    }

    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>, BackendError> {
        let (w, h) = self
            .textures
            .get(&texture)
            .copied()
            .ok_or_else(|| BackendError::Surface("unknown texture".into()))?;
        Ok(vec![0; w as usize * h as usize * 4])
    }

    fn set_texture_sampling(&mut self, _texture: TextureHandle, _sampling: Sampling) -> Result<(), BackendError> {
        Ok(())
    }

    fn free_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
    }

    fn create_surface(&mut self, texture: TextureHandle) -> Result<SurfaceHandle, BackendError> {
        let size = self
            .textures
            .get(&texture)
            .copied()
            .ok_or_else(|| BackendError::Surface("unknown texture".into()))?;
        let surface = SurfaceHandle(self.next());
        self.sizes.insert(surface, size);
        Ok(surface)
    }

    fn free_surface(&mut self, surface: SurfaceHandle) {
        self.sizes.remove(&surface);
    }

    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)> {
        self.sizes.get(&surface).copied()
    }

    fn clear(&mut self, surface: SurfaceHandle, _color: [f32; 4], _scissor: Option<PixelRect>) -> Result<(), BackendError> {
        self.log.borrow_mut().push(Event::Clear(surface));
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        self.log.borrow_mut().push(Event::Draw {
            surface: call.surface,
            texture: call.texture,
            vertices: call.vertices.len(),
            indices: call.indices.len(),
        });
        Ok(())
    }

    fn read_pixel(&mut self, _surface: SurfaceHandle, _x: u32, _row: u32) -> Result<[u8; 4], BackendError> {
        Err(BackendError::Unsupported("readback"))
    }

    fn read_surface(&mut self, _surface: SurfaceHandle) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Unsupported("readback"))
    }

    fn present(&mut self, surface: SurfaceHandle) -> Result<(), BackendError> {
        self.log.borrow_mut().push(Event::Present(surface));
        Ok(())
    }
}

pub fn recording_factory(log: EventLog) -> CreateFn {
    Box::new(move |_: RendererId| -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(RecordingBackend::new(log.clone())))
    })
}

pub fn failing_init_factory() -> CreateFn {
    Box::new(|_: RendererId| -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(RecordingBackend::failing_init(EventLog::default())))
    })
}

pub fn failing_factory() -> CreateFn {
    Box::new(|_: RendererId| -> Result<Box<dyn Backend>, BackendError> {
        Err(BackendError::Device("no adapter".into()))
    })
}

/// A session with no renderers registered.
pub fn bare_session() -> Session {
    Session::new(SessionConfig {
        register_builtin_renderers: false,
        ..SessionConfig::default()
    })
}

/// A session running the recording backend on a `w`×`h` window.
pub fn recording_session(w: u32, h: u32) -> (Session, TargetId, EventLog) {
    let log = EventLog::default();
    let mut session = bare_session();
    assert!(session.register_renderer(RECORDING, recording_factory(log.clone()), None));
    let screen = session
        .init_renderer_by_id(RECORDING, w, h, InitFlags::empty())
        .expect("recording renderer initializes");
    (session, screen, log)
}

/// A session running the built-in software renderer headless.
pub fn software_session(w: u32, h: u32) -> (Session, TargetId) {
    let mut session = Session::default();
    let screen = session
        .init_renderer(RendererKind::Software, w, h, InitFlags::empty())
        .expect("software renderer initializes");
    (session, screen)
}

/// A `w`×`h` RGBA image filled with one color.
pub fn solid_image(session: &mut Session, w: u32, h: u32, rgba: [u8; 4]) -> glint_engine::handle::ImageId {
    let image = session
        .create_image(w, h, Format::Rgba)
        .expect("image is created");
    let bytes = rgba.repeat(w as usize * h as usize);
    session.update_image_bytes(image, None, &bytes, w as usize * 4);
    image
}
