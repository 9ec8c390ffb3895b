use glint_engine::core::{App, AppControl};
use glint_engine::coords::{Rect, Vec2};
use glint_engine::handle::{ImageId, TargetId};
use glint_engine::image::Format;
use glint_engine::logging::{LoggingConfig, init_logging};
use glint_engine::paint::{BlendPreset, Color};
use glint_engine::renderer::{
    DIRECT3D12, GLES, InitFlags, METAL, OPENGL, RendererId, SOFTWARE, VULKAN,
};
use glint_engine::window::{Runtime, RuntimeConfig};
use glint_engine::Session;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

const CHECKER: u32 = 64;

/// Spinning sprites, shapes and a clipped panel.
struct Demo {
    sprite: Option<ImageId>,
    frame: u64,
}

impl Demo {
    fn new() -> Self {
        Self {
            sprite: None,
            frame: 0,
        }
    }
}

fn checker_pixels() -> Vec<u8> {
    let mut pixels = Vec::with_capacity((CHECKER * CHECKER * 4) as usize);
    for y in 0..CHECKER {
        for x in 0..CHECKER {
            let light = ((x / 8) + (y / 8)) % 2 == 0;
            pixels.extend_from_slice(if light {
                &[240, 200, 80, 255]
            } else {
                &[60, 90, 200, 255]
            });
        }
    }
    pixels
}

impl App for Demo {
    fn on_init(&mut self, session: &mut Session, _screen: TargetId) -> AppControl {
        if let Some(id) = session.current_renderer_id() {
            log::info!("rendering with {id}");
        }
        let Some(sprite) = session.create_image(CHECKER, CHECKER, Format::Rgba) else {
            log::error!("could not create the sprite: {:?}", session.pop_error());
            return AppControl::Exit;
        };
        session.update_image_bytes(sprite, None, &checker_pixels(), (CHECKER * 4) as usize);
        session.set_blend_mode(sprite, BlendPreset::Normal);
        self.sprite = Some(sprite);
        AppControl::Continue
    }

    fn on_window_event(&mut self, _session: &mut Session, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::Escape) {
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, session: &mut Session, screen: TargetId) -> AppControl {
        self.frame += 1;
        let t = self.frame as f32;

        session.clear_rgba(screen, 18, 20, 28, 255);

        if let Some(sprite) = self.sprite {
            for i in 0..6 {
                let x = 80.0 + i as f32 * 110.0;
                session.blit_rotate(sprite, None, screen, x, 120.0, t * (1.0 + i as f32 * 0.5));
            }
            session.blit_scale(sprite, None, screen, 400.0, 300.0, 2.0, 1.0 + (t * 0.02).sin() * 0.5);
        }

        session.set_clip(screen, 40.0, 380.0, 320.0, 180.0);
        session.rectangle_filled(screen, Rect::new(0.0, 360.0, 800.0, 240.0), Color::rgb(40, 44, 60));
        session.circle_filled(screen, 200.0 + (t * 0.03).cos() * 140.0, 470.0, 60.0, Color::RED);
        session.unset_clip(screen);

        session.set_line_thickness(3.0);
        session.rectangle_round(screen, Rect::new(40.0, 380.0, 320.0, 180.0), 12.0, Color::WHITE);
        session.polyline(
            screen,
            &[
                Vec2::new(420.0, 540.0),
                Vec2::new(520.0, 400.0),
                Vec2::new(620.0, 520.0),
                Vec2::new(740.0, 420.0),
            ],
            Color::GREEN,
            false,
        );

        let err = session.pop_error();
        if !err.is_none() {
            log::warn!("{}: {}", err.function, err.details);
        }
        AppControl::Continue
    }
}

fn renderer_from_args() -> Option<RendererId> {
    let name = std::env::args().nth(1)?;
    let known = [SOFTWARE, VULKAN, METAL, DIRECT3D12, OPENGL, GLES];
    let found = known
        .into_iter()
        .find(|id| id.name.eq_ignore_ascii_case(&name) || id.kind.name() == name);
    if found.is_none() {
        log::warn!("unknown renderer {name:?}; using the default order");
    }
    found
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "glint demo".to_string(),
        initial_size: LogicalSize::new(800.0, 600.0),
        renderer: renderer_from_args(),
        init_flags: InitFlags::RESIZABLE,
        ..RuntimeConfig::default()
    };
    Runtime::run(config, Demo::new())
}
