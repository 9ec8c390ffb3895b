//! Blit batching as seen by a backend.

mod common;

use glint_engine::coords::Rect;
use glint_engine::paint::{BlendPreset, Color};
use glint_engine::renderer::InitFlags;
use glint_engine::{Session, SessionConfig};

use common::{Event, EventLog, RECORDING, recording_factory, recording_session, solid_image};

fn draws(log: &EventLog) -> Vec<(bool, usize, usize)> {
    log.borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Draw {
                texture,
                vertices,
                indices,
                ..
            } => Some((texture.is_some(), *vertices, *indices)),
            _ => None,
        })
        .collect()
}

#[test_log::test]
fn consecutive_blits_of_one_image_share_a_draw() {
    let (mut s, screen, log) = recording_session(16, 16);
    let a = solid_image(&mut s, 2, 2, [255; 4]);
    let b = solid_image(&mut s, 2, 2, [255; 4]);

    s.blit(a, None, screen, 1.0, 1.0);
    s.blit(a, None, screen, 5.0, 1.0);
    assert!(draws(&log).is_empty());

    s.blit(b, None, screen, 9.0, 1.0);
    assert_eq!(draws(&log), vec![(true, 8, 12)]);

    s.flush_blit_buffer();
    assert_eq!(draws(&log), vec![(true, 8, 12), (true, 4, 6)]);

    let textures: Vec<_> = log
        .borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Draw { texture, .. } => *texture,
            _ => None,
        })
        .collect();
    assert_ne!(textures[0], textures[1]);
}

#[test_log::test]
fn draws_keep_submission_order() {
    let (mut s, screen, log) = recording_session(16, 16);
    let image = solid_image(&mut s, 2, 2, [255; 4]);

    s.blit(image, None, screen, 1.0, 1.0);
    s.rectangle_filled(screen, Rect::new(0.0, 0.0, 4.0, 4.0), Color::RED);
    s.blit(image, None, screen, 1.0, 1.0);
    s.flip(screen);

    let events = log.borrow().clone();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], Event::Draw { texture: Some(_), .. }));
    assert!(matches!(events[1], Event::Draw { texture: None, .. }));
    assert!(matches!(events[2], Event::Draw { texture: Some(_), .. }));
    assert!(matches!(events[3], Event::Present(_)));
}

#[test_log::test]
fn clear_draws_pending_geometry_first() {
    let (mut s, screen, log) = recording_session(8, 8);
    let image = solid_image(&mut s, 2, 2, [255; 4]);

    s.blit(image, None, screen, 1.0, 1.0);
    s.clear(screen);

    let events = log.borrow().clone();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Event::Draw { .. }));
    assert!(matches!(events[1], Event::Clear(_)));
}

#[test_log::test]
fn state_changes_split_batches() {
    let (mut s, screen, log) = recording_session(8, 8);
    let image = solid_image(&mut s, 2, 2, [255; 4]);

    s.blit(image, None, screen, 1.0, 1.0);
    s.translate(1.0, 0.0, 0.0);
    assert_eq!(draws(&log).len(), 1);

    s.blit(image, None, screen, 1.0, 1.0);
    s.set_clip(screen, 0.0, 0.0, 4.0, 4.0);
    assert_eq!(draws(&log).len(), 2);

    s.blit(image, None, screen, 1.0, 1.0);
    s.set_shape_blend_mode(BlendPreset::Add);
    assert_eq!(draws(&log).len(), 3);

    s.blit(image, None, screen, 1.0, 1.0);
    s.update_image_bytes(image, None, &[0; 16], 8);
    assert_eq!(draws(&log).len(), 4);
}

#[test_log::test]
fn full_buffer_flushes_before_appending() {
    let log = EventLog::default();
    let mut s = Session::new(SessionConfig {
        register_builtin_renderers: false,
        blit_buffer_vertices: 8,
        blit_buffer_indices: 12,
        ..SessionConfig::default()
    });
    assert!(s.register_renderer(RECORDING, recording_factory(log.clone()), None));
    let screen = s
        .init_renderer_by_id(RECORDING, 8, 8, InitFlags::empty())
        .expect("recording renderer initializes");
    let image = solid_image(&mut s, 2, 2, [255; 4]);

    for _ in 0..3 {
        s.blit(image, None, screen, 1.0, 1.0);
    }
    assert_eq!(draws(&log), vec![(true, 8, 12)]);
    s.flush_blit_buffer();
    assert_eq!(draws(&log), vec![(true, 8, 12), (true, 4, 6)]);
}

#[test_log::test]
fn freeing_an_image_draws_its_pending_quads_first() {
    let (mut s, screen, log) = recording_session(8, 8);
    let image = solid_image(&mut s, 2, 2, [255; 4]);
    s.blit(image, None, screen, 1.0, 1.0);
    s.free_image(image);
    s.flush_blit_buffer();
    assert_eq!(draws(&log), vec![(true, 4, 6)]);
}

#[test_log::test]
fn window_resizes_keep_the_virtual_resolution() {
    let (mut s, screen, _log) = recording_session(16, 16);
    let window_id = 9_001;
    assert_eq!(s.window_target(window_id), Some(screen));

    s.set_virtual_resolution(screen, 8, 8);
    assert!(s.handle_window_resized(window_id, 32, 32));
    let (x, y) = s.get_virtual_coords(screen, 32.0, 16.0).expect("target exists");
    assert_eq!((x, y), (8.0, 4.0));

    assert!(!s.handle_window_resized(1, 32, 32));
}
