//! End-to-end drawing through the software renderer.

mod common;

use approx::assert_relative_eq;
use glint_engine::coords::Rect;
use glint_engine::error::ErrorCode;
use glint_engine::matrix::MatrixMode;
use glint_engine::paint::Color;
use glint_engine::shader::{Attribute, ShaderKind};

use common::{software_session, solid_image};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

#[test_log::test]
fn blit_lands_on_the_cleared_window() {
    let (mut s, screen) = software_session(8, 8);
    let image = solid_image(&mut s, 4, 4, BLUE);

    s.clear_color(screen, Color::RED);
    // Anchor defaults to the center: the image covers (0,0)..(4,4).
    s.blit(image, None, screen, 2.0, 2.0);

    assert_eq!(s.get_pixel(screen, 1, 1), Color::BLUE);
    assert_eq!(s.get_pixel(screen, 3, 3), Color::BLUE);
    assert_eq!(s.get_pixel(screen, 5, 5), Color::RED);
    assert_eq!(s.get_pixel(screen, 1, 6), Color::RED);
    assert_eq!(s.pop_error().code, ErrorCode::None);
}

#[test_log::test]
fn readback_outside_the_target_is_transparent() {
    let (mut s, screen) = software_session(4, 4);
    s.clear_color(screen, Color::RED);
    assert_eq!(s.get_pixel(screen, -1, 0), Color::TRANSPARENT);
    assert_eq!(s.get_pixel(screen, 4, 0), Color::TRANSPARENT);
    assert_eq!(s.pop_error().code, ErrorCode::None);
}

#[test_log::test]
fn model_matrix_moves_blits() {
    let (mut s, screen) = software_session(8, 8);
    let image = solid_image(&mut s, 4, 4, BLUE);
    s.clear_color(screen, Color::RED);

    s.matrix_mode(screen, MatrixMode::Model);
    s.push_matrix();
    assert_eq!(s.matrix_depth(MatrixMode::Model), Some(2));
    s.translate(4.0, 0.0, 0.0);
    s.blit(image, None, screen, 2.0, 2.0);
    s.pop_matrix();
    assert_eq!(s.matrix_depth(MatrixMode::Model), Some(1));

    assert_eq!(s.get_pixel(screen, 5, 1), Color::BLUE);
    assert_eq!(s.get_pixel(screen, 1, 1), Color::RED);

    // Back to identity: the next blit lands unmoved.
    s.blit(image, None, screen, 2.0, 6.0);
    assert_eq!(s.get_pixel(screen, 1, 6), Color::BLUE);
}

#[test_log::test]
fn popping_the_last_matrix_is_an_error() {
    let (mut s, screen) = software_session(4, 4);
    s.matrix_mode(screen, MatrixMode::Model);
    s.pop_matrix();
    let err = s.pop_error();
    assert_eq!(err.code, ErrorCode::UserError);
    assert_eq!(err.function, "pop_matrix");
}

#[test_log::test]
fn model_view_projection_maps_the_target_to_ndc() {
    let (mut s, screen) = software_session(8, 4);
    s.matrix_mode(screen, MatrixMode::Model);
    let mvp = s.model_view_projection().expect("matrix target is set");

    let top_left = mvp.transform_point([0.0, 0.0, 0.0]);
    assert_relative_eq!(top_left[0], -1.0);
    assert_relative_eq!(top_left[1], 1.0);
    let bottom_right = mvp.transform_point([8.0, 4.0, 0.0]);
    assert_relative_eq!(bottom_right[0], 1.0);
    assert_relative_eq!(bottom_right[1], -1.0);
}

#[test_log::test]
fn clip_limits_clears_and_is_idempotent() {
    let (mut s, screen) = software_session(8, 8);
    s.clear_color(screen, Color::RED);

    let first = s.set_clip(screen, 0.0, 0.0, 4.0, 4.0);
    let second = s.set_clip(screen, 0.0, 0.0, 4.0, 4.0);
    assert_eq!(first, Some(Rect::new(0.0, 0.0, 4.0, 4.0)));
    assert_eq!(first, second);
    assert_eq!(s.clip_rect(screen), first);

    s.clear_color(screen, Color::BLUE);
    // The clip is top-left origin, like every other client coordinate.
    assert_eq!(s.get_pixel(screen, 1, 1), Color::BLUE);
    assert_eq!(s.get_pixel(screen, 1, 6), Color::RED);
    assert_eq!(s.get_pixel(screen, 6, 1), Color::RED);

    assert_eq!(
        s.intersect_clip_rect(screen, Rect::new(2.0, 2.0, 10.0, 10.0)),
        Some(Rect::new(2.0, 2.0, 2.0, 2.0))
    );
    assert_eq!(s.intersect_clip_rect(screen, Rect::new(5.0, 5.0, 1.0, 1.0)), None);

    s.unset_clip(screen);
    assert_eq!(s.clip_rect(screen), None);

    // With the clip gone the whole target clears again.
    s.clear_color(screen, Color::GREEN);
    assert_eq!(s.get_pixel(screen, 6, 6), Color::GREEN);
    assert_eq!(s.get_pixel(screen, 1, 1), Color::GREEN);
}

#[test_log::test]
fn virtual_resolution_scales_drawing_and_coordinates() {
    let (mut s, screen) = software_session(8, 8);
    let image = solid_image(&mut s, 2, 2, BLUE);
    s.set_virtual_resolution(screen, 4, 4);

    s.clear_color(screen, Color::RED);
    s.blit(image, None, screen, 1.0, 1.0);
    // Logical (0,0)..(2,2) covers physical (0,0)..(4,4).
    assert_eq!(s.get_pixel(screen, 1, 1), Color::BLUE);
    assert_eq!(s.get_pixel(screen, 3, 3), Color::RED);

    let (x, y) = s.get_virtual_coords(screen, 4.0, 6.0).expect("target exists");
    assert_relative_eq!(x, 2.0);
    assert_relative_eq!(y, 3.0);

    s.unset_virtual_resolution(screen);
    let (x, y) = s.get_virtual_coords(screen, 4.0, 6.0).expect("target exists");
    assert_relative_eq!(x, 4.0);
    assert_relative_eq!(y, 6.0);
}

#[test_log::test]
fn shapes_fill_their_area() {
    let (mut s, screen) = software_session(8, 8);
    s.clear_color(screen, Color::RED);
    s.rectangle_filled(screen, Rect::new(0.0, 0.0, 4.0, 8.0), Color::GREEN);
    assert_eq!(s.get_pixel(screen, 1, 1), Color::GREEN);
    assert_eq!(s.get_pixel(screen, 1, 7), Color::GREEN);
    assert_eq!(s.get_pixel(screen, 6, 1), Color::RED);
}

#[test_log::test]
fn image_targets_keep_top_rows_first() {
    let (mut s, screen) = software_session(8, 8);
    let canvas = solid_image(&mut s, 4, 4, [0, 255, 0, 255]);
    let stamp = solid_image(&mut s, 2, 2, BLUE);
    let target = s.load_target(canvas).expect("software renders to images");

    s.blit(stamp, None, target, 1.0, 1.0);
    let bitmap = s.copy_surface_from_image(canvas).expect("readback works");
    assert_eq!(bitmap.pixel(0, 0), Some(BLUE));
    assert_eq!(bitmap.pixel(3, 3), Some([0, 255, 0, 255]));

    // The same orientation survives a blit onto the window.
    s.clear_color(screen, Color::RED);
    s.blit(canvas, None, screen, 2.0, 2.0);
    assert_eq!(s.get_pixel(screen, 0, 0), Color::BLUE);
    assert_eq!(s.get_pixel(screen, 3, 3), Color::GREEN);
}

#[test_log::test]
fn drawing_an_image_onto_its_own_target_fails() {
    let (mut s, _screen) = software_session(4, 4);
    let canvas = solid_image(&mut s, 4, 4, BLUE);
    let target = s.load_target(canvas).expect("software renders to images");
    s.blit(canvas, None, target, 2.0, 2.0);
    assert_eq!(s.pop_error().code, ErrorCode::UserError);
}

#[test_log::test]
fn copies_are_independent_of_their_source() {
    let (mut s, _screen) = software_session(4, 4);
    let original = solid_image(&mut s, 2, 2, BLUE);
    s.set_anchor(original, 0.0, 0.0);
    let copy = s.copy_image(original).expect("copy succeeds");

    s.update_image_bytes(original, None, &RED.repeat(4), 8);

    let copied = s.copy_surface_from_image(copy).expect("readback works");
    assert_eq!(copied.pixel(1, 1), Some(BLUE));
    let info = s.image_info(copy).expect("copy exists");
    assert_eq!((info.w, info.h), (2, 2));
    assert_relative_eq!(info.anchor.x, 0.0);
    assert_relative_eq!(info.anchor.y, 0.0);
}

#[test_log::test]
fn freed_images_are_rejected_quietly_on_free_and_loudly_on_use() {
    let (mut s, screen) = software_session(4, 4);
    let image = solid_image(&mut s, 2, 2, BLUE);
    s.free_image(image);
    s.free_image(image);
    assert_eq!(s.error_queue_len(), 0);

    s.blit(image, None, screen, 1.0, 1.0);
    assert_eq!(s.pop_error().code, ErrorCode::NullArgument);
}

#[test_log::test]
fn target_color_modulates_blits() {
    let (mut s, screen) = software_session(4, 4);
    let image = solid_image(&mut s, 4, 4, [255, 255, 255, 255]);
    s.clear_color(screen, Color::BLACK);
    s.set_target_color(screen, Color::GREEN);
    s.blit(image, None, screen, 2.0, 2.0);
    assert_eq!(s.get_pixel(screen, 1, 1), Color::GREEN);
}

#[test_log::test]
fn shaders_are_unsupported_in_software() {
    let (mut s, _screen) = software_session(4, 4);
    let source = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
    assert_eq!(s.compile_shader(ShaderKind::Vertex, source), None);
    assert_eq!(s.pop_error().code, ErrorCode::UnsupportedFunction);
    assert!(s.is_default_shader_program());
}

#[test_log::test]
fn later_blits_in_one_batch_land_on_top() {
    let (mut s, screen) = software_session(8, 8);
    let image = solid_image(&mut s, 4, 4, [255, 255, 255, 255]);
    s.clear_color(screen, Color::BLACK);

    // Color modulation rides in the vertices, so all three share a batch.
    for (x, color) in [(2.0, Color::RED), (3.0, Color::GREEN), (4.0, Color::BLUE)] {
        s.set_color(image, color);
        s.blit(image, None, screen, x, 2.0);
    }

    assert_eq!(s.get_pixel(screen, 0, 2), Color::RED);
    assert_eq!(s.get_pixel(screen, 1, 2), Color::GREEN);
    assert_eq!(s.get_pixel(screen, 2, 2), Color::BLUE);
    assert_eq!(s.get_pixel(screen, 5, 2), Color::BLUE);
    assert_eq!(s.pop_error().code, ErrorCode::None);
}

#[test_log::test]
fn blit_onto_a_cleared_image_target() {
    let (mut s, _screen) = software_session(4, 4);
    let canvas = s
        .create_image(100, 100, glint_engine::image::Format::Rgba)
        .expect("image is created");
    let target = s.load_target(canvas).expect("software renders to images");

    s.clear_rgba(target, 255, 0, 0, 255);
    assert_eq!(s.get_pixel(target, 50, 50), Color::RED);

    let stamp = solid_image(&mut s, 10, 10, BLUE);
    s.blit(stamp, None, target, 50.0, 50.0);
    assert_eq!(s.get_pixel(target, 50, 50), Color::BLUE);
    assert_eq!(s.get_pixel(target, 44, 50), Color::RED);
    assert_eq!(s.pop_error().code, ErrorCode::None);
}

#[test_log::test]
fn freeing_an_image_frees_every_target_on_it() {
    let (mut s, _screen) = software_session(4, 4);
    let canvas = solid_image(&mut s, 4, 4, BLUE);
    let target = s.load_target(canvas).expect("software renders to images");
    let alias = s.create_alias_target(target).expect("alias is created");

    s.free_image(canvas);
    assert_eq!(s.error_queue_len(), 0);

    assert_eq!(s.target_info(alias), None);
    assert_eq!(s.pop_error().code, ErrorCode::NullArgument);
    assert_eq!(s.target_info(target), None);
    assert_eq!(s.pop_error().code, ErrorCode::NullArgument);
}

#[test_log::test]
fn short_attribute_sources_are_rejected_up_front() {
    let (mut s, screen) = software_session(4, 4);
    // Eight 2-float values need 64 bytes; only 8 are given.
    s.set_attribute_source(8, Attribute::floats(3, 2, &[1.0, 2.0]));
    let err = s.pop_error();
    assert_eq!(err.code, ErrorCode::DataError);
    assert_eq!(err.function, "set_attribute_source");

    s.rectangle_filled(screen, Rect::new(0.0, 0.0, 2.0, 2.0), Color::GREEN);
    s.flush_blit_buffer();
    assert_eq!(s.error_queue_len(), 0);
}
