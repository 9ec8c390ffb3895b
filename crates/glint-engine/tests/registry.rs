//! Renderer registration, selection and the error stack.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use glint_engine::error::ErrorCode;
use glint_engine::renderer::registry::FreeHook;
use glint_engine::renderer::{Features, InitFlags, RendererId, RendererKind, SOFTWARE};
use glint_engine::{Session, SessionConfig};

use common::{
    EventLog, RECORDING, bare_session, failing_factory, failing_init_factory, recording_factory,
};

const BROKEN: RendererId = RendererId::new("Broken", RendererKind::User(2), 1, 0);
const FLAKY: RendererId = RendererId::new("Flaky", RendererKind::User(3), 1, 0);

fn counting_hook(counter: &Rc<Cell<u32>>) -> FreeHook {
    let counter = counter.clone();
    Box::new(move |_: RendererId| counter.set(counter.get() + 1))
}

#[test_log::test]
fn init_falls_through_to_the_first_working_renderer() {
    let mut s = bare_session();
    let flaky_freed = Rc::new(Cell::new(0));
    let recording_freed = Rc::new(Cell::new(0));
    assert!(s.register_renderer(BROKEN, failing_factory(), None));
    assert!(s.register_renderer(FLAKY, failing_init_factory(), Some(counting_hook(&flaky_freed))));
    assert!(s.register_renderer(
        RECORDING,
        recording_factory(EventLog::default()),
        Some(counting_hook(&recording_freed)),
    ));
    s.set_renderer_order(Some(vec![BROKEN, FLAKY, RECORDING]));

    let screen = s.init(8, 8, InitFlags::empty());
    assert!(screen.is_some());
    assert_eq!(s.current_renderer_id(), Some(RECORDING));
    assert_eq!(s.active_renderers(), vec![RECORDING]);
    // Failed attempts are logged, not pushed.
    assert_eq!(s.error_queue_len(), 0);
    // Only the renderer that was created and then failed gets freed.
    assert_eq!(flaky_freed.get(), 1);
    assert_eq!(recording_freed.get(), 0);

    s.quit();
    assert_eq!(recording_freed.get(), 1);
    assert!(s.active_renderers().is_empty());
    assert_eq!(s.registered_renderers().len(), 3);
}

#[test_log::test]
fn init_reports_one_error_when_every_renderer_fails() {
    let mut s = bare_session();
    assert!(s.register_renderer(BROKEN, failing_factory(), None));
    assert!(s.register_renderer(FLAKY, failing_init_factory(), None));
    s.set_renderer_order(Some(vec![BROKEN, FLAKY]));

    assert_eq!(s.init(8, 8, InitFlags::empty()), None);
    assert_eq!(s.error_queue_len(), 1);
    let err = s.pop_error();
    assert_eq!(err.code, ErrorCode::BackendError);
    assert_eq!(err.function, "init");
    assert!(err.details.contains('2'), "{}", err.details);
    assert!(s.current_renderer().is_none());
}

#[test_log::test]
fn registration_rejects_duplicates_and_unknown_ids() {
    let mut s = bare_session();
    assert!(s.register_renderer(RECORDING, recording_factory(EventLog::default()), None));
    let same_family = RendererId::new("Recording 2", RendererKind::User(1), 2, 0);
    assert!(!s.register_renderer(same_family, recording_factory(EventLog::default()), None));
    assert!(!s.register_renderer(RendererId::unknown(), failing_factory(), None));
    assert_eq!(s.registered_renderers(), vec![RECORDING]);
    assert_eq!(s.error_queue_len(), 0);
}

#[test_log::test]
fn registry_has_a_capacity() {
    let mut s = Session::new(SessionConfig {
        register_builtin_renderers: false,
        max_registered_renderers: 1,
        ..SessionConfig::default()
    });
    assert!(s.register_renderer(RECORDING, recording_factory(EventLog::default()), None));
    assert!(!s.register_renderer(BROKEN, failing_factory(), None));
}

#[test_log::test]
fn missing_features_reject_a_renderer() {
    let mut s = bare_session();
    assert!(s.register_renderer(RECORDING, recording_factory(EventLog::default()), None));
    s.set_required_features(Features::BASIC_SHADERS);

    assert_eq!(s.init_renderer_by_id(RECORDING, 8, 8, InitFlags::empty()), None);
    assert_eq!(s.pop_error().code, ErrorCode::UnsupportedFunction);
    assert!(s.active_renderers().is_empty());
}

#[test_log::test]
fn a_live_renderer_cannot_be_initialized_twice() {
    let mut s = bare_session();
    assert!(s.register_renderer(RECORDING, recording_factory(EventLog::default()), None));
    assert!(s.init_renderer_by_id(RECORDING, 8, 8, InitFlags::empty()).is_some());
    assert_eq!(s.init_renderer_by_id(RECORDING, 8, 8, InitFlags::empty()), None);
    assert_eq!(s.pop_error().code, ErrorCode::UserError);
    assert_eq!(s.active_renderers(), vec![RECORDING]);
}

#[test_log::test]
fn free_renderer_releases_it_and_clears_current() {
    let mut s = bare_session();
    let freed = Rc::new(Cell::new(0));
    assert!(s.register_renderer(
        RECORDING,
        recording_factory(EventLog::default()),
        Some(counting_hook(&freed)),
    ));
    let screen = s
        .init_renderer_by_id(RECORDING, 8, 8, InitFlags::empty())
        .expect("recording renderer initializes");

    s.free_renderer(RECORDING);
    assert_eq!(freed.get(), 1);
    assert_eq!(s.current_renderer_id(), None);

    s.flip(screen);
    assert_eq!(s.pop_error().code, ErrorCode::UserError);

    // Unknown ids are ignored.
    s.free_renderer(RECORDING);
    assert_eq!(freed.get(), 1);
}

#[test_log::test]
fn builtin_software_renderer_is_registered() {
    let s = Session::default();
    assert!(s.registered_renderers().contains(&SOFTWARE));
    assert_eq!(s.renderer_order().last(), Some(&SOFTWARE));
}

#[test_log::test]
fn error_stack_is_bounded_and_lifo() {
    let mut s = Session::new(SessionConfig {
        register_builtin_renderers: false,
        max_error_queue: 3,
        ..SessionConfig::default()
    });
    for function in ["a", "b", "c", "d", "e"] {
        s.push_error(function, ErrorCode::DataError, "details");
    }
    assert_eq!(s.error_queue_len(), 3);
    assert_eq!(s.pop_error().function, "c");
    assert_eq!(s.pop_error().function, "b");
    assert_eq!(s.pop_error().function, "a");

    let empty = s.pop_error();
    assert_eq!(empty.code, ErrorCode::None);
    assert!(empty.function.is_empty());

    s.push_error("x", ErrorCode::UserError, "");
    s.set_error_queue_max(1);
    assert_eq!(s.error_queue_len(), 0);
}

#[test_log::test]
fn calls_without_a_renderer_are_user_errors() {
    let mut s = bare_session();
    s.translate(1.0, 0.0, 0.0);
    s.flush_blit_buffer();
    assert_eq!(s.error_queue_len(), 2);
    let err = s.pop_error();
    assert_eq!(err.code, ErrorCode::UserError);
    assert_eq!(err.function, "flush_blit_buffer");
    assert_eq!(Session::error_string(err.code), "USER ERROR");
}
