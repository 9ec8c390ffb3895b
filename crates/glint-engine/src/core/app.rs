use winit::event::WindowEvent;

use crate::handle::TargetId;
use crate::session::Session;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
///
/// `screen` is the window's target. The runtime flips it after every
/// `on_frame`.
pub trait App {
    /// Called once, right after the session initialized a renderer.
    fn on_init(&mut self, session: &mut Session, screen: TargetId) -> AppControl {
        let _ = (session, screen);
        AppControl::Continue
    }

    /// Called for window events the runtime does not consume itself.
    fn on_window_event(&mut self, session: &mut Session, event: &WindowEvent) -> AppControl {
        let _ = (session, event);
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, session: &mut Session, screen: TargetId) -> AppControl;
}
