//! Opaque handles to session-owned resources.
//!
//! Ids come from one session-wide counter and are never reused, so a handle
//! kept after its resource was freed (or one from another renderer) simply
//! fails to resolve.

use core::fmt;
use std::cell::Cell;
use std::rc::Rc;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(u64);

        impl $name {
            #[inline]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// An image (texture plus its sampling and modulation state).
    ImageId, "image"
);
handle!(
    /// A render target (window or image backed).
    TargetId, "target"
);
handle!(ShaderId, "shader");
handle!(ProgramId, "program");

/// Monotonic id source shared by all handle kinds.
///
/// Clones share the counter, so every renderer of a session draws from the
/// same sequence.
#[derive(Debug, Clone, Default)]
pub(crate) struct HandleAllocator {
    next: Rc<Cell<u64>>,
}

impl HandleAllocator {
    fn bump(&mut self) -> u64 {
        let id = self.next.get() + 1;
        self.next.set(id);
        id
    }

    pub(crate) fn image(&mut self) -> ImageId {
        ImageId(self.bump())
    }

    pub(crate) fn target(&mut self) -> TargetId {
        TargetId(self.bump())
    }

    pub(crate) fn shader(&mut self) -> ShaderId {
        ShaderId(self.bump())
    }

    pub(crate) fn program(&mut self) -> ProgramId {
        ProgramId(self.bump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_across_kinds() {
        let mut a = HandleAllocator::default();
        let i = a.image();
        let t = a.target();
        let i2 = a.image();
        assert_ne!(i.raw(), t.raw());
        assert_ne!(i, i2);
        assert!(i2.raw() > i.raw());
    }

    #[test]
    fn clones_share_the_sequence() {
        let mut a = HandleAllocator::default();
        let mut b = a.clone();
        let first = a.image();
        let second = b.image();
        assert_eq!(second.raw(), first.raw() + 1);
    }

    #[test]
    fn debug_shows_kind() {
        let mut a = HandleAllocator::default();
        assert_eq!(format!("{:?}", a.program()), "program#1");
    }
}
