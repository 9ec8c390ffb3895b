use super::ErrorCode;

/// Bytes reserved for the function name of each stored error.
pub const FUNCTION_CAPACITY: usize = 32;
/// Bytes reserved for the details text of each stored error.
pub const DETAILS_CAPACITY: usize = 256;
/// Default number of errors the stack retains.
pub const DEFAULT_MAX_ERROR_QUEUE: usize = 20;

/// A recorded error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorObject {
    pub function: String,
    pub code: ErrorCode,
    pub details: String,
}

impl ErrorObject {
    /// The sentinel returned by [`ErrorStack::pop`] on an empty stack.
    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.code.is_none()
    }
}

#[derive(Debug)]
struct Slot {
    function: String,
    code: ErrorCode,
    details: String,
}

impl Slot {
    fn empty() -> Self {
        Self {
            function: String::with_capacity(FUNCTION_CAPACITY),
            code: ErrorCode::None,
            details: String::with_capacity(DETAILS_CAPACITY),
        }
    }

    fn fill(&mut self, function: &str, code: ErrorCode, details: &str) {
        copy_truncated(&mut self.function, function, FUNCTION_CAPACITY);
        self.code = code;
        copy_truncated(&mut self.details, details, DETAILS_CAPACITY);
    }
}

/// Copies at most `cap` bytes of `src` into `dst`, cutting on a char boundary.
fn copy_truncated(dst: &mut String, src: &str, cap: usize) {
    let mut end = src.len().min(cap);
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    dst.clear();
    dst.push_str(&src[..end]);
}

/// Bounded LIFO of recorded errors.
///
/// Slots are allocated up front; pushing into a full stack discards the new
/// entry and reports it through the return value so the caller can still
/// log it.
#[derive(Debug)]
pub struct ErrorStack {
    slots: Vec<Slot>,
    len: usize,
}

impl Default for ErrorStack {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ERROR_QUEUE)
    }
}

impl ErrorStack {
    pub fn with_capacity(max: usize) -> Self {
        let mut slots = Vec::with_capacity(max);
        slots.resize_with(max, Slot::empty);
        Self { slots, len: 0 }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records an error. Returns `false` when the stack was full and the
    /// entry was discarded.
    pub fn push(&mut self, function: &str, code: ErrorCode, details: &str) -> bool {
        if self.len >= self.slots.len() {
            return false;
        }
        self.slots[self.len].fill(function, code, details);
        self.len += 1;
        true
    }

    /// Removes and returns the most recent error, or [`ErrorObject::none`].
    pub fn pop(&mut self) -> ErrorObject {
        if self.len == 0 {
            return ErrorObject::none();
        }
        self.len -= 1;
        let slot = &mut self.slots[self.len];
        let out = ErrorObject {
            function: slot.function.clone(),
            code: slot.code,
            details: slot.details.clone(),
        };
        slot.code = ErrorCode::None;
        out
    }

    /// Most recent error without removing it.
    pub fn peek(&self) -> Option<(&str, ErrorCode, &str)> {
        let slot = self.slots[..self.len].last()?;
        Some((&slot.function, slot.code, &slot.details))
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots[..self.len] {
            slot.code = ErrorCode::None;
        }
        self.len = 0;
    }

    /// Resizes the stack. Existing entries are dropped.
    pub fn set_max(&mut self, max: usize) {
        self.slots.clear();
        self.slots.resize_with(max, Slot::empty);
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── push / pop ────────────────────────────────────────────────────────

    #[test]
    fn empty_pop_returns_none_sentinel() {
        let mut s = ErrorStack::default();
        let e = s.pop();
        assert!(e.is_none());
        assert!(e.function.is_empty());
        assert!(e.details.is_empty());
    }

    #[test]
    fn pop_is_lifo() {
        let mut s = ErrorStack::with_capacity(4);
        assert!(s.push("first", ErrorCode::UserError, "a"));
        assert!(s.push("second", ErrorCode::DataError, "b"));
        assert_eq!(s.pop().function, "second");
        assert_eq!(s.pop().function, "first");
        assert!(s.pop().is_none());
    }

    #[test]
    fn push_beyond_capacity_is_discarded() {
        let mut s = ErrorStack::with_capacity(20);
        for i in 0..25 {
            let stored = s.push("f", ErrorCode::UserError, &i.to_string());
            assert_eq!(stored, i < 20);
        }
        assert_eq!(s.len(), 20);
        // Newest retained entry is the 20th push.
        assert_eq!(s.pop().details, "19");
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut s = ErrorStack::with_capacity(0);
        assert!(!s.push("f", ErrorCode::UserError, ""));
        assert!(s.pop().is_none());
    }

    // ── truncation ────────────────────────────────────────────────────────

    #[test]
    fn long_fields_are_truncated() {
        let mut s = ErrorStack::default();
        let name = "n".repeat(100);
        let details = "d".repeat(1000);
        s.push(&name, ErrorCode::BackendError, &details);
        let e = s.pop();
        assert_eq!(e.function.len(), FUNCTION_CAPACITY);
        assert_eq!(e.details.len(), DETAILS_CAPACITY);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut s = ErrorStack::default();
        // 3-byte chars; 32 is not a multiple of 3.
        let name = "€".repeat(20);
        s.push(&name, ErrorCode::UserError, "");
        let e = s.pop();
        assert_eq!(e.function.len(), 30);
        assert!(e.function.chars().all(|c| c == '€'));
    }

    // ── resize / clear ────────────────────────────────────────────────────

    #[test]
    fn set_max_clears_and_resizes() {
        let mut s = ErrorStack::with_capacity(2);
        s.push("a", ErrorCode::UserError, "");
        s.set_max(5);
        assert!(s.is_empty());
        assert_eq!(s.capacity(), 5);
        for _ in 0..5 {
            assert!(s.push("a", ErrorCode::UserError, ""));
        }
        assert!(!s.push("a", ErrorCode::UserError, ""));
    }

    #[test]
    fn clear_empties_stack() {
        let mut s = ErrorStack::default();
        s.push("a", ErrorCode::UserError, "x");
        s.clear();
        assert!(s.is_empty());
        assert!(s.peek().is_none());
    }

    #[test]
    fn peek_does_not_remove() {
        let mut s = ErrorStack::default();
        s.push("a", ErrorCode::NullArgument, "image");
        assert_eq!(s.peek(), Some(("a", ErrorCode::NullArgument, "image")));
        assert_eq!(s.len(), 1);
    }
}
