use super::Mat4;

/// Default limit on how deep a single stack may grow.
pub const DEFAULT_MAX_MATRIX_DEPTH: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    #[error("matrix stack underflow")]
    Underflow,
    #[error("matrix stack is at its depth limit ({0})")]
    Overflow(usize),
}

/// Storage growth sequence: 1, 6, 16, 36, ...
#[inline]
pub(crate) fn next_capacity(capacity: usize) -> usize {
    capacity * 2 + 4
}

/// A stack of matrices that always holds at least one entry.
///
/// The top entry is the "current" matrix that transform calls mutate.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    matrices: Vec<Mat4>,
    max_depth: usize,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MATRIX_DEPTH)
    }
}

impl MatrixStack {
    pub fn new(max_depth: usize) -> Self {
        let mut matrices = Vec::with_capacity(1);
        matrices.push(Mat4::IDENTITY);
        Self {
            matrices,
            max_depth: max_depth.max(1),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.matrices.capacity()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn top(&self) -> &Mat4 {
        // Never empty: `new` pushes one entry and `pop` keeps it.
        &self.matrices[self.matrices.len() - 1]
    }

    #[inline]
    pub fn top_mut(&mut self) -> &mut Mat4 {
        let last = self.matrices.len() - 1;
        &mut self.matrices[last]
    }

    /// Duplicates the top entry.
    pub fn push(&mut self) -> Result<(), StackError> {
        if self.matrices.len() >= self.max_depth {
            return Err(StackError::Overflow(self.max_depth));
        }
        if self.matrices.len() == self.matrices.capacity() {
            let target = next_capacity(self.matrices.capacity()).min(self.max_depth);
            self.matrices.reserve_exact(target - self.matrices.len());
        }
        let top = *self.top();
        self.matrices.push(top);
        Ok(())
    }

    /// Drops the top entry; the last remaining entry cannot be popped.
    pub fn pop(&mut self) -> Result<(), StackError> {
        if self.matrices.len() <= 1 {
            return Err(StackError::Underflow);
        }
        self.matrices.pop();
        Ok(())
    }

    pub fn load_identity(&mut self) {
        *self.top_mut() = Mat4::IDENTITY;
    }

    pub fn load(&mut self, m: Mat4) {
        *self.top_mut() = m;
    }

    pub fn mult(&mut self, m: &Mat4) {
        self.top_mut().multiply_and_assign(m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_single_identity() {
        let s = MatrixStack::default();
        assert_eq!(s.len(), 1);
        assert_eq!(*s.top(), Mat4::IDENTITY);
    }

    #[test]
    fn growth_sequence() {
        let mut cap = 1;
        let mut seen = vec![cap];
        for _ in 0..3 {
            cap = next_capacity(cap);
            seen.push(cap);
        }
        assert_eq!(seen, vec![1, 6, 16, 36]);
    }

    #[test]
    fn push_duplicates_and_pop_restores() {
        let mut s = MatrixStack::default();
        s.top_mut().translate(5.0, 0.0, 0.0);
        let before = *s.top();
        s.push().unwrap();
        assert_eq!(*s.top(), before);
        s.top_mut().scale(2.0, 2.0, 1.0);
        s.pop().unwrap();
        assert_eq!(*s.top(), before);
    }

    #[test]
    fn size_tracks_pushes_minus_pops() {
        let mut s = MatrixStack::default();
        for _ in 0..40 {
            s.push().unwrap();
        }
        for _ in 0..15 {
            s.pop().unwrap();
        }
        assert_eq!(s.len(), 26);
        assert!(s.capacity() >= s.len());
    }

    #[test]
    fn pop_at_size_one_fails_and_leaves_stack_intact() {
        let mut s = MatrixStack::default();
        s.top_mut().translate(1.0, 1.0, 0.0);
        let top = *s.top();
        assert_eq!(s.pop(), Err(StackError::Underflow));
        assert_eq!(s.len(), 1);
        assert_eq!(*s.top(), top);
    }

    #[test]
    fn push_past_limit_fails() {
        let mut s = MatrixStack::new(3);
        s.push().unwrap();
        s.push().unwrap();
        assert_eq!(s.push(), Err(StackError::Overflow(3)));
        assert_eq!(s.len(), 3);
    }
}
