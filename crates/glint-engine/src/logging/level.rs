/// How much the session echoes to the `log` facade.
///
/// - `Level0`: silent; errors are only recorded on the error stack.
/// - `Level1`: recorded errors are also logged.
/// - `Level2`: renderer selection attempts and fallbacks are logged.
/// - `Level3`: flushes, binds and resource churn are traced.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DebugLevel {
    #[default]
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
}

impl DebugLevel {
    pub const MAX: DebugLevel = DebugLevel::Level3;

    /// Converts a raw level, clamping values above [`DebugLevel::MAX`].
    pub fn from_u8(level: u8) -> Self {
        match level {
            0 => DebugLevel::Level0,
            1 => DebugLevel::Level1,
            2 => DebugLevel::Level2,
            _ => DebugLevel::Level3,
        }
    }

    #[inline]
    pub fn logs_errors(self) -> bool {
        self >= DebugLevel::Level1
    }

    #[inline]
    pub fn logs_selection(self) -> bool {
        self >= DebugLevel::Level2
    }

    #[inline]
    pub fn traces(self) -> bool {
        self >= DebugLevel::Level3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_clamps() {
        assert_eq!(DebugLevel::from_u8(0), DebugLevel::Level0);
        assert_eq!(DebugLevel::from_u8(2), DebugLevel::Level2);
        assert_eq!(DebugLevel::from_u8(200), DebugLevel::MAX);
    }

    #[test]
    fn gates_are_cumulative() {
        assert!(!DebugLevel::Level0.logs_errors());
        assert!(DebugLevel::Level1.logs_errors());
        assert!(!DebugLevel::Level1.logs_selection());
        assert!(DebugLevel::Level2.logs_selection());
        assert!(!DebugLevel::Level2.traces());
        assert!(DebugLevel::Level3.traces() && DebugLevel::Level3.logs_errors());
    }
}
