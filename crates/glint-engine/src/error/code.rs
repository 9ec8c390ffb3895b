use core::fmt;

/// Error taxonomy recorded on the error stack.
///
/// Every failure reported by a public `Session` operation carries one of
/// these codes. `None` is the sentinel returned when the stack is empty.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    #[default]
    None,
    /// The backend failed (device, driver, surface or shader compiler).
    BackendError,
    /// Input data was malformed or unsupported (codec, formats, ids).
    DataError,
    /// The caller misused the API (no renderer, bad state, bad parameters).
    UserError,
    /// The active backend cannot perform the operation.
    UnsupportedFunction,
    /// A handle was missing, stale or belongs to another renderer.
    NullArgument,
    FileNotFound,
}

impl ErrorCode {
    /// Human-readable name of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::None => "NO ERROR",
            ErrorCode::BackendError => "BACKEND ERROR",
            ErrorCode::DataError => "DATA ERROR",
            ErrorCode::UserError => "USER ERROR",
            ErrorCode::UnsupportedFunction => "UNSUPPORTED FUNCTION",
            ErrorCode::NullArgument => "NULL ARGUMENT",
            ErrorCode::FileNotFound => "FILE NOT FOUND",
        }
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        matches!(self, ErrorCode::None)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
