//! Error taxonomy, the bounded error stack, and the internal error types.
//!
//! Internal layers (`Renderer`, registry, backends) return `Result`s. The
//! `Session` converts every `Err` into an error-stack entry plus a sentinel
//! return value, so the public surface never panics.

mod code;
mod stack;

pub use code::ErrorCode;
pub use stack::{
    DEFAULT_MAX_ERROR_QUEUE, DETAILS_CAPACITY, ErrorObject, ErrorStack, FUNCTION_CAPACITY,
};

/// Failure reported by a [`Backend`](crate::renderer::Backend).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),
    #[error("backend resource not found")]
    NotFound,
    #[error("device error: {0}")]
    Device(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("shader error: {0}")]
    Shader(String),
    #[error("window error: {0}")]
    Window(String),
}

impl BackendError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BackendError::Unsupported(_) => ErrorCode::UnsupportedFunction,
            BackendError::NotFound => ErrorCode::NullArgument,
            BackendError::Device(_)
            | BackendError::Surface(_)
            | BackendError::Shader(_)
            | BackendError::Window(_) => ErrorCode::BackendError,
        }
    }
}

/// Internal error carried up to the session, which records it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{function}: {code}: {details}")]
pub struct GpuError {
    pub function: &'static str,
    pub code: ErrorCode,
    pub details: String,
}

pub type GpuResult<T> = Result<T, GpuError>;

impl GpuError {
    pub fn new(function: &'static str, code: ErrorCode, details: impl Into<String>) -> Self {
        Self {
            function,
            code,
            details: details.into(),
        }
    }

    pub fn null_argument(function: &'static str, what: &str) -> Self {
        Self::new(function, ErrorCode::NullArgument, what)
    }

    pub fn user(function: &'static str, details: impl Into<String>) -> Self {
        Self::new(function, ErrorCode::UserError, details)
    }

    pub fn data(function: &'static str, details: impl Into<String>) -> Self {
        Self::new(function, ErrorCode::DataError, details)
    }

    pub fn unsupported(function: &'static str, details: impl Into<String>) -> Self {
        Self::new(function, ErrorCode::UnsupportedFunction, details)
    }

    /// Wraps a backend failure, keeping its code.
    pub fn backend(function: &'static str, err: BackendError) -> Self {
        Self::new(function, err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_codes() {
        assert_eq!(
            BackendError::Unsupported("mipmaps").code(),
            ErrorCode::UnsupportedFunction
        );
        assert_eq!(BackendError::NotFound.code(), ErrorCode::NullArgument);
        assert_eq!(
            BackendError::Device("lost".into()).code(),
            ErrorCode::BackendError
        );
    }

    #[test]
    fn gpu_error_from_backend_keeps_code_and_message() {
        let e = GpuError::backend("generate_mipmaps", BackendError::Unsupported("mipmaps"));
        assert_eq!(e.code, ErrorCode::UnsupportedFunction);
        assert!(e.details.contains("mipmaps"));
        assert_eq!(e.function, "generate_mipmaps");
    }

    #[test]
    fn gpu_error_display() {
        let e = GpuError::null_argument("blit", "image");
        assert_eq!(e.to_string(), "blit: NULL ARGUMENT: image");
    }
}
