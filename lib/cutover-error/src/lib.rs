//! Error primitives shared across the workspace.

use std::fmt::Display;

mod multi;
pub use self::multi::MultiError;

/// A type-erased error.
pub type GenericError = anyhow::Error;

/// Macro for constructing a generic error.
///
/// The resulting value evaluates to [`GenericError`], and can be constructed from a string literal, a format string
/// (with arguments accepted, in the same order as `std::format!`), or a value which implements `Debug` and `Display`,
/// such as an existing error that implements `std::error::Error`.
#[macro_export]
macro_rules! generic_error {
    ($msg:literal $(,)?) => { $crate::_anyhow!($msg) };
    ($err:expr $(,)?) => { $crate::_anyhow!($err) };
    ($fmt:expr, $($arg:tt)*) => { $crate::_anyhow!($fmt, $($arg)*) };
}

#[doc(hidden)]
pub use anyhow::anyhow as _anyhow;

pub(crate) mod private {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}

// NOTE: Wrapping `anyhow::Context` keeps these extension methods from colliding with `snafu::ResultExt` in modules
// that import both.
/// Extension methods for attaching context to the error of a `Result`.
pub trait ErrorContext<T, E>: private::Sealed {
    /// Wrap the error value with additional context.
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the error value with additional context that is evaluated lazily only once an error does occur.
    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    Result<T, E>: anyhow::Context<T, E>,
{
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
    {
        <Self as anyhow::Context<T, E>>::context(self, context)
    }

    fn with_error_context<C, F>(self, context: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        <Self as anyhow::Context<T, E>>::with_context(self, context)
    }
}
