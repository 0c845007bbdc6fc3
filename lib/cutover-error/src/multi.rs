use std::fmt;

use crate::GenericError;

/// An ordered collection of errors produced by a single logical operation.
///
/// When one operation fans out to several fallible calls, and every call must be attempted regardless of earlier
/// failures, `MultiError` gathers the failures so they can be surfaced to the caller as one error. Errors are kept in
/// the order they were added, and no deduplication is performed: two calls failing with the same message show up as
/// two entries.
///
/// When displayed, every underlying error is rendered with its full context chain, separated by `; `.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<GenericError>,
}

impl MultiError {
    /// Creates an empty `MultiError`.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Adds an error.
    pub fn push<E>(&mut self, error: E)
    where
        E: Into<GenericError>,
    {
        self.errors.push(error.into());
    }

    /// Adds the error from `result`, if any.
    pub fn push_result<T, E>(&mut self, result: Result<T, E>)
    where
        E: Into<GenericError>,
    {
        if let Err(e) = result {
            self.push(e);
        }
    }

    /// Returns the number of errors collected.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if no errors have been collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns an iterator over the collected errors, in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &GenericError> {
        self.errors.iter()
    }

    /// Consumes `self`, returning `Ok(())` if no errors were collected, or `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no errors");
        }

        for (i, error) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{:#}", error)?;
        }

        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl FromIterator<GenericError> for MultiError {
    fn from_iter<I: IntoIterator<Item = GenericError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Extend<GenericError> for MultiError {
    fn extend<I: IntoIterator<Item = GenericError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generic_error, ErrorContext as _};

    #[test]
    fn empty_is_ok() {
        let errors = MultiError::new();
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn display_includes_every_error() {
        let mut errors = MultiError::new();
        errors.push(generic_error!("first write failed"));
        errors.push_result::<(), _>(Err(generic_error!("second write failed")));
        errors.push_result::<(), GenericError>(Ok(()));

        assert_eq!(errors.len(), 2);

        let rendered = errors.into_result().unwrap_err().to_string();
        assert_eq!(rendered, "first write failed; second write failed");
    }

    #[test]
    fn duplicates_are_kept() {
        let errors = (0..3).map(|_| generic_error!("same")).collect::<MultiError>();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.to_string(), "same; same; same");
    }

    #[test]
    fn display_includes_context_chain() {
        let result: Result<(), GenericError> = Err(generic_error!("connection reset"));
        let mut errors = MultiError::new();
        errors.push_result(result.error_context("Failed to write counter."));

        let rendered = errors.to_string();
        assert!(rendered.contains("Failed to write counter."));
        assert!(rendered.contains("connection reset"));
    }
}
