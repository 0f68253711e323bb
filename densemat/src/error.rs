/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use thiserror::Error;

/// Convenience alias for a `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Every error raised by this crate is a caller-side misuse of an in-memory data
/// structure, so none of these kinds are transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid construction arguments or shapes.
    ValueConstraint,
    /// An index, slice bound or delete index was outside the valid range.
    Bounds,
    /// A structural mutation was attempted on a handle that does not own its memory.
    OwnershipViolation,
    /// An unsupported index kind, or an indexing result of an unexpected type.
    TypeMismatch,
    /// Two operands were required to have the same shape.
    ShapeMismatch,
    /// A view outlived the buffer it refers to, or the buffer was restructured.
    Expired,
    /// A [`crate::Config`] failed validation.
    InvalidConfig,
}

/// The error type shared through `densemat`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(
        "num_rows and num_cols should both be positive or both be 0, got num_rows={rows} \
         and num_cols={cols}"
    )]
    MixedZeroDims { rows: usize, cols: usize },

    #[error("expected a {expected}-D array-like object, got a {actual}-D object")]
    RankMismatch { expected: usize, actual: usize },

    #[error("slice step cannot be zero")]
    ZeroStep,

    #[error("row {row} has {len} elements but row 0 has {expected}")]
    Ragged {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("array-like object reports shape {shape:?} but provides {len} elements")]
    ElementCount { shape: Vec<usize>, len: usize },

    #[error("{name}={value} should be in the range [0, {max}]")]
    StartOutOfRange {
        name: &'static str,
        value: usize,
        max: usize,
    },

    #[error("{name}={value} should be in the range [0, {max}] when {start_name}={start} and the source extent is {extent}")]
    CountOutOfRange {
        name: &'static str,
        value: usize,
        max: usize,
        start_name: &'static str,
        start: usize,
        extent: usize,
    },

    #[error("index {index} is out of bounds for axis {axis} with size {len}")]
    IndexOutOfRange { index: isize, axis: usize, len: usize },

    #[error("{op} cannot be called on {what} that do not own their data")]
    NotOwner {
        op: &'static str,
        what: &'static str,
    },

    #[error("slice step {step} on axis {axis} does not fit in a memory stride")]
    StepOverflow { step: isize, axis: usize },

    #[error("expected at most {max} indices, got {got}")]
    TooManyIndices { max: usize, got: usize },

    #[error("{handle} indexing expects {expected} indices, got {got}")]
    IndexArity {
        handle: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("indexing operation returned a {got} where a {expected} was expected")]
    UnexpectedResult {
        expected: &'static str,
        got: &'static str,
    },

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("could not broadcast an array of shape {from:?} into shape {into:?}")]
    Broadcast { from: Vec<usize>, into: Vec<usize> },

    #[error("the view refers to a buffer that was released by its owner")]
    Released,

    #[error(
        "the view refers to a buffer that was restructured by its owner (view generation \
         {observed}, buffer generation {current})"
    )]
    Restructured { observed: u64, current: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Return the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MixedZeroDims { .. }
            | Self::RankMismatch { .. }
            | Self::ZeroStep
            | Self::Ragged { .. }
            | Self::ElementCount { .. } => ErrorKind::ValueConstraint,
            Self::StartOutOfRange { .. }
            | Self::CountOutOfRange { .. }
            | Self::IndexOutOfRange { .. }
            | Self::StepOverflow { .. }
            | Self::TooManyIndices { .. } => ErrorKind::Bounds,
            Self::NotOwner { .. } => ErrorKind::OwnershipViolation,
            Self::IndexArity { .. } | Self::UnexpectedResult { .. } => ErrorKind::TypeMismatch,
            Self::ShapeMismatch { .. } | Self::Broadcast { .. } => ErrorKind::ShapeMismatch,
            Self::Released | Self::Restructured { .. } => ErrorKind::Expired,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    pub(crate) fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

/// Check `start <= extent`, naming the offending argument on failure.
pub(crate) fn check_start(name: &'static str, start: usize, extent: usize) -> Result<()> {
    if start <= extent {
        Ok(())
    } else {
        Err(Error::StartOutOfRange {
            name,
            value: start,
            max: extent,
        })
    }
}

/// Resolve an optional count against the extent remaining after `start`.
///
/// `start` must already have been validated with [`check_start`].
pub(crate) fn resolve_count(
    name: &'static str,
    count: Option<usize>,
    start_name: &'static str,
    start: usize,
    extent: usize,
) -> Result<usize> {
    let max = extent - start;
    match count {
        None => Ok(max),
        Some(value) if value <= max => Ok(value),
        Some(value) => Err(Error::CountOutOfRange {
            name,
            value,
            max,
            start_name,
            start,
            extent,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_classified() {
        assert_eq!(
            Error::MixedZeroDims { rows: 3, cols: 0 }.kind(),
            ErrorKind::ValueConstraint
        );
        assert_eq!(Error::ZeroStep.kind(), ErrorKind::ValueConstraint);
        assert_eq!(
            Error::IndexOutOfRange {
                index: 5,
                axis: 0,
                len: 5
            }
            .kind(),
            ErrorKind::Bounds
        );
        assert_eq!(
            Error::NotOwner {
                op: "resize",
                what: "vectors"
            }
            .kind(),
            ErrorKind::OwnershipViolation
        );
        assert_eq!(
            Error::UnexpectedResult {
                expected: "scalar",
                got: "vector"
            }
            .kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            Error::shape_mismatch(&[2], &[3]).kind(),
            ErrorKind::ShapeMismatch
        );
        assert_eq!(Error::Released.kind(), ErrorKind::Expired);
        assert_eq!(
            Error::Restructured {
                observed: 0,
                current: 1
            }
            .kind(),
            ErrorKind::Expired
        );
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = check_start("start", 7, 5).unwrap_err();
        assert_eq!(err.to_string(), "start=7 should be in the range [0, 5]");

        let err = resolve_count("length", Some(4), "start", 2, 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "length=4 should be in the range [0, 3] when start=2 and the source extent is 5"
        );

        let err = Error::MixedZeroDims { rows: 3, cols: 0 };
        assert!(err.to_string().contains("num_rows=3"));
        assert!(err.to_string().contains("num_cols=0"));
    }

    #[test]
    fn counts_default_to_the_remaining_extent() {
        assert_eq!(resolve_count("length", None, "start", 0, 5).unwrap(), 5);
        assert_eq!(resolve_count("length", None, "start", 5, 5).unwrap(), 0);
        assert_eq!(resolve_count("length", Some(0), "start", 5, 5).unwrap(), 0);
        assert_eq!(resolve_count("length", Some(3), "start", 2, 5).unwrap(), 3);
        assert!(check_start("start", 5, 5).is_ok());
    }
}
