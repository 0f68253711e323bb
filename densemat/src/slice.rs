/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Numpy-style slice arithmetic.

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

use crate::error::{Error, Result};

/// A `start:stop:step` slice along one axis with numpy semantics.
///
/// Negative bounds count from the end of the axis, out-of-range bounds are clamped, and
/// a negative step walks the axis backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

/// The concrete positions selected by a [`Slice`] on an axis of a given length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// First selected position. Only meaningful when `count > 0`.
    pub start: usize,
    /// Distance between consecutive selected positions.
    pub step: isize,
    /// Number of selected positions.
    pub count: usize,
}

impl Slice {
    /// Construct a slice from its three components.
    pub fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Self { start, stop, step }
    }

    /// The slice `::`, selecting an entire axis.
    pub fn full() -> Self {
        Self::new(None, None, 1)
    }

    /// Replace the step of this slice.
    pub fn step_by(self, step: isize) -> Self {
        Self { step, ..self }
    }

    /// Resolve this slice against an axis of length `len`.
    pub fn resolve(&self, len: usize) -> Result<Resolved> {
        let step = self.step;
        if step == 0 {
            return Err(Error::ZeroStep);
        }
        let len = len as isize;
        let backwards = step < 0;

        let clamp = |bound: isize| -> isize {
            if bound < 0 {
                let bound = bound + len;
                if bound < 0 {
                    if backwards {
                        -1
                    } else {
                        0
                    }
                } else {
                    bound
                }
            } else if bound >= len {
                if backwards {
                    len - 1
                } else {
                    len
                }
            } else {
                bound
            }
        };

        let start = match self.start {
            Some(start) => clamp(start),
            None if backwards => len - 1,
            None => 0,
        };
        let stop = match self.stop {
            Some(stop) => clamp(stop),
            None if backwards => -1,
            None => len,
        };

        // Clamped bounds lie in `[-1, len]`, so only the step magnitude can be extreme.
        let span = if backwards { start - stop } else { stop - start };
        let count = if span > 0 {
            (span as usize - 1) / step.unsigned_abs() + 1
        } else {
            0
        };

        Ok(Resolved {
            start: if count == 0 { 0 } else { start as usize },
            step,
            count,
        })
    }
}

impl Default for Slice {
    fn default() -> Self {
        Self::full()
    }
}

impl From<Range<isize>> for Slice {
    fn from(range: Range<isize>) -> Self {
        Self::new(Some(range.start), Some(range.end), 1)
    }
}

impl From<RangeFrom<isize>> for Slice {
    fn from(range: RangeFrom<isize>) -> Self {
        Self::new(Some(range.start), None, 1)
    }
}

impl From<RangeTo<isize>> for Slice {
    fn from(range: RangeTo<isize>) -> Self {
        Self::new(None, Some(range.end), 1)
    }
}

impl From<RangeInclusive<isize>> for Slice {
    fn from(range: RangeInclusive<isize>) -> Self {
        let (start, end) = range.into_inner();
        // `-1..=-1` must not become the empty `-1..0`.
        let stop = if end == -1 { None } else { Some(end + 1) };
        Self::new(Some(start), stop, 1)
    }
}

impl From<RangeToInclusive<isize>> for Slice {
    fn from(range: RangeToInclusive<isize>) -> Self {
        let stop = if range.end == -1 {
            None
        } else {
            Some(range.end + 1)
        };
        Self::new(None, stop, 1)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// Index applied to one axis: either a single position or a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisIndex {
    /// Select one position and drop the axis. Negative values count from the end.
    Index(isize),
    /// Select a strided range and keep the axis.
    Slice(Slice),
}

impl AxisIndex {
    /// Return whether this index drops its axis.
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

impl From<isize> for AxisIndex {
    fn from(index: isize) -> Self {
        Self::Index(index)
    }
}

impl From<Slice> for AxisIndex {
    fn from(slice: Slice) -> Self {
        Self::Slice(slice)
    }
}

macro_rules! axis_index_from_range {
    ($($T:ty),* $(,)?) => {
        $(
            impl From<$T> for AxisIndex {
                fn from(range: $T) -> Self {
                    Self::Slice(range.into())
                }
            }
        )*
    };
}

axis_index_from_range!(
    Range<isize>,
    RangeFrom<isize>,
    RangeTo<isize>,
    RangeInclusive<isize>,
    RangeToInclusive<isize>,
    RangeFull,
);

/// Map a possibly-negative `index` onto `[0, len)`.
pub(crate) fn normalize_index(index: isize, axis: usize, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        index + len as isize
    } else {
        index
    };
    if resolved < 0 || resolved >= len as isize {
        Err(Error::IndexOutOfRange { index, axis, len })
    } else {
        Ok(resolved as usize)
    }
}

/// Check an unsigned `index` against `[0, len)`.
pub(crate) fn check_index(index: usize, axis: usize, len: usize) -> Result<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(Error::IndexOutOfRange {
            index: isize::try_from(index).unwrap_or(isize::MAX),
            axis,
            len,
        })
    }
}
