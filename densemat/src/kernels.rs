/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Slice-level kernels backing the structural operations of vectors and matrices.
//!
//! These functions know nothing about ownership or views. Callers validate arguments.

use crate::matrix::{ResizePolicy, Transpose};

/// Physical layout of a row-major block: `nrows` rows of `ncols` elements, each starting
/// `stride` elements after the previous one.
///
/// A vector of length `n` is the single-row layout `1 x n` with stride `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) stride: usize,
}

impl Layout {
    pub(crate) fn new(nrows: usize, ncols: usize, stride: usize) -> Self {
        debug_assert!(stride >= ncols);
        Self {
            nrows,
            ncols,
            stride,
        }
    }

    pub(crate) fn row(len: usize) -> Self {
        Self::new(1, len, len)
    }

    /// Number of elements the layout occupies.
    pub(crate) fn len(&self) -> usize {
        self.nrows * self.stride
    }
}

/// Copy `src` into `dst`. Both slices must have the same length.
pub(crate) fn copy(dst: &mut [f32], src: &[f32]) {
    dst.copy_from_slice(src);
}

/// Return whether `a` and `b` have the same length and differ by at most `tolerance` in
/// every position. `NaN` never compares equal.
pub(crate) fn approx_equal(a: &[f32], b: &[f32], tolerance: f32) -> bool {
    a.len() == b.len() && std::iter::zip(a, b).all(|(x, y)| (x - y).abs() <= tolerance)
}

/// Reshape `data` from layout `from` into layout `to`.
pub(crate) fn resize(data: &mut Vec<f32>, from: Layout, to: Layout, policy: ResizePolicy) {
    match policy {
        ResizePolicy::Undefined => {
            data.resize(to.len(), 0.0);
        }
        ResizePolicy::Zeroed => {
            data.clear();
            data.resize(to.len(), 0.0);
        }
        ResizePolicy::CopyData => {
            let mut out = vec![0.0; to.len()];
            let rows = from.nrows.min(to.nrows);
            let cols = from.ncols.min(to.ncols);
            for r in 0..rows {
                let src = &data[r * from.stride..r * from.stride + cols];
                out[r * to.stride..r * to.stride + cols].copy_from_slice(src);
            }
            *data = out;
        }
    }
}

/// Gather the logical elements of `data` in layout `from` into a new block, optionally
/// transposed, where every row of the result is `stride` elements long.
///
/// The result has `from.ncols` rows when transposing and `from.nrows` rows otherwise.
pub(crate) fn transpose(data: &[f32], from: Layout, trans: Transpose, stride: usize) -> Vec<f32> {
    match trans {
        Transpose::None => {
            let mut out = vec![0.0; from.nrows * stride];
            for r in 0..from.nrows {
                let src = &data[r * from.stride..r * from.stride + from.ncols];
                out[r * stride..r * stride + from.ncols].copy_from_slice(src);
            }
            out
        }
        Transpose::Ordinary => {
            let mut out = vec![0.0; from.ncols * stride];
            for r in 0..from.nrows {
                for c in 0..from.ncols {
                    out[c * stride + r] = data[r * from.stride + c];
                }
            }
            out
        }
    }
}

/// Remove the element at `index`, shifting the tail down by one.
///
/// The allocation is kept.
pub(crate) fn remove_element(data: &mut Vec<f32>, index: usize) {
    data.remove(index);
}

/// Remove row `row` of a block whose rows are `stride` elements long, shifting the
/// following rows up by one.
///
/// The allocation is kept.
pub(crate) fn remove_row(data: &mut Vec<f32>, stride: usize, row: usize) {
    data.drain(row * stride..(row + 1) * stride);
}
