/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    array_like::{dense_values, ArrayLike, DType},
    buffer::BufferView,
    config::Config,
    error::{check_start, resolve_count, Error, Result},
    index::{Assign, IndexResult},
    kernels::{self, Layout},
    slice::{check_index, AxisIndex, Slice},
    storage::StorageRef,
    vector::Vector,
};

/// How the contents of a buffer are treated when it is resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizePolicy {
    /// The contents are unspecified after resizing.
    Undefined,
    /// Every element is zero after resizing.
    #[default]
    Zeroed,
    /// The region shared by the old and new shapes is kept. The rest is zero.
    CopyData,
}

/// How the row stride of an owning matrix is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StridePolicy {
    /// Pad each row to a multiple of [`Config::row_alignment`] elements.
    #[default]
    Default,
    /// Rows are packed back to back.
    EqualNumCols,
}

/// Indicate whether a source matrix should be implicitly transposed for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    /// Use the source directly.
    None,
    /// Use the transpose of the source.
    Ordinary,
}

impl Transpose {
    /// Return whether or not the enum is `Transpose::Ordinary`.
    pub fn is_transpose(&self) -> bool {
        matches!(self, Self::Ordinary)
    }

    /// Forward one of the arguments, depending on the value of `self`.
    pub fn forward<T>(&self, if_none: T, if_transpose: T) -> T {
        match self {
            Self::None => if_none,
            Self::Ordinary => if_transpose,
        }
    }
}

/// A row-major dense matrix of `f32` that either owns its buffer or views a buffer owned
/// elsewhere.
///
/// Rows may be padded, so the distance between consecutive rows (the stride) can exceed
/// the number of columns.
///
/// ```text
///            |<------ stride ------>|
///            |<-- ncols -->|
///            +-------------+
///    row 0 ->| a0 a1 a2 a3 | pad pad
///    row 1 ->| b0 b1 b2 b3 | pad pad
///    row 2 ->| c0 c1 c2 c3 | pad pad
///            +-------------+
/// ```
///
/// Only owning matrices may be resized, transposed, swapped or shrunk.
#[derive(Debug)]
pub struct Matrix {
    // A two-dimensional view with strides `[stride, 1]` and `stride >= ncols`.
    view: BufferView,
    owns_memory: bool,
    stride_policy: StridePolicy,
    row_alignment: NonZeroUsize,
}

fn check_dims(nrows: usize, ncols: usize) -> Result<()> {
    if (nrows == 0) != (ncols == 0) {
        Err(Error::MixedZeroDims {
            rows: nrows,
            cols: ncols,
        })
    } else {
        Ok(())
    }
}

fn choose_stride(ncols: usize, policy: StridePolicy, row_alignment: NonZeroUsize) -> usize {
    match policy {
        StridePolicy::Default => Config::default()
            .with_row_alignment(row_alignment)
            .padded_stride(ncols),
        StridePolicy::EqualNumCols => ncols,
    }
}

impl Matrix {
    fn owned(
        data: Vec<f32>,
        nrows: usize,
        ncols: usize,
        stride: usize,
        stride_policy: StridePolicy,
        row_alignment: NonZeroUsize,
    ) -> Self {
        debug_assert_eq!(data.len(), nrows * stride);
        Self {
            view: BufferView::from_parts(
                StorageRef::allocate(data),
                0,
                vec![nrows, ncols],
                vec![stride as isize, 1],
            ),
            owns_memory: true,
            stride_policy,
            row_alignment,
        }
    }

    /// Construct an owning `nrows x ncols` matrix with padded rows.
    ///
    /// The contents are unspecified. Returns an error unless both dimensions are zero or
    /// both are positive.
    pub fn new(nrows: usize, ncols: usize) -> Result<Self> {
        Self::with_config(nrows, ncols, StridePolicy::Default, &Config::default())
    }

    /// Construct an owning `nrows x ncols` matrix of zeros with padded rows.
    pub fn zeros(nrows: usize, ncols: usize) -> Result<Self> {
        Self::new(nrows, ncols)
    }

    /// Construct an owning `nrows x ncols` zero matrix whose stride follows `policy` and
    /// the row alignment of `config`.
    pub fn with_config(
        nrows: usize,
        ncols: usize,
        policy: StridePolicy,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;
        check_dims(nrows, ncols)?;
        let stride = choose_stride(ncols, policy, config.row_alignment);
        Ok(Self::owned(
            vec![0.0; nrows * stride],
            nrows,
            ncols,
            stride,
            policy,
            config.row_alignment,
        ))
    }

    /// Construct an owning `0 x 0` matrix.
    pub fn empty() -> Self {
        Self::owned(
            Vec::new(),
            0,
            0,
            0,
            StridePolicy::Default,
            Config::default().row_alignment,
        )
    }

    /// Construct an owning matrix over `data` laid out row-major with no padding.
    ///
    /// Returns an error if `data.len() != nrows * ncols`.
    pub fn from_vec(data: Vec<f32>, nrows: usize, ncols: usize) -> Result<Self> {
        check_dims(nrows, ncols)?;
        if data.len() != nrows * ncols {
            return Err(Error::ElementCount {
                shape: vec![nrows, ncols],
                len: data.len(),
            });
        }
        Ok(Self::owned(
            data,
            nrows,
            ncols,
            ncols,
            StridePolicy::EqualNumCols,
            Config::default().row_alignment,
        ))
    }

    /// Construct an owning matrix with padded rows holding a copy of the two-dimensional
    /// `src`.
    pub fn from_rows<A>(src: &A) -> Result<Self>
    where
        A: ArrayLike + ?Sized,
    {
        let shape = src.shape();
        let &[nrows, ncols] = shape.as_slice() else {
            return Err(Error::RankMismatch {
                expected: 2,
                actual: shape.len(),
            });
        };
        let mut m = Self::new(nrows, ncols)?;
        m.copy_from(src)?;
        Ok(m)
    }

    /// Construct a non-owning matrix over the block `row_start..row_start + num_rows` by
    /// `col_start..col_start + num_cols` of `src`.
    ///
    /// The result aliases `src` when `src` exposes crate-managed `f32` memory with a unit
    /// column stride. Otherwise it holds a private copy. Either way it does not own its
    /// memory. Omitted counts select everything after the corresponding start.
    pub fn new_view<A>(
        src: &A,
        row_start: usize,
        num_rows: Option<usize>,
        col_start: usize,
        num_cols: Option<usize>,
    ) -> Result<Self>
    where
        A: ArrayLike + ?Sized,
    {
        let view = BufferView::from_array_like(src)?;
        let &[nrows, ncols] = view.shape() else {
            return Err(Error::RankMismatch {
                expected: 2,
                actual: view.ndim(),
            });
        };
        check_start("row_start", row_start, nrows)?;
        check_start("col_start", col_start, ncols)?;
        let num_rows = resolve_count("num_rows", num_rows, "row_start", row_start, nrows)?;
        let num_cols = resolve_count("num_cols", num_cols, "col_start", col_start, ncols)?;

        let span = |start: usize, count: usize| {
            AxisIndex::from(Slice::new(
                Some(start as isize),
                Some((start + count) as isize),
                1,
            ))
        };
        let sub = view.slice(&[span(row_start, num_rows), span(col_start, num_cols)])?;
        Self::from_array_view(sub)
    }

    /// Construct a non-owning matrix from a two-dimensional buffer view.
    ///
    /// A view that cannot be described with strides `[stride, 1]` and `stride >= ncols`
    /// is copied into a private buffer.
    pub fn from_array_view(view: BufferView) -> Result<Self> {
        let (&[nrows, ncols], &[rs, cs]) = (view.shape(), view.strides()) else {
            return Err(Error::RankMismatch {
                expected: 2,
                actual: view.ndim(),
            });
        };

        let row_stride_ok = rs > 0 && rs as usize >= ncols;
        let aliasable = (ncols <= 1 || cs == 1) && (nrows <= 1 || row_stride_ok);
        let mut view = if aliasable {
            view
        } else {
            debug!(
                nrows,
                ncols,
                row_stride = rs,
                col_stride = cs,
                "matrix source cannot be described with a unit column stride, copying"
            );
            view.to_contiguous()?
        };

        // With at most one row the row stride is never used.
        let stride = if aliasable && (nrows > 1 || row_stride_ok) {
            rs
        } else {
            ncols as isize
        };
        view.set_layout(vec![nrows, ncols], vec![stride, 1]);
        Ok(Self {
            view,
            owns_memory: false,
            stride_policy: StridePolicy::Default,
            row_alignment: Config::default().row_alignment,
        })
    }

    /// Return a non-owning matrix over a block of `self` that aliases `self`.
    pub fn range(
        &self,
        row_start: usize,
        num_rows: Option<usize>,
        col_start: usize,
        num_cols: Option<usize>,
    ) -> Result<Self> {
        Self::new_view(self, row_start, num_rows, col_start, num_cols)
    }

    /// Return a descriptor that shares memory with `self`.
    ///
    /// The descriptor never keeps the memory alive on its own.
    pub fn to_array_view(&self) -> Result<BufferView> {
        self.view.borrowed()
    }

    pub fn nrows(&self) -> usize {
        self.view.shape()[0]
    }

    pub fn ncols(&self) -> usize {
        self.view.shape()[1]
    }

    /// Return `(nrows, ncols)`.
    pub fn size(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Distance in elements between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.view.strides()[0] as usize
    }

    /// Return whether the matrix has no elements.
    pub fn is_empty(&self) -> bool {
        self.nrows() == 0 || self.ncols() == 0
    }

    /// Return whether this matrix is responsible for its memory.
    pub fn owns_memory(&self) -> bool {
        self.owns_memory
    }

    /// Return whether writes through this matrix reach memory owned by another handle.
    pub fn is_aliased(&self) -> bool {
        self.view.is_aliased()
    }

    /// Read the element at `(row, col)`. Negative values count from the end.
    pub fn get(&self, row: isize, col: isize) -> Result<f32> {
        self.view.get(&[row, col])
    }

    /// Write the element at `(row, col)`. Negative values count from the end.
    pub fn set(&mut self, row: isize, col: isize, value: f32) -> Result<()> {
        self.view.set(&[row, col], value)
    }

    /// Return row `row` as a vector that aliases `self`.
    pub fn row(&self, row: usize) -> Result<Vector> {
        let row = check_index(row, 0, self.nrows())?;
        let view = self.to_array_view()?.slice(&[AxisIndex::Index(row as isize)])?;
        Vector::from_array_view(view)
    }

    /// Return a copy of the elements in row-major order, without padding.
    pub fn to_vec(&self) -> Result<Vec<f32>> {
        self.view.to_vec()
    }

    /// Index with numpy semantics. Exactly two indices are required.
    ///
    /// Two integers yield a scalar, an integer and a slice yield a [`Vector`], and two
    /// slices yield a [`Matrix`]. Results alias `self` whenever the selected elements can
    /// be described with a unit innermost stride, and hold a private copy otherwise.
    pub fn get_item(&self, index: &[AxisIndex]) -> Result<IndexResult> {
        Self::check_index_arity(index)?;
        let view = self.to_array_view()?.slice(index)?;
        match view.ndim() {
            0 => view.get(&[]).map(IndexResult::Scalar),
            1 => Vector::from_array_view(view).map(IndexResult::Vector),
            _ => Self::from_array_view(view).map(IndexResult::Matrix),
        }
    }

    /// Write `value` into the elements selected by `index`, broadcasting as numpy does.
    pub fn set_item<'a>(
        &mut self,
        index: &[AxisIndex],
        value: impl Into<Assign<'a>>,
    ) -> Result<()> {
        Self::check_index_arity(index)?;
        self.view.assign(index, value.into())
    }

    fn check_index_arity(index: &[AxisIndex]) -> Result<()> {
        if index.len() == 2 {
            Ok(())
        } else {
            Err(Error::IndexArity {
                handle: "matrix",
                expected: 2,
                got: index.len(),
            })
        }
    }

    fn ensure_owner(&self, op: &'static str) -> Result<()> {
        if self.owns_memory {
            Ok(())
        } else {
            Err(Error::NotOwner {
                op,
                what: "matrices",
            })
        }
    }

    fn layout(&self) -> Layout {
        Layout::new(self.nrows(), self.ncols(), self.stride())
    }

    fn set_layout(&mut self, layout: Layout) {
        self.view.set_layout(
            vec![layout.nrows, layout.ncols],
            vec![layout.stride as isize, 1],
        );
    }

    /// Change the shape of an owning matrix. Every view of `self` expires.
    pub fn resize(
        &mut self,
        nrows: usize,
        ncols: usize,
        policy: ResizePolicy,
        stride_policy: StridePolicy,
    ) -> Result<()> {
        self.ensure_owner("resize")?;
        check_dims(nrows, ncols)?;
        let from = self.layout();
        let to = Layout::new(
            nrows,
            ncols,
            choose_stride(ncols, stride_policy, self.row_alignment),
        );
        let ((), generation) = self
            .view
            .storage()
            .restructure(|data| kernels::resize(data, from, to, policy));
        debug!(?from, ?to, ?policy, generation, "resized matrix");
        self.stride_policy = stride_policy;
        self.set_layout(to);
        Ok(())
    }

    /// Transpose an owning matrix in place. Every view of `self` expires.
    pub fn transpose(&mut self) -> Result<()> {
        self.ensure_owner("transpose")?;
        let from = self.layout();
        let to = Layout::new(
            from.ncols,
            from.nrows,
            choose_stride(from.nrows, self.stride_policy, self.row_alignment),
        );
        let ((), generation) = self.view.storage().restructure(|data| {
            *data = kernels::transpose(data, from, Transpose::Ordinary, to.stride);
        });
        debug!(?from, ?to, generation, "transposed matrix");
        self.set_layout(to);
        Ok(())
    }

    /// Exchange the contents of two owning matrices without copying.
    ///
    /// Views of either matrix keep observing the buffer they were created from.
    pub fn swap(&mut self, other: &mut Matrix) -> Result<()> {
        self.ensure_owner("swap")?;
        other.ensure_owner("swap")?;
        std::mem::swap(self, other);
        debug!(lhs = ?self.size(), rhs = ?other.size(), "swapped matrices");
        Ok(())
    }

    /// Remove row `row` of an owning matrix without reallocating.
    ///
    /// The number of columns is kept, so removing the last row leaves a `0 x ncols`
    /// matrix. Every view of `self` expires.
    pub fn remove(&mut self, row: usize) -> Result<()> {
        self.ensure_owner("remove")?;
        let from = self.layout();
        check_index(row, 0, from.nrows)?;
        let ((), generation) = self
            .view
            .storage()
            .restructure(|data| kernels::remove_row(data, from.stride, row));
        debug!(row, generation, "removed matrix row");
        self.set_layout(Layout::new(from.nrows - 1, from.ncols, from.stride));
        Ok(())
    }

    /// Return a new owning matrix with a copy of the elements.
    ///
    /// The copy uses the stride policy of `self`. A view with zero rows or zero columns
    /// becomes a `0 x 0` owner.
    pub fn to_owned(&self) -> Result<Self> {
        let from = self.layout();
        if from.nrows == 0 || from.ncols == 0 {
            // Fail on expired storage like the copying path does.
            self.view.storage().read(|_| ())?;
            return Ok(Self::owned(
                Vec::new(),
                0,
                0,
                0,
                self.stride_policy,
                self.row_alignment,
            ));
        }
        let stride = choose_stride(from.ncols, self.stride_policy, self.row_alignment);
        let offset = self.view.offset();
        let data = self.view.storage().read(|data| {
            kernels::transpose(&data[offset..], from, Transpose::None, stride)
        })?;
        Ok(Self::owned(
            data,
            from.nrows,
            from.ncols,
            stride,
            self.stride_policy,
            self.row_alignment,
        ))
    }

    /// Return whether `other` has the same shape and no element differs by more than
    /// `tolerance`. Padding is ignored.
    pub fn equal(&self, other: &Matrix, tolerance: f32) -> Result<bool> {
        if self.size() != other.size() {
            return Ok(false);
        }
        Ok(kernels::approx_equal(
            &self.to_vec()?,
            &other.to_vec()?,
            tolerance,
        ))
    }

    /// [`Matrix::equal`] with the default tolerance.
    pub fn equal_default(&self, other: &Matrix) -> Result<bool> {
        self.equal(other, Config::default().tolerance)
    }

    /// Write dense row-major `values` of shape `nrows x ncols` into `self`.
    fn write_rows(&mut self, values: &[f32]) -> Result<()> {
        let Layout {
            nrows,
            ncols,
            stride,
        } = self.layout();
        debug_assert_eq!(values.len(), nrows * ncols);
        let offset = self.view.offset();
        self.view.storage().write(|data| {
            for r in 0..nrows {
                let start = offset + r * stride;
                kernels::copy(
                    &mut data[start..start + ncols],
                    &values[r * ncols..(r + 1) * ncols],
                );
            }
        })
    }

    /// Copy a two-dimensional `src` of the same shape into `self`.
    pub fn copy_from<A>(&mut self, src: &A) -> Result<()>
    where
        A: ArrayLike + ?Sized,
    {
        let shape = src.shape();
        let expected = [self.nrows(), self.ncols()];
        if shape.as_slice() != expected {
            return Err(Error::shape_mismatch(&expected, &shape));
        }
        let values = dense_values(src, &shape)?;
        self.write_rows(&values)
    }

    /// Copy `src`, or its transpose, into `self`.
    ///
    /// Returns an error if the (possibly transposed) shape of `src` differs from `self`.
    pub fn copy_from_mat(&mut self, src: &Matrix, trans: Transpose) -> Result<()> {
        let (nrows, ncols) = src.size();
        let effective = trans.forward([nrows, ncols], [ncols, nrows]);
        let expected = [self.nrows(), self.ncols()];
        if effective != expected {
            return Err(Error::shape_mismatch(&expected, &effective));
        }
        let values = src.to_vec()?;
        let values = match trans {
            Transpose::None => values,
            Transpose::Ordinary => kernels::transpose(
                &values,
                Layout::new(nrows, ncols, ncols),
                Transpose::Ordinary,
                nrows,
            ),
        };
        self.write_rows(&values)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::empty()
    }
}

impl ArrayLike for Matrix {
    fn shape(&self) -> Vec<usize> {
        vec![self.nrows(), self.ncols()]
    }

    fn dtype(&self) -> DType {
        DType::F32
    }

    fn buffer_descriptor(&self) -> Result<Option<BufferView>> {
        self.to_array_view().map(Some)
    }

    fn to_f32_vec(&self) -> Result<Vec<f32>> {
        self.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;
    use crate::ErrorKind;

    fn two_by_three() -> Matrix {
        Matrix::from_rows(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap()
    }

    #[test]
    fn test_transpose_enum() {
        assert!(!Transpose::None.is_transpose());
        assert!(Transpose::Ordinary.is_transpose());
        assert_eq!(Transpose::None.forward(1, 2), 1);
        assert_eq!(Transpose::Ordinary.forward(1, 2), 2);
    }

    #[test]
    fn test_construction() {
        let m = Matrix::new(3, 5).unwrap();
        assert_eq!(m.size(), (3, 5));
        assert_eq!(m.stride(), 8);
        assert!(m.owns_memory());
        assert!(!m.is_aliased());

        let m = Matrix::zeros(2, 2).unwrap();
        assert_eq!(m.to_vec().unwrap(), vec![0.0; 4]);

        assert!(Matrix::empty().is_empty());
        assert!(Matrix::new(0, 0).unwrap().is_empty());
    }

    #[rstest]
    #[case(3, 0)]
    #[case(0, 3)]
    fn test_mixed_zero_dims(#[case] nrows: usize, #[case] ncols: usize) {
        let err = Matrix::new(nrows, ncols).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueConstraint);
    }

    #[rstest]
    fn test_stride_policy(
        #[values(1, 3, 4, 5, 9)] ncols: usize,
        #[values(1, 2, 4, 8)] align: usize,
    ) {
        let config = Config::new().with_row_alignment(NonZeroUsize::new(align).unwrap());

        let m = Matrix::with_config(2, ncols, StridePolicy::Default, &config).unwrap();
        assert_eq!(m.stride() % align, 0);
        assert!(m.stride() >= ncols);
        assert!(m.stride() < ncols + align);

        let m = Matrix::with_config(2, ncols, StridePolicy::EqualNumCols, &config).unwrap();
        assert_eq!(m.stride(), ncols);
    }

    #[test]
    fn test_from_vec() {
        let m = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2).unwrap();
        assert_eq!(m.stride(), 2);
        assert_eq!(m.get(2, 1).unwrap(), 6.0);

        let err = Matrix::from_vec(vec![1.0; 5], 3, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueConstraint);
    }

    #[test]
    fn test_from_rows_rank() {
        let err = Matrix::from_rows(&[1.0f32, 2.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueConstraint);
    }

    #[test]
    fn test_new_view() {
        let m = Matrix::from_rows(&[
            [1.0f32, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
        ])
        .unwrap();

        let mut v = Matrix::new_view(&m, 1, Some(2), 1, Some(2)).unwrap();
        assert_eq!(v.size(), (2, 2));
        assert_eq!(v.stride(), m.stride());
        assert!(!v.owns_memory());
        assert!(v.is_aliased());
        assert_eq!(v.to_vec().unwrap(), vec![6.0, 7.0, 10.0, 11.0]);

        v.set(0, 0, -6.0).unwrap();
        assert_eq!(m.get(1, 1).unwrap(), -6.0);

        let all = Matrix::new_view(&m, 0, None, 0, None).unwrap();
        assert_eq!(all.size(), m.size());

        let err = Matrix::new_view(&m, 4, None, 0, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(err.to_string(), "row_start=4 should be in the range [0, 3]");

        let err = Matrix::new_view(&m, 0, None, 1, Some(4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);

        let err = Matrix::new_view(&vec![1.0f32; 3], 0, None, 0, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueConstraint);
    }

    #[test]
    fn test_new_view_of_foreign_source() {
        let rows = vec![vec![1.0f64, 2.0], vec![3.0, 4.0]];
        let m = Matrix::new_view(&rows, 0, None, 1, None).unwrap();
        assert!(!m.owns_memory());
        assert!(!m.is_aliased());
        assert_eq!(m.to_vec().unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_get_item() {
        let m = two_by_three();

        let x = m
            .get_item(&[AxisIndex::from(1), AxisIndex::from(-1)])
            .unwrap()
            .into_scalar()
            .unwrap();
        assert_eq!(x, 6.0);

        let row = m
            .get_item(&[AxisIndex::from(0), AxisIndex::from(..)])
            .unwrap()
            .into_vector()
            .unwrap();
        assert!(row.is_aliased());
        assert_eq!(row.to_vec().unwrap(), vec![1.0, 2.0, 3.0]);

        let col = m
            .get_item(&[AxisIndex::from(..), AxisIndex::from(1)])
            .unwrap()
            .into_vector()
            .unwrap();
        assert!(!col.is_aliased());
        assert_eq!(col.to_vec().unwrap(), vec![2.0, 5.0]);

        let block = m
            .get_item(&[AxisIndex::from(..), AxisIndex::from(1..)])
            .unwrap()
            .into_matrix()
            .unwrap();
        assert!(block.is_aliased());
        assert_eq!(block.to_vec().unwrap(), vec![2.0, 3.0, 5.0, 6.0]);

        let reversed = m
            .get_item(&[Slice::full().step_by(-1).into(), AxisIndex::from(..)])
            .unwrap()
            .into_matrix()
            .unwrap();
        assert!(!reversed.is_aliased());
        assert_eq!(reversed.to_vec().unwrap(), vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);

        let err = m.get_item(&[AxisIndex::from(0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        let err = m
            .get_item(&[AxisIndex::from(2), AxisIndex::from(0)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn test_single_row_column_aliases() {
        let m = Matrix::from_rows(&[[1.0f32, 2.0, 3.0]]).unwrap();
        let col = m
            .get_item(&[AxisIndex::from(..), AxisIndex::from(2)])
            .unwrap()
            .into_vector()
            .unwrap();
        assert!(col.is_aliased());
        assert_eq!(col.to_vec().unwrap(), vec![3.0]);
    }

    #[test]
    fn test_set_item_writes_through() {
        let mut m = two_by_three();
        m.set_item(&[AxisIndex::from(..), Slice::full().step_by(2).into()], 0.0)
            .unwrap();
        assert_eq!(m.to_vec().unwrap(), vec![0.0, 2.0, 0.0, 0.0, 5.0, 0.0]);

        let row = [7.0f32, 8.0, 9.0];
        m.set_item(&[AxisIndex::from(..), AxisIndex::from(..)], &row)
            .unwrap();
        assert_eq!(m.to_vec().unwrap(), vec![7.0, 8.0, 9.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_row() {
        let m = two_by_three();
        let mut r = m.row(1).unwrap();
        assert!(!r.owns_memory());
        r.set(0, 40.0).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), 40.0);
        assert_eq!(m.row(2).unwrap_err().kind(), ErrorKind::Bounds);
    }

    #[test]
    fn test_resize() {
        let mut m = two_by_three();
        m.resize(3, 2, ResizePolicy::CopyData, StridePolicy::Default)
            .unwrap();
        assert_eq!(m.size(), (3, 2));
        assert_eq!(m.stride(), 4);
        assert_eq!(m.to_vec().unwrap(), vec![1.0, 2.0, 4.0, 5.0, 0.0, 0.0]);

        m.resize(2, 5, ResizePolicy::Zeroed, StridePolicy::EqualNumCols)
            .unwrap();
        assert_eq!(m.stride(), 5);
        assert_eq!(m.to_vec().unwrap(), vec![0.0; 10]);

        let err = m
            .resize(2, 0, ResizePolicy::Zeroed, StridePolicy::Default)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueConstraint);
        assert_eq!(m.size(), (2, 5));
    }

    #[test]
    fn test_transpose() {
        let mut m = two_by_three();
        let view = m.range(0, None, 0, None).unwrap();
        m.transpose().unwrap();
        assert_eq!(m.size(), (3, 2));
        assert_eq!(m.stride(), 4);
        assert_eq!(m.to_vec().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(view.get(0, 0).unwrap_err().kind(), ErrorKind::Expired);
    }

    #[test]
    fn test_ownership_gating() {
        let owner = two_by_three();
        let mut view = owner.range(0, Some(1), 0, None).unwrap();

        let err = view.transpose().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OwnershipViolation);
        assert_eq!(
            err.to_string(),
            "transpose cannot be called on matrices that do not own their data"
        );
        assert_eq!(
            view.resize(4, 4, ResizePolicy::Zeroed, StridePolicy::Default)
                .unwrap_err()
                .kind(),
            ErrorKind::OwnershipViolation
        );
        assert_eq!(
            view.remove(0).unwrap_err().kind(),
            ErrorKind::OwnershipViolation
        );
        let mut other = Matrix::zeros(1, 1).unwrap();
        assert_eq!(
            view.swap(&mut other).unwrap_err().kind(),
            ErrorKind::OwnershipViolation
        );

        assert_eq!(view.size(), (1, 3));
        assert_eq!(
            owner.to_vec().unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_swap() {
        let mut a = two_by_three();
        let mut b = Matrix::zeros(1, 1).unwrap();
        let view_of_a = a.range(0, None, 0, None).unwrap();
        a.swap(&mut b).unwrap();
        assert_eq!(a.size(), (1, 1));
        assert_eq!(b.size(), (2, 3));
        assert!(view_of_a.equal(&b, 0.0).unwrap());
    }

    #[test]
    fn test_remove() {
        let mut m = two_by_three();
        m.remove(0).unwrap();
        assert_eq!(m.size(), (1, 3));
        assert_eq!(m.to_vec().unwrap(), vec![4.0, 5.0, 6.0]);
        assert_eq!(m.remove(1).unwrap_err().kind(), ErrorKind::Bounds);
        m.remove(0).unwrap();
        assert_eq!(m.size(), (0, 3));
        assert!(m.is_empty());
    }

    #[test]
    fn test_to_owned_and_equal() {
        let m = two_by_three();
        let view = m.range(0, None, 1, Some(2)).unwrap();
        let mut copy = view.to_owned().unwrap();
        assert!(copy.owns_memory());
        assert_eq!(copy.stride(), 4);
        copy.set(0, 0, 100.0).unwrap();
        assert_eq!(m.get(0, 1).unwrap(), 2.0);

        // Padding does not take part in comparisons.
        let packed = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_ne!(packed.stride(), m.stride());
        assert!(packed.equal_default(&m).unwrap());

        let mut near = m.to_owned().unwrap();
        near.set(1, 2, 6.001).unwrap();
        assert!(near.equal(&m, 1e-2).unwrap());
        assert!(!near.equal_default(&m).unwrap());
        assert!(!m.equal(&Matrix::zeros(3, 2).unwrap(), 1e9).unwrap());
    }

    #[test]
    fn test_copy_from_mat() {
        let m = two_by_three();
        let mut t = Matrix::zeros(3, 2).unwrap();
        t.copy_from_mat(&m, Transpose::Ordinary).unwrap();
        assert_eq!(t.to_vec().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        let err = t.copy_from_mat(&m, Transpose::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        let mut same = Matrix::zeros(2, 3).unwrap();
        same.copy_from_mat(&m, Transpose::None).unwrap();
        assert!(same.equal_default(&m).unwrap());

        let mut view = same.range(0, None, 1, Some(2)).unwrap();
        view.copy_from(&[[0.5f32, 0.25], [0.125, 0.0625]]).unwrap();
        assert_abs_diff_eq!(same.get(1, 2).unwrap(), 0.0625);
        assert_eq!(same.get(1, 0).unwrap(), 4.0);
    }

    #[test]
    fn test_copy_from_miscounted_source() {
        /// Reports a `2 x 3` shape but provides four elements.
        struct Miscounted;

        impl ArrayLike for Miscounted {
            fn shape(&self) -> Vec<usize> {
                vec![2, 3]
            }

            fn dtype(&self) -> DType {
                DType::I32
            }

            fn to_f32_vec(&self) -> Result<Vec<f32>> {
                Ok(vec![0.0; 4])
            }
        }

        let mut m = two_by_three();
        let err = m.copy_from(&Miscounted).unwrap_err();
        assert!(matches!(err, Error::ElementCount { len: 4, .. }));
        assert_eq!(m.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[rstest]
    #[case(isize::MAX, vec![1.0, 2.0, 3.0])]
    #[case(isize::MIN, vec![4.0, 5.0, 6.0])]
    fn test_extreme_row_steps(#[case] step: isize, #[case] expected: Vec<f32>) {
        let m = two_by_three();
        let rows = m
            .get_item(&[Slice::full().step_by(step).into(), AxisIndex::from(..)])
            .unwrap()
            .into_matrix()
            .unwrap();
        assert_eq!(rows.size(), (1, 3));
        assert!(rows.is_aliased());
        assert_eq!(rows.to_vec().unwrap(), expected);
    }

    #[test]
    fn test_empty_views_copy_to_empty_owners() {
        let m = two_by_three();
        let no_cols = m.range(0, None, 3, None).unwrap();
        assert_eq!(no_cols.size(), (2, 0));

        let mut copy = no_cols.to_owned().unwrap();
        assert_eq!(copy.size(), (0, 0));
        assert!(copy.owns_memory());
        copy.resize(1, 1, ResizePolicy::Zeroed, StridePolicy::Default)
            .unwrap();

        let no_rows = m
            .get_item(&[AxisIndex::from(0..0), AxisIndex::from(..)])
            .unwrap()
            .into_matrix()
            .unwrap();
        assert_eq!(no_rows.to_owned().unwrap().size(), (0, 0));
    }

    #[test]
    fn test_handles_over_one_descriptor_are_aliased() {
        let shared = BufferView::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let mut a = Matrix::from_array_view(shared.clone()).unwrap();
        let b = Matrix::from_array_view(shared).unwrap();
        assert!(a.is_aliased());
        assert!(b.is_aliased());

        a.set(1, 1, -4.0).unwrap();
        assert_eq!(b.get(1, 1).unwrap(), -4.0);
    }
}
