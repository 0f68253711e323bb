/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use tracing::debug;

use crate::{
    array_like::{dense_values, ArrayLike, DType},
    buffer::BufferView,
    config::Config,
    error::{check_start, resolve_count, Error, Result},
    index::{Assign, IndexResult},
    kernels::{self, Layout},
    matrix::{Matrix, ResizePolicy},
    slice::{check_index, AxisIndex, Slice},
    storage::StorageRef,
};

/// A dense vector of `f32` that either owns its buffer or views a buffer owned elsewhere.
///
/// Owning vectors can be resized, swapped and shrunk. Every vector can be read and
/// written, including views, whose writes are visible through the buffer they alias.
///
/// A vector obtained by slicing with a non-unit step cannot alias its parent and holds a
/// private copy instead. [`Vector::is_aliased`] tells the two cases apart.
#[derive(Debug)]
pub struct Vector {
    // A one-dimensional view with unit stride.
    view: BufferView,
    owns_memory: bool,
}

impl Vector {
    fn owned(data: Vec<f32>) -> Self {
        let len = data.len();
        Self {
            view: BufferView::from_parts(StorageRef::allocate(data), 0, vec![len], vec![1]),
            owns_memory: true,
        }
    }

    /// Construct an owning vector of length `len`.
    ///
    /// The contents are unspecified. Use [`Vector::zeros`] when they must be zero.
    pub fn new(len: usize) -> Self {
        Self::owned(vec![0.0; len])
    }

    /// Construct an owning vector of `len` zeros.
    pub fn zeros(len: usize) -> Self {
        Self::owned(vec![0.0; len])
    }

    /// Construct an owning vector of length 0.
    pub fn empty() -> Self {
        Self::owned(Vec::new())
    }

    /// Construct an owning vector that takes over `data`.
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self::owned(data)
    }

    /// Construct a non-owning vector over elements `start..start + length` of `src`.
    ///
    /// The result aliases `src` when `src` exposes crate-managed `f32` memory with unit
    /// stride. Otherwise it holds a private copy. Either way it does not own its memory.
    /// An omitted `length` selects everything after `start`.
    ///
    /// Returns an error if `src` is not one-dimensional or the range does not fit.
    pub fn new_view<A>(src: &A, start: usize, length: Option<usize>) -> Result<Self>
    where
        A: ArrayLike + ?Sized,
    {
        let view = BufferView::from_array_like(src)?;
        if view.ndim() != 1 {
            return Err(Error::RankMismatch {
                expected: 1,
                actual: view.ndim(),
            });
        }
        let len = view.shape()[0];
        check_start("start", start, len)?;
        let length = resolve_count("length", length, "start", start, len)?;

        let range = Slice::new(Some(start as isize), Some((start + length) as isize), 1);
        Self::from_array_view(view.slice(&[range.into()])?)
    }

    /// Construct a non-owning vector from a one-dimensional buffer view.
    ///
    /// A view without unit stride is copied into a private buffer.
    pub fn from_array_view(view: BufferView) -> Result<Self> {
        if view.ndim() != 1 {
            return Err(Error::RankMismatch {
                expected: 1,
                actual: view.ndim(),
            });
        }
        let mut view = if view.is_contiguous() {
            view
        } else {
            debug!(
                stride = view.strides()[0],
                len = view.len(),
                "vector source is not contiguous, copying"
            );
            view.to_contiguous()?
        };
        let len = view.len();
        view.set_layout(vec![len], vec![1]);
        Ok(Self {
            view,
            owns_memory: false,
        })
    }

    /// Return a non-owning vector over `start..start + length` that aliases `self`.
    pub fn range(&self, start: usize, length: Option<usize>) -> Result<Self> {
        Self::new_view(self, start, length)
    }

    /// Return a descriptor that shares memory with `self`.
    ///
    /// The descriptor never keeps the memory alive on its own.
    pub fn to_array_view(&self) -> Result<BufferView> {
        self.view.borrowed()
    }

    pub fn len(&self) -> usize {
        self.view.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return whether this vector is responsible for its memory.
    pub fn owns_memory(&self) -> bool {
        self.owns_memory
    }

    /// Return whether writes through this vector reach memory owned by another handle.
    pub fn is_aliased(&self) -> bool {
        self.view.is_aliased()
    }

    /// Read element `index`. Negative values count from the end.
    pub fn get(&self, index: isize) -> Result<f32> {
        self.view.get(&[index])
    }

    /// Write element `index`. Negative values count from the end.
    pub fn set(&mut self, index: isize, value: f32) -> Result<()> {
        self.view.set(&[index], value)
    }

    /// Return a copy of the elements.
    pub fn to_vec(&self) -> Result<Vec<f32>> {
        self.view.to_vec()
    }

    fn check_index_arity(index: &[AxisIndex]) -> Result<()> {
        if index.len() == 1 {
            Ok(())
        } else {
            Err(Error::IndexArity {
                handle: "vector",
                expected: 1,
                got: index.len(),
            })
        }
    }

    /// Index with numpy semantics.
    ///
    /// An integer yields a scalar. A slice yields a non-owning vector that aliases `self`
    /// when the step is 1 and holds a private copy otherwise.
    pub fn get_item(&self, index: &[AxisIndex]) -> Result<IndexResult> {
        Self::check_index_arity(index)?;
        match index[0] {
            AxisIndex::Index(i) => self.get(i).map(IndexResult::Scalar),
            AxisIndex::Slice(s) => {
                let view = self.to_array_view()?.slice(&[s.into()])?;
                Self::from_array_view(view).map(IndexResult::Vector)
            }
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

    fn ensure_owner(&self, op: &'static str) -> Result<()> {
        if self.owns_memory {
            Ok(())
        } else {
            Err(Error::NotOwner {
                op,
                what: "vectors",
            })
        }
    }

    /// Change the length of an owning vector. Every view of `self` expires.
    pub fn resize(&mut self, len: usize, policy: ResizePolicy) -> Result<()> {
        self.ensure_owner("resize")?;
        let from = Layout::row(self.len());
        let ((), generation) = self
            .view
            .storage()
            .restructure(|data| kernels::resize(data, from, Layout::row(len), policy));
        debug!(from = from.ncols, to = len, ?policy, generation, "resized vector");
        self.view.set_layout(vec![len], vec![1]);
        Ok(())
    }

    /// Exchange the contents of two owning vectors without copying.
    ///
    /// Views of either vector keep observing the buffer they were created from.
    pub fn swap(&mut self, other: &mut Vector) -> Result<()> {
        self.ensure_owner("swap")?;
        other.ensure_owner("swap")?;
        std::mem::swap(&mut self.view, &mut other.view);
        debug!(lhs = self.len(), rhs = other.len(), "swapped vectors");
        Ok(())
    }

    /// Remove element `index` of an owning vector without reallocating.
    ///
    /// Every view of `self` expires.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.ensure_owner("remove")?;
        let len = self.len();
        check_index(index, 0, len)?;
        let ((), generation) = self
            .view
            .storage()
            .restructure(|data| kernels::remove_element(data, index));
        debug!(index, generation, "removed vector element");
        self.view.set_layout(vec![len - 1], vec![1]);
        Ok(())
    }

    /// Return a new owning vector with a copy of the elements.
    pub fn to_owned(&self) -> Result<Self> {
        self.to_vec().map(Self::owned)
    }

    /// Return whether `other` has the same length and no element differs by more than
    /// `tolerance`.
    pub fn equal(&self, other: &Vector, tolerance: f32) -> Result<bool> {
        if self.len() != other.len() {
            return Ok(false);
        }
        Ok(kernels::approx_equal(
            &self.to_vec()?,
            &other.to_vec()?,
            tolerance,
        ))
    }

    /// [`Vector::equal`] with the default tolerance.
    pub fn equal_default(&self, other: &Vector) -> Result<bool> {
        self.equal(other, Config::default().tolerance)
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if self.len() == len {
            Ok(())
        } else {
            Err(Error::shape_mismatch(&[self.len()], &[len]))
        }
    }

    fn write_all(&mut self, values: &[f32]) -> Result<()> {
        let offset = self.view.offset();
        self.view
            .storage()
            .write(|data| kernels::copy(&mut data[offset..offset + values.len()], values))
    }

    /// Copy the elements of a one-dimensional `src` of the same length into `self`.
    pub fn copy_from<A>(&mut self, src: &A) -> Result<()>
    where
        A: ArrayLike + ?Sized,
    {
        let shape = src.shape();
        if shape.as_slice() != [self.len()] {
            return Err(Error::shape_mismatch(&[self.len()], &shape));
        }
        let values = dense_values(src, &shape)?;
        self.write_all(&values)
    }

    /// Copy the rows of `m` one after another into `self`.
    pub fn copy_rows_from_mat(&mut self, m: &Matrix) -> Result<()> {
        self.check_len(m.nrows() * m.ncols())?;
        let values = m.to_vec()?;
        self.write_all(&values)
    }

    /// Copy the columns of `m` one after another into `self`.
    pub fn copy_cols_from_mat(&mut self, m: &Matrix) -> Result<()> {
        self.check_len(m.nrows() * m.ncols())?;
        let (nrows, ncols) = m.size();
        let rows = m.to_vec()?;
        let values: Vec<f32> = (0..ncols)
            .flat_map(|c| (0..nrows).map(move |r| (r, c)))
            .map(|(r, c)| rows[r * ncols + c])
            .collect();
        self.write_all(&values)
    }

    /// Copy row `row` of `m` into `self`.
    pub fn copy_row_from_mat(&mut self, m: &Matrix, row: usize) -> Result<()> {
        let row = check_index(row, 0, m.nrows())?;
        self.check_len(m.ncols())?;
        let values = m.row(row)?.to_vec()?;
        self.write_all(&values)
    }

    /// Copy column `col` of `m` into `self`.
    pub fn copy_col_from_mat(&mut self, m: &Matrix, col: usize) -> Result<()> {
        let col = check_index(col, 1, m.ncols())?;
        self.check_len(m.nrows())?;
        let values = m
            .get_item(&[AxisIndex::from(..), AxisIndex::from(col as isize)])?
            .into_vector()?
            .to_vec()?;
        self.write_all(&values)
    }

    /// Copy the main diagonal of `m` into `self`.
    pub fn copy_diag_from_mat(&mut self, m: &Matrix) -> Result<()> {
        let n = m.nrows().min(m.ncols());
        self.check_len(n)?;
        let values = (0..n)
            .map(|i| m.get(i as isize, i as isize))
            .collect::<Result<Vec<_>>>()?;
        self.write_all(&values)
    }
}

impl Default for Vector {
    fn default() -> Self {
        Self::empty()
    }
}

impl ArrayLike for Vector {
    fn shape(&self) -> Vec<usize> {
        vec![self.len()]
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
