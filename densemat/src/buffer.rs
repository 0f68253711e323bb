/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Strided descriptors over storage blocks.
//!
//! A [`BufferView`] is the equivalent of the numpy array interface: a storage reference,
//! an element offset, a shape and signed strides measured in elements. [`crate::Vector`]
//! and [`crate::Matrix`] are thin wrappers that constrain the layout of a view.
//!
//! ```text
//!   strides = [6, 2], offset = 1, shape = [2, 3]
//!
//!   block: [ a0 a1 a2 a3 a4 a5 | b0 b1 b2 b3 b4 b5 ]
//!               ^     ^     ^       ^     ^     ^
//!               (0,0) (0,1) (0,2)   (1,0) (1,1) (1,2)
//! ```

use tracing::debug;

use crate::{
    array_like::{dense_values, ArrayLike, DType},
    error::{Error, Result},
    index::Assign,
    slice::{normalize_index, AxisIndex, Slice},
    storage::StorageRef,
};

/// A strided, possibly non-contiguous window into a storage block.
#[derive(Debug, Clone)]
pub struct BufferView {
    storage: StorageRef,
    offset: usize,
    shape: Vec<usize>,
    strides: Vec<isize>,
}

/// Row-major strides for a dense array of the given shape.
fn c_strides(shape: &[usize]) -> Vec<isize> {
    let mut strides = vec![0isize; shape.len()];
    let mut acc = 1isize;
    for (stride, &dim) in strides.iter_mut().zip(shape).rev() {
        *stride = acc;
        acc *= dim as isize;
    }
    strides
}

/// Invoke `f` for every multi-index of `shape` in row-major order.
///
/// Nothing is visited if any dimension is zero. A 0-dimensional shape visits the empty
/// index exactly once.
pub(crate) fn for_each_index<F>(shape: &[usize], mut f: F)
where
    F: FnMut(&[usize]),
{
    if shape.contains(&0) {
        return;
    }
    let mut index = vec![0usize; shape.len()];
    loop {
        f(&index);
        let mut axis = shape.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
}

impl BufferView {
    /// Place `data` in a new block and describe it as a dense row-major array.
    ///
    /// Returns an error if the length of `data` does not match the product of `shape`.
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::ElementCount {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }
        Ok(Self::from_parts(
            StorageRef::allocate(data),
            0,
            shape.to_vec(),
            c_strides(shape),
        ))
    }

    pub(crate) fn from_parts(
        storage: StorageRef,
        offset: usize,
        shape: Vec<usize>,
        strides: Vec<isize>,
    ) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            storage,
            offset,
            shape,
            strides,
        }
    }

    pub(crate) fn storage(&self) -> &StorageRef {
        &self.storage
    }

    /// Return a copy of this descriptor holding a weak reference to the block.
    pub(crate) fn borrowed(&self) -> Result<Self> {
        Ok(Self {
            storage: self.storage.borrow()?,
            offset: self.offset,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
        })
    }

    /// Replace the shape and strides, keeping the storage and offset.
    pub(crate) fn set_layout(&mut self, shape: Vec<usize>, strides: Vec<isize>) {
        debug_assert_eq!(shape.len(), strides.len());
        self.shape = shape;
        self.strides = strides;
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent of each dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Distance in elements between consecutive positions along each dimension.
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Position of the first element within the block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total number of logical elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the described memory. Always `f32`.
    pub fn dtype(&self) -> DType {
        DType::F32
    }

    /// Return whether the innermost dimension has stride 1.
    ///
    /// An innermost dimension of extent 0 or 1 counts as contiguous since its stride is
    /// never used.
    pub fn is_contiguous(&self) -> bool {
        match (self.shape.last(), self.strides.last()) {
            (Some(&dim), Some(&stride)) => dim <= 1 || stride == 1,
            _ => true,
        }
    }

    /// Return whether the view describes a dense row-major array.
    pub fn is_c_contiguous(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut expected = 1isize;
        for (&dim, &stride) in self.shape.iter().zip(&self.strides).rev() {
            if dim > 1 && stride != expected {
                return false;
            }
            expected *= dim as isize;
        }
        true
    }

    /// Return whether another live descriptor or handle can reach the memory of this
    /// view, so that writes through one are visible through the other.
    pub fn is_aliased(&self) -> bool {
        self.storage.is_shared()
    }

    /// Return whether both views address the same block.
    pub fn shares_memory_with(&self, other: &BufferView) -> bool {
        self.storage.same_block(&other.storage)
    }

    fn physical(&self, index: &[usize]) -> usize {
        let delta: isize = index
            .iter()
            .zip(&self.strides)
            .map(|(&i, &s)| i as isize * s)
            .sum();
        (self.offset as isize + delta) as usize
    }

    /// Block positions of every logical element, in row-major order.
    fn offsets(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.len());
        for_each_index(&self.shape, |index| out.push(self.physical(index)));
        out
    }

    fn resolve(&self, index: &[isize]) -> Result<usize> {
        if index.len() != self.ndim() {
            return Err(Error::IndexArity {
                handle: "buffer",
                expected: self.ndim(),
                got: index.len(),
            });
        }
        let mut resolved = Vec::with_capacity(index.len());
        for (axis, (&i, &len)) in index.iter().zip(&self.shape).enumerate() {
            resolved.push(normalize_index(i, axis, len)?);
        }
        Ok(self.physical(&resolved))
    }

    /// Read the element at `index`. Negative entries count from the end of their axis.
    pub fn get(&self, index: &[isize]) -> Result<f32> {
        let position = self.resolve(index)?;
        self.storage.read(|data| data[position])
    }

    /// Write the element at `index`. Negative entries count from the end of their axis.
    pub fn set(&self, index: &[isize], value: f32) -> Result<()> {
        let position = self.resolve(index)?;
        self.storage.write(|data| data[position] = value)
    }

    /// Return the logical elements in row-major order.
    pub fn to_vec(&self) -> Result<Vec<f32>> {
        let offsets = self.offsets();
        self.storage
            .read(|data| offsets.iter().map(|&o| data[o]).collect())
    }

    /// Copy the logical elements into a fresh, dense, row-major block.
    pub fn to_contiguous(&self) -> Result<Self> {
        Self::from_vec(self.to_vec()?, &self.shape)
    }

    /// Apply numpy-style indices, returning a view over the same block.
    ///
    /// Integer indices drop their axis. Missing trailing indices select the whole axis.
    pub fn slice(&self, indices: &[AxisIndex]) -> Result<Self> {
        if indices.len() > self.ndim() {
            return Err(Error::TooManyIndices {
                max: self.ndim(),
                got: indices.len(),
            });
        }
        // Fail fast on expired storage.
        self.storage.read(|_| ())?;

        let mut offset = self.offset as isize;
        let mut shape = Vec::with_capacity(self.ndim());
        let mut strides = Vec::with_capacity(self.ndim());
        let full = AxisIndex::Slice(Slice::full());

        for axis in 0..self.ndim() {
            let len = self.shape[axis];
            let stride = self.strides[axis];
            match indices.get(axis).unwrap_or(&full) {
                AxisIndex::Index(i) => {
                    offset += normalize_index(*i, axis, len)? as isize * stride;
                }
                AxisIndex::Slice(s) => {
                    let r = s.resolve(len)?;
                    offset += r.start as isize * stride;
                    shape.push(r.count);
                    // With at most one position selected the step is never taken.
                    let stride = if r.count <= 1 {
                        stride
                    } else {
                        stride
                            .checked_mul(r.step)
                            .ok_or(Error::StepOverflow { step: r.step, axis })?
                    };
                    strides.push(stride);
                }
            }
        }

        Ok(Self {
            storage: self.storage.clone(),
            offset: offset as usize,
            shape,
            strides,
        })
    }

    /// Write `value` into the region selected by `indices`, broadcasting as numpy does.
    pub fn assign(&self, indices: &[AxisIndex], value: Assign<'_>) -> Result<()> {
        self.slice(indices)?.fill_from(value)
    }

    /// Write `value` into every element of this view, broadcasting as numpy does.
    pub fn fill_from(&self, value: Assign<'_>) -> Result<()> {
        // Snapshot the source first. It may share a block with `self`.
        let (src_shape, src) = match value {
            Assign::Scalar(v) => (Vec::new(), vec![v]),
            Assign::Array(a) => {
                let shape = a.shape();
                let values = dense_values(a, &shape)?;
                (shape, values)
            }
        };
        let src_strides = self.broadcast_strides(&src_shape)?;
        let src_offset = |index: &[usize]| -> usize {
            index
                .iter()
                .zip(&src_strides)
                .map(|(&i, &s)| i * s)
                .sum()
        };

        let mut pairs = Vec::with_capacity(self.len());
        for_each_index(&self.shape, |index| {
            pairs.push((self.physical(index), src_offset(index)));
        });
        self.storage.write(|data| {
            for (dst, s) in pairs {
                data[dst] = src[s];
            }
        })
    }

    /// Strides for reading a dense array of `src_shape` broadcast to the shape of `self`.
    fn broadcast_strides(&self, src_shape: &[usize]) -> Result<Vec<usize>> {
        let broadcast_error = || Error::Broadcast {
            from: src_shape.to_vec(),
            into: self.shape.clone(),
        };

        // Leading dimensions beyond the rank of the target must be singletons.
        let extra = src_shape.len().saturating_sub(self.ndim());
        if src_shape[..extra].iter().any(|&d| d != 1) {
            return Err(broadcast_error());
        }
        let src_shape = &src_shape[extra..];
        let dense = c_strides(src_shape);

        let lead = self.ndim() - src_shape.len();
        let mut strides = vec![0usize; self.ndim()];
        for (i, (&dim, &stride)) in src_shape.iter().zip(&dense).enumerate() {
            let target = self.shape[lead + i];
            if dim == target {
                strides[lead + i] = if dim == 1 { 0 } else { stride as usize };
            } else if dim == 1 {
                strides[lead + i] = 0;
            } else {
                return Err(broadcast_error());
            }
        }
        Ok(strides)
    }

    /// Interpret `src` as a view.
    ///
    /// Crate-managed `f32` memory is aliased. Everything else is converted into a fresh
    /// block.
    pub fn from_array_like<A>(src: &A) -> Result<Self>
    where
        A: ArrayLike + ?Sized,
    {
        if src.dtype() == DType::F32 {
            if let Some(view) = src.buffer_descriptor()? {
                return Ok(view);
            }
        }
        let shape = src.shape();
        debug!(
            dtype = %src.dtype(),
            ?shape,
            "source has no aliasable f32 buffer, converting into a new block"
        );
        Self::from_vec(src.to_f32_vec()?, &shape)
    }
}

impl ArrayLike for BufferView {
    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn dtype(&self) -> DType {
        DType::F32
    }

    fn buffer_descriptor(&self) -> Result<Option<BufferView>> {
        self.borrowed().map(Some)
    }

    fn to_f32_vec(&self) -> Result<Vec<f32>> {
        self.to_vec()
    }
}
