/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! The capability interface for array-like inputs.

use std::fmt;

use crate::{
    buffer::BufferView,
    error::{Error, Result},
};

/// Element type reported by an [`ArrayLike`] source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    I32,
    I64,
    U8,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::F32 | Self::I32 => 4,
            Self::F64 | Self::I64 => 8,
            Self::U8 => 1,
        }
    }

    /// The numpy-style name of the type.
    pub fn name(self) -> &'static str {
        match self {
            Self::F32 => "float32",
            Self::F64 => "float64",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::U8 => "uint8",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar type that can be converted into the native `f32` representation.
pub trait Element: Copy {
    const DTYPE: DType;

    fn to_f32(self) -> f32;
}

macro_rules! element {
    ($T:ty, $dtype:ident) => {
        impl Element for $T {
            const DTYPE: DType = DType::$dtype;

            #[inline(always)]
            fn to_f32(self) -> f32 {
                self as f32
            }
        }
    };
}

element!(f32, F32);
element!(f64, F64);
element!(i32, I32);
element!(i64, I64);
element!(u8, U8);

/// Anything that can be interpreted as a dense array.
///
/// Implementations that live in crate-managed storage return a descriptor from
/// [`ArrayLike::buffer_descriptor`] so that handles can alias them. Every other source
/// is converted through [`ArrayLike::to_f32_vec`], which always copies.
pub trait ArrayLike {
    /// Extent of every dimension.
    fn shape(&self) -> Vec<usize>;

    /// Element type of the source.
    fn dtype(&self) -> DType;

    /// Return a zero-copy descriptor over the source, if it has one.
    fn buffer_descriptor(&self) -> Result<Option<BufferView>> {
        Ok(None)
    }

    /// Return the elements in row-major logical order, converted to `f32`.
    fn to_f32_vec(&self) -> Result<Vec<f32>>;
}

/// Convert `src`, checking that it provides one element per position of `shape`.
pub(crate) fn dense_values<A>(src: &A, shape: &[usize]) -> Result<Vec<f32>>
where
    A: ArrayLike + ?Sized,
{
    let values = src.to_f32_vec()?;
    if values.len() != shape.iter().product::<usize>() {
        return Err(Error::ElementCount {
            shape: shape.to_vec(),
            len: values.len(),
        });
    }
    Ok(values)
}

// Container impls are spelled out per element type so that `Vec<T>` and `Vec<Vec<T>>`
// (and the array equivalents) do not overlap.
macro_rules! array_like {
    ($($T:ty),* $(,)?) => {
        $(
            impl ArrayLike for [$T] {
                fn shape(&self) -> Vec<usize> {
                    vec![self.len()]
                }

                fn dtype(&self) -> DType {
                    <$T as Element>::DTYPE
                }

                fn to_f32_vec(&self) -> Result<Vec<f32>> {
                    Ok(self.iter().map(|x| x.to_f32()).collect())
                }
            }

            impl ArrayLike for Vec<$T> {
                fn shape(&self) -> Vec<usize> {
                    vec![self.len()]
                }

                fn dtype(&self) -> DType {
                    <$T as Element>::DTYPE
                }

                fn to_f32_vec(&self) -> Result<Vec<f32>> {
                    self.as_slice().to_f32_vec()
                }
            }

            impl<const N: usize> ArrayLike for [$T; N] {
                fn shape(&self) -> Vec<usize> {
                    vec![N]
                }

                fn dtype(&self) -> DType {
                    <$T as Element>::DTYPE
                }

                fn to_f32_vec(&self) -> Result<Vec<f32>> {
                    self.as_slice().to_f32_vec()
                }
            }

            impl<const C: usize, const R: usize> ArrayLike for [[$T; C]; R] {
                fn shape(&self) -> Vec<usize> {
                    vec![R, C]
                }

                fn dtype(&self) -> DType {
                    <$T as Element>::DTYPE
                }

                fn to_f32_vec(&self) -> Result<Vec<f32>> {
                    Ok(self.iter().flatten().map(|x| x.to_f32()).collect())
                }
            }

            /// Nested rows. All rows must have the same length.
            impl ArrayLike for Vec<Vec<$T>> {
                fn shape(&self) -> Vec<usize> {
                    vec![self.len(), self.first().map_or(0, Vec::len)]
                }

                fn dtype(&self) -> DType {
                    <$T as Element>::DTYPE
                }

                fn to_f32_vec(&self) -> Result<Vec<f32>> {
                    flatten_rows(self)
                }
            }
        )*
    };
}

array_like!(f32, f64, i32, i64, u8);

fn flatten_rows<T: Element>(rows: &[Vec<T>]) -> Result<Vec<f32>> {
    let expected = rows.first().map_or(0, Vec::len);
    let mut out = Vec::with_capacity(rows.len() * expected);
    for (row, values) in rows.iter().enumerate() {
        if values.len() != expected {
            return Err(Error::Ragged {
                row,
                len: values.len(),
                expected,
            });
        }
        out.extend(values.iter().map(|x| x.to_f32()));
    }
    Ok(out)
}

impl<A: ArrayLike + ?Sized> ArrayLike for &A {
    fn shape(&self) -> Vec<usize> {
        (**self).shape()
    }

    fn dtype(&self) -> DType {
        (**self).dtype()
    }

    fn buffer_descriptor(&self) -> Result<Option<BufferView>> {
        (**self).buffer_descriptor()
    }

    fn to_f32_vec(&self) -> Result<Vec<f32>> {
        (**self).to_f32_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype() {
        assert_eq!(DType::F32.size(), 4);
        assert_eq!(DType::F64.size(), 8);
        assert_eq!(DType::U8.size(), 1);
        assert_eq!(DType::I64.to_string(), "int64");
    }

    #[test]
    fn test_slices_and_vectors() {
        let v = vec![1.0f64, 2.5, -3.0];
        assert_eq!(v.shape(), vec![3]);
        assert_eq!(v.dtype(), DType::F64);
        assert_eq!(v.to_f32_vec().unwrap(), vec![1.0, 2.5, -3.0]);
        assert!(v.buffer_descriptor().unwrap().is_none());

        let a = [1u8, 2, 3, 4];
        assert_eq!(a.shape(), vec![4]);
        assert_eq!(a.dtype(), DType::U8);
        assert_eq!(a.to_f32_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);

        let s: &[i32] = &[7, -7];
        assert_eq!(s.shape(), vec![2]);
        assert_eq!(s.to_f32_vec().unwrap(), vec![7.0, -7.0]);
    }

    #[test]
    fn test_nested() {
        let m = [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(m.shape(), vec![2, 3]);
        assert_eq!(m.to_f32_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let rows = vec![vec![1i64, 2], vec![3, 4], vec![5, 6]];
        assert_eq!(rows.shape(), vec![3, 2]);
        assert_eq!(rows.dtype(), DType::I64);
        assert_eq!(rows.to_f32_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let empty: Vec<Vec<f32>> = Vec::new();
        assert_eq!(empty.shape(), vec![0, 0]);
        assert!(empty.to_f32_vec().unwrap().is_empty());
    }

    #[test]
    fn test_ragged_rows() {
        let rows = vec![vec![1.0f32, 2.0], vec![3.0]];
        let err = rows.to_f32_vec().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ValueConstraint);
        assert_eq!(err.to_string(), "row 1 has 1 elements but row 0 has 2");
    }
}
