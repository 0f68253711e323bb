/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Values passed to and returned from the indexing operations.

use crate::{
    array_like::ArrayLike,
    error::{Error, Result},
    matrix::Matrix,
    vector::Vector,
};

/// The result of indexing a [`Vector`] or [`Matrix`].
///
/// The variant depends on how many of the indices were integers: every integer index
/// drops one dimension.
#[derive(Debug)]
pub enum IndexResult {
    Scalar(f32),
    Vector(Vector),
    Matrix(Matrix),
}

impl IndexResult {
    /// The name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Vector(_) => "vector",
            Self::Matrix(_) => "matrix",
        }
    }

    fn unexpected(&self, expected: &'static str) -> Error {
        Error::UnexpectedResult {
            expected,
            got: self.kind_name(),
        }
    }

    /// Return the scalar, or a `TypeMismatch` error for any other variant.
    pub fn into_scalar(self) -> Result<f32> {
        match self {
            Self::Scalar(v) => Ok(v),
            other => Err(other.unexpected("scalar")),
        }
    }

    /// Return the vector, or a `TypeMismatch` error for any other variant.
    pub fn into_vector(self) -> Result<Vector> {
        match self {
            Self::Vector(v) => Ok(v),
            other => Err(other.unexpected("vector")),
        }
    }

    /// Return the matrix, or a `TypeMismatch` error for any other variant.
    pub fn into_matrix(self) -> Result<Matrix> {
        match self {
            Self::Matrix(m) => Ok(m),
            other => Err(other.unexpected("matrix")),
        }
    }
}

/// The right-hand side of an indexed assignment.
///
/// Arrays are broadcast against the selected region with numpy rules.
#[derive(Clone, Copy)]
pub enum Assign<'a> {
    Scalar(f32),
    Array(&'a dyn ArrayLike),
}

impl std::fmt::Debug for Assign<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Self::Array(a) => f
                .debug_struct("Array")
                .field("shape", &a.shape())
                .field("dtype", &a.dtype())
                .finish(),
        }
    }
}

impl From<f32> for Assign<'_> {
    fn from(value: f32) -> Self {
        Self::Scalar(value)
    }
}

impl<'a, A: ArrayLike> From<&'a A> for Assign<'a> {
    fn from(value: &'a A) -> Self {
        Self::Array(value)
    }
}
