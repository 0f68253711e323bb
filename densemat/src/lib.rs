/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Owned and view-based dense `f32` vectors and matrices.
//!
//! A [`Vector`] or [`Matrix`] either owns a resizable buffer or views a buffer owned by
//! another handle. Slicing follows numpy: a slice aliases its parent whenever the
//! selected elements can be described with a unit innermost stride, and silently
//! becomes a private copy otherwise. Use `is_aliased()` to tell the two apart.
//!
//! Views never keep memory alive. Once the owner is dropped, resized, transposed or
//! shrunk, access through an earlier view fails with [`ErrorKind::Expired`].
//!
//! ```
//! use densemat::{AxisIndex, Vector};
//!
//! let v = Vector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
//! let mut middle = v.get_item(&[AxisIndex::from(1..4)])?.into_vector()?;
//! middle.set(0, 99.0)?;
//! assert_eq!(v.to_vec()?, vec![1.0, 99.0, 3.0, 4.0, 5.0]);
//! # Ok::<(), densemat::Error>(())
//! ```

pub mod array_like;
pub mod buffer;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod matrix;
pub mod slice;
pub mod vector;

mod kernels;
mod storage;

pub use array_like::{ArrayLike, DType, Element};
pub use buffer::BufferView;
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use index::{Assign, IndexResult};
pub use matrix::{Matrix, ResizePolicy, StridePolicy, Transpose};
pub use slice::{AxisIndex, Slice};
pub use vector::Vector;
