/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Configuration for handle construction and comparison.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of `f32` elements in a 16-byte row alignment.
pub const DEFAULT_ROW_ALIGNMENT: NonZeroUsize = match NonZeroUsize::new(4) {
    Some(v) => v,
    None => unreachable!(),
};

/// Default tolerance used by `equal_default`.
pub const DEFAULT_TOLERANCE: f32 = 1e-16;

/// Tunables shared by vectors and matrices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rows of matrices allocated with `StridePolicy::Default` are padded so that the row
    /// stride is a multiple of this many elements.
    pub row_alignment: NonZeroUsize,

    /// Maximum absolute elementwise difference for two handles to compare equal.
    pub tolerance: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            row_alignment: DEFAULT_ROW_ALIGNMENT,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Config {
    /// Create a configuration with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row alignment using builder pattern.
    pub fn with_row_alignment(mut self, row_alignment: NonZeroUsize) -> Self {
        self.row_alignment = row_alignment;
        self
    }

    /// Set the comparison tolerance using builder pattern.
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON. Missing fields take their default.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Return the padded row stride for a matrix with `ncols` columns.
    pub fn padded_stride(&self, ncols: usize) -> usize {
        let align = self.row_alignment.get();
        ncols.div_ceil(align) * align
    }
}
