//! Bounds for genome values
//!
//! This module provides bounds types for constraining synthesis parameters.

use serde::{Deserialize, Serialize};

use crate::error::GenomeError;

/// Bounds for a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
}

impl Bounds {
    /// Create new bounds
    ///
    /// # Panics
    /// Panics if min > max
    pub fn new(min: f64, max: f64) -> Self {
        assert!(
            min <= max,
            "Invalid bounds: min ({}) must be <= max ({})",
            min,
            max
        );
        Self { min, max }
    }

    /// Create bounds, rejecting inverted or non-finite ranges
    pub fn try_new(min: f64, max: f64) -> Result<Self, GenomeError> {
        let bounds = Self { min, max };
        bounds.check(0)?;
        Ok(bounds)
    }

    /// Create unit bounds [0, 1]
    pub fn unit() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Get the center point
    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Check if a value is within bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to be within bounds
    ///
    /// NaN has no nearest bound and is mapped to the center.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.center()
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub(crate) fn check(&self, index: usize) -> Result<(), GenomeError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(GenomeError::InvalidBounds {
                index,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unit()
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// Per-parameter bounds for a whole genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBounds {
    /// Bounds for each dimension
    pub bounds: Vec<Bounds>,
}

impl MultiBounds {
    /// Create new multi-dimensional bounds
    pub fn new(bounds: Vec<Bounds>) -> Self {
        Self { bounds }
    }

    /// Create uniform bounds for all dimensions
    pub fn uniform(bound: Bounds, dimension: usize) -> Self {
        Self {
            bounds: vec![bound; dimension],
        }
    }

    /// Get number of dimensions
    pub fn dimension(&self) -> usize {
        self.bounds.len()
    }

    /// Get bounds for a specific dimension
    pub fn get(&self, index: usize) -> Option<&Bounds> {
        self.bounds.get(index)
    }

    /// Iterate over the per-dimension bounds
    pub fn iter(&self) -> std::slice::Iter<'_, Bounds> {
        self.bounds.iter()
    }

    /// Validate every dimension and require at least one
    pub fn validate(&self) -> Result<(), GenomeError> {
        if self.bounds.is_empty() {
            return Err(GenomeError::InvalidStructure(
                "genome must have at least one parameter".to_string(),
            ));
        }
        self.bounds
            .iter()
            .enumerate()
            .try_for_each(|(i, b)| b.check(i))
    }

    /// Clamp values into bounds, producing a new vector
    ///
    /// Values beyond the declared dimension are passed through unchanged.
    pub fn clamp_values(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.bounds.get(i).map_or(v, |b| b.clamp(v)))
            .collect()
    }

    /// Check if all values are within bounds
    pub fn contains_vec(&self, values: &[f64]) -> bool {
        values.len() == self.bounds.len()
            && values
                .iter()
                .zip(self.bounds.iter())
                .all(|(&v, b)| b.contains(v))
    }
}

impl FromIterator<Bounds> for MultiBounds {
    fn from_iter<I: IntoIterator<Item = Bounds>>(iter: I) -> Self {
        Self {
            bounds: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(f64, f64)> for MultiBounds {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        Self {
            bounds: iter.into_iter().map(|(min, max)| Bounds { min, max }).collect(),
        }
    }
}
