//! Row-major `f64` matrices with value semantics.
//!
//! Every operation returns a fresh matrix; operands are never modified.

use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::BrainError;

/// Matrix dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.rows * self.cols
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Dense two-dimensional matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    shape: Shape,
    data: Vec<f64>,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            shape: Shape::new(rows, cols),
            data: vec![0.0; rows * cols],
        }
    }

    /// A `rows x cols` matrix with entries drawn uniformly from `[-1, 1]`.
    #[must_use]
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        Self::random_in(rows, cols, -1.0..=1.0, rng)
    }

    /// A `rows x cols` matrix with entries drawn uniformly from `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is empty, as [`Rng::random_range`] does.
    #[must_use]
    pub fn random_in<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        range: RangeInclusive<f64>,
        rng: &mut R,
    ) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.random_range(range.clone()))
            .collect();
        Self {
            shape: Shape::new(rows, cols),
            data,
        }
    }

    /// An `n x 1` column vector holding `values`.
    #[must_use]
    pub fn column(values: &[f64]) -> Self {
        Self {
            shape: Shape::new(values.len(), 1),
            data: values.to_vec(),
        }
    }

    /// Build a matrix from nested rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, BrainError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in &rows {
            if row.len() != cols {
                return Err(BrainError::ShapeMismatch {
                    op: "from_rows",
                    lhs: Shape::new(1, cols),
                    rhs: Shape::new(1, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            shape: Shape::new(rows.len(), cols),
            data,
        })
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    /// Entry at `(row, col)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows() && col < self.cols()).then(|| self.data[row * self.cols() + col])
    }

    /// Row-major view of every entry.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Row-major copy of every entry.
    #[must_use]
    pub fn to_flat_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    #[must_use]
    pub fn add_scalar(&self, value: f64) -> Self {
        self.map(|x| x + value)
    }

    pub fn add(&self, other: &Self) -> Result<Self, BrainError> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    #[must_use]
    pub fn subtract_scalar(&self, value: f64) -> Self {
        self.map(|x| x - value)
    }

    pub fn subtract(&self, other: &Self) -> Result<Self, BrainError> {
        self.zip_with(other, "subtract", |a, b| a - b)
    }

    #[must_use]
    pub fn multiply_scalar(&self, value: f64) -> Self {
        self.map(|x| x * value)
    }

    /// Element-wise (Hadamard) product.
    pub fn multiply(&self, other: &Self) -> Result<Self, BrainError> {
        self.zip_with(other, "multiply", |a, b| a * b)
    }

    /// Standard matrix product; `self.cols` must equal `other.rows`.
    pub fn dot(&self, other: &Self) -> Result<Self, BrainError> {
        if self.cols() != other.rows() {
            return Err(BrainError::ShapeMismatch {
                op: "dot",
                lhs: self.shape,
                rhs: other.shape,
            });
        }
        let (rows, inner, cols) = (self.rows(), self.cols(), other.cols());
        let mut data = vec![0.0; rows * cols];
        for i in 0..rows {
            let out = &mut data[i * cols..(i + 1) * cols];
            for k in 0..inner {
                let lhs = self.data[i * inner + k];
                let rhs = &other.data[k * cols..(k + 1) * cols];
                for (cell, value) in out.iter_mut().zip(rhs) {
                    *cell += lhs * value;
                }
            }
        }
        Ok(Self {
            shape: Shape::new(rows, cols),
            data,
        })
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let (rows, cols) = (self.rows(), self.cols());
        let mut data = Vec::with_capacity(self.data.len());
        for col in 0..cols {
            for row in 0..rows {
                data.push(self.data[row * cols + col]);
            }
        }
        Self {
            shape: Shape::new(cols, rows),
            data,
        }
    }

    /// Logistic function applied element-wise.
    #[must_use]
    pub fn sigmoid(&self) -> Self {
        self.map(|x| 1.0 / (1.0 + (-x).exp()))
    }

    /// Derivative of the logistic function, expressed on values that are already sigmoid
    /// outputs: `y * (1 - y)`.
    #[must_use]
    pub fn sigmoid_derivative(&self) -> Self {
        self.map(|y| y * (1.0 - y))
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            shape: self.shape,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    fn zip_with(
        &self,
        other: &Self,
        op: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, BrainError> {
        if self.shape != other.shape {
            return Err(BrainError::ShapeMismatch {
                op,
                lhs: self.shape,
                rhs: other.shape,
            });
        }
        Ok(Self {
            shape: self.shape,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }
}
