use crate::matrix::Matrix;
use crate::repr::{Representation, Vector};

use super::{Function, FunctionClass, FunctionError, check_component};

/// Piecewise-linear interpolation of a sampled trajectory.
///
/// The samples are `k` consecutive blocks of `m` values, such as the states
/// of a trajectory stacked into one optimization vector. The function maps a
/// time `t ∈ [0, k − 1]` to `m` values: block `t` itself at whole times,
/// and the linear blend of the two surrounding blocks in between. Its
/// derivative is the difference of those blocks; at the last sample the
/// final segment is used.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorInterpolation {
    samples: Vector,
    output_size: usize,
    name: String,
}

impl VectorInterpolation {
    /// Interpolates `samples`, read as blocks of `output_size` values.
    ///
    /// # Errors
    ///
    /// Returns an error if `output_size` is zero, or `samples` is empty or
    /// not a whole number of blocks.
    pub fn new(samples: Vector, output_size: usize) -> Result<Self, FunctionError> {
        if output_size == 0 || samples.is_empty() || samples.len() % output_size != 0 {
            return Err(FunctionError::Invalid {
                what: "interpolation samples",
                reason: format!(
                    "{} values do not split into blocks of {output_size}",
                    samples.len()
                ),
            });
        }
        Ok(Self {
            samples,
            output_size,
            name: "vector interpolation".to_owned(),
        })
    }

    /// Number of sampled blocks.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len() / self.output_size
    }

    fn block(&self, index: usize) -> Vector {
        let start = index * self.output_size;
        self.samples
            .slice(ndarray::s![start..start + self.output_size])
            .to_owned()
    }

    /// Index of the segment containing `t` and the position inside it.
    fn locate(&self, t: f64) -> Result<(usize, f64), FunctionError> {
        let last = (self.sample_count() - 1) as f64;
        if !(0.0..=last).contains(&t) {
            return Err(FunctionError::OutOfDomain {
                name: self.name.clone(),
                value: t,
            });
        }
        let before = t.floor();
        // Whole times past the first sample sit at the end of the previous
        // segment, so the last sample is reachable.
        let segment = if before == t && t > 0.0 { before - 1.0 } else { before };
        Ok((segment as usize, t - segment))
    }

    fn slope(&self, t: f64) -> Result<Vector, FunctionError> {
        if self.sample_count() == 1 {
            self.locate(t)?;
            return Ok(Vector::zeros(self.output_size));
        }
        let (segment, _) = self.locate(t)?;
        Ok(self.block(segment + 1) - self.block(segment))
    }
}

impl Function for VectorInterpolation {
    fn input_size(&self) -> usize {
        1
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Differentiable
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        let (segment, alpha) = self.locate(x[0])?;
        if alpha == 0.0 {
            return Ok(self.block(segment));
        }
        Ok(self.block(segment) * (1.0 - alpha) + self.block(segment + 1) * alpha)
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        let slope = self.slope(x[0])?;
        Ok(Matrix::from_triplets(
            self.output_size,
            1,
            slope.iter().enumerate().map(|(i, v)| (i, 0, *v)),
            Representation::Dense,
        ))
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        check_component(self, component)?;
        Ok(Vector::from_elem(1, self.slope(x[0])?[component]))
    }
}
