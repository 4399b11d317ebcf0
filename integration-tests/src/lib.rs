//! Shared problem fixtures for the integration tests.

pub mod fixtures {
    use std::sync::Arc;

    use braid_core::function::{FnFunction, NumericLinear, NumericQuadratic};
    use braid_core::{FunctionClass, Interval, Problem, SharedFunction, Vector, shared};
    use ndarray::{Array2, array};

    /// `(x₀ − 1)² + (x₁ − 2)²` written as `½ xᵀ (2I) x + bᵀ x + 5`.
    pub fn shifted_bowl() -> SharedFunction {
        let a = Array2::eye(2) * 2.0;
        shared(NumericQuadratic::new(a, array![-2.0, -4.0], 5.0).expect("valid quadratic"))
    }

    /// `x₀ + x₁`.
    pub fn sum() -> SharedFunction {
        shared(NumericLinear::new(array![[1.0, 1.0]], array![0.0]).expect("valid linear"))
    }

    /// `‖x‖²` as a closure with no analytic derivatives.
    pub fn closure_norm() -> SharedFunction {
        shared(FnFunction::new(
            "closure norm",
            2,
            1,
            FunctionClass::Differentiable,
            |x: &Vector| Ok(array![x.dot(x)]),
        ))
    }

    /// The shifted bowl over `x₀ ≥ 0` with `x₀ + x₁ ≤ 10`, started at `start`.
    pub fn bounded_bowl(start: Vector) -> Arc<Problem> {
        let mut problem = Problem::new(shifted_bowl()).expect("scalar cost");
        problem
            .set_argument_bound(0, Interval::at_least(0.0).expect("valid bound"))
            .expect("index in range");
        problem
            .add_constraint(sum(), vec![Interval::at_most(10.0).expect("valid bound")], None)
            .expect("matching sizes");
        problem.set_starting_point(start).expect("matching size");
        Arc::new(problem)
    }
}
