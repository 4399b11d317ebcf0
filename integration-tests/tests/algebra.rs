use std::sync::Arc;

use approx::assert_relative_eq;
use braid_core::derivative::{DEFAULT_THRESHOLD, check_jacobian, ensure_jacobian};
use braid_core::function::{Identity, Sin};
use braid_core::{
    CacheConfig, CachedFunction, Compose, Function, FunctionClass, Policy, Problem, shared,
};
use integration_tests::fixtures::{closure_norm, shifted_bowl, sum};
use ndarray::array;

#[test]
fn chaining_with_identity_changes_nothing() {
    let bowl = shifted_bowl();
    let chained = bowl.chain(&shared(Identity::new(2))).unwrap();
    let x = array![0.3, -1.7];

    assert_eq!(chained.class(), FunctionClass::Quadratic);
    assert_relative_eq!(chained.call(&x).unwrap()[0], bowl.call(&x).unwrap()[0]);
    assert_relative_eq!(
        chained.gradient(&x, 0).unwrap(),
        bowl.gradient(&x, 0).unwrap(),
        epsilon = 1e-12
    );
}

#[test]
fn sums_and_differences_cancel() {
    let bowl = shifted_bowl();
    let linear = sum();
    let roundtrip = bowl.plus(&linear).unwrap().minus(&linear).unwrap();
    let x = array![2.0, 5.0];

    assert_relative_eq!(roundtrip.call(&x).unwrap()[0], bowl.call(&x).unwrap()[0]);
    assert_eq!(roundtrip.class(), FunctionClass::Quadratic);
    assert!(check_jacobian(roundtrip.as_ref(), &x, DEFAULT_THRESHOLD));
}

#[test]
fn finite_differences_stand_in_for_missing_derivatives() {
    let norm = closure_norm();
    let x = array![1.0, -2.0];

    for policy in [Policy::Simple, Policy::FivePointsRule] {
        let estimate = norm.finite_difference(policy);
        let gradient = estimate.gradient(&x, 0).unwrap();
        assert_relative_eq!(gradient, array![2.0, -4.0], epsilon = 1e-4);
    }
    ensure_jacobian(&Sin::new(2), &x, DEFAULT_THRESHOLD).unwrap();
}

#[test]
fn caching_is_transparent() {
    let bowl = shifted_bowl();
    let cached = Arc::new(CachedFunction::new(bowl.clone(), CacheConfig::new(2).unwrap()));
    let points = [array![0.0, 0.0], array![1.0, 0.0], array![0.0, 1.0]];

    for _ in 0..2 {
        for x in &points {
            assert_eq!(cached.call(x).unwrap(), bowl.call(x).unwrap());
        }
    }
    let stats = cached.stats();
    assert_eq!(stats.hits + stats.misses, 6);
    // Three points cycling through two slots never hit.
    assert_eq!(stats.hits, 0);

    assert_eq!(cached.call(&points[2]).unwrap(), bowl.call(&points[2]).unwrap());
    assert_eq!(cached.stats().hits, 1);
}

#[test]
fn composites_build_problems() {
    let cost = shifted_bowl().scale(0.5);
    let mut problem = Problem::new(cost).unwrap();
    let circle = closure_norm().finite_difference(Policy::FivePointsRule);
    problem
        .add_constraint(
            circle,
            vec![braid_core::Interval::at_most(1.0).unwrap()],
            None,
        )
        .unwrap();

    let x = array![0.6, 0.8];
    assert!(problem.is_feasible(&x, 1e-9).unwrap());
    let jacobian = problem.jacobian(&x).unwrap().to_dense();
    assert_relative_eq!(jacobian, array![[1.2, 1.6]], epsilon = 1e-6);
}
