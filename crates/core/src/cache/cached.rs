use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::trace;

use crate::function::{Function, FunctionClass, FunctionError, SharedFunction};
use crate::matrix::Matrix;
use crate::repr::{DenseMatrix, Representation, Vector};

use super::{CacheConfig, InputKey, LruCache};

/// Hit and miss counters of a [`CachedFunction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Memoizes values, Jacobians and gradients of a wrapped function.
///
/// Each kind of result has its own LRU cache keyed by the exact argument, so
/// evaluating the value at a point does not make its Jacobian a hit. The
/// wrapper keeps the wrapped function's sizes, class and representation.
///
/// Hessians and scalar derivatives are not memoized: every request goes to
/// the wrapped function and leaves the hit and miss counters untouched.
///
/// Caches are guarded by mutexes; a miss computes outside the lock, so two
/// threads missing on the same key may both delegate.
pub struct CachedFunction {
    inner: SharedFunction,
    name: String,
    values: Mutex<LruCache<InputKey, Vector>>,
    jacobians: Mutex<LruCache<InputKey, Matrix>>,
    gradients: Mutex<LruCache<InputKey, Vector>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl CachedFunction {
    pub fn new(inner: SharedFunction, config: CacheConfig) -> Self {
        Self {
            name: inner.name().to_owned(),
            inner,
            values: Mutex::new(LruCache::with_config(config)),
            jacobians: Mutex::new(LruCache::with_config(config)),
            gradients: Mutex::new(LruCache::with_config(config)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &SharedFunction {
        &self.inner
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drops every cached result.
    pub fn reset(&self) {
        lock(&self.values).clear();
        lock(&self.jacobians).clear();
        lock(&self.gradients).clear();
    }

    fn lookup<T, C>(
        &self,
        cache: &Mutex<LruCache<InputKey, T>>,
        key: InputKey,
        kind: &'static str,
        compute: C,
    ) -> Result<T, FunctionError>
    where
        T: Clone,
        C: FnOnce() -> Result<T, FunctionError>,
    {
        if let Some(hit) = lock(cache).get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(function = %self.name, kind, "cache hit");
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(function = %self.name, kind, "cache miss");
        let value = compute()?;
        lock(cache).put(key, value.clone());
        Ok(value)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl fmt::Debug for CachedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFunction")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Function for CachedFunction {
    fn input_size(&self) -> usize {
        self.inner.input_size()
    }

    fn output_size(&self) -> usize {
        self.inner.output_size()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        self.inner.class()
    }

    fn representation(&self) -> Representation {
        self.inner.representation()
    }

    fn is_constant(&self) -> bool {
        self.inner.is_constant()
    }

    fn call(&self, x: &Vector) -> Result<Vector, FunctionError> {
        self.lookup(&self.values, InputKey::new(x), "value", || {
            self.inner.call(x)
        })
    }

    fn jacobian(&self, x: &Vector) -> Result<Matrix, FunctionError> {
        self.lookup(&self.jacobians, InputKey::new(x), "jacobian", || {
            self.inner.jacobian(x)
        })
    }

    fn gradient(&self, x: &Vector, component: usize) -> Result<Vector, FunctionError> {
        self.lookup(
            &self.gradients,
            InputKey::with_component(x, component),
            "gradient",
            || self.inner.gradient(x, component),
        )
    }

    fn hessian(&self, x: &Vector, component: usize) -> Result<DenseMatrix, FunctionError> {
        self.inner.hessian(x, component)
    }

    fn derivative(&self, t: f64, order: u32) -> Result<Vector, FunctionError> {
        self.inner.derivative(t, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use ndarray::array;

    use crate::function::{FnFunction, shared};

    /// x ↦ 2x, counting evaluations.
    fn counted() -> (SharedFunction, Arc<AtomicUsize>) {
        counted_with(FunctionClass::Linear)
    }

    fn counted_with(class: FunctionClass) -> (SharedFunction, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let f = FnFunction::new("double", 2, 2, class, move |x: &Vector| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(x * 2.0)
        });
        (shared(f), calls)
    }

    #[test]
    fn second_evaluation_is_served_from_cache() {
        let (f, calls) = counted();
        let cached = CachedFunction::new(f, CacheConfig::default());
        let x = array![1.0, 2.0];

        let first = cached.call(&x).unwrap();
        let second = cached.call(&x).unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn value_and_jacobian_are_cached_independently() {
        let (f, calls) = counted();
        let cached = CachedFunction::new(f, CacheConfig::default());
        let x = array![1.0, 2.0];

        cached.call(&x).unwrap();
        let after_value = calls.load(Ordering::SeqCst);
        cached.jacobian(&x).unwrap();
        let after_jacobian = calls.load(Ordering::SeqCst);
        cached.jacobian(&x).unwrap();

        // The finite-difference Jacobian evaluates the function again.
        assert!(after_jacobian > after_value);
        assert_eq!(calls.load(Ordering::SeqCst), after_jacobian);
        assert_eq!(cached.stats().misses, 2);
    }

    #[test]
    fn nearby_arguments_miss() {
        let (f, calls) = counted();
        let cached = CachedFunction::new(f, CacheConfig::new(1).unwrap());

        cached.call(&array![1.0, 0.0]).unwrap();
        cached.call(&array![1.0 + f64::EPSILON, 0.0]).unwrap();
        cached.call(&array![1.0, 0.0]).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn hessians_always_reach_the_wrapped_function() {
        let (f, calls) = counted_with(FunctionClass::TwiceDifferentiable);
        let cached = CachedFunction::new(f, CacheConfig::default());
        let x = array![1.0, 2.0];

        let first = cached.hessian(&x, 0).unwrap();
        let after_first = calls.load(Ordering::SeqCst);
        let second = cached.hessian(&x, 0).unwrap();

        assert_eq!(first, second);
        assert!(after_first > 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2 * after_first);
        assert_eq!(cached.stats(), CacheStats::default());
    }

    #[test]
    fn preserves_wrapped_metadata() {
        let (f, _) = counted();
        let cached = CachedFunction::new(f, CacheConfig::default());

        assert_eq!(cached.name(), "double");
        assert_eq!(cached.class(), FunctionClass::Linear);
        assert_eq!((cached.input_size(), cached.output_size()), (2, 2));
        cached.reset();
    }
}
