use braid_core::DenseMatrix;

/// Numerical rank by Gaussian elimination with full pivoting.
///
/// Elimination stops once the largest remaining pivot falls to
/// `tolerance` times the largest entry of the input.
pub(super) fn rank(matrix: &DenseMatrix, tolerance: f64) -> usize {
    let mut a = matrix.clone();
    let (rows, cols) = a.dim();
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return 0;
    }
    let threshold = tolerance * scale;

    let mut rank = 0;
    for k in 0..rows.min(cols) {
        let (mut pi, mut pj, mut pivot) = (k, k, 0.0);
        for i in k..rows {
            for j in k..cols {
                if a[[i, j]].abs() > pivot {
                    (pi, pj, pivot) = (i, j, a[[i, j]].abs());
                }
            }
        }
        if pivot <= threshold {
            break;
        }

        for j in 0..cols {
            a.swap([k, j], [pi, j]);
        }
        for i in 0..rows {
            a.swap([i, k], [i, pj]);
        }

        for i in k + 1..rows {
            let factor = a[[i, k]] / a[[k, k]];
            for j in k..cols {
                let above = a[[k, j]];
                a[[i, j]] -= factor * above;
            }
        }
        rank += 1;
    }
    rank
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn ranks() {
        assert_eq!(rank(&DenseMatrix::zeros((2, 3)), 1e-10), 0);
        assert_eq!(rank(&DenseMatrix::eye(3), 1e-10), 3);
        assert_eq!(rank(&array![[1.0, 1.0], [2.0, 2.0]], 1e-10), 1);
        assert_eq!(rank(&array![[1.0, 2.0, 3.0], [0.0, 1.0, 0.0]], 1e-10), 2);
        assert_eq!(rank(&array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0]], 1e-10), 2);
    }

    #[test]
    fn tolerance_is_relative() {
        let nearly_dependent = array![[1e6, 1e6], [1e6, 1e6 + 1e-6]];
        assert_eq!(rank(&nearly_dependent, 1e-10), 1);
        assert_eq!(rank(&(nearly_dependent * 1e-9), 1e-10), 1);
    }
}
