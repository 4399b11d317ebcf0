use std::borrow::Cow;

use ndarray::{Array2, Axis};
use sprs::TriMat;

use crate::repr::{DenseMatrix, Representation, SparseMatrix, Vector};

/// A Jacobian-like matrix stored either densely or sparsely.
///
/// Sparse matrices are always kept in row-major (CSR) storage so rows can be
/// walked directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    Dense(DenseMatrix),
    Sparse(SparseMatrix),
}

impl Matrix {
    /// Creates an all-zero matrix in the given representation.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize, repr: Representation) -> Self {
        match repr {
            Representation::Dense => Self::Dense(Array2::zeros((rows, cols))),
            Representation::Sparse => Self::Sparse(SparseMatrix::zero((rows, cols))),
        }
    }

    /// Builds a matrix from `(row, col, value)` entries.
    ///
    /// Duplicate entries are summed.
    pub fn from_triplets<I>(rows: usize, cols: usize, entries: I, repr: Representation) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        match repr {
            Representation::Dense => {
                let mut dense = Array2::zeros((rows, cols));
                for (i, j, v) in entries {
                    dense[[i, j]] += v;
                }
                Self::Dense(dense)
            }
            Representation::Sparse => {
                let mut tri = TriMat::new((rows, cols));
                for (i, j, v) in entries {
                    tri.add_triplet(i, j, v);
                }
                Self::Sparse(tri.to_csr())
            }
        }
    }

    /// Wraps a sparse matrix, normalizing it to row-major storage.
    #[must_use]
    pub fn from_sparse(matrix: SparseMatrix) -> Self {
        Self::Sparse(matrix.into_csr())
    }

    #[must_use]
    pub fn representation(&self) -> Representation {
        match self {
            Self::Dense(_) => Representation::Dense,
            Self::Sparse(_) => Representation::Sparse,
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        match self {
            Self::Dense(m) => m.nrows(),
            Self::Sparse(m) => m.rows(),
        }
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        match self {
            Self::Dense(m) => m.ncols(),
            Self::Sparse(m) => m.cols(),
        }
    }

    /// Returns the coefficient at `(row, col)`; structural zeros read as `0.0`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self {
            Self::Dense(m) => m[[row, col]],
            Self::Sparse(m) => m.get(row, col).copied().unwrap_or(0.0),
        }
    }

    /// Returns the stored entries as `(row, col, value)` triplets.
    ///
    /// Dense matrices only report non-zero coefficients.
    #[must_use]
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        match self {
            Self::Dense(m) => m
                .indexed_iter()
                .filter(|(_, v)| **v != 0.0)
                .map(|((i, j), v)| (i, j, *v))
                .collect(),
            Self::Sparse(m) => m.iter().map(|(v, (i, j))| (i, j, *v)).collect(),
        }
    }

    /// Returns a dense copy of the matrix.
    #[must_use]
    pub fn to_dense(&self) -> DenseMatrix {
        match self {
            Self::Dense(m) => m.clone(),
            Self::Sparse(m) => m.to_dense(),
        }
    }

    /// Borrows or builds the row-major sparse form of the matrix.
    fn to_csr(&self) -> Cow<'_, SparseMatrix> {
        match self {
            Self::Dense(m) => Cow::Owned(SparseMatrix::csr_from_dense(m.view(), 0.0)),
            Self::Sparse(m) => Cow::Borrowed(m),
        }
    }

    /// Converts the matrix into the requested representation.
    #[must_use]
    pub fn into_representation(self, repr: Representation) -> Self {
        match (self, repr) {
            (Self::Dense(m), Representation::Sparse) => {
                Self::Sparse(SparseMatrix::csr_from_dense(m.view(), 0.0))
            }
            (Self::Sparse(m), Representation::Dense) => Self::Dense(m.to_dense()),
            (same, _) => same,
        }
    }

    /// Returns row `row` as a dense vector.
    #[must_use]
    pub fn row(&self, row: usize) -> Vector {
        match self {
            Self::Dense(m) => m.row(row).to_owned(),
            Self::Sparse(m) => {
                let mut out = Vector::zeros(m.cols());
                if let Some(r) = m.outer_view(row) {
                    for (j, v) in r.iter() {
                        out[j] = *v;
                    }
                }
                out
            }
        }
    }

    /// Returns the Euclidean norm of row `row`.
    #[must_use]
    pub fn row_norm(&self, row: usize) -> f64 {
        match self {
            Self::Dense(m) => m.row(row).iter().map(|v| v * v).sum::<f64>().sqrt(),
            Self::Sparse(m) => m
                .outer_view(row)
                .map_or(0.0, |r| r.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()),
        }
    }

    /// Returns the largest absolute coefficient of row `row`.
    #[must_use]
    pub fn row_max_abs(&self, row: usize) -> f64 {
        match self {
            Self::Dense(m) => m.row(row).iter().fold(0.0, |acc, v| acc.max(v.abs())),
            Self::Sparse(m) => m
                .outer_view(row)
                .map_or(0.0, |r| r.iter().fold(0.0, |acc, (_, v)| acc.max(v.abs()))),
        }
    }

    /// Returns `true` if every coefficient of row `row` is exactly zero.
    #[must_use]
    pub fn is_row_zero(&self, row: usize) -> bool {
        match self {
            Self::Dense(m) => m.row(row).iter().all(|v| *v == 0.0),
            Self::Sparse(m) => m
                .outer_view(row)
                .is_none_or(|r| r.iter().all(|(_, v)| *v == 0.0)),
        }
    }

    /// Multiplies every coefficient by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Self::Dense(m) => Self::Dense(m * factor),
            Self::Sparse(m) => Self::Sparse(m.map(|v| v * factor)),
        }
    }

    /// Multiplies row `i` by `factors[i]`.
    #[must_use]
    pub fn scale_rows(&self, factors: &Vector) -> Self {
        match self {
            Self::Dense(m) => {
                let mut out = m.clone();
                for (mut row, f) in out.axis_iter_mut(Axis(0)).zip(factors.iter()) {
                    row *= *f;
                }
                Self::Dense(out)
            }
            Self::Sparse(m) => {
                let mut out = m.clone();
                for (mut row, f) in out.outer_iterator_mut().zip(factors.iter()) {
                    row.map_inplace(|v| v * f);
                }
                Self::Sparse(out)
            }
        }
    }

    /// Multiplies column `j` by `factors[j]`.
    #[must_use]
    pub fn scale_columns(&self, factors: &Vector) -> Self {
        match self {
            Self::Dense(m) => Self::Dense(m * &factors.view().insert_axis(Axis(0))),
            Self::Sparse(m) => {
                let mut out = m.clone();
                for (v, &j) in out.data_mut().iter_mut().zip(m.indices()) {
                    *v *= factors[j];
                }
                Self::Sparse(out)
            }
        }
    }

    /// Adds two matrices of identical shape.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        debug_assert_eq!((self.rows(), self.cols()), (other.rows(), other.cols()));
        match (self, other) {
            (Self::Dense(a), Self::Dense(b)) => Self::Dense(a + b),
            _ => Self::Sparse(&*self.to_csr() + &*other.to_csr()),
        }
    }

    /// Subtracts `other` from `self`; both must share a shape.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        debug_assert_eq!((self.rows(), self.cols()), (other.rows(), other.cols()));
        match (self, other) {
            (Self::Dense(a), Self::Dense(b)) => Self::Dense(a - b),
            _ => Self::Sparse(&*self.to_csr() - &*other.to_csr()),
        }
    }

    /// Computes the matrix product `self * other`.
    ///
    /// Only a product of two sparse matrices stays sparse.
    #[must_use]
    pub fn matmul(&self, other: &Self) -> Self {
        debug_assert_eq!(self.cols(), other.rows());
        match (self, other) {
            (Self::Dense(a), Self::Dense(b)) => Self::Dense(a.dot(b)),
            (Self::Sparse(a), Self::Sparse(b)) => Self::from_sparse(a * b),
            (Self::Sparse(a), Self::Dense(b)) => Self::Dense(a * b),
            // (A B)ᵀ = Bᵀ Aᵀ keeps the sparse operand on the left.
            (Self::Dense(a), Self::Sparse(b)) => {
                Self::Dense((&b.transpose_view() * &a.t()).reversed_axes())
            }
        }
    }

    /// Computes `self * v`.
    #[must_use]
    pub fn dot(&self, v: &Vector) -> Vector {
        match self {
            Self::Dense(m) => m.dot(v),
            Self::Sparse(m) => m * v,
        }
    }

    /// Computes `selfᵀ * v`.
    #[must_use]
    pub fn transpose_mul_vector(&self, v: &Vector) -> Vector {
        match self {
            Self::Dense(m) => m.t().dot(v),
            Self::Sparse(m) => &m.transpose_view() * v,
        }
    }

    /// Keeps only the listed rows, in the given order.
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        match self {
            Self::Dense(m) => Self::Dense(m.select(Axis(0), rows)),
            Self::Sparse(m) => {
                let mut indptr = Vec::with_capacity(rows.len() + 1);
                let (mut indices, mut data) = (Vec::new(), Vec::new());
                indptr.push(0);
                for &row in rows {
                    if let Some(view) = m.outer_view(row) {
                        indices.extend_from_slice(view.indices());
                        data.extend_from_slice(view.data());
                    }
                    indptr.push(indices.len());
                }
                Self::Sparse(SparseMatrix::new(
                    (rows.len(), m.cols()),
                    indptr,
                    indices,
                    data,
                ))
            }
        }
    }

    /// Keeps only the listed columns, in the given order.
    #[must_use]
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        match self {
            Self::Dense(m) => Self::Dense(m.select(Axis(1), cols)),
            Self::Sparse(m) => {
                let mut position = vec![None; m.cols()];
                for (new_col, &old_col) in cols.iter().enumerate() {
                    position[old_col] = Some(new_col);
                }
                let mut indptr = Vec::with_capacity(m.rows() + 1);
                let (mut indices, mut data) = (Vec::new(), Vec::new());
                indptr.push(0);
                for row in m.outer_iterator() {
                    let mut kept: Vec<(usize, f64)> = row
                        .iter()
                        .filter_map(|(j, v)| position[j].map(|new_j| (new_j, *v)))
                        .collect();
                    kept.sort_unstable_by_key(|(j, _)| *j);
                    for (j, v) in kept {
                        indices.push(j);
                        data.push(v);
                    }
                    indptr.push(indices.len());
                }
                Self::Sparse(SparseMatrix::new(
                    (m.rows(), cols.len()),
                    indptr,
                    indices,
                    data,
                ))
            }
        }
    }

    /// Stacks blocks sharing a column count on top of each other.
    #[must_use]
    pub fn vstack(blocks: &[Self], cols: usize, repr: Representation) -> Self {
        let rows = blocks.iter().map(Self::rows).sum();
        let mut offset = 0;
        let mut entries = Vec::new();
        for block in blocks {
            debug_assert_eq!(block.cols(), cols);
            entries.extend(
                block
                    .triplets()
                    .into_iter()
                    .map(|(i, j, v)| (i + offset, j, v)),
            );
            offset += block.rows();
        }
        Self::from_triplets(rows, cols, entries, repr)
    }

    /// Places blocks along the diagonal of an otherwise zero matrix.
    #[must_use]
    pub fn block_diagonal(blocks: &[Self], repr: Representation) -> Self {
        let rows = blocks.iter().map(Self::rows).sum();
        let cols = blocks.iter().map(Self::cols).sum();
        let (mut row_offset, mut col_offset) = (0, 0);
        let mut entries = Vec::new();
        for block in blocks {
            entries.extend(
                block
                    .triplets()
                    .into_iter()
                    .map(|(i, j, v)| (i + row_offset, j + col_offset, v)),
            );
            row_offset += block.rows();
            col_offset += block.cols();
        }
        Self::from_triplets(rows, cols, entries, repr)
    }

    /// Largest absolute coefficient-wise difference and its position.
    #[must_use]
    pub fn max_delta(&self, other: &Self) -> (f64, usize, usize) {
        let (a, b) = (self.to_dense(), other.to_dense());
        let mut best = (f64::NEG_INFINITY, 0, 0);
        for ((i, j), va) in a.indexed_iter() {
            let delta = (va - b[[i, j]]).abs();
            if delta > best.0 {
                best = (delta, i, j);
            }
        }
        best
    }
}

impl From<DenseMatrix> for Matrix {
    fn from(matrix: DenseMatrix) -> Self {
        Self::Dense(matrix)
    }
}

impl From<SparseMatrix> for Matrix {
    fn from(matrix: SparseMatrix) -> Self {
        Self::from_sparse(matrix)
    }
}
