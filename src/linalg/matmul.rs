//! Matrix-vector products.

use super::Matrix;
use crate::ops::dot;

/// `m · v`.
pub fn matvec(m: &Matrix, v: &[f64]) -> Vec<f64> {
    debug_assert_eq!(m.cols(), v.len(), "matvec: length mismatch");
    (0..m.rows()).map(|i| dot(m.row(i), v)).collect()
}

/// `out += mᵗ · v`, without materialising the transpose.
pub fn t_matvec_add(m: &Matrix, v: &[f64], out: &mut [f64]) {
    debug_assert_eq!(m.rows(), v.len(), "t_matvec_add: row mismatch");
    debug_assert_eq!(m.cols(), out.len(), "t_matvec_add: column mismatch");
    for (i, &vi) in v.iter().enumerate() {
        for (o, &w) in out.iter_mut().zip(m.row(i)) {
            *o += w * vi;
        }
    }
}

/// Outer product `a ⊗ b`, shape `[a.len()][b.len()]`.
pub fn outer(a: &[f64], b: &[f64]) -> Matrix {
    Matrix::from_fn(a.len(), b.len(), |i, j| a[i] * b[j])
}

/// `m += a ⊗ b`.
pub fn add_outer(m: &mut Matrix, a: &[f64], b: &[f64]) {
    debug_assert_eq!(m.shape(), (a.len(), b.len()), "add_outer: shape mismatch");
    for (i, &ai) in a.iter().enumerate() {
        for (mij, &bj) in m.row_mut(i).iter_mut().zip(b) {
            *mij += ai * bj;
        }
    }
}
