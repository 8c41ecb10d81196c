//! Matrix transpose.

use super::Matrix;

/// Transpose a matrix.
pub fn transpose(matrix: &Matrix) -> Matrix {
    let (m, n) = matrix.shape();
    Matrix::from_fn(n, m, |i, j| matrix[(j, i)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = transpose(&a);
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(transpose(&t), a);
    }
}
