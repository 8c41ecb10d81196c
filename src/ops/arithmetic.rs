//! Vector arithmetic.

use num_traits::Float;

/// Dot product of two equal-length vectors.
pub fn dot<T: Float>(a: &[T], b: &[T]) -> T {
    debug_assert_eq!(a.len(), b.len(), "dot: length mismatch");
    a.iter()
        .zip(b)
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Concatenates two vectors into a new one, `a` first.
pub fn concat<T: Float>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// Writes `concat(a, b)` into an existing buffer of length `a.len() + b.len()`.
pub fn concat_into<T: Float>(a: &[T], b: &[T], out: &mut [T]) {
    debug_assert_eq!(out.len(), a.len() + b.len(), "concat_into: length mismatch");
    let (head, tail) = out.split_at_mut(a.len());
    head.copy_from_slice(a);
    tail.copy_from_slice(b);
}

/// `dst += src`, element-wise.
pub fn add_assign<T: Float>(dst: &mut [T], src: &[T]) {
    debug_assert_eq!(dst.len(), src.len(), "add_assign: length mismatch");
    dst.iter_mut().zip(src).for_each(|(d, &s)| *d = *d + s);
}

/// Sum of squares of every element.
pub fn sum_squares<T: Float>(values: &[T]) -> T {
    values.iter().fold(T::zero(), |acc, &v| acc + v * v)
}
