//! Activation functions and their derivatives.

use num_traits::Float;

/// Logistic sigmoid.
///
/// Evaluated in two branches so `exp` only ever sees a non-positive
/// argument and cannot overflow.
pub fn sigmoid<T: Float>(x: T) -> T {
    let one = T::one();
    if x >= T::zero() {
        one / (one + (-x).exp())
    } else {
        let e = x.exp();
        e / (one + e)
    }
}

/// Hyperbolic tangent.
pub fn tanh<T: Float>(x: T) -> T {
    x.tanh()
}

/// Derivative of the sigmoid, expressed in terms of its output `y = sigmoid(x)`.
pub fn sigmoid_grad<T: Float>(y: T) -> T {
    y * (T::one() - y)
}

/// Derivative of tanh, expressed in terms of its output `y = tanh(x)`.
pub fn tanh_grad<T: Float>(y: T) -> T {
    T::one() - y * y
}
