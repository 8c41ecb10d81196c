//! Per-timestep loss functions.
//!
//! A loss reads the hidden output `h_t` of one timestep and a scalar target.
//! Both losses here use `h[0]` as the prediction channel; the gradient of
//! every other component is zero.

use std::fmt;

/// A per-timestep loss and the gradient it sends into the hidden output.
pub trait LossLayer: fmt::Debug {
    /// Loss for a single timestep.
    fn loss(&self, prediction: &[f64], target: f64) -> f64;

    /// Writes the gradient with respect to `prediction` into `diff`.
    ///
    /// `diff` has the same length as `prediction`; every component must be
    /// overwritten.
    fn bottom_diff(&self, prediction: &[f64], target: f64, diff: &mut [f64]);
}

impl<L: LossLayer + ?Sized> LossLayer for Box<L> {
    fn loss(&self, prediction: &[f64], target: f64) -> f64 {
        (**self).loss(prediction, target)
    }

    fn bottom_diff(&self, prediction: &[f64], target: f64, diff: &mut [f64]) {
        (**self).bottom_diff(prediction, target, diff)
    }
}

/// The default loss: `(h[0] * target)²`, with gradient `2 * h[0] * target`
/// on `h[0]`.
///
/// The gradient is not the exact derivative of the loss (that would be
/// `2 * h[0] * target²`); it is kept as-is so trained models stay comparable
/// with existing results. Use [`SquaredErrorLoss`] for a conventional
/// regression objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductSquareLoss;

impl LossLayer for ProductSquareLoss {
    fn loss(&self, prediction: &[f64], target: f64) -> f64 {
        let f = prediction[0] * target;
        f * f
    }

    fn bottom_diff(&self, prediction: &[f64], target: f64, diff: &mut [f64]) {
        diff.fill(0.0);
        diff[0] = 2.0 * prediction[0] * target;
    }
}

/// Squared error `(h[0] - target)²`, with gradient `2 * (h[0] - target)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredErrorLoss;

impl LossLayer for SquaredErrorLoss {
    fn loss(&self, prediction: &[f64], target: f64) -> f64 {
        let e = prediction[0] - target;
        e * e
    }

    fn bottom_diff(&self, prediction: &[f64], target: f64, diff: &mut [f64]) {
        diff.fill(0.0);
        diff[0] = 2.0 * (prediction[0] - target);
    }
}

impl fmt::Display for ProductSquareLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(h0 * y)^2")
    }
}

impl fmt::Display for SquaredErrorLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(h0 - y)^2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_product_square_loss() {
        let loss = ProductSquareLoss;
        let h = [0.5, 9.0, -3.0];
        assert_relative_eq!(loss.loss(&h, 0.2), 0.01);

        let mut diff = [7.0; 3];
        loss.bottom_diff(&h, 0.2, &mut diff);
        assert_relative_eq!(diff[0], 0.2);
        assert_eq!(&diff[1..], &[0.0, 0.0]);
    }

    #[test]
    fn test_squared_error_loss() {
        let loss = SquaredErrorLoss;
        let h = [0.5, 1.0];
        assert_relative_eq!(loss.loss(&h, 0.2), 0.09);

        let mut diff = [1.0; 2];
        loss.bottom_diff(&h, 0.2, &mut diff);
        assert_relative_eq!(diff[0], 0.6);
        assert_eq!(diff[1], 0.0);
    }

    #[test]
    fn test_squared_error_gradient_matches_finite_difference() {
        let loss = SquaredErrorLoss;
        let eps = 1e-6;
        let target = -0.3;
        let h = 0.4;

        let numeric = (loss.loss(&[h + eps], target) - loss.loss(&[h - eps], target)) / (2.0 * eps);
        let mut diff = [0.0];
        loss.bottom_diff(&[h], target, &mut diff);
        assert_relative_eq!(diff[0], numeric, epsilon = 1e-8);
    }

    #[test]
    fn test_boxed_loss_delegates() {
        let boxed: Box<dyn LossLayer> = Box::new(SquaredErrorLoss);
        assert_relative_eq!(boxed.loss(&[1.0], 0.0), 1.0);
        assert_eq!(ProductSquareLoss.to_string(), "(h0 * y)^2");
    }
}
