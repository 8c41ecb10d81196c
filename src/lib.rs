//! # carousel
//!
//! A single-layer LSTM in matrix form, trained with exact backpropagation
//! through time.
//!
//! Weights live in a [`ParameterSet`] together with their gradient
//! accumulators. A [`Network`] borrows the set, unrolls one [`Node`] per
//! input, and on [`compute_loss_and_gradients`](Network::compute_loss_and_gradients)
//! sweeps the sequence backwards. The cell-state gradient flows from step to
//! step through the forget gate alone, which is what keeps it from vanishing.
//!
//! ```
//! use carousel::{Network, ParameterSet, SquaredErrorLoss, Trainer};
//!
//! let mut params = ParameterSet::new(4, 2, 7)?;
//! let net = Network::with_loss(&mut params, SquaredErrorLoss);
//! let mut trainer = Trainer::new(net, 0.1)?;
//!
//! let data = vec![(vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![0.3, -0.2])];
//! let history = trainer.fit(&data, 20)?;
//! assert_eq!(history.len(), 20);
//! # Ok::<(), carousel::CarouselError>(())
//! ```

pub mod error;
pub mod linalg;
pub mod nn;
pub mod ops;

pub use error::{CarouselError, Result};
pub use linalg::Matrix;
pub use nn::{
    Gate, GateParams, Initializer, LossLayer, LstmConfig, Network, Node, ParameterSet,
    ProductSquareLoss, SquaredErrorLoss, Trainer,
};
