//! A training loop over whole sequences.

use crate::{
    error::{CarouselError, Result},
    nn::{
        losses::{LossLayer, ProductSquareLoss},
        network::Network,
    },
};

/// Drives the `clear → add_input* → compute → apply` cycle of a [`Network`].
#[derive(Debug)]
pub struct Trainer<'a, L: LossLayer = ProductSquareLoss> {
    network: Network<'a, L>,
    learning_rate: f64,
    grad_clip_norm: Option<f64>,
}

impl<'a, L: LossLayer> Trainer<'a, L> {
    /// # Errors
    /// `ConfigurationError` unless `learning_rate` is finite and positive.
    pub fn new(network: Network<'a, L>, learning_rate: f64) -> Result<Self> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(CarouselError::config(format!(
                "learning rate must be finite and positive, got {learning_rate}"
            )));
        }
        Ok(Self {
            network,
            learning_rate,
            grad_clip_norm: None,
        })
    }

    /// Clip the accumulated gradient to `max_norm` before every update.
    pub fn with_grad_clip(mut self, max_norm: f64) -> Result<Self> {
        if !max_norm.is_finite() || max_norm <= 0.0 {
            return Err(CarouselError::config(format!(
                "max_norm must be finite and positive, got {max_norm}"
            )));
        }
        self.grad_clip_norm = Some(max_norm);
        Ok(self)
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn network(&self) -> &Network<'a, L> {
        &self.network
    }

    pub fn into_network(self) -> Network<'a, L> {
        self.network
    }

    /// Trains on one sequence and returns its loss before the update.
    ///
    /// Any gradient already accumulated on the parameters is committed
    /// together with this sequence's.
    ///
    /// # Errors
    /// `ShapeMismatch`, `LengthMismatch` or `EmptySequence`, detected before
    /// the network or parameters are touched.
    pub fn train_sequence<X: AsRef<[f64]>>(&mut self, inputs: &[X], targets: &[f64]) -> Result<f64> {
        self.validate_sequence(inputs, targets)?;

        self.load(inputs)?;
        let loss = self.network.compute_loss_and_gradients(targets)?;
        if let Some(max_norm) = self.grad_clip_norm {
            let norm = self.network.clip_grad_norm(max_norm)?;
            log::trace!("gradient norm {:.6e} clipped to {}", norm, max_norm);
        }
        self.network.apply_gradients(self.learning_rate)?;
        Ok(loss)
    }

    /// Runs `epochs` passes over `dataset`, returning the mean loss of each epoch.
    ///
    /// Every sequence is validated before the first update.
    pub fn fit<X: AsRef<[f64]>>(
        &mut self,
        dataset: &[(Vec<X>, Vec<f64>)],
        epochs: usize,
    ) -> Result<Vec<f64>> {
        if dataset.is_empty() {
            return Err(CarouselError::config("cannot fit on an empty dataset"));
        }
        for (inputs, targets) in dataset {
            self.validate_sequence(inputs, targets)?;
        }

        let mut history = Vec::with_capacity(epochs);
        for epoch in 1..=epochs {
            let mut total = 0.0;
            for (inputs, targets) in dataset {
                total += self.train_sequence(inputs, targets)?;
            }
            let mean = total / dataset.len() as f64;
            log::info!("Epoch {}/{}: loss={:.6e}", epoch, epochs, mean);
            history.push(mean);
        }
        Ok(history)
    }

    /// Runs the forward pass only and returns `h[0]` for every timestep.
    ///
    /// The sequence stays loaded in the network; accumulated gradients are
    /// not touched.
    pub fn predict<X: AsRef<[f64]>>(&mut self, inputs: &[X]) -> Result<Vec<f64>> {
        self.check_inputs(inputs)?;
        self.load(inputs)?;
        Ok(self.network.predictions())
    }

    fn load<X: AsRef<[f64]>>(&mut self, inputs: &[X]) -> Result<()> {
        self.network.clear_sequence();
        for x in inputs {
            self.network.add_input(x.as_ref())?;
        }
        Ok(())
    }

    fn check_inputs<X: AsRef<[f64]>>(&self, inputs: &[X]) -> Result<()> {
        let input_dim = self.network.params().input_dim();
        match inputs.iter().find(|x| x.as_ref().len() != input_dim) {
            Some(x) => Err(CarouselError::ShapeMismatch {
                expected: input_dim,
                actual: x.as_ref().len(),
            }),
            None => Ok(()),
        }
    }

    fn validate_sequence<X: AsRef<[f64]>>(&self, inputs: &[X], targets: &[f64]) -> Result<()> {
        self.check_inputs(inputs)?;
        if targets.len() != inputs.len() {
            return Err(CarouselError::LengthMismatch {
                expected: inputs.len(),
                actual: targets.len(),
            });
        }
        if inputs.is_empty() {
            return Err(CarouselError::EmptySequence);
        }
        Ok(())
    }
}
