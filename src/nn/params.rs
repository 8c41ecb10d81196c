//! The trainable state of an LSTM layer: four gate weight matrices, four
//! bias vectors, and gradient accumulators of the same shapes.

use crate::{
    error::{CarouselError, Result},
    linalg::Matrix,
    nn::init::Initializer,
    ops::sum_squares,
};
use rand::{rngs::StdRng, SeedableRng};

/// One of the four gated signals of an LSTM cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Candidate cell input `g` (tanh).
    Candidate,
    /// Input gate `i` (sigmoid).
    Input,
    /// Forget gate `f` (sigmoid).
    Forget,
    /// Output gate `o` (sigmoid).
    Output,
}

impl Gate {
    pub const ALL: [Gate; 4] = [Gate::Candidate, Gate::Input, Gate::Forget, Gate::Output];
}

/// Weights and biases for the four gates.
///
/// Used both for the parameter values and for their gradient accumulators.
/// Each weight matrix is `[cell_count][input_dim + cell_count]`; each bias
/// has length `cell_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct GateParams {
    pub wg: Matrix,
    pub wi: Matrix,
    pub wf: Matrix,
    pub wo: Matrix,
    pub bg: Vec<f64>,
    pub bi: Vec<f64>,
    pub bf: Vec<f64>,
    pub bo: Vec<f64>,
}

impl GateParams {
    /// All-zero parameters.
    pub fn zeros(cell_count: usize, concat_len: usize) -> Self {
        Self {
            wg: Matrix::zeros(cell_count, concat_len),
            wi: Matrix::zeros(cell_count, concat_len),
            wf: Matrix::zeros(cell_count, concat_len),
            wo: Matrix::zeros(cell_count, concat_len),
            bg: vec![0.0; cell_count],
            bi: vec![0.0; cell_count],
            bf: vec![0.0; cell_count],
            bo: vec![0.0; cell_count],
        }
    }

    pub fn weight(&self, gate: Gate) -> &Matrix {
        match gate {
            Gate::Candidate => &self.wg,
            Gate::Input => &self.wi,
            Gate::Forget => &self.wf,
            Gate::Output => &self.wo,
        }
    }

    pub fn weight_mut(&mut self, gate: Gate) -> &mut Matrix {
        match gate {
            Gate::Candidate => &mut self.wg,
            Gate::Input => &mut self.wi,
            Gate::Forget => &mut self.wf,
            Gate::Output => &mut self.wo,
        }
    }

    pub fn bias(&self, gate: Gate) -> &[f64] {
        match gate {
            Gate::Candidate => &self.bg,
            Gate::Input => &self.bi,
            Gate::Forget => &self.bf,
            Gate::Output => &self.bo,
        }
    }

    pub fn bias_mut(&mut self, gate: Gate) -> &mut [f64] {
        match gate {
            Gate::Candidate => &mut self.bg,
            Gate::Input => &mut self.bi,
            Gate::Forget => &mut self.bf,
            Gate::Output => &mut self.bo,
        }
    }

    /// Every parameter block, weights first, in `g, i, f, o` order.
    pub fn blocks(&self) -> [&[f64]; 8] {
        [
            self.wg.as_slice(),
            self.wi.as_slice(),
            self.wf.as_slice(),
            self.wo.as_slice(),
            &self.bg,
            &self.bi,
            &self.bf,
            &self.bo,
        ]
    }

    pub fn blocks_mut(&mut self) -> [&mut [f64]; 8] {
        [
            self.wg.as_mut_slice(),
            self.wi.as_mut_slice(),
            self.wf.as_mut_slice(),
            self.wo.as_mut_slice(),
            &mut self.bg,
            &mut self.bi,
            &mut self.bf,
            &mut self.bo,
        ]
    }

    /// Total number of scalars.
    pub fn len(&self) -> usize {
        self.blocks().iter().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets every scalar to zero.
    pub fn zero(&mut self) {
        for block in self.blocks_mut() {
            block.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// True if every scalar is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.blocks().iter().all(|b| b.iter().all(|&v| v == 0.0))
    }

    /// Euclidean norm over every scalar.
    pub fn norm(&self) -> f64 {
        self.blocks().iter().map(|b| sum_squares::<f64>(b)).sum::<f64>().sqrt()
    }

    /// Multiplies every scalar by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for block in self.blocks_mut() {
            block.iter_mut().for_each(|v| *v *= factor);
        }
    }
}

/// Shape, seed and initialization scheme of a [`ParameterSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct LstmConfig {
    /// Number of memory cells (hidden units).
    pub cell_count: usize,
    /// Length of each input vector.
    pub input_dim: usize,
    /// Seed for the weight RNG.
    pub seed: u64,
    pub init: Initializer,
}

impl LstmConfig {
    pub fn new(cell_count: usize, input_dim: usize) -> Self {
        Self {
            cell_count,
            input_dim,
            seed: 0,
            init: Initializer::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_init(mut self, init: Initializer) -> Self {
        self.init = init;
        self
    }

    /// Rejects zero dimensions and invalid initializer parameters.
    pub fn validate(&self) -> Result<()> {
        if self.cell_count == 0 {
            return Err(CarouselError::config("cell_count must be positive"));
        }
        if self.input_dim == 0 {
            return Err(CarouselError::config("input_dim must be positive"));
        }
        self.init.validate()
    }
}

/// Parameters of a single LSTM layer together with their gradient accumulators.
///
/// The accumulators are zero after construction and after every
/// [`apply_gradients`](Self::apply_gradients); in between they hold the sum
/// of every backward step run against this set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    cell_count: usize,
    input_dim: usize,
    values: GateParams,
    grads: GateParams,
}

impl ParameterSet {
    /// Creates a parameter set with every weight and bias drawn uniformly
    /// from `[-0.1, 0.1)` using `seed`.
    ///
    /// # Errors
    /// `ConfigurationError` if `cell_count` or `input_dim` is zero.
    pub fn new(cell_count: usize, input_dim: usize, seed: u64) -> Result<Self> {
        Self::from_config(&LstmConfig::new(cell_count, input_dim).with_seed(seed))
    }

    pub fn from_config(config: &LstmConfig) -> Result<Self> {
        config.validate()?;
        let concat_len = config.input_dim + config.cell_count;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut values = GateParams::zeros(config.cell_count, concat_len);
        for block in values.blocks_mut() {
            config.init.initialize(block, &mut rng)?;
        }

        log::debug!(
            "initialized LSTM parameters: cell_count={}, input_dim={}, seed={}",
            config.cell_count,
            config.input_dim,
            config.seed
        );

        Ok(Self {
            cell_count: config.cell_count,
            input_dim: config.input_dim,
            values,
            grads: GateParams::zeros(config.cell_count, concat_len),
        })
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Length of the concatenated `[x, h_prev]` vector.
    pub fn concat_len(&self) -> usize {
        self.input_dim + self.cell_count
    }

    pub fn values(&self) -> &GateParams {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut GateParams {
        &mut self.values
    }

    pub fn grads(&self) -> &GateParams {
        &self.grads
    }

    /// Borrows the values for reading and the accumulators for writing at once.
    pub(crate) fn split_mut(&mut self) -> (&GateParams, &mut GateParams) {
        (&self.values, &mut self.grads)
    }

    /// Discards every accumulated gradient.
    pub fn zero_grad(&mut self) {
        self.grads.zero();
    }

    /// Euclidean norm of the accumulated gradient.
    pub fn grad_norm(&self) -> f64 {
        self.grads.norm()
    }

    /// Rescales the accumulated gradient so its norm is at most `max_norm`.
    /// Returns the norm before clipping.
    ///
    /// # Errors
    /// `ConfigurationError` if `max_norm` is not finite and positive.
    pub fn clip_grad_norm(&mut self, max_norm: f64) -> Result<f64> {
        if !max_norm.is_finite() || max_norm <= 0.0 {
            return Err(CarouselError::config(format!(
                "max_norm must be finite and positive, got {max_norm}"
            )));
        }
        let norm = self.grad_norm();
        if norm > max_norm {
            self.grads.scale(max_norm / norm);
        }
        Ok(norm)
    }

    /// Gradient-descent update `v -= learning_rate * dv` for every scalar,
    /// followed by zeroing the accumulators.
    ///
    /// # Errors
    /// `ConfigurationError` if `learning_rate` is not finite. Nothing is
    /// modified in that case.
    pub fn apply_gradients(&mut self, learning_rate: f64) -> Result<()> {
        if !learning_rate.is_finite() {
            return Err(CarouselError::config(format!(
                "learning rate must be finite, got {learning_rate}"
            )));
        }

        log::debug!(
            "applying gradients: lr={}, grad_norm={:.6e}",
            learning_rate,
            self.grads.norm()
        );

        for (values, grads) in self.values.blocks_mut().into_iter().zip(self.grads.blocks()) {
            for (v, &d) in values.iter_mut().zip(grads) {
                *v -= learning_rate * d;
            }
        }
        self.grads.zero();
        Ok(())
    }
}
