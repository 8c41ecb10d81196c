//! The sequence controller: unrolls the LSTM over a growable input sequence
//! and runs full backpropagation through time against a target sequence.
//!
//! # Usage Example
//! ```
//! use carousel::nn::{Network, ParameterSet};
//!
//! let mut params = ParameterSet::new(2, 1, 42).unwrap();
//! let mut net = Network::new(&mut params);
//!
//! for _ in 0..10 {
//!     for x in [1.0, 0.5, -0.5] {
//!         net.add_input(&[x]).unwrap();
//!     }
//!     let loss = net.compute_loss_and_gradients(&[0.2, 0.1, 0.05]).unwrap();
//!     assert!(loss.is_finite());
//!     net.apply_gradients(0.1).unwrap();
//!     net.clear_sequence();
//! }
//! ```

use crate::{
    error::{CarouselError, Result},
    nn::{
        layers::lstm::Node,
        losses::{LossLayer, ProductSquareLoss},
        params::ParameterSet,
    },
    ops::add_assign,
};

/// An unrolled single-layer LSTM.
///
/// The network borrows its [`ParameterSet`] mutably for its whole lifetime,
/// so exactly one training cycle can touch a given set of parameters at a
/// time. Node storage only ever grows: after [`clear_sequence`](Self::clear_sequence)
/// the nodes are kept and overwritten by the next sequence.
#[derive(Debug)]
pub struct Network<'a, L: LossLayer = ProductSquareLoss> {
    params: &'a mut ParameterSet,
    nodes: Vec<Node>,
    len: usize,
    loss: L,
    top_diff_h: Vec<f64>,
    top_diff_s: Vec<f64>,
}

impl<'a> Network<'a, ProductSquareLoss> {
    /// Creates an empty network using the default [`ProductSquareLoss`].
    pub fn new(params: &'a mut ParameterSet) -> Self {
        Self::with_loss(params, ProductSquareLoss)
    }
}

impl<'a, L: LossLayer> Network<'a, L> {
    /// Creates an empty network with a custom loss.
    pub fn with_loss(params: &'a mut ParameterSet, loss: L) -> Self {
        let cell_count = params.cell_count();
        Self {
            params,
            nodes: Vec::new(),
            len: 0,
            loss,
            top_diff_h: vec![0.0; cell_count],
            top_diff_s: vec![0.0; cell_count],
        }
    }

    /// Appends `x` to the sequence and runs the forward step for it.
    ///
    /// # Errors
    /// `ShapeMismatch` if `x.len()` differs from the input dimension. The
    /// sequence is unchanged in that case.
    pub fn add_input(&mut self, x: &[f64]) -> Result<()> {
        let input_dim = self.params.input_dim();
        if x.len() != input_dim {
            return Err(CarouselError::ShapeMismatch {
                expected: input_dim,
                actual: x.len(),
            });
        }

        let idx = self.len;
        if idx == self.nodes.len() {
            self.nodes
                .push(Node::new(self.params.cell_count(), input_dim));
            log::debug!("node storage grown to {}", self.nodes.len());
        }

        let values = self.params.values();
        if idx == 0 {
            self.nodes[0].forward(values, x, None)?;
        } else {
            let (head, tail) = self.nodes.split_at_mut(idx);
            let prev = &head[idx - 1];
            tail[0].forward(values, x, Some((prev.cell_state(), prev.hidden())))?;
        }
        self.len += 1;
        Ok(())
    }

    /// Runs the backward sweep over the whole sequence against `targets`,
    /// adding every timestep's parameter gradients into the accumulators.
    /// Returns the summed loss.
    ///
    /// Parameters are not updated; call [`apply_gradients`](Self::apply_gradients)
    /// to commit.
    ///
    /// # Errors
    /// `LengthMismatch` if `targets.len() != self.len()`, then
    /// `EmptySequence` if the sequence is empty. Nothing is accumulated in
    /// either case.
    pub fn compute_loss_and_gradients(&mut self, targets: &[f64]) -> Result<f64> {
        if targets.len() != self.len {
            return Err(CarouselError::LengthMismatch {
                expected: self.len,
                actual: targets.len(),
            });
        }
        if self.len == 0 {
            return Err(CarouselError::EmptySequence);
        }

        let (values, grads) = self.params.split_mut();
        let mut loss = 0.0;
        for t in (0..self.len).rev() {
            let (head, tail) = self.nodes.split_at_mut(t + 1);
            let node = &mut head[t];

            self.loss
                .bottom_diff(node.hidden(), targets[t], &mut self.top_diff_h);
            if t + 1 < self.len {
                let next = &tail[0];
                add_assign(&mut self.top_diff_h, next.bottom_diff_h());
                self.top_diff_s.copy_from_slice(next.bottom_diff_s());
            } else {
                self.top_diff_s.fill(0.0);
            }

            node.backward(values, grads, &self.top_diff_h, &self.top_diff_s);
            loss += self.loss.loss(node.hidden(), targets[t]);
        }

        log::trace!("backward sweep over {} steps, loss={:.6e}", self.len, loss);
        Ok(loss)
    }

    /// Empties the sequence. Node storage is kept for reuse.
    pub fn clear_sequence(&mut self) {
        self.len = 0;
    }

    /// Commits the accumulated gradients; see [`ParameterSet::apply_gradients`].
    pub fn apply_gradients(&mut self, learning_rate: f64) -> Result<()> {
        self.params.apply_gradients(learning_rate)
    }

    /// Rescales the accumulated gradient; see [`ParameterSet::clip_grad_norm`].
    pub fn clip_grad_norm(&mut self, max_norm: f64) -> Result<f64> {
        self.params.clip_grad_norm(max_norm)
    }

    /// Number of inputs added since the last clear.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes ever allocated.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// The node for timestep `t` of the current sequence.
    pub fn node(&self, t: usize) -> Option<&Node> {
        self.nodes[..self.len].get(t)
    }

    /// Nodes of the current sequence, in order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes[..self.len]
    }

    /// Hidden outputs of the current sequence, in order.
    pub fn hidden_states(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.nodes().iter().map(Node::hidden)
    }

    /// The prediction channel `h[0]` for every timestep of the current sequence.
    pub fn predictions(&self) -> Vec<f64> {
        self.hidden_states().map(|h| h[0]).collect()
    }

    pub fn params(&self) -> &ParameterSet {
        &*self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterSet {
        &mut *self.params
    }

    pub fn loss_layer(&self) -> &L {
        &self.loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{losses::SquaredErrorLoss, params::Gate};
    use approx::assert_relative_eq;

    #[test]
    fn test_add_input_chains_state() {
        let mut params = ParameterSet::new(3, 2, 1).unwrap();
        let mut net = Network::new(&mut params);
        net.add_input(&[1.0, 0.0]).unwrap();
        net.add_input(&[0.0, 1.0]).unwrap();

        assert_eq!(net.len(), 2);
        let (first, second) = (net.node(0).unwrap(), net.node(1).unwrap());
        assert_eq!(first.s_prev(), &[0.0; 3]);
        assert_eq!(second.s_prev(), first.cell_state());
        assert_eq!(second.h_prev(), first.hidden());
        assert_eq!(&second.xc()[2..], first.hidden());
        assert!(net.node(2).is_none());
    }

    #[test]
    fn test_add_input_shape_mismatch_is_atomic() {
        let mut params = ParameterSet::new(2, 2, 1).unwrap();
        let mut net = Network::new(&mut params);
        net.add_input(&[1.0, 1.0]).unwrap();

        let err = net.add_input(&[1.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            CarouselError::ShapeMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(net.len(), 1);
        assert_eq!(net.capacity(), 1);
    }

    #[test]
    fn test_compute_rejects_length_mismatch() {
        let mut params = ParameterSet::new(2, 1, 1).unwrap();
        let mut net = Network::new(&mut params);
        net.add_input(&[1.0]).unwrap();
        net.add_input(&[2.0]).unwrap();

        assert_eq!(
            net.compute_loss_and_gradients(&[0.1]),
            Err(CarouselError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert!(net.params().grads().is_zero());
    }

    #[test]
    fn test_compute_rejects_empty_sequence() {
        let mut params = ParameterSet::new(2, 1, 1).unwrap();
        let mut net = Network::new(&mut params);
        assert_eq!(
            net.compute_loss_and_gradients(&[]),
            Err(CarouselError::EmptySequence)
        );
        assert!(net.params().grads().is_zero());

        // A non-empty target list against an empty sequence is a length problem.
        assert!(matches!(
            net.compute_loss_and_gradients(&[1.0]),
            Err(CarouselError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_capacity_is_retained_across_clears() {
        let mut params = ParameterSet::new(2, 1, 3).unwrap();
        let mut net = Network::new(&mut params);
        for x in [0.1, 0.2, 0.3, 0.4] {
            net.add_input(&[x]).unwrap();
        }
        assert_eq!(net.capacity(), 4);

        net.clear_sequence();
        assert!(net.is_empty());
        assert_eq!(net.capacity(), 4);
        assert!(net.nodes().is_empty());

        net.add_input(&[0.5]).unwrap();
        net.add_input(&[0.6]).unwrap();
        assert_eq!(net.capacity(), 4);
        assert_eq!(net.len(), 2);
        assert_eq!(net.node(1).unwrap().input(), &[0.6]);
    }

    #[test]
    fn test_stale_nodes_do_not_leak_into_backward() {
        let mut a = ParameterSet::new(2, 1, 12).unwrap();
        let mut b = a.clone();

        // `a` first sees a longer sequence, leaving stale nodes beyond the new length.
        let mut net_a = Network::new(&mut a);
        for x in [5.0, -5.0, 5.0] {
            net_a.add_input(&[x]).unwrap();
        }
        net_a.compute_loss_and_gradients(&[1.0, 1.0, 1.0]).unwrap();
        net_a.params_mut().zero_grad();
        net_a.clear_sequence();
        net_a.add_input(&[0.3]).unwrap();
        net_a.add_input(&[0.7]).unwrap();
        let loss_a = net_a.compute_loss_and_gradients(&[0.2, 0.4]).unwrap();

        let mut net_b = Network::new(&mut b);
        net_b.add_input(&[0.3]).unwrap();
        net_b.add_input(&[0.7]).unwrap();
        let loss_b = net_b.compute_loss_and_gradients(&[0.2, 0.4]).unwrap();

        assert_eq!(loss_a, loss_b);
        assert_eq!(net_a.params().grads(), net_b.params().grads());
    }

    #[test]
    fn test_custom_loss_and_predictions() {
        let mut params = ParameterSet::new(2, 1, 5).unwrap();
        let mut net = Network::with_loss(&mut params, SquaredErrorLoss);
        net.add_input(&[1.0]).unwrap();
        net.add_input(&[-1.0]).unwrap();

        let preds = net.predictions();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[1], net.node(1).unwrap().hidden()[0]);

        let expected: f64 = preds
            .iter()
            .zip([0.5, -0.5])
            .map(|(p, y)| (p - y) * (p - y))
            .sum();
        let loss = net.compute_loss_and_gradients(&[0.5, -0.5]).unwrap();
        assert_relative_eq!(loss, expected, epsilon = 1e-15);
        assert!(!net.params().grads().weight(Gate::Output).as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_last_step_gets_no_cell_gradient_from_beyond() {
        let mut params = ParameterSet::new(1, 1, 2).unwrap();
        let mut net = Network::with_loss(&mut params, SquaredErrorLoss);
        net.add_input(&[1.0]).unwrap();
        net.compute_loss_and_gradients(&[0.0]).unwrap();

        // ds = o * dh at the last step, so bottom_diff_s = o * dh * f.
        let node = net.node(0).unwrap();
        let dh = 2.0 * node.hidden()[0];
        let expected = node.gate(Gate::Output)[0] * dh * node.gate(Gate::Forget)[0];
        assert_relative_eq!(node.bottom_diff_s()[0], expected, epsilon = 1e-15);
    }
}
