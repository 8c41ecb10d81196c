//! A single unrolled timestep of the LSTM layer.
//!
//! This implements the matrix-formulated LSTM with a linear hidden readout.
//! With `xc = [x_t, h_{t-1}]`:
//! - Candidate: g_t = tanh(W_g xc + b_g)
//! - Input gate: i_t = σ(W_i xc + b_i)
//! - Forget gate: f_t = σ(W_f xc + b_f)
//! - Output gate: o_t = σ(W_o xc + b_o)
//! - Cell state: s_t = g_t * i_t + s_{t-1} * f_t
//! - Hidden state: h_t = s_t * o_t
//!
//! The backward step hands `ds * f` to the previous timestep as its cell-state
//! gradient, so error flows across timesteps scaled only by the forget gate.

use crate::{
    error::{CarouselError, Result},
    linalg::{add_outer, t_matvec_add},
    nn::params::{Gate, GateParams},
    ops::{add_assign, concat_into, dot, sigmoid, sigmoid_grad, tanh, tanh_grad},
};

/// Forward values and backward outputs for one timestep.
///
/// Every buffer is allocated once, when the node is created, and overwritten
/// in place by later passes at the same index.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    // Concatenation of x_t and h_{t-1}
    xc: Vec<f64>,

    g: Vec<f64>,
    i: Vec<f64>,
    f: Vec<f64>,
    o: Vec<f64>,
    s: Vec<f64>,
    h: Vec<f64>,

    // State captured from the previous timestep, reused by the backward step
    s_prev: Vec<f64>,
    h_prev: Vec<f64>,

    // Gradients destined for the previous timestep
    bottom_diff_h: Vec<f64>,
    bottom_diff_s: Vec<f64>,
}

impl Node {
    /// Creates a zeroed node for a layer of `cell_count` cells fed by inputs of length `input_dim`.
    pub fn new(cell_count: usize, input_dim: usize) -> Self {
        let zeros = || vec![0.0; cell_count];
        Self {
            xc: vec![0.0; input_dim + cell_count],
            g: zeros(),
            i: zeros(),
            f: zeros(),
            o: zeros(),
            s: zeros(),
            h: zeros(),
            s_prev: zeros(),
            h_prev: zeros(),
            bottom_diff_h: zeros(),
            bottom_diff_s: zeros(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.s.len()
    }

    pub fn input_dim(&self) -> usize {
        self.xc.len() - self.s.len()
    }

    /// The input vector `x_t` of the last forward pass.
    pub fn input(&self) -> &[f64] {
        &self.xc[..self.input_dim()]
    }

    pub fn xc(&self) -> &[f64] {
        &self.xc
    }

    /// Activations of `gate` from the last forward pass.
    pub fn gate(&self, gate: Gate) -> &[f64] {
        match gate {
            Gate::Candidate => &self.g,
            Gate::Input => &self.i,
            Gate::Forget => &self.f,
            Gate::Output => &self.o,
        }
    }

    /// Cell state `s_t`.
    pub fn cell_state(&self) -> &[f64] {
        &self.s
    }

    /// Hidden output `h_t`.
    pub fn hidden(&self) -> &[f64] {
        &self.h
    }

    pub fn s_prev(&self) -> &[f64] {
        &self.s_prev
    }

    pub fn h_prev(&self) -> &[f64] {
        &self.h_prev
    }

    /// Gradient of the loss with respect to `h_{t-1}`, set by the backward step.
    pub fn bottom_diff_h(&self) -> &[f64] {
        &self.bottom_diff_h
    }

    /// Gradient of the loss with respect to `s_{t-1}`, set by the backward step.
    pub fn bottom_diff_s(&self) -> &[f64] {
        &self.bottom_diff_s
    }

    /// Runs the forward step for input `x`.
    ///
    /// `prev` is the previous timestep's `(s, h)`; `None` means zero state.
    ///
    /// # Errors
    /// `ShapeMismatch` if `x.len()` differs from the layer's input dimension,
    /// or if either slice in `prev` is not `cell_count` long. The node is
    /// left untouched in that case.
    pub fn forward(
        &mut self,
        values: &GateParams,
        x: &[f64],
        prev: Option<(&[f64], &[f64])>,
    ) -> Result<()> {
        let input_dim = self.input_dim();
        if x.len() != input_dim {
            return Err(CarouselError::ShapeMismatch {
                expected: input_dim,
                actual: x.len(),
            });
        }
        if let Some((s_prev, h_prev)) = prev {
            let cell_count = self.cell_count();
            if let Some(bad) = [s_prev, h_prev].iter().find(|v| v.len() != cell_count) {
                return Err(CarouselError::ShapeMismatch {
                    expected: cell_count,
                    actual: bad.len(),
                });
            }
        }

        match prev {
            Some((s_prev, h_prev)) => {
                self.s_prev.copy_from_slice(s_prev);
                self.h_prev.copy_from_slice(h_prev);
            }
            None => {
                self.s_prev.fill(0.0);
                self.h_prev.fill(0.0);
            }
        }
        concat_into(x, &self.h_prev, &mut self.xc);

        for u in 0..self.cell_count() {
            self.g[u] = tanh(dot(values.wg.row(u), &self.xc) + values.bg[u]);
            self.i[u] = sigmoid(dot(values.wi.row(u), &self.xc) + values.bi[u]);
            self.f[u] = sigmoid(dot(values.wf.row(u), &self.xc) + values.bf[u]);
            self.o[u] = sigmoid(dot(values.wo.row(u), &self.xc) + values.bo[u]);
            self.s[u] = self.g[u] * self.i[u] + self.s_prev[u] * self.f[u];
            self.h[u] = self.s[u] * self.o[u];
        }
        Ok(())
    }

    /// Runs the backward step.
    ///
    /// `top_diff_h` is the gradient arriving at `h_t` (from the loss and from
    /// the next timestep); `top_diff_s` is the gradient arriving at `s_t` from
    /// the next timestep, zero at the last one. Parameter gradients are added
    /// into `grads`; the gradients for the previous timestep are stored in
    /// this node. Both top diffs must be `cell_count` long.
    pub(crate) fn backward(
        &mut self,
        values: &GateParams,
        grads: &mut GateParams,
        top_diff_h: &[f64],
        top_diff_s: &[f64],
    ) {
        let n = self.cell_count();
        debug_assert_eq!(top_diff_h.len(), n);
        debug_assert_eq!(top_diff_s.len(), n);

        let mut ds = vec![0.0; n];
        let mut di_input = vec![0.0; n];
        let mut df_input = vec![0.0; n];
        let mut do_input = vec![0.0; n];
        let mut dg_input = vec![0.0; n];

        for u in 0..n {
            ds[u] = self.o[u] * top_diff_h[u] + top_diff_s[u];
            let d_o = self.s[u] * top_diff_h[u];
            let di = self.g[u] * ds[u];
            let dg = self.i[u] * ds[u];
            let df = self.s_prev[u] * ds[u];

            // w.r.t. the pre-activations
            di_input[u] = sigmoid_grad(self.i[u]) * di;
            df_input[u] = sigmoid_grad(self.f[u]) * df;
            do_input[u] = sigmoid_grad(self.o[u]) * d_o;
            dg_input[u] = tanh_grad(self.g[u]) * dg;
        }

        add_outer(&mut grads.wi, &di_input, &self.xc);
        add_outer(&mut grads.wf, &df_input, &self.xc);
        add_outer(&mut grads.wo, &do_input, &self.xc);
        add_outer(&mut grads.wg, &dg_input, &self.xc);
        add_assign(&mut grads.bi, &di_input);
        add_assign(&mut grads.bf, &df_input);
        add_assign(&mut grads.bo, &do_input);
        add_assign(&mut grads.bg, &dg_input);

        let mut dxc = vec![0.0; self.xc.len()];
        t_matvec_add(&values.wi, &di_input, &mut dxc);
        t_matvec_add(&values.wf, &df_input, &mut dxc);
        t_matvec_add(&values.wo, &do_input, &mut dxc);
        t_matvec_add(&values.wg, &dg_input, &mut dxc);

        for u in 0..n {
            self.bottom_diff_s[u] = ds[u] * self.f[u];
        }
        let input_dim = self.input_dim();
        self.bottom_diff_h.copy_from_slice(&dxc[input_dim..]);
    }
}
