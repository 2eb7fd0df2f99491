use crate::activation::sigmoid_grad_from_output;
use crate::data::Samples;
use crate::topology::{self, LayerSpec};
use crate::train::FitReport;
use crate::{Error, Layer, Result};

/// Step size used by `backprop` unless the network was built with another one.
pub const DEFAULT_LEARNING_RATE: f32 = 0.5;

/// Width of the input/output trace slots before the network is bound to data.
pub const PLACEHOLDER_WIDTH: usize = 2;

/// A feed-forward sigmoid network.
///
/// Hidden layer sizes are fixed at construction. Input and output widths are
/// bound later (by `fit`, or explicitly via `bind`), which also allocates the
/// zero-initialized weight matrices.
#[derive(Debug, Clone)]
pub struct Mlp {
    hidden: Vec<usize>,
    learning_rate: f32,
    /// Empty while unbound; otherwise one layer per transition.
    layers: Vec<Layer>,
    /// Activations of the latest forward pass: `[input, hidden..., output]`.
    trace: Vec<Vec<f32>>,
    /// Backprop intermediate: delta of each layer's output (`layers.len()` entries).
    deltas: Vec<Vec<f32>>,
    pub(crate) last_fit: Option<FitReport>,
}

impl Mlp {
    /// Declare a network by its hidden layers.
    ///
    /// ```rust
    /// use splearn::{LayerSpec, Mlp};
    ///
    /// # fn main() -> splearn::Result<()> {
    /// let a = Mlp::new(9_usize)?; // 5 hidden layers of 9
    /// let b = Mlp::new(LayerSpec::uniform(9, 2))?; // 2 hidden layers of 9
    /// let c = Mlp::new([3_usize, 1, 4])?;
    /// assert_eq!(a.hidden_sizes(), &[9, 9, 9, 9, 9]);
    /// assert_eq!(b.hidden_sizes(), &[9, 9]);
    /// assert_eq!(c.hidden_sizes(), &[3, 1, 4]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(spec: impl Into<LayerSpec>) -> Result<Self> {
        Self::with_learning_rate(spec, DEFAULT_LEARNING_RATE)
    }

    pub fn with_learning_rate(spec: impl Into<LayerSpec>, learning_rate: f32) -> Result<Self> {
        check_learning_rate(learning_rate)?;
        let hidden = spec.into().hidden_sizes()?;
        let trace = placeholder_trace(&hidden);

        Ok(Self {
            hidden,
            learning_rate,
            layers: Vec::new(),
            trace,
            deltas: Vec::new(),
            last_fit: None,
        })
    }

    #[inline]
    pub fn hidden_sizes(&self) -> &[usize] {
        &self.hidden
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Number of weight matrices (layer transitions), bound or not.
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.hidden.len() + 1
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        !self.layers.is_empty()
    }

    #[inline]
    pub fn input_dim(&self) -> Option<usize> {
        self.layers.first().map(Layer::in_dim)
    }

    #[inline]
    pub fn output_dim(&self) -> Option<usize> {
        self.layers.last().map(Layer::out_dim)
    }

    /// Full size list `[input, hidden..., output]` once bound.
    pub fn sizes(&self) -> Option<Vec<usize>> {
        let input = self.input_dim()?;
        let output = self.output_dim()?;
        topology::bind_sizes(&self.hidden, input, output).ok()
    }

    /// Outcome of the most recent successful `fit`.
    #[inline]
    pub fn last_fit(&self) -> Option<&FitReport> {
        self.last_fit.as_ref()
    }

    /// Activations recorded by the latest forward pass, input slot first.
    ///
    /// Zero-filled until the first forward pass after a bind.
    #[inline]
    pub fn trace(&self) -> &[Vec<f32>] {
        &self.trace
    }

    /// Fix the input/output widths and zero every weight.
    ///
    /// Once bound, the widths can only change after `reset`. Binding again with
    /// the same widths restarts from zero weights.
    pub fn bind(&mut self, input_dim: usize, output_dim: usize) -> Result<()> {
        if let (Some(in_dim), Some(out_dim)) = (self.input_dim(), self.output_dim()) {
            if (in_dim, out_dim) != (input_dim, output_dim) {
                return Err(Error::InvalidShape(format!(
                    "network is bound to {in_dim} inputs / {out_dim} outputs, \
                     got {input_dim} / {output_dim}; call reset() to rebind"
                )));
            }
        }

        let sizes = topology::bind_sizes(&self.hidden, input_dim, output_dim)?;
        self.layers = sizes.windows(2).map(|w| Layer::zeros(w[0], w[1])).collect();
        self.trace = zeroed_trace(&sizes);
        self.deltas = zeroed_trace(&sizes[1..]);
        self.last_fit = None;

        log::debug!("bound network sizes={sizes:?}");
        Ok(())
    }

    /// Drop the weights and return to the unbound state.
    pub fn reset(&mut self) {
        self.layers.clear();
        self.deltas.clear();
        self.trace = placeholder_trace(&self.hidden);
        self.last_fit = None;
    }

    pub fn layer(&self, idx: usize) -> Result<&Layer> {
        if !self.is_bound() {
            return Err(Error::NotFitted);
        }
        self.layers.get(idx).ok_or_else(|| {
            Error::InvalidShape(format!(
                "weight index {idx} out of range; network has {} weight matrices",
                self.layers.len()
            ))
        })
    }

    /// `(rows, cols)` of weight matrix `idx`, bias column included.
    pub fn weight_shape(&self, idx: usize) -> Result<(usize, usize)> {
        Ok(self.layer(idx)?.shape())
    }

    /// Row-major weights of matrix `idx`.
    pub fn weights(&self, idx: usize) -> Result<&[f32]> {
        Ok(self.layer(idx)?.weights())
    }

    /// Overwrite weight matrix `idx` with a row-major buffer of the same shape.
    pub fn set_weights(&mut self, idx: usize, weights: &[f32]) -> Result<()> {
        let (rows, cols) = self.weight_shape(idx)?;
        if weights.len() != rows * cols {
            return Err(Error::InvalidShape(format!(
                "weight matrix {idx} has shape ({rows}, {cols}), got {} values",
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::InvalidData(
                "weights must contain only finite values".to_owned(),
            ));
        }

        self.layers[idx].weights_mut().copy_from_slice(weights);
        Ok(())
    }

    /// Forward pass for a single sample, recorded in the trace.
    ///
    /// Returns the output activations.
    pub fn forward(&mut self, input: &[f32]) -> Result<&[f32]> {
        self.check_input(input)?;
        Ok(run_forward(&self.layers, input, &mut self.trace))
    }

    /// One backpropagation step against `expected`, using the trace of the
    /// latest `forward`. Updates every weight matrix in place.
    pub fn backprop(&mut self, expected: &[f32]) -> Result<()> {
        self.backprop_with_rate(expected, self.learning_rate)
    }

    pub(crate) fn backprop_with_rate(&mut self, expected: &[f32], lr: f32) -> Result<()> {
        let output_dim = self.output_dim().ok_or(Error::NotFitted)?;
        if expected.len() != output_dim {
            return Err(Error::InvalidShape(format!(
                "expected len {} does not match output width {output_dim}",
                expected.len()
            )));
        }

        let last = self.layers.len() - 1;
        for ((d, &y), &t) in self.deltas[last]
            .iter_mut()
            .zip(&self.trace[last + 1])
            .zip(expected)
        {
            *d = (t - y) * sigmoid_grad_from_output(y);
        }

        for idx in (0..self.layers.len()).rev() {
            if idx > 0 {
                // Deltas for layer idx-1 use the weights before this step's update.
                let (left, right) = self.deltas.split_at_mut(idx);
                let prev = &mut left[idx - 1];
                self.layers[idx].propagate(&right[0], prev);
                for (d, &a) in prev.iter_mut().zip(&self.trace[idx]) {
                    *d *= sigmoid_grad_from_output(a);
                }
            }
            self.layers[idx].apply_deltas(&self.trace[idx], &self.deltas[idx], lr);
        }

        Ok(())
    }

    /// Predict outputs for every row of `inputs`. Never mutates the network.
    pub fn predict(&self, inputs: &Samples) -> Result<Vec<Vec<f32>>> {
        let input_dim = self.input_dim().ok_or(Error::NotFitted)?;
        if inputs.width() != input_dim {
            return Err(Error::InvalidShape(format!(
                "inputs width {} does not match input width {input_dim}",
                inputs.width()
            )));
        }

        let mut trace = self.fresh_trace();
        Ok(inputs
            .rows()
            .map(|row| run_forward(&self.layers, row, &mut trace).to_vec())
            .collect())
    }

    pub fn predict_one(&self, input: &[f32]) -> Result<Vec<f32>> {
        self.check_input(input)?;
        let mut trace = self.fresh_trace();
        Ok(run_forward(&self.layers, input, &mut trace).to_vec())
    }

    /// Zero every trace slot, keeping the bound widths.
    pub(crate) fn clear_trace(&mut self) {
        for slot in &mut self.trace {
            slot.fill(0.0);
        }
    }

    pub(crate) fn fresh_trace(&self) -> Vec<Vec<f32>> {
        let mut trace = Vec::with_capacity(self.trace.len());
        trace.extend(self.trace.iter().map(|slot| vec![0.0; slot.len()]));
        trace
    }

    pub(crate) fn forward_detached<'a>(
        &self,
        input: &[f32],
        trace: &'a mut [Vec<f32>],
    ) -> &'a [f32] {
        run_forward(&self.layers, input, trace)
    }

    fn check_input(&self, input: &[f32]) -> Result<()> {
        let input_dim = self.input_dim().ok_or(Error::NotFitted)?;
        if input.len() != input_dim {
            return Err(Error::InvalidShape(format!(
                "input len {} does not match input width {input_dim}",
                input.len()
            )));
        }
        Ok(())
    }
}

fn run_forward<'a>(layers: &[Layer], input: &[f32], trace: &'a mut [Vec<f32>]) -> &'a [f32] {
    debug_assert_eq!(trace.len(), layers.len() + 1);

    trace[0].copy_from_slice(input);
    for (idx, layer) in layers.iter().enumerate() {
        // Borrow the previous activation immutably and the next one mutably.
        let (left, right) = trace.split_at_mut(idx + 1);
        layer.forward(&left[idx], &mut right[0]);
    }

    &trace[layers.len()]
}

fn zeroed_trace(sizes: &[usize]) -> Vec<Vec<f32>> {
    sizes.iter().map(|&n| vec![0.0; n]).collect()
}

fn placeholder_trace(hidden: &[usize]) -> Vec<Vec<f32>> {
    let mut trace = Vec::with_capacity(hidden.len() + 2);
    trace.push(vec![0.0; PLACEHOLDER_WIDTH]);
    trace.extend(hidden.iter().map(|&n| vec![0.0; n]));
    trace.push(vec![0.0; PLACEHOLDER_WIDTH]);
    trace
}

pub(crate) fn check_learning_rate(lr: f32) -> Result<()> {
    if !(lr.is_finite() && lr > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and > 0, got {lr}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(hidden: &[usize], input_dim: usize, output_dim: usize) -> Mlp {
        let mut mlp = Mlp::new(hidden).unwrap();
        mlp.bind(input_dim, output_dim).unwrap();
        mlp
    }

    // Deterministic, non-trivial weights in [-0.5, 0.5].
    fn spread_weights(mlp: &mut Mlp) {
        for idx in 0..mlp.num_layers() {
            let (rows, cols) = mlp.weight_shape(idx).unwrap();
            let w: Vec<f32> = (0..rows * cols)
                .map(|p| ((p * 7 + idx * 3) % 11) as f32 / 10.0 - 0.5)
                .collect();
            mlp.set_weights(idx, &w).unwrap();
        }
    }

    fn half_sq_error(mlp: &mut Mlp, input: &[f32], target: &[f32]) -> f32 {
        let y = mlp.forward(input).unwrap();
        0.5 * y.iter().zip(target).map(|(y, t)| (t - y) * (t - y)).sum::<f32>()
    }

    fn assert_close(analytic: f32, numeric: f32, abs_tol: f32, rel_tol: f32) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    #[test]
    fn unbound_trace_has_placeholder_brackets() {
        let mlp = Mlp::new([3_usize, 4]).unwrap();
        let widths: Vec<usize> = mlp.trace().iter().map(Vec::len).collect();
        assert_eq!(widths, vec![PLACEHOLDER_WIDTH, 3, 4, PLACEHOLDER_WIDTH]);
        assert!(mlp.trace().iter().flatten().all(|&v| v == 0.0));
        assert!(!mlp.is_bound());
        assert_eq!(mlp.num_layers(), 3);
    }

    #[test]
    fn bind_allocates_zeroed_weights_per_transition() {
        let mlp = bound(&[9, 9, 9], 2, 3);
        assert_eq!(mlp.sizes(), Some(vec![2, 9, 9, 9, 3]));
        assert_eq!(mlp.weight_shape(0).unwrap(), (9, 3));
        assert_eq!(mlp.weight_shape(1).unwrap(), (9, 10));
        assert_eq!(mlp.weight_shape(3).unwrap(), (3, 10));
        assert!(mlp.weight_shape(4).is_err());
        for idx in 0..mlp.num_layers() {
            assert!(mlp.weights(idx).unwrap().iter().all(|&w| w == 0.0));
        }
    }

    #[test]
    fn rebinding_requires_same_widths_until_reset() {
        let mut mlp = bound(&[2], 2, 2);
        assert!(matches!(mlp.bind(3, 2), Err(Error::InvalidShape(_))));
        assert_eq!(mlp.input_dim(), Some(2));

        mlp.reset();
        assert!(!mlp.is_bound());
        mlp.bind(3, 1).unwrap();
        assert_eq!(mlp.sizes(), Some(vec![3, 2, 1]));
    }

    #[test]
    fn unbound_network_reports_not_fitted() {
        let mut mlp = Mlp::new(2_usize).unwrap();
        assert_eq!(mlp.forward(&[0.0, 0.0]).unwrap_err(), Error::NotFitted);
        assert_eq!(mlp.backprop(&[0.0, 0.0]).unwrap_err(), Error::NotFitted);
        assert_eq!(mlp.weights(0).unwrap_err(), Error::NotFitted);
        assert_eq!(mlp.predict_one(&[0.0]).unwrap_err(), Error::NotFitted);
    }

    #[test]
    fn set_weights_validates_length_and_values() {
        let mut mlp = bound(&[2], 2, 2);
        assert!(mlp.set_weights(0, &[0.0; 5]).is_err());
        assert!(mlp.set_weights(2, &[0.0; 6]).is_err());
        assert!(mlp.set_weights(0, &[f32::INFINITY; 6]).is_err());
        mlp.set_weights(1, &[1.0; 6]).unwrap();
        assert_eq!(mlp.weights(1).unwrap(), &[1.0; 6]);
    }

    #[test]
    fn forward_rejects_wrong_width_without_touching_trace() {
        let mut mlp = bound(&[2], 2, 1);
        mlp.forward(&[1.0, 1.0]).unwrap();
        let before = mlp.trace().to_vec();
        assert!(mlp.forward(&[1.0, 1.0, 1.0]).is_err());
        assert_eq!(mlp.trace(), &before[..]);
    }

    #[test]
    fn forward_fills_every_trace_slot() {
        let mut mlp = bound(&[3, 2], 2, 1);
        spread_weights(&mut mlp);
        let out = mlp.forward(&[0.3, -0.7]).unwrap().to_vec();

        let trace = mlp.trace();
        assert_eq!(trace.len(), 4);
        assert_eq!(trace[0], vec![0.3, -0.7]);
        assert_eq!(trace[3], out);
        assert!(trace[1..].iter().flatten().all(|&a| a > 0.0 && a < 1.0));
    }

    #[test]
    fn backprop_step_follows_negative_gradient() {
        let mut mlp = bound(&[3], 2, 2);
        spread_weights(&mut mlp);

        let input = [0.3_f32, -0.7];
        let target = [0.2_f32, 0.9];
        let lr = 0.1_f32;

        let before: Vec<Vec<f32>> = (0..mlp.num_layers())
            .map(|i| mlp.weights(i).unwrap().to_vec())
            .collect();

        mlp.forward(&input).unwrap();
        mlp.backprop_with_rate(&target, lr).unwrap();

        let after: Vec<Vec<f32>> = (0..mlp.num_layers())
            .map(|i| mlp.weights(i).unwrap().to_vec())
            .collect();

        let eps = 1e-3_f32;
        let mut probe = bound(&[3], 2, 2);
        for idx in 0..probe.num_layers() {
            probe.set_weights(idx, &before[idx]).unwrap();
        }

        for idx in 0..before.len() {
            for p in 0..before[idx].len() {
                let mut w = before[idx].clone();

                w[p] = before[idx][p] + eps;
                probe.set_weights(idx, &w).unwrap();
                let loss_plus = half_sq_error(&mut probe, &input, &target);

                w[p] = before[idx][p] - eps;
                probe.set_weights(idx, &w).unwrap();
                let loss_minus = half_sq_error(&mut probe, &input, &target);

                probe.set_weights(idx, &before[idx]).unwrap();

                let numeric = (loss_plus - loss_minus) / (2.0 * eps);
                let analytic = -(after[idx][p] - before[idx][p]) / lr;
                assert_close(analytic, numeric, 1e-3, 1e-2);
            }
        }
    }

    #[test]
    fn predict_uses_a_private_trace() {
        let mut mlp = bound(&[2], 2, 1);
        spread_weights(&mut mlp);
        mlp.forward(&[1.0, 0.0]).unwrap();
        let trace = mlp.trace().to_vec();

        let inputs = Samples::from_rows(&[vec![0.0_f32, 1.0], vec![1.0, 1.0]]).unwrap();
        let preds = mlp.predict(&inputs).unwrap();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0], mlp.predict_one(&[0.0, 1.0]).unwrap());
        assert_eq!(mlp.trace(), &trace[..]);
    }

    #[test]
    fn learning_rate_must_be_positive() {
        assert!(Mlp::with_learning_rate(2_usize, 0.0).is_err());
        assert!(Mlp::with_learning_rate(2_usize, f32::NAN).is_err());
        assert_eq!(Mlp::new(2_usize).unwrap().learning_rate(), DEFAULT_LEARNING_RATE);
    }
}
