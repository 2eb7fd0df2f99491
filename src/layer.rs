/// Constant appended to every activation vector before it feeds the next layer.
///
/// The last weight column of each neuron multiplies this value, so it acts as
/// the neuron's negated threshold.
pub const BIAS_INPUT: f32 = -1.0;

/// A dense sigmoid layer with an explicit bias column.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    /// Row-major matrix with shape (out_dim, in_dim + 1); the last column is the bias weight.
    weights: Vec<f32>,
}

impl Layer {
    /// A layer with every weight set to zero.
    #[inline]
    pub fn zeros(in_dim: usize, out_dim: usize) -> Self {
        Self {
            in_dim,
            out_dim,
            weights: vec![0.0; out_dim * (in_dim + 1)],
        }
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// `(rows, cols)` of the weight matrix, bias column included.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.out_dim, self.in_dim + 1)
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub(crate) fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    /// Forward pass for a single sample.
    ///
    /// Computes:
    /// - `h = [inputs, BIAS_INPUT]`
    /// - `outputs = sigmoid(W * h)`
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `outputs.len() == self.out_dim`
    #[inline]
    pub fn forward(&self, inputs: &[f32], outputs: &mut [f32]) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);

        let cols = self.in_dim + 1;
        for (o, row) in self.weights.chunks_exact(cols).enumerate() {
            let mut sum = row[self.in_dim] * BIAS_INPUT;
            for (&w, &x) in row[..self.in_dim].iter().zip(inputs) {
                sum = w.mul_add(x, sum);
            }
            outputs[o] = crate::activation::sigmoid(sum);
        }
    }

    /// Pushes this layer's deltas back onto its inputs: `d_inputs = (W^T * deltas)[..in_dim]`.
    ///
    /// The bias column has no upstream neuron and is skipped. `d_inputs` is overwritten.
    /// The caller still has to multiply by the previous layer's activation derivative.
    #[inline]
    pub fn propagate(&self, deltas: &[f32], d_inputs: &mut [f32]) {
        debug_assert_eq!(deltas.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);

        d_inputs.fill(0.0);
        let cols = self.in_dim + 1;
        for (row, &d) in self.weights.chunks_exact(cols).zip(deltas) {
            for (acc, &w) in d_inputs.iter_mut().zip(&row[..self.in_dim]) {
                *acc = w.mul_add(d, *acc);
            }
        }
    }

    /// In-place delta-rule update: `W[o][j] += lr * deltas[o] * h[j]`, `h = [inputs, BIAS_INPUT]`.
    #[inline]
    pub fn apply_deltas(&mut self, inputs: &[f32], deltas: &[f32], lr: f32) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(deltas.len(), self.out_dim);

        let in_dim = self.in_dim;
        for (row, &d) in self.weights.chunks_exact_mut(in_dim + 1).zip(deltas) {
            let step = lr * d;
            for (w, &x) in row[..in_dim].iter_mut().zip(inputs) {
                *w = step.mul_add(x, *w);
            }
            row[in_dim] = step.mul_add(BIAS_INPUT, row[in_dim]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer_with(in_dim: usize, out_dim: usize, weights: &[f32]) -> Layer {
        let mut layer = Layer::zeros(in_dim, out_dim);
        layer.weights_mut().copy_from_slice(weights);
        layer
    }

    #[test]
    fn zero_layer_outputs_half() {
        let layer = Layer::zeros(3, 2);
        assert_eq!(layer.shape(), (2, 4));

        let mut out = [0.0_f32; 2];
        layer.forward(&[1.0, -2.0, 3.0], &mut out);
        assert_eq!(out, [0.5, 0.5]);
    }

    #[test]
    fn bias_column_multiplies_minus_one() {
        // Only the bias weight is set: z = 2.0 * -1.0.
        let layer = layer_with(1, 1, &[0.0, 2.0]);
        let mut out = [0.0_f32; 1];
        layer.forward(&[5.0], &mut out);
        assert!((out[0] - crate::activation::sigmoid(-2.0)).abs() < 1e-6);
    }

    #[test]
    fn propagate_skips_bias_column() {
        let layer = layer_with(2, 2, &[1.0, 2.0, 100.0, 3.0, 4.0, 100.0]);
        let mut d_inputs = [9.0_f32; 2];
        layer.propagate(&[1.0, 0.5], &mut d_inputs);
        assert_eq!(d_inputs, [1.0 + 1.5, 2.0 + 2.0]);
    }

    #[test]
    fn apply_deltas_moves_bias_against_sign() {
        let mut layer = Layer::zeros(2, 1);
        layer.apply_deltas(&[0.0, 2.0], &[0.25], 0.5);
        assert_eq!(layer.weights(), &[0.0, 0.25, -0.125]);
    }
}
