//! The network's nonlinearity.
//!
//! Every layer applies the logistic sigmoid element-wise. Activations are cached
//! post-sigmoid in the trace, so the derivative is expressed in terms of the
//! output `y` instead of the pre-activation `z`.

/// Logistic sigmoid, `1 / (1 + e^-x)`.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    // Branch on the sign so `exp` never overflows.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// `d sigmoid / dz` written in terms of the cached output `y = sigmoid(z)`.
#[inline]
pub fn sigmoid_grad_from_output(y: f32) -> f32 {
    y * (1.0 - y)
}
