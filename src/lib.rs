//! A small sigmoid MLP (multi-layer perceptron) engine.
//!
//! `splearn` trains dense feed-forward networks one sample at a time with the
//! classic delta rule. It is meant to be read alongside a hand-worked
//! backpropagation exercise, so every step is explicit:
//!
//! - the network is declared by its hidden layers ([`LayerSpec`]);
//! - `fit` binds the input/output widths from the data and zeroes the weights;
//! - each layer appends [`BIAS_INPUT`] (`-1`) to its input before the weighted sum;
//! - the nonlinearity is always the logistic sigmoid;
//! - [`Mlp::forward`] records every activation in a trace that
//!   [`Mlp::backprop`] consumes to update the weights in place.
//!
//! # Panics vs `Result`
//!
//! Every public entry point validates shapes and returns [`Result`]; checks run
//! before any state changes, so a failed call leaves the network untouched. The
//! per-layer kernels in [`layer`] only `debug_assert!` their shape contracts.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`.
//! - [`Samples`] stores rows contiguously in row-major layout.
//! - Weight matrix `i` is row-major with shape `(n_{i+1}, n_i + 1)`; the last
//!   column holds the bias weights.
//!
//! # Quick start
//!
//! ```rust
//! use splearn::{FitConfig, LayerSpec, Mlp, Samples, Shuffle};
//!
//! # fn main() -> splearn::Result<()> {
//! let x = Samples::from_rows(&[[0.0_f32, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])?;
//! let y = Samples::from_rows(&[[0.0_f32], [1.0], [1.0], [0.0]])?;
//!
//! let mut mlp = Mlp::new(LayerSpec::uniform(4, 1))?;
//! mlp.fit_with(
//!     &x,
//!     &y,
//!     &FitConfig {
//!         epochs: 200,
//!         shuffle: Shuffle::Seeded(7),
//!         ..FitConfig::default()
//!     },
//! )?;
//! let preds = mlp.predict(&x)?;
//! assert_eq!(preds.len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! # Driving single steps
//!
//! ```rust
//! use splearn::{LayerSpec, Mlp};
//!
//! # fn main() -> splearn::Result<()> {
//! let mut mlp = Mlp::new(LayerSpec::uniform(2, 1))?;
//! mlp.bind(2, 2)?;
//! mlp.set_weights(0, &[0.3, 0.8, 0.7, 0.5, 0.6, 0.2])?;
//! mlp.set_weights(1, &[0.1, 0.4, 0.9, 0.5, 0.3, 0.6])?;
//!
//! let y = mlp.forward(&[0.0, 0.0])?;
//! assert!((y[0] - 0.33).abs() < 0.005);
//! mlp.backprop(&[0.0, 0.0])?;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod data;
pub mod error;
pub mod layer;
pub mod loss;
pub mod mlp;
pub mod topology;
pub mod train;

pub use data::Samples;
pub use error::{Error, Result};
pub use layer::{BIAS_INPUT, Layer};
pub use mlp::{DEFAULT_LEARNING_RATE, Mlp, PLACEHOLDER_WIDTH};
pub use topology::{DEFAULT_HIDDEN_LAYERS, LayerSpec};
pub use train::{DEFAULT_EPOCHS, FitConfig, FitReport, Shuffle};
