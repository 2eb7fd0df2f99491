use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::mlp::check_learning_rate;
use crate::{Error, Mlp, Result, Samples, loss};

/// Epoch budget used by `Mlp::fit`.
pub const DEFAULT_EPOCHS: usize = 1_000;

/// Sample visiting order within an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shuffle {
    /// Visit samples in data order.
    #[default]
    None,
    /// Reshuffle every epoch with an RNG seeded once per `fit`.
    Seeded(u64),
}

/// Training-loop policy.
///
/// Training stops after `epochs` epochs, or earlier once the mean epoch loss
/// drops to `target_loss` or below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    pub epochs: usize,
    /// Overrides the network's own learning rate for this fit.
    pub learning_rate: Option<f32>,
    pub shuffle: Shuffle,
    pub target_loss: Option<f32>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            learning_rate: None,
            shuffle: Shuffle::None,
            target_loss: None,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if let Some(lr) = self.learning_rate {
            check_learning_rate(lr)?;
        }
        if let Some(target) = self.target_loss {
            if !(target.is_finite() && target >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "target_loss must be finite and >= 0, got {target}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub epochs_run: usize,
    /// Mean loss of the last epoch.
    pub final_loss: f32,
    /// True when training stopped on `target_loss`.
    pub converged: bool,
}

impl Mlp {
    /// Bind the network to the data's widths and train it with the default policy.
    ///
    /// Weights restart from zero on every call. Returns the network so calls chain:
    ///
    /// ```rust
    /// use splearn::{LayerSpec, Mlp, Samples};
    ///
    /// # fn main() -> splearn::Result<()> {
    /// let x = Samples::from_rows(&[[0.0_f32, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])?;
    /// let y = Samples::from_rows(&[[0.0_f32, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 1.0]])?;
    ///
    /// let preds = Mlp::new(LayerSpec::uniform(4, 1))?.fit(&x, &y)?.predict(&x)?;
    /// assert_eq!(preds.len(), 4);
    /// # Ok(())
    /// # }
    /// ```
    pub fn fit(&mut self, inputs: &Samples, targets: &Samples) -> Result<&mut Self> {
        self.fit_with(inputs, targets, &FitConfig::default())
    }

    /// Same as `fit` with an explicit training policy.
    ///
    /// Every check runs before the weights are touched: a failed call leaves the
    /// network as it was. On success the trace is left zeroed at the bound
    /// widths.
    pub fn fit_with(
        &mut self,
        inputs: &Samples,
        targets: &Samples,
        cfg: &FitConfig,
    ) -> Result<&mut Self> {
        cfg.validate()?;
        check_pairing(inputs, targets)?;
        if let (Some(in_dim), Some(out_dim)) = (self.input_dim(), self.output_dim()) {
            if inputs.width() != in_dim || targets.width() != out_dim {
                return Err(Error::InvalidShape(format!(
                    "network is bound to {in_dim} inputs / {out_dim} outputs, \
                     got data widths {} / {}",
                    inputs.width(),
                    targets.width()
                )));
            }
        }

        let lr = cfg.learning_rate.unwrap_or(self.learning_rate());
        self.bind(inputs.width(), targets.width())?;

        let mut order: Vec<usize> = (0..inputs.len()).collect();
        let mut rng = match cfg.shuffle {
            Shuffle::None => None,
            Shuffle::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
        };

        let mut report = FitReport {
            epochs_run: 0,
            final_loss: f32::INFINITY,
            converged: false,
        };

        for epoch in 0..cfg.epochs {
            if let Some(rng) = rng.as_mut() {
                order.shuffle(rng);
            }

            let mut epoch_loss = 0.0_f32;
            for &idx in &order {
                let target = targets.row(idx);
                let pred = self.forward(inputs.row(idx))?;
                epoch_loss += loss::mse(pred, target);
                self.backprop_with_rate(target, lr)?;
            }

            report.epochs_run = epoch + 1;
            report.final_loss = epoch_loss / inputs.len() as f32;
            log::trace!("epoch={} loss={}", report.epochs_run, report.final_loss);

            if cfg.target_loss.is_some_and(|t| report.final_loss <= t) {
                report.converged = true;
                break;
            }
        }

        self.clear_trace();
        log::info!(
            "fit finished epochs={} loss={} converged={}",
            report.epochs_run,
            report.final_loss,
            report.converged
        );
        self.last_fit = Some(report);
        Ok(self)
    }

    /// Mean per-sample loss over a dataset. Never mutates the network.
    pub fn evaluate(&self, inputs: &Samples, targets: &Samples) -> Result<f32> {
        check_pairing(inputs, targets)?;
        let (in_dim, out_dim) = match (self.input_dim(), self.output_dim()) {
            (Some(i), Some(o)) => (i, o),
            _ => return Err(Error::NotFitted),
        };
        if inputs.width() != in_dim || targets.width() != out_dim {
            return Err(Error::InvalidShape(format!(
                "data widths {} / {} do not match network widths {in_dim} / {out_dim}",
                inputs.width(),
                targets.width()
            )));
        }

        let mut trace = self.fresh_trace();
        let mut total = 0.0_f32;
        for (x, t) in inputs.rows().zip(targets.rows()) {
            total += loss::mse(self.forward_detached(x, &mut trace), t);
        }
        Ok(total / inputs.len() as f32)
    }
}

fn check_pairing(inputs: &Samples, targets: &Samples) -> Result<()> {
    if inputs.is_empty() || targets.is_empty() {
        return Err(Error::InvalidData(
            "inputs and targets must not be empty".to_owned(),
        ));
    }
    if inputs.len() != targets.len() {
        return Err(Error::InvalidShape(format!(
            "inputs/targets row count mismatch: {} vs {}",
            inputs.len(),
            targets.len()
        )));
    }
    Ok(())
}
