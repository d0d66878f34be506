//! Hyperparameters for embedding models.
//!
//! [`ModelParams`] is the full hyperparameter record of a model. It is saved
//! alongside the trained arrays and compared verbatim after a restore, so
//! every knob that influences training lives here.
//!
//! # Example
//!
//! ```rust
//! use lattix_kge::{LossKind, ModelParams, OptimizerKind};
//!
//! let params = ModelParams::default()
//!     .with_k(10)
//!     .with_epochs(20)
//!     .with_batches_count(2)
//!     .with_seed(555)
//!     .with_optimizer(OptimizerKind::Adagrad)
//!     .with_learning_rate(0.1)
//!     .with_loss(LossKind::Pairwise)
//!     .with_margin(5.0);
//!
//! assert!(params.validate().is_ok());
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// Gradient-based optimizer used by `fit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// Plain stochastic gradient descent.
    Sgd,
    /// Adagrad (per-parameter accumulated squared gradients).
    Adagrad,
    /// Adam (first and second moment estimates).
    Adam,
}

/// Training objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    /// Margin ranking: `max(0, margin - s(pos) + s(neg))`.
    Pairwise,
    /// Negative log-likelihood: `log(1 + exp(-y * s))` with `y = +1/-1`.
    Nll,
}

impl FromStr for OptimizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sgd" => Ok(Self::Sgd),
            "adagrad" => Ok(Self::Adagrad),
            "adam" => Ok(Self::Adam),
            other => Err(Error::Validation(format!("Unknown optimizer: {other}"))),
        }
    }
}

impl FromStr for LossKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pairwise" => Ok(Self::Pairwise),
            "nll" => Ok(Self::Nll),
            other => Err(Error::Validation(format!("Unknown loss: {other}"))),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sgd => "sgd",
            Self::Adagrad => "adagrad",
            Self::Adam => "adam",
        })
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pairwise => "pairwise",
            Self::Nll => "nll",
        })
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerParams {
    /// Learning rate (default: 0.0005).
    pub lr: f32,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self { lr: 0.0005 }
    }
}

/// Loss settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossParams {
    /// Margin for the pairwise loss (default: 1.0). Ignored by NLL.
    pub margin: f32,
}

impl Default for LossParams {
    fn default() -> Self {
        Self { margin: 1.0 }
    }
}

/// Full hyperparameter record of an embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Embedding size (default: 100). ComplEx stores `2k` columns.
    pub k: usize,
    /// Negatives generated per positive triple (default: 2).
    pub eta: usize,
    /// Training epochs (default: 100).
    pub epochs: usize,
    /// Number of batches each epoch is split into (default: 100).
    pub batches_count: usize,
    /// Random seed for initialization, shuffling and corruption (default: 0).
    pub seed: u64,
    /// Optimizer (default: Adam).
    pub optimizer: OptimizerKind,
    /// Optimizer settings.
    pub optimizer_params: OptimizerParams,
    /// Loss function (default: NLL).
    pub loss: LossKind,
    /// Loss settings.
    pub loss_params: LossParams,
    /// TransE distance norm, 1 or 2 (default: 1). Ignored by other models.
    pub norm: u8,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            k: 100,
            eta: 2,
            epochs: 100,
            batches_count: 100,
            seed: 0,
            optimizer: OptimizerKind::Adam,
            optimizer_params: OptimizerParams::default(),
            loss: LossKind::Nll,
            loss_params: LossParams::default(),
            norm: 1,
        }
    }
}

impl ModelParams {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let params: Self = serde_json::from_reader(BufReader::new(file))?;
        params.validate()?;
        Ok(params)
    }

    /// Reject settings that cannot train.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::Validation("k must be positive".into()));
        }
        if self.epochs == 0 {
            return Err(Error::Validation("epochs must be positive".into()));
        }
        if self.batches_count == 0 {
            return Err(Error::Validation("batches_count must be positive".into()));
        }
        let lr = self.optimizer_params.lr;
        if !(lr.is_finite() && lr > 0.0) {
            return Err(Error::Validation(format!(
                "learning rate must be positive, got {lr}"
            )));
        }
        if !self.loss_params.margin.is_finite() {
            return Err(Error::Validation("margin must be finite".into()));
        }
        if !matches!(self.norm, 1 | 2) {
            return Err(Error::Validation(format!(
                "norm must be 1 or 2, got {}",
                self.norm
            )));
        }
        Ok(())
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_eta(mut self, eta: usize) -> Self {
        self.eta = eta;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batches_count(mut self, batches_count: usize) -> Self {
        self.batches_count = batches_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.optimizer_params.lr = lr;
        self
    }

    pub fn with_loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.loss_params.margin = margin;
        self
    }

    pub fn with_norm(mut self, norm: u8) -> Self {
        self.norm = norm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ModelParams::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            ModelParams::default().with_k(0),
            ModelParams::default().with_epochs(0),
            ModelParams::default().with_batches_count(0),
            ModelParams::default().with_learning_rate(0.0),
            ModelParams::default().with_learning_rate(f32::NAN),
            ModelParams::default().with_norm(3),
        ];
        for params in bad {
            assert!(
                matches!(params.validate(), Err(Error::Validation(_))),
                "{params:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: ModelParams =
            serde_json::from_str(r#"{"k": 10, "optimizer": "adagrad", "optimizer_params": {"lr": 0.1}}"#)
                .unwrap();
        assert_eq!(params.k, 10);
        assert_eq!(params.optimizer, OptimizerKind::Adagrad);
        assert_eq!(params.optimizer_params.lr, 0.1);
        assert_eq!(params.eta, 2);
        assert_eq!(params.loss, LossKind::Nll);
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("AdaGrad".parse::<OptimizerKind>().unwrap(), OptimizerKind::Adagrad);
        assert_eq!("pairwise".parse::<LossKind>().unwrap(), LossKind::Pairwise);
        assert!("rmsprop".parse::<OptimizerKind>().is_err());
        assert_eq!(OptimizerKind::Sgd.to_string(), "sgd");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"k": 8, "epochs": 3, "loss": "pairwise"}"#).unwrap();

        let params = ModelParams::from_json_file(&path).unwrap();
        assert_eq!(params, ModelParams::default().with_k(8).with_epochs(3).with_loss(LossKind::Pairwise));

        std::fs::write(&path, r#"{"k": 0}"#).unwrap();
        assert!(ModelParams::from_json_file(&path).is_err());
    }
}
