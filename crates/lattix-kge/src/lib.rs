// Allow minor clippy style warnings at crate level
// These are mostly style preferences, not bugs
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_precision_loss)]

//! Knowledge graph embedding models with save and restore.
//!
//! - [`EmbeddingModel`] - Train, score and query a TransE, DistMult or ComplEx model
//! - [`ModelParams`] - Hyperparameters (builder + JSON)
//! - [`save_model`] / [`restore_model`] - Exact round-trip of the full model state
//! - [`create_tensorboard_visualizations`] - Embedding projector export
//!
//! # Example
//!
//! ```rust,no_run
//! use lattix_core::Triple;
//! use lattix_kge::{restore_model, save_model, EmbeddingModel, ModelKind, ModelParams};
//!
//! let triples = vec![
//!     Triple::new("a", "y", "b"),
//!     Triple::new("b", "y", "a"),
//!     Triple::new("f", "y", "e"),
//! ];
//!
//! let mut model = EmbeddingModel::new(ModelKind::ComplEx, ModelParams::default().with_k(10));
//! model.fit(&triples)?;
//!
//! save_model(&model, "model.bin")?;
//! let restored = restore_model("model.bin")?;
//! assert_eq!(model, restored);
//! # Ok::<(), lattix_kge::Error>(())
//! ```

mod error;
mod model;
pub mod models;
mod params;
mod persist;
pub mod projector;
mod training;

pub use error::{Error, Result};
pub use model::{EmbeddingModel, Prediction, StateField};
pub use models::{EmbeddingType, ModelKind, Scorer};
pub use params::{LossKind, LossParams, ModelParams, OptimizerKind, OptimizerParams};
pub use persist::{restore_model, save_model, ModelFormat, FORMAT_VERSION};
pub use projector::{
    create_tensorboard_visualizations, write_metadata_tsv, ProjectorFiles, ProjectorOptions,
};
pub use training::{EpochMetrics, FitSummary, ProgressCallback};
