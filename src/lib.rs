//! `lattix` turns tables into knowledge graph triples and trains embedding
//! models whose full state can be saved and restored exactly.
//!
//! This crate re-exports the two library crates:
//!
//! - [`core`] (`lattix-core`) - triples, tables and schema-driven conversion
//! - [`kge`] (`lattix-kge`) - TransE, DistMult and ComplEx models, persistence
//!   and projector export
//!
//! # Example
//!
//! ```rust,no_run
//! use lattix::{dataframe_to_triples, restore_model, save_model};
//! use lattix::{EmbeddingModel, ModelKind, ModelParams, SchemaEntry, Table};
//!
//! let table = Table::from_csv_path("iris.csv")?;
//! let schema = [SchemaEntry::new("species", "has_sepal_length", "sepal_length")];
//! let triples = dataframe_to_triples(&table, &schema)?;
//!
//! let mut model = EmbeddingModel::new(ModelKind::TransE, ModelParams::default());
//! model.fit(&triples)?;
//! save_model(&model, "iris.bin")?;
//!
//! assert_eq!(restore_model("iris.bin")?, model);
//! # Ok::<(), lattix::kge::Error>(())
//! ```

pub use lattix_core as core;
pub use lattix_kge as kge;

pub use lattix_core::{
    dataframe_to_triples, dataframe_to_triples_with, MissingValues, SchemaEntry, Table, Triple,
    Value,
};
pub use lattix_kge::{
    create_tensorboard_visualizations, restore_model, save_model, write_metadata_tsv,
    EmbeddingModel, EmbeddingType, ModelKind, ModelParams, Prediction,
};
