//! Scoring models for knowledge graph embeddings.
//!
//! The set of models is closed: [`ModelKind`] names each one, and
//! [`ModelKind::scorer`] hands out the matching [`Scorer`]. Training and
//! inference only ever talk to the trait.
//!
//! | Model | Hypothesis | Score |
//! |-------|------------|-------|
//! | TransE | Relations are translations | `-‖h + r − t‖ₚ` |
//! | DistMult | Relations are scalings | `Σ h·r·t` |
//! | ComplEx | Asymmetric relations | `Re(Σ h·r·conj(t))` |

mod complex;
mod distmult;
mod transe;

pub use complex::ComplEx;
pub use distmult::DistMult;
pub use transe::TransE;

use crate::error::{Error, Result};
use crate::params::ModelParams;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gradients of a triple's score with respect to its three embeddings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGrad {
    /// d score / d head.
    pub head: Array1<f32>,
    /// d score / d relation.
    pub relation: Array1<f32>,
    /// d score / d tail.
    pub tail: Array1<f32>,
}

/// A triple scoring function over embedding rows.
///
/// Higher scores mean more plausible triples.
pub trait Scorer: Send + Sync {
    /// Score a triple from its head, relation and tail rows.
    fn score(&self, h: ArrayView1<'_, f32>, r: ArrayView1<'_, f32>, t: ArrayView1<'_, f32>) -> f32;

    /// Gradient of [`Scorer::score`] with respect to each row.
    fn gradient(
        &self,
        h: ArrayView1<'_, f32>,
        r: ArrayView1<'_, f32>,
        t: ArrayView1<'_, f32>,
    ) -> ScoreGrad;

    /// Stored columns per embedding row for embedding size `k`.
    fn embedding_width(&self, k: usize) -> usize {
        k
    }
}

/// The supported embedding models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Translation model (Bordes et al. 2013).
    TransE,
    /// Diagonal bilinear model (Yang et al. 2015).
    DistMult,
    /// Complex-valued bilinear model (Trouillon et al. 2016).
    ComplEx,
}

impl ModelKind {
    /// Every supported model, in a stable order.
    pub const ALL: [ModelKind; 3] = [ModelKind::TransE, ModelKind::DistMult, ModelKind::ComplEx];

    /// Model name (e.g., "TransE").
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::TransE => "TransE",
            ModelKind::DistMult => "DistMult",
            ModelKind::ComplEx => "ComplEx",
        }
    }

    /// Scoring function configured from the model's hyperparameters.
    pub fn scorer(self, params: &ModelParams) -> Box<dyn Scorer> {
        match self {
            ModelKind::TransE => Box::new(TransE::new(params.norm)),
            ModelKind::DistMult => Box::new(DistMult),
            ModelKind::ComplEx => Box::new(ComplEx),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    /// Case-insensitive model name.
    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("Unknown model: {s}")))
    }
}

/// Which embedding table to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmbeddingType {
    /// Entity embeddings.
    #[default]
    Entity,
    /// Relation embeddings.
    Relation,
}

impl FromStr for EmbeddingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "entity" => Ok(Self::Entity),
            "relation" => Ok(Self::Relation),
            other => Err(Error::Validation(format!("Unknown embedding type: {other}"))),
        }
    }
}
