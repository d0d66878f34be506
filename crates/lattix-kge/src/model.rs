//! The embedding model record: hyperparameters, index maps and trained arrays.
//!
//! [`EmbeddingModel`] is one type for every [`ModelKind`]; the kind only
//! selects the scoring function. This keeps the saved state uniform:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `all_params` | [`ModelParams`] used to build and train the model |
//! | `is_fitted` | Whether `trained_model_params` holds trained arrays |
//! | `ent_to_idx` | Entity name → row of the entity table |
//! | `rel_to_idx` | Relation name → row of the relation table |
//! | `trained_model_params` | `[entity table, relation table]` |

use crate::error::{Error, Result};
use crate::models::{EmbeddingType, ModelKind};
use crate::params::ModelParams;
use crate::training::{self, FitSummary, IndexedTriple, ProgressCallback};
use lattix_core::Triple;
use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Link prediction result with entity and score.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted entity.
    pub entity: String,
    /// Plausibility score (higher = more plausible).
    pub score: f32,
}

/// The first field in which two model states differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    /// Model kinds differ.
    Kind,
    /// Hyperparameters differ.
    AllParams,
    /// Fitted flags differ.
    IsFitted,
    /// Entity index maps differ.
    EntToIdx,
    /// Relation index maps differ.
    RelToIdx,
    /// Different number of trained arrays.
    TrainedParamCount,
    /// Trained array `i` has a different shape.
    TrainedParamShape(usize),
    /// Trained array `i` has a different element.
    TrainedParamValues(usize),
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateField::Kind => f.write_str("model kind"),
            StateField::AllParams => f.write_str("all_params"),
            StateField::IsFitted => f.write_str("is_fitted"),
            StateField::EntToIdx => f.write_str("ent_to_idx"),
            StateField::RelToIdx => f.write_str("rel_to_idx"),
            StateField::TrainedParamCount => f.write_str("number of trained arrays"),
            StateField::TrainedParamShape(i) => write!(f, "shape of trained array {i}"),
            StateField::TrainedParamValues(i) => write!(f, "values of trained array {i}"),
        }
    }
}

/// A knowledge graph embedding model.
///
/// # Example
///
/// ```rust
/// use lattix_core::Triple;
/// use lattix_kge::{EmbeddingModel, EmbeddingType, ModelKind, ModelParams};
///
/// let triples = vec![
///     Triple::new("a", "y", "b"),
///     Triple::new("b", "y", "a"),
///     Triple::new("a", "y", "c"),
/// ];
///
/// let params = ModelParams::default().with_k(4).with_epochs(5).with_batches_count(1);
/// let mut model = EmbeddingModel::new(ModelKind::DistMult, params);
/// model.fit(&triples).unwrap();
///
/// let scores = model.predict(&triples).unwrap();
/// assert_eq!(scores.len(), 3);
///
/// let emb = model.get_embeddings(&["a", "b"], EmbeddingType::Entity).unwrap();
/// assert_eq!(emb.dim(), (2, 4));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModel {
    kind: ModelKind,
    all_params: ModelParams,
    is_fitted: bool,
    ent_to_idx: BTreeMap<String, usize>,
    rel_to_idx: BTreeMap<String, usize>,
    trained_model_params: Vec<Array2<f32>>,
}

impl EmbeddingModel {
    /// Create an unfitted model.
    pub fn new(kind: ModelKind, params: ModelParams) -> Self {
        Self {
            kind,
            all_params: params,
            is_fitted: false,
            ent_to_idx: BTreeMap::new(),
            rel_to_idx: BTreeMap::new(),
            trained_model_params: Vec::new(),
        }
    }

    /// Model kind.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Model name (e.g., "TransE").
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Hyperparameters.
    pub fn all_params(&self) -> &ModelParams {
        &self.all_params
    }

    /// Whether the model is trained and ready for inference.
    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Entity name → row index.
    pub fn ent_to_idx(&self) -> &BTreeMap<String, usize> {
        &self.ent_to_idx
    }

    /// Relation name → row index.
    pub fn rel_to_idx(&self) -> &BTreeMap<String, usize> {
        &self.rel_to_idx
    }

    /// Trained arrays: `[entity table, relation table]`, empty until fitted.
    pub fn trained_model_params(&self) -> &[Array2<f32>] {
        &self.trained_model_params
    }

    /// Number of entities.
    pub fn num_entities(&self) -> usize {
        self.ent_to_idx.len()
    }

    /// Number of relations.
    pub fn num_relations(&self) -> usize {
        self.rel_to_idx.len()
    }

    /// Stored columns per embedding row (`k`, or `2k` for ComplEx).
    pub fn embedding_dim(&self) -> usize {
        self.kind
            .scorer(&self.all_params)
            .embedding_width(self.all_params.k)
    }

    /// Train on a set of triples, replacing any previous state.
    ///
    /// Index maps are rebuilt from the input, assigning rows in sorted name
    /// order. On error the model is left untouched.
    pub fn fit(&mut self, triples: &[Triple]) -> Result<FitSummary> {
        self.fit_inner(triples, None)
    }

    /// [`EmbeddingModel::fit`] with a per-epoch progress callback.
    pub fn fit_with_callback(
        &mut self,
        triples: &[Triple],
        callback: ProgressCallback,
    ) -> Result<FitSummary> {
        self.fit_inner(triples, Some(&callback))
    }

    fn fit_inner(
        &mut self,
        triples: &[Triple],
        callback: Option<&ProgressCallback>,
    ) -> Result<FitSummary> {
        self.all_params.validate()?;
        if triples.is_empty() {
            return Err(Error::Validation("No training triples provided".into()));
        }

        let (ent_to_idx, rel_to_idx) = build_vocab(triples);
        let indexed: Vec<IndexedTriple> = triples
            .iter()
            .map(|t| (ent_to_idx[&t.subject], rel_to_idx[&t.predicate], ent_to_idx[&t.object]))
            .collect();

        let scorer = self.kind.scorer(&self.all_params);
        let width = scorer.embedding_width(self.all_params.k);
        let mut rng = XorShiftRng::seed_from_u64(self.all_params.seed);
        let mut ent = training::xavier_normal(ent_to_idx.len(), width, &mut rng)?;
        let mut rel = training::xavier_normal(rel_to_idx.len(), width, &mut rng)?;

        let summary = training::train(
            scorer.as_ref(),
            &self.all_params,
            &indexed,
            &mut ent,
            &mut rel,
            &mut rng,
            callback,
        )?;

        tracing::info!(
            model = %self.kind,
            entities = ent_to_idx.len(),
            relations = rel_to_idx.len(),
            triples = triples.len(),
            loss = summary.final_loss(),
            "fit finished"
        );

        self.ent_to_idx = ent_to_idx;
        self.rel_to_idx = rel_to_idx;
        self.trained_model_params = vec![ent, rel];
        self.is_fitted = true;
        Ok(summary)
    }

    /// Entity and relation tables, or [`Error::NotFitted`].
    fn tables(&self) -> Result<(&Array2<f32>, &Array2<f32>)> {
        if !self.is_fitted {
            return Err(Error::NotFitted);
        }
        match self.trained_model_params.as_slice() {
            [ent, rel] => Ok((ent, rel)),
            other => Err(Error::Validation(format!(
                "expected 2 trained arrays, found {}",
                other.len()
            ))),
        }
    }

    fn entity_index(&self, name: &str) -> Result<usize> {
        self.ent_to_idx
            .get(name)
            .copied()
            .ok_or_else(|| Error::EntityNotFound(name.to_string()))
    }

    fn relation_index(&self, name: &str) -> Result<usize> {
        self.rel_to_idx
            .get(name)
            .copied()
            .ok_or_else(|| Error::RelationNotFound(name.to_string()))
    }

    /// Score one triple. Higher = more plausible.
    pub fn score(&self, head: &str, relation: &str, tail: &str) -> Result<f32> {
        let (ent, rel) = self.tables()?;
        let scorer = self.kind.scorer(&self.all_params);
        let (h, r, t) = (
            self.entity_index(head)?,
            self.relation_index(relation)?,
            self.entity_index(tail)?,
        );
        Ok(scorer.score(ent.row(h), rel.row(r), ent.row(t)))
    }

    /// Score a batch of triples, in input order.
    ///
    /// Fails on the first triple with an unknown entity or relation.
    pub fn predict(&self, triples: &[Triple]) -> Result<Vec<f32>> {
        let (ent, rel) = self.tables()?;
        let scorer = self.kind.scorer(&self.all_params);
        triples
            .iter()
            .map(|t| {
                let h = self.entity_index(&t.subject)?;
                let r = self.relation_index(&t.predicate)?;
                let o = self.entity_index(&t.object)?;
                Ok(scorer.score(ent.row(h), rel.row(r), ent.row(o)))
            })
            .collect()
    }

    /// Embedding rows for the given names, one row per name in input order.
    pub fn get_embeddings<S: AsRef<str>>(
        &self,
        names: &[S],
        embedding_type: EmbeddingType,
    ) -> Result<Array2<f32>> {
        let (ent, rel) = self.tables()?;
        let (table, rows) = match embedding_type {
            EmbeddingType::Entity => (
                ent,
                names
                    .iter()
                    .map(|n| self.entity_index(n.as_ref()))
                    .collect::<Result<Vec<_>>>()?,
            ),
            EmbeddingType::Relation => (
                rel,
                names
                    .iter()
                    .map(|n| self.relation_index(n.as_ref()))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(table.select(Axis(0), &rows))
    }

    /// Entity names ordered by row index.
    pub fn entity_names(&self) -> Vec<&str> {
        names_by_index(&self.ent_to_idx)
    }

    /// Entity table, or [`Error::NotFitted`].
    pub fn entity_embeddings(&self) -> Result<&Array2<f32>> {
        self.tables().map(|(ent, _)| ent)
    }

    /// Predict likely tail entities for (head, relation, ?).
    ///
    /// Returns top-k predictions sorted by score (descending).
    pub fn predict_tail(&self, head: &str, relation: &str, k: usize) -> Result<Vec<Prediction>> {
        let (ent, rel) = self.tables()?;
        let scorer = self.kind.scorer(&self.all_params);
        let h = ent.row(self.entity_index(head)?);
        let r = rel.row(self.relation_index(relation)?);

        Ok(top_k(
            self.ent_to_idx
                .iter()
                .map(|(name, &idx)| (name, scorer.score(h, r, ent.row(idx)))),
            k,
        ))
    }

    /// Predict likely head entities for (?, relation, tail).
    ///
    /// Returns top-k predictions sorted by score (descending).
    pub fn predict_head(&self, relation: &str, tail: &str, k: usize) -> Result<Vec<Prediction>> {
        let (ent, rel) = self.tables()?;
        let scorer = self.kind.scorer(&self.all_params);
        let r = rel.row(self.relation_index(relation)?);
        let t = ent.row(self.entity_index(tail)?);

        Ok(top_k(
            self.ent_to_idx
                .iter()
                .map(|(name, &idx)| (name, scorer.score(ent.row(idx), r, t))),
            k,
        ))
    }

    /// First field in which `self` and `other` differ, if any.
    ///
    /// Arrays are compared element-wise on their bit patterns, so a restored
    /// model only matches if every float survived exactly (NaN included).
    pub fn state_mismatch(&self, other: &Self) -> Option<StateField> {
        if self.kind != other.kind {
            return Some(StateField::Kind);
        }
        if self.all_params != other.all_params {
            return Some(StateField::AllParams);
        }
        if self.is_fitted != other.is_fitted {
            return Some(StateField::IsFitted);
        }
        if self.ent_to_idx != other.ent_to_idx {
            return Some(StateField::EntToIdx);
        }
        if self.rel_to_idx != other.rel_to_idx {
            return Some(StateField::RelToIdx);
        }
        if self.trained_model_params.len() != other.trained_model_params.len() {
            return Some(StateField::TrainedParamCount);
        }
        for (i, (a, b)) in self
            .trained_model_params
            .iter()
            .zip(&other.trained_model_params)
            .enumerate()
        {
            if a.dim() != b.dim() {
                return Some(StateField::TrainedParamShape(i));
            }
            if a.iter().zip(b.iter()).any(|(x, y)| x.to_bits() != y.to_bits()) {
                return Some(StateField::TrainedParamValues(i));
            }
        }
        None
    }

    /// Check the invariants a fitted model relies on.
    ///
    /// Used after deserialization, where the state did not come from `fit`.
    pub(crate) fn check_consistency(&self) -> Result<()> {
        if !self.is_fitted {
            return Ok(());
        }
        let (ent, rel) = self.tables()?;
        check_index(&self.ent_to_idx, "entity")?;
        check_index(&self.rel_to_idx, "relation")?;

        let width = self.embedding_dim();
        if ent.dim() != (self.ent_to_idx.len(), width) {
            return Err(Error::Validation(format!(
                "entity table is {:?}, expected ({}, {width})",
                ent.dim(),
                self.ent_to_idx.len()
            )));
        }
        if rel.dim() != (self.rel_to_idx.len(), width) {
            return Err(Error::Validation(format!(
                "relation table is {:?}, expected ({}, {width})",
                rel.dim(),
                self.rel_to_idx.len()
            )));
        }
        Ok(())
    }
}

impl PartialEq for EmbeddingModel {
    fn eq(&self, other: &Self) -> bool {
        self.state_mismatch(other).is_none()
    }
}

/// Sorted unique entities and relations, numbered densely from zero.
fn build_vocab(triples: &[Triple]) -> (BTreeMap<String, usize>, BTreeMap<String, usize>) {
    let mut entities = BTreeSet::new();
    let mut relations = BTreeSet::new();
    for t in triples {
        entities.insert(t.subject.as_str());
        entities.insert(t.object.as_str());
        relations.insert(t.predicate.as_str());
    }

    let number = |names: BTreeSet<&str>| {
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect::<BTreeMap<_, _>>()
    };
    (number(entities), number(relations))
}

/// An index map must be a bijection onto `0..len`.
fn check_index(map: &BTreeMap<String, usize>, what: &str) -> Result<()> {
    let mut seen = vec![false; map.len()];
    for (name, &idx) in map {
        match seen.get_mut(idx) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(Error::Validation(format!(
                    "{what} index for '{name}' is out of range or duplicated: {idx}"
                )))
            }
        }
    }
    Ok(())
}

fn names_by_index(map: &BTreeMap<String, usize>) -> Vec<&str> {
    let mut names = vec![""; map.len()];
    for (name, &idx) in map {
        if let Some(slot) = names.get_mut(idx) {
            *slot = name.as_str();
        }
    }
    names
}

fn top_k<'a>(scored: impl Iterator<Item = (&'a String, f32)>, k: usize) -> Vec<Prediction> {
    let mut scores: Vec<(&String, f32)> = scored.collect();
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores.truncate(k);
    scores
        .into_iter()
        .map(|(entity, score)| Prediction {
            entity: entity.clone(),
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{LossKind, OptimizerKind};

    fn sample_triples() -> Vec<Triple> {
        vec![
            Triple::new("a", "y", "b"),
            Triple::new("b", "y", "a"),
            Triple::new("a", "y", "c"),
            Triple::new("c", "y", "a"),
            Triple::new("a", "y", "d"),
            Triple::new("c", "y", "d"),
            Triple::new("b", "y", "c"),
            Triple::new("f", "y", "e"),
        ]
    }

    fn small_params() -> ModelParams {
        ModelParams::default()
            .with_k(10)
            .with_epochs(20)
            .with_batches_count(2)
            .with_seed(555)
            .with_optimizer(OptimizerKind::Adagrad)
            .with_learning_rate(0.1)
    }

    #[test]
    fn test_new_model_is_unfitted() {
        let model = EmbeddingModel::new(ModelKind::TransE, small_params());
        assert!(!model.is_fitted());
        assert_eq!(model.num_entities(), 0);
        assert!(model.trained_model_params().is_empty());
        assert!(matches!(model.predict(&sample_triples()), Err(Error::NotFitted)));
        assert!(matches!(
            model.get_embeddings(&["a"], EmbeddingType::Entity),
            Err(Error::NotFitted)
        ));
    }

    #[test]
    fn test_fit_builds_sorted_dense_index() {
        let mut model = EmbeddingModel::new(ModelKind::TransE, small_params());
        let summary = model.fit(&sample_triples()).unwrap();

        assert!(model.is_fitted());
        assert_eq!(summary.epochs, 20);
        let names: Vec<&str> = model.ent_to_idx().keys().map(String::as_str).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e", "f"]);
        assert_eq!(model.ent_to_idx()["f"], 5);
        assert_eq!(model.rel_to_idx()["y"], 0);
        assert_eq!(model.entity_names(), ["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_table_shapes_per_kind() {
        for (kind, width) in [
            (ModelKind::TransE, 10),
            (ModelKind::DistMult, 10),
            (ModelKind::ComplEx, 20),
        ] {
            let mut model = EmbeddingModel::new(kind, small_params());
            model.fit(&sample_triples()).unwrap();

            let params = model.trained_model_params();
            assert_eq!(params.len(), 2);
            assert_eq!(params[0].dim(), (6, width), "{kind}");
            assert_eq!(params[1].dim(), (1, width), "{kind}");
            assert_eq!(model.embedding_dim(), width);
            assert!(model.check_consistency().is_ok());
        }
    }

    #[test]
    fn test_fit_rejects_empty_and_invalid() {
        let mut model = EmbeddingModel::new(ModelKind::DistMult, small_params());
        assert!(matches!(model.fit(&[]), Err(Error::Validation(_))));

        let mut bad = EmbeddingModel::new(ModelKind::DistMult, small_params().with_k(0));
        assert!(matches!(bad.fit(&sample_triples()), Err(Error::Validation(_))));
        assert!(!bad.is_fitted());
    }

    #[test]
    fn test_predict_matches_score_and_checks_vocab() {
        let mut model = EmbeddingModel::new(ModelKind::ComplEx, small_params());
        model.fit(&sample_triples()).unwrap();

        let batch = [Triple::new("f", "y", "e"), Triple::new("b", "y", "d")];
        let scores = model.predict(&batch).unwrap();
        assert_eq!(scores[0], model.score("f", "y", "e").unwrap());
        assert_eq!(scores[1], model.score("b", "y", "d").unwrap());

        assert!(matches!(
            model.predict(&[Triple::new("zz", "y", "a")]),
            Err(Error::EntityNotFound(e)) if e == "zz"
        ));
        assert!(matches!(
            model.predict(&[Triple::new("a", "nope", "b")]),
            Err(Error::RelationNotFound(r)) if r == "nope"
        ));
    }

    #[test]
    fn test_get_embeddings_rows_follow_input_order() {
        let mut model = EmbeddingModel::new(ModelKind::DistMult, small_params());
        model.fit(&sample_triples()).unwrap();

        let ent = model.entity_embeddings().unwrap();
        let picked = model.get_embeddings(&["c", "a"], EmbeddingType::Entity).unwrap();
        assert_eq!(picked.row(0), ent.row(2));
        assert_eq!(picked.row(1), ent.row(0));

        let rel = model.get_embeddings(&["y"], EmbeddingType::Relation).unwrap();
        assert_eq!(rel.dim(), (1, 10));
        assert!(model.get_embeddings(&["y"], EmbeddingType::Entity).is_err());
    }

    #[test]
    fn test_same_seed_same_model() {
        let triples = sample_triples();
        let mut a = EmbeddingModel::new(ModelKind::TransE, small_params());
        let mut b = EmbeddingModel::new(ModelKind::TransE, small_params());
        a.fit(&triples).unwrap();
        b.fit(&triples).unwrap();
        assert_eq!(a.state_mismatch(&b), None);
        assert_eq!(a, b);

        let mut c = EmbeddingModel::new(ModelKind::TransE, small_params().with_seed(556));
        c.fit(&triples).unwrap();
        assert_eq!(a.state_mismatch(&c), Some(StateField::AllParams));
    }

    #[test]
    fn test_state_mismatch_reports_first_difference() {
        let mut a = EmbeddingModel::new(ModelKind::DistMult, small_params());
        a.fit(&sample_triples()).unwrap();

        let mut b = a.clone();
        b.trained_model_params[1][[0, 3]] += 1.0;
        assert_eq!(a.state_mismatch(&b), Some(StateField::TrainedParamValues(1)));

        let mut c = a.clone();
        c.rel_to_idx.insert("z".into(), 1);
        assert_eq!(a.state_mismatch(&c), Some(StateField::RelToIdx));

        let unfitted = EmbeddingModel::new(ModelKind::DistMult, small_params());
        assert_eq!(a.state_mismatch(&unfitted), Some(StateField::IsFitted));
        assert_eq!(
            a.state_mismatch(&EmbeddingModel::new(ModelKind::TransE, small_params())),
            Some(StateField::Kind)
        );
    }

    #[test]
    fn test_check_consistency_catches_bad_index() {
        let mut model = EmbeddingModel::new(ModelKind::TransE, small_params());
        model.fit(&sample_triples()).unwrap();

        let mut broken = model.clone();
        broken.ent_to_idx.insert("a".into(), 99);
        assert!(matches!(broken.check_consistency(), Err(Error::Validation(_))));

        let mut short = model.clone();
        short.trained_model_params.pop();
        assert!(short.check_consistency().is_err());
    }

    #[test]
    fn test_predict_tail_sorted() {
        let params = small_params().with_loss(LossKind::Pairwise);
        let mut model = EmbeddingModel::new(ModelKind::TransE, params);
        model.fit(&sample_triples()).unwrap();

        let predictions = model.predict_tail("a", "y", 3).unwrap();
        assert_eq!(predictions.len(), 3);
        for pair in predictions.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }

        let heads = model.predict_head("y", "a", 10).unwrap();
        assert_eq!(heads.len(), 6);
        assert!(model.predict_tail("nobody", "y", 3).is_err());
    }

    #[test]
    fn test_refit_replaces_vocab() {
        let mut model = EmbeddingModel::new(ModelKind::DistMult, small_params());
        model.fit(&sample_triples()).unwrap();
        model.fit(&[Triple::new("x", "r", "z")]).unwrap();
        assert_eq!(model.num_entities(), 2);
        assert_eq!(model.num_relations(), 1);
        assert!(model.ent_to_idx().contains_key("x"));
        assert!(!model.ent_to_idx().contains_key("a"));
    }
}
