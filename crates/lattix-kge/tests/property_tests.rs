//! Property-based tests for fitted models.
//!
//! - Index maps are dense, sorted and cover every name in the input
//! - Table shapes follow the vocabulary and the model kind
//! - Saving and restoring is the identity on any fitted state

use lattix_core::Triple;
use lattix_kge::{restore_model, save_model, EmbeddingModel, ModelKind, ModelParams};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn arb_kind() -> impl Strategy<Value = ModelKind> {
    prop_oneof![
        Just(ModelKind::TransE),
        Just(ModelKind::DistMult),
        Just(ModelKind::ComplEx),
    ]
}

fn arb_triples() -> impl Strategy<Value = Vec<Triple>> {
    prop::collection::vec(("[a-f]", "[pq]", "[a-f]"), 1..12)
        .prop_map(|v| v.into_iter().map(Triple::from).collect())
}

fn params(k: usize, seed: u64) -> ModelParams {
    ModelParams::default()
        .with_k(k)
        .with_epochs(3)
        .with_batches_count(2)
        .with_seed(seed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_index_maps_are_dense_and_sorted(
        kind in arb_kind(),
        triples in arb_triples(),
        k in 1usize..6,
        seed in any::<u64>(),
    ) {
        let mut model = EmbeddingModel::new(kind, params(k, seed));
        model.fit(&triples).unwrap();

        let entities: BTreeSet<&str> = triples
            .iter()
            .flat_map(|t| [t.subject.as_str(), t.object.as_str()])
            .collect();
        let relations: BTreeSet<&str> = triples.iter().map(|t| t.predicate.as_str()).collect();

        for (i, name) in entities.iter().enumerate() {
            prop_assert_eq!(model.ent_to_idx()[*name], i);
        }
        for (i, name) in relations.iter().enumerate() {
            prop_assert_eq!(model.rel_to_idx()[*name], i);
        }

        let width = if kind == ModelKind::ComplEx { 2 * k } else { k };
        let tables = model.trained_model_params();
        prop_assert_eq!(tables[0].dim(), (entities.len(), width));
        prop_assert_eq!(tables[1].dim(), (relations.len(), width));
    }

    #[test]
    fn prop_binary_roundtrip_is_identity(
        kind in arb_kind(),
        triples in arb_triples(),
        seed in any::<u64>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let mut model = EmbeddingModel::new(kind, params(4, seed));
        model.fit(&triples).unwrap();
        save_model(&model, &path).unwrap();

        let restored = restore_model(&path).unwrap();
        prop_assert_eq!(restored.state_mismatch(&model), None);
        prop_assert_eq!(restored.predict(&triples).unwrap(), model.predict(&triples).unwrap());
    }
}
