//! Save/restore round-trip tests.
//!
//! A model restored from disk must be indistinguishable from the one that was
//! saved: same hyperparameters, index maps and arrays, and therefore the same
//! scores and embeddings.

use lattix_core::Triple;
use lattix_kge::{
    restore_model, save_model, EmbeddingModel, EmbeddingType, Error, ModelKind, ModelParams,
    OptimizerKind,
};

fn toy_graph() -> Vec<Triple> {
    [
        ("a", "y", "b"),
        ("b", "y", "a"),
        ("a", "y", "c"),
        ("c", "y", "a"),
        ("a", "y", "d"),
        ("c", "y", "d"),
        ("b", "y", "c"),
        ("f", "y", "e"),
    ]
    .into_iter()
    .map(Triple::from)
    .collect()
}

fn toy_params() -> ModelParams {
    ModelParams::default()
        .with_batches_count(2)
        .with_seed(555)
        .with_epochs(20)
        .with_k(10)
        .with_optimizer(OptimizerKind::Adagrad)
        .with_learning_rate(0.1)
}

#[test]
fn test_save_and_restore_every_model() {
    let dir = tempfile::tempdir().unwrap();
    let queries = [Triple::new("f", "y", "e"), Triple::new("b", "y", "d")];

    for kind in ModelKind::ALL {
        let mut model = EmbeddingModel::new(kind, toy_params());
        model.fit(&toy_graph()).unwrap();

        for file in ["helloworld.bin", "helloworld.json"] {
            let path = dir.path().join(file);
            save_model(&model, &path).unwrap();
            let loaded = restore_model(&path).unwrap();

            assert_eq!(loaded.kind(), kind);
            assert_eq!(loaded.all_params(), model.all_params());
            assert_eq!(loaded.is_fitted(), model.is_fitted());
            assert_eq!(loaded.ent_to_idx(), model.ent_to_idx());
            assert_eq!(loaded.rel_to_idx(), model.rel_to_idx());
            assert_eq!(
                loaded.trained_model_params().len(),
                model.trained_model_params().len()
            );
            for (after, before) in loaded
                .trained_model_params()
                .iter()
                .zip(model.trained_model_params())
            {
                assert_eq!(after, before, "{kind} via {file}");
            }

            assert_eq!(
                loaded.predict(&queries).unwrap(),
                model.predict(&queries).unwrap(),
                "{kind} via {file}"
            );
            assert_eq!(
                loaded.get_embeddings(&["a", "b"], EmbeddingType::Entity).unwrap(),
                model.get_embeddings(&["a", "b"], EmbeddingType::Entity).unwrap()
            );
            assert_eq!(loaded.state_mismatch(&model), None);

            std::fs::remove_file(&path).unwrap();
        }
    }
}

#[test]
fn test_restore_model_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("filenotfound.model");
    assert!(matches!(
        restore_model(&missing),
        Err(Error::ModelNotFound(p)) if p == missing
    ));
}

#[test]
fn test_restored_model_keeps_training_deterministically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");

    let mut model = EmbeddingModel::new(ModelKind::DistMult, toy_params());
    model.fit(&toy_graph()).unwrap();
    save_model(&model, &path).unwrap();

    // Refitting a restored model reproduces the original run.
    let mut restored = restore_model(&path).unwrap();
    restored.fit(&toy_graph()).unwrap();
    assert_eq!(restored, model);
}

#[test]
fn test_link_prediction_survives_restore() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    let mut model = EmbeddingModel::new(ModelKind::TransE, toy_params());
    model.fit(&toy_graph()).unwrap();
    save_model(&model, &path).unwrap();
    let loaded = restore_model(&path).unwrap();

    assert_eq!(
        loaded.predict_tail("a", "y", 3).unwrap(),
        model.predict_tail("a", "y", 3).unwrap()
    );
    assert_eq!(
        loaded.predict_head("y", "e", 6).unwrap(),
        model.predict_head("y", "e", 6).unwrap()
    );
}
