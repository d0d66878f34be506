//! End to end: CSV table -> triples -> trained model -> disk -> restored model.

use lattix::{
    dataframe_to_triples, restore_model, save_model, EmbeddingModel, EmbeddingType, ModelKind,
    ModelParams, SchemaEntry, Table,
};

const IRIS_HEAD: &str = "\
sepal_length,sepal_width,petal_length,petal_width,species
5.1,3.5,1.4,0.2,setosa
4.9,3.0,1.4,0.2,setosa
7.0,3.2,4.7,1.4,versicolor
6.4,3.2,4.5,1.5,versicolor
6.3,3.3,6.0,2.5,virginica
";

#[test]
fn test_table_to_restored_model() {
    let table = Table::from_csv_reader(IRIS_HEAD.as_bytes()).unwrap();
    let schema = [
        SchemaEntry::new("species", "has_sepal_length", "sepal_length"),
        SchemaEntry::new("species", "has_petal_length", "petal_length"),
    ];
    let triples = dataframe_to_triples(&table, &schema).unwrap();
    assert_eq!(triples.len(), 10);
    assert_eq!(triples[0].as_array(), ["setosa", "has_sepal_length", "5.1"]);

    let params = ModelParams::default()
        .with_k(8)
        .with_epochs(10)
        .with_batches_count(2)
        .with_seed(7);
    let mut model = EmbeddingModel::new(ModelKind::DistMult, params);
    model.fit(&triples).unwrap();
    assert_eq!(model.num_relations(), 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iris.bin");
    save_model(&model, &path).unwrap();
    let restored = restore_model(&path).unwrap();

    assert_eq!(restored, model);
    assert_eq!(
        restored.predict(&triples).unwrap(),
        model.predict(&triples).unwrap()
    );
    assert_eq!(
        restored
            .get_embeddings(&["setosa", "virginica"], EmbeddingType::Entity)
            .unwrap(),
        model
            .get_embeddings(&["setosa", "virginica"], EmbeddingType::Entity)
            .unwrap()
    );
}

#[test]
fn test_facade_exposes_member_crates() {
    let err = lattix::kge::restore_model("does/not/exist.bin").unwrap_err();
    assert!(matches!(err, lattix::kge::Error::ModelNotFound(_)));

    let table = Table::new(["species"]);
    let schema = [SchemaEntry::new("species", "p", "abc")];
    assert!(matches!(
        dataframe_to_triples(&table, &schema),
        Err(lattix::core::Error::MissingColumn(_))
    ));
}
