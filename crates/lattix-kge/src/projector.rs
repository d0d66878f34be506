//! Embedding projector export.
//!
//! Writes the plain-text files the TensorBoard embedding projector loads:
//! a tensor TSV, a metadata TSV with one label per row and a
//! `projector_config.pbtxt` that ties them together. Rows follow entity
//! index order, so row `i` of the tensor is labelled by line `i` of the
//! metadata.

use crate::error::{Error, Result};
use crate::model::EmbeddingModel;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Metadata file name.
pub const METADATA_FILE: &str = "metadata.tsv";
/// Tensor file name.
pub const EMBEDDINGS_FILE: &str = "embeddings_projector.tsv";
/// Projector config file name.
pub const CONFIG_FILE: &str = "projector_config.pbtxt";

/// Options for [`create_tensorboard_visualizations`].
#[derive(Debug, Clone)]
pub struct ProjectorOptions {
    /// One label per entity, in index order. `None` uses entity names.
    pub labels: Option<Vec<String>>,
    /// Write `metadata.tsv` (default: true).
    pub write_metadata: bool,
}

impl Default for ProjectorOptions {
    fn default() -> Self {
        Self {
            labels: None,
            write_metadata: true,
        }
    }
}

impl ProjectorOptions {
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_metadata(mut self, write_metadata: bool) -> Self {
        self.write_metadata = write_metadata;
        self
    }
}

/// Paths written by [`create_tensorboard_visualizations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorFiles {
    /// Entity embedding tensor.
    pub embeddings: PathBuf,
    /// Labels, if written.
    pub metadata: Option<PathBuf>,
    /// Projector config.
    pub config: PathBuf,
}

/// Write `metadata.tsv` into `dir`: one label per entity, in index order.
///
/// Tabs and line breaks inside labels are replaced by spaces so each label
/// stays on its own line.
pub fn write_metadata_tsv(
    dir: impl AsRef<Path>,
    model: &EmbeddingModel,
    labels: Option<&[String]>,
) -> Result<PathBuf> {
    let names = model.entity_names();
    if let Some(labels) = labels {
        if labels.len() != names.len() {
            return Err(Error::Validation(format!(
                "got {} labels for {} entities",
                labels.len(),
                names.len()
            )));
        }
    }

    let path = dir.as_ref().join(METADATA_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    match labels {
        Some(labels) => {
            for label in labels {
                writeln!(writer, "{}", sanitize(label))?;
            }
        }
        None => {
            for name in names {
                writeln!(writer, "{}", sanitize(name))?;
            }
        }
    }
    writer.flush()?;
    Ok(path)
}

/// Export the entity embeddings of a fitted model for the projector.
///
/// Creates `dir` if needed and overwrites any files of the same name.
pub fn create_tensorboard_visualizations(
    model: &EmbeddingModel,
    dir: impl AsRef<Path>,
    options: &ProjectorOptions,
) -> Result<ProjectorFiles> {
    let embeddings = model.entity_embeddings()?;
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let metadata = if options.write_metadata {
        Some(write_metadata_tsv(dir, model, options.labels.as_deref())?)
    } else {
        None
    };

    let tensor_path = dir.join(EMBEDDINGS_FILE);
    let mut writer = BufWriter::new(File::create(&tensor_path)?);
    for row in embeddings.rows() {
        let line: Vec<String> = row.iter().map(|x| x.to_string()).collect();
        writeln!(writer, "{}", line.join("\t"))?;
    }
    writer.flush()?;

    let config_path = dir.join(CONFIG_FILE);
    let mut config = String::from("embeddings {\n");
    config.push_str("  tensor_name: \"entity_embeddings\"\n");
    config.push_str(&format!("  tensor_path: \"{EMBEDDINGS_FILE}\"\n"));
    if metadata.is_some() {
        config.push_str(&format!("  metadata_path: \"{METADATA_FILE}\"\n"));
    }
    config.push_str("}\n");
    fs::write(&config_path, config)?;

    tracing::info!(
        dir = %dir.display(),
        rows = embeddings.nrows(),
        dim = embeddings.ncols(),
        "wrote projector files"
    );

    Ok(ProjectorFiles {
        embeddings: tensor_path,
        metadata,
        config: config_path,
    })
}

fn sanitize(label: &str) -> String {
    label.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;
    use crate::params::ModelParams;
    use lattix_core::Triple;

    fn fitted() -> EmbeddingModel {
        let mut model = EmbeddingModel::new(
            ModelKind::TransE,
            ModelParams::default().with_k(5).with_epochs(2).with_batches_count(1),
        );
        model
            .fit(&[
                Triple::new("a", "r", "b"),
                Triple::new("b", "r", "c"),
                Triple::new("c", "r", "a"),
            ])
            .unwrap();
        model
    }

    #[test]
    fn test_metadata_defaults_to_entity_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_metadata_tsv(dir.path(), &fitted(), None).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn test_metadata_custom_labels() {
        let dir = tempfile::tempdir().unwrap();
        let labels = vec!["first\tone".to_string(), "second".into(), "third\nline".into()];
        let path = write_metadata_tsv(dir.path(), &fitted(), Some(&labels)).unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "first one\nsecond\nthird line\n"
        );

        let short = vec!["only".to_string()];
        assert!(matches!(
            write_metadata_tsv(dir.path(), &fitted(), Some(&short)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_visualization_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tensorboard_files");
        let files =
            create_tensorboard_visualizations(&fitted(), &out, &ProjectorOptions::default()).unwrap();

        let tensor = fs::read_to_string(&files.embeddings).unwrap();
        let rows: Vec<&str> = tensor.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.split('\t').count() == 5));

        let config = fs::read_to_string(&files.config).unwrap();
        assert!(config.contains(EMBEDDINGS_FILE));
        assert!(config.contains(METADATA_FILE));
        assert_eq!(files.metadata, Some(out.join(METADATA_FILE)));
    }

    #[test]
    fn test_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let options = ProjectorOptions::default().with_metadata(false);
        let files = create_tensorboard_visualizations(&fitted(), dir.path(), &options).unwrap();

        assert!(files.metadata.is_none());
        assert!(!dir.path().join(METADATA_FILE).exists());
        assert!(!fs::read_to_string(files.config).unwrap().contains("metadata_path"));
    }

    #[test]
    fn test_unfitted_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = EmbeddingModel::new(ModelKind::DistMult, ModelParams::default());
        assert!(matches!(
            create_tensorboard_visualizations(&model, dir.path(), &ProjectorOptions::default()),
            Err(Error::NotFitted)
        ));
    }
}
