//! Saving and restoring embedding models.
//!
//! A saved model is a versioned envelope around the full [`EmbeddingModel`]
//! state. The encoding follows the file extension: `.json` is written with
//! serde_json (readable, diffable), anything else with bincode (compact,
//! bit-exact and fast to load). Both encodings restore every float exactly.
//!
//! The version header is read before the model, so a file from another
//! format version is rejected without decoding its payload. Binary decoding
//! never reads or allocates more than the file holds.

use crate::error::{Error, Result};
use crate::model::EmbeddingModel;
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Version written into every saved model.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk encoding of a saved model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// bincode.
    Binary,
    /// serde_json.
    Json,
}

impl ModelFormat {
    /// `.json` (any case) selects JSON; everything else is binary.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Binary,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    model: &'a EmbeddingModel,
}

#[derive(Deserialize)]
struct Envelope {
    model: EmbeddingModel,
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

/// The layout of `bincode::serialize`: little endian, fixed-width integers.
fn binary_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

fn check_version(format_version: u32) -> Result<()> {
    if format_version != FORMAT_VERSION {
        return Err(Error::Validation(format!(
            "unsupported model format version {format_version} (expected {FORMAT_VERSION})"
        )));
    }
    Ok(())
}

/// Save a model to `path`, replacing any existing file.
///
/// Unfitted models can be saved too; they restore as unfitted.
pub fn save_model(model: &EmbeddingModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = ModelFormat::from_path(path);
    let envelope = EnvelopeRef {
        format_version: FORMAT_VERSION,
        model,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        ModelFormat::Json => serde_json::to_writer(&mut writer, &envelope)?,
        ModelFormat::Binary => binary_options().serialize_into(&mut writer, &envelope)?,
    }
    writer.flush()?;

    tracing::info!(
        path = %path.display(),
        ?format,
        model = %model.kind(),
        fitted = model.is_fitted(),
        "saved model"
    );
    Ok(())
}

/// Restore a model previously written by [`save_model`].
///
/// Fails with [`Error::ModelNotFound`] if nothing exists at `path`, and with
/// [`Error::Validation`] if the file was written by an unknown format version
/// or holds an inconsistent state.
pub fn restore_model(path: impl AsRef<Path>) -> Result<EmbeddingModel> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::ModelNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let format = ModelFormat::from_path(path);
    let len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let model = match format {
        ModelFormat::Json => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            let header: Header = serde_json::from_slice(&bytes)?;
            check_version(header.format_version)?;
            serde_json::from_slice::<Envelope>(&bytes)?.model
        }
        ModelFormat::Binary => {
            let version: u32 = binary_options()
                .with_limit(len)
                .deserialize_from(&mut reader)?;
            check_version(version)?;
            let model: EmbeddingModel = binary_options()
                .with_limit(len)
                .deserialize_from(&mut reader)?;
            model
        }
    };
    model.check_consistency()?;

    tracing::info!(
        path = %path.display(),
        ?format,
        model = %model.kind(),
        entities = model.num_entities(),
        relations = model.num_relations(),
        "restored model"
    );
    Ok(model)
}
