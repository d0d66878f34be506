//! Lattix CLI - Triples and embedding models from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Turn a CSV table into triples
//! lattix triples iris.csv --schema species:has_sepal_length:sepal_length -o triples.csv
//!
//! # Train a model and save it (.json for JSON, anything else for binary)
//! lattix fit triples.csv -o model.bin --model complex --k 50 --epochs 100
//!
//! # Score triples and read embeddings back from the saved model
//! lattix predict model.bin --triple setosa,has_sepal_length,5.1
//! lattix embeddings model.bin setosa versicolor
//!
//! # Show what a saved model contains
//! lattix inspect model.bin
//!
//! # Export for the TensorBoard embedding projector
//! lattix projector model.bin tensorboard_files
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lattix_core::{dataframe_to_triples_with, Csv, MissingValues, SchemaEntry, Table, Triple};
use lattix_kge::{
    create_tensorboard_visualizations, restore_model, save_model, EmbeddingModel, EmbeddingType,
    EpochMetrics, LossKind, ModelKind, ModelParams, OptimizerKind, ProjectorOptions,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "lattix")]
#[command(about = "Knowledge graph triples and embedding models", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CSV table into triples
    Triples {
        /// Input table (CSV with a header row)
        input: PathBuf,

        /// Rule `subject_column:predicate:object_column` (repeatable)
        #[arg(short, long = "schema", required = true)]
        schema: Vec<SchemaEntry>,

        /// Output file (.nt for N-Triples, otherwise CSV); stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop triples whose subject or object cell is empty
        #[arg(long)]
        skip_missing: bool,
    },

    /// Train an embedding model and save it
    Fit {
        /// Training triples (CSV subject,predicate,object or N-Triples)
        input: PathBuf,

        /// Where to save the model (.json for JSON, otherwise binary)
        #[arg(short, long)]
        output: PathBuf,

        /// Model kind
        #[arg(short, long, default_value = "transe")]
        model: ModelKind,

        /// Hyperparameters as JSON (flags below override it)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Embedding size
        #[arg(long)]
        k: Option<usize>,

        /// Training epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Batches per epoch
        #[arg(long)]
        batches: Option<usize>,

        /// Negatives per positive
        #[arg(long)]
        eta: Option<usize>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Learning rate
        #[arg(long)]
        lr: Option<f32>,

        /// Optimizer (sgd, adagrad, adam)
        #[arg(long)]
        optimizer: Option<OptimizerKind>,

        /// Loss (pairwise, nll)
        #[arg(long)]
        loss: Option<LossKind>,

        /// Pairwise margin
        #[arg(long)]
        margin: Option<f32>,

        /// TransE distance norm (1 or 2)
        #[arg(long)]
        norm: Option<u8>,
    },

    /// Score triples with a saved model
    Predict {
        /// Saved model
        model: PathBuf,

        /// Triple `head,relation,tail` (repeatable); CSV quoting allowed, e.g. `"a,b",rel,c`
        #[arg(short, long = "triple", required = true)]
        triples: Vec<String>,
    },

    /// Print embedding rows from a saved model
    Embeddings {
        /// Saved model
        model: PathBuf,

        /// Entity (or relation) names
        #[arg(required = true)]
        names: Vec<String>,

        /// Read relation embeddings instead of entity embeddings
        #[arg(long)]
        relation: bool,
    },

    /// Show what a saved model contains
    Inspect {
        /// Saved model
        model: PathBuf,
    },

    /// Export entity embeddings for the TensorBoard projector
    Projector {
        /// Saved model
        model: PathBuf,

        /// Output directory
        dir: PathBuf,

        /// File with one label per entity, in index order
        #[arg(long)]
        labels: Option<PathBuf>,

        /// Do not write metadata.tsv
        #[arg(long)]
        no_metadata: bool,
    },
}

/// Hyperparameter overrides from the command line.
struct ParamFlags {
    config: Option<PathBuf>,
    k: Option<usize>,
    epochs: Option<usize>,
    batches: Option<usize>,
    eta: Option<usize>,
    seed: Option<u64>,
    lr: Option<f32>,
    optimizer: Option<OptimizerKind>,
    loss: Option<LossKind>,
    margin: Option<f32>,
    norm: Option<u8>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Triples {
            input,
            schema,
            output,
            skip_missing,
        } => cmd_triples(&input, &schema, output.as_deref(), skip_missing),
        Commands::Fit {
            input,
            output,
            model,
            config,
            k,
            epochs,
            batches,
            eta,
            seed,
            lr,
            optimizer,
            loss,
            margin,
            norm,
        } => {
            let flags = ParamFlags {
                config,
                k,
                epochs,
                batches,
                eta,
                seed,
                lr,
                optimizer,
                loss,
                margin,
                norm,
            };
            cmd_fit(&input, &output, model, flags)
        }
        Commands::Predict { model, triples } => cmd_predict(&model, &triples),
        Commands::Embeddings {
            model,
            names,
            relation,
        } => cmd_embeddings(&model, &names, relation),
        Commands::Inspect { model } => cmd_inspect(&model),
        Commands::Projector {
            model,
            dir,
            labels,
            no_metadata,
        } => cmd_projector(&model, &dir, labels.as_deref(), no_metadata),
    }
}

fn load_model(path: &Path) -> Result<EmbeddingModel> {
    restore_model(path).with_context(|| format!("Failed to restore model {}", path.display()))
}

fn is_ntriples(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "nt")
}

fn load_triples(path: &Path) -> Result<Vec<Triple>> {
    if is_ntriples(path) {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                Triple::from_ntriples(line)
                    .with_context(|| format!("Failed to parse N-Triples line in {}", path.display()))
            })
            .collect()
    } else {
        Csv::read_triples_path(path)
            .with_context(|| format!("Failed to parse CSV {}", path.display()))
    }
}

fn cmd_triples(
    input: &Path,
    schema: &[SchemaEntry],
    output: Option<&Path>,
    skip_missing: bool,
) -> Result<()> {
    let table = Table::from_csv_path(input)
        .with_context(|| format!("Failed to load table {}", input.display()))?;
    let missing = if skip_missing {
        MissingValues::Skip
    } else {
        MissingValues::Keep
    };
    let triples = dataframe_to_triples_with(&table, schema, missing)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            if is_ntriples(path) {
                let mut writer = BufWriter::new(file);
                for triple in &triples {
                    writeln!(writer, "{}", triple.to_ntriples())?;
                }
                writer.flush()?;
            } else {
                Csv::write_triples(file, &triples)?;
            }
            eprintln!(
                "Wrote {} triples ({} rows x {} rules) to {}",
                triples.len(),
                table.num_rows(),
                schema.len(),
                path.display()
            );
        }
        None => Csv::write_triples(io::stdout().lock(), &triples)?,
    }
    Ok(())
}

fn build_params(flags: ParamFlags) -> Result<ModelParams> {
    let mut params = match &flags.config {
        Some(path) => ModelParams::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ModelParams::default(),
    };

    if let Some(k) = flags.k {
        params = params.with_k(k);
    }
    if let Some(epochs) = flags.epochs {
        params = params.with_epochs(epochs);
    }
    if let Some(batches) = flags.batches {
        params = params.with_batches_count(batches);
    }
    if let Some(eta) = flags.eta {
        params = params.with_eta(eta);
    }
    if let Some(seed) = flags.seed {
        params = params.with_seed(seed);
    }
    if let Some(lr) = flags.lr {
        params = params.with_learning_rate(lr);
    }
    if let Some(optimizer) = flags.optimizer {
        params = params.with_optimizer(optimizer);
    }
    if let Some(loss) = flags.loss {
        params = params.with_loss(loss);
    }
    if let Some(margin) = flags.margin {
        params = params.with_margin(margin);
    }
    if let Some(norm) = flags.norm {
        params = params.with_norm(norm);
    }

    params.validate().context("Invalid hyperparameters")?;
    Ok(params)
}

fn cmd_fit(input: &Path, output: &Path, kind: ModelKind, flags: ParamFlags) -> Result<()> {
    let triples = load_triples(input)?;
    if triples.is_empty() {
        bail!("No triples found in {}", input.display());
    }
    let params = build_params(flags)?;
    let epochs = params.epochs;

    println!(
        "Training {} on {} triples (k={}, epochs={})...",
        kind,
        triples.len(),
        params.k,
        epochs
    );
    let start = Instant::now();

    let pb = ProgressBar::new(epochs as u64);
    pb.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} epochs {msg}")
            .context("Invalid progress template")?,
    );
    let progress = pb.clone();
    let callback = Box::new(move |_epoch: usize, metrics: &EpochMetrics| {
        progress.inc(1);
        progress.set_message(format!("loss {:.4}", metrics.loss));
    });

    let mut model = EmbeddingModel::new(kind, params);
    let summary = model
        .fit_with_callback(&triples, callback)
        .with_context(|| format!("Failed to train on {}", input.display()))?;
    pb.finish_and_clear();

    println!(
        "Trained in {:.2?}: {} entities, {} relations, final loss {:.4}",
        start.elapsed(),
        model.num_entities(),
        model.num_relations(),
        summary.final_loss()
    );

    save_model(&model, output)
        .with_context(|| format!("Failed to save model to {}", output.display()))?;
    println!("Saved model to {}", output.display());
    Ok(())
}

/// One CSV record, quoted like the output of `lattix triples`.
fn parse_triple(raw: &str) -> Result<Triple> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let record = reader
        .records()
        .next()
        .transpose()
        .with_context(|| format!("Failed to parse triple '{raw}'"))?;

    match record.as_ref().map(|r| r.iter().collect::<Vec<_>>()).as_deref() {
        Some([h, r, t]) => Ok(Triple::new(*h, *r, *t)),
        _ => bail!("Expected head,relation,tail but got '{raw}'"),
    }
}

fn cmd_predict(path: &Path, raw: &[String]) -> Result<()> {
    let model = load_model(path)?;
    let triples = raw
        .iter()
        .map(|t| parse_triple(t))
        .collect::<Result<Vec<_>>>()?;
    let scores = model.predict(&triples).context("Failed to score triples")?;

    for (triple, score) in triples.iter().zip(scores) {
        println!(
            "{}\t{}\t{}\t{:.6}",
            triple.subject, triple.predicate, triple.object, score
        );
    }
    Ok(())
}

fn cmd_embeddings(path: &Path, names: &[String], relation: bool) -> Result<()> {
    let model = load_model(path)?;
    let embedding_type = if relation {
        EmbeddingType::Relation
    } else {
        EmbeddingType::Entity
    };
    let embeddings = model
        .get_embeddings(names, embedding_type)
        .context("Failed to read embeddings")?;

    for (name, row) in names.iter().zip(embeddings.rows()) {
        let values: Vec<String> = row.iter().map(|x| x.to_string()).collect();
        println!("{}\t{}", name, values.join("\t"));
    }
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let model = load_model(path)?;

    println!("Embedding Model");
    println!("===============");
    println!("Model:          {}", model.name());
    println!("Fitted:         {}", model.is_fitted());
    println!("Entities:       {}", model.num_entities());
    println!("Relations:      {}", model.num_relations());
    println!("Embedding dim:  {}", model.embedding_dim());
    println!(
        "Parameters:     {}",
        serde_json::to_string(model.all_params())?
    );
    Ok(())
}

fn cmd_projector(path: &Path, dir: &Path, labels: Option<&Path>, no_metadata: bool) -> Result<()> {
    let model = load_model(path)?;

    let mut options = ProjectorOptions::default().with_metadata(!no_metadata);
    if let Some(labels) = labels {
        let content = fs::read_to_string(labels)
            .with_context(|| format!("Failed to read labels {}", labels.display()))?;
        options = options.with_labels(content.lines().map(String::from).collect());
    }

    let files = create_tensorboard_visualizations(&model, dir, &options)
        .with_context(|| format!("Failed to write projector files to {}", dir.display()))?;

    println!("Wrote {}", files.embeddings.display());
    if let Some(metadata) = &files.metadata {
        println!("Wrote {}", metadata.display());
    }
    println!("Wrote {}", files.config.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triple_plain() {
        assert_eq!(
            parse_triple(" a , y ,b").unwrap(),
            Triple::new("a", "y", "b")
        );
    }

    #[test]
    fn test_parse_triple_quoted_comma() {
        assert_eq!(
            parse_triple(r#""Smith, J.",knows,"a ""b"" c""#).unwrap(),
            Triple::new("Smith, J.", "knows", "a \"b\" c")
        );
    }

    #[test]
    fn test_parse_triple_wrong_arity() {
        assert!(parse_triple("a,b").is_err());
        assert!(parse_triple("a,b,c,d").is_err());
        assert!(parse_triple("").is_err());
    }
}
