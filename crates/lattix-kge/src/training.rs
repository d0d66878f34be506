//! Training loop for knowledge graph embeddings.
//!
//! The loop is model-agnostic: it only sees a [`Scorer`]. Each epoch:
//!
//! 1. Shuffle the positive triples and split them into `batches_count` batches.
//! 2. For each positive (h, r, t), draw `eta` negatives by replacing either
//!    the head or the tail with a uniformly random entity.
//! 3. Accumulate `dLoss/dScore * dScore/dEmbedding` into dense gradients.
//! 4. Apply one optimizer step per batch.
//!
//! All randomness (initialization, shuffling, corruption) comes from a single
//! `XorShiftRng` seeded with `ModelParams::seed`, so a fit is reproducible.

use crate::error::{Error, Result};
use crate::models::Scorer;
use crate::params::{LossKind, ModelParams, OptimizerKind};
use ndarray::{Array2, Zip};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rand_xorshift::XorShiftRng;

/// Initial Adagrad accumulator value.
const ADAGRAD_INITIAL_ACCUMULATOR: f32 = 0.1;
const ADAM_BETA1: f32 = 0.9;
const ADAM_BETA2: f32 = 0.999;
const ADAM_EPSILON: f32 = 1e-8;

/// A triple as (head row, relation row, tail row).
pub(crate) type IndexedTriple = (usize, usize, usize);

/// Training metrics from one epoch.
#[derive(Debug, Clone, Default)]
pub struct EpochMetrics {
    /// Average loss per positive triple for this epoch.
    pub loss: f32,
}

/// Callback for training progress: `(epoch, metrics)`.
pub type ProgressCallback = Box<dyn Fn(usize, &EpochMetrics) + Send + Sync>;

/// Outcome of a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    /// Epochs run.
    pub epochs: usize,
    /// Average loss per positive, one entry per epoch.
    pub loss_history: Vec<f32>,
}

impl FitSummary {
    /// Loss of the last epoch.
    pub fn final_loss(&self) -> f32 {
        self.loss_history.last().copied().unwrap_or(0.0)
    }
}

/// Xavier (Glorot) normal initialization.
pub(crate) fn xavier_normal(rows: usize, cols: usize, rng: &mut XorShiftRng) -> Result<Array2<f32>> {
    let std = (2.0 / (rows + cols).max(1) as f32).sqrt();
    let normal = Normal::new(0.0f32, std)
        .map_err(|e| Error::Validation(format!("invalid initializer: {e}")))?;
    Ok(Array2::from_shape_fn((rows, cols), |_| normal.sample(rng)))
}

/// Per-array optimizer slots.
struct Optimizer {
    kind: OptimizerKind,
    lr: f32,
    step: i32,
    /// Adagrad accumulator or Adam first moment.
    first: Vec<Array2<f32>>,
    /// Adam second moment.
    second: Vec<Array2<f32>>,
}

impl Optimizer {
    fn new(kind: OptimizerKind, lr: f32, shapes: &[(usize, usize)]) -> Self {
        let (first, second) = match kind {
            OptimizerKind::Sgd => (Vec::new(), Vec::new()),
            OptimizerKind::Adagrad => (
                shapes
                    .iter()
                    .map(|&s| Array2::from_elem(s, ADAGRAD_INITIAL_ACCUMULATOR))
                    .collect(),
                Vec::new(),
            ),
            OptimizerKind::Adam => (
                shapes.iter().map(|&s| Array2::zeros(s)).collect(),
                shapes.iter().map(|&s| Array2::zeros(s)).collect(),
            ),
        };
        Self {
            kind,
            lr,
            step: 0,
            first,
            second,
        }
    }

    fn begin_step(&mut self) {
        self.step = self.step.saturating_add(1);
    }

    /// Update `param` in place from its gradient.
    fn apply(&mut self, slot: usize, param: &mut Array2<f32>, grad: &Array2<f32>) {
        let lr = self.lr;
        match self.kind {
            OptimizerKind::Sgd => param.scaled_add(-lr, grad),
            OptimizerKind::Adagrad => {
                Zip::from(param)
                    .and(grad)
                    .and(&mut self.first[slot])
                    .for_each(|p, &g, acc| {
                        *acc += g * g;
                        *p -= lr * g / acc.sqrt();
                    });
            }
            OptimizerKind::Adam => {
                let bias1 = 1.0 - ADAM_BETA1.powi(self.step);
                let bias2 = 1.0 - ADAM_BETA2.powi(self.step);
                Zip::from(param)
                    .and(grad)
                    .and(&mut self.first[slot])
                    .and(&mut self.second[slot])
                    .for_each(|p, &g, m, v| {
                        *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
                        *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
                        let m_hat = *m / bias1;
                        let v_hat = *v / bias2;
                        *p -= lr * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
                    });
            }
        }
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// `ln(1 + e^x)` without overflow.
#[inline]
fn softplus(x: f32) -> f32 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Replace the head or the tail with a random entity.
fn corrupt(triple: IndexedTriple, num_entities: usize, rng: &mut XorShiftRng) -> IndexedTriple {
    let (h, r, t) = triple;
    let replacement = rng.gen_range(0..num_entities);
    if rng.gen_bool(0.5) {
        (replacement, r, t)
    } else {
        (h, r, replacement)
    }
}

struct Gradients {
    entities: Array2<f32>,
    relations: Array2<f32>,
}

impl Gradients {
    fn zeros(ent: &Array2<f32>, rel: &Array2<f32>) -> Self {
        Self {
            entities: Array2::zeros(ent.dim()),
            relations: Array2::zeros(rel.dim()),
        }
    }

    /// Add `weight * dScore/dEmbedding` for one triple.
    fn accumulate(
        &mut self,
        scorer: &dyn Scorer,
        ent: &Array2<f32>,
        rel: &Array2<f32>,
        (h, r, t): IndexedTriple,
        weight: f32,
    ) {
        let grad = scorer.gradient(ent.row(h), rel.row(r), ent.row(t));
        self.entities.row_mut(h).scaled_add(weight, &grad.head);
        self.relations.row_mut(r).scaled_add(weight, &grad.relation);
        self.entities.row_mut(t).scaled_add(weight, &grad.tail);
    }
}

/// Train entity and relation embeddings in place.
pub(crate) fn train(
    scorer: &dyn Scorer,
    params: &ModelParams,
    triples: &[IndexedTriple],
    ent: &mut Array2<f32>,
    rel: &mut Array2<f32>,
    rng: &mut XorShiftRng,
    callback: Option<&ProgressCallback>,
) -> Result<FitSummary> {
    let num_entities = ent.nrows();
    let batch_size = triples.len().div_ceil(params.batches_count).max(1);
    let margin = params.loss_params.margin;

    let mut optimizer = Optimizer::new(
        params.optimizer,
        params.optimizer_params.lr,
        &[ent.dim(), rel.dim()],
    );
    let mut order: Vec<usize> = (0..triples.len()).collect();
    let mut loss_history = Vec::with_capacity(params.epochs);

    for epoch in 0..params.epochs {
        order.shuffle(rng);
        let mut epoch_loss = 0.0f32;

        for batch in order.chunks(batch_size) {
            let mut grads = Gradients::zeros(ent, rel);

            for &idx in batch {
                let positive = triples[idx];
                let (h, r, t) = positive;
                let pos_score = scorer.score(ent.row(h), rel.row(r), ent.row(t));

                // dLoss / dScore(positive)
                let mut pos_weight = 0.0;
                if params.loss == LossKind::Nll {
                    epoch_loss += softplus(-pos_score);
                    pos_weight -= sigmoid(-pos_score);
                }

                for _ in 0..params.eta {
                    let negative = corrupt(positive, num_entities, rng);
                    let (nh, nr, nt) = negative;
                    let neg_score = scorer.score(ent.row(nh), rel.row(nr), ent.row(nt));

                    let neg_weight = match params.loss {
                        LossKind::Pairwise => {
                            let violation = margin - pos_score + neg_score;
                            if violation > 0.0 {
                                epoch_loss += violation;
                                pos_weight -= 1.0;
                                1.0
                            } else {
                                0.0
                            }
                        }
                        LossKind::Nll => {
                            epoch_loss += softplus(neg_score);
                            sigmoid(neg_score)
                        }
                    };

                    if neg_weight != 0.0 {
                        grads.accumulate(scorer, ent, rel, negative, neg_weight);
                    }
                }

                if pos_weight != 0.0 {
                    grads.accumulate(scorer, ent, rel, positive, pos_weight);
                }
            }

            let scale = 1.0 / batch.len() as f32;
            grads.entities *= scale;
            grads.relations *= scale;

            optimizer.begin_step();
            optimizer.apply(0, ent, &grads.entities);
            optimizer.apply(1, rel, &grads.relations);
        }

        let loss = epoch_loss / triples.len() as f32;
        if !loss.is_finite() {
            return Err(Error::Validation(format!(
                "training diverged at epoch {epoch} (loss = {loss})"
            )));
        }

        tracing::debug!(epoch, loss, "epoch finished");
        if let Some(callback) = callback {
            callback(epoch, &EpochMetrics { loss });
        }
        loss_history.push(loss);
    }

    Ok(FitSummary {
        epochs: params.epochs,
        loss_history,
    })
}
