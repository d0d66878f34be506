//! TransE: Relations as Translations.
//!
//! TransE ([Bordes et al. 2013](https://papers.nips.cc/paper/2013/hash/1cecc7a77928ca8133fa24680a88d2f9-Abstract.html))
//! interprets relations as translations in embedding space:
//!
//! ```text
//! h + r ≈ t  (if the triple is true)
//! ```
//!
//! # Scoring
//!
//! Score = -||h + r - t||ₚ for p = 1 (Manhattan) or p = 2 (Euclidean).
//!
//! Higher scores indicate more plausible triples.

use super::{ScoreGrad, Scorer};
use ndarray::{Array1, ArrayView1};

/// Below this distance the L2 gradient is taken as zero.
const L2_EPS: f32 = 1e-12;

/// TransE scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransE {
    norm: u8,
}

impl TransE {
    /// Create a TransE scorer with the given distance norm (1 or 2; anything
    /// other than 2 is treated as 1).
    pub fn new(norm: u8) -> Self {
        Self { norm }
    }

    /// Translation residual `h + r - t`.
    #[inline]
    fn residual(h: ArrayView1<'_, f32>, r: ArrayView1<'_, f32>, t: ArrayView1<'_, f32>) -> Array1<f32> {
        &h + &r - &t
    }
}

impl Scorer for TransE {
    fn score(&self, h: ArrayView1<'_, f32>, r: ArrayView1<'_, f32>, t: ArrayView1<'_, f32>) -> f32 {
        let d = Self::residual(h, r, t);
        if self.norm == 2 {
            -d.dot(&d).sqrt()
        } else {
            -d.iter().map(|x| x.abs()).sum::<f32>()
        }
    }

    fn gradient(
        &self,
        h: ArrayView1<'_, f32>,
        r: ArrayView1<'_, f32>,
        t: ArrayView1<'_, f32>,
    ) -> ScoreGrad {
        let d = Self::residual(h, r, t);

        // d(-‖d‖)/dd; h and r enter with +1, t with -1.
        let dd = if self.norm == 2 {
            let dist = d.dot(&d).sqrt();
            if dist > L2_EPS {
                d.mapv(|x| -x / dist)
            } else {
                Array1::zeros(d.len())
            }
        } else {
            d.mapv(|x| {
                if x > 0.0 {
                    -1.0
                } else if x < 0.0 {
                    1.0
                } else {
                    0.0
                }
            })
        };

        ScoreGrad {
            head: dd.clone(),
            relation: dd.clone(),
            tail: -dd,
        }
    }
}
