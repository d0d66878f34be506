//! DistMult: Bilinear Diagonal.
//!
//! [Yang et al. 2015](https://arxiv.org/abs/1412.6575) scores a triple with
//! the element-wise (Hadamard) product:
//!
//! ```text
//! score = Σᵢ hᵢ × rᵢ × tᵢ
//! ```
//!
//! Symmetric by construction: (h, r, t) and (t, r, h) always score the same.

use super::{ScoreGrad, Scorer};
use ndarray::ArrayView1;

/// DistMult scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistMult;

impl Scorer for DistMult {
    fn score(&self, h: ArrayView1<'_, f32>, r: ArrayView1<'_, f32>, t: ArrayView1<'_, f32>) -> f32 {
        (&h * &r).dot(&t)
    }

    fn gradient(
        &self,
        h: ArrayView1<'_, f32>,
        r: ArrayView1<'_, f32>,
        t: ArrayView1<'_, f32>,
    ) -> ScoreGrad {
        ScoreGrad {
            head: &r * &t,
            relation: &h * &t,
            tail: &h * &r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_distmult_is_symmetric() {
        let h = array![0.2, -0.5, 1.0];
        let r = array![1.5, 0.3, -0.7];
        let t = array![0.9, 0.1, 0.4];

        let forward = DistMult.score(h.view(), r.view(), t.view());
        let backward = DistMult.score(t.view(), r.view(), h.view());
        assert!((forward - backward).abs() < 1e-6);
    }

    #[test]
    fn test_distmult_value() {
        let h = array![1.0, 2.0];
        let r = array![3.0, 4.0];
        let t = array![5.0, 6.0];
        assert_eq!(DistMult.score(h.view(), r.view(), t.view()), 15.0 + 48.0);
    }
}
