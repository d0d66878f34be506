//! ComplEx: Complex Embeddings.
//!
//! [Trouillon et al. 2016](https://arxiv.org/abs/1606.06357) extends DistMult
//! to complex space so that asymmetric relations can be modelled:
//!
//! ```text
//! score = Re(Σᵢ hᵢ × rᵢ × conj(tᵢ))
//! ```
//!
//! Rows store `k` real parts followed by `k` imaginary parts, so a model of
//! size `k` has `2k` columns.

use super::{ScoreGrad, Scorer};
use ndarray::{s, Array1, ArrayView1, Axis};

/// ComplEx scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplEx;

/// Split a `[re | im]` row into its halves.
#[inline]
fn halves(v: ArrayView1<'_, f32>) -> (ArrayView1<'_, f32>, ArrayView1<'_, f32>) {
    let k = v.len() / 2;
    v.split_at(Axis(0), k)
}

/// Inverse of [`halves`].
fn join(re: Array1<f32>, im: Array1<f32>) -> Array1<f32> {
    let k = re.len();
    let mut out = Array1::zeros(2 * k);
    out.slice_mut(s![..k]).assign(&re);
    out.slice_mut(s![k..]).assign(&im);
    out
}

impl Scorer for ComplEx {
    fn score(&self, h: ArrayView1<'_, f32>, r: ArrayView1<'_, f32>, t: ArrayView1<'_, f32>) -> f32 {
        let (h_re, h_im) = halves(h);
        let (r_re, r_im) = halves(r);
        let (t_re, t_im) = halves(t);

        // (h·r) = (h_re r_re - h_im r_im) + i (h_re r_im + h_im r_re)
        let hr_re = &h_re * &r_re - &h_im * &r_im;
        let hr_im = &h_re * &r_im + &h_im * &r_re;

        // Re((a + ib)(c - id)) = ac + bd
        hr_re.dot(&t_re) + hr_im.dot(&t_im)
    }

    fn gradient(
        &self,
        h: ArrayView1<'_, f32>,
        r: ArrayView1<'_, f32>,
        t: ArrayView1<'_, f32>,
    ) -> ScoreGrad {
        let (h_re, h_im) = halves(h);
        let (r_re, r_im) = halves(r);
        let (t_re, t_im) = halves(t);

        ScoreGrad {
            head: join(
                &r_re * &t_re + &r_im * &t_im,
                &r_re * &t_im - &r_im * &t_re,
            ),
            relation: join(
                &h_re * &t_re + &h_im * &t_im,
                &h_re * &t_im - &h_im * &t_re,
            ),
            tail: join(
                &h_re * &r_re - &h_im * &r_im,
                &h_re * &r_im + &h_im * &r_re,
            ),
        }
    }

    fn embedding_width(&self, k: usize) -> usize {
        2 * k
    }
}
