use crate::structs::{corpus::Corpus, statistics::Statistics};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1};

/// Posterior probability of every topic for a single occurrence of word `w` in a document
///
/// `p_k = (theta_k · beta[k, w] + s) / (Σ_k' theta_k' · beta[k', w] + K · s)`
pub fn responsibilities(
    theta: ArrayView1<f64>,
    beta: ArrayView2<f64>,
    w: usize,
    smoothing: f64,
    mut out: ArrayViewMut1<f64>,
) {
    let ntopics = theta.len();
    let mut denominator = ntopics as f64 * smoothing;
    for k in 0..ntopics {
        let joint = theta[k] * beta[[k, w]];
        out[k] = joint + smoothing;
        denominator += joint;
    }
    out.mapv_inplace(|p| p / denominator);
}

/// Accumulates the expected word/topic counts `e_kw` and `e_k`
pub fn e_step(
    corpus: &Corpus,
    theta: ArrayView2<f64>,
    beta: ArrayView2<f64>,
    smoothing: f64,
    statistics: &mut Statistics,
) {
    let mut p = Array1::zeros(beta.nrows());
    for (d, document) in corpus.documents().iter().enumerate() {
        for word in document.words() {
            responsibilities(theta.row(d), beta, word.id, smoothing, p.view_mut());
            let count = word.count as f64;
            for (k, &pk) in p.iter().enumerate() {
                statistics.e_kw[[k, word.id]] += count * pk;
                statistics.e_k[k] += count * pk;
            }
        }
    }
}

/// Re-estimates the topic-word matrix from the expected counts
///
/// `beta[k, w] = e_kw[k, w] / (e_k[k] + s) + s`
pub fn m_step(statistics: &Statistics, smoothing: f64) -> Array2<f64> {
    let mut beta = statistics.e_kw.clone();
    for (mut row, &total) in beta.rows_mut().into_iter().zip(statistics.e_k.iter()) {
        row.mapv_inplace(|count| count / (total + smoothing) + smoothing);
    }
    beta
}

/// Accumulates the expected number of words of each document assigned to each topic, `e_dk`
pub fn post_step(
    corpus: &Corpus,
    theta: ArrayView2<f64>,
    beta: ArrayView2<f64>,
    smoothing: f64,
    statistics: &mut Statistics,
) {
    let mut p = Array1::zeros(beta.nrows());
    for (d, document) in corpus.documents().iter().enumerate() {
        for word in document.words() {
            responsibilities(theta.row(d), beta, word.id, smoothing, p.view_mut());
            let count = word.count as f64;
            statistics
                .e_dk
                .row_mut(d)
                .scaled_add(count, &p);
        }
    }
}
