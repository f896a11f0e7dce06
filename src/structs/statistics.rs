use ndarray::{Array1, Array2};

/// Expected word/topic assignment counts accumulated by the EM passes
///
/// These are cleared at the start of every iteration.
#[derive(Debug, Clone)]
pub struct Statistics {
    /// Expected count of word `w` assigned to topic `k` (K×W)
    pub e_kw: Array2<f64>,
    /// Expected number of words assigned to topic `k` (K)
    pub e_k: Array1<f64>,
    /// Expected number of words of document `d` assigned to topic `k` (N×K)
    pub e_dk: Array2<f64>,
}

impl Statistics {
    pub fn new(ndocs: usize, ntopics: usize, nwords: usize) -> Self {
        Statistics {
            e_kw: Array2::zeros((ntopics, nwords)),
            e_k: Array1::zeros(ntopics),
            e_dk: Array2::zeros((ndocs, ntopics)),
        }
    }

    pub fn clear(&mut self) {
        self.e_kw.fill(0.0);
        self.e_k.fill(0.0);
        self.e_dk.fill(0.0);
    }
}
