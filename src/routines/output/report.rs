use ndarray::{ArrayView1, ArrayView2};
use std::cmp::Ordering;

/// The `count` most probable words of a topic, as `(word id, probability)` in decreasing probability
pub fn top_words(row: ArrayView1<f64>, count: usize) -> Vec<(usize, f64)> {
    let mut words: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
    words.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    words.truncate(count);
    words
}

/// Renders the most probable words of every topic
///
/// Each topic starts with a `Topic k (V = v_k).` header, the weight only being shown when `v` is given,
/// followed by one `word (probability)` line per word and a blank line. Words without an entry in the
/// vocabulary are shown by their id.
pub fn top_words_report(
    beta: ArrayView2<f64>,
    v: Option<ArrayView1<f64>>,
    vocabulary: Option<&[String]>,
    count: usize,
) -> String {
    let mut report = String::with_capacity(1024);
    for (k, row) in beta.rows().into_iter().enumerate() {
        match v {
            Some(v) => report.push_str(&format!("Topic {} (V = {}).\n", k, v[k])),
            None => report.push_str(&format!("Topic {}.\n", k)),
        }
        for (id, probability) in top_words(row, count) {
            match vocabulary.and_then(|words| words.get(id)) {
                Some(word) => report.push_str(&format!("{} ({})\n", word, probability)),
                None => report.push_str(&format!("{} ({})\n", id, probability)),
            }
        }
        report.push('\n');
    }
    report
}
