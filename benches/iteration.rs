use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use splsa::routines::estimation::{e_step, m_step, post_step};
use splsa::routines::initialization::{gaussian_logits, pivots, stochastic_matrix};
use splsa::routines::optimization::simplex::SimplexOptimizer;
use splsa::routines::regression::Linear;
use splsa::structs::corpus::{Corpus, Document, WordCount};
use splsa::structs::simplex::Simplex;
use splsa::structs::statistics::Statistics;

const DOCUMENTS: usize = 500;
const WORDS: usize = 2000;
const TOPICS: usize = 20;

/// A random corpus of 500 documents with 50 distinct words each
fn corpus(rng: &mut StdRng) -> Corpus {
    let documents = (0..DOCUMENTS)
        .map(|_| {
            let words = (0..50)
                .map(|_| WordCount {
                    id: rng.gen_range(0..WORDS),
                    count: rng.gen_range(1..5),
                })
                .collect();
            Document::new(words)
        })
        .collect();
    Corpus::new(documents, WORDS).expect("valid corpus")
}

fn setup() -> (Corpus, Simplex, Array2<f64>, Statistics) {
    let mut rng = StdRng::seed_from_u64(22);
    let corpus = corpus(&mut rng);
    let pivots = pivots(&mut rng, DOCUMENTS, TOPICS).expect("pivots");
    let mu = gaussian_logits(&mut rng, DOCUMENTS, TOPICS);
    let simplex = Simplex::new(mu, pivots).expect("simplex");
    let beta = stochastic_matrix(&mut rng, TOPICS, WORDS);
    let statistics = Statistics::new(DOCUMENTS, TOPICS, WORDS);
    (corpus, simplex, beta, statistics)
}

/// Benchmark a full expectation-maximization update of the topics
fn benchmark_em(c: &mut Criterion) {
    let (corpus, simplex, beta, mut statistics) = setup();
    c.bench_function("em", |b| {
        b.iter(|| {
            statistics.clear();
            e_step(&corpus, simplex.theta(), beta.view(), 1e-80, &mut statistics);
            let beta = m_step(&statistics, 1e-80);
            post_step(&corpus, simplex.theta(), beta.view(), 1e-80, &mut statistics);
            black_box(beta);
        });
    });
}

/// Benchmark the gradient ascent on the topic proportions
fn benchmark_simplex(c: &mut Criterion) {
    let (corpus, simplex, beta, mut statistics) = setup();
    e_step(&corpus, simplex.theta(), beta.view(), 1e-80, &mut statistics);
    post_step(&corpus, simplex.theta(), beta.view(), 1e-80, &mut statistics);
    let outcomes = Array1::from_shape_fn(DOCUMENTS, |d| (d % 10) as f64 / 10.0);
    let v = Array1::from_elem(TOPICS + 1, 0.1);
    let optimizer = SimplexOptimizer {
        link: &Linear,
        lambda: 0.5,
        total_words: corpus.total_word_count() as f64,
        smoothing: 1e-80,
        passes: 20,
        training: true,
    };

    c.bench_function("simplex", |b| {
        b.iter(|| {
            let mut simplex = simplex.clone();
            black_box(optimizer.optimize(
                &mut simplex,
                &statistics,
                outcomes.view(),
                v.view(),
                black_box(500.0),
            ));
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(std::time::Duration::from_secs(10))
        .noise_threshold(0.10);
    targets = benchmark_em, benchmark_simplex
}
criterion_main!(benches);
