use eyre::Result;
use ndarray::{array, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use splsa::prelude::*;

fn corpus(content: &str, vocabulary_size: usize) -> Result<Corpus> {
    Corpus::new(Corpus::parse_documents(content)?, vocabulary_size)
}

fn datasets() -> Result<Datasets> {
    Datasets::new(
        corpus("0:3 1:2\n1:1 2:4\n2:2 3:1\n", 4)?,
        Outcomes::new(array![0.2, 0.8, 0.5]),
        corpus("0:2 1:1\n2:3 3:2\n", 4)?,
        Outcomes::new(array![0.3, 0.6]),
        None,
    )
}

fn settings(link: LinkType) -> Settings {
    let mut settings = Settings::default();
    settings.config.link = link;
    settings.sweep.topics = vec![2];
    settings.sweep.lambdas = vec![0.5];
    settings.sweep.etas = vec![1.0];
    settings.output.write = false;
    settings.log.write = false;
    settings
}

/// Three tiny documents with two topics, trained end to end
#[test]
fn test_training_converges() -> Result<()> {
    let settings = settings(LinkType::Linear);
    let datasets = datasets()?;
    let mut rng = StdRng::seed_from_u64(1);
    let mut sink = MemorySink::new();
    let hyper = Hyperparameters::new(2, 0.5, 1.0);

    let result = Training::new(
        &settings,
        &datasets.training,
        &datasets.training_outcomes,
        hyper,
        &mut rng,
        &mut sink,
    )?
    .fit()?;

    assert_eq!(result.status, Status::Converged);
    assert!(result.converged());
    assert!(result.iterations >= 1);
    assert!(result.iterations < settings.convergence.max_iterations);

    assert_eq!(result.beta.dim(), (2, 4));
    for sum in result.beta.sum_axis(Axis(1)).iter() {
        assert!((sum - 1.0).abs() <= 0.01);
    }
    for sum in result.theta.sum_axis(Axis(1)).iter() {
        assert!((sum - 1.0).abs() <= 0.01);
    }
    assert_eq!(result.v.len(), 3);
    assert_eq!(result.predictions.len(), 3);

    assert!(result.likelihood.joint.is_finite());
    assert!(result.likelihood.perplexity >= 1.0);

    let run = RunInfo::new(Purpose::Training, hyper);
    let trace = sink.trace(&run);
    assert_eq!(trace.len(), result.iterations);
    assert!(trace.iter().all(|p| p.likelihood.is_finite() && p.perplexity >= 1.0));
    assert_eq!(sink.labels(&run), vec!["initial", "final"]);
    assert!(sink.snapshots[0].v.is_none());
    assert!(sink.snapshots[1].v.is_some());

    Ok(())
}

#[test]
fn test_every_link_fits() -> Result<()> {
    for link in [LinkType::Linear, LinkType::Quadratic, LinkType::Sigmoid] {
        let mut settings = settings(link);
        settings.convergence.max_iterations = 15;
        // Keeps 1 - rate·λ·K/η² within (-1, 1)
        settings.advanced.sigmoid_learning_rate = 0.5;
        let datasets = datasets()?;
        let mut rng = StdRng::seed_from_u64(3);
        let mut sink = MemorySink::new();

        let result = Training::new(
            &settings,
            &datasets.training,
            &datasets.training_outcomes,
            Hyperparameters::new(2, 0.5, 1.0),
            &mut rng,
            &mut sink,
        )?
        .fit()?;

        assert_eq!(result.link, link);
        assert_eq!(result.v.len(), 3);
        assert!(result.v.iter().all(|w| w.is_finite()));
        assert!(result.likelihood.rmse.is_finite());
    }
    Ok(())
}

#[test]
fn test_seeded_runs_are_reproducible() -> Result<()> {
    let settings = settings(LinkType::Linear);
    let datasets = datasets()?;
    let hyper = Hyperparameters::new(2, 0.5, 1.0);

    let mut fits = Vec::new();
    for _ in 0..2 {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sink = MemorySink::new();
        let result = Training::new(
            &settings,
            &datasets.training,
            &datasets.training_outcomes,
            hyper,
            &mut rng,
            &mut sink,
        )?
        .fit()?;
        fits.push(result);
    }

    assert_eq!(fits[0].beta, fits[1].beta);
    assert_eq!(fits[0].v, fits[1].v);
    assert_eq!(fits[0].iterations, fits[1].iterations);
    Ok(())
}

#[test]
fn test_evaluation_keeps_the_model() -> Result<()> {
    let settings = settings(LinkType::Linear);
    let datasets = datasets()?;
    let hyper = Hyperparameters::new(2, 0.5, 1.0);
    let mut rng = StdRng::seed_from_u64(5);
    let mut sink = MemorySink::new();

    let model = Training::new(
        &settings,
        &datasets.training,
        &datasets.training_outcomes,
        hyper,
        &mut rng,
        &mut sink,
    )?
    .fit()?
    .into_fitted()?;
    let before = model.clone();

    let evaluation = Evaluation::new(
        &settings,
        &datasets.evaluation,
        &datasets.evaluation_outcomes,
        &model,
        Purpose::CrossValidation,
        hyper,
        &mut rng,
        &mut sink,
    )?
    .fit()?;

    assert_eq!(model, before);
    assert_eq!(evaluation.beta, model.beta());
    assert_eq!(evaluation.v, model.v());
    assert_eq!(evaluation.theta.dim(), (2, 2));
    assert_eq!(evaluation.predictions.len(), 2);
    assert!(evaluation.likelihood.perplexity >= 1.0);
    // Evaluation tracks the word likelihood only
    assert_eq!(evaluation.likelihood.joint, evaluation.likelihood.topic);

    let run = RunInfo::new(Purpose::CrossValidation, hyper);
    assert_eq!(sink.trace(&run).len(), evaluation.iterations);
    assert_eq!(sink.completions.len(), 2);
    Ok(())
}

#[test]
fn test_evaluation_rejects_mismatched_model() -> Result<()> {
    let settings = settings(LinkType::Linear);
    let datasets = datasets()?;
    let mut rng = StdRng::seed_from_u64(5);
    let mut sink = MemorySink::new();

    let model = Training::new(
        &settings,
        &datasets.training,
        &datasets.training_outcomes,
        Hyperparameters::new(2, 0.5, 1.0),
        &mut rng,
        &mut sink,
    )?
    .fit()?
    .into_fitted()?;

    let evaluation = Evaluation::new(
        &settings,
        &datasets.evaluation,
        &datasets.evaluation_outcomes,
        &model,
        Purpose::Testing,
        Hyperparameters::new(3, 0.5, 1.0),
        &mut rng,
        &mut sink,
    );
    assert!(evaluation.is_err());
    Ok(())
}

/// With the default learning rate the sigmoid weights grow ninefold per sweep, until `theta` or `beta` breaks
#[test]
fn test_default_sigmoid_rate_aborts_the_run() -> Result<()> {
    let settings = settings(LinkType::Sigmoid);
    let datasets = datasets()?;
    let mut rng = StdRng::seed_from_u64(settings.prior.seed);
    let mut sink = MemorySink::new();

    let error = Training::new(
        &settings,
        &datasets.training,
        &datasets.training_outcomes,
        Hyperparameters::new(2, 0.5, 1.0),
        &mut rng,
        &mut sink,
    )?
    .fit()
    .expect_err("the weights should diverge");

    let violation = error
        .downcast_ref::<StochasticViolation>()
        .expect("a stochastic violation");
    assert!(violation.matrix == "theta" || violation.matrix == "beta");
    Ok(())
}

/// A large smoothing breaks the normalization of the topics after the first update
#[test]
fn test_broken_topics_abort_the_run() -> Result<()> {
    let mut settings = settings(LinkType::Linear);
    settings.advanced.smoothing = 0.5;
    let datasets = datasets()?;
    let mut rng = StdRng::seed_from_u64(1);
    let mut sink = MemorySink::new();

    let error = Training::new(
        &settings,
        &datasets.training,
        &datasets.training_outcomes,
        Hyperparameters::new(2, 0.5, 1.0),
        &mut rng,
        &mut sink,
    )?
    .fit()
    .expect_err("the run should fail");

    let violation = error
        .downcast_ref::<StochasticViolation>()
        .expect("a stochastic violation");
    assert_eq!(violation.matrix, "beta");
    Ok(())
}

#[test]
fn test_sweep_continues_after_failures() -> Result<()> {
    let mut settings = settings(LinkType::Linear);
    settings.advanced.smoothing = 0.5;
    settings.sweep.lambdas = vec![0.25, 0.75];
    let datasets = datasets()?;
    let mut sink = MemorySink::new();

    let log = sweep(&settings, &datasets, &mut sink)?;

    assert_eq!(log.records().len(), 2);
    assert!(log.records().iter().all(|r| r.is_failed()));
    assert!(log.records()[0].status.starts_with("Failed"));
    assert!(log.best().is_none());
    Ok(())
}

#[test]
fn test_sweep_order_and_single_run() -> Result<()> {
    let mut settings = settings(LinkType::Linear);
    settings.convergence.max_iterations = 5;
    settings.sweep.topics = vec![2, 3];
    settings.sweep.etas = vec![0.5, 1.0];
    settings.sweep.lambdas = vec![0.2, 0.8];
    let datasets = datasets()?;

    let mut sink = MemorySink::new();
    let log = sweep(&settings, &datasets, &mut sink)?;
    let visited: Vec<(usize, f64, f64)> = log
        .records()
        .iter()
        .map(|r| (r.k, r.eta, r.lambda))
        .collect();
    assert_eq!(
        visited,
        vec![
            (2, 0.5, 0.2),
            (2, 0.5, 0.8),
            (2, 1.0, 0.2),
            (2, 1.0, 0.8),
            (3, 0.5, 0.2),
            (3, 0.5, 0.8),
            (3, 1.0, 0.2),
            (3, 1.0, 0.8),
        ]
    );
    assert!(log.records().iter().all(|r| !r.is_failed()));
    // Every combination trains, then evaluates
    assert_eq!(sink.runs.len(), 16);
    assert_eq!(sink.runs[1].purpose, Purpose::CrossValidation);

    settings.config.single_run = true;
    let mut sink = MemorySink::new();
    let log = sweep(&settings, &datasets, &mut sink)?;
    assert_eq!(log.records().len(), 1);
    Ok(())
}
