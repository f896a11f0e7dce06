use splsa::prelude::*;

#[test]
fn test_read_configuration() {
    let settings = settings::load("tests/data/config.toml").expect("valid settings");

    assert_eq!(settings.config.link, LinkType::Quadratic);
    assert_eq!(settings.config.evaluation, Purpose::Testing);
    assert!(settings.config.single_run);

    assert_eq!(settings.sweep.topics, vec![2, 3]);
    assert_eq!(settings.sweep.lambdas, vec![0.25, 0.5]);
    assert_eq!(settings.sweep.etas, vec![0.5]);
    assert_eq!(settings.sweep.len(), 4);

    assert_eq!(settings.convergence.max_iterations, 25);
    assert_eq!(settings.advanced.max_theta_iterations, 5);
    assert_eq!(settings.prior.seed, 7);
    assert_eq!(settings.output.top_words, 3);
    assert_eq!(settings.log.level, "debug");
}

#[test]
fn test_missing_entries_use_defaults() {
    let settings = settings::load("tests/data/config.toml").expect("valid settings");

    assert_eq!(settings.advanced.max_v_iterations, 100);
    assert_eq!(settings.advanced.initial_step, 500.0);
    assert_eq!(settings.advanced.step_shrinkage, 0.9);
    assert_eq!(settings.advanced.smoothing, 1e-80);
    assert_eq!(settings.convergence.difference, 1e-10);
    assert_eq!(settings.data.vocabulary_size, None);
}

#[test]
fn test_unknown_entries_are_rejected() {
    assert!(settings::load("tests/data/invalid_config.toml").is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(settings::load("tests/data/does_not_exist.toml").is_err());
}

#[test]
fn test_datasets_from_configuration() {
    let settings = settings::load("tests/data/config.toml").expect("valid settings");
    let datasets = Datasets::load(&settings.data).expect("readable datasets");

    // The vocabulary file sets the size, and blank lines are skipped
    assert_eq!(datasets.training.vocabulary_size(), 4);
    assert_eq!(datasets.training.ndocs(), 3);
    assert_eq!(datasets.training_outcomes.len(), 3);

    assert_eq!(datasets.evaluation.ndocs(), 2);
    assert_eq!(datasets.evaluation.total_word_count(), 8);
    let vocabulary: Vec<String> = ["budget", "tax", "vote", "war"]
        .iter()
        .map(|word| word.to_string())
        .collect();
    assert_eq!(datasets.vocabulary, Some(vocabulary));
}
