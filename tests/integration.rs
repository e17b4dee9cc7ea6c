//! End-to-end tests for the rule learner.
//!
//! These tests exercise the full pipeline: parsing facts and modes, compiling
//! the fact store, proving clauses, growing a clause with the builder, and
//! predicting through the public learners.

use rand::SeedableRng;
use rand::rngs::StdRng;

use relrules::error::ConfigError;
use relrules::grammar::{parse_facts, parse_modes};
use relrules::learner::{LearnerConfig, Limit, RuleClassifier, RuleLearner};
use relrules::prover::{Bindings, Prover, Weighting};
use relrules::store::FactStore;
use relrules::structure::{
    BuilderConfig, ClauseBuilder, LeafStatistics, SearchSpace, StopReason, Strategy,
};
use relrules::{Fact, Literal, RulesError, Term};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const FAMILY_MODES: [&str; 4] = [
    "male(+name).",
    "childof(+name,+name).",
    "siblingof(+name,-name).",
    "father(+name,+name).",
];

fn family_facts() -> Vec<Fact> {
    parse_facts([
        "male(mrgranger).",
        "male(jamespotter).",
        "male(harrypotter).",
        "male(luciusmalfoy).",
        "male(dracomalfoy).",
        "male(arthurweasley).",
        "male(ronweasley).",
        "male(fredweasley).",
        "male(georgeweasley).",
        "male(hagrid).",
        "male(dumbledore).",
        "male(xenophiliuslovegood).",
        "male(cygnusblack).",
        "siblingof(ronweasley,fredweasley).",
        "siblingof(ronweasley,georgeweasley).",
        "siblingof(ronweasley,ginnyweasley).",
        "siblingof(fredweasley,ronweasley).",
        "siblingof(fredweasley,georgeweasley).",
        "siblingof(fredweasley,ginnyweasley).",
        "siblingof(georgeweasley,ronweasley).",
        "siblingof(georgeweasley,fredweasley).",
        "siblingof(georgeweasley,ginnyweasley).",
        "siblingof(ginnyweasley,ronweasley).",
        "siblingof(ginnyweasley,fredweasley).",
        "siblingof(ginnyweasley,georgeweasley).",
        "childof(mrgranger,hermione).",
        "childof(mrsgranger,hermione).",
        "childof(jamespotter,harrypotter).",
        "childof(lilypotter,harrypotter).",
        "childof(luciusmalfoy,dracomalfoy).",
        "childof(narcissamalfoy,dracomalfoy).",
        "childof(arthurweasley,ronweasley).",
        "childof(mollyweasley,ronweasley).",
        "childof(arthurweasley,fredweasley).",
        "childof(mollyweasley,fredweasley).",
        "childof(arthurweasley,georgeweasley).",
        "childof(mollyweasley,georgeweasley).",
        "childof(arthurweasley,ginnyweasley).",
        "childof(mollyweasley,ginnyweasley).",
        "childof(xenophiliuslovegood,lunalovegood).",
        "childof(cygnusblack,narcissamalfoy).",
    ])
    .unwrap()
}

fn father_examples() -> Vec<Fact> {
    parse_facts([
        "0.0::father(harrypotter,mrgranger).",
        "0.0::father(harrypotter,mrsgranger).",
        "0.0::father(georgeweasley,xenophiliuslovegood).",
        "0.0::father(luciusmalfoy,xenophiliuslovegood).",
        "0.0::father(harrypotter,hagrid).",
        "0.0::father(ginnyweasley,dracomalfoy).",
        "0.0::father(hagrid,dracomalfoy).",
        "0.0::father(hagrid,dumbledore).",
        "0.0::father(lunalovegood,dumbledore).",
        "0.0::father(hedwig,narcissamalfoy).",
        "0.0::father(hedwig,lunalovegood).",
        "0.0::father(ronweasley,hedwig).",
        "0.0::father(mollyweasley,cygnusblack).",
        "0.0::father(arthurweasley,mollyweasley).",
        "0.0::father(georgeweasley,fredweasley).",
        "0.0::father(fredweasley,georgeweasley).",
        "0.0::father(ronweasley,georgeweasley).",
        "0.0::father(ronweasley,hermione).",
        "0.0::father(dracomalfoy,narcissamalfoy).",
        "0.0::father(hermione,mrsgranger).",
        "0.0::father(ginnyweasley,mollyweasley).",
        "father(harrypotter,jamespotter).",
        "father(dracomalfoy,luciusmalfoy).",
        "father(ginnyweasley,arthurweasley).",
        "father(ronweasley,arthurweasley).",
        "father(fredweasley,arthurweasley).",
    ])
    .unwrap()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[test]
fn builder_learns_father_rule() {
    init_tracing();
    let background = family_facts();
    let modes = parse_modes(FAMILY_MODES).unwrap();
    let space = SearchSpace::new("father", modes, &background).unwrap();
    let store = FactStore::compile(background.clone());
    let config = BuilderConfig {
        max_literals: Some(3),
        strategy: Strategy::Best,
        ..Default::default()
    };

    for seed in [0, 1, 17, 2024] {
        let mut rng = StdRng::seed_from_u64(seed);
        let learned =
            ClauseBuilder::new(&space, &store, &config).build(&father_examples(), &mut rng);

        assert_eq!(learned.clause.to_string(), "childof(B, A), male(B)");
        assert_eq!(
            learned.leaves,
            vec![
                LeafStatistics {
                    matched: 0.625,
                    unmatched: 0.0
                },
                LeafStatistics {
                    matched: 1.0,
                    unmatched: 0.0
                },
            ]
        );
        assert_eq!(learned.stop, StopReason::Pure);
        assert_eq!(learned.head, vec!["A", "B"]);
    }
}

#[test]
fn builder_respects_single_literal_limit() {
    let background = family_facts();
    let modes = parse_modes(FAMILY_MODES).unwrap();
    let space = SearchSpace::new("father", modes, &background).unwrap();
    let store = FactStore::compile(background.clone());
    let config = BuilderConfig {
        max_literals: Some(1),
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(3);

    let learned = ClauseBuilder::new(&space, &store, &config).build(&father_examples(), &mut rng);
    assert_eq!(learned.clause.to_string(), "childof(B, A)");
    assert_eq!(learned.stop, StopReason::MaxLiterals);
}

#[test]
fn roulette_builder_always_improves_on_the_root() {
    let background = family_facts();
    let modes = parse_modes(FAMILY_MODES).unwrap();
    let space = SearchSpace::new("father", modes, &background).unwrap();
    let store = FactStore::compile(background.clone());
    let config = BuilderConfig {
        max_literals: Some(3),
        strategy: Strategy::Roulette,
        ..Default::default()
    };

    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let learned =
            ClauseBuilder::new(&space, &store, &config).build(&father_examples(), &mut rng);
        assert!(learned.clause.len() <= 3);
        assert_eq!(learned.leaves.len(), learned.clause.len());
        for leaf in &learned.leaves {
            assert!((0.0..=1.0).contains(&leaf.matched));
            assert!((0.0..=1.0).contains(&leaf.unmatched));
        }
    }
}

// ---------------------------------------------------------------------------
// Prover
// ---------------------------------------------------------------------------

#[test]
fn prover_reports_weighted_strengths() {
    let store = FactStore::from_lines([
        "2.0::actor(john).",
        "actor(maria).",
        "director(isaac).",
        "3.4::movie(movie1,john).",
        "movie(movie1,isaac).",
    ])
    .unwrap();
    let var = |name: &str| Term::variable(name);
    let clause = vec![
        Literal::new("actor", vec![var("A")]),
        Literal::new("director", vec![var("B")]),
        Literal::new("movie", vec![var("C"), var("A")]),
        Literal::new("movie", vec![var("C"), var("B")]),
    ];
    let bindings = Bindings::from_head(&["A", "B"], &["john", "isaac"]);
    let prover = Prover::new(&store);

    assert_eq!(
        prover.prove(&bindings, &clause, Weighting::Weighted),
        vec![2.0, 1.0, 3.4, 1.0]
    );
    assert_eq!(
        prover.prove(&bindings, &clause, Weighting::Ignore),
        vec![1.0, 1.0, 1.0, 1.0]
    );
}

// ---------------------------------------------------------------------------
// Learner
// ---------------------------------------------------------------------------

#[test]
fn classifier_fits_predicts_and_extracts_features() {
    init_tracing();
    let background = family_facts();
    let examples = father_examples();
    let config = LearnerConfig::default().with_max_literals(3).with_seed(99);
    let mut learner = RuleClassifier::from_mode_lines(FAMILY_MODES, "father", config).unwrap();

    let rules = learner.fit(&examples, &background).unwrap();
    assert_eq!(rules.clauses()[0].clause.to_string(), "childof(B, A), male(B)");

    let expected: Vec<f64> = examples.iter().map(|e| e.weight).collect();
    assert_eq!(learner.predict(&examples, &background).unwrap(), expected);
    assert_eq!(learner.predict_proba(&examples, &background).unwrap(), expected);

    let features = learner.extract_features(&examples, &background).unwrap();
    assert_eq!(features.len(), examples.len());
    // mother of the child: parent found, not male
    assert_eq!(features[18], vec![1.0, 0.0]);
    // unrelated pair
    assert_eq!(features[0], vec![0.0, 0.0]);
    // an actual father
    assert_eq!(features[21], vec![1.0, 1.0]);
}

#[test]
fn predicting_before_fit_is_an_error() {
    let learner =
        RuleClassifier::from_mode_lines(FAMILY_MODES, "father", LearnerConfig::default()).unwrap();
    let err = learner.predict(&father_examples(), &family_facts()).unwrap_err();
    assert!(matches!(err, RulesError::NotFitted));
}

#[test]
fn inconsistent_modes_are_rejected_at_fit() {
    let mut learner = RuleClassifier::from_mode_lines(
        ["father(+name,+name).", "male(+name).", "male(+animal)."],
        "father",
        LearnerConfig::default(),
    )
    .unwrap();
    let err = learner.fit(&father_examples(), &family_facts()).unwrap_err();
    assert!(matches!(
        err,
        RulesError::Config(ConfigError::InconsistentModes { .. })
    ));
}

#[test]
fn invalid_fraction_is_rejected_at_fit() {
    let config = LearnerConfig::default().with_min_examples(Limit::Fraction(2.0));
    let mut learner = RuleClassifier::from_mode_lines(FAMILY_MODES, "father", config).unwrap();
    let err = learner.fit(&father_examples(), &family_facts()).unwrap_err();
    assert!(matches!(
        err,
        RulesError::Config(ConfigError::InvalidFraction { .. })
    ));
}

#[test]
fn config_file_drives_a_fit() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("learner.toml");
    LearnerConfig::default()
        .with_max_literals(3)
        .with_seed(5)
        .save(&path)
        .unwrap();

    let config = LearnerConfig::load(&path).unwrap();
    let mut learner = RuleClassifier::from_mode_lines(FAMILY_MODES, "father", config).unwrap();
    let rules = learner.fit(&father_examples(), &family_facts()).unwrap();
    assert_eq!(rules.clauses()[0].leaves.len(), 2);
}
