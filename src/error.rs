//! Rich diagnostic error types for the rule learner.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly what went wrong
//! and how to fix it. Proving never fails: an unmatched literal is a normal
//! outcome encoded as zero match strength, not an error.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the rule learner.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum RulesError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("no clause has been learned yet")]
    #[diagnostic(
        code(relrules::learner::not_fitted),
        help("Call `fit` (or `fit_with_rng`) with examples and background facts before predicting.")
    )]
    NotFitted,
}

// ---------------------------------------------------------------------------
// Grammar errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GrammarError {
    #[error("malformed fact \"{line}\" at offset {offset}")]
    #[diagnostic(
        code(relrules::grammar::malformed_fact),
        help(
            "Facts and examples are written `name(arg1,arg2,...).` or \
             `weight::name(arg1,arg2,...).` with identifiers made of letters, \
             digits and underscores. Check for a missing `.` or parenthesis."
        )
    )]
    MalformedFact { line: String, offset: usize },

    #[error("malformed mode \"{line}\" at offset {offset}")]
    #[diagnostic(
        code(relrules::grammar::malformed_mode),
        help(
            "Modes are written `name(+type,-type,...)` where every argument is a \
             mode symbol immediately followed by a type name. The trailing `.` is optional."
        )
    )]
    MalformedMode { line: String, offset: usize },

    #[error("unknown mode symbol '{symbol}' in \"{line}\"")]
    #[diagnostic(
        code(relrules::grammar::unknown_mode_symbol),
        help(
            "Valid mode symbols are `+` (input), `-` (output), \
             `` ` `` (body-local output) and `#` (constant)."
        )
    )]
    UnknownModeSymbol { line: String, symbol: char },

    #[error("empty argument at position {position} in \"{line}\"")]
    #[diagnostic(
        code(relrules::grammar::empty_argument),
        help("Every argument between commas must be a non-empty identifier.")
    )]
    EmptyArgument { line: String, position: usize },

    #[error("invalid weight \"{weight}\" in \"{line}\"")]
    #[diagnostic(
        code(relrules::grammar::invalid_weight),
        help("Weights must be finite numbers, e.g. `0.5::name(a,b).`.")
    )]
    InvalidWeight { line: String, weight: String },
}

/// Result type for grammar operations.
pub type GrammarResult<T> = std::result::Result<T, GrammarError>;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("target predicate must be defined")]
    #[diagnostic(
        code(relrules::config::missing_target),
        help("Pass the name of the relation to learn, e.g. `father`.")
    )]
    MissingTarget,

    #[error("no modes were defined for target predicate \"{target}\"")]
    #[diagnostic(
        code(relrules::config::no_target_modes),
        help("Add at least one mode for the target, e.g. `{target}(+type,+type).`.")
    )]
    NoTargetModes { target: String },

    #[error("modes for predicate \"{predicate}\" have inconsistent structure")]
    #[diagnostic(
        code(relrules::config::inconsistent_modes),
        help(
            "Every mode of one predicate must declare the same argument types in the \
             same order; only the mode symbols may differ."
        )
    )]
    InconsistentModes { predicate: String },

    #[error("{name} must be >= {minimum}, got {value}")]
    #[diagnostic(
        code(relrules::config::invalid_limit),
        help("Raise the limit, or leave it unset to use the default.")
    )]
    InvalidLimit {
        name: &'static str,
        value: String,
        minimum: usize,
    },

    #[error("{name} fraction must lie in (0, 1], got {value}")]
    #[diagnostic(
        code(relrules::config::invalid_fraction),
        help("Use an integer for an absolute count or a float in (0, 1] for a fraction.")
    )]
    InvalidFraction { name: &'static str, value: f64 },

    #[error("no examples were given")]
    #[diagnostic(
        code(relrules::config::no_examples),
        help("Provide at least one weighted example of the target relation.")
    )]
    NoExamples,

    #[error("example \"{example}\" predicate is not target \"{target}\"")]
    #[diagnostic(
        code(relrules::config::example_target_mismatch),
        help("Every example must be an instance of the target relation.")
    )]
    ExampleTargetMismatch { example: String, target: String },

    #[error("example \"{example}\" has {actual} arguments, target expects {expected}")]
    #[diagnostic(
        code(relrules::config::example_arity),
        help("Examples must have exactly as many arguments as the target modes declare.")
    )]
    ExampleArity {
        example: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to read learner config: {path}")]
    #[diagnostic(
        code(relrules::config::read),
        help("Check that the file exists and is readable.")
    )]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse learner config {path}: {message}")]
    #[diagnostic(
        code(relrules::config::parse),
        help(
            "The config must be TOML with keys such as `strategy = \"best\"`, \
             `max_literals = 3` or `min_examples_learn = 0.1`."
        )
    )]
    ConfigParse { path: String, message: String },

    #[error("failed to write learner config: {path}")]
    #[diagnostic(
        code(relrules::config::write),
        help("Check that the parent directory exists and is writable.")
    )]
    ConfigWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for learner operations.
pub type RulesResult<T> = std::result::Result<T, RulesError>;
