use thiserror::Error;

/// What went wrong while reading a rule's pattern.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternErrorKind {
    #[error("escape at end of pattern")]
    DanglingEscape,
    #[error("unexpected {found}")]
    Unexpected { found: String },
    #[error("repetition operator with nothing to repeat")]
    StrayOperator,
    #[error("alternation branch is empty")]
    EmptyBranch,
    #[error("group is never closed")]
    UnclosedGroup,
    #[error("character class is never closed")]
    UnclosedClass,
    #[error("character class is empty")]
    EmptyClass,
    #[error("class range `{lo}-{hi}` runs backwards")]
    ReversedRange { lo: char, hi: char },
}

/// A pattern the front end could not turn into a syntax tree, together
/// with the 0-based character offset to blame.
///
/// Tokenizer and parser failures share this one type; the caller only
/// cares that the pattern is bad and where.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} (offset {at})")]
pub struct PatternError {
    /// Character offset of the offending input.
    pub at: usize,
    /// What exactly was wrong there.
    pub kind: PatternErrorKind,
}

impl PatternError {
    /// Creates a new [`PatternError`].
    #[must_use]
    pub fn new(at: usize, kind: PatternErrorKind) -> Self {
        Self { at, kind }
    }
}

/// Failure of the table-generation pipeline.
///
/// Errors are reported at stage boundaries; there is no local recovery.
/// Any variant aborts the compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The regex front end rejected a rule's pattern.
    #[error("rule `{rule}`: {source}")]
    RegexParse {
        rule: String,
        #[source]
        source: PatternError,
    },
    /// The pattern contains a construct the table back end cannot compile.
    #[error("rule `{rule}`: unsupported operation `{op}`")]
    UnsupportedOp { rule: String, op: &'static str },
    /// No rule contributed a single input symbol; the tables would be
    /// degenerate. Only raised in strict mode.
    #[error("no rule references any input symbol")]
    EmptyAlphabet,
    /// Determinization exceeded the configured state budget.
    #[error("DFA construction exceeded the budget of {limit} states")]
    OutOfBudget { limit: usize },
    /// Two rules share a name, which would make the token-type table
    /// non-injective in a surprising way.
    #[error("duplicate rule name `{name}`")]
    DuplicateRuleName { name: String },
}

/// Failure while loading the rule configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config `{path}`: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level error surfaced by the command-line binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("cannot serialize tables: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot write `{path}`: {source}")]
    WriteOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
