use std::fmt;

use thiserror::Error;

/// Failure reported by a user-supplied value parser.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Namespace a declaration lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Flag,
    Argument,
    Positional,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("flag"),
            Self::Argument => f.write_str("argument"),
            Self::Positional => f.write_str("positional"),
        }
    }
}

/// Every condition the classifier can report.
///
/// Errors fall into four groups:
/// - declaration-time (`DuplicateDeclaration`, `InvalidArity`)
/// - fatal scan errors (`InvalidToken`) which stop parsing immediately
/// - deferred per-value errors, collected after the scan and surfaced alone or
///   wrapped in `Multi`
/// - query-time errors (`Undefined*`), raised only in strict mode
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate {kind} declaration '{name}'")]
    DuplicateDeclaration { kind: DeclKind, name: String },

    #[error("invalid arity for positional '{name}': {reason}")]
    InvalidArity { name: String, reason: String },

    #[error("invalid token {0}")]
    InvalidToken(String),

    #[error("missing value for argument \"{0}\"")]
    MissingArgumentValue(String),

    #[error("received undefined argument {0}")]
    InvalidArgument(String),

    #[error("failed to validate {name}: {source}")]
    ArgumentValidationFailed {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("received undefined flag {0}")]
    InvalidFlag(char),

    #[error("missing argument \"{0}\"")]
    MissingArgument(String),

    #[error("not enough arguments")]
    MissingPositional,

    #[error("invalid argument {name}: {source}")]
    PositionalValidationFailed {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("received extra arguments: {}", .0.join(" "))]
    ExtraPositionals(Vec<String>),

    #[error("undefined arg {0}")]
    UndefinedArgument(String),

    #[error("undefined flag {0}")]
    UndefinedFlag(char),

    #[error("undefined positional {0}")]
    UndefinedPositional(String),

    #[error("multiple errors: {}", join_messages(.0))]
    Multi(Vec<Error>),
}

impl Error {
    /// The individual errors carried by this error.
    ///
    /// `Multi` yields its ordered list; any other error yields itself.
    pub fn errors(&self) -> &[Error] {
        match self {
            Self::Multi(errors) => errors.as_slice(),
            other => std::slice::from_ref(other),
        }
    }

    /// Whether this error aborted the scan rather than being collected.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidToken(_))
    }

    /// Collapse collected errors into the single value a parse reports.
    pub(crate) fn from_collected(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multi(errors)),
        }
    }
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
