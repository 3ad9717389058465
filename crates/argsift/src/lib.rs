//! Classify a process's argv against declared flags, arguments and positional slots.
//!
//! Tokens are sorted into four buckets in a single left-to-right pass:
//! - flags: single characters after one hyphen, clustered (`-vvx`) and counted
//! - arguments: `--name=value` or `--name value`, repeatable
//! - positionals: plain tokens, assigned to declared slots in order
//! - leftovers: everything after the scan runs out of positional slots
//!
//! `--` ends flag/argument interpretation. After the scan, the result is
//! validated (required arguments, positional minimums, value parsers, leftover
//! policy) and either frozen into [`Matches`] or reported as one [`Error`].

mod decl;
mod engine;
pub mod error;
mod help;
mod matches;
pub mod parsers;
mod validate;

pub use decl::{
    ArgDecl, ArgValueParser, Arity, FlagDecl, PositionalDecl, PositionalValueParser, Registry,
};
pub use engine::{ArgParser, END_OF_OPTIONS, Options};
pub use error::{BoxError, DeclKind, Error, Result};
pub use matches::Matches;
pub use serde_json::Value;
