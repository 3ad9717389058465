//! Declarations of recognized flags, arguments and positional slots.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{BoxError, DeclKind, Error, Result};

/// Parser applied to each raw value of a named argument.
pub type ArgValueParser =
    Box<dyn Fn(&str) -> std::result::Result<Value, BoxError> + Send + Sync + 'static>;

/// Parser applied once to the full list of raw values collected by a positional slot.
pub type PositionalValueParser =
    Box<dyn Fn(&[String]) -> std::result::Result<Value, BoxError> + Send + Sync + 'static>;

/// How many tokens a positional slot consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many tokens (must be > 0).
    Exact(usize),
    /// Every remaining positional token.
    Greedy,
}

impl Default for Arity {
    fn default() -> Self {
        Self::Exact(1)
    }
}

impl Arity {
    /// The finite token count, or `None` for a greedy slot.
    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Exact(n) => Some(n),
            Self::Greedy => None,
        }
    }
}

/// A single-character boolean/counting switch (`-v`, clustered as `-vvx`).
#[derive(Debug, Clone)]
pub struct FlagDecl {
    pub id: char,
    pub help: String,
}

impl FlagDecl {
    pub fn new(id: char) -> Self {
        Self {
            id,
            help: String::new(),
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

/// A named, valued, repeatable option (`--name=value` or `--name value`).
pub struct ArgDecl {
    pub id: String,
    pub help: String,
    pub required: bool,
    pub parser: Option<ArgValueParser>,
    pub default: Option<Value>,
}

impl ArgDecl {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            help: String::new(),
            required: false,
            parser: None,
            default: None,
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Convert every raw value through `parser`.
    ///
    /// A failing parser turns that occurrence into `ArgumentValidationFailed`.
    pub fn parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Value reported by accessors when the argument never occurs.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub(crate) fn parse_value(&self, raw: String) -> Result<Value> {
        match &self.parser {
            Some(parser) => parser(&raw).map_err(|source| Error::ArgumentValidationFailed {
                name: self.id.clone(),
                source,
            }),
            None => Ok(Value::String(raw)),
        }
    }
}

impl fmt::Debug for ArgDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgDecl")
            .field("id", &self.id)
            .field("help", &self.help)
            .field("required", &self.required)
            .field("parser", &self.parser.is_some())
            .field("default", &self.default)
            .finish()
    }
}

/// A slot filled by position, in declaration order.
pub struct PositionalDecl {
    pub id: String,
    pub help: String,
    pub parser: Option<PositionalValueParser>,
    pub count: Arity,
    pub minimum: usize,
}

impl PositionalDecl {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            help: String::new(),
            parser: None,
            count: Arity::default(),
            minimum: 0,
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn count(mut self, count: Arity) -> Self {
        self.count = count;
        self
    }

    pub fn greedy(self) -> Self {
        self.count(Arity::Greedy)
    }

    pub fn minimum(mut self, minimum: usize) -> Self {
        self.minimum = minimum;
        self
    }

    /// Replace the collected raw values with `parser`'s output after the scan.
    pub fn parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&[String]) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.parser = Some(Box::new(parser));
        self
    }

    pub(crate) fn parse_values(&self, raw: &[String]) -> Option<Result<Value>> {
        let parser = self.parser.as_ref()?;
        Some(parser(raw).map_err(|source| Error::PositionalValidationFailed {
            name: self.id.clone(),
            source,
        }))
    }
}

impl fmt::Debug for PositionalDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionalDecl")
            .field("id", &self.id)
            .field("help", &self.help)
            .field("parser", &self.parser.is_some())
            .field("count", &self.count)
            .field("minimum", &self.minimum)
            .finish()
    }
}

/// The set of declarations a parse is checked against.
///
/// Flags, arguments and positionals each have their own namespace.
#[derive(Debug, Default)]
pub struct Registry {
    flags: IndexMap<char, FlagDecl>,
    args: IndexMap<String, ArgDecl>,
    positionals: Vec<PositionalDecl>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_flag(&mut self, decl: FlagDecl) -> Result<()> {
        if self.flags.contains_key(&decl.id) {
            return Err(Error::DuplicateDeclaration {
                kind: DeclKind::Flag,
                name: decl.id.to_string(),
            });
        }
        self.flags.insert(decl.id, decl);
        Ok(())
    }

    pub fn declare_argument(&mut self, decl: ArgDecl) -> Result<()> {
        if self.args.contains_key(&decl.id) {
            return Err(Error::DuplicateDeclaration {
                kind: DeclKind::Argument,
                name: decl.id,
            });
        }
        self.args.insert(decl.id.clone(), decl);
        Ok(())
    }

    pub fn declare_positional(&mut self, decl: PositionalDecl) -> Result<()> {
        if self.positional(&decl.id).is_some() {
            return Err(Error::DuplicateDeclaration {
                kind: DeclKind::Positional,
                name: decl.id,
            });
        }
        if let Some(greedy) = self.positionals.iter().find(|p| p.count == Arity::Greedy) {
            return Err(Error::InvalidArity {
                reason: format!("declared after greedy positional '{}'", greedy.id),
                name: decl.id,
            });
        }
        let count = decl.count;
        match count {
            Arity::Exact(0) => {
                return Err(Error::InvalidArity {
                    name: decl.id,
                    reason: "count must be greater than zero".to_string(),
                });
            }
            Arity::Exact(n) if decl.minimum > n => {
                return Err(Error::InvalidArity {
                    reason: format!("minimum {} exceeds count {n}", decl.minimum),
                    name: decl.id,
                });
            }
            _ => {}
        }
        self.positionals.push(decl);
        Ok(())
    }

    pub fn flag(&self, id: char) -> Option<&FlagDecl> {
        self.flags.get(&id)
    }

    pub fn arg(&self, id: &str) -> Option<&ArgDecl> {
        self.args.get(id)
    }

    pub fn positional(&self, id: &str) -> Option<&PositionalDecl> {
        self.positionals.iter().find(|p| p.id == id)
    }

    pub fn flags(&self) -> impl Iterator<Item = &FlagDecl> {
        self.flags.values()
    }

    pub fn args(&self) -> impl Iterator<Item = &ArgDecl> {
        self.args.values()
    }

    /// Positional declarations in the order they are filled.
    pub fn positionals(&self) -> &[PositionalDecl] {
        self.positionals.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_declarations_are_rejected_per_namespace() {
        let mut reg = Registry::new();
        reg.declare_flag(FlagDecl::new('a')).unwrap();
        reg.declare_argument(ArgDecl::new("a")).unwrap();
        reg.declare_positional(PositionalDecl::new("a")).unwrap();

        let err = reg.declare_flag(FlagDecl::new('a')).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateDeclaration { kind: DeclKind::Flag, .. }
        ));
        let err = reg.declare_argument(ArgDecl::new("a")).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateDeclaration { kind: DeclKind::Argument, .. }
        ));
        let err = reg.declare_positional(PositionalDecl::new("a")).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateDeclaration { kind: DeclKind::Positional, .. }
        ));
    }

    #[test]
    fn zero_count_is_invalid() {
        let mut reg = Registry::new();
        let err = reg
            .declare_positional(PositionalDecl::new("p").count(Arity::Exact(0)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArity { .. }));
    }

    #[test]
    fn minimum_above_count_is_invalid() {
        let mut reg = Registry::new();
        let err = reg
            .declare_positional(PositionalDecl::new("p").count(Arity::Exact(2)).minimum(3))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArity { .. }));

        // Greedy slots accept any minimum.
        reg.declare_positional(PositionalDecl::new("rest").greedy().minimum(5))
            .unwrap();
    }

    #[test]
    fn nothing_follows_a_greedy_positional() {
        let mut reg = Registry::new();
        reg.declare_positional(PositionalDecl::new("files").greedy())
            .unwrap();
        let err = reg
            .declare_positional(PositionalDecl::new("dest"))
            .unwrap_err();
        match err {
            Error::InvalidArity { name, reason } => {
                assert_eq!(name, "dest");
                assert!(reason.contains("files"));
            }
            other => panic!("expected InvalidArity, got: {other:?}"),
        }
    }

    #[test]
    fn arg_parser_failure_names_the_argument() {
        let decl = ArgDecl::new("n").parser(|raw: &str| {
            raw.parse::<i64>()
                .map(Value::from)
                .map_err(BoxError::from)
        });
        assert_eq!(decl.parse_value("4".to_string()).unwrap(), Value::from(4));
        match decl.parse_value("four".to_string()).unwrap_err() {
            Error::ArgumentValidationFailed { name, .. } => assert_eq!(name, "n"),
            other => panic!("expected ArgumentValidationFailed, got: {other:?}"),
        }
    }
}
