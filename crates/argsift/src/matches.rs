//! Read-only view of a successful parse.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value;

use crate::decl::Registry;
use crate::engine::Options;
use crate::error::{Error, Result};

static EMPTY_LIST: Value = Value::Array(Vec::new());

/// How accessors treat identifiers with no recorded value.
///
/// Declared identifiers (and any identifier in lenient mode) fall back to an
/// empty/absent value; undeclared identifiers fail in strict mode.
#[derive(Debug, Clone, Copy)]
struct Lookup {
    strict: bool,
}

impl Lookup {
    fn resolve<T>(
        self,
        found: Option<T>,
        declared: bool,
        fallback: T,
        undefined: impl FnOnce() -> Error,
    ) -> Result<T> {
        match found {
            Some(value) => Ok(value),
            None if declared || !self.strict => Ok(fallback),
            None => Err(undefined()),
        }
    }
}

/// Flags, arguments, positionals and leftovers classified from one argv.
#[derive(Debug, Serialize)]
pub struct Matches {
    #[serde(skip)]
    registry: Registry,
    #[serde(skip)]
    lookup: Lookup,
    flags: IndexMap<char, usize>,
    args: IndexMap<String, Vec<Value>>,
    positionals: IndexMap<String, Value>,
    leftovers: Vec<String>,
}

impl Matches {
    pub(crate) fn new(
        options: Options,
        registry: Registry,
        flags: IndexMap<char, usize>,
        args: IndexMap<String, Vec<Value>>,
        positionals: IndexMap<String, Value>,
        leftovers: Vec<String>,
    ) -> Self {
        Self {
            registry,
            lookup: Lookup {
                strict: options.strict,
            },
            flags,
            args,
            positionals,
            leftovers,
        }
    }

    /// Declarations this result was parsed against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// How many times flag `id` occurred.
    pub fn flag_count(&self, id: char) -> Result<usize> {
        self.lookup.resolve(
            self.flags.get(&id).copied(),
            self.registry.flag(id).is_some(),
            0,
            || Error::UndefinedFlag(id),
        )
    }

    /// Whether flag `id` occurred at least once.
    pub fn flag(&self, id: char) -> Result<bool> {
        self.flag_count(id).map(|n| n > 0)
    }

    pub fn flag_counts(&self) -> &IndexMap<char, usize> {
        &self.flags
    }

    /// Flags that occurred, in first-seen order.
    pub fn flags(&self) -> IndexSet<char> {
        self.flags
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(c, _)| *c)
            .collect()
    }

    /// Every value given for argument `name`, in order.
    ///
    /// A declared argument that never occurred yields its default (if any).
    pub fn arg_multi(&self, name: &str) -> Result<&[Value]> {
        let decl = self.registry.arg(name);
        let fallback = decl
            .and_then(|d| d.default.as_ref())
            .map(std::slice::from_ref)
            .unwrap_or_default();
        self.lookup.resolve(
            self.args.get(name).map(Vec::as_slice),
            decl.is_some(),
            fallback,
            || Error::UndefinedArgument(name.to_string()),
        )
    }

    /// The last value given for argument `name`.
    pub fn arg(&self, name: &str) -> Result<Option<&Value>> {
        self.arg_multi(name).map(|values| values.last())
    }

    pub fn args_multi(&self) -> &IndexMap<String, Vec<Value>> {
        &self.args
    }

    /// The last value of every argument that occurred.
    pub fn args(&self) -> IndexMap<&str, &Value> {
        self.args
            .iter()
            .filter_map(|(k, v)| v.last().map(|last| (k.as_str(), last)))
            .collect()
    }

    /// Values collected by positional slot `name`.
    ///
    /// Raw values are a JSON array of strings; a slot parser's output replaces them.
    pub fn positional(&self, name: &str) -> Result<&Value> {
        self.lookup.resolve(
            self.positionals.get(name),
            self.registry.positional(name).is_some(),
            &EMPTY_LIST,
            || Error::UndefinedPositional(name.to_string()),
        )
    }

    pub fn positionals(&self) -> &IndexMap<String, Value> {
        &self.positionals
    }

    /// Tokens no positional slot accepted, in input order.
    pub fn leftovers(&self) -> &[String] {
        self.leftovers.as_slice()
    }
}
