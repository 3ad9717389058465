//! The classification engine: a single left-to-right scan over argv.

use std::collections::VecDeque;

use indexmap::IndexMap;
use serde_json::Value;

use crate::decl::{ArgDecl, FlagDecl, PositionalDecl, Registry};
use crate::error::{Error, Result};
use crate::matches::Matches;
use crate::validate;

/// Marker that ends flag/argument interpretation.
pub const END_OF_OPTIONS: &str = "--";

/// Parser-wide policy knobs.
#[derive(Debug, Clone)]
pub struct Options {
    /// Name used when rendering usage text.
    pub name: String,
    /// Reject undeclared flags/arguments while parsing, and undeclared
    /// identifiers when querying.
    pub strict: bool,
    /// Keep tokens that no positional slot accepts instead of reporting
    /// `ExtraPositionals`.
    pub allow_leftovers: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            name: "argsift".to_string(),
            strict: true,
            allow_leftovers: false,
        }
    }
}

impl Options {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn allow_leftovers(mut self, allow: bool) -> Self {
        self.allow_leftovers = allow;
        self
    }
}

/// Declarations plus options; consumed by [`ArgParser::parse`].
///
/// ```
/// use argsift::{ArgDecl, ArgParser, Arity, FlagDecl, Options, PositionalDecl};
///
/// let mut parser = ArgParser::new(Options::default());
/// parser.declare_flag(FlagDecl::new('f')).unwrap();
/// parser.declare_argument(ArgDecl::new("a")).unwrap();
/// parser
///     .declare_positional(PositionalDecl::new("tree").count(Arity::Exact(2)))
///     .unwrap();
///
/// let m = parser.parse(["-f", "--a=hi", "banana", "apple"]).unwrap();
/// assert_eq!(m.flag_count('f').unwrap(), 1);
/// assert_eq!(m.arg("a").unwrap().and_then(|v| v.as_str()), Some("hi"));
/// assert_eq!(m.positional("tree").unwrap(), &serde_json::json!(["banana", "apple"]));
/// assert!(m.leftovers().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ArgParser {
    options: Options,
    registry: Registry,
}

impl ArgParser {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            registry: Registry::new(),
        }
    }

    pub fn with_registry(options: Options, registry: Registry) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn declare_flag(&mut self, decl: FlagDecl) -> Result<()> {
        self.registry.declare_flag(decl)
    }

    pub fn declare_argument(&mut self, decl: ArgDecl) -> Result<()> {
        self.registry.declare_argument(decl)
    }

    pub fn declare_positional(&mut self, decl: PositionalDecl) -> Result<()> {
        self.registry.declare_positional(decl)
    }

    /// Render usage text for the declared flags, arguments and positionals.
    pub fn usage(&self) -> String {
        crate::help::usage(&self.options.name, &self.registry)
    }

    /// Classify `tokens` (argv without the program name) and validate the result.
    ///
    /// The parser is consumed: a declaration set is parsed exactly once.
    /// On failure a single error is returned; several deferred errors are
    /// wrapped in [`Error::Multi`] in the order they were found.
    pub fn parse<I, S>(self, tokens: I) -> Result<Matches>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pending: VecDeque<String> = tokens.into_iter().map(Into::into).collect();
        tracing::debug!(parser = %self.options.name, tokens = pending.len(), "parsing");

        let mut scan = Scan::new(&self.options, &self.registry, pending);
        scan.run()?;
        let collected = scan.finish();

        tracing::debug!(
            flags = collected.flags.len(),
            args = collected.args.len(),
            positionals = collected.positionals.len(),
            leftovers = collected.leftovers.len(),
            "scan finished"
        );

        validate::validate(self.options, self.registry, collected)
    }
}

/// Raw scan output. Deferred errors sit in place of the values they replace.
#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub(crate) flags: IndexMap<char, Result<usize>>,
    pub(crate) args: IndexMap<String, Vec<Result<Value>>>,
    pub(crate) positionals: IndexMap<String, Vec<String>>,
    pub(crate) leftovers: Vec<String>,
}

/// Live arity countdown over the positional declarations.
///
/// `remaining[i]` is `None` for a greedy slot.
#[derive(Debug)]
struct SlotCursor {
    slot: usize,
    remaining: Vec<Option<usize>>,
}

impl SlotCursor {
    fn new(decls: &[PositionalDecl]) -> Self {
        Self {
            slot: 0,
            remaining: decls.iter().map(|d| d.count.limit()).collect(),
        }
    }

    /// Index of the slot that takes the next positional token, if any.
    fn open_slot(&mut self) -> Option<usize> {
        while let Some(remaining) = self.remaining.get(self.slot) {
            if *remaining == Some(0) {
                self.slot += 1;
                continue;
            }
            return Some(self.slot);
        }
        None
    }

    fn take(&mut self, slot: usize) {
        if let Some(Some(n)) = self.remaining.get_mut(slot) {
            *n -= 1;
        }
    }
}

struct Scan<'p> {
    options: &'p Options,
    registry: &'p Registry,
    pending: VecDeque<String>,
    terminated: bool,
    cursor: SlotCursor,
    out: Collected,
}

impl<'p> Scan<'p> {
    fn new(options: &'p Options, registry: &'p Registry, pending: VecDeque<String>) -> Self {
        Self {
            options,
            registry,
            pending,
            terminated: false,
            cursor: SlotCursor::new(registry.positionals()),
            out: Collected::default(),
        }
    }

    fn run(&mut self) -> Result<()> {
        while let Some(next) = self.pending.front() {
            if self.terminated || !is_option_like(next) {
                if self.take_positional() {
                    continue;
                }
                tracing::debug!(
                    remaining = self.pending.len(),
                    "no positional slot available; keeping the rest as leftovers"
                );
                break;
            }

            let Some(token) = self.pending.pop_front() else {
                break;
            };

            if token == END_OF_OPTIONS {
                tracing::trace!("end of options");
                self.terminated = true;
                continue;
            }

            if let Some(body) = token.strip_prefix("--") {
                if body.starts_with('-') {
                    tracing::debug!(token = %token, "aborting scan");
                    return Err(Error::InvalidToken(token));
                }
                self.take_arg(body);
                continue;
            }

            if let Some(cluster) = token.strip_prefix('-') {
                self.take_flags(cluster);
                continue;
            }

            return Err(Error::InvalidToken(token));
        }
        Ok(())
    }

    fn finish(mut self) -> Collected {
        self.out.leftovers = self.pending.into_iter().collect();
        self.out
    }

    fn take_positional(&mut self) -> bool {
        let Some(slot) = self.cursor.open_slot() else {
            return false;
        };
        let Some(token) = self.pending.pop_front() else {
            return false;
        };
        let id = &self.registry.positionals()[slot].id;
        tracing::trace!(slot = %id, value = %token, "positional");
        self.out
            .positionals
            .entry(id.clone())
            .or_default()
            .push(token);
        self.cursor.take(slot);
        true
    }

    fn take_arg(&mut self, body: &str) {
        let (name, raw) = match body.split_once('=') {
            Some((name, value)) => (name, Ok(value.to_string())),
            None => (
                body,
                self.pending
                    .pop_front()
                    .ok_or_else(|| Error::MissingArgumentValue(body.to_string())),
            ),
        };

        let value = match self.registry.arg(name) {
            Some(decl) => raw.and_then(|raw| decl.parse_value(raw)),
            None if self.options.strict => Err(Error::InvalidArgument(name.to_string())),
            None => raw.map(Value::String),
        };
        tracing::trace!(arg = %name, ok = value.is_ok(), "argument");

        self.out
            .args
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn take_flags(&mut self, cluster: &str) {
        for c in cluster.chars() {
            tracing::trace!(flag = %c, "flag");
            if self.options.strict && self.registry.flag(c).is_none() {
                self.out.flags.insert(c, Err(Error::InvalidFlag(c)));
                continue;
            }
            let count = self.out.flags.entry(c).or_insert(Ok(0));
            if let Ok(n) = count {
                *n += 1;
            }
        }
    }
}

/// Whether `token` is read as a flag cluster, argument or marker.
///
/// A lone `-` is deliberately an ordinary value (conventionally stdin), not
/// an empty flag cluster.
fn is_option_like(token: &str) -> bool {
    token.starts_with('-') && token != "-"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Arity;

    fn scan(options: &Options, registry: &Registry, tokens: &[&str]) -> Result<Collected> {
        let pending = tokens.iter().map(|s| s.to_string()).collect();
        let mut scan = Scan::new(options, registry, pending);
        scan.run()?;
        Ok(scan.finish())
    }

    #[test]
    fn cursor_exhausts_fixed_slots_before_advancing() {
        let decls = vec![
            PositionalDecl::new("a").count(Arity::Exact(2)),
            PositionalDecl::new("b").greedy(),
        ];
        let mut cursor = SlotCursor::new(&decls);
        assert_eq!(cursor.open_slot(), Some(0));
        cursor.take(0);
        assert_eq!(cursor.open_slot(), Some(0));
        cursor.take(0);
        assert_eq!(cursor.open_slot(), Some(1));
        for _ in 0..10 {
            cursor.take(1);
            assert_eq!(cursor.open_slot(), Some(1));
        }
    }

    #[test]
    fn cursor_without_slots_accepts_nothing() {
        let mut cursor = SlotCursor::new(&[]);
        assert_eq!(cursor.open_slot(), None);
    }

    #[test]
    fn missing_value_is_deferred_in_place() {
        let options = Options::default().strict(false);
        let registry = Registry::new();
        let out = scan(&options, &registry, &["--name"]).unwrap();
        let values = &out.args["name"];
        assert_eq!(values.len(), 1);
        assert!(matches!(values[0], Err(Error::MissingArgumentValue(ref n)) if n == "name"));
    }

    #[test]
    fn value_is_split_on_first_equals_only() {
        let options = Options::default().strict(false);
        let registry = Registry::new();
        let out = scan(&options, &registry, &["--expr=a=b"]).unwrap();
        let values = &out.args["expr"];
        assert!(matches!(&values[0], Ok(Value::String(s)) if s == "a=b"));
    }

    #[test]
    fn undeclared_flag_in_strict_mode_replaces_count() {
        let options = Options::default();
        let mut registry = Registry::new();
        registry.declare_flag(FlagDecl::new('v')).unwrap();
        let out = scan(&options, &registry, &["-vxv"]).unwrap();
        assert!(matches!(out.flags[&'v'], Ok(2)));
        assert!(matches!(out.flags[&'x'], Err(Error::InvalidFlag('x'))));
    }

    #[test]
    fn triple_hyphen_aborts() {
        let options = Options::default();
        let registry = Registry::new();
        let err = scan(&options, &registry, &["-v", "---x"]).err().unwrap();
        assert!(matches!(err, Error::InvalidToken(ref t) if t == "---x"));
    }

    #[test]
    fn lone_hyphen_is_a_value() {
        let options = Options::default();
        let mut registry = Registry::new();
        registry.declare_positional(PositionalDecl::new("input")).unwrap();
        let out = scan(&options, &registry, &["-"]).unwrap();
        assert_eq!(out.positionals["input"], vec!["-".to_string()]);
        assert!(out.flags.is_empty());
    }

    #[test]
    fn scan_halt_keeps_remaining_tokens_verbatim() {
        let options = Options::default().strict(false);
        let registry = Registry::new();
        let out = scan(&options, &registry, &["-a", "x", "-b", "--c=1", "--"]).unwrap();
        assert!(matches!(out.flags[&'a'], Ok(1)));
        assert_eq!(out.leftovers, vec!["x", "-b", "--c=1", "--"]);
    }
}
