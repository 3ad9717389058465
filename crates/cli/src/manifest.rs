use anyhow::{Context, Result, bail};
use argsift::{ArgDecl, ArgParser, Arity, FlagDecl, Options, PositionalDecl, Registry, parsers};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_MANIFEST_NAME: &str = "argsift.json";

/// Declarations file: parser options plus every flag, argument and positional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "allow_leftovers"
    )]
    pub allow_leftovers: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positionals: Vec<PositionalEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagEntry {
    pub id: char,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default)]
    pub required: bool,
    /// Name of a built-in argument parser (`int`, `float`, `bool`, `string`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionalEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    /// Name of a built-in positional parser (`join`, `ints`, `first`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(default)]
    pub count: CountEntry,
    #[serde(default)]
    pub minimum: usize,
}

/// `count` is either a number or `"*"` for a greedy slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountEntry {
    Exact(usize),
    Marker(String),
}

impl Default for CountEntry {
    fn default() -> Self {
        Self::Exact(1)
    }
}

impl CountEntry {
    fn arity(&self, id: &str) -> Result<Arity> {
        match self {
            Self::Exact(n) => Ok(Arity::Exact(*n)),
            Self::Marker(m) if m == "*" => Ok(Arity::Greedy),
            Self::Marker(m) => bail!("positional '{id}': count must be a number or \"*\" (got \"{m}\")"),
        }
    }
}

/// Command-line overrides for the options stored in the manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionOverrides {
    pub strict: Option<bool>,
    pub allow_leftovers: Option<bool>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("manifest not found: {}", path.display());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse manifest JSON: {}", path.display()))
    }

    pub fn options(&self, overrides: OptionOverrides) -> Options {
        let defaults = Options::default();
        Options {
            name: self.name.clone().unwrap_or(defaults.name),
            strict: overrides.strict.or(self.strict).unwrap_or(defaults.strict),
            allow_leftovers: overrides
                .allow_leftovers
                .or(self.allow_leftovers)
                .unwrap_or(defaults.allow_leftovers),
        }
    }

    /// Build the declaration registry, resolving parser names.
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::new();

        for flag in &self.flags {
            registry
                .declare_flag(FlagDecl::new(flag.id).help(flag.help.clone()))
                .with_context(|| format!("invalid flag declaration '{}'", flag.id))?;
        }

        for arg in &self.args {
            let mut decl = ArgDecl::new(arg.id.clone())
                .help(arg.help.clone())
                .required(arg.required);
            if let Some(name) = &arg.parser {
                let Some(parser) = parsers::arg_parser(name) else {
                    bail!(
                        "argument '{}': unknown parser '{name}' (expected one of: {})",
                        arg.id,
                        parsers::ARG_PARSERS.join(", ")
                    );
                };
                decl = decl.parser(parser);
            }
            if let Some(default_value) = &arg.default {
                decl = decl.default_value(default_value.clone());
            }
            registry
                .declare_argument(decl)
                .with_context(|| format!("invalid argument declaration '{}'", arg.id))?;
        }

        for pos in &self.positionals {
            let mut decl = PositionalDecl::new(pos.id.clone())
                .help(pos.help.clone())
                .count(pos.count.arity(&pos.id)?)
                .minimum(pos.minimum);
            if let Some(name) = &pos.parser {
                let Some(parser) = parsers::positional_parser(name) else {
                    bail!(
                        "positional '{}': unknown parser '{name}' (expected one of: {})",
                        pos.id,
                        parsers::POSITIONAL_PARSERS.join(", ")
                    );
                };
                decl = decl.parser(parser);
            }
            registry
                .declare_positional(decl)
                .with_context(|| format!("invalid positional declaration '{}'", pos.id))?;
        }

        Ok(registry)
    }

    pub fn into_parser(self, overrides: OptionOverrides) -> Result<ArgParser> {
        let registry = self.registry()?;
        Ok(ArgParser::with_registry(self.options(overrides), registry))
    }
}

pub fn write_default_manifest(project_dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let dest = project_dir.join(DEFAULT_MANIFEST_NAME);
    if dest.exists() && !overwrite {
        bail!("{} already exists", dest.display());
    }

    let project_name = guess_project_name(project_dir).unwrap_or_else(|| "my-cli".to_string());

    let manifest = Manifest {
        schema_version: Some(1),
        name: Some(project_name),
        strict: Some(true),
        allow_leftovers: Some(false),
        flags: vec![FlagEntry {
            id: 'v',
            help: "Increase verbosity".to_string(),
        }],
        args: vec![ArgEntry {
            id: "jobs".to_string(),
            help: "Number of parallel jobs".to_string(),
            parser: Some("int".to_string()),
            default: Some(Value::from(1)),
            ..Default::default()
        }],
        positionals: vec![PositionalEntry {
            id: "files".to_string(),
            help: "Input files".to_string(),
            count: CountEntry::Marker("*".to_string()),
            minimum: 1,
            ..Default::default()
        }],
    };

    let bytes = serde_json::to_vec_pretty(&manifest).context("failed to serialize manifest")?;
    let mut out = String::from_utf8(bytes).context("manifest is not valid UTF-8")?;
    out.push('\n');

    let tmp = dest.with_extension("tmp");
    fs::write(&tmp, out.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if overwrite && dest.exists() {
        fs::remove_file(&dest).with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    fs::rename(&tmp, &dest)
        .with_context(|| format!("failed to move {} into place", dest.display()))?;
    Ok(dest)
}

/// Last named component of `project_dir`, resolved against the working directory.
fn guess_project_name(project_dir: &Path) -> Option<String> {
    let resolved = std::path::absolute(project_dir).ok()?;
    resolved.components().rev().find_map(|component| match component {
        Component::Normal(name) => name.to_str().map(str::to_string),
        _ => None,
    })
}
