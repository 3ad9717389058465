mod manifest;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

use crate::manifest::{DEFAULT_MANIFEST_NAME, Manifest, OptionOverrides, write_default_manifest};

/// Exit status when the tokens do not satisfy the declarations.
const EXIT_CLASSIFY_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "argsift")]
#[command(version, about = "Classify command-line tokens against declared flags, arguments and positionals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter argsift.json
    Init(InitArgs),

    /// Classify tokens and print flags, args, positionals and leftovers as JSON
    Classify(ClassifyArgs),

    /// Print usage text for the declarations
    Usage(UsageArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Overwrite an existing argsift.json
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct ClassifyArgs {
    /// Path to the declarations file
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME, value_name = "FILE")]
    manifest: PathBuf,

    /// Reject undeclared flags and arguments (overrides the manifest)
    #[arg(long, conflicts_with = "lenient")]
    strict: bool,

    /// Accept undeclared flags and arguments (overrides the manifest)
    #[arg(long)]
    lenient: bool,

    /// Keep tokens no positional slot accepts instead of failing
    #[arg(long)]
    allow_leftovers: bool,

    /// Write the JSON result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Tokens to classify; put them after `--`
    #[arg(value_name = "TOKENS", trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

#[derive(Parser)]
struct UsageArgs {
    /// Path to the declarations file
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME, value_name = "FILE")]
    manifest: PathBuf,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Classify(args) => classify(args),
        Commands::Usage(args) => usage(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn init(args: InitArgs) -> Result<ExitCode> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let path = write_default_manifest(&dir, args.force)?;

    eprintln!("Created: {}", path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {DEFAULT_MANIFEST_NAME} to declare your flags, args and positionals");
    eprintln!("  2. Run: argsift classify -- <tokens...>");

    Ok(ExitCode::SUCCESS)
}

fn classify(args: ClassifyArgs) -> Result<ExitCode> {
    tracing::debug!("executing classify command");

    let overrides = OptionOverrides {
        strict: match (args.strict, args.lenient) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        allow_leftovers: args.allow_leftovers.then_some(true),
    };

    let parser = Manifest::from_file(&args.manifest)?.into_parser(overrides)?;

    let matches = match parser.parse(args.tokens) {
        Ok(m) => m,
        Err(err) => {
            for e in err.errors() {
                eprintln!("error: {e}");
            }
            return Ok(ExitCode::from(EXIT_CLASSIFY_FAILED));
        }
    };

    let json = serde_json::to_string_pretty(&matches)?;
    match &args.output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Result: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(ExitCode::SUCCESS)
}

fn usage(args: UsageArgs) -> Result<ExitCode> {
    tracing::debug!("executing usage command");

    let parser = Manifest::from_file(&args.manifest)?.into_parser(OptionOverrides::default())?;
    print!("{}", parser.usage());

    Ok(ExitCode::SUCCESS)
}
