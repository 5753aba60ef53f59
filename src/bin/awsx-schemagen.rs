//! AWSX schema generator CLI
//!
//! Assembles the component schema and hands it to the SDK generators.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use awsx_schemagen::{
    assemble, check_file, load_document, parse_pin, source_from_str, write_file_set, AssembleError,
    AssembleOptions, DependencyManifest, GeneratorRegistry, ProviderCache, Severity, Target,
    VersionResolver, DEFAULT_SOURCE,
};

#[derive(Parser)]
#[command(name = "awsx-schemagen")]
#[command(about = "Assemble the AWSX component schema and generate SDKs from it")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the schema and write the output for a target
    Generate {
        /// Output target: schema, nodejs, python, go, dotnet or java
        target: String,

        /// Output directory
        #[arg(long, short)]
        out: PathBuf,

        /// Dependency manifest declaring provider versions
        #[arg(long, default_value = "awsx/package.json")]
        manifest: PathBuf,

        /// Explicit provider version, as <provider>=<version> (repeatable)
        #[arg(long = "pin", value_parser = parse_pin)]
        pins: Vec<(String, String)>,

        /// Provider document source: URL template with {name}/{version}, or a directory
        #[arg(long, env = "AWSX_SCHEMAGEN_SOURCE", default_value = DEFAULT_SOURCE)]
        source: String,

        /// Timeout in seconds for fetching each provider document
        #[arg(long, default_value_t = 60)]
        timeout: u64,

        /// Version stamped into the schema and passed to SDK generators
        #[arg(long = "version", id = "package_version")]
        package_version: Option<String>,

        /// Reuse an existing schema.json instead of assembling (SDK targets only)
        #[arg(long)]
        schema: Option<PathBuf>,

        /// External SDK generator program
        #[arg(long, env = "AWSX_SCHEMAGEN_GENERATOR")]
        generator: Option<PathBuf>,
    },

    /// Check the references of an existing schema.json
    Check {
        /// Schema file to check
        schema: PathBuf,

        /// Declared provider version, as <provider>=<version> (repeatable)
        #[arg(long = "pin", value_parser = parse_pin)]
        pins: Vec<(String, String)>,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

struct GenerateArgs {
    target: String,
    out: PathBuf,
    manifest: PathBuf,
    pins: Vec<(String, String)>,
    source: String,
    timeout: u64,
    version: Option<String>,
    schema: Option<PathBuf>,
    generator: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            target,
            out,
            manifest,
            pins,
            source,
            timeout,
            package_version,
            schema,
            generator,
        } => run_generate(GenerateArgs {
            target,
            out,
            manifest,
            pins,
            source,
            timeout,
            version: package_version,
            schema,
            generator,
        })
        .map_err(report),

        Commands::Check {
            schema,
            pins,
            format,
        } => run_check(&schema, &pins, &format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn report(err: AssembleError) -> u8 {
    eprintln!("Error: {}", err);
    if let AssembleError::InvalidReferences { diagnostics } = &err {
        for diagnostic in diagnostics {
            eprintln!("  {}", diagnostic);
        }
    }
    // exit_code() only returns small positive values
    u8::try_from(err.exit_code()).unwrap_or(1)
}

fn run_generate(args: GenerateArgs) -> Result<(), AssembleError> {
    // Reject unknown targets before any work is done.
    let target: Target = args.target.parse()?;
    let registry = GeneratorRegistry::with_defaults(args.generator.as_deref());
    if !registry.targets().any(|t| t == target) {
        return Err(AssembleError::UnsupportedTarget { target: args.target });
    }

    let document = match &args.schema {
        Some(path) if target.is_sdk() => load_document(path)?,
        _ => {
            let mut resolver = VersionResolver::new(DependencyManifest::load(&args.manifest)?);
            for (provider, version) in args.pins {
                resolver = resolver.pin(provider, version);
            }
            let mut options = AssembleOptions::new(resolver);
            if let Some(version) = &args.version {
                options = options.version(version);
            }

            #[cfg(feature = "remote")]
            let source = source_from_str(&args.source, std::time::Duration::from_secs(args.timeout))?;
            #[cfg(not(feature = "remote"))]
            let source = {
                let _ = args.timeout;
                source_from_str(&args.source)?
            };
            assemble(&options, &ProviderCache::from_boxed(source))?
        }
    };

    let version = args
        .version
        .or_else(|| document.version.clone())
        .unwrap_or_else(|| "0.0.0-dev".to_string());
    let files = registry.dispatch(&document, target.as_str(), &version)?;
    let written = write_file_set(&args.out, &files)?;
    eprintln!("Wrote {} file(s) for {} to {}", written, target, args.out.display());
    Ok(())
}

fn run_check(path: &Path, pins: &[(String, String)], format: &str) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    // Without pins any well-formed external reference is accepted.
    let declared: BTreeMap<String, String> = pins
        .iter()
        .map(|(name, version)| {
            let version = if version.starts_with('v') {
                version.clone()
            } else {
                format!("v{}", version)
            };
            (name.clone(), version)
        })
        .collect();
    let providers = (!declared.is_empty()).then_some(&declared);

    let result = check_file(path, providers);

    if format == "json" {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                return Err(2);
            }
        }
    } else {
        for diag in &result.diagnostics {
            let (color, label) = match diag.severity {
                Severity::Error => ("\x1b[31m", "error"),
                Severity::Warning => ("\x1b[33m", "warning"),
            };
            println!(
                "  {}{}[{}]\x1b[0m: {} - {}",
                color, label, diag.code, diag.path, diag.message
            );
        }
        if result.is_ok() {
            println!(
                "\x1b[32m✓ {}: {} references checked, all resolve\x1b[0m",
                path.display(),
                result.refs_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {}: {} errors, {} warnings\x1b[0m",
                path.display(),
                result.errors,
                result.warnings
            );
        }
    }

    if result.is_ok() {
        Ok(())
    } else {
        Err(2)
    }
}
