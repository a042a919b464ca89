//! Diagnostic front end for the toolchain registry.
//!
//! Resolves one or more toolchain names against the search path and prints a
//! JSON report: which implementation serves each name, the full catalog, and
//! optionally the harvested constants. Exits 2 when any name is unmatched so
//! shell callers can branch without parsing the report.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use toolchain_registry::{SearchPath, ToolchainDescriptor, ToolchainResolver, split_list};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse()?;
    let resolver = ToolchainResolver::new(cli.search_path());
    let registry = resolver
        .registry()
        .context("toolchain discovery failed")?;

    let matches: Vec<NameMatch> = cli
        .names
        .iter()
        .map(|name| NameMatch {
            requested: name.clone(),
            toolchain: registry
                .resolve(name)
                .toolchain
                .map(|descriptor| descriptor.identity().to_string()),
        })
        .collect();
    let all_matched = matches.iter().all(|m| m.toolchain.is_some());

    let report = Report {
        matches,
        catalog: registry.catalog(),
        constants: cli.constants.then(|| registry.constants().to_json()),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(all_matched)
}

#[derive(Serialize)]
struct Report<'a> {
    matches: Vec<NameMatch>,
    catalog: &'a [ToolchainDescriptor],
    #[serde(skip_serializing_if = "Option::is_none")]
    constants: Option<Value>,
}

#[derive(Serialize)]
struct NameMatch {
    requested: String,
    toolchain: Option<String>,
}

struct Cli {
    roots: Vec<PathBuf>,
    no_builtins: bool,
    constants: bool,
    names: Vec<String>,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut roots = Vec::new();
        let mut no_builtins = false;
        let mut constants = false;
        let mut names = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--path" | "-p" => {
                    let Some(value) = args.next() else {
                        bail!("--path requires a directory");
                    };
                    roots.push(PathBuf::from(value));
                }
                "--no-builtins" => no_builtins = true,
                "--constants" | "-c" => constants = true,
                "--help" | "-h" => usage(0),
                flag if flag.starts_with('-') => bail!("Unknown flag: {flag}"),
                other => names.extend(split_list(other)),
            }
        }

        if names.is_empty() {
            usage(1);
        }

        Ok(Self {
            roots,
            no_builtins,
            constants,
            names,
        })
    }

    /// Explicit `--path` roots replace `TOOLCHAIN_REGISTRY_PATH`.
    fn search_path(&self) -> SearchPath {
        let base = if self.roots.is_empty() {
            SearchPath::from_env()
        } else {
            SearchPath::new(self.roots.iter().cloned())
        };
        if self.no_builtins {
            base.with_builtins(false)
        } else {
            base
        }
    }
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: toolchain-query [--path DIR]... [--no-builtins] [--constants] NAME[,NAME...]\n\nOptions:\n  --path, -p DIR   Search root (repeatable); defaults to TOOLCHAIN_REGISTRY_PATH.\n  --no-builtins    Ignore toolchains compiled into this binary.\n  --constants, -c  Include harvested toolchain constants in the report.\n\nExit status: 0 when every name resolved, 2 when any did not, 1 on discovery errors."
    );
    std::process::exit(code);
}
