// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! require-cjs CLI
//!
//! Rewrites ESM imports of pure CommonJS modules into `require()` calls.
//!
//! ## Features
//!
//! - `transform` rewrites files, optionally writing source maps
//! - `classify` explains the verdict for a single import

mod config;
mod host;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use config::{Config, SourceMapMode};
use futures::future::join_all;
use host::FsHost;
use owo_colors::OwoColorize;
use require_cjs_core::{Classifier, RequireCjs, TransformOutput};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "require-cjs",
    about = "Rewrite ESM imports of pure CommonJS modules into require() calls",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Config file (defaults to ./require-cjs.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the given modules
    Transform(TransformArgs),
    /// Explain whether an import would be rewritten
    Classify(ClassifyArgs),
}

#[derive(Args)]
struct PolicyArgs {
    /// Use process.getBuiltinModule() for Node.js built-ins
    #[arg(long)]
    builtin_node_modules: bool,

    /// Always transform this specifier (repeatable); disables detection
    #[arg(long = "transform", value_name = "SPECIFIER")]
    should_transform: Vec<String>,

    /// Cache verdicts for the whole run
    #[arg(long)]
    cache: bool,
}

#[derive(Args)]
struct TransformArgs {
    /// Modules to transform
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write results here instead of stdout
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Output format of the build
    #[arg(long)]
    format: Option<String>,

    /// Source map emission
    #[arg(long, value_enum)]
    source_map: Option<SourceMapMode>,

    /// Include pattern, `/regex/` or glob (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Exclude pattern, `/regex/` or glob (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Specifier the build treats as external (repeatable)
    #[arg(long)]
    external: Vec<String>,

    /// Delete side-effect-only built-in imports
    #[arg(long)]
    remove_builtin_side_effect_imports: bool,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Import specifier, as written
    specifier: String,

    /// File containing the import
    #[arg(short, long)]
    importer: PathBuf,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_filter = if cli.verbose {
        "require_cjs=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Transform(args) => {
            args.merge_into(&mut config);
            run_transform(&args, &config).await
        }
        Commands::Classify(args) => {
            args.policy.merge_into(&mut config);
            run_classify(&args, &config).await
        }
    }
}

impl PolicyArgs {
    fn merge_into(&self, config: &mut Config) {
        config.builtin_node_modules |= self.builtin_node_modules;
        config.cache |= self.cache;
        if !self.should_transform.is_empty() {
            config.should_transform = Some(self.should_transform.clone());
        }
    }
}

impl TransformArgs {
    fn merge_into(&self, config: &mut Config) {
        self.policy.merge_into(config);
        config.remove_builtin_side_effect_imports |= self.remove_builtin_side_effect_imports;
        if !self.include.is_empty() {
            config.include = Some(self.include.clone());
        }
        if !self.exclude.is_empty() {
            config.exclude = Some(self.exclude.clone());
        }
        if self.format.is_some() {
            config.format.clone_from(&self.format);
        }
        if self.source_map.is_some() {
            config.source_map = self.source_map;
        }
        config.externals.extend(self.external.iter().cloned());
    }
}

async fn run_transform(args: &TransformArgs, config: &Config) -> Result<()> {
    let source_map = config.source_map.unwrap_or_default();
    if source_map == SourceMapMode::File && args.out_dir.is_none() {
        bail!("--source-map file requires --out-dir");
    }

    let plugin = RequireCjs::new(config.to_options())?;
    plugin.check_output_format(config.format.as_deref().unwrap_or("es"))?;
    plugin.build_start().await;

    let targets = match &args.out_dir {
        Some(_) => output_paths(&args.files)?,
        None => Vec::new(),
    };

    let host = FsHost::new(&args.files, config.externals.clone());
    let results = join_all(
        args.files
            .iter()
            .map(|file| transform_file(&plugin, &host, file)),
    )
    .await;

    let mut failed = 0usize;
    for (i, (file, result)) in args.files.iter().zip(results).enumerate() {
        let output = match result {
            Ok(output) => output,
            Err(e) => {
                eprintln!("{} {}: {:#}", "✗".red().bold(), file.display(), e);
                failed += 1;
                continue;
            }
        };

        match &args.out_dir {
            Some(out_dir) => {
                let target = out_dir.join(&targets[i]);
                let written = write_output(&target, file, output.as_ref(), source_map)?;
                match output {
                    Some(_) => eprintln!("{} {}", "rewrote".green().bold(), written.display()),
                    None => eprintln!("{} {}", "unchanged".dimmed(), written.display()),
                }
            }
            None => match output {
                Some(output) => print!("{}", with_map_comment(&output, source_map, file)?),
                None => print!("{}", tokio::fs::read_to_string(file).await?),
            },
        }
    }

    if failed > 0 {
        bail!("{failed} file(s) failed to transform");
    }
    Ok(())
}

async fn transform_file(
    plugin: &RequireCjs,
    host: &FsHost,
    file: &Path,
) -> Result<Option<TransformOutput>> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?;
    let id = file
        .canonicalize()
        .unwrap_or_else(|_| file.to_path_buf())
        .to_string_lossy()
        .into_owned();
    Ok(plugin.transform(&code, &id, host).await?)
}

fn with_map_comment(output: &TransformOutput, mode: SourceMapMode, file: &Path) -> Result<String> {
    let mut code = output.code.clone();
    let url = match mode {
        SourceMapMode::None => return Ok(code),
        SourceMapMode::Inline => output.map.to_data_url()?,
        SourceMapMode::File => format!("{}.map", file_name(file)),
    };
    if !code.ends_with('\n') {
        code.push('\n');
    }
    code.push_str(&format!("//# sourceMappingURL={url}\n"));
    Ok(code)
}

/// Output path of each input relative to the inputs' deepest common
/// directory. An input given twice is an error.
fn output_paths(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let absolute = files
        .iter()
        .map(|file| file.canonicalize().or_else(|_| std::path::absolute(file)))
        .collect::<std::io::Result<Vec<_>>>()?;

    let mut root = absolute
        .first()
        .and_then(|path| path.parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();
    for path in &absolute {
        while !path.starts_with(&root) && root.pop() {}
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(files.len());
    for (file, path) in files.iter().zip(&absolute) {
        let relative = path.strip_prefix(&root).unwrap_or(path).to_path_buf();
        if !seen.insert(relative.clone()) {
            bail!("{} is given more than once", file.display());
        }
        targets.push(relative);
    }
    Ok(targets)
}

/// Write one result to `target`, returning the written path.
fn write_output(
    target: &Path,
    file: &Path,
    output: Option<&TransformOutput>,
    mode: SourceMapMode,
) -> Result<PathBuf> {
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }

    match output {
        Some(output) => {
            std::fs::write(target, with_map_comment(output, mode, target)?)?;
            if mode == SourceMapMode::File {
                let map_path = target.with_file_name(format!("{}.map", file_name(target)));
                std::fs::write(map_path, output.map.to_json()?)?;
            }
        }
        None => {
            std::fs::copy(file, target)
                .with_context(|| format!("cannot copy {}", file.display()))?;
        }
    }
    Ok(target.to_path_buf())
}

fn file_name(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

async fn run_classify(args: &ClassifyArgs, config: &Config) -> Result<()> {
    let classifier = Classifier::new(&config.to_options().resolve()?);
    classifier.init().await;

    let importer = args
        .importer
        .canonicalize()
        .unwrap_or_else(|_| args.importer.clone());
    let decision = classifier
        .explain(&args.specifier, &importer.to_string_lossy())
        .await;

    let verdict = if decision.verdict {
        "CommonJS".green().bold().to_string()
    } else {
        "not CommonJS".yellow().bold().to_string()
    };
    println!(
        "{} {} ({})",
        args.specifier.cyan(),
        verdict,
        decision.stage.unwrap_or("no stage decided").dimmed()
    );
    Ok(())
}
