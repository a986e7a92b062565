//! Command-line surface: argument parsing, logging init and the run driver.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use crate::analyzer::{Pipeline, SourceResolver};
use crate::colors::Painter;
use crate::config::AnalyzerOptions;
use crate::detect::detect_build;
use crate::output::{default_out_dir, ensure_disjoint, write_output};
use crate::progress::{Spinner, format_count};
use crate::report::RunReport;
use crate::transform::{NavigationHelper, Transformer};
use crate::types::ColorMode;

#[derive(Parser, Debug)]
#[command(name = "unhydrate")]
#[command(about = "Strip framework runtime scripts from pages that do not need them")]
#[command(version)]
pub struct Args {
    /// Project root holding the build output and the component sources
    #[arg(default_value = ".")]
    pub project: PathBuf,

    /// Build directory to process instead of the detected one
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Where rewritten pages are written (default: <PROJECT>/out-unhydrated)
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Analyze and report without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// When to color the human report
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Config file (default: <PROJECT>/.unhydrate/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging plus per-page indicator details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn into_options(self) -> AnalyzerOptions {
        AnalyzerOptions {
            project_root: self.project,
            build_dir: self.build_dir,
            out_dir: self.out,
            config_path: self.config,
            dry_run: self.dry_run,
            json: self.json,
            color: self.color,
            verbose: self.verbose,
        }
    }
}

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG` wins
/// over the verbosity flag.
pub fn init_logging(options: &AnalyzerOptions) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| options.log_level().parse().unwrap_or_default()),
        )
        .try_init();
}

/// Detect, analyze, transform, write and report. Exit code 1 when any page
/// failed.
pub fn run(options: &AnalyzerOptions) -> Result<ExitCode> {
    let root = &options.project_root;
    let config = options.load_config();
    let build = detect_build(root, options.build_dir.as_deref(), &config)?;

    let out_dir = (!options.dry_run).then(|| {
        options
            .out_dir
            .clone()
            .unwrap_or_else(|| default_out_dir(root))
    });
    if let Some(dir) = &out_dir {
        ensure_disjoint(&build.build_dir, dir)?;
    }

    let helper = match &config.navigation_helper {
        Some(path) => {
            let path = root.join(path);
            NavigationHelper::from_file(&path)
                .with_context(|| format!("Failed to read navigation helper {}", path.display()))?
        }
        None => NavigationHelper::default(),
    };
    let resolver = SourceResolver::for_project(root, &build.source_root, &config.aliases);
    let pipeline = Pipeline::new(resolver, Transformer::new(config.runtime_markers(), helper));

    if build.unmatched().next().is_some() {
        debug!(
            unmatched = build.unmatched().count(),
            "documents without an entry source will be copied untouched"
        );
    }

    let painter = Painter::new(options.color);
    let spinner = Spinner::new(
        &format!("Analyzing {}", format_count(build.pages.len(), "page", "pages")),
        !options.json && painter.enabled(),
    );
    let batch = pipeline.run(&build.pages);

    let written = match &out_dir {
        Some(dir) => {
            spinner.set_message(&format!("Writing {}", dir.display()));
            Some(write_output(&build.build_dir, dir, &batch.processed)?)
        }
        None => None,
    };
    spinner.finish_clear();
    info!(
        pages = batch.stats.total_pages,
        skipped = batch.stats.skipped_pages,
        failed = batch.stats.failed_pages,
        "run complete"
    );

    let report = RunReport {
        build: &build,
        batch: &batch,
        out_dir: out_dir.as_deref(),
        written,
    };
    if options.json {
        println!("{}", report.to_json().context("Failed to serialize report")?);
    } else {
        print!("{}", report.render_human(&painter, options.verbose));
    }

    Ok(if batch.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["unhydrate"]).unwrap();
        let options = args.into_options();
        assert_eq!(options.project_root, PathBuf::from("."));
        assert!(!options.dry_run);
        assert!(!options.json);
        assert_eq!(options.color, ColorMode::Auto);
        assert_eq!(options.log_level(), "warn");
    }

    #[test]
    fn test_args_all_flags() {
        let args = Args::try_parse_from([
            "unhydrate",
            "site",
            "--build-dir",
            "dist",
            "--out",
            "/tmp/stripped",
            "--dry-run",
            "--json",
            "--color",
            "never",
            "--config",
            "cfg.toml",
            "-v",
        ])
        .unwrap();
        let options = args.into_options();
        assert_eq!(options.project_root, PathBuf::from("site"));
        assert_eq!(options.build_dir, Some(PathBuf::from("dist")));
        assert_eq!(options.out_dir, Some(PathBuf::from("/tmp/stripped")));
        assert_eq!(options.config_path, Some(PathBuf::from("cfg.toml")));
        assert!(options.dry_run && options.json && options.verbose);
        assert_eq!(options.color, ColorMode::Never);
        assert_eq!(options.log_level(), "debug");
    }

    #[test]
    fn test_rejects_unknown_color() {
        assert!(Args::try_parse_from(["unhydrate", "--color", "sometimes"]).is_err());
    }
}
