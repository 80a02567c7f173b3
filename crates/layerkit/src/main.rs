//! Layerkit CLI - add template files to an existing Nuxt project

mod logging;

use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use colored::Colorize;
use layerkit_core::error::EXIT_USAGE;
use layerkit_core::{
    Cleanup, FeatureOverrides, ProductConfig, RunMode, ScaffoldError, ScaffoldOptions,
    SourceRequest,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Layerkit product configuration
#[derive(Clone)]
pub struct LayerkitConfig;

impl ProductConfig for LayerkitConfig {
    fn name(&self) -> &'static str {
        "layerkit"
    }

    fn display_name(&self) -> &'static str {
        "Layerkit"
    }

    fn default_template_source(&self) -> &'static str {
        "https://github.com/layerkit/nuxt-starter.git"
    }

    fn template_source_env(&self) -> &'static str {
        "LAYERKIT_TEMPLATE_URL"
    }

    fn lock_file_name(&self) -> &'static str {
        ".layerkit.lock"
    }

    fn framework_markers(&self) -> &'static [&'static str] {
        &[
            "nuxt.config.ts",
            "nuxt.config.js",
            "nuxt.config.mjs",
            "nuxt.config.mts",
        ]
    }

    fn cli_description(&self) -> &'static str {
        "Add template files to an existing Nuxt project without overwriting anything"
    }
}

#[derive(Parser, Debug)]
#[command(name = "layerkit")]
#[command(version)]
pub struct Args {
    /// Project directory to scaffold into (defaults to the current directory)
    pub target: Option<PathBuf>,

    /// Enable every optional feature
    #[arg(short, long, conflicts_with_all = ["without_content", "without_tailwind"])]
    pub all: bool,

    /// Include content files even if @nuxt/content is not installed
    #[arg(long, conflicts_with = "without_content")]
    pub with_content: bool,

    /// Leave out content files
    #[arg(long)]
    pub without_content: bool,

    /// Include Tailwind config even if Tailwind is not installed
    #[arg(long, conflicts_with = "without_tailwind")]
    pub with_tailwind: bool,

    /// Leave out Tailwind config
    #[arg(long)]
    pub without_tailwind: bool,

    /// Leave out the template's INFO.md
    #[arg(long)]
    pub clean: bool,

    /// Show what would be added without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only classify files, never copy
    #[arg(short, long, conflicts_with = "dry_run")]
    pub list: bool,

    /// Print a JSON summary on stdout
    #[arg(long)]
    pub json: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Also add README, LICENSE and similar files
    #[arg(long)]
    pub include_docs: bool,

    /// Template source: git URL or local directory
    #[arg(long, value_name = "URL|PATH")]
    pub source: Option<String>,

    /// Branch, tag or commit to check out from a git source
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Subdirectory holding the template, used when present
    #[arg(long, value_name = "DIR")]
    pub subdir: Option<String>,

    /// Try a sparse, blob-filtered clone first (falls back to a full clone)
    #[arg(long)]
    pub sparse: bool,
}

impl Args {
    fn overrides(&self) -> FeatureOverrides {
        FeatureOverrides {
            all: self.all,
            with_content: self.with_content,
            without_content: self.without_content,
            with_tailwind: self.with_tailwind,
            without_tailwind: self.without_tailwind,
        }
    }

    fn mode(&self) -> RunMode {
        if self.list {
            RunMode::List
        } else if self.dry_run {
            RunMode::DryRun
        } else {
            RunMode::Apply
        }
    }

    /// Turn flags plus environment into the explicit options the core runs on
    fn into_options<C: ProductConfig>(self, config: &C) -> ScaffoldOptions {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let target = match &self.target {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => current_dir.join(dir),
            None => current_dir,
        };

        let source = self
            .source
            .clone()
            .or_else(|| {
                std::env::var(config.template_source_env())
                    .ok()
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| config.default_template_source().to_string());

        let embedded_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(config.embedded_dir_name())));

        ScaffoldOptions {
            target,
            source: SourceRequest {
                source,
                git_ref: self.git_ref.clone(),
                subdir: self
                    .subdir
                    .clone()
                    .unwrap_or_else(|| config.default_subdir().to_string()),
                optimized: self.sparse,
            },
            embedded_dir,
            overrides: self.overrides(),
            clean: self.clean,
            include_docs: self.include_docs,
            mode: self.mode(),
        }
    }
}

fn report_error(err: &ScaffoldError, json: bool) {
    if json {
        let body = serde_json::json!({
            "error": err.to_string(),
            "exit_code": err.exit_code(),
        });
        println!("{}", body);
    } else {
        eprintln!("{} {}", "Error:".red(), err);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = LayerkitConfig;
    let parsed = Args::command()
        .about(config.cli_description())
        .try_get_matches()
        .and_then(|matches| Args::from_arg_matches(&matches));
    let args = match parsed {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    if args.no_color || args.json {
        colored::control::set_override(false);
    }
    if let Err(e) = logging::init_logging(args.debug, args.no_color) {
        eprintln!("{}", e);
    }

    // Remove the lock and any temporary clone on Ctrl+C
    let cleanup = Cleanup::new();
    let on_signal = cleanup.clone();
    ctrlc::set_handler(move || {
        on_signal.run();
        std::process::exit(130);
    })
    .ok();

    let json = args.json;
    let options = args.into_options(&config);
    tracing::debug!(?options, "starting {}", config.display_name());

    let result = layerkit_core::run(&config, &options, &cleanup).await;
    cleanup.run();

    match result {
        Ok(report) => {
            if json {
                match report.to_json() {
                    Ok(body) => println!("{}", body),
                    Err(e) => {
                        eprintln!("Failed to encode report: {}", e);
                        return ExitCode::from(EXIT_USAGE);
                    }
                }
            } else {
                print!("{}", report.render_text());
            }
            ExitCode::from(report.exit_code())
        }
        Err(err) => {
            report_error(&err, json);
            ExitCode::from(err.exit_code())
        }
    }
}
