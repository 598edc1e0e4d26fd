use std::env;
use std::error::Error as _;
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use colored::Colorize;

use crate::application::use_cases::publish_site::{
    PublishReport, PublishSiteConfig, PublishSiteError, PublishSiteUseCase,
};
use crate::common::verbosity::Verbosity;
use crate::domain::value_objects::github_repo::RemoteBase;
use crate::infrastructure::filesystem::config_store::DEFAULT_CONFIG_FILE;
use crate::infrastructure::git::CommitOutcome;

/// publisher - publish build output to a GitHub Pages branch
#[derive(Debug, Parser)]
#[command(name = "publisher")]
#[command(about = "Publish build output to a GitHub Pages branch")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    " ",
    env!("BUILD_DATE"),
    ")"
))]
pub struct Cli {
    /// Deployment target defined in the config file
    pub target: String,

    /// Path to the config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Do not run the preRun script
    #[arg(long)]
    pub skip_prerun: bool,

    /// Value substituted for ${TAG}
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long)]
    pub directory: Option<PathBuf>,

    /// Root directory for local clones of target repositories
    #[arg(long, env = "PUBLISHER_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Fetch and push `<BASE>/<owner>/<name>.git` instead of GitHub over SSH
    #[arg(long, env = "PUBLISHER_REMOTE_BASE")]
    pub remote_base: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flag(self.verbose)
    }
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    /// Parse the process arguments. Help and version output exit with 0,
    /// usage errors with 1 like every other failure.
    pub fn new() -> Self {
        match Cli::try_parse() {
            Ok(cli) => Self { cli },
            Err(e) if !e.use_stderr() => e.exit(),
            Err(e) => {
                let _ = e.print();
                exit(1);
            }
        }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.cli.verbosity()
    }

    /// Publish and report; failures are printed and exit the process with 1.
    pub fn run(self) -> anyhow::Result<()> {
        if self.cli.no_color {
            colored::control::set_override(false);
        }

        match self.publish() {
            Ok(report) => {
                self.print_report(&report);
                Ok(())
            }
            Err(e) => {
                self.print_error(&e);
                exit(1);
            }
        }
    }

    fn publish(&self) -> Result<PublishReport, PublishSiteFailure> {
        let working_directory = match &self.cli.directory {
            Some(dir) => dir.clone(),
            None => env::current_dir().map_err(PublishSiteFailure::WorkingDirectory)?,
        };

        let config = PublishSiteConfig::new(&self.cli.target, working_directory)
            .with_config_path(self.cli.path.clone())
            .with_skip_pre_run(self.cli.skip_prerun)
            .with_tag(self.cli.tag.clone())
            .with_verbosity(self.verbosity())
            .with_cache_dir(self.cli.cache_dir.clone())
            .with_remote_base(RemoteBase::from_override(self.cli.remote_base.as_deref()));

        println!("{} Publishing {}...", "::".blue().bold(), self.cli.target);

        PublishSiteUseCase::new(config)
            .execute()
            .map_err(PublishSiteFailure::Publish)
    }

    fn print_report(&self, report: &PublishReport) {
        let target = &report.target;
        match report.commit {
            CommitOutcome::Committed(oid) => println!(
                "{} Published {} to {} ({}) as {}",
                "✓".green().bold(),
                report.target_name,
                target.github_repo,
                target.branch,
                short_id(&oid.to_string())
            ),
            CommitOutcome::Unchanged => println!(
                "{} Nothing changed, {} ({}) is up to date",
                "✓".green().bold(),
                target.github_repo,
                target.branch
            ),
        }

        if self.cli.verbose {
            println!("  Local clone: {}", report.clone_path.display());
            println!("  Entries removed: {}", report.sync.removed_entries);
            println!("  Files copied: {}", report.sync.copied_files);
            if report.sync.excluded_entries > 0 {
                println!("  Entries excluded: {}", report.sync.excluded_entries);
            }
            if let Some(domain) = target.custom_domain() {
                println!("  Custom domain: {}", domain);
            }
        }
    }

    fn print_error(&self, failure: &PublishSiteFailure) {
        let message = failure.to_string();
        eprintln!("{} {}", "Error:".red().bold(), message);

        if let PublishSiteFailure::Publish(e) = failure {
            if let Some(stderr) = e.publisher_error().captured_stderr() {
                eprintln!("{}", "Script output:".yellow().bold());
                for line in stderr.trim_end().lines() {
                    eprintln!("  {}", line);
                }
            }
        }

        if self.cli.verbose {
            let causes = cause_chain(failure, &message);
            if !causes.is_empty() {
                eprintln!();
                eprintln!("Caused by:");
                for (index, cause) in causes.iter().enumerate() {
                    eprintln!("  {}: {}", index, cause);
                }
            }
        }
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the CLI can fail with
#[derive(Debug, thiserror::Error)]
pub enum PublishSiteFailure {
    #[error("could not determine the current directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error(transparent)]
    Publish(#[from] PublishSiteError),
}

/// Sources below `failure`, skipping those already spelled out in `message`
fn cause_chain(failure: &PublishSiteFailure, message: &str) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = failure.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            causes.push(text);
        }
        source = cause.source();
    }
    causes
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}
