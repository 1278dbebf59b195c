//! batch-nfpm CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use batch_nfpm::builder::Nfpm;
use batch_nfpm::ops::{check_packaging_tool, BatchBuilder, Collaborators};
use batch_nfpm::sources::{GitCheckout, HttpReleaseLookup, PackageVersionLookup, RpmRepository};
use batch_nfpm::util::{load_config, SystemRunner};

use cli::Cli;

/// Exit code when the batch ran but at least one project failed.
const EXIT_PROJECT_FAILURES: i32 = 2;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_PROJECT_FAILURES),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every project succeeded.
fn run() -> Result<bool> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("batch_nfpm=debug")
        } else {
            EnvFilter::new("batch_nfpm=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.overrides().apply(load_config(cli.config.as_deref())?);
    let nfpm = check_packaging_tool(&cli.nfpm)?;

    let releases = HttpReleaseLookup::new()?;
    let repository = config
        .package_repository()
        .map(RpmRepository::new)
        .transpose()?;
    let checkout = GitCheckout::new();
    let runner = SystemRunner;
    let packaging_tool = Nfpm::new(nfpm);

    let collaborators = Collaborators {
        releases: &releases,
        package_versions: repository
            .as_ref()
            .map(|r| r as &dyn PackageVersionLookup),
        checkout: &checkout,
        runner: &runner,
        packaging_tool: &packaging_tool,
    };

    let report = BatchBuilder::new(&config, collaborators).run();
    for entry in report.projects.iter().filter(|r| r.outcome.is_failure()) {
        eprintln!("{}: {}", entry.project, entry.outcome);
    }

    Ok(!report.has_failures())
}
