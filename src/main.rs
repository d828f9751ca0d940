//! Command-line interface for dvbi-validator

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use dvbi_validator::{
    ContentGuideChecker, Loader, ReferenceConfig, ReferenceData, Report, RequestType,
    ServiceListChecker, SourceMode,
};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "dvbi-validate")]
#[command(author, version, about = "DVB-I Service List and Content Guide validator", long_about = None)]
struct Cli {
    /// Reference data configuration (TOML); without it vocabulary checks are skipped
    #[arg(short, long, global = true, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Print the document with findings attached to their lines, as HTML
    #[arg(long, global = true)]
    markup: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a Service List
    Sl {
        /// Path to the Service List document
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Validate a Content Guide response
    Cg {
        /// Path to the Content Guide document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Request the document answers (schedule, now-next, window, program-info,
        /// more-episodes, box-set-categories, box-set-lists, box-set-contents)
        #[arg(short, long, default_value = "schedule")]
        request: RequestType,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether the document had no errors
#[cfg(feature = "cli")]
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let data = load_reference_data(cli.config.as_ref())?;

    let (source, report) = match &cli.command {
        Commands::Sl { file } => {
            let xml = fs::read_to_string(file)?;
            let report = ServiceListChecker::new(&data).validate(&xml);
            (xml, report)
        }
        Commands::Cg { file, request } => {
            let xml = fs::read_to_string(file)?;
            let report = ContentGuideChecker::new(&data).validate(&xml, *request);
            (xml, report)
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if cli.markup {
        for line in report.markup(&source) {
            println!("{}", line.to_html());
        }
    } else {
        print_report(&report);
    }

    Ok(report.is_valid())
}

#[cfg(feature = "cli")]
fn load_reference_data(path: Option<&PathBuf>) -> Result<ReferenceData, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(ReferenceData::new());
    };
    let config = ReferenceConfig::from_file(path)?;
    let loader = Loader::new().with_allow_remote(matches!(config.mode, SourceMode::Remote));
    Ok(ReferenceData::load(&config, &loader))
}

#[cfg(feature = "cli")]
fn print_report(report: &Report) {
    for finding in report.findings() {
        println!("{}", finding);
    }
    println!();

    if report.is_valid() {
        println!("✓ Document is valid");
    } else {
        println!("✗ Document is invalid");
    }
    println!(
        "  {} errors, {} warnings, {} informational",
        report.error_count(),
        report.warning_count(),
        report.information_count()
    );
    for severity in dvbi_validator::Severity::ALL {
        let counts = report.counts(severity);
        for (key, count) in &counts.by_key {
            println!("  {} x {} ({})", count, key, severity);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
