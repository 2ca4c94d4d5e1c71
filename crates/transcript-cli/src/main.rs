//! Transcript - academic record CLI
//!
//! The `transcript` command reconstructs and maintains per-student academic
//! records from published term results and manual entry.
//!
//! ## Commands
//!
//! - `fetch`: Read published results for a registration number (no writes)
//! - `import`: Fetch published results and merge them into a record
//! - `submit`: Merge manually entered terms from a JSON file
//! - `update-term`: Merge one term from a JSON file
//! - `show` / `summary`: Inspect a record
//! - `delete`: Remove a record
//! - `profile`: Manage the registration number on file for an owner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

use transcript_core::{
    AcademicRecord, ExternalResults, IncomingTerm, RecordService, RecordSummary, Term,
};
use transcript_fetch::{Ingestor, ProbeConfig, ReqwestTransport};
use transcript_state::{
    normalize_registration, ProfileDirectory, SurrealHandle, SurrealProfileDirectory,
    SurrealRecordStore,
};

type Service =
    RecordService<SurrealRecordStore, SurrealProfileDirectory, Ingestor<ReqwestTransport>>;

#[derive(Parser)]
#[command(name = "transcript")]
#[command(author = "Transcript Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Academic record reconstruction and aggregation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines and JSON command output
    #[arg(long, global = true)]
    json: bool,

    /// Fetch all terms in parallel
    #[arg(long, global = true)]
    concurrent: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch published results without storing them
    Fetch {
        /// Registration number (USN)
        registration: String,
    },

    /// Fetch published results and merge them into the owner's record
    Import {
        /// Owner identity
        owner: String,

        /// Registration number (USN)
        registration: String,
    },

    /// Merge manually entered terms into the owner's record
    Submit {
        /// Owner identity
        owner: String,

        /// Registration number (USN)
        registration: String,

        /// JSON file holding an array of terms
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Merge one term into an existing record
    UpdateTerm {
        /// Owner identity
        owner: String,

        /// Term number (1-8)
        term: u8,

        /// JSON file holding the term
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show a record, or one of its terms
    Show {
        /// Owner identity
        owner: String,

        /// Only show this term
        #[arg(short, long)]
        term: Option<u8>,
    },

    /// Show the cumulative and per-term averages
    Summary {
        /// Owner identity
        owner: String,
    },

    /// Delete the owner's record
    Delete {
        /// Owner identity
        owner: String,
    },

    /// Manage owner profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Record the registration number on file for an owner
    Set {
        /// Owner identity
        owner: String,

        /// Registration number (USN)
        registration: String,
    },
    /// Show the registration number on file for an owner
    Show {
        /// Owner identity
        owner: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    transcript_core::init_tracing(cli.json, level);

    let handle = Arc::new(
        SurrealHandle::setup_from_env()
            .await
            .context("Failed to connect to Transcript database")?,
    );

    let mut probe = ProbeConfig::from_env();
    if cli.concurrent {
        probe.concurrent = true;
    }
    let service = build_service(Arc::clone(&handle), probe)?;
    let profiles = SurrealProfileDirectory::new(Arc::clone(&handle));
    let json = cli.json;

    match cli.command {
        Commands::Fetch { registration } => cmd_fetch(&service, &registration, json).await,
        Commands::Import {
            owner,
            registration,
        } => cmd_import(&service, &owner, &registration, json).await,
        Commands::Submit {
            owner,
            registration,
            file,
        } => cmd_submit(&service, &owner, &registration, &file, json).await,
        Commands::UpdateTerm { owner, term, file } => {
            cmd_update_term(&service, &owner, term, &file, json).await
        }
        Commands::Show { owner, term } => cmd_show(&service, &owner, term, json).await,
        Commands::Summary { owner } => cmd_summary(&service, &owner, json).await,
        Commands::Delete { owner } => cmd_delete(&service, &owner).await,
        Commands::Profile { action } => match action {
            ProfileAction::Set {
                owner,
                registration,
            } => cmd_profile_set(&profiles, &owner, &registration).await,
            ProfileAction::Show { owner } => cmd_profile_show(&profiles, &owner).await,
        },
    }
}

fn build_service(handle: Arc<SurrealHandle>, probe: ProbeConfig) -> Result<Service> {
    let transport = ReqwestTransport::new(&probe).context("Failed to build HTTP client")?;
    Ok(RecordService::new(
        SurrealRecordStore::new(Arc::clone(&handle)),
        SurrealProfileDirectory::new(handle),
        Ingestor::new(probe, transport),
    ))
}

/// Fetch published results (read-only)
async fn cmd_fetch(service: &Service, registration: &str, json: bool) -> Result<()> {
    let results = service
        .fetch_external(registration)
        .await
        .with_context(|| format!("Failed to fetch results for '{}'", registration))?;

    if json {
        print_json(&results)?;
    } else {
        println!("{}", render_external(&results));
    }
    Ok(())
}

/// Fetch and persist published results
async fn cmd_import(service: &Service, owner: &str, registration: &str, json: bool) -> Result<()> {
    let record = service
        .import_external(owner, registration)
        .await
        .with_context(|| format!("Failed to import results for '{}'", owner))?;

    info!(owner, terms = record.terms.len(), "import complete");
    if json {
        print_json(&record)?;
    } else {
        println!("{}", render_record(&record));
    }
    Ok(())
}

/// Merge manually entered terms from a file
async fn cmd_submit(
    service: &Service,
    owner: &str,
    registration: &str,
    file: &PathBuf,
    json: bool,
) -> Result<()> {
    let terms: Vec<IncomingTerm> = read_json_file(file)?;
    let record = service
        .submit_manual_terms(owner, registration, &terms)
        .await
        .with_context(|| format!("Failed to submit terms for '{}'", owner))?;

    if json {
        print_json(&record)?;
    } else {
        println!(
            "Merged {} term(s) for '{}', CGPA {:.2}",
            terms.len(),
            owner,
            record.cumulative_average
        );
    }
    Ok(())
}

/// Merge one term from a file
async fn cmd_update_term(
    service: &Service,
    owner: &str,
    term: u8,
    file: &PathBuf,
    json: bool,
) -> Result<()> {
    let incoming: IncomingTerm = read_json_file(file)?;
    let record = service
        .update_term(owner, term, incoming)
        .await
        .with_context(|| format!("Failed to update term {} for '{}'", term, owner))?;

    if json {
        print_json(&record)?;
    } else {
        println!(
            "Updated term {} for '{}', CGPA {:.2}",
            term, owner, record.cumulative_average
        );
    }
    Ok(())
}

/// Show a record or a single term
async fn cmd_show(service: &Service, owner: &str, term: Option<u8>, json: bool) -> Result<()> {
    match term {
        Some(number) => {
            let term = service.get_term(owner, number).await?;
            if json {
                print_json(&term)?;
            } else {
                print!("{}", render_term(&term));
            }
        }
        None => {
            let record = service.get_record(owner).await?;
            if json {
                print_json(&record)?;
            } else {
                println!("{}", render_record(&record));
            }
        }
    }
    Ok(())
}

/// Show the record summary
async fn cmd_summary(service: &Service, owner: &str, json: bool) -> Result<()> {
    let summary = service.get_summary(owner).await?;
    if json {
        print_json(&summary)?;
    } else {
        println!("{}", render_summary(&summary));
    }
    Ok(())
}

/// Delete a record
async fn cmd_delete(service: &Service, owner: &str) -> Result<()> {
    service
        .delete_record(owner)
        .await
        .context(format!("Failed to delete record for '{}'", owner))?;

    println!("Deleted record for '{}'", owner);
    Ok(())
}

async fn cmd_profile_set(
    profiles: &SurrealProfileDirectory,
    owner: &str,
    registration: &str,
) -> Result<()> {
    profiles
        .set_registration_number(owner, registration)
        .await
        .context("Failed to save profile")?;

    println!(
        "Profile for '{}' set to {}",
        owner,
        normalize_registration(registration)
    );
    Ok(())
}

async fn cmd_profile_show(profiles: &SurrealProfileDirectory, owner: &str) -> Result<()> {
    match profiles.registration_number(owner).await? {
        Some(reg) => println!("{}", reg),
        None => println!("No profile on file for '{}'", owner),
    }
    Ok(())
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_term(term: &Term) -> String {
    let mut out = format!("Term {}  SGPA {:.2}", term.number, term.average);
    if let (Some(month), Some(year)) = (term.exam_month, term.exam_year) {
        out.push_str(&format!("  ({:?} {})", month, year));
    }
    out.push('\n');
    for item in &term.items {
        let total = item
            .total_score
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let grade = item
            .grade
            .map(|g| g.label().to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<10} {:<32} {:>2} cr  {:>3}  {}\n",
            item.code,
            truncate(&item.name, 32),
            item.credits,
            total,
            grade
        ));
    }
    out
}

fn render_record(record: &AcademicRecord) -> String {
    let mut out = format!(
        "Registration {} ({})\nCGPA {:.2} over {} term(s), updated {}\n",
        record.registration_number,
        record.provenance,
        record.cumulative_average,
        record.terms.len(),
        record.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for term in &record.terms {
        out.push('\n');
        out.push_str(&render_term(term));
    }
    out
}

fn render_summary(summary: &RecordSummary) -> String {
    let mut out = format!(
        "{}  CGPA {:.2}  ({} term(s))\n",
        summary.registration_number, summary.cumulative_average, summary.total_terms
    );
    for term in &summary.per_term {
        out.push_str(&format!(
            "  Term {}  SGPA {:.2}  {} item(s)\n",
            term.term_number, term.average, term.item_count
        ));
    }
    out
}

fn render_external(results: &ExternalResults) -> String {
    let mut out = format!(
        "{} from {} at {}\n",
        results.registration_number,
        results.source,
        results.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for term in &results.per_term {
        let average = term
            .average
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  Term {}  SGPA {}  {} item(s)\n",
            term.term_number,
            average,
            term.items.len()
        ));
    }
    out
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
