//! PKL Monitor CLI - sheet inspection and record dispatch.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the sheet and show per-district progress
//! pkl-cli fetch
//!
//! # Search records
//! pkl-cli list -q "ibu" --district Losari
//!
//! # Create, update, or delete a record
//! pkl-cli create --name "Ibu Sari" --district Baru
//! pkl-cli update --id 12 --status "Sudah Relokasi"
//! pkl-cli delete 12
//!
//! # Ask Gemini for a summary
//! pkl-cli analyze --prompt "Kelurahan mana yang paling tertinggal?"
//! ```
//!
//! # Commands
//!
//! - `fetch` - Fetch the sheet and log the rollup
//! - `list` - Log records matching a filter
//! - `create` / `update` / `delete` - Dispatch a mutation
//! - `analyze` - AI summary of matching records

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pkl_monitor_core::StatusFilter;

mod commands;

use commands::write::RecordFields;

#[derive(Parser)]
#[command(name = "pkl-cli")]
#[command(author, version, about = "PKL relocation monitor CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the sheet and show relocation progress
    Fetch {
        /// Show a single district
        #[arg(short, long)]
        district: Option<String>,
    },
    /// List records matching a filter
    List {
        /// Search vendor name, district, or id
        #[arg(short, long)]
        q: Option<String>,

        /// Restrict to a district
        #[arg(short, long)]
        district: Option<String>,

        /// `all`, `relocated`, or `not_relocated`
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,

        /// Log matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a record
    Create {
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Update a record
    Update {
        /// Record id
        #[arg(long)]
        id: String,

        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a record
    Delete {
        /// Record id
        id: String,
    },
    /// Ask Gemini for a summary
    Analyze {
        /// Question for the model
        #[arg(short, long)]
        prompt: Option<String>,

        /// Restrict to a district
        #[arg(short, long)]
        district: Option<String>,

        /// `all`, `relocated`, or `not_relocated`
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
    },
}

#[derive(Args)]
struct FieldArgs {
    /// Vendor name
    #[arg(long)]
    name: Option<String>,

    /// District (kelurahan)
    #[arg(long)]
    district: Option<String>,

    #[arg(long)]
    address: Option<String>,

    /// Goods sold
    #[arg(long)]
    goods_type: Option<String>,

    /// `Sudah Relokasi` or `Belum Relokasi`
    #[arg(long)]
    status: Option<String>,

    /// Remediation history notes
    #[arg(long)]
    history: Option<String>,

    /// Photo taken before relocation
    #[arg(long)]
    photo_before: Option<PathBuf>,

    /// Photo taken after relocation
    #[arg(long)]
    photo_after: Option<PathBuf>,
}

impl From<FieldArgs> for RecordFields {
    fn from(args: FieldArgs) -> Self {
        Self {
            name: args.name,
            district: args.district,
            address: args.address,
            goods_type: args.goods_type,
            status: args.status,
            history: args.history,
            photo_before: args.photo_before,
            photo_after: args.photo_after,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Fetch { district } => commands::records::fetch(district.as_deref()).await?,
        Commands::List {
            q,
            district,
            status,
            json,
        } => commands::records::list(q, district, status, json).await?,
        Commands::Create { fields } => commands::write::create(fields.into()).await?,
        Commands::Update { id, fields } => commands::write::update(&id, fields.into()).await?,
        Commands::Delete { id } => commands::write::delete(&id).await?,
        Commands::Analyze {
            prompt,
            district,
            status,
        } => commands::analyze::analyze(prompt.as_deref(), district, status).await?,
    }
    Ok(())
}
