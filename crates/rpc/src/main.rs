//! Tresor CLI - Main entry point

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tresor_core::{Actor, AggregationStatus, CpeDecision, SubmissionStatus, TrDecision, TransactionKind};
use tresor_rpc::{commands, AppContext};
use tresor_store::RecordFilter;
use tresor_workflow::WorkflowConfig;

#[derive(Parser)]
#[command(name = "tresor")]
#[command(about = "Tresor - treasury payment and revenue workflow", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Workflow configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Membership identifier of the caller, e.g. TrRegionMSP_marie
    #[arg(short, long)]
    actor: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a payment
    CreatePayment {
        /// Beneficiary registration code (matricule)
        beneficiary_code: String,
        /// Beneficiary full name
        full_name: String,
        /// Bank details
        bank_info: String,
        /// Amount to pay
        amount: Decimal,
    },

    /// Register a revenue
    CreateRevenue {
        /// Taxpayer number
        taxpayer_number: String,
        /// Taxpayer full name
        full_name: String,
        /// Tax type
        tax_type: String,
        /// Amount collected
        amount: Decimal,
    },

    /// Submit pending records to the ledger
    Submit {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Regional Treasurer decision (approved | rejected)
    Aggregate {
        decision: TrDecision,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Principal Accountant decision (cpe_approved | cpe_rejected)
    CpeValidate {
        decision: CpeDecision,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Compare a record with its ledger history
    Verify { id: String },

    /// Records waiting on the caller's tier
    Pending {
        /// payment | revenue
        #[arg(long)]
        kind: Option<TransactionKind>,
    },

    /// List records
    List {
        #[arg(long)]
        kind: Option<TransactionKind>,
        /// pending | success | failed
        #[arg(long)]
        submission: Option<SubmissionStatus>,
        /// waiting_approval | approved | rejected | cpe_approved | cpe_rejected
        #[arg(long)]
        aggregation: Option<AggregationStatus>,
    },

    /// Dashboard statistics
    Stats {
        #[arg(long)]
        kind: Option<TransactionKind>,
    },

    /// Ledger history of a record
    History { id: String },

    /// Audit the ledger (verify hash chains)
    Audit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => WorkflowConfig::from_file(path)?,
        None => WorkflowConfig::default(),
    };
    let actor = Actor::from_msp_id(&cli.actor)?;
    let ctx = AppContext::with_config(&cli.data, config)?;

    match cli.command {
        Commands::CreatePayment {
            beneficiary_code,
            full_name,
            bank_info,
            amount,
        } => {
            commands::create_payment(&ctx, &actor, &beneficiary_code, &full_name, &bank_info, amount).await?;
        }

        Commands::CreateRevenue {
            taxpayer_number,
            full_name,
            tax_type,
            amount,
        } => {
            commands::create_revenue(&ctx, &actor, &taxpayer_number, &full_name, &tax_type, amount).await?;
        }

        Commands::Submit { ids } => {
            commands::submit(&ctx, &actor, &ids).await?;
        }

        Commands::Aggregate { decision, ids } => {
            commands::aggregate(&ctx, &actor, decision, &ids).await?;
        }

        Commands::CpeValidate { decision, ids } => {
            commands::cpe_validate(&ctx, &actor, decision, &ids).await?;
        }

        Commands::Verify { id } => {
            commands::verify(&ctx, &actor, &id).await?;
        }

        Commands::Pending { kind } => {
            commands::pending(&ctx, &actor, kind).await?;
        }

        Commands::List {
            kind,
            submission,
            aggregation,
        } => {
            let filter = RecordFilter {
                kind,
                submission,
                aggregation,
            };
            commands::list(&ctx, &actor, &filter).await?;
        }

        Commands::Stats { kind } => {
            commands::stats(&ctx, &actor, kind).await?;
        }

        Commands::History { id } => {
            commands::history(&ctx, &actor, &id).await?;
        }

        Commands::Audit => {
            commands::audit(&ctx, &actor).await?;
        }
    }

    Ok(())
}
