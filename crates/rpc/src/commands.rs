//! CLI commands

use rust_decimal::Decimal;
use tresor_core::{
    Actor, Amount, CpeDecision, DomainFields, LedgerRef, PaymentFields, RevenueFields, TrDecision,
    TransactionKind, TransactionRecord,
};
use tresor_integrity::VerificationReport;
use tresor_store::RecordFilter;
use tresor_workflow::{BatchReport, DashboardStats, LedgerAudit};

use crate::context::AppContext;

/// Register a payment
pub async fn create_payment(
    ctx: &AppContext,
    actor: &Actor,
    beneficiary_code: &str,
    full_name: &str,
    bank_info: &str,
    amount: Decimal,
) -> Result<TransactionRecord, anyhow::Error> {
    let fields = PaymentFields {
        beneficiary_code: beneficiary_code.to_string(),
        full_name: full_name.to_string(),
        bank_info: bank_info.to_string(),
        amount: Amount::new(amount)?,
    };
    let record = ctx.workflow.register_payment(actor, fields).await?;

    println!("✅ Registered payment {} ({} to {})", record.id, amount, full_name);
    Ok(record)
}

/// Register a revenue
pub async fn create_revenue(
    ctx: &AppContext,
    actor: &Actor,
    taxpayer_number: &str,
    full_name: &str,
    tax_type: &str,
    amount: Decimal,
) -> Result<TransactionRecord, anyhow::Error> {
    let fields = RevenueFields {
        taxpayer_number: taxpayer_number.to_string(),
        full_name: full_name.to_string(),
        tax_type: tax_type.to_string(),
        amount: Amount::new(amount)?,
    };
    let record = ctx.workflow.register_revenue(actor, fields).await?;

    println!("✅ Registered revenue {} ({} from {})", record.id, amount, full_name);
    Ok(record)
}

/// Submit one record, or several as a batch
pub async fn submit(ctx: &AppContext, actor: &Actor, ids: &[String]) -> Result<(), anyhow::Error> {
    if let [id] = ids {
        let ledger_ref = ctx.workflow.submit(actor, id).await?;
        print_committed("Submitted", id, &ledger_ref);
    } else {
        let report = ctx.workflow.submit_many(actor, ids).await?;
        print_batch("Submitted", &report);
    }
    Ok(())
}

/// Regional Treasurer decision on one or several records
pub async fn aggregate(
    ctx: &AppContext,
    actor: &Actor,
    decision: TrDecision,
    ids: &[String],
) -> Result<(), anyhow::Error> {
    if let [id] = ids {
        let ledger_ref = ctx.workflow.aggregate(actor, id, decision).await?;
        print_committed(&format!("Aggregated ({})", decision), id, &ledger_ref);
    } else {
        let report = ctx.workflow.aggregate_batch(actor, ids, decision).await?;
        print_batch(&format!("Aggregated ({})", decision), &report);
    }
    Ok(())
}

/// Principal Accountant decision on one or several records
pub async fn cpe_validate(
    ctx: &AppContext,
    actor: &Actor,
    decision: CpeDecision,
    ids: &[String],
) -> Result<(), anyhow::Error> {
    if let [id] = ids {
        let ledger_ref = ctx.workflow.cpe_validate(actor, id, decision).await?;
        print_committed(&format!("Validated ({})", decision), id, &ledger_ref);
    } else {
        let report = ctx.workflow.cpe_validate_batch(actor, ids, decision).await?;
        print_batch(&format!("Validated ({})", decision), &report);
    }
    Ok(())
}

/// Compare a record with its ledger history
pub async fn verify(ctx: &AppContext, actor: &Actor, id: &str) -> Result<VerificationReport, anyhow::Error> {
    let report = ctx.workflow.verify(actor, id).await?;

    if report.all_valid {
        println!("✅ {} matches its ledger history ({} entries)", id, report.history_len);
    } else {
        println!("❌ {} diverges from its ledger history:", id);
        for issue in &report.issues {
            println!("   - {}", issue);
        }
    }
    Ok(report)
}

/// Records waiting on the caller's tier
pub async fn pending(
    ctx: &AppContext,
    actor: &Actor,
    kind: Option<TransactionKind>,
) -> Result<Vec<TransactionRecord>, anyhow::Error> {
    let records = ctx.workflow.pending(actor, kind).await?;

    println!("Pending for {} ({}): {} record(s)", actor.id, actor.role, records.len());
    print_records(&records);
    Ok(records)
}

pub async fn list(
    ctx: &AppContext,
    actor: &Actor,
    filter: &RecordFilter,
) -> Result<Vec<TransactionRecord>, anyhow::Error> {
    let records = ctx.workflow.list(actor, filter).await?;
    print_records(&records);
    Ok(records)
}

pub async fn stats(
    ctx: &AppContext,
    actor: &Actor,
    kind: Option<TransactionKind>,
) -> Result<DashboardStats, anyhow::Error> {
    let stats = ctx.workflow.stats(actor, kind).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(stats)
}

/// Print the ledger history of a record
pub async fn history(ctx: &AppContext, actor: &Actor, id: &str) -> Result<(), anyhow::Error> {
    let entries = ctx.workflow.history(actor, id).await?;

    println!("Ledger history for {} ({} entries)", id, entries.len());
    for entry in &entries {
        println!(
            "  #{} block {} {} {} by {}",
            entry.sequence,
            entry.block_number,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.event,
            entry
                .record
                .cpe_validated_by
                .as_deref()
                .or(entry.record.aggregated_by.as_deref())
                .unwrap_or(&entry.record.created_by),
        );
    }
    Ok(())
}

/// Audit the ledger (verify every hash chain)
pub async fn audit(ctx: &AppContext, actor: &Actor) -> Result<LedgerAudit, anyhow::Error> {
    let audit = ctx.workflow.audit(actor).await?;

    if audit.is_intact() {
        println!(
            "✅ Hash chains verified ({} chains, {} entries, height {})",
            audit.chains.len(),
            audit.entries,
            audit.height
        );
    } else {
        for chain in audit.broken() {
            if let Some(err) = &chain.error {
                println!("❌ Chain {} broken: {}", chain.chain_id, err);
            }
        }
    }
    Ok(audit)
}

fn print_committed(action: &str, id: &str, ledger_ref: &LedgerRef) {
    println!(
        "✅ {} {} (tx: {}, block: {})",
        action, id, ledger_ref.transaction_id, ledger_ref.block_number
    );
}

fn print_batch(action: &str, report: &BatchReport) {
    println!("{} {}/{} record(s)", action, report.success_count(), report.total());
    for id in &report.succeeded {
        println!("   ✅ {}", id);
    }
    for failure in &report.failed {
        println!("   ❌ {}: {}", failure.id, failure.error);
    }
}

fn print_records(records: &[TransactionRecord]) {
    for record in records {
        println!(
            "  {} {:<8} {:>14} {:<24} {}/{}",
            record.id,
            record.kind().as_str(),
            record.payload.amount().to_string(),
            record.payload.full_name(),
            record.submission_status,
            record.aggregation_status,
        );
    }
}
