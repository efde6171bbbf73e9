//! Terminal rendering

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

use vericred_core::{CertificateRecord, IssuerRecord, MetadataStatus, Role, TimestampSource};
use vericred_indexer::SkippedIssuance;
use vericred_ipfs::PinReceipt;

/// Spinner shown while a reconstruction pass runs
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_badge(record: &CertificateRecord) -> String {
    if record.revoked {
        style("REVOKED").red().bold().to_string()
    } else {
        style("VALID").green().bold().to_string()
    }
}

/// Print certificate records
pub fn print_certificates(records: &[CertificateRecord], skipped: &[SkippedIssuance]) {
    if records.is_empty() {
        println!("{}", style("No certificates found").dim());
    }

    for record in records {
        println!(
            "{} {}  #{}",
            status_badge(record),
            style(&record.title).bold(),
            record.on_chain_index
        );
        println!("    {}", record.description);
        println!("    Recipient: {} ({})", record.recipient_name, record.holder_address);
        println!("    Issuer:    {} ({})", record.issuer_name, record.issuer_address);

        let issued = record.issued_at.format("%Y-%m-%d %H:%M:%S UTC");
        match record.timestamp_source {
            TimestampSource::Block => println!("    Issued:    {}", issued),
            TimestampSource::ReconstructionClock => println!(
                "    Issued:    {} {}",
                issued,
                style("(block unavailable)").yellow()
            ),
        }

        match record.metadata_status {
            MetadataStatus::Fetched => println!("    Metadata:  {}", record.metadata_uri),
            MetadataStatus::Fallback => println!(
                "    Metadata:  {} {}",
                record.metadata_uri,
                style("(unavailable)").yellow()
            ),
        }
        println!("    Tx:        {}", style(record.transaction_hash).dim());
        println!();
    }

    if !skipped.is_empty() {
        println!(
            "{} {} issuance(s) could not be decoded and were skipped",
            style("!").yellow().bold(),
            skipped.len()
        );
        for skip in skipped {
            let tx = skip
                .transaction_hash
                .map(|tx| tx.to_string())
                .unwrap_or_else(|| "unknown transaction".to_string());
            println!("    {}: {}", style(tx).dim(), skip.reason);
        }
    }
}

/// Print issuer memberships
pub fn print_issuers(issuers: &[IssuerRecord]) {
    if issuers.is_empty() {
        println!("{}", style("No issuer events in range").dim());
        return;
    }
    for issuer in issuers {
        let status = if issuer.is_active {
            style("active").green()
        } else {
            style("inactive").red()
        };
        println!("{}  {}", issuer.address, status);
    }
}

/// Print an account role
pub fn print_role(role: Role) {
    let styled = match role {
        Role::Owner => style(role.to_string()).magenta().bold(),
        Role::Issuer => style(role.to_string()).cyan().bold(),
        Role::Viewer => style(role.to_string()).dim(),
    };
    println!("{}", styled);
}

/// Print a pin receipt
pub fn print_receipt(receipt: &PinReceipt) {
    println!("{} Pinned certificate metadata", style("✓").green().bold());
    println!("    CID:       {}", receipt.id);
    println!("    URI:       {}", style(receipt.metadata_uri()).bold());
    println!("    Size:      {} bytes", receipt.size);
    println!("    Timestamp: {}", receipt.timestamp);
}
