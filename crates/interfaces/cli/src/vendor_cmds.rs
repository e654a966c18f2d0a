use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{Result, bail};

use vendor_onboarding::{
    SortKey, SortOrder, Step, VendorFilter, VendorRecord, VendorStore, sort_records,
};

pub(crate) async fn run_list(
    store: &dyn VendorStore,
    filter: &VendorFilter,
    sort: SortKey,
    order: SortOrder,
) -> Result<()> {
    let listing = store.list().await?;
    let mut vendors: Vec<VendorRecord> = filter
        .apply(&listing.vendors)
        .into_iter()
        .cloned()
        .collect();
    sort_records(&mut vendors, sort, order);

    println!("── vendors ──────────────────────────────────────────");
    for line in vendor_table(&vendors) {
        println!("  {line}");
    }
    println!("  ({} of {} vendors)", vendors.len(), listing.vendors.len());

    let countries: Vec<&str> = listing
        .filter_options
        .countries
        .iter()
        .map(String::as_str)
        .collect();
    if !countries.is_empty() {
        println!("  countries: {}", countries.join(", "));
    }
    Ok(())
}

pub(crate) fn vendor_table(vendors: &[VendorRecord]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<10}  {:<28}  {:<20}  {:<16}  {:<8}",
        "ID", "COMPANY", "CONTACT", "COUNTRY", "STATUS"
    )];
    for vendor in vendors {
        lines.push(format!(
            "{:<10}  {:<28}  {:<20}  {:<16}  {:<8}",
            vendor.vendor_id,
            truncate(&vendor.draft.company_name, 28),
            truncate(&vendor.draft.contact_person, 20),
            truncate(&vendor.draft.country, 16),
            vendor.status,
        ));
    }
    lines
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub(crate) async fn run_show(store: &dyn VendorStore, vendor_id: &str) -> Result<()> {
    let record = store.get(vendor_id).await?;
    for line in vendor_details(&record) {
        println!("{line}");
    }
    Ok(())
}

/// Full record, grouped by wizard section.  Banking details are printed in
/// full; this is the operator view.
pub(crate) fn vendor_details(record: &VendorRecord) -> Vec<String> {
    let mut lines = vec![
        format!("── {} ──────────────────────────────", record.vendor_id),
        format!("  status     : {}", record.status),
        format!("  created at : {}", record.created_at.format("%Y-%m-%d %H:%M UTC")),
    ];
    if let Some(updated_at) = record.updated_at {
        lines.push(format!("  updated at : {}", updated_at.format("%Y-%m-%d %H:%M UTC")));
    }

    for step in [Step::BasicInfo, Step::Address, Step::Banking, Step::Documents] {
        lines.push(format!("{}:", step.title()));
        for &field in step.fields() {
            let value = record.draft.value(field);
            let value = if value.is_empty() && field.is_document() {
                "Not uploaded"
            } else {
                value
            };
            lines.push(format!("  {:<18} {value}", field.label()));
        }
    }
    lines.push(format!(
        "  {} of 3 documents uploaded",
        record.draft.documents.uploaded()
    ));
    lines
}

pub(crate) async fn run_delete(
    store: &dyn VendorStore,
    vendor_id: &str,
    yes: bool,
) -> Result<()> {
    let record = store.get(vendor_id).await?;
    println!(
        "⚠️  about to delete {} ({}, {})",
        record.vendor_id, record.draft.company_name, record.draft.email
    );

    if !yes {
        if !io::stdin().is_terminal() {
            bail!("refusing to delete in non-interactive mode without --yes");
        }

        print!("Type '{}' to confirm: ", record.vendor_id);
        io::stdout().flush()?;
        let mut confirmation = String::new();
        io::stdin().read_line(&mut confirmation)?;
        if confirmation.trim() != record.vendor_id {
            println!("delete cancelled");
            return Ok(());
        }
    }

    store.delete(&record.vendor_id).await?;
    println!("vendor {} deleted", record.vendor_id);
    Ok(())
}

pub(crate) async fn run_export(
    store: &dyn VendorStore,
    filter: &VendorFilter,
    path: Option<&Path>,
) -> Result<()> {
    let csv = store.export_csv(filter).await?;
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &csv)?;
            // header row plus one record per vendor
            println!(
                "exported {} vendors to {}",
                csv_records(&csv).saturating_sub(1),
                path.display()
            );
        }
        None => io::stdout().write_all(&csv)?,
    }
    Ok(())
}

/// Number of CSV records; line breaks inside quoted fields do not end one.
fn csv_records(csv: &[u8]) -> usize {
    let mut quoted = false;
    let mut records = 0;
    for &byte in csv {
        match byte {
            b'"' => quoted = !quoted,
            b'\n' if !quoted => records += 1,
            _ => {}
        }
    }
    if csv.last().is_some_and(|&b| b != b'\n') {
        records += 1;
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vendor_onboarding::{Field, VendorDraft, VendorStatus};
    use vendor_registry::LocalVendorStore;

    fn record() -> VendorRecord {
        let draft = VendorDraft::default()
            .with_field(Field::CompanyName, "A very long company name that overflows")
            .with_field(Field::ContactPerson, "John Smith")
            .with_field(Field::Country, "India")
            .with_field(Field::Iban, "IN12 3456 7890 1234 5678");
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let mut record = VendorRecord::new("uuid", "VENDOR001", draft, created);
        record.status = VendorStatus::Pending;
        record
    }

    #[test]
    fn table_truncates_long_values() {
        let lines = vendor_table(&[record()]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("VENDOR001   A very long company name th…"));
        assert!(lines[1].trim_end().ends_with("pending"));
    }

    #[test]
    fn details_group_by_section() {
        let lines = vendor_details(&record());
        assert!(lines.contains(&"  created at : 2024-03-01 08:30 UTC".to_string()));
        assert!(lines.contains(&"Banking:".to_string()));
        assert!(lines.iter().any(|l| l.contains("IN12 3456 7890 1234 5678")));
        assert!(
            lines
                .iter()
                .any(|l| l.starts_with("  GST certificate") && l.ends_with("Not uploaded"))
        );
        assert!(!lines.iter().any(|l| l.starts_with("  updated at")));
        assert_eq!(lines.last().unwrap(), "  0 of 3 documents uploaded");
    }

    #[test]
    fn csv_records_ignore_quoted_line_breaks() {
        let mut multiline = record();
        multiline.draft.street_address = "Unit 4\nIndustrial Estate".to_string();
        let csv = vendor_onboarding::to_csv([&record(), &multiline]);
        assert_eq!(csv_records(csv.as_bytes()), 3);
        assert_eq!(csv_records(b"a,b\r\n1,2"), 2);
        assert_eq!(csv_records(b""), 0);
    }

    #[tokio::test]
    async fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVendorStore::in_memory();
        store.create(&record().draft).await.unwrap();

        let path = dir.path().join("out").join("vendors.csv");
        run_export(&store, &VendorFilter::default(), Some(&path)).await.unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("vendor_id,company_name"));
        assert!(raw.contains("VENDOR001,A very long company name that overflows,"));
    }
}
