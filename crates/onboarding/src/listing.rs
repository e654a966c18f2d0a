//! Search, filter, sort and CSV export over vendor collections.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::{VendorRecord, VendorStatus};

/// List/export filter.  Every populated criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorFilter {
    /// Case-insensitive substring over vendor id, company, contact and email.
    pub search: Option<String>,
    pub country: Option<String>,
    pub status: Option<VendorStatus>,
}

impl VendorFilter {
    pub fn is_empty(&self) -> bool {
        self.search().is_none() && self.country().is_none() && self.status.is_none()
    }

    fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    fn country(&self) -> Option<&str> {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|country| !country.is_empty())
    }

    pub fn matches(&self, record: &VendorRecord) -> bool {
        if let Some(term) = self.search() {
            let haystacks = [
                record.vendor_id.as_str(),
                record.draft.company_name.as_str(),
                record.draft.contact_person.as_str(),
                record.draft.email.as_str(),
            ];
            if !haystacks
                .iter()
                .any(|value| value.to_lowercase().contains(&term))
            {
                return false;
            }
        }

        if let Some(country) = self.country() {
            if !record.draft.country.trim().eq_ignore_ascii_case(country) {
                return false;
            }
        }

        self.status.is_none_or(|status| record.status == status)
    }

    pub fn apply<'a>(&self, records: &'a [VendorRecord]) -> Vec<&'a VendorRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    VendorId,
    CompanyName,
    Country,
    CreatedAt,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "vendor_id" | "id" => Ok(SortKey::VendorId),
            "company_name" | "company" | "name" => Ok(SortKey::CompanyName),
            "country" => Ok(SortKey::Country),
            "created_at" | "created" => Ok(SortKey::CreatedAt),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort; text keys compare case-insensitively, ties fall back to
/// vendor id.
pub fn sort_records(records: &mut [VendorRecord], key: SortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let primary = match key {
            SortKey::VendorId => compare_vendor_ids(&a.vendor_id, &b.vendor_id),
            SortKey::CompanyName => cmp_text(&a.draft.company_name, &b.draft.company_name),
            SortKey::Country => cmp_text(&a.draft.country, &b.draft.country),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let ordering = primary.then_with(|| compare_vendor_ids(&a.vendor_id, &b.vendor_id));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.trim().to_lowercase().cmp(&b.trim().to_lowercase())
}

/// `VENDOR9` sorts before `VENDOR10`; ids without a numeric tail compare as text.
fn compare_vendor_ids(a: &str, b: &str) -> Ordering {
    match (crate::store::vendor_sequence(a), crate::store::vendor_sequence(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

const CSV_HEADER: [&str; 15] = [
    "vendor_id",
    "company_name",
    "contact_person",
    "email",
    "phone",
    "street_address",
    "city",
    "postal_code",
    "country",
    "bank_name",
    "account_number",
    "iban",
    "bic",
    "status",
    "created_at",
];

/// Render records as RFC 4180 CSV with a header row and CRLF line endings.
pub fn to_csv<'a>(records: impl IntoIterator<Item = &'a VendorRecord>) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().copied());
    for record in records {
        let draft = &record.draft;
        let created = record.created_at.to_rfc3339();
        push_row(
            &mut out,
            [
                record.vendor_id.as_str(),
                draft.company_name.as_str(),
                draft.contact_person.as_str(),
                draft.email.as_str(),
                draft.phone.as_str(),
                draft.street_address.as_str(),
                draft.city.as_str(),
                draft.postal_code.as_str(),
                draft.country.as_str(),
                draft.bank_name.as_str(),
                draft.account_number.as_str(),
                draft.iban.as_str(),
                draft.bic.as_str(),
                record.status.as_str(),
                created.as_str(),
            ],
        );
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl IntoIterator<Item = &'a str>) {
    for (index, cell) in cells.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::VendorDraft;
    use chrono::{TimeZone, Utc};

    fn record(seq: u32, company: &str, country: &str, status: VendorStatus) -> VendorRecord {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, seq).unwrap();
        let draft = VendorDraft {
            company_name: company.to_string(),
            contact_person: format!("Contact {seq}"),
            email: format!("{}@example.com", company.to_lowercase().replace(' ', "")),
            country: country.to_string(),
            ..VendorDraft::default()
        };
        let mut record =
            VendorRecord::new(format!("id-{seq}"), format!("VENDOR{seq:03}"), draft, created);
        record.status = status;
        record
    }

    fn sample() -> Vec<VendorRecord> {
        vec![
            record(1, "TechCorp Solutions", "United States", VendorStatus::Active),
            record(2, "Bharat Steel", "India", VendorStatus::Pending),
            record(10, "acme widgets", "india", VendorStatus::Inactive),
        ]
    }

    #[test]
    fn empty_filter_matches_everything() {
        let records = sample();
        let filter = VendorFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&records).len(), 3);

        let blank = VendorFilter {
            search: Some("   ".to_string()),
            country: Some(String::new()),
            status: None,
        };
        assert!(blank.is_empty());
    }

    #[test]
    fn search_spans_id_company_contact_and_email() {
        let records = sample();
        let by = |term: &str| {
            VendorFilter {
                search: Some(term.to_string()),
                ..VendorFilter::default()
            }
            .apply(&records)
            .into_iter()
            .map(|r| r.vendor_id.clone())
            .collect::<Vec<_>>()
        };
        assert_eq!(by("vendor002"), vec!["VENDOR002"]);
        assert_eq!(by("STEEL"), vec!["VENDOR002"]);
        assert_eq!(by("contact 10"), vec!["VENDOR010"]);
        assert_eq!(by("techcorpsolutions@"), vec!["VENDOR001"]);
        assert!(by("nothing-like-this").is_empty());
    }

    #[test]
    fn country_and_status_combine() {
        let records = sample();
        let filter = VendorFilter {
            search: None,
            country: Some("INDIA".to_string()),
            status: Some(VendorStatus::Inactive),
        };
        let hits = filter.apply(&records);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].vendor_id, "VENDOR010");
    }

    #[test]
    fn sort_by_vendor_id_is_numeric() {
        let mut records = sample();
        records.reverse();
        sort_records(&mut records, SortKey::VendorId, SortOrder::Ascending);
        let ids: Vec<_> = records.iter().map(|r| r.vendor_id.as_str()).collect();
        assert_eq!(ids, vec!["VENDOR001", "VENDOR002", "VENDOR010"]);
    }

    #[test]
    fn sort_by_company_ignores_case() {
        let mut records = sample();
        sort_records(&mut records, SortKey::CompanyName, SortOrder::Ascending);
        let names: Vec<_> = records.iter().map(|r| r.draft.company_name.as_str()).collect();
        assert_eq!(names, vec!["acme widgets", "Bharat Steel", "TechCorp Solutions"]);

        sort_records(&mut records, SortKey::CreatedAt, SortOrder::Descending);
        assert_eq!(records[0].vendor_id, "VENDOR010");
    }

    #[test]
    fn sort_key_parses_aliases() {
        assert_eq!("company".parse::<SortKey>(), Ok(SortKey::CompanyName));
        assert_eq!("created-at".parse::<SortKey>(), Ok(SortKey::CreatedAt));
        assert!("iban".parse::<SortKey>().is_err());
    }

    #[test]
    fn csv_quotes_special_characters() {
        let mut records = sample();
        records[0].draft.street_address = "1 Main St, Suite \"B\"".to_string();
        let csv = to_csv(&records[..1]);
        let mut lines = csv.split("\r\n");
        assert_eq!(lines.next().unwrap(), CSV_HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("VENDOR001,TechCorp Solutions,Contact 1,"));
        assert!(row.contains(",\"1 Main St, Suite \"\"B\"\"\","));
        assert!(row.ends_with(",active,2024-01-01T00:00:01+00:00"));
        assert_eq!(lines.next(), Some(""));
    }
}
