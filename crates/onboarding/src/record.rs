use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::draft::VendorDraft;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl VendorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VendorStatus::Active => "active",
            VendorStatus::Inactive => "inactive",
            VendorStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for VendorStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "active" => Ok(VendorStatus::Active),
            "inactive" => Ok(VendorStatus::Inactive),
            "pending" => Ok(VendorStatus::Pending),
            other => Err(format!(
                "unknown vendor status: {other} (expected active, inactive or pending)"
            )),
        }
    }
}

/// A vendor as persisted by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRecord {
    /// Storage-level UUID.
    #[serde(default)]
    pub id: String,
    /// Human-facing identifier, `VENDOR001` style.  Immutable once assigned.
    pub vendor_id: String,
    #[serde(flatten)]
    pub draft: VendorDraft,
    #[serde(default)]
    pub status: VendorStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VendorRecord {
    pub fn new(
        id: impl Into<String>,
        vendor_id: impl Into<String>,
        draft: VendorDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            vendor_id: vendor_id.into(),
            draft,
            status: VendorStatus::Active,
            created_at: now,
            updated_at: None,
        }
    }

    /// Replace the editable fields; identity, status and creation time stay.
    pub fn apply_update(&mut self, draft: VendorDraft, now: DateTime<Utc>) {
        self.draft = draft;
        self.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub countries: BTreeSet<String>,
    pub statuses: BTreeSet<VendorStatus>,
}

impl FilterOptions {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a VendorRecord>) -> Self {
        let mut options = Self::default();
        for record in records {
            let country = record.draft.country.trim();
            if !country.is_empty() {
                options.countries.insert(country.to_string());
            }
            options.statuses.insert(record.status);
        }
        options
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorListing {
    pub vendors: Vec<VendorRecord>,
    #[serde(default)]
    pub filter_options: FilterOptions,
}

impl VendorListing {
    pub fn from_vendors(vendors: Vec<VendorRecord>) -> Self {
        let filter_options = FilterOptions::from_records(&vendors);
        Self {
            vendors,
            filter_options,
        }
    }
}

/// RFC 3339 on output; on input also accepts the naive ISO form
/// (`2024-05-01T09:30:00.123456`) that the vendor API emits for UTC times.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
            }
        }
    }
}
