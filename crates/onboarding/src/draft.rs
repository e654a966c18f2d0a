//! The in-progress vendor record and its field vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::step::Step;

/// Every editable slot of a [`VendorDraft`].
///
/// Declaration order is wizard order; [`ValidationErrors`](crate::ValidationErrors)
/// iterates in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    CompanyName,
    ContactPerson,
    Email,
    Phone,
    StreetAddress,
    City,
    PostalCode,
    Country,
    BankName,
    AccountNumber,
    Iban,
    Bic,
    #[serde(rename = "gst")]
    GstDocument,
    #[serde(rename = "pan")]
    PanDocument,
    #[serde(rename = "msme")]
    MsmeDocument,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::CompanyName,
        Field::ContactPerson,
        Field::Email,
        Field::Phone,
        Field::StreetAddress,
        Field::City,
        Field::PostalCode,
        Field::Country,
        Field::BankName,
        Field::AccountNumber,
        Field::Iban,
        Field::Bic,
        Field::GstDocument,
        Field::PanDocument,
        Field::MsmeDocument,
    ];

    /// Wire/UI key in camelCase, e.g. `companyName`.
    pub fn key(self) -> &'static str {
        match self {
            Field::CompanyName => "companyName",
            Field::ContactPerson => "contactPerson",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::StreetAddress => "streetAddress",
            Field::City => "city",
            Field::PostalCode => "postalCode",
            Field::Country => "country",
            Field::BankName => "bankName",
            Field::AccountNumber => "accountNumber",
            Field::Iban => "iban",
            Field::Bic => "bic",
            Field::GstDocument => "gst",
            Field::PanDocument => "pan",
            Field::MsmeDocument => "msme",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::CompanyName => "Company name",
            Field::ContactPerson => "Contact person",
            Field::Email => "Email",
            Field::Phone => "Phone",
            Field::StreetAddress => "Street address",
            Field::City => "City",
            Field::PostalCode => "Postal code",
            Field::Country => "Country",
            Field::BankName => "Bank name",
            Field::AccountNumber => "Account number",
            Field::Iban => "IBAN",
            Field::Bic => "BIC/SWIFT",
            Field::GstDocument => "GST certificate",
            Field::PanDocument => "PAN card",
            Field::MsmeDocument => "MSME certificate",
        }
    }

    /// The wizard step that owns this field.
    pub fn step(self) -> Step {
        match self {
            Field::CompanyName | Field::ContactPerson | Field::Email | Field::Phone => {
                Step::BasicInfo
            }
            Field::StreetAddress | Field::City | Field::PostalCode | Field::Country => {
                Step::Address
            }
            Field::BankName | Field::AccountNumber | Field::Iban | Field::Bic => Step::Banking,
            Field::GstDocument | Field::PanDocument | Field::MsmeDocument => Step::Documents,
        }
    }

    pub fn is_document(self) -> bool {
        self.step() == Step::Documents
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vendor field: {0}")]
pub struct ParseFieldError(pub String);

impl FromStr for Field {
    type Err = ParseFieldError;

    /// Accepts camelCase (`postalCode`), snake_case (`postal_code`) and the
    /// `documents.` prefix for document slots.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix("documents.").unwrap_or(trimmed);
        let wanted: String = bare
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Field::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ParseFieldError(raw.to_string()))
    }
}

/// Optional document references collected on the Documents step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Documents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msme: Option<String>,
}

impl Documents {
    pub fn uploaded(&self) -> usize {
        [&self.gst, &self.pan, &self.msme]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}

/// The vendor record being edited.  Serialized snake_case, which is what the
/// vendor API accepts on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorDraft {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub bank_name: String,
    pub account_number: String,
    pub iban: String,
    pub bic: String,
    pub documents: Documents,
}

impl VendorDraft {
    /// Current value of `field`; an absent document reads as `""`.
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::CompanyName => &self.company_name,
            Field::ContactPerson => &self.contact_person,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::StreetAddress => &self.street_address,
            Field::City => &self.city,
            Field::PostalCode => &self.postal_code,
            Field::Country => &self.country,
            Field::BankName => &self.bank_name,
            Field::AccountNumber => &self.account_number,
            Field::Iban => &self.iban,
            Field::Bic => &self.bic,
            Field::GstDocument => self.documents.gst.as_deref().unwrap_or_default(),
            Field::PanDocument => self.documents.pan.as_deref().unwrap_or_default(),
            Field::MsmeDocument => self.documents.msme.as_deref().unwrap_or_default(),
        }
    }

    /// Store `value` verbatim.  A blank value clears a document slot.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::GstDocument => self.documents.gst = document_ref(&value),
            Field::PanDocument => self.documents.pan = document_ref(&value),
            Field::MsmeDocument => self.documents.msme = document_ref(&value),
            text => {
                if let Some(slot) = self.text_mut(text) {
                    *slot = value;
                }
            }
        }
    }

    pub fn with_field(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        let slot = match field {
            Field::CompanyName => &mut self.company_name,
            Field::ContactPerson => &mut self.contact_person,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::StreetAddress => &mut self.street_address,
            Field::City => &mut self.city,
            Field::PostalCode => &mut self.postal_code,
            Field::Country => &mut self.country,
            Field::BankName => &mut self.bank_name,
            Field::AccountNumber => &mut self.account_number,
            Field::Iban => &mut self.iban,
            Field::Bic => &mut self.bic,
            Field::GstDocument | Field::PanDocument | Field::MsmeDocument => return None,
        };
        Some(slot)
    }
}

fn document_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
