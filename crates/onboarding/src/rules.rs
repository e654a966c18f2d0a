//! Per-step validation rules.
//!
//! The rule set is data: each step maps to a slice of [`FieldRule`]s, and the
//! postal-code check is a country-keyed table.  [`validate_step`] walks the
//! table and never looks at fields outside the requested step.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::draft::{Field, VendorDraft};
use crate::step::Step;

/// How a raw value is normalised before its pattern runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    Trim,
    /// Remove every whitespace character (IBANs are typed in groups of four).
    StripWhitespace,
}

impl Normalize {
    fn apply(self, raw: &str) -> String {
        match self {
            Normalize::Trim => raw.trim().to_string(),
            Normalize::StripWhitespace => raw.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pattern {
        pattern: &'static str,
        normalize: Normalize,
        message: &'static str,
    },
    /// Checked against [`POSTAL_CODE_PATTERNS`] for the draft's country.
    PostalCode,
}

/// A required field plus an optional format check that runs once the field
/// is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: Field,
    pub required: &'static str,
    pub format: Option<Format>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostalPattern {
    pub country: &'static str,
    pub pattern: &'static str,
    pub example: &'static str,
}

pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";

pub const BASIC_INFO_RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::CompanyName,
        required: "Company name is required",
        format: None,
    },
    FieldRule {
        field: Field::ContactPerson,
        required: "Contact person is required",
        format: None,
    },
    FieldRule {
        field: Field::Email,
        required: "Email is required",
        format: Some(Format::Pattern {
            pattern: r"^[^\s@]+@[^\s@]+\.[^\s@]+$",
            normalize: Normalize::Trim,
            message: EMAIL_MESSAGE,
        }),
    },
    FieldRule {
        field: Field::Phone,
        required: "Phone number is required",
        format: Some(Format::Pattern {
            pattern: r"^\+?[0-9\s\-\(\)]{7,20}$",
            normalize: Normalize::Trim,
            message: "Please enter a valid phone number",
        }),
    },
];

pub const ADDRESS_RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::StreetAddress,
        required: "Street address is required",
        format: None,
    },
    FieldRule {
        field: Field::City,
        required: "City is required",
        format: None,
    },
    FieldRule {
        field: Field::PostalCode,
        required: "Postal code is required",
        format: Some(Format::PostalCode),
    },
    FieldRule {
        field: Field::Country,
        required: "Country is required",
        format: None,
    },
];

pub const BANKING_RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::BankName,
        required: "Bank name is required",
        format: None,
    },
    FieldRule {
        field: Field::AccountNumber,
        required: "Account number is required",
        format: None,
    },
    FieldRule {
        field: Field::Iban,
        required: "IBAN is required",
        format: Some(Format::Pattern {
            pattern: r"(?i)^[A-Z]{2}[0-9]{2}[A-Z0-9]{4}[0-9]{7}([A-Z0-9]?){0,16}$",
            normalize: Normalize::StripWhitespace,
            message: "Please enter a valid IBAN",
        }),
    },
    FieldRule {
        field: Field::Bic,
        required: "BIC/SWIFT code is required",
        format: Some(Format::Pattern {
            pattern: r"(?i)^[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}([A-Z0-9]{3})?$",
            normalize: Normalize::Trim,
            message: "Please enter a valid BIC/SWIFT code (8 or 11 characters)",
        }),
    },
];

/// Countries with a known postal format.  Anything else is presence-only.
pub const POSTAL_CODE_PATTERNS: &[PostalPattern] = &[
    PostalPattern {
        country: "United States",
        pattern: r"^[0-9]{5}(-[0-9]{4})?$",
        example: "12345 or 12345-6789",
    },
    PostalPattern {
        country: "India",
        pattern: r"^[0-9]{6}$",
        example: "110001",
    },
    PostalPattern {
        country: "United Kingdom",
        pattern: r"(?i)^[A-Z]{1,2}[0-9][A-Z0-9]?\s?[0-9][A-Z]{2}$",
        example: "SW1A 1AA",
    },
    PostalPattern {
        country: "Canada",
        pattern: r"(?i)^[A-Z][0-9][A-Z] [0-9][A-Z][0-9]$",
        example: "K1A 0B1",
    },
    PostalPattern {
        country: "Germany",
        pattern: r"^[0-9]{5}$",
        example: "10115",
    },
    PostalPattern {
        country: "France",
        pattern: r"^[0-9]{5}$",
        example: "75001",
    },
];

pub fn rules_for(step: Step) -> &'static [FieldRule] {
    match step {
        Step::BasicInfo => BASIC_INFO_RULES,
        Step::Address => ADDRESS_RULES,
        Step::Banking => BANKING_RULES,
        Step::Documents | Step::Review => &[],
    }
}

pub fn postal_pattern_for(country: &str) -> Option<&'static PostalPattern> {
    let country = country.trim();
    POSTAL_CODE_PATTERNS
        .iter()
        .find(|entry| entry.country.eq_ignore_ascii_case(country))
}

pub fn postal_code_message(entry: &PostalPattern) -> String {
    format!(
        "Please enter a valid postal code for {} (e.g. {})",
        entry.country, entry.example
    )
}

/// Field → message for the fields that failed.  Ordered by [`Field`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn remove(&mut self, field: Field) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }
}

impl FromIterator<(Field, String)> for ValidationErrors {
    fn from_iter<T: IntoIterator<Item = (Field, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Validate exactly the fields owned by `step`.  Pure; an empty result means
/// the step is satisfied.
pub fn validate_step(step: Step, draft: &VendorDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for rule in rules_for(step) {
        if let Some(message) = check_rule(rule, draft) {
            errors.insert(rule.field, message);
        }
    }
    errors
}

/// Validate every step that carries rules (1 through 3).
pub fn validate_all(draft: &VendorDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for step in Step::ALL {
        errors.extend(validate_step(step, draft));
    }
    errors
}

fn check_rule(rule: &FieldRule, draft: &VendorDraft) -> Option<String> {
    let raw = draft.value(rule.field);
    if raw.trim().is_empty() {
        return Some(rule.required.to_string());
    }

    match rule.format? {
        Format::Pattern {
            pattern,
            normalize,
            message,
        } => {
            let value = normalize.apply(raw);
            (!compiled(pattern).is_match(&value)).then(|| message.to_string())
        }
        Format::PostalCode => {
            let entry = postal_pattern_for(&draft.country)?;
            (!compiled(entry.pattern).is_match(raw.trim())).then(|| postal_code_message(entry))
        }
    }
}

/// Every pattern in the rule tables, compiled once.
fn compiled(pattern: &'static str) -> &'static Regex {
    static CACHE: OnceLock<HashMap<&'static str, Regex>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        let step_patterns = [BASIC_INFO_RULES, ADDRESS_RULES, BANKING_RULES]
            .into_iter()
            .flatten()
            .filter_map(|rule| match rule.format {
                Some(Format::Pattern { pattern, .. }) => Some(pattern),
                _ => None,
            });
        let postal_patterns = POSTAL_CODE_PATTERNS.iter().map(|entry| entry.pattern);

        step_patterns
            .chain(postal_patterns)
            .map(|pattern| {
                let regex = Regex::new(pattern)
                    .unwrap_or_else(|err| panic!("invalid rule pattern {pattern}: {err}"));
                (pattern, regex)
            })
            .collect()
    });

    &cache[pattern]
}
