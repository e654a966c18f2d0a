//! Wizard state and step navigation.

use tracing::{debug, warn};

use crate::draft::{Field, VendorDraft};
use crate::record::VendorRecord;
use crate::rules::{ValidationErrors, validate_step};
use crate::step::Step;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Create,
    /// Editing an existing vendor; submission updates it in place.
    Edit { vendor_id: String },
}

impl Mode {
    pub fn vendor_id(&self) -> Option<&str> {
        match self {
            Mode::Create => None,
            Mode::Edit { vendor_id } => Some(vendor_id.as_str()),
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: Step, to: Step },
    /// Validation failed; the errors are on the wizard.
    Blocked,
    /// Nothing to do: first/last step, or a submission is in flight.
    Unchanged,
}

/// One line of the Review screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub section: Step,
    pub label: &'static str,
    pub value: String,
}

/// One editing session.  Dropping it discards the draft.
#[derive(Debug, Clone)]
pub struct Wizard {
    pub(crate) step: Step,
    pub(crate) draft: VendorDraft,
    pub(crate) errors: ValidationErrors,
    pub(crate) mode: Mode,
    pub(crate) in_flight: bool,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::with_draft(VendorDraft::default())
    }

    /// Create mode with some fields pre-filled (e.g. a default country).
    pub fn with_draft(draft: VendorDraft) -> Self {
        Self {
            step: Step::BasicInfo,
            draft,
            errors: ValidationErrors::new(),
            mode: Mode::Create,
            in_flight: false,
        }
    }

    pub fn edit(record: &VendorRecord) -> Self {
        Self {
            mode: Mode::Edit {
                vendor_id: record.vendor_id.clone(),
            },
            ..Self::with_draft(record.draft.clone())
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &VendorDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub fn next(&mut self) -> Transition {
        if self.in_flight {
            warn!(step = %self.step, "ignoring next while a submission is in flight");
            return Transition::Unchanged;
        }

        let errors = validate_step(self.step, &self.draft);
        if !errors.is_empty() {
            debug!(step = %self.step, invalid = errors.len(), "step blocked by validation");
            self.errors = errors;
            return Transition::Blocked;
        }

        self.errors.clear();
        match self.step.next() {
            Some(to) => {
                let from = std::mem::replace(&mut self.step, to);
                debug!(%from, %to, "advanced");
                Transition::Moved { from, to }
            }
            None => Transition::Unchanged,
        }
    }

    /// Go back one step without validating.  Errors are left as they are.
    pub fn previous(&mut self) -> Transition {
        if self.in_flight {
            warn!(step = %self.step, "ignoring previous while a submission is in flight");
            return Transition::Unchanged;
        }

        match self.step.prev() {
            Some(to) => {
                let from = std::mem::replace(&mut self.step, to);
                debug!(%from, %to, "retreated");
                Transition::Moved { from, to }
            }
            None => Transition::Unchanged,
        }
    }

    /// Update one field and drop its error entry, if any.  Other errors are
    /// untouched and nothing is re-validated.  Returns `false` when the edit
    /// was refused because a submission is in flight.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> bool {
        if self.in_flight {
            warn!(%field, "ignoring edit while a submission is in flight");
            return false;
        }

        self.draft.set(field, value);
        self.errors.remove(field);
        true
    }

    /// Abandon the session, handing back whatever was typed.
    pub fn cancel(self) -> VendorDraft {
        debug!(step = %self.step, "wizard cancelled");
        self.draft
    }

    /// Rows for the Review screen.  Account number and IBAN show only their
    /// last four characters.
    pub fn summary(&self) -> Vec<SummaryRow> {
        let mut rows = Vec::new();
        for section in Step::ALL {
            for field in section.fields() {
                let raw = self.draft.value(*field);
                let value = match field {
                    Field::AccountNumber | Field::Iban => mask_tail(raw, 4),
                    _ if field.is_document() && raw.is_empty() => "Not uploaded".to_string(),
                    _ => raw.trim().to_string(),
                };
                rows.push(SummaryRow {
                    section,
                    label: field.label(),
                    value,
                });
            }
        }
        rows
    }
}

fn mask_tail(raw: &str, visible: usize) -> String {
    let chars: Vec<char> = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let hidden = chars.len().saturating_sub(visible);
    let mut masked = "•".repeat(hidden);
    masked.extend(&chars[hidden..]);
    masked
}
