//! Final submission from the Review step.
//!
//! Submission is two-phase so an event-driven host can own the network call:
//! [`Wizard::begin_submit`] checks preconditions, raises the in-flight flag and
//! hands back a [`SubmissionTicket`]; the host runs the ticket against a
//! [`VendorStore`] and feeds the outcome to [`Wizard::finish_submit`].
//! [`Wizard::submit`] does all three in one call.

use tracing::{info, warn};

use crate::draft::VendorDraft;
use crate::record::VendorRecord;
use crate::rules::{ValidationErrors, validate_all};
use crate::step::Step;
use crate::store::{StoreError, VendorStore};
use crate::wizard::{Mode, Wizard};

/// Why a submission attempt ended without a persisted record.  Every variant
/// leaves the wizard usable with its draft intact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// Caught locally; the collaborator was never called.
    #[error("{} field(s) need attention before submitting", .0.len())]
    Validation(ValidationErrors),
    /// The collaborator declined the request.  Show the message as-is.
    #[error("{0}")]
    RemoteRejection(String),
    #[error("could not reach the vendor service ({0}); please try again")]
    Transport(String),
    /// Another submission from this wizard is still outstanding.
    #[error("a submission is already in progress")]
    InFlight,
    #[error("submission is only available from the review step (currently on {0})")]
    NotOnReview(Step),
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(message) => SubmissionError::RemoteRejection(message),
            StoreError::NotFound(vendor_id) => {
                SubmissionError::RemoteRejection(format!("Vendor {vendor_id} no longer exists"))
            }
            StoreError::Transport(message) => SubmissionError::Transport(message),
        }
    }
}

/// Proof that a submission was started.  Exactly one collaborator call per
/// ticket.
#[derive(Debug)]
#[must_use = "a ticket must be dispatched and passed back to finish_submit"]
pub struct SubmissionTicket {
    mode: Mode,
    draft: VendorDraft,
}

impl SubmissionTicket {
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn draft(&self) -> &VendorDraft {
        &self.draft
    }

    /// `create` in create mode, `update` in edit mode.
    pub async fn dispatch<S>(&self, store: &S) -> Result<VendorRecord, StoreError>
    where
        S: VendorStore + ?Sized,
    {
        match &self.mode {
            Mode::Create => store.create(&self.draft).await,
            Mode::Edit { vendor_id } => store.update(vendor_id, &self.draft).await,
        }
    }
}

impl Wizard {
    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, SubmissionError> {
        if self.in_flight {
            warn!("submit ignored: a submission is already in flight");
            return Err(SubmissionError::InFlight);
        }
        if self.step != Step::Review {
            return Err(SubmissionError::NotOnReview(self.step));
        }

        let errors = validate_all(&self.draft);
        if !errors.is_empty() {
            warn!(invalid = errors.len(), "submit blocked by validation");
            self.errors = errors.clone();
            return Err(SubmissionError::Validation(errors));
        }

        self.errors.clear();
        self.in_flight = true;
        Ok(SubmissionTicket {
            mode: self.mode.clone(),
            draft: self.draft.clone(),
        })
    }

    /// Lower the in-flight flag and translate the collaborator's answer.  On
    /// failure the wizard stays on Review with the draft untouched.
    pub fn finish_submit(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<VendorRecord, StoreError>,
    ) -> Result<VendorRecord, SubmissionError> {
        self.in_flight = false;
        match outcome {
            Ok(record) => {
                info!(
                    vendor_id = %record.vendor_id,
                    edit = ticket.mode != Mode::Create,
                    "vendor submitted"
                );
                Ok(record)
            }
            Err(err) => {
                warn!(error = %err, "vendor submission failed");
                Err(err.into())
            }
        }
    }

    /// Validate, call the collaborator once, and report.  On `Ok` the caller
    /// should drop the wizard.  Dropping the future before the store answers
    /// lowers the in-flight flag; whether the store applied the change is
    /// then unknown.
    pub async fn submit<S>(&mut self, store: &S) -> Result<VendorRecord, SubmissionError>
    where
        S: VendorStore + ?Sized,
    {
        let ticket = self.begin_submit()?;
        let mut guard = InFlightGuard { wizard: self };
        let outcome = ticket.dispatch(store).await;
        guard.wizard.finish_submit(ticket, outcome)
    }
}

/// Lowers the in-flight flag if a submission is abandoned mid-await.
struct InFlightGuard<'a> {
    wizard: &'a mut Wizard,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.wizard.in_flight {
            warn!("submission abandoned before the vendor store answered");
            self.wizard.in_flight = false;
        }
    }
}
