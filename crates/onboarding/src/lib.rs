//! Vendor onboarding wizard: draft, per-step validation, navigation and the
//! submission state machine, plus the [`VendorStore`] seam it persists
//! through.
//!
//! The crate has no I/O of its own.  Hosts drive a [`Wizard`] with field edits
//! and navigation events, render [`Wizard::summary`] on the Review step, and
//! hand a store implementation to [`Wizard::submit`].

pub mod draft;
pub mod listing;
pub mod record;
pub mod rules;
pub mod step;
pub mod store;
pub mod submit;
pub mod wizard;

pub use draft::{Documents, Field, ParseFieldError, VendorDraft};
pub use listing::{SortKey, SortOrder, VendorFilter, sort_records, to_csv};
pub use record::{FilterOptions, VendorListing, VendorRecord, VendorStatus};
pub use rules::{ValidationErrors, validate_all, validate_step};
pub use step::Step;
pub use store::{StoreError, VendorStore, format_vendor_id, vendor_sequence};
pub use submit::{SubmissionError, SubmissionTicket};
pub use wizard::{Mode, SummaryRow, Transition, Wizard};
