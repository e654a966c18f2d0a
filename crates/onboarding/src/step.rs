use std::fmt;

use serde::{Deserialize, Serialize};

use crate::draft::Field;

/// One of the five linear wizard screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    BasicInfo,
    Address,
    Banking,
    Documents,
    /// Read-only summary; submission happens from here.
    Review,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::BasicInfo,
        Step::Address,
        Step::Banking,
        Step::Documents,
        Step::Review,
    ];

    /// 1-based position, as shown to the user.
    pub fn number(self) -> u8 {
        match self {
            Step::BasicInfo => 1,
            Step::Address => 2,
            Step::Banking => 3,
            Step::Documents => 4,
            Step::Review => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Step> {
        Step::ALL.into_iter().find(|step| step.number() == number)
    }

    pub fn next(self) -> Option<Step> {
        Step::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Step> {
        self.number().checked_sub(1).and_then(Step::from_number)
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::BasicInfo => "Basic Info",
            Step::Address => "Address",
            Step::Banking => "Banking",
            Step::Documents => "Documents",
            Step::Review => "Review",
        }
    }

    /// Draft fields edited on this screen.  Review owns none.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Step::BasicInfo => &[
                Field::CompanyName,
                Field::ContactPerson,
                Field::Email,
                Field::Phone,
            ],
            Step::Address => &[
                Field::StreetAddress,
                Field::City,
                Field::PostalCode,
                Field::Country,
            ],
            Step::Banking => &[
                Field::BankName,
                Field::AccountNumber,
                Field::Iban,
                Field::Bic,
            ],
            Step::Documents => &[
                Field::GstDocument,
                Field::PanDocument,
                Field::MsmeDocument,
            ],
            Step::Review => &[],
        }
    }

    pub fn progress(self) -> (usize, usize) {
        (usize::from(self.number()), Step::ALL.len())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}
