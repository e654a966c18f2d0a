//! Drives a [`Wizard`] from line prompts.

use std::io::{BufRead, Write};

use anyhow::Result;
use vendor_onboarding::{
    Field, Mode, Step, SubmissionError, Transition, VendorRecord, VendorStore, Wizard,
};

use crate::prompts::Console;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Next,
    Back,
    Cancel,
    Submit,
}

impl Action {
    fn parse(raw: &str, step: Step) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "n" | "next" if step != Step::Review => Some(Action::Next),
            "b" | "back" => Some(Action::Back),
            "c" | "cancel" | "q" | "quit" => Some(Action::Cancel),
            "s" | "submit" if step == Step::Review => Some(Action::Submit),
            _ => None,
        }
    }
}

/// Typing this clears a field.
const CLEAR: &str = "-";

/// Run the wizard to completion.  `Ok(None)` means the user cancelled.
pub(crate) async fn run<R, W, S>(
    console: &mut Console<R, W>,
    mut wizard: Wizard,
    store: &S,
) -> Result<Option<VendorRecord>>
where
    R: BufRead,
    W: Write,
    S: VendorStore + ?Sized,
{
    loop {
        let step = wizard.step();
        let (index, total) = step.progress();
        console.say(format!("\n── Step {index} of {total}: {} ──", step.title()))?;

        if step == Step::Review {
            print_summary(console, &wizard)?;
        } else {
            edit_fields(console, &mut wizard, step)?;
        }

        let (choices, default) = if step == Step::Review {
            ("submit/back/cancel", "submit")
        } else {
            ("next/back/cancel", "next")
        };

        let action = loop {
            let raw = console.prompt(choices, default)?;
            match Action::parse(&raw, step) {
                Some(action) => break action,
                None => console.say(format!("Please type one of: {choices}"))?,
            }
        };

        match action {
            Action::Next => {
                if wizard.next() == Transition::Blocked {
                    console.say("Please fix the highlighted fields:")?;
                    print_errors(console, &wizard)?;
                }
            }
            Action::Back => {
                if wizard.previous() == Transition::Unchanged {
                    console.say("Already at the first step.")?;
                }
            }
            Action::Cancel => {
                if console.prompt_bool("Discard this vendor? (yes/no)", false)? {
                    wizard.cancel();
                    console.say("Cancelled; nothing was saved.")?;
                    return Ok(None);
                }
            }
            Action::Submit => match wizard.submit(store).await {
                Ok(record) => {
                    let verb = match wizard.mode() {
                        Mode::Create => "created",
                        Mode::Edit { .. } => "updated",
                    };
                    console.say(format!("Vendor {} {verb} successfully.", record.vendor_id))?;
                    return Ok(Some(record));
                }
                Err(SubmissionError::Validation(_)) => {
                    console.say("Some earlier answers need attention; go back to fix them:")?;
                    print_errors(console, &wizard)?;
                }
                Err(SubmissionError::Transport(message)) => {
                    console.say(format!("Could not reach the vendor service ({message})."))?;
                    console.say("Your answers are kept; type submit to try again.")?;
                }
                Err(err) => console.say(format!("Submission failed: {err}"))?,
            },
        }
    }
}

fn edit_fields<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &mut Wizard,
    step: Step,
) -> Result<()> {
    if step == Step::Documents {
        console.say(format!(
            "Documents are optional; enter a file name to attach, {CLEAR} to remove."
        ))?;
    }

    for &field in step.fields() {
        if let Some(message) = wizard.errors().get(field) {
            console.say(format!("  ! {message}"))?;
        }
        let current = wizard.draft().value(field).to_string();
        let answer = console.prompt(&field_label(field), &current)?;
        let value = if answer == CLEAR { "" } else { answer.as_str() };
        if value != current {
            wizard.set_field(field, value);
        }
    }
    Ok(())
}

fn field_label(field: Field) -> String {
    match field {
        Field::Phone => format!("{} (e.g. +1 555 123 4567)", field.label()),
        Field::Iban => format!("{} (spaces allowed)", field.label()),
        _ => field.label().to_string(),
    }
}

fn print_summary<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &Wizard,
) -> Result<()> {
    let mut section = None;
    for row in wizard.summary() {
        if section != Some(row.section) {
            console.say(format!("{}:", row.section.title()))?;
            section = Some(row.section);
        }
        console.say(format!("  {:<18} {}", row.label, row.value))?;
    }
    Ok(())
}

fn print_errors<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    wizard: &Wizard,
) -> Result<()> {
    for (field, message) in wizard.errors().iter() {
        console.say(format!(
            "  - {} ({}): {message}",
            field.label(),
            field.step().title()
        ))?;
    }
    Ok(())
}
