use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use super::{FormInputArgs, print_json};

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: FormInputArgs,
    /// Emit a JSON report instead of text lines
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FieldError<'a> {
    id: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport<'a> {
    is_valid: bool,
    errors: Vec<FieldError<'a>>,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let mut form = args.input.load()?;
    form.touch_all();

    let errors = form
        .fields()
        .iter()
        .filter(|field| !field.is_valid)
        .map(|field| FieldError {
            id: &field.id,
            message: &field.error_messages,
        })
        .collect::<Vec<_>>();
    let count = errors.len();

    if args.json {
        print_json(
            &ValidationReport {
                is_valid: form.is_valid(),
                errors,
            },
            true,
        )?;
    } else if errors.is_empty() {
        println!("form is valid");
    } else {
        for error in &errors {
            println!("{}: {}", error.id, error.message);
        }
    }

    if !form.is_valid() {
        bail!("form is invalid ({count} field(s) with errors)");
    }
    Ok(())
}
