use anyhow::Result;
use clap::Args;

use super::{FormInputArgs, print_json};

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub input: FormInputArgs,
    /// Only print the projected form value
    #[arg(long = "value-only")]
    pub value_only: bool,
    #[arg(long = "pretty")]
    pub pretty: bool,
}

pub fn run(args: SnapshotArgs) -> Result<()> {
    let form = args.input.load()?;
    if args.value_only {
        print_json(form.value(), args.pretty)
    } else {
        print_json(&form.snapshot(), args.pretty)
    }
}
