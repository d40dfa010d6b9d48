use anyhow::Result;
use clap::Args;

use form_spec::fields_schema;

use super::print_json;

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    #[arg(long = "pretty")]
    pub pretty: bool,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    print_json(&fields_schema(), args.pretty)
}
