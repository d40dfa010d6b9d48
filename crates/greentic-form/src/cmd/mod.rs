pub mod schema;
pub mod snapshot;
pub mod validate;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use form_spec::{StaticOptions, parse_fields, parse_form_value};

use crate::config::FormConfig;
use crate::events::parse_events;
use crate::form::Form;

/// Inputs shared by every command that evaluates a form.
#[derive(Args, Debug, Clone)]
pub struct FormInputArgs {
    /// JSON array of field definitions
    #[arg(long = "fields", value_name = "fields.json")]
    pub fields: PathBuf,
    /// JSON object with the current form value
    #[arg(long = "value", value_name = "value.json")]
    pub value: Option<PathBuf>,
    /// Form settings (TOML, or JSON by extension)
    #[arg(long = "config", value_name = "form.toml")]
    pub config: Option<PathBuf>,
    /// JSON object mapping field ids to option groups
    #[arg(long = "options", value_name = "options.json")]
    pub options: Option<PathBuf>,
    /// JSON array of events to apply in order
    #[arg(long = "events", value_name = "events.json")]
    pub events: Option<PathBuf>,
}

impl FormInputArgs {
    /// Builds the form and replays the event log.
    pub fn load(&self) -> Result<Form> {
        let fields = parse_fields(&read(&self.fields)?)
            .with_context(|| format!("invalid fields document {}", self.fields.display()))?;

        let config = match &self.config {
            Some(path) => FormConfig::load(path)?,
            None => FormConfig::default(),
        };

        let mut builder = Form::builder().config(config);
        if let Some(path) = &self.value {
            let value = parse_form_value(&read(path)?)
                .with_context(|| format!("invalid value document {}", path.display()))?;
            builder = builder.value(value);
        }
        if let Some(path) = &self.options {
            let options: StaticOptions = serde_json::from_str(&read(path)?)
                .with_context(|| format!("invalid options document {}", path.display()))?;
            builder = builder.options_handler(options);
        }
        let mut form = builder.fields(fields).build();

        if let Some(path) = &self.events {
            let events = parse_events(&read(path)?)
                .with_context(|| format!("invalid events document {}", path.display()))?;
            for event in events {
                event.apply(&mut form);
            }
        }
        Ok(form)
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
