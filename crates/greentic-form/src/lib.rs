#![allow(missing_docs)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod events;
pub mod form;

pub use config::{ConfigError, FormConfig};
pub use events::{EventError, FormEvent, parse_events};
pub use form::{ChangeListener, Form, FormBuilder, FormSnapshot, FormState};
pub use form_spec;
