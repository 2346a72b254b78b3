pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use crate::core::{
    guardrail::GuardrailChain,
    loader::{load, try_load, DuplicatePolicy, TableSource},
    service::ValidationService,
    store::TableStore,
    validator::{validate, validate_request, validate_value},
};
pub use crate::domain::model::{CodeRequest, ReasonCode, ReferenceEntry, ReferenceTable, ValidationResult};
pub use crate::utils::error::{HsnError, Result};
