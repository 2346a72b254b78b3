pub mod guardrail;
pub mod loader;
pub mod service;
pub mod store;
pub mod validator;

pub use crate::domain::model::{CodeRequest, ReasonCode, ReferenceEntry, ReferenceTable, ValidationResult};
pub use crate::domain::ports::{Capability, Intercepted, Interceptor, Replacement, Verdict};
pub use crate::utils::error::Result;
