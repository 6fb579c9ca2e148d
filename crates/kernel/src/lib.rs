//! Core traits, settings, shared services, and the module registry.

pub mod module;
pub mod registry;
pub mod services;
pub mod settings;
pub mod validation;

pub use bookshelf_db::Migration;
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
pub use services::Services;
pub use settings::Settings;
pub use validation::{Validate, ValidationErrors, Validator, Violation};
