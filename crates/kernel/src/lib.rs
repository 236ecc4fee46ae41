//! Core traits, settings, and module registry for the library service.

pub mod module;
pub mod registry;
pub mod settings;

pub use library_db::Migration;
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
