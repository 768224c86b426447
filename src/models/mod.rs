//! Data models for the FR generator.
//!
//! Field names serialize in camelCase to match the wizard front end.

mod category;
mod history;
mod request;
mod settings;
mod template;

pub use category::*;
pub use history::*;
pub use request::*;
pub use settings::*;
pub use template::*;
