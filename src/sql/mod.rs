//! SQL templates, shorthand builders and bind values. Identifiers come from trusted config or are checked.

pub mod builder;
pub mod params;
mod template;
pub use params::*;
pub use template::*;
