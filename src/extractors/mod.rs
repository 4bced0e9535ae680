pub mod json_body;

pub use json_body::{parse_lenient, parse_strict, JsonParams, RequiredJsonParams};
