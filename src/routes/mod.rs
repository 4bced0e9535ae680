pub mod common;
pub mod db_api;

pub use common::common_routes;
pub use db_api::{db_api_routes, DEFAULT_BODY_LIMIT};
