//! HTTP route handlers grouped by resource.
//!
//! Every handler is annotated with `#[openapi]` so `rocket_okapi` can derive
//! the OpenAPI document served to Swagger UI and RapiDoc.

pub mod admin;
pub mod health;
pub(crate) mod helpers;
pub mod params;
pub mod quotes;
pub mod roles;
pub mod shows;
pub mod stats;
