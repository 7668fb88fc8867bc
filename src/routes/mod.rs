//! HTTP route handlers grouped by resource domain.
//!
//! Each submodule corresponds to a logical area of the API (health,
//! account self-service, administration) and exposes typed Rocket
//! handlers annotated with `#[openapi]` so `rocket_okapi` can derive
//! an OpenAPI document automatically. The auth routes themselves live
//! in `crate::auth::routes`.

pub mod admin;
pub mod health;
pub mod users;
