//! Single boundary translator between domain errors and HTTP. Every error
//! body has the same shape: `{timestamp, message, path}`. Handler-returned
//! errors go through the `ApiError` responder; guard failures and framework
//! rejections go through the matching catchers.

use std::io::Cursor;

use chrono::Utc;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Catcher, Request, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use serde::Serialize;

use crate::auth::AuthError;

#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub message: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody {
    /// RFC 3339 timestamp of when the error was produced.
    pub timestamp: String,
    pub message: String,
    /// Request path the error occurred on.
    pub path: String,
}

impl ApiError {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Status::InternalServerError, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::new(err.status(), err.to_string())
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let path = request.uri().path().to_string();
        if self.status.code >= 500 {
            log::error!("{} {} -> {}: {}", request.method(), path, self.status, self.message);
        } else {
            log::debug!("{} {} -> {}: {}", request.method(), path, self.status, self.message);
        }

        let json = error_body_json(&self.message, &path);
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        let schema = generator.json_schema::<ErrorBody>();
        for status in [400, 401, 403, 404, 409, 500] {
            add_schema_response(&mut responses, status, "application/json", schema.clone())?;
        }
        Ok(responses)
    }
}

fn error_body_json(message: &str, path: &str) -> String {
    let body = ErrorBody {
        timestamp: Utc::now().to_rfc3339(),
        message: message.to_string(),
        path: path.to_string(),
    };
    serde_json::to_string(&body).unwrap_or_else(|_| {
        r#"{"timestamp":"","message":"failed to serialize error","path":""}"#.to_string()
    })
}

/// Catchers covering the statuses guards and the framework can emit.
pub fn catchers() -> Vec<Catcher> {
    rocket::catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        conflict,
        unprocessable_entity,
        internal_error,
        default_catcher,
    ]
}

#[rocket::catch(400)]
fn bad_request(_request: &Request<'_>) -> ApiError {
    ApiError::new(Status::BadRequest, "bad request")
}

#[rocket::catch(401)]
fn unauthorized(_request: &Request<'_>) -> ApiError {
    ApiError::new(Status::Unauthorized, "unauthorized")
}

#[rocket::catch(403)]
fn forbidden(_request: &Request<'_>) -> ApiError {
    ApiError::new(Status::Forbidden, "forbidden")
}

#[rocket::catch(404)]
fn not_found(_request: &Request<'_>) -> ApiError {
    ApiError::new(Status::NotFound, "resource not found")
}

#[rocket::catch(409)]
fn conflict(_request: &Request<'_>) -> ApiError {
    ApiError::new(Status::Conflict, "conflict")
}

#[rocket::catch(422)]
fn unprocessable_entity(_request: &Request<'_>) -> ApiError {
    ApiError::new(Status::UnprocessableEntity, "request body could not be parsed")
}

#[rocket::catch(500)]
fn internal_error(_request: &Request<'_>) -> ApiError {
    ApiError::internal("internal server error")
}

#[rocket::catch(default)]
fn default_catcher(status: Status, _request: &Request<'_>) -> ApiError {
    ApiError::new(status, status.reason_lossy())
}
