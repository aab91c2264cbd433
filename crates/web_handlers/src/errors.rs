use actix_web::error::{JsonPayloadError, PathError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};

use auth_services::types::AuthError;

/// Message returned for request bodies that are not valid JSON.
pub const INVALID_JSON_MESSAGE: &str =
    "Invalid JSON payload! Check if your body data is a valid JSON.";

/// JSON extractor configuration answering malformed bodies with a 400 error body.
///
/// Bodies are parsed whatever their `Content-Type`, so a well-formed body sent
/// as `text/plain` still reaches the field checks.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(json_error_handler)
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected JSON body on {}: {}", req.path(), err);
    let response =
        HttpResponse::BadRequest().json(serde_json::json!({ "error": INVALID_JSON_MESSAGE }));
    actix_web::error::InternalError::from_response(err, response).into()
}

/// Path extractor configuration; an id that is not a number names no user.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(path_error_handler)
}

fn path_error_handler(err: PathError, req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected path {}: {}", req.path(), err);
    actix_web::error::InternalError::from_response(err, AuthError::UserNotFound.error_response())
        .into()
}

/// Fallback for unknown routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Endpoint not found...." }))
}
