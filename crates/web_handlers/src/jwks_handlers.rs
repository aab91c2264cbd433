use actix_web::{HttpResponse, Result, http::header, web};

use auth_services::jwt::JwtService;

/// Publishes the access token verification key as a JWKS document.
pub async fn jwks(jwt_service: web::Data<JwtService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "public, max-age=300"))
        .json(jwt_service.keys().jwks()))
}

/// Health check endpoint
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "service": "users",
        "status": "healthy",
        "timestamp": chrono::Utc::now()
    })))
}
