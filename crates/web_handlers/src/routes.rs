use actix_web::web;

use auth_services::jwt::JwtService;
use auth_services::middleware::AuthMiddleware;

use crate::auth_handlers::{forgot_password, login, register, reset_password, verify_token};
use crate::errors::{json_config, not_found, path_config};
use crate::jwks_handlers::{health, jwks};
use crate::user_handlers::{change_user_role, delete_user, edit_user, get_user, list_users};

/// Prefixes the public auth endpoints are mounted under.
const PUBLIC_AUTH_PREFIXES: [&str; 2] = ["/auth", "/users"];

/// Registers every route of the service.
///
/// Public endpoints come first so that `/users/login` and friends are not
/// captured by `/users/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig, jwt_service: JwtService) {
    cfg.app_data(json_config()).app_data(path_config());

    for prefix in PUBLIC_AUTH_PREFIXES {
        cfg.route(&format!("{}/register", prefix), web::post().to(register))
            .route(&format!("{}/login", prefix), web::post().to(login))
            .route(&format!("{}/forgot-password", prefix), web::post().to(forgot_password))
            .route(&format!("{}/reset-password", prefix), web::post().to(reset_password));
    }

    cfg.route("/.well-known/jwks.json", web::get().to(jwks))
        .route("/jwks", web::get().to(jwks))
        .route("/health", web::get().to(health));

    let auth = AuthMiddleware::new(jwt_service);

    cfg.service(
        web::resource("/users")
            .wrap(auth.clone())
            .route(web::get().to(list_users))
            .default_service(web::route().to(not_found)),
    )
    .service(
        web::resource("/users/auth/verify")
            .wrap(auth.clone())
            .route(web::get().to(verify_token))
            .default_service(web::route().to(not_found)),
    )
    .service(
        web::resource("/users/{id}")
            .wrap(auth.clone())
            .route(web::get().to(get_user))
            .route(web::put().to(edit_user))
            .route(web::delete().to(delete_user))
            .default_service(web::route().to(not_found)),
    )
    .service(
        web::resource("/users/{id}/role")
            .wrap(auth)
            .route(web::patch().to(change_user_role))
            .default_service(web::route().to(not_found)),
    );
}
