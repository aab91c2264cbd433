use actix_web::{HttpResponse, Result, web};

use auth_services::jwt::JwtService;
use auth_services::middleware::AuthenticatedUser;
use auth_services::service::AuthService;
use auth_services::types::*;
use notification_services::NotificationService;

/// Handles user registration. Returns 201 Created with the new account.
pub async fn register(
    auth_service: web::Data<AuthService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AuthError> {
    let user = auth_service.register(&request).await?;

    Ok(HttpResponse::Created().json(DataResponse {
        data: RegisteredUser::from(user),
    }))
}

/// Handles user login by verifying credentials and issuing an access token.
pub async fn login(
    auth_service: web::Data<AuthService>,
    jwt_service: web::Data<JwtService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    let user = auth_service.login(&request).await?;
    let token = jwt_service.generate_access_token(&user)?;

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// Starts a password reset and emails the reset token.
pub async fn forgot_password(
    auth_service: web::Data<AuthService>,
    jwt_service: web::Data<JwtService>,
    notification_service: web::Data<NotificationService>,
    request: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AuthError> {
    let (user, reset_token) = auth_service
        .request_password_reset(&request, &jwt_service)
        .await?;

    notification_service
        .send_password_reset_requested(&user.email, &reset_token)
        .await
        .map_err(|e| AuthError::Notification(e.to_string()))?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password reset email sent")))
}

/// Completes a password reset with the emailed token.
pub async fn reset_password(
    auth_service: web::Data<AuthService>,
    jwt_service: web::Data<JwtService>,
    notification_service: web::Data<NotificationService>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AuthError> {
    let user = auth_service.reset_password(&request, &jwt_service).await?;

    // The password is already changed; a lost confirmation email must not undo that.
    if let Err(e) = notification_service
        .send_password_reset_completed(&user.email)
        .await
    {
        log::warn!("Password reset confirmation for user {} not sent: {}", user.id, e);
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password reset successfully")))
}

/// Confirms that the bearer token is valid; used by the gateway's auth_request.
pub async fn verify_token(_user: AuthenticatedUser) -> Result<HttpResponse, AuthError> {
    Ok(HttpResponse::Ok().json(MessageResponse::new("Token is valid.")))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::{Value, json};

    use crate::test_support::*;
    use notification_services::EmailEventType;

    #[actix_web::test]
    async fn register_returns_public_fields() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);

        let res = send!(app, post_json("/auth/register", json!({
            "name": "Auth Test User",
            "email": "auth_test@example.com",
            "password": "StrongPass123"
        })));
        assert_eq!(res.status(), StatusCode::CREATED);

        let body: Value = actix_test::read_body_json(res).await;
        assert!(body["data"]["id"].is_i64());
        assert_eq!(body["data"]["email"], "auth_test@example.com");
        assert_eq!(body["data"]["role"], "USER");
        assert!(body["data"].get("password").is_none());
        assert!(body["data"].get("passwordHash").is_none());
    }

    #[actix_web::test]
    async fn register_conflicts_and_validates() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let user = json!({ "name": "Ann", "email": "ann@example.com", "password": "1234" });

        let first = send!(app, post_json("/auth/register", user.clone()));
        assert_eq!(first.status(), StatusCode::CREATED);

        let again = send!(app, post_json("/auth/register", user));
        assert_eq!(again.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(again).await;
        assert_eq!(body["error"], "Email already exists");

        let missing = send!(app, post_json("/auth/register", json!({ "email": "missing@fields.com" })));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(missing).await;
        assert_eq!(body["error"], "Name and email are required");

        let with_role = send!(app, post_json("/users/register", json!({
            "name": "Eve", "email": "eve@example.com", "password": "1234", "role": "ADMIN"
        })));
        assert_eq!(with_role.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn login_issues_a_verifiable_token() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        ctx.create_user("Ann", "ann@example.com", "StrongPass123").await;

        let res = send!(app, post_json("/auth/login", json!({
            "email": "ann@example.com",
            "password": "StrongPass123"
        })));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        let token = body["token"].as_str().unwrap();
        assert!(ctx.jwt.verify_access_token(token).is_ok());

        let wrong = send!(app, post_json("/auth/login", json!({
            "email": "ann@example.com",
            "password": "WrongPassword"
        })));
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let missing = send!(app, post_json("/users/login", json!({ "email": "ann@example.com" })));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn forgot_password_publishes_reset_email() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        ctx.create_user("Ann", "ann@example.com", "1234").await;

        let res = send!(app, post_json("/auth/forgot-password", json!({ "email": "Ann@Example.com" })));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "Password reset email sent");

        let events = ctx.publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EmailEventType::UserPasswordResetRequested);
        assert_eq!(events[0].to, "ann@example.com");
        assert!(events[0].message.starts_with("Your reset token is: "));
    }

    #[actix_web::test]
    async fn forgot_password_errors() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);

        let missing = send!(app, post_json("/auth/forgot-password", json!({})));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let invalid = send!(app, post_json("/auth/forgot-password", json!({ "email": "invalid-email" })));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let unknown = send!(app, post_json("/auth/forgot-password", json!({ "email": "notfound@example.com" })));
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        assert!(ctx.publisher.events().is_empty());
    }

    #[actix_web::test]
    async fn forgot_password_fails_when_broker_is_down() {
        let ctx = TestContext::with_failing_publisher();
        let app = test_app!(ctx);
        ctx.create_user("Ann", "ann@example.com", "1234").await;

        let res = send!(app, post_json("/auth/forgot-password", json!({ "email": "ann@example.com" })));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[actix_web::test]
    async fn reset_password_with_emailed_token() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        ctx.create_user("Ann", "ann@example.com", "old-pass").await;

        send!(app, post_json("/auth/forgot-password", json!({ "email": "ann@example.com" })));
        let message = ctx.publisher.events()[0].message.clone();
        let token = message.trim_start_matches("Your reset token is: ");

        let res = send!(app, post_json("/auth/reset-password", json!({
            "email": "ann@example.com",
            "token": token,
            "newPassword": "NewStrongPass123"
        })));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "Password reset successfully");

        let events = ctx.publisher.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, EmailEventType::UserPasswordResetCompleted);

        let login = send!(app, post_json("/auth/login", json!({
            "email": "ann@example.com",
            "password": "NewStrongPass123"
        })));
        assert_eq!(login.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn reset_password_errors() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        ctx.create_user("Ann", "ann@example.com", "1234").await;

        let missing = send!(app, post_json("/auth/reset-password", json!({})));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let invalid = send!(app, post_json("/auth/reset-password", json!({
            "email": "ann@example.com",
            "token": "invalid-token",
            "newPassword": "NewStrongPass123"
        })));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(invalid).await;
        assert_eq!(body["error"], "Invalid or expired reset token");

        let short = send!(app, post_json("/auth/reset-password", json!({
            "email": "ann@example.com",
            "token": "invalid-token",
            "newPassword": "123"
        })));
        assert_eq!(short.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(short).await;
        assert_eq!(body["error"], "Password must be at least 4 characters long");
    }

    #[actix_web::test]
    async fn verify_endpoint() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let (_, token) = ctx.create_user("Ann", "ann@example.com", "1234").await;

        let ok = send!(app, get_with_token("/users/auth/verify", Some(&token)));
        assert_eq!(ok.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(ok).await;
        assert_eq!(body["message"], "Token is valid.");

        let missing = send!(app, get_with_token("/users/auth/verify", None));
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let invalid = send!(app, get_with_token("/users/auth/verify", Some("invalid.token.here")));
        assert_eq!(invalid.status(), StatusCode::FORBIDDEN);
    }
}
