//! Shared fixtures for driving the route table in handler tests.

use std::sync::Arc;

use actix_web::test::TestRequest;
use serde_json::Value;

use auth_services::jwt::{JwtService, JwtSettings};
use auth_services::keys::JwtKeyMaterial;
use auth_services::memory::InMemoryUserStore;
use auth_services::service::AuthService;
use auth_services::types::{ChangeRoleRequest, RegisterRequest, Role, User};
use notification_services::{NotificationService, RecordingPublisher};

const PRIVATE_PEM: &str = include_str!("../../auth_services/test-fixtures/jwt-private.pkcs8.pem");
const PUBLIC_PEM: &str = include_str!("../../auth_services/test-fixtures/jwt-public.spki.pem");

/// Services wired over in-memory backends.
pub struct TestContext {
    pub auth: AuthService,
    pub jwt: JwtService,
    pub publisher: Arc<RecordingPublisher>,
    pub notifications: NotificationService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_publisher(RecordingPublisher::new())
    }

    pub fn with_failing_publisher() -> Self {
        Self::with_publisher(RecordingPublisher::failing())
    }

    fn with_publisher(publisher: RecordingPublisher) -> Self {
        let keys = JwtKeyMaterial::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap();
        let publisher = Arc::new(publisher);

        Self {
            auth: AuthService::new(Arc::new(InMemoryUserStore::new())).with_hash_cost(4),
            jwt: JwtService::new(keys, JwtSettings::new("test-reset-secret")),
            notifications: NotificationService::new(publisher.clone()),
            publisher,
        }
    }

    /// Registers a USER account and returns it with an access token.
    pub async fn create_user(&self, name: &str, email: &str, password: &str) -> (User, String) {
        let user = self
            .auth
            .register(&RegisterRequest {
                name: Some(name.to_string()),
                email: Some(email.to_string()),
                password: Some(password.to_string()),
                role: None,
            })
            .await
            .unwrap();
        let token = self.jwt.generate_access_token(&user).unwrap();
        (user, token)
    }

    /// Registers an ADMIN account and returns it with an access token.
    pub async fn create_admin(&self, name: &str, email: &str) -> (User, String) {
        let (user, token) = self.create_user(name, email, "admin-pass").await;
        let admin = self
            .auth
            .change_role(
                user.id,
                &ChangeRoleRequest {
                    role: Some(Role::Admin.to_string()),
                },
            )
            .await
            .unwrap();
        (admin, token)
    }
}

/// Builds the full application over a [`TestContext`].
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.auth.clone()))
                .app_data(actix_web::web::Data::new($ctx.jwt.clone()))
                .app_data(actix_web::web::Data::new($ctx.notifications.clone()))
                .configure(|cfg| crate::routes::configure(cfg, $ctx.jwt.clone()))
                .default_service(actix_web::web::route().to(crate::errors::not_found)),
        )
        .await
    };
}
pub(crate) use test_app;

/// Sends a [`TestRequest`] through the app and returns the response.
macro_rules! send {
    ($app:expr, $req:expr) => {
        actix_web::test::call_service(&$app, $req.to_request()).await
    };
}
pub(crate) use send;

pub fn post_json(uri: &str, body: Value) -> TestRequest {
    TestRequest::post().uri(uri).set_json(body)
}

pub fn put_json(uri: &str, token: &str, body: Value) -> TestRequest {
    TestRequest::put()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
}

pub fn patch_json(uri: &str, token: &str, body: Value) -> TestRequest {
    TestRequest::patch()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
}

pub fn get_with_token(uri: &str, token: Option<&str>) -> TestRequest {
    with_token(TestRequest::get().uri(uri), token)
}

pub fn delete_with_token(uri: &str, token: Option<&str>) -> TestRequest {
    with_token(TestRequest::delete().uri(uri), token)
}

fn with_token(req: TestRequest, token: Option<&str>) -> TestRequest {
    match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {}", token))),
        None => req,
    }
}
