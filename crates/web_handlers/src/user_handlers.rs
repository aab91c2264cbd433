use actix_web::{HttpResponse, Result, web};

use auth_services::middleware::AuthenticatedUser;
use auth_services::service::AuthService;
use auth_services::types::*;

use crate::guards::{AdminUser, ensure_self_or_admin};

/// Lists every user. Admin only.
pub async fn list_users(
    auth_service: web::Data<AuthService>,
    _admin: AdminUser,
) -> Result<HttpResponse, AuthError> {
    let users: Vec<UserInfo> = auth_service
        .list_users()
        .await?
        .into_iter()
        .map(UserInfo::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

/// Returns one user to themselves or to an admin.
pub async fn get_user(
    auth_service: web::Data<AuthService>,
    caller: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AuthError> {
    let id = path.into_inner();
    ensure_self_or_admin(&auth_service, &caller, id).await?;

    let user = auth_service.get_user(id).await?;

    Ok(HttpResponse::Ok().json(DataResponse {
        data: UserInfo::from(user),
    }))
}

/// Edits name and/or email of a user, for themselves or an admin.
pub async fn edit_user(
    auth_service: web::Data<AuthService>,
    caller: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AuthError> {
    let id = path.into_inner();
    ensure_self_or_admin(&auth_service, &caller, id).await?;

    let user = auth_service.update_user(id, &request).await?;

    Ok(HttpResponse::Ok().json(DataResponse {
        data: UserInfo::from(user),
    }))
}

/// Changes the role of a user. Admin only.
pub async fn change_user_role(
    auth_service: web::Data<AuthService>,
    admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<ChangeRoleRequest>,
) -> Result<HttpResponse, AuthError> {
    let id = path.into_inner();
    let user = auth_service.change_role(id, &request).await?;
    log::info!("Admin {} set role of user {} to {}", admin.0.id, id, user.role);

    Ok(HttpResponse::Ok().json(DataResponse {
        data: UserInfo::from(user),
    }))
}

/// Deletes a user. Admin only.
pub async fn delete_user(
    auth_service: web::Data<AuthService>,
    admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AuthError> {
    let id = path.into_inner();
    auth_service.delete_user(id).await?;
    log::info!("Admin {} deleted user {}", admin.0.id, id);

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::{Value, json};

    use crate::test_support::*;

    #[actix_web::test]
    async fn list_requires_admin() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let (_, admin_token) = ctx.create_admin("Root", "root@example.com").await;
        let (_, user_token) = ctx.create_user("Ann", "ann@example.com", "1234").await;

        let res = send!(app, get_with_token("/users", Some(&admin_token)));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["email"], "root@example.com");
        assert_eq!(users[1]["role"], "USER");
        assert!(users[1].get("passwordHash").is_none());

        let res = send!(app, get_with_token("/users", Some(&user_token)));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "Access forbidden: insufficient privileges.");

        let res = send!(app, get_with_token("/users", None));
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn deleted_caller_is_not_found() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let (admin, admin_token) = ctx.create_admin("Root", "root@example.com").await;
        ctx.auth.delete_user(admin.id).await.unwrap();

        let res = send!(app, get_with_token("/users", Some(&admin_token)));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "User not found.");
    }

    #[actix_web::test]
    async fn get_user_is_self_or_admin() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let (_, admin_token) = ctx.create_admin("Root", "root@example.com").await;
        let (ann, ann_token) = ctx.create_user("Ann", "ann@example.com", "1234").await;
        let (bob, _) = ctx.create_user("Bob", "bob@example.com", "1234").await;

        let res = send!(app, get_with_token(&format!("/users/{}", ann.id), Some(&ann_token)));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["data"]["name"], "Ann");

        let res = send!(app, get_with_token(&format!("/users/{}", bob.id), Some(&admin_token)));
        assert_eq!(res.status(), StatusCode::OK);

        let res = send!(app, get_with_token(&format!("/users/{}", bob.id), Some(&ann_token)));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = send!(app, get_with_token("/users/9999", Some(&admin_token)));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "User not found");
    }

    #[actix_web::test]
    async fn edit_user_rules() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let (ann, ann_token) = ctx.create_user("Ann", "ann@example.com", "1234").await;
        ctx.create_user("Bob", "bob@example.com", "1234").await;
        let uri = format!("/users/{}", ann.id);

        let res = send!(app, put_json(&uri, &ann_token, json!({ "name": "Annie" })));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["data"]["name"], "Annie");
        assert_eq!(body["data"]["email"], "ann@example.com");

        let res = send!(app, put_json(&uri, &ann_token, json!({ "role": "ADMIN" })));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "Role cannot be changed via this endpoint");

        let res = send!(app, put_json(&uri, &ann_token, json!({})));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "At least one field (name or email) must be provided");

        let res = send!(app, put_json(&uri, &ann_token, json!({ "email": "BOB@example.com" })));
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = send!(app, put_json(&uri, &ann_token, json!({ "email": "not-an-email" })));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid email format");
    }

    #[actix_web::test]
    async fn users_cannot_edit_others() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let (_, ann_token) = ctx.create_user("Ann", "ann@example.com", "1234").await;
        let (bob, _) = ctx.create_user("Bob", "bob@example.com", "1234").await;
        let (_, admin_token) = ctx.create_admin("Root", "root@example.com").await;
        let uri = format!("/users/{}", bob.id);

        let res = send!(app, put_json(&uri, &ann_token, json!({ "name": "Hacked" })));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = send!(app, put_json(&uri, &admin_token, json!({ "name": "Robert" })));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["data"]["name"], "Robert");
    }

    #[actix_web::test]
    async fn change_role_rules() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let (_, admin_token) = ctx.create_admin("Root", "root@example.com").await;
        let (ann, ann_token) = ctx.create_user("Ann", "ann@example.com", "1234").await;
        let uri = format!("/users/{}/role", ann.id);

        let res = send!(app, patch_json(&uri, &ann_token, json!({ "role": "ADMIN" })));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = send!(app, patch_json(&uri, &admin_token, json!({})));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "Role is required");

        let res = send!(app, patch_json(&uri, &admin_token, json!({ "role": "OWNER" })));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid role, must be USER or ADMIN");

        let res = send!(app, patch_json("/users/9999/role", &admin_token, json!({ "role": "USER" })));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = send!(app, patch_json(&uri, &admin_token, json!({ "role": "admin" })));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["data"]["role"], "ADMIN");

        // The promoted user's existing token now passes the admin guard.
        let res = send!(app, get_with_token("/users", Some(&ann_token)));
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn delete_user_rules() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);
        let (_, admin_token) = ctx.create_admin("Root", "root@example.com").await;
        let (ann, ann_token) = ctx.create_user("Ann", "ann@example.com", "1234").await;
        let uri = format!("/users/{}", ann.id);

        let res = send!(app, delete_with_token(&uri, Some(&ann_token)));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = send!(app, delete_with_token(&uri, Some(&admin_token)));
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let body = actix_test::read_body(res).await;
        assert!(body.is_empty());

        let res = send!(app, delete_with_token(&uri, Some(&admin_token)));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
