use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use auth_services::middleware::AuthenticatedUser;
use auth_services::service::AuthService;
use auth_services::types::{AuthError, Role, User};

/// Extractor for an authenticated caller whose stored role is `ADMIN`.
///
/// The role is reloaded from the store on every request, so a demoted or
/// deleted account loses access even while its token is still valid.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let caller = AuthenticatedUser::from_request(req, payload).into_inner();
        let auth_service = req.app_data::<web::Data<AuthService>>().cloned();

        Box::pin(async move {
            let caller = caller?;
            let auth_service = auth_service.ok_or_else(|| {
                AuthError::Internal("AuthService is not registered as app data".to_string())
            })?;

            let admin = auth_service.require_role(caller.id, Role::Admin).await?;
            Ok(AdminUser(admin))
        })
    }
}

/// Lets the caller act on `target_id` when it is their own account or they are an admin.
pub async fn ensure_self_or_admin(
    auth_service: &AuthService,
    caller: &AuthenticatedUser,
    target_id: i64,
) -> Result<(), AuthError> {
    if caller.id == target_id {
        return Ok(());
    }

    auth_service.require_role(caller.id, Role::Admin).await?;
    Ok(())
}
