use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    web::Data,
};
use futures::future::{Ready, ready};

/// Identity of the caller, resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn authenticate(req: &HttpRequest) -> actix_web::Result<AuthUser> {
    // already resolved by auth_middleware
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let token = bearer_token(req).ok_or_else(|| ErrorUnauthorized("Missing token"))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ErrorInternalServerError("Config missing"))?;

    let claims =
        verify_token(token, &config.jwt_secret).map_err(|_| ErrorUnauthorized("Invalid token"))?;

    let role = Role::from_id(claims.role).ok_or_else(|| ErrorUnauthorized("Invalid role"))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
    })
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::{http::StatusCode, test::TestRequest};

    fn request_with(token: Option<&str>) -> HttpRequest {
        let mut req = TestRequest::default().app_data(Data::new(Config::for_tests()));
        if let Some(token) = token {
            req = req.insert_header(("Authorization", format!("Bearer {token}")));
        }
        req.to_http_request()
    }

    #[test]
    fn resolves_identity_from_token() {
        let token = generate_access_token(9, "prof".into(), 2, "test-secret", 60).unwrap();
        let user = authenticate(&request_with(Some(&token))).unwrap();

        assert_eq!(user.user_id, 9);
        assert_eq!(user.role, Role::Faculty);
        assert!(!user.is_admin());
    }

    #[test]
    fn missing_or_forged_token_is_unauthorized() {
        let forged = generate_access_token(9, "prof".into(), 1, "not-the-secret", 60).unwrap();

        for req in [request_with(None), request_with(Some(&forged))] {
            let err = authenticate(&req).unwrap_err();
            assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn non_admin_is_forbidden() {
        let user = AuthUser {
            user_id: 3,
            username: "student".into(),
            role: Role::Student,
        };
        let err = user.require_admin().unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }
}
