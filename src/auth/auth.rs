use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub staff_id: u64,
    pub username: String,
    pub role: Role,
}

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingHeader,
    NotBearer,
    InvalidToken,
    UnknownRole,
}

impl AuthRejection {
    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::MissingHeader => "Missing Authorization header",
            AuthRejection::NotBearer => "Authorization header must start with Bearer",
            AuthRejection::InvalidToken => "Invalid or expired token",
            AuthRejection::UnknownRole => "Invalid role",
        }
    }
}

impl AuthUser {
    /// Resolves the staff member behind an `Authorization` header value.
    pub fn from_authorization(header: Option<&str>, secret: &str) -> Result<Self, AuthRejection> {
        let header = header.ok_or(AuthRejection::MissingHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthRejection::NotBearer)?;
        let claims = verify_token(token, secret).map_err(|_| AuthRejection::InvalidToken)?;
        let role = Role::from_id(claims.role).ok_or(AuthRejection::UnknownRole)?;

        Ok(AuthUser {
            staff_id: claims.staff_id,
            username: claims.sub,
            role,
        })
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by the auth middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let header = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
        ready(
            AuthUser::from_authorization(header, &config.jwt_secret)
                .map_err(|r| ErrorUnauthorized(r.message())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            staff_id: 1,
            username: "desk".into(),
            role,
        }
    }

    #[test]
    fn only_admin_passes_admin_check() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(user(Role::Staff).require_admin().is_err());
        assert!(!user(Role::Staff).is_admin());
    }

    fn token(role: u8) -> String {
        generate_access_token(5, "desk".into(), role, "s3cret", 60).unwrap()
    }

    #[test]
    fn bearer_token_resolves_staff() {
        let header = format!("Bearer {}", token(2));
        let user = AuthUser::from_authorization(Some(&header), "s3cret").unwrap();
        assert_eq!(user.staff_id, 5);
        assert_eq!(user.username, "desk");
        assert_eq!(user.role, Role::Staff);
    }

    #[test]
    fn rejections_are_specific() {
        assert_eq!(
            AuthUser::from_authorization(None, "s3cret").unwrap_err(),
            AuthRejection::MissingHeader
        );
        let raw = token(1);
        assert_eq!(
            AuthUser::from_authorization(Some(&raw), "s3cret").unwrap_err(),
            AuthRejection::NotBearer
        );
        let header = format!("Bearer {}", raw);
        assert_eq!(
            AuthUser::from_authorization(Some(&header), "other").unwrap_err(),
            AuthRejection::InvalidToken
        );
        let header = format!("Bearer {}", token(9));
        assert_eq!(
            AuthUser::from_authorization(Some(&header), "s3cret").unwrap_err(),
            AuthRejection::UnknownRole
        );
    }
}
