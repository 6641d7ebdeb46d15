use crate::{error::AppError, state::AppState};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use database::scope::Scope;
use models::principal::Principal;

/// The caller of an authenticated endpoint
///
/// Extraction fails with 401 when the bearer token is missing or does not
/// verify. Role checks are left to the handler through the `require_*`
/// helpers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
    pub email: String,
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = bearer(parts).ok_or_else(AppError::unauthorized)?;
        let claims = state
            .tokens
            .verify(token)
            .ok_or_else(AppError::unauthorized)?;

        Ok(Self {
            principal: claims.principal(),
            email: claims.email,
        })
    }
}

impl AuthUser {
    pub fn id(&self) -> i32 {
        self.principal.user_id
    }

    pub fn scope(&self) -> Scope {
        Scope::for_principal(&self.principal)
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.principal.is_admin() {
            Ok(())
        } else {
            Err(AppError::unauthorized())
        }
    }

    /// Admins and HODs
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.principal.is_staff() {
            Ok(())
        } else {
            Err(AppError::unauthorized())
        }
    }

    pub fn require_faculty(&self) -> Result<(), AppError> {
        if self.principal.is_faculty() {
            Ok(())
        } else {
            Err(AppError::unauthorized())
        }
    }

    /// 403 with `message` unless the caller may write records of `department_id`
    pub fn ensure_department(&self, department_id: i32, message: &str) -> Result<(), AppError> {
        if self.principal.owns_department(department_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }

    /// Like [`Self::ensure_department`] for an account that may have no department
    pub fn ensure_account_department(
        &self,
        department_id: Option<i32>,
        message: &str,
    ) -> Result<(), AppError> {
        match department_id {
            Some(id) => self.ensure_department(id, message),
            None if self.principal.is_admin() => Ok(()),
            None => Err(AppError::Forbidden(message.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use models::role::Role;

    fn parts(header: Option<&str>) -> Parts {
        let mut request = Request::builder().uri("/students");
        if let Some(value) = header {
            request = request.header(AUTHORIZATION, value);
        }
        request.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer(&parts(Some("Bearer "))), None);
        assert_eq!(bearer(&parts(None)), None);
    }

    #[test]
    fn test_role_helpers() {
        let hod = AuthUser {
            principal: Principal::new(2, Role::Hod, Some(3)),
            email: "hod@college.edu".to_string(),
        };

        assert!(hod.require_staff().is_ok());
        assert!(matches!(hod.require_admin(), Err(AppError::Unauthorized(_))));
        assert!(matches!(hod.require_faculty(), Err(AppError::Unauthorized(_))));
        assert!(hod.ensure_department(3, "nope").is_ok());
        assert!(matches!(
            hod.ensure_department(4, "nope"),
            Err(AppError::Forbidden(message)) if message == "nope"
        ));
        assert_eq!(hod.scope(), Scope::Department(3));
    }
}
