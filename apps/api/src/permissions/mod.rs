//! Authorization predicates.
//!
//! Each predicate is a standalone gate over the acting [`Principal`] and, where
//! relevant, a resource implementing [`Owned`]. Handlers apply one gate per
//! protected operation and pass the result to [`authorize`].

pub mod extract;

use axum::http::Method;
use uuid::Uuid;

use crate::errors::AppError;

/// The actor behind a request. Anonymous principals have no identity and
/// every flag cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub id: Option<Uuid>,
    pub authenticated: bool,
    pub verified: bool,
    pub active: bool,
    pub staff: bool,
    pub superuser: bool,
}

impl Principal {
    pub fn anonymous() -> Self {
        Principal::default()
    }

    pub fn is_anonymous(&self) -> bool {
        !self.authenticated
    }

    /// Identity of an authenticated principal.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        match self.id {
            Some(id) if self.authenticated => Ok(id),
            _ => Err(AppError::Unauthorized),
        }
    }
}

/// A domain object with a single owning principal.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// GET, HEAD and OPTIONS never mutate state.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn owns<R: Owned + ?Sized>(principal: &Principal, resource: &R) -> bool {
    principal.authenticated && principal.id == Some(resource.owner_id())
}

/// Reads are open; writes require ownership. A write with no resource to
/// compare against is denied.
pub fn may_write<R: Owned + ?Sized>(
    principal: &Principal,
    resource: Option<&R>,
    is_safe_method: bool,
) -> bool {
    if is_safe_method {
        return true;
    }
    resource.is_some_and(|r| owns(principal, r))
}

pub fn is_verified(principal: &Principal) -> bool {
    principal.authenticated && principal.verified
}

pub fn is_active(principal: &Principal) -> bool {
    principal.authenticated && principal.active
}

pub fn is_authenticated(principal: &Principal) -> bool {
    principal.authenticated
}

/// Owner-only access, whatever the method.
pub fn is_owner<R: Owned + ?Sized>(principal: &Principal, resource: &R) -> bool {
    owns(principal, resource)
}

/// Staff may read anything; only the owner may write.
pub fn is_owner_or_staff_read_only<R: Owned + ?Sized>(
    principal: &Principal,
    resource: &R,
    is_safe_method: bool,
) -> bool {
    if principal.authenticated && principal.staff && is_safe_method {
        return true;
    }
    owns(principal, resource)
}

pub fn is_superuser_or_read_only(principal: &Principal, is_safe_method: bool) -> bool {
    is_safe_method || (principal.authenticated && principal.superuser)
}

/// Turns a gate result into a handler outcome: anonymous callers are asked
/// to authenticate, authenticated ones are refused.
pub fn authorize(principal: &Principal, allowed: bool) -> Result<(), AppError> {
    if allowed {
        Ok(())
    } else if principal.is_anonymous() {
        Err(AppError::Unauthorized)
    } else {
        Err(AppError::Forbidden)
    }
}
