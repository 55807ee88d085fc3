use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use cardboard_core::{DomainError, UserId};

use crate::Principal;

/// What the principal wants to do with an owned resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("you are not the owner of this {resource}")]
    NotOwner { resource: &'static str },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::forbidden(value.to_string())
    }
}

/// Ownership policy consulted before every operation on owned resources.
pub trait Authorizer: Send + Sync {
    fn check(
        &self,
        principal: &Principal,
        owner: UserId,
        resource: &'static str,
        access: Access,
    ) -> Result<(), AuthzError>;
}

impl<A> Authorizer for Arc<A>
where
    A: Authorizer + ?Sized,
{
    fn check(
        &self,
        principal: &Principal,
        owner: UserId,
        resource: &'static str,
        access: Access,
    ) -> Result<(), AuthzError> {
        (**self).check(principal, owner, resource, access)
    }
}

/// Default policy: owners do anything with their own resources; staff may read
/// anyone's.
#[derive(Debug, Copy, Clone, Default)]
pub struct OwnerPolicy;

impl Authorizer for OwnerPolicy {
    fn check(
        &self,
        principal: &Principal,
        owner: UserId,
        resource: &'static str,
        access: Access,
    ) -> Result<(), AuthzError> {
        authorize(principal, owner, resource, access)
    }
}

/// Pure ownership check.
///
/// - No IO
/// - No panics
pub fn authorize(
    principal: &Principal,
    owner: UserId,
    resource: &'static str,
    access: Access,
) -> Result<(), AuthzError> {
    if principal.user_id == owner {
        return Ok(());
    }
    if principal.is_staff && access == Access::Read {
        return Ok(());
    }
    tracing::warn!(
        principal = %principal.user_id,
        owner = %owner,
        resource,
        ?access,
        "ownership check denied"
    );
    Err(AuthzError::NotOwner { resource })
}
