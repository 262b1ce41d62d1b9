//! Role grants and the permission-checking extractor.
//!
//! Handlers state what they need in their signature:
//!
//! ```ignore
//! pub async fn create_product(
//!     State(state): State<AppState>,
//!     _: RequiresPermission<resource::Products, operation::Create>,
//!     Json(body): Json<ProductCreate>,
//! ) -> Result<...>
//! ```
//!
//! The extractor authenticates the caller through [`CurrentUser`] and rejects
//! the request with 403 when the caller's role does not grant the operation.

use std::{marker::PhantomData, ops::Deref};

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::Error,
    types::{Operation, Resource},
};

/// Whether `role` may perform `operation` on `resource`.
pub fn role_allows(role: Role, resource: Resource, operation: Operation) -> bool {
    let catalog = matches!(resource, Resource::Recipes | Resource::Products | Resource::Units | Resource::Stock);
    match role {
        Role::Admin => true,
        Role::Manager => catalog || (resource == Resource::Users && operation == Operation::Read),
        Role::Staff => {
            (catalog && operation == Operation::Read)
                || (resource == Resource::Stock && matches!(operation, Operation::Create | Operation::Update))
        }
        Role::Viewer => catalog && operation == Operation::Read,
    }
}

pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    role_allows(user.role, resource, operation)
}

pub trait ResourceMarker {
    const RESOURCE: Resource;
}

pub trait OperationMarker {
    const OPERATION: Operation;
}

pub mod resource {
    use super::{Resource, ResourceMarker};

    pub struct Users;
    pub struct Recipes;
    pub struct Products;
    pub struct Units;
    pub struct Stock;

    impl ResourceMarker for Users {
        const RESOURCE: Resource = Resource::Users;
    }
    impl ResourceMarker for Recipes {
        const RESOURCE: Resource = Resource::Recipes;
    }
    impl ResourceMarker for Products {
        const RESOURCE: Resource = Resource::Products;
    }
    impl ResourceMarker for Units {
        const RESOURCE: Resource = Resource::Units;
    }
    impl ResourceMarker for Stock {
        const RESOURCE: Resource = Resource::Stock;
    }
}

pub mod operation {
    use super::{Operation, OperationMarker};

    pub struct Create;
    pub struct Read;
    pub struct Update;
    pub struct Delete;

    impl OperationMarker for Create {
        const OPERATION: Operation = Operation::Create;
    }
    impl OperationMarker for Read {
        const OPERATION: Operation = Operation::Read;
    }
    impl OperationMarker for Update {
        const OPERATION: Operation = Operation::Update;
    }
    impl OperationMarker for Delete {
        const OPERATION: Operation = Operation::Delete;
    }
}

/// An authenticated caller whose role grants operation `O` on resource `R`.
pub struct RequiresPermission<R, O> {
    user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

impl<R, O> RequiresPermission<R, O> {
    pub fn into_inner(self) -> CurrentUser {
        self.user
    }
}

impl<R, O> Deref for RequiresPermission<R, O> {
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: ResourceMarker + Send + Sync,
    O: OperationMarker + Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        if !has_permission(&user, R::RESOURCE, O::OPERATION) {
            debug!(role = %user.role, resource = %R::RESOURCE, operation = %O::OPERATION, "Permission denied");
            return Err(Error::InsufficientPermissions {
                action: O::OPERATION,
                resource: R::RESOURCE,
            });
        }

        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}
