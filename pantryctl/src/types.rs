//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, ProductId, etc.)
//! - Resource and operation enums for access control
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases so signatures say which
//! table an id belongs to.
//!
//! # Permission System
//!
//! - [`Resource`]: What area of the catalog is being accessed
//! - [`Operation`]: What action is being performed (Create, Read, Update, Delete)
//!
//! Role grants live in [`crate::auth::permissions`].
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type TokenFamilyId = Uuid;
pub type RefreshTokenId = Uuid;
pub type RecipeId = Uuid;
pub type RecipeCategoryId = Uuid;
pub type IngredientId = Uuid;
pub type StepId = Uuid;
pub type ProductId = Uuid;
pub type ProductCategoryId = Uuid;
pub type ProductSubcategoryId = Uuid;
pub type SupplierId = Uuid;
pub type OriginId = Uuid;
pub type MarginLevelId = Uuid;
pub type UnitId = Uuid;
pub type VolumeConversionId = Uuid;
pub type WarehouseId = Uuid;
pub type InventoryId = Uuid;
pub type StockMovementId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

// Resources that can be operated on. Each admin module maps to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Recipes,
    Products,
    Units,
    Stock,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => write!(f, "users"),
            Resource::Recipes => write!(f, "recipes"),
            Resource::Products => write!(f, "products"),
            Resource::Units => write!(f, "units"),
            Resource::Stock => write!(f, "stock"),
        }
    }
}
