//! Database models for products and their reference data (categories,
//! subcategories, suppliers, origins and margin levels).

use crate::api::models::products::{
    MarginLevelCreate, MarginLevelUpdate, OriginCreate, OriginUpdate, ProductCategoryCreate, ProductCategoryUpdate,
    ProductCreate, ProductSubcategoryCreate, ProductSubcategoryUpdate, ProductUpdate, SupplierCreate, SupplierUpdate,
};
use crate::types::{MarginLevelId, OriginId, ProductCategoryId, ProductId, ProductSubcategoryId, SupplierId, UnitId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ProductCategoryCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
}

impl From<ProductCategoryCreate> for ProductCategoryCreateDBRequest {
    fn from(api: ProductCategoryCreate) -> Self {
        Self {
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductCategoryUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<ProductCategoryUpdate> for ProductCategoryUpdateDBRequest {
    fn from(api: ProductCategoryUpdate) -> Self {
        Self {
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductCategoryDBResponse {
    pub id: ProductCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProductSubcategoryCreateDBRequest {
    pub category_id: ProductCategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl From<ProductSubcategoryCreate> for ProductSubcategoryCreateDBRequest {
    fn from(api: ProductSubcategoryCreate) -> Self {
        Self {
            category_id: api.category_id,
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductSubcategoryUpdateDBRequest {
    pub category_id: Option<ProductCategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<ProductSubcategoryUpdate> for ProductSubcategoryUpdateDBRequest {
    fn from(api: ProductSubcategoryUpdate) -> Self {
        Self {
            category_id: api.category_id,
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductSubcategoryDBResponse {
    pub id: ProductSubcategoryId,
    pub category_id: ProductCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SupplierCreateDBRequest {
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
}

impl From<SupplierCreate> for SupplierCreateDBRequest {
    fn from(api: SupplierCreate) -> Self {
        Self {
            name: api.name,
            contact_name: api.contact_name,
            email: api.email,
            phone: api.phone,
            address: api.address,
            is_active: api.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SupplierUpdateDBRequest {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl From<SupplierUpdate> for SupplierUpdateDBRequest {
    fn from(api: SupplierUpdate) -> Self {
        Self {
            name: api.name,
            contact_name: api.contact_name,
            email: api.email,
            phone: api.phone,
            address: api.address,
            is_active: api.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SupplierDBResponse {
    pub id: SupplierId,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OriginCreateDBRequest {
    pub name: String,
    pub code: Option<String>,
}

impl From<OriginCreate> for OriginCreateDBRequest {
    fn from(api: OriginCreate) -> Self {
        Self {
            name: api.name,
            code: api.code,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OriginUpdateDBRequest {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl From<OriginUpdate> for OriginUpdateDBRequest {
    fn from(api: OriginUpdate) -> Self {
        Self {
            name: api.name,
            code: api.code,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OriginDBResponse {
    pub id: OriginId,
    pub name: String,
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MarginLevelCreateDBRequest {
    pub name: String,
    pub percentage: Decimal,
}

impl From<MarginLevelCreate> for MarginLevelCreateDBRequest {
    fn from(api: MarginLevelCreate) -> Self {
        Self {
            name: api.name,
            percentage: api.percentage,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarginLevelUpdateDBRequest {
    pub name: Option<String>,
    pub percentage: Option<Decimal>,
}

impl From<MarginLevelUpdate> for MarginLevelUpdateDBRequest {
    fn from(api: MarginLevelUpdate) -> Self {
        Self {
            name: api.name,
            percentage: api.percentage,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MarginLevelDBResponse {
    pub id: MarginLevelId,
    pub name: String,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database request for creating a product.
///
/// `selling_price` is the caller's explicit price; the repository replaces it
/// with the margin-derived price whenever a margin level is set.
#[derive(Debug, Clone)]
pub struct ProductCreateDBRequest {
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub category_id: ProductCategoryId,
    pub subcategory_id: Option<ProductSubcategoryId>,
    pub supplier_id: Option<SupplierId>,
    pub origin_id: Option<OriginId>,
    pub margin_level_id: Option<MarginLevelId>,
    pub unit_id: Option<UnitId>,
    pub cost_price: Decimal,
    pub selling_price: Option<Decimal>,
    pub is_active: bool,
}

impl From<ProductCreate> for ProductCreateDBRequest {
    fn from(api: ProductCreate) -> Self {
        Self {
            name: api.name,
            sku: api.sku,
            description: api.description,
            category_id: api.category_id,
            subcategory_id: api.subcategory_id,
            supplier_id: api.supplier_id,
            origin_id: api.origin_id,
            margin_level_id: api.margin_level_id,
            unit_id: api.unit_id,
            cost_price: api.cost_price.unwrap_or(Decimal::ZERO),
            selling_price: api.selling_price,
            is_active: api.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdateDBRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<ProductCategoryId>,
    /// `Some(None)` clears the subcategory
    pub subcategory_id: Option<Option<ProductSubcategoryId>>,
    pub supplier_id: Option<SupplierId>,
    pub origin_id: Option<OriginId>,
    /// `Some(None)` clears the margin level
    pub margin_level_id: Option<Option<MarginLevelId>>,
    pub unit_id: Option<UnitId>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl From<ProductUpdate> for ProductUpdateDBRequest {
    fn from(api: ProductUpdate) -> Self {
        Self {
            name: api.name,
            sku: api.sku,
            description: api.description,
            category_id: api.category_id,
            subcategory_id: api.subcategory_id,
            supplier_id: api.supplier_id,
            origin_id: api.origin_id,
            margin_level_id: api.margin_level_id,
            unit_id: api.unit_id,
            cost_price: api.cost_price,
            selling_price: api.selling_price,
            is_active: api.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductDBResponse {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub category_id: ProductCategoryId,
    pub subcategory_id: Option<ProductSubcategoryId>,
    pub supplier_id: Option<SupplierId>,
    pub origin_id: Option<OriginId>,
    pub margin_level_id: Option<MarginLevelId>,
    pub unit_id: Option<UnitId>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
