//! API request/response models for products and their reference data.

use crate::api::models::recipes::require_name;
use crate::db::models::products::{
    MarginLevelDBResponse, OriginDBResponse, ProductCategoryDBResponse, ProductDBResponse, ProductSubcategoryDBResponse,
    SupplierDBResponse,
};
use crate::errors::Error;
use crate::types::{MarginLevelId, OriginId, ProductCategoryId, ProductId, ProductSubcategoryId, SupplierId, UnitId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn require_non_negative(field: &str, value: Option<Decimal>) -> Result<(), Error> {
    if value.is_some_and(|v| v < Decimal::ZERO) {
        return Err(Error::BadRequest {
            message: format!("{field} must not be negative"),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCategoryCreate {
    pub name: String,
    pub description: Option<String>,
}

impl ProductCategoryCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCategoryResponse {
    pub id: ProductCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductCategoryDBResponse> for ProductCategoryResponse {
    fn from(db: ProductCategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSubcategoryCreate {
    pub category_id: ProductCategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl ProductSubcategoryCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSubcategoryUpdate {
    pub category_id: Option<ProductCategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSubcategoryResponse {
    pub id: ProductSubcategoryId,
    pub category_id: ProductCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductSubcategoryDBResponse> for ProductSubcategoryResponse {
    fn from(db: ProductSubcategoryDBResponse) -> Self {
        Self {
            id: db.id,
            category_id: db.category_id,
            name: db.name,
            description: db.description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierCreate {
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl SupplierCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierResponse {
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

impl From<SupplierDBResponse> for SupplierResponse {
    fn from(db: SupplierDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            contact_name: db.contact_name,
            email: db.email,
            phone: db.phone,
            address: db.address,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginCreate {
    pub name: String,
    pub code: Option<String>,
}

impl OriginCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginResponse {
    pub id: OriginId,
    pub name: String,
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OriginDBResponse> for OriginResponse {
    fn from(db: OriginDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            code: db.code,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginLevelCreate {
    pub name: String,
    pub percentage: Decimal,
}

impl MarginLevelCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)?;
        require_non_negative("percentage", Some(self.percentage))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginLevelUpdate {
    pub name: Option<String>,
    pub percentage: Option<Decimal>,
}

impl MarginLevelUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        require_non_negative("percentage", self.percentage)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginLevelResponse {
    pub id: MarginLevelId,
    pub name: String,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MarginLevelDBResponse> for MarginLevelResponse {
    fn from(db: MarginLevelDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            percentage: db.percentage,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query for `GET /margins/{id}/apply`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyMarginQuery {
    pub cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyMarginResponse {
    pub cost: Decimal,
    pub percentage: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub category_id: ProductCategoryId,
    pub subcategory_id: Option<ProductSubcategoryId>,
    pub supplier_id: Option<SupplierId>,
    pub origin_id: Option<OriginId>,
    pub margin_level_id: Option<MarginLevelId>,
    pub unit_id: Option<UnitId>,
    pub cost_price: Option<Decimal>,
    /// Ignored when a margin level is set
    pub selling_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl ProductCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)?;
        require_name("sku", &self.sku)?;
        require_non_negative("cost_price", self.cost_price)?;
        require_non_negative("selling_price", self.selling_price)
    }
}

/// Partial product update.
///
/// `subcategory_id` and `margin_level_id` tell an absent key (keep) apart from
/// an explicit `null` (clear). Clearing the margin level returns the product to
/// explicit pricing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<ProductCategoryId>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub subcategory_id: Option<Option<ProductSubcategoryId>>,
    pub supplier_id: Option<SupplierId>,
    pub origin_id: Option<OriginId>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub margin_level_id: Option<Option<MarginLevelId>>,
    pub unit_id: Option<UnitId>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        require_non_negative("cost_price", self.cost_price)?;
        require_non_negative("selling_price", self.selling_price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
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

impl From<ProductDBResponse> for ProductResponse {
    fn from(db: ProductDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            sku: db.sku,
            description: db.description,
            category_id: db.category_id,
            subcategory_id: db.subcategory_id,
            supplier_id: db.supplier_id,
            origin_id: db.origin_id,
            margin_level_id: db.margin_level_id,
            unit_id: db.unit_id,
            cost_price: db.cost_price,
            selling_price: db.selling_price,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
