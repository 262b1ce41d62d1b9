//! API request/response models for units of measure and volume conversions.

use crate::api::models::recipes::require_name;
use crate::db::models::units::{UnitDBResponse, VolumeConversionDBResponse};
use crate::errors::Error;
use crate::types::{UnitId, VolumeConversionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a unit measures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitKind {
    Volume,
    Weight,
    Count,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCreate {
    pub name: String,
    pub abbreviation: String,
    pub kind: UnitKind,
}

impl UnitCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)?;
        require_name("abbreviation", &self.abbreviation)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitUpdate {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub kind: Option<UnitKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitResponse {
    pub id: UnitId,
    pub name: String,
    pub abbreviation: String,
    pub kind: UnitKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UnitDBResponse> for UnitResponse {
    fn from(db: UnitDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            abbreviation: db.abbreviation,
            kind: db.kind,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

fn require_positive_factor(factor: Decimal) -> Result<(), Error> {
    if factor <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "factor must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// `1 from_unit = factor to_unit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConversionCreate {
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub factor: Decimal,
}

impl VolumeConversionCreate {
    pub fn validate(&self) -> Result<(), Error> {
        if self.from_unit_id == self.to_unit_id {
            return Err(Error::BadRequest {
                message: "from_unit_id and to_unit_id must differ".to_string(),
            });
        }
        require_positive_factor(self.factor)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeConversionUpdate {
    pub factor: Option<Decimal>,
}

impl VolumeConversionUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        match self.factor {
            Some(factor) => require_positive_factor(factor),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConversionResponse {
    pub id: VolumeConversionId,
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub factor: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VolumeConversionDBResponse> for VolumeConversionResponse {
    fn from(db: VolumeConversionDBResponse) -> Self {
        Self {
            id: db.id,
            from_unit_id: db.from_unit_id,
            to_unit_id: db.to_unit_id,
            factor: db.factor,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub quantity: Decimal,
    pub factor: Decimal,
}
