//! Database models for units of measure and volume conversions.

use crate::api::models::units::{UnitCreate, UnitKind, UnitUpdate, VolumeConversionCreate, VolumeConversionUpdate};
use crate::types::{UnitId, VolumeConversionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct UnitCreateDBRequest {
    pub name: String,
    pub abbreviation: String,
    pub kind: UnitKind,
}

impl From<UnitCreate> for UnitCreateDBRequest {
    fn from(api: UnitCreate) -> Self {
        Self {
            name: api.name,
            abbreviation: api.abbreviation,
            kind: api.kind,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnitUpdateDBRequest {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub kind: Option<UnitKind>,
}

impl From<UnitUpdate> for UnitUpdateDBRequest {
    fn from(api: UnitUpdate) -> Self {
        Self {
            name: api.name,
            abbreviation: api.abbreviation,
            kind: api.kind,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UnitDBResponse {
    pub id: UnitId,
    pub name: String,
    pub abbreviation: String,
    pub kind: UnitKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VolumeConversionCreateDBRequest {
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub factor: Decimal,
}

impl From<VolumeConversionCreate> for VolumeConversionCreateDBRequest {
    fn from(api: VolumeConversionCreate) -> Self {
        Self {
            from_unit_id: api.from_unit_id,
            to_unit_id: api.to_unit_id,
            factor: api.factor,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VolumeConversionUpdateDBRequest {
    pub factor: Option<Decimal>,
}

impl From<VolumeConversionUpdate> for VolumeConversionUpdateDBRequest {
    fn from(api: VolumeConversionUpdate) -> Self {
        Self { factor: api.factor }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VolumeConversionDBResponse {
    pub id: VolumeConversionId,
    pub from_unit_id: UnitId,
    pub to_unit_id: UnitId,
    pub factor: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
