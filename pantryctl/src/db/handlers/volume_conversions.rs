//! Database repository for volume conversions between units.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::units::{VolumeConversionCreateDBRequest, VolumeConversionDBResponse, VolumeConversionUpdateDBRequest},
};
use crate::types::{UnitId, VolumeConversionId, abbrev_uuid};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

/// Decimal places kept for factors derived from an inverse conversion.
const FACTOR_SCALE: u32 = 10;

pub const VOLUME_CONVERSION_FILTERS: &[FilterField] = &[
    FilterField::new("from_unit_id", "from_unit_id", FilterKind::Uuid),
    FilterField::new("to_unit_id", "to_unit_id", FilterKind::Uuid),
];

/// Factor for the opposite direction of a stored conversion.
pub fn invert_factor(factor: Decimal) -> Option<Decimal> {
    Decimal::ONE
        .checked_div(factor)
        .map(|inverse| inverse.round_dp_with_strategy(FACTOR_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

pub struct VolumeConversions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> VolumeConversions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Multiplier taking a quantity in `from` to a quantity in `to`.
    ///
    /// Tries the identity, then a stored conversion, then the inverse of the
    /// opposite conversion. `None` when no path exists.
    #[instrument(skip(self), fields(from = %abbrev_uuid(&from), to = %abbrev_uuid(&to)), err)]
    pub async fn find_factor(&mut self, from: UnitId, to: UnitId) -> Result<Option<Decimal>> {
        if from == to {
            return Ok(Some(Decimal::ONE));
        }

        let direct = sqlx::query_scalar::<_, Decimal>(
            "SELECT factor FROM volume_conversions WHERE from_unit_id = $1 AND to_unit_id = $2",
        )
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *self.db)
        .await?;
        if direct.is_some() {
            return Ok(direct);
        }

        let inverse = sqlx::query_scalar::<_, Decimal>(
            "SELECT factor FROM volume_conversions WHERE from_unit_id = $1 AND to_unit_id = $2",
        )
        .bind(to)
        .bind(from)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(inverse.and_then(invert_factor))
    }
}

#[async_trait::async_trait]
impl<'c> Repository for VolumeConversions<'c> {
    type CreateRequest = VolumeConversionCreateDBRequest;
    type UpdateRequest = VolumeConversionUpdateDBRequest;
    type Response = VolumeConversionDBResponse;
    type Id = VolumeConversionId;

    #[instrument(skip(self, request), fields(from = %abbrev_uuid(&request.from_unit_id), to = %abbrev_uuid(&request.to_unit_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let conversion = sqlx::query_as::<_, VolumeConversionDBResponse>(
            "INSERT INTO volume_conversions (from_unit_id, to_unit_id, factor) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(request.from_unit_id)
        .bind(request.to_unit_id)
        .bind(request.factor)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(conversion)
    }

    #[instrument(skip(self), fields(conversion_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let conversion = sqlx::query_as::<_, VolumeConversionDBResponse>("SELECT * FROM volume_conversions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(conversion)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM volume_conversions WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM volume_conversions WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(conversion_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM volume_conversions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(conversion_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, VolumeConversionDBResponse>(
            "UPDATE volume_conversions SET factor = COALESCE($2, factor) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(request.factor)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
