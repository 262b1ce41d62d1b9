//! Database repository for recipe ingredients.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::recipes::{IngredientCreateDBRequest, IngredientDBResponse, IngredientUpdateDBRequest},
};
use crate::types::{IngredientId, RecipeId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const INGREDIENT_FILTERS: &[FilterField] = &[
    FilterField::new("recipe_id", "recipe_id", FilterKind::Uuid),
    FilterField::new("product_id", "product_id", FilterKind::Uuid),
    FilterField::new("name", "name", FilterKind::Contains),
];

pub struct Ingredients<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Ingredients<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn list_for_recipe(&mut self, recipe_id: RecipeId) -> Result<Vec<IngredientDBResponse>> {
        let ingredients = sqlx::query_as::<_, IngredientDBResponse>(
            "SELECT * FROM ingredients WHERE recipe_id = $1 ORDER BY position, created_at, id",
        )
        .bind(recipe_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(ingredients)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Ingredients<'c> {
    type CreateRequest = IngredientCreateDBRequest;
    type UpdateRequest = IngredientUpdateDBRequest;
    type Response = IngredientDBResponse;
    type Id = IngredientId;

    #[instrument(skip(self, request), fields(recipe_id = %abbrev_uuid(&request.recipe_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let ingredient = sqlx::query_as::<_, IngredientDBResponse>(
            r#"
            INSERT INTO ingredients (recipe_id, product_id, unit_id, name, quantity, notes, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request.recipe_id)
        .bind(request.product_id)
        .bind(request.unit_id)
        .bind(&request.name)
        .bind(request.quantity)
        .bind(&request.notes)
        .bind(request.position)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(ingredient)
    }

    #[instrument(skip(self), fields(ingredient_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let ingredient = sqlx::query_as::<_, IngredientDBResponse>("SELECT * FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(ingredient)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM ingredients WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ingredients WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(ingredient_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(ingredient_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, IngredientDBResponse>(
            r#"
            UPDATE ingredients SET
                product_id = COALESCE($2, product_id),
                unit_id = COALESCE($3, unit_id),
                name = COALESCE($4, name),
                quantity = COALESCE($5, quantity),
                notes = COALESCE($6, notes),
                position = COALESCE($7, position)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.product_id)
        .bind(request.unit_id)
        .bind(&request.name)
        .bind(request.quantity)
        .bind(&request.notes)
        .bind(request.position)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
