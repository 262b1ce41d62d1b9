//! Database repository for recipe categories.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::recipes::{RecipeCategoryCreateDBRequest, RecipeCategoryDBResponse, RecipeCategoryUpdateDBRequest},
};
use crate::types::{RecipeCategoryId, RecipeId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const RECIPE_CATEGORY_FILTERS: &[FilterField] = &[FilterField::new("name", "name", FilterKind::Contains)];

pub struct RecipeCategories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> RecipeCategories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Categories linked to a recipe, by name.
    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn list_for_recipe(&mut self, recipe_id: RecipeId) -> Result<Vec<RecipeCategoryDBResponse>> {
        let categories = sqlx::query_as::<_, RecipeCategoryDBResponse>(
            r#"
            SELECT c.* FROM recipe_categories c
            JOIN recipe_category_links l ON l.category_id = c.id
            WHERE l.recipe_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(categories)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for RecipeCategories<'c> {
    type CreateRequest = RecipeCategoryCreateDBRequest;
    type UpdateRequest = RecipeCategoryUpdateDBRequest;
    type Response = RecipeCategoryDBResponse;
    type Id = RecipeCategoryId;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, RecipeCategoryDBResponse>(
            "INSERT INTO recipe_categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(category)
    }

    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let category = sqlx::query_as::<_, RecipeCategoryDBResponse>("SELECT * FROM recipe_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(category)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM recipe_categories WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipe_categories WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipe_categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, RecipeCategoryDBResponse>(
            r#"
            UPDATE recipe_categories SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
