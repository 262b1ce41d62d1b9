//! Database repository for recipes and their category links.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::recipes::{RecipeCreateDBRequest, RecipeDBResponse, RecipeUpdateDBRequest},
};
use crate::types::{RecipeCategoryId, RecipeId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const RECIPE_FILTERS: &[FilterField] = &[
    FilterField::new("name", "name", FilterKind::Contains),
    FilterField::new("is_published", "is_published", FilterKind::Bool),
    FilterField::new("created_by", "created_by", FilterKind::Uuid),
    FilterField::new(
        "category_id",
        "ARRAY(SELECT l.category_id FROM recipe_category_links l WHERE l.recipe_id = recipes.id)",
        FilterKind::UuidMember,
    ),
];

pub struct Recipes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Recipes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Link a category to a recipe. Linking twice is a no-op.
    ///
    /// Fails with `NotFound` when either side does not exist.
    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&recipe_id), category_id = %abbrev_uuid(&category_id)), err)]
    pub async fn link_category(&mut self, recipe_id: RecipeId, category_id: RecipeCategoryId) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO recipe_category_links (recipe_id, category_id)
            SELECT r.id, c.id FROM recipes r, recipe_categories c
            WHERE r.id = $1 AND c.id = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(recipe_id)
        .bind(category_id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 && !self.is_linked(recipe_id, category_id).await? {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Remove a category link, returning whether one existed.
    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&recipe_id), category_id = %abbrev_uuid(&category_id)), err)]
    pub async fn unlink_category(&mut self, recipe_id: RecipeId, category_id: RecipeCategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipe_category_links WHERE recipe_id = $1 AND category_id = $2")
            .bind(recipe_id)
            .bind(category_id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_linked(&mut self, recipe_id: RecipeId, category_id: RecipeCategoryId) -> Result<bool> {
        let linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM recipe_category_links WHERE recipe_id = $1 AND category_id = $2)",
        )
        .bind(recipe_id)
        .bind(category_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(linked)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Recipes<'c> {
    type CreateRequest = RecipeCreateDBRequest;
    type UpdateRequest = RecipeUpdateDBRequest;
    type Response = RecipeDBResponse;
    type Id = RecipeId;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let recipe = sqlx::query_as::<_, RecipeDBResponse>(
            r#"
            INSERT INTO recipes (name, description, servings, prep_time_minutes, cook_time_minutes, is_published, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.servings)
        .bind(request.prep_time_minutes)
        .bind(request.cook_time_minutes)
        .bind(request.is_published)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(recipe)
    }

    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let recipe = sqlx::query_as::<_, RecipeDBResponse>("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(recipe)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM recipes WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(recipe_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, RecipeDBResponse>(
            r#"
            UPDATE recipes SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                servings = COALESCE($4, servings),
                prep_time_minutes = COALESCE($5, prep_time_minutes),
                cook_time_minutes = COALESCE($6, cook_time_minutes),
                is_published = COALESCE($7, is_published)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.servings)
        .bind(request.prep_time_minutes)
        .bind(request.cook_time_minutes)
        .bind(request.is_published)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
