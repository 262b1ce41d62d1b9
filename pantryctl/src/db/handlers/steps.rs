//! Database repository for recipe steps.

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        filters::{FilterField, FilterKind, ListFilter},
        repository::Repository,
    },
    models::recipes::{StepCreateDBRequest, StepDBResponse, StepUpdateDBRequest},
};
use crate::types::{RecipeId, StepId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

pub const STEP_FILTERS: &[FilterField] = &[FilterField::new("recipe_id", "recipe_id", FilterKind::Uuid)];

pub struct Steps<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Steps<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn list_for_recipe(&mut self, recipe_id: RecipeId) -> Result<Vec<StepDBResponse>> {
        let steps = sqlx::query_as::<_, StepDBResponse>("SELECT * FROM steps WHERE recipe_id = $1 ORDER BY position")
            .bind(recipe_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(steps)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Steps<'c> {
    type CreateRequest = StepCreateDBRequest;
    type UpdateRequest = StepUpdateDBRequest;
    type Response = StepDBResponse;
    type Id = StepId;

    #[instrument(skip(self, request), fields(recipe_id = %abbrev_uuid(&request.recipe_id), position = request.position), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let step = sqlx::query_as::<_, StepDBResponse>(
            r#"
            INSERT INTO steps (recipe_id, position, instruction, duration_minutes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.recipe_id)
        .bind(request.position)
        .bind(&request.instruction)
        .bind(request.duration_minutes)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(step)
    }

    #[instrument(skip(self), fields(step_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let step = sqlx::query_as::<_, StepDBResponse>("SELECT * FROM steps WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(step)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &ListFilter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM steps WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);
        Ok(query.build_query_as().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM steps WHERE 1=1");
        filter.push_conditions(&mut query);
        Ok(query.build_query_scalar().fetch_one(&mut *self.db).await?)
    }

    #[instrument(skip(self), fields(step_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM steps WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(step_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, StepDBResponse>(
            r#"
            UPDATE steps SET
                position = COALESCE($2, position),
                instruction = COALESCE($3, instruction),
                duration_minutes = COALESCE($4, duration_minutes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.position)
        .bind(&request.instruction)
        .bind(request.duration_minutes)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Ingredients, Recipes};
    use crate::db::models::recipes::{IngredientCreateDBRequest, RecipeCreateDBRequest};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn create_recipe(conn: &mut PgConnection) -> RecipeId {
        Recipes::new(conn)
            .create(&RecipeCreateDBRequest {
                name: "Shakshuka".to_string(),
                description: None,
                servings: 2,
                prep_time_minutes: None,
                cook_time_minutes: Some(25),
                is_published: true,
                created_by: None,
            })
            .await
            .unwrap()
            .id
    }

    fn step(recipe_id: RecipeId, position: i32, instruction: &str) -> StepCreateDBRequest {
        StepCreateDBRequest {
            recipe_id,
            position,
            instruction: instruction.to_string(),
            duration_minutes: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_steps_ordered_and_positions_unique(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let recipe_id = create_recipe(&mut conn).await;
        let mut repo = Steps::new(&mut conn);

        repo.create(&step(recipe_id, 2, "Crack the eggs")).await.unwrap();
        repo.create(&step(recipe_id, 1, "Simmer the sauce")).await.unwrap();

        let steps = repo.list_for_recipe(recipe_id).await.unwrap();
        let positions: Vec<i32> = steps.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![1, 2]);

        match repo.create(&step(recipe_id, 1, "Again")).await {
            Err(DbError::UniqueViolation { constraint, .. }) => {
                assert_eq!(constraint.as_deref(), Some("steps_position_unique"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_ingredients_follow_recipe_deletion(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let recipe_id = create_recipe(&mut conn).await;

        let ingredient = Ingredients::new(&mut conn)
            .create(&IngredientCreateDBRequest {
                recipe_id,
                product_id: None,
                unit_id: None,
                name: "Eggs".to_string(),
                quantity: Decimal::new(4, 0),
                notes: None,
                position: 1,
            })
            .await
            .unwrap();

        assert!(Recipes::new(&mut conn).delete(recipe_id).await.unwrap());
        assert!(Ingredients::new(&mut conn).get_by_id(ingredient.id).await.unwrap().is_none());
    }
}
