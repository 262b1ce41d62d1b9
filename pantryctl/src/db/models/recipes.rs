//! Database models for recipes, recipe categories, ingredients and steps.

use crate::api::models::recipes::{
    IngredientCreate, IngredientUpdate, RecipeCategoryCreate, RecipeCategoryUpdate, RecipeCreate, RecipeUpdate, StepCreate,
    StepUpdate,
};
use crate::types::{IngredientId, ProductId, RecipeCategoryId, RecipeId, StepId, UnitId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct RecipeCategoryCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
}

impl From<RecipeCategoryCreate> for RecipeCategoryCreateDBRequest {
    fn from(api: RecipeCategoryCreate) -> Self {
        Self {
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeCategoryUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<RecipeCategoryUpdate> for RecipeCategoryUpdateDBRequest {
    fn from(api: RecipeCategoryUpdate) -> Self {
        Self {
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeCategoryDBResponse {
    pub id: RecipeCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database request for creating a recipe
#[derive(Debug, Clone)]
pub struct RecipeCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub servings: i32,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub is_published: bool,
    pub created_by: Option<UserId>,
}

impl RecipeCreateDBRequest {
    pub fn new(api: RecipeCreate, created_by: UserId) -> Self {
        Self {
            name: api.name,
            description: api.description,
            servings: api.servings.unwrap_or(1),
            prep_time_minutes: api.prep_time_minutes,
            cook_time_minutes: api.cook_time_minutes,
            is_published: api.is_published.unwrap_or(false),
            created_by: Some(created_by),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub servings: Option<i32>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub is_published: Option<bool>,
}

impl From<RecipeUpdate> for RecipeUpdateDBRequest {
    fn from(api: RecipeUpdate) -> Self {
        Self {
            name: api.name,
            description: api.description,
            servings: api.servings,
            prep_time_minutes: api.prep_time_minutes,
            cook_time_minutes: api.cook_time_minutes,
            is_published: api.is_published,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeDBResponse {
    pub id: RecipeId,
    pub name: String,
    pub description: Option<String>,
    pub servings: i32,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub is_published: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IngredientCreateDBRequest {
    pub recipe_id: RecipeId,
    pub product_id: Option<ProductId>,
    pub unit_id: Option<UnitId>,
    pub name: String,
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub position: i32,
}

impl From<IngredientCreate> for IngredientCreateDBRequest {
    fn from(api: IngredientCreate) -> Self {
        Self {
            recipe_id: api.recipe_id,
            product_id: api.product_id,
            unit_id: api.unit_id,
            name: api.name,
            quantity: api.quantity,
            notes: api.notes,
            position: api.position.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngredientUpdateDBRequest {
    pub product_id: Option<ProductId>,
    pub unit_id: Option<UnitId>,
    pub name: Option<String>,
    pub quantity: Option<Decimal>,
    pub notes: Option<String>,
    pub position: Option<i32>,
}

impl From<IngredientUpdate> for IngredientUpdateDBRequest {
    fn from(api: IngredientUpdate) -> Self {
        Self {
            product_id: api.product_id,
            unit_id: api.unit_id,
            name: api.name,
            quantity: api.quantity,
            notes: api.notes,
            position: api.position,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct IngredientDBResponse {
    pub id: IngredientId,
    pub recipe_id: RecipeId,
    pub product_id: Option<ProductId>,
    pub unit_id: Option<UnitId>,
    pub name: String,
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StepCreateDBRequest {
    pub recipe_id: RecipeId,
    pub position: i32,
    pub instruction: String,
    pub duration_minutes: Option<i32>,
}

impl From<StepCreate> for StepCreateDBRequest {
    fn from(api: StepCreate) -> Self {
        Self {
            recipe_id: api.recipe_id,
            position: api.position,
            instruction: api.instruction,
            duration_minutes: api.duration_minutes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StepUpdateDBRequest {
    pub position: Option<i32>,
    pub instruction: Option<String>,
    pub duration_minutes: Option<i32>,
}

impl From<StepUpdate> for StepUpdateDBRequest {
    fn from(api: StepUpdate) -> Self {
        Self {
            position: api.position,
            instruction: api.instruction,
            duration_minutes: api.duration_minutes,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StepDBResponse {
    pub id: StepId,
    pub recipe_id: RecipeId,
    pub position: i32,
    pub instruction: String,
    pub duration_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
