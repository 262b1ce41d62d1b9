//! API request/response models for recipes, recipe categories, ingredients and steps.

use crate::db::models::recipes::{IngredientDBResponse, RecipeCategoryDBResponse, RecipeDBResponse, StepDBResponse};
use crate::errors::Error;
use crate::types::{IngredientId, ProductId, RecipeCategoryId, RecipeId, StepId, UnitId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub(crate) fn require_name(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(())
}

fn require_positive_or_absent(field: &str, value: Option<i32>) -> Result<(), Error> {
    match value {
        Some(v) if v <= 0 => Err(Error::BadRequest {
            message: format!("{field} must be greater than zero"),
        }),
        _ => Ok(()),
    }
}

fn require_non_negative_or_absent(field: &str, value: Option<i32>) -> Result<(), Error> {
    match value {
        Some(v) if v < 0 => Err(Error::BadRequest {
            message: format!("{field} must not be negative"),
        }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCategoryCreate {
    pub name: String,
    pub description: Option<String>,
}

impl RecipeCategoryCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeCategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCategoryResponse {
    pub id: RecipeCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RecipeCategoryDBResponse> for RecipeCategoryResponse {
    fn from(db: RecipeCategoryDBResponse) -> Self {
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
pub struct RecipeCreate {
    pub name: String,
    pub description: Option<String>,
    pub servings: Option<i32>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub is_published: Option<bool>,
}

impl RecipeCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)?;
        require_positive_or_absent("servings", self.servings)?;
        require_non_negative_or_absent("prep_time_minutes", self.prep_time_minutes)?;
        require_non_negative_or_absent("cook_time_minutes", self.cook_time_minutes)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub servings: Option<i32>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub is_published: Option<bool>,
}

impl RecipeUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            require_name("name", name)?;
        }
        require_positive_or_absent("servings", self.servings)?;
        require_non_negative_or_absent("prep_time_minutes", self.prep_time_minutes)?;
        require_non_negative_or_absent("cook_time_minutes", self.cook_time_minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeResponse {
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
    /// Only included on the detail endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<RecipeCategoryResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<IngredientResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepResponse>>,
}

impl From<RecipeDBResponse> for RecipeResponse {
    fn from(db: RecipeDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            servings: db.servings,
            prep_time_minutes: db.prep_time_minutes,
            cook_time_minutes: db.cook_time_minutes,
            is_published: db.is_published,
            created_by: db.created_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
            categories: None,
            ingredients: None,
            steps: None,
        }
    }
}

impl RecipeResponse {
    /// Attach the recipe's categories, ingredients and steps
    pub fn with_details(
        mut self,
        categories: Vec<RecipeCategoryResponse>,
        ingredients: Vec<IngredientResponse>,
        steps: Vec<StepResponse>,
    ) -> Self {
        self.categories = Some(categories);
        self.ingredients = Some(ingredients);
        self.steps = Some(steps);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub recipe_id: RecipeId,
    pub product_id: Option<ProductId>,
    pub unit_id: Option<UnitId>,
    pub name: String,
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub position: Option<i32>,
}

impl IngredientCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("name", &self.name)?;
        if self.quantity <= Decimal::ZERO {
            return Err(Error::BadRequest {
                message: "quantity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientUpdate {
    pub product_id: Option<ProductId>,
    pub unit_id: Option<UnitId>,
    pub name: Option<String>,
    pub quantity: Option<Decimal>,
    pub notes: Option<String>,
    pub position: Option<i32>,
}

impl IngredientUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        if self.quantity.is_some_and(|q| q <= Decimal::ZERO) {
            return Err(Error::BadRequest {
                message: "quantity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientResponse {
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

impl From<IngredientDBResponse> for IngredientResponse {
    fn from(db: IngredientDBResponse) -> Self {
        Self {
            id: db.id,
            recipe_id: db.recipe_id,
            product_id: db.product_id,
            unit_id: db.unit_id,
            name: db.name,
            quantity: db.quantity,
            notes: db.notes,
            position: db.position,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCreate {
    pub recipe_id: RecipeId,
    pub position: i32,
    pub instruction: String,
    pub duration_minutes: Option<i32>,
}

impl StepCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name("instruction", &self.instruction)?;
        require_positive_or_absent("position", Some(self.position))?;
        require_non_negative_or_absent("duration_minutes", self.duration_minutes)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepUpdate {
    pub position: Option<i32>,
    pub instruction: Option<String>,
    pub duration_minutes: Option<i32>,
}

impl StepUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        require_positive_or_absent("position", self.position)?;
        require_non_negative_or_absent("duration_minutes", self.duration_minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResponse {
    pub id: StepId,
    pub recipe_id: RecipeId,
    pub position: i32,
    pub instruction: String,
    pub duration_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StepDBResponse> for StepResponse {
    fn from(db: StepDBResponse) -> Self {
        Self {
            id: db.id,
            recipe_id: db.recipe_id,
            position: db.position,
            instruction: db.instruction,
            duration_minutes: db.duration_minutes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Body of a category link/unlink response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCategoryLink {
    pub recipe_id: RecipeId,
    pub category_id: RecipeCategoryId,
    pub linked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_validation() {
        let mut recipe = RecipeCreate {
            name: "Focaccia".to_string(),
            description: None,
            servings: Some(8),
            prep_time_minutes: Some(20),
            cook_time_minutes: None,
            is_published: None,
        };
        assert!(recipe.validate().is_ok());

        recipe.servings = Some(0);
        assert!(recipe.validate().is_err());

        recipe.servings = None;
        recipe.name = "  ".to_string();
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn test_ingredient_quantity_must_be_positive() {
        let update = IngredientUpdate {
            quantity: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
