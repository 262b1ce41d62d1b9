use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            products::{ApplyMarginQuery, ApplyMarginResponse, MarginLevelCreate, MarginLevelResponse, MarginLevelUpdate},
            response::{ApiResponse, Deleted},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{MarginLevels, Repository, margin_levels::MARGIN_LEVEL_FILTERS},
        models::products::{MarginLevelCreateDBRequest, MarginLevelUpdateDBRequest},
    },
    errors::{Error, Result},
    pricing,
    types::MarginLevelId,
};

#[tracing::instrument(skip_all)]
pub async fn list_margins(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<MarginLevelResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut MarginLevels::new(&mut conn), &query, MARGIN_LEVEL_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(MarginLevelResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_margins(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<MarginLevelResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let levels = crud::list_all(&mut MarginLevels::new(&mut conn), &query, MARGIN_LEVEL_FILTERS).await?;
    Ok(ApiResponse::ok(levels.into_iter().map(MarginLevelResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_margin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Path(id): Path<MarginLevelId>,
) -> Result<ApiResponse<MarginLevelResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let level = MarginLevels::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(level, "Margin level", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_margin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Create>,
    Json(body): Json<MarginLevelCreate>,
) -> Result<ApiResponse<MarginLevelResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let level = MarginLevels::new(&mut conn).create(&MarginLevelCreateDBRequest::from(body)).await?;
    Ok(ApiResponse::created(level.into()))
}

/// Update a margin level. A new percentage re-prices every product using it.
#[tracing::instrument(skip_all)]
pub async fn update_margin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Update>,
    Path(id): Path<MarginLevelId>,
    Json(body): Json<MarginLevelUpdate>,
) -> Result<ApiResponse<MarginLevelResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let level = MarginLevels::new(&mut conn).update(id, &MarginLevelUpdateDBRequest::from(body)).await?;
    Ok(ApiResponse::ok(level.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_margin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Delete>,
    Path(id): Path<MarginLevelId>,
) -> Result<ApiResponse<Deleted<MarginLevelId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = MarginLevels::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Margin level", id)?))
}

/// Price a cost with a margin level without touching any product.
#[tracing::instrument(skip_all)]
pub async fn apply_margin(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Products, operation::Read>,
    Path(id): Path<MarginLevelId>,
    Query(query): Query<ApplyMarginQuery>,
) -> Result<ApiResponse<ApplyMarginResponse>> {
    if query.cost.is_sign_negative() {
        return Err(Error::BadRequest {
            message: "cost must not be negative".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let percentage = crud::found(MarginLevels::new(&mut conn).percentage(id).await?, "Margin level", id)?;
    let price = pricing::apply_margin(query.cost, percentage).ok_or_else(|| Error::BadRequest {
        message: "cost is too large to price".to_string(),
    })?;

    Ok(ApiResponse::ok(ApplyMarginResponse {
        cost: query.cost,
        percentage,
        price,
    }))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            products::{ApplyMarginResponse, MarginLevelResponse},
            response::ApiResponse,
            users::Role,
        },
        test_utils::{create_test_server, login_as},
    };
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::PgPool;

    const MARGINS: &str = "/api/v1/admin/products/margins";

    #[sqlx::test]
    #[test_log::test]
    async fn test_apply_margin(pool: PgPool) {
        let (_, manager) = login_as(&pool, Role::Manager).await;
        let (_, viewer) = login_as(&pool, Role::Viewer).await;
        let server = create_test_server(pool);

        let level: ApiResponse<MarginLevelResponse> = server
            .post(&format!("{MARGINS}/save"))
            .add_header("authorization", manager.as_str())
            .json(&json!({"name": "Premium", "percentage": "33.5"}))
            .await
            .json();

        let response = server
            .get(&format!("{MARGINS}/{}/apply?cost=7.99", level.data.id))
            .add_header("authorization", viewer.as_str())
            .await;
        response.assert_status_ok();
        let applied: ApiResponse<ApplyMarginResponse> = response.json();
        // 7.99 * 1.335 = 10.66665
        assert_eq!(applied.data.price, "10.67".parse::<Decimal>().unwrap());
        assert_eq!(applied.data.percentage, "33.5".parse::<Decimal>().unwrap());

        server
            .get(&format!("{MARGINS}/{}/apply?cost=1", uuid::Uuid::new_v4()))
            .add_header("authorization", viewer.as_str())
            .await
            .assert_status_not_found();

        server
            .get(&format!("{MARGINS}/{}/apply?cost=-1", level.data.id))
            .add_header("authorization", viewer.as_str())
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .get(&format!("{MARGINS}/{}/apply?cost={}", level.data.id, Decimal::MAX))
            .add_header("authorization", viewer.as_str())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["httpStatusCode"], 400);
        assert_eq!(body["data"]["error"], "ValidationError");
        assert_eq!(body["data"]["message"], "cost is too large to price");
    }
}
