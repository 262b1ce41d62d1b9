use axum::extract::State;

use crate::{
    AppState,
    api::{
        extract::{Json, Path, Query},
        handlers::crud,
        models::{
            pagination::{ListQuery, PaginatedResponse},
            response::{ApiResponse, Deleted},
            units::{ConvertRequest, ConvertResponse, VolumeConversionCreate, VolumeConversionResponse, VolumeConversionUpdate},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Repository, VolumeConversions, volume_conversions::VOLUME_CONVERSION_FILTERS},
        models::units::{VolumeConversionCreateDBRequest, VolumeConversionUpdateDBRequest},
    },
    errors::{Error, Result},
    types::VolumeConversionId,
};

#[tracing::instrument(skip_all)]
pub async fn list_conversions(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<PaginatedResponse<VolumeConversionResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let page = crud::list_page(&mut VolumeConversions::new(&mut conn), &query, VOLUME_CONVERSION_FILTERS).await?;
    Ok(ApiResponse::ok(page.map(VolumeConversionResponse::from)))
}

#[tracing::instrument(skip_all)]
pub async fn list_all_conversions(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Read>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<VolumeConversionResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let conversions = crud::list_all(&mut VolumeConversions::new(&mut conn), &query, VOLUME_CONVERSION_FILTERS).await?;
    Ok(ApiResponse::ok(conversions.into_iter().map(VolumeConversionResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn get_conversion(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Read>,
    Path(id): Path<VolumeConversionId>,
) -> Result<ApiResponse<VolumeConversionResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let conversion = VolumeConversions::new(&mut conn).get_by_id(id).await?;
    Ok(ApiResponse::ok(crud::found(conversion, "Volume conversion", id)?.into()))
}

#[tracing::instrument(skip_all)]
pub async fn create_conversion(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Create>,
    Json(body): Json<VolumeConversionCreate>,
) -> Result<ApiResponse<VolumeConversionResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let conversion = VolumeConversions::new(&mut conn)
        .create(&VolumeConversionCreateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::created(conversion.into()))
}

#[tracing::instrument(skip_all)]
pub async fn update_conversion(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Update>,
    Path(id): Path<VolumeConversionId>,
    Json(body): Json<VolumeConversionUpdate>,
) -> Result<ApiResponse<VolumeConversionResponse>> {
    body.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let conversion = VolumeConversions::new(&mut conn)
        .update(id, &VolumeConversionUpdateDBRequest::from(body))
        .await?;
    Ok(ApiResponse::ok(conversion.into()))
}

#[tracing::instrument(skip_all)]
pub async fn delete_conversion(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Delete>,
    Path(id): Path<VolumeConversionId>,
) -> Result<ApiResponse<Deleted<VolumeConversionId>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = VolumeConversions::new(&mut conn).delete(id).await?;
    Ok(ApiResponse::ok(crud::deleted(removed, "Volume conversion", id)?))
}

/// Convert a quantity between two units using the stored conversions.
#[tracing::instrument(skip_all)]
pub async fn convert(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Units, operation::Read>,
    Json(body): Json<ConvertRequest>,
) -> Result<ApiResponse<ConvertResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let factor = VolumeConversions::new(&mut conn)
        .find_factor(body.from_unit_id, body.to_unit_id)
        .await?
        .ok_or_else(|| Error::Unprocessable {
            message: "No conversion defined between these units".to_string(),
        })?;

    let quantity = body.quantity.checked_mul(factor).ok_or_else(|| Error::BadRequest {
        message: "quantity is too large to convert".to_string(),
    })?;

    Ok(ApiResponse::ok(ConvertResponse {
        quantity: quantity.normalize(),
        factor,
    }))
}
