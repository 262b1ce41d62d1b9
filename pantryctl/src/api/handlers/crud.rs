//! Helpers shared by the per-resource CRUD handlers.

use crate::{
    api::models::{
        pagination::{ListQuery, PaginatedResponse},
        response::Deleted,
    },
    db::handlers::{Repository, filters::FilterField},
    errors::{Error, Result},
};

/// Run a `/list` request: one page of rows plus the unpaginated total.
pub async fn list_page<R>(repo: &mut R, query: &ListQuery, allowed: &[FilterField]) -> Result<PaginatedResponse<R::Response>>
where
    R: Repository + Send,
{
    let filter = query.to_filter(allowed)?;
    let rows = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;
    Ok(PaginatedResponse::new(
        rows,
        total_count,
        filter.skip,
        filter.limit.unwrap_or_default(),
    ))
}

/// Run a `/list-all` request: every matching row, filters still applied.
pub async fn list_all<R>(repo: &mut R, query: &ListQuery, allowed: &[FilterField]) -> Result<Vec<R::Response>>
where
    R: Repository + Send,
{
    let filter = query.to_unpaginated_filter(allowed)?;
    Ok(repo.list(&filter).await?)
}

pub fn not_found(resource: &str, id: impl ToString) -> Error {
    Error::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

/// Turn an optional lookup into a 404 when nothing came back.
pub fn found<T>(row: Option<T>, resource: &str, id: impl ToString) -> Result<T> {
    row.ok_or_else(|| not_found(resource, id))
}

/// Body for a delete endpoint, or a 404 when no row was removed.
pub fn deleted<Id: ToString>(removed: bool, resource: &str, id: Id) -> Result<Deleted<Id>> {
    if !removed {
        return Err(not_found(resource, id));
    }
    Ok(Deleted::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_found_and_deleted() {
        let id = Uuid::new_v4();
        assert_eq!(found(Some(3), "Warehouse", id).unwrap(), 3);

        let err = found::<i32>(None, "Warehouse", id).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref resource, .. } if resource == "Warehouse"));

        let body = deleted(true, "Unit", id).unwrap();
        assert_eq!(body.id, id);
        assert!(body.deleted);
        assert!(deleted(false, "Unit", id).is_err());
    }
}
