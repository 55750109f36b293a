use crate::services::error::ApiError;
use crate::store::{GuestStore, SqliteStore};
use actix_web::{web, HttpResponse};
use common::model::group::Group;
use common::requests::FindGuestsQuery;

pub(crate) async fn process(
    store: web::Data<SqliteStore>,
    query: web::Query<FindGuestsQuery>,
) -> Result<HttpResponse, ApiError> {
    let group = find_group(store, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(group))
}

async fn find_group(
    store: web::Data<SqliteStore>,
    query: FindGuestsQuery,
) -> Result<Option<Group>, ApiError> {
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or(ApiError::MissingParameter("name"))?;

    let group = web::block(move || store.find_group_by_guest_name(&name)).await??;
    Ok(group)
}
