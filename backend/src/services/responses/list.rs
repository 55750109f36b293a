use crate::services::error::ApiError;
use crate::store::{GuestStore, SqliteStore};
use actix_web::{web, HttpResponse};

pub(crate) async fn process(store: web::Data<SqliteStore>) -> Result<HttpResponse, ApiError> {
    let groups = web::block(move || store.list_groups_with_latest_message()).await??;
    Ok(HttpResponse::Ok().json(groups))
}
