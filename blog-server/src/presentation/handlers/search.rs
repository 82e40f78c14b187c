use crate::domain::error::DomainError;
use crate::presentation::AppProfileService;
use crate::presentation::dto::SearchQuery;
use actix_web::{HttpResponse, get, web};
use serde_json::json;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(search_users);
}

#[get("/users/search")]
async fn search_users(
    profiles: web::Data<AppProfileService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, DomainError> {
    let users = profiles.search(&query.q).await?;
    Ok(HttpResponse::Ok().json(json!({
        "query": query.q.trim(),
        "users": users,
    })))
}
