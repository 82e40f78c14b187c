use crate::domain::error::DomainError;
use crate::infrastructure::content_store::content_type_for;
use crate::presentation::AppMediaService;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{HttpResponse, get, web};

#[get("/media/{key:.*}")]
pub async fn serve_media(
    media: web::Data<AppMediaService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let key = path.into_inner();
    let bytes = media.open(&key).await?;
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&key))
        .insert_header(CacheControl(vec![
            CacheDirective::Public,
            CacheDirective::MaxAge(3600),
        ]))
        .body(bytes))
}
