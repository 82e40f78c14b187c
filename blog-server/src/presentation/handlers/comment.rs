use crate::domain::error::DomainError;
use crate::presentation::AppCommentService;
use crate::presentation::dto::CreateCommentRequest;
use crate::presentation::utils::{AuthenticatedUser, request_id};
use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use tracing::info;
use uuid::Uuid;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_comments)
        .service(add_comment)
        .service(delete_comment);
}

#[get("/posts/{id}/comments")]
async fn list_comments(
    comments: web::Data<AppCommentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let listed = comments.list(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(listed))
}

#[post("/posts/{id}/comments")]
async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<AppCommentService>,
    payload: web::Json<CreateCommentRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let comment = comments
        .add_comment(user.id, path.into_inner(), &payload.content)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %comment.post_id,
        comment_id = %comment.id,
        "comment added"
    );

    Ok(HttpResponse::Created().json(comment))
}

#[delete("/comments/{id}")]
async fn delete_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<AppCommentService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let comment_id = path.into_inner();
    comments.delete_comment(user.id, comment_id).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        comment_id = %comment_id,
        "comment deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
