use crate::domain::error::DomainError;
use crate::presentation::AppVoteLedger;
use crate::presentation::dto::{VoteRequest, VoteResponse};
use crate::presentation::utils::{AuthenticatedUser, request_id};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(cast_vote).service(get_votes);
}

#[post("/posts/{id}/vote")]
async fn cast_vote(
    req: HttpRequest,
    user: AuthenticatedUser,
    votes: web::Data<AppVoteLedger>,
    payload: web::Json<VoteRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let outcome = votes.cast_vote(user.id, post_id, payload.is_like).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        post_id = %post_id,
        action = outcome.change.action(),
        "vote cast"
    );

    Ok(HttpResponse::Ok().json(VoteResponse::from(outcome)))
}

#[get("/posts/{id}/votes")]
async fn get_votes(
    user: Option<AuthenticatedUser>,
    votes: web::Data<AppVoteLedger>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let counts = votes.counts(post_id).await?;
    let user_vote = match user {
        Some(user) => votes.user_vote(user.id, post_id).await?,
        None => None,
    };
    Ok(HttpResponse::Ok().json(json!({
        "likes": counts.likes,
        "dislikes": counts.dislikes,
        "user_vote": user_vote,
    })))
}
