use crate::domain::error::DomainError;
use crate::presentation::AppFollowService;
use crate::presentation::dto::PageQuery;
use crate::presentation::utils::{AuthenticatedUser, request_id, requester};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(toggle_follow)
        .service(followers)
        .service(following);
}

#[post("/profiles/{username}/follow")]
async fn toggle_follow(
    req: HttpRequest,
    user: AuthenticatedUser,
    follows: web::Data<AppFollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let state = follows.toggle(user.id, &path).await?;

    info!(
        request_id = %request_id(&req),
        follower = %user.username,
        followee = %path,
        following = state.following,
        "follow toggled"
    );

    Ok(HttpResponse::Ok().json(state))
}

#[get("/profiles/{username}/followers")]
async fn followers(
    user: Option<AuthenticatedUser>,
    follows: web::Data<AppFollowService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = follows
        .followers(&path, requester(&user), (&*query).into())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/profiles/{username}/following")]
async fn following(
    user: Option<AuthenticatedUser>,
    follows: web::Data<AppFollowService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = follows
        .following(&path, requester(&user), (&*query).into())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}
