use crate::domain::error::DomainError;
use crate::domain::media::{MediaSlot, MediaTarget};
use crate::domain::page::PageRequest;
use crate::domain::post::{Post, PostFilter};
use crate::domain::vote::VoteCounts;
use crate::presentation::dto::{
    CreatePostRequest, FeatureRequest, ListPostsQuery, MediaResponse, PostDetailResponse,
    PostResponse, UpdatePostRequest,
};
use crate::presentation::utils::{AuthenticatedUser, read_upload, request_id};
use crate::presentation::{
    AppCommentService, AppMediaService, AppPostService, AppProfileService, AppVoteLedger,
};
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_posts)
        .service(create_post)
        .service(get_post)
        .service(update_post)
        .service(delete_post)
        .service(set_featured)
        .service(upload_media)
        .service(remove_media);
}

pub(crate) async fn post_response(
    post: Post,
    counts: VoteCounts,
    user_vote: Option<bool>,
    media: &AppMediaService,
) -> PostResponse {
    let refs: Vec<_> = MediaSlot::POST_SLOTS
        .iter()
        .map(|slot| (*slot, post.media(*slot)))
        .collect();
    let mut response = PostResponse::new(post, counts, user_vote);
    for (slot, media_ref) in refs {
        response.set_url(slot, media.resolve_url(slot, &media_ref).await);
    }
    response
}

#[get("/posts")]
async fn get_posts(
    req: HttpRequest,
    posts: web::Data<AppPostService>,
    profiles: web::Data<AppProfileService>,
    votes: web::Data<AppVoteLedger>,
    media: web::Data<AppMediaService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, DomainError> {
    let author_id = match &query.author {
        Some(username) => Some(profiles.find_user(username).await?.id),
        None => None,
    };
    let filter = PostFilter {
        author_id,
        featured: query.featured,
    };
    let page = posts
        .get_posts(filter, PageRequest::new(query.page, query.page_size))
        .await?;

    let ids: Vec<Uuid> = page.items.iter().map(|p| p.id).collect();
    let counts = votes.counts_for(&ids).await?;

    let mut items = Vec::with_capacity(page.items.len());
    for post in page.items {
        let post_counts = counts.get(&post.id).copied().unwrap_or_default();
        items.push(post_response(post, post_counts, None, &media).await);
    }

    info!(
        request_id = %request_id(&req),
        page = page.page,
        returned = items.len(),
        "posts retrieved"
    );

    Ok(HttpResponse::Ok().json(json!({
        "posts": items,
        "total": page.total,
        "page": page.page,
        "page_size": page.page_size,
        "has_next": page.has_next,
    })))
}

#[get("/posts/{id}")]
async fn get_post(
    user: Option<AuthenticatedUser>,
    posts: web::Data<AppPostService>,
    comments: web::Data<AppCommentService>,
    votes: web::Data<AppVoteLedger>,
    media: web::Data<AppMediaService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.view_post(path.into_inner()).await?;
    let counts = votes.counts(post.id).await?;
    let user_vote = match &user {
        Some(user) => votes.user_vote(user.id, post.id).await?,
        None => None,
    };
    let post_comments = comments.list(post.id).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: post_response(post, counts, user_vote, &media).await,
        comments: post_comments,
    }))
}

#[post("/posts")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<AppPostService>,
    media: web::Data<AppMediaService>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let payload = payload.into_inner();
    let post = posts
        .create_post(user.id, payload.title, payload.content)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post.id,
        "post created"
    );

    Ok(HttpResponse::Created()
        .json(post_response(post, VoteCounts::default(), None, &media).await))
}

#[put("/posts/{id}")]
async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<AppPostService>,
    votes: web::Data<AppVoteLedger>,
    media: web::Data<AppMediaService>,
    payload: web::Json<UpdatePostRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = posts
        .update_post(user.id, post_id, payload.into_inner().into())
        .await?;
    let counts = votes.counts(post.id).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post_id,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(post_response(post, counts, None, &media).await))
}

#[delete("/posts/{id}")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<AppPostService>,
    media: web::Data<AppMediaService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = posts.delete_post(user.id, post_id).await?;
    media.purge(&post.stored_keys()).await;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post_id,
        "post deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}

#[post("/posts/{id}/feature")]
async fn set_featured(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<AppPostService>,
    payload: web::Json<FeatureRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts
        .set_featured(user.is_staff, path.into_inner(), payload.featured)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post.id,
        featured = post.featured,
        "post featured flag changed"
    );

    Ok(HttpResponse::Ok().json(json!({ "id": post.id, "featured": post.featured })))
}

#[put("/posts/{id}/media/{slot}")]
async fn upload_media(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<AppPostService>,
    media: web::Data<AppMediaService>,
    path: web::Path<(Uuid, String)>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let (post_id, raw_slot) = path.into_inner();
    let slot: MediaSlot = raw_slot.parse()?;
    posts.get_own_post(user.id, post_id).await?;

    let upload = read_upload(payload, slot.max_bytes()).await?;
    let stored = media
        .replace(MediaTarget::post(post_id, slot), Some(upload))
        .await?;

    info!(
        request_id = %request_id(&req),
        post_id = %post_id,
        slot = %slot,
        "post media uploaded"
    );

    Ok(HttpResponse::Ok().json(MediaResponse {
        slot,
        url: media.resolve_url(slot, &stored).await,
    }))
}

#[delete("/posts/{id}/media/{slot}")]
async fn remove_media(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<AppPostService>,
    media: web::Data<AppMediaService>,
    path: web::Path<(Uuid, String)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, raw_slot) = path.into_inner();
    let slot: MediaSlot = raw_slot.parse()?;
    posts.get_own_post(user.id, post_id).await?;

    media.replace(MediaTarget::post(post_id, slot), None).await?;

    info!(
        request_id = %request_id(&req),
        post_id = %post_id,
        slot = %slot,
        "post media removed"
    );

    Ok(HttpResponse::NoContent().finish())
}
