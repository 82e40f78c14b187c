use crate::domain::error::DomainError;
use crate::domain::media::{MediaSlot, MediaTarget};
use crate::domain::profile::ProfileUpdate;
use crate::presentation::dto::{MediaResponse, ProfileResponse};
use crate::presentation::utils::{AuthenticatedUser, read_upload, request_id, requester};
use crate::presentation::{AppMediaService, AppProfileService};
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, delete, get, put, web};
use tracing::info;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(view_profile)
        .service(update_settings)
        .service(upload_picture)
        .service(remove_picture);
}

#[get("/profiles/{username}")]
async fn view_profile(
    user: Option<AuthenticatedUser>,
    profiles: web::Data<AppProfileService>,
    media: web::Data<AppMediaService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let view = profiles.view(&path, requester(&user)).await?;
    let picture_url = media
        .resolve_url(MediaSlot::ProfilePicture, &view.profile.picture)
        .await;
    Ok(HttpResponse::Ok().json(ProfileResponse { view, picture_url }))
}

#[put("/profile/settings")]
async fn update_settings(
    req: HttpRequest,
    user: AuthenticatedUser,
    profiles: web::Data<AppProfileService>,
    payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, DomainError> {
    let profile = profiles
        .update_settings(user.id, payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        privacy = %profile.privacy,
        "profile settings updated"
    );

    Ok(HttpResponse::Ok().json(profile))
}

#[put("/profile/picture")]
async fn upload_picture(
    req: HttpRequest,
    user: AuthenticatedUser,
    media: web::Data<AppMediaService>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let slot = MediaSlot::ProfilePicture;
    let upload = read_upload(payload, slot.max_bytes()).await?;
    let stored = media
        .replace(MediaTarget::profile_picture(user.id), Some(upload))
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        "profile picture uploaded"
    );

    Ok(HttpResponse::Ok().json(MediaResponse {
        slot,
        url: media.resolve_url(slot, &stored).await,
    }))
}

#[delete("/profile/picture")]
async fn remove_picture(
    req: HttpRequest,
    user: AuthenticatedUser,
    media: web::Data<AppMediaService>,
) -> Result<HttpResponse, DomainError> {
    let slot = MediaSlot::ProfilePicture;
    let current = media
        .replace(MediaTarget::profile_picture(user.id), None)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        "profile picture reset"
    );

    Ok(HttpResponse::Ok().json(MediaResponse {
        slot,
        url: media.resolve_url(slot, &current).await,
    }))
}
