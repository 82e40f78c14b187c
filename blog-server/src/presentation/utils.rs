use actix_multipart::Multipart;
use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::StreamExt;
use futures_util::future::{Ready, ready};
use tracing::warn;
use uuid::Uuid;

use crate::application::auth_service::AuthService;
use crate::data::profile_repository::ProfileRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::media::MediaUpload;
use crate::domain::profile::Requester;
use crate::presentation::middleware::RequestId;

/// Form field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub is_staff: bool,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(DomainError::Unauthorized.into())),
        }
    }
}

pub fn requester(user: &Option<AuthenticatedUser>) -> Requester {
    match user {
        Some(user) => Requester::User(user.id),
        None => Requester::Anonymous,
    }
}

pub async fn extract_user_from_token<R, P>(
    token: &str,
    auth_service: &AuthService<R, P>,
) -> Result<AuthenticatedUser, DomainError>
where
    R: UserRepository + 'static,
    P: ProfileRepository + 'static,
{
    let claims = auth_service
        .keys()
        .verify_token(token)
        .map_err(|_| DomainError::Unauthorized)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| DomainError::Unauthorized)?;

    let user = auth_service
        .get_user(user_id)
        .await
        .map_err(|err| match err {
            DomainError::UserNotFound(_) => DomainError::Unauthorized,
            other => other,
        })?;

    Ok(AuthenticatedUser {
        id: user.id,
        username: user.username,
        is_staff: user.is_staff,
    })
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

/// Reads the `file` field of a multipart form, refusing anything larger
/// than `max_bytes` before it is fully buffered.
pub async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<MediaUpload, DomainError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| DomainError::Validation(format!("malformed upload: {e}")))?;
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                warn!(error = %e, "error reading upload field");
                DomainError::Validation("upload interrupted".into())
            })?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(DomainError::PayloadTooLarge { limit: max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(DomainError::Validation("uploaded file is empty".into()));
        }

        return Ok(MediaUpload {
            bytes,
            content_type,
            file_name,
        });
    }
    Err(DomainError::Validation(format!(
        "missing '{UPLOAD_FIELD}' field"
    )))
}
