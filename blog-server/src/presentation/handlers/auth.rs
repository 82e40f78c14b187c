use crate::domain::error::DomainError;
use crate::presentation::AppAuthService;
use crate::presentation::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::presentation::utils::{AuthenticatedUser, request_id};
use actix_web::{HttpRequest, HttpResponse, Scope, get, post, web};
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(register)
        .service(login)
        .service(me)
}

#[post("/register")]
async fn register(
    req: HttpRequest,
    service: web::Data<AppAuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, DomainError> {
    let user = service.register(payload.into_inner().into()).await?;
    let token = service.issue_token(&user)?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        username = %user.username,
        "user registered"
    );

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: token,
        expires_in: service.keys().ttl_seconds(),
        token_type: "Bearer".to_string(),
        user,
    }))
}

#[post("/login")]
async fn login(
    req: HttpRequest,
    service: web::Data<AppAuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let (user, token) = service.login(&payload.login, &payload.password).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        "user logged in"
    );

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        expires_in: service.keys().ttl_seconds(),
        token_type: "Bearer".to_string(),
        user,
    }))
}

#[get("/me")]
async fn me(
    user: AuthenticatedUser,
    service: web::Data<AppAuthService>,
) -> Result<HttpResponse, DomainError> {
    let user = service.get_user(user.id).await?;
    Ok(HttpResponse::Ok().json(user))
}
