use crate::domain::error::DomainError;
use crate::presentation::AppAdminService;
use crate::presentation::utils::{AuthenticatedUser, request_id};
use actix_web::{HttpRequest, HttpResponse, get, web};
use tracing::debug;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(stats);
}

#[get("/admin/stats")]
async fn stats(
    req: HttpRequest,
    user: AuthenticatedUser,
    admin: web::Data<AppAdminService>,
) -> Result<HttpResponse, DomainError> {
    let dashboard = admin.dashboard(user.is_staff).await?;
    debug!(request_id = %request_id(&req), username = %user.username, "admin stats served");
    Ok(HttpResponse::Ok().json(dashboard))
}
