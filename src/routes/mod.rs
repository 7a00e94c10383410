pub mod auth;
pub mod clinics;
pub mod health;
pub mod pages;

use actix_web::{middleware::from_fn, web};

use crate::middleware::refresh_session_cookie;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(pages::index)
        .service(pages::authentication)
        .service(
            web::scope("/api")
                .wrap(from_fn(refresh_session_cookie))
                .service(health::health_check)
                .configure(auth::auth_routes)
                .configure(clinics::clinic_routes),
        );
}
