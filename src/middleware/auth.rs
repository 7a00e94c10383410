use actix_web::body::MessageBody;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::auth::{Auth, AuthSession, RequestMeta, SESSION_COOKIE};
use crate::error::{ApiError, AuthError};

/// Utilisateur authentifié (session valide).
/// Utilisé comme extracteur dans les routes protégées.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthSession);

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.0.user.id
    }
}

/// Marque posée par `AuthUser` quand la session a été prolongée
#[derive(Debug, Clone)]
struct RefreshedSession(String);

/// Token de session brut: header `Authorization: Bearer <token>` en priorité,
/// sinon cookie signé.
pub fn session_token(req: &HttpRequest, auth: &Auth) -> Option<String> {
    if let Some(header) = req.headers().get("Authorization") {
        if let Some(token) = header.to_str().ok().and_then(|s| s.strip_prefix("Bearer ")) {
            return Some(token.trim().to_string());
        }
    }

    let cookie = req.cookie(SESSION_COOKIE)?;
    auth.token_from_cookie(cookie.value())
}

pub fn request_meta(req: &HttpRequest) -> RequestMeta {
    RequestMeta {
        ip_address: req.connection_info().realip_remote_addr().map(str::to_string),
        user_agent: req
            .headers()
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Cookie de session signé, valable aussi longtemps que la session
pub fn session_cookie(auth: &Auth, token: &str) -> Cookie<'static> {
    let config = auth.config();
    Cookie::build(SESSION_COOKIE, auth.cookie_value(token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.base_url.starts_with("https://"))
        .max_age(CookieDuration::seconds(config.session_ttl.num_seconds()))
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// Renvoie le cookie de session quand `AuthUser` a prolongé la session
/// pendant la requête.
pub async fn refresh_session_cookie(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let mut res = next.call(req).await?;

    let token = res
        .request()
        .extensions()
        .get::<RefreshedSession>()
        .map(|refreshed| refreshed.0.clone());
    let auth = res.request().app_data::<web::Data<Auth>>().cloned();

    if let (Some(token), Some(auth)) = (token, auth) {
        res.response_mut().add_cookie(&session_cookie(&auth, &token))?;
        tracing::debug!("session cookie renewed");
    }
    Ok(res)
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let auth = req.app_data::<web::Data<Auth>>().cloned();
        let token = auth.as_ref().and_then(|auth| session_token(&req, auth));

        Box::pin(async move {
            let auth = auth.ok_or_else(|| {
                ApiError::Internal("AuthService missing from app data".to_string())
            })?;
            let token = token.ok_or(ApiError::Auth(AuthError::InvalidToken))?;

            let session = auth.get_session(&token).await?;
            if session.refreshed {
                req.extensions_mut().insert(RefreshedSession(session.token.clone()));
            }
            Ok(AuthUser(session))
        })
    }
}
