use actix_web::{get, http::header, web, HttpRequest, HttpResponse, HttpResponseBuilder};

use crate::auth::{Auth, AuthSession};
use crate::error::{ApiError, AuthError};
use crate::middleware::{session_cookie, session_token};

const INDEX_HTML: &str = include_str!("../../views/index.html");
const AUTHENTICATION_HTML: &str = include_str!("../../views/authentication.html");

/// Session courante si elle existe et est valide, sinon None
async fn current_session(req: &HttpRequest, auth: &Auth) -> Result<Option<AuthSession>, ApiError> {
    let Some(token) = session_token(req, auth) else {
        return Ok(None);
    };

    match auth.get_session(&token).await {
        Ok(session) => Ok(Some(session)),
        Err(AuthError::InvalidToken | AuthError::SessionExpired) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn redirect(location: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location));
    builder
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// GET / - page d'accueil, connexion obligatoire
#[get("/")]
pub async fn index(req: HttpRequest, auth: web::Data<Auth>) -> Result<HttpResponse, ApiError> {
    let Some(session) = current_session(&req, &auth).await? else {
        return Ok(redirect("/authentication").finish());
    };

    let body = INDEX_HTML
        .replace("{{user_name}}", &escape_html(&session.user.name))
        .replace("{{user_email}}", &escape_html(&session.user.email));

    let mut response = HttpResponse::Ok();
    if session.refreshed {
        response.cookie(session_cookie(&auth, &session.token));
    }
    Ok(response.content_type("text/html; charset=utf-8").body(body))
}

/// GET /authentication - login / création de compte
#[get("/authentication")]
pub async fn authentication(req: HttpRequest, auth: web::Data<Auth>) -> Result<HttpResponse, ApiError> {
    if let Some(session) = current_session(&req, &auth).await? {
        let mut response = redirect("/");
        if session.refreshed {
            response.cookie(session_cookie(&auth, &session.token));
        }
        return Ok(response.finish());
    }

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(AUTHENTICATION_HTML))
}
