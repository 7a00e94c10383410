use actix_web::{get, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use validator::Validate;

use crate::auth::{Auth, AuthSession, SESSION_COOKIE};
use crate::error::{ApiError, AuthError};
use crate::middleware::{removal_cookie, request_meta, session_cookie, session_token, AuthUser};
use crate::models::dto::{
    ChangePasswordRequest, SendVerificationRequest, SessionResponse, SignInRequest, SignUpRequest,
    UserResponse, VerifyEmailQuery,
};
use crate::services::user_service::UserService;

// DTO pour supprimer son compte
#[derive(Deserialize)]
pub struct DeleteUserRequest {
    pub password: String,
}

fn session_response(session: AuthSession) -> SessionResponse {
    SessionResponse {
        token: session.token,
        user: session.user.into(),
        session: session.session.into(),
    }
}

/// POST /api/auth/sign-up/email - Créer un compte (PUBLIC)
#[post("/sign-up/email")]
pub async fn sign_up(
    req: HttpRequest,
    body: web::Json<SignUpRequest>,
    auth: web::Data<Auth>,
) -> Result<HttpResponse, ApiError> {
    let session = auth.sign_up_email(body.into_inner(), request_meta(&req)).await?;
    let cookie = session_cookie(&auth, &session.token);

    Ok(HttpResponse::Created().cookie(cookie).json(session_response(session)))
}

/// POST /api/auth/sign-in/email - Se connecter (PUBLIC)
#[post("/sign-in/email")]
pub async fn sign_in(
    req: HttpRequest,
    body: web::Json<SignInRequest>,
    auth: web::Data<Auth>,
) -> Result<HttpResponse, ApiError> {
    let session = auth.sign_in_email(body.into_inner(), request_meta(&req)).await?;
    let cookie = session_cookie(&auth, &session.token);

    Ok(HttpResponse::Ok().cookie(cookie).json(session_response(session)))
}

/// POST /api/auth/sign-out - Supprime la session courante
#[post("/sign-out")]
pub async fn sign_out(req: HttpRequest, auth: web::Data<Auth>) -> Result<HttpResponse, ApiError> {
    if let Some(token) = session_token(&req, &auth) {
        auth.sign_out(&token).await?;
    }

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(serde_json::json!({ "success": true })))
}

/// GET /api/auth/get-session - Session courante, `null` si aucune
#[get("/get-session")]
pub async fn get_session(req: HttpRequest, auth: web::Data<Auth>) -> Result<HttpResponse, ApiError> {
    let Some(token) = session_token(&req, &auth) else {
        return Ok(HttpResponse::Ok().json(serde_json::Value::Null));
    };

    match auth.get_session(&token).await {
        Ok(session) => {
            let mut response = HttpResponse::Ok();
            if session.refreshed {
                response.cookie(session_cookie(&auth, &session.token));
            }
            Ok(response.json(session_response(session)))
        }
        Err(AuthError::InvalidToken | AuthError::SessionExpired) => Ok(HttpResponse::Ok()
            .cookie(removal_cookie())
            .json(serde_json::Value::Null)),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/auth/send-verification-email
/// Répond toujours `true` pour ne pas révéler quels emails existent
#[post("/send-verification-email")]
pub async fn send_verification_email(
    body: web::Json<SendVerificationRequest>,
    auth: web::Data<Auth>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    match auth.send_verification_email(&body.email).await {
        Ok(_) | Err(AuthError::UserNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": true })))
}

/// GET /api/auth/verify-email?token=xxx
#[get("/verify-email")]
pub async fn verify_email(
    query: web::Query<VerifyEmailQuery>,
    auth: web::Data<Auth>,
) -> Result<HttpResponse, ApiError> {
    let user = auth.verify_email(&query.token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "user": UserResponse::from(user)
    })))
}

/// POST /api/auth/change-password (PROTÉGÉE)
#[post("/change-password")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    auth: web::Data<Auth>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    auth.change_password(
        &auth_user.0,
        &body.current_password,
        &body.new_password,
        body.revoke_other_sessions,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

/// POST /api/auth/delete-user (PROTÉGÉE) - mot de passe requis
#[post("/delete-user")]
pub async fn delete_user(
    auth_user: AuthUser,
    body: web::Json<DeleteUserRequest>,
    auth: web::Data<Auth>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth.verify_user_password(auth_user.user_id(), &body.password).await?;
    UserService::delete_user(db.get_ref(), auth_user.user_id()).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(serde_json::json!({ "success": true })))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(sign_up)
            .service(sign_in)
            .service(sign_out)
            .service(get_session)
            .service(send_verification_email)
            .service(verify_email)
            .service(change_password)
            .service(delete_user),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    use crate::auth::{AuthService, SeaOrmAdapter};
    use crate::config::AuthConfig;
    use crate::db;

    async fn app_data() -> (web::Data<Auth>, web::Data<DatabaseConnection>) {
        let db = db::test_connection().await;
        let auth = AuthService::new(SeaOrmAdapter::new(db.clone()), AuthConfig::default());
        (web::Data::new(auth), web::Data::new(db))
    }

    #[actix_web::test]
    async fn test_sign_up_sets_cookie_and_session_resolves() {
        let (auth, db) = app_data().await;
        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(db.clone())
                .service(web::scope("/api").configure(auth_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/sign-up/email")
            .set_json(serde_json::json!({
                "name": "Ana",
                "email": "ana@clinic.com",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .expect("session cookie")
            .into_owned();
        assert!(cookie.http_only().unwrap_or(false));

        let req = test::TestRequest::get()
            .uri("/api/auth/get-session")
            .cookie(cookie.clone())
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"]["email"], "ana@clinic.com");
        assert_eq!(body["user"]["email_verified"], false);

        // même email -> 409
        let req = test::TestRequest::post()
            .uri("/api/auth/sign-up/email")
            .set_json(serde_json::json!({
                "name": "Ana 2",
                "email": "ana@clinic.com",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        // déconnexion -> plus de session
        let req = test::TestRequest::post()
            .uri("/api/auth/sign-out")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/auth/get-session")
            .cookie(cookie)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body.is_null());
    }

    #[actix_web::test]
    async fn test_get_session_renews_cookie_after_refresh() {
        use chrono::{Duration, Utc};
        use sea_orm::{ActiveModelTrait, Set};

        use crate::auth::RequestMeta;
        use crate::models::dto::SignUpRequest;
        use crate::models::session;

        let (auth, db) = app_data().await;
        let created = auth
            .sign_up_email(
                SignUpRequest {
                    name: "Ana".to_string(),
                    email: "ana@clinic.com".to_string(),
                    password: "password123".to_string(),
                    image: None,
                },
                RequestMeta::default(),
            )
            .await
            .unwrap();
        let cookie = actix_web::cookie::Cookie::new(SESSION_COOKIE, auth.cookie_value(&created.token));

        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(db.clone())
                .service(web::scope("/api").configure(auth_routes)),
        )
        .await;

        // session neuve: pas de Set-Cookie
        let req = test::TestRequest::get()
            .uri("/api/auth/get-session")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.response().cookies().next().is_none());

        let mut active: session::ActiveModel = created.session.clone().into();
        active.expires_at = Set(Utc::now().naive_utc() + Duration::hours(1));
        active.update(db.get_ref()).await.unwrap();

        let req = test::TestRequest::get()
            .uri("/api/auth/get-session")
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let renewed = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .expect("renewed session cookie")
            .into_owned();
        assert_eq!(auth.token_from_cookie(renewed.value()), Some(created.token.clone()));
        assert_eq!(
            renewed.max_age(),
            Some(actix_web::cookie::time::Duration::days(7))
        );
    }

    #[actix_web::test]
    async fn test_sign_in_with_bearer_token() {
        let (auth, db) = app_data().await;
        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(db.clone())
                .service(web::scope("/api").configure(auth_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/sign-up/email")
            .set_json(serde_json::json!({
                "name": "Ana",
                "email": "ana@clinic.com",
                "password": "password123"
            }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/sign-in/email")
            .set_json(serde_json::json!({ "email": "ana@clinic.com", "password": "wrong-password" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/auth/sign-in/email")
            .set_json(serde_json::json!({ "email": "ana@clinic.com", "password": "password123" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let token = body["token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/auth/get-session")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"]["name"], "Ana");
    }

    #[actix_web::test]
    async fn test_protected_route_requires_session() {
        let (auth, db) = app_data().await;
        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(db.clone())
                .service(web::scope("/api").configure(auth_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/change-password")
            .set_json(serde_json::json!({
                "current_password": "password123",
                "new_password": "password456"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/auth/delete-user")
            .insert_header(("Authorization", "Bearer not-a-session"))
            .set_json(serde_json::json!({ "password": "password123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_send_verification_does_not_leak_unknown_email() {
        let (auth, db) = app_data().await;
        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(db.clone())
                .service(web::scope("/api").configure(auth_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/send-verification-email")
            .set_json(serde_json::json!({ "email": "nobody@clinic.com" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], true);

        let req = test::TestRequest::get()
            .uri("/api/auth/verify-email?token=unknown")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
