use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    ClinicRequest, CreateAppointmentRequest, CreateDoctorRequest, CreatePatientRequest,
    UpdateDoctorRequest, UpdatePatientRequest,
};
use crate::services::appointment_service::AppointmentService;
use crate::services::clinic_service::ClinicService;
use crate::services::doctor_service::DoctorService;
use crate::services::patient_service::PatientService;
use crate::services::user_service::UserService;

// DTO pour inviter un membre
#[derive(Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

/// Seuls les membres d'une clinique voient ou modifient ses données
async fn ensure_member(db: &DatabaseConnection, clinic_id: Uuid, auth_user: &AuthUser) -> Result<(), ApiError> {
    if ClinicService::is_member(db, clinic_id, auth_user.user_id()).await? {
        Ok(())
    } else {
        tracing::warn!(clinic_id = %clinic_id, user_id = auth_user.user_id(), "clinic access denied");
        Err(ApiError::Forbidden)
    }
}

// ================================================================ CLINIQUES

/// GET /api/clinics - Cliniques de l'utilisateur connecté
#[get("")]
pub async fn list_clinics(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let clinics = ClinicService::list_clinics_for_user(db.get_ref(), auth_user.user_id()).await?;
    Ok(HttpResponse::Ok().json(clinics))
}

/// POST /api/clinics - Créer une clinique (le créateur en devient membre)
#[post("")]
pub async fn create_clinic(
    auth_user: AuthUser,
    body: web::Json<ClinicRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let clinic = ClinicService::create_clinic(db.get_ref(), auth_user.user_id(), &body.name).await?;
    Ok(HttpResponse::Created().json(clinic))
}

#[get("/{clinic_id}")]
pub async fn get_clinic(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let clinic = ClinicService::get_clinic(db.get_ref(), clinic_id).await?;
    Ok(HttpResponse::Ok().json(clinic))
}

#[patch("/{clinic_id}")]
pub async fn rename_clinic(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<ClinicRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let clinic = ClinicService::rename_clinic(db.get_ref(), clinic_id, &body.name).await?;
    Ok(HttpResponse::Ok().json(clinic))
}

/// DELETE /api/clinics/{id} - médecins, patients et rendez-vous supprimés avec
#[delete("/{clinic_id}")]
pub async fn delete_clinic(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    ClinicService::delete_clinic(db.get_ref(), clinic_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/{clinic_id}/members")]
pub async fn add_member(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<AddMemberRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let user = UserService::find_user_by_email(db.get_ref(), &body.email).await?;
    let membership = ClinicService::add_member(db.get_ref(), clinic_id, &user.id).await?;
    Ok(HttpResponse::Created().json(membership))
}

// ================================================================ MÉDECINS

#[get("/{clinic_id}/doctors")]
pub async fn list_doctors(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let doctors = DoctorService::list_doctors(db.get_ref(), clinic_id).await?;
    Ok(HttpResponse::Ok().json(doctors))
}

#[post("/{clinic_id}/doctors")]
pub async fn create_doctor(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateDoctorRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let doctor = DoctorService::create_doctor(db.get_ref(), clinic_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(doctor))
}

#[get("/{clinic_id}/doctors/{doctor_id}")]
pub async fn get_doctor(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (clinic_id, doctor_id) = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let doctor = DoctorService::get_doctor(db.get_ref(), clinic_id, doctor_id).await?;
    Ok(HttpResponse::Ok().json(doctor))
}

#[patch("/{clinic_id}/doctors/{doctor_id}")]
pub async fn update_doctor(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateDoctorRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let (clinic_id, doctor_id) = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let doctor = DoctorService::update_doctor(db.get_ref(), clinic_id, doctor_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(doctor))
}

#[delete("/{clinic_id}/doctors/{doctor_id}")]
pub async fn delete_doctor(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (clinic_id, doctor_id) = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    DoctorService::delete_doctor(db.get_ref(), clinic_id, doctor_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ================================================================ PATIENTS

#[get("/{clinic_id}/patients")]
pub async fn list_patients(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let patients = PatientService::list_patients(db.get_ref(), clinic_id).await?;
    Ok(HttpResponse::Ok().json(patients))
}

#[post("/{clinic_id}/patients")]
pub async fn create_patient(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CreatePatientRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let patient = PatientService::create_patient(db.get_ref(), clinic_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(patient))
}

#[get("/{clinic_id}/patients/{patient_id}")]
pub async fn get_patient(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (clinic_id, patient_id) = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let patient = PatientService::get_patient(db.get_ref(), clinic_id, patient_id).await?;
    Ok(HttpResponse::Ok().json(patient))
}

#[patch("/{clinic_id}/patients/{patient_id}")]
pub async fn update_patient(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdatePatientRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let (clinic_id, patient_id) = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let patient = PatientService::update_patient(db.get_ref(), clinic_id, patient_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(patient))
}

#[delete("/{clinic_id}/patients/{patient_id}")]
pub async fn delete_patient(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (clinic_id, patient_id) = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    PatientService::delete_patient(db.get_ref(), clinic_id, patient_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ================================================================ RENDEZ-VOUS

#[get("/{clinic_id}/appointments")]
pub async fn list_appointments(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let appointments = AppointmentService::list_appointments(db.get_ref(), clinic_id).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

#[post("/{clinic_id}/appointments")]
pub async fn create_appointment(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateAppointmentRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let clinic_id = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    let appointment = AppointmentService::create_appointment(db.get_ref(), clinic_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(appointment))
}

#[delete("/{clinic_id}/appointments/{appointment_id}")]
pub async fn delete_appointment(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (clinic_id, appointment_id) = path.into_inner();
    ensure_member(db.get_ref(), clinic_id, &auth_user).await?;

    AppointmentService::delete_appointment(db.get_ref(), clinic_id, appointment_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn clinic_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/clinics")
            .service(list_clinics)
            .service(create_clinic)
            .service(get_clinic)
            .service(rename_clinic)
            .service(delete_clinic)
            .service(add_member)
            .service(list_doctors)
            .service(create_doctor)
            .service(get_doctor)
            .service(update_doctor)
            .service(delete_doctor)
            .service(list_patients)
            .service(create_patient)
            .service(get_patient)
            .service(update_patient)
            .service(delete_patient)
            .service(list_appointments)
            .service(create_appointment)
            .service(delete_appointment),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    use crate::auth::{Auth, AuthService, RequestMeta, SeaOrmAdapter};
    use crate::config::AuthConfig;
    use crate::db;
    use crate::models::dto::SignUpRequest;

    async fn sign_up(auth: &Auth, email: &str) -> String {
        let session = auth
            .sign_up_email(
                SignUpRequest {
                    name: "Dr. Test".to_string(),
                    email: email.to_string(),
                    password: "password123".to_string(),
                    image: None,
                },
                RequestMeta::default(),
            )
            .await
            .unwrap();
        format!("Bearer {}", session.token)
    }

    #[actix_web::test]
    async fn test_clinic_workflow() {
        let db = db::test_connection().await;
        let auth = web::Data::new(AuthService::new(SeaOrmAdapter::new(db.clone()), AuthConfig::default()));
        let owner = sign_up(&auth, "owner@clinic.com").await;

        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(web::Data::new(db.clone()))
                .service(web::scope("/api").configure(clinic_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/clinics")
            .insert_header(("Authorization", owner.clone()))
            .set_json(serde_json::json!({ "name": "Clínica Central" }))
            .to_request();
        let clinic: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let clinic_id = clinic["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/clinics/{}/doctors", clinic_id))
            .insert_header(("Authorization", owner.clone()))
            .set_json(serde_json::json!({
                "name": "Dra. Silva",
                "specialty": "Cardiologia",
                "available_from_weekday": 1,
                "available_to_weekday": 5,
                "available_from_time": "08:00:00",
                "available_to_time": "18:00:00",
                "appointment_price_in_cents": 15000
            }))
            .to_request();
        let doctor: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(doctor["clinic_id"].as_str(), Some(clinic_id.as_str()));

        let req = test::TestRequest::post()
            .uri(&format!("/api/clinics/{}/patients", clinic_id))
            .insert_header(("Authorization", owner.clone()))
            .set_json(serde_json::json!({
                "name": "João",
                "email": "joao@mail.com",
                "phone_number": "+55 11 98888-0000",
                "sex": "male"
            }))
            .to_request();
        let patient: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(patient["sex"], "male");

        let req = test::TestRequest::post()
            .uri(&format!("/api/clinics/{}/appointments", clinic_id))
            .insert_header(("Authorization", owner.clone()))
            .set_json(serde_json::json!({
                "date": "2026-03-02T10:00:00",
                "patient_id": patient["id"],
                "doctor_id": doctor["id"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/clinics/{}/appointments", clinic_id))
            .insert_header(("Authorization", owner.clone()))
            .to_request();
        let list: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list.as_array().map(|a| a.len()), Some(1));
        assert_eq!(list[0]["doctor"]["name"], "Dra. Silva");
        assert_eq!(list[0]["patient"]["name"], "João");

        // médecin avec rendez-vous -> FK -> 409
        let req = test::TestRequest::delete()
            .uri(&format!("/api/clinics/{}/doctors/{}", clinic_id, doctor["id"].as_str().unwrap()))
            .insert_header(("Authorization", owner.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/clinics/{}", clinic_id))
            .insert_header(("Authorization", owner.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri("/api/clinics")
            .insert_header(("Authorization", owner))
            .to_request();
        let list: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list.as_array().map(|a| a.len()), Some(0));
    }

    #[actix_web::test]
    async fn test_protected_route_renews_refreshed_session_cookie() {
        use actix_web::middleware::from_fn;
        use chrono::{Duration, Utc};
        use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

        use crate::auth::SESSION_COOKIE;
        use crate::middleware::refresh_session_cookie;
        use crate::models::session;

        let db = db::test_connection().await;
        let auth = web::Data::new(AuthService::new(SeaOrmAdapter::new(db.clone()), AuthConfig::default()));
        let owner = sign_up(&auth, "owner@clinic.com").await;
        let token = owner.trim_start_matches("Bearer ").to_string();

        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(web::Data::new(db.clone()))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(refresh_session_cookie))
                        .configure(clinic_routes),
                ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/clinics")
            .insert_header(("Authorization", owner.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.response().cookies().next().is_none());

        let stored = session::Entity::find()
            .filter(session::Column::Token.eq(token.as_str()))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut active: session::ActiveModel = stored.into();
        active.expires_at = Set(Utc::now().naive_utc() + Duration::hours(1));
        active.update(&db).await.unwrap();

        let req = test::TestRequest::get()
            .uri("/api/clinics")
            .insert_header(("Authorization", owner))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let renewed = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .expect("renewed session cookie")
            .into_owned();
        assert_eq!(auth.token_from_cookie(renewed.value()), Some(token));
    }

    #[actix_web::test]
    async fn test_non_member_is_forbidden() {
        let db = db::test_connection().await;
        let auth = web::Data::new(AuthService::new(SeaOrmAdapter::new(db.clone()), AuthConfig::default()));
        let owner = sign_up(&auth, "owner@clinic.com").await;
        let stranger = sign_up(&auth, "stranger@clinic.com").await;

        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(web::Data::new(db.clone()))
                .service(web::scope("/api").configure(clinic_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/clinics")
            .insert_header(("Authorization", owner.clone()))
            .set_json(serde_json::json!({ "name": "Clínica" }))
            .to_request();
        let clinic: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let clinic_id = clinic["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/clinics/{}/patients", clinic_id))
            .insert_header(("Authorization", stranger.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // une fois invité, l'accès est accordé
        let req = test::TestRequest::post()
            .uri(&format!("/api/clinics/{}/members", clinic_id))
            .insert_header(("Authorization", owner))
            .set_json(serde_json::json!({ "email": "stranger@clinic.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/clinics/{}/patients", clinic_id))
            .insert_header(("Authorization", stranger))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_invalid_doctor_is_rejected() {
        let db = db::test_connection().await;
        let auth = web::Data::new(AuthService::new(SeaOrmAdapter::new(db.clone()), AuthConfig::default()));
        let owner = sign_up(&auth, "owner@clinic.com").await;

        let app = test::init_service(
            App::new()
                .app_data(auth.clone())
                .app_data(web::Data::new(db.clone()))
                .service(web::scope("/api").configure(clinic_routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/clinics")
            .insert_header(("Authorization", owner.clone()))
            .set_json(serde_json::json!({ "name": "Clínica" }))
            .to_request();
        let clinic: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let clinic_id = clinic["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/clinics/{}/doctors", clinic_id))
            .insert_header(("Authorization", owner))
            .set_json(serde_json::json!({
                "name": "Dr. Sábado",
                "specialty": "Clínico geral",
                "available_from_weekday": 1,
                "available_to_weekday": 7,
                "available_from_time": "08:00:00",
                "available_to_time": "18:00:00",
                "appointment_price_in_cents": 10000
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
