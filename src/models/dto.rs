// Requêtes / réponses de l'API
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::patients::PatientSex;
use crate::models::{appointments, doctors, patients, session, users};

// ---------------------------------------------------------------- auth

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub new_password: String,
    #[serde(default)]
    pub revoke_other_sessions: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendVerificationRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            email_verified: user.email_verified,
            image: user.image,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub expires_at: NaiveDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<session::Model> for SessionInfo {
    fn from(s: session::Model) -> Self {
        Self {
            id: s.id,
            expires_at: s.expires_at,
            ip_address: s.ip_address,
            user_agent: s.user_agent,
        }
    }
}

/// Réponse de sign-up / sign-in / get-session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
    pub session: SessionInfo,
}

// ---------------------------------------------------------------- clinics

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClinicRequest {
    #[validate(length(min = 1, max = 255, message = "Clinic name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDoctorRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub avatar_image_url: String,
    #[validate(length(min = 1, message = "Specialty is required"))]
    pub specialty: String,
    #[validate(range(min = 0, max = 6))]
    pub available_from_weekday: i32,
    #[validate(range(min = 0, max = 6))]
    pub available_to_weekday: i32,
    pub available_from_time: NaiveTime,
    pub available_to_time: NaiveTime,
    #[validate(range(min = 0))]
    pub appointment_price_in_cents: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDoctorRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub avatar_image_url: Option<String>,
    #[validate(length(min = 1))]
    pub specialty: Option<String>,
    #[validate(range(min = 0, max = 6))]
    pub available_from_weekday: Option<i32>,
    #[validate(range(min = 0, max = 6))]
    pub available_to_weekday: Option<i32>,
    pub available_from_time: Option<NaiveTime>,
    pub available_to_time: Option<NaiveTime>,
    #[validate(range(min = 0))]
    pub appointment_price_in_cents: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
    pub sex: PatientSex,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePatientRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub phone_number: Option<String>,
    pub sex: Option<PatientSex>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub date: NaiveDateTime,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
}

/// Rendez-vous avec le patient et le médecin associés
#[derive(Debug, Serialize)]
pub struct AppointmentWithRelations {
    #[serde(flatten)]
    pub appointment: appointments::Model,
    pub patient: Option<patients::Model>,
    pub doctor: Option<doctors::Model>,
}
