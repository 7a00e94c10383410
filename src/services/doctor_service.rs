use sea_orm::*;
use uuid::Uuid;

use crate::error::DataError;
use crate::models::doctors;
use crate::models::dto::{CreateDoctorRequest, UpdateDoctorRequest};

pub struct DoctorService;

impl DoctorService {
    /// Ajoute un médecin. Jours hors 0..=6 / plage horaire vide: Validation
    /// (vérifié dans doctors::before_save). Clinique inconnue: violation de FK.
    pub async fn create_doctor(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        request: CreateDoctorRequest,
    ) -> Result<doctors::Model, DataError> {
        let doctor = doctors::ActiveModel {
            clinic_id: Set(clinic_id),
            name: Set(request.name),
            avatar_image_url: Set(request.avatar_image_url),
            specialty: Set(request.specialty),
            available_from_weekday: Set(request.available_from_weekday),
            available_to_weekday: Set(request.available_to_weekday),
            available_from_time: Set(request.available_from_time),
            available_to_time: Set(request.available_to_time),
            appointment_price_in_cents: Set(request.appointment_price_in_cents),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(doctor)
    }

    pub async fn list_doctors(db: &DatabaseConnection, clinic_id: Uuid) -> Result<Vec<doctors::Model>, DataError> {
        let doctors = doctors::Entity::find()
            .filter(doctors::Column::ClinicId.eq(clinic_id))
            .order_by_asc(doctors::Column::Name)
            .all(db)
            .await?;
        Ok(doctors)
    }

    /// Médecin de cette clinique uniquement
    pub async fn get_doctor(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<doctors::Model, DataError> {
        doctors::Entity::find_by_id(doctor_id)
            .filter(doctors::Column::ClinicId.eq(clinic_id))
            .one(db)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("Doctor {}", doctor_id)))
    }

    /// Mise à jour partielle; la disponibilité complète est revérifiée
    pub async fn update_doctor(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<doctors::Model, DataError> {
        let doctor = Self::get_doctor(db, clinic_id, doctor_id).await?;
        let mut active: doctors::ActiveModel = doctor.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(url) = request.avatar_image_url {
            active.avatar_image_url = Set(url);
        }
        if let Some(specialty) = request.specialty {
            active.specialty = Set(specialty);
        }
        if let Some(day) = request.available_from_weekday {
            active.available_from_weekday = Set(day);
        }
        if let Some(day) = request.available_to_weekday {
            active.available_to_weekday = Set(day);
        }
        if let Some(time) = request.available_from_time {
            active.available_from_time = Set(time);
        }
        if let Some(time) = request.available_to_time {
            active.available_to_time = Set(time);
        }
        if let Some(price) = request.appointment_price_in_cents {
            active.appointment_price_in_cents = Set(price);
        }

        Ok(active.update(db).await?)
    }

    /// Refusé (violation de FK) tant que le médecin a des rendez-vous
    pub async fn delete_doctor(db: &DatabaseConnection, clinic_id: Uuid, doctor_id: Uuid) -> Result<(), DataError> {
        let result = doctors::Entity::delete_many()
            .filter(doctors::Column::Id.eq(doctor_id))
            .filter(doctors::Column::ClinicId.eq(clinic_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DataError::NotFound(format!("Doctor {}", doctor_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    use crate::db;
    use crate::error::ConstraintViolation;
    use crate::models::dto::CreateAppointmentRequest;
    use crate::services::appointment_service::AppointmentService;
    use crate::services::clinic_service::tests::{doctor_request, insert_user, patient_request};
    use crate::services::clinic_service::ClinicService;
    use crate::services::patient_service::PatientService;

    async fn setup() -> (DatabaseConnection, Uuid) {
        let db = db::test_connection().await;
        let owner = insert_user(&db, "owner@clinic.com").await;
        let clinic = ClinicService::create_clinic(&db, &owner.id, "Clínica").await.unwrap();
        (db, clinic.id)
    }

    #[tokio::test]
    async fn test_weekday_range_enforced() {
        let (db, clinic_id) = setup().await;

        for day in [0, 3, 6] {
            let mut request = doctor_request("Dr. Ok");
            request.available_from_weekday = day;
            request.available_to_weekday = day;
            DoctorService::create_doctor(&db, clinic_id, request).await.unwrap();
        }

        for day in [-1, 7, 42] {
            let mut request = doctor_request("Dr. Bad");
            request.available_to_weekday = day;
            let err = DoctorService::create_doctor(&db, clinic_id, request).await.unwrap_err();
            assert!(matches!(err, DataError::Validation(_)), "day {} accepted", day);
        }

        assert_eq!(DoctorService::list_doctors(&db, clinic_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_time_range_and_price_enforced() {
        let (db, clinic_id) = setup().await;

        let mut request = doctor_request("Dr. Night");
        request.available_from_time = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        request.available_to_time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let err = DoctorService::create_doctor(&db, clinic_id, request).await.unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));

        let mut request = doctor_request("Dr. Free");
        request.appointment_price_in_cents = -1;
        let err = DoctorService::create_doctor(&db, clinic_id, request).await.unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_revalidates_availability() {
        let (db, clinic_id) = setup().await;
        let doctor = DoctorService::create_doctor(&db, clinic_id, doctor_request("Dr. House")).await.unwrap();

        let updated = DoctorService::update_doctor(
            &db,
            clinic_id,
            doctor.id,
            UpdateDoctorRequest {
                available_to_weekday: Some(6),
                appointment_price_in_cents: Some(20000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.available_to_weekday, 6);
        assert_eq!(updated.available_from_weekday, 1);
        assert_eq!(updated.appointment_price_in_cents, 20000);

        // fin avant début avec la valeur existante (08:00)
        let err = DoctorService::update_doctor(
            &db,
            clinic_id,
            doctor.id,
            UpdateDoctorRequest {
                available_to_time: Some(NaiveTime::from_hms_opt(7, 0, 0).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_clinic_is_fk_violation() {
        let (db, _clinic_id) = setup().await;
        let err = DoctorService::create_doctor(&db, Uuid::new_v4(), doctor_request("Dr. Ghost"))
            .await
            .unwrap_err();
        assert_eq!(err.violation(), Some(ConstraintViolation::ForeignKey));
    }

    #[tokio::test]
    async fn test_doctor_with_appointments_cannot_be_deleted() {
        let (db, clinic_id) = setup().await;
        let doctor = DoctorService::create_doctor(&db, clinic_id, doctor_request("Dr. House")).await.unwrap();
        let patient = PatientService::create_patient(&db, clinic_id, patient_request("Maria")).await.unwrap();
        let appointment = AppointmentService::create_appointment(
            &db,
            clinic_id,
            CreateAppointmentRequest {
                date: Utc::now().naive_utc(),
                patient_id: patient.id,
                doctor_id: doctor.id,
            },
        )
        .await
        .unwrap();

        let err = DoctorService::delete_doctor(&db, clinic_id, doctor.id).await.unwrap_err();
        assert_eq!(err.violation(), Some(ConstraintViolation::ForeignKey));

        AppointmentService::delete_appointment(&db, clinic_id, appointment.id).await.unwrap();
        DoctorService::delete_doctor(&db, clinic_id, doctor.id).await.unwrap();

        let err = DoctorService::get_doctor(&db, clinic_id, doctor.id).await.unwrap_err();
        assert!(matches!(err, DataError::NotFound(_)));
    }
}
