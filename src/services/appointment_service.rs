use sea_orm::*;
use uuid::Uuid;

use crate::error::DataError;
use crate::models::dto::{AppointmentWithRelations, CreateAppointmentRequest};
use crate::models::{appointments, doctors, patients};

pub struct AppointmentService;

impl AppointmentService {
    /// Crée un rendez-vous.
    /// - patient / médecin inconnus: la FK refuse l'insertion
    /// - patient / médecin d'une autre clinique: Validation
    pub async fn create_appointment(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        request: CreateAppointmentRequest,
    ) -> Result<appointments::Model, DataError> {
        if let Some(doctor) = doctors::Entity::find_by_id(request.doctor_id).one(db).await? {
            if doctor.clinic_id != clinic_id {
                return Err(DataError::Validation("Doctor belongs to another clinic".to_string()));
            }
        }
        if let Some(patient) = patients::Entity::find_by_id(request.patient_id).one(db).await? {
            if patient.clinic_id != clinic_id {
                return Err(DataError::Validation("Patient belongs to another clinic".to_string()));
            }
        }

        let appointment = appointments::ActiveModel {
            date: Set(request.date),
            clinic_id: Set(clinic_id),
            patient_id: Set(request.patient_id),
            doctor_id: Set(request.doctor_id),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(appointment_id = %appointment.id, clinic_id = %clinic_id, "appointment created");
        Ok(appointment)
    }

    /// Rendez-vous d'une clinique par date, avec patient et médecin
    pub async fn list_appointments(
        db: &DatabaseConnection,
        clinic_id: Uuid,
    ) -> Result<Vec<AppointmentWithRelations>, DataError> {
        let appointments = appointments::Entity::find()
            .filter(appointments::Column::ClinicId.eq(clinic_id))
            .order_by_asc(appointments::Column::Date)
            .all(db)
            .await?;

        let patients = appointments.load_one(patients::Entity, db).await?;
        let doctors = appointments.load_one(doctors::Entity, db).await?;

        Ok(appointments
            .into_iter()
            .zip(patients)
            .zip(doctors)
            .map(|((appointment, patient), doctor)| AppointmentWithRelations {
                appointment,
                patient,
                doctor,
            })
            .collect())
    }

    pub async fn delete_appointment(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<(), DataError> {
        let result = appointments::Entity::delete_many()
            .filter(appointments::Column::Id.eq(appointment_id))
            .filter(appointments::Column::ClinicId.eq(clinic_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DataError::NotFound(format!("Appointment {}", appointment_id)));
        }
        Ok(())
    }
}
