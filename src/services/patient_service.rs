use sea_orm::*;
use uuid::Uuid;

use crate::error::DataError;
use crate::models::dto::{CreatePatientRequest, UpdatePatientRequest};
use crate::models::patients;

pub struct PatientService;

impl PatientService {
    pub async fn create_patient(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        request: CreatePatientRequest,
    ) -> Result<patients::Model, DataError> {
        let patient = patients::ActiveModel {
            clinic_id: Set(clinic_id),
            name: Set(request.name),
            email: Set(request.email),
            phone_number: Set(request.phone_number),
            sex: Set(request.sex),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(patient)
    }

    pub async fn list_patients(db: &DatabaseConnection, clinic_id: Uuid) -> Result<Vec<patients::Model>, DataError> {
        let patients = patients::Entity::find()
            .filter(patients::Column::ClinicId.eq(clinic_id))
            .order_by_asc(patients::Column::Name)
            .all(db)
            .await?;
        Ok(patients)
    }

    pub async fn get_patient(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        patient_id: Uuid,
    ) -> Result<patients::Model, DataError> {
        patients::Entity::find_by_id(patient_id)
            .filter(patients::Column::ClinicId.eq(clinic_id))
            .one(db)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("Patient {}", patient_id)))
    }

    pub async fn update_patient(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<patients::Model, DataError> {
        let patient = Self::get_patient(db, clinic_id, patient_id).await?;
        let mut active: patients::ActiveModel = patient.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(phone) = request.phone_number {
            active.phone_number = Set(phone);
        }
        if let Some(sex) = request.sex {
            active.sex = Set(sex);
        }

        Ok(active.update(db).await?)
    }

    /// Refusé (violation de FK) tant que le patient a des rendez-vous
    pub async fn delete_patient(db: &DatabaseConnection, clinic_id: Uuid, patient_id: Uuid) -> Result<(), DataError> {
        let result = patients::Entity::delete_many()
            .filter(patients::Column::Id.eq(patient_id))
            .filter(patients::Column::ClinicId.eq(clinic_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DataError::NotFound(format!("Patient {}", patient_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db;
    use crate::models::patients::PatientSex;
    use crate::services::clinic_service::tests::{insert_user, patient_request};
    use crate::services::clinic_service::ClinicService;

    #[tokio::test]
    async fn test_patient_crud() {
        let db = db::test_connection().await;
        let owner = insert_user(&db, "owner@clinic.com").await;
        let clinic = ClinicService::create_clinic(&db, &owner.id, "Clínica").await.unwrap();
        let other = ClinicService::create_clinic(&db, &owner.id, "Outra").await.unwrap();

        let patient = PatientService::create_patient(&db, clinic.id, patient_request("Maria")).await.unwrap();
        assert_eq!(patient.sex, PatientSex::Female);

        let updated = PatientService::update_patient(
            &db,
            clinic.id,
            patient.id,
            UpdatePatientRequest {
                sex: Some(PatientSex::Male),
                phone_number: Some("+55 21 88888-0000".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.sex, PatientSex::Male);
        assert_eq!(updated.name, "Maria");

        // pas visible depuis une autre clinique
        let err = PatientService::get_patient(&db, other.id, patient.id).await.unwrap_err();
        assert!(matches!(err, DataError::NotFound(_)));
        assert!(PatientService::list_patients(&db, other.id).await.unwrap().is_empty());

        PatientService::delete_patient(&db, clinic.id, patient.id).await.unwrap();
        assert!(PatientService::list_patients(&db, clinic.id).await.unwrap().is_empty());
    }
}
