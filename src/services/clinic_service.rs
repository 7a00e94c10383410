use sea_orm::*;
use uuid::Uuid;

use crate::error::DataError;
use crate::models::{clinics, users_to_clinics};

pub struct ClinicService;

impl ClinicService {
    /// Crée une clinique et y inscrit son créateur (même transaction)
    pub async fn create_clinic(
        db: &DatabaseConnection,
        owner_user_id: &str,
        name: &str,
    ) -> Result<clinics::Model, DataError> {
        let txn = db.begin().await?;

        let clinic = clinics::ActiveModel {
            name: Set(name.trim().to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        users_to_clinics::ActiveModel {
            user_id: Set(owner_user_id.to_string()),
            clinic_id: Set(clinic.id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!(clinic_id = %clinic.id, user_id = owner_user_id, "clinic created");
        Ok(clinic)
    }

    /// Cliniques dont le user est membre, par date de création
    pub async fn list_clinics_for_user(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> Result<Vec<clinics::Model>, DataError> {
        let clinics = clinics::Entity::find()
            .inner_join(users_to_clinics::Entity)
            .filter(users_to_clinics::Column::UserId.eq(user_id))
            .order_by_asc(clinics::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(clinics)
    }

    pub async fn get_clinic(db: &DatabaseConnection, clinic_id: Uuid) -> Result<clinics::Model, DataError> {
        clinics::Entity::find_by_id(clinic_id)
            .one(db)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("Clinic {}", clinic_id)))
    }

    pub async fn rename_clinic(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        name: &str,
    ) -> Result<clinics::Model, DataError> {
        let clinic = Self::get_clinic(db, clinic_id).await?;
        let mut active: clinics::ActiveModel = clinic.into();
        active.name = Set(name.trim().to_string());
        Ok(active.update(db).await?)
    }

    /// Supprime une clinique. Médecins, patients et rendez-vous partent en
    /// cascade; les adhésions (sans cascade) sont supprimées avant.
    pub async fn delete_clinic(db: &DatabaseConnection, clinic_id: Uuid) -> Result<(), DataError> {
        let txn = db.begin().await?;

        users_to_clinics::Entity::delete_many()
            .filter(users_to_clinics::Column::ClinicId.eq(clinic_id))
            .exec(&txn)
            .await?;

        let result = clinics::Entity::delete_by_id(clinic_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DataError::NotFound(format!("Clinic {}", clinic_id)));
        }

        txn.commit().await?;
        tracing::info!(clinic_id = %clinic_id, "clinic deleted");
        Ok(())
    }

    pub async fn add_member(
        db: &DatabaseConnection,
        clinic_id: Uuid,
        user_id: &str,
    ) -> Result<users_to_clinics::Model, DataError> {
        let membership = users_to_clinics::ActiveModel {
            user_id: Set(user_id.to_string()),
            clinic_id: Set(clinic_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(membership)
    }

    pub async fn is_member(db: &DatabaseConnection, clinic_id: Uuid, user_id: &str) -> Result<bool, DataError> {
        let membership = users_to_clinics::Entity::find_by_id((user_id.to_string(), clinic_id))
            .one(db)
            .await?;
        Ok(membership.is_some())
    }
}
