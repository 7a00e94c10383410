use sea_orm::*;

use crate::error::DataError;
use crate::models::users;

pub struct UserService;

impl UserService {
    pub async fn get_user(db: &DatabaseConnection, user_id: &str) -> Result<users::Model, DataError> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("User {}", user_id)))
    }

    pub async fn find_user_by_email(db: &DatabaseConnection, email: &str) -> Result<users::Model, DataError> {
        let email = email.trim().to_lowercase();
        users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("User {}", email)))
    }

    /// Supprime un user: sessions et comptes partent en cascade.
    /// Un user encore membre d'une clinique est refusé (violation de FK).
    pub async fn delete_user(db: &DatabaseConnection, user_id: &str) -> Result<(), DataError> {
        let result = users::Entity::delete_by_id(user_id.to_string()).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(DataError::NotFound(format!("User {}", user_id)));
        }
        tracing::info!(user_id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::{AuthService, RequestMeta, SeaOrmAdapter};
    use crate::config::AuthConfig;
    use crate::db;
    use crate::error::ConstraintViolation;
    use crate::models::dto::SignUpRequest;
    use crate::models::{account, clinics, session};
    use crate::services::clinic_service::tests::insert_user;
    use crate::services::clinic_service::ClinicService;

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = db::test_connection().await;
        insert_user(&db, "same@clinic.com").await;

        let err: DataError = users::ActiveModel {
            name: Set("Copy".to_string()),
            email: Set("same@clinic.com".to_string()),
            email_verified: Set(false),
            image: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap_err()
        .into();
        assert_eq!(err.violation(), Some(ConstraintViolation::Unique));
    }

    #[tokio::test]
    async fn test_delete_user_cascades_sessions_and_accounts() {
        let db = db::test_connection().await;
        let auth = AuthService::new(SeaOrmAdapter::new(db.clone()), AuthConfig::default());

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

        // clinique sans lien avec ce user
        let owner = insert_user(&db, "owner@clinic.com").await;
        let clinic = ClinicService::create_clinic(&db, &owner.id, "Clínica").await.unwrap();

        UserService::delete_user(&db, &created.user.id).await.unwrap();

        assert!(session::Entity::find().all(&db).await.unwrap().is_empty());
        assert!(account::Entity::find().all(&db).await.unwrap().is_empty());
        assert!(clinics::Entity::find_by_id(clinic.id).one(&db).await.unwrap().is_some());
        assert!(matches!(
            UserService::get_user(&db, &created.user.id).await.unwrap_err(),
            DataError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_member_cannot_be_deleted() {
        let db = db::test_connection().await;
        let owner = insert_user(&db, "owner@clinic.com").await;
        ClinicService::create_clinic(&db, &owner.id, "Clínica").await.unwrap();

        let err = UserService::delete_user(&db, &owner.id).await.unwrap_err();
        assert_eq!(err.violation(), Some(ConstraintViolation::ForeignKey));
        assert!(UserService::get_user(&db, &owner.id).await.is_ok());
    }
}
