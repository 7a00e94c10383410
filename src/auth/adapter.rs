// ============================================================================
// AUTH - ADAPTATEUR DE STOCKAGE
// ============================================================================
//
// Description:
//   Tout ce dont AuthService a besoin pour persister users / account /
//   session / verification. AuthService ne touche jamais la BD directement,
//   uniquement via ce trait.
//
// Points d'attention:
//   - user + compte "credential" sont créés dans une seule transaction
//   - les erreurs remontent telles quelles (DbErr), AuthService les classe
//
// ============================================================================

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::models::{account, session, users, verification};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
pub trait AuthAdapter: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr>;

    /// Crée le user et son compte "credential" (hash du mot de passe)
    async fn create_user_with_password(
        &self,
        user: NewUser,
        password_hash: String,
    ) -> Result<users::Model, DbErr>;

    async fn mark_email_verified(&self, user_id: &str) -> Result<users::Model, DbErr>;

    async fn find_credential_account(&self, user_id: &str) -> Result<Option<account::Model>, DbErr>;

    async fn update_account_password(&self, account: account::Model, password_hash: String) -> Result<(), DbErr>;

    async fn create_session(&self, session: NewSession) -> Result<session::Model, DbErr>;

    /// Session + user propriétaire
    async fn find_session(&self, token: &str) -> Result<Option<(session::Model, users::Model)>, DbErr>;

    async fn extend_session(&self, session: session::Model, expires_at: NaiveDateTime) -> Result<session::Model, DbErr>;

    async fn delete_session(&self, token: &str) -> Result<u64, DbErr>;

    /// Supprime toutes les sessions d'un user, sauf éventuellement `keep_token`
    async fn delete_user_sessions(&self, user_id: &str, keep_token: Option<&str>) -> Result<u64, DbErr>;

    async fn create_verification(
        &self,
        identifier: &str,
        value: &str,
        expires_at: NaiveDateTime,
    ) -> Result<verification::Model, DbErr>;

    async fn find_verification(&self, value: &str) -> Result<Option<verification::Model>, DbErr>;

    async fn delete_verification(&self, id: &str) -> Result<(), DbErr>;
}

/// Implémentation SeaORM (PostgreSQL en prod, SQLite dans les tests)
#[derive(Clone)]
pub struct SeaOrmAdapter {
    db: DatabaseConnection,
}

impl SeaOrmAdapter {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthAdapter for SeaOrmAdapter {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    async fn create_user_with_password(
        &self,
        user: NewUser,
        password_hash: String,
    ) -> Result<users::Model, DbErr> {
        let txn = self.db.begin().await?;

        let created = users::ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            email_verified: Set(false),
            image: Set(user.image),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        account::ActiveModel {
            account_id: Set(created.id.clone()),
            provider_id: Set(account::CREDENTIAL_PROVIDER.to_string()),
            user_id: Set(created.id.clone()),
            access_token: Set(None),
            refresh_token: Set(None),
            id_token: Set(None),
            access_token_expires_at: Set(None),
            refresh_token_expires_at: Set(None),
            scope: Set(None),
            password: Set(Some(password_hash)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    async fn mark_email_verified(&self, user_id: &str) -> Result<users::Model, DbErr> {
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("User {}", user_id)))?;

        let mut active: users::ActiveModel = user.into();
        active.email_verified = Set(true);
        active.update(&self.db).await
    }

    async fn find_credential_account(&self, user_id: &str) -> Result<Option<account::Model>, DbErr> {
        account::Entity::find()
            .filter(account::Column::UserId.eq(user_id))
            .filter(account::Column::ProviderId.eq(account::CREDENTIAL_PROVIDER))
            .one(&self.db)
            .await
    }

    async fn update_account_password(&self, account: account::Model, password_hash: String) -> Result<(), DbErr> {
        let mut active: account::ActiveModel = account.into();
        active.password = Set(Some(password_hash));
        active.update(&self.db).await?;
        Ok(())
    }

    async fn create_session(&self, new: NewSession) -> Result<session::Model, DbErr> {
        session::ActiveModel {
            expires_at: Set(new.expires_at),
            token: Set(new.token),
            ip_address: Set(new.ip_address),
            user_agent: Set(new.user_agent),
            user_id: Set(new.user_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    async fn find_session(&self, token: &str) -> Result<Option<(session::Model, users::Model)>, DbErr> {
        let found = session::Entity::find()
            .filter(session::Column::Token.eq(token))
            .find_also_related(users::Entity)
            .one(&self.db)
            .await?;

        // user toujours présent grâce à la FK, mais on reste prudent
        Ok(found.and_then(|(s, u)| u.map(|u| (s, u))))
    }

    async fn extend_session(&self, session: session::Model, expires_at: NaiveDateTime) -> Result<session::Model, DbErr> {
        let mut active: session::ActiveModel = session.into();
        active.expires_at = Set(expires_at);
        active.update(&self.db).await
    }

    async fn delete_session(&self, token: &str) -> Result<u64, DbErr> {
        let result = session::Entity::delete_many()
            .filter(session::Column::Token.eq(token))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_user_sessions(&self, user_id: &str, keep_token: Option<&str>) -> Result<u64, DbErr> {
        let mut query = session::Entity::delete_many().filter(session::Column::UserId.eq(user_id));
        if let Some(token) = keep_token {
            query = query.filter(session::Column::Token.ne(token));
        }
        let result = query.exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    async fn create_verification(
        &self,
        identifier: &str,
        value: &str,
        expires_at: NaiveDateTime,
    ) -> Result<verification::Model, DbErr> {
        verification::ActiveModel {
            identifier: Set(identifier.to_string()),
            value: Set(value.to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    async fn find_verification(&self, value: &str) -> Result<Option<verification::Model>, DbErr> {
        verification::Entity::find()
            .filter(verification::Column::Value.eq(value))
            .one(&self.db)
            .await
    }

    async fn delete_verification(&self, id: &str) -> Result<(), DbErr> {
        verification::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
