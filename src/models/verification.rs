// ============================================================================
// MODÈLE : VERIFICATION
// ============================================================================
//
// Tokens à usage unique (vérification d'email). Pas de FK: l'identifier est
// l'email visé, la value est le token envoyé dans le lien.
//
// Workflow:
//   1. POST /api/auth/send-verification-email
//   2. insertion (identifier = email, value = token, expires_at = now + 24h)
//   3. GET /api/auth/verify-email?token=xxx
//   4. users.email_verified = true, la ligne est supprimée
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "verification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub identifier: String,
    #[sea_orm(column_type = "Text")]
    pub value: String,
    pub expires_at: DateTime,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

impl Model {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().naive_utc()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now().naive_utc();
        if insert {
            if self.id.is_not_set() {
                self.id = Set(Uuid::new_v4().to_string());
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(Some(now));
            }
        }
        self.updated_at = Set(Some(now));
        Ok(self)
    }
}
