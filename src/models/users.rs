// ============================================================================
// MODÈLE : USERS
// ============================================================================
//
// Colonnes de la table users:
//   - id (TEXT, PRIMARY KEY) - généré par le module d'auth
//   - name (TEXT, NOT NULL)
//   - email (TEXT, UNIQUE, NOT NULL)
//   - email_verified (BOOLEAN, NOT NULL)
//   - image (TEXT, NULL)
//   - created_at / updated_at (TIMESTAMP, NOT NULL)
//
// Points d'attention:
//   - ON DELETE CASCADE côté session et account
//   - users_to_clinics n'est PAS en cascade: un user encore membre d'une
//     clinique ne peut pas être supprimé
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(unique, column_type = "Text")]
    pub email: String,
    pub email_verified: bool,
    #[sea_orm(column_type = "Text")]
    pub image: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session::Entity")]
    Session,

    #[sea_orm(has_many = "super::account::Entity")]
    Account,

    #[sea_orm(has_many = "super::users_to_clinics::Entity")]
    UsersToClinics,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::users_to_clinics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsersToClinics.def()
    }
}

impl Related<super::clinics::Entity> for Entity {
    fn to() -> RelationDef {
        super::users_to_clinics::Relation::Clinic.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::users_to_clinics::Relation::User.def().rev())
    }
}

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
                self.created_at = Set(now);
            }
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
