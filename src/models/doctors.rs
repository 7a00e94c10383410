// ============================================================================
// MODÈLE : DOCTORS
// ============================================================================
//
// Disponibilité hebdomadaire:
//   - available_from_weekday / available_to_weekday : 0 = dimanche,
//     1 = lundi, ..., 6 = samedi
//   - available_from_time / available_to_time : plage horaire de la journée
//
// Points d'attention:
//   - ON DELETE CASCADE: si la clinique est supprimée, ses médecins aussi
//   - un médecin qui a encore des rendez-vous ne peut pas être supprimé
//     (FK appointments.doctor_id sans cascade)
//   - les jours hors 0..=6 sont refusés avant l'écriture (before_save)
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set, Value};
use serde::{Deserialize, Serialize};

pub const MIN_WEEKDAY: i32 = 0;
pub const MAX_WEEKDAY: i32 = 6;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "doctors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub clinic_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub avatar_image_url: String,
    #[sea_orm(column_type = "Text")]
    pub specialty: String,
    pub available_from_weekday: i32,
    pub available_to_weekday: i32,
    pub available_from_time: Time,
    pub available_to_time: Time,
    pub appointment_price_in_cents: i32,
    pub created_at: DateTime,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clinics::Entity",
        from = "Column::ClinicId",
        to = "super::clinics::Column::Id",
        on_delete = "Cascade"
    )]
    Clinic,

    #[sea_orm(has_many = "super::appointments::Entity")]
    Appointments,
}

impl Related<super::clinics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clinic.def()
    }
}

impl Related<super::appointments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointments.def()
    }
}

pub fn is_valid_weekday(day: i32) -> bool {
    (MIN_WEEKDAY..=MAX_WEEKDAY).contains(&day)
}

/// Vérifie une disponibilité complète. Renvoie le message d'erreur à afficher.
pub fn check_availability(
    from_weekday: i32,
    to_weekday: i32,
    from_time: Time,
    to_time: Time,
) -> Result<(), String> {
    if !is_valid_weekday(from_weekday) {
        return Err(format!(
            "available_from_weekday must be between {} and {}, got {}",
            MIN_WEEKDAY, MAX_WEEKDAY, from_weekday
        ));
    }
    if !is_valid_weekday(to_weekday) {
        return Err(format!(
            "available_to_weekday must be between {} and {}, got {}",
            MIN_WEEKDAY, MAX_WEEKDAY, to_weekday
        ));
    }
    if to_time <= from_time {
        return Err("available_to_time must be after available_from_time".to_string());
    }
    Ok(())
}

/// Valeur Set ou Unchanged d'un champ
fn current<V: Into<Value>>(value: &ActiveValue<V>) -> Option<&V> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        // Les champs NotSet (update partiel) ne sont pas vérifiés ici
        if let (Some(from_wd), Some(to_wd), Some(from_t), Some(to_t)) = (
            current(&self.available_from_weekday),
            current(&self.available_to_weekday),
            current(&self.available_from_time),
            current(&self.available_to_time),
        ) {
            check_availability(*from_wd, *to_wd, *from_t, *to_t).map_err(DbErr::Custom)?;
        } else {
            for day in [
                current(&self.available_from_weekday),
                current(&self.available_to_weekday),
            ]
            .into_iter()
            .flatten()
            {
                if !is_valid_weekday(*day) {
                    return Err(DbErr::Custom(format!(
                        "weekday must be between {} and {}, got {}",
                        MIN_WEEKDAY, MAX_WEEKDAY, day
                    )));
                }
            }
        }

        if let Some(price) = current(&self.appointment_price_in_cents) {
            if *price < 0 {
                return Err(DbErr::Custom(
                    "appointment_price_in_cents must not be negative".to_string(),
                ));
            }
        }

        let now = Utc::now().naive_utc();
        if insert {
            if self.id.is_not_set() {
                self.id = Set(Uuid::new_v4());
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
        }
        self.updated_at = Set(Some(now));
        Ok(self)
    }
}
