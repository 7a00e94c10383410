// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - dto : requêtes / réponses de l'API (validées avec `validator`)
//   - users, session, account, verification : tables du module d'auth
//   - clinics : cliniques
//   - users_to_clinics : appartenance user <-> clinique
//   - doctors, patients, appointments : agenda d'une clinique
//
// Points d'attention:
//   - Les FK et les règles ON DELETE sont déclarées dans les `Relation`
//     de chaque modèle; db::create_schema s'en sert pour créer les tables
//   - id / created_at / updated_at sont remplis dans before_save
//
// ============================================================================

pub mod health;
pub mod dto;
pub mod users;
pub mod session;
pub mod account;
pub mod verification;
pub mod clinics;
pub mod users_to_clinics;
pub mod doctors;
pub mod patients;
pub mod appointments;
