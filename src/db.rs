// connexion BD + création du schéma

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    Schema,
};

use crate::models::{
    account, appointments, clinics, doctors, patients, session, users, users_to_clinics,
    verification,
};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.max_connections(10).sqlx_logging(false);

    Database::connect(options).await
}

/// Crée le type enum et toutes les tables si elles n'existent pas encore.
/// L'ordre compte: une table doit être créée après celles qu'elle référence.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    if backend == DbBackend::Postgres {
        // CREATE TYPE n'a pas de IF NOT EXISTS
        db.execute_unprepared(
            "DO $$ BEGIN \
                CREATE TYPE patients_sex AS ENUM ('male', 'female'); \
             EXCEPTION WHEN duplicate_object THEN null; \
             END $$;",
        )
        .await?;
    }

    create_table(db, users::Entity).await?;
    create_table(db, session::Entity).await?;
    create_table(db, account::Entity).await?;
    create_table(db, verification::Entity).await?;
    create_table(db, clinics::Entity).await?;
    create_table(db, users_to_clinics::Entity).await?;
    create_table(db, doctors::Entity).await?;
    create_table(db, patients::Entity).await?;
    create_table(db, appointments::Entity).await?;

    tracing::info!("database schema ready");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();

    db.execute(backend.build(&statement)).await?;
    Ok(())
}

/// Base SQLite en mémoire avec le schéma complet, pour les tests.
#[cfg(test)]
pub async fn test_connection() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    create_schema(&db).await.unwrap();
    db
}
