//! Test utilities for database operations.
//!
//! Provides a migrated scratch database per test run and a handful of row
//! builders for the course and staff tables.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    Set, Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{
    LectureType, course, course_chapter, course_chapter_lecture, course_team_member, role,
    user, user_role,
};
use crate::migrations::Migrator;

/// Tables holding seeded reference data, kept by [`TestDatabase::cleanup`].
const SEEDED_TABLES: &[&str] = &[
    "seaql_migrations",
    "permissions",
    "roles",
    "role_permissions",
];

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "lectern_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "lectern_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "lectern_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// URL of the maintenance database, used to create and drop scratch databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection, shared with the repositories under test.
    pub conn: Arc<DatabaseConnection>,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the configured test database and bring its schema up to date.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and run pending migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Create a uniquely named, freshly migrated database (for parallel tests).
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let unique_suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("lectern_test_{}", &unique_suffix[..8]);

        let postgres_conn = Database::connect(&config.postgres_url()).await?;
        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        postgres_conn.close().await?;

        info!(database = %config.database, "Created unique test database");

        Self::with_config(config).await
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// A handle to the connection for building repositories.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Truncate every table except migrations and seeded reference data.
    ///
    /// Roles created by tests are deleted; the seeded `Staff` role stays.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let tables = self
            .conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                "SELECT tablename FROM pg_tables WHERE schemaname = 'public'".to_string(),
            ))
            .await?;

        for row in tables {
            let Ok(table_name) = row.try_get::<String>("", "tablename") else {
                continue;
            };
            if SEEDED_TABLES.contains(&table_name.as_str()) {
                continue;
            }
            self.conn
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("TRUNCATE TABLE \"{table_name}\" CASCADE"),
                ))
                .await?;
        }

        self.conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                "DELETE FROM roles WHERE name <> 'Staff'".to_string(),
            ))
            .await?;

        info!("Cleaned up test database");
        Ok(())
    }

    /// Drop a database created by [`Self::create_unique`].
    pub async fn drop_database(self) -> Result<(), DbErr> {
        // Repositories still holding a handle keep the pool open until dropped
        if let Ok(conn) = Arc::try_unwrap(self.conn) {
            conn.close().await?;
        }

        let postgres_conn = Database::connect(&self.config.postgres_url()).await?;

        // Lingering pool connections would block the drop
        let terminate = format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
            self.config.database
        );
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, terminate))
            .await
            .ok();

        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database),
            ))
            .await?;
        postgres_conn.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }
}

/// Row builders for integration tests.
pub mod fixtures {
    use super::{
        ActiveModelTrait, DatabaseConnection, DbErr, LectureType, Set, Utc, course,
        course_chapter, course_chapter_lecture, course_team_member, role, user, user_role,
    };

    fn next_id() -> String {
        lectern_common::IdGenerator::new().generate()
    }

    /// Insert a live, active user. The password column holds a placeholder.
    pub async fn user(
        db: &DatabaseConnection,
        name: &str,
        email: &str,
    ) -> Result<user::Model, DbErr> {
        let id = next_id();
        user::ActiveModel {
            id: Set(id.clone()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            slug: Set(format!("{}-{}", lectern_common::slugify(name), &id[20..])),
            password: Set("!".to_string()),
            api_token: Set(None),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            deleted_at: Set(None),
        }
        .insert(db)
        .await
    }

    /// Insert a role.
    pub async fn role(
        db: &DatabaseConnection,
        name: &str,
        custom_role: bool,
    ) -> Result<role::Model, DbErr> {
        role::ActiveModel {
            id: Set(next_id()),
            name: Set(name.to_string()),
            custom_role: Set(custom_role),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
    }

    /// Attach a role to a user.
    pub async fn assign_role(
        db: &DatabaseConnection,
        user_id: &str,
        role_id: &str,
    ) -> Result<user_role::Model, DbErr> {
        user_role::ActiveModel {
            user_id: Set(user_id.to_string()),
            role_id: Set(role_id.to_string()),
        }
        .insert(db)
        .await
    }

    /// Insert a course owned by `owner_id`.
    pub async fn course(
        db: &DatabaseConnection,
        owner_id: &str,
        title: &str,
    ) -> Result<course::Model, DbErr> {
        let id = next_id();
        course::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(owner_id.to_string()),
            title: Set(title.to_string()),
            slug: Set(id),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(db)
        .await
    }

    /// Add a team member to a course.
    pub async fn team_member(
        db: &DatabaseConnection,
        course_id: &str,
        user_id: &str,
    ) -> Result<course_team_member::Model, DbErr> {
        course_team_member::ActiveModel {
            course_id: Set(course_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
    }

    /// Insert a chapter.
    pub async fn chapter(
        db: &DatabaseConnection,
        course_id: &str,
        order: i32,
    ) -> Result<course_chapter::Model, DbErr> {
        course_chapter::ActiveModel {
            id: Set(next_id()),
            course_id: Set(course_id.to_string()),
            title: Set(format!("Chapter {order}")),
            order: Set(order),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(db)
        .await
    }

    /// Insert a lecture.
    pub async fn lecture(
        db: &DatabaseConnection,
        chapter_id: &str,
        lecture_type: LectureType,
        order: i32,
    ) -> Result<course_chapter_lecture::Model, DbErr> {
        course_chapter_lecture::ActiveModel {
            id: Set(next_id()),
            course_chapter_id: Set(chapter_id.to_string()),
            title: Set(format!("Lecture {order}")),
            lecture_type: Set(lecture_type),
            description: Set(None),
            duration: Set(None),
            is_active: Set(true),
            order: Set(order),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(db)
        .await
    }
}
