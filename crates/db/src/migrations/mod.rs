//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_role_tables;
mod m20250101_000003_create_course_tables;
mod m20250101_000004_create_lecture_tables;
mod m20250101_000005_create_quiz_tables;
mod m20250101_000006_create_assignment_table;
mod m20250101_000007_create_rating_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_role_tables::Migration),
            Box::new(m20250101_000003_create_course_tables::Migration),
            Box::new(m20250101_000004_create_lecture_tables::Migration),
            Box::new(m20250101_000005_create_quiz_tables::Migration),
            Box::new(m20250101_000006_create_assignment_table::Migration),
            Box::new(m20250101_000007_create_rating_table::Migration),
        ]
    }
}
