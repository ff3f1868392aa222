//! Create courses, course_team_members and course_chapters tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Courses::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Courses::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Courses::Slug).string_len(255).not_null().unique_key())
                    .col(ColumnDef::new(Courses::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Courses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Courses::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_user")
                            .from(Courses::Table, Courses::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (instructor's courses)
        manager
            .create_index(
                Index::create()
                    .name("idx_courses_user_id")
                    .table(Courses::Table)
                    .col(Courses::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseTeamMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CourseTeamMembers::CourseId).string_len(32).not_null())
                    .col(ColumnDef::new(CourseTeamMembers::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(CourseTeamMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(CourseTeamMembers::CourseId)
                            .col(CourseTeamMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_team_members_course")
                            .from(CourseTeamMembers::Table, CourseTeamMembers::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_team_members_user")
                            .from(CourseTeamMembers::Table, CourseTeamMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseChapters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CourseChapters::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(CourseChapters::CourseId).string_len(32).not_null())
                    .col(ColumnDef::new(CourseChapters::Title).string_len(255).not_null())
                    .col(ColumnDef::new(CourseChapters::Order).integer().not_null().default(0))
                    .col(ColumnDef::new(CourseChapters::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(CourseChapters::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(CourseChapters::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_chapters_course")
                            .from(CourseChapters::Table, CourseChapters::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (course_id, order) for ordered listing
        manager
            .create_index(
                Index::create()
                    .name("idx_course_chapters_course_order")
                    .table(CourseChapters::Table)
                    .col(CourseChapters::CourseId)
                    .col(CourseChapters::Order)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CourseChapters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseTeamMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Courses {
    Table,
    Id,
    UserId,
    Title,
    Slug,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CourseTeamMembers {
    Table,
    CourseId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum CourseChapters {
    Table,
    Id,
    CourseId,
    Title,
    Order,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
