//! Create course_chapters_lectures, lecture_videos and lecture_documents tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lectures::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lectures::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Lectures::CourseChapterId).string_len(32).not_null())
                    .col(ColumnDef::new(Lectures::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Lectures::Type).string_len(16).not_null())
                    .col(ColumnDef::new(Lectures::Description).text())
                    .col(ColumnDef::new(Lectures::Duration).integer())
                    .col(ColumnDef::new(Lectures::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Lectures::Order).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Lectures::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Lectures::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lectures_chapter")
                            .from(Lectures::Table, Lectures::CourseChapterId)
                            .to(CourseChapters::Table, CourseChapters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (course_chapter_id, order) for ordered listing and max(order)
        manager
            .create_index(
                Index::create()
                    .name("idx_lectures_chapter_order")
                    .table(Lectures::Table)
                    .col(Lectures::CourseChapterId)
                    .col(Lectures::Order)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LectureVideos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LectureVideos::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(LectureVideos::LectureId).string_len(32).not_null())
                    .col(ColumnDef::new(LectureVideos::Title).string_len(255).not_null())
                    .col(ColumnDef::new(LectureVideos::Url).string_len(1024).not_null())
                    .col(ColumnDef::new(LectureVideos::Duration).integer())
                    .col(
                        ColumnDef::new(LectureVideos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lecture_videos_lecture_id")
                    .table(LectureVideos::Table)
                    .col(LectureVideos::LectureId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LectureDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LectureDocuments::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LectureDocuments::LectureId).string_len(32).not_null())
                    .col(ColumnDef::new(LectureDocuments::Title).string_len(255).not_null())
                    .col(ColumnDef::new(LectureDocuments::FileUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(LectureDocuments::FileType).string_len(16))
                    .col(
                        ColumnDef::new(LectureDocuments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lecture_documents_lecture_id")
                    .table(LectureDocuments::Table)
                    .col(LectureDocuments::LectureId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LectureDocuments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LectureVideos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lectures::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CourseChapters {
    Table,
    Id,
}

#[derive(Iden)]
enum Lectures {
    #[iden = "course_chapters_lectures"]
    Table,
    Id,
    CourseChapterId,
    Title,
    Type,
    Description,
    Duration,
    IsActive,
    Order,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum LectureVideos {
    Table,
    Id,
    LectureId,
    Title,
    Url,
    Duration,
    CreatedAt,
}

#[derive(Iden)]
enum LectureDocuments {
    Table,
    Id,
    LectureId,
    Title,
    FileUrl,
    FileType,
    CreatedAt,
}
