//! Create ratings table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ratings::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Ratings::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Ratings::Rating).small_integer().not_null())
                    .col(ColumnDef::new(Ratings::Review).text())
                    .col(ColumnDef::new(Ratings::RateableType).string_len(32).not_null())
                    .col(ColumnDef::new(Ratings::RateableId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Ratings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Ratings::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_user")
                            .from(Ratings::Table, Ratings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (rateable_type, rateable_id) for a target's ratings
        manager
            .create_index(
                Index::create()
                    .name("idx_ratings_rateable")
                    .table(Ratings::Table)
                    .col(Ratings::RateableType)
                    .col(Ratings::RateableId)
                    .to_owned(),
            )
            .await?;

        // Unique index: one rating per author and target
        manager
            .create_index(
                Index::create()
                    .name("idx_ratings_author_rateable")
                    .table(Ratings::Table)
                    .col(Ratings::UserId)
                    .col(Ratings::RateableType)
                    .col(Ratings::RateableId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ratings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Ratings {
    Table,
    Id,
    UserId,
    Rating,
    Review,
    RateableType,
    RateableId,
    CreatedAt,
    UpdatedAt,
}
