//! Create quizzes, quiz_questions and quiz_answers tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quizzes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quizzes::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Quizzes::LectureId).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Quizzes::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Quizzes::Description).text())
                    .col(ColumnDef::new(Quizzes::PassPercentage).integer().not_null().default(50))
                    .col(
                        ColumnDef::new(Quizzes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuizQuestions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QuizQuestions::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(QuizQuestions::QuizId).string_len(32).not_null())
                    .col(ColumnDef::new(QuizQuestions::Question).text().not_null())
                    .col(ColumnDef::new(QuizQuestions::Order).integer().not_null().default(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quiz_questions_quiz_id")
                    .table(QuizQuestions::Table)
                    .col(QuizQuestions::QuizId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuizAnswers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QuizAnswers::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(QuizAnswers::QuestionId).string_len(32).not_null())
                    .col(ColumnDef::new(QuizAnswers::Answer).text().not_null())
                    .col(ColumnDef::new(QuizAnswers::IsCorrect).boolean().not_null().default(false))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quiz_answers_question_id")
                    .table(QuizAnswers::Table)
                    .col(QuizAnswers::QuestionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuizAnswers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QuizQuestions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Quizzes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Quizzes {
    Table,
    Id,
    LectureId,
    Title,
    Description,
    PassPercentage,
    CreatedAt,
}

#[derive(Iden)]
enum QuizQuestions {
    Table,
    Id,
    QuizId,
    Question,
    Order,
}

#[derive(Iden)]
enum QuizAnswers {
    Table,
    Id,
    QuestionId,
    Answer,
    IsCorrect,
}
