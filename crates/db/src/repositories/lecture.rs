//! Lecture repository.

use std::sync::Arc;

use crate::entities::{
    Assignment, CourseChapterLecture, LectureDocument, LectureType, LectureVideo, Quiz,
    QuizAnswer, QuizQuestion, assignment, course_chapter_lecture, lecture_document,
    lecture_video, quiz, quiz_answer, quiz_question,
};
use chrono::Utc;
use lectern_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

/// Lecture repository for database operations.
#[derive(Clone)]
pub struct LectureRepository {
    db: Arc<DatabaseConnection>,
}

impl LectureRepository {
    /// Create a new lecture repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lectures of a chapter by `order`, ties broken by ID.
    pub async fn find_by_chapter(
        &self,
        chapter_id: &str,
    ) -> AppResult<Vec<course_chapter_lecture::Model>> {
        CourseChapterLecture::find()
            .filter(course_chapter_lecture::Column::CourseChapterId.eq(chapter_id))
            .order_by_asc(course_chapter_lecture::Column::Order)
            .order_by_asc(course_chapter_lecture::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a lecture, scoped to its chapter.
    pub async fn find_in_chapter(
        &self,
        chapter_id: &str,
        lecture_id: &str,
    ) -> AppResult<Option<course_chapter_lecture::Model>> {
        CourseChapterLecture::find_by_id(lecture_id)
            .filter(course_chapter_lecture::Column::CourseChapterId.eq(chapter_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find lectures by IDs, in any chapter.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<course_chapter_lecture::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        CourseChapterLecture::find()
            .filter(course_chapter_lecture::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Highest `order` in a chapter, `None` when it has no lectures.
    pub async fn max_order(&self, chapter_id: &str) -> AppResult<Option<i32>> {
        let max = CourseChapterLecture::find()
            .select_only()
            .column_as(course_chapter_lecture::Column::Order.max(), "max_order")
            .filter(course_chapter_lecture::Column::CourseChapterId.eq(chapter_id))
            .into_tuple::<Option<i32>>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(max.flatten())
    }

    /// Insert a lecture.
    pub async fn create(
        &self,
        model: course_chapter_lecture::ActiveModel,
    ) -> AppResult<course_chapter_lecture::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a lecture.
    pub async fn update(
        &self,
        model: course_chapter_lecture::ActiveModel,
    ) -> AppResult<course_chapter_lecture::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a lecture together with the content its type selects.
    ///
    /// Quiz content goes answers first, then questions, then the quiz.
    pub async fn delete_cascade(&self, lecture: &course_chapter_lecture::Model) -> AppResult<()> {
        let lecture_id = lecture.id.clone();
        let lecture_type = lecture.lecture_type;

        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    match lecture_type {
                        LectureType::Video => {
                            LectureVideo::delete_many()
                                .filter(lecture_video::Column::LectureId.eq(lecture_id.as_str()))
                                .exec(txn)
                                .await?;
                        }
                        LectureType::Document => {
                            LectureDocument::delete_many()
                                .filter(lecture_document::Column::LectureId.eq(lecture_id.as_str()))
                                .exec(txn)
                                .await?;
                        }
                        LectureType::Quiz => delete_quiz(txn, &lecture_id).await?,
                        LectureType::Assignment => {
                            Assignment::delete_many()
                                .filter(assignment::Column::LectureId.eq(lecture_id.as_str()))
                                .exec(txn)
                                .await?;
                        }
                    }

                    CourseChapterLecture::delete_by_id(lecture_id)
                        .exec(txn)
                        .await?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist new `order` values in one transaction.
    pub async fn apply_order(&self, orders: Vec<(String, i32)>) -> AppResult<()> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    let now = Utc::now().fixed_offset();
                    for (id, order) in orders {
                        CourseChapterLecture::update_many()
                            .col_expr(course_chapter_lecture::Column::Order, Expr::value(order))
                            .col_expr(course_chapter_lecture::Column::UpdatedAt, Expr::value(now))
                            .filter(course_chapter_lecture::Column::Id.eq(id))
                            .exec(txn)
                            .await?;
                    }
                    Ok(())
                })
            })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

async fn delete_quiz(txn: &DatabaseTransaction, lecture_id: &str) -> Result<(), DbErr> {
    let Some(quiz) = Quiz::find()
        .filter(quiz::Column::LectureId.eq(lecture_id))
        .one(txn)
        .await?
    else {
        return Ok(());
    };

    let question_ids: Vec<String> = QuizQuestion::find()
        .select_only()
        .column(quiz_question::Column::Id)
        .filter(quiz_question::Column::QuizId.eq(quiz.id.as_str()))
        .into_tuple()
        .all(txn)
        .await?;

    if !question_ids.is_empty() {
        QuizAnswer::delete_many()
            .filter(quiz_answer::Column::QuestionId.is_in(question_ids))
            .exec(txn)
            .await?;
    }

    QuizQuestion::delete_many()
        .filter(quiz_question::Column::QuizId.eq(quiz.id.as_str()))
        .exec(txn)
        .await?;

    Quiz::delete_by_id(quiz.id).exec(txn).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    pub(crate) fn create_test_lecture(
        id: &str,
        chapter_id: &str,
        lecture_type: LectureType,
        order: i32,
    ) -> course_chapter_lecture::Model {
        course_chapter_lecture::Model {
            id: id.to_string(),
            course_chapter_id: chapter_id.to_string(),
            title: format!("Lecture {order}"),
            lecture_type,
            description: None,
            duration: Some(10),
            is_active: true,
            order,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn executed_sql(db: Arc<DatabaseConnection>) -> Vec<String> {
        Arc::try_unwrap(db)
            .ok()
            .unwrap()
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_max_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! { "max_order" => Value::Int(Some(4)) }]])
                .append_query_results([[maplit::btreemap! { "max_order" => Value::Int(None) }]])
                .into_connection(),
        );

        let repo = LectureRepository::new(db);
        assert_eq!(repo.max_order("ch1").await.unwrap(), Some(4));
        assert_eq!(repo.max_order("empty").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_chapter_orders_by_order_then_id() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_lecture("l1", "ch1", LectureType::Video, 1),
                    create_test_lecture("l2", "ch1", LectureType::Quiz, 2),
                ]])
                .into_connection(),
        );

        let repo = LectureRepository::new(db.clone());
        let lectures = repo.find_by_chapter("ch1").await.unwrap();
        assert_eq!(lectures.len(), 2);

        drop(repo);
        let sql = executed_sql(db);
        assert!(sql[0].contains("ORDER BY \"course_chapters_lectures\".\"order\" ASC, \"course_chapters_lectures\".\"id\" ASC"));
    }

    #[tokio::test]
    async fn test_delete_quiz_lecture_removes_answers_questions_quiz_then_lecture() {
        let quiz = quiz::Model {
            id: "q1".to_string(),
            lecture_id: "l1".to_string(),
            title: "Checkpoint".to_string(),
            description: None,
            pass_percentage: 60,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[quiz]])
                .append_query_results([[
                    maplit::btreemap! { "id" => Value::from("qq1") },
                    maplit::btreemap! { "id" => Value::from("qq2") },
                ]])
                .append_exec_results([exec(4), exec(2), exec(1), exec(1)])
                .into_connection(),
        );

        let repo = LectureRepository::new(db.clone());
        let lecture = create_test_lecture("l1", "ch1", LectureType::Quiz, 1);
        repo.delete_cascade(&lecture).await.unwrap();

        drop(repo);
        let deletes: Vec<String> = executed_sql(db)
            .into_iter()
            .filter(|s| s.starts_with("DELETE"))
            .collect();
        assert_eq!(deletes.len(), 4);
        assert!(deletes[0].starts_with("DELETE FROM \"quiz_answers\""));
        assert!(deletes[1].starts_with("DELETE FROM \"quiz_questions\""));
        assert!(deletes[2].starts_with("DELETE FROM \"quizzes\""));
        assert!(deletes[3].starts_with("DELETE FROM \"course_chapters_lectures\""));
    }

    #[tokio::test]
    async fn test_delete_video_lecture() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(2), exec(1)])
                .into_connection(),
        );

        let repo = LectureRepository::new(db.clone());
        let lecture = create_test_lecture("l1", "ch1", LectureType::Video, 1);
        repo.delete_cascade(&lecture).await.unwrap();

        drop(repo);
        let sql = executed_sql(db);
        let deletes: Vec<&String> = sql.iter().filter(|s| s.starts_with("DELETE")).collect();
        assert!(deletes[0].starts_with("DELETE FROM \"lecture_videos\""));
        assert!(deletes[1].starts_with("DELETE FROM \"course_chapters_lectures\""));
    }

    #[tokio::test]
    async fn test_apply_order_updates_each_lecture() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );

        let repo = LectureRepository::new(db.clone());
        repo.apply_order(vec![("l1".to_string(), 2), ("l2".to_string(), 1)])
            .await
            .unwrap();

        drop(repo);
        let updates = executed_sql(db)
            .into_iter()
            .filter(|s| s.starts_with("UPDATE"))
            .count();
        assert_eq!(updates, 2);
    }
}
