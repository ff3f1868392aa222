//! Lecture content repository: videos, documents, quizzes and assignments.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{
    Assignment, LectureDocument, LectureVideo, Quiz, QuizAnswer, QuizQuestion, assignment,
    lecture_document, lecture_video, quiz, quiz_answer, quiz_question,
};
use lectern_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// A quiz question with its answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionWithAnswers {
    pub question: quiz_question::Model,
    pub answers: Vec<quiz_answer::Model>,
}

/// Lecture content repository for database operations.
#[derive(Clone)]
pub struct LectureContentRepository {
    db: Arc<DatabaseConnection>,
}

impl LectureContentRepository {
    /// Create a new lecture content repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Videos of the given lectures.
    pub async fn videos_for(&self, lecture_ids: &[String]) -> AppResult<Vec<lecture_video::Model>> {
        if lecture_ids.is_empty() {
            return Ok(vec![]);
        }

        LectureVideo::find()
            .filter(lecture_video::Column::LectureId.is_in(lecture_ids.iter().cloned()))
            .order_by_asc(lecture_video::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Documents of the given lectures.
    pub async fn documents_for(
        &self,
        lecture_ids: &[String],
    ) -> AppResult<Vec<lecture_document::Model>> {
        if lecture_ids.is_empty() {
            return Ok(vec![]);
        }

        LectureDocument::find()
            .filter(lecture_document::Column::LectureId.is_in(lecture_ids.iter().cloned()))
            .order_by_asc(lecture_document::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Quizzes of the given lectures.
    pub async fn quizzes_for(&self, lecture_ids: &[String]) -> AppResult<Vec<quiz::Model>> {
        if lecture_ids.is_empty() {
            return Ok(vec![]);
        }

        Quiz::find()
            .filter(quiz::Column::LectureId.is_in(lecture_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Assignments of the given lectures.
    pub async fn assignments_for(
        &self,
        lecture_ids: &[String],
    ) -> AppResult<Vec<assignment::Model>> {
        if lecture_ids.is_empty() {
            return Ok(vec![]);
        }

        Assignment::find()
            .filter(assignment::Column::LectureId.is_in(lecture_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Questions of a quiz in order, each with its answers.
    pub async fn questions_with_answers(&self, quiz_id: &str) -> AppResult<Vec<QuestionWithAnswers>> {
        let questions = QuizQuestion::find()
            .filter(quiz_question::Column::QuizId.eq(quiz_id))
            .order_by_asc(quiz_question::Column::Order)
            .order_by_asc(quiz_question::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if questions.is_empty() {
            return Ok(vec![]);
        }

        let answers = QuizAnswer::find()
            .filter(
                quiz_answer::Column::QuestionId
                    .is_in(questions.iter().map(|q| q.id.clone())),
            )
            .order_by_asc(quiz_answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_question: HashMap<String, Vec<quiz_answer::Model>> = HashMap::new();
        for answer in answers {
            by_question
                .entry(answer.question_id.clone())
                .or_default()
                .push(answer);
        }

        Ok(questions
            .into_iter()
            .map(|question| {
                let answers = by_question.remove(&question.id).unwrap_or_default();
                QuestionWithAnswers { question, answers }
            })
            .collect())
    }
}
