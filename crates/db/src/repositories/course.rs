//! Course and chapter repository.

use std::sync::Arc;

use crate::entities::{Course, CourseChapter, CourseTeamMember, course, course_chapter};
use lectern_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Course repository for database operations.
#[derive(Clone)]
pub struct CourseRepository {
    db: Arc<DatabaseConnection>,
}

impl CourseRepository {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a course by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<course::Model>> {
        Course::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a user is on a course's team.
    pub async fn is_team_member(&self, course_id: &str, user_id: &str) -> AppResult<bool> {
        let member = CourseTeamMember::find_by_id((course_id.to_string(), user_id.to_string()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(member.is_some())
    }

    /// Find a chapter, scoped to its course.
    pub async fn find_chapter(
        &self,
        course_id: &str,
        chapter_id: &str,
    ) -> AppResult<Option<course_chapter::Model>> {
        CourseChapter::find_by_id(chapter_id)
            .filter(course_chapter::Column::CourseId.eq(course_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Chapters of a course in display order.
    pub async fn find_chapters(&self, course_id: &str) -> AppResult<Vec<course_chapter::Model>> {
        CourseChapter::find()
            .filter(course_chapter::Column::CourseId.eq(course_id))
            .order_by_asc(course_chapter::Column::Order)
            .order_by_asc(course_chapter::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::course_team_member;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    pub(crate) fn create_test_course(id: &str, owner_id: &str) -> course::Model {
        course::Model {
            id: id.to_string(),
            user_id: owner_id.to_string(),
            title: "Rust for Beginners".to_string(),
            slug: "rust-for-beginners".to_string(),
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    pub(crate) fn create_test_chapter(id: &str, course_id: &str) -> course_chapter::Model {
        course_chapter::Model {
            id: id.to_string(),
            course_id: course_id.to_string(),
            title: "Getting Started".to_string(),
            order: 1,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_is_team_member() {
        let member = course_team_member::Model {
            course_id: "c1".to_string(),
            user_id: "u2".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member]])
                .append_query_results([Vec::<course_team_member::Model>::new()])
                .into_connection(),
        );

        let repo = CourseRepository::new(db);
        assert!(repo.is_team_member("c1", "u2").await.unwrap());
        assert!(!repo.is_team_member("c1", "u3").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_chapter_is_scoped_to_course() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_chapter("ch1", "c1")]])
                .into_connection(),
        );

        let repo = CourseRepository::new(db.clone());
        let chapter = repo.find_chapter("c1", "ch1").await.unwrap();
        assert_eq!(chapter.map(|c| c.course_id), Some("c1".to_string()));

        drop(repo);
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert!(log[0].statements()[0].sql.contains("\"course_id\" = $"));
    }
}
