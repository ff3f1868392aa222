//! Who may change a course's content.

use lectern_common::AppResult;
use lectern_db::{
    entities::{course, user},
    repositories::CourseRepository,
};

/// Course modification policy: the owner and team members may modify.
#[derive(Clone)]
pub struct CoursePolicy {
    course_repo: CourseRepository,
}

impl CoursePolicy {
    /// Create a new course policy.
    #[must_use]
    pub const fn new(course_repo: CourseRepository) -> Self {
        Self { course_repo }
    }

    /// Whether `actor` may modify `course`.
    pub async fn can_modify(&self, actor: &user::Model, course: &course::Model) -> AppResult<bool> {
        if course.user_id == actor.id {
            return Ok(true);
        }
        self.course_repo.is_team_member(&course.id, &actor.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{course_row, staff_user};
    use lectern_db::entities::course_team_member;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_owner_may_modify_without_lookup() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let policy = CoursePolicy::new(CourseRepository::new(db));

        assert!(policy.can_modify(&staff_user("owner"), &course_row("c1", "owner")).await.unwrap());
    }

    #[tokio::test]
    async fn test_team_member_may_modify() {
        let member = course_team_member::Model {
            course_id: "c1".to_string(),
            user_id: "helper".to_string(),
            created_at: chrono::Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member]])
                .into_connection(),
        );
        let policy = CoursePolicy::new(CourseRepository::new(db));

        assert!(policy.can_modify(&staff_user("helper"), &course_row("c1", "owner")).await.unwrap());
    }

    #[tokio::test]
    async fn test_stranger_may_not_modify() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<course_team_member::Model>::new()])
                .into_connection(),
        );
        let policy = CoursePolicy::new(CourseRepository::new(db));

        assert!(!policy.can_modify(&staff_user("stranger"), &course_row("c1", "owner")).await.unwrap());
    }
}
