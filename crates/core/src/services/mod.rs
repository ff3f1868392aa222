//! Business logic services.

#![allow(missing_docs)]

pub mod course_policy;
pub mod lecture;
pub mod password;
pub mod permission;
pub mod rating;
pub mod staff;

pub use course_policy::CoursePolicy;
pub use lecture::{
    AuthorizedChapter, AuthorizedCourse, AuthorizedLecture, CreateLectureInput, LectureAction,
    LectureContent, LectureService, LectureView, QuestionView, QuizView, UpdateLectureInput,
};
pub use password::{hash_password, initial_password, verify_password};
pub use permission::{PERMISSION_DENIED, PermissionService, StaffPermission};
pub use rating::{RateInput, RatingAuthor, RatingService, RatingView};
pub use staff::{
    ChangePasswordInput, CreateStaffInput, StaffPage, StaffRow, StaffService, UpdateStaffInput,
};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use lectern_db::entities::{
        LectureType, course, course_chapter, course_chapter_lecture, role, user,
    };

    pub fn staff_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            slug: id.to_string(),
            password: "!".to_string(),
            api_token: None,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    pub fn role_row(id: &str, name: &str, custom_role: bool) -> role::Model {
        role::Model {
            id: id.to_string(),
            name: name.to_string(),
            custom_role,
            created_at: Utc::now().into(),
        }
    }

    pub fn course_row(id: &str, owner: &str) -> course::Model {
        course::Model {
            id: id.to_string(),
            user_id: owner.to_string(),
            title: "Systems Programming".to_string(),
            slug: format!("course-{id}"),
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    pub fn chapter_row(id: &str, course_id: &str) -> course_chapter::Model {
        course_chapter::Model {
            id: id.to_string(),
            course_id: course_id.to_string(),
            title: "Basics".to_string(),
            order: 1,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    pub fn lecture_row(
        id: &str,
        chapter_id: &str,
        lecture_type: LectureType,
        order: i32,
    ) -> course_chapter_lecture::Model {
        course_chapter_lecture::Model {
            id: id.to_string(),
            course_chapter_id: chapter_id.to_string(),
            title: format!("Lecture {id}"),
            lecture_type,
            description: None,
            duration: None,
            is_active: true,
            order,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }
}
