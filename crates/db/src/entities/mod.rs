//! Database entities.

pub mod assignment;
pub mod course;
pub mod course_chapter;
pub mod course_chapter_lecture;
pub mod course_team_member;
pub mod lecture_document;
pub mod lecture_video;
pub mod permission;
pub mod quiz;
pub mod quiz_answer;
pub mod quiz_question;
pub mod rating;
pub mod role;
pub mod role_permission;
pub mod user;
pub mod user_role;

pub use assignment::Entity as Assignment;
pub use course::Entity as Course;
pub use course_chapter::Entity as CourseChapter;
pub use course_chapter_lecture::Entity as CourseChapterLecture;
pub use course_team_member::Entity as CourseTeamMember;
pub use lecture_document::Entity as LectureDocument;
pub use lecture_video::Entity as LectureVideo;
pub use permission::Entity as Permission;
pub use quiz::Entity as Quiz;
pub use quiz_answer::Entity as QuizAnswer;
pub use quiz_question::Entity as QuizQuestion;
pub use rating::Entity as Rating;
pub use role::Entity as Role;
pub use role_permission::Entity as RolePermission;
pub use user::Entity as User;
pub use user_role::Entity as UserRole;

pub use course_chapter_lecture::LectureType;
pub use rating::RateableType;
