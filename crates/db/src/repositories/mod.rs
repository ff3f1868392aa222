//! Database repositories.

pub mod course;
pub mod lecture;
pub mod lecture_content;
pub mod rating;
pub mod role;
pub mod user;

pub use course::CourseRepository;
pub use lecture::LectureRepository;
pub use lecture_content::{LectureContentRepository, QuestionWithAnswers};
pub use rating::{Rateable, RatingRepository};
pub use role::RoleRepository;
pub use user::{RoleSwap, StaffChanges, StaffFilter, StaffSort, UserRepository};
