//! Lecture service.
//!
//! Mutations walk a fixed sequence of checks: the course must exist, the
//! actor must be allowed to modify it, then the chapter (and lecture) must
//! exist inside it, and only then is the payload validated. Each step hands
//! out a proof value the next step requires, so handlers cannot reorder them.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use lectern_common::serde_ext::{Loose, double_option};
use lectern_common::{AppError, AppResult, FieldErrors, IdGenerator};
use lectern_common::validation::not_blank;
use lectern_db::{
    entities::{
        LectureType, assignment, course, course_chapter, course_chapter_lecture, lecture_document,
        lecture_video, quiz, quiz_answer, quiz_question, user,
    },
    repositories::{
        CourseRepository, LectureContentRepository, LectureRepository, QuestionWithAnswers,
    },
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use super::course_policy::CoursePolicy;

const TITLE_MAX: usize = 255;

/// Reply when a reorder payload names lectures of another chapter.
pub const FOREIGN_LECTURE_MESSAGE: &str = "One or more lectures do not belong to this chapter";

/// Lecture actions that change course content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LectureAction {
    Create,
    Update,
    Delete,
    Reorder,
}

impl LectureAction {
    /// Message returned when the actor may not perform the action.
    #[must_use]
    pub const fn denied_message(self) -> &'static str {
        match self {
            Self::Create => {
                "You are not authorized to add lectures to this course. Only course owners and team members can modify course content."
            }
            Self::Update => {
                "You are not authorized to update this lecture. Only course owners and team members can modify course content."
            }
            Self::Delete => {
                "You are not authorized to delete this lecture. Only course owners and team members can modify course content."
            }
            Self::Reorder => {
                "You are not authorized to reorder lectures. Only course owners and team members can modify course content."
            }
        }
    }
}

/// A course the actor may modify.
#[derive(Debug, Clone)]
pub struct AuthorizedCourse {
    course: course::Model,
}

impl AuthorizedCourse {
    /// The checked course.
    #[must_use]
    pub const fn course(&self) -> &course::Model {
        &self.course
    }
}

/// A chapter of an [`AuthorizedCourse`].
#[derive(Debug, Clone)]
pub struct AuthorizedChapter {
    chapter: course_chapter::Model,
}

impl AuthorizedChapter {
    /// The checked chapter.
    #[must_use]
    pub const fn chapter(&self) -> &course_chapter::Model {
        &self.chapter
    }
}

/// A lecture of an [`AuthorizedChapter`].
#[derive(Debug, Clone)]
pub struct AuthorizedLecture {
    lecture: course_chapter_lecture::Model,
}

impl AuthorizedLecture {
    /// The checked lecture.
    #[must_use]
    pub const fn lecture(&self) -> &course_chapter_lecture::Model {
        &self.lecture
    }
}

fn known_lecture_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<LectureType>()
        .map(|_| ())
        .map_err(|()| ValidationError::new("in"))
}

/// Input for creating a lecture.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateLectureInput {
    #[validate(
        required(message = "The title field is required."),
        custom(function = "not_blank", message = "The title field is required."),
        length(
            max = 255,
            message = "The title field must not be greater than 255 characters."
        )
    )]
    pub title: Option<String>,

    #[serde(rename = "type")]
    #[validate(
        required(message = "The type field is required."),
        custom(function = "known_lecture_type", message = "The selected type is invalid.")
    )]
    pub lecture_type: Option<String>,

    pub description: Option<String>,

    pub duration: Option<Loose<i32>>,

    pub is_active: Option<Loose<bool>>,

    pub order: Option<Loose<i32>>,
}

/// Scalar fields of a create payload once read.
#[derive(Debug, Default)]
struct CreateScalars {
    duration: Option<i32>,
    is_active: Option<bool>,
    order: Option<i32>,
}

impl CreateLectureInput {
    fn check(&self) -> Result<CreateScalars, FieldErrors> {
        let mut errors: FieldErrors = self.validate().err().map(Into::into).unwrap_or_default();
        errors.rename("lecture_type", "type");

        let scalars = CreateScalars {
            duration: errors.integer("duration", self.duration, 0),
            is_active: errors.boolean("is_active", self.is_active),
            order: errors.integer("order", self.order, 0),
        };
        errors.into_result().map(|()| scalars)
    }
}

/// Input for updating a lecture. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLectureInput {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(default, rename = "type", deserialize_with = "double_option")]
    pub lecture_type: Option<Option<String>>,

    /// `Some(None)` clears the description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// `Some(None)` clears the duration.
    #[serde(default, deserialize_with = "double_option")]
    pub duration: Option<Option<Loose<i32>>>,

    pub is_active: Option<Loose<bool>>,

    pub order: Option<Loose<i32>>,
}

/// Present fields of an update payload once checked.
#[derive(Debug, Default)]
struct UpdateScalars {
    lecture_type: Option<LectureType>,
    duration: Option<Option<i32>>,
    is_active: Option<bool>,
    order: Option<i32>,
}

impl UpdateLectureInput {
    fn check(&self) -> Result<UpdateScalars, FieldErrors> {
        let mut errors = FieldErrors::new();

        match &self.title {
            Some(None) => errors.add("title", "The title field is required."),
            Some(Some(title)) if title.trim().is_empty() => {
                errors.add("title", "The title field is required.");
            }
            Some(Some(title)) if title.chars().count() > TITLE_MAX => {
                errors.add(
                    "title",
                    "The title field must not be greater than 255 characters.",
                );
            }
            _ => {}
        }

        let mut parsed = None;
        match &self.lecture_type {
            Some(None) => errors.add("type", "The type field is required."),
            Some(Some(raw)) => match raw.parse::<LectureType>() {
                Ok(ty) => parsed = Some(ty),
                Err(()) => errors.add("type", "The selected type is invalid."),
            },
            None => {}
        }

        let duration = match self.duration {
            Some(Some(raw)) => errors.integer("duration", Some(raw), 0).map(Some),
            Some(None) => Some(None),
            None => None,
        };
        let scalars = UpdateScalars {
            lecture_type: parsed,
            duration,
            is_active: errors.boolean("is_active", self.is_active),
            order: errors.integer("order", self.order, 0),
        };

        errors.into_result().map(|()| scalars)
    }
}

/// One `{id, order}` entry of a reorder payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderItem {
    /// Position in the `lectures` array, used in error keys.
    pub index: usize,
    pub id: String,
    pub order: i32,
}

/// Parse a reorder payload `{lectures: [{id, order}, ...]}`.
///
/// Entries with structural problems are left out of the returned list and
/// reported in the error set.
#[must_use]
pub fn parse_reorder(body: &Value) -> (Vec<ReorderItem>, FieldErrors) {
    let mut errors = FieldErrors::new();
    let mut items = Vec::new();

    let Some(lectures) = body.get("lectures").filter(|v| !v.is_null()) else {
        errors.add("lectures", "The lectures field is required.");
        return (items, errors);
    };
    let Some(entries) = lectures.as_array() else {
        errors.add("lectures", "The lectures field must be an array.");
        return (items, errors);
    };
    if entries.is_empty() {
        errors.add("lectures", "The lectures field is required.");
        return (items, errors);
    }

    for (index, entry) in entries.iter().enumerate() {
        let id_key = format!("lectures.{index}.id");
        let order_key = format!("lectures.{index}.order");

        let id = match entry.get("id") {
            None | Some(Value::Null) => {
                errors.add(&id_key, format!("The {id_key} field is required."));
                None
            }
            Some(Value::String(s)) if s.is_empty() => {
                errors.add(&id_key, format!("The {id_key} field is required."));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => {
                errors.add(&id_key, format!("The selected {id_key} is invalid."));
                None
            }
        };

        let order = match entry.get("order") {
            None | Some(Value::Null) => {
                errors.add(&order_key, format!("The {order_key} field is required."));
                None
            }
            Some(raw) => {
                let parsed = match raw {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                match parsed.map(i32::try_from) {
                    Some(Ok(order)) if order < 0 => {
                        errors.add(
                            &order_key,
                            format!("The {order_key} field must be at least 0."),
                        );
                        None
                    }
                    Some(Ok(order)) => Some(order),
                    Some(Err(_)) | None => {
                        errors.add(
                            &order_key,
                            format!("The {order_key} field must be an integer."),
                        );
                        None
                    }
                }
            }
        };

        if let (Some(id), Some(order)) = (id, order) {
            items.push(ReorderItem { index, id, order });
        }
    }

    (items, errors)
}

/// Order given to a new lecture when the caller sends none.
#[must_use]
pub fn next_order(current_max: Option<i32>) -> i32 {
    current_max.map_or(1, |max| max.saturating_add(1))
}

/// A quiz question with its answers.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    #[serde(flatten)]
    pub question: quiz_question::Model,
    pub answers: Vec<quiz_answer::Model>,
}

impl From<QuestionWithAnswers> for QuestionView {
    fn from(q: QuestionWithAnswers) -> Self {
        Self {
            question: q.question,
            answers: q.answers,
        }
    }
}

/// A quiz, with its questions when shown on its own.
#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    #[serde(flatten)]
    pub quiz: quiz::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<QuestionView>>,
}

/// The content payload a lecture's type selects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LectureContent {
    Videos(Vec<lecture_video::Model>),
    Documents(Vec<lecture_document::Model>),
    Quiz(Option<QuizView>),
    Assignment(Option<assignment::Model>),
}

/// A lecture with its content.
#[derive(Debug, Clone, Serialize)]
pub struct LectureView {
    #[serde(flatten)]
    pub lecture: course_chapter_lecture::Model,
    #[serde(flatten)]
    pub content: LectureContent,
}

/// Lecture service for business logic.
#[derive(Clone)]
pub struct LectureService {
    course_repo: CourseRepository,
    lecture_repo: LectureRepository,
    content_repo: LectureContentRepository,
    policy: CoursePolicy,
    id_gen: IdGenerator,
}

impl LectureService {
    /// Create a new lecture service.
    #[must_use]
    pub fn new(
        course_repo: CourseRepository,
        lecture_repo: LectureRepository,
        content_repo: LectureContentRepository,
    ) -> Self {
        Self {
            policy: CoursePolicy::new(course_repo.clone()),
            course_repo,
            lecture_repo,
            content_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn find_course(&self, course_id: &str) -> AppResult<course::Model> {
        self.course_repo
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("course".to_string()))
    }

    async fn find_chapter(
        &self,
        course_id: &str,
        chapter_id: &str,
    ) -> AppResult<course_chapter::Model> {
        self.course_repo
            .find_chapter(course_id, chapter_id)
            .await?
            .ok_or_else(|| AppError::NotFound("chapter".to_string()))
    }

    async fn find_lecture(
        &self,
        chapter_id: &str,
        lecture_id: &str,
    ) -> AppResult<course_chapter_lecture::Model> {
        self.lecture_repo
            .find_in_chapter(chapter_id, lecture_id)
            .await?
            .ok_or_else(|| AppError::NotFound("lecture".to_string()))
    }

    /// Load a course and check that `actor` may perform `action` on it.
    pub async fn authorize(
        &self,
        actor: &user::Model,
        course_id: &str,
        action: LectureAction,
    ) -> AppResult<AuthorizedCourse> {
        let course = self.find_course(course_id).await?;

        if !self.policy.can_modify(actor, &course).await? {
            tracing::debug!(
                user_id = %actor.id,
                course_id = %course.id,
                ?action,
                "Lecture change refused"
            );
            return Err(AppError::Forbidden(action.denied_message().to_string()));
        }

        Ok(AuthorizedCourse { course })
    }

    /// Load a chapter of an authorized course.
    pub async fn chapter(
        &self,
        course: &AuthorizedCourse,
        chapter_id: &str,
    ) -> AppResult<AuthorizedChapter> {
        let chapter = self.find_chapter(&course.course.id, chapter_id).await?;
        Ok(AuthorizedChapter { chapter })
    }

    /// Load a lecture of an authorized chapter.
    pub async fn lecture(
        &self,
        chapter: &AuthorizedChapter,
        lecture_id: &str,
    ) -> AppResult<AuthorizedLecture> {
        let lecture = self.find_lecture(&chapter.chapter.id, lecture_id).await?;
        Ok(AuthorizedLecture { lecture })
    }

    /// Lectures of a chapter in order, each with its content. Quizzes come
    /// without questions.
    pub async fn list(&self, course_id: &str, chapter_id: &str) -> AppResult<Vec<LectureView>> {
        let course = self.find_course(course_id).await?;
        let chapter = self.find_chapter(&course.id, chapter_id).await?;
        let lectures = self.lecture_repo.find_by_chapter(&chapter.id).await?;

        self.with_content(lectures, false).await
    }

    /// One lecture with its content; quizzes include questions and answers.
    pub async fn show(
        &self,
        course_id: &str,
        chapter_id: &str,
        lecture_id: &str,
    ) -> AppResult<LectureView> {
        let course = self.find_course(course_id).await?;
        let chapter = self.find_chapter(&course.id, chapter_id).await?;
        let lecture = self.find_lecture(&chapter.id, lecture_id).await?;

        self.with_content(vec![lecture], true)
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound("lecture".to_string()))
    }

    /// Create a lecture in an authorized chapter.
    pub async fn create(
        &self,
        chapter: &AuthorizedChapter,
        input: CreateLectureInput,
    ) -> AppResult<course_chapter_lecture::Model> {
        let scalars = input.check()?;

        let lecture_type = input
            .lecture_type
            .as_deref()
            .and_then(|raw| raw.parse::<LectureType>().ok())
            .ok_or_else(|| AppError::invalid("type", "The selected type is invalid."))?;
        let title = input.title.as_deref().map(str::trim).unwrap_or_default().to_string();

        let chapter_id = chapter.chapter.id.clone();
        let order = match scalars.order {
            Some(order) => order,
            None => next_order(self.lecture_repo.max_order(&chapter_id).await?),
        };

        let now = Utc::now().fixed_offset();
        let model = course_chapter_lecture::ActiveModel {
            id: Set(self.id_gen.generate()),
            course_chapter_id: Set(chapter_id),
            title: Set(title),
            lecture_type: Set(lecture_type),
            description: Set(input.description),
            duration: Set(scalars.duration),
            is_active: Set(scalars.is_active.unwrap_or(true)),
            order: Set(order),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let lecture = self.lecture_repo.create(model).await?;
        tracing::info!(
            lecture_id = %lecture.id,
            chapter_id = %lecture.course_chapter_id,
            order = lecture.order,
            "Lecture created"
        );
        Ok(lecture)
    }

    /// Apply the present fields of `input` to a lecture.
    pub async fn update(
        &self,
        lecture: AuthorizedLecture,
        input: UpdateLectureInput,
    ) -> AppResult<course_chapter_lecture::Model> {
        let scalars = input.check()?;

        let mut active = lecture.lecture.into_active_model();
        if let Some(Some(title)) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(ty) = scalars.lecture_type {
            active.lecture_type = Set(ty);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(duration) = scalars.duration {
            active.duration = Set(duration);
        }
        if let Some(is_active) = scalars.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(order) = scalars.order {
            active.order = Set(order);
        }
        active.updated_at = Set(Some(Utc::now().fixed_offset()));

        let updated = self.lecture_repo.update(active).await?;
        tracing::info!(lecture_id = %updated.id, "Lecture updated");
        Ok(updated)
    }

    /// Delete a lecture and the content its type selects.
    pub async fn destroy(&self, lecture: AuthorizedLecture) -> AppResult<()> {
        self.lecture_repo.delete_cascade(&lecture.lecture).await?;
        tracing::info!(
            lecture_id = %lecture.lecture.id,
            lecture_type = %lecture.lecture.lecture_type,
            "Lecture deleted"
        );
        Ok(())
    }

    /// Persist a new order for lectures of a chapter.
    ///
    /// Every entry is validated and every lecture checked against the
    /// chapter before anything is written; the writes share a transaction.
    pub async fn reorder(&self, chapter: &AuthorizedChapter, body: &Value) -> AppResult<()> {
        let (items, mut errors) = parse_reorder(body);
        if errors.get("lectures").is_some() {
            return Err(errors.into());
        }

        let ids: Vec<String> = items
            .iter()
            .map(|item| item.id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let found = self.lecture_repo.find_by_ids(&ids).await?;
        let chapter_of: HashMap<&str, &str> = found
            .iter()
            .map(|l| (l.id.as_str(), l.course_chapter_id.as_str()))
            .collect();

        for item in &items {
            if !chapter_of.contains_key(item.id.as_str()) {
                let key = format!("lectures.{}.id", item.index);
                errors.add(&key, format!("The selected {key} is invalid."));
            }
        }
        errors.into_result()?;

        if chapter_of
            .values()
            .any(|owner| *owner != chapter.chapter.id.as_str())
        {
            return Err(AppError::BadRequest(FOREIGN_LECTURE_MESSAGE.to_string()));
        }

        let count = items.len();
        self.lecture_repo
            .apply_order(items.into_iter().map(|item| (item.id, item.order)).collect())
            .await?;
        tracing::info!(chapter_id = %chapter.chapter.id, count, "Lectures reordered");
        Ok(())
    }

    async fn with_content(
        &self,
        lectures: Vec<course_chapter_lecture::Model>,
        with_questions: bool,
    ) -> AppResult<Vec<LectureView>> {
        let ids_of = |ty: LectureType| -> Vec<String> {
            lectures
                .iter()
                .filter(|l| l.lecture_type == ty)
                .map(|l| l.id.clone())
                .collect()
        };

        let mut videos: HashMap<String, Vec<lecture_video::Model>> = HashMap::new();
        for video in self.content_repo.videos_for(&ids_of(LectureType::Video)).await? {
            videos.entry(video.lecture_id.clone()).or_default().push(video);
        }
        let mut documents: HashMap<String, Vec<lecture_document::Model>> = HashMap::new();
        for document in self
            .content_repo
            .documents_for(&ids_of(LectureType::Document))
            .await?
        {
            documents
                .entry(document.lecture_id.clone())
                .or_default()
                .push(document);
        }
        let mut quizzes: HashMap<String, quiz::Model> = self
            .content_repo
            .quizzes_for(&ids_of(LectureType::Quiz))
            .await?
            .into_iter()
            .map(|q| (q.lecture_id.clone(), q))
            .collect();
        let mut assignments: HashMap<String, assignment::Model> = self
            .content_repo
            .assignments_for(&ids_of(LectureType::Assignment))
            .await?
            .into_iter()
            .map(|a| (a.lecture_id.clone(), a))
            .collect();

        let mut views = Vec::with_capacity(lectures.len());
        for lecture in lectures {
            let content = match lecture.lecture_type {
                LectureType::Video => {
                    LectureContent::Videos(videos.remove(&lecture.id).unwrap_or_default())
                }
                LectureType::Document => {
                    LectureContent::Documents(documents.remove(&lecture.id).unwrap_or_default())
                }
                LectureType::Quiz => {
                    let view = match quizzes.remove(&lecture.id) {
                        Some(quiz) if with_questions => {
                            let questions = self
                                .content_repo
                                .questions_with_answers(&quiz.id)
                                .await?
                                .into_iter()
                                .map(QuestionView::from)
                                .collect();
                            Some(QuizView {
                                quiz,
                                questions: Some(questions),
                            })
                        }
                        Some(quiz) => Some(QuizView {
                            quiz,
                            questions: None,
                        }),
                        None => None,
                    };
                    LectureContent::Quiz(view)
                }
                LectureType::Assignment => {
                    LectureContent::Assignment(assignments.remove(&lecture.id))
                }
            };
            views.push(LectureView { lecture, content });
        }

        Ok(views)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{chapter_row, course_row, lecture_row, staff_user};
    use lectern_db::entities::course_team_member;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn service(db: &Arc<DatabaseConnection>) -> LectureService {
        LectureService::new(
            CourseRepository::new(db.clone()),
            LectureRepository::new(db.clone()),
            LectureContentRepository::new(db.clone()),
        )
    }

    /// SQL the mock saw; the service holds connection handles, so it goes first.
    fn executed_sql(lectures: LectureService, db: Arc<DatabaseConnection>) -> Vec<String> {
        drop(lectures);
        Arc::try_unwrap(db)
            .ok()
            .unwrap()
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
            .collect()
    }

    #[test]
    fn test_next_order() {
        assert_eq!(next_order(None), 1);
        assert_eq!(next_order(Some(0)), 1);
        assert_eq!(next_order(Some(7)), 8);
    }

    #[test]
    fn test_denied_messages_name_the_action() {
        assert!(LectureAction::Create.denied_message().contains("add lectures"));
        assert!(LectureAction::Reorder.denied_message().contains("reorder lectures"));
        for action in [
            LectureAction::Create,
            LectureAction::Update,
            LectureAction::Delete,
            LectureAction::Reorder,
        ] {
            assert!(action.denied_message().ends_with(
                "Only course owners and team members can modify course content."
            ));
        }
    }

    #[test]
    fn test_parse_reorder_structure() {
        let (_, errors) = parse_reorder(&json!({}));
        assert_eq!(
            errors.get("lectures"),
            Some(&["The lectures field is required.".to_string()][..])
        );

        let (_, errors) = parse_reorder(&json!({"lectures": "l1"}));
        assert_eq!(errors.first(), Some("The lectures field must be an array."));

        let (items, errors) = parse_reorder(&json!({"lectures": [
            {"id": "l1", "order": 2},
            {"order": 1},
            {"id": "l3", "order": -1},
            {"id": "l4", "order": "x"},
            {"id": "l5", "order": "3"},
        ]}));
        assert_eq!(
            items,
            vec![
                ReorderItem { index: 0, id: "l1".to_string(), order: 2 },
                ReorderItem { index: 4, id: "l5".to_string(), order: 3 },
            ]
        );
        assert!(errors.get("lectures.1.id").is_some());
        assert_eq!(
            errors.get("lectures.2.order"),
            Some(&["The lectures.2.order field must be at least 0.".to_string()][..])
        );
        assert_eq!(
            errors.get("lectures.3.order"),
            Some(&["The lectures.3.order field must be an integer.".to_string()][..])
        );
    }

    #[test]
    fn test_update_input_distinguishes_null_from_absent() {
        let input: UpdateLectureInput =
            serde_json::from_value(json!({"description": null, "duration": 12})).unwrap();
        assert_eq!(input.description, Some(None));
        assert_eq!(input.duration, Some(Some(Loose::Value(12))));
        assert_eq!(input.title, None);
        let checked = input.check().unwrap();
        assert_eq!(checked.lecture_type, None);
        assert_eq!(checked.duration, Some(Some(12)));
        assert_eq!(checked.order, None);

        let input: UpdateLectureInput = serde_json::from_value(json!({"duration": null})).unwrap();
        assert_eq!(input.check().unwrap().duration, Some(None));

        let input: UpdateLectureInput =
            serde_json::from_value(json!({"title": null, "type": "podcast"})).unwrap();
        let errors = input.check().unwrap_err();
        assert_eq!(
            errors.get("title"),
            Some(&["The title field is required.".to_string()][..])
        );
        assert_eq!(
            errors.get("type"),
            Some(&["The selected type is invalid.".to_string()][..])
        );
    }

    #[test]
    fn test_scalars_accept_form_style_values() {
        let input: CreateLectureInput = serde_json::from_value(json!({
            "title": "Reading list",
            "type": "document",
            "is_active": 1,
            "duration": "15",
            "order": "2"
        }))
        .unwrap();
        let checked = input.check().unwrap();
        assert_eq!(checked.duration, Some(15));
        assert_eq!(checked.is_active, Some(true));
        assert_eq!(checked.order, Some(2));

        let input: UpdateLectureInput =
            serde_json::from_value(json!({"is_active": "0", "order": 5})).unwrap();
        let checked = input.check().unwrap();
        assert_eq!(checked.is_active, Some(false));
        assert_eq!(checked.order, Some(5));
    }

    #[test]
    fn test_malformed_scalars_are_reported_per_field() {
        let input: CreateLectureInput = serde_json::from_value(json!({
            "title": "Reading list",
            "type": "document",
            "is_active": "maybe",
            "duration": "a quarter hour",
            "order": -1
        }))
        .unwrap();
        let errors = input.check().unwrap_err();
        assert_eq!(
            errors.get("duration"),
            Some(&["The duration field must be an integer.".to_string()][..])
        );
        assert_eq!(
            errors.get("is_active"),
            Some(&["The is active field must be true or false.".to_string()][..])
        );
        assert_eq!(
            errors.get("order"),
            Some(&["The order field must be at least 0.".to_string()][..])
        );

        let input: UpdateLectureInput =
            serde_json::from_value(json!({"duration": {"minutes": 15}})).unwrap();
        let errors = input.check().unwrap_err();
        assert_eq!(
            errors.get("duration"),
            Some(&["The duration field must be an integer.".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_authorize_refuses_outsider_with_action_message() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course_row("c1", "owner")]])
                .append_query_results([Vec::<course_team_member::Model>::new()])
                .into_connection(),
        );

        let err = service(&db)
            .authorize(&staff_user("stranger"), "c1", LectureAction::Delete)
            .await
            .unwrap_err();

        assert!(
            matches!(err, AppError::Forbidden(ref m) if m == LectureAction::Delete.denied_message())
        );
    }

    #[tokio::test]
    async fn test_authorize_missing_course_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<course::Model>::new()])
                .into_connection(),
        );

        let err = service(&db)
            .authorize(&staff_user("owner"), "missing", LectureAction::Create)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_without_order_appends_after_max() {
        let created = lecture_row("l9", "ch1", LectureType::Video, 4);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course_row("c1", "owner")]])
                .append_query_results([[chapter_row("ch1", "c1")]])
                .append_query_results([[maplit::btreemap! {
                    "max_order" => sea_orm::Value::Int(Some(3))
                }]])
                .append_query_results([[created]])
                .into_connection(),
        );
        let lectures = service(&db);

        let course = lectures
            .authorize(&staff_user("owner"), "c1", LectureAction::Create)
            .await
            .unwrap();
        let chapter = lectures.chapter(&course, "ch1").await.unwrap();
        let input: CreateLectureInput =
            serde_json::from_value(json!({"title": "Ownership", "type": "video"})).unwrap();
        let lecture = lectures.create(&chapter, input).await.unwrap();
        assert_eq!(lecture.order, 4);

        let sql = executed_sql(lectures, db);
        let insert = sql.iter().find(|s| s.starts_with("INSERT")).unwrap();
        assert!(insert.contains("\"course_chapters_lectures\""));
    }

    #[tokio::test]
    async fn test_create_validation_uses_field_names() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course_row("c1", "owner")]])
                .append_query_results([[chapter_row("ch1", "c1")]])
                .into_connection(),
        );
        let lectures = service(&db);

        let course = lectures
            .authorize(&staff_user("owner"), "c1", LectureAction::Create)
            .await
            .unwrap();
        let chapter = lectures.chapter(&course, "ch1").await.unwrap();
        let input: CreateLectureInput =
            serde_json::from_value(json!({"type": "podcast", "duration": -5})).unwrap();
        let err = lectures.create(&chapter, input).await.unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("title"),
            Some(&["The title field is required.".to_string()][..])
        );
        assert_eq!(
            errors.get("type"),
            Some(&["The selected type is invalid.".to_string()][..])
        );
        assert!(errors.get("duration").is_some());
    }

    #[tokio::test]
    async fn test_reorder_foreign_lecture_is_rejected_before_any_write() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course_row("c1", "owner")]])
                .append_query_results([[chapter_row("ch1", "c1")]])
                .append_query_results([[
                    lecture_row("l1", "ch1", LectureType::Video, 1),
                    lecture_row("l2", "other", LectureType::Video, 1),
                ]])
                .into_connection(),
        );
        let lectures = service(&db);

        let course = lectures
            .authorize(&staff_user("owner"), "c1", LectureAction::Reorder)
            .await
            .unwrap();
        let chapter = lectures.chapter(&course, "ch1").await.unwrap();
        let body = json!({"lectures": [{"id": "l1", "order": 2}, {"id": "l2", "order": 1}]});
        let err = lectures.reorder(&chapter, &body).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref m) if m == FOREIGN_LECTURE_MESSAGE));
        assert!(!executed_sql(lectures, db).iter().any(|s| s.starts_with("UPDATE")));
    }

    #[tokio::test]
    async fn test_reorder_unknown_id_is_validation_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course_row("c1", "owner")]])
                .append_query_results([[chapter_row("ch1", "c1")]])
                .append_query_results([[lecture_row("l1", "ch1", LectureType::Video, 1)]])
                .into_connection(),
        );
        let lectures = service(&db);

        let course = lectures
            .authorize(&staff_user("owner"), "c1", LectureAction::Reorder)
            .await
            .unwrap();
        let chapter = lectures.chapter(&course, "ch1").await.unwrap();
        let body = json!({"lectures": [{"id": "l1", "order": 2}, {"id": "ghost", "order": 1}]});
        let err = lectures.reorder(&chapter, &body).await.unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("lectures.1.id"),
            Some(&["The selected lectures.1.id is invalid.".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_reorder_persists_orders() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course_row("c1", "owner")]])
                .append_query_results([[chapter_row("ch1", "c1")]])
                .append_query_results([[
                    lecture_row("l1", "ch1", LectureType::Video, 1),
                    lecture_row("l2", "ch1", LectureType::Quiz, 2),
                ]])
                .append_exec_results([
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                ])
                .into_connection(),
        );
        let lectures = service(&db);

        let course = lectures
            .authorize(&staff_user("owner"), "c1", LectureAction::Reorder)
            .await
            .unwrap();
        let chapter = lectures.chapter(&course, "ch1").await.unwrap();
        let body = json!({"lectures": [{"id": "l1", "order": 2}, {"id": "l2", "order": 1}]});
        lectures.reorder(&chapter, &body).await.unwrap();

        let updates = executed_sql(lectures, db)
            .into_iter()
            .filter(|s| s.starts_with("UPDATE"))
            .count();
        assert_eq!(updates, 2);
    }

    #[tokio::test]
    async fn test_show_quiz_includes_questions_and_answers() {
        let quiz = quiz::Model {
            id: "q1".to_string(),
            lecture_id: "l1".to_string(),
            title: "Checkpoint".to_string(),
            description: None,
            pass_percentage: 70,
            created_at: Utc::now().into(),
        };
        let question = quiz_question::Model {
            id: "qq1".to_string(),
            quiz_id: "q1".to_string(),
            question: "What does `&mut` grant?".to_string(),
            order: 1,
        };
        let answer = quiz_answer::Model {
            id: "a1".to_string(),
            question_id: "qq1".to_string(),
            answer: "Exclusive access".to_string(),
            is_correct: true,
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course_row("c1", "owner")]])
                .append_query_results([[chapter_row("ch1", "c1")]])
                .append_query_results([[lecture_row("l1", "ch1", LectureType::Quiz, 1)]])
                .append_query_results([[quiz]])
                .append_query_results([[question]])
                .append_query_results([[answer]])
                .into_connection(),
        );

        let view = service(&db).show("c1", "ch1", "l1").await.unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["type"], "quiz");
        assert_eq!(json["quiz"]["pass_percentage"], 70);
        assert_eq!(json["quiz"]["questions"][0]["answers"][0]["is_correct"], true);
    }

    #[tokio::test]
    async fn test_list_video_lectures_carry_videos() {
        let video = lecture_video::Model {
            id: "v1".to_string(),
            lecture_id: "l1".to_string(),
            title: "Walkthrough".to_string(),
            url: "https://cdn.example.com/v1.m3u8".to_string(),
            duration: Some(300),
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course_row("c1", "owner")]])
                .append_query_results([[chapter_row("ch1", "c1")]])
                .append_query_results([[
                    lecture_row("l1", "ch1", LectureType::Video, 1),
                    lecture_row("l2", "ch1", LectureType::Assignment, 2),
                ]])
                .append_query_results([[video]])
                .append_query_results([Vec::<assignment::Model>::new()])
                .into_connection(),
        );

        let views = service(&db).list("c1", "ch1").await.unwrap();
        let json = serde_json::to_value(&views).unwrap();

        assert_eq!(json[0]["videos"][0]["id"], "v1");
        assert!(json[1]["assignment"].is_null());
        assert!(json[1].get("videos").is_none());
    }
}
