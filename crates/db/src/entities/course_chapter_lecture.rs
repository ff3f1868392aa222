//! Lecture entity.

use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which single content payload a lecture owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum LectureType {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "document")]
    Document,
    #[sea_orm(string_value = "quiz")]
    Quiz,
    #[sea_orm(string_value = "assignment")]
    Assignment,
}

impl LectureType {
    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
            Self::Quiz => "quiz",
            Self::Assignment => "assignment",
        }
    }
}

impl fmt::Display for LectureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LectureType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            "quiz" => Ok(Self::Quiz),
            "assignment" => Ok(Self::Assignment),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course_chapters_lectures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub course_chapter_id: String,

    pub title: String,

    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub lecture_type: LectureType,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Duration in minutes
    #[sea_orm(nullable)]
    pub duration: Option<i32>,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// Display order within the chapter, not unique
    pub order: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_chapter::Entity",
        from = "Column::CourseChapterId",
        to = "super::course_chapter::Column::Id"
    )]
    Chapter,
    #[sea_orm(has_many = "super::lecture_video::Entity")]
    Videos,
    #[sea_orm(has_many = "super::lecture_document::Entity")]
    Documents,
    #[sea_orm(has_one = "super::quiz::Entity")]
    Quiz,
    #[sea_orm(has_one = "super::assignment::Entity")]
    Assignment,
}

impl Related<super::course_chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl Related<super::lecture_video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Videos.def()
    }
}

impl Related<super::lecture_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::quiz::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quiz.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
