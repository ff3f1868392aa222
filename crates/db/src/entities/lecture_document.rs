//! Lecture document entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lecture_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub lecture_id: String,

    pub title: String,

    pub file_url: String,

    /// File extension, e.g. `pdf`
    #[sea_orm(nullable)]
    pub file_type: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_chapter_lecture::Entity",
        from = "Column::LectureId",
        to = "super::course_chapter_lecture::Column::Id"
    )]
    Lecture,
}

impl Related<super::course_chapter_lecture::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lecture.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
