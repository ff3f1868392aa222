//! Lecture video entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lecture_videos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub lecture_id: String,

    pub title: String,

    /// Playback URL (HLS playlist once transcoded)
    pub url: String,

    /// Duration in seconds
    #[sea_orm(nullable)]
    pub duration: Option<i32>,

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
