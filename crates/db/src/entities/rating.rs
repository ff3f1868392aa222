//! Rating entity.
//!
//! A rating points at its target through `(rateable_type, rateable_id)`;
//! there is no foreign key on `rateable_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of record a rating is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum RateableType {
    #[sea_orm(string_value = "course")]
    Course,
    /// Rated user, stored in `users`
    #[sea_orm(string_value = "instructor")]
    Instructor,
}

impl RateableType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Instructor => "instructor",
        }
    }
}

impl std::fmt::Display for RateableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RateableType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "course" => Ok(Self::Course),
            "instructor" => Ok(Self::Instructor),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ratings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author of the rating
    pub user_id: String,

    /// 1 to 5 stars
    pub rating: i16,

    #[sea_orm(column_type = "Text", nullable)]
    pub review: Option<String>,

    pub rateable_type: RateableType,

    pub rateable_id: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
