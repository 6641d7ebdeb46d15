use models::marks::UnitLimits;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A graded sub-component of a subject; unique on (subject_id, unit_number)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "units")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub subject_id: i32,
    pub unit_number: i32,
    pub unit_name: String,
    pub max_mst_marks: i32,
    pub max_assignment_marks: i32,
}

impl Model {
    pub fn limits(&self) -> UnitLimits {
        UnitLimits::new(
            f64::from(self.max_mst_marks),
            f64::from(self.max_assignment_marks),
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subjects::Entity",
        from = "Column::SubjectId",
        to = "super::subjects::Column::Id"
    )]
    Subject,
    #[sea_orm(has_many = "super::student_marks::Entity")]
    StudentMarks,
}

impl Related<super::subjects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl Related<super::student_marks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentMarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
