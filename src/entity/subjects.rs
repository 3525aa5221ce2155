//! 科目实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subject_classes::Entity")]
    SubjectClasses,
    #[sea_orm(has_many = "super::teacher_subjects::Entity")]
    TeacherSubjects,
    #[sea_orm(has_many = "super::grades::Entity")]
    Grades,
}

impl Related<super::subject_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubjectClasses.def()
    }
}

impl Related<super::grades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
