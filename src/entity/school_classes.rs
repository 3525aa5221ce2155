//! 班级实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "school_classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub number_class: i32,
    pub letter_class: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::students::Entity")]
    Students,
    #[sea_orm(has_many = "super::subject_classes::Entity")]
    SubjectClasses,
    #[sea_orm(has_many = "super::teacher_classes::Entity")]
    TeacherClasses,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_school_class(self) -> crate::models::school_classes::entities::SchoolClass {
        crate::models::school_classes::entities::SchoolClass {
            id: self.id,
            number: self.number_class,
            letter: self.letter_class,
        }
    }
}
