//! 学生实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub login_id: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub class_id: Option<i64>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school_classes::Entity",
        from = "Column::ClassId",
        to = "super::school_classes::Column::Id"
    )]
    SchoolClass,
    #[sea_orm(has_many = "super::grades::Entity")]
    Grades,
    #[sea_orm(has_many = "super::parent_students::Entity")]
    ParentStudents,
}

impl Related<super::school_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolClass.def()
    }
}

impl Related<super::grades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grades.def()
    }
}

impl Related<super::parent_students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParentStudents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型，班级由调用方一并查出
impl Model {
    pub fn into_student(
        self,
        class: Option<crate::models::school_classes::entities::SchoolClass>,
    ) -> crate::models::students::entities::Student {
        crate::models::students::entities::Student {
            id: self.id,
            login_id: self.login_id,
            first_name: self.first_name,
            last_name: self.last_name,
            class,
        }
    }
}
