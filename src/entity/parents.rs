//! 家长实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "parents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub login_id: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parent_students::Entity")]
    ParentStudents,
}

impl Related<super::parent_students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParentStudents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_parent(self, children_ids: Vec<i64>) -> crate::models::parents::entities::Parent {
        crate::models::parents::entities::Parent {
            id: self.id,
            login_id: self.login_id,
            first_name: self.first_name,
            last_name: self.last_name,
            children_ids,
        }
    }
}
