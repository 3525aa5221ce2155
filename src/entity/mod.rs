//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行读写，然后组装为 models 中的业务实体。

pub mod prelude;

pub mod grades;
pub mod parent_students;
pub mod parents;
pub mod school_classes;
pub mod students;
pub mod subject_classes;
pub mod subjects;
pub mod teacher_classes;
pub mod teacher_subjects;
pub mod teachers;
