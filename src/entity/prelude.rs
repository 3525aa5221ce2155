//! 预导入模块，方便使用

pub use super::grades::{ActiveModel as GradeActiveModel, Entity as Grades, Model as GradeModel};
pub use super::parent_students::{
    ActiveModel as ParentStudentActiveModel, Entity as ParentStudents,
};
pub use super::parents::{ActiveModel as ParentActiveModel, Entity as Parents, Model as ParentModel};
pub use super::school_classes::{
    ActiveModel as SchoolClassActiveModel, Entity as SchoolClasses, Model as SchoolClassModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::subject_classes::{
    ActiveModel as SubjectClassActiveModel, Entity as SubjectClasses,
};
pub use super::subjects::{
    ActiveModel as SubjectActiveModel, Entity as Subjects, Model as SubjectModel,
};
pub use super::teacher_classes::{
    ActiveModel as TeacherClassActiveModel, Entity as TeacherClasses,
};
pub use super::teacher_subjects::{
    ActiveModel as TeacherSubjectActiveModel, Entity as TeacherSubjects,
};
pub use super::teachers::{
    ActiveModel as TeacherActiveModel, Entity as Teachers, Model as TeacherModel,
};
