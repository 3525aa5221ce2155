use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 班级表
        manager
            .create_table(
                Table::create()
                    .table(SchoolClasses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchoolClasses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SchoolClasses::NumberClass)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SchoolClasses::LetterClass)
                            .string_len(1)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 科目表
        manager
            .create_table(
                Table::create()
                    .table(Subjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subjects::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subjects::Name).string_len(100).not_null())
                    .to_owned(),
            )
            .await?;

        // 科目开设班级
        manager
            .create_table(
                Table::create()
                    .table(SubjectClasses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubjectClasses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubjectClasses::SubjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubjectClasses::ClassId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SubjectClasses::Table, SubjectClasses::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SubjectClasses::Table, SubjectClasses::ClassId)
                            .to(SchoolClasses::Table, SchoolClasses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 教师表
        manager
            .create_table(
                Table::create()
                    .table(Teachers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teachers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Teachers::LoginId)
                            .string_len(10)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Teachers::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Teachers::FirstName).string_len(30).not_null())
                    .col(ColumnDef::new(Teachers::LastName).string_len(30).not_null())
                    .col(ColumnDef::new(Teachers::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeacherSubjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeacherSubjects::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeacherSubjects::TeacherId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherSubjects::SubjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherSubjects::Table, TeacherSubjects::TeacherId)
                            .to(Teachers::Table, Teachers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherSubjects::Table, TeacherSubjects::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeacherClasses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeacherClasses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeacherClasses::TeacherId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherClasses::ClassId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherClasses::Table, TeacherClasses::TeacherId)
                            .to(Teachers::Table, Teachers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherClasses::Table, TeacherClasses::ClassId)
                            .to(SchoolClasses::Table, SchoolClasses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 学生表，班级可为空
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Students::LoginId)
                            .string_len(10)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Students::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Students::FirstName).string_len(30).not_null())
                    .col(ColumnDef::new(Students::LastName).string_len(30).not_null())
                    .col(ColumnDef::new(Students::ClassId).big_integer().null())
                    .col(ColumnDef::new(Students::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Students::Table, Students::ClassId)
                            .to(SchoolClasses::Table, SchoolClasses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 家长表
        manager
            .create_table(
                Table::create()
                    .table(Parents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Parents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Parents::LoginId)
                            .string_len(10)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Parents::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Parents::FirstName).string_len(30).not_null())
                    .col(ColumnDef::new(Parents::LastName).string_len(30).not_null())
                    .col(ColumnDef::new(Parents::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ParentStudents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParentStudents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ParentStudents::ParentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParentStudents::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ParentStudents::Table, ParentStudents::ParentId)
                            .to(Parents::Table, Parents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ParentStudents::Table, ParentStudents::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_school_classes_number_letter")
                    .table(SchoolClasses::Table)
                    .col(SchoolClasses::NumberClass)
                    .col(SchoolClasses::LetterClass)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_subject_classes_pair")
                    .table(SubjectClasses::Table)
                    .col(SubjectClasses::SubjectId)
                    .col(SubjectClasses::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_teacher_subjects_pair")
                    .table(TeacherSubjects::Table)
                    .col(TeacherSubjects::TeacherId)
                    .col(TeacherSubjects::SubjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_teacher_classes_pair")
                    .table(TeacherClasses::Table)
                    .col(TeacherClasses::TeacherId)
                    .col(TeacherClasses::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_students_class_id")
                    .table(Students::Table)
                    .col(Students::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_parent_students_pair")
                    .table(ParentStudents::Table)
                    .col(ParentStudents::ParentId)
                    .col(ParentStudents::StudentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(ParentStudents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeacherClasses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeacherSubjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teachers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubjectClasses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SchoolClasses::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum SchoolClasses {
    Table,
    Id,
    NumberClass,
    LetterClass,
}

#[derive(DeriveIden)]
pub(crate) enum Subjects {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum SubjectClasses {
    Table,
    Id,
    SubjectId,
    ClassId,
}

#[derive(DeriveIden)]
enum Teachers {
    Table,
    Id,
    LoginId,
    PasswordHash,
    FirstName,
    LastName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeacherSubjects {
    Table,
    Id,
    TeacherId,
    SubjectId,
}

#[derive(DeriveIden)]
enum TeacherClasses {
    Table,
    Id,
    TeacherId,
    ClassId,
}

#[derive(DeriveIden)]
pub(crate) enum Students {
    Table,
    Id,
    LoginId,
    PasswordHash,
    FirstName,
    LastName,
    ClassId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Parents {
    Table,
    Id,
    LoginId,
    PasswordHash,
    FirstName,
    LastName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ParentStudents {
    Table,
    Id,
    ParentId,
    StudentId,
}
