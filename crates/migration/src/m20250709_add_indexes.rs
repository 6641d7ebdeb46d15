use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Unique keys the upserts conflict on
        manager
            .create_index(
                Index::create()
                    .name("idx_units_subject_unit_number")
                    .table(Units::Table)
                    .col(Units::SubjectId)
                    .col(Units::UnitNumber)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_faculty_subjects_assignment")
                    .table(FacultySubjects::Table)
                    .col(FacultySubjects::FacultyId)
                    .col(FacultySubjects::SubjectId)
                    .col(FacultySubjects::Semester)
                    .col(FacultySubjects::BatchYear)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_student_marks_student_unit")
                    .table(StudentMarks::Table)
                    .col(StudentMarks::StudentId)
                    .col(StudentMarks::UnitId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Lookup indexes for scoped listings
        manager
            .create_index(
                Index::create()
                    .name("idx_users_department_role")
                    .table(Users::Table)
                    .col(Users::DepartmentId)
                    .col(Users::Role)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_students_department_semester")
                    .table(Students::Table)
                    .col(Students::DepartmentId)
                    .col(Students::Semester)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subjects_department_semester")
                    .table(Subjects::Table)
                    .col(Subjects::DepartmentId)
                    .col(Subjects::Semester)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_student_marks_unit_id")
                    .table(StudentMarks::Table)
                    .col(StudentMarks::UnitId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_student_marks_unit_id").table(StudentMarks::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_subjects_department_semester").table(Subjects::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_students_department_semester").table(Students::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_users_department_role").table(Users::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_student_marks_student_unit").table(StudentMarks::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_faculty_subjects_assignment").table(FacultySubjects::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_units_subject_unit_number").table(Units::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Users {
    Table,
    DepartmentId,
    Role,
}

#[derive(Iden)]
enum Students {
    Table,
    DepartmentId,
    Semester,
}

#[derive(Iden)]
enum Units {
    Table,
    SubjectId,
    UnitNumber,
}

#[derive(Iden)]
enum FacultySubjects {
    Table,
    FacultyId,
    SubjectId,
    Semester,
    BatchYear,
}

#[derive(Iden)]
enum StudentMarks {
    Table,
    StudentId,
    UnitId,
}

#[derive(Iden)]
enum Subjects {
    Table,
    DepartmentId,
    Semester,
}
