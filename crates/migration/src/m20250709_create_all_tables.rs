use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create departments table; the HOD reference is added once users exist
        manager
            .create_table(
                Table::create()
                    .table(Departments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Departments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Departments::Name).string().not_null())
                    .col(ColumnDef::new(Departments::Code).string().not_null())
                    .col(ColumnDef::new(Departments::HodId).integer())
                    .col(
                        ColumnDef::new(Departments::NbaThreshold)
                            .double()
                            .not_null()
                            .default(52.0),
                    )
                    .col(
                        ColumnDef::new(Departments::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).text().not_null())
                    .col(ColumnDef::new(Users::DepartmentId).integer())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Users::Role).is_in(["admin", "hod", "faculty"]))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-department_id")
                            .from(Users::Table, Users::DepartmentId)
                            .to(Departments::Table, Departments::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk-departments-hod_id")
                    .from(Departments::Table, Departments::HodId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .to_owned(),
            )
            .await?;

        // Create students table
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Students::RollNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Students::Name).string().not_null())
                    .col(ColumnDef::new(Students::DepartmentId).integer().not_null())
                    .col(ColumnDef::new(Students::Semester).integer().not_null())
                    .col(
                        ColumnDef::new(Students::Section)
                            .string()
                            .not_null()
                            .default("A"),
                    )
                    .col(ColumnDef::new(Students::BatchYear).integer().not_null())
                    .col(
                        ColumnDef::new(Students::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Students::Semester).between(1, 8))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-students-department_id")
                            .from(Students::Table, Students::DepartmentId)
                            .to(Departments::Table, Departments::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create subjects table
        manager
            .create_table(
                Table::create()
                    .table(Subjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subjects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subjects::Name).string().not_null())
                    .col(ColumnDef::new(Subjects::Code).string().not_null())
                    .col(ColumnDef::new(Subjects::DepartmentId).integer().not_null())
                    .col(ColumnDef::new(Subjects::Semester).integer().not_null())
                    .col(
                        ColumnDef::new(Subjects::Credits)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Subjects::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-subjects-department_id")
                            .from(Subjects::Table, Subjects::DepartmentId)
                            .to(Departments::Table, Departments::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create units table
        manager
            .create_table(
                Table::create()
                    .table(Units::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Units::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Units::SubjectId).integer().not_null())
                    .col(ColumnDef::new(Units::UnitNumber).integer().not_null())
                    .col(ColumnDef::new(Units::UnitName).string().not_null())
                    .col(
                        ColumnDef::new(Units::MaxMstMarks)
                            .integer()
                            .not_null()
                            .default(24),
                    )
                    .col(
                        ColumnDef::new(Units::MaxAssignmentMarks)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-units-subject_id")
                            .from(Units::Table, Units::SubjectId)
                            .to(Subjects::Table, Subjects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create faculty_subjects junction table (faculty <-> subjects)
        manager
            .create_table(
                Table::create()
                    .table(FacultySubjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FacultySubjects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FacultySubjects::FacultyId).integer().not_null())
                    .col(ColumnDef::new(FacultySubjects::SubjectId).integer().not_null())
                    .col(ColumnDef::new(FacultySubjects::Semester).integer().not_null())
                    .col(ColumnDef::new(FacultySubjects::BatchYear).integer().not_null())
                    .col(
                        ColumnDef::new(FacultySubjects::Sections)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FacultySubjects::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-faculty_subjects-faculty_id")
                            .from(FacultySubjects::Table, FacultySubjects::FacultyId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-faculty_subjects-subject_id")
                            .from(FacultySubjects::Table, FacultySubjects::SubjectId)
                            .to(Subjects::Table, Subjects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create student_marks table
        manager
            .create_table(
                Table::create()
                    .table(StudentMarks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentMarks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StudentMarks::StudentId).integer().not_null())
                    .col(ColumnDef::new(StudentMarks::UnitId).integer().not_null())
                    .col(ColumnDef::new(StudentMarks::MstMarks).double())
                    .col(ColumnDef::new(StudentMarks::AssignmentMarks).double())
                    .col(ColumnDef::new(StudentMarks::FacultyId).integer())
                    .col(
                        ColumnDef::new(StudentMarks::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_marks-student_id")
                            .from(StudentMarks::Table, StudentMarks::StudentId)
                            .to(Students::Table, Students::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_marks-unit_id")
                            .from(StudentMarks::Table, StudentMarks::UnitId)
                            .to(Units::Table, Units::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_marks-faculty_id")
                            .from(StudentMarks::Table, StudentMarks::FacultyId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StudentMarks::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FacultySubjects::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Units::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Subjects::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;

        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk-departments-hod_id")
                    .table(Departments::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Departments::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Departments {
    Table,
    Id,
    Name,
    Code,
    HodId,
    NbaThreshold,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    DepartmentId,
    CreatedAt,
}

#[derive(Iden)]
enum Students {
    Table,
    Id,
    RollNumber,
    Name,
    DepartmentId,
    Semester,
    Section,
    BatchYear,
    CreatedAt,
}

#[derive(Iden)]
enum Subjects {
    Table,
    Id,
    Name,
    Code,
    DepartmentId,
    Semester,
    Credits,
    CreatedAt,
}

#[derive(Iden)]
enum Units {
    Table,
    Id,
    SubjectId,
    UnitNumber,
    UnitName,
    MaxMstMarks,
    MaxAssignmentMarks,
}

#[derive(Iden)]
enum FacultySubjects {
    Table,
    Id,
    FacultyId,
    SubjectId,
    Semester,
    BatchYear,
    Sections,
    CreatedAt,
}

#[derive(Iden)]
enum StudentMarks {
    Table,
    Id,
    StudentId,
    UnitId,
    MstMarks,
    AssignmentMarks,
    FacultyId,
    UpdatedAt,
}
