use crate::{
    entities::{departments, student_marks, students},
    scope::Scope,
};
use log::{info, warn};
use models::{
    batch::{BatchOutcome, BatchRow},
    import::{DepartmentDirectory, StudentImportRow},
    principal::Principal,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, sea_query::OnConflict,
};

#[derive(Debug, Clone)]
pub struct StudentInput {
    pub roll_number: String,
    pub name: String,
    pub department_id: i32,
    pub semester: i32,
    pub section: String,
    pub batch_year: i32,
}

impl StudentInput {
    fn into_active_model(self) -> students::ActiveModel {
        students::ActiveModel {
            roll_number: Set(self.roll_number),
            name: Set(self.name),
            department_id: Set(self.department_id),
            semester: Set(self.semester),
            section: Set(self.section),
            batch_year: Set(self.batch_year),
            ..Default::default()
        }
    }
}

pub struct StudentService;

impl StudentService {
    /// Students visible to the caller, ordered by roll number
    pub async fn list(
        db: &DatabaseConnection,
        scope: &Scope,
    ) -> Result<Vec<(students::Model, Option<departments::Model>)>, DbErr> {
        students::Entity::find()
            .filter(scope.students())
            .find_also_related(departments::Entity)
            .order_by_asc(students::Column::RollNumber)
            .all(db)
            .await
    }

    pub async fn find(db: &DatabaseConnection, id: i32) -> Result<Option<students::Model>, DbErr> {
        students::Entity::find_by_id(id).one(db).await
    }

    pub async fn create(
        db: &DatabaseConnection,
        input: StudentInput,
    ) -> Result<students::Model, DbErr> {
        input.into_active_model().insert(db).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        input: StudentInput,
    ) -> Result<Option<students::Model>, DbErr> {
        let Some(existing) = Self::find(db, id).await? else {
            return Ok(None);
        };

        let mut student: students::ActiveModel = existing.into();
        student.roll_number = Set(input.roll_number);
        student.name = Set(input.name);
        student.department_id = Set(input.department_id);
        student.semester = Set(input.semester);
        student.section = Set(input.section);
        student.batch_year = Set(input.batch_year);

        student.update(db).await.map(Some)
    }

    /// Deletes the student; failing to clear their marks first is only logged
    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
        if let Err(e) = student_marks::Entity::delete_many()
            .filter(student_marks::Column::StudentId.eq(id))
            .exec(db)
            .await
        {
            warn!("Could not clear marks of student {id}: {e}");
        }

        let result = students::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Inserts or refreshes a student keyed on roll number
    pub async fn upsert(db: &DatabaseConnection, input: StudentInput) -> Result<(), DbErr> {
        students::Entity::insert(input.into_active_model())
            .on_conflict(
                OnConflict::column(students::Column::RollNumber)
                    .update_columns([
                        students::Column::Name,
                        students::Column::DepartmentId,
                        students::Column::Semester,
                        students::Column::Section,
                        students::Column::BatchYear,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Ok(())
    }

    /// Imports spreadsheet rows one at a time; a bad row never stops the rest
    pub async fn import(
        db: &DatabaseConnection,
        principal: &Principal,
        directory: &DepartmentDirectory,
        rows: Vec<BatchRow<StudentImportRow>>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::new();
        info!(
            "Importing {} students for {} {} against {} departments",
            rows.len(),
            principal.role,
            principal.user_id,
            directory.len()
        );

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(malformed) => {
                    let message = malformed.to_string();
                    warn!("{message}");
                    outcome.fail(message);
                    continue;
                }
            };

            let problems = row.problems();
            if !problems.is_empty() {
                let message = format!("{}: {}", row.label(), problems.join(", "));
                warn!("{message}");
                outcome.fail(message);
                continue;
            }

            let Some(department_id) = directory.resolve(&row.department) else {
                let message = format!(
                    "Department \"{}\" not found for {}",
                    row.department,
                    row.label()
                );
                warn!("{message}");
                outcome.fail(message);
                continue;
            };

            if principal.is_hod() && !principal.owns_department(department_id) {
                let message = format!(
                    "HOD cannot upload student {} - not in your department",
                    row.label()
                );
                warn!("{message}");
                outcome.fail(message);
                continue;
            }

            let roll_number = row.roll_number.trim().to_string();
            let input = StudentInput {
                name: row.name.trim().to_string(),
                department_id,
                semester: row.semester,
                section: row.section.trim().to_string(),
                batch_year: row.batch_year,
                roll_number: roll_number.clone(),
            };

            match Self::upsert(db, input).await {
                Ok(()) => outcome.succeed(),
                Err(e) => {
                    let message = format!("Failed to insert {roll_number}: {e}");
                    warn!("{message}");
                    outcome.fail(message);
                }
            }
        }

        info!(
            "Student import finished: {} successful, {} failed",
            outcome.successful(),
            outcome.failed()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{batch::parse_rows, role::Role};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn row(roll_number: &str, department: &str, semester: i32) -> StudentImportRow {
        StudentImportRow {
            roll_number: roll_number.to_string(),
            name: "Asha".to_string(),
            department: department.to_string(),
            semester,
            section: "A".to_string(),
            batch_year: 2022,
        }
    }

    fn directory() -> DepartmentDirectory {
        DepartmentDirectory::new([(1, "Computer Science Engineering"), (2, "Civil")])
    }

    #[tokio::test]
    async fn test_import_counts_each_row_independently() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let hod = Principal::new(5, Role::Hod, Some(1));
        let rows = vec![
            Ok(row("CS001", "computer science engineering", 3)),
            Ok(row("CE001", "Civil", 3)),
            Ok(row("XX001", "Mechanical", 3)),
            Ok(row("CS002", "Computer Science Engineering", 9)),
        ];

        let report = StudentService::import(&db, &hod, &directory(), rows)
            .await
            .into_report(20);

        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 3);
        assert_eq!(
            report.errors,
            vec![
                "HOD cannot upload student CE001 - not in your department".to_string(),
                "Department \"Mechanical\" not found for XX001".to_string(),
                "CS002: Invalid semester".to_string(),
            ]
        );

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains(r#"ON CONFLICT (\"roll_number\") DO UPDATE"#), "{sql}");
    }

    #[tokio::test]
    async fn test_import_turns_database_errors_into_failures() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("duplicate key".to_string())])
            .into_connection();

        let admin = Principal::new(1, Role::Admin, None);
        let rows = vec![Ok(row("CS001", "Civil", 1))];
        let report = StudentService::import(&db, &admin, &directory(), rows)
            .await
            .into_report(20);

        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, 1);
        assert!(report.errors[0].starts_with("Failed to insert CS001"));
    }

    #[tokio::test]
    async fn test_import_counts_unreadable_rows_and_keeps_going() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let rows = parse_rows::<StudentImportRow>(vec![
            json!({
                "roll_number": "CS001",
                "name": "Asha",
                "department": "Civil",
                "semester": 3,
                "batch_year": 2022
            }),
            json!({
                "roll_number": "CS002",
                "name": "Ravi",
                "department": "Civil",
                "semester": null,
                "batch_year": 2022
            }),
            json!({
                "roll_number": "CS003",
                "name": "Meera",
                "department": "Civil",
                "semester": 5,
                "batch_year": 2021
            }),
        ]);

        let admin = Principal::new(1, Role::Admin, None);
        let report = StudentService::import(&db, &admin, &directory(), rows)
            .await
            .into_report(20);

        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert!(report.errors[0].starts_with("Row 2: invalid type: null"), "{:?}", report.errors);

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_survives_mark_cleanup_failure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("relation missing".to_string())])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        assert!(StudentService::delete(&db, 3).await.unwrap());
    }
}
