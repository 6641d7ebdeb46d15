use crate::{
    entities::{student_marks, students, subjects, units},
    scope::Scope,
    services::subject::SubjectService,
};
use log::{info, warn};
use models::{
    batch::{BatchOutcome, BatchRow},
    marks::MarkError,
};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, sea_query::{Expr, OnConflict},
};
use std::{
    collections::HashMap,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// One mark submission; an absent component keeps what is stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkEntry {
    pub student_id: i32,
    pub unit_id: i32,
    pub mst_marks: Option<f64>,
    pub assignment_marks: Option<f64>,
}

/// Why a single mark submission was not stored
#[derive(Debug)]
pub enum MarkWriteError {
    UnitNotFound(i32),
    NoPermission(i32),
    StudentNotFound(i32),
    Invalid(MarkError),
    Db(DbErr),
}

impl Display for MarkWriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::UnitNotFound(id) => write!(f, "Unit {id} not found"),
            Self::NoPermission(id) => write!(f, "No permission to enter marks for unit {id}"),
            Self::StudentNotFound(id) => write!(f, "Student {id} not found"),
            Self::Invalid(e) => write!(f, "{e}"),
            Self::Db(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MarkWriteError {}

impl From<DbErr> for MarkWriteError {
    fn from(e: DbErr) -> Self {
        Self::Db(e)
    }
}

/// A student of a subject's class with their marks in one unit
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub student: students::Model,
    pub mst_marks: Option<f64>,
    pub assignment_marks: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct UnitMarks {
    pub unit: units::Model,
    pub mst_marks: Option<f64>,
    pub assignment_marks: Option<f64>,
}

/// One subject of a student's semester with the student's marks per unit
#[derive(Debug, Clone)]
pub struct SubjectMarks {
    pub subject: subjects::Model,
    pub faculty_name: Option<String>,
    pub units: Vec<UnitMarks>,
}

pub struct MarksService;

impl MarksService {
    /// Finds the unit if the caller may enter marks for it
    async fn writable_unit(
        db: &DatabaseConnection,
        scope: &Scope,
        unit_id: i32,
    ) -> Result<units::Model, MarkWriteError> {
        let unit = units::Entity::find_by_id(unit_id)
            .filter(scope.units())
            .one(db)
            .await?;

        match (unit, scope) {
            (Some(unit), _) => Ok(unit),
            (None, Scope::All) => Err(MarkWriteError::UnitNotFound(unit_id)),
            (None, _) => Err(MarkWriteError::NoPermission(unit_id)),
        }
    }

    async fn check(
        db: &DatabaseConnection,
        scope: &Scope,
        entry: &MarkEntry,
    ) -> Result<(), MarkWriteError> {
        let unit = Self::writable_unit(db, scope, entry.unit_id).await?;

        let student = students::Entity::find_by_id(entry.student_id)
            .filter(scope.students())
            .one(db)
            .await?;
        if student.is_none() {
            return Err(MarkWriteError::StudentNotFound(entry.student_id));
        }

        unit.limits()
            .check(entry.mst_marks, entry.assignment_marks)
            .map_err(MarkWriteError::Invalid)
    }

    /// Inserts the pair or merges the supplied components into the stored row
    async fn upsert(db: &DatabaseConnection, writer: i32, entry: &MarkEntry) -> Result<(), DbErr> {
        let row = student_marks::ActiveModel {
            student_id: Set(entry.student_id),
            unit_id: Set(entry.unit_id),
            mst_marks: Set(entry.mst_marks),
            assignment_marks: Set(entry.assignment_marks),
            faculty_id: Set(Some(writer)),
            ..Default::default()
        };

        student_marks::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    student_marks::Column::StudentId,
                    student_marks::Column::UnitId,
                ])
                .value(
                    student_marks::Column::MstMarks,
                    Expr::cust("COALESCE(EXCLUDED.mst_marks, student_marks.mst_marks)"),
                )
                .value(
                    student_marks::Column::AssignmentMarks,
                    Expr::cust("COALESCE(EXCLUDED.assignment_marks, student_marks.assignment_marks)"),
                )
                .update_column(student_marks::Column::FacultyId)
                .value(student_marks::Column::UpdatedAt, Expr::current_timestamp())
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Ok(())
    }

    /// Stores one submission and returns the merged row
    pub async fn write(
        db: &DatabaseConnection,
        scope: &Scope,
        writer: i32,
        entry: MarkEntry,
    ) -> Result<student_marks::Model, MarkWriteError> {
        Self::check(db, scope, &entry).await?;
        Self::upsert(db, writer, &entry).await?;

        let stored = student_marks::Entity::find()
            .filter(student_marks::Column::StudentId.eq(entry.student_id))
            .filter(student_marks::Column::UnitId.eq(entry.unit_id))
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("student mark".to_string()))?;

        Ok(stored)
    }

    /// Stores every submission on its own; failures are counted, never raised
    pub async fn bulk_save(
        db: &DatabaseConnection,
        scope: &Scope,
        writer: i32,
        entries: Vec<BatchRow<MarkEntry>>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::new();
        info!("Saving {} mark entries for user {writer}", entries.len());

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(malformed) => {
                    warn!("Unreadable mark entry: {malformed}");
                    outcome.fail(malformed.to_string());
                    continue;
                }
            };

            let result = match Self::check(db, scope, &entry).await {
                Ok(()) => Self::upsert(db, writer, &entry).await.map_err(MarkWriteError::Db),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => outcome.succeed(),
                Err(MarkWriteError::Db(e)) => {
                    warn!("Mark save failed for student {}: {e}", entry.student_id);
                    outcome.fail(format!(
                        "Failed to save marks for student {}: {e}",
                        entry.student_id
                    ));
                }
                Err(e) => {
                    warn!("Rejected marks for student {}: {e}", entry.student_id);
                    outcome.fail(e.to_string());
                }
            }
        }

        info!(
            "Mark save finished: {} successful, {} failed",
            outcome.successful(),
            outcome.failed()
        );
        outcome
    }

    /// Students of the subject's department and semester with their marks in `unit_id`
    ///
    /// `sections` narrows the class to the given sections when present.
    pub async fn roster(
        db: &DatabaseConnection,
        subject: &subjects::Model,
        unit_id: Option<i32>,
        sections: Option<Vec<String>>,
    ) -> Result<Vec<RosterEntry>, DbErr> {
        let mut query = students::Entity::find()
            .filter(students::Column::DepartmentId.eq(subject.department_id))
            .filter(students::Column::Semester.eq(subject.semester));

        if let Some(sections) = sections {
            query = query.filter(students::Column::Section.is_in(sections));
        }

        let students = query
            .order_by_asc(students::Column::RollNumber)
            .all(db)
            .await?;

        let mut marks: HashMap<i32, student_marks::Model> = match unit_id {
            Some(unit_id) if !students.is_empty() => student_marks::Entity::find()
                .filter(student_marks::Column::UnitId.eq(unit_id))
                .filter(student_marks::Column::StudentId.is_in(students.iter().map(|s| s.id)))
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.student_id, m))
                .collect(),
            _ => HashMap::new(),
        };

        Ok(students
            .into_iter()
            .map(|student| {
                let mark = marks.remove(&student.id);
                RosterEntry {
                    mst_marks: mark.as_ref().and_then(|m| m.mst_marks),
                    assignment_marks: mark.as_ref().and_then(|m| m.assignment_marks),
                    student,
                }
            })
            .collect())
    }

    /// Subjects of the student's semester that have units, with the student's marks
    pub async fn student_overview(
        db: &DatabaseConnection,
        student: &students::Model,
    ) -> Result<Vec<SubjectMarks>, DbErr> {
        let subjects = subjects::Entity::find()
            .filter(subjects::Column::DepartmentId.eq(student.department_id))
            .filter(subjects::Column::Semester.eq(student.semester))
            .order_by_asc(subjects::Column::Name)
            .all(db)
            .await?;

        if subjects.is_empty() {
            return Ok(Vec::new());
        }

        let subject_ids: Vec<i32> = subjects.iter().map(|s| s.id).collect();
        let units = units::Entity::find()
            .filter(units::Column::SubjectId.is_in(subject_ids.clone()))
            .order_by_asc(units::Column::UnitNumber)
            .all(db)
            .await?;

        let marks: HashMap<i32, student_marks::Model> = if units.is_empty() {
            HashMap::new()
        } else {
            student_marks::Entity::find()
                .filter(student_marks::Column::StudentId.eq(student.id))
                .filter(student_marks::Column::UnitId.is_in(units.iter().map(|u| u.id)))
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.unit_id, m))
                .collect()
        };

        let mut faculty_names = SubjectService::faculty_names(db, subject_ids).await?;

        let mut units_by_subject: HashMap<i32, Vec<UnitMarks>> = HashMap::new();
        for unit in units {
            let mark = marks.get(&unit.id);
            units_by_subject
                .entry(unit.subject_id)
                .or_default()
                .push(UnitMarks {
                    mst_marks: mark.and_then(|m| m.mst_marks),
                    assignment_marks: mark.and_then(|m| m.assignment_marks),
                    unit,
                });
        }

        Ok(subjects
            .into_iter()
            .filter_map(|subject| {
                let units = units_by_subject.remove(&subject.id)?;
                Some(SubjectMarks {
                    faculty_name: faculty_names.remove(&subject.id),
                    units,
                    subject,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::batch::MalformedRow;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn unit() -> units::Model {
        units::Model {
            id: 8,
            subject_id: 2,
            unit_number: 1,
            unit_name: "Graphs".to_string(),
            max_mst_marks: 24,
            max_assignment_marks: 10,
        }
    }

    fn student() -> students::Model {
        students::Model {
            id: 31,
            roll_number: "CS031".to_string(),
            name: "Ravi".to_string(),
            department_id: 1,
            semester: 3,
            section: "A".to_string(),
            batch_year: 2022,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    fn stored(mst: Option<f64>, assignment: Option<f64>) -> student_marks::Model {
        student_marks::Model {
            id: 1,
            student_id: 31,
            unit_id: 8,
            mst_marks: mst,
            assignment_marks: assignment,
            faculty_id: Some(7),
            updated_at: chrono::NaiveDateTime::default(),
        }
    }

    fn faculty_scope() -> Scope {
        Scope::Faculty {
            faculty_id: 7,
            department_id: Some(1),
        }
    }

    #[tokio::test]
    async fn test_write_merges_with_coalesce() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![unit()]])
            .append_query_results([vec![student()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![stored(Some(20.0), Some(8.0))]])
            .into_connection();

        let entry = MarkEntry {
            student_id: 31,
            unit_id: 8,
            mst_marks: Some(20.0),
            assignment_marks: None,
        };
        let row = MarksService::write(&db, &faculty_scope(), 7, entry).await.unwrap();
        assert_eq!(row.assignment_marks, Some(8.0));

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(
            sql.contains("COALESCE(EXCLUDED.assignment_marks, student_marks.assignment_marks)"),
            "{sql}"
        );
        assert!(sql.contains(r#"\"faculty_id\" = \"excluded\".\"faculty_id\""#), "{sql}");
        assert!(sql.contains("CURRENT_TIMESTAMP"), "{sql}");
    }

    #[tokio::test]
    async fn test_write_rejects_marks_above_unit_maximum() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![unit()]])
            .append_query_results([vec![student()]])
            .into_connection();

        let entry = MarkEntry {
            student_id: 31,
            unit_id: 8,
            mst_marks: Some(30.0),
            assignment_marks: None,
        };
        let err = MarksService::write(&db, &faculty_scope(), 7, entry)
            .await
            .unwrap_err();
        assert!(matches!(err, MarkWriteError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_bulk_save_reports_each_failure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // unassigned unit
            .append_query_results([Vec::<units::Model>::new()])
            // stored row
            .append_query_results([vec![unit()]])
            .append_query_results([vec![student()]])
            // negative value
            .append_query_results([vec![unit()]])
            .append_query_results([vec![student()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let entries = vec![
            Ok(MarkEntry {
                student_id: 31,
                unit_id: 99,
                mst_marks: Some(10.0),
                assignment_marks: None,
            }),
            Ok(MarkEntry {
                student_id: 31,
                unit_id: 8,
                mst_marks: Some(18.0),
                assignment_marks: Some(9.0),
            }),
            Ok(MarkEntry {
                student_id: 31,
                unit_id: 8,
                mst_marks: None,
                assignment_marks: Some(-1.0),
            }),
        ];

        let report = MarksService::bulk_save(&db, &faculty_scope(), 7, entries)
            .await
            .into_report(10);

        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.errors[0], "No permission to enter marks for unit 99");
        assert_eq!(report.errors[1], "assignment marks cannot be negative (got -1)");
    }

    #[tokio::test]
    async fn test_bulk_save_counts_unreadable_entries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![unit()]])
            .append_query_results([vec![student()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let entries = vec![
            Err(MalformedRow {
                position: 1,
                reason: "invalid type: null, expected i32".to_string(),
            }),
            Ok(MarkEntry {
                student_id: 31,
                unit_id: 8,
                mst_marks: Some(20.0),
                assignment_marks: None,
            }),
        ];

        let report = MarksService::bulk_save(&db, &faculty_scope(), 7, entries)
            .await
            .into_report(10);

        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors, vec!["Row 1: invalid type: null, expected i32".to_string()]);
    }

    #[tokio::test]
    async fn test_admin_sees_missing_unit_as_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<units::Model>::new()])
            .into_connection();

        let report = MarksService::bulk_save(
            &db,
            &Scope::All,
            1,
            vec![Ok(MarkEntry {
                student_id: 31,
                unit_id: 99,
                mst_marks: Some(1.0),
                assignment_marks: None,
            })],
        )
        .await
        .into_report(10);

        assert_eq!(report.errors, vec!["Unit 99 not found".to_string()]);
    }

    #[tokio::test]
    async fn test_roster_attaches_unit_marks() {
        let mut other = student();
        other.id = 32;
        other.roll_number = "CS032".to_string();

        let subject = subjects::Model {
            id: 2,
            name: "Discrete Mathematics".to_string(),
            code: "CS201".to_string(),
            department_id: 1,
            semester: 3,
            credits: 4,
            created_at: chrono::NaiveDateTime::default(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![student(), other]])
            .append_query_results([vec![stored(Some(12.5), None)]])
            .into_connection();

        let roster = MarksService::roster(&db, &subject, Some(8), Some(vec!["A".to_string()]))
            .await
            .unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].mst_marks, Some(12.5));
        assert_eq!(roster[1].mst_marks, None);

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains(r#"\"students\".\"section\" IN"#), "{sql}");
    }
}
