use crate::{
    entities::{departments, faculty_subjects, subjects, users},
    scope::Scope,
    services::user::{UserChanges, UserService},
};
use models::role::Role;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::{Expr, OnConflict},
};
use std::collections::HashMap;

/// A faculty member as shown in the faculty table
#[derive(Debug, Clone)]
pub struct FacultySummary {
    pub user: users::Model,
    pub department_name: Option<String>,
    pub subject_count: i64,
}

/// Assignment of a faculty member to teach a subject to some sections
#[derive(Debug, Clone)]
pub struct Assignment {
    pub faculty_id: i32,
    pub subject_id: i32,
    pub semester: i32,
    pub batch_year: i32,
    pub sections: Vec<String>,
}

/// A subject as seen by the faculty member teaching it
#[derive(Debug, Clone)]
pub struct TaughtSubject {
    pub subject: subjects::Model,
    pub department_name: Option<String>,
    pub sections: Vec<String>,
    pub batch_year: i32,
}

pub struct FacultyService;

impl FacultyService {
    pub async fn list(
        db: &DatabaseConnection,
        scope: &Scope,
    ) -> Result<Vec<FacultySummary>, DbErr> {
        let faculty = users::Entity::find()
            .filter(scope.faculty())
            .find_also_related(departments::Entity)
            .order_by_asc(users::Column::Name)
            .all(db)
            .await?;

        let ids: Vec<i32> = faculty.iter().map(|(user, _)| user.id).collect();
        let subject_counts: HashMap<i32, i64> = if ids.is_empty() {
            HashMap::new()
        } else {
            faculty_subjects::Entity::find()
                .select_only()
                .column(faculty_subjects::Column::FacultyId)
                .column_as(Expr::col(faculty_subjects::Column::Id).count(), "count")
                .filter(faculty_subjects::Column::FacultyId.is_in(ids))
                .group_by(faculty_subjects::Column::FacultyId)
                .into_tuple::<(i32, i64)>()
                .all(db)
                .await?
                .into_iter()
                .collect()
        };

        Ok(faculty
            .into_iter()
            .map(|(user, department)| FacultySummary {
                subject_count: subject_counts.get(&user.id).copied().unwrap_or(0),
                department_name: department.map(|d| d.name),
                user,
            })
            .collect())
    }

    /// Looks up an account only if it is a faculty account
    pub async fn find(db: &DatabaseConnection, id: i32) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::Role.eq(Role::Faculty))
            .one(db)
            .await
    }

    /// Updates a faculty account; other roles are treated as absent
    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        changes: UserChanges,
    ) -> Result<Option<users::Model>, DbErr> {
        let Some(existing) = Self::find(db, id).await? else {
            return Ok(None);
        };

        UserService::apply(db, existing, changes).await.map(Some)
    }

    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
        match Self::find(db, id).await? {
            Some(_) => UserService::delete(db, id).await,
            None => Ok(false),
        }
    }

    /// Creates or refreshes an assignment; an existing one only gets its sections replaced
    pub async fn assign(
        db: &DatabaseConnection,
        assignment: Assignment,
    ) -> Result<faculty_subjects::Model, DbErr> {
        let row = faculty_subjects::ActiveModel {
            faculty_id: Set(assignment.faculty_id),
            subject_id: Set(assignment.subject_id),
            semester: Set(assignment.semester),
            batch_year: Set(assignment.batch_year),
            sections: Set(assignment.sections),
            ..Default::default()
        };

        faculty_subjects::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    faculty_subjects::Column::FacultyId,
                    faculty_subjects::Column::SubjectId,
                    faculty_subjects::Column::Semester,
                    faculty_subjects::Column::BatchYear,
                ])
                .update_column(faculty_subjects::Column::Sections)
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        faculty_subjects::Entity::find()
            .filter(faculty_subjects::Column::FacultyId.eq(assignment.faculty_id))
            .filter(faculty_subjects::Column::SubjectId.eq(assignment.subject_id))
            .filter(faculty_subjects::Column::Semester.eq(assignment.semester))
            .filter(faculty_subjects::Column::BatchYear.eq(assignment.batch_year))
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("faculty subject assignment".to_string()))
    }

    /// Sections of `subject_id` assigned to `faculty_id`, across all batches
    pub async fn sections(
        db: &DatabaseConnection,
        faculty_id: i32,
        subject_id: i32,
    ) -> Result<Vec<String>, DbErr> {
        let rows = faculty_subjects::Entity::find()
            .filter(faculty_subjects::Column::FacultyId.eq(faculty_id))
            .filter(faculty_subjects::Column::SubjectId.eq(subject_id))
            .all(db)
            .await?;

        let mut sections: Vec<String> = rows.into_iter().flat_map(|r| r.sections).collect();
        sections.sort();
        sections.dedup();
        Ok(sections)
    }

    pub async fn taught_subjects(
        db: &DatabaseConnection,
        faculty_id: i32,
    ) -> Result<Vec<TaughtSubject>, DbErr> {
        let assignments = faculty_subjects::Entity::find()
            .filter(faculty_subjects::Column::FacultyId.eq(faculty_id))
            .find_also_related(subjects::Entity)
            .all(db)
            .await?;

        let department_ids: Vec<i32> = assignments
            .iter()
            .filter_map(|(_, subject)| subject.as_ref().map(|s| s.department_id))
            .collect();
        let department_names: HashMap<i32, String> = if department_ids.is_empty() {
            HashMap::new()
        } else {
            departments::Entity::find()
                .filter(departments::Column::Id.is_in(department_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|d| (d.id, d.name))
                .collect()
        };

        let mut taught: Vec<TaughtSubject> = assignments
            .into_iter()
            .filter_map(|(assignment, subject)| {
                let subject = subject?;
                Some(TaughtSubject {
                    department_name: department_names.get(&subject.department_id).cloned(),
                    sections: assignment.sections,
                    batch_year: assignment.batch_year,
                    subject,
                })
            })
            .collect();

        taught.sort_by(|a, b| {
            a.subject
                .semester
                .cmp(&b.subject.semester)
                .then_with(|| a.subject.name.cmp(&b.subject.name))
        });

        Ok(taught)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn assignment_row(sections: &[&str]) -> faculty_subjects::Model {
        faculty_subjects::Model {
            id: 3,
            faculty_id: 7,
            subject_id: 2,
            semester: 3,
            batch_year: 2021,
            sections: sections.iter().map(|s| s.to_string()).collect(),
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    #[tokio::test]
    async fn test_assign_overwrites_sections_on_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![assignment_row(&["A", "B"])]])
            .into_connection();

        let stored = FacultyService::assign(
            &db,
            Assignment {
                faculty_id: 7,
                subject_id: 2,
                semester: 3,
                batch_year: 2021,
                sections: vec!["A".to_string(), "B".to_string()],
            },
        )
        .await
        .unwrap();
        assert_eq!(stored.sections, vec!["A", "B"]);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(
            log.contains(r#"ON CONFLICT (\"faculty_id\", \"subject_id\", \"semester\", \"batch_year\") DO UPDATE SET \"sections\" = \"excluded\".\"sections\""#),
            "{log}"
        );
    }

    #[tokio::test]
    async fn test_sections_are_merged_across_batches() {
        let mut other_batch = assignment_row(&["B", "C"]);
        other_batch.batch_year = 2022;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![assignment_row(&["A", "B"]), other_batch]])
            .into_connection();

        let sections = FacultyService::sections(&db, 7, 2).await.unwrap();
        assert_eq!(sections, vec!["A", "B", "C"]);
    }
}
