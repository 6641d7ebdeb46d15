use crate::{
    entities::{departments, faculty_subjects, student_marks, subjects, units, users},
    scope::Scope,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
    sea_query::OnConflict,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct SubjectInput {
    pub name: String,
    pub code: String,
    pub department_id: i32,
    pub semester: i32,
    pub credits: i32,
}

#[derive(Debug, Clone)]
pub struct UnitInput {
    pub unit_number: i32,
    pub unit_name: String,
    pub max_mst_marks: i32,
    pub max_assignment_marks: i32,
}

/// A subject as shown in the subject table
#[derive(Debug, Clone)]
pub struct SubjectSummary {
    pub subject: subjects::Model,
    pub department_name: Option<String>,
    /// Names of every assigned faculty member, comma separated
    pub faculty_name: Option<String>,
}

pub struct SubjectService;

impl SubjectService {
    pub async fn list(
        db: &DatabaseConnection,
        scope: &Scope,
    ) -> Result<Vec<SubjectSummary>, DbErr> {
        let subjects = subjects::Entity::find()
            .filter(scope.subjects())
            .find_also_related(departments::Entity)
            .order_by_asc(subjects::Column::DepartmentId)
            .order_by_asc(subjects::Column::Semester)
            .order_by_asc(subjects::Column::Name)
            .all(db)
            .await?;

        let ids: Vec<i32> = subjects.iter().map(|(subject, _)| subject.id).collect();
        let mut faculty_names = Self::faculty_names(db, ids).await?;

        Ok(subjects
            .into_iter()
            .map(|(subject, department)| SubjectSummary {
                department_name: department.map(|d| d.name),
                faculty_name: faculty_names.remove(&subject.id),
                subject,
            })
            .collect())
    }

    /// Comma separated names of the faculty assigned to each subject
    pub(crate) async fn faculty_names(
        db: &DatabaseConnection,
        subject_ids: Vec<i32>,
    ) -> Result<HashMap<i32, String>, DbErr> {
        if subject_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, String)> = faculty_subjects::Entity::find()
            .select_only()
            .column(faculty_subjects::Column::SubjectId)
            .column(users::Column::Name)
            .join(JoinType::InnerJoin, faculty_subjects::Relation::Faculty.def())
            .filter(faculty_subjects::Column::SubjectId.is_in(subject_ids))
            .into_tuple()
            .all(db)
            .await?;

        let mut names: HashMap<i32, Vec<String>> = HashMap::new();
        for (subject_id, name) in rows {
            names.entry(subject_id).or_default().push(name);
        }

        Ok(names
            .into_iter()
            .map(|(subject_id, mut names)| {
                names.sort();
                names.dedup();
                (subject_id, names.join(", "))
            })
            .collect())
    }

    pub async fn find(db: &DatabaseConnection, id: i32) -> Result<Option<subjects::Model>, DbErr> {
        subjects::Entity::find_by_id(id).one(db).await
    }

    /// The subject with its department and its units ordered by number
    pub async fn details(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<(subjects::Model, Option<departments::Model>, Vec<units::Model>)>, DbErr>
    {
        let Some((subject, department)) = subjects::Entity::find_by_id(id)
            .find_also_related(departments::Entity)
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let units = Self::units(db, id).await?;
        Ok(Some((subject, department, units)))
    }

    pub async fn units(db: &DatabaseConnection, subject_id: i32) -> Result<Vec<units::Model>, DbErr> {
        units::Entity::find()
            .filter(units::Column::SubjectId.eq(subject_id))
            .order_by_asc(units::Column::UnitNumber)
            .all(db)
            .await
    }

    pub async fn create(
        db: &DatabaseConnection,
        input: SubjectInput,
    ) -> Result<subjects::Model, DbErr> {
        subjects::ActiveModel {
            name: Set(input.name),
            code: Set(input.code),
            department_id: Set(input.department_id),
            semester: Set(input.semester),
            credits: Set(input.credits),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        input: SubjectInput,
    ) -> Result<Option<subjects::Model>, DbErr> {
        let Some(existing) = Self::find(db, id).await? else {
            return Ok(None);
        };

        let mut subject: subjects::ActiveModel = existing.into();
        subject.name = Set(input.name);
        subject.code = Set(input.code);
        subject.department_id = Set(input.department_id);
        subject.semester = Set(input.semester);
        subject.credits = Set(input.credits);

        subject.update(db).await.map(Some)
    }

    /// Removes assignments, marks and units of the subject, then the subject
    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
        let txn = db.begin().await?;

        let unit_ids: Vec<i32> = units::Entity::find()
            .select_only()
            .column(units::Column::Id)
            .filter(units::Column::SubjectId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        faculty_subjects::Entity::delete_many()
            .filter(faculty_subjects::Column::SubjectId.eq(id))
            .exec(&txn)
            .await?;

        student_marks::Entity::delete_many()
            .filter(student_marks::Column::UnitId.is_in(unit_ids))
            .exec(&txn)
            .await?;

        units::Entity::delete_many()
            .filter(units::Column::SubjectId.eq(id))
            .exec(&txn)
            .await?;

        let result = subjects::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// Makes the subject's units exactly `unit_set`
    ///
    /// Units whose number is no longer listed are removed with their marks;
    /// the rest are upserted on `(subject_id, unit_number)` so that marks of
    /// kept units survive.
    pub async fn replace_units(
        db: &DatabaseConnection,
        subject_id: i32,
        unit_set: Vec<UnitInput>,
    ) -> Result<Vec<units::Model>, DbErr> {
        let txn = db.begin().await?;

        let kept: HashSet<i32> = unit_set.iter().map(|u| u.unit_number).collect();
        let existing: Vec<(i32, i32)> = units::Entity::find()
            .select_only()
            .column(units::Column::Id)
            .column(units::Column::UnitNumber)
            .filter(units::Column::SubjectId.eq(subject_id))
            .into_tuple()
            .all(&txn)
            .await?;

        let removed: Vec<i32> = existing
            .into_iter()
            .filter(|(_, number)| !kept.contains(number))
            .map(|(id, _)| id)
            .collect();

        if !removed.is_empty() {
            student_marks::Entity::delete_many()
                .filter(student_marks::Column::UnitId.is_in(removed.clone()))
                .exec(&txn)
                .await?;

            units::Entity::delete_many()
                .filter(units::Column::Id.is_in(removed))
                .exec(&txn)
                .await?;
        }

        if !unit_set.is_empty() {
            let rows = unit_set.into_iter().map(|unit| units::ActiveModel {
                subject_id: Set(subject_id),
                unit_number: Set(unit.unit_number),
                unit_name: Set(unit.unit_name),
                max_mst_marks: Set(unit.max_mst_marks),
                max_assignment_marks: Set(unit.max_assignment_marks),
                ..Default::default()
            });

            units::Entity::insert_many(rows)
                .on_conflict(
                    OnConflict::columns([units::Column::SubjectId, units::Column::UnitNumber])
                        .update_columns([
                            units::Column::UnitName,
                            units::Column::MaxMstMarks,
                            units::Column::MaxAssignmentMarks,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        Self::units(db, subject_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn affected(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn unit(id: i32, unit_number: i32) -> units::Model {
        units::Model {
            id,
            subject_id: 4,
            unit_number,
            unit_name: format!("Unit {unit_number}"),
            max_mst_marks: 24,
            max_assignment_marks: 10,
        }
    }

    #[tokio::test]
    async fn test_replace_units_drops_unlisted_units_with_marks() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                BTreeMap::from([("id", Value::from(10)), ("unit_number", Value::from(1))]),
                BTreeMap::from([("id", Value::from(11)), ("unit_number", Value::from(2))]),
            ]])
            .append_exec_results([affected(3), affected(1), affected(1)])
            .append_query_results([vec![unit(10, 1)]])
            .into_connection();

        let units = SubjectService::replace_units(
            &db,
            4,
            vec![UnitInput {
                unit_number: 1,
                unit_name: "Sets and Relations".to_string(),
                max_mst_marks: 24,
                max_assignment_marks: 10,
            }],
        )
        .await
        .unwrap();
        assert_eq!(units.len(), 1);

        let sql = format!("{:?}", db.into_transaction_log());
        let marks = sql.find(r#"DELETE FROM \"student_marks\""#).unwrap();
        let removed = sql.find(r#"DELETE FROM \"units\""#).unwrap();
        let upsert = sql.find(r#"INSERT INTO \"units\""#).unwrap();
        assert!(marks < removed && removed < upsert, "{sql}");
        assert!(sql.contains(r#"ON CONFLICT (\"subject_id\", \"unit_number\") DO UPDATE"#), "{sql}");
    }

    #[tokio::test]
    async fn test_replace_units_with_empty_set_skips_insert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([
                ("id", Value::from(10)),
                ("unit_number", Value::from(1)),
            ])]])
            .append_exec_results([affected(0), affected(1)])
            .append_query_results([Vec::<units::Model>::new()])
            .into_connection();

        let units = SubjectService::replace_units(&db, 4, Vec::new()).await.unwrap();
        assert!(units.is_empty());

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(!sql.contains("INSERT INTO"), "{sql}");
    }

    #[tokio::test]
    async fn test_delete_removes_dependents_first() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<units::Model>::new()])
            .append_exec_results([affected(1), affected(0), affected(0), affected(1)])
            .into_connection();

        assert!(SubjectService::delete(&db, 4).await.unwrap());

        let sql = format!("{:?}", db.into_transaction_log());
        let order = [
            r#"DELETE FROM \"faculty_subjects\""#,
            r#"DELETE FROM \"student_marks\""#,
            r#"DELETE FROM \"units\""#,
            r#"DELETE FROM \"subjects\""#,
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| sql.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{sql}");
    }
}
