use crate::entities::{
    departments, faculty_subjects, student_marks, students, subjects, units, users,
};
use models::{import::DepartmentDirectory, role::Role};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};
use std::collections::HashMap;

/// Fields of a department supplied on create and update
#[derive(Debug, Clone)]
pub struct DepartmentInput {
    pub name: String,
    pub code: String,
    pub hod_id: Option<i32>,
    pub nba_threshold: f64,
}

/// A department with the figures shown in the department table
#[derive(Debug, Clone)]
pub struct DepartmentSummary {
    pub department: departments::Model,
    pub hod_name: Option<String>,
    pub faculty_count: i64,
    pub student_count: i64,
}

pub struct DepartmentService;

impl DepartmentService {
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<DepartmentSummary>, DbErr> {
        let departments = departments::Entity::find()
            .order_by_asc(departments::Column::Name)
            .all(db)
            .await?;

        let hod_ids: Vec<i32> = departments.iter().filter_map(|d| d.hod_id).collect();
        let hod_names: HashMap<i32, String> = if hod_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .select_only()
                .column(users::Column::Id)
                .column(users::Column::Name)
                .filter(users::Column::Id.is_in(hod_ids))
                .into_tuple::<(i32, String)>()
                .all(db)
                .await?
                .into_iter()
                .collect()
        };

        let faculty_counts: HashMap<i32, i64> = users::Entity::find()
            .select_only()
            .column(users::Column::DepartmentId)
            .column_as(Expr::col(users::Column::Id).count(), "count")
            .filter(users::Column::Role.eq(Role::Faculty))
            .filter(users::Column::DepartmentId.is_not_null())
            .group_by(users::Column::DepartmentId)
            .into_tuple::<(i32, i64)>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        let student_counts: HashMap<i32, i64> = students::Entity::find()
            .select_only()
            .column(students::Column::DepartmentId)
            .column_as(Expr::col(students::Column::Id).count(), "count")
            .group_by(students::Column::DepartmentId)
            .into_tuple::<(i32, i64)>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        Ok(departments
            .into_iter()
            .map(|department| DepartmentSummary {
                hod_name: department
                    .hod_id
                    .and_then(|id| hod_names.get(&id).cloned()),
                faculty_count: faculty_counts.get(&department.id).copied().unwrap_or(0),
                student_count: student_counts.get(&department.id).copied().unwrap_or(0),
                department,
            })
            .collect())
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<departments::Model>, DbErr> {
        departments::Entity::find_by_id(id).one(db).await
    }

    pub async fn name_of(db: &DatabaseConnection, id: Option<i32>) -> Result<Option<String>, DbErr> {
        match id {
            Some(id) => Ok(Self::find(db, id).await?.map(|d| d.name)),
            None => Ok(None),
        }
    }

    /// Lower-cased name lookup over the whole department table
    pub async fn directory(db: &DatabaseConnection) -> Result<DepartmentDirectory, DbErr> {
        let rows = departments::Entity::find()
            .select_only()
            .column(departments::Column::Id)
            .column(departments::Column::Name)
            .into_tuple::<(i32, String)>()
            .all(db)
            .await?;

        Ok(DepartmentDirectory::new(rows))
    }

    pub async fn create(
        db: &DatabaseConnection,
        input: DepartmentInput,
    ) -> Result<departments::Model, DbErr> {
        departments::ActiveModel {
            name: Set(input.name),
            code: Set(input.code),
            hod_id: Set(input.hod_id),
            nba_threshold: Set(input.nba_threshold),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        input: DepartmentInput,
    ) -> Result<Option<departments::Model>, DbErr> {
        let Some(existing) = Self::find(db, id).await? else {
            return Ok(None);
        };

        let mut department: departments::ActiveModel = existing.into();
        department.name = Set(input.name);
        department.code = Set(input.code);
        department.hod_id = Set(input.hod_id);
        department.nba_threshold = Set(input.nba_threshold);

        department.update(db).await.map(Some)
    }

    /// Removes the department and everything hanging off it in one transaction
    ///
    /// Returns `false` when the department does not exist.
    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
        let txn = db.begin().await?;

        let subject_ids: Vec<i32> = subjects::Entity::find()
            .select_only()
            .column(subjects::Column::Id)
            .filter(subjects::Column::DepartmentId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        let student_ids: Vec<i32> = students::Entity::find()
            .select_only()
            .column(students::Column::Id)
            .filter(students::Column::DepartmentId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        let member_ids: Vec<i32> = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::DepartmentId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        let unit_ids: Vec<i32> = units::Entity::find()
            .select_only()
            .column(units::Column::Id)
            .filter(units::Column::SubjectId.is_in(subject_ids.clone()))
            .into_tuple()
            .all(&txn)
            .await?;

        student_marks::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(student_marks::Column::StudentId.is_in(student_ids))
                    .add(student_marks::Column::UnitId.is_in(unit_ids)),
            )
            .exec(&txn)
            .await?;

        faculty_subjects::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(faculty_subjects::Column::SubjectId.is_in(subject_ids.clone()))
                    .add(faculty_subjects::Column::FacultyId.is_in(member_ids)),
            )
            .exec(&txn)
            .await?;

        units::Entity::delete_many()
            .filter(units::Column::SubjectId.is_in(subject_ids))
            .exec(&txn)
            .await?;

        subjects::Entity::delete_many()
            .filter(subjects::Column::DepartmentId.eq(id))
            .exec(&txn)
            .await?;

        students::Entity::delete_many()
            .filter(students::Column::DepartmentId.eq(id))
            .exec(&txn)
            .await?;

        // Break the hod_id <-> department_id cycle before removing members
        departments::Entity::update_many()
            .col_expr(departments::Column::HodId, Expr::value(Option::<i32>::None))
            .filter(departments::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        users::Entity::delete_many()
            .filter(users::Column::DepartmentId.eq(id))
            .exec(&txn)
            .await?;

        let result = departments::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
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

    #[tokio::test]
    async fn test_update_missing_department_returns_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<departments::Model>::new()])
            .into_connection();

        let input = DepartmentInput {
            name: "Civil".to_string(),
            code: "CE".to_string(),
            hod_id: None,
            nba_threshold: 50.0,
        };

        assert!(DepartmentService::update(&db, 9, input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_children_before_parent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<subjects::Model>::new()])
            .append_query_results([Vec::<students::Model>::new()])
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([Vec::<units::Model>::new()])
            .append_exec_results([
                affected(0),
                affected(0),
                affected(0),
                affected(0),
                affected(0),
                affected(1),
                affected(0),
                affected(1),
            ])
            .into_connection();

        assert!(DepartmentService::delete(&db, 1).await.unwrap());

        let log = db.into_transaction_log();
        let sql = format!("{log:?}");
        let order = [
            r#"DELETE FROM \"student_marks\""#,
            r#"DELETE FROM \"faculty_subjects\""#,
            r#"DELETE FROM \"units\""#,
            r#"DELETE FROM \"subjects\""#,
            r#"DELETE FROM \"students\""#,
            r#"UPDATE \"departments\""#,
            r#"DELETE FROM \"users\""#,
            r#"DELETE FROM \"departments\""#,
        ];

        let positions: Vec<usize> = order
            .iter()
            .map(|needle| sql.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{sql}");
    }

    #[tokio::test]
    async fn test_directory_resolves_names() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([
                ("id", Value::from(1)),
                ("name", Value::from("Computer Science Engineering")),
            ])]])
            .into_connection();

        let directory = DepartmentService::directory(&db).await.unwrap();
        assert_eq!(directory.resolve("computer science engineering"), Some(1));
    }
}
