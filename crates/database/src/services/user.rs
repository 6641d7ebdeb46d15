use crate::entities::{departments, faculty_subjects, users};
use models::role::Role;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};

/// Fields of an account supplied on create
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department_id: Option<i32>,
}

/// Fields of an account supplied on update
///
/// The password is only replaced when a new hash is given.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department_id: Option<i32>,
    pub password_hash: Option<String>,
}

pub struct UserService;

impl UserService {
    pub async fn find(db: &DatabaseConnection, id: i32) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await
    }

    /// All accounts, newest first, optionally restricted to one role
    pub async fn list(
        db: &DatabaseConnection,
        role: Option<Role>,
    ) -> Result<Vec<(users::Model, Option<departments::Model>)>, DbErr> {
        let mut query = users::Entity::find();

        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role));
        }

        query
            .find_also_related(departments::Entity)
            .order_by_desc(users::Column::CreatedAt)
            .all(db)
            .await
    }

    pub async fn create(db: &DatabaseConnection, user: NewUser) -> Result<users::Model, DbErr> {
        users::ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role),
            department_id: Set(user.department_id),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        changes: UserChanges,
    ) -> Result<Option<users::Model>, DbErr> {
        let Some(existing) = Self::find(db, id).await? else {
            return Ok(None);
        };

        Self::apply(db, existing, changes).await.map(Some)
    }

    pub(crate) async fn apply(
        db: &DatabaseConnection,
        existing: users::Model,
        changes: UserChanges,
    ) -> Result<users::Model, DbErr> {
        let mut user: users::ActiveModel = existing.into();
        user.name = Set(changes.name);
        user.email = Set(changes.email);
        user.role = Set(changes.role);
        user.department_id = Set(changes.department_id);

        if let Some(hash) = changes.password_hash {
            user.password_hash = Set(hash);
        }

        user.update(db).await
    }

    /// Deletes the account after its subject assignments
    ///
    /// Marks it entered and departments it heads keep their rows; the
    /// references are cleared by the schema.
    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
        let txn = db.begin().await?;

        faculty_subjects::Entity::delete_many()
            .filter(faculty_subjects::Column::FacultyId.eq(id))
            .exec(&txn)
            .await?;

        let result = users::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn admin_exists(db: &DatabaseConnection) -> Result<bool, DbErr> {
        let admins = users::Entity::find()
            .filter(users::Column::Role.eq(Role::Admin))
            .count(db)
            .await?;

        Ok(admins > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn admin() -> users::Model {
        users::Model {
            id: 1,
            name: "Admin".to_string(),
            email: "admin@college.edu".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
            department_id: None,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    #[tokio::test]
    async fn test_update_keeps_password_when_not_supplied() {
        let mut updated = admin();
        updated.name = "Root".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin()], vec![updated.clone()]])
            .into_connection();

        let changes = UserChanges {
            name: "Root".to_string(),
            email: "admin@college.edu".to_string(),
            role: Role::Admin,
            department_id: None,
            password_hash: None,
        };

        let user = UserService::update(&db, 1, changes).await.unwrap().unwrap();
        assert_eq!(user.name, "Root");

        let log = format!("{:?}", db.into_transaction_log());
        assert!(!log.contains("password_hash\" ="), "{log}");
    }

    #[tokio::test]
    async fn test_delete_removes_assignments_first() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        assert!(UserService::delete(&db, 4).await.unwrap());

        let log = format!("{:?}", db.into_transaction_log());
        let assignments = log.find(r#"DELETE FROM \"faculty_subjects\""#).unwrap();
        let user = log.find(r#"DELETE FROM \"users\""#).unwrap();
        assert!(assignments < user);
    }
}
