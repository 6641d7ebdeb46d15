//! Row visibility derived from the caller's role.
//!
//! Each resource query asks the caller's [`Scope`] for a predicate and adds it
//! to its own filters, so the role rules live in one place and render to
//! parameterized SQL.

use crate::entities::{faculty_subjects, students, subjects, units, users};
use models::{principal::Principal, role::Role};
use sea_orm::{
    ColumnTrait, Condition,
    sea_query::{Expr, Query, SelectStatement},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Administrators see every row
    All,
    /// An HOD sees their own department
    Department(i32),
    /// Faculty see the subjects they are assigned and their department's students
    Faculty {
        faculty_id: i32,
        department_id: Option<i32>,
    },
    /// A department-bound account without a department sees nothing
    Nothing,
}

impl Scope {
    pub fn for_principal(principal: &Principal) -> Self {
        match (principal.role, principal.department_id) {
            (Role::Admin, _) => Self::All,
            (Role::Hod, Some(department_id)) => Self::Department(department_id),
            (Role::Hod, None) => Self::Nothing,
            (Role::Faculty, department_id) => Self::Faculty {
                faculty_id: principal.user_id,
                department_id,
            },
        }
    }

    fn department(&self) -> Option<i32> {
        match self {
            Self::Department(id) => Some(*id),
            Self::Faculty { department_id, .. } => *department_id,
            Self::All | Self::Nothing => None,
        }
    }

    /// Students the caller may list
    pub fn students(&self) -> Condition {
        match self {
            Self::All => Condition::all(),
            _ => match self.department() {
                Some(id) => Condition::all().add(students::Column::DepartmentId.eq(id)),
                None => nothing(),
            },
        }
    }

    /// Subjects the caller may list
    pub fn subjects(&self) -> Condition {
        match self {
            Self::All => Condition::all(),
            Self::Department(id) => Condition::all().add(subjects::Column::DepartmentId.eq(*id)),
            Self::Faculty { faculty_id, .. } => {
                Condition::all().add(subjects::Column::Id.in_subquery(assigned_subjects(*faculty_id)))
            }
            Self::Nothing => nothing(),
        }
    }

    /// Faculty accounts the caller may list
    pub fn faculty(&self) -> Condition {
        let condition = Condition::all().add(users::Column::Role.eq(Role::Faculty));

        match self {
            Self::All => condition,
            _ => match self.department() {
                Some(id) => condition.add(users::Column::DepartmentId.eq(id)),
                None => nothing(),
            },
        }
    }

    /// Units the caller may enter marks for
    pub fn units(&self) -> Condition {
        match self {
            Self::All => Condition::all(),
            Self::Department(id) => Condition::all()
                .add(units::Column::SubjectId.in_subquery(department_assignments(*id))),
            Self::Faculty { faculty_id, .. } => Condition::all()
                .add(units::Column::SubjectId.in_subquery(assigned_subjects(*faculty_id))),
            Self::Nothing => nothing(),
        }
    }
}

fn nothing() -> Condition {
    Condition::all().add(Expr::cust("FALSE"))
}

/// `SELECT subject_id FROM faculty_subjects WHERE faculty_id = ?`
fn assigned_subjects(faculty_id: i32) -> SelectStatement {
    Query::select()
        .column(faculty_subjects::Column::SubjectId)
        .from(faculty_subjects::Entity)
        .and_where(faculty_subjects::Column::FacultyId.eq(faculty_id))
        .to_owned()
}

/// Subjects assigned to any faculty member of the department
fn department_assignments(department_id: i32) -> SelectStatement {
    let members = Query::select()
        .column(users::Column::Id)
        .from(users::Entity)
        .and_where(users::Column::DepartmentId.eq(department_id))
        .to_owned();

    Query::select()
        .column(faculty_subjects::Column::SubjectId)
        .from(faculty_subjects::Entity)
        .and_where(faculty_subjects::Column::FacultyId.in_subquery(members))
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn sql<E: EntityTrait>(condition: Condition) -> String {
        E::find()
            .filter(condition)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_scope_for_principal() {
        assert_eq!(
            Scope::for_principal(&Principal::new(1, Role::Admin, None)),
            Scope::All
        );
        assert_eq!(
            Scope::for_principal(&Principal::new(2, Role::Hod, Some(4))),
            Scope::Department(4)
        );
        assert_eq!(
            Scope::for_principal(&Principal::new(2, Role::Hod, None)),
            Scope::Nothing
        );
        assert_eq!(
            Scope::for_principal(&Principal::new(7, Role::Faculty, Some(4))),
            Scope::Faculty {
                faculty_id: 7,
                department_id: Some(4)
            }
        );
    }

    #[test]
    fn test_admin_students_are_unfiltered() {
        let query = sql::<students::Entity>(Scope::All.students());
        assert!(!query.contains("WHERE"), "{query}");
    }

    #[test]
    fn test_hod_and_faculty_students_are_department_bound() {
        let hod = sql::<students::Entity>(Scope::Department(3).students());
        assert!(hod.contains(r#"WHERE "students"."department_id" = 3"#), "{hod}");

        let faculty = sql::<students::Entity>(
            Scope::Faculty {
                faculty_id: 9,
                department_id: Some(3),
            }
            .students(),
        );
        assert!(
            faculty.contains(r#"WHERE "students"."department_id" = 3"#),
            "{faculty}"
        );
    }

    #[test]
    fn test_department_less_scopes_match_nothing() {
        let query = sql::<students::Entity>(Scope::Nothing.students());
        assert!(query.contains("WHERE FALSE"), "{query}");

        let orphan = Scope::Faculty {
            faculty_id: 9,
            department_id: None,
        };
        let query = sql::<students::Entity>(orphan.students());
        assert!(query.contains("WHERE FALSE"), "{query}");
    }

    #[test]
    fn test_faculty_subjects_come_from_assignments() {
        let query = sql::<subjects::Entity>(
            Scope::Faculty {
                faculty_id: 9,
                department_id: Some(3),
            }
            .subjects(),
        );
        assert!(
            query.contains(
                r#""subjects"."id" IN (SELECT "subject_id" FROM "faculty_subjects" WHERE "faculty_subjects"."faculty_id" = 9)"#
            ),
            "{query}"
        );
    }

    #[test]
    fn test_hod_subjects_are_department_bound() {
        let query = sql::<subjects::Entity>(Scope::Department(5).subjects());
        assert!(query.contains(r#""subjects"."department_id" = 5"#), "{query}");
    }

    #[test]
    fn test_faculty_listing_always_filters_role() {
        let admin = sql::<users::Entity>(Scope::All.faculty());
        assert!(admin.contains(r#""users"."role" = 'faculty'"#), "{admin}");
        assert!(!admin.contains("department_id\" ="), "{admin}");

        let hod = sql::<users::Entity>(Scope::Department(2).faculty());
        assert!(hod.contains(r#""users"."role" = 'faculty'"#), "{hod}");
        assert!(hod.contains(r#""users"."department_id" = 2"#), "{hod}");
    }

    #[test]
    fn test_hod_units_go_through_department_assignments() {
        let query = sql::<units::Entity>(Scope::Department(2).units());
        assert!(
            query.contains(r#""units"."subject_id" IN (SELECT "subject_id" FROM "faculty_subjects""#),
            "{query}"
        );
        assert!(
            query.contains(r#""faculty_subjects"."faculty_id" IN (SELECT "id" FROM "users" WHERE "users"."department_id" = 2)"#),
            "{query}"
        );
    }

    #[test]
    fn test_faculty_units_go_through_own_assignments() {
        let query = sql::<units::Entity>(
            Scope::Faculty {
                faculty_id: 11,
                department_id: Some(2),
            }
            .units(),
        );
        assert!(
            query.contains(r#""faculty_subjects"."faculty_id" = 11"#),
            "{query}"
        );
        assert!(!query.contains(r#""users""#), "{query}");
    }
}
