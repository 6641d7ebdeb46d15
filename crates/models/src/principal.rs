use crate::role::Role;
use serde::{Deserialize, Serialize};

/// The authenticated caller of a single request
///
/// Built from the verified session token and passed explicitly to every
/// handler and service that needs to scope data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i32,
    pub role: Role,
    /// `None` for administrators
    pub department_id: Option<i32>,
}

impl Principal {
    pub fn new(user_id: i32, role: Role, department_id: Option<i32>) -> Self {
        Self {
            user_id,
            role,
            department_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_hod(&self) -> bool {
        self.role == Role::Hod
    }

    pub fn is_faculty(&self) -> bool {
        self.role == Role::Faculty
    }

    /// Admins and HODs manage records; faculty only read and enter marks
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hod)
    }

    /// Whether the caller may write records belonging to `department_id`
    pub fn owns_department(&self, department_id: i32) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Hod | Role::Faculty => self.department_id == Some(department_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_owns_every_department() {
        let admin = Principal::new(1, Role::Admin, None);
        assert!(admin.owns_department(1));
        assert!(admin.owns_department(42));
        assert!(admin.is_staff());
    }

    #[test]
    fn test_hod_owns_only_own_department() {
        let hod = Principal::new(2, Role::Hod, Some(3));
        assert!(hod.owns_department(3));
        assert!(!hod.owns_department(4));
        assert!(hod.is_staff());
    }

    #[test]
    fn test_hod_without_department_owns_nothing() {
        let hod = Principal::new(2, Role::Hod, None);
        assert!(!hod.owns_department(3));
    }

    #[test]
    fn test_faculty_is_not_staff() {
        let faculty = Principal::new(9, Role::Faculty, Some(3));
        assert!(!faculty.is_staff());
        assert!(faculty.is_faculty());
    }
}
