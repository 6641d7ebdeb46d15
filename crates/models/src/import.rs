use serde::Deserialize;
use std::collections::HashMap;

/// Lowest and highest semester a student can be enrolled in
pub const SEMESTERS: std::ops::RangeInclusive<i32> = 1..=8;

/// One row of a student spreadsheet import, already parsed by the client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentImportRow {
    #[serde(default)]
    pub roll_number: String,
    #[serde(default)]
    pub name: String,
    /// Department name as typed in the sheet, matched case-insensitively
    #[serde(default)]
    pub department: String,
    pub semester: i32,
    #[serde(default = "default_section")]
    pub section: String,
    pub batch_year: i32,
}

fn default_section() -> String {
    "A".to_string()
}

impl StudentImportRow {
    /// Returns every problem with the row's own fields
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();

        if self.roll_number.trim().is_empty() {
            problems.push("Roll Number is required");
        }
        if self.name.trim().is_empty() {
            problems.push("Name is required");
        }
        if self.department.trim().is_empty() {
            problems.push("Department is required");
        }
        if !SEMESTERS.contains(&self.semester) {
            problems.push("Invalid semester");
        }
        if self.batch_year <= 0 {
            problems.push("Invalid batch year");
        }

        problems
    }

    /// The row label used in error messages
    pub fn label(&self) -> &str {
        if self.roll_number.trim().is_empty() {
            "<missing roll number>"
        } else {
            self.roll_number.trim()
        }
    }
}

/// Case-insensitive department name lookup, built once per import request
#[derive(Debug, Clone, Default)]
pub struct DepartmentDirectory {
    by_name: HashMap<String, i32>,
}

impl DepartmentDirectory {
    pub fn new<I, S>(departments: I) -> Self
    where
        I: IntoIterator<Item = (i32, S)>,
        S: AsRef<str>,
    {
        let by_name = departments
            .into_iter()
            .map(|(id, name)| (normalize(name.as_ref()), id))
            .collect();

        Self { by_name }
    }

    pub fn resolve(&self, name: &str) -> Option<i32> {
        self.by_name.get(&normalize(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> StudentImportRow {
        StudentImportRow {
            roll_number: "CSE2021001".to_string(),
            name: "John Doe".to_string(),
            department: "Computer Science Engineering".to_string(),
            semester: 3,
            section: "A".to_string(),
            batch_year: 2021,
        }
    }

    #[test]
    fn test_valid_row_has_no_problems() {
        assert!(row().problems().is_empty());
    }

    #[test]
    fn test_problems_are_collected() {
        let mut bad = row();
        bad.name = "  ".to_string();
        bad.semester = 9;

        assert_eq!(bad.problems(), vec!["Name is required", "Invalid semester"]);
    }

    #[test]
    fn test_section_defaults_to_a() {
        let row: StudentImportRow = serde_json::from_value(serde_json::json!({
            "roll_number": "ECE1",
            "name": "Jane",
            "department": "ECE",
            "semester": 1,
            "batch_year": 2024
        }))
        .unwrap();

        assert_eq!(row.section, "A");
    }

    #[test]
    fn test_null_fields_fail_only_their_row() {
        let rows = crate::batch::parse_rows::<StudentImportRow>(vec![
            serde_json::json!({
                "roll_number": "CSE1",
                "name": "Asha",
                "department": "CSE",
                "semester": 3,
                "batch_year": 2022
            }),
            serde_json::json!({
                "roll_number": "CSE2",
                "name": "Ravi",
                "department": "CSE",
                "semester": null,
                "batch_year": 2022
            }),
            serde_json::json!({
                "roll_number": "CSE3",
                "name": "Meera",
                "department": null,
                "semester": 3,
                "batch_year": 2022
            }),
        ]);

        assert_eq!(rows[0].as_ref().map(|row| row.label()), Ok("CSE1"));
        assert_eq!(rows[1].as_ref().unwrap_err().position, 2);
        assert_eq!(rows[2].as_ref().unwrap_err().position, 3);
    }

    #[test]
    fn test_directory_is_case_insensitive() {
        let directory = DepartmentDirectory::new([
            (1, "Computer Science Engineering"),
            (2, "Electronics"),
        ]);

        assert_eq!(directory.resolve("computer science engineering"), Some(1));
        assert_eq!(directory.resolve(" ELECTRONICS "), Some(2));
        assert_eq!(directory.resolve("Civil"), None);
        assert_eq!(directory.len(), 2);
    }
}
