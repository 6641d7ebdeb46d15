use crate::{
    entities::{departments, faculty_subjects, student_marks, students, subjects, units, users},
    scope::Scope,
};
use models::{
    analytics::{DEFAULT_NBA_THRESHOLD, DepartmentInfo, MarkSample},
    marks::{percentage, round1},
    role::Role,
};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QuerySelect, RelationTrait,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStats {
    pub departments: u64,
    pub faculty: u64,
    pub students: u64,
    pub subjects: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HodStats {
    pub department_faculty: u64,
    pub department_students: u64,
    pub department_subjects: u64,
    pub nba_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacultyStats {
    pub assigned_subjects: u64,
    pub total_students: u64,
    pub marks_progress: f64,
}

/// The students a faculty member teaches in one subject
#[derive(Debug, Clone, PartialEq, Eq)]
struct Class {
    department_id: i32,
    semester: i32,
    sections: HashSet<String>,
    units: HashSet<i32>,
}

impl Class {
    fn contains(&self, department_id: i32, semester: i32, section: &str) -> bool {
        self.department_id == department_id
            && self.semester == semester
            && self.sections.contains(section)
    }
}

/// `(id, department_id, semester, section)` of a student
type StudentKey = (i32, i32, i32, String);

/// Entered over expected unit marks across the classes, as a percentage
fn marks_progress(classes: &[Class], students: &[StudentKey], entered: &HashSet<(i32, i32)>) -> f64 {
    let mut expected = 0usize;
    let mut done = 0usize;

    for class in classes {
        for (student_id, department_id, semester, section) in students {
            if !class.contains(*department_id, *semester, section) {
                continue;
            }
            expected += class.units.len();
            done += class
                .units
                .iter()
                .filter(|unit_id| entered.contains(&(*student_id, **unit_id)))
                .count();
        }
    }

    percentage(done as f64, expected as f64)
        .map(round1)
        .unwrap_or(0.0)
}

pub struct StatsService;

impl StatsService {
    pub async fn admin(db: &DatabaseConnection) -> Result<AdminStats, DbErr> {
        Ok(AdminStats {
            departments: departments::Entity::find().count(db).await?,
            faculty: users::Entity::find()
                .filter(users::Column::Role.eq(Role::Faculty))
                .count(db)
                .await?,
            students: students::Entity::find().count(db).await?,
            subjects: subjects::Entity::find().count(db).await?,
        })
    }

    pub async fn hod(db: &DatabaseConnection, scope: &Scope) -> Result<HodStats, DbErr> {
        let nba_threshold = match scope {
            Scope::Department(id) => departments::Entity::find_by_id(*id)
                .one(db)
                .await?
                .map(|d| d.nba_threshold),
            _ => None,
        };

        Ok(HodStats {
            department_faculty: users::Entity::find()
                .filter(scope.faculty())
                .count(db)
                .await?,
            department_students: students::Entity::find()
                .filter(scope.students())
                .count(db)
                .await?,
            department_subjects: subjects::Entity::find()
                .filter(scope.subjects())
                .count(db)
                .await?,
            nba_threshold: nba_threshold.unwrap_or(DEFAULT_NBA_THRESHOLD),
        })
    }

    pub async fn faculty(db: &DatabaseConnection, faculty_id: i32) -> Result<FacultyStats, DbErr> {
        let assignments = faculty_subjects::Entity::find()
            .filter(faculty_subjects::Column::FacultyId.eq(faculty_id))
            .find_also_related(subjects::Entity)
            .all(db)
            .await?;

        let assigned_subjects = assignments.len() as u64;

        // One class per subject, sections merged across batches
        let mut by_subject: HashMap<i32, Class> = HashMap::new();
        for (assignment, subject) in assignments {
            let Some(subject) = subject else { continue };
            by_subject
                .entry(subject.id)
                .or_insert_with(|| Class {
                    department_id: subject.department_id,
                    semester: subject.semester,
                    sections: HashSet::new(),
                    units: HashSet::new(),
                })
                .sections
                .extend(assignment.sections);
        }

        if by_subject.is_empty() {
            return Ok(FacultyStats {
                assigned_subjects,
                total_students: 0,
                marks_progress: 0.0,
            });
        }

        let unit_rows: Vec<(i32, i32)> = units::Entity::find()
            .select_only()
            .column(units::Column::Id)
            .column(units::Column::SubjectId)
            .filter(units::Column::SubjectId.is_in(by_subject.keys().copied()))
            .into_tuple()
            .all(db)
            .await?;
        for (unit_id, subject_id) in unit_rows {
            if let Some(class) = by_subject.get_mut(&subject_id) {
                class.units.insert(unit_id);
            }
        }

        let classes: Vec<Class> = by_subject.into_values().collect();

        let taught = classes.iter().fold(Condition::any(), |any, class| {
            any.add(
                Condition::all()
                    .add(students::Column::DepartmentId.eq(class.department_id))
                    .add(students::Column::Semester.eq(class.semester))
                    .add(students::Column::Section.is_in(class.sections.iter().cloned())),
            )
        });

        let students: Vec<StudentKey> = students::Entity::find()
            .select_only()
            .column(students::Column::Id)
            .column(students::Column::DepartmentId)
            .column(students::Column::Semester)
            .column(students::Column::Section)
            .filter(taught)
            .into_tuple()
            .all(db)
            .await?;

        let unit_ids: Vec<i32> = classes.iter().flat_map(|c| c.units.iter().copied()).collect();
        let entered: HashSet<(i32, i32)> = if unit_ids.is_empty() || students.is_empty() {
            HashSet::new()
        } else {
            student_marks::Entity::find()
                .select_only()
                .column(student_marks::Column::StudentId)
                .column(student_marks::Column::UnitId)
                .filter(student_marks::Column::UnitId.is_in(unit_ids))
                .filter(
                    Condition::any()
                        .add(student_marks::Column::MstMarks.is_not_null())
                        .add(student_marks::Column::AssignmentMarks.is_not_null()),
                )
                .into_tuple()
                .all(db)
                .await?
                .into_iter()
                .collect()
        };

        Ok(FacultyStats {
            assigned_subjects,
            total_students: students.len() as u64,
            marks_progress: marks_progress(&classes, &students, &entered),
        })
    }

    /// Stored marks visible to the caller, flattened for aggregation
    pub async fn mark_samples(
        db: &DatabaseConnection,
        scope: &Scope,
        department_id: Option<i32>,
        semester: Option<i32>,
    ) -> Result<Vec<MarkSample>, DbErr> {
        let mut query = student_marks::Entity::find()
            .select_only()
            .column(student_marks::Column::StudentId)
            .column(students::Column::DepartmentId)
            .column(students::Column::Semester)
            .column(student_marks::Column::MstMarks)
            .column(student_marks::Column::AssignmentMarks)
            .column(units::Column::MaxMstMarks)
            .column(units::Column::MaxAssignmentMarks)
            .join(JoinType::InnerJoin, student_marks::Relation::Student.def())
            .join(JoinType::InnerJoin, student_marks::Relation::Unit.def())
            .filter(scope.students());

        if let Some(department_id) = department_id {
            query = query.filter(students::Column::DepartmentId.eq(department_id));
        }
        if let Some(semester) = semester {
            query = query.filter(students::Column::Semester.eq(semester));
        }

        let rows: Vec<(i32, i32, i32, Option<f64>, Option<f64>, i32, i32)> =
            query.into_tuple().all(db).await?;

        Ok(rows
            .into_iter()
            .map(
                |(student_id, department_id, semester, mst, assignment, max_mst, max_assignment)| {
                    let attainable = mst.map_or(0.0, |_| f64::from(max_mst))
                        + assignment.map_or(0.0, |_| f64::from(max_assignment));

                    MarkSample {
                        student_id,
                        department_id,
                        semester,
                        obtained: mst.unwrap_or(0.0) + assignment.unwrap_or(0.0),
                        attainable,
                    }
                },
            )
            .collect())
    }

    pub async fn department_info(
        db: &DatabaseConnection,
    ) -> Result<HashMap<i32, DepartmentInfo>, DbErr> {
        Ok(departments::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|d| {
                (
                    d.id,
                    DepartmentInfo {
                        name: d.name,
                        nba_threshold: d.nba_threshold,
                    },
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn class(sections: &[&str], units: &[i32]) -> Class {
        Class {
            department_id: 1,
            semester: 3,
            sections: sections.iter().map(|s| s.to_string()).collect(),
            units: units.iter().copied().collect(),
        }
    }

    fn student(id: i32, section: &str) -> StudentKey {
        (id, 1, 3, section.to_string())
    }

    #[test]
    fn test_marks_progress_counts_only_taught_sections() {
        let classes = [class(&["A"], &[10, 11])];
        let students = [student(1, "A"), student(2, "A"), student(3, "B")];
        let entered = HashSet::from([(1, 10), (1, 11), (2, 10), (3, 10)]);

        assert_eq!(marks_progress(&classes, &students, &entered), 75.0);
    }

    #[test]
    fn test_marks_progress_is_zero_when_nothing_expected() {
        let classes = [class(&["A"], &[])];
        let students = [student(1, "A")];

        assert_eq!(marks_progress(&classes, &students, &HashSet::new()), 0.0);
    }

    #[tokio::test]
    async fn test_hod_stats_fall_back_to_default_threshold() {
        let count = |n: i64| vec![BTreeMap::from([("num_items", Value::from(n))])];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<departments::Model>::new()])
            .append_query_results([count(4)])
            .append_query_results([count(120)])
            .append_query_results([count(9)])
            .into_connection();

        let stats = StatsService::hod(&db, &Scope::Department(2)).await.unwrap();
        assert_eq!(stats.department_faculty, 4);
        assert_eq!(stats.department_students, 120);
        assert_eq!(stats.department_subjects, 9);
        assert_eq!(stats.nba_threshold, DEFAULT_NBA_THRESHOLD);
    }

    #[tokio::test]
    async fn test_faculty_without_assignments_has_no_progress() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<faculty_subjects::Model>::new()])
            .into_connection();

        let stats = StatsService::faculty(&db, 7).await.unwrap();
        assert_eq!(stats.assigned_subjects, 0);
        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.marks_progress, 0.0);
    }
}
