//! Performance summaries computed from stored unit marks.
//!
//! A student's performance is the sum of their obtained marks over the sum of
//! the attainable marks of every component that has been entered. A student
//! meets the NBA threshold when that percentage reaches their department's
//! `nba_threshold`.

use crate::marks::{percentage, round1};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Threshold used when a department has none on record
pub const DEFAULT_NBA_THRESHOLD: f64 = 52.0;

/// One stored mark row, flattened with what is needed to aggregate it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkSample {
    pub student_id: i32,
    pub department_id: i32,
    pub semester: i32,
    pub obtained: f64,
    pub attainable: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentInfo {
    pub name: String,
    pub nba_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPerformance {
    pub department_id: i32,
    pub name: String,
    pub students: usize,
    pub avg_marks: f64,
    pub nba_compliance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterPerformance {
    pub semester: String,
    pub pass: f64,
    pub fail: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub overall_performance: f64,
    pub nba_compliance: f64,
    pub at_risk_students: usize,
    pub students_evaluated: usize,
    pub department_performance: Vec<DepartmentPerformance>,
    pub semester_wise_performance: Vec<SemesterPerformance>,
}

#[derive(Default)]
struct StudentTotals {
    department_id: i32,
    semester: i32,
    obtained: f64,
    attainable: f64,
}

struct StudentResult {
    department_id: i32,
    semester: i32,
    percentage: f64,
    passed: bool,
}

#[derive(Default)]
struct Tally {
    students: usize,
    passed: usize,
    percentage_sum: f64,
}

impl Tally {
    fn add(&mut self, result: &StudentResult) {
        self.students += 1;
        self.percentage_sum += result.percentage;
        if result.passed {
            self.passed += 1;
        }
    }

    fn average(&self) -> f64 {
        if self.students == 0 {
            0.0
        } else {
            round1(self.percentage_sum / self.students as f64)
        }
    }

    fn pass_rate(&self) -> f64 {
        percentage(self.passed as f64, self.students as f64)
            .map(round1)
            .unwrap_or(0.0)
    }
}

/// Aggregates mark samples into the analytics summary
pub fn summarize(
    samples: &[MarkSample],
    departments: &HashMap<i32, DepartmentInfo>,
) -> AnalyticsSummary {
    let mut totals: HashMap<i32, StudentTotals> = HashMap::new();
    for sample in samples {
        let entry = totals.entry(sample.student_id).or_default();
        entry.department_id = sample.department_id;
        entry.semester = sample.semester;
        entry.obtained += sample.obtained;
        entry.attainable += sample.attainable;
    }

    let results: Vec<StudentResult> = totals
        .into_values()
        .filter_map(|t| {
            let pct = percentage(t.obtained, t.attainable)?;
            let threshold = departments
                .get(&t.department_id)
                .map(|d| d.nba_threshold)
                .unwrap_or(DEFAULT_NBA_THRESHOLD);

            Some(StudentResult {
                department_id: t.department_id,
                semester: t.semester,
                percentage: pct,
                passed: pct >= threshold,
            })
        })
        .collect();

    let mut overall = Tally::default();
    let mut by_department: BTreeMap<i32, Tally> = BTreeMap::new();
    let mut by_semester: BTreeMap<i32, Tally> = BTreeMap::new();

    for result in &results {
        overall.add(result);
        by_department
            .entry(result.department_id)
            .or_default()
            .add(result);
        by_semester.entry(result.semester).or_default().add(result);
    }

    let department_performance = by_department
        .into_iter()
        .map(|(department_id, tally)| DepartmentPerformance {
            department_id,
            name: departments
                .get(&department_id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| format!("Department {department_id}")),
            students: tally.students,
            avg_marks: tally.average(),
            nba_compliance: tally.pass_rate(),
        })
        .collect();

    let semester_wise_performance = by_semester
        .into_iter()
        .map(|(semester, tally)| {
            let pass = tally.pass_rate();
            SemesterPerformance {
                semester: format!("Sem {semester}"),
                pass,
                fail: if tally.students == 0 {
                    0.0
                } else {
                    round1(100.0 - pass)
                },
            }
        })
        .collect();

    AnalyticsSummary {
        overall_performance: overall.average(),
        nba_compliance: overall.pass_rate(),
        at_risk_students: overall.students - overall.passed,
        students_evaluated: overall.students,
        department_performance,
        semester_wise_performance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(student_id: i32, department_id: i32, obtained: f64, attainable: f64) -> MarkSample {
        MarkSample {
            student_id,
            department_id,
            semester: 3,
            obtained,
            attainable,
        }
    }

    fn departments() -> HashMap<i32, DepartmentInfo> {
        HashMap::from([
            (
                1,
                DepartmentInfo {
                    name: "CSE".to_string(),
                    nba_threshold: 60.0,
                },
            ),
            (
                2,
                DepartmentInfo {
                    name: "ECE".to_string(),
                    nba_threshold: 40.0,
                },
            ),
        ])
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize(&[], &departments());
        assert_eq!(summary.overall_performance, 0.0);
        assert_eq!(summary.nba_compliance, 0.0);
        assert_eq!(summary.at_risk_students, 0);
        assert!(summary.department_performance.is_empty());
    }

    #[test]
    fn test_student_marks_are_summed_across_units() {
        // Student 1: 27/30 + 9/30 = 60% -> meets CSE's 60 threshold
        // Student 2: 15/30 = 50% -> below CSE threshold
        // Student 3: 15/30 = 50% -> meets ECE's 40 threshold
        let samples = [
            sample(1, 1, 27.0, 30.0),
            sample(1, 1, 9.0, 30.0),
            sample(2, 1, 15.0, 30.0),
            sample(3, 2, 15.0, 30.0),
        ];

        let summary = summarize(&samples, &departments());
        assert_eq!(summary.students_evaluated, 3);
        assert_eq!(summary.at_risk_students, 1);
        assert_eq!(summary.overall_performance, 53.3);
        assert_eq!(summary.nba_compliance, 66.7);

        let cse = &summary.department_performance[0];
        assert_eq!(cse.name, "CSE");
        assert_eq!(cse.students, 2);
        assert_eq!(cse.avg_marks, 55.0);
        assert_eq!(cse.nba_compliance, 50.0);

        let sem = &summary.semester_wise_performance[0];
        assert_eq!(sem.semester, "Sem 3");
        assert_eq!(sem.pass, 66.7);
        assert_eq!(sem.fail, 33.3);
    }

    #[test]
    fn test_unknown_department_uses_default_threshold() {
        let summary = summarize(&[sample(7, 99, 26.0, 50.0)], &HashMap::new());
        assert_eq!(summary.at_risk_students, 0);
        assert_eq!(summary.department_performance[0].name, "Department 99");
    }

    #[test]
    fn test_samples_without_attainable_marks_are_ignored() {
        let summary = summarize(&[sample(1, 1, 0.0, 0.0)], &departments());
        assert_eq!(summary.students_evaluated, 0);
    }
}
