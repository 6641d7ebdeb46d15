pub mod departments;
pub mod faculty_subjects;
pub mod student_marks;
pub mod students;
pub mod subjects;
pub mod units;
pub mod users;
