pub mod attendance;
pub mod auth;
pub mod core;
pub mod gate;
pub mod grades;
pub mod records;
pub mod reports;
pub mod rules;
pub mod stimulus;
pub mod students;
pub mod teachers;
pub mod users;
