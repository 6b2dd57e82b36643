pub mod core;
pub mod dashboard;
pub mod groups;
pub mod teachers;
