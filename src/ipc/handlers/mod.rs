pub mod admin;
pub mod auth;
pub mod core;
pub mod dashboard;
pub mod journal;
pub mod student;
pub mod teacher;
