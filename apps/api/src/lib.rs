//! EasyApply backend: account and resume endpoints gated by authorization
//! predicates, plus the task-queue bootstrap shared with background workers.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod permissions;
pub mod resumes;
pub mod routes;
pub mod state;
pub mod users;
pub mod validation;
pub mod worker;
