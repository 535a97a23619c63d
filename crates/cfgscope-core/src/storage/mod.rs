//! Storage layer (`SQLite`)

pub mod db;
pub mod migrations;
pub mod profiles;
pub mod projects;

pub use db::{Database, DatabaseError};
pub use profiles::{ProfileSummary, ProfileTable};
pub use projects::{ProjectStore, ProjectSummary};
