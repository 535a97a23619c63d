//! cfgscope core - profile store, update tracking and the diff/apply engine
//!
//! Everything here that touches disk goes through [`apply`]: planners build
//! a [`apply::ChangeSet`], the engine renders it as a [`diff::DiffPreview`]
//! and writes only after an explicit commit.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::needless_pass_by_value,
    clippy::missing_panics_doc,
    clippy::doc_markdown
)]

pub mod apply;
pub mod config;
pub mod diff;
pub mod install;
pub mod paths;
pub mod profile;
pub mod project;
pub mod storage;
pub mod util;

pub use cfgscope_scanner;

pub use apply::{ApplyError, ApplyMode, ChangeSet, PendingChange};
pub use diff::DiffPreview;
pub use paths::DataPaths;
pub use profile::{Profile, ProfileError, ProfileStore};
pub use project::Project;
