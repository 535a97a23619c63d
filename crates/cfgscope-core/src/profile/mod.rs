//! Profiles: portable bundles of captured tools
//!
//! [`ProfileStore`] owns every profile. The submodules are usable on their
//! own: [`capture`] copies scanned tools into storage, [`updates`] reports
//! drift of tracked tools and [`availability`] resolves a project's tools
//! against an inventory.

pub mod availability;
pub mod capture;
pub mod discovery;
mod error;
pub mod storage;
mod store;
mod types;
pub mod updates;

pub use availability::{check_availability, project_tools, Availability, ProjectTool, ToolOrigin};
pub use discovery::discover_projects;
pub use error::ProfileError;
pub use storage::{ProfileFiles, ProfileTools, StorageError};
pub use store::{
    CaptureFailure, CaptureReport, ProfileSource, ProfileStore, PullOutcome, ToolSource, ToolSpec,
};
pub use types::*;
pub use updates::{check_profile_updates, ToolUpdateInfo, UpdateCheck};
