//! Inline-commentary placement engine.
//!
//! Leaves first: [`segment`] splits text into sentences, [`locate`] finds
//! phrases and builds the occupancy index, [`validate`] decides each
//! candidate, [`rejections`] tracks what a retry chain has ruled out,
//! [`prompt`] renders the generator prompt, [`orchestrator`] runs the bounded
//! retry loop, [`session`] owns per-session state, and [`analyze`] ties a
//! request together.

pub mod analyze;
pub mod locate;
pub mod orchestrator;
pub mod prompt;
pub mod rejections;
pub mod segment;
pub mod session;
pub mod types;
pub mod validate;

pub use analyze::{AnalysisReport, AnalysisRequest, AnalysisStatus, Engine};
