//! Closed job registry.
//!
//! Every valid job name is statically known; an assignment naming anything
//! else is a configuration error, never a silently skipped job.

use buildcheck_types::JobAssignment;

use crate::error::{EngineError, EngineResult};
use crate::job::BoundJob;

/// The closed set of job implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Connectivity probe writing a single marker record.
    Dummy,
    /// Component naming check against the application's allowed prefix.
    Prefix,
    /// Target-environment schema probe.
    DeployState,
}

impl JobKind {
    /// Resolve a declared job name, or `None` for an unknown one.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Dummy" => Some(Self::Dummy),
            "Prefix" => Some(Self::Prefix),
            "DeployState" => Some(Self::DeployState),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Dummy => "Dummy",
            Self::Prefix => "Prefix",
            Self::DeployState => "DeployState",
        }
    }
}

/// Resolve an assignment's job name and bind a job instance to it.
///
/// # Errors
///
/// `Config` when the declared name is not in the registry.
pub fn bind(assignment: JobAssignment) -> EngineResult<BoundJob> {
    let kind = JobKind::from_name(&assignment.job_name).ok_or_else(|| {
        EngineError::config(format!("unknown job name '{}'", assignment.job_name))
    })?;
    Ok(BoundJob::new(kind, assignment))
}
