//! The stages of a preparation job.
//!
//! ## Overview
//!
//! A job moves through the following states:
//!
//! 1. `Initializing` - Report set up, output directory allocated
//! 2. `CopyingPackage` - Source package copied into the output directory
//! 3. `StageBagInfo` - bag-info loaded, operated on and written back
//! 4. `StageSigProp` - Significant properties viewed, operated on and merged
//! 5. `Finalizing` - Package manifests regenerated
//! 6. `Succeeded`
//!
//! `Failed` can be reached from every state before `Succeeded`. A stage
//! whose operation list is empty is skipped entirely; its file is neither
//! read nor written.
//!
//! Both metadata stages share the same shape: load a store, run the
//! metadata operator, check the job log for errors, apply the result. The
//! per-store loading and applying lives in [`bag_info`] and [`sig_prop`];
//! [`orchestrator`] strings everything together.

use std::fmt;

use crate::job::PreparationJob;
use crate::operations::Operation;

pub mod bag_info;
pub mod orchestrator;
pub mod sig_prop;

pub use orchestrator::{Outcome, Preparation};

/// State of a preparation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Initializing,
    CopyingPackage,
    StageBagInfo,
    StageSigProp,
    Finalizing,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Whether `next` may follow `self`.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Succeeded | Failed, _) => false,
            (_, Failed) => true,
            (Initializing, CopyingPackage) => true,
            (CopyingPackage, StageBagInfo | StageSigProp | Finalizing) => true,
            (StageBagInfo, StageSigProp | Finalizing) => true,
            (StageSigProp, Finalizing) => true,
            (Finalizing, Succeeded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Initializing => "initializing",
            JobState::CopyingPackage => "copying package",
            JobState::StageBagInfo => "bag-info stage",
            JobState::StageSigProp => "significant-properties stage",
            JobState::Finalizing => "finalizing",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A metadata stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BagInfo,
    SigProp,
}

impl Stage {
    /// Stages in execution order.
    pub const ALL: [Stage; 2] = [Stage::BagInfo, Stage::SigProp];

    /// Name used in job logs, matching the request key.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::BagInfo => "bagInfoOperations",
            Stage::SigProp => "sigPropOperations",
        }
    }

    pub fn state(&self) -> JobState {
        match self {
            Stage::BagInfo => JobState::StageBagInfo,
            Stage::SigProp => JobState::StageSigProp,
        }
    }

    /// The operations `job` requests for this stage.
    pub fn operations<'a>(&self, job: &'a PreparationJob) -> &'a [Operation] {
        match self {
            Stage::BagInfo => &job.bag_info_operations,
            Stage::SigProp => &job.sig_prop_operations,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
