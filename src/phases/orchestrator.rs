//! Orchestrator for a complete preparation job
//!
//! [`Preparation`] runs one [`PreparationJob`] from allocation of the output
//! directory to the final notification and hands back an [`Outcome`].
//!
//! The job report always reaches a terminal state. Whatever goes wrong is
//! written to the report log as an error entry; nothing escapes as `Err`.
//! A partially prepared output package is left on disk when a job fails.

use std::path::PathBuf;

use log::{debug, info, warn};

use super::{bag_info, sig_prop, JobState, Stage};
use crate::config::AppConfig;
use crate::error::Error;
use crate::job::PreparationJob;
use crate::notify::{self, NoopNotifier, Notifier};
use crate::operator::MetadataOperator;
use crate::package::{self, Finalizer};
use crate::report::{origin, Report, Severity};
use crate::sigprop::SigPropLayout;
use crate::store::MetadataStore;

/// Result of a preparation job
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Final report, as handed to the notifier
    pub report: Report,
    /// Every state the job went through, ending in a terminal one
    pub states: Vec<JobState>,
    /// The stage that failed, if a stage failed
    pub failed_stage: Option<Stage>,
}

impl Outcome {
    pub fn success(&self) -> bool {
        self.report.data.success == Some(true)
    }

    pub fn state(&self) -> JobState {
        self.states.last().copied().unwrap_or(JobState::Initializing)
    }

    fn enter(&mut self, next: JobState) {
        let current = self.state();
        debug_assert!(
            current.can_transition_to(next),
            "invalid transition {} -> {}",
            current,
            next
        );
        debug!("Job {}: {} -> {}", self.report.token, current, next);
        self.states.push(next);
    }
}

/// Runs preparation jobs
pub struct Preparation {
    output_root: PathBuf,
    output_retries: u32,
    sigprop_file: PathBuf,
    layout: SigPropLayout,
    operator: MetadataOperator,
    finalizer: Box<dyn Finalizer>,
    notifier: Box<dyn Notifier>,
}

impl Preparation {
    /// Preparation configured by `config`; the notifier discards reports.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            output_root: config.output_root.clone(),
            output_retries: config.output_retries,
            sigprop_file: config.sigprop_file.clone(),
            layout: config.layout(),
            operator: MetadataOperator::new(),
            finalizer: package::finalizer(config),
            notifier: Box::new(NoopNotifier),
        }
    }

    /// Place output packages below `root` instead of the configured root.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_finalizer(mut self, finalizer: Box<dyn Finalizer>) -> Self {
        self.finalizer = finalizer;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Run `job` to completion.
    pub fn run(&self, job: &PreparationJob) -> Outcome {
        let mut outcome = Outcome {
            report: Report::new(job.token.clone(), job.args.clone()),
            states: vec![JobState::Initializing],
            failed_stage: None,
        };

        let target = job.target.display().to_string();
        outcome.report.progress.run();
        outcome.report.progress.verbose = format!("preparing IP from '{}'", target);
        outcome
            .report
            .log
            .info(origin::PREPARATION, format!("Preparing IP from '{}'.", target));
        info!("Preparing IP from '{}'", target);

        match self.prepare(job, &mut outcome) {
            Ok(()) => {
                outcome.enter(JobState::Succeeded);
                outcome.report.data.success = Some(true);
                let path = outcome.report.data.path.clone().unwrap_or_default();
                outcome.report.log.info(
                    origin::PREPARATION,
                    format!("Successfully prepared IP at '{}'.", path.display()),
                );
                info!("Successfully prepared IP at '{}'", path.display());
            }
            Err(failure) => {
                outcome.enter(JobState::Failed);
                outcome.report.data.success = Some(false);
                if let Some(e) = failure.error {
                    outcome.report.log.error(origin::PREPARATION, e.to_string());
                }
                if let Some(stage) = failure.stage {
                    outcome.report.log.error(
                        origin::PREPARATION,
                        format!("Preparing IP from '{}' failed during stage '{}'.", target, stage),
                    );
                    outcome.failed_stage = Some(stage);
                }
                warn!("Preparing IP from '{}' failed", target);
            }
        }

        outcome.report.progress.verbose = if outcome.success() {
            "preparation finished".to_string()
        } else {
            "preparation failed".to_string()
        };
        outcome.report.progress.complete();
        notify::deliver(self.notifier.as_ref(), &outcome.report);
        outcome
    }

    fn prepare(&self, job: &PreparationJob, outcome: &mut Outcome) -> Result<(), Failure> {
        let path = package::allocate_output(&self.output_root, self.output_retries)?;
        outcome.report.data.path = Some(path.clone());
        outcome.report.log.info(
            origin::PREPARATION,
            format!("Preparing IP at '{}'.", path.display()),
        );

        outcome.enter(JobState::CopyingPackage);
        outcome.report.progress.numeric = 10;
        package::copy_package(&job.target, &path)?;

        let sigprop_file = path.join(&self.sigprop_file);
        let mut tree = sig_prop::load(&sigprop_file, &self.layout, &mut outcome.report.log)?;

        let mut bag_info_metadata: Option<MetadataStore> = None;
        for stage in Stage::ALL {
            let operations = stage.operations(job);
            if operations.is_empty() {
                debug!("No {} requested, skipping stage", stage);
                continue;
            }

            outcome.enter(stage.state());
            outcome.report.progress.verbose = format!("running stage '{}'", stage);

            let source = match stage {
                Stage::BagInfo => bag_info::load(&path).map_err(|e| Failure::at(stage, e))?,
                Stage::SigProp => tree.view(),
            };

            let result = self.operator.process(&source, operations);
            outcome.report.log.merge(result.log);
            if outcome.report.log.contains(Severity::Error) {
                return Err(Failure::stage(stage));
            }

            match stage {
                Stage::BagInfo => {
                    bag_info::apply(&path, &result.metadata).map_err(|e| Failure::at(stage, e))?;
                    bag_info_metadata = Some(result.metadata);
                }
                Stage::SigProp => {
                    sig_prop::apply(&mut tree, &sigprop_file, &result.metadata)
                        .map_err(|e| Failure::at(stage, e))?;
                }
            }
            outcome.report.progress.numeric = match stage {
                Stage::BagInfo => 40,
                Stage::SigProp => 70,
            };
        }

        outcome.enter(JobState::Finalizing);
        outcome.report.progress.verbose = "finalizing package".to_string();
        self.finalizer.finalize(&path)?;

        outcome.report.data.bag_info_metadata = match bag_info_metadata {
            Some(metadata) => Some(metadata),
            None => bag_info::load(&path)
                .map_err(|e| warn!("Unable to read bag-info of {}: {}", path.display(), e))
                .ok(),
        };
        Ok(())
    }
}

/// Why a job failed
struct Failure {
    stage: Option<Stage>,
    error: Option<Error>,
}

impl Failure {
    fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            error: None,
        }
    }

    fn at(stage: Stage, error: Error) -> Self {
        Self {
            stage: Some(stage),
            error: Some(error),
        }
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self {
            stage: None,
            error: Some(error),
        }
    }
}
