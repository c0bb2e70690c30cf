//! Mirror pipeline.
//!
//! Drives a local working copy through a strictly linear sequence:
//!
//! ```text
//! Start -> Initialized -> RemotesAdded -> CheckedOut -> Pulled -> BranchCreated -> Pushed
//! ```
//!
//! Any failing step moves the pipeline to `Failed` and aborts the run. There
//! is no retry and no rollback; the working directory is left as-is for
//! inspection.

mod report;
mod step;

pub use report::{PlannedCommand, RunReport, StepRecord};
pub use step::Step;

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::config::AuthenticatedConfig;
use crate::error::{MirrorError, Result};
use crate::git::{GitRunner, render_command};
use crate::secrets::SecretRegistry;

/// Position of a pipeline in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Initialized,
    RemotesAdded,
    CheckedOut,
    Pulled,
    BranchCreated,
    Pushed,
    Failed,
}

impl PipelineState {
    /// State reached after `step` succeeds from `self`.
    fn after(self, step: Step) -> Self {
        match step {
            Step::Init => PipelineState::Initialized,
            // Remotes count as added only once both are registered.
            Step::AddUpstreamRemote => self,
            Step::AddMirrorRemote => PipelineState::RemotesAdded,
            Step::Checkout => PipelineState::CheckedOut,
            Step::Pull => PipelineState::Pulled,
            Step::CreateBranch => PipelineState::BranchCreated,
            Step::Push => PipelineState::Pushed,
        }
    }
}

/// Mirrors one branch of the original repository onto the mirror.
#[derive(Debug)]
pub struct MirrorPipeline<R> {
    config: AuthenticatedConfig,
    runner: R,
    work_dir: PathBuf,
    secrets: SecretRegistry,
    state: PipelineState,
}

impl<R: GitRunner> MirrorPipeline<R> {
    pub fn new(
        config: AuthenticatedConfig,
        runner: R,
        work_dir: impl Into<PathBuf>,
        secrets: SecretRegistry,
    ) -> Self {
        Self {
            config,
            runner,
            work_dir: work_dir.into(),
            secrets,
            state: PipelineState::Start,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// The commands [`run`](Self::run) would execute, masked, without running any.
    pub fn plan(&self) -> Vec<PlannedCommand> {
        Step::ALL
            .iter()
            .map(|&step| PlannedCommand {
                step,
                command: self.masked_command(step),
            })
            .collect()
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// A pipeline runs at most once; later calls fail without invoking git.
    pub fn run(&mut self) -> Result<RunReport> {
        if self.state != PipelineState::Start {
            return Err(MirrorError::NotResumable { state: self.state });
        }

        let started_at = Utc::now();
        let mut steps = Vec::with_capacity(Step::ALL.len());

        for step in Step::ALL {
            info!("{}", step.describe(&self.config));

            let args = step.args(&self.config);
            let began = Instant::now();
            match self.runner.run(&self.work_dir, &args) {
                Ok(output) => {
                    self.state = self.state.after(step);
                    steps.push(StepRecord {
                        step,
                        command: self.masked_command(step),
                        duration_ms: began.elapsed().as_millis() as u64,
                        output_lines: output.lines().count(),
                    });
                }
                Err(err) => {
                    self.state = PipelineState::Failed;
                    debug!(step = step.name(), "step failed, aborting run");
                    return Err(err);
                }
            }
        }

        Ok(RunReport {
            work_dir: self.work_dir.clone(),
            started_at,
            finished_at: Utc::now(),
            steps,
        })
    }

    fn masked_command(&self, step: Step) -> String {
        self.secrets
            .mask(&render_command(&step.display_args(&self.config)))
    }
}
