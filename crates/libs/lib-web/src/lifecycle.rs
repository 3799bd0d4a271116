//! # Lifecycle Controller
//!
//! Brackets the serving phase with database setup and teardown.
//!
//! ```text
//! NotStarted -> Starting -> Running -> Stopping -> Stopped
//!                   \__________________/
//!                     (startup failure)
//! ```
//!
//! Teardown runs whether serving ends normally, with an error, or with a
//! panic inside the serve task.
//!
//! Settings are resolved by the caller before `run`, since the router state
//! is built from them. `run` re-validates them once it is `Starting`, so a
//! bad configuration is reported as a startup failure and still ends in
//! `Stopped`.

use std::future::Future;

use anyhow::{anyhow, Context};
use lib_core::{ModelManager, Settings};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
}

pub struct Lifecycle {
    mm: ModelManager,
    state: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new(mm: ModelManager) -> Self {
        let (state, _) = watch::channel(LifecycleState::NotStarted);
        Self { mm, state }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch state transitions, e.g. to wait for `Running` in tests.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, next: LifecycleState) {
        let prev = self.state.send_replace(next);
        info!("[LIFECYCLE] {:?} -> {:?}", prev, next);
    }

    /// Validate `settings`, set up the database, create the schema, run
    /// `serve` to completion, then tear the database down.
    ///
    /// `serve` runs on its own task so a panic in it is reported as an error
    /// instead of skipping teardown.
    ///
    /// # Errors
    ///
    /// Startup failures, serve errors and serve panics. A `Lifecycle` runs
    /// at most once.
    pub async fn run<F>(&self, settings: &Settings, serve: F) -> anyhow::Result<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.state() != LifecycleState::NotStarted {
            return Err(anyhow!("lifecycle already started"));
        }
        self.transition(LifecycleState::Starting);

        let started = match settings.validate() {
            Ok(()) => match self.mm.setup(settings).await {
                Ok(()) => self.mm.create_schema().await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let outcome = match started.context("startup failed") {
            Err(e) => {
                error!("[LIFECYCLE] {:#}", e);
                Err(e)
            }
            Ok(()) => {
                self.transition(LifecycleState::Running);
                info!("[LIFECYCLE] Application started, database ready.");

                match tokio::spawn(serve).await {
                    Ok(result) => result,
                    Err(join_err) => Err(anyhow!("serve task failed: {join_err}")),
                }
            }
        };

        self.transition(LifecycleState::Stopping);
        self.mm.teardown().await;
        self.transition(LifecycleState::Stopped);
        info!("[LIFECYCLE] Application stopped, resources released.");

        outcome
    }
}
