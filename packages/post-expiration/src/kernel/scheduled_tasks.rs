//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! This module owns the recurring expiration sweep:
//! - fires once right after registration
//! - then every hour for the life of the process
//!
//! # Architecture
//!
//! ```text
//! ExpirationScheduler::initialize()
//!     │
//!     ├─► already registered? → AlreadyScheduled (no-op)
//!     └─► add one-shot job (now) + repeated job (hourly)
//!             └─► tick() → TransitionExecutor::sweep(now)
//! ```
//!
//! Registration state lives in the scheduler object, keyed by task name, so
//! a second `initialize()` can never add a second recurring job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::domains::expiration::{SweepReport, TransitionExecutor};

/// Well-known name of the recurring expiration task.
pub const EXPIRATION_TASK_NAME: &str = "post_expiration.expire_posts";

/// Time between sweeps.
pub const EXPIRATION_PERIOD: Duration = Duration::from_secs(60 * 60);

/// A registered recurring task
#[derive(Clone, Debug, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct ScheduledTask {
    pub name: String,
    /// Scheduler job ids backing this task (immediate + recurring)
    #[builder(default)]
    pub job_ids: Vec<Uuid>,
    #[builder(default = Utc::now())]
    pub first_run_at: DateTime<Utc>,
    #[builder(default = EXPIRATION_PERIOD)]
    pub period: Duration,
}

/// Result of [`ExpirationScheduler::initialize`]
#[derive(Clone, Debug)]
pub enum Registration {
    /// The task was not registered; it is now
    Scheduled(ScheduledTask),
    /// The task was already registered; nothing changed
    AlreadyScheduled(ScheduledTask),
}

impl Registration {
    pub fn task(&self) -> &ScheduledTask {
        match self {
            Registration::Scheduled(task) | Registration::AlreadyScheduled(task) => task,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Registration::Scheduled(_))
    }
}

/// Runs sweeps, never more than one at a time.
struct SweepRunner {
    executor: Arc<TransitionExecutor>,
    running: Mutex<()>,
}

impl SweepRunner {
    async fn tick(&self) -> Option<SweepReport> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!("Previous expiration sweep still running, skipping tick");
            return None;
        };

        let now = Utc::now().timestamp();
        tracing::info!(now, "Running expiration sweep");

        let report = self.executor.sweep(now).await;

        if report.is_clean() {
            tracing::info!(
                matched = report.matched,
                transitioned = report.transitioned,
                unchanged = report.unchanged,
                "Expiration sweep complete"
            );
        } else {
            tracing::warn!(
                matched = report.matched,
                transitioned = report.transitioned,
                unchanged = report.unchanged,
                failures = report.failures.len(),
                "Expiration sweep completed with failures"
            );
        }

        Some(report)
    }
}

/// Owns the cron scheduler and the expiration task registration.
pub struct ExpirationScheduler {
    scheduler: JobScheduler,
    runner: Arc<SweepRunner>,
    registrations: Mutex<HashMap<String, ScheduledTask>>,
}

impl ExpirationScheduler {
    pub async fn new(executor: Arc<TransitionExecutor>) -> Result<Self> {
        Ok(Self {
            scheduler: JobScheduler::new().await?,
            runner: Arc::new(SweepRunner {
                executor,
                running: Mutex::new(()),
            }),
            registrations: Mutex::new(HashMap::new()),
        })
    }

    /// Register the expiration task unless it is already registered.
    ///
    /// Safe to call any number of times; only the first call adds jobs.
    pub async fn initialize(&self) -> Result<Registration> {
        let mut registrations = self.registrations.lock().await;

        if let Some(task) = registrations.get(EXPIRATION_TASK_NAME) {
            tracing::debug!(task = EXPIRATION_TASK_NAME, "Expiration task already scheduled");
            return Ok(Registration::AlreadyScheduled(task.clone()));
        }

        let first_run_at = Utc::now();
        let immediate_id = self.scheduler.add(immediate_job(self.runner.clone())?).await?;
        let recurring_id = self.scheduler.add(recurring_job(self.runner.clone())?).await?;

        let task = ScheduledTask::builder()
            .name(EXPIRATION_TASK_NAME)
            .job_ids(vec![immediate_id, recurring_id])
            .first_run_at(first_run_at)
            .build();
        registrations.insert(task.name.clone(), task.clone());

        tracing::info!(
            task = EXPIRATION_TASK_NAME,
            period_secs = EXPIRATION_PERIOD.as_secs(),
            "Scheduled expiration task (first run now, then hourly)"
        );
        Ok(Registration::Scheduled(task))
    }

    /// Start firing registered jobs
    pub async fn start(&self) -> Result<()> {
        self.scheduler.start().await?;
        Ok(())
    }

    /// Stop the scheduler. Registrations end with the process.
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.clone();
        scheduler.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }

    /// Run one sweep now. Returns `None` if a sweep is already in progress.
    pub async fn tick(&self) -> Option<SweepReport> {
        self.runner.tick().await
    }

    pub async fn scheduled(&self, name: &str) -> Option<ScheduledTask> {
        self.registrations.lock().await.get(name).cloned()
    }

    pub async fn registered_tasks(&self) -> Vec<ScheduledTask> {
        self.registrations.lock().await.values().cloned().collect()
    }
}

fn immediate_job(runner: Arc<SweepRunner>) -> Result<Job> {
    let job = Job::new_one_shot_async(Duration::ZERO, move |_uuid, _lock| {
        let runner = runner.clone();
        Box::pin(async move {
            runner.tick().await;
        })
    })?;
    Ok(job)
}

fn recurring_job(runner: Arc<SweepRunner>) -> Result<Job> {
    let job = Job::new_repeated_async(EXPIRATION_PERIOD, move |_uuid, _lock| {
        let runner = runner.clone();
        Box::pin(async move {
            runner.tick().await;
        })
    })?;
    Ok(job)
}
