use std::{future::Future, time::Duration};

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};
use log::{debug, info};
use thiserror::Error;
use tokio::{sync::broadcast, task::JoinHandle, time::sleep};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid time of day {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
    #[error("Interval must be greater than zero")]
    ZeroInterval,
}

/// When a recurring task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Once a day at a fixed local wall-clock time.
    DailyAt { hour: u32, minute: u32 },
    /// At a fixed interval, first run one interval after start.
    Every(Duration),
}

impl Schedule {
    pub fn daily_at(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if NaiveTime::from_hms_opt(hour, minute, 0).is_none() {
            return Err(ScheduleError::InvalidTime { hour, minute });
        }
        Ok(Schedule::DailyAt { hour, minute })
    }

    pub fn every(interval: Duration) -> Result<Self, ScheduleError> {
        if interval.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        Ok(Schedule::Every(interval))
    }

    /// Time to wait from `now` until the next run.
    ///
    /// A daily time equal to `now` counts as passed, so the next run is a day
    /// later. Offsets are taken as fixed over the wait.
    pub fn next_delay<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        match *self {
            Schedule::Every(interval) => interval,
            Schedule::DailyAt { hour, minute } => {
                let local_now = now.naive_local();
                let Some(at) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                    return Duration::from_secs(24 * 60 * 60);
                };
                let mut next = local_now.date().and_time(at);
                if next <= local_now {
                    next += TimeDelta::days(1);
                }
                (next - local_now).to_std().unwrap_or_default()
            },
        }
    }
}

/// Runs a task on a [`Schedule`] until shutdown.
///
/// The task's future yields `()`: it must log and swallow its own failures,
/// so one bad tick never stops later ones.
pub struct Ticker {
    name: &'static str,
    schedule: Schedule,
}

impl Ticker {
    pub fn new(name: &'static str, schedule: Schedule) -> Self {
        Self { name, schedule }
    }

    pub fn run<F, Fut>(self, mut task: F, mut shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            info!(task = self.name; "Scheduled task started");

            loop {
                let delay = self.schedule.next_delay(&Local::now());
                debug!(task = self.name, delay_secs = delay.as_secs(); "Next run scheduled");

                tokio::select! {
                    _ = sleep(delay) => {
                        debug!(task = self.name; "Running scheduled task");
                        task().await;
                    }
                    _ = shutdown_rx.recv() => {
                        info!(task = self.name; "Scheduled task received shutdown signal. Exiting gracefully.");
                        break;
                    }
                }
            }
        })
    }
}
