//! Background tasks run by the daemon.
//!
//! # Available Tasks
//!
//! - [`weather_crawl::WeatherCrawlJob`] - Stores a weather snapshot once per tick
//! - [`clinic_sync::PetClinicSyncJob`] - Re-ingests the pet clinic feed
//!
//! Both are driven by a [`scheduler::Ticker`] until a shutdown signal is received.
//! A job's `run_tick` never returns an error; failures are logged and the next
//! tick runs as scheduled.

pub mod clinic_sync;
pub mod scheduler;
pub mod weather_crawl;

pub use clinic_sync::PetClinicSyncJob;
pub use scheduler::{Schedule, ScheduleError, Ticker};
pub use weather_crawl::WeatherCrawlJob;
