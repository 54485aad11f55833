//! Demos of the handoff coordination patterns
//!
//! - [`email::send_email`] - fire-and-forget notification
//! - [`email::check_email_age`] - fixed-arity ordered fan-in
//! - [`download::download_data`] / [`download::process_data`] - done-signal gate

pub mod download;
pub mod email;
pub mod transcript;

use std::time::Duration;

use handoff::{SchedulerConfig, TaskError};

pub use transcript::Transcript;

/// Errors surfaced by the demo binary
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// A coordination pattern failed
    #[error(transparent)]
    Task(#[from] TaskError),
    /// An email was dated on a day that does not exist
    #[error("invalid date {year:04}-{month:02}-{day:02}")]
    InvalidDate {
        /// Calendar year
        year: i32,
        /// Month of the year, from 1
        month: u32,
        /// Day of the month, from 1
        day: u32,
    },
}

/// Pause after each notification, long enough for delivery to land first
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Run every demo in sequence, recording output in `transcript`
///
/// The configured receive timeout, if any, bounds the wait for the download.
///
/// # Errors
///
/// Returns the first coordination or data error encountered.
pub async fn run_all(transcript: &Transcript, config: &SchedulerConfig) -> Result<(), DemoError> {
    for message in [
        "Hello there Kaladin!",
        "Hi there Shallan!",
        "Hey there Dalinar!",
    ] {
        email::send_email(message, transcript);
        tokio::time::sleep(SETTLE_DELAY).await;
        transcript.record("========================");
    }

    let emails = [
        email::Email::dated("Hi, I'm a reminder", 2019, 3, 4)?,
        email::Email::dated("Quarterly report attached", 2021, 6, 1)?,
        email::Email::dated("Welcome aboard", 2018, 11, 20)?,
    ];
    let verdicts = email::check_email_age(emails).await?;
    transcript.record(format!("Old emails: {verdicts:?}"));

    let download = download::download_data(transcript);
    download::process_data(download, transcript, config.recv_timeout()).await?;
    Ok(())
}
