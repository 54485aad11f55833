//! Email delivery and age checks

use chrono::{DateTime, TimeZone, Utc};
use handoff::{PatternBuilder, TaskId, TaskResult};
use std::time::Duration;

use crate::{DemoError, Transcript};

/// Simulated delivery latency
pub const DELIVERY_LATENCY: Duration = Duration::from_millis(250);

/// Emails strictly older than 2019-11-30T00:00:00Z count as old
const OLD_CUTOFF_UNIX: i64 = 1_575_072_000;

/// A message with the time it was written
#[derive(Debug, Clone)]
pub struct Email {
    /// Message text
    pub body: String,
    /// When the message was written
    pub date: DateTime<Utc>,
}

impl Email {
    /// Create an email written at midnight UTC on the given day
    ///
    /// # Errors
    ///
    /// Returns `DemoError::InvalidDate` if the date does not exist.
    pub fn dated(body: &str, year: i32, month: u32, day: u32) -> Result<Self, DemoError> {
        let date = Utc
            .with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .ok_or(DemoError::InvalidDate { year, month, day })?;
        Ok(Self {
            body: body.to_string(),
            date,
        })
    }

    /// Whether the email predates the cutoff
    #[must_use]
    pub fn is_old(&self) -> bool {
        self.date.timestamp() < OLD_CUTOFF_UNIX
    }
}

/// Send an email without waiting for it to be delivered
///
/// "Email sent" is recorded immediately; "Email received" is recorded by
/// the delivery task once [`DELIVERY_LATENCY`] has passed.
pub fn send_email(message: &str, transcript: &Transcript) -> TaskId {
    let received = format!("Email received: '{message}'");
    let log = transcript.clone();
    let task = PatternBuilder::notify(DELIVERY_LATENCY, move || log.record(received));
    transcript.record(format!("Email sent: '{message}'"));
    tracing::info!(%task, "email handed to delivery task");
    task
}

/// Check which of three emails are old, preserving their order
///
/// # Errors
///
/// Returns `TaskError` if the checking task exits early.
pub async fn check_email_age(emails: [Email; 3]) -> TaskResult<[bool; 3]> {
    PatternBuilder::fan_in(emails, |email: Email| email.is_old())
        .run_array()
        .await
}
