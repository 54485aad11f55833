//! Download-then-process coordination

use std::time::Duration;

use handoff::{Gate, PatternBuilder, TaskResult};

use crate::Transcript;

/// Start the download in its own task
///
/// The returned gate opens once the download has finished.
pub fn download_data(transcript: &Transcript) -> Gate {
    let log = transcript.clone();
    PatternBuilder::gate(move || async move {
        log.record("Downloading data file...");
    })
}

/// Prepare, then wait for the download before processing
///
/// With a `timeout` the wait gives up once it expires.
///
/// # Errors
///
/// Returns `TaskError::GateAbandoned` if the download task died, or
/// `TaskError::Timeout` if `timeout` passed first.
pub async fn process_data(
    download: Gate,
    transcript: &Transcript,
    timeout: Option<Duration>,
) -> TaskResult<()> {
    transcript.record("Preparing to process data...");

    match timeout {
        Some(limit) => download.wait_timeout(limit).await?,
        None => download.wait().await?,
    }

    transcript.record("Data download ensured, starting data processing...");
    Ok(())
}
