//! Runs the coordination demos against a configured scheduler

use handoff::SchedulerConfig;
use handoff_demos::{run_all, DemoError, Transcript};

/// Environment variable naming an optional JSON scheduler config
const CONFIG_ENV: &str = "HANDOFF_CONFIG";

fn main() -> Result<(), DemoError> {
    handoff::logging::init();

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => SchedulerConfig::from_path(path)?,
        Err(_) => SchedulerConfig::default(),
    };
    let runtime = config.build_runtime()?;

    let transcript = Transcript::new();
    runtime.block_on(run_all(&transcript, &config))
}
