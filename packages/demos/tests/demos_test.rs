//! End-to-end runs of the demos

use handoff::{PatternBuilder, SchedulerConfig, TaskError};
use handoff_demos::download::{download_data, process_data};
use handoff_demos::email::{check_email_age, send_email, Email, DELIVERY_LATENCY};
use handoff_demos::{run_all, DemoError, Transcript};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn email_is_sent_before_it_is_received() {
    let transcript = Transcript::quiet();
    send_email("Hello there Kaladin!", &transcript);

    assert_eq!(transcript.lines(), vec!["Email sent: 'Hello there Kaladin!'"]);

    tokio::time::sleep(DELIVERY_LATENCY * 2).await;
    assert_eq!(
        transcript.lines(),
        vec![
            "Email sent: 'Hello there Kaladin!'",
            "Email received: 'Hello there Kaladin!'",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn email_age_verdicts_keep_input_order() {
    let emails = [
        Email::dated("Hi, I'm a reminder", 2019, 3, 4).unwrap(),
        Email::dated("Quarterly report attached", 2021, 6, 1).unwrap(),
        Email::dated("Welcome aboard", 2018, 11, 20).unwrap(),
    ];
    assert_eq!(check_email_age(emails).await, Ok([true, false, true]));
}

#[test]
fn cutoff_is_end_of_november_2019() {
    assert!(Email::dated("", 2019, 11, 29).unwrap().is_old());
    assert!(!Email::dated("", 2019, 11, 30).unwrap().is_old());
    assert!(!Email::dated("", 2019, 12, 15).unwrap().is_old());
}

#[test]
fn impossible_dates_are_rejected() {
    assert!(matches!(
        Email::dated("", 2021, 2, 30),
        Err(DemoError::InvalidDate {
            year: 2021,
            month: 2,
            day: 30
        })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn processing_waits_for_download() {
    let transcript = Transcript::quiet();
    let download = download_data(&transcript);
    process_data(download, &transcript, None).await.unwrap();

    let downloaded = transcript.position("Downloading data file...").unwrap();
    let prepared = transcript.position("Preparing to process data...").unwrap();
    let processed = transcript
        .position("Data download ensured, starting data processing...")
        .unwrap();
    assert!(downloaded < processed);
    assert!(prepared < processed);
    assert_eq!(processed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_demo_run() {
    let transcript = Transcript::quiet();
    run_all(&transcript, &SchedulerConfig::default()).await.unwrap();

    let lines = transcript.lines();
    assert_eq!(lines.iter().filter(|l| l.starts_with("Email sent")).count(), 3);
    assert_eq!(lines.iter().filter(|l| l.starts_with("Email received")).count(), 3);
    assert!(lines.contains(&"Old emails: [true, false, true]".to_string()));
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Data download ensured, starting data processing...")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn processing_gives_up_on_a_stalled_download() {
    let transcript = Transcript::quiet();
    let config = SchedulerConfig::from_json_str(r#"{ "recv_timeout_ms": 20 }"#).unwrap();
    let stalled = PatternBuilder::gate(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let outcome = process_data(stalled, &transcript, config.recv_timeout()).await;
    assert_eq!(outcome, Err(TaskError::Timeout));
    assert_eq!(transcript.lines(), vec!["Preparing to process data..."]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn configured_timeout_leaves_prompt_download_alone() {
    let transcript = Transcript::quiet();
    let config = SchedulerConfig::from_json_str(r#"{ "recv_timeout_ms": 2000 }"#).unwrap();
    let download = download_data(&transcript);
    process_data(download, &transcript, config.recv_timeout()).await.unwrap();
    assert_eq!(
        transcript.lines().last().map(String::as_str),
        Some("Data download ensured, starting data processing...")
    );
}
