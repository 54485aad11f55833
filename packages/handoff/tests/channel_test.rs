//! Channel semantics: rendezvous, buffering, close and drain

use handoff::{make_channel, spawn, Channel, ChannelClosed, Closed, RecvTimeoutError, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// Poll `cond` until it holds, failing the test after a second
async fn eventually(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition never became true");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unbuffered_send_waits_for_receiver() {
    let ch = Channel::<u32>::unbuffered();
    let delivered = Arc::new(AtomicBool::new(false));
    let done = Channel::<Result<(), ChannelClosed>>::new(1);

    let (tx, flag, report) = (ch.clone(), Arc::clone(&delivered), done.clone());
    spawn(async move {
        let result = tx.send(7).await;
        flag.store(true, Ordering::SeqCst);
        report.send(result).await.ok();
    });

    eventually(|| ch.parked_senders() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!delivered.load(Ordering::SeqCst), "send completed with no receiver");
    assert_eq!(ch.len(), 0);

    assert_eq!(ch.recv().await, Ok(7));
    assert_eq!(done.recv().await, Ok(Ok(())));
    assert!(delivered.load(Ordering::SeqCst));
}

#[tokio::test]
async fn buffered_send_completes_without_receiver() {
    let ch = make_channel::<&str>(2);
    ch.send("first").await.unwrap();
    ch.send("second").await.unwrap();

    assert_eq!(ch.len(), 2);
    assert_eq!(ch.capacity(), 2);
    assert_eq!(ch.parked_senders(), 0);

    // Third send has nowhere to go
    let third = tokio::time::timeout(Duration::from_millis(50), ch.send("third")).await;
    assert!(third.is_err());
    assert_eq!(ch.len(), 2, "buffered length exceeded capacity");

    assert_eq!(ch.recv().await, Ok("first"));
    assert_eq!(ch.recv().await, Ok("second"));
    assert_eq!(ch.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_buffer_releases_sender_when_space_frees() {
    let ch = Channel::new(1);
    ch.send(1).await.unwrap();

    let done = Channel::new(1);
    let (tx, report) = (ch.clone(), done.clone());
    spawn(async move {
        report.send(tx.send(2).await).await.ok();
    });
    eventually(|| ch.parked_senders() == 1).await;

    assert_eq!(ch.recv().await, Ok(1));
    // The parked value moved into the freed slot
    assert_eq!(done.recv().await, Ok(Ok(())));
    assert_eq!(ch.len(), 1);
    assert_eq!(ch.recv().await, Ok(2));
}

#[tokio::test]
async fn single_sender_order_is_preserved() {
    let ch = Channel::new(0);
    let tx = ch.clone();
    spawn(async move {
        for i in 0..100 {
            tx.send(i).await.unwrap();
        }
        tx.close().unwrap();
    });

    let mut received = Vec::new();
    while let Ok(value) = ch.recv().await {
        received.push(value);
    }
    assert_eq!(received, (0..100).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_senders_keep_their_own_order() {
    let ch = Channel::new(3);
    let done = Channel::<()>::new(2);
    for sender in 0..2u32 {
        let (tx, finished) = (ch.clone(), done.clone());
        spawn(async move {
            for seq in 0..50u32 {
                tx.send((sender, seq)).await.unwrap();
            }
            finished.signal().await.unwrap();
        });
    }

    let mut last = [None::<u32>; 2];
    for _ in 0..100 {
        let (sender, seq) = ch.recv().await.unwrap();
        let slot = &mut last[sender as usize];
        assert!(slot.is_none_or(|prev| prev < seq), "sender {sender} reordered");
        *slot = Some(seq);
    }
    done.wait().await.unwrap();
    done.wait().await.unwrap();
    assert_eq!(last, [Some(49), Some(49)]);
}

#[tokio::test]
async fn send_on_closed_channel_fails() {
    let ch = Channel::<i32>::new(4);
    ch.close().unwrap();
    assert!(ch.is_closed());
    assert_eq!(ch.send(1).await, Err(ChannelClosed));
    assert_eq!(ch.send(2).await, Err(ChannelClosed));
    assert_eq!(ch.len(), 0);
}

#[test]
fn buffered_channel_needs_no_second_task() {
    let ch = Channel::new(3);
    tokio_test::block_on(async {
        for n in 1..=3 {
            assert_ok!(ch.send(n).await);
        }
        assert_eq!(ch.len(), 3);
        assert_ok!(ch.close());
        assert_err!(ch.send(4).await);
        assert_eq!(assert_ok!(ch.recv().await), 1);
    });
    assert_eq!(ch.len(), 2);
    assert_eq!(ch.try_recv(), Ok(2));
    assert_eq!(ch.try_recv(), Ok(3));
    assert_err!(ch.try_recv());
}

#[tokio::test]
async fn closing_twice_fails() {
    let ch = Channel::<()>::unbuffered();
    assert_eq!(ch.close(), Ok(()));
    assert_eq!(ch.close(), Err(ChannelClosed));
}

#[tokio::test]
async fn closed_channel_drains_before_reporting_closed() {
    let ch = Channel::new(3);
    for word in ["a", "b", "c"] {
        ch.send(word).await.unwrap();
    }
    ch.close().unwrap();

    assert_eq!(ch.recv().await, Ok("a"));
    assert_eq!(ch.recv().await, Ok("b"));
    assert_eq!(ch.recv().await, Ok("c"));
    for _ in 0..5 {
        assert_eq!(ch.recv().await, Err(Closed));
        assert_eq!(ch.try_recv(), Err(TryRecvError::Closed));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_wakes_waiting_receiver() {
    let ch = Channel::<u8>::unbuffered();
    let done = Channel::new(1);
    let (rx, report) = (ch.clone(), done.clone());
    spawn(async move {
        report.send(rx.recv().await).await.ok();
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    ch.close().unwrap();
    assert_eq!(done.recv().await, Ok(Err(Closed)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_fails_parked_sender_and_discards_its_value() {
    let ch = Channel::<String>::unbuffered();
    let done = Channel::new(1);
    let (tx, report) = (ch.clone(), done.clone());
    spawn(async move {
        report.send(tx.send("late".to_string()).await).await.ok();
    });
    eventually(|| ch.parked_senders() == 1).await;

    ch.close().unwrap();
    assert_eq!(done.recv().await, Ok(Err(ChannelClosed)));
    assert_eq!(ch.parked_senders(), 0);
    assert_eq!(ch.recv().await, Err(Closed));
}

#[tokio::test]
async fn dropped_send_withdraws_its_offer() {
    let ch = Channel::<i32>::unbuffered();
    let attempt = tokio::time::timeout(Duration::from_millis(20), ch.send(5)).await;
    assert!(attempt.is_err());
    assert_eq!(ch.parked_senders(), 0);
    assert_eq!(ch.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn recv_timeout_distinguishes_timeout_from_closed() {
    let ch = Channel::<i32>::new(1);
    assert_eq!(
        ch.recv_timeout(Duration::from_millis(20)).await,
        Err(RecvTimeoutError::Timeout)
    );

    ch.send(3).await.unwrap();
    assert_eq!(ch.recv_timeout(Duration::from_millis(20)).await, Ok(3));

    ch.close().unwrap();
    assert_eq!(
        ch.recv_timeout(Duration::from_millis(20)).await,
        Err(RecvTimeoutError::Closed)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn signal_channel_carries_only_occurrence() {
    let signal = Channel::<()>::unbuffered();
    let tx = signal.clone();
    spawn(async move {
        tx.signal().await.unwrap();
    });
    assert_eq!(signal.wait().await, Ok(()));
    signal.close().unwrap();
    assert_eq!(signal.wait().await, Err(Closed));
}

#[test]
fn blocking_handoff_between_threads() {
    let ch = Channel::unbuffered();
    let tx = ch.clone();
    let producer = std::thread::spawn(move || {
        for i in 0..20u64 {
            tx.blocking_send(i * i).unwrap();
        }
        tx.close().unwrap();
    });

    let mut squares = Vec::new();
    while let Ok(value) = ch.blocking_recv() {
        squares.push(value);
    }
    producer.join().unwrap();
    assert_eq!(squares, (0..20u64).map(|i| i * i).collect::<Vec<_>>());
}

#[test]
fn debug_output_reports_state() {
    let ch = Channel::<u8>::new(2);
    let rendered = format!("{ch:?}");
    assert!(rendered.contains("capacity: 2"));
    assert!(rendered.contains("closed: false"));
}
