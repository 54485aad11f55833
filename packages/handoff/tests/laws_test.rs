//! Ordering laws checked over generated inputs

use handoff::{spawn, Channel, PatternBuilder};
use proptest::prelude::*;
use tokio::runtime::{Builder, Runtime};

fn runtime() -> Runtime {
    Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fan_in_preserves_input_order(inputs in prop::collection::vec(".{0,12}", 0..24)) {
        let expected: Vec<usize> = inputs.iter().map(String::len).collect();
        let results = runtime().block_on(PatternBuilder::fan_in(inputs, |s: String| s.len()).run());
        prop_assert_eq!(results, Ok(expected));
    }

    #[test]
    fn single_sender_is_fifo(values in prop::collection::vec(any::<u32>(), 0..64), capacity in 0usize..4) {
        let received = runtime().block_on(async {
            let ch = Channel::new(capacity);
            let tx = ch.clone();
            let sent = values.clone();
            spawn(async move {
                for value in sent {
                    tx.send(value).await.unwrap();
                }
                tx.close().unwrap();
            });

            let mut received = Vec::new();
            while let Ok(value) = ch.recv().await {
                assert!(ch.len() <= capacity, "buffer grew past capacity");
                received.push(value);
            }
            received
        });
        prop_assert_eq!(received, values);
    }
}
