// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapegate::queue::throttle::Throttle;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

#[tokio::test(start_paused = true)]
async fn sequential_turns_are_spaced_by_fixed_interval() {
    let throttle = Throttle::new(1000, 1000);
    let origin = Instant::now();

    let mut starts = Vec::new();
    for _ in 0..3 {
        starts.push(throttle.wait_turn().await);
    }

    assert_eq!(starts[0] - origin, Duration::ZERO);
    assert_eq!(starts[1] - starts[0], Duration::from_millis(1000));
    assert_eq!(starts[2] - starts[1], Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_never_start_closer_than_minimum() {
    let throttle = Arc::new(Throttle::new(500, 800));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let throttle = throttle.clone();
            tokio::spawn(async move { throttle.wait_turn().await })
        })
        .collect();

    let mut starts = Vec::new();
    for handle in handles {
        starts.push(handle.await.unwrap());
    }
    starts.sort();

    for pair in starts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_millis(500), "gap was {:?}", gap);
        assert!(gap <= Duration::from_millis(800), "gap was {:?}", gap);
    }
}
