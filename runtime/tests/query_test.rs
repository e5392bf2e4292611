//! Integration tests for query orchestration.
//!
//! All tests run on a paused clock: sleeping advances virtual time and
//! fires every timer that falls due along the way.

#![allow(clippy::unwrap_used)] // Test code

use formulaic_core::Outcome;
use formulaic_runtime::{Query, QueryConfiguration, QueryOptions, Rejection};
use formulaic_testing::{Spy, settle};
use futures::future::{Ready, ready};
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Test Fixtures
// ============================================================================

type Call = Ready<Result<u32, Rejection<u32>>>;

/// Action answering with its argument, recording every call.
fn echo(spy: &Spy<u32>) -> impl Fn(u32) -> Option<Call> + Send + Sync + 'static {
    let spy = spy.clone();
    move |n| {
        spy.record(n);
        Some(ready(Ok(n)))
    }
}

const fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

// ============================================================================
// Scheduling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn first_trigger_executes_immediately() {
    let spy = Spy::new();
    let query = Query::subscribe(echo(&spy), 1, QueryOptions::new().debounce(millis(1000)));

    assert_eq!(spy.count(), 1);
    assert!(query.pending());

    settle().await;
    assert_eq!(query.last(), Outcome::literal(1));
    assert!(!query.pending());
}

#[tokio::test(start_paused = true)]
async fn triggers_inside_the_window_are_coalesced() {
    let spy = Spy::new();
    let query = Query::subscribe(echo(&spy), 0, QueryOptions::new().debounce(millis(1000)));

    for n in 1..=5 {
        sleep(millis(200)).await;
        query.set_args(n);
    }
    assert_eq!(spy.count(), 1);
    assert!(query.pending());

    sleep(millis(10_000)).await;
    assert_eq!(spy.calls(), vec![0, 5]);
    assert_eq!(query.last(), Outcome::literal(5));
    assert!(!query.pending());
}

#[tokio::test(start_paused = true)]
async fn refresh_inside_the_window_runs_after_it() {
    let spy = Spy::new();
    let query = Query::subscribe(echo(&spy), 3, QueryOptions::new());

    sleep(millis(10)).await;
    query.refresh();
    assert_eq!(spy.count(), 1);
    assert!(query.pending());

    sleep(millis(200)).await;
    assert_eq!(spy.calls(), vec![3, 3]);
    assert!(!query.pending());
}

#[tokio::test(start_paused = true)]
async fn spaced_triggers_each_execute() {
    let spy = Spy::new();
    let query = Query::subscribe(echo(&spy), 1, QueryOptions::new().debounce(millis(100)));

    sleep(millis(500)).await;
    query.set_args(2);
    assert_eq!(spy.count(), 2);

    sleep(millis(500)).await;
    query.set_args(3);
    assert_eq!(spy.calls(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn wait_time_delays_every_execution() {
    let spy = Spy::new();
    let query = Query::subscribe_with(
        QueryConfiguration::new().with_wait_time(millis(300)),
        echo(&spy),
        1,
        QueryOptions::new(),
    );

    assert_eq!(spy.count(), 0);
    assert!(query.pending());

    sleep(millis(350)).await;
    assert_eq!(spy.count(), 1);
    assert_eq!(query.last(), Outcome::literal(1));
}

#[tokio::test(start_paused = true)]
async fn max_delay_forces_execution_under_sustained_triggers() {
    let spy = Spy::new();
    let query = Query::subscribe(
        echo(&spy),
        0,
        QueryOptions::new()
            .debounce(millis(1000))
            .max_delay(millis(2000)),
    );

    for n in 1..=10 {
        sleep(millis(300)).await;
        query.set_args(n);
    }
    assert_eq!(spy.calls(), vec![0, 7]);

    sleep(millis(10_000)).await;
    assert_eq!(spy.calls(), vec![0, 7, 10]);
}

#[tokio::test(start_paused = true)]
async fn without_max_delay_sustained_triggers_keep_postponing() {
    let spy = Spy::new();
    let query = Query::subscribe(echo(&spy), 0, QueryOptions::new().debounce(millis(1000)));

    for n in 1..=10 {
        sleep(millis(300)).await;
        query.set_args(n);
    }
    assert_eq!(spy.count(), 1);

    sleep(millis(10_000)).await;
    assert_eq!(spy.calls(), vec![0, 10]);
}

#[tokio::test(start_paused = true)]
async fn max_delay_caps_wait_time_without_contention() {
    let spy = Spy::new();
    let query = Query::subscribe(
        echo(&spy),
        1,
        QueryOptions::new().wait_time(millis(500)).max_delay(millis(200)),
    );

    sleep(millis(150)).await;
    assert_eq!(spy.count(), 0);
    assert!(query.pending());

    sleep(millis(100)).await;
    assert_eq!(spy.calls(), vec![1]);
    settle().await;
    assert_eq!(query.last(), Outcome::literal(1));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn first_execution_never_waits_past_max_delay(
        wait in 1u64..2_000,
        max in 1u64..2_000,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let due = wait.min(max);

        let (before, after) = runtime.block_on(async {
            let spy = Spy::new();
            let _query = Query::subscribe(
                echo(&spy),
                1,
                QueryOptions::new().wait_time(millis(wait)).max_delay(millis(max)),
            );
            sleep(millis(due - 1)).await;
            let before = spy.count();
            sleep(millis(2)).await;
            (before, spy.count())
        });

        prop_assert_eq!(before, 0);
        prop_assert_eq!(after, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn configured_max_delay_can_be_disabled_per_query() {
    let spy = Spy::new();
    let query = Query::subscribe_with(
        QueryConfiguration::new()
            .with_debounce(millis(1000))
            .with_max_delay(Some(millis(2000))),
        echo(&spy),
        0,
        QueryOptions::new().no_max_delay(),
    );

    for n in 1..=10 {
        sleep(millis(300)).await;
        query.set_args(n);
    }
    assert_eq!(spy.count(), 1);
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test(start_paused = true)]
async fn last_triggered_request_wins_when_it_resolves_first() {
    let spy = Spy::new();
    let recorder = spy.clone();
    let query = Query::subscribe(
        move |n: u32| {
            recorder.record(n);
            let latency = if n == 1 { millis(500) } else { millis(50) };
            Some(async move {
                sleep(latency).await;
                Ok::<_, Rejection<u32>>(n)
            })
        },
        1,
        QueryOptions::new().debounce(Duration::ZERO),
    );
    query.set_args(2);
    assert_eq!(spy.calls(), vec![1, 2]);

    sleep(millis(100)).await;
    assert_eq!(query.last(), Outcome::literal(2));
    assert!(query.pending());

    sleep(millis(1000)).await;
    assert_eq!(query.last(), Outcome::literal(2));
    assert!(!query.pending());
}

#[tokio::test(start_paused = true)]
async fn earlier_request_is_recorded_until_a_newer_one_resolves() {
    let query = Query::subscribe(
        |n: u32| {
            let latency = if n == 1 { millis(50) } else { millis(500) };
            Some(async move {
                sleep(latency).await;
                Ok::<_, Rejection<u32>>(n)
            })
        },
        1,
        QueryOptions::new().debounce(Duration::ZERO),
    );
    query.set_args(2);

    sleep(millis(100)).await;
    assert_eq!(query.last(), Outcome::literal(1));

    sleep(millis(1000)).await;
    assert_eq!(query.last(), Outcome::literal(2));
}

#[tokio::test(start_paused = true)]
async fn watchers_see_accepted_outcomes() {
    let spy = Spy::new();
    let query = Query::subscribe(echo(&spy), 4, QueryOptions::new());
    let mut updates = query.watch();

    updates.changed().await.unwrap();
    assert_eq!(*updates.borrow(), Outcome::literal(4));
}

// ============================================================================
// Validation, skips and arguments
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rejected_arguments_are_never_pending() {
    let spy = Spy::new();
    let query = Query::subscribe(
        echo(&spy),
        0,
        QueryOptions::new().validate(|n: &u32| *n > 0),
    );

    assert_eq!(spy.count(), 0);
    assert!(!query.pending());
    assert_eq!(query.last(), Outcome::never_fetched());

    query.set_args(3);
    settle().await;
    assert_eq!(spy.calls(), vec![3]);
    assert_eq!(query.last(), Outcome::literal(3));
}

#[tokio::test(start_paused = true)]
async fn skipped_calls_clear_pending() {
    let query = Query::subscribe(
        |n: u32| (n > 0).then(|| ready(Ok::<_, Rejection<u32>>(n))),
        0,
        QueryOptions::new(),
    );

    assert!(!query.pending());
    assert_eq!(query.last(), Outcome::never_fetched());
}

#[tokio::test(start_paused = true)]
async fn equal_arguments_do_not_trigger() {
    let spy = Spy::new();
    let query = Query::subscribe(
        echo(&spy),
        10,
        QueryOptions::new()
            .debounce(Duration::ZERO)
            .equality(|a: &u32, b: &u32| a / 10 == b / 10),
    );

    query.set_args(15);
    assert_eq!(spy.count(), 1);
    assert_eq!(query.args(), 10);

    query.set_args(20);
    assert_eq!(spy.calls(), vec![10, 20]);
    assert_eq!(query.args(), 20);
}

#[tokio::test(start_paused = true)]
async fn failures_are_recorded_as_outcomes() {
    let query = Query::subscribe(
        |_: u32| Some(ready(Err::<u32, _>(Rejection::<u32>::from(anyhow::anyhow!("offline"))))),
        1,
        QueryOptions::new(),
    );

    settle().await;
    assert_eq!(query.last(), Outcome::failed_request(500, None));
    assert!(!query.status().pending);
}

#[tokio::test(start_paused = true)]
async fn parts_refresh_triggers_the_query() {
    let spy = Spy::new();
    let query = Query::subscribe(echo(&spy), 8, QueryOptions::new().debounce(Duration::ZERO));
    settle().await;

    let (last, refresh, status) = query.parts();
    assert_eq!(last, Outcome::literal(8));
    assert!(!status.pending);

    refresh();
    assert_eq!(spy.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_cancels_queued_requests() {
    let spy = Spy::new();
    let query = Query::subscribe(echo(&spy), 1, QueryOptions::new().debounce(millis(1000)));

    sleep(millis(10)).await;
    query.refresh();
    drop(query);

    sleep(millis(5000)).await;
    assert_eq!(spy.count(), 1);
}
