//! Firing semantics across hook kinds.
//!
//! These tests verify ordering, fail-fast, settlement and single-flight
//! guarantees using order-recording taps.

use core::time::Duration;
use std::sync::{Arc, Mutex};

use tapestry_hooks::{Hook, HookError, HookKind, HookName};

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

// ─────────────────────────────────────────────────────────────────────────────
// Async series
// ─────────────────────────────────────────────────────────────────────────────

/// Registers five async taps; the one at `fail_at` fails.
fn series_with_failure_at(fail_at: Option<usize>, log: &Log) -> Hook<()> {
    let hook = Hook::new(HookName::Compile, HookKind::AsyncSeries);
    for index in 0..5 {
        let log = Arc::clone(log);
        hook.tap_async(format!("tap-{index}"), move |()| {
            let log = Arc::clone(&log);
            async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                push(&log, format!("tap-{index}"));
                if Some(index) == fail_at {
                    Err(format!("tap-{index} failed").into())
                } else {
                    Ok(())
                }
            }
        })
        .unwrap();
    }
    hook
}

#[tokio::test]
async fn series_taps_run_in_registration_order() {
    let log = log();
    let hook = series_with_failure_at(None, &log);

    hook.call_async(&()).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["tap-0", "tap-1", "tap-2", "tap-3", "tap-4"]
    );
}

#[tokio::test]
async fn series_failure_prevents_later_taps() {
    for fail_at in 0..5 {
        let log = log();
        let hook = series_with_failure_at(Some(fail_at), &log);

        let err = hook.call_async(&()).await.unwrap_err();

        let HookError::TapFailed { hook: name, tap, source } = err else {
            panic!("expected TapFailed");
        };
        assert_eq!(name, HookName::Compile);
        assert_eq!(tap, format!("tap-{fail_at}"));
        assert_eq!(source.to_string(), format!("tap-{fail_at} failed"));
        assert_eq!(log.lock().unwrap().len(), fail_at + 1);
    }
}

#[tokio::test]
async fn series_fire_is_single_flight() {
    let hook = Arc::new(Hook::<()>::new(HookName::Run, HookKind::AsyncSeries));
    hook.tap_async("slow", |()| async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(())
    })
    .unwrap();

    let (first, second) = tokio::join!(hook.call_async(&()), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        hook.call_async(&()).await
    });

    first.unwrap();
    assert!(matches!(
        second,
        Err(HookError::ReentrantFire {
            hook: HookName::Run
        })
    ));

    // Once settled, the hook can be fired again.
    hook.call_async(&()).await.unwrap();
}

#[tokio::test]
async fn tapping_during_series_fire_is_rejected() {
    let hook = Arc::new(Hook::<()>::new(HookName::Compile, HookKind::AsyncSeries));
    hook.tap_async("slow", |()| async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(())
    })
    .unwrap();

    let (fired, tapped) = tokio::join!(hook.call_async(&()), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        hook.tap("late", |()| Ok(())).map(|_| ())
    });

    fired.unwrap();
    assert!(matches!(tapped, Err(HookError::ReentrantTap { .. })));
    assert_eq!(hook.tap_count(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Async parallel
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn parallel_taps_all_start_before_any_completes() {
    let hook: Hook<()> = Hook::new(HookName::Make, HookKind::AsyncParallel);
    let log = log();

    for (index, delay) in [30_u64, 10, 20].into_iter().enumerate() {
        let log = Arc::clone(&log);
        hook.tap_async(format!("tap-{index}"), move |()| {
            push(&log, format!("start-{index}"));
            let log = Arc::clone(&log);
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                push(&log, format!("end-{index}"));
                Ok(())
            }
        })
        .unwrap();
    }

    hook.call_parallel(&()).await.unwrap();

    let entries = log.lock().unwrap().clone();
    assert_eq!(&entries[..3], &["start-0", "start-1", "start-2"]);
    assert_eq!(&entries[3..], &["end-1", "end-2", "end-0"]);
}

#[tokio::test]
async fn parallel_failure_waits_for_every_tap_to_settle() {
    let hook: Hook<()> = Hook::new(HookName::Make, HookKind::AsyncParallel);
    let log = log();

    hook.tap_async("fails-fast", |()| async { Err("early".into()) })
        .unwrap();

    let slow_log = Arc::clone(&log);
    hook.tap_async("slow", move |()| {
        let log = Arc::clone(&slow_log);
        async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            push(&log, "slow finished");
            Ok(())
        }
    })
    .unwrap();

    hook.tap("sync-fails", |()| Err("sync".into())).unwrap();

    let err = hook.call_parallel(&()).await.unwrap_err();

    assert_eq!(*log.lock().unwrap(), vec!["slow finished"]);
    let HookError::ParallelFailed { hook: name, failures } = err else {
        panic!("expected ParallelFailed");
    };
    assert_eq!(name, HookName::Make);
    let failed: Vec<_> = failures.iter().map(|f| f.tap.as_str()).collect();
    assert_eq!(failed, vec!["fails-fast", "sync-fails"]);
}

#[tokio::test]
async fn parallel_fire_rejects_taps_while_in_flight() {
    let hook = Arc::new(Hook::<()>::new(HookName::Make, HookKind::AsyncParallel));
    let seen = Arc::new(Mutex::new(None));

    let inner = Arc::clone(&hook);
    let seen_clone = Arc::clone(&seen);
    hook.tap_async("registers-late", move |()| {
        let result = inner.tap("nested", |()| Ok(())).map(|_| ());
        *seen_clone.lock().unwrap() = Some(result);
        async { Ok(()) }
    })
    .unwrap();

    hook.call_parallel(&()).await.unwrap();

    let result = seen.lock().unwrap().take().unwrap();
    assert!(matches!(result, Err(HookError::ReentrantTap { .. })));
}

#[tokio::test]
async fn parallel_hook_with_no_taps_succeeds() {
    let hook: Hook<()> = Hook::new(HookName::Make, HookKind::AsyncParallel);
    hook.call_parallel(&()).await.unwrap();
}

#[tokio::test]
async fn events_are_passed_to_every_tap() {
    let hook: Hook<String> = Hook::new(HookName::Emit, HookKind::AsyncSeries);
    let log = log();

    let sync_log = Arc::clone(&log);
    hook.tap("sync", move |event: &String| {
        push(&sync_log, format!("sync:{event}"));
        Ok(())
    })
    .unwrap();

    let async_log = Arc::clone(&log);
    hook.tap_async("async", move |event: &String| {
        let entry = format!("async:{event}");
        let log = Arc::clone(&async_log);
        async move {
            push(&log, entry);
            Ok(())
        }
    })
    .unwrap();

    hook.call_async(&"bundle.js".to_string()).await.unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["sync:bundle.js", "async:bundle.js"]
    );
}
