use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use poolvisor::{
    BackoffPolicy, Config, Executor, FailurePolicy, Feedback, FeedbackFn, FeedbackWriter,
    PoolSpec, ProcessFn, ProcessorRef, RuntimeError, SinkMode, SinkOutcome, TaskError, TaskSource,
    WorkerExit,
};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Appends every feedback line to two log files.
struct TwoLogs {
    done: tokio::fs::File,
    audit: tokio::fs::File,
}

impl TwoLogs {
    async fn create(dir: &std::path::Path) -> std::io::Result<Self> {
        Ok(Self {
            done: tokio::fs::File::create(dir.join("done.log")).await?,
            audit: tokio::fs::File::create(dir.join("audit.log")).await?,
        })
    }
}

#[async_trait]
impl Feedback<String> for TwoLogs {
    async fn on_feedback(&mut self, line: String) -> Result<(), TaskError> {
        let io = |e: std::io::Error| TaskError::fail(e.to_string());
        self.done
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(io)?;
        self.audit
            .write_all(format!("handled {line}\n").as_bytes())
            .await
            .map_err(io)?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), TaskError> {
        let io = |e: std::io::Error| TaskError::fail(e.to_string());
        self.done.flush().await.map_err(io)?;
        self.audit.flush().await.map_err(io)
    }
}

/// Collects feedback messages in arrival order.
fn collector<F: Send + 'static>(seen: Arc<Mutex<Vec<F>>>) -> impl Feedback<F> {
    FeedbackFn::new(move |msg: F| {
        seen.lock().unwrap().push(msg);
        async { Ok::<_, TaskError>(()) }
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_workers_write_one_file_per_item_and_two_logs() {
    let dir = tempfile::tempdir().unwrap();
    let out: PathBuf = dir.path().join("out");
    tokio::fs::create_dir(&out).await.unwrap();

    let items: Vec<String> = (0..10).map(|i| format!("item-{i}")).collect();
    let target = out.clone();
    let processor: ProcessorRef<String, String> = ProcessFn::arc(
        move |name: String, fb: FeedbackWriter<String>, _ctx: CancellationToken| {
            let path = target.join(format!("{name}.txt"));
            async move {
                tokio::fs::write(&path, name.to_uppercase())
                    .await
                    .map_err(|e| TaskError::fail(e.to_string()))?;
                fb.write(name);
                Ok::<_, TaskError>(())
            }
        },
    );

    let spec = PoolSpec::new(
        3,
        processor,
        TwoLogs::create(dir.path()).await.unwrap(),
        TaskSource::iter(items.clone()),
    );
    let report = Executor::new(spec).unwrap().perform().await.unwrap();

    assert_eq!(report.fed, 10);
    assert_eq!(report.markers_sent, 3);
    assert_eq!(report.workers.len(), 3);
    assert_eq!(report.processed(), 10);
    assert_eq!(report.failed(), 0);
    assert!(report
        .workers
        .iter()
        .all(|w| w.exit == WorkerExit::Drained));
    let sink = report.sink.report().cloned().unwrap();
    assert_eq!((sink.handled, sink.failed), (10, 0));

    for name in &items {
        let body = tokio::fs::read_to_string(out.join(format!("{name}.txt")))
            .await
            .unwrap();
        assert_eq!(body, name.to_uppercase());
    }

    let done = tokio::fs::read_to_string(dir.path().join("done.log")).await.unwrap();
    let audit = tokio::fs::read_to_string(dir.path().join("audit.log")).await.unwrap();
    assert_eq!(done.lines().count(), 10);
    assert_eq!(audit.lines().count(), 10);

    let mut logged: Vec<&str> = done.lines().collect();
    logged.sort_unstable();
    let mut expected: Vec<&str> = items.iter().map(String::as_str).collect();
    expected.sort_unstable();
    assert_eq!(logged, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_source_returns_promptly_with_no_feedback() {
    let seen = Arc::new(Mutex::new(Vec::<u32>::new()));
    let spec = PoolSpec::new(
        1,
        ProcessFn::arc(|n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| async move {
            fb.write(n);
            Ok::<_, TaskError>(())
        }),
        collector(seen.clone()),
        TaskSource::empty(),
    );

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        Executor::new(spec).unwrap().perform(),
    )
    .await
    .expect("perform should return promptly")
    .unwrap();

    assert_eq!(report.fed, 0);
    assert_eq!(report.markers_sent, 1);
    assert_eq!(report.workers[0].exit, WorkerExit::Drained);
    assert!(seen.lock().unwrap().is_empty());
}

fn failing_on_three(seen_items: Arc<Mutex<Vec<u32>>>) -> ProcessorRef<u32, u32> {
    ProcessFn::arc(
        move |n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| {
            seen_items.lock().unwrap().push(n);
            async move {
                if n == 3 {
                    return Err(TaskError::fail("three is not allowed"));
                }
                fb.write(n);
                Ok(())
            }
        },
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn one_failing_item_with_exit_policy_leaves_others_running() {
    let attempted = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let spec = PoolSpec::new(
        5,
        failing_on_three(attempted.clone()),
        collector(seen.clone()),
        TaskSource::iter(0..20u32),
    );
    let cfg = Config {
        failure: FailurePolicy::Exit,
        ..Config::default()
    };

    let report = Executor::builder(spec)
        .with_config(cfg)
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();

    assert_eq!(report.markers_sent, 5);
    assert_eq!(report.crashed(), 1);
    assert_eq!(report.failed(), 1);
    let crashed = report.workers.iter().find(|w| w.is_crashed()).unwrap();
    assert!(matches!(&crashed.exit, WorkerExit::Crashed { error } if error.contains("three")));

    // The survivors consumed every remaining item; the crashed worker's marker is left over.
    assert_eq!(report.processed(), 19);
    assert_eq!(attempted.lock().unwrap().len(), 20);
    assert_eq!(seen.lock().unwrap().len(), 19);
}

#[tokio::test(flavor = "multi_thread")]
async fn one_failing_item_with_skip_policy_keeps_every_worker() {
    let attempted = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let spec = PoolSpec::new(
        5,
        failing_on_three(attempted),
        collector(seen.clone()),
        TaskSource::iter(0..20u32),
    );

    let report = Executor::new(spec).unwrap().perform().await.unwrap();

    assert_eq!(report.crashed(), 0);
    assert_eq!((report.processed(), report.failed()), (19, 1));
    let mut got = seen.lock().unwrap().clone();
    got.sort_unstable();
    assert_eq!(got, (0..20).filter(|&n| n != 3).collect::<Vec<u32>>());
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_workers_rejected_before_spawning() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let spec = PoolSpec::new(
        0,
        ProcessFn::arc(move |_n: u32, _fb: FeedbackWriter<u32>, _ctx: CancellationToken| {
            c.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, TaskError>(()) }
        }),
        FeedbackFn::new(|_n: u32| async { Ok::<_, TaskError>(()) }),
        TaskSource::iter(0..3u32),
    );

    let res = Executor::new(spec);
    assert!(matches!(res, Err(RuntimeError::InvalidConfig { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn flaky_item_succeeds_on_retry() {
    let attempts = Arc::new(AtomicU32::new(0));
    let a = attempts.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let spec = PoolSpec::new(
        2,
        ProcessFn::arc(move |n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| {
            let first_tries = n == 1 && a.fetch_add(1, Ordering::SeqCst) < 2;
            async move {
                if first_tries {
                    return Err(TaskError::fail("transient"));
                }
                fb.write(n);
                Ok(())
            }
        }),
        collector(seen.clone()),
        TaskSource::iter([0u32, 1, 2]),
    );
    let cfg = Config {
        failure: FailurePolicy::Retry { max_retries: 3 },
        backoff: BackoffPolicy {
            first: Duration::from_millis(1),
            max: Duration::from_millis(5),
            ..BackoffPolicy::default()
        },
        ..Config::default()
    };

    let report = Executor::builder(spec)
        .with_config(cfg)
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();

    assert_eq!((report.processed(), report.failed()), (3, 0));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    let mut got = seen.lock().unwrap().clone();
    got.sort_unstable();
    assert_eq!(got, vec![0, 1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_item_times_out_and_is_skipped() {
    let spec = PoolSpec::new(
        2,
        ProcessFn::arc(|n: u32, fb: FeedbackWriter<u32>, ctx: CancellationToken| async move {
            if n == 0 {
                ctx.cancelled().await;
                return Ok(());
            }
            fb.write(n);
            Ok::<_, TaskError>(())
        }),
        FeedbackFn::new(|_n: u32| async { Ok::<_, TaskError>(()) }),
        TaskSource::iter(0..4u32),
    );
    let cfg = Config {
        timeout: Duration::from_millis(50),
        ..Config::default()
    };

    let report = Executor::builder(spec)
        .with_config(cfg)
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();

    assert_eq!((report.processed(), report.failed()), (3, 1));
    assert_eq!(report.crashed(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn source_failure_still_shuts_everything_down() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let items: Vec<Result<u32, std::io::Error>> = vec![
        Ok(1),
        Ok(2),
        Err(std::io::Error::other("disk went away")),
        Ok(3),
    ];
    let spec = PoolSpec::new(
        2,
        ProcessFn::arc(|n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| async move {
            fb.write(n);
            Ok::<_, TaskError>(())
        }),
        collector(seen.clone()),
        TaskSource::try_iter(items),
    );

    let err = Executor::new(spec).unwrap().perform().await.unwrap_err();
    match err {
        RuntimeError::SourceFailed { error, fed } => {
            assert_eq!(fed, 2);
            assert!(error.contains("disk went away"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Barrier mode: both fed items were handled before perform returned.
    let mut got = seen.lock().unwrap().clone();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn detached_sink_handle_can_be_awaited() {
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let release = Arc::new(tokio::sync::Mutex::new(Some(release_rx)));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = seen.clone();

    let spec = PoolSpec::new(
        2,
        ProcessFn::arc(|n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| async move {
            fb.write(n);
            Ok::<_, TaskError>(())
        }),
        FeedbackFn::new(move |n: u32| {
            let release = release.clone();
            let seen = seen_in.clone();
            async move {
                if let Some(rx) = release.lock().await.take() {
                    let _ = rx.await;
                }
                seen.lock().unwrap().push(n);
                Ok::<_, TaskError>(())
            }
        }),
        TaskSource::iter(0..5u32),
    );
    let cfg = Config {
        sink: SinkMode::Detached,
        ..Config::default()
    };

    let report = Executor::builder(spec)
        .with_config(cfg)
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap();

    // The sink is parked on its first message, so nothing was handled yet.
    assert!(matches!(report.sink, SinkOutcome::Detached(_)));
    assert!(seen.lock().unwrap().is_empty());

    release_tx.send(()).unwrap();
    let sink = report.sink.join().await.unwrap();
    assert_eq!((sink.handled, sink.failed), (5, 0));
    assert_eq!(seen.lock().unwrap().len(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn sink_exceeding_grace_is_aborted() {
    let spec = PoolSpec::new(
        1,
        ProcessFn::arc(|n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| async move {
            fb.write(n);
            Ok::<_, TaskError>(())
        }),
        FeedbackFn::new(|_n: u32| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, TaskError>(())
        }),
        TaskSource::iter([1u32]),
    );
    let cfg = Config {
        grace: Duration::from_millis(50),
        ..Config::default()
    };

    let err = Executor::builder(spec)
        .with_config(cfg)
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::GraceExceeded { grace } if grace == Duration::from_millis(50)));
}

#[tokio::test(flavor = "multi_thread")]
async fn feedback_from_one_worker_keeps_its_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let spec = PoolSpec::new(
        1,
        ProcessFn::arc(|n: u32, fb: FeedbackWriter<(u32, u32)>, _ctx: CancellationToken| async move {
            for step in 0..3 {
                fb.write((n, step));
                tokio::task::yield_now().await;
            }
            Ok::<_, TaskError>(())
        }),
        collector(seen.clone()),
        TaskSource::iter(0..10u32),
    );

    Executor::new(spec).unwrap().perform().await.unwrap();

    let expected: Vec<(u32, u32)> = (0..10).flat_map(|n| (0..3).map(move |s| (n, s))).collect();
    assert_eq!(*seen.lock().unwrap(), expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn source_failure_wins_over_a_sink_that_overruns_its_grace() {
    let items: Vec<Result<u32, std::io::Error>> = vec![Ok(1), Err(std::io::Error::other("boom"))];
    let spec = PoolSpec::new(
        2,
        ProcessFn::arc(|n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| async move {
            fb.write(n);
            Ok::<_, TaskError>(())
        }),
        FeedbackFn::new(|_n: u32| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, TaskError>(())
        }),
        TaskSource::try_iter(items),
    );
    let cfg = Config {
        grace: Duration::from_millis(50),
        ..Config::default()
    };

    let err = Executor::builder(spec)
        .with_config(cfg)
        .build()
        .unwrap()
        .perform()
        .await
        .unwrap_err();
    match err {
        RuntimeError::SourceFailed { error, fed } => {
            assert_eq!(fed, 1);
            assert!(error.contains("boom"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn each_item_keeps_its_feedback_order_across_workers() {
    const WORKERS: usize = 4;
    const ITEMS: u32 = 40;
    const STEPS: u32 = 5;

    // The first WORKERS items sit on distinct workers and meet here after step 0,
    // so their messages are guaranteed to interleave in the sink.
    let rendezvous = Arc::new(tokio::sync::Barrier::new(WORKERS));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let spec = PoolSpec::new(
        WORKERS,
        ProcessFn::arc(move |n: u32, fb: FeedbackWriter<(u32, u32)>, _ctx: CancellationToken| {
            let rendezvous = rendezvous.clone();
            async move {
                for step in 0..STEPS {
                    fb.write((n, step));
                    if step == 0 && n < WORKERS as u32 {
                        rendezvous.wait().await;
                    }
                    tokio::task::yield_now().await;
                }
                Ok::<_, TaskError>(())
            }
        }),
        collector(seen.clone()),
        TaskSource::iter(0..ITEMS),
    );

    let report = Executor::new(spec).unwrap().perform().await.unwrap();
    assert_eq!(report.processed(), ITEMS as u64);

    let got = seen.lock().unwrap().clone();
    assert_eq!(got.len(), (ITEMS * STEPS) as usize);

    let first_step_one = got
        .iter()
        .position(|&(n, step)| n < WORKERS as u32 && step == 1)
        .unwrap();
    let step_zero_before = got[..first_step_one]
        .iter()
        .filter(|&&(n, step)| n < WORKERS as u32 && step == 0)
        .count();
    assert_eq!(step_zero_before, WORKERS, "items did not interleave");

    let mut per_item: HashMap<u32, Vec<u32>> = HashMap::new();
    for (n, step) in got {
        per_item.entry(n).or_default().push(step);
    }
    assert_eq!(per_item.len(), ITEMS as usize);
    let in_order: Vec<u32> = (0..STEPS).collect();
    for (n, steps) in per_item {
        assert_eq!(steps, in_order, "feedback of item {n} out of order");
    }
}

#[tokio::test(flavor = "current_thread")]
async fn workers_run_while_the_source_is_still_feeding() {
    const ITEMS: u32 = 5_000;

    let processed = Arc::new(AtomicU32::new(0));
    let at_last_pull = Arc::new(AtomicU32::new(0));
    let (counted, snapshot) = (processed.clone(), at_last_pull.clone());
    let source = TaskSource::iter((0..ITEMS).map(move |n| {
        if n == ITEMS - 1 {
            snapshot.store(counted.load(Ordering::SeqCst), Ordering::SeqCst);
        }
        n
    }));

    let counter = processed.clone();
    let spec = PoolSpec::new(
        2,
        ProcessFn::arc(move |_n: u32, _fb: FeedbackWriter<()>, _ctx: CancellationToken| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TaskError>(())
            }
        }),
        FeedbackFn::new(|_: ()| async { Ok::<_, TaskError>(()) }),
        source,
    );

    let report = Executor::new(spec).unwrap().perform().await.unwrap();
    assert_eq!(report.processed(), ITEMS as u64);
    assert_eq!(processed.load(Ordering::SeqCst), ITEMS);
    assert!(
        at_last_pull.load(Ordering::SeqCst) > 0,
        "no item was processed before the source ran dry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_executors_do_not_interfere() {
    fn run(offset: u32, seen: Arc<Mutex<Vec<u32>>>) -> Executor<u32, u32> {
        let spec = PoolSpec::new(
            3,
            ProcessFn::arc(move |n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| async move {
                fb.write(n + offset);
                Ok::<_, TaskError>(())
            }),
            collector(seen),
            TaskSource::iter(0..50u32),
        );
        Executor::new(spec).unwrap()
    }

    let left = Arc::new(Mutex::new(Vec::new()));
    let right = Arc::new(Mutex::new(Vec::new()));
    let (a, b) = tokio::join!(
        run(0, left.clone()).perform(),
        run(1000, right.clone()).perform()
    );
    assert_eq!(a.unwrap().processed(), 50);
    assert_eq!(b.unwrap().processed(), 50);

    let mut l = left.lock().unwrap().clone();
    let mut r = right.lock().unwrap().clone();
    l.sort_unstable();
    r.sort_unstable();
    assert_eq!(l, (0..50).collect::<Vec<_>>());
    assert_eq!(r, (1000..1050).collect::<Vec<_>>());
}
