//! # File pipeline
//!
//! Three workers turn words into files; one feedback sink keeps two logs.
//!
//! Shows how to:
//! - Build a [`PoolSpec`] from a closure processor and a stateful [`Feedback`] handler.
//! - Retry a flaky item with [`FailurePolicy::Retry`] and a [`BackoffPolicy`].
//! - Attach the built-in [`LogWriter`] and read the [`PoolReport`].
//!
//! ## Flow
//! ```text
//! TaskSource (words) ──► input channel ──► Worker 0..2 ──► <out>/<word>.txt
//!                                             │
//!                                             └─ FeedbackWriter::write(Written { .. })
//!                                                        │
//!                                    feedback channel ──► Journal ──► done.log, sizes.log
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=poolvisor=debug cargo run --example file_pipeline --features logging
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use poolvisor::{
    BackoffPolicy, Config, Executor, FailurePolicy, Feedback, FeedbackWriter, JitterPolicy,
    LogWriter, PoolReport, PoolSpec, ProcessFn, ProcessorRef, TaskError, TaskSource,
};

/// Feedback message: one file was written.
struct Written {
    word: String,
    bytes: usize,
}

/// Appends one line per written file to two logs.
struct Journal {
    done: tokio::fs::File,
    sizes: tokio::fs::File,
}

impl Journal {
    async fn open(dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            done: tokio::fs::File::create(dir.join("done.log")).await?,
            sizes: tokio::fs::File::create(dir.join("sizes.log")).await?,
        })
    }
}

#[async_trait]
impl Feedback<Written> for Journal {
    async fn on_feedback(&mut self, msg: Written) -> Result<(), TaskError> {
        let io = |e: std::io::Error| TaskError::fail(e.to_string());
        self.done
            .write_all(format!("{}\n", msg.word).as_bytes())
            .await
            .map_err(io)?;
        self.sizes
            .write_all(format!("{} {}\n", msg.word, msg.bytes).as_bytes())
            .await
            .map_err(io)
    }

    async fn finish(&mut self) -> Result<(), TaskError> {
        let io = |e: std::io::Error| TaskError::fail(e.to_string());
        self.done.flush().await.map_err(io)?;
        self.sizes.flush().await.map_err(io)
    }
}

/// Writes `<out>/<word>.txt` with the word reversed; the word "flaky" fails once.
fn writer(out: PathBuf) -> ProcessorRef<String, Written> {
    let tripped = Arc::new(AtomicBool::new(false));

    ProcessFn::arc(
        move |word: String, fb: FeedbackWriter<Written>, ctx: CancellationToken| {
            let path = out.join(format!("{word}.txt"));
            let tripped = tripped.clone();
            async move {
                if word == "flaky" && !tripped.swap(true, Ordering::SeqCst) {
                    return Err(TaskError::fail("transient write error"));
                }
                if ctx.is_cancelled() {
                    return Ok(());
                }
                let body: String = word.chars().rev().collect();
                tokio::fs::write(&path, &body)
                    .await
                    .map_err(|e| TaskError::fail(e.to_string()))?;
                fb.write(Written {
                    word,
                    bytes: body.len(),
                });
                Ok(())
            }
        },
    )
}

fn summary(report: &PoolReport) {
    println!(
        "fed={} processed={} failed={} markers={}",
        report.fed,
        report.processed(),
        report.failed(),
        report.markers_sent
    );
    for w in &report.workers {
        println!("  worker {}: processed={} exit={:?}", w.worker, w.processed, w.exit);
    }
    if let Some(sink) = report.sink.report() {
        println!("  sink: handled={} failed={}", sink.handled, sink.failed);
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("poolvisor=info")),
        )
        .init();

    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out");
    tokio::fs::create_dir(&out).await?;

    let words = [
        "alpha", "bravo", "charlie", "delta", "echo", "flaky", "golf", "hotel", "india", "juliet",
    ]
    .map(String::from);

    let spec = PoolSpec::new(
        3,
        writer(out.clone()),
        Journal::open(dir.path()).await?,
        TaskSource::iter(words),
    );

    let cfg = Config {
        failure: FailurePolicy::Retry { max_retries: 2 },
        backoff: BackoffPolicy {
            first: Duration::from_millis(20),
            max: Duration::from_millis(200),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        },
        timeout: Duration::from_secs(2),
        ..Config::default()
    };

    let report = Executor::builder(spec)
        .with_config(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build()?
        .perform()
        .await?;
    summary(&report);

    let done = tokio::fs::read_to_string(dir.path().join("done.log")).await?;
    println!("done.log has {} lines", done.lines().count());
    Ok(())
}
