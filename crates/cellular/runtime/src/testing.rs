//! Scripted cells for tests and demos

use crate::cell::{Cell, CellContext};
use crate::error::{CellError, CellResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bump the `calls` counter in the cell's data store.
fn count_call(ctx: &mut CellContext<'_>) {
    let calls = ctx
        .store
        .get("calls")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    ctx.store.insert("calls".into(), json!(calls + 1));
}

/// Returns its input unchanged.
#[derive(Debug, Default)]
pub struct EchoCell;

impl EchoCell {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Cell for EchoCell {
    fn cell_type(&self) -> &str {
        "echo"
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["echo".into()]
    }

    async fn process(&mut self, ctx: &mut CellContext<'_>, data: Value) -> CellResult<Value> {
        count_call(ctx);
        Ok(data)
    }
}

/// Fails every `process` call.
#[derive(Debug, Default)]
pub struct FailingCell;

impl FailingCell {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Cell for FailingCell {
    fn cell_type(&self) -> &str {
        "failing"
    }

    async fn process(&mut self, _ctx: &mut CellContext<'_>, _data: Value) -> CellResult<Value> {
        Err(CellError::processing("scripted failure"))
    }
}

/// Panics on every `process` call.
#[derive(Debug, Default)]
pub struct PanickingCell;

impl PanickingCell {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Cell for PanickingCell {
    fn cell_type(&self) -> &str {
        "panicking"
    }

    async fn process(&mut self, _ctx: &mut CellContext<'_>, _data: Value) -> CellResult<Value> {
        panic!("scripted panic")
    }
}

/// Sleeps before echoing.
#[derive(Debug)]
pub struct SlowCell {
    delay: Duration,
}

impl SlowCell {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Cell for SlowCell {
    fn cell_type(&self) -> &str {
        "slow"
    }

    async fn process(&mut self, ctx: &mut CellContext<'_>, data: Value) -> CellResult<Value> {
        tokio::time::sleep(self.delay).await;
        count_call(ctx);
        Ok(data)
    }
}

/// Echo cell with scriptable failures and lifecycle counters.
///
/// `process` fails when the payload has `"fail": true`.
#[derive(Debug, Default)]
pub struct ScriptedCell {
    fail_initialize: bool,
    fail_shutdown: bool,
    initialize_delay: Option<Duration>,
    initialized: Arc<AtomicUsize>,
    shut_down: Arc<AtomicUsize>,
}

impl ScriptedCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    /// Sleep for `delay` inside `initialize`.
    pub fn slow_initialize(mut self, delay: Duration) -> Self {
        self.initialize_delay = Some(delay);
        self
    }

    /// Counter bumped on every `initialize`
    pub fn initialize_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.initialized)
    }

    /// Counter bumped on every `shutdown`
    pub fn shutdown_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.shut_down)
    }
}

#[async_trait]
impl Cell for ScriptedCell {
    fn cell_type(&self) -> &str {
        "scripted"
    }

    async fn initialize(&mut self, _ctx: &mut CellContext<'_>) -> CellResult<()> {
        if let Some(delay) = self.initialize_delay {
            tokio::time::sleep(delay).await;
        }
        self.initialized.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize {
            return Err(CellError::Initialization("scripted failure".into()));
        }
        Ok(())
    }

    async fn process(&mut self, ctx: &mut CellContext<'_>, data: Value) -> CellResult<Value> {
        count_call(ctx);
        if data.get("fail").and_then(Value::as_bool) == Some(true) {
            return Err(CellError::processing("payload requested failure"));
        }
        Ok(json!({ "cell": ctx.id.as_str(), "input": data }))
    }

    async fn shutdown(&mut self, _ctx: &mut CellContext<'_>) -> CellResult<()> {
        self.shut_down.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdown {
            return Err(CellError::Shutdown("scripted failure".into()));
        }
        Ok(())
    }
}

/// Records the peak number of concurrent `process` calls.
#[derive(Debug)]
pub struct OverlapCell {
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl OverlapCell {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Highest number of overlapping `process` calls observed
    pub fn peak(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }
}

#[async_trait]
impl Cell for OverlapCell {
    fn cell_type(&self) -> &str {
        "overlap"
    }

    async fn process(&mut self, ctx: &mut CellContext<'_>, data: Value) -> CellResult<Value> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        count_call(ctx);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(data)
    }
}
