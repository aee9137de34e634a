use std::time::{Duration, Instant};

#[cfg(not(target_arch = "wasm32"))]
use std::sync::{Arc, Mutex, PoisonError};
#[cfg(not(target_arch = "wasm32"))]
use sysinfo::{get_current_pid, Pid, ProcessRefreshKind, RefreshKind, System};
#[cfg(not(target_arch = "wasm32"))]
use tokio::task::JoinHandle;
#[cfg(not(target_arch = "wasm32"))]
use tokio::time::MissedTickBehavior;

const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/// Wall-clock time and peak memory of one transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Time from reading input to writing output
    pub wall_time: Duration,
    /// Peak resident set size observed while transforming, when available
    pub peak_rss_bytes: Option<u64>,
}

/// Measures one transformation window.
///
/// Memory is sampled when the window opens and closes, and on an interval
/// from a task on the current tokio runtime while the transform awaits.
pub(crate) struct RuntimeMeasurement {
    start: Instant,
    #[cfg(not(target_arch = "wasm32"))]
    sampler: Option<RssSampler>,
}

impl RuntimeMeasurement {
    pub(crate) fn begin() -> Self {
        Self {
            start: Instant::now(),
            #[cfg(not(target_arch = "wasm32"))]
            sampler: RssSampler::start(SAMPLE_INTERVAL),
        }
    }

    pub(crate) fn finish(mut self) -> RuntimeStats {
        let wall_time = self.start.elapsed();

        #[cfg(not(target_arch = "wasm32"))]
        let peak_rss_bytes = self
            .sampler
            .take()
            .map(RssSampler::stop)
            .filter(|bytes| *bytes > 0);

        #[cfg(target_arch = "wasm32")]
        let peak_rss_bytes = None;

        RuntimeStats {
            wall_time,
            peak_rss_bytes,
        }
    }
}

/// Resident set size of this process, tracking the highest value seen.
#[cfg(not(target_arch = "wasm32"))]
struct RssGauge {
    system: System,
    pid: Pid,
    peak: u64,
}

#[cfg(not(target_arch = "wasm32"))]
impl RssGauge {
    fn new() -> Option<Self> {
        let pid = get_current_pid().ok()?;
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::new()),
        );
        Some(Self {
            system,
            pid,
            peak: 0,
        })
    }

    fn sample(&mut self) {
        self.system
            .refresh_process_specifics(self.pid, ProcessRefreshKind::new().with_memory());
        if let Some(process) = self.system.process(self.pid) {
            self.peak = self.peak.max(process.memory());
        }
    }
}

/// Interval task on the ambient tokio runtime feeding a shared gauge.
#[cfg(not(target_arch = "wasm32"))]
struct RssSampler {
    gauge: Arc<Mutex<RssGauge>>,
    task: Option<JoinHandle<()>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl RssSampler {
    fn start(interval: Duration) -> Option<Self> {
        let mut gauge = RssGauge::new()?;
        gauge.sample();
        let gauge = Arc::new(Mutex::new(gauge));

        // Outside a runtime only the opening and closing samples are taken.
        let task = tokio::runtime::Handle::try_current().ok().map(|handle| {
            let gauge = Arc::clone(&gauge);
            handle.spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    gauge
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .sample();
                }
            })
        });

        Some(Self { gauge, task })
    }

    fn stop(mut self) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut gauge = self.gauge.lock().unwrap_or_else(PoisonError::into_inner);
        gauge.sample();
        gauge.peak
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Drop for RssSampler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
