//! Fixed-interval sampling scheduler
//!
//! Drives the tick cadence for a bounded total duration. Each tick fans
//! out to all samplers concurrently, waits for completion or timeout,
//! evaluates the collected records, and appends one analysis entry to the
//! aggregator. Evaluation and aggregation are single-threaded per tick.
//!
//! Backpressure favors cadence stability over sample completeness: when a
//! tick overruns the interval, the next tick(s) are skipped outright and
//! counted, never queued.

use crate::analysis;
use crate::config::ThresholdConfig;
use crate::models::{AnalysisEntry, MetricRecord};
use crate::report::ReportAggregator;
use crate::sampler::Sampler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Scheduler lifecycle states. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// Configuration for the sampling schedule.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Tick cadence (default: 5 seconds).
    pub interval: Duration,
    /// Total run length (default: 300 seconds).
    pub duration: Duration,
    /// Per-sampler timeout within a tick (default: 2 seconds).
    pub sampler_timeout: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            duration: Duration::from_secs(300),
            sampler_timeout: Duration::from_secs(2),
        }
    }
}

/// Drives sampling ticks and hands results to the aggregator.
pub struct Scheduler {
    samplers: Vec<Arc<dyn Sampler>>,
    config: ScheduleConfig,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(samplers: Vec<Arc<dyn Sampler>>, config: ScheduleConfig) -> Self {
        Self {
            samplers,
            config,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run the full sampling schedule, appending one analysis entry per
    /// tick until the configured duration elapses or shutdown is
    /// signalled. Shutdown is observed between ticks, so an in-flight
    /// sampler always finishes or times out cleanly.
    pub async fn run(
        &mut self,
        thresholds: &ThresholdConfig,
        aggregator: &ReportAggregator,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        self.state = SchedulerState::Running;
        info!(
            interval_secs = self.config.interval.as_secs(),
            duration_secs = self.config.duration.as_secs(),
            samplers = self.samplers.len(),
            "Starting monitoring schedule"
        );

        let started = Instant::now();
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if started.elapsed() >= self.config.duration {
                        self.state = SchedulerState::Draining;
                        debug!("Run duration reached, draining");
                        break;
                    }

                    let tick_started = Instant::now();
                    let timestamp = chrono::Utc::now();

                    let records = self.sample_all().await;
                    let issues = analysis::evaluate(&records, thresholds);
                    if !issues.is_empty() {
                        warn!(count = issues.len(), "Detected potential bottlenecks");
                    }

                    if let Err(error) = aggregator.append(AnalysisEntry { timestamp, issues }) {
                        warn!(error = %error, "Aggregator rejected entry, stopping");
                        break;
                    }

                    // Overrunning ticks cause the ticker to skip; count them.
                    let tick_elapsed = tick_started.elapsed();
                    if tick_elapsed > self.config.interval {
                        let skipped = (tick_elapsed.as_secs_f64()
                            / self.config.interval.as_secs_f64())
                            as u64;
                        aggregator.record_skipped_ticks(skipped);
                        warn!(
                            elapsed_ms = tick_elapsed.as_millis(),
                            skipped,
                            "Tick overran the interval, skipping"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutdown signal received, stopping schedule");
                    self.state = SchedulerState::Stopped;
                    return;
                }
            }
        }

        self.state = SchedulerState::Stopped;
        info!(
            data_points = aggregator.data_points(),
            skipped_ticks = aggregator.skipped_ticks(),
            "Monitoring schedule complete"
        );
    }

    /// Fan out to all samplers concurrently and fan the records back in.
    /// A failed or timed-out sampler contributes nothing for this tick.
    async fn sample_all(&self) -> Vec<MetricRecord> {
        let tasks: Vec<_> = self
            .samplers
            .iter()
            .map(|sampler| {
                let sampler = Arc::clone(sampler);
                let sampler_timeout = self.config.sampler_timeout;
                tokio::spawn(async move {
                    match timeout(sampler_timeout, sampler.sample()).await {
                        Ok(Ok(records)) => records,
                        Ok(Err(error)) => {
                            debug!(sampler = sampler.name(), error = %error, "Sampler failed");
                            Vec::new()
                        }
                        Err(_) => {
                            warn!(
                                sampler = sampler.name(),
                                timeout_ms = sampler_timeout.as_millis(),
                                "Sampler timed out"
                            );
                            Vec::new()
                        }
                    }
                })
            })
            .collect();

        let mut records = Vec::new();
        for task in tasks {
            match task.await {
                Ok(mut sampled) => records.append(&mut sampled),
                Err(error) => warn!(error = %error, "Sampler task panicked"),
            }
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricRecord, ResourceKind};
    use crate::sampler::SampleError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sampler returning a fixed value for one resource family.
    struct FixedSampler {
        kind: ResourceKind,
        value: f64,
        calls: AtomicUsize,
    }

    impl FixedSampler {
        fn new(kind: ResourceKind, value: f64) -> Self {
            Self {
                kind,
                value,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Sampler for FixedSampler {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn sample(&self) -> Result<Vec<MetricRecord>, SampleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![MetricRecord::new(self.kind, self.value, "fixed")])
        }
    }

    /// Sampler that never completes within any reasonable timeout.
    struct StuckSampler;

    #[async_trait]
    impl Sampler for StuckSampler {
        fn name(&self) -> &'static str {
            "stuck"
        }

        async fn sample(&self) -> Result<Vec<MetricRecord>, SampleError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    /// Sampler whose work overruns the tick interval.
    struct SlowSampler {
        delay: Duration,
    }

    #[async_trait]
    impl Sampler for SlowSampler {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn sample(&self) -> Result<Vec<MetricRecord>, SampleError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![MetricRecord::new(ResourceKind::Cpu, 10.0, "slow")])
        }
    }

    fn config(interval_secs: u64, duration_secs: u64) -> ScheduleConfig {
        ScheduleConfig {
            interval: Duration::from_secs(interval_secs),
            duration: Duration::from_secs(duration_secs),
            sampler_timeout: Duration::from_secs(2),
        }
    }

    fn shutdown_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
        broadcast::channel(1)
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_interval_yield_expected_ticks() {
        let samplers: Vec<Arc<dyn Sampler>> =
            vec![Arc::new(FixedSampler::new(ResourceKind::Cpu, 20.0))];
        let mut scheduler = Scheduler::new(samplers, config(5, 10));
        let aggregator = ReportAggregator::new();
        let (_tx, rx) = shutdown_channel();

        scheduler.run(&ThresholdConfig::default(), &aggregator, rx).await;

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(aggregator.data_points(), 2);
        assert_eq!(aggregator.skipped_ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_ticks_still_recorded() {
        let samplers: Vec<Arc<dyn Sampler>> =
            vec![Arc::new(FixedSampler::new(ResourceKind::Memory, 10.0))];
        let mut scheduler = Scheduler::new(samplers, config(5, 15));
        let aggregator = ReportAggregator::new();
        let (_tx, rx) = shutdown_channel();

        scheduler.run(&ThresholdConfig::default(), &aggregator, rx).await;

        let report = aggregator
            .finalize(&crate::models::SystemIdentity::new("Linux", "test"), "15 seconds")
            .unwrap();
        assert_eq!(report.data_points, 3);
        assert!(report.analysis.iter().all(|entry| entry.issues.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaches_produce_issues() {
        // 95 is 15 points over the default CPU limit of 80
        let samplers: Vec<Arc<dyn Sampler>> =
            vec![Arc::new(FixedSampler::new(ResourceKind::Cpu, 95.0))];
        let mut scheduler = Scheduler::new(samplers, config(5, 10));
        let aggregator = ReportAggregator::new();
        let (_tx, rx) = shutdown_channel();

        scheduler.run(&ThresholdConfig::default(), &aggregator, rx).await;

        let report = aggregator
            .finalize(&crate::models::SystemIdentity::new("Linux", "test"), "10 seconds")
            .unwrap();
        for entry in &report.analysis {
            assert_eq!(entry.issues.len(), 1);
            assert_eq!(entry.issues[0].kind, ResourceKind::Cpu);
            assert_eq!(entry.issues[0].severity, crate::models::Severity::High);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_sampler_contributes_nothing() {
        let samplers: Vec<Arc<dyn Sampler>> = vec![
            Arc::new(FixedSampler::new(ResourceKind::Memory, 95.0)),
            Arc::new(StuckSampler),
        ];
        let mut scheduler = Scheduler::new(samplers, config(5, 15));
        let aggregator = ReportAggregator::new();
        let (_tx, rx) = shutdown_channel();

        scheduler.run(&ThresholdConfig::default(), &aggregator, rx).await;

        // Every tick is still recorded; the stuck sampler's family never
        // produces an issue.
        let report = aggregator
            .finalize(&crate::models::SystemIdentity::new("Linux", "test"), "15 seconds")
            .unwrap();
        assert_eq!(report.data_points, 3);
        for entry in &report.analysis {
            assert_eq!(entry.issues.len(), 1);
            assert_eq!(entry.issues[0].kind, ResourceKind::Memory);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timestamps_non_decreasing() {
        let samplers: Vec<Arc<dyn Sampler>> =
            vec![Arc::new(FixedSampler::new(ResourceKind::Cpu, 10.0))];
        let mut scheduler = Scheduler::new(samplers, config(5, 25));
        let aggregator = ReportAggregator::new();
        let (_tx, rx) = shutdown_channel();

        scheduler.run(&ThresholdConfig::default(), &aggregator, rx).await;

        let report = aggregator
            .finalize(&crate::models::SystemIdentity::new("Linux", "test"), "25 seconds")
            .unwrap();
        for pair in report.analysis.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_tick_skips_next() {
        // Each tick takes 7s against a 5s interval: ticks fire at 0, 10
        // and the run ends at 20, so two entries and two skipped ticks.
        let samplers: Vec<Arc<dyn Sampler>> = vec![Arc::new(SlowSampler {
            delay: Duration::from_secs(7),
        })];
        let mut scheduler = Scheduler::new(
            samplers,
            ScheduleConfig {
                interval: Duration::from_secs(5),
                duration: Duration::from_secs(20),
                sampler_timeout: Duration::from_secs(10),
            },
        );
        let aggregator = ReportAggregator::new();
        let (_tx, rx) = shutdown_channel();

        scheduler.run(&ThresholdConfig::default(), &aggregator, rx).await;

        assert_eq!(aggregator.data_points(), 2);
        assert_eq!(aggregator.skipped_ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_yields_partial_run() {
        let samplers: Vec<Arc<dyn Sampler>> =
            vec![Arc::new(FixedSampler::new(ResourceKind::Cpu, 10.0))];
        let mut scheduler = Scheduler::new(samplers, config(5, 300));
        let aggregator = ReportAggregator::new();
        let (tx, rx) = shutdown_channel();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            let _ = tx.send(());
        });

        scheduler.run(&ThresholdConfig::default(), &aggregator, rx).await;
        stopper.await.unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        // Ticks at 0, 5, 10 before the shutdown lands
        let data_points = aggregator.data_points();
        assert!(data_points >= 1 && data_points <= 3);

        // A partial report is still a valid report
        let report = aggregator
            .finalize(&crate::models::SystemIdentity::new("Linux", "test"), "partial")
            .unwrap();
        assert_eq!(report.data_points, data_points);
    }
}
