// 進捗監視の具象実装

use crate::core::{CallSummary, ErrorSeverity, OrderingPolicy, ProgressReporter, RunnerError};

/// tracingによる進捗報告実装
#[derive(Debug, Clone)]
pub struct TracingProgressReporter {
    interval: u64,
}

impl TracingProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `interval`件ごとに進捗を出力（0は進捗出力なし）
    pub fn with_interval(interval: u64) -> Self {
        Self { interval }
    }
}

impl Default for TracingProgressReporter {
    fn default() -> Self {
        Self { interval: 100 }
    }
}

impl ProgressReporter for TracingProgressReporter {
    fn report_started(&self, call_id: u64, policy: OrderingPolicy) {
        tracing::info!(call_id, %policy, "call started");
    }

    fn report_progress(&self, call_id: u64, consumed: u64) {
        if self.interval > 0 && consumed % self.interval == 0 {
            tracing::info!(call_id, consumed, "progress");
        }
    }

    fn report_error(&self, error: &RunnerError) {
        let severity = error.severity();
        if severity >= ErrorSeverity::High {
            tracing::error!(severity = severity.as_str(), "{error}");
        } else {
            tracing::warn!(severity = severity.as_str(), "{error}");
        }
    }

    fn report_completed(&self, summary: &CallSummary) {
        tracing::info!(
            call_id = summary.call_id,
            items = summary.total_items,
            policy = %summary.policy,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "call completed"
        );
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NoOpProgressReporter {
    fn report_started(&self, _call_id: u64, _policy: OrderingPolicy) {
        // 何もしない
    }

    fn report_progress(&self, _call_id: u64, _consumed: u64) {
        // 何もしない
    }

    fn report_error(&self, _error: &RunnerError) {
        // 何もしない
    }

    fn report_completed(&self, _summary: &CallSummary) {
        // 何もしない
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn summary() -> CallSummary {
        CallSummary {
            call_id: 1,
            total_items: 10,
            policy: OrderingPolicy::Unordered,
            elapsed: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_tracing_reporter_does_not_panic() {
        let reporter = TracingProgressReporter::with_interval(5);

        reporter.report_started(1, OrderingPolicy::Ordered);
        for consumed in 1..=10 {
            reporter.report_progress(1, consumed);
        }
        reporter.report_error(&RunnerError::channel("切断"));
        reporter.report_error(&RunnerError::work(crate::core::HookFailure::new(
            crate::core::HookKind::ProducerWork,
            anyhow::anyhow!("失敗"),
        )));
        reporter.report_completed(&summary());
    }

    #[test]
    fn test_zero_interval_disables_progress() {
        let reporter = TracingProgressReporter::with_interval(0);
        reporter.report_progress(1, 0);
        reporter.report_progress(1, 100);
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = NoOpProgressReporter::new();

        reporter.report_started(1, OrderingPolicy::Unordered);
        reporter.report_progress(1, 1);
        reporter.report_error(&RunnerError::channel("切断"));
        reporter.report_completed(&summary());
    }

    #[test]
    fn test_boxed_reporter_delegates() {
        let mut mock = crate::core::MockProgressReporter::new();
        mock.expect_report_started().times(1).return_const(());
        mock.expect_report_progress().times(2).return_const(());
        mock.expect_report_completed()
            .withf(|s| s.total_items == 10)
            .times(1)
            .return_const(());

        let boxed: Box<dyn ProgressReporter> = Box::new(mock);
        boxed.report_started(1, OrderingPolicy::Ordered);
        boxed.report_progress(1, 1);
        boxed.report_progress(1, 2);
        boxed.report_completed(&summary());
    }
}
