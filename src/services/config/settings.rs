// ランナー設定の具象実装

use crate::core::{RunnerError, RunnerResult};
use std::time::Duration;

pub const QUEUE_SCALE_ENV: &str = "PARALLEL_RUNNER_QUEUE_SCALE";
pub const GRACE_MS_ENV: &str = "PARALLEL_RUNNER_GRACE_MS";
pub const PROGRESS_INTERVAL_ENV: &str = "PARALLEL_RUNNER_PROGRESS_INTERVAL";

/// キュー1本あたりの容量上限
pub const MAX_QUEUE_CAPACITY: usize = 1 << 16;

/// キュー容量・終了猶予・進捗報告間隔
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    queue_scale: f64,
    grace_period: Duration,
    progress_interval: u64,
}

impl RunnerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue_scale(mut self, queue_scale: f64) -> Self {
        self.queue_scale = queue_scale;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    /// 環境変数で上書きした設定
    pub fn from_env() -> RunnerResult<Self> {
        Self::default().overlay(|name| std::env::var(name).ok())
    }

    /// `lookup`が返す値で各項目を上書き
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> RunnerResult<Self> {
        if let Some(raw) = lookup(QUEUE_SCALE_ENV) {
            self.queue_scale = raw.trim().parse().map_err(|_| {
                RunnerError::configuration(format!("{QUEUE_SCALE_ENV}が数値ではありません: {raw}"))
            })?;
        }
        if let Some(raw) = lookup(GRACE_MS_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                RunnerError::configuration(format!("{GRACE_MS_ENV}が整数ではありません: {raw}"))
            })?;
            self.grace_period = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup(PROGRESS_INTERVAL_ENV) {
            self.progress_interval = raw.trim().parse().map_err(|_| {
                RunnerError::configuration(format!(
                    "{PROGRESS_INTERVAL_ENV}が整数ではありません: {raw}"
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if !self.queue_scale.is_finite() || self.queue_scale <= 0.0 {
            return Err(RunnerError::configuration(format!(
                "queue_scaleは正の有限値である必要があります: {}",
                self.queue_scale
            )));
        }
        if self.queue_scale > MAX_QUEUE_CAPACITY as f64 {
            return Err(RunnerError::configuration(format!(
                "queue_scaleが大きすぎます: {} (上限{MAX_QUEUE_CAPACITY})",
                self.queue_scale
            )));
        }
        Ok(())
    }

    pub fn queue_scale(&self) -> f64 {
        self.queue_scale
    }

    /// デバイス数に応じたキュー容量（最低1、上限`MAX_QUEUE_CAPACITY`）
    pub fn queue_capacity(&self, device_count: usize) -> RunnerResult<usize> {
        self.validate()?;
        let capacity = (device_count as f64 * self.queue_scale).floor();
        if capacity > MAX_QUEUE_CAPACITY as f64 {
            return Err(RunnerError::configuration(format!(
                "キュー容量{capacity}が上限{MAX_QUEUE_CAPACITY}を超えています \
                 (devices={device_count}, queue_scale={})",
                self.queue_scale
            )));
        }
        Ok((capacity as usize).max(1))
    }

    /// 1回の呼び出しで未消費のまま先行できる入力件数
    ///
    /// 入力・出力キューの容量とProducerごとの処理中1件の合計。Dispatcherは
    /// Consumerがこの件数分を消費するまで次の入力を読まない。
    pub fn in_flight_limit(&self, device_count: usize) -> RunnerResult<usize> {
        Ok(self.queue_capacity(device_count)? * 2 + device_count)
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            queue_scale: 3.0,
            grace_period: Duration::from_secs(5),
            progress_interval: 100,
        }
    }
}
