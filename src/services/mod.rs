// サービス層 - 設定と進捗監視
// エンジンから利用される周辺機能

pub mod config;
pub mod monitoring;

// 公開API - 各サービスの主要機能を明示的にエクスポート
pub use config::{ConfigError, RunnerSettings, SharedConfig};
pub use monitoring::{NoOpProgressReporter, TracingProgressReporter};
