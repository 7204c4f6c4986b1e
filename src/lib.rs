// parallel_runner - デバイスごとのワーカーで入力列を並列処理するランナー
//
// レイヤー構成
// - core: フック・型・エラーなどの基本的な抽象化
// - engine: Producer/Consumerスレッドとランナーのオーケストレーション
// - services: 設定と進捗監視
// - cli: コマンドラインインターフェース

pub mod cli;
pub mod core;
pub mod engine;
pub mod services;

// 公開API - よく使う型をクレート直下から参照できるようにする
pub use crate::core::{
    CallSummary, Device, DevicePool, ErrorSeverity, FnPipeline, HookFailure, HookKind,
    MockProgressReporter, OrderingPolicy, Pipeline, ProgressReporter, RunnerError, RunnerResult,
    RunnerState,
};
pub use crate::engine::{ReorderBuffer, Runner};
pub use crate::services::{
    ConfigError, NoOpProgressReporter, RunnerSettings, SharedConfig, TracingProgressReporter,
};
