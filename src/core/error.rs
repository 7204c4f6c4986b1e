// Custom error types for the parallel runner
// ランナー専用のカスタムエラー型定義

use super::device::Device;
use super::types::{HookKind, RunnerState, SequenceIndex};
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// ワーカー内で発生したフックの失敗
///
/// 発生元のフック・デバイス・連番を保持したままワーカー境界を越えて
/// 呼び出し元へ運ばれる。
#[derive(Debug)]
pub struct HookFailure {
    pub hook: HookKind,
    pub device: Option<Device>,
    pub index: Option<SequenceIndex>,
    pub source: anyhow::Error,
}

impl HookFailure {
    pub fn new(hook: HookKind, source: anyhow::Error) -> Self {
        Self {
            hook,
            device: None,
            index: None,
            source,
        }
    }

    /// panicペイロードからの作成
    pub fn from_panic(hook: HookKind, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::new(hook, anyhow::anyhow!("panicked: {message}"))
    }

    pub fn with_device(mut self, device: &Device) -> Self {
        self.device = Some(device.clone());
        self
    }

    pub fn with_index(mut self, index: SequenceIndex) -> Self {
        self.index = Some(index);
        self
    }
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hook)?;
        match (&self.device, self.index) {
            (Some(device), Some(index)) => write!(f, " [device={device}, index={index}]")?,
            (Some(device), None) => write!(f, " [device={device}]")?,
            (None, Some(index)) => write!(f, " [index={index}]")?,
            (None, None) => {}
        }
        write!(f, ": {:#}", self.source)
    }
}

impl std::error::Error for HookFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

/// ランナー固有のエラー型
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("初期化エラー: {failure}")]
    InitializationError {
        #[source]
        failure: HookFailure,
    },

    #[error("処理エラー: {failure}")]
    WorkError {
        #[source]
        failure: HookFailure,
    },

    #[error("状態エラー: ランナーが{state}のため{operation}を実行できません")]
    InvalidStateError {
        operation: String,
        state: RunnerState,
    },

    #[error("終了タイムアウト: {grace_ms}ms以内に終了しなかったワーカー [{}]", .stragglers.join(", "))]
    TeardownTimeoutError {
        stragglers: Vec<String>,
        grace_ms: u64,
    },

    #[error("終了処理エラー: {}", describe_failures(.failures))]
    TeardownError { failures: Vec<HookFailure> },

    #[error("設定エラー: {message}")]
    ConfigurationError { message: String },

    #[error("順序エラー: {message}")]
    SequencingError { message: String },

    #[error("チャンネルエラー: {message}")]
    ChannelError { message: String },

    #[error("ワーカー起動エラー: {worker} - {source}")]
    SpawnError {
        worker: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_failures(failures: &[HookFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RunnerError {
    /// 初期化エラーの作成
    pub fn initialization(failure: HookFailure) -> Self {
        Self::InitializationError { failure }
    }

    /// 処理エラーの作成
    pub fn work(failure: HookFailure) -> Self {
        Self::WorkError { failure }
    }

    /// 状態エラーの作成
    pub fn invalid_state(operation: impl Into<String>, state: RunnerState) -> Self {
        Self::InvalidStateError {
            operation: operation.into(),
            state,
        }
    }

    /// 終了タイムアウトエラーの作成
    pub fn teardown_timeout(stragglers: Vec<String>, grace_ms: u64) -> Self {
        Self::TeardownTimeoutError {
            stragglers,
            grace_ms,
        }
    }

    /// 終了処理エラーの作成
    pub fn teardown(failures: Vec<HookFailure>) -> Self {
        Self::TeardownError { failures }
    }

    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// 順序エラーの作成
    pub fn sequencing(message: impl Into<String>) -> Self {
        Self::SequencingError {
            message: message.into(),
        }
    }

    /// チャンネルエラーの作成
    pub fn channel(message: impl Into<String>) -> Self {
        Self::ChannelError {
            message: message.into(),
        }
    }

    /// ワーカー起動エラーの作成
    pub fn spawn(worker: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnError {
            worker: worker.into(),
            source,
        }
    }

    /// フック起因のエラーであれば失敗情報を返す
    pub fn hook_failure(&self) -> Option<&HookFailure> {
        match self {
            Self::InitializationError { failure } | Self::WorkError { failure } => Some(failure),
            Self::TeardownError { failures } => failures.first(),
            _ => None,
        }
    }

    /// エラーの重要度を取得
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::WorkError { .. } => ErrorSeverity::Medium,
            Self::InvalidStateError { .. } | Self::ConfigurationError { .. } => {
                ErrorSeverity::High
            }
            Self::InitializationError { .. } | Self::SpawnError { .. } => ErrorSeverity::High,
            Self::TeardownError { .. } | Self::TeardownTimeoutError { .. } => ErrorSeverity::High,
            Self::SequencingError { .. } | Self::ChannelError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 同じランナーで呼び出しを再試行できるかどうか
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::WorkError { .. } => true,
            Self::InvalidStateError { .. } => false,
            Self::InitializationError { .. } | Self::SpawnError { .. } => false,
            Self::ConfigurationError { .. } => false,
            Self::TeardownError { .. } | Self::TeardownTimeoutError { .. } => false,
            Self::SequencingError { .. } | Self::ChannelError { .. } => false,
        }
    }
}

/// エラーの重要度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 低重要度 - ログ出力程度
    Low,
    /// 中重要度 - 警告レベル
    Medium,
    /// 高重要度 - 要対応
    High,
    /// 致命的 - ランナー停止レベル
    Critical,
}

impl ErrorSeverity {
    pub const fn as_level(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// ランナーの結果型
pub type RunnerResult<T> = std::result::Result<T, RunnerError>;
