// コアレイヤー - 基盤となるトレイト、型、エラー定義
// 他のレイヤーから参照される基本的な抽象化を提供

pub mod device;
pub mod error;
pub mod hooks;
pub mod traits;
pub mod types;

// 公開API - 明示的にエクスポートして曖昧性を回避
pub use device::{Device, DevicePool};
pub use error::{ErrorSeverity, HookFailure, RunnerError, RunnerResult};
pub use hooks::FnPipeline;
pub use traits::{MockProgressReporter, Pipeline, ProgressReporter};
pub use types::{
    CallSummary, HookKind, OrderingPolicy, ResultItem, RunnerState, SequenceIndex, WorkItem,
};
