// エンジン層 - ワーカースレッドとオーケストレーション
// Dispatcher → Producer群 → Consumer のパイプラインを構成する

mod consumer;
mod dispatcher;
mod producer;
mod protocol;
pub mod reorder;
pub mod runner;

// 公開API
pub use reorder::ReorderBuffer;
pub use runner::Runner;
