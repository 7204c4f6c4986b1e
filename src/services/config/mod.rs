// 設定管理 - ランナー設定とフック間の共有設定

pub mod settings;
pub mod shared_config;

pub use settings::RunnerSettings;
pub use shared_config::{ConfigError, SharedConfig};
