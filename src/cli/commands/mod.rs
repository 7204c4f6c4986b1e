pub mod squares;
pub mod sum_squares;

pub use squares::*;
pub use sum_squares::*;

use super::args::PoolArgs;
use crate::core::{DevicePool, RunnerResult};
use crate::services::{RunnerSettings, TracingProgressReporter};

/// 引数からデバイスプールを構築（指定がなければ利用可能なCPU数）
pub fn device_pool(args: &PoolArgs) -> RunnerResult<DevicePool> {
    if !args.device.is_empty() {
        return DevicePool::from_names(&args.device);
    }
    match args.devices {
        Some(count) => DevicePool::cpus(count),
        None => Ok(DevicePool::available_cpus()),
    }
}

/// 環境変数で上書きした設定と、それに合わせた進捗報告
pub(crate) fn settings_and_reporter() -> RunnerResult<(RunnerSettings, TracingProgressReporter)> {
    let settings = RunnerSettings::from_env()?;
    let reporter = TracingProgressReporter::with_interval(settings.progress_interval());
    Ok((settings, reporter))
}
