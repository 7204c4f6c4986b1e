use super::{device_pool, settings_and_reporter};
use crate::cli::args::PoolArgs;
use crate::core::{FnPipeline, OrderingPolicy};
use crate::engine::Runner;
use anyhow::{Context, Result};
use std::sync::Arc;

/// 0..itemsの二乗和を到着順に集約するパイプライン
pub fn sum_squares_pipeline() -> FnPipeline<u64, u64, u64, u64> {
    FnPipeline::new(
        |_device, _cfg: &mut u64, x: u64| {
            x.checked_mul(x)
                .with_context(|| format!("{x}の二乗がオーバーフローしました"))
        },
        |sum: &mut u64, y: u64| {
            *sum = sum
                .checked_add(y)
                .context("二乗和がオーバーフローしました")?;
            Ok(())
        },
        |sum: &mut u64| Ok(*sum),
    )
}

/// 二乗和を計算して返す
pub fn run_sum_squares(args: &PoolArgs) -> Result<u64> {
    let (settings, reporter) = settings_and_reporter()?;
    let mut runner = Runner::new(
        sum_squares_pipeline(),
        device_pool(args)?,
        0,
        OrderingPolicy::Unordered,
        settings,
        Arc::new(reporter),
    )?;

    let total = runner.invoke(0..args.items)?;
    runner.close()?;
    Ok(total)
}

/// sum-squaresコマンドの実行
pub fn execute_sum_squares(args: PoolArgs) -> Result<()> {
    let total = run_sum_squares(&args)?;
    println!("{total}");
    Ok(())
}
