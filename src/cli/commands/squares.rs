use super::{device_pool, settings_and_reporter};
use crate::cli::args::PoolArgs;
use crate::core::{Device, OrderingPolicy, Pipeline};
use crate::engine::Runner;
use anyhow::Result;
use std::sync::Arc;

/// 各入力の二乗を集めるパイプライン
///
/// Consumer側の設定を結果の蓄積先として使う。
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectSquares;

impl Pipeline for CollectSquares {
    type Config = Vec<u64>;
    type Input = u64;
    type Output = u64;
    type Aggregate = Vec<u64>;

    fn producer_work(&self, _device: &Device, _config: &mut Vec<u64>, x: u64) -> Result<u64> {
        Ok(x.wrapping_mul(x))
    }

    fn consumer_work(&self, collected: &mut Vec<u64>, square: u64) -> Result<()> {
        collected.push(square);
        Ok(())
    }

    fn consumer_end(&self, collected: &mut Vec<u64>) -> Result<Vec<u64>> {
        Ok(std::mem::take(collected))
    }
}

/// 二乗のリストを返す
pub fn run_squares(args: &PoolArgs, policy: OrderingPolicy) -> Result<Vec<u64>> {
    let (settings, reporter) = settings_and_reporter()?;
    let mut runner = Runner::new(
        CollectSquares,
        device_pool(args)?,
        Vec::new(),
        policy,
        settings,
        Arc::new(reporter),
    )?;

    let squares = runner.invoke(0..args.items)?;
    runner.close()?;
    Ok(squares)
}

/// squaresコマンドの実行（JSON配列を出力）
pub fn execute_squares(args: PoolArgs, unordered: bool) -> Result<()> {
    let policy = if unordered {
        OrderingPolicy::Unordered
    } else {
        OrderingPolicy::Ordered
    };
    let squares = run_squares(&args, policy)?;
    println!("{}", serde_json::to_string(&squares)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: u64, devices: usize) -> PoolArgs {
        PoolArgs {
            items,
            devices: Some(devices),
            device: Vec::new(),
        }
    }

    #[test]
    fn test_ordered_squares_follow_input_order() {
        let squares = run_squares(&args(20, 4), OrderingPolicy::Ordered).unwrap();
        let expected: Vec<u64> = (0..20).map(|x| x * x).collect();
        assert_eq!(squares, expected);
    }

    #[test]
    fn test_unordered_squares_contain_every_result() {
        let mut squares = run_squares(&args(20, 4), OrderingPolicy::Unordered).unwrap();
        squares.sort_unstable();
        let expected: Vec<u64> = (0..20).map(|x| x * x).collect();
        assert_eq!(squares, expected);
    }

    #[test]
    fn test_fewer_items_than_devices() {
        let squares = run_squares(&args(2, 5), OrderingPolicy::Ordered).unwrap();
        assert_eq!(squares, vec![0, 1]);
    }
}
