// テストユーティリティ
// 統合テストで共有するパイプラインとランナー構築ヘルパー

#![allow(dead_code)]

use parallel_runner::{
    DevicePool, FnPipeline, NoOpProgressReporter, OrderingPolicy, Pipeline, ProgressReporter,
    Runner, RunnerResult, RunnerSettings,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type SumPipeline = FnPipeline<u64, u64, u64, u64>;
pub type CollectPipeline = FnPipeline<Vec<u64>, u64, u64, Vec<u64>>;

/// テスト用設定（短い猶予時間）
pub fn test_settings() -> RunnerSettings {
    RunnerSettings::default().with_grace_period(Duration::from_secs(2))
}

/// 出力なしのランナーを構築
pub fn quiet_runner<P: Pipeline>(
    pipeline: P,
    devices: usize,
    template: P::Config,
    policy: OrderingPolicy,
) -> RunnerResult<Runner<P>> {
    runner_with_reporter(
        pipeline,
        devices,
        template,
        policy,
        Arc::new(NoOpProgressReporter::new()),
    )
}

pub fn runner_with_reporter<P: Pipeline>(
    pipeline: P,
    devices: usize,
    template: P::Config,
    policy: OrderingPolicy,
    reporter: Arc<dyn ProgressReporter>,
) -> RunnerResult<Runner<P>> {
    Runner::new(
        pipeline,
        DevicePool::cpus(devices)?,
        template,
        policy,
        test_settings(),
        reporter,
    )
}

/// 二乗和
pub fn sum_of_squares() -> SumPipeline {
    FnPipeline::new(
        |_device, _cfg: &mut u64, x: u64| Ok(x * x),
        |sum: &mut u64, y: u64| {
            *sum += y;
            Ok(())
        },
        |sum: &mut u64| Ok(*sum),
    )
}

/// 入力をそのまま到着順に集める
pub fn identity_collector() -> CollectPipeline {
    FnPipeline::new(
        |_device, _cfg: &mut Vec<u64>, x: u64| Ok(x),
        |seen: &mut Vec<u64>, y: u64| {
            seen.push(y);
            Ok(())
        },
        |seen: &mut Vec<u64>| Ok(std::mem::take(seen)),
    )
}

/// 入力値に応じた疑似ランダムな遅延を入れて完了順を乱す
pub fn jittered_collector() -> CollectPipeline {
    FnPipeline::new(
        |_device, _cfg: &mut Vec<u64>, x: u64| {
            let delay = x.wrapping_mul(2_654_435_761) % 4;
            std::thread::sleep(Duration::from_millis(delay));
            Ok(x)
        },
        |seen: &mut Vec<u64>, y: u64| {
            seen.push(y);
            Ok(())
        },
        |seen: &mut Vec<u64>| Ok(std::mem::take(seen)),
    )
}

/// 各フックの呼び出し回数
#[derive(Debug, Default, Clone)]
pub struct HookCounters {
    pub producer_init: Arc<AtomicUsize>,
    pub producer_work: Arc<AtomicUsize>,
    pub producer_end: Arc<AtomicUsize>,
    pub consumer_init: Arc<AtomicUsize>,
    pub consumer_end: Arc<AtomicUsize>,
}

impl HookCounters {
    pub fn get(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// 二乗和パイプラインに呼び出し回数の計測を付けたもの
pub fn counted_sum_of_squares(counters: &HookCounters) -> SumPipeline {
    let work = Arc::clone(&counters.producer_work);
    let consumer_end = Arc::clone(&counters.consumer_end);
    let producer_init = Arc::clone(&counters.producer_init);
    let producer_end = Arc::clone(&counters.producer_end);
    let consumer_init = Arc::clone(&counters.consumer_init);

    FnPipeline::new(
        move |_device, _cfg: &mut u64, x: u64| {
            work.fetch_add(1, Ordering::SeqCst);
            Ok(x * x)
        },
        |sum: &mut u64, y: u64| {
            *sum += y;
            Ok(())
        },
        move |sum: &mut u64| {
            consumer_end.fetch_add(1, Ordering::SeqCst);
            Ok(*sum)
        },
    )
    .with_producer_init(move |_device, _cfg| {
        producer_init.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .with_producer_end(move |_device, _cfg| {
        producer_end.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .with_consumer_init(move |_cfg| {
        consumer_init.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

/// 開くまでスレッドを止めておくゲート
#[derive(Debug, Default, Clone)]
pub struct Gate(Arc<AtomicBool>);

impl Gate {
    pub fn open(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn wait(&self) {
        while !self.0.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}
