// Runner - ワーカーのライフサイクルと呼び出しのオーケストレーション

use super::consumer::{spawn_consumer, ConsumerContext};
use super::dispatcher::{dispatch, send_end_of_call};
use super::producer::{spawn_producer, ProducerContext};
use super::protocol::{CallReply, ConsumerMessage, ProducerMessage, WorkerControl};
use crate::core::{
    CallSummary, DevicePool, HookFailure, HookKind, OrderingPolicy, Pipeline, ProgressReporter,
    RunnerError, RunnerResult, RunnerState,
};
use crate::services::{RunnerSettings, TracingProgressReporter};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{oneshot, Mutex};

/// 終了待ち・停止送信のポーリング間隔
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// 応答キューの容量（呼び出しごとに応答は1件）
const REPLY_CAPACITY: usize = 4;

/// デバイスごとのProducerと単一のConsumerを持つ並列ランナー
///
/// ワーカーは構築時に起動し、`close`されるまで呼び出しをまたいで再利用される。
/// `invoke`は`&mut self`を取るため同時に1つの呼び出ししか実行できない。
/// 複数の呼び出し元で共有する場合は呼び出し側でMutexに包むこと。
///
/// 内部でtokioのブロッキングAPIを使うため、非同期ランタイムのタスク内から
/// 直接呼び出してはならない（`spawn_blocking`を経由すること）。
///
/// ```
/// use parallel_runner::{DevicePool, FnPipeline, Runner};
///
/// let pipeline = FnPipeline::new(
///     |_device, _cfg: &mut u64, x: u64| Ok(x * x),
///     |sum: &mut u64, y: u64| {
///         *sum += y;
///         Ok(())
///     },
///     |sum: &mut u64| Ok(*sum),
/// );
/// let mut runner = Runner::unordered(pipeline, DevicePool::cpus(3)?, 0)?;
///
/// assert_eq!(runner.invoke(0..100)?, 328_350);
/// runner.close()?;
/// # Ok::<(), parallel_runner::RunnerError>(())
/// ```
pub struct Runner<P: Pipeline> {
    pipeline: Arc<P>,
    devices: DevicePool,
    template: P::Config,
    policy: OrderingPolicy,
    settings: RunnerSettings,
    reporter: Arc<dyn ProgressReporter>,
    state: RunnerState,
    next_call_id: u64,
    last_summary: Option<CallSummary>,
    workers: Option<Workers<P>>,
}

impl<P: Pipeline> Runner<P> {
    /// ランナーを構築し全ワーカーを起動する
    ///
    /// いずれかのinitフックが失敗した場合、起動済みのワーカーを終了させて
    /// `InitializationError`を返す。
    pub fn new(
        pipeline: P,
        devices: DevicePool,
        template: P::Config,
        policy: OrderingPolicy,
        settings: RunnerSettings,
        reporter: Arc<dyn ProgressReporter>,
    ) -> RunnerResult<Self> {
        settings.validate()?;

        let mut runner = Self {
            pipeline: Arc::new(pipeline),
            devices,
            template,
            policy,
            settings,
            reporter,
            state: RunnerState::Closed,
            next_call_id: 0,
            last_summary: None,
            workers: None,
        };
        runner.activate()?;
        Ok(runner)
    }

    /// 到着順に集約するランナー（既定設定・tracing出力）
    pub fn unordered(pipeline: P, devices: DevicePool, template: P::Config) -> RunnerResult<Self> {
        Self::with_defaults(pipeline, devices, template, OrderingPolicy::Unordered)
    }

    /// 入力順に集約するランナー（既定設定・tracing出力）
    pub fn ordered(pipeline: P, devices: DevicePool, template: P::Config) -> RunnerResult<Self> {
        Self::with_defaults(pipeline, devices, template, OrderingPolicy::Ordered)
    }

    fn with_defaults(
        pipeline: P,
        devices: DevicePool,
        template: P::Config,
        policy: OrderingPolicy,
    ) -> RunnerResult<Self> {
        let settings = RunnerSettings::default();
        let reporter = Arc::new(TracingProgressReporter::with_interval(
            settings.progress_interval(),
        ));
        Self::new(pipeline, devices, template, policy, settings, reporter)
    }

    /// 入力列を処理し、consumer_endの結果を返す
    ///
    /// 入力は`RunnerSettings::in_flight_limit`の件数を超えて先読みされない。無限列を渡した場合は
    /// 失敗するまで戻らない。処理中の失敗は`WorkError`として返り、
    /// ワーカーは次の呼び出しまたは`close`のために生存したままとなる。
    pub fn invoke<I>(&mut self, items: I) -> RunnerResult<P::Aggregate>
    where
        I: IntoIterator<Item = P::Input>,
    {
        let Some(workers) = self.workers.as_mut() else {
            return Err(RunnerError::invalid_state("invoke", self.state));
        };

        self.next_call_id += 1;
        let call_id = self.next_call_id;
        self.state = RunnerState::Running;
        self.reporter.report_started(call_id, self.policy);
        let started = Instant::now();

        match workers.run_call(call_id, items) {
            Ok((aggregate, total_items)) => {
                let summary = CallSummary {
                    call_id,
                    total_items,
                    policy: self.policy,
                    elapsed: started.elapsed(),
                };
                self.reporter.report_completed(&summary);
                self.last_summary = Some(summary);
                Ok(aggregate)
            }
            Err(error) => {
                self.reporter.report_error(&error);
                Err(error)
            }
        }
    }

    /// 全ワーカーに終了を指示し、猶予時間内の終了を待つ
    ///
    /// 2回目以降の呼び出しは何もしない。猶予時間を過ぎても終了しない
    /// ワーカーは切り離して`TeardownTimeoutError`で報告する。
    pub fn close(&mut self) -> RunnerResult<()> {
        let Some(workers) = self.workers.take() else {
            return Ok(());
        };

        tracing::info!(devices = self.devices.len(), state = %self.state, "closing runner");
        self.state = RunnerState::Closed;

        let result = workers.shutdown(self.settings.grace_period());
        if let Err(error) = &result {
            self.reporter.report_error(error);
        }
        result
    }

    /// 終了済みのランナーのワーカーを再起動する（initフックが再度実行される）
    pub fn activate(&mut self) -> RunnerResult<()> {
        if self.workers.is_some() {
            return Ok(());
        }

        let workers = Workers::spawn(
            &self.pipeline,
            &self.devices,
            &self.template,
            self.policy,
            &self.settings,
            &self.reporter,
        )?;
        self.workers = Some(workers);
        self.state = RunnerState::Created;
        tracing::info!(
            devices = self.devices.len(),
            policy = %self.policy,
            "runner started"
        );
        Ok(())
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn policy(&self) -> OrderingPolicy {
        self.policy
    }

    pub fn devices(&self) -> &DevicePool {
        &self.devices
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// 直近に成功した呼び出しの集計
    pub fn last_summary(&self) -> Option<&CallSummary> {
        self.last_summary.as_ref()
    }
}

impl<P: Pipeline> Drop for Runner<P> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::warn!(%error, "teardown failed while dropping runner");
        }
    }
}

/// 起動中のワーカー群とそれらをつなぐキュー
struct Workers<P: Pipeline> {
    work_tx: mpsc::Sender<ProducerMessage<P::Input>>,
    result_tx: mpsc::Sender<ConsumerMessage<P::Output>>,
    reply_rx: mpsc::Receiver<CallReply<P::Aggregate>>,
    control: Arc<WorkerControl>,
    producers: Vec<(String, JoinHandle<Result<(), HookFailure>>)>,
    consumer: Option<JoinHandle<()>>,
    in_flight_limit: usize,
    grace_period: Duration,
}

impl<P: Pipeline> Workers<P> {
    /// Consumer、続いてデバイスごとのProducerを起動し、全initの完了を待つ
    fn spawn(
        pipeline: &Arc<P>,
        devices: &DevicePool,
        template: &P::Config,
        policy: OrderingPolicy,
        settings: &RunnerSettings,
        reporter: &Arc<dyn ProgressReporter>,
    ) -> RunnerResult<Self> {
        let capacity = settings.queue_capacity(devices.len())?;
        let in_flight_limit = settings.in_flight_limit(devices.len())?;
        let (work_tx, work_rx) = mpsc::channel(capacity);
        let (result_tx, result_rx) = mpsc::channel(capacity);
        let (reply_tx, reply_rx) = mpsc::channel(REPLY_CAPACITY);
        let work_rx = Arc::new(Mutex::new(work_rx));

        tracing::debug!(
            capacity,
            in_flight_limit,
            devices = devices.len(),
            "spawning workers"
        );

        let mut workers = Self {
            work_tx,
            result_tx,
            reply_rx,
            control: Arc::new(WorkerControl::default()),
            producers: Vec::with_capacity(devices.len()),
            consumer: None,
            in_flight_limit,
            grace_period: settings.grace_period(),
        };

        let (ready_tx, ready_rx) = oneshot::channel();
        let consumer = spawn_consumer(
            ConsumerContext {
                pipeline: Arc::clone(pipeline),
                config: template.clone(),
                policy,
                reporter: Arc::clone(reporter),
                result_rx,
                reply_tx,
            },
            ready_tx,
        )
        .map_err(|e| RunnerError::spawn("consumer", e));
        let consumer = match consumer {
            Ok(handle) => handle,
            Err(error) => return Err(workers.abort(error)),
        };
        workers.consumer = Some(consumer);
        if let Err(error) = await_ready(ready_rx, "consumer") {
            return Err(workers.abort(error));
        }

        let mut pending = Vec::with_capacity(devices.len());
        for (worker_id, device) in devices.iter().enumerate() {
            let name = format!("producer-{worker_id}-{device}");
            let (ready_tx, ready_rx) = oneshot::channel();
            let spawned = spawn_producer(
                name.clone(),
                ProducerContext {
                    worker_id,
                    device: device.clone(),
                    pipeline: Arc::clone(pipeline),
                    config: template.clone(),
                    work_rx: Arc::clone(&work_rx),
                    result_tx: workers.result_tx.clone(),
                    control: Arc::clone(&workers.control),
                },
                ready_tx,
            );
            match spawned {
                Ok(handle) => {
                    workers.producers.push((name.clone(), handle));
                    pending.push((name, ready_rx));
                }
                Err(e) => return Err(workers.abort(RunnerError::spawn(name, e))),
            }
        }

        // 全Producerの初期化結果を待ち、最初の失敗を報告する
        let mut first_failure = None;
        for (name, ready_rx) in pending {
            if let Err(error) = await_ready(ready_rx, &name) {
                first_failure.get_or_insert(error);
            }
        }
        if let Some(error) = first_failure {
            return Err(workers.abort(error));
        }

        Ok(workers)
    }

    /// 起動途中のワーカーを終了させ、元のエラーを返す
    fn abort(self, error: RunnerError) -> RunnerError {
        tracing::warn!(%error, "worker startup failed, tearing down");
        let grace_period = self.grace_period;
        if let Err(teardown) = self.shutdown(grace_period) {
            tracing::warn!(error = %teardown, "teardown after failed startup reported errors");
        }
        error
    }

    /// 1回の呼び出しを実行し、集約結果と投入件数を返す
    fn run_call<I>(&mut self, call_id: u64, items: I) -> RunnerResult<(P::Aggregate, u64)>
    where
        I: IntoIterator<Item = P::Input>,
    {
        // 以前の呼び出しで受け取られなかった応答を捨てる
        while self.reply_rx.try_recv().is_ok() {}

        // 未消費の入力がin_flight_limitを超えないよう、消費1件ごとにクレジットを返させる
        let (credits, mut credit_rx) = mpsc::channel(self.in_flight_limit);
        for _ in 0..self.in_flight_limit {
            credits
                .try_send(())
                .map_err(|_| RunnerError::channel("クレジットを用意できません"))?;
        }
        self.send_to_consumer(ConsumerMessage::Begin { call_id, credits })?;

        let Self {
            work_tx,
            reply_rx,
            control,
            producers,
            ..
        } = self;

        // 配信中に失敗応答が届いたら入力の読み出しを止める
        let mut early = None;
        let dispatched = dispatch(call_id, items, work_tx, &mut credit_rx, || {
            if early.is_none() {
                while let Ok(reply) = reply_rx.try_recv() {
                    if reply.call_id == call_id {
                        early = Some(reply.outcome);
                        break;
                    }
                }
            }
            early.is_some()
        });
        let report = match dispatched {
            Ok(report) => report,
            Err(error) => {
                control.cancel_through(call_id);
                return Err(error);
            }
        };
        let producer_count = producers.len();

        if report.interrupted {
            tracing::debug!(call_id, dispatched = report.dispatched, "dispatch interrupted");
            control.cancel_through(call_id);
            send_end_of_call(call_id, producer_count, work_tx)?;
        } else {
            self.send_to_consumer(ConsumerMessage::Sealed {
                call_id,
                total: report.dispatched,
            })?;
            send_end_of_call(call_id, producer_count, &self.work_tx)?;
        }

        let outcome = match early {
            Some(outcome) => outcome,
            None => self.wait_reply(call_id)?,
        };
        match outcome {
            Ok(aggregate) => Ok((aggregate, report.dispatched)),
            Err(error) => {
                // キューに残った同じ呼び出しの作業を破棄させる
                self.control.cancel_through(call_id);
                Err(error)
            }
        }
    }

    fn send_to_consumer(&self, message: ConsumerMessage<P::Output>) -> RunnerResult<()> {
        self.result_tx
            .blocking_send(message)
            .map_err(|_| RunnerError::channel("出力キューが閉じられています"))
    }

    fn wait_reply(&mut self, call_id: u64) -> RunnerResult<Result<P::Aggregate, RunnerError>> {
        loop {
            match self.reply_rx.blocking_recv() {
                Some(reply) if reply.call_id == call_id => return Ok(reply.outcome),
                Some(stale) => {
                    tracing::debug!(call_id = stale.call_id, "discarding stale reply");
                }
                None => return Err(RunnerError::channel("Consumerが応答せずに終了しました")),
            }
        }
    }

    /// 全ワーカーを停止する
    ///
    /// 停止フラグを立てて入力キューを閉じ、ConsumerにStopを送ったうえで
    /// 猶予時間内の終了を待つ。
    fn shutdown(self, grace_period: Duration) -> RunnerResult<()> {
        let Self {
            work_tx,
            result_tx,
            reply_rx,
            control,
            producers,
            consumer,
            ..
        } = self;
        let deadline = Instant::now() + grace_period;

        control.begin_shutdown();
        drop(work_tx);

        // Consumerが詰まっていても待ち続けないようtry_sendで送る
        let mut stop = ConsumerMessage::Stop;
        loop {
            match result_tx.try_send(stop) {
                Ok(()) | Err(TrySendError::Closed(_)) => break,
                Err(TrySendError::Full(message)) if Instant::now() < deadline => {
                    stop = message;
                    thread::sleep(POLL_INTERVAL);
                }
                Err(TrySendError::Full(_)) => break,
            }
        }
        drop(result_tx);
        drop(reply_rx);

        let mut stragglers = Vec::new();
        let mut failures = Vec::new();

        for (name, handle) in producers {
            match join_within(handle, deadline) {
                Some(Ok(Ok(()))) => tracing::debug!(worker = %name, "producer joined"),
                Some(Ok(Err(failure))) => failures.push(failure),
                Some(Err(payload)) => {
                    failures.push(HookFailure::from_panic(HookKind::ProducerEnd, payload))
                }
                None => stragglers.push(name),
            }
        }
        if let Some(handle) = consumer {
            match join_within(handle, deadline) {
                Some(Ok(())) => tracing::debug!("consumer joined"),
                Some(Err(payload)) => {
                    failures.push(HookFailure::from_panic(HookKind::ConsumerEnd, payload))
                }
                None => stragglers.push("consumer".to_string()),
            }
        }

        if !stragglers.is_empty() {
            for failure in &failures {
                tracing::error!(%failure, "end hook failed during teardown");
            }
            let grace_ms = u64::try_from(grace_period.as_millis()).unwrap_or(u64::MAX);
            return Err(RunnerError::teardown_timeout(stragglers, grace_ms));
        }
        if !failures.is_empty() {
            return Err(RunnerError::teardown(failures));
        }
        Ok(())
    }
}

/// ワーカーのinit結果を待つ
fn await_ready(
    ready_rx: oneshot::Receiver<Result<(), HookFailure>>,
    worker: &str,
) -> RunnerResult<()> {
    match ready_rx.blocking_recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(failure)) => Err(RunnerError::initialization(failure)),
        Err(_) => Err(RunnerError::channel(format!(
            "{worker}が初期化結果を返さずに終了しました"
        ))),
    }
}

/// 期限までにスレッドが終了すればjoinする。期限切れならNone（スレッドは切り離される）
fn join_within<T>(handle: JoinHandle<T>, deadline: Instant) -> Option<thread::Result<T>> {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(POLL_INTERVAL);
    }
    Some(handle.join())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Device, FnPipeline};
    use crate::services::NoOpProgressReporter;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    type SumPipeline = FnPipeline<u64, u64, u64, u64>;

    fn sum_of_squares() -> SumPipeline {
        FnPipeline::new(
            |_device, _cfg: &mut u64, x: u64| Ok(x * x),
            |sum: &mut u64, y| {
                *sum += y;
                Ok(())
            },
            |sum: &mut u64| Ok(*sum),
        )
    }

    fn quiet_runner<P: Pipeline>(
        pipeline: P,
        devices: usize,
        template: P::Config,
        policy: OrderingPolicy,
    ) -> RunnerResult<Runner<P>> {
        Runner::new(
            pipeline,
            DevicePool::cpus(devices)?,
            template,
            policy,
            RunnerSettings::default().with_grace_period(Duration::from_secs(2)),
            Arc::new(NoOpProgressReporter::new()),
        )
    }

    #[test]
    fn test_state_transitions() {
        let mut runner = quiet_runner(sum_of_squares(), 2, 0, OrderingPolicy::Unordered).unwrap();
        assert_eq!(runner.state(), RunnerState::Created);
        assert!(runner.is_active());

        assert_eq!(runner.invoke(1..=3).unwrap(), 14);
        assert_eq!(runner.state(), RunnerState::Running);

        runner.close().unwrap();
        assert_eq!(runner.state(), RunnerState::Closed);
        assert!(!runner.is_active());
    }

    #[test]
    fn test_invoke_after_close_is_invalid_state() {
        let mut runner = quiet_runner(sum_of_squares(), 1, 0, OrderingPolicy::Ordered).unwrap();
        runner.close().unwrap();
        runner.close().unwrap();

        let error = runner.invoke(0..3).unwrap_err();
        assert!(matches!(
            error,
            RunnerError::InvalidStateError {
                state: RunnerState::Closed,
                ..
            }
        ));
    }

    #[test]
    fn test_last_summary_records_successful_call() {
        let mut runner = quiet_runner(sum_of_squares(), 2, 0, OrderingPolicy::Ordered).unwrap();
        assert!(runner.last_summary().is_none());

        runner.invoke(0..10).unwrap();
        runner.invoke(0..4).unwrap();

        let summary = runner.last_summary().unwrap();
        assert_eq!(summary.call_id, 2);
        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.policy, OrderingPolicy::Ordered);
    }

    #[test]
    fn test_activate_restarts_closed_runner() {
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&inits);
        let pipeline = sum_of_squares().with_producer_init(move |_device, _cfg| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let mut runner = quiet_runner(pipeline, 2, 0, OrderingPolicy::Unordered).unwrap();
        runner.close().unwrap();

        runner.activate().unwrap();
        assert_eq!(runner.state(), RunnerState::Created);
        assert_eq!(runner.invoke(0..3).unwrap(), 5);

        // 起動中のactivateは何もしない
        runner.activate().unwrap();
        assert_eq!(inits.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let result = Runner::new(
            sum_of_squares(),
            DevicePool::cpus(1).unwrap(),
            0,
            OrderingPolicy::Unordered,
            RunnerSettings::default().with_queue_scale(0.0),
            Arc::new(NoOpProgressReporter::new()),
        );

        assert!(matches!(result, Err(RunnerError::ConfigurationError { .. })));
    }

    #[test]
    fn test_consumer_init_failure_blocks_startup() {
        let pipeline = sum_of_squares().with_consumer_init(|_| anyhow::bail!("no sink"));

        let error = quiet_runner(pipeline, 2, 0, OrderingPolicy::Unordered)
            .err()
            .unwrap();

        assert_eq!(
            error.hook_failure().map(|f| f.hook),
            Some(HookKind::ConsumerInit)
        );
    }

    #[test]
    fn test_producer_init_failure_tears_down_started_workers() {
        let ends = Arc::new(AtomicUsize::new(0));
        let end_counter = Arc::clone(&ends);
        let pipeline = sum_of_squares()
            .with_producer_init(|device, _cfg| {
                anyhow::ensure!(device.name() != "cpu", "{device} rejected");
                Ok(())
            })
            .with_producer_end(move |_device, _cfg| {
                end_counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let result = Runner::new(
            pipeline,
            DevicePool::from_devices([Device::new("cuda:0"), Device::cpu()]).unwrap(),
            0,
            OrderingPolicy::Ordered,
            RunnerSettings::default(),
            Arc::new(NoOpProgressReporter::new()),
        );

        let error = result.err().unwrap();
        assert!(matches!(error, RunnerError::InitializationError { .. }));
        assert_eq!(error.hook_failure().unwrap().device, Some(Device::cpu()));
        // 初期化できたcuda:0だけがendを実行する
        assert_eq!(ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_producer_end_failure_is_reported_on_close() {
        let pipeline =
            sum_of_squares().with_producer_end(|device, _cfg| anyhow::bail!("{device} busy"));
        let mut runner = quiet_runner(pipeline, 2, 0, OrderingPolicy::Unordered).unwrap();

        let error = runner.close().unwrap_err();
        match error {
            RunnerError::TeardownError { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures.iter().all(|f| f.hook == HookKind::ProducerEnd));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.state(), RunnerState::Closed);
    }

    #[test]
    fn test_stuck_producer_is_reported_as_straggler() {
        let release = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&release);
        let pipeline = sum_of_squares().with_producer_end(move |_device, _cfg| {
            while !gate.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        });
        let mut runner = Runner::new(
            pipeline,
            DevicePool::cpus(1).unwrap(),
            0,
            OrderingPolicy::Unordered,
            RunnerSettings::default().with_grace_period(Duration::from_millis(100)),
            Arc::new(NoOpProgressReporter::new()),
        )
        .unwrap();

        let error = runner.close().unwrap_err();
        release.store(true, Ordering::SeqCst);

        match error {
            RunnerError::TeardownTimeoutError {
                stragglers,
                grace_ms,
            } => {
                assert_eq!(stragglers, vec!["producer-0-cpu".to_string()]);
                assert_eq!(grace_ms, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_drop_closes_workers() {
        let ends = Arc::new(AtomicUsize::new(0));
        let end_counter = Arc::clone(&ends);
        let pipeline = sum_of_squares().with_producer_end(move |_device, _cfg| {
            end_counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        {
            let mut runner = quiet_runner(pipeline, 3, 0, OrderingPolicy::Ordered).unwrap();
            runner.invoke(0..5).unwrap();
        }

        assert_eq!(ends.load(Ordering::SeqCst), 3);
    }
}
