// Consumer - 結果を集約する単一ワーカースレッド

use super::protocol::{call_hook, CallReply, ConsumerMessage};
use super::reorder::ReorderBuffer;
use crate::core::{
    HookFailure, HookKind, OrderingPolicy, Pipeline, ProgressReporter, ResultItem, RunnerError,
    RunnerResult, SequenceIndex,
};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

pub(crate) struct ConsumerContext<P: Pipeline> {
    pub pipeline: Arc<P>,
    pub config: P::Config,
    pub policy: OrderingPolicy,
    pub reporter: Arc<dyn ProgressReporter>,
    pub result_rx: mpsc::Receiver<ConsumerMessage<P::Output>>,
    pub reply_tx: mpsc::Sender<CallReply<P::Aggregate>>,
}

/// 到着した結果をconsumer_workへ渡す順序を決める
enum Sequencer<T> {
    Unordered,
    Ordered(ReorderBuffer<T>),
}

impl<T> Sequencer<T> {
    fn new(policy: OrderingPolicy) -> Self {
        match policy {
            OrderingPolicy::Unordered => Self::Unordered,
            OrderingPolicy::Ordered => Self::Ordered(ReorderBuffer::new()),
        }
    }

    /// 新しい呼び出しのために並べ替え状態を戻す
    fn reset(&mut self) {
        if let Self::Ordered(buffer) = self {
            buffer.reset();
        }
    }

    /// 到着1件を受け付け、消費可能になったものを`sink`へ渡す
    fn accept(
        &mut self,
        item: ResultItem<T>,
        mut sink: impl FnMut(SequenceIndex, T) -> RunnerResult<()>,
    ) -> RunnerResult<()> {
        match self {
            Self::Unordered => sink(item.index, item.payload),
            Self::Ordered(buffer) => {
                buffer.insert(item.index, item.payload)?;
                for (index, payload) in buffer.drain_ready() {
                    sink(index, payload)?;
                }
                Ok(())
            }
        }
    }
}

/// 1回の呼び出しに対するConsumer側の状態
///
/// 破棄されると`credits`が閉じ、クレジット待ちのDispatcherが解放される。
struct ActiveCall<C> {
    call_id: u64,
    config: C,
    credits: mpsc::Sender<()>,
    consumed: u64,
    total: Option<u64>,
}

impl<C> ActiveCall<C> {
    fn is_complete(&self) -> bool {
        self.total == Some(self.consumed)
    }
}

/// Consumerスレッドを起動する
///
/// consumer_initは起動時に1回だけ実行され、その結果の設定が各呼び出しの
/// 開始時にコピーされる。呼び出しが完了するとconsumer_endの結果を
/// `reply_tx`で返す。
pub(crate) fn spawn_consumer<P: Pipeline>(
    ctx: ConsumerContext<P>,
    ready_tx: oneshot::Sender<Result<(), HookFailure>>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("consumer".to_string())
        .spawn(move || run_consumer(ctx, ready_tx))
}

fn run_consumer<P: Pipeline>(
    ctx: ConsumerContext<P>,
    ready_tx: oneshot::Sender<Result<(), HookFailure>>,
) {
    let ConsumerContext {
        pipeline,
        mut config,
        policy,
        reporter,
        mut result_rx,
        reply_tx,
    } = ctx;

    if let Err(failure) = call_hook(HookKind::ConsumerInit, || pipeline.consumer_init(&mut config)) {
        let _ = ready_tx.send(Err(failure));
        return;
    }
    let _ = ready_tx.send(Ok(()));
    tracing::debug!(%policy, "consumer ready");

    // 並べ替えバッファはConsumerの生存期間を通して1つを使い回す
    let mut sequencer = Sequencer::new(policy);
    let mut active: Option<ActiveCall<P::Config>> = None;

    while let Some(message) = result_rx.blocking_recv() {
        let outcome = match message {
            ConsumerMessage::Stop => break,
            ConsumerMessage::Begin { call_id, credits } => {
                if let Some(previous) = active.take() {
                    tracing::debug!(call_id = previous.call_id, "abandoning unfinished call");
                }
                sequencer.reset();
                active = Some(ActiveCall {
                    call_id,
                    config: config.clone(),
                    credits,
                    consumed: 0,
                    total: None,
                });
                None
            }
            ConsumerMessage::Sealed { call_id, total } => match active.as_mut() {
                Some(call) if call.call_id == call_id => {
                    call.total = Some(total);
                    None
                }
                _ => continue,
            },
            ConsumerMessage::Failure { call_id, failure } => match active.as_ref() {
                Some(call) if call.call_id == call_id => Some(Err(RunnerError::work(failure))),
                // 失敗済み・終了済みの呼び出しからの到着は破棄
                _ => continue,
            },
            ConsumerMessage::Result { call_id, item } => match active.as_mut() {
                Some(call) if call.call_id == call_id => {
                    let ActiveCall {
                        config,
                        credits,
                        consumed,
                        ..
                    } = call;
                    let accepted = sequencer.accept(item, |index, payload| {
                        call_hook(HookKind::ConsumerWork, || {
                            pipeline.consumer_work(config, payload)
                        })
                        .map_err(|failure| RunnerError::work(failure.with_index(index)))?;
                        *consumed += 1;
                        // 容量は配布数と同じなので満杯にはならない。受信側が閉じていれば不要
                        let _ = credits.try_send(());
                        reporter.report_progress(call_id, *consumed);
                        Ok(())
                    });
                    accepted.err().map(Err)
                }
                _ => continue,
            },
        };

        // 失敗していなければ完了判定
        let outcome = match outcome {
            Some(failed) => Some(failed),
            None => match active.as_mut() {
                Some(call) if call.is_complete() => {
                    Some(call_hook(HookKind::ConsumerEnd, || {
                        pipeline.consumer_end(&mut call.config)
                    })
                    .map_err(RunnerError::work))
                }
                _ => None,
            },
        };

        if let Some(outcome) = outcome {
            let Some(call) = active.take() else {
                continue;
            };
            tracing::debug!(
                call_id = call.call_id,
                consumed = call.consumed,
                ok = outcome.is_ok(),
                "call finished"
            );
            let reply = CallReply {
                call_id: call.call_id,
                outcome,
            };
            let sent = reply_tx.blocking_send(reply);
            // 応答を送ってからクレジットを閉じる
            drop(call);
            if sent.is_err() {
                break; // ランナー側が閉じた
            }
        }
    }

    tracing::debug!("consumer shutting down");
}
