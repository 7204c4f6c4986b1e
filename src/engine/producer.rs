// Producer - デバイスごとのワーカースレッド

use super::protocol::{call_hook, ConsumerMessage, ProducerMessage, WorkerControl};
use crate::core::{Device, HookFailure, HookKind, Pipeline, ResultItem};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot, Mutex};

/// 全Producerで共有する入力キューの受信側
pub(crate) type SharedWorkReceiver<I> = Arc<Mutex<mpsc::Receiver<ProducerMessage<I>>>>;

pub(crate) struct ProducerContext<P: Pipeline> {
    pub worker_id: usize,
    pub device: Device,
    pub pipeline: Arc<P>,
    pub config: P::Config,
    pub work_rx: SharedWorkReceiver<P::Input>,
    pub result_tx: mpsc::Sender<ConsumerMessage<P::Output>>,
    pub control: Arc<WorkerControl>,
}

/// Producerスレッドを起動する
///
/// producer_initの結果は`ready_tx`で通知される。スレッドは入力キューが
/// 閉じられるまで呼び出しをまたいで動き続け、最後にproducer_endを実行する。
pub(crate) fn spawn_producer<P: Pipeline>(
    name: String,
    ctx: ProducerContext<P>,
    ready_tx: oneshot::Sender<Result<(), HookFailure>>,
) -> std::io::Result<JoinHandle<Result<(), HookFailure>>> {
    std::thread::Builder::new()
        .name(name)
        .spawn(move || run_producer(ctx, ready_tx))
}

fn run_producer<P: Pipeline>(
    ctx: ProducerContext<P>,
    ready_tx: oneshot::Sender<Result<(), HookFailure>>,
) -> Result<(), HookFailure> {
    let ProducerContext {
        worker_id,
        device,
        pipeline,
        mut config,
        work_rx,
        result_tx,
        control,
    } = ctx;

    if let Err(failure) = call_hook(HookKind::ProducerInit, || {
        pipeline.producer_init(&device, &mut config)
    }) {
        // 初期化失敗はready経由で報告済み。endは実行しない
        let _ = ready_tx.send(Err(failure.with_device(&device)));
        return Ok(());
    }
    let _ = ready_tx.send(Ok(()));
    tracing::debug!(worker_id, %device, "producer ready");

    let mut processed_in_call = 0_u64;
    loop {
        let message = {
            let mut rx = work_rx.blocking_lock();
            rx.blocking_recv()
        };
        let Some(message) = message else {
            break; // 入力キュー終了 = ランナーのclose
        };

        match message {
            ProducerMessage::EndOfCall { call_id } => {
                tracing::debug!(worker_id, call_id, processed = processed_in_call, "end of call");
                processed_in_call = 0;
            }
            ProducerMessage::Work { call_id, item } => {
                if control.should_skip(call_id) {
                    continue;
                }
                let index = item.index;
                let outcome = call_hook(HookKind::ProducerWork, || {
                    pipeline.producer_work(&device, &mut config, item.payload)
                });
                let message = match outcome {
                    Ok(output) => ConsumerMessage::Result {
                        call_id,
                        item: ResultItem::new(index, output),
                    },
                    Err(failure) => ConsumerMessage::Failure {
                        call_id,
                        failure: failure.with_device(&device).with_index(index),
                    },
                };
                processed_in_call += 1;

                if result_tx.blocking_send(message).is_err() {
                    // Consumer終了済み
                    break;
                }
            }
        }
    }

    tracing::debug!(worker_id, %device, "producer shutting down");
    call_hook(HookKind::ProducerEnd, || pipeline.producer_end(&device, &mut config))
        .map_err(|failure| failure.with_device(&device))
}
