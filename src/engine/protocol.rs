// ワーカー間でやり取りするメッセージと制御フラグ

use crate::core::{HookFailure, HookKind, ResultItem, RunnerError, WorkItem};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;

/// 入力キューを流れるメッセージ
#[derive(Debug)]
pub(crate) enum ProducerMessage<I> {
    Work { call_id: u64, item: WorkItem<I> },
    /// 呼び出し終了の番兵
    ///
    /// 受け取ったProducerはデバッグログを出すだけで、終了も待機もせず次の
    /// メッセージの受信に戻る。呼び出しの完了判定はConsumer側の件数で行い、
    /// Producerの停止は入力キューのクローズで行う。
    EndOfCall { call_id: u64 },
}

/// 出力キューを流れるメッセージ
#[derive(Debug)]
pub(crate) enum ConsumerMessage<O> {
    /// 呼び出し開始。`credits`には1件消費するごとにクレジットを1つ返す
    Begin {
        call_id: u64,
        credits: mpsc::Sender<()>,
    },
    Result { call_id: u64, item: ResultItem<O> },
    Failure { call_id: u64, failure: HookFailure },
    /// 投入総数の確定
    Sealed { call_id: u64, total: u64 },
    Stop,
}

/// Consumerからランナーへの応答
#[derive(Debug)]
pub(crate) struct CallReply<A> {
    pub call_id: u64,
    pub outcome: Result<A, RunnerError>,
}

/// 全ワーカーが参照する停止・キャンセル状態
#[derive(Debug, Default)]
pub(crate) struct WorkerControl {
    shutdown: AtomicBool,
    cancelled_through: AtomicU64,
}

impl WorkerControl {
    pub fn begin_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// `call_id`以前の呼び出しの残作業を破棄させる
    pub fn cancel_through(&self, call_id: u64) {
        self.cancelled_through.fetch_max(call_id, Ordering::AcqRel);
    }

    pub fn should_skip(&self, call_id: u64) -> bool {
        self.is_shutting_down() || call_id <= self.cancelled_through.load(Ordering::Acquire)
    }
}

/// フックを実行し、エラーとpanicを`HookFailure`に変換する
pub(crate) fn call_hook<R>(
    hook: HookKind,
    f: impl FnOnce() -> anyhow::Result<R>,
) -> Result<R, HookFailure> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(HookFailure::new(hook, source)),
        Err(payload) => Err(HookFailure::from_panic(hook, payload)),
    }
}
