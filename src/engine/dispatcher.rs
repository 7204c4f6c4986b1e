// Dispatcher - 入力列に連番を振って入力キューへ配信

use super::protocol::ProducerMessage;
use crate::core::{RunnerError, RunnerResult, WorkItem};
use tokio::sync::mpsc;

/// 配信結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DispatchReport {
    pub dispatched: u64,
    pub interrupted: bool,
}

/// 入力列を遅延的に読みながら配信する
///
/// 1件読むごとに`credits`から1つ受け取る。クレジットはConsumerが1件消費する
/// たびに返却されるため、未消費の件数はクレジット総数を超えない。入力キューが
/// 満杯の間も送信でブロックする。`interrupted`がtrueを返すと次の要素を読まずに
/// 打ち切る。
pub(crate) fn dispatch<I>(
    call_id: u64,
    items: impl IntoIterator<Item = I>,
    work_tx: &mpsc::Sender<ProducerMessage<I>>,
    credits: &mut mpsc::Receiver<()>,
    mut interrupted: impl FnMut() -> bool,
) -> RunnerResult<DispatchReport> {
    let mut items = items.into_iter();
    let mut dispatched = 0;
    let report = |dispatched, interrupted| DispatchReport {
        dispatched,
        interrupted,
    };

    loop {
        if interrupted() {
            return Ok(report(dispatched, true));
        }
        // Consumerが呼び出しを終えると返却側が閉じる
        if credits.blocking_recv().is_none() {
            if interrupted() {
                return Ok(report(dispatched, true));
            }
            return Err(RunnerError::channel("Consumerからのクレジット返却が途絶えました"));
        }
        let Some(payload) = items.next() else {
            break;
        };
        let message = ProducerMessage::Work {
            call_id,
            item: WorkItem::new(dispatched, payload),
        };
        if work_tx.blocking_send(message).is_err() {
            return Err(RunnerError::channel("入力キューが閉じられています"));
        }
        dispatched += 1;
    }

    Ok(report(dispatched, false))
}

/// Producerごとに呼び出し終了の番兵を送る
pub(crate) fn send_end_of_call<I>(
    call_id: u64,
    producer_count: usize,
    work_tx: &mpsc::Sender<ProducerMessage<I>>,
) -> RunnerResult<()> {
    for _ in 0..producer_count {
        work_tx
            .blocking_send(ProducerMessage::EndOfCall { call_id })
            .map_err(|_| RunnerError::channel("入力キューが閉じられています"))?;
    }
    Ok(())
}
