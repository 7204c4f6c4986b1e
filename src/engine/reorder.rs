// ReorderBuffer - 連番をキーにした順序復元バッファ

use crate::core::{RunnerError, RunnerResult, SequenceIndex};
use std::collections::HashMap;

/// 早着した結果を保持し、期待する連番から連続する分だけ取り出す
///
/// 挿入・取り出しともに償却O(1)。全体のソートは行わない。
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: SequenceIndex,
    pending: HashMap<SequenceIndex, T>,
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: HashMap::new(),
        }
    }

    /// 次に取り出される連番
    pub fn next_index(&self) -> SequenceIndex {
        self.next
    }

    /// 取り出し待ちの件数
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// 結果を登録。取り出し済みまたは登録済みの連番はエラー
    pub fn insert(&mut self, index: SequenceIndex, payload: T) -> RunnerResult<()> {
        if index < self.next {
            return Err(RunnerError::sequencing(format!(
                "連番{index}は既に消費済みです (next={})",
                self.next
            )));
        }
        if self.pending.contains_key(&index) {
            return Err(RunnerError::sequencing(format!("連番{index}が重複しています")));
        }
        self.pending.insert(index, payload);
        Ok(())
    }

    /// 期待する連番が揃っていれば取り出してカーソルを進める
    pub fn pop_ready(&mut self) -> Option<(SequenceIndex, T)> {
        let payload = self.pending.remove(&self.next)?;
        let index = self.next;
        self.next += 1;
        Some((index, payload))
    }

    /// 連続して取り出せる分を順に返すイテレータ
    pub fn drain_ready(&mut self) -> DrainReady<'_, T> {
        DrainReady { buffer: self }
    }

    /// 新しい呼び出しのために初期状態へ戻す
    pub fn reset(&mut self) {
        self.next = 0;
        self.pending.clear();
    }
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DrainReady<'a, T> {
    buffer: &'a mut ReorderBuffer<T>,
}

impl<T> Iterator for DrainReady<'_, T> {
    type Item = (SequenceIndex, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.pop_ready()
    }
}
