// 実行ランナーで扱うデータ型定義

use std::fmt;
use std::time::Duration;

/// 1回の呼び出し内での連番（0から始まり密に増加する）
pub type SequenceIndex = u64;

/// Dispatcherが生成しProducerが消費する作業単位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem<T> {
    pub index: SequenceIndex,
    pub payload: T,
}

impl<T> WorkItem<T> {
    pub fn new(index: SequenceIndex, payload: T) -> Self {
        Self { index, payload }
    }
}

/// Producerが生成しConsumerが消費する結果単位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem<T> {
    pub index: SequenceIndex,
    pub payload: T,
}

impl<T> ResultItem<T> {
    pub fn new(index: SequenceIndex, payload: T) -> Self {
        Self { index, payload }
    }
}

/// Consumerへの到着順序ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderingPolicy {
    /// 到着順にそのまま消費（実行ごとに順序は非決定的）
    Unordered,
    /// 入力順を復元してから消費
    Ordered,
}

impl OrderingPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unordered => "unordered",
            Self::Ordered => "ordered",
        }
    }
}

impl fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ランナーのライフサイクル状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// ワーカー起動済み・初期化完了、まだ呼び出しなし
    Created,
    /// 1回以上の呼び出しを処理した
    Running,
    /// close済み、以後の呼び出しは失敗する
    Closed,
}

impl RunnerState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Closed => "CLOSED",
        }
    }

    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ユーザーフックの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    ProducerInit,
    ProducerWork,
    ProducerEnd,
    ConsumerInit,
    ConsumerWork,
    ConsumerEnd,
}

impl HookKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProducerInit => "producer_init",
            Self::ProducerWork => "producer_work",
            Self::ProducerEnd => "producer_end",
            Self::ConsumerInit => "consumer_init",
            Self::ConsumerWork => "consumer_work",
            Self::ConsumerEnd => "consumer_end",
        }
    }

    pub const fn is_init(&self) -> bool {
        matches!(self, Self::ProducerInit | Self::ConsumerInit)
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1回の呼び出しのサマリー
#[derive(Debug, Clone, PartialEq)]
pub struct CallSummary {
    pub call_id: u64,
    pub total_items: u64,
    pub policy: OrderingPolicy,
    pub elapsed: Duration,
}

impl CallSummary {
    /// 1アイテムあたりの平均処理時間（ミリ秒）
    pub fn average_time_per_item_ms(&self) -> f64 {
        if self.total_items > 0 {
            self.elapsed.as_secs_f64() * 1000.0 / self.total_items as f64
        } else {
            0.0
        }
    }
}
