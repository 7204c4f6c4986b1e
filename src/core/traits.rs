// ランナーのトレイト定義
// ユーザーフックと進捗報告の抽象化インターフェース

use super::device::Device;
use super::error::RunnerError;
use super::types::{CallSummary, OrderingPolicy};
use anyhow::Result;
use mockall::automock;

/// Producer/Consumerのライフサイクルフック一式
///
/// `Input`/`Output`/`Aggregate`と`Config`はワーカースレッド間を移動するため
/// `Send + 'static`でなければならない。`Config`の`Clone`はディープコピーとして
/// 扱われ、各Producerは独立したコピーを、Consumerは1つの生存コピーを持つ。
///
/// init/endフックは省略可能で、何もしない既定実装を持つ。
pub trait Pipeline: Send + Sync + 'static {
    type Config: Clone + Send + 'static;
    type Input: Send + 'static;
    type Output: Send + 'static;
    type Aggregate: Send + 'static;

    /// Producerワーカーの起動時に1回だけ呼ばれる
    fn producer_init(&self, _device: &Device, _config: &mut Self::Config) -> Result<()> {
        Ok(())
    }

    /// 入力1件を変換する
    fn producer_work(
        &self,
        device: &Device,
        config: &mut Self::Config,
        input: Self::Input,
    ) -> Result<Self::Output>;

    /// ランナーのclose時に1回だけ呼ばれる
    fn producer_end(&self, _device: &Device, _config: &mut Self::Config) -> Result<()> {
        Ok(())
    }

    /// Consumerワーカーの起動時に1回だけ呼ばれる
    fn consumer_init(&self, _config: &mut Self::Config) -> Result<()> {
        Ok(())
    }

    /// Producerの出力1件を集約する
    fn consumer_work(&self, config: &mut Self::Config, output: Self::Output) -> Result<()>;

    /// 呼び出しごとに1回、全件消費後に呼ばれ集約結果を返す
    fn consumer_end(&self, config: &mut Self::Config) -> Result<Self::Aggregate>;
}

/// 進捗報告の抽象化トレイト
#[automock]
pub trait ProgressReporter: Send + Sync {
    /// 呼び出し開始時の報告
    fn report_started(&self, call_id: u64, policy: OrderingPolicy);

    /// 消費件数の報告（Consumerスレッドから呼ばれる）
    fn report_progress(&self, call_id: u64, consumed: u64);

    /// エラー発生時の報告
    fn report_error(&self, error: &RunnerError);

    /// 呼び出し完了時の報告
    fn report_completed(&self, summary: &CallSummary);
}

// ProgressReporter for Box<dyn ProgressReporter>
impl ProgressReporter for Box<dyn ProgressReporter> {
    fn report_started(&self, call_id: u64, policy: OrderingPolicy) {
        self.as_ref().report_started(call_id, policy)
    }

    fn report_progress(&self, call_id: u64, consumed: u64) {
        self.as_ref().report_progress(call_id, consumed)
    }

    fn report_error(&self, error: &RunnerError) {
        self.as_ref().report_error(error)
    }

    fn report_completed(&self, summary: &CallSummary) {
        self.as_ref().report_completed(summary)
    }
}
