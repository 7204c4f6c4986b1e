// CLI層 - コマンドライン引数の定義と処理
// ユーザーインターフェースとランナーの橋渡し

pub mod args;
pub mod commands;

// 公開API
pub use args::*;
pub use commands::*;

use anyhow::Result;

/// 解析済みの引数に応じてサブコマンドを実行
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::SumSquares { pool } => execute_sum_squares(pool),
        Commands::Squares { pool, unordered } => execute_squares(pool, unordered),
    }
}
