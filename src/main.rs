use anyhow::Result;
use clap::Parser;
use parallel_runner::cli::{self, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ランナーはブロッキングAPIでワーカーと通信するため、非同期ランタイムは使わない
fn main() -> Result<()> {
    // ログは標準エラーへ（標準出力は結果用）
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("parallel_runner=warn".parse()?))
        .init();

    cli::run(Cli::parse())
}
