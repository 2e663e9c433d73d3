//! lsh — raw モードの行エディタを持つ小さな対話シェル
//!
//! REPLループ: プロンプト表示 → 行エディタで入力読み取り → [`Session::submit`]（分割 → 履歴に保存 → 実行） → ループ
//!
//! ターミナルは起動時に一度だけ raw モードに切り替え、終了時に元へ戻す。

use std::io;

use anyhow::Context;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

use lsh::config::{self, Config};
use lsh::editor::EditorError;
use lsh::shell::{self, Flow, Session};
use lsh::terminal::{FdReader, FdWriter, RawMode};

fn init_tracing_subscriber() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env(config::LOG_LEVEL_VAR))
        .with_writer(io::stderr)
        .with_timer(ChronoLocal::rfc_3339())
        .init();
}

/// 入力ストリームが閉じるか `exit` が呼ばれるまで行を読んで実行する。
fn run(session: &mut Session) -> anyhow::Result<()> {
    let mut input = FdReader::stdin();
    let mut echo = FdWriter::stdout();

    loop {
        let line = match session
            .editor
            .read_line(&mut input, &mut echo, &session.history)
        {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("input stream closed");
                return Ok(());
            }
            Err(EditorError::Alloc(e)) => shell::fatal_allocation_error(e),
            Err(EditorError::Io(e)) => return Err(e).context("failed to read from terminal"),
        };

        let stdout = io::stdout();
        let stderr = io::stderr();
        let flow = session.submit(&line, &mut stdout.lock(), &mut stderr.lock());
        if flow == Flow::Exit {
            return Ok(());
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing_subscriber();

    let config = Config::from_env();
    let _raw = RawMode::enable(libc::STDIN_FILENO).context("failed to configure terminal")?;

    let mut session = Session::new(&config);
    run(&mut session)
}
