//! シェルのセッション状態。
//!
//! グローバル変数を使わず、REPL ループが所有する [`Session`] にまとめて
//! エディタとディスパッチャへ明示的に渡す。ターミナルモードは
//! [`RawMode`](crate::terminal::RawMode) のガードとして `main` が別に保持する。

use std::collections::TryReserveError;
use std::io::Write;

use crate::config::Config;
use crate::editor::LineEditor;
use crate::executor;
use crate::history::History;
use crate::tokenizer;

/// ビルトイン・外部コマンドの実行後に REPL ループを続けるかどうか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// REPL ループ全体で共有されるセッション。
pub struct Session {
    /// 確定した行の履歴。プロセス終了まで保持する。
    pub history: History,
    pub editor: LineEditor,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            history: History::new(),
            editor: LineEditor::new(config.prompt.clone()),
        }
    }

    /// 行を履歴に保存する。容量確保の失敗は致命的エラー。
    pub fn archive(&mut self, line: &str) {
        if let Err(e) = self.history.append(line) {
            fatal_allocation_error(e);
        }
    }

    /// 確定した 1 行を処理する: 分割 → 引数があれば履歴に保存 → 実行。
    ///
    /// 引数は `line` へのスライスで、履歴には別のコピーが入る。
    /// 空白だけの行は保存せず、何も実行しない。
    pub fn submit(&mut self, line: &str, out: &mut dyn Write, err: &mut dyn Write) -> Flow {
        let args = tokenizer::split_line(line);
        if args.is_empty() {
            return Flow::Continue;
        }
        self.archive(line);
        executor::execute(self, &args, out, err)
    }
}

/// 確保失敗を報告して即座に終了する。
/// 端末設定は `atexit` フックで復元される。
pub fn fatal_allocation_error(err: TryReserveError) -> ! {
    tracing::error!(%err, "buffer growth failed");
    eprintln!("lsh: allocation error");
    std::process::exit(1);
}
