//! コマンドのディスパッチ: ビルトイン判定と外部コマンドへの委譲。
//!
//! - 空の引数列: 何もせず [`Flow::Continue`]
//! - 先頭がビルトイン名に完全一致: [`BuiltinKind::run`]（fork なし）
//! - それ以外: [`spawn::launch`] で前景実行

use std::io::Write;

use crate::builtins::BuiltinKind;
use crate::shell::{Flow, Session};
use crate::spawn;

/// 引数列を実行し、REPL ループを続けるかどうかを返す。
pub fn execute(
    session: &mut Session,
    args: &[&str],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Flow {
    let Some(&name) = args.first() else {
        return Flow::Continue;
    };

    match BuiltinKind::lookup(name) {
        Some(builtin) => {
            tracing::debug!(builtin = name, argc = args.len(), "running builtin");
            let flow = builtin.run(session, args, out, err).unwrap_or_else(|e| {
                tracing::warn!(builtin = name, error = %e, "builtin output failed");
                Flow::Continue
            });
            flush_output(out);
            flow
        }
        None => {
            flush_output(out);
            spawn::launch(args)
        }
    }
}

/// ビルトインの出力を吐き出す。失敗はログに残してループを続ける。
fn flush_output(out: &mut dyn Write) {
    if let Err(e) = out.flush() {
        tracing::warn!(error = %e, "failed to flush command output");
    }
}
