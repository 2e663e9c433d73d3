//! ビルトインコマンドの実装。
//!
//! ビルトインは fork/exec を経由せずプロセス内で直接実行される。
//! 表は [`BuiltinKind::ALL`] の順で、名前の完全一致（大文字小文字を区別）で引く。
//! 出力先は呼び出し側から渡すため、テストでは `Vec<u8>` に書き込める。

use std::env;
use std::io::{self, Write};

use crate::shell::{Flow, Session};

/// ビルトインの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Cd,
    Help,
    Exit,
    Say,
    History,
}

impl BuiltinKind {
    /// 照合順のビルトイン表。
    pub const ALL: [BuiltinKind; 5] = [
        BuiltinKind::Cd,
        BuiltinKind::Help,
        BuiltinKind::Exit,
        BuiltinKind::Say,
        BuiltinKind::History,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Cd => "cd",
            BuiltinKind::Help => "help",
            BuiltinKind::Exit => "exit",
            BuiltinKind::Say => "say",
            BuiltinKind::History => "history",
        }
    }

    /// 名前に完全一致するビルトインを表の順に探す。
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// ビルトインを実行する。`args[0]` はコマンド名自身。
    pub fn run(
        self,
        session: &mut Session,
        args: &[&str],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<Flow> {
        match self {
            BuiltinKind::Cd => builtin_cd(args, err),
            BuiltinKind::Help => builtin_help(out),
            BuiltinKind::Exit => Ok(Flow::Exit),
            BuiltinKind::Say => builtin_say(args, out, err),
            BuiltinKind::History => builtin_history(session, out),
        }
    }
}

/// `cd <dir>` — カレントディレクトリを変更する。引数は必須。
fn builtin_cd(args: &[&str], err: &mut dyn Write) -> io::Result<Flow> {
    match args.get(1) {
        None => writeln!(err, "lsh: expected argument to \"cd\"")?,
        Some(target) => {
            if let Err(e) = env::set_current_dir(target) {
                writeln!(err, "lsh: cd: {}: {}", target, e)?;
            }
        }
    }
    Ok(Flow::Continue)
}

fn builtin_help(out: &mut dyn Write) -> io::Result<Flow> {
    writeln!(out, "lsh")?;
    writeln!(out, "Type program names and arguments, and hit enter.")?;
    writeln!(out, "The following are built in:")?;
    for builtin in BuiltinKind::ALL {
        writeln!(out, " {}", builtin.name())?;
    }
    writeln!(out, "Use the man command for information on other programs.")?;
    Ok(Flow::Continue)
}

/// `say <word...>` — 引数を空白 1 つで連結して出力する。
fn builtin_say(args: &[&str], out: &mut dyn Write, err: &mut dyn Write) -> io::Result<Flow> {
    if args.len() < 2 {
        writeln!(err, "lsh: expected argument to \"say\"")?;
    } else {
        writeln!(out, "{}", args[1..].join(" "))?;
    }
    Ok(Flow::Continue)
}

/// `history` — 保存済みの行を古い順に 1 行ずつ出力する。
fn builtin_history(session: &Session, out: &mut dyn Write) -> io::Result<Flow> {
    for entry in session.history.iter() {
        writeln!(out, "{}", entry)?;
    }
    Ok(Flow::Continue)
}
