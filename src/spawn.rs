//! 外部コマンドの起動: `fork` → `execvp` → `waitpid` の同期ライフサイクル。
//!
//! 一度に追跡する子プロセスは 1 つだけ。親は子が終了するかシグナルで殺されるまで
//! ブロックして待ち、その後プロンプトに戻る。子の終了ステータスはログに残すだけで、
//! REPL ループの継続判定には影響しない。
//!
//! ## 構成
//!
//! | 型 | 役割 |
//! |-----|------|
//! | [`CStringVec`] | argv 用の NULL 終端ポインタ配列 |
//! | [`ChildStatus`] | 待機結果（正常終了 / シグナル終了） |
//! | [`run_foreground`] | fork + exec + wait を 1 回行う |
//! | [`launch`] | ディスパッチャから呼ばれる入口。常に [`Flow::Continue`] |

use std::ffi::{CStr, CString, NulError};
use std::io::{self, Write};

use thiserror::Error;

use crate::shell::Flow;

/// 子プロセスの起動・待機の失敗。
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{command}: argument contains a NUL byte")]
    InvalidArgument {
        command: String,
        #[source]
        source: NulError,
    },
    #[error("no command given")]
    EmptyCommand,
    #[error("fork: {0}")]
    Fork(#[source] io::Error),
    #[error("waitpid: {0}")]
    Wait(#[source] io::Error),
}

/// 子プロセスの最終状態。停止通知（`WIFSTOPPED`）は含まない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    Exited(i32),
    Signaled(i32),
}

// ── CStringVec ────────────────────────────────────────────────────

/// argv 用の CString ベクタ。NULL 終端のポインタ配列を構築する。
struct CStringVec {
    strings: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
}

impl CStringVec {
    /// 引数リストから構築する。NUL を含む引数があればエラー。
    fn from_args(args: &[&str]) -> Result<Self, NulError> {
        let strings = args
            .iter()
            .map(|s| CString::new(*s))
            .collect::<Result<Vec<_>, _>>()?;
        let mut ptrs: Vec<*const libc::c_char> = strings.iter().map(|s| s.as_ptr()).collect();
        ptrs.push(std::ptr::null());
        Ok(Self { strings, ptrs })
    }

    fn program(&self) -> *const libc::c_char {
        self.strings[0].as_ptr()
    }

    fn as_ptr(&self) -> *const *const libc::c_char {
        self.ptrs.as_ptr()
    }
}

// ── 子プロセス側 ──────────────────────────────────────────────────

/// `execvp` に失敗した子プロセスの後始末。`lsh: <cmd>: <strerror>` を `diag_fd` に出して `_exit(1)`。
///
/// fork 後の子ではアロケーションやロック取得を避け、`write(2)` だけで出力する。
fn exec_failed(prefix: &[u8], diag_fd: i32) -> ! {
    let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
    unsafe {
        let msg = CStr::from_ptr(libc::strerror(errno)).to_bytes();
        for part in [prefix, msg, &b"\n"[..]] {
            libc::write(diag_fd, part.as_ptr() as *const libc::c_void, part.len());
        }
        libc::_exit(1);
    }
}

// ── 親プロセス側 ──────────────────────────────────────────────────

/// `pid` の子が終了するかシグナルで殺されるまで待つ。
/// 停止通知と `EINTR` は読み飛ばし、確定した結果だけを返す。
pub fn wait_for(pid: libc::pid_t) -> io::Result<ChildStatus> {
    loop {
        let mut status = 0i32;
        let ret = unsafe { libc::waitpid(pid, &mut status, libc::WUNTRACED) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if libc::WIFEXITED(status) {
            return Ok(ChildStatus::Exited(libc::WEXITSTATUS(status)));
        }
        if libc::WIFSIGNALED(status) {
            return Ok(ChildStatus::Signaled(libc::WTERMSIG(status)));
        }
        tracing::debug!(pid, status, "ignoring non-terminal wait status");
    }
}

/// `args[0]` を PATH 検索で実行し、終了するまで待つ。
///
/// 子プロセスは `execvp` に成功すれば戻らず、失敗すればその場で `_exit(1)` する。
/// 共有のシェルロジックに戻ることはない。
pub fn run_foreground(args: &[&str]) -> Result<ChildStatus, LaunchError> {
    spawn_and_wait(args, libc::STDERR_FILENO)
}

/// [`run_foreground`] の本体。exec 失敗時のメッセージは `diag_fd` に書く。
fn spawn_and_wait(args: &[&str], diag_fd: i32) -> Result<ChildStatus, LaunchError> {
    let Some(&program) = args.first() else {
        return Err(LaunchError::EmptyCommand);
    };
    let argv = CStringVec::from_args(args).map_err(|source| LaunchError::InvalidArgument {
        command: program.to_string(),
        source,
    })?;
    let prefix = format!("lsh: {}: ", program);

    // 親のバッファ済み出力が子に複製されないよう fork 前に吐き出す
    if let Err(e) = io::stdout().flush() {
        tracing::warn!(error = %e, "failed to flush stdout before fork");
    }

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(LaunchError::Fork(io::Error::last_os_error()));
    }

    if pid == 0 {
        unsafe {
            libc::execvp(argv.program(), argv.as_ptr());
        }
        exec_failed(prefix.as_bytes(), diag_fd);
    }

    tracing::debug!(pid, command = program, "spawned child");
    wait_for(pid).map_err(LaunchError::Wait)
}

/// 外部コマンドを前景で実行する。結果に関わらずループは継続する。
pub fn launch(args: &[&str]) -> Flow {
    let program = args.first().copied().unwrap_or_default();
    match run_foreground(args) {
        Ok(ChildStatus::Exited(code)) => {
            tracing::debug!(command = program, code, "child exited");
        }
        Ok(ChildStatus::Signaled(signal)) => {
            tracing::debug!(command = program, signal, "child killed by signal");
        }
        Err(e) => eprintln!("lsh: {}", e),
    }
    Flow::Continue
}
