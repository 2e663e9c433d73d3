//! ターミナルモードの切り替えと、端末 fd への生の入出力。
//!
//! 起動時に一度だけ [`RawMode::enable`] で raw モードに入り、プロセス終了まで維持する。
//! 元の termios は RAII ガードの Drop と `atexit(3)` フックの両方で復元されるため、
//! `std::process::exit` による即時終了（致命的エラー）でも端末が壊れたまま残らない。
//!
//! ## termios 設定
//!
//! | フラグ | 操作 |
//! |--------|------|
//! | `c_lflag` | `ECHO\|ICANON` OFF（1 バイトずつ読み取り、エコーなし） |
//! | その他 | 変更しない（`OPOST` の `\n` → `\r\n` 変換、`ISIG` はそのまま） |

use std::io::{self, Read, Write};
use std::sync::OnceLock;

use thiserror::Error;

/// termios の取得・設定の失敗。起動時の致命的エラーとして扱う。
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("tcgetattr failed on fd {fd}: {source}")]
    Query { fd: i32, source: io::Error },
    #[error("tcsetattr failed on fd {fd}: {source}")]
    Apply { fd: i32, source: io::Error },
}

/// `enable` 時に保存した (fd, termios)。`atexit` フックから参照する。
static SAVED: OnceLock<(i32, libc::termios)> = OnceLock::new();

extern "C" fn restore_at_exit() {
    if let Some((fd, orig)) = SAVED.get() {
        unsafe {
            libc::tcsetattr(*fd, libc::TCSAFLUSH, orig);
        }
    }
}

/// raw モードの RAII ガード。Drop で元の termios を復元する。
pub struct RawMode {
    orig: libc::termios,
    fd: i32,
}

impl RawMode {
    /// 現在の termios を保存し、終了時の復元フックを登録してから raw モードを適用する。
    pub fn enable(fd: i32) -> Result<Self, TerminalError> {
        let mut orig: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut orig) } != 0 {
            return Err(TerminalError::Query {
                fd,
                source: io::Error::last_os_error(),
            });
        }

        if SAVED.set((fd, orig)).is_ok() {
            unsafe {
                libc::atexit(restore_at_exit);
            }
        }

        let mut raw = orig;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON);
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw) } != 0 {
            return Err(TerminalError::Apply {
                fd,
                source: io::Error::last_os_error(),
            });
        }
        tracing::debug!(fd, "terminal switched to raw mode");
        Ok(Self { orig, fd })
    }

    /// 保存した termios をそのまま書き戻す。
    pub fn disable(&self) {
        unsafe {
            libc::tcsetattr(self.fd, libc::TCSAFLUSH, &self.orig);
        }
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        self.disable();
        tracing::debug!(fd = self.fd, "terminal attributes restored");
    }
}

// ── fd 直結の入出力 ───────────────────────────────────────────────

/// `libc::read` で 1 回ずつ読み取る入力。Rust の stdin バッファを経由しない。
pub struct FdReader {
    fd: i32,
}

impl FdReader {
    pub fn new(fd: i32) -> Self {
        Self { fd }
    }

    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }
}

impl Read for FdReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

/// `libc::write` で直接出力する（Rust の stdout バッファをバイパス）。
pub struct FdWriter {
    fd: i32,
}

impl FdWriter {
    pub fn new(fd: i32) -> Self {
        Self { fd }
    }

    pub fn stdout() -> Self {
        Self::new(libc::STDOUT_FILENO)
    }
}

impl Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
