//! 行エディタ: キー入力の解釈、バッファ操作、表示更新、↑↓ による履歴呼び出し。
//!
//! ターミナルは起動時に [`RawMode`](crate::terminal::RawMode) で raw モードに入っているため、
//! 入力は 1 バイトずつ届き、端末側のエコーもない。表示はすべてこのエディタが書き出す。
//!
//! ## 状態遷移
//!
//! ```text
//!            印字可能文字 / Backspace
//!              ┌──────────┐
//!              ▼          │
//!       ┌──────────────┐──┘     ESC      ┌────────────────┐
//!  ───▶ │ ACCUMULATING │ ───────────────▶ │ ESCAPE_PENDING │
//!       └──────────────┘ ◀─────────────── └────────────────┘
//!              │            2 バイト読んで解決（[A / [B / その他）
//!              │ Enter / Ctrl+D
//!              ▼
//!           確定（バッファを返す）
//! ```
//!
//! 入出力は [`Read`] / [`Write`] で受け取る。本番では
//! [`FdReader`](crate::terminal::FdReader) / [`FdWriter`](crate::terminal::FdWriter)、
//! テストではバイト列と `Vec<u8>` を渡す。
//!
//! ## 表示更新
//!
//! 履歴呼び出し時は `ESC[2K` で行全体を消し、`\r` で行頭に戻ってプロンプト + バッファを
//! 1 回の書き込みで出力する。行内のカーソル移動（←→）は扱わない。

use std::collections::TryReserveError;
use std::io::{self, Read, Write};

use thiserror::Error;

use crate::history::History;

/// 行バッファの初期容量（バイト）。満杯になるたびに倍にする。
pub const INITIAL_CAPACITY: usize = 1024;

/// 行全体を消して行頭に戻るシーケンス。
const CLEAR_LINE: &str = "\x1b[2K\r";

/// Backspace の表示上の消去（1 文字戻って空白で上書きし、また戻る）。
const ERASE_GLYPH: &[u8] = b"\x08 \x08";

#[derive(Debug, Error)]
pub enum EditorError {
    /// バッファの拡張に失敗した。呼び出し側で致命的エラーとして扱う。
    #[error("allocation error")]
    Alloc(#[from] TryReserveError),
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

// ── Key 入力 ──────────────────────────────────────────────────────

/// raw モードで読み取ったキー入力。
#[derive(Debug, PartialEq, Eq)]
pub enum Key {
    /// 挿入する文字（ASCII 印字可能文字、タブ、UTF-8 マルチバイト文字）。
    Char(char),
    /// LF または CR。
    Enter,
    /// Ctrl+D（`0x04`）。Enter と同じく行を確定する。
    Eot,
    /// DEL `0x7f` または BS `0x08`。
    Backspace,
    /// `ESC [ A`
    Up,
    /// `ESC [ B`
    Down,
    /// 未対応のバイト列。無視される。
    Unknown,
}

/// 1 バイト読み取る。EOF なら `None`。`EINTR` は読み直す。
fn read_byte<R: Read>(input: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// ESC の後ろの 2 バイトを同期的に読み取り、矢印キーかどうかを判定する。
fn read_escape_seq<R: Read>(input: &mut R) -> io::Result<Option<Key>> {
    let first = match read_byte(input)? {
        Some(b) => b,
        None => return Ok(None),
    };
    let second = match read_byte(input)? {
        Some(b) => b,
        None => return Ok(None),
    };
    Ok(Some(match (first, second) {
        (b'[', b'A') => Key::Up,
        (b'[', b'B') => Key::Down,
        _ => Key::Unknown,
    }))
}

/// UTF-8 マルチバイト文字の残りのバイトを読み取り、`Key::Char` に変換する。
fn read_utf8<R: Read>(input: &mut R, first: u8, expected_len: usize) -> io::Result<Option<Key>> {
    let mut buf = [0u8; 4];
    buf[0] = first;
    for slot in buf.iter_mut().take(expected_len).skip(1) {
        match read_byte(input)? {
            Some(b) => *slot = b,
            None => return Ok(None),
        }
    }
    Ok(Some(match std::str::from_utf8(&buf[..expected_len]) {
        Ok(s) => s.chars().next().map_or(Key::Unknown, Key::Char),
        Err(_) => Key::Unknown,
    }))
}

/// 1 キー分のバイト列を読み取る。入力ストリームが閉じていれば `None`。
pub fn read_key<R: Read>(input: &mut R) -> io::Result<Option<Key>> {
    let byte = match read_byte(input)? {
        Some(b) => b,
        None => return Ok(None),
    };

    match byte {
        b'\n' | b'\r' => Ok(Some(Key::Enter)),
        0x04 => Ok(Some(Key::Eot)),
        0x7f | 0x08 => Ok(Some(Key::Backspace)),
        0x1b => read_escape_seq(input),
        b'\t' => Ok(Some(Key::Char('\t'))),
        b if (32..127).contains(&b) => Ok(Some(Key::Char(b as char))),
        b if b & 0xE0 == 0xC0 => read_utf8(input, b, 2),
        b if b & 0xF0 == 0xE0 => read_utf8(input, b, 3),
        b if b & 0xF8 == 0xF0 => read_utf8(input, b, 4),
        _ => Ok(Some(Key::Unknown)),
    }
}

// ── LineEditor ────────────────────────────────────────────────────

/// 行エディタ本体。入力バッファ、カーソル位置、履歴のナビゲーション位置を保持する。
pub struct LineEditor {
    /// 現在の入力テキスト。`read_line` ごとに作り直す。
    buf: String,
    /// カーソルのバイトオフセット。常に `0..=buf.len()` かつ UTF-8 文字境界上。
    cursor: usize,
    /// 履歴のナビゲーション位置。`None` は履歴を閲覧していない状態。
    nav: Option<usize>,
    prompt: String,
}

impl LineEditor {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            buf: String::new(),
            cursor: 0,
            nav: None,
            prompt: prompt.into(),
        }
    }

    /// プロンプトを表示し、1 行読み取る。
    ///
    /// Enter / Ctrl+D → `Some(line)`（空文字列もありうる）。
    /// 入力ストリームが閉じたら、入力途中の行があればそれを、なければ `None` を返す。
    pub fn read_line<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        out: &mut W,
        history: &History,
    ) -> Result<Option<String>, EditorError> {
        self.buf = String::new();
        self.buf.try_reserve_exact(INITIAL_CAPACITY)?;
        self.cursor = 0;
        self.nav = None;

        out.write_all(self.prompt.as_bytes())?;
        out.flush()?;

        loop {
            let key = match read_key(input)? {
                Some(key) => key,
                None => {
                    if self.buf.is_empty() {
                        return Ok(None);
                    }
                    out.write_all(b"\n")?;
                    return Ok(Some(std::mem::take(&mut self.buf)));
                }
            };
            match key {
                Key::Enter | Key::Eot => {
                    out.write_all(b"\n")?;
                    out.flush()?;
                    return Ok(Some(std::mem::take(&mut self.buf)));
                }
                Key::Char(ch) => {
                    self.insert_char(ch)?;
                    let mut utf8 = [0u8; 4];
                    out.write_all(ch.encode_utf8(&mut utf8).as_bytes())?;
                }
                Key::Backspace => {
                    if self.delete_char_before() {
                        out.write_all(ERASE_GLYPH)?;
                    }
                }
                Key::Up => {
                    if self.history_prev(history)? {
                        self.refresh_line(out)?;
                    }
                }
                Key::Down => {
                    if self.history_next(history)? {
                        self.refresh_line(out)?;
                    }
                }
                Key::Unknown => continue,
            }
            out.flush()?;
        }
    }

    // ── バッファ操作 ──────────────────────────────────────────────

    /// 容量が足りなければ倍に拡張する。失敗時はバッファを変更しない。
    fn grow_if_full(&mut self, additional: usize) -> Result<(), TryReserveError> {
        if self.buf.len() + additional > self.buf.capacity() {
            let grow = self
                .buf
                .capacity()
                .max(INITIAL_CAPACITY)
                .max(additional);
            self.buf.try_reserve_exact(grow)?;
        }
        Ok(())
    }

    /// カーソル位置に 1 文字挿入し、カーソルをその文字の直後に進める。
    fn insert_char(&mut self, ch: char) -> Result<(), TryReserveError> {
        self.grow_if_full(ch.len_utf8())?;
        self.buf.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        Ok(())
    }

    /// Backspace: カーソル直前の 1 文字を削除する。行頭では何もせず `false`。
    fn delete_char_before(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = self.buf[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.buf.remove(prev);
        self.cursor = prev;
        true
    }

    /// バッファ全体を `text` で置き換え、カーソルを末尾に置く。
    fn replace_buffer(&mut self, text: &str) -> Result<(), TryReserveError> {
        if text.len() > self.buf.capacity() {
            self.buf
                .try_reserve_exact(text.len() - self.buf.len())?;
        }
        self.buf.clear();
        self.buf.push_str(text);
        self.cursor = self.buf.len();
        Ok(())
    }

    // ── 履歴ナビゲーション ────────────────────────────────────────

    /// ↑: 一つ古いエントリを呼び出す。初回は最新のエントリ。
    /// 履歴が空、または既に最古なら何もせず `false`。
    fn history_prev(&mut self, history: &History) -> Result<bool, TryReserveError> {
        let index = match self.nav {
            _ if history.is_empty() => return Ok(false),
            None => history.len() - 1,
            Some(0) => return Ok(false),
            Some(i) => i - 1,
        };
        if let Some(entry) = history.get(index) {
            self.replace_buffer(entry)?;
            self.nav = Some(index);
            return Ok(true);
        }
        Ok(false)
    }

    /// ↓: 一つ新しいエントリを呼び出す。最新を越えたらナビゲーションを解除して空行に戻す。
    /// 閲覧中でなければ何もせず `false`。
    fn history_next(&mut self, history: &History) -> Result<bool, TryReserveError> {
        let current = match self.nav {
            Some(i) => i,
            None => return Ok(false),
        };
        match history.get(current + 1) {
            Some(entry) => {
                self.replace_buffer(entry)?;
                self.nav = Some(current + 1);
            }
            None => {
                self.buf.clear();
                self.cursor = 0;
                self.nav = None;
            }
        }
        Ok(true)
    }

    // ── 表示更新 ──────────────────────────────────────────────────

    /// 行全体を消してプロンプト + バッファを再描画する（1 回の書き込み）。
    fn refresh_line<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut line = String::with_capacity(CLEAR_LINE.len() + self.prompt.len() + self.buf.len());
        line.push_str(CLEAR_LINE);
        line.push_str(&self.prompt);
        line.push_str(&self.buf);
        out.write_all(line.as_bytes())
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_history(entries: &[&str]) -> History {
        let mut h = History::new();
        for e in entries {
            h.append(e).unwrap();
        }
        h
    }

    /// バイト列を入力として 1 行読み取り、(結果, 出力) を返す。
    fn run(input: &[u8], history: &History) -> (Option<String>, String) {
        let mut ed = LineEditor::new("> ");
        let mut reader = input;
        let mut out = Vec::new();
        let line = ed.read_line(&mut reader, &mut out, history).unwrap();
        (line, String::from_utf8(out).unwrap())
    }

    #[test]
    fn printable_bytes_are_echoed_and_returned() {
        let (line, out) = run(b"ls -la\n", &History::new());
        assert_eq!(line.as_deref(), Some("ls -la"));
        assert_eq!(out, "> ls -la\n");
    }

    #[test]
    fn empty_line_submits_empty_string() {
        let (line, out) = run(b"\n", &History::new());
        assert_eq!(line.as_deref(), Some(""));
        assert_eq!(out, "> \n");
    }

    #[test]
    fn eot_submits_like_newline() {
        let (line, out) = run(b"pwd\x04rest", &History::new());
        assert_eq!(line.as_deref(), Some("pwd"));
        assert_eq!(out, "> pwd\n");

        let (line, _) = run(b"\x04", &History::new());
        assert_eq!(line.as_deref(), Some(""));
    }

    #[test]
    fn closed_stream_ends_session() {
        let (line, out) = run(b"", &History::new());
        assert_eq!(line, None);
        assert_eq!(out, "> ");

        let (line, _) = run(b"partial", &History::new());
        assert_eq!(line.as_deref(), Some("partial"));
    }

    #[test]
    fn backspace_erases_previous_char() {
        let (line, out) = run(b"ab\x7fc\n", &History::new());
        assert_eq!(line.as_deref(), Some("ac"));
        assert_eq!(out, "> ab\x08 \x08c\n");
    }

    #[test]
    fn backspace_on_empty_buffer_is_noop() {
        let (line, out) = run(b"\x7f\x08x\n", &History::new());
        assert_eq!(line.as_deref(), Some("x"));
        assert_eq!(out, "> x\n");

        let mut ed = LineEditor::new("> ");
        assert!(!ed.delete_char_before());
        assert_eq!(ed.buf, "");
        assert_eq!(ed.cursor, 0);
    }

    #[test]
    fn up_recalls_most_recent_first() {
        let h = make_history(&["one", "two", "three"]);
        let (line, out) = run(b"\x1b[A\n", &h);
        assert_eq!(line.as_deref(), Some("three"));
        assert_eq!(out, "> \x1b[2K\r> three\n");
    }

    #[test]
    fn up_stops_at_oldest() {
        let h = make_history(&["one", "two", "three"]);
        let (line, _) = run(b"\x1b[A\x1b[A\x1b[A\x1b[A\x1b[A\n", &h);
        assert_eq!(line.as_deref(), Some("one"));
    }

    #[test]
    fn walk_up_then_down_past_newest() {
        let h = make_history(&["one", "two", "three"]);
        let mut ed = LineEditor::new("> ");

        let mut seen = Vec::new();
        for _ in 0..3 {
            assert!(ed.history_prev(&h).unwrap());
            seen.push(ed.buf.clone());
        }
        assert_eq!(seen, vec!["three", "two", "one"]);
        assert!(!ed.history_prev(&h).unwrap());
        assert_eq!(ed.buf, "one");
        assert_eq!(ed.nav, Some(0));

        assert!(ed.history_next(&h).unwrap());
        assert_eq!(ed.buf, "two");
        assert!(ed.history_next(&h).unwrap());
        assert_eq!(ed.buf, "three");
        assert!(ed.history_next(&h).unwrap());
        assert_eq!(ed.buf, "");
        assert_eq!(ed.cursor, 0);
        assert_eq!(ed.nav, None);

        assert!(!ed.history_next(&h).unwrap());
    }

    #[test]
    fn recalled_entry_can_be_edited() {
        let h = make_history(&["say hi"]);
        let (line, _) = run(b"\x1b[A\x7fo\n", &h);
        assert_eq!(line.as_deref(), Some("say ho"));
        assert_eq!(h.get(0), Some("say hi"));
    }

    #[test]
    fn down_without_navigation_is_noop() {
        let h = make_history(&["one"]);
        let (line, out) = run(b"ab\x1b[B\n", &h);
        assert_eq!(line.as_deref(), Some("ab"));
        assert_eq!(out, "> ab\n");
    }

    #[test]
    fn up_on_empty_history_is_noop() {
        let (line, out) = run(b"\x1b[Ax\n", &History::new());
        assert_eq!(line.as_deref(), Some("x"));
        assert_eq!(out, "> x\n");
    }

    #[test]
    fn navigation_resets_each_read() {
        let h = make_history(&["one", "two"]);
        let mut ed = LineEditor::new("> ");
        let mut out = Vec::new();

        let mut first: &[u8] = b"\x1b[A\x1b[A\n";
        let line = ed.read_line(&mut first, &mut out, &h).unwrap();
        assert_eq!(line.as_deref(), Some("one"));

        let mut second: &[u8] = b"\x1b[A\n";
        let line = ed.read_line(&mut second, &mut out, &h).unwrap();
        assert_eq!(line.as_deref(), Some("two"));
    }

    #[test]
    fn other_escape_sequences_are_ignored() {
        let (line, out) = run(b"a\x1b[Cb\x1b[Dc\x1bOP\n", &History::new());
        assert_eq!(line.as_deref(), Some("abc"));
        assert_eq!(out, "> abc\n");
    }

    #[test]
    fn control_bytes_are_ignored() {
        let (line, _) = run(b"a\x01\x15b\n", &History::new());
        assert_eq!(line.as_deref(), Some("ab"));
    }

    #[test]
    fn utf8_insert_and_erase() {
        let (line, out) = run("あい\x7f\n".as_bytes(), &History::new());
        assert_eq!(line.as_deref(), Some("あ"));
        assert_eq!(out, "> あい\x08 \x08\n");
    }

    #[test]
    fn buffer_grows_by_doubling() {
        let input: Vec<u8> = std::iter::repeat(b'x')
            .take(INITIAL_CAPACITY * 3)
            .chain(std::iter::once(b'\n'))
            .collect();
        let (line, _) = run(&input, &History::new());
        assert_eq!(line.map(|l| l.len()), Some(INITIAL_CAPACITY * 3));

        let mut ed = LineEditor::new("> ");
        ed.buf.try_reserve_exact(INITIAL_CAPACITY).unwrap();
        let cap = ed.buf.capacity();
        for _ in 0..cap {
            ed.insert_char('x').unwrap();
        }
        assert_eq!(ed.buf.capacity(), cap);
        ed.insert_char('y').unwrap();
        assert!(ed.buf.capacity() >= cap * 2);
        assert_eq!(ed.cursor, cap + 1);
    }

    #[test]
    fn read_key_decodes_arrows() {
        let mut input: &[u8] = b"\x1b[A\x1b[B\x1b[Z";
        assert_eq!(read_key(&mut input).unwrap(), Some(Key::Up));
        assert_eq!(read_key(&mut input).unwrap(), Some(Key::Down));
        assert_eq!(read_key(&mut input).unwrap(), Some(Key::Unknown));
        assert_eq!(read_key(&mut input).unwrap(), None);
    }

    #[test]
    fn truncated_escape_sequence_ends_input() {
        let mut input: &[u8] = b"\x1b[";
        assert_eq!(read_key(&mut input).unwrap(), None);
    }
}
