//! コマンド履歴の保持。
//!
//! セッション中に確定した行を古い順に保持する追記専用ストア。
//! エントリは一度追加されたら変更・削除されず、重複排除も上限による削除も行わない。
//!
//! ## 容量
//!
//! 初期容量は [`INITIAL_CAPACITY`]。満杯になるたびに容量を倍にし、縮小はしない。
//! 確保は `try_reserve` で push の前に行うため、失敗してもストアは追加前の状態のまま。
//!
//! ↑↓ のナビゲーション位置は履歴側では持たず、[`editor`](crate::editor) が
//! `read_line` 呼び出しごとに保持する。

use std::collections::TryReserveError;

/// 最初に確保するエントリ数。
pub const INITIAL_CAPACITY: usize = 64;

/// コマンド履歴。エントリは古い順（index 0 が最古）。
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// 行のコピーを末尾に追加する。容量確保に失敗した場合は何も変更せずエラーを返す。
    pub fn append(&mut self, line: &str) -> Result<(), TryReserveError> {
        if self.entries.len() == self.entries.capacity() {
            let grow = self.entries.capacity().max(INITIAL_CAPACITY);
            self.entries.try_reserve_exact(grow)?;
        }
        let mut owned = String::new();
        owned.try_reserve_exact(line.len())?;
        owned.push_str(line);
        self.entries.push(owned);
        Ok(())
    }

    /// `index` 番目（0 = 最古）のエントリ。範囲外なら `None`。
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 古い順にエントリを返す。
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
