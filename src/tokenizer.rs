//! 確定した行を空白で引数列に分割する。
//!
//! 元の行は変更せず、各引数は行へのスライス（`&str`）として返す。
//! そのため履歴に保存した行と、ディスパッチ用の引数列は独立している。
//! `execvp` 用の NULL 終端は [`spawn`](crate::spawn) で argv を組み立てるときに付加する。

/// 区切り文字: スペース、タブ、CR、LF、BEL。
pub const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

/// 行を区切り文字で分割する。連続する区切り文字の間の空フィールドは捨てる。
pub fn split_line(line: &str) -> Vec<&str> {
    line.split(&DELIMITERS[..])
        .filter(|field| !field.is_empty())
        .collect()
}
