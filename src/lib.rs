//! lsh ライブラリ — ベンチマーク・テスト用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`terminal`] | raw モードの切り替えと復元、fd 直結の入出力 |
//! | [`editor`] | 行エディタ（キー入力、バッファ操作、↑↓ 履歴呼び出し、再描画） |
//! | [`history`] | コマンド履歴（追記専用、倍々で拡張） |
//! | [`tokenizer`] | 確定行の空白分割（元の行は変更しない） |
//! | [`executor`] | ディスパッチ（ビルトイン判定 → 外部コマンド） |
//! | [`builtins`] | ビルトイン（`cd`, `help`, `exit`, `say`, `history`） |
//! | [`spawn`] | `fork` + `execvp` + `waitpid` による前景実行 |
//! | [`shell`] | セッション状態（履歴、エディタ）とループ継続フラグ |
//! | [`config`] | 環境変数からの設定読み込み |

pub mod builtins;
pub mod config;
pub mod editor;
pub mod executor;
pub mod history;
pub mod shell;
pub mod spawn;
pub mod terminal;
pub mod tokenizer;
