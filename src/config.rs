//! 起動時の設定。環境変数から読み込み、未設定なら既定値を使う。
//!
//! | 変数 | 既定値 | 用途 |
//! |------|--------|------|
//! | `LSH_PROMPT` | `"> "` | 行エディタのプロンプト |
//! | `LSH_LOG_LEVEL` | （未設定 = ERROR のみ） | `tracing` の `EnvFilter` ディレクティブ |

/// プロンプトを上書きする環境変数。
pub const PROMPT_VAR: &str = "LSH_PROMPT";

/// ログフィルタの環境変数。
pub const LOG_LEVEL_VAR: &str = "LSH_LOG_LEVEL";

pub const DEFAULT_PROMPT: &str = "> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 環境の参照を差し替えられる版。テスト用に `from_env` から分離している。
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prompt = lookup(PROMPT_VAR)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        Self { prompt }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}
