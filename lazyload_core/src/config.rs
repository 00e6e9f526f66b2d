//! lazyload_core::config — ローダーの設定値
//!
//! - `LoaderConfig::default()` は `constants` の値をそのまま使います。
//! - `with_*` で個別に上書きできます（ビルダー風）。
//! - `from_env()` は環境変数から上書きします。値が無ければデフォルト、値があって読めなければエラー。
//!
//! 例
//! ```ignore
//! use std::time::Duration;
//! let config = LoaderConfig::default().with_timer_delay_per_url(Duration::from_millis(10));
//! ```

use crate::constants::CHARSET;
use crate::constants::ENV_CHARSET;
use crate::constants::ENV_MARKER_CLASS;
use crate::constants::ENV_TIMER_DELAY_MS;
use crate::constants::MARKER_CLASS;
use crate::constants::TIMER_DELAY_PER_URL_MS;
use crate::error::Error;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    timer_delay_per_url: Duration,
    marker_class: String,
    charset: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timer_delay_per_url: Duration::from_millis(TIMER_DELAY_PER_URL_MS),
            marker_class: MARKER_CLASS.to_string(),
            charset: CHARSET.to_string(),
        }
    }
}

impl LoaderConfig {
    /// プロセスの環境変数から設定を作る
    ///
    /// - `LAZYLOAD_TIMER_DELAY_MS`: 1 URL あたりの待ち時間（ミリ秒、整数）
    /// - `LAZYLOAD_MARKER_CLASS`: 挿入要素の class（空文字は不可）
    /// - `LAZYLOAD_CHARSET`: charset 属性（空文字は不可）
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // 値の取り出し方だけを差し替えられるようにした本体（テストでは環境変数を汚さずに済む）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TIMER_DELAY_MS) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::InvalidConfig(format!("{}={:?}: {}", ENV_TIMER_DELAY_MS, raw, e)))?;
            config.timer_delay_per_url = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup(ENV_MARKER_CLASS) {
            config.marker_class = non_empty(ENV_MARKER_CLASS, raw)?;
        }

        if let Some(raw) = lookup(ENV_CHARSET) {
            config.charset = non_empty(ENV_CHARSET, raw)?;
        }

        Ok(config)
    }

    pub fn with_timer_delay_per_url(mut self, delay: Duration) -> Self {
        self.timer_delay_per_url = delay;
        self
    }

    pub fn with_marker_class(mut self, class: &str) -> Self {
        self.marker_class = class.to_string();
        self
    }

    pub fn with_charset(mut self, charset: &str) -> Self {
        self.charset = charset.to_string();
        self
    }

    pub fn timer_delay_per_url(&self) -> Duration {
        self.timer_delay_per_url
    }

    /// タイマー方式の待ち時間。バッチ内の URL 数に比例します（50ms × 3 URL = 150ms）。
    pub fn timer_delay(&self, batch_size: usize) -> Duration {
        self.timer_delay_per_url
            .saturating_mul(u32::try_from(batch_size).unwrap_or(u32::MAX))
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }
}

fn non_empty(key: &str, raw: String) -> Result<String, Error> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::InvalidConfig(format!("{} must not be empty", key)));
    }
    Ok(value.to_string())
}
