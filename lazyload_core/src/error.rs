//! lazyload_core::error — ライブラリ全体で使う簡易エラー型
//!
//! 目的（概要）
//! - ローダー本体（スケジューラ）は失敗を呼び出し側へ返しません。読み込み失敗も「完了」として扱い、
//!   キューを前へ進めることを優先します。
//! - それでも「文字列 → 列挙型」の変換や、環境変数からの設定読み込みのように
//!   入力そのものが不正になりうる箇所はあるので、そこでは `Result<T, Error>` を返します。
//!
//! 用語の橋渡し（TS / Python / Go）
//! - `thiserror` の `#[error("...")]` は `Display` 実装を自動生成します。
//!   Python の `__str__`、Go の `Error() string` を書く手間を省くイメージです。
//!
//! 使い方（例）
//! ```ignore
//! use lazyload_core::error::Error;
//! use lazyload_core::queue::ResourceKind;
//!
//! let kind: Result<ResourceKind, Error> = "css".parse();
//! assert!(kind.is_ok());
//! ```

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// 予期しない入力（未対応のタグ名・リソース種別名など）
    #[error("unexpected input: {0}")]
    UnexpectedInput(String),
    /// 設定値の不正（環境変数の値が数値として読めない等）
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
