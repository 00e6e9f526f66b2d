//! ローダーが使う固定値（デフォルト値）
//!
//! 挿入する `<link>` / `<script>` の属性値や、タイマー方式の待ち時間の基準値をまとめます。
//! 実行時に変えたい場合は `config::LoaderConfig` 側で上書きします。

// タイマー方式（スタイルシートで load イベントが当てにならないエンジン向け）の
// 1 URL あたりの待ち時間（ミリ秒）。実際の待ち時間は「これ × バッチ内の URL 数」。
pub static TIMER_DELAY_PER_URL_MS: u64 = 50;

// 挿入した要素に付けるマーカー用の class 名
pub static MARKER_CLASS: &str = "lazyload";

pub static CHARSET: &str = "utf-8";

// MIME タイプ
pub static STYLE_MIME_TYPE: &str = "text/css";
pub static SCRIPT_MIME_TYPE: &str = "text/javascript";

// <link rel="stylesheet">
pub static STYLE_REL: &str = "stylesheet";

// 環境変数名（LoaderConfig::from_env が参照）
pub static ENV_TIMER_DELAY_MS: &str = "LAZYLOAD_TIMER_DELAY_MS";
pub static ENV_MARKER_CLASS: &str = "LAZYLOAD_MARKER_CLASS";
pub static ENV_CHARSET: &str = "LAZYLOAD_CHARSET";
