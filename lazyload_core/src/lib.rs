//! lazyload_core — 外部スタイルシート/スクリプトを遅延読み込みする“コア”ライブラリ
//!
//! 目的（なにを入れる？）
//! - URL を受け取って `<link>` / `<script>` を `<head>` に差し込み、エンジンごとに違う
//!   「読み込み終わった」の合図を 1 つの形にまとめ、要求 1 回につきコールバックを 1 回だけ呼びます。
//! - 同じ種別の要求は FIFO。スクリプトの実行順を守れないエンジンでは 1 つずつ順番に読み込みます。
//!
//! 使い方（超ミニ例）
//! ```ignore
//! use lazyload_core::browser::Browser;
//! use lazyload_core::queue::Completion;
//! use lazyload_core::scheduler::LazyLoad;
//!
//! let browser = Browser::preset("webkit")?;
//! let loader = LazyLoad::new(browser.clone());
//! loader.load_script(["a.js", "b.js"], Completion::new(|_, _| println!("loaded")));
//! browser.respond_all();
//! ```
//!
//! モジュール構成
//! - `scheduler`: 入口（`LazyLoad::load_style` / `load_script`）と待ち行列の前進。
//! - `queue`: 種別ごとの待ち行列とリクエストの型。
//! - `user_agent` / `strategy`: UA からエンジンを判定し、並べ方と完了の検出方法を決める。
//! - `node_factory` / `completion`: 要素を作り、完了の合図を付ける。
//! - `dom`: 最小の DOM（ノード・属性・ツリー操作・イベント発火）。
//! - `host`: 実行環境に求める機能。`browser` はその模擬実装（仮想時計付き）。
//!
//! メモ（設計指針）
//! - 読み込みの失敗は呼び出し側に返さず「完了」として扱います（1 つの失敗でキューが止まらないように）。
//! - 状態はすべてスケジューラのインスタンスが持ちます（グローバル変数なし）。

pub mod browser; // 模擬ブラウザ（Host 実装）
pub mod completion;
pub mod config;
pub mod constants;
pub mod dom;
pub mod error; // 共有エラー型（Result<T, Error> 用）
pub mod host;
pub mod node_factory;
pub mod queue;
pub mod scheduler;
pub mod strategy;
pub mod user_agent;
pub mod utils; // DOM のデバッグ表示
