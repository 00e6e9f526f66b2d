//! lazyload_core::host — ローダーが実行環境（ブラウザ）に求める機能
//!
//! スケジューラは実際のブラウザを直接さわらず、この `Host` トレイト越しに次のことだけを頼みます。
//! - UA 文字列を読む（1 スケジューラにつき最大 1 回）
//! - document（DOM のルート）を受け取る
//! - 一定時間後にタスクを 1 回だけ実行してもらう（`setTimeout` 相当）
//! - `<head>` に要素を追加したことを知らせる（ホストはここで取得を始める）
//!
//! 完了の通知はホスト側から届きます。ホストはノードの `ready_state` を更新し、
//! `dom::api::dispatch_event` で `load` / `error` / `readystatechange` を発火します。
//!
//! 実ブラウザ以外の実装として、テストやデモ用の `browser::Browser`（仮想時計付き）があります。

use crate::dom::node::Node;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// 一度だけ実行されるタスク
pub type Task = Box<dyn FnOnce()>;

pub trait Host {
    fn user_agent(&self) -> String;

    fn document(&self) -> Rc<RefCell<Node>>;

    fn set_timeout(&self, delay: Duration, task: Task);

    fn attached(&self, node: &Rc<RefCell<Node>>);
}
