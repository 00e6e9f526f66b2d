//! lazyload_core::queue — 種別ごとの待ち行列と「いま読み込み中」のリクエスト
//!
//! 用語
//! - `LogicalRequest`: 呼び出し 1 回分のリクエスト。URL は 1 個以上（空も許す）、完了コールバックは最大 1 個。
//! - `RequestQueue`: 種別（スタイル / スクリプト）ごとに 1 つ。FIFO の待ち行列と、
//!   読み込み中（in-flight）のリクエストを最大 1 つ持ちます。
//!
//! 不変条件
//! - 読み込み中のリクエストは、まだ完了の合図が来ていない URL が残っている間だけ存在します。
//! - 完了の合図は来た順に `remaining` を減らすだけで、`urls` の並びは呼び出し側が渡したままです。
//!
//! 言語ブリッジ（TS / Python / Go）
//! - `VecDeque` は両端キュー。`push_back` / `pop_front` で FIFO になります（Python の `collections.deque`）。
//! - `Rc<dyn Any>` は「中身の型を問わない共有値」。コールバックに渡すペイロードに使います。

use crate::error::Error;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::rc::Rc;
use std::str::FromStr;

/// コールバックに渡す任意の値
pub type Payload = Rc<dyn Any>;

/// 完了コールバック。`scope` は実行コンテキスト、`payload` は呼び出し時に渡された値。
pub type Callback = Box<dyn FnOnce(&Scope, Option<&Payload>)>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Style,
    Script,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Style => "css",
            ResourceKind::Script => "js",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "css" | "style" => Ok(ResourceKind::Style),
            "js" | "script" => Ok(ResourceKind::Script),
            _ => Err(Error::UnexpectedInput(format!(
                "unknown resource kind {:?}",
                s
            ))),
        }
    }
}

/// コールバックの実行コンテキスト
#[derive(Clone)]
pub enum Scope {
    /// 指定なし（グローバル環境）
    Global,
    /// 呼び出し側が指定したオブジェクト
    Bound(Rc<dyn Any>),
}

impl Scope {
    // Bound なら中身を `T` として取り出す
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Scope::Global => None,
            Scope::Bound(value) => value.downcast_ref::<T>(),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }
}

impl Debug for Scope {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Scope::Global => write!(f, "Global"),
            Scope::Bound(_) => write!(f, "Bound(..)"),
        }
    }
}

/// 1 個または複数の URL（順序を保つ）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlList(Vec<String>);

impl UrlList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for UrlList {
    fn from(url: &str) -> Self {
        UrlList(vec![url.to_string()])
    }
}

impl From<String> for UrlList {
    fn from(url: String) -> Self {
        UrlList(vec![url])
    }
}

impl From<Vec<String>> for UrlList {
    fn from(urls: Vec<String>) -> Self {
        UrlList(urls)
    }
}

impl From<Vec<&str>> for UrlList {
    fn from(urls: Vec<&str>) -> Self {
        UrlList(urls.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for UrlList {
    fn from(urls: &[&str]) -> Self {
        UrlList(urls.iter().map(|u| u.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for UrlList {
    fn from(urls: [&str; N]) -> Self {
        UrlList(urls.iter().map(|u| u.to_string()).collect())
    }
}

/// 完了時に何をするか（コールバック・ペイロード・コンテキストの組）
///
/// ```ignore
/// let done = Completion::new(|scope, payload| { /* ... */ })
///     .with_payload(42_u32)
///     .with_scope(String::from("widget"));
/// ```
pub struct Completion {
    callback: Option<Callback>,
    payload: Option<Payload>,
    scope: Scope,
}

impl Default for Completion {
    fn default() -> Self {
        Self::none()
    }
}

impl Completion {
    // コールバックなし
    pub fn none() -> Self {
        Self {
            callback: None,
            payload: None,
            scope: Scope::Global,
        }
    }

    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(&Scope, Option<&Payload>) + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
            payload: None,
            scope: Scope::Global,
        }
    }

    pub fn with_payload<T: Any>(mut self, payload: T) -> Self {
        self.payload = Some(Rc::new(payload));
        self
    }

    pub fn with_scope<T: Any>(mut self, scope: T) -> Self {
        self.scope = Scope::Bound(Rc::new(scope));
        self
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// コールバックを実行する（無ければ何もしない）
    pub fn run(self) {
        if let Some(callback) = self.callback {
            callback(&self.scope, self.payload.as_ref());
        }
    }
}

impl Debug for Completion {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("callback", &self.callback.is_some())
            .field("payload", &self.payload.is_some())
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub struct LogicalRequest {
    id: RequestId,
    urls: Vec<String>,
    remaining: usize,
    completion: Option<Completion>,
}

impl LogicalRequest {
    pub fn new(id: RequestId, urls: Vec<String>, completion: Completion) -> Self {
        Self {
            id,
            remaining: urls.len(),
            urls,
            completion: Some(completion),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

/// `RequestQueue::settle` の結果
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Settle {
    /// 読み込み中のリクエストと id が合わない（古い合図など）
    Ignored,
    /// まだ残りがある
    Waiting(usize),
    /// 全 URL が終わった
    Finished,
}

#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: VecDeque<LogicalRequest>,
    in_flight: Option<LogicalRequest>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            in_flight: None,
        }
    }

    pub fn enqueue(&mut self, request: LogicalRequest) {
        self.pending.push_back(request);
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn queued(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> Option<&LogicalRequest> {
        self.in_flight.as_ref()
    }

    /// 先頭を読み込み中に移す。既に読み込み中がある / 待ち行列が空なら None。
    pub fn start_next(&mut self) -> Option<&LogicalRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        self.in_flight = self.pending.pop_front();
        self.in_flight.as_ref()
    }

    /// 読み込み中リクエスト `id` の URL が 1 つ終わったことを記録する
    pub fn settle(&mut self, id: RequestId) -> Settle {
        match self.in_flight.as_mut() {
            Some(request) if request.id == id && !request.is_finished() => {
                request.remaining -= 1;
                if request.is_finished() {
                    Settle::Finished
                } else {
                    Settle::Waiting(request.remaining())
                }
            }
            _ => Settle::Ignored,
        }
    }

    /// 読み込み中リクエストのコールバック一式を取り出す（1 回だけ Some）
    ///
    /// リクエスト自体は読み込み中のまま残るので、コールバックの中で同じ種別を要求しても待ち行列に入ります。
    pub fn take_completion(&mut self, id: RequestId) -> Option<Completion> {
        match self.in_flight.as_mut() {
            Some(request) if request.id == id => request.completion.take(),
            _ => None,
        }
    }

    /// 読み込み中の枠を空ける
    pub fn clear_in_flight(&mut self, id: RequestId) -> Option<LogicalRequest> {
        let matches = self.in_flight.as_ref().is_some_and(|r| r.id == id);
        if matches {
            self.in_flight.take()
        } else {
            None
        }
    }
}
