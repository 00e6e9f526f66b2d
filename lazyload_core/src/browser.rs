//! ブラウザ本体（Browser）— ローダーを動かすための“模擬ブラウザ”
//!
//! 役割
//! - `Host` トレイトを実装し、スケジューラから見ると本物のブラウザと同じように振る舞います。
//! - ただしネットワークも時計も本物ではありません。
//!   - 時計は仮想時計。`advance(d)` を呼んだ分だけ進み、その間に期限が来たタイマーを順に実行します。
//!   - 取得は「呼ばれるまで終わらない」。`respond(url)` / `fail(url)` を呼ぶと、その URL の要素に
//!     readystatechange（loaded → complete。スクリプトは先に interactive）と load / error が届きます。
//! - どの順番で `<head>` に要素が追加されたか（`requested_urls`）を記録するので、
//!   逐次/並列の違いや FIFO をテストで確かめられます。
//!
//! 言語ブリッジ（TS / Python / Go）
//! - `Cell<T>` / `RefCell<T>` で内部可変にしているので、`&self` のまま状態を書き換えられます。
//!   共有は `Rc<Browser>`（スケジューラとテストコードの両方が持つ）。
//!
//! 使い方（最小例）
//! ```ignore
//! let browser = Browser::new(WEBKIT_USER_AGENT);
//! let loader = LazyLoad::new(browser.clone());
//! loader.load_script(["a.js", "b.js"], Completion::none());
//! assert_eq!(vec!["a.js"], browser.requested_urls());
//! browser.respond("a.js");
//! ```

use crate::dom::api::append_child;
use crate::dom::api::dispatch_event;
use crate::dom::api::get_target_element_node;
use crate::dom::node::ElementKind;
use crate::dom::node::EventType;
use crate::dom::node::Node;
use crate::dom::node::ReadyState;
use crate::dom::node::Window;
use crate::error::Error;
use crate::host::Host;
use crate::host::Task;
use log::trace;
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub static GECKO_USER_AGENT: &str =
    "Mozilla/5.0 (Windows; U; Windows NT 6.1; en-US; rv:1.9.2.8) Gecko/20100722 Firefox/3.6.8";
pub static WEBKIT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_4; en-us) AppleWebKit/533.18.1 (KHTML, like Gecko) Version/5.0.2 Safari/533.18.5";
pub static LEGACY_IE_USER_AGENT: &str =
    "Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1; Trident/4.0)";
pub static OPERA_USER_AGENT: &str = "Opera/9.80 (Windows NT 6.1; U; en) Presto/2.6.30 Version/10.61";
pub static UNKNOWN_USER_AGENT: &str = "curl/7.68.0";

struct Timer {
    due: Duration,
    seq: u64,
    task: Task,
}

pub struct Browser {
    user_agent: String,
    user_agent_reads: Cell<usize>,
    window: Window,
    clock: Cell<Duration>,
    timers: RefCell<Vec<Timer>>,
    timer_seq: Cell<u64>,
    requests: RefCell<Vec<Rc<RefCell<Node>>>>,
}

impl Browser {
    // Document → html → (head, body) の状態で作る
    pub fn new(user_agent: &str) -> Rc<Self> {
        let browser = Self::blank(user_agent);
        let document = browser.window.document();
        let html = element(ElementKind::Html);
        append_child(&document, html.clone());
        append_child(&html, element(ElementKind::Head));
        append_child(&html, element(ElementKind::Body));
        Rc::new(browser)
    }

    // <head> の無い文書（Document → html → body）で作る
    pub fn without_head(user_agent: &str) -> Rc<Self> {
        let browser = Self::blank(user_agent);
        let document = browser.window.document();
        let html = element(ElementKind::Html);
        append_child(&document, html.clone());
        append_child(&html, element(ElementKind::Body));
        Rc::new(browser)
    }

    /// エンジン名から UA 文字列を選んで作る（"gecko" / "webkit" / "ie" / "opera" / "unknown"）
    pub fn preset(engine: &str) -> Result<Rc<Self>, Error> {
        let user_agent = match engine {
            "gecko" | "firefox" => GECKO_USER_AGENT,
            "webkit" | "safari" => WEBKIT_USER_AGENT,
            "ie" | "msie" => LEGACY_IE_USER_AGENT,
            "opera" => OPERA_USER_AGENT,
            "unknown" => UNKNOWN_USER_AGENT,
            _ => {
                return Err(Error::UnexpectedInput(format!(
                    "unknown engine preset {:?}",
                    engine
                )))
            }
        };
        Ok(Self::new(user_agent))
    }

    fn blank(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            user_agent_reads: Cell::new(0),
            window: Window::new(),
            clock: Cell::new(Duration::ZERO),
            timers: RefCell::new(Vec::new()),
            timer_seq: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    // 文書内の最初の <head>（無ければ None）
    pub fn head(&self) -> Option<Rc<RefCell<Node>>> {
        get_target_element_node(Some(self.window.document()), ElementKind::Head)
    }

    pub fn now(&self) -> Duration {
        self.clock.get()
    }

    /// 仮想時計を `by` だけ進める
    ///
    /// - 期限が来たタイマーを「期限の早い順 → 登録順」で 1 つずつ実行します。
    /// - 実行中のタスクが新しく登録したタイマーも、期限内なら同じ呼び出しの中で実行されます。
    pub fn advance(&self, by: Duration) {
        let target = self.clock.get() + by;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let index = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                index.map(|i| timers.remove(i))
            };
            match next {
                Some(timer) => {
                    self.clock.set(timer.due);
                    trace!("timer {} fired at {:?}", timer.seq, timer.due);
                    (timer.task)();
                }
                None => break,
            }
        }
        self.clock.set(target);
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// `url` の取得を成功させる。読み込み中の要素が見つからなければ false。
    pub fn respond(&self, url: &str) -> bool {
        self.settle(url, EventType::Load)
    }

    /// `url` の取得を失敗させる。読み込み中の要素が見つからなければ false。
    pub fn fail(&self, url: &str) -> bool {
        self.settle(url, EventType::Error)
    }

    /// 読み込み中の要素を、無くなるまで古い順に成功させる。成功させた数を返す。
    pub fn respond_all(&self) -> usize {
        let mut count = 0;
        while let Some(url) = self.outstanding_urls().into_iter().next() {
            if !self.respond(&url) {
                break;
            }
            count += 1;
        }
        count
    }

    /// `<head>` に追加された順の URL 一覧
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.borrow().iter().filter_map(url_of).collect()
    }

    /// まだ応答していない URL 一覧（追加順）
    pub fn outstanding_urls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .filter(|n| n.borrow().ready_state() == ReadyState::Loading)
            .filter_map(url_of)
            .collect()
    }

    pub fn user_agent_reads(&self) -> usize {
        self.user_agent_reads.get()
    }

    fn settle(&self, url: &str, event: EventType) -> bool {
        let node = self
            .requests
            .borrow()
            .iter()
            .find(|n| {
                n.borrow().ready_state() == ReadyState::Loading
                    && url_of(n).as_deref() == Some(url)
            })
            .cloned();
        let node = match node {
            Some(node) => node,
            None => return false,
        };

        trace!("{} {}", event, url);
        // スクリプトは loaded の前に interactive を通る
        let states: &[ReadyState] = if node.borrow().element_kind() == Some(ElementKind::Script) {
            &[ReadyState::Interactive, ReadyState::Loaded, ReadyState::Complete]
        } else {
            &[ReadyState::Loaded, ReadyState::Complete]
        };
        for state in states {
            node.borrow_mut().set_ready_state(*state);
            dispatch_event(&node, EventType::ReadyStateChange);
        }
        dispatch_event(&node, event);
        true
    }
}

impl Host for Browser {
    fn user_agent(&self) -> String {
        self.user_agent_reads.set(self.user_agent_reads.get() + 1);
        self.user_agent.clone()
    }

    fn document(&self) -> Rc<RefCell<Node>> {
        self.window.document()
    }

    fn set_timeout(&self, delay: Duration, task: Task) {
        let seq = self.timer_seq.get();
        self.timer_seq.set(seq + 1);
        self.timers.borrow_mut().push(Timer {
            due: self.clock.get() + delay,
            seq,
            task,
        });
    }

    fn attached(&self, node: &Rc<RefCell<Node>>) {
        node.borrow_mut().set_ready_state(ReadyState::Loading);
        self.requests.borrow_mut().push(node.clone());
        dispatch_event(node, EventType::ReadyStateChange);
    }
}

fn element(kind: ElementKind) -> Rc<RefCell<Node>> {
    Rc::new(RefCell::new(Node::element(kind, Vec::new())))
}

fn url_of(node: &Rc<RefCell<Node>>) -> Option<String> {
    node.borrow()
        .get_element()
        .and_then(|e| e.resource_url())
        .map(str::to_string)
}
