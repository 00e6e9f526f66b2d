//! lazyload_core::scheduler — 外部スタイルシート/スクリプトの遅延読み込みスケジューラ
//!
//! 役割
//! - `load_style(urls, completion)` / `load_script(urls, completion)` の 2 つが入口です。
//! - 呼び出しはすぐ戻ります。実際の読み込みと待ち行列の前進は、あとからホストが届ける
//!   完了の合図（load / error / readystatechange / タイマー）をきっかけに進みます。
//!
//! 流れ（1 回の要求）
//! 1. URL を順序付きのリストにする。
//! 2. 種別とエンジンで並べ方を決める（`strategy::LoadStrategy`）。
//!    - 並列: 全 URL で 1 つのリクエスト。
//!    - 逐次: URL ごとに 1 つのリクエスト。コールバックは最後の URL のものにだけ付ける。
//! 3. その種別に読み込み中のリクエストがあれば、ここで終わり（待ち行列で順番待ち）。
//! 4. 無ければ待ち行列の先頭を読み込み中にし、URL ごとに要素を作って完了の合図を付け、`<head>` に足す。
//! 5. 全 URL の合図がそろったら、コールバックを 1 回だけ呼び、読み込み中の枠を空けて 4 に戻る。
//!
//! 保証
//! - 同じ種別のリクエストは FIFO。先のリクエストが全部終わるまで、後のリクエストの要素は追加されない。
//! - スタイルとスクリプトは別々の待ち行列で、互いの順序は保証しない。
//! - 読み込み失敗も「完了」として扱う。コールバックからは成功か失敗かは分からない。
//! - URL が空のリクエストは、順番が来た時点で DOM に触らずにすぐ完了する。
//!
//! 言語ブリッジ（TS / Python / Go）
//! - 全体はシングルスレッドのコールバック駆動です（JS のイベントループや asyncio と同じ考え方）。
//!   ロックは不要ですが、`RefCell` の借用を持ったままコールバックを呼ぶと二重借用になるので、
//!   状態を書き換える処理とコールバックの呼び出しは必ず分けています。

use crate::completion::attach_completion_signal;
use crate::completion::CompletionToken;
use crate::config::LoaderConfig;
use crate::dom::api::append_child;
use crate::dom::api::get_target_element_node;
use crate::dom::node::ElementKind;
use crate::dom::node::Node;
use crate::host::Host;
use crate::node_factory::create_node;
use crate::queue::Completion;
use crate::queue::LogicalRequest;
use crate::queue::RequestId;
use crate::queue::RequestQueue;
use crate::queue::ResourceKind;
use crate::queue::Settle;
use crate::queue::UrlList;
use crate::strategy::LoadPlan;
use crate::strategy::LoadStrategy;
use crate::user_agent::CapabilityProfile;
use crate::user_agent::UserAgentProbe;
use log::debug;
use log::trace;
use log::warn;
use std::cell::Cell;
use std::cell::OnceCell;
use std::cell::RefCell;
use std::rc::Rc;

/// 遅延読み込みのスケジューラ本体
///
/// 複製（`clone`）しても同じスケジューラを指します。コールバックの中から次の読み込みを
/// 要求したいときは、複製をコールバックに持たせてください。
pub struct LazyLoad<H: Host + 'static> {
    inner: Rc<Inner<H>>,
}

impl<H: Host + 'static> Clone for LazyLoad<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<H: Host + 'static> {
    host: Rc<H>,
    config: LoaderConfig,
    probe: UserAgentProbe,
    plan: OnceCell<LoadPlan>,
    head: RefCell<Option<Rc<RefCell<Node>>>>,
    styles: RefCell<RequestQueue>,
    scripts: RefCell<RequestQueue>,
    next_id: Cell<u64>,
}

impl<H: Host + 'static> LazyLoad<H> {
    pub fn new(host: Rc<H>) -> Self {
        Self::with_config(host, LoaderConfig::default())
    }

    pub fn with_config(host: Rc<H>, config: LoaderConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                host,
                config,
                probe: UserAgentProbe::new(),
                plan: OnceCell::new(),
                head: RefCell::new(None),
                styles: RefCell::new(RequestQueue::new()),
                scripts: RefCell::new(RequestQueue::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    /// スタイルシートを読み込む。複数 URL は常に並列で、全部終わってからコールバック。
    pub fn load_style<U>(&self, urls: U, completion: Completion)
    where
        U: Into<UrlList>,
    {
        self.inner.request(ResourceKind::Style, urls.into(), completion);
    }

    /// スクリプトを読み込む。並列にできないエンジンでは 1 つずつ順番に読み込み、
    /// 最後の 1 つが終わってからコールバック。
    pub fn load_script<U>(&self, urls: U, completion: Completion)
    where
        U: Into<UrlList>,
    {
        self.inner.request(ResourceKind::Script, urls.into(), completion);
    }

    /// 種別を値で指定する版（`"css".parse()` などと組み合わせる用）
    pub fn load<U>(&self, kind: ResourceKind, urls: U, completion: Completion)
    where
        U: Into<UrlList>,
    {
        self.inner.request(kind, urls.into(), completion);
    }

    pub fn profile(&self) -> CapabilityProfile {
        self.inner.profile()
    }

    pub fn plan(&self) -> LoadPlan {
        self.inner.plan()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    pub fn host(&self) -> &Rc<H> {
        &self.inner.host
    }

    /// 読み込み中リクエストの URL（呼び出し時の順序のまま）
    pub fn in_flight_urls(&self, kind: ResourceKind) -> Option<Vec<String>> {
        self.inner
            .queue(kind)
            .borrow()
            .in_flight()
            .map(|r| r.urls().to_vec())
    }

    /// 順番待ちのリクエスト数（読み込み中のものは含まない）
    pub fn queued(&self, kind: ResourceKind) -> usize {
        self.inner.queue(kind).borrow().queued()
    }

    pub fn is_idle(&self) -> bool {
        [ResourceKind::Style, ResourceKind::Script].iter().all(|kind| {
            let queue = self.inner.queue(*kind).borrow();
            !queue.is_busy() && queue.queued() == 0
        })
    }
}

impl<H: Host + 'static> Inner<H> {
    fn profile(&self) -> CapabilityProfile {
        self.probe.profile(|| self.host.user_agent())
    }

    fn plan(&self) -> LoadPlan {
        *self
            .plan
            .get_or_init(|| LoadPlan::from_profile(&self.profile()))
    }

    fn queue(&self, kind: ResourceKind) -> &RefCell<RequestQueue> {
        match kind {
            ResourceKind::Style => &self.styles,
            ResourceKind::Script => &self.scripts,
        }
    }

    fn next_id(&self) -> RequestId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        RequestId(id)
    }

    // 並べ方に従って待ち行列に積み、空いていれば先頭を始める
    fn request(self: &Rc<Self>, kind: ResourceKind, urls: UrlList, completion: Completion) {
        let plan = self.plan();
        let mut urls = urls.into_vec();

        {
            let mut queue = self.queue(kind).borrow_mut();
            if urls.is_empty() || plan.strategy(kind) == LoadStrategy::Parallel {
                let id = self.next_id();
                debug!("queue {} request {} with {} url(s)", kind, id, urls.len());
                queue.enqueue(LogicalRequest::new(id, urls, completion));
            } else if let Some(last) = urls.pop() {
                // 1 URL ずつに分け、コールバックは最後のものにだけ付ける
                for url in urls {
                    let id = self.next_id();
                    debug!("queue {} request {} for {}", kind, id, url);
                    queue.enqueue(LogicalRequest::new(id, vec![url], Completion::none()));
                }
                let id = self.next_id();
                debug!("queue {} request {} for {} (last)", kind, id, last);
                queue.enqueue(LogicalRequest::new(id, vec![last], completion));
            }
        }

        self.advance(kind);
    }

    // 読み込み中が無ければ先頭を始める。URL の無いリクエストはその場で完了させて次へ。
    fn advance(self: &Rc<Self>, kind: ResourceKind) {
        loop {
            let started = self
                .queue(kind)
                .borrow_mut()
                .start_next()
                .map(|request| (request.id(), request.urls().to_vec()));
            let (id, urls) = match started {
                Some(started) => started,
                None => return,
            };

            if urls.is_empty() {
                debug!("{} request {} has no urls; completing immediately", kind, id);
                self.complete(kind, id);
                continue;
            }

            self.start(kind, id, &urls);
            return;
        }
    }

    fn start(self: &Rc<Self>, kind: ResourceKind, id: RequestId, urls: &[String]) {
        let plan = self.plan();
        let source = plan.completion(kind);
        let delay = self.config.timer_delay(urls.len());
        let head = self.head();

        debug!(
            "start {} request {}: {:?} ({:?}, {:?})",
            kind,
            id,
            urls,
            plan.strategy(kind),
            source
        );

        for url in urls {
            let node = create_node(kind, url, &self.config);
            let scheduler = Rc::downgrade(self);
            let token = CompletionToken::new(move || {
                if let Some(scheduler) = scheduler.upgrade() {
                    scheduler.finish(kind, id);
                }
            });
            attach_completion_signal(&node, source, delay, self.host.as_ref(), token);
            // ここで取得が始まる
            append_child(&head, node.clone());
            self.host.attached(&node);
        }
    }

    fn finish(self: &Rc<Self>, kind: ResourceKind, id: RequestId) {
        let settled = self.queue(kind).borrow_mut().settle(id);
        match settled {
            Settle::Ignored => {
                warn!("ignoring completion signal for {} request {}", kind, id);
            }
            Settle::Waiting(remaining) => {
                trace!("{} request {}: {} url(s) remaining", kind, id, remaining);
            }
            Settle::Finished => {
                self.complete(kind, id);
                self.advance(kind);
            }
        }
    }

    // コールバックを呼んでから読み込み中の枠を空ける（次の開始は呼び出し側）
    fn complete(&self, kind: ResourceKind, id: RequestId) {
        let completion = self.queue(kind).borrow_mut().take_completion(id);
        debug!(
            "finished {} request {} (callback: {})",
            kind,
            id,
            completion.as_ref().is_some_and(Completion::has_callback)
        );
        if let Some(completion) = completion {
            completion.run();
        }
        self.queue(kind).borrow_mut().clear_in_flight(id);
    }

    // 最初に見つけた <head> を覚えておく。無ければ html（無ければ document）の下に作る。
    fn head(&self) -> Rc<RefCell<Node>> {
        if let Some(head) = self.head.borrow().as_ref() {
            return head.clone();
        }

        let document = self.host.document();
        let head = match get_target_element_node(Some(document.clone()), ElementKind::Head) {
            Some(head) => head,
            None => {
                debug!("document has no <head>; creating one");
                let head = Rc::new(RefCell::new(Node::element(ElementKind::Head, Vec::new())));
                let parent = get_target_element_node(Some(document.clone()), ElementKind::Html)
                    .unwrap_or(document);
                append_child(&parent, head.clone());
                head
            }
        };

        *self.head.borrow_mut() = Some(head.clone());
        head
    }
}
