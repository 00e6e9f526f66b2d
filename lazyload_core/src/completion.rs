//! lazyload_core::completion — 「読み込み終わった」を 1 回だけ知らせる仕組み
//!
//! 役割
//! - 作ったノードに、エンジンに合った完了の合図（`CompletionSource`）を取り付けます。
//!   - `Event`: `load` と `error` の両方にハンドラを付ける。どちらが来ても同じ「完了」。
//!     失敗はリトライもしないし、呼び出し側に別扱いで伝えもしません（キューを止めないことが優先）。
//!   - `Poll`: `readystatechange` を見て、loaded / complete になったらハンドラを外してから完了。
//!   - `Timer`: 一定時間後に完了とみなす。実際に読み終わったかは分からない近似です。
//! - どの合図でも、最後は `CompletionToken::fire` を呼ぶだけです。
//!   トークンは中の関数を 1 回しか実行しないので、`load` のあとに `error` が来ても、
//!   readystatechange が loaded と complete で 2 回来ても、完了は 1 回になります。

use crate::dom::node::EventHandler;
use crate::dom::node::EventType;
use crate::dom::node::Node;
use crate::host::Host;
use crate::strategy::CompletionSource;
use log::trace;
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// 1 回だけ使える完了通知
pub struct CompletionToken {
    on_done: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl CompletionToken {
    pub fn new<F>(on_done: F) -> Rc<Self>
    where
        F: FnOnce() + 'static,
    {
        Rc::new(Self {
            on_done: RefCell::new(Some(Box::new(on_done))),
        })
    }

    /// 未使用なら中の関数を実行して true。使用済みなら何もしないで false。
    pub fn fire(&self) -> bool {
        // 借用を手放してから実行する（実行中に別の合図が来ても二重に借用しない）
        let on_done = self.on_done.borrow_mut().take();
        match on_done {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.on_done.borrow().is_none()
    }
}

/// `node` に完了の合図を取り付ける
///
/// - `timer_delay` は `Timer` のときだけ使います（スケジューラが「基準値 × バッチ内 URL 数」を渡す）。
/// - ノードを `<head>` に追加する前に呼んでください。同期的に完了するホストでも取りこぼしません。
pub fn attach_completion_signal<H>(
    node: &Rc<RefCell<Node>>,
    source: CompletionSource,
    timer_delay: Duration,
    host: &H,
    token: Rc<CompletionToken>,
) where
    H: Host + ?Sized,
{
    match source {
        CompletionSource::Poll => {
            let handler: EventHandler = Rc::new(move |node: &Rc<RefCell<Node>>| {
                let state = node.borrow().ready_state();
                trace!("readystatechange: {}", state);
                if state.is_done() {
                    node.borrow_mut()
                        .remove_event_handler(EventType::ReadyStateChange);
                    token.fire();
                }
            });
            node.borrow_mut()
                .set_event_handler(EventType::ReadyStateChange, handler);
        }
        CompletionSource::Timer => {
            trace!("timer fallback after {:?}", timer_delay);
            host.set_timeout(
                timer_delay,
                Box::new(move || {
                    token.fire();
                }),
            );
        }
        CompletionSource::Event => {
            let on_load = token.clone();
            let load: EventHandler = Rc::new(move |_: &Rc<RefCell<Node>>| {
                on_load.fire();
            });
            let error: EventHandler = Rc::new(move |node: &Rc<RefCell<Node>>| {
                let url = node
                    .borrow()
                    .get_element()
                    .and_then(|e| e.resource_url().map(str::to_string));
                warn!("failed to load {:?}; treating it as done", url);
                token.fire();
            });
            let mut node = node.borrow_mut();
            node.set_event_handler(EventType::Load, load);
            node.set_event_handler(EventType::Error, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::api::dispatch_event;
    use crate::dom::node::ElementKind;
    use crate::dom::node::ReadyState;
    use crate::dom::node::Window;
    use crate::host::Task;
    use std::cell::Cell;

    // タイマーを貯めておくだけのホスト
    #[derive(Default)]
    struct TimerHost {
        timers: RefCell<Vec<(Duration, Task)>>,
    }

    impl Host for TimerHost {
        fn user_agent(&self) -> String {
            String::new()
        }

        fn document(&self) -> Rc<RefCell<Node>> {
            Window::new().document()
        }

        fn set_timeout(&self, delay: Duration, task: Task) {
            self.timers.borrow_mut().push((delay, task));
        }

        fn attached(&self, _node: &Rc<RefCell<Node>>) {}
    }

    fn counting_token() -> (Rc<CompletionToken>, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let token = CompletionToken::new(move || counter.set(counter.get() + 1));
        (token, count)
    }

    fn script_node() -> Rc<RefCell<Node>> {
        Rc::new(RefCell::new(Node::element(ElementKind::Script, Vec::new())))
    }

    #[test]
    fn test_token_fires_once() {
        let (token, count) = counting_token();
        assert!(!token.is_spent());
        assert!(token.fire());
        assert!(!token.fire());
        assert!(token.is_spent());
        assert_eq!(1, count.get());
    }

    #[test]
    fn test_event_load_then_error() {
        let host = TimerHost::default();
        let node = script_node();
        let (token, count) = counting_token();
        attach_completion_signal(&node, CompletionSource::Event, Duration::ZERO, &host, token);

        assert!(dispatch_event(&node, EventType::Load));
        assert!(dispatch_event(&node, EventType::Error));
        assert_eq!(1, count.get());
        assert!(host.timers.borrow().is_empty());
    }

    #[test]
    fn test_event_error_counts_as_done() {
        let host = TimerHost::default();
        let node = script_node();
        let (token, count) = counting_token();
        attach_completion_signal(&node, CompletionSource::Event, Duration::ZERO, &host, token);

        dispatch_event(&node, EventType::Error);
        assert_eq!(1, count.get());
    }

    #[test]
    fn test_poll_waits_for_loaded() {
        let host = TimerHost::default();
        let node = script_node();
        let (token, count) = counting_token();
        attach_completion_signal(&node, CompletionSource::Poll, Duration::ZERO, &host, token);
        // load / error には反応しない
        assert!(node.borrow().event_handler(EventType::Load).is_none());

        node.borrow_mut().set_ready_state(ReadyState::Loading);
        dispatch_event(&node, EventType::ReadyStateChange);
        assert_eq!(0, count.get());

        node.borrow_mut().set_ready_state(ReadyState::Loaded);
        dispatch_event(&node, EventType::ReadyStateChange);
        assert_eq!(1, count.get());
        // ハンドラは外れている
        assert!(node
            .borrow()
            .event_handler(EventType::ReadyStateChange)
            .is_none());

        node.borrow_mut().set_ready_state(ReadyState::Complete);
        assert!(!dispatch_event(&node, EventType::ReadyStateChange));
        assert_eq!(1, count.get());
    }

    #[test]
    fn test_timer_uses_given_delay() {
        let host = TimerHost::default();
        let node = script_node();
        let (token, count) = counting_token();
        attach_completion_signal(
            &node,
            CompletionSource::Timer,
            Duration::from_millis(150),
            &host,
            token,
        );
        assert!(node.borrow().event_handler(EventType::Load).is_none());

        let (delay, task) = host.timers.borrow_mut().remove(0);
        assert_eq!(Duration::from_millis(150), delay);
        assert_eq!(0, count.get());
        task();
        assert_eq!(1, count.get());
    }
}
