//! DOM ノード（Window/Document/Element）の最小実装
//!
//! これはローダーが操作する“ブラウザの内部表現”のごく小さなモデルです。
//! - `Window`（最上位のグローバル）→`Document`→`Element` という階層を `Node` で表現します。
//! - `Element` はタグ種別（`ElementKind`）と属性（`attributes: Vec<Attribute>`）を持ちます。
//! - 読み込み対象の要素（`<link>` / `<script>`）のために、ノードは次の 2 つも持ちます。
//!   - `ready_state`: 読み込みの進み具合（uninitialized → loading → loaded → complete）
//!   - イベントハンドラ: `load` / `error` / `readystatechange` に 1 つずつ（`onload = ...` と同じ感覚）
//! - 兄弟/親子リンクを持つ「双方向の木」を、`Rc<RefCell<...>>` と `Weak` で実現します。
//!
//! 言語ブリッジ（TS / Python / Go）
//! - `Rc<T>` は参照カウント付きの“共有所有権”。`RefCell<T>` は“内部可変”。
//! - `Weak<T>` は循環参照を避けるための「弱い参照」。親や前後のリンクに使います。
//! - イベントハンドラは `Rc<dyn Fn(...)>`。TS/Python の「関数オブジェクトをプロパティに代入」に相当します。
//!
//! 例（<script src="a.js"> を作って onload を付ける）
//! ```ignore
//! let node = Rc::new(RefCell::new(Node::new(NodeKind::Element(Element::new(
//!     ElementKind::Script,
//!     vec![Attribute::new("src", "a.js")],
//! )))));
//! node.borrow_mut().set_event_handler(EventType::Load, Rc::new(|_node| { /* 完了 */ }));
//! ```

use crate::dom::attribute::Attribute;
use crate::error::Error;
use std::cell::RefCell;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::rc::Rc;
use std::rc::Weak;
use std::str::FromStr;

/// イベントハンドラ。発火したノード自身を受け取ります。
pub type EventHandler = Rc<dyn Fn(&Rc<RefCell<Node>>)>;

#[derive(Debug, Clone)]
pub struct Window {
    document: Rc<RefCell<Node>>,
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl Window {
    // ブラウザの `window` に相当。作成時に空の `Document` ノードを用意します。
    pub fn new() -> Self {
        Self {
            document: Rc::new(RefCell::new(Node::new(NodeKind::Document))),
        }
    }

    // 実ブラウザ API の `window.document` に相当。
    pub fn document(&self) -> Rc<RefCell<Node>> {
        self.document.clone()
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Weak<RefCell<Node>>,
    first_child: Option<Rc<RefCell<Node>>>,
    last_child: Weak<RefCell<Node>>,
    previous_sibling: Weak<RefCell<Node>>,
    next_sibling: Option<Rc<RefCell<Node>>>,
    ready_state: ReadyState,
    handlers: EventHandlers,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Node {
    // ノードを新規に作成。リンク（親/兄弟/子）は空で、種別だけを持ちます。
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: Weak::new(),
            first_child: None,
            last_child: Weak::new(),
            previous_sibling: Weak::new(),
            next_sibling: None,
            ready_state: ReadyState::Uninitialized,
            handlers: EventHandlers::default(),
        }
    }

    // 要素ノードを作るショートカット
    pub fn element(kind: ElementKind, attributes: Vec<Attribute>) -> Self {
        Self::new(NodeKind::Element(Element::new(kind, attributes)))
    }

    // 親ノードを Weak でセット。循環参照（リーク）を避けるため Rc ではなく Weak。
    pub fn set_parent(&mut self, parent: Weak<RefCell<Node>>) {
        self.parent = parent;
    }

    pub fn parent(&self) -> Weak<RefCell<Node>> {
        self.parent.clone()
    }

    pub fn set_first_child(&mut self, first_child: Option<Rc<RefCell<Node>>>) {
        self.first_child = first_child;
    }

    pub fn first_child(&self) -> Option<Rc<RefCell<Node>>> {
        self.first_child.as_ref().cloned()
    }

    pub fn set_last_child(&mut self, last_child: Weak<RefCell<Node>>) {
        self.last_child = last_child;
    }

    pub fn last_child(&self) -> Weak<RefCell<Node>> {
        self.last_child.clone()
    }

    pub fn set_previous_sibling(&mut self, previous_sibling: Weak<RefCell<Node>>) {
        self.previous_sibling = previous_sibling;
    }

    pub fn previous_sibling(&self) -> Weak<RefCell<Node>> {
        self.previous_sibling.clone()
    }

    pub fn set_next_sibling(&mut self, next_sibling: Option<Rc<RefCell<Node>>>) {
        self.next_sibling = next_sibling;
    }

    pub fn next_sibling(&self) -> Option<Rc<RefCell<Node>>> {
        self.next_sibling.as_ref().cloned()
    }

    // Element ノードなら要素情報を返す。Document なら None。
    pub fn get_element(&self) -> Option<&Element> {
        match self.kind {
            NodeKind::Document => None,
            NodeKind::Element(ref e) => Some(e),
        }
    }

    pub fn element_kind(&self) -> Option<ElementKind> {
        self.get_element().map(|e| e.kind())
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_ready_state(&mut self, ready_state: ReadyState) {
        self.ready_state = ready_state;
    }

    pub fn event_handler(&self, event: EventType) -> Option<EventHandler> {
        self.handlers.get(event)
    }

    // `node.onload = handler` に相当（同じイベントに既にあれば置き換え）
    pub fn set_event_handler(&mut self, event: EventType, handler: EventHandler) {
        self.handlers.set(event, Some(handler));
    }

    // `node.onreadystatechange = null` に相当
    pub fn remove_event_handler(&mut self, event: EventType) {
        self.handlers.set(event, None);
    }
}

#[derive(Debug, Clone, Eq)]
pub enum NodeKind {
    /// https://dom.spec.whatwg.org/#interface-document
    Document,
    /// https://dom.spec.whatwg.org/#interface-element
    Element(Element),
}

impl PartialEq for NodeKind {
    fn eq(&self, other: &Self) -> bool {
        match &self {
            NodeKind::Document => matches!(other, NodeKind::Document),
            NodeKind::Element(e1) => match &other {
                NodeKind::Element(e2) => e1.kind == e2.kind,
                _ => false,
            },
        }
    }
}

/// https://dom.spec.whatwg.org/#interface-element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    kind: ElementKind,
    attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(kind: ElementKind, attributes: Vec<Attribute>) -> Self {
        Self { kind, attributes }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// この要素が持つ全属性（順序は保持）
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// 属性 `name` の値を返す（存在しなければ `None`）
    ///
    /// - 名前比較は完全一致（大文字小文字の正規化はしません）。
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name() == name)
            .map(|attr| attr.value())
    }

    /// 属性をセットする。同名があれば値を上書き、無ければ末尾に追加。
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|attr| attr.name() == name) {
            Some(attr) => attr.set_value(value),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// 読み込み対象の URL（`<link>` なら href、`<script>` なら src）
    pub fn resource_url(&self) -> Option<&str> {
        match self.kind {
            ElementKind::Link => self.get_attribute("href"),
            ElementKind::Script => self.get_attribute("src"),
            _ => None,
        }
    }

    // class 属性を空白区切りで見て、`class_name` を含むか
    pub fn has_class(&self, class_name: &str) -> bool {
        self.get_attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class_name))
            .unwrap_or(false)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// https://dom.spec.whatwg.org/#interface-element
pub enum ElementKind {
    /// https://html.spec.whatwg.org/multipage/semantics.html#the-html-element
    Html,
    /// https://html.spec.whatwg.org/multipage/semantics.html#the-head-element
    Head,
    /// https://html.spec.whatwg.org/multipage/semantics.html#the-link-element
    Link,
    /// https://html.spec.whatwg.org/multipage/scripting.html#the-script-element
    Script,
    /// https://html.spec.whatwg.org/multipage/sections.html#the-body-element
    Body,
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            ElementKind::Html => "html",
            ElementKind::Head => "head",
            ElementKind::Link => "link",
            ElementKind::Script => "script",
            ElementKind::Body => "body",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ElementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(ElementKind::Html),
            "head" => Ok(ElementKind::Head),
            "link" => Ok(ElementKind::Link),
            "script" => Ok(ElementKind::Script),
            "body" => Ok(ElementKind::Body),
            _ => Err(Error::UnexpectedInput(format!(
                "unimplemented element name {:?}",
                s
            ))),
        }
    }
}

/// 要素の読み込み状態
/// https://developer.mozilla.org/en-US/docs/Web/API/Document/readyState の古い要素版
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadyState {
    Uninitialized,
    Loading,
    Loaded,
    Interactive,
    Complete,
}

impl ReadyState {
    // "loaded" か "complete" になったら読み込み完了とみなす
    pub fn is_done(&self) -> bool {
        matches!(self, ReadyState::Loaded | ReadyState::Complete)
    }
}

impl Display for ReadyState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            ReadyState::Uninitialized => "uninitialized",
            ReadyState::Loading => "loading",
            ReadyState::Loaded => "loaded",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventType {
    Load,
    Error,
    ReadyStateChange,
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            EventType::Load => "load",
            EventType::Error => "error",
            EventType::ReadyStateChange => "readystatechange",
        };
        write!(f, "{}", s)
    }
}

// onload / onerror / onreadystatechange の 3 スロット
#[derive(Clone, Default)]
struct EventHandlers {
    load: Option<EventHandler>,
    error: Option<EventHandler>,
    ready_state_change: Option<EventHandler>,
}

impl EventHandlers {
    fn get(&self, event: EventType) -> Option<EventHandler> {
        match event {
            EventType::Load => self.load.clone(),
            EventType::Error => self.error.clone(),
            EventType::ReadyStateChange => self.ready_state_change.clone(),
        }
    }

    fn set(&mut self, event: EventType, handler: Option<EventHandler>) {
        match event {
            EventType::Load => self.load = handler,
            EventType::Error => self.error = handler,
            EventType::ReadyStateChange => self.ready_state_change = handler,
        }
    }
}

// 関数オブジェクトは Debug できないので、「付いているかどうか」だけを表示する
impl Debug for EventHandlers {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("load", &self.load.is_some())
            .field("error", &self.error.is_some())
            .field("ready_state_change", &self.ready_state_change.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_kind_round_trip() {
        for kind in [
            ElementKind::Html,
            ElementKind::Head,
            ElementKind::Link,
            ElementKind::Script,
            ElementKind::Body,
        ] {
            assert_eq!(Ok(kind), ElementKind::from_str(&kind.to_string()));
        }
        assert!(matches!(
            ElementKind::from_str("img"),
            Err(Error::UnexpectedInput(_))
        ));
    }

    #[test]
    fn test_set_attribute_overwrites() {
        let mut e = Element::new(ElementKind::Script, vec![Attribute::new("src", "a.js")]);
        e.set_attribute("src", "b.js");
        e.set_attribute("class", "lazyload extra");
        assert_eq!(Some("b.js"), e.get_attribute("src"));
        assert_eq!(2, e.attributes().len());
        assert!(e.has_class("lazyload"));
        assert!(!e.has_class("lazy"));
        assert_eq!(Some("b.js"), e.resource_url());
    }

    #[test]
    fn test_resource_url_by_kind() {
        let link = Element::new(ElementKind::Link, vec![Attribute::new("href", "a.css")]);
        assert_eq!(Some("a.css"), link.resource_url());
        let head = Element::new(ElementKind::Head, vec![Attribute::new("href", "x")]);
        assert_eq!(None, head.resource_url());
    }

    #[test]
    fn test_event_handlers() {
        let mut node = Node::element(ElementKind::Script, Vec::new());
        assert!(node.event_handler(EventType::Load).is_none());

        node.set_event_handler(EventType::Load, Rc::new(|_: &Rc<RefCell<Node>>| {}));
        assert!(node.event_handler(EventType::Load).is_some());
        assert!(node.event_handler(EventType::Error).is_none());

        node.remove_event_handler(EventType::Load);
        assert!(node.event_handler(EventType::Load).is_none());
    }

    #[test]
    fn test_ready_state_done() {
        assert!(!ReadyState::Uninitialized.is_done());
        assert!(!ReadyState::Loading.is_done());
        assert!(!ReadyState::Interactive.is_done());
        assert!(ReadyState::Loaded.is_done());
        assert!(ReadyState::Complete.is_done());
    }
}
