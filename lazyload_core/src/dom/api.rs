//! DOM のユーティリティ API
//!
//! ローダーが DOM に対して行う操作はとても少なく、次の 4 つだけです。
//! - 要素探し: 最初の `<head>` を見つける（`get_target_element_node`）
//! - 追加: 作った `<link>` / `<script>` を `<head>` の末尾に足す（`append_child`）
//! - 列挙: 子ノードやマーカー class 付きの要素を集める（`children` / `get_elements_by_class_name`）
//! - イベント発火: ホストが `load` などをノードに届ける（`dispatch_event`）
//!
//! 言語ブリッジ（TS / Python / Go）
//! - 再帰関数で「先に子、次に兄弟」をたどる DFS（深さ優先探索）をしています。
//! - `Rc<RefCell<Node>>` は「共有 + 内部可変」なノード参照です。
//!   `borrow()` を持ったままハンドラを呼ぶと、ハンドラ側で `borrow_mut()` したときに実行時エラーになるので、
//!   `dispatch_event` では必ずハンドラを取り出してから借用を手放して呼び出します。

use crate::dom::node::ElementKind;
use crate::dom::node::EventType;
use crate::dom::node::Node;
use log::trace;
use std::cell::RefCell;
use std::rc::Rc;

/// ツリーを深さ優先で探索し、最初に見つかった `element_kind` の要素ノードを返す
///
/// - 探索順: 「自分 → 子（first_child）→ 兄弟（next_sibling）」の順で DFS。
/// - 返り値: 見つかれば Some(ノード参照)、なければ None。
pub fn get_target_element_node(
    node: Option<Rc<RefCell<Node>>>,
    element_kind: ElementKind,
) -> Option<Rc<RefCell<Node>>> {
    match node {
        Some(n) => {
            if n.borrow().element_kind() == Some(element_kind) {
                return Some(n.clone());
            }
            let result1 = get_target_element_node(n.borrow().first_child(), element_kind); // 子へ降りる
            if result1.is_some() {
                return result1;
            }
            get_target_element_node(n.borrow().next_sibling(), element_kind) // 兄弟へ進む
        }
        None => None,
    }
}

/// `parent` の最後の子として `child` をつなぐ（`parent.appendChild(child)` 相当）
///
/// - `child` はまだどこにもつながっていないノードを想定します。
/// - 親 → 子は `Rc`（first_child / next_sibling）、子 → 親や兄は `Weak` で張ります。
pub fn append_child(parent: &Rc<RefCell<Node>>, child: Rc<RefCell<Node>>) {
    let last = parent.borrow().last_child().upgrade();

    child.borrow_mut().set_parent(Rc::downgrade(parent));

    match last {
        Some(last) => {
            child.borrow_mut().set_previous_sibling(Rc::downgrade(&last));
            last.borrow_mut().set_next_sibling(Some(child.clone()));
        }
        None => {
            parent.borrow_mut().set_first_child(Some(child.clone()));
        }
    }

    parent.borrow_mut().set_last_child(Rc::downgrade(&child));
}

/// 直下の子ノードを順番に集める
pub fn children(parent: &Rc<RefCell<Node>>) -> Vec<Rc<RefCell<Node>>> {
    let mut result = Vec::new();
    let mut current = parent.borrow().first_child();
    while let Some(node) = current {
        current = node.borrow().next_sibling();
        result.push(node);
    }
    result
}

/// `root` 以下（root 自身を含む）で class 属性に `class_name` を持つ要素を文書順に集める
pub fn get_elements_by_class_name(
    root: &Rc<RefCell<Node>>,
    class_name: &str,
) -> Vec<Rc<RefCell<Node>>> {
    let mut result = Vec::new();
    collect_by_class(root, class_name, &mut result);
    result
}

fn collect_by_class(node: &Rc<RefCell<Node>>, class_name: &str, result: &mut Vec<Rc<RefCell<Node>>>) {
    let matched = node
        .borrow()
        .get_element()
        .map(|e| e.has_class(class_name))
        .unwrap_or(false);
    if matched {
        result.push(node.clone());
    }
    for child in children(node) {
        collect_by_class(&child, class_name, result);
    }
}

/// ノードにイベントを届ける。ハンドラが無ければ何もしない。
///
/// 戻り値は「ハンドラが呼ばれたかどうか」。
pub fn dispatch_event(node: &Rc<RefCell<Node>>, event: EventType) -> bool {
    // 借用はこの行で手放す（ハンドラ内でノードを書き換えられるように）
    let handler = node.borrow().event_handler(event);
    match handler {
        Some(handler) => {
            trace!("dispatch {} to {:?}", event, node.borrow().element_kind());
            handler(node);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::attribute::Attribute;
    use crate::dom::node::ReadyState;
    use crate::dom::node::Window;
    use std::cell::Cell;

    fn element(kind: ElementKind, attributes: Vec<Attribute>) -> Rc<RefCell<Node>> {
        Rc::new(RefCell::new(Node::element(kind, attributes)))
    }

    #[test]
    fn test_append_and_find() {
        // Document → html → (head, body)
        let window = Window::new();
        let document = window.document();
        let html = element(ElementKind::Html, Vec::new());
        let head = element(ElementKind::Head, Vec::new());
        let body = element(ElementKind::Body, Vec::new());
        append_child(&document, html.clone());
        append_child(&html, head.clone());
        append_child(&html, body.clone());

        let found = get_target_element_node(Some(document.clone()), ElementKind::Body)
            .expect("body exists");
        assert!(Rc::ptr_eq(&body, &found));

        let found = get_target_element_node(Some(document.clone()), ElementKind::Head)
            .expect("head exists");
        assert!(Rc::ptr_eq(&head, &found));

        assert!(get_target_element_node(Some(document), ElementKind::Script).is_none());

        let kids = children(&html);
        assert_eq!(2, kids.len());
        assert!(Rc::ptr_eq(&head, &kids[0]));
        assert!(Rc::ptr_eq(&body, &kids[1]));

        // 逆リンク
        let parent = body.borrow().parent().upgrade().expect("parent link");
        assert!(Rc::ptr_eq(&html, &parent));
        let previous = body.borrow().previous_sibling().upgrade().expect("sibling link");
        assert!(Rc::ptr_eq(&head, &previous));
    }

    #[test]
    fn test_get_elements_by_class_name() {
        let head = element(ElementKind::Head, Vec::new());
        append_child(
            &head,
            element(ElementKind::Script, vec![Attribute::new("class", "lazyload")]),
        );
        append_child(&head, element(ElementKind::Script, Vec::new()));
        append_child(
            &head,
            element(ElementKind::Link, vec![Attribute::new("class", "x lazyload")]),
        );

        let found = get_elements_by_class_name(&head, "lazyload");
        assert_eq!(2, found.len());
        assert_eq!(Some(ElementKind::Script), found[0].borrow().element_kind());
        assert_eq!(Some(ElementKind::Link), found[1].borrow().element_kind());
    }

    #[test]
    fn test_dispatch_event_allows_mutation_in_handler() {
        let node = element(ElementKind::Script, Vec::new());
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        node.borrow_mut().set_event_handler(
            EventType::ReadyStateChange,
            Rc::new(move |n: &Rc<RefCell<Node>>| {
                counter.set(counter.get() + 1);
                // ハンドラの中で自分自身を外せる
                n.borrow_mut().remove_event_handler(EventType::ReadyStateChange);
                n.borrow_mut().set_ready_state(ReadyState::Complete);
            }),
        );

        assert!(dispatch_event(&node, EventType::ReadyStateChange));
        assert!(!dispatch_event(&node, EventType::ReadyStateChange));
        assert!(!dispatch_event(&node, EventType::Load));
        assert_eq!(1, calls.get());
        assert_eq!(ReadyState::Complete, node.borrow().ready_state());
    }
}
