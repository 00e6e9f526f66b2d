//! utils — デバッグ用ユーティリティ（DOM をインデント付きの文字列にする）
//!
//! ローダーが `<head>` に何をどの順番で足したかを目で確認するためのものです。
//!
//! 出力イメージ
//! ```text
//! <head>
//!   <link type="text/css" charset="utf-8" class="lazyload" href="a.css" rel="stylesheet">
//!   <script type="text/javascript" charset="utf-8" class="lazyload" src="a.js"> [loading]
//! ```

use crate::dom::node::Node;
use crate::dom::node::NodeKind;
use crate::dom::node::ReadyState;
use std::cell::RefCell;
use std::rc::Rc;

// `root` 以下（root 自身を含む、root の兄弟は含まない）をインデント付きの文字列にする
pub fn convert_dom_to_string(root: &Rc<RefCell<Node>>) -> String {
    let mut result = String::new();
    convert_dom_to_string_internal(root, 0, &mut result);
    result
}

// 再帰で (1) 自分を出力 → (2) 子を順に深さ+1 で出力
fn convert_dom_to_string_internal(node: &Rc<RefCell<Node>>, depth: usize, result: &mut String) {
    result.push_str(&"  ".repeat(depth));
    result.push_str(&describe(&node.borrow()));
    result.push('\n');

    let mut child = node.borrow().first_child();
    while let Some(n) = child {
        convert_dom_to_string_internal(&n, depth + 1, result);
        child = n.borrow().next_sibling();
    }
}

fn describe(node: &Node) -> String {
    match node.kind {
        NodeKind::Document => "#document".to_string(),
        NodeKind::Element(ref e) => {
            let mut tag = format!("<{}", e.kind());
            for attr in e.attributes() {
                tag.push_str(&format!(" {}=\"{}\"", attr.name(), attr.value()));
            }
            tag.push('>');
            // 読み込み対象の要素だけ状態を添える
            if node.ready_state() != ReadyState::Uninitialized {
                tag.push_str(&format!(" [{}]", node.ready_state()));
            }
            tag
        }
    }
}
