//! 読み込み用の要素（`<link rel="stylesheet">` / `<script>`）を作る
//!
//! 作った要素はまだどこにもつながっていません。`<head>` に追加するのはスケジューラの仕事で、
//! 追加した瞬間にホストが取得を始めます。URL の形式チェックはしません（壊れた URL は
//! ブラウザ側の読み込み失敗として返ってくるだけです）。

use crate::config::LoaderConfig;
use crate::constants::SCRIPT_MIME_TYPE;
use crate::constants::STYLE_MIME_TYPE;
use crate::constants::STYLE_REL;
use crate::dom::attribute::Attribute;
use crate::dom::node::ElementKind;
use crate::dom::node::Node;
use crate::queue::ResourceKind;
use std::cell::RefCell;
use std::rc::Rc;

pub fn create_node(kind: ResourceKind, url: &str, config: &LoaderConfig) -> Rc<RefCell<Node>> {
    let node = match kind {
        ResourceKind::Style => Node::element(
            ElementKind::Link,
            vec![
                Attribute::new("type", STYLE_MIME_TYPE),
                Attribute::new("charset", config.charset()),
                Attribute::new("class", config.marker_class()),
                Attribute::new("href", url),
                Attribute::new("rel", STYLE_REL),
            ],
        ),
        ResourceKind::Script => Node::element(
            ElementKind::Script,
            vec![
                Attribute::new("type", SCRIPT_MIME_TYPE),
                Attribute::new("charset", config.charset()),
                Attribute::new("class", config.marker_class()),
                Attribute::new("src", url),
            ],
        ),
    };
    Rc::new(RefCell::new(node))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_node() {
        let node = create_node(ResourceKind::Style, "site.css", &LoaderConfig::default());
        let node = node.borrow();
        let e = node.get_element().expect("element node");
        assert_eq!(ElementKind::Link, e.kind());
        assert_eq!(Some("text/css"), e.get_attribute("type"));
        assert_eq!(Some("utf-8"), e.get_attribute("charset"));
        assert_eq!(Some("lazyload"), e.get_attribute("class"));
        assert_eq!(Some("site.css"), e.get_attribute("href"));
        assert_eq!(Some("stylesheet"), e.get_attribute("rel"));
        assert_eq!(None, e.get_attribute("src"));
        // つながっていない
        assert!(node.parent().upgrade().is_none());
    }

    #[test]
    fn test_script_node() {
        let config = LoaderConfig::default().with_marker_class("deferred");
        let node = create_node(ResourceKind::Script, "not a url", &config);
        let node = node.borrow();
        let e = node.get_element().expect("element node");
        assert_eq!(ElementKind::Script, e.kind());
        assert_eq!(Some("text/javascript"), e.get_attribute("type"));
        assert_eq!(Some("deferred"), e.get_attribute("class"));
        // URL はそのまま（検証しない）
        assert_eq!(Some("not a url"), e.get_attribute("src"));
        assert_eq!(Some("not a url"), e.resource_url());
    }
}
