//! HTML 属性（attribute）の最小表現
//!
//! - `name="value"` のペアを表すだけの構造体です。
//! - ローダーが作る要素（`<link>` / `<script>`）は属性を最初から全部知っているので、
//!   `Attribute::new("src", url)` のように一度に作ります。
//!
//! 用語の橋渡し（TS / Python / Go）
//! - `String` は“所有する文字列”。`&str` から作るときは `to_string()`。
//! - ゲッターは `&str` を返すので、呼び出し側で不要なコピーが起きません。

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,  // 例: "class"
    value: String, // 例: "lazyload"
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    // 同じ名前の属性を上書きするときに使う
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }
}
