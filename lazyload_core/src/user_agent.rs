//! lazyload_core::user_agent — UA 文字列からエンジン系統とバージョンを判定する
//!
//! 役割
//! - ブラウザの識別文字列（User-Agent）から「どのエンジン系統か」を 1 回だけ判定し、
//!   `CapabilityProfile` として返します。
//! - 判定結果は読み込み方式（並列/逐次、完了検出の方法）を選ぶためだけに使います。
//!
//! 判定の優先順位（最初に当たったものを採用）
//! 1. `AppleWebKit/<ver>`（大文字小文字は区別しない） → `WebKit(ver)`
//! 2. `MSIE <ver>`                                    → `LegacyIe(ver)`
//! 3. `Gecko/...`（バージョンは `rv:<ver>`、無ければ 1）  → `Gecko(ver)`
//! 4. `Opera/<ver>`                                   → `Opera(ver)`
//! - どれにも当たらなければ `Unknown`。これは失敗ではなく正常な結果です。
//!
//! バージョンの読み方
//! - 先頭から読める数値部分だけを使います（`533.18.1` → 533.18、`1.9.2.8` → 1.9）。
//! - トークンは見つかったのに数値として読めない / 0 になる場合は `Unknown` 扱いです。
//!
//! 言語ブリッジ（TS / Python / Go）
//! - `OnceCell` は「最初の 1 回だけ計算して以後はキャッシュを返す」入れ物。
//!   Python の `functools.cache`、Go の `sync.Once` に近い感覚です。

use log::debug;
use regex::Captures;
use regex::Regex;
use std::cell::OnceCell;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::LazyLock;

static WEBKIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)AppleWebKit/(\S*)").expect("valid webkit pattern"));
static MSIE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MSIE\s([^;]*)").expect("valid msie pattern"));
static GECKO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Gecko/\S*").expect("valid gecko pattern"));
static GECKO_RV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rv:([^\s)]*)").expect("valid rv pattern"));
static OPERA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Opera/(\S*)").expect("valid opera pattern"));
static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("valid float pattern")
});

/// 判定済みのエンジン系統とバージョン
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapabilityProfile {
    Unknown,
    Gecko(f64),
    WebKit(f64),
    LegacyIe(f64),
    Opera(f64),
}

impl CapabilityProfile {
    pub fn is_gecko(&self) -> bool {
        matches!(self, CapabilityProfile::Gecko(_))
    }

    pub fn is_webkit(&self) -> bool {
        matches!(self, CapabilityProfile::WebKit(_))
    }

    pub fn is_legacy_ie(&self) -> bool {
        matches!(self, CapabilityProfile::LegacyIe(_))
    }

    pub fn is_opera(&self) -> bool {
        matches!(self, CapabilityProfile::Opera(_))
    }

    pub fn version(&self) -> Option<f64> {
        match self {
            CapabilityProfile::Unknown => None,
            CapabilityProfile::Gecko(v)
            | CapabilityProfile::WebKit(v)
            | CapabilityProfile::LegacyIe(v)
            | CapabilityProfile::Opera(v) => Some(*v),
        }
    }
}

impl Display for CapabilityProfile {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            CapabilityProfile::Unknown => write!(f, "unknown"),
            CapabilityProfile::Gecko(v) => write!(f, "gecko {}", v),
            CapabilityProfile::WebKit(v) => write!(f, "webkit {}", v),
            CapabilityProfile::LegacyIe(v) => write!(f, "legacy-ie {}", v),
            CapabilityProfile::Opera(v) => write!(f, "opera {}", v),
        }
    }
}

/// UA 文字列を 1 回だけ判定してキャッシュする入れ物
///
/// - スケジューラが 1 つずつ所有します（テストで独立したスケジューラを何個でも作れるように）。
/// - `profile()` に渡す `source` は最初の呼び出しでしか実行されません。
#[derive(Debug, Default)]
pub struct UserAgentProbe {
    profile: OnceCell<CapabilityProfile>,
}

impl UserAgentProbe {
    pub fn new() -> Self {
        Self {
            profile: OnceCell::new(),
        }
    }

    pub fn profile<F>(&self, source: F) -> CapabilityProfile
    where
        F: FnOnce() -> String,
    {
        *self.profile.get_or_init(|| {
            let user_agent = source();
            let profile = detect(&user_agent);
            debug!("capability profile {} from {:?}", profile, user_agent);
            profile
        })
    }

    /// 判定済みならその結果（まだなら None）
    pub fn cached(&self) -> Option<CapabilityProfile> {
        self.profile.get().copied()
    }
}

/// UA 文字列からプロファイルを判定する（キャッシュなしの純粋関数）
pub fn detect(user_agent: &str) -> CapabilityProfile {
    if let Some(token) = non_empty_capture(WEBKIT.captures(user_agent)) {
        return truthy(parse_leading_float(token))
            .map(CapabilityProfile::WebKit)
            .unwrap_or(CapabilityProfile::Unknown);
    }

    if let Some(token) = non_empty_capture(MSIE.captures(user_agent)) {
        return truthy(parse_leading_float(token))
            .map(CapabilityProfile::LegacyIe)
            .unwrap_or(CapabilityProfile::Unknown);
    }

    if GECKO.is_match(user_agent) {
        // rv: が無ければバージョン 1 とみなす
        return match non_empty_capture(GECKO_RV.captures(user_agent)) {
            Some(token) => truthy(parse_leading_float(token))
                .map(CapabilityProfile::Gecko)
                .unwrap_or(CapabilityProfile::Unknown),
            None => CapabilityProfile::Gecko(1.0),
        };
    }

    if let Some(caps) = OPERA.captures(user_agent) {
        let token = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        return truthy(parse_leading_float(token))
            .map(CapabilityProfile::Opera)
            .unwrap_or(CapabilityProfile::Unknown);
    }

    CapabilityProfile::Unknown
}

fn non_empty_capture(caps: Option<Captures<'_>>) -> Option<&str> {
    caps.and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}

// "533.18.1" のような文字列から先頭の数値部分だけを読む。読めなければ None。
fn parse_leading_float(s: &str) -> Option<f64> {
    LEADING_FLOAT
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

// 0 や NaN は「判定できなかった」扱い
fn truthy(v: Option<f64>) -> Option<f64> {
    v.filter(|v| *v != 0.0 && !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const SAFARI: &str = "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_4; en-us) AppleWebKit/533.18.1 (KHTML, like Gecko) Version/5.0.2 Safari/533.18.5";
    const IE8: &str = "Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1; Trident/4.0)";
    const FIREFOX: &str =
        "Mozilla/5.0 (Windows; U; Windows NT 6.1; en-US; rv:1.9.2.8) Gecko/20100722 Firefox/3.6.8";
    const OPERA_10: &str = "Opera/9.80 (Windows NT 6.1; U; en) Presto/2.6.30 Version/10.61";

    #[test]
    fn test_webkit() {
        assert_eq!(CapabilityProfile::WebKit(533.18), detect(SAFARI));
        // 大文字小文字の揺れは許容
        assert_eq!(
            CapabilityProfile::WebKit(525.0),
            detect("Mozilla/5.0 AppleWebkit/525 Safari")
        );
    }

    #[test]
    fn test_legacy_ie() {
        assert_eq!(CapabilityProfile::LegacyIe(8.0), detect(IE8));
        assert!(detect(IE8).is_legacy_ie());
    }

    #[test]
    fn test_gecko() {
        assert_eq!(CapabilityProfile::Gecko(1.9), detect(FIREFOX));
        // rv: が無いときは 1
        assert_eq!(
            CapabilityProfile::Gecko(1.0),
            detect("Mozilla/5.0 Gecko/20100101 Firefox")
        );
    }

    #[test]
    fn test_opera() {
        assert_eq!(CapabilityProfile::Opera(9.8), detect(OPERA_10));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(CapabilityProfile::Unknown, detect("curl/7.68.0"));
        assert_eq!(CapabilityProfile::Unknown, detect(""));
        assert_eq!(None, CapabilityProfile::Unknown.version());
    }

    #[test]
    fn test_unparsable_version_is_unknown() {
        assert_eq!(CapabilityProfile::Unknown, detect("AppleWebKit/abc"));
        assert_eq!(CapabilityProfile::Unknown, detect("Opera/"));
        // 空のキャプチャは「一致しなかった」として次の候補へ進む
        assert_eq!(CapabilityProfile::LegacyIe(6.0), detect("AppleWebKit/ MSIE 6.0;"));
    }

    #[test]
    fn test_precedence() {
        // WebKit の UA には "like Gecko" が含まれるが、WebKit が優先
        assert!(detect(SAFARI).is_webkit());
        assert!(!detect(SAFARI).is_gecko());
    }

    #[test]
    fn test_leading_float() {
        assert_eq!(Some(533.18), parse_leading_float("533.18.1"));
        assert_eq!(Some(1.9), parse_leading_float("1.9.2.8"));
        assert_eq!(Some(8.0), parse_leading_float(" 8.0"));
        assert_eq!(None, parse_leading_float("x1"));
    }

    #[test]
    fn test_probe_is_memoized() {
        let probe = UserAgentProbe::new();
        let reads = Cell::new(0);
        assert_eq!(None, probe.cached());

        let first = probe.profile(|| {
            reads.set(reads.get() + 1);
            FIREFOX.to_string()
        });
        let second = probe.profile(|| {
            reads.set(reads.get() + 1);
            SAFARI.to_string()
        });

        assert_eq!(1, reads.get());
        assert_eq!(first, second);
        assert_eq!(
            first.version().map(f64::to_bits),
            second.version().map(f64::to_bits)
        );
        assert_eq!(Some(first), probe.cached());
    }
}
