//! lazyload_core::strategy — プロファイルから読み込み方式を決める
//!
//! エンジンごとの分岐はここに閉じ込め、スケジューラは列挙型を見て動くだけにします。
//!
//! 並べ方（`LoadStrategy`）
//! - `Parallel`: 複数 URL を 1 つのリクエストにまとめ、全部を続けて `<head>` に追加する。
//!   スタイルシートは取得順に関係なく DOM 順で適用されるので常にこちら。
//!   スクリプトは、取得と実行順を両立できる Gecko / Opera のときだけこちら。
//! - `Sequential`: URL ごとに別のリクエストにして、前のものが終わってから次を追加する。
//!
//! 完了の検出（`CompletionSource`）
//! - `Poll`: 旧 IE。`readystatechange` を見て loaded / complete になったら完了。
//! - `Timer`: Gecko / WebKit のスタイルシート。`<link>` の load が当てにならないので、
//!   「50ms × バッチ内 URL 数」待ったら完了とみなす（ベストエフォートで、本当に読み終わった保証はない）。
//! - `Event`: それ以外。`load` と `error` のどちらか先に来た方で完了。

use crate::queue::ResourceKind;
use crate::user_agent::CapabilityProfile;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadStrategy {
    Parallel,
    Sequential,
}

impl LoadStrategy {
    pub fn select(kind: ResourceKind, profile: &CapabilityProfile) -> Self {
        if kind == ResourceKind::Style || profile.is_gecko() || profile.is_opera() {
            LoadStrategy::Parallel
        } else {
            LoadStrategy::Sequential
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompletionSource {
    Event,
    Poll,
    Timer,
}

impl CompletionSource {
    pub fn select(kind: ResourceKind, profile: &CapabilityProfile) -> Self {
        if profile.is_legacy_ie() {
            CompletionSource::Poll
        } else if kind == ResourceKind::Style && (profile.is_gecko() || profile.is_webkit()) {
            CompletionSource::Timer
        } else {
            CompletionSource::Event
        }
    }
}

/// 種別ごとの方式をまとめたもの。プロファイルが決まった時点で 1 回だけ作ります。
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    style: (LoadStrategy, CompletionSource),
    script: (LoadStrategy, CompletionSource),
}

impl LoadPlan {
    pub fn from_profile(profile: &CapabilityProfile) -> Self {
        let pick = |kind| {
            (
                LoadStrategy::select(kind, profile),
                CompletionSource::select(kind, profile),
            )
        };
        Self {
            style: pick(ResourceKind::Style),
            script: pick(ResourceKind::Script),
        }
    }

    pub fn strategy(&self, kind: ResourceKind) -> LoadStrategy {
        match kind {
            ResourceKind::Style => self.style.0,
            ResourceKind::Script => self.script.0,
        }
    }

    pub fn completion(&self, kind: ResourceKind) -> CompletionSource {
        match kind {
            ResourceKind::Style => self.style.1,
            ResourceKind::Script => self.script.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(profile: CapabilityProfile) -> LoadPlan {
        LoadPlan::from_profile(&profile)
    }

    #[test]
    fn test_styles_always_parallel() {
        for profile in [
            CapabilityProfile::Unknown,
            CapabilityProfile::Gecko(1.9),
            CapabilityProfile::WebKit(533.0),
            CapabilityProfile::LegacyIe(6.0),
            CapabilityProfile::Opera(9.8),
        ] {
            assert_eq!(
                LoadStrategy::Parallel,
                plan(profile).strategy(ResourceKind::Style)
            );
        }
    }

    #[test]
    fn test_script_strategy() {
        let parallel = [CapabilityProfile::Gecko(1.9), CapabilityProfile::Opera(9.8)];
        for profile in parallel {
            assert_eq!(
                LoadStrategy::Parallel,
                plan(profile).strategy(ResourceKind::Script)
            );
        }
        let sequential = [
            CapabilityProfile::WebKit(533.0),
            CapabilityProfile::LegacyIe(8.0),
            CapabilityProfile::Unknown,
        ];
        for profile in sequential {
            assert_eq!(
                LoadStrategy::Sequential,
                plan(profile).strategy(ResourceKind::Script)
            );
        }
    }

    #[test]
    fn test_completion_source() {
        // 旧 IE は種別に関係なく readystatechange
        let ie = plan(CapabilityProfile::LegacyIe(7.0));
        assert_eq!(CompletionSource::Poll, ie.completion(ResourceKind::Style));
        assert_eq!(CompletionSource::Poll, ie.completion(ResourceKind::Script));

        let gecko = plan(CapabilityProfile::Gecko(1.9));
        assert_eq!(CompletionSource::Timer, gecko.completion(ResourceKind::Style));
        assert_eq!(CompletionSource::Event, gecko.completion(ResourceKind::Script));

        let webkit = plan(CapabilityProfile::WebKit(533.0));
        assert_eq!(CompletionSource::Timer, webkit.completion(ResourceKind::Style));
        assert_eq!(CompletionSource::Event, webkit.completion(ResourceKind::Script));

        let opera = plan(CapabilityProfile::Opera(9.8));
        assert_eq!(CompletionSource::Event, opera.completion(ResourceKind::Style));

        let unknown = plan(CapabilityProfile::Unknown);
        assert_eq!(CompletionSource::Event, unknown.completion(ResourceKind::Style));
        assert_eq!(CompletionSource::Event, unknown.completion(ResourceKind::Script));
    }
}
