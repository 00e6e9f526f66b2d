//! lazyload/bin — 模擬ブラウザの上でローダーを動かす最小デモ
//!
//! ここは“アプリの入口”。本物のネットワークは使わず、`Browser`（模擬ブラウザ）に
//! 「取得完了」を手で送りながら、キューが進む様子をログで確認します。
//! - 第 1 引数でエンジンを選べます（gecko / webkit / ie / opera / unknown。省略時は webkit）。
//! - `RUST_LOG=debug` を付けると、スケジューラの判断（並べ方・完了の検出方法）も見えます。
//! - 設定は環境変数 `LAZYLOAD_TIMER_DELAY_MS` / `LAZYLOAD_MARKER_CLASS` / `LAZYLOAD_CHARSET` で上書きできます。

use lazyload_core::browser::Browser;
use lazyload_core::config::LoaderConfig;
use lazyload_core::error::Error;
use lazyload_core::queue::Completion;
use lazyload_core::queue::ResourceKind;
use lazyload_core::scheduler::LazyLoad;
use lazyload_core::utils::convert_dom_to_string;
use log::info;
use std::time::Duration;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let engine = std::env::args().nth(1).unwrap_or_else(|| "webkit".to_string());
    let config = LoaderConfig::from_env()?;

    // 1) 模擬ブラウザとローダーを用意
    let browser = Browser::preset(&engine)?;
    let loader = LazyLoad::with_config(browser.clone(), config);
    info!("engine {} detected as {}", engine, loader.profile());

    // 2) スタイル 2 本（まとめて 1 回のコールバック）
    loader.load_style(
        ["reset.css", "site.css"],
        Completion::new(|_, payload| {
            let label = payload
                .and_then(|p| p.downcast_ref::<&str>())
                .copied()
                .unwrap_or("-");
            info!("styles ready ({})", label);
        })
        .with_payload("layout"),
    );

    // 3) スクリプト 3 本。コールバックの中から次のスクリプトを要求する
    let chained = loader.clone();
    loader.load_script(
        ["jquery.js", "plugins.js", "app.js"],
        Completion::new(move |_, _| {
            info!("scripts ready");
            chained.load(
                ResourceKind::Script,
                "analytics.js",
                Completion::new(|_, _| info!("analytics ready")),
            );
        }),
    );

    // 4) 取得完了を送り続ける（スタイルがタイマー検出のエンジンでは時計も進める）
    let mut rounds = 0;
    while !loader.is_idle() {
        let responded = browser.respond_all();
        browser.advance(Duration::from_millis(100));
        rounds += 1;
        if responded == 0 && browser.pending_timers() == 0 && !loader.is_idle() {
            info!("nothing left to drive after {} rounds", rounds);
            break;
        }
    }

    info!("requested in order: {:?}", browser.requested_urls());
    if let Some(head) = browser.head() {
        print!("{}", convert_dom_to_string(&head));
    }
    Ok(())
}
