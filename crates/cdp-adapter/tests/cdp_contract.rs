//! Contract tests against a real Chromium binary. Ignored by default; run
//! with `BUSFLOW_CDP_CONTRACT=1 cargo test -- --ignored`.

use std::time::Duration;

use cdp_adapter::util::env_flag;
use cdp_adapter::{CdpAdapter, CdpConfig};

fn contract_enabled() -> bool {
    env_flag("BUSFLOW_CDP_CONTRACT")
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set BUSFLOW_CDP_CONTRACT=1"]
async fn contract_navigate_and_evaluate() {
    if !contract_enabled() {
        eprintln!("skipping CDP contract test (BUSFLOW_CDP_CONTRACT not enabled)");
        return;
    }

    let adapter = CdpAdapter::launch(&CdpConfig::default().headless(true))
        .await
        .expect("launch chromium");
    adapter
        .goto("data:text/html,<title>busflow</title><p>hi</p>", Duration::from_secs(15))
        .await
        .expect("navigate");
    let title: String = adapter.evaluate("document.title").await.expect("evaluate");
    assert_eq!(title, "busflow");

    let shot = tempfile::tempdir().unwrap();
    let path = shot.path().join("page.png");
    adapter.screenshot(&path, true).await.expect("screenshot");
    assert!(path.exists());

    adapter.close().await.expect("close");
}
