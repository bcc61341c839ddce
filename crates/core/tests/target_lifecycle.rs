//! Lifecycle tests driving targets through the registry with mock sessions.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tabwire::testing::MockOpener;
use tabwire::{Gate, Page, TargetInfo, TargetOptions, TargetRegistry, TargetType};

fn registry() -> Arc<TargetRegistry> {
	TargetRegistry::new(TargetOptions::default())
}

fn announce(registry: &Arc<TargetRegistry>, info: TargetInfo, opener: &MockOpener) -> tabwire::Target {
	let context = registry.context(info.browser_context_id.as_deref());
	let factory = opener.factory(&info.target_id);
	registry.target_created(info, context, factory)
}

async fn settles_within(target: &tabwire::Target, ms: u64) -> Option<bool> {
	tokio::time::timeout(Duration::from_millis(ms), target.when_initialized())
		.await
		.ok()
}

#[tokio::test]
async fn test_blank_page_waits_for_first_commit() {
	let registry = registry();
	let target = announce(&registry, TargetInfo::new("T1", "page", ""), &MockOpener::new());

	assert_eq!(settles_within(&target, 20).await, None);
	assert!(!target.is_initialized());

	registry.target_info_changed(TargetInfo::new("T1", "page", ""));
	assert_eq!(settles_within(&target, 20).await, None);

	registry.target_info_changed(TargetInfo::new("T1", "page", "https://example.com/"));
	assert_eq!(settles_within(&target, 1000).await, Some(true));
	assert_eq!(target.url(), "https://example.com/");
}

#[tokio::test]
async fn test_non_page_kinds_are_ready_immediately() {
	let registry = registry();
	let opener = MockOpener::new();

	for (id, kind) in [
		("B", "browser"),
		("BG", "background_page"),
		("SW", "service_worker"),
		("SH", "shared_worker"),
		("IF", "iframe"),
	] {
		let target = announce(&registry, TargetInfo::new(id, kind, ""), &opener);
		assert!(target.is_initialized(), "{kind} should be initialized");
		assert_eq!(settles_within(&target, 1000).await, Some(true));
	}

	assert_eq!(registry.get("IF").unwrap().kind(), TargetType::Other);
}

#[tokio::test]
async fn test_concurrent_page_calls_share_one_session() {
	let registry = registry();
	let opener = MockOpener::new();
	let release: Gate<()> = Gate::new("open");
	opener.hold_until(release.clone());
	let target = announce(&registry, TargetInfo::new("T1", "page", "about:blank"), &opener);

	let (a, b, ()) = tokio::join!(target.page(), target.page(), async {
		tokio::task::yield_now().await;
		release.resolve(()).unwrap();
	});
	let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());

	assert!(Page::same(&a, &b));
	assert_eq!(opener.open_count(), 1);

	let c = target.page().await.unwrap().unwrap();
	assert!(Page::same(&a, &c));
	assert_eq!(opener.open_count(), 1);
}

#[tokio::test]
async fn test_wrong_kind_materializers_yield_none() {
	let registry = registry();
	let opener = MockOpener::new();
	let page = announce(&registry, TargetInfo::new("P", "page", "about:blank"), &opener);
	let worker = announce(&registry, TargetInfo::new("W", "service_worker", "https://x/sw.js"), &opener);
	let browser = announce(&registry, TargetInfo::new("B", "browser", ""), &opener);

	assert!(page.worker().await.unwrap().is_none());
	assert!(worker.page().await.unwrap().is_none());
	assert!(browser.page().await.unwrap().is_none());
	assert!(browser.worker().await.unwrap().is_none());
	assert_eq!(opener.open_count(), 0);

	assert!(worker.worker().await.unwrap().is_some());
	assert_eq!(opener.open_count(), 1);
}

#[tokio::test]
async fn test_readiness_waits_for_popup_delivery() {
	let registry = registry();
	let opener_sessions = MockOpener::new();
	let popup_sessions = MockOpener::new();

	let opener = announce(&registry, TargetInfo::new("B", "page", "https://opener.example/"), &opener_sessions);
	let opener_page = opener.page().await.unwrap().unwrap();

	let entered: Gate<()> = Gate::new("handler entered");
	let release: Gate<()> = Gate::new("handler release");
	let seen = Arc::new(Mutex::new(Vec::new()));
	let _sub = {
		let (entered, release, seen) = (entered.clone(), release.clone(), Arc::clone(&seen));
		opener_page.on_popup(move |popup: Page| {
			let (entered, release, seen) = (entered.clone(), release.clone(), Arc::clone(&seen));
			async move {
				seen.lock().push(popup);
				entered.try_resolve(());
				release.wait().await;
				Ok(())
			}
		})
	};

	let popup = announce(&registry, TargetInfo::new("A", "page", "").opener_id("B"), &popup_sessions);
	let waiter = {
		let popup = popup.clone();
		tokio::spawn(async move { popup.when_initialized().await })
	};

	registry.target_info_changed(TargetInfo::new("A", "page", "https://popup.example/").opener_id("B"));

	tokio::time::timeout(Duration::from_secs(1), entered.wait()).await.unwrap();
	assert!(popup.is_initialized());
	assert_eq!(settles_within(&popup, 20).await, None);
	assert!(!waiter.is_finished());

	release.resolve(()).unwrap();
	assert!(waiter.await.unwrap());

	let delivered = seen.lock().clone();
	assert_eq!(delivered.len(), 1);
	let popup_page = popup.page().await.unwrap().unwrap();
	assert!(Page::same(&delivered[0], &popup_page));
	assert_eq!(popup_sessions.open_count(), 1);
}

#[tokio::test]
async fn test_popup_without_listener_skips_page_creation() {
	let registry = registry();
	let opener_sessions = MockOpener::new();
	let popup_sessions = MockOpener::new();

	let opener = announce(&registry, TargetInfo::new("B", "page", "https://opener.example/"), &opener_sessions);
	opener.page().await.unwrap().unwrap();

	let popup = announce(&registry, TargetInfo::new("A", "page", "").opener_id("B"), &popup_sessions);
	registry.target_info_changed(TargetInfo::new("A", "page", "https://popup.example/").opener_id("B"));

	assert_eq!(settles_within(&popup, 1000).await, Some(true));
	assert_eq!(popup_sessions.open_count(), 0);
}

#[tokio::test]
async fn test_popup_without_opener_page_skips_page_creation() {
	let registry = registry();
	let popup_sessions = MockOpener::new();

	announce(&registry, TargetInfo::new("B", "page", "https://opener.example/"), &MockOpener::new());
	let popup = announce(
		&registry,
		TargetInfo::new("A", "page", "https://popup.example/").opener_id("B"),
		&popup_sessions,
	);

	assert_eq!(settles_within(&popup, 1000).await, Some(true));
	assert_eq!(popup_sessions.open_count(), 0);
}

#[tokio::test]
async fn test_popup_page_failure_does_not_fail_readiness() {
	let registry = registry();
	let opener = announce(&registry, TargetInfo::new("B", "page", "https://opener.example/"), &MockOpener::new());
	let opener_page = opener.page().await.unwrap().unwrap();
	let _sub = opener_page.on_popup(|_| async { Ok(()) });

	let popup_sessions = MockOpener::new();
	popup_sessions.fail_method("Page.enable");
	let popup = announce(
		&registry,
		TargetInfo::new("A", "page", "https://popup.example/").opener_id("B"),
		&popup_sessions,
	);

	assert_eq!(settles_within(&popup, 1000).await, Some(true));
	let err = popup.page().await.unwrap_err();
	assert_eq!(err.remote_code(), Some(-32000));
	assert_eq!(popup_sessions.open_count(), 1);
}

#[tokio::test]
async fn test_destroyed_before_ready() {
	let registry = registry();
	let target = announce(&registry, TargetInfo::new("T1", "page", ""), &MockOpener::new());

	registry.target_destroyed("T1");
	assert_eq!(settles_within(&target, 1000).await, Some(false));
	tokio::time::timeout(Duration::from_secs(1), target.when_closed())
		.await
		.unwrap();

	target.report_closed();
	assert!(target.is_closed());
	assert_eq!(settles_within(&target, 1000).await, Some(false));

	target.report_info_changed(TargetInfo::new("T1", "page", "https://late.example/"));
	assert_eq!(settles_within(&target, 1000).await, Some(false));
	assert_eq!(target.url(), "https://late.example/");
}

#[tokio::test]
async fn test_opener_lookup() {
	let registry = registry();
	let opener = MockOpener::new();

	let orphan = announce(&registry, TargetInfo::new("A", "page", "about:blank"), &opener);
	assert!(orphan.opener().is_none());

	announce(&registry, TargetInfo::new("B", "page", "about:blank"), &opener);
	let child = announce(&registry, TargetInfo::new("C", "page", "about:blank").opener_id("B"), &opener);
	assert_eq!(child.opener().unwrap().id(), "B");

	registry.target_destroyed("B");
	assert!(child.opener().is_none());

	let stale = announce(&registry, TargetInfo::new("D", "page", "about:blank").opener_id("nope"), &opener);
	assert!(stale.opener().is_none());
}

#[tokio::test]
async fn test_failed_page_is_memoized_for_every_waiter() {
	let registry = registry();
	let opener = MockOpener::new();
	opener.fail_open("transport closed");
	let target = announce(&registry, TargetInfo::new("T1", "page", "about:blank"), &opener);

	let (a, b) = tokio::join!(target.page(), target.page());
	let c = target.page().await;

	for outcome in [a, b, c] {
		let err = outcome.unwrap_err();
		assert!(err.to_string().contains("transport closed"), "{err}");
	}
	assert_eq!(opener.open_count(), 1);
}

#[tokio::test]
async fn test_owning_context_is_fixed() {
	let registry = registry();
	let target = announce(
		&registry,
		TargetInfo::new("T1", "page", "about:blank").browser_context_id("CTX"),
		&MockOpener::new(),
	);

	registry.target_info_changed(TargetInfo::new("T1", "page", "https://example.com/").browser_context_id("OTHER"));
	assert_eq!(target.browser_context().id(), Some("CTX"));
	assert!(Arc::ptr_eq(&target.registry().unwrap(), &registry));
}

#[tokio::test]
async fn test_screenshot_through_materialized_page() {
	let registry = registry();
	let opener = MockOpener::new();
	opener.on_open(|session| {
		session.reply("Page.captureScreenshot", serde_json::json!({ "data": "iVBORw==" }));
	});
	let target = announce(&registry, TargetInfo::new("T1", "page", "about:blank"), &opener);

	let page = target.page().await.unwrap().unwrap();
	let png = page.screenshot(Default::default()).await.unwrap();

	assert_eq!(png, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_detached_session_does_not_affect_page() {
	let registry = registry();
	let opener = MockOpener::new();
	let target = announce(&registry, TargetInfo::new("T1", "page", "about:blank"), &opener);

	let page = target.page().await.unwrap().unwrap();
	let extra = target.open_session().await.unwrap();
	extra.detach().await.unwrap();

	let sessions = opener.sessions();
	assert!(!sessions[0].is_detached());
	assert!(sessions[1].is_detached());
	assert!(extra.send("Runtime.evaluate", serde_json::json!({})).await.unwrap_err().is_target_closed());
	assert!(page.session().send("Runtime.evaluate", serde_json::json!({})).await.is_ok());
}
