//! Paging over a large menu with interleaved info lines: digits cover only
//! selectable items, page turns clamp at the boundaries, and n/p round-trips
//! reproduce the same page.

mod common;

use std::collections::HashMap;

use common::{info_line, menu_body, menu_line, FixtureServer};
use meshgopher::bot::router::CommandRouter;
use meshgopher::bot::session::Session;
use meshgopher::config::Config;
use meshgopher::gopher::GopherClient;

fn router() -> CommandRouter {
    let config = Config::default();
    CommandRouter::new(GopherClient::new(&config.gopher), config)
}

/// A root menu with 3 info lines sprinkled between `selectable` entries.
fn big_menu(port: u16, selectable: usize) -> HashMap<String, String> {
    let mut lines = vec![info_line("== header ==")];
    for i in 0..selectable {
        if i == 5 {
            lines.push(info_line("-- interlude --"));
        }
        lines.push(menu_line(port, '0', &format!("entry{i}"), &format!("/e{i}")));
    }
    lines.push(info_line("== footer =="));
    let mut map = HashMap::new();
    map.insert("/".to_string(), menu_body(&lines));
    map
}

#[tokio::test]
async fn twenty_selectable_items_page_in_tens() {
    let server = FixtureServer::start(|port| big_menu(port, 20)).await;
    let router = router();
    let mut session = Session::new("!node1".to_string());

    let first = router
        .handle(&mut session, &format!("u {}", server.url("/1/")))
        .await;
    assert!(first.contains("Showing items 1-10 of 20:"));
    assert!(first.contains("0) [0] entry0"));
    assert!(first.contains("9) [0] entry9"));
    assert!(!first.contains("header"));
    assert!(!first.contains("interlude"));

    let second = router.handle(&mut session, "n").await;
    assert!(second.contains("Showing items 11-20 of 20:"));
    assert!(second.contains("0) [0] entry10"));
    assert!(second.contains("9) [0] entry19"));

    // Already on the last page: `n` is a boundary no-op
    let reply = router.handle(&mut session, "n").await;
    assert_eq!(reply, "End of menu.");
    assert_eq!(session.current.as_ref().unwrap().page_index, 1);

    // p returns to the exact first page, and p at the start is a no-op
    let back = router.handle(&mut session, "p").await;
    assert_eq!(back, first);
    let reply = router.handle(&mut session, "p").await;
    assert_eq!(reply, "Already at start.");
    assert_eq!(session.current.as_ref().unwrap().page_index, 0);
}

#[tokio::test]
async fn remainder_lands_on_its_own_page() {
    let server = FixtureServer::start(|port| big_menu(port, 21)).await;
    let router = router();
    let mut session = Session::new("!node1".to_string());

    router
        .handle(&mut session, &format!("u {}", server.url("/1/")))
        .await;
    router.handle(&mut session, "n").await;
    let third = router.handle(&mut session, "n").await;
    assert!(third.contains("Showing items 21-21 of 21:"));
    assert!(third.contains("0) [0] entry20"));

    let reply = router.handle(&mut session, "n").await;
    assert_eq!(reply, "End of menu.");
}

#[tokio::test]
async fn n_then_p_round_trips_from_an_interior_page() {
    let server = FixtureServer::start(|port| big_menu(port, 21)).await;
    let router = router();
    let mut session = Session::new("!node1".to_string());

    router
        .handle(&mut session, &format!("u {}", server.url("/1/")))
        .await;
    let interior = router.handle(&mut session, "n").await;
    let forward = router.handle(&mut session, "n").await;
    assert_ne!(interior, forward);
    let back = router.handle(&mut session, "p").await;
    assert_eq!(back, interior);
}

#[tokio::test]
async fn file_paging_respects_configured_size() {
    let server = FixtureServer::start(|_port| {
        let mut map = HashMap::new();
        let body: String = (0..47).map(|i| format!("line {i}\r\n")).collect();
        map.insert("/long".to_string(), body);
        map
    })
    .await;
    let router = router();
    let mut session = Session::new("!node1".to_string());

    let first = router
        .handle(&mut session, &format!("u {}", server.url("/0/long")))
        .await;
    assert!(first.contains("[Lines 1-20 of 47]"));
    router.handle(&mut session, "n").await;
    let third = router.handle(&mut session, "n").await;
    assert!(third.contains("[Lines 41-47 of 47]"));
    let reply = router.handle(&mut session, "n").await;
    assert_eq!(reply, "End of file.");
}
