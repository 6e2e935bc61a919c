// crates/feed-archiver-metrics/tests/influx_writer.rs
// ============================================================================
// Module: Influx Writer Integration Tests
// Description: Batch flushing against a stub HTTP server.
// Purpose: Verify threshold flushes, the final flush, and error tolerance.
// Dependencies: feed-archiver-core, feed-archiver-metrics, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Integration tests for the batching writer: a pending batch flushes when
//! it reaches the configured size, a partial batch flushes once every sink
//! handle is dropped, and a store that rejects the write never stops the
//! writer from completing.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::thread;

use tiny_http::Response;
use tiny_http::Server;

use feed_archiver_core::MetricPoint;
use feed_archiver_core::MetricsSink;
use feed_archiver_metrics::InfluxConfig;
use feed_archiver_metrics::spawn_writer;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// One captured stub-server write.
struct CapturedWrite {
    /// Request path and query.
    url: String,
    /// Raw line-protocol body.
    body: String,
}

/// Serves exactly one write with the given status, capturing it.
fn one_shot_server(status: u16) -> (String, thread::JoinHandle<Option<CapturedWrite>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let endpoint = format!("http://{addr}");
    let handle = thread::spawn(move || {
        let mut request = server.recv().ok()?;
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).ok()?;
        let captured = CapturedWrite {
            url: request.url().to_string(),
            body,
        };
        let _ = request.respond(Response::from_string("").with_status_code(status));
        Some(captured)
    });
    (endpoint, handle)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn a_full_batch_flushes_at_the_threshold() {
    let (endpoint, server) = one_shot_server(204);
    let config = InfluxConfig::new(&endpoint, "feed_archiver", 2);
    let (sink, writer) = spawn_writer(&config).unwrap();

    sink.record(MetricPoint::insert_row("shop_orders", 10));
    sink.record(MetricPoint::insert_row("shop_orders", 20));

    let captured = server.join().unwrap().unwrap();
    assert_eq!(captured.url, "/write?db=feed_archiver");
    let lines: Vec<&str> = captured.body.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("insert_row,table=shop_orders size=10i "));
    assert!(lines[1].starts_with("insert_row,table=shop_orders size=20i "));

    drop(sink);
    writer.await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn a_partial_batch_flushes_when_the_sink_closes() {
    let (endpoint, server) = one_shot_server(204);
    let config = InfluxConfig::new(&endpoint, "feed_archiver", 10);
    let (sink, writer) = spawn_writer(&config).unwrap();

    sink.record(MetricPoint::index_doc("news-data"));
    drop(sink);
    writer.await.unwrap();

    let captured = server.join().unwrap().unwrap();
    let lines: Vec<&str> = captured.body.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("index_doc,index=news-data count=1i "));
}

#[tokio::test(flavor = "multi_thread")]
async fn a_rejected_batch_is_discarded_and_the_writer_finishes() {
    let (endpoint, server) = one_shot_server(500);
    let config = InfluxConfig::new(&endpoint, "feed_archiver", 1);
    let (sink, writer) = spawn_writer(&config).unwrap();

    sink.record(MetricPoint::insert_row("shop_orders", 1));
    drop(sink);
    writer.await.unwrap();

    assert!(server.join().unwrap().is_some());
}

#[tokio::test]
async fn an_unreachable_store_never_blocks_shutdown() {
    // Port 9 is discard; nothing listens there in the test environment.
    let config = InfluxConfig::new("http://127.0.0.1:9", "feed_archiver", 1);
    let (sink, writer) = spawn_writer(&config).unwrap();

    sink.record(MetricPoint::insert_row("shop_orders", 1));
    drop(sink);
    writer.await.unwrap();
}
