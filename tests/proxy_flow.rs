//! Request flow tests: forwarding, loopback limits, response filters, tees.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use traffic_proxy::config::{CallConfig, RouteConfig};
use traffic_proxy::HttpServer;

mod common;

#[tokio::test]
async fn test_forward_after_loopback_rewrite() {
    let backend = common::start_mock_backend(200, "from-backend").await;

    let config = common::config(&format!(
        r#"
        [[routes]]
        name = "entry"
        predicates = [{{ name = "PathPrefix", args = ["/old"] }}]
        filters = [
          {{ name = "setPath", args = ["/new"] }},
          {{ name = "setResponseHeader", args = ["x-entry", "1"] }},
        ]
        backend = "<loopback>"

        [[routes]]
        name = "upstream"
        predicates = [{{ name = "Path", args = ["/new"] }}]
        filters = [{{ name = "setResponseHeader", args = ["x-upstream", "1"] }}]
        backend = "{}"
        "#,
        backend.url()
    ));
    let (addr, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{addr}/old/thing?q=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-entry"], "1");
    assert_eq!(res.headers()["x-upstream"], "1");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "from-backend");
    assert_eq!(backend.request_lines(), vec!["GET /new?q=1 HTTP/1.1".to_string()]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_loopback_cycle_is_internal_error() {
    let config = common::config(
        r#"
        [routing]
        max_loopbacks = 3

        [[routes]]
        name = "cycle"
        backend = "<loopback>"
        "#,
    );
    let (addr, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{addr}/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_request_is_not_found() {
    let config = common::config(
        r#"
        [[routes]]
        name = "only"
        predicates = [{ name = "Path", args = ["/only"] }]
        filters = [{ name = "status", args = [204] }]
        backend = "<shunt>"
        "#,
    );
    let (addr, shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let res = client.get(format!("http://{addr}/other")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let res = client.get(format!("http://{addr}/only/")).send().await.unwrap();
    assert_eq!(res.status(), 204);

    shutdown.trigger();
}

#[tokio::test]
async fn test_shunt_without_status_is_not_found() {
    let config = common::config(
        r#"
        [[routes]]
        name = "blackhole"
        backend = "<shunt>"
        "#,
    );
    let (addr, shutdown) = common::start_proxy(config).await;

    let res = common::client().get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_tee_does_not_affect_primary() {
    // Bind and drop to get a port nothing listens on.
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let config = common::config(&format!(
        r#"
        [[routes]]
        name = "primary"
        filters = [
          {{ name = "teeLoopback", args = ["shadow"] }},
          {{ name = "status", args = [200] }},
        ]
        backend = "<shunt>"

        [[routes]]
        name = "shadow"
        predicates = [{{ name = "Tee", args = ["shadow"] }}]
        backend = "http://{dead_addr}"
        "#
    ));
    let (addr, shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let start = Instant::now();
    for _ in 0..20 {
        let res = client.get(format!("http://{addr}/x")).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }
    assert!(start.elapsed() < Duration::from_secs(5));

    shutdown.trigger();
}

#[tokio::test]
async fn test_stalled_tee_does_not_delay_primary() {
    let (silent_addr, accepted) = common::start_silent_backend().await;

    let mut config = common::config(&format!(
        r#"
        [[routes]]
        name = "primary"
        filters = [
          {{ name = "teeLoopback", args = ["shadow"] }},
          {{ name = "status", args = [200] }},
        ]
        backend = "<shunt>"

        [[routes]]
        name = "shadow"
        predicates = [{{ name = "Tee", args = ["shadow"] }}]
        backend = "http://{silent_addr}"
        "#
    ));
    config.routing.tee_timeout_secs = 1;
    let (addr, shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let start = Instant::now();
    for _ in 0..10 {
        let res = client.get(format!("http://{addr}/x")).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }
    // ten duplicates each stall a full second upstream
    assert!(start.elapsed() < Duration::from_secs(3));
    assert!(common::wait_until(|| accepted.load(Ordering::SeqCst) > 0, Duration::from_secs(5)).await);

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = common::config(
        r#"
        [[routes]]
        name = "all"
        filters = [{ name = "status", args = [200] }]
        backend = "<shunt>"
        "#,
    );
    config.security.max_body_size = 16;
    let (addr, shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let res = client
        .post(format!("http://{addr}/"))
        .body(vec![b'x'; 64])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    let res = client
        .post(format!("http://{addr}/"))
        .body("small")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_route_rejected_rest_served() {
    let mut config = common::config("");
    config.routes = vec![
        RouteConfig {
            name: "bad".into(),
            priority: 10,
            predicates: vec![CallConfig::new("TrafficSegment", vec![1.0.into(), 2.0.into()])],
            filters: vec![],
            backend: "<shunt>".into(),
        },
        RouteConfig {
            name: "good".into(),
            priority: 0,
            predicates: vec![],
            filters: vec![CallConfig::new("status", vec![200.0.into()])],
            backend: "<shunt>".into(),
        },
    ];

    let server = HttpServer::new(config.clone());
    assert_eq!(server.rejected_routes().len(), 1);

    let (addr, shutdown) = common::start_proxy(config).await;
    let res = common::client().get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let config = common::config("");
    let (addr, shutdown) = common::start_proxy(config).await;

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = common::client().get(format!("http://{addr}/")).send().await;
    assert!(res.is_err());
}
