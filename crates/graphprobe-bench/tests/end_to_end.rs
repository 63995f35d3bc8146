//! Full run against a Graph double served by wiremock.

use graphprobe_bench::{
    BenchContext, BenchmarkRun, ProbeError, ProvisionError, RunError, RunPlan, Scenario,
};
use graphprobe_core::client::PollPolicy;
use graphprobe_core::config::GraphEndpointConfig;
use graphprobe_directory::GraphClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNIT_ID: &str = "4d7ea995-bc0f-45c0-8c3e-132e93bf95f8";
const UNSCOPED_ID: &str = "02bd9fd6-8f93-4758-87c3-1fb73740a315";
const NESTED_ID: &str = "8a3c1b9e-6f0d-4e52-9a71-2c4d5e6f7a80";
const INTERVAL: Duration = Duration::from_millis(25);

fn context(server: &MockServer, policy: PollPolicy) -> BenchContext {
    let endpoint = GraphEndpointConfig::new("tenant-1")
        .unwrap()
        .with_graph_url(server.uri());
    let client = GraphClient::builder(endpoint)
        .with_access_token("test-token")
        .build()
        .unwrap();
    BenchContext::new(Arc::new(client)).with_poll_policy(policy)
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "error": {
            "code": "Request_ResourceNotFound",
            "message": "Resource does not exist or one of its queried reference-property objects are not present."
        }
    }))
}

fn snapshot() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "allowExternalSenders": false,
        "autoSubscribeNewMembers": false,
        "hideFromAddressLists": false,
        "hideFromOutlookClients": false
    }))
}

/// Mounts the three creation endpoints; `nested` is how many nested
/// creations the test expects.
async fn mount_provisioning(server: &MockServer, nested: u64) {
    Mock::given(method("POST"))
        .and(path("/v1.0/directory/administrativeUnits"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({ "displayName": "Test AU" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": UNIT_ID,
            "displayName": "Test AU",
            "visibility": null
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1.0/groups"))
        .and(body_partial_json(json!({
            "displayName": "TestGroupOutsideOfAU2",
            "mailNickname": "TestGroupOutsideOfAU2",
            "mailEnabled": true,
            "securityEnabled": true,
            "groupTypes": ["Unified"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": UNSCOPED_ID,
            "displayName": "TestGroupOutsideOfAU2",
            "groupTypes": ["Unified"]
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/v1.0/directory/administrativeUnits/{UNIT_ID}/members"
        )))
        .and(body_partial_json(json!({
            "@odata.type": "#microsoft.graph.group",
            "displayName": "TestGroupInAU",
            "mailNickname": "TestGroupInAU"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "@odata.type": "#microsoft.graph.group",
            "id": NESTED_ID,
            "displayName": "TestGroupInAU",
            "groupTypes": ["Unified"]
        })))
        .expect(nested)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_reference_scenario_measures_both_groups() {
    let server = MockServer::start().await;
    mount_provisioning(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1.0/groups/{UNSCOPED_ID}")))
        .and(query_param(
            "$select",
            "allowExternalSenders,autoSubscribeNewMembers,hideFromAddressLists,hideFromOutlookClients",
        ))
        .respond_with(not_found())
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/groups/{UNSCOPED_ID}")))
        .respond_with(snapshot())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/groups/{NESTED_ID}")))
        .respond_with(snapshot())
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, PollPolicy::new().with_interval(INTERVAL));
    let report = BenchmarkRun::new(&ctx, RunPlan::default())
        .execute()
        .await
        .unwrap();

    assert_eq!(report.container_id.to_string(), UNIT_ID);

    let unscoped = report.measurement(Scenario::Unscoped).unwrap();
    assert_eq!(unscoped.group_id.to_string(), UNSCOPED_ID);
    assert_eq!(unscoped.attempts, 3);
    assert!(unscoped.visibility_latency >= INTERVAL * 2);

    let nested = report.measurement(Scenario::Nested).unwrap();
    assert_eq!(nested.group_id.to_string(), NESTED_ID);
    assert_eq!(nested.attempts, 1);
}

#[tokio::test]
async fn test_forbidden_read_aborts_without_retry() {
    let server = MockServer::start().await;
    mount_provisioning(&server, 0).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1.0/groups/{UNSCOPED_ID}")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": "Authorization_RequestDenied",
                "message": "Insufficient privileges to complete the operation."
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, PollPolicy::new().with_interval(INTERVAL));
    let err = BenchmarkRun::new(&ctx, RunPlan::default())
        .execute()
        .await
        .unwrap_err();

    match err {
        RunError::Probe(ProbeError::Failed {
            attempts, source, ..
        }) => {
            assert_eq!(attempts, 1);
            assert!(source.to_string().contains("Insufficient privileges"));
        }
        other => panic!("expected probe failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_container_stops_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/directory/administrativeUnits"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "code": "InvalidAuthenticationToken",
                "message": "Access token is empty."
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/groups"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = context(&server, PollPolicy::new());
    let err = BenchmarkRun::new(&ctx, RunPlan::default())
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Provision(ProvisionError::Request { .. })));
    assert!(err.to_string().contains("creating administrative unit `Test AU`"));
}

#[tokio::test]
async fn test_bounded_policy_gives_up() {
    let server = MockServer::start().await;
    mount_provisioning(&server, 0).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1.0/groups/{UNSCOPED_ID}")))
        .respond_with(not_found())
        .expect(4)
        .mount(&server)
        .await;

    let policy = PollPolicy::unbounded()
        .with_interval(INTERVAL)
        .with_max_attempts(4);
    let err = BenchmarkRun::new(&context(&server, policy), RunPlan::default())
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Probe(ProbeError::Exceeded { attempts: 4, .. })));
}
