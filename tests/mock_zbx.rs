#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zbx_manager::error::{Error, ZbxError};
use zbx_manager::zbx_client::{
    ConnectOptions, HostGroupStatus, Mutation, ProblemFilter, SafeUpdate, ZbxClient,
};

fn rpc_ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": 1
    }))
}

fn rpc_err(code: i64, message: &str, data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message, "data": data },
        "id": 1
    }))
}

async fn answer(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(rpc_ok(result))
        .mount(server)
        .await;
}

fn options(server: &MockServer) -> ConnectOptions {
    let url = Url::parse(&format!("{}/api_jsonrpc.php", server.uri())).expect("valid mock url");
    ConnectOptions::new(url, "Admin", "s3cret").with_no_proxy(true)
}

async fn connected(server: &MockServer) -> ZbxClient {
    answer(server, "apiinfo.version", json!("6.0.0")).await;
    answer(server, "user.login", json!("0424bd59b807674191e7d77572075f33")).await;
    match ZbxClient::connect(&options(server)).await {
        Ok(client) => client,
        Err(err) => panic!("connect failed: {err}"),
    }
}

async fn sent(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("json body"))
        .collect()
}

fn calls<'a>(requests: &'a [Value], rpc_method: &str) -> Vec<&'a Value> {
    requests
        .iter()
        .filter(|request| request["method"] == rpc_method)
        .collect()
}

#[tokio::test]
async fn connect_checks_version_then_logs_in() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    assert_eq!(client.version().map(|v| v.to_string()), Some("6.0.0".into()));

    let requests = sent(&server).await;
    let methods: Vec<&str> = requests
        .iter()
        .map(|request| request["method"].as_str().expect("method"))
        .collect();
    assert_eq!(methods, ["apiinfo.version", "user.login"]);

    assert!(requests[0].get("auth").is_none());
    assert!(requests[1].get("auth").is_none());
    assert_eq!(requests[0]["id"], 1);
    assert_eq!(requests[1]["id"], 2);
    assert_eq!(requests[1]["params"]["username"], "Admin");
    assert_eq!(requests[1]["params"]["password"], "s3cret");
}

#[tokio::test]
async fn authenticated_calls_carry_the_token() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(&server, "host.get", json!([])).await;

    let result = client
        .query("host.get", json!({ "output": ["hostid"] }))
        .await
        .expect("query");
    assert_eq!(result, json!([]));

    let requests = sent(&server).await;
    let host_get = calls(&requests, "host.get");
    assert_eq!(host_get[0]["auth"], "0424bd59b807674191e7d77572075f33");
    assert_eq!(host_get[0]["jsonrpc"], "2.0");
    assert_eq!(host_get[0]["id"], 3);
}

#[tokio::test]
async fn unsupported_version_is_rejected_before_login() {
    let server = MockServer::start().await;
    answer(&server, "apiinfo.version", json!("7.0.1")).await;
    answer(&server, "user.login", json!("token")).await;

    let Err(err) = ZbxClient::connect(&options(&server)).await else {
        panic!("7.0.1 must be rejected");
    };
    match err {
        Error::Zabbix(ZbxError::UnsupportedVersion { version }) => assert_eq!(version, "7.0.1"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(calls(&sent(&server).await, "user.login").is_empty());
}

#[tokio::test]
async fn ignore_version_only_warns() {
    let server = MockServer::start().await;
    answer(&server, "apiinfo.version", json!("7.0.1")).await;
    answer(&server, "user.login", json!("token")).await;

    let client = ZbxClient::connect(&options(&server).with_ignore_version(true)).await;
    assert!(client.is_ok());
    assert_eq!(calls(&sent(&server).await, "user.login").len(), 1);
}

#[tokio::test]
async fn failed_login_redacts_the_password() {
    let server = MockServer::start().await;
    answer(&server, "apiinfo.version", json!("6.0.0")).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "user.login" })))
        .respond_with(rpc_err(
            -32602,
            "Invalid params.",
            "Incorrect user name or password or account is temporarily blocked.",
        ))
        .mount(&server)
        .await;

    let Err(err) = ZbxClient::connect(&options(&server)).await else {
        panic!("login must fail");
    };
    assert_eq!(err.api_code(), Some(-32602));
    match err {
        Error::Zabbix(ZbxError::Api { request, data, .. }) => {
            assert!(data.starts_with("Incorrect user name"));
            assert!(request.contains("user.login"));
            assert!(request.contains("***"));
            assert!(!request.contains("s3cret"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_200_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let Err(err) = ZbxClient::connect(&options(&server)).await else {
        panic!("HTTP 500 must fail");
    };
    assert!(err.is_transport());
    match err {
        Error::Zabbix(ZbxError::HttpStatus { status, body }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn get_id_is_none_when_nothing_matches() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(&server, "host.get", json!([])).await;

    let id = client
        .hosts()
        .get_id(json!({ "host": "ghost" }))
        .await
        .expect("lookup");
    assert_eq!(id, None);

    let requests = sent(&server).await;
    let lookup = calls(&requests, "host.get");
    assert_eq!(lookup[0]["params"]["filter"], json!({ "host": "ghost" }));
    assert_eq!(lookup[0]["params"]["output"], json!(["hostid", "host"]));
}

#[tokio::test]
async fn get_id_without_natural_key_fails_before_any_call() {
    let server = MockServer::start().await;
    let client = connected(&server).await;

    let err = client
        .hosts()
        .get_id(json!({ "name": "web01" }))
        .await
        .expect_err("host is missing");
    match err {
        Error::Zabbix(ZbxError::MissingIdentifier { field }) => assert_eq!(field, "host"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sent(&server).await.len(), 2);
}

#[tokio::test]
async fn item_lookup_is_scoped_by_host() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(
        &server,
        "item.get",
        json!([{ "itemid": "23296", "name": "CPU load" }]),
    )
    .await;

    let id = client
        .items()
        .get_id(json!({ "name": "CPU load", "hostid": "10084", "delay": "1m" }))
        .await
        .expect("lookup");
    assert_eq!(id, Some(23296));

    let requests = sent(&server).await;
    let lookup = calls(&requests, "item.get");
    assert_eq!(
        lookup[0]["params"]["filter"],
        json!({ "name": "CPU load", "hostid": "10084" })
    );
}

#[tokio::test]
async fn get_or_create_creates_only_once() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "hostgroup.get" })))
        .respond_with(rpc_ok(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    answer(
        &server,
        "hostgroup.get",
        json!([{ "groupid": "7", "name": "Linux servers" }]),
    )
    .await;
    answer(&server, "hostgroup.create", json!({ "groupids": ["7"] })).await;

    let groups = client.hostgroups();
    let first = groups
        .get_or_create(json!({ "name": "Linux servers" }))
        .await
        .expect("first call creates");
    let second = groups
        .get_or_create(json!({ "name": "Linux servers" }))
        .await
        .expect("second call finds");
    assert_eq!((first, second), (7, 7));
    assert_eq!(calls(&sent(&server).await, "hostgroup.create").len(), 1);
}

#[tokio::test]
async fn update_skips_the_write_when_nothing_changed() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(
        &server,
        "host.get",
        json!([{ "hostid": "10105", "host": "web01", "status": "0", "description": "" }]),
    )
    .await;
    answer(&server, "host.update", json!({ "hostids": ["10105"] })).await;

    let fields = json!({ "hostid": 10105, "status": 0, "description": null });
    let outcome = client
        .hosts()
        .update(fields.clone(), false)
        .await
        .expect("update");
    assert_eq!(outcome, Mutation::Id(10105));
    assert!(calls(&sent(&server).await, "host.update").is_empty());

    let forced = client.hosts().update(fields, true).await.expect("forced");
    assert_eq!(forced, Mutation::Id(10105));
    assert_eq!(calls(&sent(&server).await, "host.update").len(), 1);
}

#[tokio::test]
async fn update_writes_changed_fields() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(
        &server,
        "host.get",
        json!([{ "hostid": "10105", "host": "web01", "status": "0" }]),
    )
    .await;
    answer(&server, "host.update", json!({ "hostids": ["10105"] })).await;

    let outcome = client
        .hosts()
        .update(json!({ "hostid": "10105", "status": 1 }), false)
        .await
        .expect("update");
    assert_eq!(outcome, Mutation::Id(10105));

    let requests = sent(&server).await;
    let updates = calls(&requests, "host.update");
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0]["params"],
        json!([{ "hostid": "10105", "status": 1 }])
    );
}

#[tokio::test]
async fn create_or_update_creates_with_defaults() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(&server, "host.get", json!([])).await;
    answer(&server, "host.create", json!({ "hostids": ["10106"] })).await;

    let outcome = client
        .hosts()
        .create_or_update(json!({ "host": "web02", "status": 1 }))
        .await
        .expect("create");
    assert_eq!(outcome, Mutation::Id(10106));

    let requests = sent(&server).await;
    let create = calls(&requests, "host.create");
    insta::assert_json_snapshot!(create[0]["params"], @r#"
    [
      {
        "groups": [],
        "host": "web02",
        "inventory_mode": 1,
        "status": 1
      }
    ]
    "#);
}

#[tokio::test]
async fn create_or_update_updates_existing_objects() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(
        &server,
        "host.get",
        json!([{ "hostid": "10105", "host": "web01", "status": "0" }]),
    )
    .await;
    answer(&server, "host.update", json!({ "hostids": ["10105"] })).await;

    let outcome = client
        .hosts()
        .create_or_update(json!({ "host": "web01", "status": 1 }))
        .await
        .expect("update");
    assert_eq!(outcome, Mutation::Id(10105));

    let requests = sent(&server).await;
    assert!(calls(&requests, "host.create").is_empty());
    let updates = calls(&requests, "host.update");
    assert_eq!(updates[0]["params"][0]["hostid"], "10105");
    assert_eq!(updates[0]["params"][0]["status"], 1);
}

fn stored_trigger() -> Value {
    json!([{
        "triggerid": "13",
        "description": "High CPU load on {HOST.NAME}",
        "expression": "{100}>5",
        "priority": "3",
        "templateid": "0",
        "items": [{ "itemid": "23296", "key_": "system.cpu.load[percpu,avg1]" }],
        "functions": [{
            "functionid": "100",
            "itemid": "23296",
            "function": "avg",
            "parameter": "5m"
        }]
    }])
}

#[tokio::test]
async fn safe_update_leaves_identical_triggers_alone() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(&server, "trigger.get", stored_trigger()).await;

    let outcome = client
        .triggers()
        .safe_update(json!({
            "triggerid": "13",
            "description": "High CPU load on {HOST.NAME}",
            "expression": "{web01:system.cpu.load[percpu,avg1].avg(5m)}>5",
            "priority": 3,
            "templateid": "42"
        }))
        .await
        .expect("safe_update");
    assert_eq!(outcome, SafeUpdate::Unchanged(13));

    let requests = sent(&server).await;
    assert!(calls(&requests, "trigger.update").is_empty());
    assert!(calls(&requests, "trigger.create").is_empty());
}

#[tokio::test]
async fn safe_update_disables_the_old_trigger_and_creates_a_new_one() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(&server, "trigger.get", stored_trigger()).await;
    answer(&server, "trigger.update", json!({ "triggerids": ["13"] })).await;
    answer(&server, "trigger.create", json!({ "triggerids": ["14"] })).await;

    let outcome = client
        .triggers()
        .safe_update(json!({
            "triggerid": "13",
            "description": "High CPU load on {HOST.NAME}",
            "expression": "{web01:system.cpu.load[percpu,avg1].avg(5m)}>10",
            "priority": 3
        }))
        .await
        .expect("safe_update");
    assert_eq!(outcome, SafeUpdate::Superseded { old: 13, new: 14 });
    assert_eq!(outcome.current_id(), 14);

    let requests = sent(&server).await;
    let disable = calls(&requests, "trigger.update");
    assert_eq!(disable.len(), 1);
    assert_eq!(
        disable[0]["params"],
        json!([{ "triggerid": "13", "status": "1" }])
    );
    let create = calls(&requests, "trigger.create");
    assert_eq!(create.len(), 1);
    let created = &create[0]["params"][0];
    assert!(created.get("triggerid").is_none());
    assert!(created.get("templateid").is_none());
    assert_eq!(
        created["expression"],
        "{web01:system.cpu.load[percpu,avg1].avg(5m)}>10"
    );
    assert!(calls(&requests, "trigger.delete").is_empty());
}

#[tokio::test]
async fn hostgroup_batch_keeps_going_after_a_failed_create() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(
        &server,
        "hostgroup.get",
        json!([{ "groupid": "2", "name": "Linux servers" }]),
    )
    .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "hostgroup.create" })))
        .and(body_string_contains(r#""name":"Broken""#))
        .respond_with(rpc_err(-32500, "Application error.", "No permissions."))
        .mount(&server)
        .await;
    answer(&server, "hostgroup.create", json!({ "groupids": ["9"] })).await;

    let outcomes = client
        .hostgroups()
        .get_or_create_hostgroups(&["Linux servers", "Broken", "Web", "Web"])
        .await
        .expect("only the lookup can fail the batch");

    let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["Linux servers", "Broken", "Web"]);
    assert!(matches!(
        outcomes[0].result,
        Ok(HostGroupStatus::Existing(2))
    ));
    assert!(outcomes[1].result.is_err());
    assert!(matches!(outcomes[2].result, Ok(HostGroupStatus::Created(9))));

    let requests = sent(&server).await;
    assert_eq!(calls(&requests, "hostgroup.get").len(), 1);
    assert_eq!(calls(&requests, "hostgroup.create").len(), 2);
}

#[tokio::test]
async fn proxy_delete_returns_a_single_id() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(&server, "proxy.delete", json!({ "proxyids": ["10452"] })).await;

    let deleted = client.proxies().delete(&[10452]).await.expect("delete");
    assert_eq!(deleted, Some(10452));

    let requests = sent(&server).await;
    assert_eq!(calls(&requests, "proxy.delete")[0]["params"], json!(["10452"]));
}

#[tokio::test]
async fn problem_queries_leave_unset_filters_out() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(
        &server,
        "problem.get",
        json!([{
            "eventid": "123",
            "clock": "1700000000",
            "severity": "4",
            "name": "Disk full",
            "acknowledged": "0"
        }]),
    )
    .await;

    let problems = client
        .problems()
        .list(&ProblemFilter {
            host_ids: vec![10084],
            ..ProblemFilter::default()
        })
        .await
        .expect("problems");
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].event_id, "123");
    assert!(!problems[0].acknowledged);

    let requests = sent(&server).await;
    let params = &calls(&requests, "problem.get")[0]["params"];
    assert_eq!(params["hostids"], json!(["10084"]));
    assert!(params.get("groupids").is_none());
    assert!(params.get("acknowledged").is_none());
    assert!(params.as_object().expect("object").values().all(|v| !v.is_null()));
}

#[tokio::test]
async fn acknowledge_with_message_sets_the_message_bit() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(&server, "event.acknowledge", json!({ "eventids": ["123"] })).await;

    let done = client
        .problems()
        .acknowledge(&[123], true, Some("looking into it"))
        .await
        .expect("ack");
    assert!(done);

    let requests = sent(&server).await;
    let params = &calls(&requests, "event.acknowledge")[0]["params"];
    assert_eq!(params["action"], 7);
    assert_eq!(params["message"], "looking into it");
    assert_eq!(params["eventids"], json!(["123"]));
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    answer(&server, "user.logout", json!(true)).await;

    assert!(client.logout().await.expect("logout"));
    let requests = sent(&server).await;
    let logout = calls(&requests, "user.logout");
    assert_eq!(logout[0]["params"], json!([]));
    assert!(logout[0].get("auth").is_some());
}

#[tokio::test]
async fn slow_server_times_out_once_as_a_transport_error() {
    let server = MockServer::start().await;
    answer(&server, "apiinfo.version", json!("6.0.0")).await;
    answer(&server, "user.login", json!("0424bd59b807674191e7d77572075f33")).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "host.get" })))
        .respond_with(rpc_ok(json!([])).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let options = options(&server).with_timeout(Duration::from_millis(100));
    let client = ZbxClient::connect(&options).await.expect("connect");

    let err = client
        .query("host.get", json!({}))
        .await
        .expect_err("response arrives after the timeout");
    assert!(err.is_transport(), "unexpected error: {err}");
    assert!(matches!(err, Error::Zabbix(ZbxError::Request { .. })));

    let requests = sent(&server).await;
    assert_eq!(calls(&requests, "host.get").len(), 1);
}
