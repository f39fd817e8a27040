// crates.io
use httpmock::prelude::*;
// self
use hsadmin_gateway::{
	_preludet::*,
	auth::ObjectType,
	config::GatewayConfig,
	credentials::CredentialTable,
	gateway::Gateway,
	error::TransportError,
	rpc::{Operation, RpcMethod, RpcValue, rpc_struct},
};

const USER_SEARCH_REPLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<methodResponse><params><param><value><array><data>
<value><struct>
<member><name>name</name><value><string>xyz00-test</string></value></member>
<member><name>shell</name><value><string>/bin/bash</string></value></member>
<member><name>locked</name><value><boolean>0</boolean></value></member>
</struct></value>
</data></array></value></param></params></methodResponse>"#;

const ADD_FAULT_REPLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<methodResponse><fault><value><struct>
<member><name>faultCode</name><value><int>1</int></value></member>
<member><name>faultString</name><value><string>user.add: name already exists</string></value></member>
</struct></value></fault></methodResponse>"#;

fn credentials() -> CredentialTable {
	GatewayConfig::from_yaml_str(
		"pacs:\n  xyz00: pw-0\n  xyz01: pw-1\napi:\n  - key: K\n    pacs: [xyz00, xyz01]\n  - key: S\n    pacs: xyz00\n",
	)
	.expect("Credential fixture should load.")
	.credentials
}

fn user() -> ObjectType {
	ObjectType::new("user").expect("Object fixture should be valid.")
}

struct CasMocks<'a> {
	grant: httpmock::Mock<'a>,
	service_ticket: httpmock::Mock<'a>,
}

async fn mock_cas(server: &MockServer) -> CasMocks<'_> {
	let tgt_url = server.url("/cas/v1/tickets/TGT-1");
	let grant = server
		.mock_async(|when, then| {
			when.method(POST).path("/cas/v1/tickets");
			then.status(201).body(format!("<form action=\"{tgt_url}\" method=\"POST\"></form>"));
		})
		.await;
	let service_ticket = server
		.mock_async(|when, then| {
			when.method(POST).path("/cas/v1/tickets/TGT-1");
			then.status(200).body("ST-1");
		})
		.await;

	CasMocks { grant, service_ticket }
}

#[tokio::test]
async fn search_issues_once_then_reuses_the_pooled_grant() {
	let server = MockServer::start_async().await;
	let cas = mock_cas(&server).await;
	let rpc = server
		.mock_async(|when, then| {
			when.method(POST).path("/hsar/xmlrpc/hsadmin").header("content-type", "text/xml");
			then.status(200).header("content-type", "text/xml").body(USER_SEARCH_REPLY);
		})
		.await;
	let (gateway, pool) =
		build_reqwest_test_gateway(&test_upstream_config(&server.base_url()), credentials());
	let account = gateway.resolve("S", None).expect("Single-account key should resolve.");
	let found = gateway
		.find_one(&account, &user(), rpc_struct([("name", "xyz00-test")]))
		.await
		.expect("First lookup should succeed.");

	assert_eq!(
		found.as_struct().and_then(|record| record.get("shell")),
		Some(&RpcValue::from("/bin/bash"))
	);

	cas.grant.assert_calls_async(1).await;
	cas.service_ticket.assert_calls_async(1).await;
	rpc.assert_calls_async(1).await;

	assert_eq!(pool.idle_count(&account), 1);

	let records = gateway
		.search(&account, &user(), rpc_struct([("name", "xyz00-test")]))
		.await
		.expect("Second lookup should succeed.");

	assert_eq!(records.len(), 1);

	cas.grant.assert_calls_async(1).await;
	cas.service_ticket.assert_calls_async(2).await;
	rpc.assert_calls_async(2).await;

	assert_eq!(pool.metrics().issued(), 1);
	assert_eq!(pool.metrics().hits(), 1);
}

#[tokio::test]
async fn add_faults_surface_as_client_errors() {
	let server = MockServer::start_async().await;
	let _cas = mock_cas(&server).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/hsar/xmlrpc/hsadmin");
			then.status(200).header("content-type", "text/xml").body(ADD_FAULT_REPLY);
		})
		.await;

	let (gateway, pool) =
		build_reqwest_test_gateway(&test_upstream_config(&server.base_url()), credentials());
	let account = gateway.resolve("K", Some("xyz01")).expect("Hinted account should resolve.");
	let err = gateway
		.add(&account, &user(), rpc_struct([("name", "xyz01-test")]))
		.await
		.expect_err("Faults should be reported.");

	assert!(
		matches!(err, Error::InvalidInput { ref reason } if reason == "user.add: name already exists")
	);
	assert_eq!(err.status_code(), 400);
	assert_eq!(pool.idle_count(&account), 1);
}

#[tokio::test]
async fn backend_http_errors_are_transport_failures() {
	let server = MockServer::start_async().await;
	let _cas = mock_cas(&server).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/hsar/xmlrpc/hsadmin");
			then.status(503).body("Service Unavailable");
		})
		.await;

	let (gateway, pool) =
		build_reqwest_test_gateway(&test_upstream_config(&server.base_url()), credentials());
	let method = RpcMethod::new(user(), Operation::Delete);
	let err = gateway
		.invoke_for("S", None, &method, rpc_struct([("name", "xyz00-test")]).into(), None)
		.await
		.expect_err("Non-2xx replies must fail.");

	assert!(matches!(
		err,
		Error::Transport(TransportError::Status { endpoint: "backend", status: 503 })
	));
	assert_eq!(err.status_code(), 502);

	let account = gateway.resolve("S", None).expect("Single-account key should resolve.");

	assert_eq!(pool.idle_count(&account), 1);
}

#[tokio::test]
async fn rejected_credentials_leave_the_pool_empty() {
	let server = MockServer::start_async().await;
	let grant = server
		.mock_async(|when, then| {
			when.method(POST).path("/cas/v1/tickets");
			then.status(401).body("<html>error.authentication.credentials.bad</html>");
		})
		.await;
	let rpc = server
		.mock_async(|when, then| {
			when.method(POST).path("/hsar/xmlrpc/hsadmin");
			then.status(200).body(USER_SEARCH_REPLY);
		})
		.await;
	let (gateway, pool) =
		build_reqwest_test_gateway(&test_upstream_config(&server.base_url()), credentials());
	let account = gateway.resolve("S", None).expect("Single-account key should resolve.");
	let err = gateway
		.search(&account, &user(), rpc_struct([("name", "xyz00-test")]))
		.await
		.expect_err("Rejected credentials must fail.");

	assert!(matches!(err, Error::Authentication { .. }));
	assert_eq!(pool.idle_count(&account), 0);

	grant.assert_calls_async(1).await;
	rpc.assert_calls_async(0).await;
}

#[tokio::test]
async fn credential_resolution_requires_a_hint_for_shared_keys() {
	let server = MockServer::start_async().await;
	let (gateway, _pool) =
		build_reqwest_test_gateway(&test_upstream_config(&server.base_url()), credentials());
	let err = gateway.resolve("K", None).expect_err("Shared keys need a hint.");

	assert_eq!(err.status_code(), 400);

	let account = gateway.resolve("K", Some("xyz00")).expect("Hinted account should resolve.");

	assert_eq!(account.name.to_string(), "xyz00");
}

#[tokio::test]
async fn gateway_built_from_a_config_file_reaches_the_configured_upstream() {
	let server = MockServer::start_async().await;
	let cas = mock_cas(&server).await;
	let rpc = server
		.mock_async(|when, then| {
			when.method(POST).path("/hsar/xmlrpc/hsadmin").body_includes("<string>xyz01</string>");
			then.status(200).header("content-type", "text/xml").body(USER_SEARCH_REPLY);
		})
		.await;
	let path = std::env::temp_dir()
		.join(format!("hsadmin-gateway-it-{}-config.yaml", std::process::id()));

	std::fs::write(
		&path,
		format!(
			"server:\n  port: 8080\nupstream:\n  ticket_url: {base}/cas/v1/tickets\n  \
			 service: {base}/hsar/backend\n  backend_url: {base}/hsar/xmlrpc/hsadmin\npool:\n  \
			 serialize_issuance: true\npacs:\n  xyz00: pw-0\n  xyz01: pw-1\napi:\n  \
			 - key: K\n    pacs: xyz00,xyz01\n",
			base = server.base_url()
		),
	)
	.expect("Config fixture should be written.");

	let config = GatewayConfig::from_path(&path);

	std::fs::remove_file(&path).expect("Config fixture should be removable.");

	let config = config.expect("Config file should load.");

	assert!(config.pool.serialize_issuance);

	let gateway = Gateway::from_config(&config).expect("Gateway should build from config.");
	let account = gateway.resolve("K", Some("xyz01")).expect("Hinted account should resolve.");
	let records = gateway
		.search(&account, &user(), rpc_struct([("name", "xyz01-test")]))
		.await
		.expect("Search should succeed.");

	assert_eq!(records.len(), 1);
	assert_eq!(gateway.pool().idle_count(&account), 1);

	cas.grant.assert_calls_async(1).await;
	rpc.assert_calls_async(1).await;
}
