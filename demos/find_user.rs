//! Loads a gateway configuration file, builds the reqwest-backed gateway from it, and looks up a
//! user through a mocked CAS and XML-RPC upstream.

// std
use std::fs;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use hsadmin_gateway::{
	auth::ObjectType,
	config::GatewayConfig,
	gateway::Gateway,
	rpc::{RpcValue, rpc_struct},
};

const USER_REPLY: &str = "<?xml version=\"1.0\"?><methodResponse><params><param><value>\
<array><data><value><struct><member><name>name</name><value><string>xyz00-demo</string>\
</value></member><member><name>shell</name><value><string>/bin/bash</string></value>\
</member></struct></value></data></array></value></param></params></methodResponse>";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let tgt_url = server.url("/cas/v1/tickets/TGT-demo");
	let grant_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/cas/v1/tickets");
			then.status(201).body(format!("<form action=\"{tgt_url}\" method=\"POST\"></form>"));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/cas/v1/tickets/TGT-demo");
			then.status(200).body("ST-demo");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/hsar/xmlrpc/hsadmin");
			then.status(200).header("content-type", "text/xml").body(USER_REPLY);
		})
		.await;

	let path = std::env::temp_dir().join(format!("hsadmin-gateway-demo-{}.yaml", std::process::id()));

	fs::write(
		&path,
		format!(
			"upstream:\n  ticket_url: {base}/cas/v1/tickets\n  service: {base}/hsar/backend\n  \
			 backend_url: {base}/hsar/xmlrpc/hsadmin\npacs:\n  xyz00: demo-password\napi:\n  \
			 - key: demo-key\n    pacs: xyz00\n",
			base = server.base_url()
		),
	)?;

	let config = GatewayConfig::from_path(&path);

	fs::remove_file(&path)?;

	let gateway = Gateway::from_config(&config?)?;
	let account = gateway.resolve("demo-key", None)?;
	let user = gateway
		.find_one(&account, &ObjectType::new("user")?, rpc_struct([("name", "xyz00-demo")]))
		.await?;
	let shell = user.as_struct().and_then(|record| record.get("shell")).and_then(RpcValue::as_str);

	println!("Shell of xyz00-demo: {}.", shell.unwrap_or("<unset>"));

	grant_mock.assert_async().await;

	Ok(())
}
