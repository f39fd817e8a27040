// crates.io
use httpmock::prelude::*;
// self
use hsadmin_gateway::{
	_preludet::*,
	auth::{AccountKey, AccountName, AccountSecret},
	error::ProtocolError,
	issuer::{CasTicketIssuer, TicketIssuer},
	pool::GrantToken,
};

fn account() -> AccountKey {
	AccountKey::new(
		AccountName::new("xyz00").expect("Account fixture should be valid."),
		AccountSecret::new("package-password"),
	)
}

fn issuer(server: &MockServer) -> CasTicketIssuer {
	CasTicketIssuer::new(test_reqwest_http_client(), &test_upstream_config(&server.base_url()))
}

#[tokio::test]
async fn grant_is_the_action_url_of_the_login_form() {
	let server = MockServer::start_async().await;
	let tgt_url = server.url("/cas/v1/tickets/TGT-7-grant");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cas/v1/tickets")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(201).header("content-type", "text/html").body(format!(
				"<!DOCTYPE HTML><html><body><h1>TGT Created</h1><form action=\"{tgt_url}\" \
				 method=\"POST\">Service:<input type=\"text\" name=\"service\" value=\"\">\
				 </form></body></html>"
			));
		})
		.await;
	let grant = issuer(&server)
		.issue_grant(&account())
		.await
		.expect("Login form should yield a grant.");

	assert_eq!(grant.expose(), tgt_url);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn relative_action_urls_resolve_against_the_ticket_endpoint() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/cas/v1/tickets");
			then.status(201).body("<form action=\"/cas/v1/tickets/TGT-8\" method=\"POST\"></form>");
		})
		.await;

	let grant = issuer(&server)
		.issue_grant(&account())
		.await
		.expect("Relative action should resolve.");

	assert_eq!(grant.expose(), server.url("/cas/v1/tickets/TGT-8"));
}

#[tokio::test]
async fn missing_marker_is_an_authentication_failure() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/cas/v1/tickets");
			then.status(401).body("<html>error.authentication.credentials.bad</html>");
		})
		.await;

	let err = issuer(&server)
		.issue_grant(&account())
		.await
		.expect_err("Rejected credentials must fail.");

	assert!(matches!(err, Error::Authentication { ref account, .. } if account == "xyz00"));
	assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn service_ticket_is_the_trimmed_response_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cas/v1/tickets/TGT-9")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "text/plain").body("ST-42-service\n");
		})
		.await;
	let grant = GrantToken::new(server.url("/cas/v1/tickets/TGT-9"));
	let ticket = issuer(&server)
		.issue_service_ticket(&grant)
		.await
		.expect("Service ticket should be issued.");

	assert_eq!(ticket.expose(), "ST-42-service");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn empty_service_ticket_bodies_are_protocol_errors() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/cas/v1/tickets/TGT-10");
			then.status(200).body("  \n");
		})
		.await;

	let grant = GrantToken::new(server.url("/cas/v1/tickets/TGT-10"));
	let err = issuer(&server)
		.issue_service_ticket(&grant)
		.await
		.expect_err("Empty tickets must fail.");

	assert!(matches!(err, Error::Protocol(ProtocolError::EmptyServiceTicket)));
}
