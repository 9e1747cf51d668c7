//! Integration tests for the concrete adapters using wiremock HTTP mocks.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mailtrace_sources::adapters::{
    AimAdapter, AmazonAdapter, FingerAdapter, FlickrAdapter, FriendfeedAdapter, GravatarAdapter,
    SocialGraphAdapter, YoutubeAdapter,
};
use mailtrace_sources::{
    CommandOutput, CommandRunner, HttpTransport, SecondaryResolver, ServiceAdapter, SourceError,
    Transport,
};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new(5, "mailtrace-test").expect("client construction should not fail"))
}

fn resolver(server: &MockServer) -> Arc<SecondaryResolver> {
    Arc::new(SecondaryResolver::new(&server.uri()))
}

#[tokio::test]
async fn gravatar_returns_profile_and_scrubs_default_avatar() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "entry": [{
            "id": "4242",
            "preferredUsername": "jane",
            "displayName": "Jane Doe",
            "thumbnailUrl": "https://secure.gravatar.com/avatar/?d=mp",
            "currentLocation": "Lyon"
        }]
    });
    Mock::given(method("GET"))
        .and(path_regex(r"^/[0-9a-f]{64}\.json$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter = GravatarAdapter::with_base_url(transport(), &server.uri());
    let result = adapter.fetch("Jane@Example.com").await.expect("should find profile");

    let rec = result.get("gravatar").expect("gravatar record");
    assert_eq!(rec.user_name, "jane");
    assert_eq!(rec.display_name, "Jane Doe");
    assert_eq!(rec.portrait_url, "");
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn gravatar_404_is_not_found_and_lookup_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("User not found"))
        .mount(&server)
        .await;

    let adapter = GravatarAdapter::with_base_url(transport(), &server.uri());
    let err = adapter.fetch("nobody@example.com").await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound { .. }), "got: {err:?}");
    assert!(adapter.lookup("nobody@example.com").await.is_empty());
}

#[tokio::test]
async fn gravatar_server_error_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = GravatarAdapter::with_base_url(transport(), &server.uri());
    let err = adapter.fetch("jane@example.com").await.unwrap_err();
    assert!(matches!(err, SourceError::UnexpectedStatus { status: 500, .. }));
}

#[tokio::test]
async fn flickr_two_step_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.findByEmail"))
        .and(query_param("api_key", "fk"))
        .and(query_param("find_email", "jane@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<rsp stat="ok"><user nsid="1@N01"><username>bees</username></user></rsp>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getInfo"))
        .and(query_param("user_id", "1@N01"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<rsp stat="ok"><person nsid="1@N01" iconserver="0" iconfarm="0">
                 <username>bees</username><realname>Cal Henderson</realname>
                 <location>San Francisco</location></person></rsp>"#,
        ))
        .mount(&server)
        .await;

    let adapter = FlickrAdapter::with_base_url(transport(), "fk", &server.uri());
    let result = adapter.fetch("jane@example.com").await.expect("should find profile");

    let rec = result.get("flickr").unwrap();
    assert_eq!(rec.user_id, "1@N01");
    assert_eq!(rec.user_name, "bees");
    assert_eq!(rec.display_name, "Cal Henderson");
    assert_eq!(rec.location, "San Francisco");
    assert_eq!(rec.portrait_url, "", "default buddy icon must be scrubbed");
}

#[tokio::test]
async fn flickr_first_step_failure_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.findByEmail"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<rsp stat="fail"><err code="1" msg="User not found"/></rsp>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getInfo"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = FlickrAdapter::with_base_url(transport(), "fk", &server.uri());
    assert!(adapter.lookup("jane@example.com").await.is_empty());
}

async fn mount_flickr_find(server: &MockServer) {
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.findByEmail"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<rsp stat="ok"><user nsid="1@N01"><username>bees</username></user></rsp>"#,
        ))
        .expect(1..)
        .mount(server)
        .await;
}

#[tokio::test]
async fn flickr_second_step_failure_envelope_is_not_found() {
    let server = MockServer::start().await;
    mount_flickr_find(&server).await;
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<rsp stat="fail"><err code="1" msg="User not found"/></rsp>"#,
        ))
        .mount(&server)
        .await;

    let adapter = FlickrAdapter::with_base_url(transport(), "fk", &server.uri());
    let err = adapter.fetch("jane@example.com").await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound { field: "person", .. }));
    assert!(adapter.lookup("jane@example.com").await.is_empty());
}

#[tokio::test]
async fn flickr_second_step_server_error_is_empty() {
    let server = MockServer::start().await;
    mount_flickr_find(&server).await;
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getInfo"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = FlickrAdapter::with_base_url(transport(), "fk", &server.uri());
    let err = adapter.fetch("jane@example.com").await.unwrap_err();
    assert_eq!(err.kind().as_str(), "unreachable");
    assert!(adapter.lookup("jane@example.com").await.is_empty());
}

#[tokio::test]
async fn youtube_parses_atom_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feeds/api/users"))
        .and(query_param("email", "jane@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<feed xmlns='http://www.w3.org/2005/Atom' xmlns:yt='http://gdata.youtube.com/schemas/2007' \
             xmlns:media='http://search.yahoo.com/mrss/'><entry>\
             <yt:username display='Jane Doe'>janedoe</yt:username>\
             <media:thumbnail url='https://yt3.ggpht.com/jane.jpg'/></entry></feed>",
        ))
        .mount(&server)
        .await;

    let adapter = YoutubeAdapter::with_base_url(transport(), &server.uri());
    let result = adapter.fetch("jane@example.com").await.unwrap();
    let rec = result.get("youtube").unwrap();
    assert_eq!(rec.user_name, "janedoe");
    assert_eq!(rec.display_name, "Jane Doe");
    assert_eq!(rec.portrait_url, "https://yt3.ggpht.com/jane.jpg");
}

#[tokio::test]
async fn youtube_malformed_body_is_unparseable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<feed><entry>"))
        .mount(&server)
        .await;

    let adapter = YoutubeAdapter::with_base_url(transport(), &server.uri());
    let err = adapter.fetch("jane@example.com").await.unwrap_err();
    assert_eq!(err.kind().as_str(), "unparseable");
}

#[tokio::test]
async fn amazon_search_then_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/onca/xml"))
        .and(query_param("Operation", "CustomerContentSearch"))
        .and(query_param("Email", "jane@example.com"))
        .and(query_param("AssociateTag", "tag-20"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<CustomerContentSearchResponse><Customers><Customer>\
             <CustomerId>A2JX</CustomerId></Customer></Customers></CustomerContentSearchResponse>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/onca/xml"))
        .and(query_param("Operation", "CustomerContentLookup"))
        .and(query_param("CustomerId", "A2JX"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<CustomerContentLookupResponse><Customers><Customer><CustomerId>A2JX</CustomerId>\
             <Nickname>janed</Nickname><Name>Jane Doe</Name><Location>\
             <UserDefinedLocation>Austin, TX</UserDefinedLocation></Location>\
             </Customer></Customers></CustomerContentLookupResponse>",
        ))
        .mount(&server)
        .await;

    let adapter = AmazonAdapter::with_base_url(
        transport(),
        "AKID",
        "tag-20",
        Some("secret"),
        &format!("{}/onca/xml", server.uri()),
    );
    let result = adapter.fetch("jane@example.com").await.unwrap();
    let rec = result.get("amazon").unwrap();
    assert_eq!(rec.user_id, "A2JX");
    assert_eq!(rec.user_name, "janed");
    assert_eq!(rec.display_name, "Jane Doe");
    assert_eq!(rec.location, "Austin, TX");
}

async fn mount_amazon_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/onca/xml"))
        .and(query_param("Operation", "CustomerContentSearch"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<CustomerContentSearchResponse><Customers><Customer>\
             <CustomerId>A2JX</CustomerId></Customer></Customers></CustomerContentSearchResponse>",
        ))
        .expect(1..)
        .mount(server)
        .await;
}

fn amazon(server: &MockServer) -> AmazonAdapter {
    AmazonAdapter::with_base_url(
        transport(),
        "AKID",
        "tag-20",
        None,
        &format!("{}/onca/xml", server.uri()),
    )
}

#[tokio::test]
async fn amazon_lookup_error_envelope_is_not_found() {
    let server = MockServer::start().await;
    mount_amazon_search(&server).await;
    Mock::given(method("GET"))
        .and(path("/onca/xml"))
        .and(query_param("Operation", "CustomerContentLookup"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<CustomerContentLookupResponse><Customers><Request><Errors><Error>\
             <Code>AWS.InvalidParameterValue</Code>\
             <Message>A2JX is not a valid value for CustomerId.</Message>\
             </Error></Errors></Request></Customers></CustomerContentLookupResponse>",
        ))
        .mount(&server)
        .await;

    let adapter = amazon(&server);
    let err = adapter.fetch("jane@example.com").await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound { field: "Customer", .. }));
    assert!(adapter.lookup("jane@example.com").await.is_empty());
}

#[tokio::test]
async fn amazon_lookup_server_error_is_empty() {
    let server = MockServer::start().await;
    mount_amazon_search(&server).await;
    Mock::given(method("GET"))
        .and(path("/onca/xml"))
        .and(query_param("Operation", "CustomerContentLookup"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let adapter = amazon(&server);
    let err = adapter.fetch("jane@example.com").await.unwrap_err();
    assert_eq!(err.kind().as_str(), "unreachable");
}

#[tokio::test]
async fn aim_keeps_buddy_icon_only_when_probe_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/expressions/get"))
        .and(query_param("t", "janedoe"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let adapter = AimAdapter::with_base_url(transport(), &server.uri());

    let found = adapter.fetch("JaneDoe@AOL.com").await.unwrap();
    let rec = found.get("aim").unwrap();
    assert_eq!(rec.user_name, "janedoe");
    assert!(rec.portrait_url.contains("/expressions/get?t=janedoe"));

    let no_icon = adapter.fetch("someone@aim.com").await.unwrap();
    assert_eq!(no_icon.get("aim").unwrap().portrait_url, "");
}

#[tokio::test]
async fn aim_ignores_other_domains_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = AimAdapter::with_base_url(transport(), &server.uri());
    assert!(adapter.lookup("jane@example.com").await.is_empty());
}

struct ScriptedRunner {
    output: CommandOutput,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(self.output.clone())
    }
}

#[tokio::test]
async fn finger_runs_local_binary_and_parses_fields() {
    let runner = Arc::new(ScriptedRunner {
        output: CommandOutput {
            success: true,
            stdout: "Login: jdoe\t\t\tName: Jane Doe\nOffice: Room 42\n".to_string(),
        },
        calls: Mutex::new(Vec::new()),
    });
    let adapter = FingerAdapter::new(runner.clone());

    let result = adapter.fetch("jdoe@example.com").await.unwrap();
    let rec = result.get("finger").unwrap();
    assert_eq!(rec.user_name, "jdoe");
    assert_eq!(rec.display_name, "Jane Doe");
    assert_eq!(rec.location, "Room 42");

    let calls = runner.calls.lock().unwrap();
    assert_eq!(calls[0].0, "finger");
    assert_eq!(calls[0].1, vec!["-l", "-m", "jdoe@example.com"]);
}

#[tokio::test]
async fn finger_non_zero_exit_is_empty() {
    let runner = Arc::new(ScriptedRunner {
        output: CommandOutput {
            success: false,
            stdout: "Login: jdoe\n".to_string(),
        },
        calls: Mutex::new(Vec::new()),
    });
    let adapter = FingerAdapter::new(runner);
    assert!(adapter.lookup("jdoe@example.com").await.is_empty());
}

#[tokio::test]
async fn friendfeed_reports_own_record_and_recognized_services() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "id": "janedoe",
        "name": "Jane Doe",
        "type": "user",
        "services": [
            {"id": "internal", "profileUrl": "https://friendfeed.com/janedoe"},
            {"id": "twitter", "username": "jdoe", "profileUrl": "https://twitter.com/jdoe"},
            {"id": "linkedin", "profileUrl": "https://www.linkedin.com/in/janedoe"},
            {"id": "tumblr", "username": "jane", "profileUrl": "https://jane.tumblr.com"}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/v2/feedinfo"))
        .and(query_param("email", "jane@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/jdoe@twitter"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let adapter = FriendfeedAdapter::with_base_url(transport(), resolver(&server), &server.uri());
    let result = adapter.fetch("jane@example.com").await.unwrap();

    let services: Vec<&str> = result.services().collect();
    assert_eq!(services, vec!["friendfeed", "linkedin", "twitter"]);
    assert_eq!(result.get("friendfeed").unwrap().display_name, "Jane Doe");
    assert_eq!(result.get("linkedin").unwrap().user_name, "janedoe");
    assert_eq!(
        result.get("twitter").unwrap().portrait_url,
        format!("{}/jdoe@twitter", server.uri())
    );
}

#[tokio::test]
async fn socialgraph_yields_only_recognized_secondary_services() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "nodes": {
            "mailto:jane@example.com": {
                "claimed_nodes": [
                    "http://www.linkedin.com/in/janedoe",
                    "http://jane.tumblr.com/",
                    "http://digg.com/users/jdoe"
                ]
            }
        }
    });
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("q", "mailto:jane@example.com"))
        .and(query_param("fme", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter = SocialGraphAdapter::with_base_url(transport(), resolver(&server), &server.uri());
    let result = adapter.fetch("jane@example.com").await.unwrap();

    assert!(!result.contains("socialgraph"));
    assert!(!result.contains("tumblr"));
    assert_eq!(result.get("linkedin").unwrap().user_name, "janedoe");
    let digg = result.get("digg").unwrap();
    assert_eq!(digg.user_name, "jdoe");
    assert_eq!(digg.portrait_url, "", "failed avatar probe leaves portrait empty");
}
