use streamgrid::manifest::{Client, ClientConfig, LoadError};
use tiny_http::{Response, Server};

fn serve_once(body: &str) -> String {
    let server = Server::http("127.0.0.1:0").expect("bind test server");
    let addr = server.server_addr().to_ip().expect("test server ip");
    let body = body.to_string();
    std::thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let _ = request.respond(Response::from_string(body));
        }
    });
    format!("http://{}/tv-catalog.json", addr)
}

fn client_for(endpoint: String) -> Client {
    Client::new(ClientConfig {
        user_agent: "streamgrid-test/0.1".into(),
        endpoint: Some(endpoint),
        http_client: None,
    })
    .expect("build client")
}

#[test]
fn fetch_decodes_manifest_in_order() {
    let endpoint = serve_once(
        r#"{
            "backgroundImage": "https://cdn.test/bg.jpg",
            "banners": ["https://cdn.test/b1.jpg", "https://cdn.test/b2.jpg"],
            "videos": [
                {"title": "Alpha", "thumbnail": "https://cdn.test/a.jpg", "streamURL": "https://cdn.test/a.mp4"},
                {"title": "Beta", "thumbnail": "https://cdn.test/b.jpg", "streamURL": "https://cdn.test/b.mp4"}
            ]
        }"#,
    );

    let manifest = client_for(endpoint).fetch().expect("fetch manifest");
    let titles: Vec<&str> = manifest
        .videos
        .iter()
        .map(|video| video.title.as_str())
        .collect();
    assert_eq!(titles, ["Alpha", "Beta"]);
    assert_eq!(manifest.banners.len(), 2);
}

#[test]
fn fetch_rejects_malformed_body() {
    let endpoint = serve_once(r#"{"backgroundImage": "x", "banners": []}"#);
    let err = client_for(endpoint).fetch().unwrap_err();
    assert!(matches!(err, LoadError::Decode(_)));
}

#[test]
fn fetch_reports_unreachable_endpoint() {
    let err = client_for("http://127.0.0.1:9/tv-catalog.json".into())
        .fetch()
        .unwrap_err();
    assert!(matches!(err, LoadError::Network(_)));
}
