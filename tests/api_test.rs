//! End-to-end API tests: a real listener, wiremock-hosted sources and a fake
//! media tool standing in for ffmpeg.

mod common;

use std::time::Duration;

use common::{clip, TestHarness, API_KEY};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn source_server(clips: &[(&str, Vec<u8>)]) -> MockServer {
    let server = MockServer::start().await;
    for (route, body) in clips {
        Mock::given(method("GET"))
            .and(path(*route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;
    }
    server
}

fn montage_request(
    client: &reqwest::Client,
    addr: std::net::SocketAddr,
    key: &str,
    body: Value,
) -> reqwest::RequestBuilder {
    client
        .post(format!("http://{addr}/montage-video"))
        .header("X-API-Key", key)
        .json(&body)
}

#[tokio::test]
async fn link_mode_artifact_matches_download() {
    let (harness, addr) = TestHarness::with_server().await;
    let sources = source_server(&[
        ("/one.mp4", clip("h264:1280x720", b"first|")),
        ("/two.mp4", clip("h264:1280x720", b"second|")),
        ("/three.mp4", clip("h264:1280x720", b"third")),
    ])
    .await;

    let client = reqwest::Client::new();
    let resp = montage_request(
        &client,
        addr,
        API_KEY,
        json!({
            "video_urls": [
                format!("{}/one.mp4", sources.uri()),
                format!("{}/two.mp4", sources.uri()),
                format!("{}/three.mp4", sources.uri()),
            ],
            "title": "Holiday"
        }),
    )
    .send()
    .await
    .unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["videos_count"], 3);
    assert_eq!(body["mode"], "lossless");
    assert_eq!(body["title"], "Holiday");
    assert_eq!(body["file_size"], 18);

    let download_url = body["download_url"].as_str().unwrap();
    assert!(download_url.starts_with(&format!("http://{addr}/download/montage_")));
    assert!(download_url.ends_with(".mp4"));

    let download = client.get(download_url).send().await.unwrap();
    assert_eq!(download.status(), 200);
    assert_eq!(download.headers()["content-type"], "video/mp4");
    let bytes = download.bytes().await.unwrap();
    assert_eq!(&bytes[..], b"first|second|third");

    let outputs = harness.output_files();
    assert_eq!(outputs.len(), 1);
    assert_eq!(std::fs::read(&outputs[0]).unwrap(), bytes.to_vec());

    assert_eq!(harness.tool.total_calls(), 1);
    assert!(harness.scratch_files().is_empty());
}

#[tokio::test]
async fn inline_mode_streams_the_video() {
    let (harness, addr) = TestHarness::with_server().await;
    let sources = source_server(&[
        ("/a.mov", clip("prores:1920x1080", b"AAA")),
        ("/b.mov", clip("prores:1920x1080", b"BBB")),
    ])
    .await;

    let resp = montage_request(
        &reqwest::Client::new(),
        addr,
        API_KEY,
        json!({
            "video_urls": [format!("{}/a.mov", sources.uri()), format!("{}/b.mov", sources.uri())],
            "return_file": true,
            "output_format": "mov"
        }),
    )
    .send()
    .await
    .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "video/quicktime");
    let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"montage_"));
    assert!(disposition.ends_with(".mov\""));
    assert_eq!(&resp.bytes().await.unwrap()[..], b"AAABBB");

    assert_eq!(harness.output_files().len(), 1);
    assert!(harness.scratch_files().is_empty());
}

#[tokio::test]
async fn mismatched_sources_fall_back_to_transcode() {
    let (harness, addr) = TestHarness::with_server().await;
    let sources = source_server(&[
        ("/hd.mp4", clip("h264:1920x1080", b"hd")),
        ("/sd.mp4", clip("h264:640x480", b"sd")),
    ])
    .await;

    let resp = montage_request(
        &reqwest::Client::new(),
        addr,
        API_KEY,
        json!({
            "video_urls": [format!("{}/hd.mp4", sources.uri()), format!("{}/sd.mp4", sources.uri())],
            "output_format": "avi"
        }),
    )
    .send()
    .await
    .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["mode"], "transcoded");
    assert!(body["download_url"].as_str().unwrap().ends_with(".mp4"));
    assert_eq!(harness.tool.copy_calls(), 1);
    assert_eq!(harness.tool.transcode_calls(), 1);
    assert!(harness.scratch_files().is_empty());
}

#[tokio::test]
async fn unreachable_source_is_500_and_purged() {
    let (harness, addr) = TestHarness::with_server().await;
    let sources = source_server(&[("/ok.mp4", clip("h264:640x360", b"ok"))]).await;

    let resp = montage_request(
        &reqwest::Client::new(),
        addr,
        API_KEY,
        json!({
            "video_urls": [format!("{}/ok.mp4", sources.uri()), format!("{}/missing.mp4", sources.uri())]
        }),
    )
    .send()
    .await
    .unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "download_error");
    assert!(body["error"].is_string());
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("missing.mp4"));
    assert!(detail.chars().count() <= 500);

    assert_eq!(harness.tool.total_calls(), 0);
    assert!(harness.scratch_files().is_empty());
    assert!(harness.output_files().is_empty());
}

#[tokio::test]
async fn wrong_key_is_401_without_downloads() {
    let (harness, addr) = TestHarness::with_server().await;
    let sources = source_server(&[
        ("/1.mp4", clip("h264:640x360", b"1")),
        ("/2.mp4", clip("h264:640x360", b"2")),
    ])
    .await;

    let resp = montage_request(
        &reqwest::Client::new(),
        addr,
        "not-the-key",
        json!({
            "video_urls": [format!("{}/1.mp4", sources.uri()), format!("{}/2.mp4", sources.uri())]
        }),
    )
    .send()
    .await
    .unwrap();

    assert_eq!(resp.status(), 401);
    let received = sources.received_requests().await.unwrap();
    assert!(received.is_empty());
    assert_eq!(harness.tool.total_calls(), 0);
}

#[tokio::test]
async fn single_url_is_400_without_downloads() {
    let (_harness, addr) = TestHarness::with_server().await;
    let sources = source_server(&[("/1.mp4", clip("h264:640x360", b"1"))]).await;
    let client = reqwest::Client::new();

    for video_urls in [
        json!([format!("{}/1.mp4", sources.uri())]),
        json!(format!("{}/1.mp4", sources.uri())),
    ] {
        let resp = montage_request(&client, addr, API_KEY, json!({ "video_urls": video_urls }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "validation_error");
    }

    assert!(sources.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn download_rejects_traversal() {
    let (harness, addr) = TestHarness::with_server().await;
    let secret = harness.output_dir.parent().unwrap().join("secret.txt");
    std::fs::write(&secret, b"do not serve").unwrap();

    let client = reqwest::Client::new();
    for name in ["..%2Fsecret.txt", "..%2F..%2F..%2Fetc%2Fpasswd", "missing.mp4"] {
        let resp = client
            .get(format!("http://{addr}/download/{name}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404, "name: {name}");
    }
}

#[tokio::test]
async fn pipeline_survives_client_disconnect() {
    let (harness, addr) = TestHarness::with_server().await;
    let server = MockServer::start().await;
    for (route, body) in [("/slow1.mp4", b"s1".as_slice()), ("/slow2.mp4", b"s2".as_slice())] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(clip("h264:640x360", body))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let result = montage_request(
        &client,
        addr,
        API_KEY,
        json!({
            "video_urls": [format!("{}/slow1.mp4", server.uri()), format!("{}/slow2.mp4", server.uri())]
        }),
    )
    .send()
    .await;
    assert!(result.is_err(), "client should have timed out");

    let mut published = Vec::new();
    for _ in 0..50 {
        published = harness.output_files();
        if !published.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    assert_eq!(published.len(), 1);
    assert_eq!(std::fs::read(&published[0]).unwrap(), b"s1s2");
    assert!(harness.scratch_files().is_empty());
}

#[tokio::test]
async fn sequence_preview_does_not_download() {
    let (_harness, addr) = TestHarness::with_server().await;
    let sources = source_server(&[]).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/video-urls"))
        .header("X-API-Key", API_KEY)
        .json(&json!({
            "video_urls": [format!("{}/x.mp4", sources.uri()), format!("{}/y.mp4", sources.uri())]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_videos"], 2);
    assert_eq!(body["montage_sequence"][1]["position"], 2);
    assert!(sources.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn forged_host_header_does_not_reach_download_url() {
    let (_harness, addr) = TestHarness::with_server().await;
    let sources = source_server(&[
        ("/1.mp4", clip("h264:640x360", b"1")),
        ("/2.mp4", clip("h264:640x360", b"2")),
    ])
    .await;

    let resp = montage_request(
        &reqwest::Client::new(),
        addr,
        API_KEY,
        json!({
            "video_urls": [format!("{}/1.mp4", sources.uri()), format!("{}/2.mp4", sources.uri())]
        }),
    )
    .header("Host", "evil.example")
    .send()
    .await
    .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let download_url = body["download_url"].as_str().unwrap();
    assert!(!download_url.contains("evil.example"), "{download_url}");
    assert!(download_url.starts_with(&format!("http://{addr}/download/montage_")));
}

#[tokio::test]
async fn configured_public_url_is_used_for_links() {
    let (_harness, addr) = TestHarness::with_server_config(|config| {
        config.server.public_base_url = Some("https://montage.example.com".into());
    })
    .await;
    let sources = source_server(&[
        ("/1.mp4", clip("h264:640x360", b"1")),
        ("/2.mp4", clip("h264:640x360", b"2")),
    ])
    .await;

    let resp = montage_request(
        &reqwest::Client::new(),
        addr,
        API_KEY,
        json!({
            "video_urls": [format!("{}/1.mp4", sources.uri()), format!("{}/2.mp4", sources.uri())]
        }),
    )
    .send()
    .await
    .unwrap();

    let body: Value = resp.json().await.unwrap();
    assert!(body["download_url"]
        .as_str()
        .unwrap()
        .starts_with("https://montage.example.com/download/montage_"));
}

async fn webhook_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/montage"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn notify_forwards_envelope_to_webhook() {
    let hook = webhook_server(200).await;
    let hook_url = format!("{}/webhook/montage", hook.uri());
    let (_harness, addr) = TestHarness::with_server_config(|config| {
        config.notify.webhook_url = Some(hook_url);
    })
    .await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/notify-n8n"))
        .header("X-API-Key", API_KEY)
        .json(&json!({ "event": "manual", "videos": 3 }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["n8n_response"], 200);

    let received = hook.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].headers["x-api-key"], API_KEY);
    let envelope: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(envelope["source"], "montage-video-api");
    assert_eq!(envelope["data"], json!({ "event": "manual", "videos": 3 }));
    assert!(envelope["timestamp"].is_number());
}

#[tokio::test]
async fn notify_requires_key_and_configured_webhook() {
    let (_harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/notify-n8n"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("http://{addr}/notify-n8n"))
        .header("X-API-Key", API_KEY)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn notify_unreachable_webhook_is_500() {
    let (_harness, addr) = TestHarness::with_server_config(|config| {
        config.notify.webhook_url = Some("http://127.0.0.1:9/webhook".into());
    })
    .await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/notify-n8n"))
        .header("X-API-Key", API_KEY)
        .json(&json!({ "event": "manual" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "webhook_error");
}

#[tokio::test]
async fn published_montage_is_announced_to_webhook() {
    let hook = webhook_server(200).await;
    let hook_url = format!("{}/webhook/montage", hook.uri());
    let (_harness, addr) = TestHarness::with_server_config(|config| {
        config.notify.webhook_url = Some(hook_url);
    })
    .await;
    let sources = source_server(&[
        ("/1.mp4", clip("h264:640x360", b"1")),
        ("/2.mp4", clip("h264:640x360", b"2")),
    ])
    .await;

    let resp = montage_request(
        &reqwest::Client::new(),
        addr,
        API_KEY,
        json!({
            "video_urls": [format!("{}/1.mp4", sources.uri()), format!("{}/2.mp4", sources.uri())],
            "title": "Recap"
        }),
    )
    .send()
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    let mut received = Vec::new();
    for _ in 0..50 {
        received = hook.received_requests().await.unwrap();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(received.len(), 1);
    let envelope: Value = serde_json::from_slice(&received[0].body).unwrap();
    let data = &envelope["data"];
    assert_eq!(data["event"], "montage_completed");
    assert_eq!(data["title"], "Recap");
    assert_eq!(data["download_url"], body["download_url"]);
    assert_eq!(data["total_videos"], 2);
    assert_eq!(data["video_sequence"][1]["position"], 2);
}
