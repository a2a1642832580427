//! Shared setup for end-to-end tests: one wiremock server stands in for the
//! agent service, the speech API and the object store.

use script_voice_relay::Config;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TASK_ID: &str = "task-9";
pub const AUDIO_BYTES: &[u8] = b"ID3\x03\x00fake-mp3-frames";

/// Configuration read the same way `Config::from_env` reads it, pointed at `server`
pub fn relay_config(server: &MockServer, download_dir: &Path) -> Config {
    let uri = server.uri();
    let dir = download_dir.display().to_string();
    let vars: HashMap<&str, &str> = HashMap::from([
        ("BROWSER_USE_API_KEY", "bu-test"),
        ("AGENT_BASE_URL", uri.as_str()),
        ("ELEVENLABS_EMAIL", "voice@example.com"),
        ("ELEVENLABS_PASSWORD", "pw"),
        ("ELEVENLABS_API_KEY", "xi-test"),
        ("ELEVENLABS_BASE_URL", uri.as_str()),
        ("DOWNLOAD_DIR", dir.as_str()),
        ("S3_BUCKET_NAME", "audio-bucket"),
        ("S3_AUDIO_FOLDER", "tts/"),
        ("S3_ENDPOINT", uri.as_str()),
        ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
        ("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        ("JOB_DEADLINE_SECS", "5"),
    ]);

    let mut config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    config.polling.job_interval = Duration::from_millis(20);
    config.polling.history_interval = Duration::from_millis(20);
    config.polling.history_ceiling = Duration::from_millis(300);
    config
}

/// Job accepted, reported running once, then in `final_status` with `detail`
pub async fn mount_agent(server: &MockServer, final_status: &str, detail: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/v1/run-task"))
        .and(header("authorization", "Bearer bu-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": TASK_ID })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/task/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "running" })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;

    let mut body = detail;
    body["status"] = json!(final_status);
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/task/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// History lists `before` on the first call and `after` from then on
pub async fn mount_history(server: &MockServer, before: &[&str], after: &[&str]) {
    let listing = |ids: &[&str]| {
        json!({
            "history": ids.iter().map(|id| json!({ "history_item_id": id })).collect::<Vec<_>>()
        })
    };

    Mock::given(method("GET"))
        .and(path("/v1/history"))
        .and(header("xi-api-key", "xi-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(before)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/history"))
        .and(header("xi-api-key", "xi-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(after)))
        .mount(server)
        .await;
}

/// Audio for `item_id`, and an object store accepting it under `tts/`
pub async fn mount_audio_and_storage(server: &MockServer, item_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/history/{item_id}/audio")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(AUDIO_BYTES),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/audio-bucket/tts/{item_id}.mp3")))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"e2e\""))
        .expect(1)
        .mount(server)
        .await;
}
