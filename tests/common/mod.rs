//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use minssem::prompt::{CORRECTION_PROMPT, TRANSLATOR_PROMPT};
use minssem::{
    ApiServerBuilder, ApiState, CompletionClient, Error, Message, Result, SessionId,
    SpeechSynthesizer, Transcriber,
};
use tower::ServiceExt;

/// Bytes returned by the fake speech synthesizer
pub const FAKE_MP3: &[u8] = b"ID3\x04fake-mp3-frames";

/// Raw transcript returned by the fake transcriber
pub const RAW_TRANSCRIPT: &str = "안녕하세여 민쌤";

/// Completion fake that records every request
#[derive(Default)]
pub struct FakeCompletion {
    pub fail: AtomicBool,
    /// Reply with whitespace only
    pub blank: AtomicBool,
    pub calls: Mutex<Vec<(String, Vec<Message>)>>,
}

impl FakeCompletion {
    pub fn calls(&self) -> Vec<(String, Vec<Message>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> (String, Vec<Message>) {
        self.calls().pop().expect("no completion calls recorded")
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<Message> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Upstream("completion endpoint unavailable".to_string()));
        }

        if self.blank.load(Ordering::SeqCst) {
            return Ok(Message::assistant("  "));
        }

        let system = messages.first().map(|m| m.content.as_str()).unwrap_or_default();
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();

        let reply = if system == TRANSLATOR_PROMPT {
            "Hello".to_string()
        } else if system == CORRECTION_PROMPT {
            last.replace("하세여", "하세요")
        } else {
            format!("민쌤: {last}에 대한 답이에요!")
        };

        Ok(Message::assistant(reply))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Transcriber fake returning a fixed raw transcript
#[derive(Default)]
pub struct FakeTranscriber {
    pub calls: Mutex<Vec<(usize, String)>>,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((audio.len(), mime_type.to_string()));
        Ok(RAW_TRANSCRIPT.to_string())
    }
}

/// Speech synthesizer fake
#[derive(Default)]
pub struct FakeSpeech {
    pub fail: AtomicBool,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Upstream("speech endpoint unavailable".to_string()));
        }
        Ok(FAKE_MP3.to_vec())
    }
}

/// Router plus handles to its fakes
pub struct TestApp {
    pub router: Router,
    pub state: Arc<ApiState>,
    pub completion: Arc<FakeCompletion>,
    pub transcriber: Arc<FakeTranscriber>,
    pub speech: Arc<FakeSpeech>,
}

/// Build the full router around in-process fakes
pub fn test_app() -> TestApp {
    let completion = Arc::new(FakeCompletion::default());
    let transcriber = Arc::new(FakeTranscriber::default());
    let speech = Arc::new(FakeSpeech::default());

    let server = ApiServerBuilder::new(completion.clone(), transcriber.clone(), speech.clone()).build();

    TestApp {
        router: server.router(),
        state: server.state(),
        completion,
        transcriber,
        speech,
    }
}

/// Response pieces the tests care about
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub json: serde_json::Value,
}

impl TestResponse {
    /// `name=value` pair suitable for a `Cookie` header
    pub fn cookie(&self) -> String {
        self.set_cookie
            .as_deref()
            .and_then(|c| c.split(';').next())
            .expect("response carried no session cookie")
            .to_string()
    }

    /// Session identifier issued by this response
    pub fn session_id(&self) -> SessionId {
        let cookie = self.cookie();
        let (_, value) = cookie.split_once('=').unwrap();
        SessionId::parse(value).expect("malformed session id")
    }
}

/// Send a request through the router
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    TestResponse {
        status,
        set_cookie,
        json,
    }
}

/// POST a JSON body, optionally with a session cookie
pub async fn post_json(
    router: &Router,
    uri: &str,
    cookie: Option<&str>,
    body: &serde_json::Value,
) -> TestResponse {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(router, builder.body(Body::from(body.to_string())).unwrap()).await
}

/// POST with an empty body, optionally with a session cookie
pub async fn post_empty(router: &Router, uri: &str, cookie: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(router, builder.body(Body::empty()).unwrap()).await
}

/// POST a multipart form with a single `audio` file part
pub async fn post_audio(router: &Router, cookie: Option<&str>, audio: &[u8]) -> TestResponse {
    const BOUNDARY: &str = "minssem-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"audio\"; filename=\"speech.webm\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: audio/webm\r\n\r\n");
    body.extend_from_slice(audio);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/chat")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(router, builder.body(Body::from(body)).unwrap()).await
}
