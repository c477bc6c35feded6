use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lzviz_cli::HttpTransport;
use lzviz_core::{OutputSymbol, StepLog};
use lzviz_runtime::{
    CompressionTransport, LocalTransport, Session, SessionError, TransportError,
};
use serde_json::Value;

#[derive(Debug, Clone)]
struct ScriptedResponse {
    status: u16,
    body: String,
}

impl ScriptedResponse {
    fn json(body: &impl serde::Serialize) -> Self {
        Self {
            status: 200,
            body: serde_json::to_string(body).expect("encode body"),
        }
    }

    fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct RecordedRequest {
    path: String,
    body: Value,
}

struct ServerHarness {
    endpoint: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    stop: Arc<AtomicBool>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl ServerHarness {
    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Drop for ServerHarness {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = TcpStream::connect(self.endpoint.strip_prefix("http://").unwrap_or_default());
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

fn find_header_end(bytes: &[u8]) -> Option<usize> {
    bytes.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut bytes = Vec::new();
    let mut buf = [0_u8; 4096];
    let mut content_length = 0_usize;
    let mut header_end = None;

    stream.set_read_timeout(Some(Duration::from_secs(2))).ok()?;

    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => {
                bytes.extend_from_slice(&buf[..read]);
                if header_end.is_none() {
                    if let Some(pos) = find_header_end(&bytes) {
                        header_end = Some(pos + 4);
                        let header_text = String::from_utf8_lossy(&bytes[..pos]).to_string();
                        for line in header_text.lines() {
                            if line.to_ascii_lowercase().starts_with("content-length:") {
                                content_length = line
                                    .split(':')
                                    .nth(1)
                                    .and_then(|value| value.trim().parse().ok())
                                    .unwrap_or(0);
                            }
                        }
                    }
                }
                if let Some(end) = header_end {
                    if bytes.len() >= end + content_length {
                        break;
                    }
                }
            }
            Err(_) => return None,
        }
    }

    let end = header_end?;
    let header_text = String::from_utf8_lossy(&bytes[..end]).to_string();
    let path = header_text
        .lines()
        .next()?
        .split_whitespace()
        .nth(1)?
        .to_string();
    let body = String::from_utf8_lossy(&bytes[end..end + content_length]).to_string();
    Some((path, body))
}

fn write_response(stream: &mut TcpStream, response: &ScriptedResponse) {
    let reason = if response.status == 200 { "OK" } else { "Error" };
    let payload = format!(
        "HTTP/1.1 {} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.body.len(),
        response.body
    );
    let _ = stream.write_all(payload.as_bytes());
    let _ = stream.flush();
}

fn start_scripted_server(responses: Vec<ScriptedResponse>) -> ServerHarness {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    listener
        .set_nonblocking(true)
        .expect("set nonblocking listener");

    let endpoint = format!("http://{}", listener.local_addr().expect("local addr"));
    let stop = Arc::new(AtomicBool::new(false));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let mut queue = VecDeque::from(responses);

    let stop_clone = Arc::clone(&stop);
    let requests_clone = Arc::clone(&requests);

    let join_handle = thread::spawn(move || {
        loop {
            if stop_clone.load(Ordering::SeqCst) {
                break;
            }
            match listener.accept() {
                Ok((mut stream, _addr)) => {
                    let Some((path, body)) = parse_request(&mut stream) else {
                        continue;
                    };
                    requests_clone
                        .lock()
                        .expect("requests lock")
                        .push(RecordedRequest {
                            path,
                            body: serde_json::from_str(&body).unwrap_or(Value::Null),
                        });
                    let response = queue
                        .pop_front()
                        .unwrap_or_else(|| ScriptedResponse::raw(500, "no scripted response"));
                    write_response(&mut stream, &response);
                }
                Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    ServerHarness {
        endpoint,
        requests,
        stop,
        join_handle: Some(join_handle),
    }
}

#[test]
fn compress_posts_data_and_decodes_the_response() {
    let expected = LocalTransport::default().compress("abcabcabc").unwrap();
    let server = start_scripted_server(vec![ScriptedResponse::json(&expected)]);
    let transport = HttpTransport::new(&format!("{}/", server.endpoint)).unwrap();

    let response = transport.compress("abcabcabc").unwrap();
    assert_eq!(response, expected);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/compress");
    assert_eq!(requests[0].body["data"], "abcabcabc");
}

#[test]
fn decompress_posts_symbols() {
    let server = start_scripted_server(vec![ScriptedResponse::raw(
        200,
        r#"{"decompressed_data":[104,105]}"#,
    )]);
    let transport = HttpTransport::new(&server.endpoint).unwrap();
    let symbols = [
        OutputSymbol::Literal { value: b'h' },
        OutputSymbol::Literal { value: b'i' },
    ];

    let response = transport.decompress(&symbols).unwrap();
    assert_eq!(response.decompressed_data, b"hi".to_vec());

    let requests = server.requests();
    assert_eq!(requests[0].path, "/decompress");
    assert_eq!(requests[0].body["compressed_data"][0]["type"], "literal");
    assert_eq!(requests[0].body["compressed_data"][1]["value"], 105);
}

#[test]
fn error_status_keeps_the_body() {
    let server = start_scripted_server(vec![ScriptedResponse::raw(
        400,
        r#"{"error":"No data provided"}"#,
    )]);
    let transport = HttpTransport::new(&server.endpoint).unwrap();

    let error = transport.compress("x").unwrap_err();
    assert_eq!(
        error,
        TransportError::Status {
            status: 400,
            body: r#"{"error":"No data provided"}"#.to_string(),
        }
    );
}

#[test]
fn malformed_body_is_a_decode_error() {
    let server = start_scripted_server(vec![ScriptedResponse::raw(200, "not json")]);
    let transport = HttpTransport::new(&server.endpoint).unwrap();

    assert!(matches!(
        transport.compress("x").unwrap_err(),
        TransportError::Decode(_)
    ));
}

#[test]
fn unreachable_endpoint_is_unavailable() {
    // Bind then drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let transport = HttpTransport::new(&format!("http://127.0.0.1:{port}")).unwrap();

    assert!(matches!(
        transport.compress("x").unwrap_err(),
        TransportError::Unavailable(_)
    ));
}

#[test]
fn session_keeps_prior_log_when_the_endpoint_fails() {
    let first = LocalTransport::default().compress("hello").unwrap();
    let server = start_scripted_server(vec![
        ScriptedResponse::json(&first),
        ScriptedResponse::raw(500, "boom"),
    ]);
    let transport = HttpTransport::new(&server.endpoint).unwrap();
    let mut session = Session::default();

    session.submit_with("hello", &transport).unwrap();
    let error = session.submit_with("world", &transport).unwrap_err();

    assert!(matches!(
        error,
        SessionError::Transport(TransportError::Status { status: 500, .. })
    ));
    assert_eq!(session.log(), &StepLog::from_response(&first).unwrap());
    assert!(!session.controls().submitting);
}
