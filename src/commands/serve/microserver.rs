//! Blocking HTTP/1.1 over any Read + Write stream, parsed with httparse.
//!
//! One request per connection. Only POST carries a body, and it must
//! declare a Content-Length no larger than `MAX_BODY_SIZE`. Chunked bodies
//! are rejected.

use serde::Serialize;
use std::io::{BufRead, BufReader, Read, Write};

/// Header section cap (32 KiB)
const MAX_HEADER_SIZE: usize = 32 * 1024;

/// Webhook payloads are small; 1 MiB is generous
const MAX_BODY_SIZE: usize = 1_048_576;

/// Parsed HTTP request (transport-free)
#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path without the query string
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or("/")
    }
}

/// HTTP response to write back
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// JSON body with Content-Type set
    pub fn json(status: u16, value: &impl Serialize) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
    }

    /// Plain text body
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![(
                "Content-Type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Read lines up to the blank line that ends the header section
fn read_header_section(reader: &mut impl BufRead) -> Option<Result<Vec<u8>, String>> {
    let mut head = Vec::with_capacity(1024);
    loop {
        let room = (MAX_HEADER_SIZE + 1).saturating_sub(head.len()) as u64;
        match (&mut *reader).take(room).read_until(b'\n', &mut head) {
            Ok(0) if head.is_empty() => return None,
            Ok(0) => return Some(Err("Connection closed mid-request".to_string())),
            Ok(_) => {}
            Err(_) if head.is_empty() => return None,
            Err(e) => return Some(Err(format!("Read error: {}", e))),
        }
        if head.len() > MAX_HEADER_SIZE {
            return Some(Err("Headers too large".to_string()));
        }
        if head.ends_with(b"\r\n\r\n") {
            return Some(Ok(head));
        }
    }
}

/// Read and parse one HTTP request from a stream.
///
/// `None` means the peer closed before sending anything. `Some(Err)` carries
/// a message for a 400 (or 413 when it says "too large").
pub fn read_request(stream: &mut impl Read) -> Option<Result<HttpRequest, String>> {
    let mut reader = BufReader::new(stream);
    let head = match read_header_section(&mut reader)? {
        Ok(head) => head,
        Err(e) => return Some(Err(e)),
    };
    Some(parse_head(&head, &mut reader))
}

fn parse_head(head: &[u8], reader: &mut impl BufRead) -> Result<HttpRequest, String> {
    let mut slots = [httparse::EMPTY_HEADER; 64];
    let mut req = httparse::Request::new(&mut slots);
    match req.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => return Err("Incomplete HTTP request".to_string()),
        Err(e) => return Err(format!("HTTP parse error: {}", e)),
    }

    let headers: Vec<(String, String)> = req
        .headers
        .iter()
        .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
        .collect();
    let mut request = HttpRequest {
        method: req.method.unwrap_or("").to_string(),
        path: req.path.unwrap_or("/").to_string(),
        headers,
        body: Vec::new(),
    };

    if request
        .header("Transfer-Encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    {
        return Err("Chunked transfer encoding not supported".to_string());
    }
    if request.method != "POST" {
        return Ok(request);
    }

    let len: usize = request
        .header("Content-Length")
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| "POST requires Content-Length".to_string())?;
    if len > MAX_BODY_SIZE {
        return Err("Request body too large".to_string());
    }

    let mut body = Vec::with_capacity(len);
    reader
        .take(len as u64)
        .read_to_end(&mut body)
        .map_err(|e| format!("Read error: {}", e))?;
    if body.len() < len {
        return Err("Connection closed mid-body".to_string());
    }
    request.body = body;
    Ok(request)
}

/// Write an HTTP response; errors mean the client went away and are ignored.
pub fn write_response(stream: &mut impl Write, response: &HttpResponse) {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason(response.status),
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    let _ = stream.write_all(head.as_bytes());
    if !response.body.is_empty() {
        let _ = stream.write_all(&response.body);
    }
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(raw: &[u8]) -> Result<HttpRequest, String> {
        let mut stream = Cursor::new(raw.to_vec());
        read_request(&mut stream).expect("request bytes present")
    }

    #[test]
    fn test_parse_get_with_query_string() {
        let req = parse(b"GET /health?verbose=1 HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/health?verbose=1");
        assert_eq!(req.route(), "/health");
        assert_eq!(req.header("host"), Some("localhost"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_parse_webhook_post() {
        let body = r#"{"queryResult":{"queryText":"soil health"}}"#;
        let raw = format!(
            "POST /webhook HTTP/1.1\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let req = parse(raw.as_bytes()).unwrap();
        assert_eq!(req.route(), "/webhook");
        assert_eq!(String::from_utf8_lossy(&req.body), body);
    }

    #[test]
    fn test_body_is_capped_by_content_length() {
        let raw = b"POST /api/references HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}trailing";
        let req = parse(raw).unwrap();
        assert_eq!(req.body, b"{}");
    }

    #[test]
    fn test_huge_content_length_is_rejected_before_reading() {
        let raw = format!(
            "POST /webhook HTTP/1.1\r\nContent-Length: {}\r\n\r\n{{}}",
            usize::MAX
        );
        let err = parse(raw.as_bytes()).unwrap_err();
        assert!(err.contains("too large"));

        let raw = format!(
            "POST /webhook HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
            MAX_BODY_SIZE + 1
        );
        assert!(parse(raw.as_bytes()).unwrap_err().contains("too large"));
    }

    #[test]
    fn test_short_body_is_rejected() {
        let err = parse(b"POST /webhook HTTP/1.1\r\nContent-Length: 10\r\n\r\n{}").unwrap_err();
        assert!(err.contains("mid-body"));
    }

    #[test]
    fn test_reject_chunked() {
        let err = parse(b"POST /webhook HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n").unwrap_err();
        assert!(err.contains("Chunked"));
    }

    #[test]
    fn test_post_requires_content_length() {
        let err = parse(b"POST /webhook HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap_err();
        assert!(err.contains("Content-Length"));
    }

    #[test]
    fn test_closed_mid_headers() {
        let err = parse(b"GET / HTTP/1.1\r\nHost: loc").unwrap_err();
        assert!(err.contains("closed"));
    }

    #[test]
    fn test_headers_too_large() {
        let huge = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "A".repeat(MAX_HEADER_SIZE));
        let err = parse(huge.as_bytes()).unwrap_err();
        assert!(err.contains("too large"));
    }

    #[test]
    fn test_empty_stream_returns_none() {
        let mut stream = Cursor::new(Vec::<u8>::new());
        assert!(read_request(&mut stream).is_none());
    }

    #[test]
    fn test_write_text_response() {
        let resp = HttpResponse::text(200, "ok").with_header("X-Test", "1");
        let mut buf = Vec::new();
        write_response(&mut buf, &resp);
        let output = String::from_utf8_lossy(&buf);
        assert!(output.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(output.contains("Content-Length: 2\r\n"));
        assert!(output.contains("Connection: close\r\n"));
        assert!(output.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(output.contains("X-Test: 1\r\n"));
        assert!(output.ends_with("\r\n\r\nok"));
    }

    #[test]
    fn test_json_response_status_line() {
        let resp = HttpResponse::json(404, &serde_json::json!({"error": "Not found"}));
        let mut buf = Vec::new();
        write_response(&mut buf, &resp);
        let output = String::from_utf8_lossy(&buf);
        assert!(output.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(output.ends_with(r#"{"error":"Not found"}"#));
    }
}
