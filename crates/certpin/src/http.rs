// Just enough HTTP/1.0 to fetch a resource over a pinned connection:
// one request per connection, the server closes when done.

use crate::ClientError;

pub(crate) fn request(host: &str, path: &str) -> Vec<u8> {
    let path = if path.starts_with('/') { path.to_string() } else { format!("/{path}") };
    format!(
        "GET {path} HTTP/1.0\r\nHost: {host}\r\nUser-Agent: certpin/{}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
        env!("CARGO_PKG_VERSION")
    )
    .into_bytes()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn parse(raw: &[u8]) -> Result<Self, ClientError> {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .ok_or_else(|| ClientError::Http("missing end of headers".into()))?;
        let head = std::str::from_utf8(&raw[..split])
            .map_err(|_| ClientError::Http("headers are not UTF-8".into()))?;
        let body = raw[split + 4..].to_vec();

        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap_or_default().to_string();

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/") {
            return Err(ClientError::Http(format!("bad status line {status_line:?}")));
        }
        let status = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| ClientError::Http(format!("bad status line {status_line:?}")))?;

        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Ok(Self {
            status,
            status_line,
            headers,
            body,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
