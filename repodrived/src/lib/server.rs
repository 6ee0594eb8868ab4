//! HTTP/1.1 plumbing of the proxy.
//!
//! One request per connection. Bodies must carry a `Content-Length`.

use std::fmt::Write as _;

use anyhow::Context;
use chrono::Utc;
use http::{header, HeaderName, HeaderValue, Method, Request, Response, Uri};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const MAX_BODY_LEN: usize = 1024 * 1024;
const MAX_LINE_LEN: u64 = 8 * 1024;

pub async fn parse_request<R>(reader: R) -> anyhow::Result<Request<Vec<u8>>>
where
    R: AsyncBufRead,
{
    tokio::pin!(reader);

    let line = read_line(&mut reader)
        .await?
        .context("Empty HTTP request")?;
    let (method, uri) = request_line(&line)?;
    let mut req = Request::builder().method(method).uri(uri);

    let mut body_len = 0;
    while let Some(line) = read_line(&mut reader).await? {
        if line.is_empty() {
            break;
        }
        let (name, value) = header_line(&line)?;
        if name == header::TRANSFER_ENCODING {
            anyhow::bail!("Unsupported header: Transfer-Encoding");
        }
        if name == header::CONTENT_LENGTH {
            body_len = value.to_str()?.parse()?;
        }
        req = req.header(name, value);
    }
    if body_len > MAX_BODY_LEN {
        anyhow::bail!("Request body too large: {body_len} bytes");
    }

    let mut body = vec![0; body_len];
    reader.read_exact(&mut body).await?;
    Ok(req.body(body)?)
}

/// Next line without its CRLF, `None` at end of stream.
async fn read_line<R>(reader: &mut R) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    reader.take(MAX_LINE_LEN).read_line(&mut line).await?;
    if line.is_empty() {
        return Ok(None);
    }
    match line.strip_suffix("\r\n") {
        Some(content) => Ok(Some(content.to_string())),
        None => anyhow::bail!("Unterminated or too long line"),
    }
}

fn request_line(line: &str) -> anyhow::Result<(Method, Uri)> {
    let mut parts = line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        anyhow::bail!("Malformed request line: {line}");
    };
    if version != "HTTP/1.1" {
        anyhow::bail!("Unsupported protocol: {version}");
    }
    let method = Method::from_bytes(method.as_bytes())
        .with_context(|| format!("Unrecognized method: {method}"))?;
    let uri = target
        .parse()
        .with_context(|| format!("Invalid request target: {target}"))?;
    Ok((method, uri))
}

fn header_line(line: &str) -> anyhow::Result<(HeaderName, HeaderValue)> {
    let (name, value) = line
        .split_once(':')
        .with_context(|| format!("Invalid header: {line}"))?;
    Ok((
        HeaderName::from_bytes(name.trim().as_bytes())?,
        HeaderValue::from_str(value.trim())?,
    ))
}

/// Writes `resp`, adding `Date`, `Server` and `Content-Length` if missing.
pub async fn write_response<W, B>(resp: Response<B>, writer: W) -> anyhow::Result<()>
where
    W: AsyncWrite,
    B: AsRef<[u8]>,
{
    let (parts, body) = resp.into_parts();
    let body = body.as_ref();

    let mut head = format!("{:?} {}\r\n", parts.version, parts.status);
    if !parts.headers.contains_key(header::DATE) {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT");
        write!(head, "Date: {date}\r\n")?;
    }
    if !parts.headers.contains_key(header::SERVER) {
        write!(head, "Server: {}\r\n", crate::USER_AGENT)?;
    }
    if !parts.headers.contains_key(header::CONTENT_LENGTH) {
        write!(head, "Content-Length: {}\r\n", body.len())?;
    }
    for (name, value) in parts.headers.iter() {
        let value = value
            .to_str()
            .with_context(|| format!("Non visible ASCII in header {name}"))?;
        write!(head, "{name}: {value}\r\n")?;
    }
    head.push_str("\r\n");

    tokio::pin!(writer);
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}
