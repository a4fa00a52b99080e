//! Invocation loop
//!
//! Reads one JSON request per line and writes exactly one JSON response line
//! per request, in order. Hashing is CPU-bound, so each dispatch runs on the
//! blocking pool; invocations are still processed one at a time.

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::dispatch::{DispatchError, Dispatcher, Reply};

/// One newline-delimited frame of input
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// A complete line without its line terminator
    Line(Vec<u8>),
    /// A line longer than the payload limit; only its length was kept
    Oversized(usize),
}

/// Serve requests from `input` until EOF, returning how many were answered.
///
/// Blank lines are skipped and get no response. At most the payload limit
/// (plus a line terminator) is buffered per request; longer lines are
/// discarded as they stream past and answered as too long.
pub async fn run<R, W>(dispatcher: Arc<Dispatcher>, mut input: R, mut output: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let limit = dispatcher.max_payload_bytes();
    let mut answered = 0usize;

    while let Some(frame) = next_frame(&mut input, limit).await? {
        let reply = match frame {
            Frame::Oversized(len) => dispatcher.reject(&DispatchError::PayloadTooLarge {
                len,
                max: limit,
            }),
            Frame::Line(bytes) => {
                if bytes.trim_ascii().is_empty() {
                    continue;
                }
                match String::from_utf8(bytes) {
                    Ok(line) => {
                        let worker = Arc::clone(&dispatcher);
                        tokio::task::spawn_blocking(move || worker.dispatch(&line)).await?
                    }
                    Err(_) => dispatcher.reject(&DispatchError::MalformedPayload),
                }
            }
        };

        write_reply(&mut output, &reply).await?;
        answered += 1;
        tracing::debug!(success = reply.success, answered, "invocation complete");
    }

    Ok(answered)
}

async fn write_reply<W: AsyncWrite + Unpin>(output: &mut W, reply: &Reply) -> io::Result<()> {
    let mut payload = reply.payload();
    payload.push('\n');
    output.write_all(payload.as_bytes()).await?;
    output.flush().await
}

/// Read the next frame, buffering no more than `limit` bytes of content
async fn next_frame<R>(input: &mut R, limit: usize) -> io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    // Room for a full-size payload followed by "\r\n"
    let cap = limit.saturating_add(2);
    let mut buf = Vec::new();
    let read = (&mut *input)
        .take(cap as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        return Ok(Some(Frame::Line(buf)));
    }

    if buf.len() < cap {
        // Final line without a terminator
        return Ok(Some(Frame::Line(buf)));
    }

    let skipped = skip_line(input).await?;
    Ok(Some(Frame::Oversized(buf.len() + skipped)))
}

/// Discard input up to and including the next newline, returning how many
/// bytes before it were dropped
async fn skip_line<R>(input: &mut R) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0usize;
    loop {
        let available = input.fill_buf().await?;
        if available.is_empty() {
            return Ok(skipped);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                input.consume(end + 1);
                return Ok(skipped + end);
            }
            None => {
                let len = available.len();
                input.consume(len);
                skipped += len;
            }
        }
    }
}

/// [`run`] over process stdin/stdout
pub async fn run_stdio(dispatcher: Arc<Dispatcher>) -> Result<usize> {
    run(
        dispatcher,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}
