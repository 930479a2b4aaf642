// src/mcp/transport.rs

use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::mcp::handler::handle_mcp_request;
use crate::mcp::protocol::{error_codes, Request, Response};
use crate::AppState;

const RESPONSE_QUEUE: usize = 64;

/// Serves MCP on the process's stdin/stdout until stdin closes.
pub async fn run_stdio(state: AppState) {
    info!("🚀 Starting MCP server on stdin/stdout...");
    serve(state, io::stdin(), io::stdout()).await;
    info!("MCP server shutting down");
}

/// Reads line-delimited JSON-RPC from `reader` and writes responses to `writer`.
///
/// Each request runs on its own task; a single writer task owns `writer` so
/// response lines never interleave. Returns once input has ended and every
/// in-flight request has been answered.
pub async fn serve<R, W>(state: AppState, reader: R, writer: W)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Response>(RESPONSE_QUEUE);
    let writer_task = tokio::spawn(write_responses(rx, writer));

    let mut reader = BufReader::new(reader);
    let mut frame = Vec::new();
    loop {
        frame.clear();
        match reader.read_until(b'\n', &mut frame).await {
            Ok(0) => {
                info!("EOF received, waiting for in-flight requests");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
        }

        let request = match parse_frame(&frame) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(response) => {
                if tx.send(response).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let state = state.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = handle_mcp_request(request, state).await {
                if tx.send(response).await.is_err() {
                    error!("Response writer has stopped");
                }
            }
        });
    }

    // The channel closes once every spawned request has dropped its sender
    drop(tx);
    if let Err(e) = writer_task.await {
        error!("Response writer task failed: {}", e);
    }
}

/// Decodes one input line. Blank lines yield `Ok(None)`; undecodable ones
/// yield the error response to send back.
fn parse_frame(frame: &[u8]) -> Result<Option<Request>, Response> {
    let line = match std::str::from_utf8(frame) {
        Ok(line) => line.trim(),
        Err(e) => {
            error!("Input line is not valid UTF-8: {}", e);
            return Err(Response::error(
                Value::Null,
                error_codes::PARSE_ERROR,
                format!("Parse error: {}", e),
            ));
        }
    };
    if line.is_empty() {
        return Ok(None);
    }
    debug!("Received: {}", line);

    let value: Value = serde_json::from_str(line).map_err(|parse_error| {
        error!("JSON parse error: {}", parse_error);
        Response::error(
            Value::Null,
            error_codes::PARSE_ERROR,
            format!("Parse error: {}", parse_error),
        )
    })?;
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value::<Request>(value).map(Some).map_err(|e| {
        error!("Invalid JSON-RPC request: {}", e);
        Response::error(id, error_codes::INVALID_REQUEST, format!("Invalid request: {}", e))
    })
}

async fn write_responses<W>(mut rx: mpsc::Receiver<Response>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                continue;
            }
        };
        debug!("Sending: {}", response_json);
        let written = async {
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        };
        if let Err(e) = written.await {
            error!("Failed to write response: {}", e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error_of(frame: &[u8]) -> Response {
        parse_frame(frame).unwrap_err()
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_frame(b"  \r\n").unwrap().is_none());
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let resp = error_of(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"x\":\"\xff\xfe\"}\n");
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, error_codes::PARSE_ERROR);
    }

    #[test]
    fn json_without_method_is_an_invalid_request() {
        let resp = error_of(br#"{"jsonrpc":"2.0","id":9,"params":{}}"#);
        assert_eq!(resp.id, json!(9));
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_REQUEST);

        let resp = error_of(b"[1,2]");
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn requests_are_decoded() {
        let req = parse_frame(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(req.method, "ping");
        assert_eq!(req.id, json!(1));
    }
}
