use crate::request::{Request, execute};
use redscout_engine::NoteService;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Reads one JSON request per line and writes one JSON response per line,
/// until EOF or cancellation. Requests run one at a time.
pub async fn run<R, W>(
    service: &NoteService,
    reader: R,
    mut writer: W,
    token: CancellationToken,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("Serve loop cancelled");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = respond(service, line).await;
        writer.write_all(response.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

async fn respond(service: &NoteService, line: &str) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejected request: {}", e);
            return error_response("invalid_request", &e.to_string());
        }
    };
    tracing::debug!(?request, "Serving request");

    match execute(service, request).await {
        Ok(reply) => json!({ "ok": true, "text": reply.text, "result": reply.result }),
        Err(e) => error_response(e.kind(), &e.to_string()),
    }
}

fn error_response(kind: &str, message: &str) -> Value {
    json!({ "ok": false, "error": { "kind": kind, "message": message } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use redscout_engine::RedscoutConfig;
    use redscout_engine::backend::Backend;

    // Only malformed input reaches these tests, so the factory never runs.
    fn service() -> NoteService {
        NoteService::new(
            RedscoutConfig::default(),
            Box::new(|| -> Box<dyn Backend> { unreachable!("no browser in serve tests") }),
            CancellationToken::new(),
        )
    }

    async fn serve(input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        run(&service(), input.as_bytes(), &mut output, CancellationToken::new())
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_malformed_lines_get_invalid_request() {
        let responses = serve("not json\n\n   \n{\"op\": \"teleport\"}\n").await;
        assert_eq!(responses.len(), 2);
        for response in &responses {
            assert_eq!(response["ok"], json!(false));
            assert_eq!(response["error"]["kind"], json!("invalid_request"));
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_loop() {
        let token = CancellationToken::new();
        token.cancel();
        let mut output = Vec::new();
        let (reader, _keep_open) = tokio::io::duplex(64);
        run(&service(), tokio::io::BufReader::new(reader), &mut output, token)
            .await
            .unwrap();
        assert!(output.is_empty());
    }
}
