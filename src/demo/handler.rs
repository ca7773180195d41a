//! Reference handler wired into the `spillway` binary.

use std::time::Duration;

use http::StatusCode;

use crate::config::{DemoConfig, PayloadConfig};
use crate::http::{Exchange, Handler, RequestHead, Response, SessionError};
use crate::payload::Payload;

#[derive(Debug, Clone, Default)]
pub struct DemoHandler {
    payload: PayloadConfig,
    demo: DemoConfig,
}

impl DemoHandler {
    pub fn new(payload: PayloadConfig, demo: DemoConfig) -> Self {
        Self { payload, demo }
    }

    /// Drop a request's spill file unless retention is configured.
    async fn discard_spill(&self, body: Payload) {
        if self.payload.retain_spilled {
            return;
        }
        if let Err(e) = body.remove_file().await {
            tracing::warn!(path = ?body.path(), error = %e, "Failed to remove spill file");
        }
    }
}

impl Handler for DemoHandler {
    fn accept(&self, head: &RequestHead, body: &mut Payload) -> bool {
        if let Ok(Some(length)) = head.content_length() {
            if length >= self.payload.spill_threshold {
                *body = Payload::spill_to(self.payload.spill_dir());
            }
        }
        true
    }

    async fn handle(&self, mut exchange: Exchange) {
        let body = exchange.request().body().clone();

        if exchange.request().path() == "/timer" {
            let ticks = self.demo.timer_ticks;
            let interval = Duration::from_millis(self.demo.timer_interval_ms);
            let id = exchange.connection_id();
            // One worker per request; the exchange moves into it.
            tokio::spawn(async move {
                if let Err(e) = stream_timer(exchange, ticks, interval).await {
                    tracing::debug!(connection_id = %id, error = %e, "Timer stream aborted");
                }
            });
        } else {
            let mut res = Response::for_request(StatusCode::NOT_FOUND, &exchange.request().head);
            res.prepare_payload();
            if let Err(e) = exchange.send(res).await {
                tracing::debug!(connection_id = %exchange.connection_id(), error = %e, "Failed to send response");
            }
        }

        self.discard_spill(body).await;
    }
}

/// Stream `ticks` chunks `"<i>\r\n"`, one per `interval`, then end the
/// response one interval later.
pub async fn stream_timer(
    mut exchange: Exchange,
    ticks: u32,
    interval: Duration,
) -> Result<(), SessionError> {
    let mut res = Response::for_request(StatusCode::OK, &exchange.request().head);
    res.set_chunked(true);
    exchange.send(res).await?;

    for i in 0..ticks {
        tokio::time::sleep(interval).await;
        exchange.send_chunk(Some(format!("{i}\r\n").as_bytes())).await?;
    }

    tokio::time::sleep(interval).await;
    exchange.send_chunk(None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
    use http::{Method, Version};

    fn head(length: Option<u64>) -> RequestHead {
        let mut headers = HeaderMap::new();
        if let Some(n) = length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(n));
        }
        RequestHead {
            method: Method::POST,
            target: "/upload".into(),
            version: Version::HTTP_11,
            headers,
        }
    }

    #[test]
    fn spills_at_threshold() {
        let handler = DemoHandler::new(
            PayloadConfig {
                spill_threshold: 4096,
                spill_dir: Some("/tmp/spill".into()),
                retain_spilled: false,
            },
            DemoConfig::default(),
        );

        let mut body = Payload::default();
        assert!(handler.accept(&head(Some(4095)), &mut body));
        assert!(body.is_inline());

        let mut body = Payload::default();
        assert!(handler.accept(&head(Some(4096)), &mut body));
        assert!(body.path().unwrap().starts_with("/tmp/spill"));

        let mut body = Payload::default();
        assert!(handler.accept(&head(None), &mut body));
        assert!(body.is_inline());
    }
}
