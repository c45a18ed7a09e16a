use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use plebchat_shared::schemas::ErrorResponse;
use plebchat_shared::{Frame, GraphInfo, GraphRequest};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_graphs(&self) -> Result<Vec<GraphInfo>> {
        let url = format!("{}/graphs", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<Vec<GraphInfo>>().await?)
    }

    /// Run one turn on `graph_id`, handing each frame to `on_frame` as it
    /// arrives.
    pub async fn run_graph(
        &self,
        graph_id: &str,
        request: &GraphRequest,
        mut on_frame: impl FnMut(Frame),
    ) -> Result<()> {
        let url = format!("{}/graph/{}", self.base_url, graph_id);

        let response = self.client
            .post(&url)
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            buffer.extend_from_slice(&bytes);

            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                let line = String::from_utf8_lossy(&line);
                if let Some(frame) = Frame::parse_sse_line(line.trim_end()) {
                    on_frame(frame);
                }
            }
        }

        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => "no error message".to_string(),
    };
    Err(anyhow::anyhow!("server returned {}: {}", status, message))
}

/// Short name for a transport failure.
pub fn error_kind(err: &reqwest::Error) -> &'static str {
    if err.is_connect() {
        "ConnectError"
    } else if err.is_timeout() {
        "Timeout"
    } else if err.is_decode() {
        "DecodeError"
    } else if err.is_body() {
        "BodyError"
    } else {
        "RequestError"
    }
}
