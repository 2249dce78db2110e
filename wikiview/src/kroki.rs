//! Mermaid rendering through a Kroki server.
//!
//! Each diagram is one `POST {server}/mermaid/svg` with the diagram source as
//! the body. `ureq` is blocking, so requests run on tokio's blocking pool.
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use ureq::Agent;
use wikiview_commonmark::{DiagramError, DiagramRenderer};
use wikiview_config::DiagramsConfig;

/// [`DiagramRenderer`] backed by Kroki.
#[derive(Debug, Clone)]
pub struct KrokiRenderer {
  agent:      Agent,
  server_url: String,
}

/// Create an HTTP agent with the specified timeout.
///
/// Status codes are inspected by hand so that Kroki's error body, which
/// carries the diagram syntax error, reaches the error panel.
fn create_agent(timeout: Duration) -> Agent {
  Agent::config_builder()
    .timeout_global(Some(timeout))
    .http_status_as_error(false)
    .build()
    .into()
}

impl KrokiRenderer {
  #[must_use]
  pub fn new(server_url: &str, timeout: Duration) -> Self {
    Self {
      agent:      create_agent(timeout),
      server_url: server_url.trim_end_matches('/').to_string(),
    }
  }

  #[must_use]
  pub fn from_config(config: &DiagramsConfig) -> Self {
    Self::new(&config.kroki_url, Duration::from_secs(config.timeout_secs))
  }

  /// Endpoint mermaid sources are posted to.
  #[must_use]
  pub fn endpoint(&self) -> String {
    format!("{}/mermaid/svg", self.server_url)
  }
}

/// Send a diagram to Kroki and return the SVG.
fn send_diagram_request(
  agent: &Agent,
  url: &str,
  source: &str,
) -> Result<String, DiagramError> {
  let response = agent
    .post(url)
    .header("Content-Type", "text/plain")
    .send(source.as_bytes())
    .map_err(|e| DiagramError::Http(e.to_string()))?;

  let status = response.status().as_u16();
  let mut body = response.into_body();

  if status >= 400 {
    let error_body = body
      .read_to_string()
      .unwrap_or_else(|_| String::from("(unable to read error body)"));
    return Err(if status == 400 {
      DiagramError::Rejected(error_body.trim().to_string())
    } else {
      DiagramError::Http(format!("HTTP {status}: {}", error_body.trim()))
    });
  }

  body
    .read_to_string()
    .map_err(|e| DiagramError::Io(e.to_string()))
}

#[async_trait]
impl DiagramRenderer for KrokiRenderer {
  async fn render_diagram(
    &self,
    source: &str,
    id: &str,
  ) -> Result<String, DiagramError> {
    debug!("Rendering {id} via {}", self.server_url);
    let agent = self.agent.clone();
    let url = self.endpoint();
    let source = source.to_string();

    tokio::task::spawn_blocking(move || {
      send_diagram_request(&agent, &url, &source)
    })
    .await
    .map_err(|e| DiagramError::Task(e.to_string()))?
  }
}
