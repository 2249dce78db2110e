//! Diagram rendering through an external renderer.
use async_trait::async_trait;
use log::{debug, warn};

use crate::{
  error::DiagramError,
  macros::DIAGRAM_CLASS,
  processor::types::PendingDiagram,
  types::{DiagramOutcome, DiagramStatus},
};

/// Turns diagram source text into graphic markup (typically SVG).
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
  /// Render `source` for the container `id`.
  ///
  /// # Errors
  ///
  /// Returns [`DiagramError`] if this diagram cannot be rendered. Other
  /// diagrams of the document are unaffected.
  async fn render_diagram(
    &self,
    source: &str,
    id: &str,
  ) -> Result<String, DiagramError>;
}

/// A diagram after rendering, with the markup replacing its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
  pub outcome: DiagramOutcome,
  /// Replacement for the container; `None` leaves it as it is.
  pub markup:  Option<String>,
}

/// Render every pending diagram, one after the other.
///
/// Without a renderer every diagram is skipped and its container keeps the
/// escaped source.
pub async fn render_diagrams(
  renderer: Option<&dyn DiagramRenderer>,
  pending: &[PendingDiagram],
) -> Vec<RenderedDiagram> {
  let mut rendered = Vec::with_capacity(pending.len());

  for diagram in pending {
    let Some(renderer) = renderer else {
      rendered.push(RenderedDiagram {
        outcome: outcome(diagram, DiagramStatus::Skipped),
        markup:  None,
      });
      continue;
    };

    match renderer.render_diagram(&diagram.source, &diagram.id).await {
      Ok(svg) => {
        debug!("Rendered diagram {}", diagram.id);
        rendered.push(RenderedDiagram {
          outcome: outcome(diagram, DiagramStatus::Rendered),
          markup:  Some(rendered_markup(&diagram.id, &svg)),
        });
      },
      Err(e) => {
        warn!("Failed to render diagram {}: {e}", diagram.id);
        let message = e.to_string();
        rendered.push(RenderedDiagram {
          markup:  Some(error_markup(&diagram.id, &message, &diagram.source)),
          outcome: outcome(diagram, DiagramStatus::Failed { message }),
        });
      },
    }
  }

  rendered
}

fn outcome(diagram: &PendingDiagram, status: DiagramStatus) -> DiagramOutcome {
  DiagramOutcome {
    id: diagram.id.clone(),
    source: diagram.source.clone(),
    status,
  }
}

fn rendered_markup(id: &str, svg: &str) -> String {
  format!(
    "<div class=\"{DIAGRAM_CLASS} mermaid-rendered\" id=\"{}\">{svg}</div>",
    html_escape::encode_double_quoted_attribute(id)
  )
}

/// Inline error panel keeping the diagram source visible.
fn error_markup(id: &str, message: &str, source: &str) -> String {
  format!(
    "<div class=\"{DIAGRAM_CLASS} mermaid-error\" id=\"{}\"><div \
     class=\"error-message\"><p><strong>Error rendering \
     diagram:</strong></p><p>{}</p><pre>{}</pre></div></div>",
    html_escape::encode_double_quoted_attribute(id),
    html_escape::encode_text(message),
    html_escape::encode_text(source),
  )
}
