//! Document rendering contract and the built-in storyboard renderer.
//!
//! The orchestrator hands the renderer the finished, ordered panel list;
//! everything about presentation is the renderer's business. The built-in
//! implementation writes a self-contained HTML storybook.

use crate::memory::Panel;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;

/// Errors from document rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Consumes the finished ordered panel list and produces an artifact,
/// returning a reference to it (typically a file path).
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, panels: &[Panel]) -> Result<String, RenderError>;
}

/// Renders the story as a single HTML file: a cover page followed by one
/// page per panel with its image, narration, and theme caption.
pub struct StoryboardRenderer {
    output_dir: PathBuf,
    title: String,
}

impl StoryboardRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            title: "My Amazing Comic".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn build_html(&self, panels: &[Panel]) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape_html(&self.title)));
        html.push_str(
            "<style>\n\
             body { font-family: sans-serif; max-width: 720px; margin: 0 auto; }\n\
             .page { page-break-after: always; padding: 2em 0; }\n\
             .panel-image { width: 100%; border-radius: 8px; }\n\
             .narration { font-size: 1.2em; margin-top: 1em; }\n\
             .theme { color: #666; font-style: italic; }\n\
             </style>\n</head>\n<body>\n",
        );

        // Cover page
        html.push_str("<div class=\"page cover\">\n");
        html.push_str(&format!("<h1>{}</h1>\n", escape_html(&self.title)));
        html.push_str("<p>Created by a young storyteller</p>\n</div>\n");

        for (i, panel) in panels.iter().enumerate() {
            html.push_str("<div class=\"page\">\n");
            html.push_str(&format!("<h2>Panel {}</h2>\n", i + 1));
            let caption = if panel.theme.is_empty() {
                format!("Panel {}", i + 1)
            } else {
                panel.theme.clone()
            };
            html.push_str(&format!(
                "<img class=\"panel-image\" src=\"{}\" alt=\"{}\">\n",
                escape_html(&panel.image_ref),
                escape_html(&caption)
            ));
            html.push_str(&format!(
                "<p class=\"narration\">{}</p>\n",
                escape_html(&panel.narration)
            ));
            if !panel.theme.is_empty() {
                html.push_str(&format!(
                    "<p class=\"theme\">{}</p>\n",
                    escape_html(&panel.theme)
                ));
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

#[async_trait]
impl DocumentRenderer for StoryboardRenderer {
    async fn render(&self, panels: &[Panel]) -> Result<String, RenderError> {
        let html = self.build_html(panels);

        fs::create_dir_all(&self.output_dir).await?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = self.output_dir.join(format!("comic-{millis}.html"));

        fs::write(&path, html).await?;

        Ok(path_to_string(&path))
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
