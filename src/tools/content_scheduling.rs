//! Scheduling of social posts.
//!
//! The tool builds a [`ScheduledPost`] and hands it to a [`Publisher`]. The
//! bundled [`OutboxPublisher`] appends posts to a JSON-lines file that a
//! platform-specific poster drains.

use crate::config::SchedulingSettings;
use crate::error::ToolError;
use crate::tool::{ExecutionContext, ParamKind, ParamSpec, QualityTier, Tool, ToolRequest, ToolSchema};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};
use uuid::Uuid;

/// A post queued for publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPost {
    pub id: Uuid,
    pub platform: String,
    pub caption: String,
    pub media_path: Option<String>,
    pub edl_path: Option<String>,
    /// `None` publishes as soon as the poster picks it up.
    pub publish_at: Option<DateTime<Utc>>,
    /// Rendition quality the poster should upload.
    pub quality: QualityTier,
    pub created_at: DateTime<Utc>,
}

/// Destination for scheduled posts.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Queue a post. Returns the publisher's reference for it.
    async fn publish(&self, post: &ScheduledPost) -> Result<String, ToolError>;
}

/// Appends posts to a JSON-lines outbox file.
pub struct OutboxPublisher {
    path: PathBuf,
}

impl OutboxPublisher {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl Publisher for OutboxPublisher {
    async fn publish(&self, post: &ScheduledPost) -> Result<String, ToolError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(post)
            .map_err(|e| ToolError::fatal(format!("Failed to encode post: {}", e)))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(post.id.to_string())
    }
}

/// Schedules a post for one platform.
pub struct ContentSchedulingTool {
    settings: SchedulingSettings,
    publisher: Arc<dyn Publisher>,
}

impl ContentSchedulingTool {
    pub fn new(settings: SchedulingSettings, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            settings,
            publisher,
        }
    }
}

fn parse_publish_at(request: &ToolRequest) -> Result<Option<DateTime<Utc>>, ToolError> {
    request
        .get_str("publish_at")
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| ToolError::validation(format!("Invalid 'publish_at' '{}': {}", raw, e)))
        })
        .transpose()
}

#[async_trait]
impl Tool for ContentSchedulingTool {
    fn name(&self) -> &str {
        "content_scheduling"
    }

    fn description(&self) -> &str {
        "Schedule a post with a caption and media for a social platform"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(vec![
            ParamSpec::required("platform", ParamKind::String, "Target platform")
                .one_of(&self.settings.platforms),
            ParamSpec::required("caption", ParamKind::String, "Post caption"),
            ParamSpec::optional("media_path", ParamKind::String, "Media file to upload"),
            ParamSpec::optional("edl_path", ParamKind::String, "EDL describing the clips"),
            ParamSpec::optional("publish_at", ParamKind::String, "RFC 3339 publish time"),
        ])
    }

    fn validate(&self, request: &ToolRequest) -> Result<(), ToolError> {
        let caption = request.get_str("caption").unwrap_or_default();
        if caption.trim().is_empty() {
            return Err(ToolError::validation("Caption is empty"));
        }
        let chars = caption.chars().count();
        if chars > self.settings.max_caption_chars {
            return Err(ToolError::validation(format!(
                "Caption is {} characters, limit is {}",
                chars, self.settings.max_caption_chars
            )));
        }
        parse_publish_at(request)?;
        Ok(())
    }

    #[instrument(skip_all, fields(%tier))]
    async fn execute(
        &self,
        request: &ToolRequest,
        tier: QualityTier,
        _ctx: &ExecutionContext,
    ) -> Result<Value, ToolError> {
        let platform = request
            .get_str("platform")
            .ok_or_else(|| ToolError::validation("Missing 'platform'"))?
            .to_lowercase();
        let caption = request
            .get_str("caption")
            .ok_or_else(|| ToolError::validation("Missing 'caption'"))?;

        let post = ScheduledPost {
            id: Uuid::new_v4(),
            platform,
            caption: caption.trim().to_string(),
            media_path: request.get_str("media_path").map(str::to_string),
            edl_path: request.get_str("edl_path").map(str::to_string),
            publish_at: parse_publish_at(request)?,
            quality: tier,
            created_at: Utc::now(),
        };

        if request.dry_run() {
            return Ok(json!({ "dry_run": true, "post": post }));
        }

        let reference = self.publisher.publish(&post).await?;
        info!(platform = %post.platform, %reference, "Post scheduled");

        Ok(json!({
            "dry_run": false,
            "reference": reference,
            "post": post,
        }))
    }
}
