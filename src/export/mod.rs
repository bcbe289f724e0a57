//! Save and share conveniences over a finished poem.
//!
//! Downloads are built here and served as attachments. Sharing and copying
//! happen on the user's device, so this module only plans them: it decides
//! the order of attempts and every message the user can end up seeing.
//! None of this touches the session.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::session::PoemSuccess;

pub const POEM_FILE_NAME: &str = "poem.txt";
pub const SHARE_TITLE: &str = "PoemSnap Creation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Partial,
    Failure,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    fn new(level: NotificationLevel, title: &str, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.to_string(),
            description: description.into(),
        }
    }
}

/// A file ready to be handed to the browser as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub notification: Notification,
}

pub fn export_poem_as_text(result: &PoemSuccess) -> Download {
    Download {
        file_name: POEM_FILE_NAME.to_string(),
        content_type: "text/plain; charset=utf-8".to_string(),
        bytes: result.poem.as_bytes().to_vec(),
        notification: Notification::new(
            NotificationLevel::Success,
            "Poem Saved",
            format!("The poem has been downloaded as {POEM_FILE_NAME}."),
        ),
    }
}

pub fn export_image(result: &PoemSuccess) -> Result<Download, ExportError> {
    let bytes = result.image.decode_bytes()?;
    let file_name = format!("photo.{}", result.image.file_extension());
    Ok(Download {
        notification: Notification::new(
            NotificationLevel::Success,
            "Image Saved",
            format!("The image has been downloaded as {file_name}."),
        ),
        file_name,
        content_type: result.image.mime_type().to_string(),
        bytes,
    })
}

pub fn export_failed(err: &ExportError) -> Notification {
    Notification::new(NotificationLevel::Failure, "Save Failed", err.to_string())
}

pub fn share_text(poem: &str) -> String {
    format!("Check out this poem I generated with PoemSnap!\n\n{poem}")
}

/// What the user's browser reports it can do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCapabilities {
    #[serde(default)]
    pub share: bool,
    #[serde(default)]
    pub share_files: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareMethod {
    TextAndImage,
    TextOnly,
    Clipboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareStep {
    pub method: ShareMethod,
    pub on_success: Notification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareImage {
    pub name: String,
    pub mime_type: String,
    pub url: String,
}

/// Steps are tried in order until one succeeds; `on_failure` is shown when
/// all of them fail. The last step is always the clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePlan {
    pub title: String,
    pub text: String,
    pub poem: String,
    pub image: Option<ShareImage>,
    pub steps: Vec<ShareStep>,
    pub on_failure: Notification,
}

/// Plans a share of poem and photo that degrades to text only and then to
/// the clipboard. `image_url` is where the browser can fetch the photo.
pub fn plan_share(result: &PoemSuccess, capabilities: ShareCapabilities, image_url: &str) -> SharePlan {
    let mut plan = plan_copy(result);

    if capabilities.share {
        let step = if capabilities.share_files {
            plan.image = Some(ShareImage {
                name: format!("poem_snap_image.{}", result.image.file_extension()),
                mime_type: result.image.mime_type().to_string(),
                url: image_url.to_string(),
            });
            ShareStep {
                method: ShareMethod::TextAndImage,
                on_success: Notification::new(
                    NotificationLevel::Success,
                    "Shared!",
                    "Your creation has been shared.",
                ),
            }
        } else {
            ShareStep {
                method: ShareMethod::TextOnly,
                on_success: Notification::new(
                    NotificationLevel::Partial,
                    "Shared!",
                    "Poem text shared. Image sharing not fully supported on this browser/app.",
                ),
            }
        };
        plan.steps.insert(0, step);
    }

    plan
}

/// A plan with the clipboard as its only step.
pub fn plan_copy(result: &PoemSuccess) -> SharePlan {
    SharePlan {
        title: SHARE_TITLE.to_string(),
        text: share_text(&result.poem),
        poem: result.poem.clone(),
        image: None,
        steps: vec![ShareStep {
            method: ShareMethod::Clipboard,
            on_success: Notification::new(
                NotificationLevel::Success,
                "Poem Copied",
                "The poem has been copied to your clipboard.",
            ),
        }],
        on_failure: Notification::new(
            NotificationLevel::Failure,
            "Copy Failed",
            "Could not copy poem to clipboard.",
        ),
    }
}
