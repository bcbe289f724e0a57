use serde::Serialize;

use crate::error::ErrorKind;
use crate::session::SessionState;

/// What the page shows for a given session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultView {
    Idle,
    Loading {
        message: &'static str,
        hint: &'static str,
    },
    Error {
        title: &'static str,
        kind: ErrorKind,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Success {
        photo_title: &'static str,
        image_src: String,
        poem_title: &'static str,
        poem: String,
    },
}

pub fn present(state: &SessionState) -> ResultView {
    match state {
        SessionState::Idle => ResultView::Idle,
        SessionState::Loading { .. } => ResultView::Loading {
            message: "Crafting your poem... please wait.",
            hint: "This may take a few moments.",
        },
        SessionState::Error(failure) => ResultView::Error {
            title: "An Error Occurred",
            kind: failure.kind,
            message: failure.message.clone(),
        },
        SessionState::Success(result) => ResultView::Success {
            photo_title: "Your Photo",
            image_src: result.image.as_str().to_string(),
            poem_title: "Generated Poem",
            poem: result.poem.clone(),
        },
    }
}
