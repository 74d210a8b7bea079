//! Frame document model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of buttons a frame may carry.
pub const MAX_BUTTONS: usize = 4;

/// What pressing a button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[default]
    Post,
    PostRedirect,
    Link,
    Mint,
    Tx,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Post => "post",
            ActionKind::PostRedirect => "post_redirect",
            ActionKind::Link => "link",
            ActionKind::Mint => "mint",
            ActionKind::Tx => "tx",
        }
    }

    /// Targets of these kinds are opened by the client directly and are
    /// never routed through the proxy.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, ActionKind::Link | ActionKind::Mint)
    }

    /// Kinds that cannot work without an explicit target.
    pub fn requires_target(&self) -> bool {
        matches!(self, ActionKind::Link | ActionKind::Mint | ActionKind::Tx)
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ActionKind::Post),
            "post_redirect" => Ok(ActionKind::PostRedirect),
            "link" => Ok(ActionKind::Link),
            "mint" => Ok(ActionKind::Mint),
            "tx" => Ok(ActionKind::Tx),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single frame button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    #[serde(default)]
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Button {
    pub fn new(label: impl Into<String>, action: ActionKind, target: Option<String>) -> Self {
        Self {
            label: label.into(),
            action,
            target,
        }
    }
}

/// Supported image aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Wide,
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "1.91:1",
            AspectRatio::Square => "1:1",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.91:1" => Ok(AspectRatio::Wide),
            "1:1" => Ok(AspectRatio::Square),
            _ => Err(()),
        }
    }
}

/// An interactive frame document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: String,
    pub image: String,
    pub og_image: Option<String>,
    /// Absolute URL that receives button actions without their own target.
    pub post_url: String,
    pub buttons: Vec<Button>,
    pub input_text: Option<String>,
    pub image_aspect_ratio: Option<AspectRatio>,
    pub state: Option<String>,
}

impl Frame {
    /// Button for a 1-based wire index.
    pub fn button_at(&self, index: u32) -> Option<&Button> {
        button_for_index(&self.buttons, index)
    }
}

/// Convert a 1-based wire index to a button in `buttons`.
pub fn button_for_index(buttons: &[Button], index: u32) -> Option<&Button> {
    let position = (index as usize).checked_sub(1)?;
    buttons.get(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_index_is_one_based() {
        let buttons = vec![
            Button::new("Yes", ActionKind::Post, None),
            Button::new("No", ActionKind::Post, None),
        ];
        assert!(button_for_index(&buttons, 0).is_none());
        assert_eq!(button_for_index(&buttons, 1).unwrap().label, "Yes");
        assert_eq!(button_for_index(&buttons, 2).unwrap().label, "No");
        assert!(button_for_index(&buttons, 3).is_none());
    }

    #[test]
    fn test_button_snapshot_json_defaults() {
        let buttons: Vec<Button> =
            serde_json::from_str(r#"[{"label":"Yes"},{"label":"Go","action":"link","target":"https://x.io"}]"#)
                .unwrap();
        assert_eq!(buttons[0].action, ActionKind::Post);
        assert!(buttons[0].target.is_none());
        assert_eq!(buttons[1].action, ActionKind::Link);

        let json = serde_json::to_string(&buttons[0]).unwrap();
        assert_eq!(json, r#"{"label":"Yes","action":"post"}"#);
    }

    #[test]
    fn test_pass_through_kinds() {
        assert!(ActionKind::Link.is_pass_through());
        assert!(ActionKind::Mint.is_pass_through());
        assert!(!ActionKind::Post.is_pass_through());
        assert!(!ActionKind::PostRedirect.is_pass_through());
        assert!(!ActionKind::Tx.is_pass_through());
        assert_eq!("post_redirect".parse::<ActionKind>(), Ok(ActionKind::PostRedirect));
        assert!("teleport".parse::<ActionKind>().is_err());
    }
}
