//! Analytics event definitions.

use serde::Serialize;
use serde_json::{Map, Value};

pub const FRAME_CLICK: &str = "frame_click";
pub const LINK_CLICK: &str = "frame_click_link";
pub const IDENTIFY: &str = "$identify";

/// Ingestion region recorded for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    Us,
    #[default]
    Eu,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
        }
    }

    /// Anything other than `us` is served from the EU endpoint.
    pub fn from_stored(value: &str) -> Self {
        if value.eq_ignore_ascii_case("us") {
            Region::Us
        } else {
            Region::Eu
        }
    }
}

/// A single user interaction with a proxied frame.
#[derive(Debug, Clone)]
pub struct Interaction<'a> {
    pub fid: u64,
    pub cast_hash: &'a str,
    pub button_index: u32,
    pub button_label: Option<&'a str>,
    /// Destination the action was forwarded to.
    pub post_url: &'a str,
    /// Origin frame URL of the context.
    pub og_post_url: &'a str,
    pub input_text: Option<&'a str>,
}

/// An event ready to be captured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event: String,
    pub distinct_id: String,
    pub properties: Map<String, Value>,
}

impl Event {
    /// A button press answered with a new frame.
    pub fn frame_click(interaction: &Interaction<'_>) -> Self {
        Self {
            event: FRAME_CLICK.to_string(),
            distinct_id: interaction.fid.to_string(),
            properties: interaction_properties(interaction),
        }
    }

    /// A button press answered with a redirect to `link`.
    pub fn link_click(interaction: &Interaction<'_>, link: &str) -> Self {
        let mut properties = interaction_properties(interaction);
        properties.insert("link".into(), Value::from(link));
        Self {
            event: LINK_CLICK.to_string(),
            distinct_id: interaction.fid.to_string(),
            properties,
        }
    }

    /// Attach `traits` to the user profile of `fid`.
    pub fn identify(fid: u64, traits: Map<String, Value>) -> Self {
        let mut properties = Map::new();
        properties.insert("$set".into(), Value::Object(traits));
        Self {
            event: IDENTIFY.to_string(),
            distinct_id: fid.to_string(),
            properties,
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Public conversation URL of a cast.
pub fn cast_url(cast_hash: &str) -> String {
    format!("https://warpcast.com/~/conversations/{}", cast_hash)
}

fn interaction_properties(interaction: &Interaction<'_>) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("castHash".into(), Value::from(interaction.cast_hash));
    properties.insert("castUrl".into(), Value::from(cast_url(interaction.cast_hash)));
    properties.insert("buttonIndex".into(), Value::from(interaction.button_index.to_string()));
    if let Some(label) = interaction.button_label {
        properties.insert("buttonLabel".into(), Value::from(label));
    }
    properties.insert("postUrl".into(), Value::from(interaction.post_url));
    properties.insert("ogPostUrl".into(), Value::from(interaction.og_post_url));
    if let Some(text) = interaction.input_text {
        properties.insert("inputText".into(), Value::from(text));
    }
    properties
}
