//! Frame extraction from origin HTML.
//!
//! Only `<meta>` tags are inspected. The first occurrence of a property wins.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

use crate::frame::types::{ActionKind, AspectRatio, Button, Frame, MAX_BUTTONS};

static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").expect("valid meta regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

static BUTTON_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^fc:frame:button:(\d+)$").expect("valid button regex"));

/// Why a document is not a usable frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameParseError {
    #[error("missing required tag '{0}'")]
    MissingTag(&'static str),

    #[error("invalid button {index}: {reason}")]
    InvalidButton { index: usize, reason: String },

    #[error("invalid value for '{tag}': {value}")]
    InvalidValue { tag: &'static str, value: String },

    #[error("invalid base URL '{0}'")]
    InvalidBase(String),
}

/// Parse `html` fetched from `base_url` into a [`Frame`].
pub fn parse(html: &str, base_url: &str) -> Result<Frame, FrameParseError> {
    let base = Url::parse(base_url).map_err(|_| FrameParseError::InvalidBase(base_url.to_string()))?;
    let tags = collect_meta(html);

    let version = tags
        .get("fc:frame")
        .cloned()
        .ok_or(FrameParseError::MissingTag("fc:frame"))?;
    let image = tags
        .get("fc:frame:image")
        .cloned()
        .ok_or(FrameParseError::MissingTag("fc:frame:image"))?;

    let post_url = match tags.get("fc:frame:post_url") {
        Some(raw) => absolutize(&base, raw).ok_or_else(|| FrameParseError::InvalidValue {
            tag: "fc:frame:post_url",
            value: raw.clone(),
        })?,
        None => base.to_string(),
    };

    let image_aspect_ratio = match tags.get("fc:frame:image:aspect_ratio") {
        Some(raw) => Some(raw.parse::<AspectRatio>().map_err(|_| FrameParseError::InvalidValue {
            tag: "fc:frame:image:aspect_ratio",
            value: raw.clone(),
        })?),
        None => None,
    };

    Ok(Frame {
        version,
        image,
        og_image: tags.get("og:image").cloned(),
        post_url,
        buttons: parse_buttons(&tags, &base)?,
        input_text: tags.get("fc:frame:input:text").cloned(),
        image_aspect_ratio,
        state: tags.get("fc:frame:state").cloned(),
    })
}

fn parse_buttons(tags: &HashMap<String, String>, base: &Url) -> Result<Vec<Button>, FrameParseError> {
    let highest = tags
        .keys()
        .filter_map(|k| BUTTON_INDEX.captures(k))
        .filter_map(|c| c[1].parse::<usize>().ok())
        .max()
        .unwrap_or(0);

    if highest > MAX_BUTTONS {
        return Err(FrameParseError::InvalidButton {
            index: highest,
            reason: format!("at most {} buttons are allowed", MAX_BUTTONS),
        });
    }

    let mut buttons = Vec::with_capacity(highest);
    for index in 1..=highest {
        let label = tags
            .get(&format!("fc:frame:button:{}", index))
            .ok_or_else(|| FrameParseError::InvalidButton {
                index,
                reason: "buttons must be numbered without gaps".to_string(),
            })?;

        let action = match tags.get(&format!("fc:frame:button:{}:action", index)) {
            Some(raw) => raw
                .parse::<ActionKind>()
                .map_err(|reason| FrameParseError::InvalidButton { index, reason })?,
            None => ActionKind::Post,
        };

        let target = match tags.get(&format!("fc:frame:button:{}:target", index)) {
            Some(raw) if action.is_pass_through() => Some(raw.clone()),
            Some(raw) => Some(absolutize(base, raw).ok_or_else(|| FrameParseError::InvalidButton {
                index,
                reason: format!("invalid target '{}'", raw),
            })?),
            None if action.requires_target() => {
                return Err(FrameParseError::InvalidButton {
                    index,
                    reason: format!("'{}' requires a target", action),
                })
            }
            None => None,
        };

        buttons.push(Button {
            label: label.clone(),
            action,
            target,
        });
    }
    Ok(buttons)
}

fn collect_meta(html: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    for tag in META_TAG.captures_iter(html) {
        let mut key = None;
        let mut content = None;
        for attr in ATTRIBUTE.captures_iter(&tag[1]) {
            let value = attr.get(2).or_else(|| attr.get(3)).map(|m| m.as_str()).unwrap_or("");
            match attr[1].to_ascii_lowercase().as_str() {
                "property" | "name" if key.is_none() => key = Some(value.to_string()),
                "content" => content = Some(decode_entities(value)),
                _ => {}
            }
        }
        if let (Some(key), Some(content)) = (key, content) {
            tags.entry(key).or_insert(content);
        }
    }
    tags
}

fn absolutize(base: &Url, raw: &str) -> Option<String> {
    let url = base.join(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/frame";

    fn doc(tags: &str) -> String {
        format!("<!DOCTYPE html><html><head>{}</head><body></body></html>", tags)
    }

    #[test]
    fn test_parse_full_frame() {
        let html = doc(r#"
            <meta property="fc:frame" content="vNext" />
            <meta property="fc:frame:image" content="https://example.com/img.png">
            <meta property="og:image" content="https://example.com/og.png">
            <meta property="fc:frame:post_url" content="/api/post?step=1&amp;x=2">
            <meta property="fc:frame:button:1" content="Yes">
            <meta property="fc:frame:button:2" content="Docs">
            <meta property="fc:frame:button:2:action" content="link">
            <meta property="fc:frame:button:2:target" content="https://docs.example.com">
            <meta property="fc:frame:input:text" content="Say something">
            <meta property="fc:frame:image:aspect_ratio" content="1:1">
        "#);

        let frame = parse(&html, BASE).unwrap();
        assert_eq!(frame.version, "vNext");
        assert_eq!(frame.image, "https://example.com/img.png");
        assert_eq!(frame.og_image.as_deref(), Some("https://example.com/og.png"));
        assert_eq!(frame.post_url, "https://example.com/api/post?step=1&x=2");
        assert_eq!(frame.buttons.len(), 2);
        assert_eq!(frame.buttons[0], Button::new("Yes", ActionKind::Post, None));
        assert_eq!(frame.buttons[1].action, ActionKind::Link);
        assert_eq!(frame.buttons[1].target.as_deref(), Some("https://docs.example.com"));
        assert_eq!(frame.input_text.as_deref(), Some("Say something"));
        assert_eq!(frame.image_aspect_ratio, Some(AspectRatio::Square));
    }

    #[test]
    fn test_post_url_defaults_to_base() {
        let html = doc(r#"<meta name="fc:frame" content="vNext"><meta name='fc:frame:image' content='https://i.png/a'>"#);
        let frame = parse(&html, BASE).unwrap();
        assert_eq!(frame.post_url, BASE);
        assert!(frame.buttons.is_empty());
    }

    #[test]
    fn test_missing_required_tags() {
        assert_eq!(
            parse(&doc(r#"<meta property="fc:frame:image" content="x">"#), BASE),
            Err(FrameParseError::MissingTag("fc:frame"))
        );
        assert_eq!(
            parse(&doc(r#"<meta property="fc:frame" content="vNext">"#), BASE),
            Err(FrameParseError::MissingTag("fc:frame:image"))
        );
        assert!(parse("<html>plain page</html>", BASE).is_err());
    }

    #[test]
    fn test_rejects_button_gaps_and_overflow() {
        let gap = doc(r#"
            <meta property="fc:frame" content="vNext">
            <meta property="fc:frame:image" content="https://i.png/a">
            <meta property="fc:frame:button:1" content="A">
            <meta property="fc:frame:button:3" content="C">
        "#);
        assert!(matches!(parse(&gap, BASE), Err(FrameParseError::InvalidButton { index: 2, .. })));

        let overflow = doc(r#"
            <meta property="fc:frame" content="vNext">
            <meta property="fc:frame:image" content="https://i.png/a">
            <meta property="fc:frame:button:5" content="E">
        "#);
        assert!(matches!(parse(&overflow, BASE), Err(FrameParseError::InvalidButton { index: 5, .. })));
    }

    #[test]
    fn test_link_requires_target() {
        let html = doc(r#"
            <meta property="fc:frame" content="vNext">
            <meta property="fc:frame:image" content="https://i.png/a">
            <meta property="fc:frame:button:1" content="Go">
            <meta property="fc:frame:button:1:action" content="link">
        "#);
        assert!(matches!(parse(&html, BASE), Err(FrameParseError::InvalidButton { index: 1, .. })));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let html = doc(r#"
            <meta property="fc:frame" content="vNext">
            <meta property="fc:frame:image" content="https://first.png/a">
            <meta property="fc:frame:image" content="https://second.png/a">
        "#);
        assert_eq!(parse(&html, BASE).unwrap().image, "https://first.png/a");
    }
}
