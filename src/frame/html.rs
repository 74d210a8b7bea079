//! Frame serialization back to HTML.

use std::fmt::Write;

use crate::frame::types::Frame;

/// Render `frame` as a minimal HTML document.
pub fn serialize(frame: &Frame) -> String {
    let mut out = String::from("<!DOCTYPE html>\n<html>\n<head>\n");

    meta(&mut out, "fc:frame", &frame.version);
    meta(&mut out, "fc:frame:image", &frame.image);
    meta(&mut out, "og:image", frame.og_image.as_deref().unwrap_or(&frame.image));
    meta(&mut out, "fc:frame:post_url", &frame.post_url);

    for (i, button) in frame.buttons.iter().enumerate() {
        let n = i + 1;
        meta(&mut out, &format!("fc:frame:button:{}", n), &button.label);
        meta(&mut out, &format!("fc:frame:button:{}:action", n), button.action.as_str());
        if let Some(target) = &button.target {
            meta(&mut out, &format!("fc:frame:button:{}:target", n), target);
        }
    }

    if let Some(text) = &frame.input_text {
        meta(&mut out, "fc:frame:input:text", text);
    }
    if let Some(ratio) = frame.image_aspect_ratio {
        meta(&mut out, "fc:frame:image:aspect_ratio", ratio.as_str());
    }
    if let Some(state) = &frame.state {
        meta(&mut out, "fc:frame:state", state);
    }

    out.push_str("</head>\n<body></body>\n</html>\n");
    out
}

/// Insert a script right after `<html>` that sends browsers to `origin_url`.
/// Frame clients ignore scripts, so only human visitors are redirected.
pub fn with_browser_redirect(html: &str, origin_url: &str) -> String {
    // serde_json gives a correctly quoted JS string literal.
    let literal = serde_json::to_string(origin_url)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/");
    let script = format!(
        "<script>if (typeof window !== \"undefined\") {{ window.location.replace({}); }}</script>",
        literal
    );
    html.replacen("<html>", &format!("<html>{}", script), 1)
}

fn meta(out: &mut String, property: &str, content: &str) {
    let _ = writeln!(
        out,
        "<meta property=\"{}\" content=\"{}\"/>",
        escape(property),
        escape(content)
    );
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
