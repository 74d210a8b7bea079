//! Rewrites a frame's actionable URLs into proxy URLs.

use url::Url;

use crate::frame::Frame;
use crate::rewrite::scheme::ProxyRoute;
use crate::store::{IdentifierStore, StoreResult};

/// Wraps frame links so later interactions come back through the proxy.
#[derive(Clone)]
pub struct LinkRewriter {
    ids: IdentifierStore,
    public_url: Url,
}

impl LinkRewriter {
    pub fn new(ids: IdentifierStore, public_url: Url) -> Self {
        Self { ids, public_url }
    }

    /// Return a copy of `frame` whose post URL and non-pass-through button
    /// targets point at the proxy within `context_id`.
    pub async fn rewrite(&self, frame: &Frame, context_id: &str) -> StoreResult<Frame> {
        let post_url = self.wrap_url(context_id, &frame.post_url).await?;
        self.rewrite_buttons(frame, context_id, post_url).await
    }

    /// Like [`rewrite`](Self::rewrite), but the post URL gets an id of its
    /// own. Its query is the first-frame marker, so no later frame may share it.
    pub async fn rewrite_entry(&self, frame: &Frame, context_id: &str) -> StoreResult<Frame> {
        let target_id = self.ids.create(&frame.post_url).await?;
        let post_url = ProxyRoute::hop(context_id, target_id).to_url(&self.public_url).to_string();
        self.rewrite_buttons(frame, context_id, post_url).await
    }

    async fn rewrite_buttons(&self, frame: &Frame, context_id: &str, post_url: String) -> StoreResult<Frame> {
        let mut wrapped = frame.clone();
        wrapped.post_url = post_url;

        for button in wrapped.buttons.iter_mut() {
            if button.action.is_pass_through() {
                continue;
            }
            if let Some(target) = button.target.take() {
                button.target = Some(self.wrap_url(context_id, &target).await?);
            }
        }
        Ok(wrapped)
    }

    /// Proxy URL that forwards to `target` on behalf of `context_id`.
    pub async fn wrap_url(&self, context_id: &str, target: &str) -> StoreResult<String> {
        let target_id = self.ids.id_for_url(target).await?;
        Ok(ProxyRoute::hop(context_id, target_id).to_url(&self.public_url).to_string())
    }

    /// Proxy URL serving the entry document of `context_id`.
    pub fn entry_url(&self, context_id: &str) -> String {
        ProxyRoute::entry(context_id).to_url(&self.public_url).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ActionKind, Button};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn rewriter() -> (LinkRewriter, IdentifierStore) {
        let ids = IdentifierStore::new(Arc::new(MemoryStore::new(None)));
        let public = Url::parse("https://proxy.example.com").unwrap();
        (LinkRewriter::new(ids.clone(), public), ids)
    }

    fn frame() -> Frame {
        Frame {
            version: "vNext".into(),
            image: "https://example.com/img.png".into(),
            og_image: None,
            post_url: "https://example.com/api/post".into(),
            buttons: vec![
                Button::new("Next", ActionKind::Post, None),
                Button::new("Go", ActionKind::PostRedirect, Some("https://example.com/redirect".into())),
                Button::new("Docs", ActionKind::Link, Some("https://docs.example.com".into())),
                Button::new("Pay", ActionKind::Tx, Some("https://example.com/tx".into())),
            ],
            input_text: None,
            image_aspect_ratio: None,
            state: None,
        }
    }

    async fn resolve(ids: &IdentifierStore, proxied: &str) -> (String, String) {
        let url = Url::parse(proxied).unwrap();
        assert_eq!(url.host_str(), Some("proxy.example.com"));
        let route = ProxyRoute::from_query(url.query()).unwrap();
        let target = ids.resolve(route.require_target().unwrap()).await.unwrap().unwrap();
        (route.context_id, target)
    }

    #[tokio::test]
    async fn test_rewritten_urls_resolve_to_original_targets() {
        let (rewriter, ids) = rewriter();
        let original = frame();
        let wrapped = rewriter.rewrite(&original, "abc123").await.unwrap();

        assert_eq!(
            resolve(&ids, &wrapped.post_url).await,
            ("abc123".to_string(), original.post_url.clone())
        );
        for i in [1usize, 3] {
            let proxied = wrapped.buttons[i].target.as_deref().unwrap();
            assert_eq!(
                resolve(&ids, proxied).await,
                ("abc123".to_string(), original.buttons[i].target.clone().unwrap())
            );
        }
    }

    #[tokio::test]
    async fn test_pass_through_and_input_untouched() {
        let (rewriter, _) = rewriter();
        let original = frame();
        let wrapped = rewriter.rewrite(&original, "abc123").await.unwrap();

        assert_eq!(wrapped.buttons[0].target, None);
        assert_eq!(wrapped.buttons[2], original.buttons[2]);
        // Input frame is not mutated.
        assert_eq!(original, frame());
        assert_eq!(wrapped.buttons.len(), original.buttons.len());
        assert_eq!(wrapped.image, original.image);
    }

    #[tokio::test]
    async fn test_entry_post_url_is_unique() {
        let (rewriter, ids) = rewriter();
        let original = frame();
        let hop = rewriter.rewrite(&original, "abc123").await.unwrap();
        let entry = rewriter.rewrite_entry(&original, "abc123").await.unwrap();

        assert_ne!(entry.post_url, hop.post_url);
        assert_eq!(
            resolve(&ids, &entry.post_url).await,
            ("abc123".to_string(), original.post_url.clone())
        );
        // Button targets still share ids with later frames.
        assert_eq!(entry.buttons[1].target, hop.buttons[1].target);
    }

    #[tokio::test]
    async fn test_same_target_reuses_id() {
        let (rewriter, _) = rewriter();
        let a = rewriter.wrap_url("abc123", "https://example.com/api/post").await.unwrap();
        let b = rewriter.wrap_url("abc123", "https://example.com/api/post").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(rewriter.entry_url("abc123"), "https://proxy.example.com/a?v=1&r=abc123");
    }
}
