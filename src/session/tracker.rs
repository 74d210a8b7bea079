//! Button snapshots for click attribution.
//!
//! Key layout:
//! - `{context}:{user}` → buttons last served to `user` within `context`
//! - `{context}:buttons` → buttons of the context's entry document
//! - `{context}:first` → query of the entry document's proxied post URL

use std::sync::Arc;

use crate::frame::{button_for_index, Button};
use crate::store::{KvStore, StoreResult};

/// Remembers which buttons each user was shown.
#[derive(Clone)]
pub struct ButtonTracker {
    store: Arc<dyn KvStore>,
}

impl ButtonTracker {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Record the buttons just served to `user_id`.
    pub async fn record(&self, context_id: &str, user_id: u64, buttons: &[Button]) -> StoreResult<()> {
        self.put_snapshot(&user_key(context_id, user_id), buttons).await
    }

    /// Record the entry document's buttons, used before any per-user snapshot exists.
    pub async fn record_entry(&self, context_id: &str, buttons: &[Button]) -> StoreResult<()> {
        self.put_snapshot(&entry_key(context_id), buttons).await
    }

    /// Buttons last shown to `user_id`, else the entry buttons, else `None`.
    pub async fn lookup(&self, context_id: &str, user_id: u64) -> StoreResult<Option<Vec<Button>>> {
        for key in [user_key(context_id, user_id), entry_key(context_id)] {
            if let Some(buttons) = self.get_snapshot(&key).await? {
                return Ok(Some(buttons));
            }
        }
        Ok(None)
    }

    /// Label of the button at 1-based `index` in the user's last snapshot.
    pub async fn pressed_label(
        &self,
        context_id: &str,
        user_id: u64,
        index: u32,
    ) -> StoreResult<Option<String>> {
        let buttons = self.lookup(context_id, user_id).await?;
        Ok(buttons.and_then(|b| button_for_index(&b, index).map(|button| button.label.clone())))
    }

    /// Forget the user's snapshot; the next lookup falls back to the entry buttons.
    pub async fn reset(&self, context_id: &str, user_id: u64) -> StoreResult<()> {
        self.store.delete(&user_key(context_id, user_id)).await
    }

    /// Store the marker identifying requests for the entry document's post URL.
    pub async fn set_first_frame_marker(&self, context_id: &str, marker: &str) -> StoreResult<()> {
        self.store.put(&first_key(context_id), marker).await
    }

    pub async fn first_frame_marker(&self, context_id: &str) -> StoreResult<Option<String>> {
        self.store.get(&first_key(context_id)).await
    }

    async fn put_snapshot(&self, key: &str, buttons: &[Button]) -> StoreResult<()> {
        let json = serde_json::to_string(buttons).map_err(|e| crate::store::StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.store.put(key, &json).await
    }

    async fn get_snapshot(&self, key: &str) -> StoreResult<Option<Vec<Button>>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(buttons) => Ok(Some(buttons)),
            Err(e) => {
                // An unreadable snapshot only costs the label.
                tracing::warn!(key = %key, error = %e, "Ignoring unreadable button snapshot");
                Ok(None)
            }
        }
    }
}

fn user_key(context_id: &str, user_id: u64) -> String {
    format!("{}:{}", context_id, user_id)
}

fn entry_key(context_id: &str) -> String {
    format!("{}:buttons", context_id)
}

fn first_key(context_id: &str) -> String {
    format!("{}:first", context_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ActionKind;
    use crate::store::MemoryStore;

    fn tracker() -> (ButtonTracker, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(None));
        (ButtonTracker::new(store.clone()), store)
    }

    fn buttons(labels: &[&str]) -> Vec<Button> {
        labels.iter().map(|l| Button::new(*l, ActionKind::Post, None)).collect()
    }

    #[tokio::test]
    async fn test_lookup_prefers_user_then_entry() {
        let (tracker, _) = tracker();
        assert!(tracker.lookup("C", 7).await.unwrap().is_none());

        tracker.record_entry("C", &buttons(&["Start"])).await.unwrap();
        assert_eq!(tracker.lookup("C", 7).await.unwrap(), Some(buttons(&["Start"])));

        tracker.record("C", 7, &buttons(&["Yes", "No"])).await.unwrap();
        assert_eq!(tracker.lookup("C", 7).await.unwrap(), Some(buttons(&["Yes", "No"])));
        // Other users still see the entry snapshot.
        assert_eq!(tracker.lookup("C", 8).await.unwrap(), Some(buttons(&["Start"])));
    }

    #[tokio::test]
    async fn test_pressed_label_is_one_based() {
        let (tracker, store) = tracker();
        store.put("C:42", r#"[{"label":"Yes"},{"label":"No"}]"#).await.unwrap();

        assert_eq!(tracker.pressed_label("C", 42, 2).await.unwrap().as_deref(), Some("No"));
        assert_eq!(tracker.pressed_label("C", 42, 1).await.unwrap().as_deref(), Some("Yes"));
        assert_eq!(tracker.pressed_label("C", 42, 3).await.unwrap(), None);
        assert_eq!(tracker.pressed_label("C", 42, 0).await.unwrap(), None);
        assert_eq!(tracker.pressed_label("D", 42, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reset_falls_back_to_entry() {
        let (tracker, _) = tracker();
        tracker.record_entry("C", &buttons(&["Start"])).await.unwrap();
        tracker.record("C", 7, &buttons(&["Again"])).await.unwrap();

        tracker.reset("C", 7).await.unwrap();
        assert_eq!(tracker.lookup("C", 7).await.unwrap(), Some(buttons(&["Start"])));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_degrades() {
        let (tracker, store) = tracker();
        store.put("C:7", "{not json").await.unwrap();
        tracker.record_entry("C", &buttons(&["Start"])).await.unwrap();
        assert_eq!(tracker.lookup("C", 7).await.unwrap(), Some(buttons(&["Start"])));
    }

    #[tokio::test]
    async fn test_first_frame_marker() {
        let (tracker, _) = tracker();
        assert!(tracker.first_frame_marker("C").await.unwrap().is_none());
        tracker.set_first_frame_marker("C", "v=1&r=C&n=abc").await.unwrap();
        assert_eq!(
            tracker.first_frame_marker("C").await.unwrap().as_deref(),
            Some("v=1&r=C&n=abc")
        );
    }
}
