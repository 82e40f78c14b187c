use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::data::media_repository::MediaRepository;
use crate::domain::error::DomainError;
use crate::domain::media::{MediaRef, MediaSlot, MediaTarget, MediaUpload};
use crate::infrastructure::content_store::{ContentStore, StoreError};

/// Bundled image served for profiles without a picture of their own.
const PLACEHOLDER_IMAGE: &[u8] = include_bytes!("../../assets/default_profile.jpg");

/// Owns the lifecycle of uploaded files: store the new object, point the
/// record at it, then remove the object it used to point at.
#[derive(Clone)]
pub struct MediaService<M, S>
where
    M: MediaRepository + 'static,
    S: ContentStore + 'static,
{
    records: Arc<M>,
    store: Arc<S>,
}

impl<M, S> MediaService<M, S>
where
    M: MediaRepository + 'static,
    S: ContentStore + 'static,
{
    pub fn new(records: Arc<M>, store: Arc<S>) -> Self {
        Self { records, store }
    }

    /// Writes the bundled placeholder objects the store is missing. Objects
    /// already present are left alone so operators can swap in their own.
    pub async fn install_placeholders(&self) -> Result<(), DomainError> {
        for slot in [MediaSlot::ProfilePicture] {
            let Some(key) = slot.placeholder_key() else {
                continue;
            };
            let present = self.store.exists(key).await.map_err(|e| {
                DomainError::Internal(format!("failed to check placeholder {key}: {e}"))
            })?;
            if !present {
                self.store.put(key, PLACEHOLDER_IMAGE).await.map_err(|e| {
                    DomainError::Internal(format!("failed to install placeholder {key}: {e}"))
                })?;
                info!(key, "placeholder installed");
            }
        }
        Ok(())
    }

    /// Puts `upload` into the target slot, or resets the slot to its default
    /// when `upload` is `None`. Returns the reference now on record.
    #[instrument(skip(self, upload), fields(owner_id = %target.owner_id, slot = %target.slot))]
    pub async fn replace(
        &self,
        target: MediaTarget,
        upload: Option<MediaUpload>,
    ) -> Result<MediaRef, DomainError> {
        let previous = self.records.current(target).await?;

        let next = match upload {
            Some(upload) => {
                let ext = target.slot.validate(&upload)?;
                let key = target.slot.fresh_key(ext);
                self.store.put(&key, &upload.bytes).await.map_err(|e| {
                    DomainError::Internal(format!("failed to store {}: {}", target.slot, e))
                })?;
                let next = MediaRef::Stored(key);
                if let Err(e) = self.records.set(target, &next).await {
                    // the record still points at `previous`; drop the object nobody references
                    if let Some(key) = next.stored_key() {
                        self.discard(key).await;
                    }
                    return Err(e);
                }
                next
            }
            None => {
                let fallback = target.slot.fallback();
                if previous == fallback {
                    debug!("slot already at its default");
                    return Ok(previous);
                }
                self.records.set(target, &fallback).await?;
                fallback
            }
        };

        if let Some(old_key) = previous.stored_key() {
            if next.stored_key() != Some(old_key) {
                self.discard(old_key).await;
            }
        }

        info!(media = ?next, "media replaced");
        Ok(next)
    }

    /// Public URL for the reference. Falls back to the slot's placeholder
    /// when the object is gone or the store cannot be reached.
    pub async fn resolve_url(&self, slot: MediaSlot, media: &MediaRef) -> Option<String> {
        if let Some(key) = media.stored_key() {
            match self.store.exists(key).await {
                Ok(true) => return Some(self.store.url(key)),
                Ok(false) => debug!(key, "referenced object is missing"),
                Err(e) => warn!(key, error = %e, "failed to check stored object"),
            }
        }
        slot.placeholder_key().map(|key| self.store.url(key))
    }

    pub async fn resolve_target_url(&self, target: MediaTarget) -> Option<String> {
        let media = match self.records.current(target).await {
            Ok(media) => media,
            Err(e) => {
                warn!(error = %e, "failed to read media reference");
                target.slot.fallback()
            }
        };
        self.resolve_url(target.slot, &media).await
    }

    /// Removes objects whose records are already gone.
    pub async fn purge(&self, keys: &[String]) {
        for key in keys {
            self.discard(key).await;
        }
    }

    pub async fn open(&self, key: &str) -> Result<Vec<u8>, DomainError> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) | Err(StoreError::InvalidKey(_)) => {
                Err(DomainError::MediaNotFound(key.to_string()))
            }
            Err(e) => Err(DomainError::Internal(e.to_string())),
        }
    }

    async fn discard(&self, key: &str) {
        match self.store.delete(key).await {
            Ok(()) => debug!(key, "old object deleted"),
            Err(e) => warn!(key, error = %e, "failed to delete old object, leaving it orphaned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::DEFAULT_PROFILE_PICTURE;
    use crate::testing::{InMemoryContentStore, InMemoryMediaRepository};
    use uuid::Uuid;

    type Service = MediaService<InMemoryMediaRepository, InMemoryContentStore>;

    fn service() -> (Service, Arc<InMemoryMediaRepository>, Arc<InMemoryContentStore>) {
        let records = Arc::new(InMemoryMediaRepository::default());
        let store = Arc::new(InMemoryContentStore::default());
        (
            MediaService::new(Arc::clone(&records), Arc::clone(&store)),
            records,
            store,
        )
    }

    fn jpeg() -> MediaUpload {
        MediaUpload {
            bytes: b"\xff\xd8\xff".to_vec(),
            content_type: "image/jpeg".into(),
            file_name: Some("me.jpg".into()),
        }
    }

    #[tokio::test]
    async fn test_upload_replaces_and_deletes_old_object() {
        let (service, records, store) = service();
        let target = MediaTarget::profile_picture(Uuid::new_v4());

        let first = service.replace(target, Some(jpeg())).await.unwrap();
        let first_key = first.stored_key().unwrap().to_string();
        assert!(first_key.starts_with("profile_pics/"));
        assert!(store.contains(&first_key));

        let second = service.replace(target, Some(jpeg())).await.unwrap();
        let second_key = second.stored_key().unwrap().to_string();
        assert_ne!(first_key, second_key);
        assert!(store.contains(&second_key));
        assert!(!store.contains(&first_key));
        assert_eq!(records.get(target), second);
    }

    #[tokio::test]
    async fn test_first_upload_never_deletes_placeholder() {
        let (service, _records, store) = service();
        let target = MediaTarget::profile_picture(Uuid::new_v4());

        service.replace(target, Some(jpeg())).await.unwrap();
        assert_eq!(store.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_on_placeholder_is_noop() {
        let (service, records, store) = service();
        let target = MediaTarget::profile_picture(Uuid::new_v4());

        let result = service.replace(target, None).await.unwrap();
        assert_eq!(result, MediaRef::Placeholder);
        assert_eq!(store.delete_calls(), 0);
        assert_eq!(records.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_resets_to_fallback_and_deletes() {
        let (service, records, store) = service();
        let post_target = MediaTarget::post(Uuid::new_v4(), MediaSlot::PostAudio);
        let upload = MediaUpload {
            bytes: b"ID3".to_vec(),
            content_type: "audio/mpeg".into(),
            file_name: None,
        };

        let stored = service.replace(post_target, Some(upload)).await.unwrap();
        let key = stored.stored_key().unwrap().to_string();

        let cleared = service.replace(post_target, None).await.unwrap();
        assert_eq!(cleared, MediaRef::Empty);
        assert_eq!(records.get(post_target), MediaRef::Empty);
        assert!(!store.contains(&key));
    }

    #[tokio::test]
    async fn test_delete_failure_is_swallowed() {
        let (service, records, store) = service();
        let target = MediaTarget::profile_picture(Uuid::new_v4());
        let first = service.replace(target, Some(jpeg())).await.unwrap();

        store.fail_deletes(true);
        let second = service.replace(target, Some(jpeg())).await.unwrap();

        assert_eq!(records.get(target), second);
        // the orphan stays behind
        assert!(store.contains(first.stored_key().unwrap()));
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_old_reference() {
        let (service, records, store) = service();
        let target = MediaTarget::profile_picture(Uuid::new_v4());
        let first = service.replace(target, Some(jpeg())).await.unwrap();

        records.fail_next_set();
        let err = service.replace(target, Some(jpeg())).await;
        assert!(err.is_err());
        assert_eq!(records.get(target), first);
        assert!(store.contains(first.stored_key().unwrap()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_upload_stores_nothing() {
        let (service, records, store) = service();
        let target = MediaTarget::post(Uuid::new_v4(), MediaSlot::PostVideo);

        let err = service.replace(target, Some(jpeg())).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.len(), 0);
        assert_eq!(records.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_url_falls_back_when_object_missing() {
        let (service, _records, store) = service();
        let media = MediaRef::Stored("profile_pics/deleted.jpg".into());

        let url = service.resolve_url(MediaSlot::ProfilePicture, &media).await;
        assert_eq!(url, Some(store.url(DEFAULT_PROFILE_PICTURE)));

        let url = service.resolve_url(MediaSlot::PostImage, &media).await;
        assert_eq!(url, None);
    }

    #[tokio::test]
    async fn test_resolve_url_falls_back_on_store_error() {
        let (service, _records, store) = service();
        let target = MediaTarget::profile_picture(Uuid::new_v4());
        service.replace(target, Some(jpeg())).await.unwrap();

        store.fail_reads(true);
        assert_eq!(
            service.resolve_target_url(target).await,
            Some(store.url(DEFAULT_PROFILE_PICTURE))
        );
    }

    #[tokio::test]
    async fn test_resolve_url_for_present_object() {
        let (service, _records, store) = service();
        let target = MediaTarget::profile_picture(Uuid::new_v4());
        let media = service.replace(target, Some(jpeg())).await.unwrap();

        assert_eq!(
            service.resolve_target_url(target).await,
            Some(store.url(media.stored_key().unwrap()))
        );
    }

    #[tokio::test]
    async fn test_install_placeholders_makes_default_servable() {
        let (service, _records, store) = service();
        service.install_placeholders().await.unwrap();

        let bytes = service.open(DEFAULT_PROFILE_PICTURE).await.unwrap();
        assert!(bytes.starts_with(b"\xff\xd8"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_install_placeholders_keeps_existing_object() {
        let (service, _records, store) = service();
        store.put(DEFAULT_PROFILE_PICTURE, b"custom").await.unwrap();

        service.install_placeholders().await.unwrap();
        assert_eq!(service.open(DEFAULT_PROFILE_PICTURE).await.unwrap(), b"custom");
    }

    #[tokio::test]
    async fn test_open_missing_object() {
        let (service, _records, _store) = service();
        let err = service.open("blog_images/none.png").await.unwrap_err();
        assert!(matches!(err, DomainError::MediaNotFound(_)));
    }

    #[tokio::test]
    async fn test_purge_removes_all() {
        let (service, _records, store) = service();
        let a = MediaTarget::post(Uuid::new_v4(), MediaSlot::PostImage);
        let stored = service.replace(a, Some(jpeg())).await.unwrap();

        service
            .purge(&[stored.stored_key().unwrap().to_string()])
            .await;
        assert_eq!(store.len(), 0);
    }
}
