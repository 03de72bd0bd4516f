use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ErrorKind;
use crate::source::ImageSource;
use crate::upload::{Progress, UploadOutcome, Uploader};

/// Where a scan takes its image from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Camera,
    Gallery,
}

/// Screen-level state for one user: owns the "upload in flight" flag.
///
/// The uploader itself does not serialize calls; callers go through
/// [`Session::begin_upload`] so a second trigger is rejected while the first
/// is pending.
#[derive(Debug, Clone, Default)]
pub struct Session {
    loading: Arc<AtomicBool>,
}

/// Clears the session's loading flag when dropped.
#[derive(Debug)]
pub struct UploadGuard {
    loading: Arc<AtomicBool>,
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::Release);
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn begin_upload(&self) -> Result<UploadGuard, ErrorKind> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ErrorKind::Busy)?;
        Ok(UploadGuard {
            loading: self.loading.clone(),
        })
    }

    /// Acquires an image and uploads it.
    ///
    /// The session is marked busy before the source is opened, so a second
    /// trigger while an upload is pending never reaches the camera or
    /// gallery. A cancelled or refused acquisition returns before the
    /// uploader is touched.
    pub async fn scan(
        &self,
        source: &dyn ImageSource,
        acquire: Acquire,
        uploader: &Uploader,
        progress: &Progress,
    ) -> UploadOutcome {
        let _guard = match self.begin_upload() {
            Ok(guard) => guard,
            Err(kind) => return UploadOutcome::failure(kind, "upload already in progress"),
        };

        let image = match acquire {
            Acquire::Camera => source.capture_from_camera().await,
            Acquire::Gallery => source.pick_from_gallery().await,
        };
        let image = match image {
            Ok(image) => image,
            Err(kind) => {
                debug!(?acquire, %kind, "no image acquired");
                return UploadOutcome::failure(kind, "image acquisition ended without an image");
            }
        };

        info!(path = %image.path().display(), "image acquired");
        uploader.upload(Some(image), progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageRef;
    use async_trait::async_trait;
    use mockito::Server;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use url::Url;

    struct FixedSource(Result<ImageRef, ErrorKind>);

    #[async_trait]
    impl ImageSource for FixedSource {
        async fn capture_from_camera(&self) -> Result<ImageRef, ErrorKind> {
            self.0.clone()
        }

        async fn pick_from_gallery(&self) -> Result<ImageRef, ErrorKind> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct CountingSource {
        acquisitions: AtomicUsize,
    }

    #[async_trait]
    impl ImageSource for CountingSource {
        async fn capture_from_camera(&self) -> Result<ImageRef, ErrorKind> {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            Ok(ImageRef::from_path("/tmp/photo.jpg"))
        }

        async fn pick_from_gallery(&self) -> Result<ImageRef, ErrorKind> {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            Ok(ImageRef::from_path("/tmp/photo.jpg"))
        }
    }

    #[test]
    fn second_upload_is_rejected_while_first_is_pending() {
        let session = Session::new();
        let guard = session.begin_upload().unwrap();
        assert!(session.is_loading());
        assert_eq!(session.begin_upload().unwrap_err(), ErrorKind::Busy);

        drop(guard);
        assert!(!session.is_loading());
        assert!(session.begin_upload().is_ok());
    }

    #[tokio::test]
    async fn cancelled_pick_never_uploads() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;
        let endpoint = Url::parse(&format!("{}/api/v1/process-image", server.url())).unwrap();
        let uploader = Uploader::new(endpoint, Duration::from_secs(5)).unwrap();

        let session = Session::new();
        let outcome = session
            .scan(
                &FixedSource(Err(ErrorKind::Cancelled)),
                Acquire::Gallery,
                &uploader,
                &Progress::silent(),
            )
            .await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Cancelled));
        assert!(!session.is_loading());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn busy_session_rejects_scan() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;
        let endpoint = Url::parse(&format!("{}/api/v1/process-image", server.url())).unwrap();
        let uploader = Uploader::new(endpoint, Duration::from_secs(5)).unwrap();

        let session = Session::new();
        let _pending = session.begin_upload().unwrap();
        let outcome = session
            .scan(
                &FixedSource(Ok(ImageRef::from_path("/tmp/photo.jpg"))),
                Acquire::Camera,
                &uploader,
                &Progress::silent(),
            )
            .await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Busy));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn busy_session_never_opens_the_source() {
        let endpoint = Url::parse("http://127.0.0.1:9/api/v1/process-image").unwrap();
        let uploader = Uploader::new(endpoint, Duration::from_secs(5)).unwrap();
        let source = CountingSource::default();

        let session = Session::new();
        let _pending = session.begin_upload().unwrap();
        for acquire in [Acquire::Camera, Acquire::Gallery] {
            let outcome = session
                .scan(&source, acquire, &uploader, &Progress::silent())
                .await;
            assert_eq!(outcome.error_kind(), Some(ErrorKind::Busy));
        }
        assert_eq!(source.acquisitions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_scan_releases_the_session() {
        let endpoint = Url::parse("http://127.0.0.1:9/api/v1/process-image").unwrap();
        let uploader = Uploader::new(endpoint, Duration::from_secs(5)).unwrap();

        let session = Session::new();
        session
            .scan(
                &FixedSource(Err(ErrorKind::Cancelled)),
                Acquire::Camera,
                &uploader,
                &Progress::silent(),
            )
            .await;
        assert!(session.begin_upload().is_ok());
    }

    #[tokio::test]
    async fn flag_clears_after_upload() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/process-image")
            .with_status(200)
            .with_body(r#"{"complex_words": {"ephemeral": "short-lived"}}"#)
            .create_async()
            .await;
        let endpoint = Url::parse(&format!("{}/api/v1/process-image", server.url())).unwrap();
        let uploader = Uploader::new(endpoint, Duration::from_secs(5)).unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"jpeg").unwrap();

        let session = Session::new();
        let outcome = session
            .scan(
                &FixedSource(Ok(ImageRef::from_path(file.path()))),
                Acquire::Gallery,
                &uploader,
                &Progress::silent(),
            )
            .await;

        assert!(matches!(outcome, UploadOutcome::Success(_)));
        assert!(!session.is_loading());
    }
}
