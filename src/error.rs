/// Every way an acquire-and-upload attempt can end without a result.
///
/// `Cancelled` is listed here so callers can match on a single type, but it
/// is not an error: it never produces a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("permission denied")]
    PermissionDenied,
    #[error("cancelled by user")]
    Cancelled,
    #[error("no image to upload")]
    NoImage,
    #[error("network unreachable")]
    NetworkUnreachable,
    #[error("request timed out")]
    Timeout,
    #[error("image too large for the server")]
    PayloadTooLarge,
    #[error("server returned status {0}")]
    ServerError(u16),
    #[error("malformed response")]
    MalformedResponse,
    #[error("no text found in image")]
    NoTextFound,
    #[error("image source failed")]
    AcquisitionFailed,
    #[error("an upload is already in progress")]
    Busy,
}

/// A user-facing message for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: &'static str,
}

impl ErrorKind {
    pub fn is_cancelled(self) -> bool {
        self == ErrorKind::Cancelled
    }

    /// Maps the kind to the single notice shown for it. `None` for `Cancelled`.
    pub fn notice(self) -> Option<Notice> {
        let (title, message) = match self {
            ErrorKind::Cancelled => return None,
            ErrorKind::PermissionDenied => (
                "Permission Denied",
                "Camera or photo library access is required. Grant the permission and try again.",
            ),
            ErrorKind::NoImage => ("No Image", "Please go back and take a photo first."),
            ErrorKind::NetworkUnreachable | ErrorKind::Timeout => (
                "Connection Error",
                "Please check your internet connection and try again.",
            ),
            ErrorKind::PayloadTooLarge => (
                "Image Too Large",
                "The image file is too large. Please try with a smaller image.",
            ),
            ErrorKind::ServerError(_) | ErrorKind::MalformedResponse => (
                "Upload Failed",
                "Could not process the image. Please try again.",
            ),
            ErrorKind::NoTextFound => (
                "No Text Detected",
                "We couldn't find any text in your image. Please make sure the image contains clear, readable text and try again.",
            ),
            ErrorKind::AcquisitionFailed => (
                "Camera Error",
                "There was an error accessing the camera or photo library.",
            ),
            ErrorKind::Busy => (
                "Upload In Progress",
                "Please wait for the current upload to finish.",
            ),
        };
        Some(Notice { title, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_has_no_notice() {
        assert!(ErrorKind::Cancelled.notice().is_none());
        assert!(ErrorKind::Cancelled.is_cancelled());
    }

    #[test]
    fn every_failure_maps_to_a_notice() {
        let kinds = [
            ErrorKind::PermissionDenied,
            ErrorKind::NoImage,
            ErrorKind::NetworkUnreachable,
            ErrorKind::Timeout,
            ErrorKind::PayloadTooLarge,
            ErrorKind::ServerError(502),
            ErrorKind::MalformedResponse,
            ErrorKind::NoTextFound,
            ErrorKind::AcquisitionFailed,
            ErrorKind::Busy,
        ];
        for kind in kinds {
            let notice = kind.notice().expect("failure kinds carry a notice");
            assert!(!notice.title.is_empty());
            assert!(!notice.message.is_empty());
        }
    }

    #[test]
    fn timeout_uses_connectivity_notice() {
        assert_eq!(
            ErrorKind::Timeout.notice(),
            ErrorKind::NetworkUnreachable.notice()
        );
    }
}
