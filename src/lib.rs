//! Client for the SnapDict backend: acquire a photo, upload it for OCR and
//! definition lookup, and present the words that come back.

pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod present;
pub mod session;
pub mod source;
pub mod upload;

pub use config::{Config, ConfigError, UPLOAD_TIMEOUT};
pub use error::{ErrorKind, Notice};
pub use models::{Definition, ImageRef, NormalizedResult, RawPayload, WordInfo};
pub use normalize::normalize;
pub use present::{PresentationRouter, Presenter, Screen, TerminalPresenter};
pub use session::{Acquire, Session};
pub use source::{CommandCamera, ConfiguredPermissions, DeviceImageSource, FilePicker, ImageSource};
pub use upload::{Progress, UploadOutcome, Uploader};
