//! Image acquisition from a camera or a gallery selection.
//!
//! Both paths go through a [`Picker`], which mirrors what a platform image
//! picker reports: either the user backed out, or a list of assets of which
//! only the first is used.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::ErrorKind;
use crate::models::{mime_for_path, ImageRef};

// ── Permissions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    MediaLibrary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

pub trait PermissionProvider: Send + Sync {
    /// Asks for `permission`, returning the resulting status.
    fn request(&self, permission: Permission) -> PermissionStatus;
}

/// Grants fixed at startup from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredPermissions {
    pub camera: bool,
    pub media_library: bool,
}

impl PermissionProvider for ConfiguredPermissions {
    fn request(&self, permission: Permission) -> PermissionStatus {
        let granted = match permission {
            Permission::Camera => self.camera,
            Permission::MediaLibrary => self.media_library,
        };
        if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

// ── Picker ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

impl Asset {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mime_type: None,
            file_name: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct PickerResponse {
    pub canceled: bool,
    pub assets: Vec<Asset>,
    // Keeps a captured temp file alive until it is turned into an ImageRef.
    pub(crate) capture: Option<tempfile::TempPath>,
}

impl PickerResponse {
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            ..Self::default()
        }
    }

    pub fn with_assets(assets: Vec<Asset>) -> Self {
        Self {
            canceled: false,
            assets,
            capture: None,
        }
    }
}

/// The platform mechanism behind a capture or a pick.
#[async_trait]
pub trait Picker: Send + Sync {
    async fn launch(&self) -> io::Result<PickerResponse>;
}

/// Turns a picker response into exactly one image, or `Cancelled`.
pub fn resolve(response: PickerResponse) -> Result<ImageRef, ErrorKind> {
    if response.canceled {
        return Err(ErrorKind::Cancelled);
    }
    let Some(asset) = response.assets.into_iter().next() else {
        debug!("picker returned no assets");
        return Err(ErrorKind::Cancelled);
    };

    let mime_type = asset
        .mime_type
        .unwrap_or_else(|| mime_for_path(&asset.path).to_string());
    let file_name = asset.file_name.unwrap_or_else(|| {
        asset
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string())
    });
    let image = ImageRef::new(asset.path, mime_type, file_name);

    match response.capture {
        Some(temp) if temp.to_path_buf().as_path() == image.path() => Ok(image.with_backing(temp)),
        _ => Ok(image),
    }
}

// ── Gallery ──────────────────────────────────────────────────────────────────

/// A gallery selection made up front, e.g. from command line arguments.
#[derive(Debug, Clone, Default)]
pub struct FilePicker {
    paths: Vec<PathBuf>,
}

impl FilePicker {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl Picker for FilePicker {
    async fn launch(&self) -> io::Result<PickerResponse> {
        if self.paths.is_empty() {
            return Ok(PickerResponse::canceled());
        }
        Ok(PickerResponse::with_assets(
            self.paths.iter().cloned().map(Asset::from_path).collect(),
        ))
    }
}

// ── Camera ───────────────────────────────────────────────────────────────────

const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Captures through an external program such as `fswebcam` or
/// `libcamera-still`.
///
/// The command line is split the way a POSIX shell would, so quoted
/// arguments may contain spaces. `{output}` is replaced with the capture
/// path; without it the path is appended as the last argument.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut words = shell_words::split(command_line).ok()?.into_iter();
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    fn args_for(&self, output: &str) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(OUTPUT_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(OUTPUT_PLACEHOLDER, output)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(output.to_string());
        }
        args
    }
}

#[async_trait]
impl Picker for CommandCamera {
    async fn launch(&self) -> io::Result<PickerResponse> {
        let capture = tempfile::Builder::new()
            .prefix("snapdict-capture-")
            .suffix(".jpg")
            .tempfile()?
            .into_temp_path();
        let output = capture.to_string_lossy().into_owned();

        info!(program = %self.program, "starting camera capture");
        let status = tokio::process::Command::new(&self.program)
            .args(self.args_for(&output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            debug!(%status, "camera command did not complete");
            return Ok(PickerResponse::canceled());
        }
        if tokio::fs::metadata(&capture).await?.len() == 0 {
            return Ok(PickerResponse::with_assets(Vec::new()));
        }

        let asset = Asset {
            path: capture.to_path_buf(),
            mime_type: Some("image/jpeg".to_string()),
            file_name: Some("photo.jpg".to_string()),
        };
        Ok(PickerResponse {
            canceled: false,
            assets: vec![asset],
            capture: Some(capture),
        })
    }
}

// ── Image source ─────────────────────────────────────────────────────────────

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn capture_from_camera(&self) -> Result<ImageRef, ErrorKind>;
    async fn pick_from_gallery(&self) -> Result<ImageRef, ErrorKind>;
}

/// Permission-gated image source backed by a camera and a gallery picker.
pub struct DeviceImageSource {
    permissions: Box<dyn PermissionProvider>,
    camera: Option<Box<dyn Picker>>,
    gallery: Option<Box<dyn Picker>>,
}

impl DeviceImageSource {
    pub fn new(permissions: impl PermissionProvider + 'static) -> Self {
        Self {
            permissions: Box::new(permissions),
            camera: None,
            gallery: None,
        }
    }

    pub fn with_camera(mut self, camera: impl Picker + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    pub fn with_gallery(mut self, gallery: impl Picker + 'static) -> Self {
        self.gallery = Some(Box::new(gallery));
        self
    }

    fn ensure(&self, permission: Permission) -> Result<(), ErrorKind> {
        match self.permissions.request(permission) {
            PermissionStatus::Granted => Ok(()),
            status => {
                warn!(?permission, ?status, "permission not granted");
                Err(ErrorKind::PermissionDenied)
            }
        }
    }

    async fn acquire(picker: Option<&dyn Picker>) -> Result<ImageRef, ErrorKind> {
        let picker = picker.ok_or(ErrorKind::AcquisitionFailed)?;
        let response = picker.launch().await.map_err(|e| {
            warn!(error = %e, "image picker failed");
            ErrorKind::AcquisitionFailed
        })?;
        resolve(response)
    }
}

#[async_trait]
impl ImageSource for DeviceImageSource {
    async fn capture_from_camera(&self) -> Result<ImageRef, ErrorKind> {
        self.ensure(Permission::Camera)?;
        Self::acquire(self.camera.as_deref()).await
    }

    async fn pick_from_gallery(&self) -> Result<ImageRef, ErrorKind> {
        self.ensure(Permission::MediaLibrary)?;
        Self::acquire(self.gallery.as_deref()).await
    }
}
