//! "Post event" form: validation, optional image upload, then event creation.
//!
//! An upload that fails aborts the submission. An event is never created
//! without the image the user attached.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::capabilities::http::{
    GatewayError, GatewayResult, MultipartBody, NewEventRequest, UploadResponse,
};
use crate::{AppError, ErrorKind, ValidationError};

/// Raw form input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub latitude: String,
    pub longitude: String,
    pub category: String,
}

/// A file picked by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedImage {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Image upload failed: {0}")]
    Upload(GatewayError),

    #[error("Image upload failed: no image address was returned")]
    MissingUploadUri,

    #[error("API Error: {}", describe_create_failure(.0))]
    Create(GatewayError),

    #[error("An event is already being posted")]
    Busy,
}

fn describe_create_failure(e: &GatewayError) -> String {
    match e {
        GatewayError::Http { status, message } => format!("{status} - {message}"),
        other => other.message().to_string(),
    }
}

impl From<ComposerError> for AppError {
    fn from(e: ComposerError) -> Self {
        match e {
            ComposerError::Invalid(v) => v.into(),
            ComposerError::Busy => AppError::new(ErrorKind::Validation, e.to_string()),
            ComposerError::Upload(ref g) | ComposerError::Create(ref g) => {
                let mut err = AppError::from(g.clone());
                err.message = e.to_string();
                err
            }
            ComposerError::MissingUploadUri => AppError::new(ErrorKind::Decode, e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerStage {
    #[default]
    Editing,
    Uploading,
    Creating,
}

/// The next request the app must send for a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Upload(MultipartBody),
    Create(NewEventRequest),
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(value.to_string())
    }
}

/// A blank coordinate is sent as `null`; anything else must parse.
fn coordinate(value: &str, field: &'static str) -> Result<Option<f64>, ValidationError> {
    let raw = value.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
        _ => Err(ValidationError::NotANumber { field }),
    }
}

/// Checks required fields and coordinate ranges, producing the creation
/// payload with no image attached yet.
pub fn validate_form(form: &EventForm) -> Result<NewEventRequest, ValidationError> {
    let name = required(&form.title, "Title")?;
    let date = required(&form.date, "Date")?;
    let location_name = required(&form.location, "Location")?;
    let category_name = required(&form.category, "Category")?;

    let latitude = coordinate(&form.latitude, "Latitude")?;
    if latitude.is_some_and(|v| !(-90.0..=90.0).contains(&v)) {
        return Err(ValidationError::LatitudeOutOfRange(form.latitude.trim().to_string()));
    }
    let longitude = coordinate(&form.longitude, "Longitude")?;
    if longitude.is_some_and(|v| !(-180.0..=180.0).contains(&v)) {
        return Err(ValidationError::LongitudeOutOfRange(form.longitude.trim().to_string()));
    }

    Ok(NewEventRequest {
        name,
        description: form.description.trim().to_string(),
        date,
        location_name,
        latitude,
        longitude,
        category_name,
        image_urls: Vec::new(),
    })
}

/// Accepts PNG, JPEG or WebP images up to `max_bytes`, sniffed from content.
pub fn validate_image(file: ImageFile, max_bytes: usize) -> Result<AcceptedImage, ValidationError> {
    if file.bytes.len() > max_bytes {
        return Err(ValidationError::ImageTooLarge {
            size: file.bytes.len(),
            max: max_bytes,
        });
    }
    let format = image::guess_format(&file.bytes).map_err(|_| ValidationError::UnsupportedImage)?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP) {
        return Err(ValidationError::UnsupportedImage);
    }
    Ok(AcceptedImage {
        file_name: file.file_name,
        mime_type: format.to_mime_type(),
        bytes: file.bytes,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventComposer {
    open: bool,
    stage: ComposerStage,
    image: Option<AcceptedImage>,
    pending: Option<NewEventRequest>,
    error: Option<String>,
    success_visible: bool,
}

impl EventComposer {
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Hides the modal and resets the form. A submission already in flight
    /// still completes.
    pub fn close(&mut self) {
        self.open = false;
        self.image = None;
        self.error = None;
    }

    pub fn choose_image(&mut self, file: ImageFile, max_bytes: usize) -> Result<(), ValidationError> {
        match validate_image(file, max_bytes) {
            Ok(image) => {
                self.image = Some(image);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.image = None;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn submit(&mut self, form: &EventForm) -> Result<Submission, ComposerError> {
        if self.is_submitting() {
            return Err(ComposerError::Busy);
        }

        let request = match validate_form(form) {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };
        self.error = None;

        if let Some(image) = &self.image {
            let body = MultipartBody::single_file(&image.file_name, image.mime_type, &image.bytes);
            self.pending = Some(request);
            self.stage = ComposerStage::Uploading;
            Ok(Submission::Upload(body))
        } else {
            self.stage = ComposerStage::Creating;
            Ok(Submission::Create(request))
        }
    }

    /// Embeds the uploaded image reference and returns the creation payload.
    pub fn on_uploaded(
        &mut self,
        result: GatewayResult<UploadResponse>,
    ) -> Result<NewEventRequest, ComposerError> {
        let pending = self.pending.take();
        let outcome = match (result, pending) {
            (Err(e), _) => Err(ComposerError::Upload(e)),
            (Ok(_), None) => Err(ComposerError::Busy),
            (Ok(response), Some(mut request)) => {
                match response.uri.filter(|u| !u.trim().is_empty()) {
                    Some(uri) => {
                        info!(uri = %uri, "event image uploaded");
                        request.image_urls = vec![uri];
                        Ok(request)
                    }
                    None => Err(ComposerError::MissingUploadUri),
                }
            }
        };

        match &outcome {
            Ok(_) => self.stage = ComposerStage::Creating,
            Err(e) => self.fail(e),
        }
        outcome
    }

    pub fn on_created(&mut self, result: GatewayResult<()>) -> Result<(), ComposerError> {
        match result {
            Ok(()) => {
                self.stage = ComposerStage::Editing;
                self.close();
                self.success_visible = true;
                Ok(())
            }
            Err(e) => {
                let err = ComposerError::Create(e);
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub fn dismiss_success(&mut self) {
        self.success_visible = false;
    }

    fn fail(&mut self, e: &ComposerError) {
        warn!(error = %e, "event submission failed");
        self.stage = ComposerStage::Editing;
        self.pending = None;
        self.error = Some(e.to_string());
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn stage(&self) -> ComposerStage {
        self.stage
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.stage != ComposerStage::Editing
    }

    #[must_use]
    pub fn image(&self) -> Option<&AcceptedImage> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn success_visible(&self) -> bool {
        self.success_visible
    }
}
