//! Load requests: where an image comes from, what happens to it, and who is
//! told about the result.

use std::fmt;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::error::{Result, ScanError};
use crate::image_impl::{self, Mat};
use crate::transform::{apply_all, ResizeTransformation, RotateTransformation, Transformation};

pub enum Source {
    File(PathBuf),
    /// Encoded image bytes (PNG, JPEG).
    Bytes(Vec<u8>),
    Matrix(Mat),
}

/// First 8 bytes of the SHA-256 digest, as hex.
fn content_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex::encode(&digest[..8])
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "File({})", path.display()),
            Source::Bytes(bytes) => write!(
                f,
                "Bytes(len: {}, hash: {})",
                bytes.len(),
                content_hash(bytes)
            ),
            Source::Matrix(mat) => {
                let hash = match mat.as_array().as_slice() {
                    Some(bytes) => content_hash(bytes),
                    None => content_hash(&mat.to_vec()),
                };
                write!(
                    f,
                    "Matrix({}x{}x{}, hash: {})",
                    mat.cols(),
                    mat.rows(),
                    mat.channels(),
                    hash
                )
            }
        }
    }
}

impl Source {
    fn decode(self) -> Result<Mat> {
        match self {
            Source::File(path) => image_impl::imread(path),
            Source::Bytes(bytes) => {
                let img = image::load_from_memory(&bytes)?;
                image_impl::to_matrix(&img)
            }
            Source::Matrix(mat) => Ok(mat),
        }
    }
}

/// Receives the outcome of an executed request.
pub trait Target: Send {
    fn on_prepare(&mut self) {}

    fn on_success(&mut self, image: Mat);

    fn on_failure(&mut self, error: ScanError);
}

/// `Target` built from closures.
pub struct TargetAdapter<S, F>
where
    S: FnMut(Mat) + Send,
    F: FnMut(ScanError) + Send,
{
    on_success: S,
    on_failure: F,
}

impl<S, F> TargetAdapter<S, F>
where
    S: FnMut(Mat) + Send,
    F: FnMut(ScanError) + Send,
{
    pub fn new(on_success: S, on_failure: F) -> Self {
        Self {
            on_success,
            on_failure,
        }
    }
}

impl<S, F> Target for TargetAdapter<S, F>
where
    S: FnMut(Mat) + Send,
    F: FnMut(ScanError) + Send,
{
    fn on_success(&mut self, image: Mat) {
        (self.on_success)(image)
    }

    fn on_failure(&mut self, error: ScanError) {
        (self.on_failure)(error)
    }
}

pub enum Destination {
    Callback(Box<dyn Target>),
}

impl Destination {
    fn name(&self) -> &'static str {
        match self {
            Destination::Callback(_) => "Callback",
        }
    }
}

pub struct ImageRequest {
    source: Source,
    rotation: Option<RotateTransformation>,
    target_size: Option<ResizeTransformation>,
    transformations: Vec<Box<dyn Transformation>>,
    destination: Option<Destination>,
}

impl ImageRequest {
    pub fn builder() -> ImageRequestBuilder {
        ImageRequestBuilder::default()
    }

    /// Identifies the request's output for an external cache. In-memory
    /// sources are keyed by a SHA-256 prefix of their bytes, so keys stay
    /// stable across runs.
    pub fn key(&self) -> String {
        let mut key = String::new();
        if let Some(fit) = &self.target_size {
            key.push_str(&format!(
                "targetSize: ({}, {}), ",
                fit.max_width, fit.max_height
            ));
        }
        if let Some(rotation) = &self.rotation {
            key.push_str(&format!("rotationDegrees: {}, ", rotation.degrees()));
        }
        if !self.transformations.is_empty() {
            let keys: Vec<String> = self.transformations.iter().map(|t| t.key()).collect();
            key.push_str(&format!("transformations: {}, ", keys.join(", ")));
        }
        key.push_str(&format!("source: {}", self.source));
        if let Some(destination) = &self.destination {
            key.push_str(&format!(", destination: {}", destination.name()));
        }
        key
    }

    /// Decode, rotate, run the transformations, then fit to the target size.
    #[instrument(level = "debug", skip_all, fields(source = %self.source))]
    pub fn load(self) -> Result<Mat> {
        Self::run(self.source, self.rotation, self.target_size, &self.transformations)
    }

    fn run(
        source: Source,
        rotation: Option<RotateTransformation>,
        target_size: Option<ResizeTransformation>,
        transformations: &[Box<dyn Transformation>],
    ) -> Result<Mat> {
        let mut img = source.decode()?;
        debug!(width = img.cols(), height = img.rows(), "decoded");
        if let Some(rotation) = rotation {
            img = rotation.transform(img)?;
        }
        img = apply_all(transformations, img)?;
        if let Some(fit) = target_size {
            img = fit.transform(img)?;
        }
        Ok(img)
    }

    /// Runs the request and reports to the destination. Failures go to
    /// `on_failure` and `None` is returned. Without a destination the
    /// outcome is handed back instead.
    pub fn execute(self) -> Option<Result<Mat>> {
        let key = self.key();
        let Some(Destination::Callback(mut target)) = self.destination else {
            debug!(%key, "no destination, returning result");
            return Some(Self::run(
                self.source,
                self.rotation,
                self.target_size,
                &self.transformations,
            ));
        };
        target.on_prepare();
        match Self::run(self.source, self.rotation, self.target_size, &self.transformations) {
            Ok(img) => target.on_success(img),
            Err(e) => {
                warn!(%key, error = %e, "image request failed");
                target.on_failure(e);
            }
        }
        None
    }
}

#[derive(Default)]
pub struct ImageRequestBuilder {
    source: Option<Source>,
    rotation_degrees: i32,
    target_size: Option<(u32, u32)>,
    transformations: Vec<Box<dyn Transformation>>,
    destination: Option<Destination>,
}

impl ImageRequestBuilder {
    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Clockwise, multiples of 90.
    pub fn rotate(mut self, degrees: i32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    /// Fit inside `width` x `height`, keeping the aspect ratio.
    pub fn resize(mut self, width: u32, height: u32) -> Self {
        self.target_size = Some((width, height));
        self
    }

    pub fn transformation(mut self, transformation: Box<dyn Transformation>) -> Self {
        self.transformations.push(transformation);
        self
    }

    pub fn transformations(mut self, transformations: Vec<Box<dyn Transformation>>) -> Self {
        self.transformations.extend(transformations);
        self
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn build(self) -> Result<ImageRequest> {
        let source = self
            .source
            .ok_or_else(|| ScanError::InvalidArgument("image source is not set".to_string()))?;

        let rotation = match RotateTransformation::new(self.rotation_degrees)? {
            r if r.degrees() == 0 => None,
            r => Some(r),
        };

        let target_size = match self.target_size {
            Some((w, h)) if w == 0 || h == 0 => {
                return Err(ScanError::InvalidArgument(format!(
                    "target size {w}x{h} must be positive"
                )))
            }
            Some((w, h)) => Some(ResizeTransformation::new(w, h)),
            None => None,
        };

        Ok(ImageRequest {
            source,
            rotation,
            target_size,
            transformations: self.transformations,
            destination: self.destination,
        })
    }
}
