//! V4L2 camera access.
//!
//! Currently, only V4L2 `VIDEO_CAPTURE` devices yielding JFIF JPEG or Motion JPEG frames are
//! supported.

use std::{env, io};

use anyhow::bail;
use linuxvideo::{
    format::{FrameSizes, PixFormat, PixelFormat},
    stream::ReadStream,
    BufType, CapabilityFlags, Device,
};

use crate::image::{Image, Resolution};

/// A source of camera frames.
///
/// This is the seam between the relay loop and the host's camera capability; tests substitute a
/// synthetic implementation.
pub trait FrameSource {
    /// The native resolution of the frames this source produces.
    fn resolution(&self) -> Resolution;

    /// Grabs the current frame.
    ///
    /// If no frame is available yet, this method will block until one is.
    fn grab(&mut self) -> anyhow::Result<Image>;
}

/// Reasons a camera can fail to open.
///
/// Each variant maps onto the status string the control panel surfaces to the user.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera found on this device")]
    NoDevice,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Camera acquisition options.
#[derive(Default, Clone)]
pub struct CameraOptions {
    name: Option<String>,
    resolution: Option<Resolution>,
}

impl CameraOptions {
    /// Sets the name of the camera device to open.
    ///
    /// If no camera with the given name can be found, opening the camera will result in an error.
    #[inline]
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the desired image resolution.
    ///
    /// The camera will deliver at least this resolution if it can; a different resolution may be
    /// selected if it cannot.
    #[inline]
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }
}

const ENV_VAR_CAMERA_NAME: &str = "HANDWAVE_CAMERA_NAME";

/// An exclusively owned camera yielding a stream of [`Image`]s.
///
/// Dropping the camera releases the underlying capture stream.
pub struct Camera {
    stream: ReadStream,
    width: u32,
    height: u32,
}

impl Camera {
    /// Opens the first supported camera found.
    ///
    /// This function can block for a significant amount of time while the camera initializes (on
    /// the order of hundreds of milliseconds).
    pub fn open(options: CameraOptions) -> Result<Self, CameraError> {
        if let Ok(name) = env::var(ENV_VAR_CAMERA_NAME) {
            log::debug!(
                "camera override: `{}` is set to '{}'",
                ENV_VAR_CAMERA_NAME,
                name,
            );
        }

        let mut saw_device = false;
        let mut denied = false;
        let list = linuxvideo::list().map_err(|e| CameraError::Other(e.into()))?;
        for res in list {
            match res {
                Ok(dev) => {
                    saw_device = true;
                    match Self::open_impl(dev, &options) {
                        Ok(Some(camera)) => return Ok(camera),
                        Ok(None) => {}
                        Err(e) => {
                            if is_permission_denied(&e) {
                                denied = true;
                            }
                            log::debug!("{}", e);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("{}", e);
                }
            }
        }

        if denied {
            Err(CameraError::PermissionDenied)
        } else if saw_device {
            Err(CameraError::Other(anyhow::anyhow!(
                "no camera supports a compatible image format"
            )))
        } else {
            Err(CameraError::NoDevice)
        }
    }

    fn open_impl(dev: Device, options: &CameraOptions) -> anyhow::Result<Option<Self>> {
        let caps = dev.capabilities()?;
        let name_from_env = env::var(ENV_VAR_CAMERA_NAME).ok();
        if let Some(name) = options.name.as_deref().or(name_from_env.as_deref()) {
            if caps.card() != name {
                return Ok(None);
            }
        }

        let cap_flags = caps.device_capabilities();
        let path = dev.path()?;
        log::debug!(
            "device {} ({}) capabilities: {:?}",
            caps.card(),
            path.display(),
            cap_flags,
        );

        if !cap_flags.contains(CapabilityFlags::VIDEO_CAPTURE) {
            return Ok(None);
        }

        let mut pixel_format = None;
        for format in dev.formats(BufType::VIDEO_CAPTURE) {
            let format = format?;
            if format.pixel_format() == PixelFormat::JPEG || format.pixel_format() == PixelFormat::MJPG
            {
                pixel_format = Some(format.pixel_format());
                break;
            }
        }
        let Some(pixel_format) = pixel_format else {
            return Ok(None);
        };

        let target = options.resolution.unwrap_or(Resolution::RES_480P);
        let resolution = match dev.frame_sizes(pixel_format)? {
            FrameSizes::Discrete(sizes) => {
                let mut candidates = Vec::new();
                for size in sizes {
                    candidates.push(Resolution::new(size.width(), size.height()));
                }
                candidates.sort_by_key(|res| res.num_pixels());
                // Smallest resolution that still covers the target, falling back to the largest
                // the device offers.
                candidates
                    .iter()
                    .copied()
                    .find(|res| res.width() >= target.width() && res.height() >= target.height())
                    .or_else(|| candidates.last().copied())
            }
            FrameSizes::Stepwise(_) | FrameSizes::Continuous(_) => {
                bail!("stepwise or continuous resolutions are not supported");
            }
        };
        let Some(resolution) = resolution else {
            return Ok(None);
        };

        let capture = dev.video_capture(PixFormat::new(
            resolution.width(),
            resolution.height(),
            pixel_format,
        ))?;

        let format = capture.format();
        let width = format.width();
        let height = format.height();

        log::info!(
            "opened {} ({}), {}x{}",
            caps.card(),
            path.display(),
            width,
            height,
        );

        let stream = capture.into_stream()?;

        Ok(Some(Self {
            stream,
            width,
            height,
        }))
    }
}

impl FrameSource for Camera {
    fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    fn grab(&mut self) -> anyhow::Result<Image> {
        self.stream
            .dequeue(|buf| {
                let image = match Image::decode_jpeg(&buf) {
                    Ok(image) => image,
                    Err(e) => {
                        // Even high-quality webcams produce occasional corrupted MJPG frames.
                        // Hand back a blank image instead of skipping, which would cause 2x
                        // latency spikes.
                        log::error!("camera decode error: {}", e);
                        Image::new(self.width, self.height)
                    }
                };
                Ok(image)
            })
            .map_err(Into::into)
    }
}

fn is_permission_denied(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<io::Error>(),
        Some(io) if io.kind() == io::ErrorKind::PermissionDenied
    )
}
