//! Execution backends: upload streams in, dispatch, read the finished frame back


use crate::compositor::{self, DispatchParams};
use crate::upload::{StreamId, UploadStreams};
use agb_common::frame::{Color, FrameSize};
use agb_config::RenderConfig;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{stream} stream was never uploaded")]
    MissingStream { stream: StreamId },
    #[error("{stream} stream has invalid length {len} bytes")]
    InvalidStreamLength { stream: StreamId, len: usize },
    #[error("invalid frame size {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },
    #[error("invalid tile map size {width}x{height} tiles")]
    InvalidMapSize { width: u32, height: u32 },
    #[error("readback buffer holds {len} pixels but the frame has {required}")]
    ReadbackBufferTooSmall { len: usize, required: usize },
    #[error("readback requested before any frame was dispatched")]
    NoFrame,
    #[error("failed to build compositor thread pool: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),
}

/// Something that can turn uploaded streams into a frame.
pub trait ComposeBackend {
    type Err;

    /// Replace the contents of one input stream.
    ///
    /// # Errors
    ///
    /// This method will return an error if the backend cannot accept the stream.
    fn upload(&mut self, stream: StreamId, bytes: &[u8]) -> Result<(), Self::Err>;

    /// Compose a frame from the most recently uploaded streams. Returns once the frame is
    /// complete and visible to [`readback`](Self::readback).
    ///
    /// # Errors
    ///
    /// This method will return an error if a stream is missing or the parameters are invalid.
    fn dispatch(&mut self, params: &DispatchParams) -> Result<(), Self::Err>;

    /// Copy the last composed frame into `out` as packed `r | g << 8 | b << 16 | 0xFF << 24`.
    ///
    /// `out` may be larger than the frame; pixels past `width * height` are left untouched.
    ///
    /// # Errors
    ///
    /// This method will return an error if `out` is too small or no frame has been composed.
    fn readback(&mut self, out: &mut [u32]) -> Result<(), Self::Err>;

    /// Upload every stream in `streams`.
    ///
    /// # Errors
    ///
    /// Propagates the first upload error.
    fn upload_all(&mut self, streams: &UploadStreams) -> Result<(), Self::Err> {
        for stream in StreamId::ALL {
            self.upload(stream, streams.stream_bytes(stream))?;
        }
        Ok(())
    }
}

/// Runs the compositor on the CPU, one rayon task per output line.
#[derive(Debug)]
pub struct SoftwareBackend {
    streams: [Option<Vec<u8>>; StreamId::ALL.len()],
    frame: Vec<Color>,
    frame_size: Option<FrameSize>,
    parallel: bool,
    thread_pool: Option<ThreadPool>,
}

impl SoftwareBackend {
    /// # Errors
    ///
    /// Returns an error if a dedicated worker thread pool was requested and could not be built.
    pub fn new(config: &RenderConfig) -> Result<Self, BackendError> {
        let thread_pool = match config.worker_threads {
            Some(num_threads) => {
                log::info!("Compositing on a dedicated pool of {num_threads} threads");
                Some(
                    ThreadPoolBuilder::new()
                        .num_threads(num_threads)
                        .thread_name(|i| format!("agb-compositor-{i}"))
                        .build()?,
                )
            }
            None => None,
        };

        Ok(Self {
            streams: Default::default(),
            frame: Vec::new(),
            frame_size: None,
            parallel: config.parallel,
            thread_pool,
        })
    }

    /// The last composed frame, if any.
    #[must_use]
    pub fn frame(&self) -> Option<(&[Color], FrameSize)> {
        self.frame_size.map(|frame_size| (self.frame.as_slice(), frame_size))
    }

    fn decode_streams(&self) -> Result<UploadStreams, BackendError> {
        let missing =
            StreamId::ALL.into_iter().find(|stream| self.streams[stream.index()].is_none());
        if let Some(stream) = missing {
            return Err(BackendError::MissingStream { stream });
        }

        UploadStreams::from_stream_bytes(|stream| {
            self.streams[stream.index()].as_deref().unwrap_or_default()
        })
        .map_err(|(stream, len)| BackendError::InvalidStreamLength { stream, len })
    }
}

fn validate_params(params: &DispatchParams) -> Result<(), BackendError> {
    let FrameSize { width, height } = params.frame_size;
    if width == 0 || height == 0 {
        return Err(BackendError::InvalidFrameSize { width, height });
    }

    if params.map_width_tiles == 0 || params.map_height_tiles == 0 {
        return Err(BackendError::InvalidMapSize {
            width: params.map_width_tiles,
            height: params.map_height_tiles,
        });
    }

    Ok(())
}

impl ComposeBackend for SoftwareBackend {
    type Err = BackendError;

    fn upload(&mut self, stream: StreamId, bytes: &[u8]) -> Result<(), Self::Err> {
        if !stream.accepts_len(bytes.len()) {
            return Err(BackendError::InvalidStreamLength { stream, len: bytes.len() });
        }

        let slot = self.streams[stream.index()].get_or_insert_with(Vec::new);
        slot.clear();
        slot.extend_from_slice(bytes);

        Ok(())
    }

    fn dispatch(&mut self, params: &DispatchParams) -> Result<(), Self::Err> {
        validate_params(params)?;
        let streams = self.decode_streams()?;

        log::debug!(
            "Dispatching {}x{} frame; map {}x{} tiles, OBJ char base {:05X}, OBJ mapping {} ({})",
            params.frame_size.width,
            params.frame_size.height,
            params.map_width_tiles,
            params.map_height_tiles,
            params.obj_char_base,
            params.obj_tile_mapping,
            params.obj_tile_mapping.to_dispatch_value()
        );

        let scene = streams.to_scene();
        let memory = streams.frame_memory();
        let parallel = self.parallel;
        let compose = || compositor::compose_frame(&scene, &memory, params, parallel);

        // Joining the parallel iterator is the only barrier before readback
        self.frame = match &self.thread_pool {
            Some(thread_pool) => thread_pool.install(compose),
            None => compose(),
        };
        self.frame_size = Some(params.frame_size);

        Ok(())
    }

    fn readback(&mut self, out: &mut [u32]) -> Result<(), Self::Err> {
        let Some(frame_size) = self.frame_size else { return Err(BackendError::NoFrame) };

        let required = frame_size.pixel_count();
        if out.len() < required {
            return Err(BackendError::ReadbackBufferTooSmall { len: out.len(), required });
        }

        for (out, color) in out.iter_mut().zip(&self.frame) {
            *out = color.to_packed_rgba();
        }

        Ok(())
    }
}
