//! Frame-level entry point: extract, upload, dispatch, read back


use crate::backend::{BackendError, ComposeBackend, SoftwareBackend};
use crate::compositor::{DispatchParams, FrameMemory};
use crate::extract::ExtractOptions;
use crate::hardware::Hardware;
use crate::scene::SceneDescriptor;
use crate::upload::UploadStreams;
use agb_config::RenderConfig;

/// Drives one [`ComposeBackend`] with frames taken from hardware state or prebuilt scenes.
#[derive(Debug)]
pub struct FrameRenderer<B = SoftwareBackend> {
    config: RenderConfig,
    backend: B,
}

impl FrameRenderer<SoftwareBackend> {
    /// # Errors
    ///
    /// Returns an error if the software backend cannot be created.
    pub fn new(config: RenderConfig) -> Result<Self, BackendError> {
        let backend = SoftwareBackend::new(&config)?;
        Ok(Self { config, backend })
    }
}

impl<B: ComposeBackend> FrameRenderer<B> {
    pub fn with_backend(config: RenderConfig, backend: B) -> Self {
        Self { config, backend }
    }

    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Snapshot `hardware` using this renderer's extraction options.
    #[must_use]
    pub fn extract(&self, hardware: &Hardware) -> SceneDescriptor {
        hardware.snapshot(&ExtractOptions::from(&self.config))
    }

    #[must_use]
    pub fn dispatch_params(&self, hardware: &Hardware) -> DispatchParams {
        DispatchParams::new(&self.config, &hardware.registers)
    }

    /// Render the current state of `hardware` into `out`.
    ///
    /// # Errors
    ///
    /// Propagates any backend error.
    pub fn render_hardware(&mut self, hardware: &Hardware, out: &mut [u32]) -> Result<(), B::Err> {
        let scene = self.extract(hardware);
        let params = self.dispatch_params(hardware);
        self.render_scene(&scene, FrameMemory::from(&hardware.memory), &params, out)
    }

    /// Render a prebuilt scene against the given memory contents into `out`.
    ///
    /// # Errors
    ///
    /// Propagates any backend error.
    pub fn render_scene(
        &mut self,
        scene: &SceneDescriptor,
        memory: FrameMemory<'_>,
        params: &DispatchParams,
        out: &mut [u32],
    ) -> Result<(), B::Err> {
        let streams = UploadStreams::new(scene, &memory);
        self.backend.upload_all(&streams)?;
        self.backend.dispatch(params)?;
        self.backend.readback(out)
    }

    /// [`render_scene`](Self::render_scene) into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Propagates any backend error.
    pub fn render_scene_to_vec(
        &mut self,
        scene: &SceneDescriptor,
        memory: FrameMemory<'_>,
        params: &DispatchParams,
    ) -> Result<Vec<u32>, B::Err> {
        let mut out = vec![0; params.frame_size.pixel_count()];
        self.render_scene(scene, memory, params, &mut out)?;
        Ok(out)
    }
}
