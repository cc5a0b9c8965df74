//! Virtualized AGB picture processing unit: a byte-accurate mirror of VRAM/OAM/palette/register
//! state, a pure extractor that snapshots that state into a [`scene::SceneDescriptor`], and a
//! compositor that turns a descriptor into a finished frame.

pub mod api;
pub mod backend;
pub mod compositor;
pub mod demo;
mod dma;
pub mod extract;
pub mod hardware;
pub mod legacy;
pub mod memory;
pub mod registers;
pub mod scene;
pub mod upload;

pub use api::FrameRenderer;
pub use dma::DmaSource;
pub use hardware::Hardware;
