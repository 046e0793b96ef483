//! Brainboard Render Library
//!
//! Drawing surface abstraction and the deterministic board renderer.
//! Tests paint into a recording surface and the browser into a canvas.
//! PNG export rasterizes through a pixmap surface.

mod images;
mod raster;
mod recording;
mod renderer;
mod surface;

#[cfg(target_arch = "wasm32")]
mod canvas;

pub use images::{ImageCache, ImageError, ImageHandle, ImageLoader, ImageStatus, NullLoader};
pub use raster::{ExportError, PixmapSurface};
pub use recording::{DrawCommand, RecordingSurface};
pub use renderer::{BoardRenderer, RenderContext};
pub use surface::{Surface, SurfaceMetrics, css_color};

#[cfg(target_arch = "wasm32")]
pub use canvas::{BrowserImageLoader, CanvasError, CanvasSurface};
