//! Browser canvas backend.

use crate::images::{ImageCache, ImageHandle, ImageLoader};
use crate::surface::{Surface, css_color};
use brainboard_core::text::{ApproximateMetrics, TextMetrics, css_font};
use kurbo::{BezPath, PathEl, Point, Rect, Size};
use peniko::Color;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// Canvas setup errors.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("2D context unavailable: {0}")]
    Context(String),
    #[error("Failed to create image element: {0}")]
    Image(String),
    #[error("Failed to export canvas: {0}")]
    Export(String),
}

type ImageElements = Rc<RefCell<HashMap<String, HtmlImageElement>>>;

/// [`Surface`] over a `CanvasRenderingContext2d`.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    images: ImageElements,
}

impl CanvasSurface {
    /// Get the 2D context of `canvas`. Images are looked up in `loader`.
    pub fn new(canvas: &HtmlCanvasElement, loader: &BrowserImageLoader) -> Result<Self, CanvasError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| CanvasError::Context(format!("{e:?}")))?
            .ok_or_else(|| CanvasError::Context("no 2d context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|e| CanvasError::Context(format!("{e:?}")))?;
        Ok(Self {
            ctx,
            images: loader.elements.clone(),
        })
    }

    /// The canvas contents as a `data:image/png` URL, for downloads.
    pub fn to_png_data_url(&self) -> Result<String, CanvasError> {
        let canvas = self
            .ctx
            .canvas()
            .ok_or_else(|| CanvasError::Export("context has no canvas".to_string()))?;
        canvas
            .to_data_url()
            .map_err(|e| CanvasError::Export(format!("{e:?}")))
    }

    fn trace(&self, path: &BezPath) {
        self.ctx.begin_path();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathEl::LineTo(p) => self.ctx.line_to(p.x, p.y),
                PathEl::QuadTo(c, p) => self.ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
                PathEl::CurveTo(c1, c2, p) => {
                    self.ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y)
                }
                PathEl::ClosePath => self.ctx.close_path(),
            }
        }
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Size {
        self.ctx
            .canvas()
            .map(|c| Size::new(f64::from(c.width()), f64::from(c.height())))
            .unwrap_or(Size::ZERO)
    }

    fn clear(&mut self, color: Color) {
        let size = self.size();
        self.ctx.set_fill_style_str(&css_color(color));
        self.ctx.fill_rect(0.0, 0.0, size.width, size.height);
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        self.trace(path);
        self.ctx.set_stroke_style_str(&css_color(color));
        self.ctx.set_line_width(width);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.stroke();
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.trace(path);
        self.ctx.set_fill_style_str(&css_color(color));
        self.ctx.fill();
    }

    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64, color: Color) {
        self.ctx.set_font(&css_font(font_size));
        self.ctx.set_fill_style_str(&css_color(color));
        if let Err(e) = self.ctx.fill_text(text, origin.x, origin.y) {
            log::warn!("fill_text failed: {e:?}");
        }
    }

    fn draw_image(&mut self, image: &ImageHandle, dest: Rect) {
        let images = self.images.borrow();
        let Some(element) = images.get(image.url()) else {
            return;
        };
        if let Err(e) = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            element,
            dest.x0,
            dest.y0,
            dest.width(),
            dest.height(),
        ) {
            log::warn!("draw_image failed for {}: {e:?}", image.url());
        }
    }

    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        self.ctx.set_font(&css_font(font_size));
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(_) => ApproximateMetrics.text_width(text, font_size),
        }
    }
}

/// Loads images through `<img>` elements.
///
/// Load results arrive from the browser event loop; call
/// [`BrowserImageLoader::complete`] each frame to move them into the cache.
#[derive(Default)]
pub struct BrowserImageLoader {
    elements: ImageElements,
    finished: Rc<RefCell<Vec<(String, Option<(u32, u32)>)>>>,
    // Keep the closures alive until the element settles.
    handlers: HashMap<String, (Closure<dyn FnMut()>, Closure<dyn FnMut()>)>,
}

impl BrowserImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move finished loads into `cache`. Returns true if anything changed,
    /// meaning the host should repaint.
    pub fn complete(&mut self, cache: &mut ImageCache) -> bool {
        let finished: Vec<_> = self.finished.borrow_mut().drain(..).collect();
        for (url, size) in &finished {
            self.release_handlers(url);
            match size {
                Some((width, height)) => cache.insert_ready(url, *width, *height),
                None => {
                    log::warn!("image {url} failed to load");
                    self.elements.borrow_mut().remove(url);
                    cache.mark_failed(url);
                }
            }
        }
        !finished.is_empty()
    }

    fn release_handlers(&mut self, url: &str) {
        if let Some(element) = self.elements.borrow().get(url) {
            element.set_onload(None);
            element.set_onerror(None);
        }
        self.handlers.remove(url);
    }

    fn start(&mut self, url: &str) -> Result<(), CanvasError> {
        let element =
            HtmlImageElement::new().map_err(|e| CanvasError::Image(format!("{e:?}")))?;

        let loaded = element.clone();
        let done = self.finished.clone();
        let key = url.to_string();
        let on_load = Closure::<dyn FnMut()>::new(move || {
            let size = (loaded.natural_width(), loaded.natural_height());
            done.borrow_mut().push((key.clone(), Some(size)));
        });

        let done = self.finished.clone();
        let key = url.to_string();
        let on_error = Closure::<dyn FnMut()>::new(move || {
            done.borrow_mut().push((key.clone(), None));
        });

        element.set_onload(Some(on_load.as_ref().unchecked_ref()));
        element.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        element.set_src(url);

        self.elements.borrow_mut().insert(url.to_string(), element);
        self.handlers.insert(url.to_string(), (on_load, on_error));
        Ok(())
    }
}

impl ImageLoader for BrowserImageLoader {
    fn request(&mut self, url: &str) {
        if let Err(e) = self.start(url) {
            log::warn!("could not request {url}: {e}");
            self.finished.borrow_mut().push((url.to_string(), None));
        }
    }

    fn forget(&mut self, url: &str) {
        self.release_handlers(url);
        self.elements.borrow_mut().remove(url);
    }
}
