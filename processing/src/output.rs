use std::path::Path;

use clap::Args;
use geo::{LineString, Rect};
use serde::{Deserialize, Serialize};
use svg::{node::element::path::Data, Document, Node};

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct RenderOptions {
    /// Canvas width in pixels
    #[clap(long, default_value = "1000")]
    pub canvas_width: u32,
    /// Also draw every road of the network behind the group
    #[clap(long)]
    pub draw_background: bool,
    /// Stroke width of the group's roads, in pixels
    #[clap(long, default_value = "4.0")]
    pub stroke: f32,
    /// Stroke colour of the group's roads, any SVG colour
    #[clap(long, default_value = "black")]
    pub color: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            canvas_width: 1000,
            draw_background: false,
            stroke: 4.0,
            color: "black".into(),
        }
    }
}

/// Maps projected coordinates onto the canvas, north up.
#[derive(Debug, Clone, Copy)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl CanvasSize {
    /// Fits `extent` plus a 5% margin into `width` pixels, keeping the aspect
    /// ratio. Degenerate extents are widened to a square.
    pub fn fit(width: u32, extent: Rect<f64>) -> Self {
        let side = extent.width().max(extent.height()).max(1.0);
        let margin = side * 0.05;
        let pad_x = margin + if extent.width() == 0.0 { side / 2.0 } else { 0.0 };
        let pad_y = margin + if extent.height() == 0.0 { side / 2.0 } else { 0.0 };

        let min_x = extent.min().x - pad_x;
        let max_x = extent.max().x + pad_x;
        let min_y = extent.min().y - pad_y;
        let max_y = extent.max().y + pad_y;

        let height = (width as f64 * (max_y - min_y) / (max_x - min_x)).round().max(1.0) as u32;
        CanvasSize {
            width,
            height,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    fn convert(&self, x: f64, y: f64) -> (f64, f64) {
        let x = (x - self.min_x) / (self.max_x - self.min_x) * self.width as f64;
        let y = self.height as f64
            - (y - self.min_y) / (self.max_y - self.min_y) * self.height as f64;
        (x, y)
    }
}

#[derive(Debug, Clone)]
pub struct DrawOptions {
    pub color: String,
    pub stroke: f32,
    pub stroke_linecap: String,
    pub stroke_linejoin: String,
}

impl Default for DrawOptions {
    fn default() -> Self {
        DrawOptions {
            color: "black".into(),
            stroke: 4.0,
            stroke_linecap: "round".into(),
            stroke_linejoin: "round".into(),
        }
    }
}

pub struct Canvas {
    pub size: CanvasSize,
    pub document: Document,
}

impl Canvas {
    pub fn new(size: CanvasSize, background: &str) -> Self {
        let document = Document::new()
            .set("viewBox", (0, 0, size.width, size.height))
            .set("width", size.width)
            .set("height", size.height)
            .add(
                svg::node::element::Rectangle::new()
                    .set("width", size.width)
                    .set("height", size.height)
                    .set("fill", background),
            );

        Canvas { size, document }
    }

    pub fn draw_polyline(&mut self, line: &LineString<f64>, opts: &DrawOptions) {
        if line.0.len() < 2 {
            return;
        }
        let mut path = Data::new();
        let mut iter = line.coords();
        if let Some(first) = iter.next() {
            path = path.move_to(self.size.convert(first.x, first.y));
        }
        for coord in iter {
            path = path.line_to(self.size.convert(coord.x, coord.y));
        }
        self.document.append(
            svg::node::element::Path::new()
                .set("fill", "none")
                .set("stroke", opts.color.as_str())
                .set("stroke-width", opts.stroke)
                .set("stroke-linecap", opts.stroke_linecap.as_str())
                .set("stroke-linejoin", opts.stroke_linejoin.as_str())
                .set("d", path),
        );
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        svg::save(path, &self.document)?;
        Ok(())
    }
}

/// Smallest rectangle containing every given rectangle.
pub fn union_rects<I: IntoIterator<Item = Rect<f64>>>(rects: I) -> Option<Rect<f64>> {
    rects.into_iter().reduce(|a, b| {
        Rect::new(
            (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
            (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
        )
    })
}
