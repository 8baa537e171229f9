//! Rendering: RGB images, render modes and a terminal viewer.

use std::io::Write;
use std::str::FromStr;

use anyhow::{Result, bail};
use ndarray::{Array3, s};

/// RGB image, `height × width × 3`.
pub type RgbImage = Array3<u8>;

pub type Rgb = [u8; 3];

/// How `render` should deliver its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Show the image in a viewer.
    Human,
    /// Return the image to the caller.
    RgbArray,
}

impl FromStr for RenderMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "rgb_array" | "rgb-array" => Ok(Self::RgbArray),
            _ => bail!("Unknown render mode: {}. Valid: human, rgb_array", s),
        }
    }
}

/// What `render` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    Image(RgbImage),
    /// Whether the viewer is still open after displaying the frame.
    Displayed(bool),
}

/// Blank image of `width × height` pixels filled with `color`.
pub fn blank_image(width: usize, height: usize, color: Rgb) -> RgbImage {
    let mut img = RgbImage::zeros((height, width, 3));
    for (c, value) in color.iter().enumerate() {
        img.slice_mut(s![.., .., c]).fill(*value);
    }
    img
}

/// Fill the square tile at grid cell `(x, y)`.
///
/// Pixels falling outside the image are clipped.
pub fn fill_tile(img: &mut RgbImage, x: usize, y: usize, tile_size: usize, color: Rgb) {
    let (height, width, _) = img.dim();
    let (x0, y0) = (x * tile_size, y * tile_size);
    let (x1, y1) = ((x0 + tile_size).min(width), (y0 + tile_size).min(height));
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    for (c, value) in color.iter().enumerate() {
        img.slice_mut(s![y0..y1, x0..x1, c]).fill(*value);
    }
}

/// Draw a `thickness`-pixel outline around grid cell `(x, y)`.
pub fn outline_tile(
    img: &mut RgbImage,
    x: usize,
    y: usize,
    tile_size: usize,
    thickness: usize,
    color: Rgb,
) {
    let (height, width, _) = img.dim();
    let (x0, y0) = (x * tile_size, y * tile_size);
    let thickness = thickness.min(tile_size);
    for py in y0..(y0 + tile_size).min(height) {
        for px in x0..(x0 + tile_size).min(width) {
            let edge = px - x0 < thickness
                || py - y0 < thickness
                || x0 + tile_size - px <= thickness
                || y0 + tile_size - py <= thickness;
            if edge {
                for (c, value) in color.iter().enumerate() {
                    img[[py, px, c]] = *value;
                }
            }
        }
    }
}

/// Something that can display frames for `RenderMode::Human`.
pub trait Viewer: Send {
    fn imshow(&mut self, img: &RgbImage) -> Result<()>;
    fn is_open(&self) -> bool;
    fn close(&mut self);
}

/// Viewer that prints frames to stdout as block characters.
///
/// Each character cell averages a `cell × cell` block of pixels.
pub struct TerminalViewer {
    cell: usize,
    open: bool,
}

impl TerminalViewer {
    pub fn new(cell: usize) -> Self {
        Self {
            cell: cell.max(1),
            open: true,
        }
    }

    /// Render `img` into text, one line per row of character cells.
    pub fn to_text(&self, img: &RgbImage) -> String {
        const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
        let (height, width, _) = img.dim();
        let mut out = String::new();
        for cy in (0..height).step_by(self.cell) {
            for cx in (0..width).step_by(self.cell) {
                let block = img.slice(s![
                    cy..(cy + self.cell).min(height),
                    cx..(cx + self.cell).min(width),
                    ..
                ]);
                let n = block.len().max(1) as f64;
                let luma = block.iter().map(|&v| v as f64).sum::<f64>() / n / 255.0;
                // dark pixels draw dense glyphs
                let shade = ((1.0 - luma) * (SHADES.len() - 1) as f64).round() as usize;
                out.push(SHADES[shade.min(SHADES.len() - 1)]);
            }
            out.push('\n');
        }
        out
    }
}

impl Default for TerminalViewer {
    fn default() -> Self {
        Self::new(16)
    }
}

impl Viewer for TerminalViewer {
    fn imshow(&mut self, img: &RgbImage) -> Result<()> {
        if !self.open {
            bail!("viewer is closed");
        }
        let text = self.to_text(img);
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}
