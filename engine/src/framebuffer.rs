use tracing::trace;

use crate::device::PixelController;

/// A 16-bit RGB565 pixel value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color(pub u16);

impl Color {
    pub const BLACK: Self = Self(0x0000);
    pub const WHITE: Self = Self(0xFFFF);

    /// Expands the 5/6/5 bit channels to 8 bits each.
    pub fn to_rgb888(self) -> (u8, u8, u8) {
        let r = ((self.0 >> 11) & 0x1F) as u8;
        let g = ((self.0 >> 5) & 0x3F) as u8;
        let b = (self.0 & 0x1F) as u8;
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }
}

/// Anything a rasterizer can draw into. Implementations clip: a pixel outside
/// `[0, width) x [0, height)` is dropped rather than wrapped.
pub trait Canvas {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn plot_pixel(&mut self, x: i32, y: i32, color: Color);
}

/// A row-major grid of pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Box<[Color]>,
}

impl Surface {
    pub fn new(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height].into_boxed_slice(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|idx| self.pixels[idx])
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}

impl Canvas for Surface {
    fn width(&self) -> i32 {
        self.width as i32
    }

    fn height(&self) -> i32 {
        self.height as i32
    }

    fn plot_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx] = color;
        }
    }
}

/// Two equally sized surfaces. Drawing always targets the back surface; the
/// front one is what the display is scanning out. Roles are exchanged by
/// index on [`FrameBuffer::swap`], the pixels themselves never move.
pub struct FrameBuffer {
    surfaces: [Surface; 2],
    back: usize,
    background: Color,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, background: Color) -> Self {
        Self {
            surfaces: [
                Surface::new(width, height, background),
                Surface::new(width, height, background),
            ],
            back: 1,
            background,
        }
    }

    pub fn front(&self) -> &Surface {
        &self.surfaces[1 - self.back]
    }

    pub fn back(&self) -> &Surface {
        &self.surfaces[self.back]
    }

    pub fn clear(&mut self) {
        let background = self.background;
        self.surfaces[self.back].fill(background);
    }

    /// Exchanges front and back. Only valid once the display has reached a
    /// vertical blank, see [`FrameBuffer::present`].
    pub fn swap(&mut self) {
        self.back = 1 - self.back;
    }

    /// Hands the back surface to the display, blocks until the display has
    /// taken it at vsync, then swaps roles so drawing continues on the surface
    /// that just left the screen.
    pub fn present<D: PixelController + ?Sized>(&mut self, display: &mut D) {
        display.request_swap(self.back());
        let mut polls = 0u64;
        while display.swap_pending() {
            polls += 1;
            std::hint::spin_loop();
        }
        trace!(polls, "vsync reached");
        self.swap();
    }
}

impl Canvas for FrameBuffer {
    fn width(&self) -> i32 {
        self.surfaces[self.back].width as i32
    }

    fn height(&self) -> i32 {
        self.surfaces[self.back].height as i32
    }

    fn plot_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.surfaces[self.back].plot_pixel(x, y, color);
    }
}
