use std::{
    io::{self, stdout, Write},
    thread::sleep,
    time::{Duration, Instant},
};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use engine::{
    device::{Leds, PixelController, StatusOutputs},
    Color, Surface,
};
use tracing::warn;

/// Upper half block: foreground paints the top half of a cell, background the
/// bottom half.
const HALF_BLOCK: char = '▀';

/// Stands in for the VGA pixel controller. A surface handed over at swap time
/// is painted straight into the terminal as half-block cells, `scale` pixels
/// wide and `2 * scale` pixels tall, and the vertical blank is emulated by the
/// frame period.
pub struct TerminalDisplay {
    scale: usize,
    background: Color,
    frame_period: Duration,
    vblank: Instant,
    /// (top, bottom) of every cell as last painted, to skip unchanged ones.
    painted: Vec<Option<(Color, Color)>>,
}

impl TerminalDisplay {
    pub fn new(scale: usize, background: Color, fps: u32) -> Self {
        Self {
            scale: scale.max(1),
            background,
            frame_period: Duration::from_secs(1) / fps.max(1),
            vblank: Instant::now(),
            painted: Vec::new(),
        }
    }

    /// Terminal rows and columns a `width` x `height` picture covers.
    pub fn cells(&self, width: usize, height: usize) -> (u16, u16) {
        let columns = width.div_ceil(self.scale);
        let rows = height.div_ceil(2 * self.scale);
        (columns as u16, rows as u16)
    }

    /// The colour a block of pixels shows: the first pixel in it that is not
    /// background, scanning row by row.
    fn block(&self, surface: &Surface, x0: usize, y0: usize) -> Color {
        for y in y0..(y0 + self.scale).min(surface.height()) {
            for x in x0..(x0 + self.scale).min(surface.width()) {
                if let Some(color) = surface.pixel(x as i32, y as i32) {
                    if color != self.background {
                        return color;
                    }
                }
            }
        }
        self.background
    }

    fn paint(&mut self, surface: &Surface) -> io::Result<()> {
        let (columns, rows) = self.cells(surface.width(), surface.height());
        let count = columns as usize * rows as usize;
        if self.painted.len() != count {
            self.painted = vec![None; count];
        }
        let mut out = stdout().lock();
        for row in 0..rows as usize {
            for column in 0..columns as usize {
                let x = column * self.scale;
                let y = row * 2 * self.scale;
                let top = self.block(surface, x, y);
                let bottom = self.block(surface, x, y + self.scale);
                let cell = &mut self.painted[row * columns as usize + column];
                if *cell == Some((top, bottom)) {
                    continue;
                }
                *cell = Some((top, bottom));
                queue!(
                    out,
                    MoveTo(column as u16, row as u16),
                    SetForegroundColor(term_color(top)),
                    SetBackgroundColor(term_color(bottom)),
                    Print(HALF_BLOCK)
                )?;
            }
        }
        queue!(out, ResetColor)?;
        out.flush()
    }
}

impl PixelController for TerminalDisplay {
    fn request_swap(&mut self, surface: &Surface) {
        if let Err(e) = self.paint(surface) {
            warn!(error = %e, "dropped frame");
            // repaint everything once the terminal recovers.
            self.painted.clear();
        }
        let now = Instant::now();
        self.vblank = (self.vblank + self.frame_period).max(now);
    }

    fn swap_pending(&self) -> bool {
        let now = Instant::now();
        if now >= self.vblank {
            return false;
        }
        sleep((self.vblank - now).min(Duration::from_millis(1)));
        true
    }
}

fn term_color(color: Color) -> TermColor {
    let (r, g, b) = color.to_rgb888();
    TermColor::Rgb { r, g, b }
}

/// Stands in for the seven-segment display and the LED bank: one status line
/// under the picture.
pub struct TerminalOutputs {
    row: u16,
    number: u32,
    leds: Leds,
}

impl TerminalOutputs {
    pub fn new(row: u16) -> Self {
        Self {
            row,
            number: 0,
            leds: Leds::default(),
        }
    }

    /// The power readout, then LED0 and LED1.
    fn status(&self) -> String {
        let bits = self.leds.bits();
        let led = |n: u32| if bits & (1 << n) != 0 { '●' } else { '○' };
        format!(
            "power {:>3}   {} {}   ←/→ aim  space shoot  q quit",
            self.number,
            led(0),
            led(1),
        )
    }

    fn draw(&self) -> io::Result<()> {
        let mut out = stdout().lock();
        queue!(
            out,
            MoveTo(0, self.row),
            ResetColor,
            Print(self.status()),
            Clear(ClearType::UntilNewLine)
        )?;
        out.flush()
    }

    fn refresh(&self) {
        if let Err(e) = self.draw() {
            warn!(error = %e, "status line not updated");
        }
    }
}

impl StatusOutputs for TerminalOutputs {
    fn display_number(&mut self, value: u32) {
        if value != self.number {
            self.number = value;
            self.refresh();
        }
    }

    fn display_leds(&mut self, leds: Leds) {
        if leds != self.leds {
            self.leds = leds;
            self.refresh();
        }
    }
}
