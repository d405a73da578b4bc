//! Animated gradient progress bar.
//!
//! `set_target` records the latest completion value; `frame` eases the drawn
//! value toward it so jumps between downloader updates render smoothly.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

const FULL_CELL: &str = "█";
const EMPTY_CELL: &str = "░";
// Room for " 100%".
const PERCENT_WIDTH: u16 = 5;
// Fraction of the remaining distance covered per animation frame.
const EASING: f64 = 0.25;
const SNAP_DISTANCE: f64 = 0.001;

const GRADIENT_START: (u8, u8, u8) = (0x5A, 0x56, 0xE0);
const GRADIENT_END: (u8, u8, u8) = (0xEE, 0x6F, 0xF8);
const EMPTY_COLOR: Color = Color::Rgb(0x60, 0x60, 0x60);

#[derive(Clone, Debug)]
pub struct ProgressBar {
    target: f64,
    shown: f64,
    width: u16,
}

impl ProgressBar {
    pub fn new(width: u16) -> Self {
        Self {
            target: 0.0,
            shown: 0.0,
            width,
        }
    }

    pub fn set_target(&mut self, value: f64) {
        if value.is_finite() {
            self.target = value.clamp(0.0, 1.0);
        }
    }

    /// Advance the animation by one frame.
    pub fn frame(&mut self) {
        let distance = self.target - self.shown;
        if distance.abs() <= SNAP_DISTANCE {
            self.shown = self.target;
        } else {
            self.shown += distance * EASING;
        }
    }

    pub fn is_animating(&self) -> bool {
        self.shown != self.target
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn shown(&self) -> f64 {
        self.shown
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    pub fn line(&self) -> Line<'static> {
        let cells = self.width.saturating_sub(PERCENT_WIDTH) as usize;
        let filled = ((self.shown * cells as f64).round() as usize).min(cells);

        let mut spans = Vec::with_capacity(cells + 1);
        for index in 0..filled {
            spans.push(Span::styled(
                FULL_CELL,
                Style::default().fg(gradient_at(index, cells)),
            ));
        }
        if filled < cells {
            spans.push(Span::styled(
                EMPTY_CELL.repeat(cells - filled),
                Style::default().fg(EMPTY_COLOR),
            ));
        }
        spans.push(Span::raw(format!(
            "{:>4}%",
            (self.shown * 100.0).round() as u32
        )));
        Line::from(spans)
    }
}

fn gradient_at(index: usize, cells: usize) -> Color {
    let t = if cells <= 1 {
        0.0
    } else {
        index as f64 / (cells - 1) as f64
    };
    let mix = |from: u8, to: u8| -> u8 {
        (from as f64 + (to as f64 - from as f64) * t).round() as u8
    };
    Color::Rgb(
        mix(GRADIENT_START.0, GRADIENT_END.0),
        mix(GRADIENT_START.1, GRADIENT_END.1),
        mix(GRADIENT_START.2, GRADIENT_END.2),
    )
}
