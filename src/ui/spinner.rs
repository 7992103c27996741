//! Spinner frames for long-running tools.

const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Cycles through braille frames; one frame per redraw.
#[derive(Debug, Clone, Default)]
pub struct Spinner {
    frame: usize,
    ticks: u64,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the frame to draw.
    pub fn next_frame(&mut self) -> char {
        let frame = FRAMES[self.frame];
        self.frame = (self.frame + 1) % FRAMES.len();
        self.ticks += 1;
        frame
    }

    /// Redraws since the last reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn reset(&mut self) {
        self.frame = 0;
        self.ticks = 0;
    }
}
