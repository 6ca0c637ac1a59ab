
use std::io::{stdout, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use common::constants::{IR_KEYBOARD, IR_STATE, WORD_SIZE};

use log::error;

/// An asynchronous interrupt record: the code handed to the guest and the
/// handler-slot address it is delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupt {
    pub code: u16,
    pub reason: u16,
}

impl Interrupt {
    pub fn new(code: u16, reason: u16) -> Interrupt {
        Interrupt { code, reason }
    }

    pub fn keyboard(code: u16) -> Interrupt {
        Interrupt::new(code, IR_KEYBOARD)
    }

    pub fn state(code: u16) -> Interrupt {
        Interrupt::new(code, IR_STATE)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// A drawable display. The machine hands `draw` the character region as raw
/// bytes once per cycle; any concrete renderer plugs in.
pub trait Display {
    fn init(&mut self) -> std::io::Result<()>;
    fn draw(&mut self, width: usize, height: usize, data: &[u8]);
    fn close(&mut self);
}

/// Renders nowhere. Used by tests and headless runs.
#[derive(Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn init(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn draw(&mut self, _width: usize, _height: usize, _data: &[u8]) {}

    fn close(&mut self) {}
}

////////////////////////////////////////////////////////////////////////////////

/// ANSI terminal renderer. Each cell is a big-endian word; zero renders as a
/// space. Frames are paced so the guest draws at roughly 20 Hz.
pub struct TextDisplay {
    frame: String,
}

impl TextDisplay {
    const FRAME_DELAY: Duration = Duration::from_millis(50);

    pub fn new() -> TextDisplay {
        TextDisplay {
            frame: String::new(),
        }
    }
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TextDisplay {
    fn init(&mut self) -> std::io::Result<()> {
        let mut out = stdout().lock();
        out.write_all(b"\x1b[2J\x1b[?25l")?;
        out.flush()
    }

    fn draw(&mut self, width: usize, height: usize, data: &[u8]) {
        if data.len() < width * height * WORD_SIZE as usize {
            error!("display: framebuffer smaller than {width}x{height}");
            return;
        }

        self.frame.clear();
        self.frame.push_str("\x1b[H");
        for y in 0..height {
            for x in 0..width {
                let cell = (y * width + x) * WORD_SIZE as usize;
                let value = u16::from_be_bytes([data[cell], data[cell + 1]]);
                let glyph = if value == 0 {
                    ' '
                } else {
                    char::from_u32(value as u32).unwrap_or(' ')
                };
                self.frame.push(glyph);
            }
            self.frame.push('\n');
        }

        let mut out = stdout().lock();
        if let Err(err) = out
            .write_all(self.frame.as_bytes())
            .and_then(|()| out.flush())
        {
            error!("display: dropped frame: {err}");
        }
        thread::sleep(Self::FRAME_DELAY);
    }

    fn close(&mut self) {
        let mut out = stdout().lock();
        let _ = out.write_all(b"\x1b[2J\x1b[H\x1b[?25h");
        let _ = out.flush();
    }
}

////////////////////////////////////////////////////////////////////////////////

/// What a [`FrameSink`] saw: draw count, last dimensions, and a copy of the
/// last framebuffer.
#[derive(Default)]
pub struct FrameLog {
    pub draws: usize,
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Recording display for tests. Hand the machine the sink, keep the log.
#[derive(Default)]
pub struct FrameSink {
    log: Arc<Mutex<FrameLog>>,
}

impl FrameSink {
    pub fn new() -> FrameSink {
        Default::default()
    }

    pub fn log(&self) -> Arc<Mutex<FrameLog>> {
        self.log.clone()
    }
}

impl Display for FrameSink {
    fn init(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn draw(&mut self, width: usize, height: usize, data: &[u8]) {
        let mut log = self.log.lock().unwrap();
        log.draws += 1;
        log.width = width;
        log.height = height;
        log.data.clear();
        log.data.extend_from_slice(data);
    }

    fn close(&mut self) {}
}

////////////////////////////////////////////////////////////////////////////////
