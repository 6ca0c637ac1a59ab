
use std::fmt::{self, Write as _};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use crate::io::{Display, Interrupt, NullDisplay};
use crate::operations::{ArithKind, CompareKind, LogicKind};
use common::constants::*;
use common::isa::{self, Mode, Opcode};
use common::mem::{Memory, OutOfRange};

use log::trace;
use num_traits::FromPrimitive;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("iterate: {0}")]
    Fetch(OutOfRange),

    #[error("stack: push past top of stack segment")]
    StackOverflow,

    #[error("interrupt: queue closed")]
    QueueClosed,

    #[error("interrupt: {0}")]
    Deliver(OutOfRange),

    #[error("runtime: division by zero")]
    DivisionByZero,

    #[error("runtime: {op} does not support its operand mode")]
    BadMode { op: &'static str },

    #[error("runtime: {0}")]
    Memory(#[from] OutOfRange),

    #[error("display: {0}")]
    Display(#[from] std::io::Error),
}

/// The machine: 64 KiB of memory holding every register, flag and pointer,
/// plus the decoded state of the current instruction. Each instance is fully
/// independent.
pub struct Machine {
    mem: Memory,
    next: u16,
    pub(crate) mode: Option<Mode>,
    command: u16,
    pub(crate) args: [u16; MAX_CMD_ARGS],
    pub(crate) running: bool,
    display: Box<dyn Display>,
    ir_tx: Option<Sender<Interrupt>>,
    ir_rx: Receiver<Interrupt>,
}

impl Machine {
    pub fn new() -> Machine {
        Machine::with_display(Box::new(NullDisplay))
    }

    pub fn with_display(display: Box<dyn Display>) -> Machine {
        let (ir_tx, ir_rx) = channel();
        Machine {
            mem: Memory::new(),
            next: 0,
            mode: None,
            command: 0,
            args: [0; MAX_CMD_ARGS],
            running: false,
            display,
            ir_tx: Some(ir_tx),
            ir_rx,
        }
    }

    /// Handle for producers (keyboard pollers, timers) to enqueue interrupts.
    /// `None` once the queue has been closed.
    pub fn interrupt_sender(&self) -> Option<Sender<Interrupt>> {
        self.ir_tx.clone()
    }

    /// Drop the machine's own sender. Once every producer handle is gone too,
    /// the next cycle fails with the fatal queue-closed error.
    pub fn close_interrupt_queue(&mut self) {
        self.ir_tx = None;
    }

    /// Initialize memory, load the image at [`CODE_BASE`] and run until HLT
    /// or a fatal error. The display is closed on either path.
    pub fn boot(&mut self, code: &[u8]) -> Result<(), RuntimeError> {
        self.initialize()?;
        self.program(code)?;
        self.display.init()?;
        let result = self.run();
        self.display.close();
        result
    }

    fn initialize(&mut self) -> Result<(), RuntimeError> {
        self.mem = Memory::new();

        // Load base values. The HLT sentinel at CODE_BASE makes an empty
        // program image halt on its first fetch.
        self.mem.store_word(CODE_POINTER, CODE_BASE)?;
        self.mem.store_word(STACK_POINTER, STACK_BASE)?;
        self.mem
            .store_word(CODE_BASE, isa::header(Opcode::Hlt, Mode::None))?;
        self.mem.store_word(INTERRUPT, MAX_MEMORY)?;

        // Init graphics.
        self.mem.store_word(OUT_MODE, OUT_MODE_TERM)?;
        let mut pointer = OUT_COLORS;
        for color in BASE_COLORS {
            self.mem.store_word(pointer, color)?;
            pointer += WORD_SIZE;
        }

        self.running = true;
        Ok(())
    }

    fn program(&mut self, code: &[u8]) -> Result<(), RuntimeError> {
        if CODE_BASE as usize + code.len() > self.mem.size() {
            return Err(OutOfRange(MAX_MEMORY).into());
        }
        for (offset, byte) in code.iter().enumerate() {
            self.mem.store_byte(CODE_BASE + offset as u16, *byte)?;
        }
        Ok(())
    }

    fn run(&mut self) -> Result<(), RuntimeError> {
        while self.running {
            self.iterate()?;
            self.parse_state()?;
            self.handle()?;
            if !self.running {
                break;
            }
            self.update_interrupts()?;
            self.tick_display()?;
        }
        Ok(())
    }

    /// Fetch one word at the code pointer and advance it. Running past the
    /// end of memory delivers the overflow interrupt and yields a HLT
    /// sentinel instead of a word.
    fn fetch_word(&mut self) -> Result<u16, RuntimeError> {
        let pointer = self.mem.load_word(CODE_POINTER).map_err(RuntimeError::Fetch)?;
        if pointer > MAX_MEMORY - WORD_SIZE {
            self.interrupt(IR_OVERFLOW_CODE, IR_OVERFLOW)?;
            return Ok(isa::header(Opcode::Hlt, Mode::None));
        }
        self.mem
            .store_word(CODE_POINTER, pointer + WORD_SIZE)
            .map_err(RuntimeError::Fetch)?;
        self.mem.load_word(pointer).map_err(RuntimeError::Fetch)
    }

    fn iterate(&mut self) -> Result<(), RuntimeError> {
        self.next = self.fetch_word()?;
        Ok(())
    }

    /// Split the header word and fetch as many operand words as the mode
    /// calls for.
    fn parse_state(&mut self) -> Result<(), RuntimeError> {
        self.mode = Mode::from_header(self.next);
        self.command = self.next & isa::CMD_MASK;

        let count = self.mode.map_or(0, Mode::operand_count);
        for slot in 0..count {
            self.args[slot] = self.fetch_word()?;
        }
        trace!("{:04X} {:04X?}", self.next, &self.args[..count]);
        Ok(())
    }

    fn handle(&mut self) -> Result<(), RuntimeError> {
        let Some(opcode) = Opcode::from_u16(self.command) else {
            trace!("skipping unknown opcode {:#06X}", self.command);
            return Ok(());
        };
        match opcode {
            Opcode::Add => self.perform_arithmetic(ArithKind::Add),
            Opcode::Sub => self.perform_arithmetic(ArithKind::Sub),
            Opcode::Mul => self.perform_arithmetic(ArithKind::Mul),
            Opcode::Div => self.perform_arithmetic(ArithKind::Div),
            Opcode::Inc => self.perform_step(1),
            Opcode::Dec => self.perform_step(-1),
            Opcode::And => self.perform_logic(LogicKind::And),
            Opcode::Or => self.perform_logic(LogicKind::Or),
            Opcode::Xor => self.perform_logic(LogicKind::Xor),
            Opcode::Not => self.perform_not(),
            Opcode::Shl => self.perform_logic(LogicKind::Shl),
            Opcode::Shr => self.perform_logic(LogicKind::Shr),
            Opcode::Mov => self.perform_move(),
            Opcode::Push => self.perform_push(),
            Opcode::Pop => self.perform_pop(),
            Opcode::Cmp => self.perform_compare(CompareKind::Equal),
            Opcode::Cnt => self.perform_compare(CompareKind::NotEqual),
            Opcode::Lge => self.perform_compare(CompareKind::GreaterOrEqual),
            Opcode::Sme => self.perform_compare(CompareKind::LessOrEqual),
            Opcode::Jif => self.perform_jump(false),
            Opcode::Jmp => self.perform_jump(true),
            Opcode::Call => self.perform_call(),
            Opcode::Ret => self.perform_return(),
            Opcode::Hlt => {
                self.perform_halt();
                Ok(())
            }
        }
    }

    /// Drain at most one pending asynchronous interrupt: save the return
    /// site on the stack, record the code and jump through the handler slot.
    fn update_interrupts(&mut self) -> Result<(), RuntimeError> {
        match self.ir_rx.try_recv() {
            Ok(ir) => {
                let pointer = self
                    .mem
                    .load_word(CODE_POINTER)
                    .map_err(RuntimeError::Deliver)?;
                self.push_word(pointer)?;
                self.interrupt(ir.code, ir.reason)
            }
            Err(TryRecvError::Empty) => Ok(()),
            Err(TryRecvError::Disconnected) => Err(RuntimeError::QueueClosed),
        }
    }

    /// Synchronous delivery: record the code and jump through the handler
    /// slot. The caller decides whether a return site is saved first.
    pub(crate) fn interrupt(&mut self, code: u16, reason: u16) -> Result<(), RuntimeError> {
        self.mem
            .store_word(INTERRUPT, code)
            .map_err(RuntimeError::Deliver)?;
        let handler = self.mem.load_word(reason).map_err(RuntimeError::Deliver)?;
        self.mem
            .store_word(CODE_POINTER, handler)
            .map_err(RuntimeError::Deliver)
    }

    pub(crate) fn push_word(&mut self, value: u16) -> Result<(), RuntimeError> {
        let stack = self.load_word(STACK_POINTER)?;
        if stack >= STACK_MAX - WORD_SIZE {
            self.interrupt(IR_OVERFLOW_STACK, IR_OVERFLOW)?;
            return Err(RuntimeError::StackOverflow);
        }
        let next = stack + WORD_SIZE;
        self.store_word(next, value)?;
        self.store_word(STACK_POINTER, next)?;
        Ok(())
    }

    /// Pop never underflows: at the floor it rereads the base cell and
    /// leaves the stack pointer in place.
    pub(crate) fn pop_word(&mut self) -> Result<u16, RuntimeError> {
        let stack = self.load_word(STACK_POINTER)?;
        let value = self.load_word(stack)?;
        self.store_word(stack, 0)?;
        if stack > STACK_BASE {
            self.store_word(STACK_POINTER, stack - WORD_SIZE)?;
        }
        Ok(value)
    }

    pub fn load_word(&self, addr: u16) -> Result<u16, RuntimeError> {
        Ok(self.mem.load_word(addr)?)
    }

    pub fn store_word(&mut self, addr: u16, value: u16) -> Result<(), RuntimeError> {
        Ok(self.mem.store_word(addr, value)?)
    }

    fn tick_display(&mut self) -> Result<(), RuntimeError> {
        let Machine { mem, display, .. } = self;
        let data = mem.segment(OUT_CHARS, OUT_MODE)?;
        display.draw(DISPLAY_WIDTH, DISPLAY_HEIGHT, data);
        Ok(())
    }

    /// Hex dump of one 256-byte segment, a word per column.
    pub fn dump_segment(&self, seg: u8) -> String {
        let start = seg as u16 * 256;
        let mut dump = format!("SEGMENT {:04X} - {:04X}\n-------------------", start, start + 0xFF);
        for addr in (start..=start + 0xFF).step_by(WORD_SIZE as usize) {
            if addr % 16 == 0 {
                dump.push('\n');
            }
            match self.mem.load_word(addr) {
                Ok(word) => {
                    let _ = write!(dump, "{:<5}", format!("{word:04X}"));
                }
                Err(_) => {
                    dump.push_str("err");
                    return dump;
                }
            }
        }
        dump
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump_segment(0))
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////
