
use crate::machine::{Machine, RuntimeError};
use common::constants::{CARRY_FLAG, CODE_POINTER, ZERO_FLAG};
use common::isa::Mode;

#[derive(Debug, Clone, Copy)]
pub(crate) enum ArithKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithKind {
    fn name(self) -> &'static str {
        match self {
            ArithKind::Add => "ADD",
            ArithKind::Sub => "SUB",
            ArithKind::Mul => "MUL",
            ArithKind::Div => "DIV",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum LogicKind {
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl LogicKind {
    fn name(self) -> &'static str {
        match self {
            LogicKind::And => "AND",
            LogicKind::Or => "OR",
            LogicKind::Xor => "XOR",
            LogicKind::Shl => "SHL",
            LogicKind::Shr => "SHR",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum CompareKind {
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
}

impl CompareKind {
    fn name(self) -> &'static str {
        match self {
            CompareKind::Equal => "CMP",
            CompareKind::NotEqual => "CNT",
            CompareKind::GreaterOrEqual => "LGE",
            CompareKind::LessOrEqual => "SME",
        }
    }
}

impl Machine {
    /// Resolve `(v1, v2, destination)` for a binary operation. The register
    /// operand names the destination cell; only mode RR dereferences the
    /// second operand, every other source is taken verbatim. Mode IR mirrors
    /// the pair so source-first forms like `ADD 1 AX` land in the register.
    fn binary_operands(&self, op: &'static str) -> Result<(u16, u16, u16), RuntimeError> {
        match self.mode {
            Some(Mode::RR) => Ok((
                self.load_word(self.args[0])?,
                self.load_word(self.args[1])?,
                self.args[0],
            )),
            Some(Mode::RI | Mode::RA) => {
                Ok((self.load_word(self.args[0])?, self.args[1], self.args[0]))
            }
            Some(Mode::IR) => Ok((self.load_word(self.args[1])?, self.args[0], self.args[1])),
            _ => Err(RuntimeError::BadMode { op }),
        }
    }

    /// Value of a single-operand instruction: immediates verbatim, register
    /// and address operands through memory.
    fn operand_value(&self) -> Result<u16, RuntimeError> {
        if self.mode == Some(Mode::I) {
            Ok(self.args[0])
        } else {
            self.load_word(self.args[0])
        }
    }

    fn finish_arithmetic(&mut self, dest: u16, wide: i32) -> Result<(), RuntimeError> {
        let result = wide as u16;
        self.store_word(ZERO_FLAG, (result == 0) as u16)?;
        self.store_word(CARRY_FLAG, (wide != result as i32) as u16)?;
        self.store_word(dest, result)
    }

    fn finish_logic(&mut self, dest: u16, result: u16) -> Result<(), RuntimeError> {
        self.store_word(ZERO_FLAG, (result == 0) as u16)?;
        self.store_word(CARRY_FLAG, 0)?;
        self.store_word(dest, result)
    }

    /// Binary arithmetic over a widened intermediate; the carry flag records
    /// any difference between the wide result and its 16-bit truncation.
    pub(crate) fn perform_arithmetic(&mut self, kind: ArithKind) -> Result<(), RuntimeError> {
        let (v1, v2, dest) = self.binary_operands(kind.name())?;
        let wide = match kind {
            ArithKind::Add => v1 as i32 + v2 as i32,
            ArithKind::Sub => v1 as i32 - v2 as i32,
            ArithKind::Mul => v1 as i32 * v2 as i32,
            ArithKind::Div => {
                if v2 == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                v1 as i32 / v2 as i32
            }
        };
        self.finish_arithmetic(dest, wide)
    }

    /// INC and DEC: unary arithmetic on the cell named by the operand.
    pub(crate) fn perform_step(&mut self, delta: i32) -> Result<(), RuntimeError> {
        let v1 = self.load_word(self.args[0])?;
        self.finish_arithmetic(self.args[0], v1 as i32 + delta)
    }

    /// Bitwise operations always clear the carry flag. Shift counts of 16 or
    /// more produce zero.
    pub(crate) fn perform_logic(&mut self, kind: LogicKind) -> Result<(), RuntimeError> {
        let (v1, v2, dest) = self.binary_operands(kind.name())?;
        let result = match kind {
            LogicKind::And => v1 & v2,
            LogicKind::Or => v1 | v2,
            LogicKind::Xor => v1 ^ v2,
            LogicKind::Shl => v1.checked_shl(v2 as u32).unwrap_or(0),
            LogicKind::Shr => v1.checked_shr(v2 as u32).unwrap_or(0),
        };
        self.finish_logic(dest, result)
    }

    pub(crate) fn perform_not(&mut self) -> Result<(), RuntimeError> {
        let v1 = self.load_word(self.args[0])?;
        // TODO: a bitwise complement should be !v1. The legacy encoding is
        // `v & ^0xFFFF`, which always stores zero; kept until existing images
        // no longer depend on it.
        let result = v1 & !0xFFFF;
        self.finish_logic(self.args[0], result)
    }

    /// Comparisons store their 0/1 outcome and copy it into the zero flag,
    /// so a following JIF branches when the condition holds.
    pub(crate) fn perform_compare(&mut self, kind: CompareKind) -> Result<(), RuntimeError> {
        let (v1, v2, dest) = self.binary_operands(kind.name())?;
        let outcome = match kind {
            CompareKind::Equal => v1 == v2,
            CompareKind::NotEqual => v1 != v2,
            CompareKind::GreaterOrEqual => v1 >= v2,
            CompareKind::LessOrEqual => v1 <= v2,
        } as u16;
        self.store_word(ZERO_FLAG, outcome)?;
        self.store_word(CARRY_FLAG, 0)?;
        self.store_word(dest, outcome)
    }

    /// Copy a value between registers, immediates and memory per the mode
    /// table. Address operands dereference: the operand is the cell holding
    /// the effective address.
    pub(crate) fn perform_move(&mut self) -> Result<(), RuntimeError> {
        let (value, target) = match self.mode {
            Some(Mode::RR) => (self.load_word(self.args[0])?, self.args[1]),
            Some(Mode::RA) => (self.load_word(self.args[0])?, self.load_word(self.args[1])?),
            Some(Mode::AA) => {
                let pointer = self.load_word(self.args[0])?;
                (self.load_word(pointer)?, self.load_word(self.args[1])?)
            }
            Some(Mode::AR) => {
                let pointer = self.load_word(self.args[0])?;
                (self.load_word(pointer)?, self.args[1])
            }
            Some(Mode::IA) => (self.args[0], self.load_word(self.args[1])?),
            Some(Mode::IR) => (self.args[0], self.args[1]),
            _ => return Err(RuntimeError::BadMode { op: "MOV" }),
        };
        self.store_word(target, value)
    }

    pub(crate) fn perform_push(&mut self) -> Result<(), RuntimeError> {
        let value = self.operand_value()?;
        self.push_word(value)
    }

    pub(crate) fn perform_pop(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop_word()?;
        self.store_word(self.args[0], value)
    }

    /// JMP writes the code pointer unconditionally; JIF only when the zero
    /// flag is set.
    pub(crate) fn perform_jump(&mut self, always: bool) -> Result<(), RuntimeError> {
        let target = self.operand_value()?;
        if always || self.load_word(ZERO_FLAG)? == 1 {
            self.store_word(CODE_POINTER, target)?;
        }
        Ok(())
    }

    /// Save the current code pointer on the stack, then jump.
    pub(crate) fn perform_call(&mut self) -> Result<(), RuntimeError> {
        let target = self.operand_value()?;
        let current = self.load_word(CODE_POINTER)?;
        self.push_word(current)?;
        self.store_word(CODE_POINTER, target)
    }

    pub(crate) fn perform_return(&mut self) -> Result<(), RuntimeError> {
        let pointer = self.pop_word()?;
        self.store_word(CODE_POINTER, pointer)
    }

    pub(crate) fn perform_halt(&mut self) {
        self.running = false;
    }
}

////////////////////////////////////////////////////////////////////////////////
