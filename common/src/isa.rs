
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

/// Low byte of the header word: the operation code.
pub const CMD_MASK: u16 = 0x00FF;
/// High byte of the header word: the addressing-mode flag.
pub const FLAG_MASK: u16 = 0xFF00;

const MODE_SHIFT: u16 = 8;

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum Opcode {
    Add = 0x01,
    Sub,
    Mul,
    Div,
    Inc,
    Dec,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Mov,
    Push,
    Pop,
    Cmp,
    Cnt,
    Jif,
    Jmp,
    Call,
    Ret,
    Hlt,
    Lge,
    Sme,
}

impl Opcode {
    pub fn from_header(word: u16) -> Option<Opcode> {
        Opcode::from_u16(word & CMD_MASK)
    }

    /// Upper-case mnemonic lookup; callers fold case first.
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Some(match name {
            "ADD" => Opcode::Add,
            "SUB" => Opcode::Sub,
            "MUL" => Opcode::Mul,
            "DIV" => Opcode::Div,
            "INC" => Opcode::Inc,
            "DEC" => Opcode::Dec,
            "AND" => Opcode::And,
            "OR" => Opcode::Or,
            "XOR" => Opcode::Xor,
            "NOT" => Opcode::Not,
            "SHL" => Opcode::Shl,
            "SHR" => Opcode::Shr,
            "MOV" => Opcode::Mov,
            "PUSH" => Opcode::Push,
            "POP" => Opcode::Pop,
            "CMP" => Opcode::Cmp,
            "CNT" => Opcode::Cnt,
            "JIF" => Opcode::Jif,
            "JMP" => Opcode::Jmp,
            "CALL" => Opcode::Call,
            "RET" => Opcode::Ret,
            "HLT" => Opcode::Hlt,
            "LGE" => Opcode::Lge,
            "SME" => Opcode::Sme,
            _ => return None,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Addressing mode of an instruction. Single letters name operand kinds in
/// order: R register, I immediate, A address.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum Mode {
    None = 0x00,
    RR = 0x01,
    RI = 0x02,
    RA = 0x03,
    AA = 0x04,
    AR = 0x05,
    IA = 0x06,
    IR = 0x07,
    I = 0x08,
    R = 0x09,
    A = 0x0A,
    II = 0x0B,
    AI = 0x0C,
}

/// How a single operand token classifies before modes are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Register,
    Immediate,
    Address,
}

impl Mode {
    pub fn from_header(word: u16) -> Option<Mode> {
        Mode::from_u16((word & FLAG_MASK) >> MODE_SHIFT)
    }

    /// Number of operand words following the header.
    pub fn operand_count(self) -> usize {
        match self {
            Mode::None => 0,
            Mode::I | Mode::R | Mode::A => 1,
            _ => 2,
        }
    }

    /// Fold the next operand's kind into the running mode. Starts from
    /// `Mode::None`; two operands at most.
    pub fn with_arg(self, kind: ArgKind) -> Option<Mode> {
        use ArgKind::*;
        Some(match (self, kind) {
            (Mode::None, Register) => Mode::R,
            (Mode::None, Immediate) => Mode::I,
            (Mode::None, Address) => Mode::A,
            (Mode::I, Register) => Mode::IR,
            (Mode::I, Immediate) => Mode::II,
            (Mode::I, Address) => Mode::IA,
            (Mode::R, Register) => Mode::RR,
            (Mode::R, Immediate) => Mode::RI,
            (Mode::R, Address) => Mode::RA,
            (Mode::A, Register) => Mode::AR,
            (Mode::A, Immediate) => Mode::AI,
            (Mode::A, Address) => Mode::AA,
            _ => return None,
        })
    }
}

/// Build the header word: mode flag in the high byte, opcode in the low byte.
pub fn header(opcode: Opcode, mode: Mode) -> u16 {
    (mode.to_u16().unwrap() << MODE_SHIFT) | opcode.to_u16().unwrap()
}

////////////////////////////////////////////////////////////////////////////////
