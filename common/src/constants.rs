pub const WORD_SIZE: u16 = 2; // Bytes
pub const MAX_CMD_ARGS: usize = 2; // Maximum number of operand words per instruction.
pub const MAX_MEMORY: u16 = 0xFFFF;

// Well-known cells. The register file is a reserved stretch of low memory;
// a "register" is just an address.
pub const CODE_POINTER: u16 = 0x0000;
pub const STACK_POINTER: u16 = 0x0002;
pub const ZERO_FLAG: u16 = 0x0004;
pub const CARRY_FLAG: u16 = 0x0006;
pub const REGISTER_AX: u16 = 0x0008;
pub const REGISTER_BX: u16 = 0x000A;
pub const REGISTER_CX: u16 = 0x000C;
pub const REGISTER_DX: u16 = 0x000E;
pub const INTERRUPT: u16 = 0x0010;
pub const IR_STATE: u16 = 0x0012;
pub const IR_KEYBOARD: u16 = 0x0014;
pub const IR_OVERFLOW: u16 = 0x0016;

pub const STACK_BASE: u16 = 0x0100;
pub const STACK_MAX: u16 = 0x01FF;

pub const OUT_CHARS: u16 = 0x1000;
pub const OUT_COLORS: u16 = 0x1F00;
pub const OUT_MODE: u16 = 0x1FFE;
pub const OUT_MODE_TERM: u16 = 0x0001;

pub const CODE_BASE: u16 = 0x2000;

pub const IR_OVERFLOW_CODE: u16 = 0x1;
pub const IR_OVERFLOW_STACK: u16 = 0x2;

pub const DISPLAY_WIDTH: usize = 80;
pub const DISPLAY_HEIGHT: usize = 24;

pub const BASE_COLORS: [u16; 8] = [
    0x000, // Black
    0xFFF, // White
    0xF00, // Red
    0x0F0, // Green
    0x00F, // Blue
    0xFF0, // Yellow
    0xF0F, // Fuchsia
    0x0FF, // Aqua
];
