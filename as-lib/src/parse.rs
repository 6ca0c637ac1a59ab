
use common::constants::*;
use common::isa::ArgKind;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: unknown mnemonic {name:?}")]
    UnknownMnemonic { line: usize, name: String },

    #[error("line {line}: malformed number {text:?}")]
    MalformedNumber { line: usize, text: String },

    #[error("line {line}: malformed operand {text:?}")]
    MalformedOperand { line: usize, text: String },

    #[error("line {line}: too many operands for {name}")]
    TooManyOperands { line: usize, name: String },

    #[error("line {line}: DB needs an operand")]
    MissingOperand { line: usize },

    #[error("unresolved label {0:?}")]
    UnresolvedLabel(String),
}

/// A classified operand token. Label references carry a deferred name; their
/// value slot stays zero until the second pass patches it.
#[derive(Debug, PartialEq, Eq)]
pub struct Operand {
    pub kind: ArgKind,
    pub value: u16,
    pub label: Option<String>,
}

/// Cell addresses reachable by register name. Names are upper-case and
/// case-sensitive, like the image format they stand in for.
pub fn register(name: &str) -> Option<u16> {
    Some(match name {
        "AX" => REGISTER_AX,
        "BX" => REGISTER_BX,
        "CX" => REGISTER_CX,
        "DX" => REGISTER_DX,
        "IR" => INTERRUPT,
        "IRS" => IR_STATE,
        "IRK" => IR_KEYBOARD,
        "IRO" => IR_OVERFLOW,
        "SB" => STACK_BASE,
        "CP" => CODE_POINTER,
        "SP" => STACK_POINTER,
        "ZF" => ZERO_FLAG,
        "CF" => CARRY_FLAG,
        _ => return None,
    })
}

/// Symbolic constants substituted as immediates.
pub fn system_pointer(name: &str) -> Option<u16> {
    Some(match name {
        "SM" => STACK_MAX,
        "OCH" => OUT_CHARS,
        "OCL" => OUT_COLORS,
        "CB" => CODE_BASE,
        "OMD" => OUT_MODE,
        _ => return None,
    })
}

/// Hex (`0x2A`), octal (`052`) or decimal (`42`) literal.
pub fn parse_number(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x") {
        u16::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u16::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

fn looks_numeric(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Classify one operand token. Brackets force address kind over whatever the
/// inner text alone would classify as.
pub fn classify(raw: &str, line: usize) -> Result<Operand, AsmError> {
    let (text, bracketed) = if raw.starts_with('[') {
        (raw.trim_matches(|c| c == '[' || c == ']'), true)
    } else {
        (raw, false)
    };

    let (kind, value, label) = if looks_numeric(text) {
        let value = parse_number(text).ok_or_else(|| AsmError::MalformedNumber {
            line,
            text: text.to_string(),
        })?;
        (ArgKind::Immediate, value, None)
    } else if !is_identifier(text) {
        return Err(AsmError::MalformedOperand {
            line,
            text: raw.to_string(),
        });
    } else if let Some(addr) = register(text) {
        (ArgKind::Register, addr, None)
    } else if let Some(addr) = system_pointer(text) {
        (ArgKind::Immediate, addr, None)
    } else {
        (ArgKind::Immediate, 0, Some(text.to_string()))
    };

    let kind = if bracketed { ArgKind::Address } else { kind };
    Ok(Operand { kind, value, label })
}

////////////////////////////////////////////////////////////////////////////////
