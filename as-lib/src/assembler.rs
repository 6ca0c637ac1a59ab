
use std::collections::HashMap;

use crate::parse::{classify, parse_number, AsmError};
use common::constants::{CODE_BASE, WORD_SIZE};
use common::isa::{header, Mode, Opcode};

use log::trace;

pub fn assemble(prog: &str) -> Result<Vec<u8>, AsmError> {
    Assembler::new().assemble(prog).map(|(image, _)| image)
}

pub fn assemble_with_symbols(prog: &str) -> Result<(Vec<u8>, HashMap<String, u16>), AsmError> {
    Assembler::new().assemble(prog)
}

/// A deferred label use: patch word `arg + 1` of emitted line `line` once the
/// label resolves.
struct LabelRef {
    name: String,
    line: usize,
    arg: usize,
}

struct Assembler {
    lines: Vec<Vec<u16>>,
    listing: Vec<String>,
    labels: HashMap<String, u16>,
    references: Vec<LabelRef>,
}

impl Assembler {
    fn new() -> Assembler {
        Assembler {
            lines: Vec::new(),
            listing: Vec::new(),
            labels: HashMap::new(),
            references: Vec::new(),
        }
    }

    fn assemble(mut self, prog: &str) -> Result<(Vec<u8>, HashMap<String, u16>), AsmError> {
        // Pass one: encode lines, note label definitions by instruction index.
        for (active, number) in prog.lines().zip(1..) {
            let active = active.trim();
            if active.is_empty() || active.starts_with(';') {
                continue;
            }

            if let Some(name) = active.strip_suffix(':') {
                self.labels.insert(name.to_string(), self.lines.len() as u16);
                continue;
            }

            let tokens: Vec<&str> = active.split(' ').collect();
            let mnemonic = tokens[0].to_uppercase();
            let words = if mnemonic == "DB" {
                self.encode_data(active, number)?
            } else {
                self.encode_instruction(&mnemonic, &tokens[1..], number)?
            };
            self.lines.push(words);
            self.listing.push(active.to_string());
        }

        // Map instruction indices to byte offsets. The extra final entry lets
        // a trailing label point one past the image.
        let mut offsets = Vec::with_capacity(self.lines.len() + 1);
        let mut total = 0u16;
        for line in &self.lines {
            offsets.push(total);
            total += line.len() as u16 * WORD_SIZE;
        }
        offsets.push(total);

        for slot in self.labels.values_mut() {
            *slot = offsets[*slot as usize] + CODE_BASE;
        }

        for reference in &self.references {
            let addr = *self
                .labels
                .get(&reference.name)
                .ok_or_else(|| AsmError::UnresolvedLabel(reference.name.clone()))?;
            self.lines[reference.line][reference.arg + 1] = addr;
        }

        for (index, words) in self.lines.iter().enumerate() {
            trace!(
                "{:04X} {:<24} {:04X?}",
                offsets[index] + CODE_BASE,
                self.listing[index],
                words
            );
        }

        let mut image = Vec::with_capacity(total as usize);
        for words in &self.lines {
            for word in words {
                image.extend_from_slice(&word.to_be_bytes());
            }
        }
        Ok((image, self.labels))
    }

    /// `DB "…"` emits one word per UTF-16 code unit; `DB <num>` emits one word.
    fn encode_data(&mut self, active: &str, number: usize) -> Result<Vec<u16>, AsmError> {
        let Some(rest) = active.get(3..) else {
            return Err(AsmError::MissingOperand { line: number });
        };
        if rest.starts_with('"') {
            Ok(rest.trim_matches('"').encode_utf16().collect())
        } else {
            let value = parse_number(rest).ok_or_else(|| AsmError::MalformedNumber {
                line: number,
                text: rest.to_string(),
            })?;
            Ok(vec![value])
        }
    }

    fn encode_instruction(
        &mut self,
        mnemonic: &str,
        args: &[&str],
        number: usize,
    ) -> Result<Vec<u16>, AsmError> {
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownMnemonic {
            line: number,
            name: mnemonic.to_string(),
        })?;

        let mut words = vec![0u16];
        let mut mode = Mode::None;
        for (index, raw) in args.iter().enumerate() {
            let operand = classify(raw, number)?;
            if let Some(name) = operand.label {
                self.references.push(LabelRef {
                    name,
                    line: self.lines.len(),
                    arg: index,
                });
            }
            mode = mode
                .with_arg(operand.kind)
                .ok_or_else(|| AsmError::TooManyOperands {
                    line: number,
                    name: mnemonic.to_string(),
                })?;
            words.push(operand.value);
        }
        words[0] = header(opcode, mode);
        Ok(words)
    }
}

////////////////////////////////////////////////////////////////////////////////
