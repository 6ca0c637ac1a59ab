
use as_lib::assemble;
use common::constants::*;
use emu_lib::Machine;

fn run(prog: &str) -> Machine {
    let bin = assemble(prog).unwrap();
    let mut machine = Machine::new();
    machine.boot(&bin).unwrap();
    machine
}

#[test]
fn move_immediate() {
    let machine = run(r#"
        MOV 0x41 AX
        HLT
    "#);
    assert_eq!(machine.load_word(REGISTER_AX).unwrap(), 0x0041);
    // MOV leaves the flags alone.
    assert_eq!(machine.load_word(ZERO_FLAG).unwrap(), 0);
    assert_eq!(machine.load_word(CARRY_FLAG).unwrap(), 0);
}

#[test]
fn addition_with_carry() {
    let machine = run(r#"
        MOV 0xFFFF AX
        ADD 1 AX
        HLT
    "#);
    assert_eq!(machine.load_word(REGISTER_AX).unwrap(), 0x0000);
    assert_eq!(machine.load_word(ZERO_FLAG).unwrap(), 1);
    assert_eq!(machine.load_word(CARRY_FLAG).unwrap(), 1);
}

#[test]
fn loop_with_label() {
    let machine = run(r#"
        MOV 3 AX
        L:
        DEC AX
        JIF END
        JMP L
        END:
        HLT
    "#);
    assert_eq!(machine.load_word(REGISTER_AX).unwrap(), 0);
    assert_eq!(machine.load_word(ZERO_FLAG).unwrap(), 1);
}

#[test]
fn call_and_return() {
    let machine = run(r#"
        CALL SUB
        HLT
        SUB:
        MOV 7 BX
        RET
    "#);
    assert_eq!(machine.load_word(REGISTER_BX).unwrap(), 0x0007);
    assert_eq!(machine.load_word(STACK_POINTER).unwrap(), STACK_BASE);
    // CALL is 2 words, so HLT sits at CODE_BASE + 4; the code pointer rests
    // one word past it.
    assert_eq!(machine.load_word(CODE_POINTER).unwrap(), CODE_BASE + 6);
}

#[test]
fn assemble_string() {
    let bin = assemble("DB \"Hi\"").unwrap();
    assert_eq!(bin, vec![0x00, 0x48, 0x00, 0x69]);
}

#[test]
fn compare_and_branch() {
    let machine = run(r#"
        MOV 5 AX
        MOV 5 BX
        CMP AX BX
        JIF EQ
        HLT
        EQ:
        MOV 1 CX
        HLT
    "#);
    assert_eq!(machine.load_word(REGISTER_CX).unwrap(), 1);
}

#[test]
fn compare_not_taken_falls_through() {
    let machine = run(r#"
        MOV 5 AX
        MOV 6 BX
        CMP AX BX
        JIF EQ
        MOV 2 CX
        HLT
        EQ:
        MOV 1 CX
        HLT
    "#);
    assert_eq!(machine.load_word(REGISTER_CX).unwrap(), 2);
}

#[test]
fn pointer_walk_through_framebuffer() {
    // Walk a pointer through the character region, storing a glyph at the
    // first two cells.
    let machine = run(r#"
        MOV OCH BX
        MOV 0x48 AX
        MOV AX [BX]
        ADD 2 BX
        MOV 0x69 AX
        MOV AX [BX]
        HLT
    "#);
    assert_eq!(machine.load_word(OUT_CHARS).unwrap(), 0x48);
    assert_eq!(machine.load_word(OUT_CHARS + 2).unwrap(), 0x69);
}

#[test]
fn shifts_and_logic() {
    let machine = run(r#"
        MOV 1 AX
        SHL 4 AX
        MOV 0xFF BX
        AND AX BX
        HLT
    "#);
    assert_eq!(machine.load_word(REGISTER_AX).unwrap(), 0x10);
}

#[test]
fn push_pop_round_trip() {
    let machine = run(r#"
        PUSH 0x1234
        PUSH 0x5678
        POP AX
        POP BX
        HLT
    "#);
    assert_eq!(machine.load_word(REGISTER_AX).unwrap(), 0x5678);
    assert_eq!(machine.load_word(REGISTER_BX).unwrap(), 0x1234);
    assert_eq!(machine.load_word(STACK_POINTER).unwrap(), STACK_BASE);
}

#[test]
fn system_pointer_immediates_resolve() {
    let machine = run(r#"
        MOV CB AX
        MOV SM BX
        HLT
    "#);
    assert_eq!(machine.load_word(REGISTER_AX).unwrap(), CODE_BASE);
    assert_eq!(machine.load_word(REGISTER_BX).unwrap(), STACK_MAX);
}

#[test]
fn raw_image_matches_assembled_output() {
    // The image format is a bare big-endian word stream; hand-encoded words
    // must behave exactly like assembler output.
    let words: [u16; 4] = [0x070D, 9, REGISTER_DX, 0x0016];
    let image: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
    assert_eq!(image, assemble("MOV 9 DX\nHLT").unwrap());

    let mut machine = Machine::new();
    machine.boot(&image).unwrap();
    assert_eq!(machine.load_word(REGISTER_DX).unwrap(), 9);
}
