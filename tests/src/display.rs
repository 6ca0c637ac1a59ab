
use as_lib::assemble;
use common::constants::*;
use emu_lib::{FrameSink, Machine};

#[test]
fn display_receives_the_character_region() {
    let bin = assemble(r#"
        MOV 1 AX
        HLT
    "#)
    .unwrap();
    let sink = FrameSink::new();
    let log = sink.log();
    let mut machine = Machine::with_display(Box::new(sink));
    machine.boot(&bin).unwrap();

    let log = log.lock().unwrap();
    // One draw per executed instruction; HLT stops the cycle first.
    assert_eq!(log.draws, 1);
    assert_eq!((log.width, log.height), (DISPLAY_WIDTH, DISPLAY_HEIGHT));
    assert_eq!(log.data.len(), (OUT_MODE - OUT_CHARS) as usize);
}

#[test]
fn framebuffer_words_reach_the_renderer_big_endian() {
    let bin = assemble(r#"
        MOV OCH BX
        MOV 0x41 AX
        MOV AX [BX]
        HLT
    "#)
    .unwrap();
    let sink = FrameSink::new();
    let log = sink.log();
    let mut machine = Machine::with_display(Box::new(sink));
    machine.boot(&bin).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.draws, 3);
    assert_eq!(&log.data[..2], &[0x00, 0x41]);
}

#[test]
fn guest_writes_land_before_the_same_cycle_draw() {
    // The store and the draw happen on one cycle: the frame drawn after
    // `MOV AX [BX]` must already carry the glyph.
    let bin = assemble(r#"
        MOV OCH BX
        MOV 0x5A AX
        MOV AX [BX]
        MOV 0 CX
        HLT
    "#)
    .unwrap();
    let sink = FrameSink::new();
    let log = sink.log();
    let mut machine = Machine::with_display(Box::new(sink));
    machine.boot(&bin).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.draws, 4);
    assert_eq!(&log.data[..2], &[0x00, 0x5A]);
}
