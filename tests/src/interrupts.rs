
use as_lib::assemble;
use common::constants::*;
use emu_lib::{Interrupt, Machine};

#[test]
fn keyboard_interrupt_runs_the_installed_handler() {
    let bin = assemble(r#"
        MOV HANDLER IRK
        MOV AX AX
        MOV AX AX
        HLT
        HANDLER:
        MOV 1 CX
        RET
    "#)
    .unwrap();
    let mut machine = Machine::new();
    let sender = machine.interrupt_sender().unwrap();
    sender.send(Interrupt::keyboard(0x61)).unwrap();
    machine.boot(&bin).unwrap();

    assert_eq!(machine.load_word(REGISTER_CX).unwrap(), 1);
    assert_eq!(machine.load_word(INTERRUPT).unwrap(), 0x61);
    // The handler returned and the stack drained.
    assert_eq!(machine.load_word(STACK_POINTER).unwrap(), STACK_BASE);
}

#[test]
fn one_interrupt_per_cycle() {
    // Both records are queued up front; the handler bumps CX once per
    // delivery, and each delivery lands on a separate cycle.
    let bin = assemble(r#"
        MOV HANDLER IRK
        MOV AX AX
        MOV AX AX
        MOV AX AX
        HLT
        HANDLER:
        INC CX
        RET
    "#)
    .unwrap();
    let mut machine = Machine::new();
    let sender = machine.interrupt_sender().unwrap();
    sender.send(Interrupt::keyboard(0x01)).unwrap();
    sender.send(Interrupt::keyboard(0x02)).unwrap();
    machine.boot(&bin).unwrap();

    assert_eq!(machine.load_word(REGISTER_CX).unwrap(), 2);
    assert_eq!(machine.load_word(INTERRUPT).unwrap(), 0x02);
    assert_eq!(machine.load_word(STACK_POINTER).unwrap(), STACK_BASE);
}

#[test]
fn state_interrupts_use_their_own_slot() {
    let bin = assemble(r#"
        MOV HANDLER IRS
        MOV AX AX
        HLT
        HANDLER:
        MOV 5 BX
        RET
    "#)
    .unwrap();
    let mut machine = Machine::new();
    let sender = machine.interrupt_sender().unwrap();
    sender.send(Interrupt::state(0x99)).unwrap();
    machine.boot(&bin).unwrap();

    assert_eq!(machine.load_word(REGISTER_BX).unwrap(), 5);
    assert_eq!(machine.load_word(INTERRUPT).unwrap(), 0x99);
}

#[test]
fn uninstalled_handler_vectors_to_zero() {
    // Nothing was written to the keyboard slot, so delivery jumps to address
    // zero and execution falls apart there; the delivery itself still went
    // through.
    let bin = assemble(r#"
        MOV AX AX
        HLT
    "#)
    .unwrap();
    let mut machine = Machine::new();
    let sender = machine.interrupt_sender().unwrap();
    sender.send(Interrupt::keyboard(0x7F)).unwrap();
    assert!(machine.boot(&bin).is_err());
    assert_eq!(machine.load_word(INTERRUPT).unwrap(), 0x7F);
}

#[test]
fn queue_survives_while_a_sender_exists() {
    let bin = assemble(r#"
        MOV AX AX
        HLT
    "#)
    .unwrap();
    let mut machine = Machine::new();
    let sender = machine.interrupt_sender().unwrap();
    machine.close_interrupt_queue();
    // The external producer handle keeps the queue open.
    machine.boot(&bin).unwrap();
    drop(sender);
}
