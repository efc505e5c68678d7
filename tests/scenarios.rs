use pdp11::cpu::decode::{encode, DecodeError, Instruction, Mode, Operand};
use pdp11::cpu::memory::MemoryError;
use pdp11::{ConditionCodes, Cpu, CpuError, CpuState, Statistics};

fn mov_r0_r1() -> u16 {
    encode(&Instruction::Mov { src: Operand::reg(0), dst: Operand::reg(1) })
}

#[test]
fn halt_only_program() {
    let mut cpu = Cpu::with_program(&[0]).unwrap();
    cpu.run().unwrap();

    assert_eq!(cpu.state, CpuState::Halted);
    assert_eq!(
        *cpu.stats(),
        Statistics {
            instructions_executed: 1,
            instruction_words_fetched: 1,
            ..Statistics::default()
        }
    );
}

#[test]
fn mov_register_to_register() {
    assert_eq!(mov_r0_r1(), 0o010001);
    let mut cpu = Cpu::with_program(&[mov_r0_r1(), 0]).unwrap();
    cpu.run().unwrap();

    assert_eq!(cpu.regs.get(1), 0);
    assert_eq!(cpu.flags, ConditionCodes { n: false, z: true, v: false, c: false });
    assert_eq!(cpu.stats().instructions_executed, 2);
}

#[test]
fn add_signed_overflow() {
    let add = encode(&Instruction::Add { src: Operand::reg(0), dst: Operand::reg(1) });
    assert_eq!(add, 0o060001);

    let mut cpu = Cpu::with_program(&[add, 0]).unwrap();
    cpu.regs.set(0, 0o077777);
    cpu.regs.set(1, 1);
    cpu.run().unwrap();

    assert_eq!(cpu.regs.get(1), 0o100000);
    assert_eq!(cpu.flags, ConditionCodes { n: true, z: false, v: true, c: false });
}

#[test]
fn sob_loop() {
    let sob = encode(&Instruction::Sob { reg: 2, offset: 1 });
    assert_eq!(sob, 0o077201);

    let mut cpu = Cpu::with_program(&[sob, 0]).unwrap();
    cpu.regs.set(2, 2);

    // First pass: R2 drops to 1 and the branch returns to the SOB itself
    cpu.step().unwrap();
    assert_eq!(cpu.regs.get(2), 1);
    assert_eq!(cpu.regs.pc(), 0);

    cpu.run().unwrap();
    assert_eq!(cpu.regs.get(2), 0);
    assert_eq!(cpu.stats().branches_executed, 2);
    assert_eq!(cpu.stats().branches_taken, 1);
    assert!(cpu.is_halted());
}

#[test]
fn invalid_instruction_stops_run() {
    let mut cpu = Cpu::with_program(&[mov_r0_r1(), 0o170000, 0]).unwrap();
    let err = cpu.run().unwrap_err();

    assert_eq!(err, CpuError::InvalidOpcode { pc: 2, source: DecodeError::InvalidOpcode(0o170000) });
    assert_eq!(cpu.state, CpuState::Failed);
    assert!(cpu.step().is_err());
}

#[test]
fn index_modes_through_immediate_and_memory() {
    // MOV #100, R3 ; ADD 4(R3), R0 ; MOV R0, (R3)+ ; HALT
    let program = [
        encode(&Instruction::Mov { src: Operand::new(Mode::Autoincrement, 7), dst: Operand::reg(3) }),
        0o100,
        encode(&Instruction::Add { src: Operand::new(Mode::Index, 3), dst: Operand::reg(0) }),
        4,
        encode(&Instruction::Mov { src: Operand::reg(0), dst: Operand::new(Mode::Autoincrement, 3) }),
        0,
    ];
    let mut cpu = Cpu::with_program(&program).unwrap();
    cpu.mem.write(0o104, 30).unwrap();
    cpu.regs.set(0, 12);
    cpu.run().unwrap();

    assert_eq!(cpu.regs.get(0), 42);
    assert_eq!(cpu.mem.read(0o100).unwrap(), 42);
    assert_eq!(cpu.regs.get(3), 0o102);

    let stats = cpu.stats();
    assert_eq!(stats.instructions_executed, 4);
    assert_eq!(stats.instruction_words_fetched, 6);
    assert_eq!(stats.data_words_read, 3);
    assert_eq!(stats.data_words_written, 1);
}

#[test]
fn memory_fault_is_fatal() {
    // CMP (R0), R0 with R0 beyond a 16-word memory
    let program = [
        encode(&Instruction::Cmp { src: Operand::new(Mode::RegisterDeferred, 0), dst: Operand::reg(0) }),
        0,
    ];
    let mut cpu = Cpu::new(16);
    cpu.load_program(&program).unwrap();
    cpu.regs.set(0, 0o1000);

    let err = cpu.run().unwrap_err();
    assert_eq!(
        err,
        CpuError::MemoryFault { pc: 0, source: MemoryError::Fault { addr: 0o1000, words: 16 } }
    );
    assert_eq!(err.pc(), Some(0));
}

#[test]
fn stack_push_needs_full_address_space() {
    // MOV R0,-(R6) with R6 = 0 writes the top word of the 64K byte space
    let push = encode(&Instruction::Mov { src: Operand::reg(0), dst: Operand::new(Mode::Autodecrement, 6) });
    let mut cpu = Cpu::with_program(&[push, 0]).unwrap();
    let err = cpu.run().unwrap_err();
    assert_eq!(
        err,
        CpuError::MemoryFault { pc: 0, source: MemoryError::Fault { addr: 0o177776, words: 16 * 1024 } }
    );

    let mut cpu = Cpu::new(32 * 1024);
    cpu.load_program(&[push, 0]).unwrap();
    cpu.regs.set(0, 0o1234);
    cpu.run().unwrap();
    // The autodecrement source read succeeds; a non-autoincrement destination lands in R6
    assert_eq!(cpu.regs.get(6), 0o1234);
    assert_eq!(cpu.stats().data_words_read, 1);
    assert_eq!(cpu.state, CpuState::Halted);
}
