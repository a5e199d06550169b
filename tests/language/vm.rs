//! Integration tests for the interpreter, run without a host

use std::sync::Arc;

use mapscript_foundation::{ErrorKind, Fault, GameTime, Value};
use mapscript_language::{
    HostOp, Image, ImageBuilder, Interpreter, NoContext, Opcode, Outcome, Program, ProgramId,
    VmLimits,
};

fn image(name: &str, build: impl FnOnce(&mut ImageBuilder)) -> Arc<Image> {
    let mut b = ImageBuilder::new(name);
    build(&mut b);
    Arc::new(Image::parse(name, b.finish().unwrap()).unwrap())
}

fn run(vm: &Interpreter, image: Arc<Image>, name: &str) -> (Program, Outcome) {
    let mut ctx = NoContext::default();
    let mut program = Program::new(ProgramId(1), image, None);
    vm.run_initializer(&mut program, &mut ctx).unwrap();
    let index = program.procedure_index(name).unwrap();
    let outcome = vm
        .execute_procedure(&mut program, index, &[], &mut ctx)
        .unwrap();
    (program, outcome)
}

#[test]
fn loop_sums_with_globals() {
    // globals: [sum, n]
    let img = image("sum.int", |b| {
        b.push_int(0).push_int(4);
        b.procedure("start", 0);
        let top = b.label();
        let done = b.label();
        b.bind(top)
            .push_label(done)
            .push_int(1)
            .op(Opcode::FetchGlobal)
            .op(Opcode::If);
        b.push_int(0)
            .op(Opcode::FetchGlobal)
            .push_int(1)
            .op(Opcode::FetchGlobal)
            .op(Opcode::Add)
            .push_int(0)
            .op(Opcode::StoreGlobal);
        b.push_int(1)
            .op(Opcode::FetchGlobal)
            .push_int(1)
            .op(Opcode::Sub)
            .push_int(1)
            .op(Opcode::StoreGlobal);
        b.jump(top);
        b.bind(done)
            .push_int(0)
            .op(Opcode::FetchGlobal)
            .op(Opcode::PopReturn);
    });
    let (program, outcome) = run(&Interpreter::new(), img, "start");
    assert_eq!(outcome, Outcome::Returned(Value::Int(10)));
    assert_eq!(program.globals(), &[Value::Int(10), Value::Int(0)]);
}

#[test]
fn runaway_program_is_killed_by_the_budget() {
    let img = image("spin.int", |b| {
        b.procedure("start", 0);
        let top = b.label();
        b.bind(top).jump(top);
    });
    let vm = Interpreter::new().with_limits(VmLimits {
        max_instructions: 500,
        ..VmLimits::default()
    });
    let mut ctx = NoContext::default();
    let mut program = Program::new(ProgramId(1), img, None);
    vm.run_initializer(&mut program, &mut ctx).unwrap();

    let err = vm
        .execute_procedure(&mut program, 0, &[], &mut ctx)
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::FatalScript(Fault::InstructionLimit { limit: 500 })
    ));
    assert!(program.is_finished());
}

#[test]
fn host_calls_fail_without_a_host() {
    let img = image("host.int", |b| {
        b.procedure("start", 0)
            .host(HostOp::GameTime)
            .op(Opcode::PopReturn);
    });
    let vm = Interpreter::new();
    let mut ctx = NoContext::default();
    let mut program = Program::new(ProgramId(1), img, None);
    vm.run_initializer(&mut program, &mut ctx).unwrap();
    assert!(vm.execute_procedure(&mut program, 0, &[], &mut ctx).is_err());
}

#[test]
fn wait_reports_due_time_and_resumes() {
    let img = image("nap.int", |b| {
        b.procedure("start", 0)
            .push_int(25)
            .op(Opcode::Wait)
            .ret_int(4);
    });
    let vm = Interpreter::new();
    let (mut program, outcome) = run(&vm, img, "start");
    assert_eq!(outcome, Outcome::Waiting(GameTime(25)));
    assert!(program.is_waiting());

    let resumed = vm.resume(&mut program, &mut NoContext::default()).unwrap();
    assert_eq!(resumed, Outcome::Returned(Value::Int(4)));
    assert!(!program.is_mid_invocation());
}

#[test]
fn string_results_survive_the_call() {
    let img = image("greet.int", |b| {
        b.procedure("start", 0)
            .push_string("hello")
            .op(Opcode::PopReturn);
    });
    let (program, outcome) = run(&Interpreter::new(), img, "start");
    assert_eq!(outcome, Outcome::Returned(Value::string("hello")));
    assert_eq!(program.return_value(), &Value::string("hello"));
}
