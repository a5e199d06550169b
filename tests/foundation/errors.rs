//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use mapscript_foundation::{Error, ErrorContext, ErrorKind, Fault, ScriptId, ScriptType};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_load() {
    let err = Error::load("door.int", "truncated header");
    assert!(matches!(err.kind, ErrorKind::LoadError { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("door.int"));
    assert!(msg.contains("truncated header"));
}

#[test]
fn error_argument_count() {
    let err = Error::argument_count("use_p_proc", 0, 2);
    assert!(matches!(
        err.kind,
        ErrorKind::ArgumentCount {
            expected: 0,
            actual: 2,
            ..
        }
    ));
    assert!(format!("{err}").contains("use_p_proc"));
}

#[test]
fn error_script_not_found() {
    let sid = ScriptId::new(ScriptType::Item, 3);
    let err = Error::script_not_found(sid);
    assert!(matches!(err.kind, ErrorKind::ScriptNotFound(s) if s == sid));
    assert!(format!("{err}").contains("0x03000003"));
}

#[test]
fn only_script_faults_are_fatal() {
    assert!(Error::fatal(Fault::DivisionByZero).is_fatal());
    assert!(!Error::script_busy(ScriptId::new(ScriptType::Item, 0)).is_fatal());
    assert!(!Error::allocation_exhausted("local variables").is_fatal());
    assert!(!Error::new(ErrorKind::ScriptsDisabled).is_fatal());
}

#[test]
fn fault_messages() {
    assert_eq!(
        format!("{}", Error::fatal(Fault::DivisionByZero)),
        "fatal script error: division by zero"
    );
    assert_eq!(
        Fault::StackOverflow { limit: 4 }.to_string(),
        "stack overflow (4 entries)"
    );
    assert_eq!(
        Fault::UnknownProcedure("talk".into()).to_string(),
        "no procedure named 'talk'"
    );
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_formats_where_it_failed() {
    let ctx = ErrorContext::new()
        .with_script("door.int")
        .with_procedure("use_p_proc")
        .with_offset(0x2a);
    assert_eq!(ctx.to_string(), "in door.int (use_p_proc) at 0x2a");
}

#[test]
fn context_attaches_to_error() {
    let err = Error::io("disk full").with_context(ErrorContext::new().with_script("map.int"));
    assert!(matches!(err.kind, ErrorKind::IoError(_)));
    assert_eq!(err.context.unwrap().script.as_deref(), Some("map.int"));
}
