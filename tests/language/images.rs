//! Integration tests for bytecode images

use mapscript_foundation::ErrorKind;
use mapscript_language::{Image, ImageBuilder, Opcode, disassemble};

fn door() -> Vec<u8> {
    let mut b = ImageBuilder::new("door.int");
    b.push_int(0);
    b.procedure("start", 0).ret_int(0);
    b.procedure("use_p_proc", 0)
        .push_string("creak")
        .op(Opcode::PopReturn);
    b.finish().unwrap()
}

#[test]
fn procedures_are_found_by_name() {
    let image = Image::parse("door.int", door()).unwrap();
    assert_eq!(image.procedures().len(), 2);
    assert_eq!(image.find_procedure("start"), Some(0));
    assert_eq!(image.find_procedure("use_p_proc"), Some(1));
    assert_eq!(image.find_procedure("talk_p_proc"), None);
    assert_eq!(image.procedure(1).unwrap().arg_count, 0);
}

#[test]
fn load_from_disk_uses_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("door.int");
    std::fs::write(&path, door()).unwrap();

    let image = Image::load(&path).unwrap();
    assert_eq!(image.name(), "door.int");
    assert_eq!(image.bytes(), door().as_slice());
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Image::load(dir.path().join("ghost.int")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LoadError { ref name, .. } if name == "ghost.int"));
}

#[test]
fn truncated_images_are_rejected() {
    let bytes = door();
    for len in [0, 10, bytes.len() / 2] {
        let err = Image::parse("door.int", bytes[..len].to_vec()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::LoadError { .. }), "len {len}");
    }
}

#[test]
fn disassembly_lists_procedures_and_strings() {
    let image = Image::parse("door.int", door()).unwrap();
    let listing = disassemble(&image);
    assert!(listing.starts_with("; door.int\n; 2 procedures\n"));
    assert!(listing.contains("use_p_proc:"));
    assert!(listing.contains("push \"creak\""));
    assert!(listing.contains("pop_return"));
}
