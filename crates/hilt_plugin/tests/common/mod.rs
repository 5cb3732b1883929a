//! Fixtures shared by the scenario tests: class files and jars.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use hilt_bytecode::{Attribute, ClassFile, Constant, ConstantPool, Member};
use hilt_common::files::write_file;

pub const ENTRY_POINT: &str = "Ldagger/hilt/android/AndroidEntryPoint;";

/// Encodes a class extending `super_name` with a constructor that calls
/// the superclass constructor. `marker` adds a visible class annotation.
pub fn class_bytes(name: &str, super_name: &str, marker: Option<&str>) -> Vec<u8> {
    let mut pool = ConstantPool::new();
    let this_class = pool.class_index(name).unwrap();
    let super_class = pool.class_index(super_name).unwrap();

    let init_name = pool.utf8_index("<init>").unwrap();
    let void = pool.utf8_index("()V").unwrap();
    let nat = pool
        .push(Constant::NameAndType {
            name_index: init_name,
            descriptor_index: void,
        })
        .unwrap();
    let init_ref = pool.methodref_index(super_class, nat).unwrap();
    let [hi, lo] = init_ref.to_be_bytes();

    // aload_0; invokespecial super.<init>; return
    let code = [0x2a, 0xb7, hi, lo, 0xb1];
    let mut info = Vec::new();
    info.extend_from_slice(&1u16.to_be_bytes());
    info.extend_from_slice(&1u16.to_be_bytes());
    info.extend_from_slice(&(code.len() as u32).to_be_bytes());
    info.extend_from_slice(&code);
    info.extend_from_slice(&[0, 0, 0, 0]);
    let constructor = Member {
        access_flags: 0x0001,
        name_index: init_name,
        descriptor_index: void,
        attributes: vec![Attribute {
            name_index: pool.utf8_index("Code").unwrap(),
            info,
        }],
    };

    let mut attributes = Vec::new();
    if let Some(marker) = marker {
        let type_index = pool.utf8_index(marker).unwrap();
        let mut info = 1u16.to_be_bytes().to_vec();
        info.extend_from_slice(&type_index.to_be_bytes());
        info.extend_from_slice(&0u16.to_be_bytes());
        attributes.push(Attribute {
            name_index: pool.utf8_index("RuntimeVisibleAnnotations").unwrap(),
            info,
        });
    }

    ClassFile {
        minor_version: 0,
        major_version: 52,
        constant_pool: pool,
        access_flags: 0x0021,
        this_class,
        super_class,
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods: vec![constructor],
        attributes,
    }
    .to_bytes()
}

/// Writes `<root>/<name>.class`.
pub fn write_class(root: &Path, name: &str, super_name: &str, marker: Option<&str>) {
    let path = root.join(format!("{name}.class"));
    write_file(&path, &class_bytes(name, super_name, marker)).unwrap();
}

/// The superclass recorded in a class file.
pub fn super_of(path: &Path) -> String {
    let bytes = std::fs::read(path).unwrap();
    let class = ClassFile::parse(&bytes).unwrap();
    class.super_name().unwrap().to_string()
}

/// Writes a jar holding the given entries.
pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut jar = zip::ZipWriter::new(File::create(path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        jar.start_file(*name, options).unwrap();
        jar.write_all(bytes).unwrap();
    }
    jar.finish().unwrap();
}
