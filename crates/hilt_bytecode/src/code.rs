//! Bytecode walking for `Code` attributes.
//!
//! Changing a class's superclass also requires retargeting the calls it
//! makes on the old superclass through `this`: the constructor chaining
//! call and `super.method()` calls. Objects the class allocates itself
//! (`new OldSuper()`) keep their original constructor. Instructions are
//! decoded only far enough to find each opcode boundary; operands are
//! patched in place, so code length and branch offsets never change.

use std::collections::HashMap;

use crate::classfile::ClassFile;
use crate::constant_pool::{Constant, ConstantPool};
use crate::error::ClassFormatError;
use crate::reader::ByteReader;

const NEW: u8 = 0xbb;
const INVOKESPECIAL: u8 = 0xb7;
const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

const CONSTRUCTOR: &str = "<init>";

/// Offset of the bytecode inside a `Code` attribute payload.
const CODE_START: usize = 8;

/// An instruction relevant to super-call redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    /// `new`: allocates an object whose `<init>` call follows later.
    New,
    /// `invokespecial`, with the offset of its operand in the bytecode.
    InvokeSpecial(usize),
}

/// Retargets the super calls a class makes through `this` from `old_super`
/// to the class at pool index `new_super`. Returns the number of call
/// sites changed.
///
/// A `<init>` call is a super constructor call only when it is the first
/// one in a constructor not paired with a preceding `new`. `<init>` calls
/// on freshly allocated objects and constructors outside `<init>` methods
/// are left alone.
pub fn redirect_super_calls(
    class: &mut ClassFile,
    old_super: &str,
    new_super: u16,
) -> Result<usize, ClassFormatError> {
    let code_name = match class.constant_pool.find_utf8("Code") {
        Some(index) => index,
        None => return Ok(0),
    };

    let mut remapped: HashMap<u16, u16> = HashMap::new();
    let mut changed = 0;
    let pool = &mut class.constant_pool;
    for method in &mut class.methods {
        let in_constructor = pool.utf8(method.name_index) == Some(CONSTRUCTOR);
        for attribute in method.attributes.iter_mut() {
            if attribute.name_index != code_name {
                continue;
            }
            let mut pending_new = 0usize;
            let mut this_initialized = !in_constructor;
            for site in call_sites(&attribute.info)? {
                let operand = match site {
                    Site::New => {
                        pending_new += 1;
                        continue;
                    }
                    Site::InvokeSpecial(operand) => operand,
                };
                let at = CODE_START + operand;
                let index = u16::from_be_bytes([attribute.info[at], attribute.info[at + 1]]);
                let (on_old_super, nat) = match methodref(pool, index) {
                    Some((owner, nat)) => (owner == old_super, nat),
                    None => continue,
                };

                let retarget = if member_name(pool, nat) == Some(CONSTRUCTOR) {
                    if pending_new > 0 {
                        pending_new -= 1;
                        false
                    } else if !this_initialized {
                        this_initialized = true;
                        on_old_super
                    } else {
                        false
                    }
                } else {
                    on_old_super
                };
                if !retarget {
                    continue;
                }

                let target = match remapped.get(&index) {
                    Some(&target) => target,
                    None => {
                        let target = pool.methodref_index(new_super, nat)?;
                        remapped.insert(index, target);
                        target
                    }
                };
                attribute.info[at..at + 2].copy_from_slice(&target.to_be_bytes());
                changed += 1;
            }
        }
    }
    Ok(changed)
}

/// Owner name and `NameAndType` index of the `Methodref` at `index`.
fn methodref(pool: &ConstantPool, index: u16) -> Option<(&str, u16)> {
    match pool.get(index) {
        Some(Constant::Methodref {
            class_index,
            name_and_type_index,
        }) => Some((pool.class_name(*class_index)?, *name_and_type_index)),
        _ => None,
    }
}

fn member_name(pool: &ConstantPool, name_and_type: u16) -> Option<&str> {
    match pool.get(name_and_type) {
        Some(Constant::NameAndType { name_index, .. }) => pool.utf8(*name_index),
        _ => None,
    }
}

/// Every `new` and `invokespecial` in a `Code` attribute payload, in
/// bytecode order.
fn call_sites(info: &[u8]) -> Result<Vec<Site>, ClassFormatError> {
    let mut r = ByteReader::new(info);
    r.u2()?;
    r.u2()?;
    let len = r.u4()? as usize;
    let code = r.bytes(len)?;

    let mut sites = Vec::new();
    let mut pc = 0;
    while pc < code.len() {
        let opcode = code[pc];
        let step = instruction_length(code, pc)?;
        match opcode {
            NEW => sites.push(Site::New),
            INVOKESPECIAL => sites.push(Site::InvokeSpecial(pc + 1)),
            _ => {}
        }
        pc += step;
    }
    Ok(sites)
}

fn instruction_length(code: &[u8], pc: usize) -> Result<usize, ClassFormatError> {
    let opcode = code[pc];
    let len = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,
        0x11 => 3,
        0x12 => 2,
        0x13 | 0x14 => 3,
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x83 => 1,
        IINC => 3,
        0x85..=0x98 => 1,
        0x99..=0xa8 => 3,
        0xa9 => 2,
        TABLESWITCH => {
            let base = pc + 1 + padding(pc);
            let low = read_i32(code, base + 4)?;
            let high = read_i32(code, base + 8)?;
            let targets = i64::from(high) - i64::from(low) + 1;
            if targets < 0 {
                return Err(ClassFormatError::new(pc, "tableswitch high below low"));
            }
            1 + padding(pc) + 12 + targets as usize * 4
        }
        LOOKUPSWITCH => {
            let base = pc + 1 + padding(pc);
            let pairs = read_i32(code, base + 4)?;
            if pairs < 0 {
                return Err(ClassFormatError::new(pc, "negative lookupswitch pair count"));
            }
            1 + padding(pc) + 8 + pairs as usize * 8
        }
        0xac..=0xb1 => 1,
        0xb2..=0xb8 => 3,
        0xb9 | 0xba => 5,
        NEW => 3,
        0xbc => 2,
        0xbd => 3,
        0xbe | 0xbf => 1,
        0xc0 | 0xc1 => 3,
        0xc2 | 0xc3 => 1,
        WIDE => match code.get(pc + 1) {
            Some(&IINC) => 6,
            Some(_) => 4,
            None => return Err(ClassFormatError::new(pc, "truncated wide instruction")),
        },
        0xc5 => 4,
        0xc6 | 0xc7 => 3,
        0xc8 | 0xc9 => 5,
        0xca | 0xfe | 0xff => 1,
        other => {
            return Err(ClassFormatError::new(
                pc,
                format!("unknown opcode 0x{other:02x}"),
            ))
        }
    };
    if pc + len > code.len() {
        return Err(ClassFormatError::new(pc, "instruction runs past end of code"));
    }
    Ok(len)
}

/// Switch operands start at the next multiple of four after the opcode.
fn padding(pc: usize) -> usize {
    (4 - (pc + 1) % 4) % 4
}

fn read_i32(code: &[u8], at: usize) -> Result<i32, ClassFormatError> {
    code.get(at..at + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| ClassFormatError::new(at, "truncated switch operands"))
}
