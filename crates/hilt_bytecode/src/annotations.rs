//! Class-level annotation lookup.
//!
//! Entry-point markers have class retention, so they normally appear in
//! `RuntimeInvisibleAnnotations`. Both the visible and invisible tables
//! are searched.

use crate::classfile::ClassFile;
use crate::error::ClassFormatError;
use crate::reader::ByteReader;

const VISIBLE: &str = "RuntimeVisibleAnnotations";
const INVISIBLE: &str = "RuntimeInvisibleAnnotations";

/// Type descriptors (`Lcom/example/Marker;`) of every class annotation.
pub fn annotation_types(class: &ClassFile) -> Result<Vec<String>, ClassFormatError> {
    let mut types = Vec::new();
    for attribute in &class.attributes {
        match class.attribute_name(attribute) {
            Some(VISIBLE) | Some(INVISIBLE) => {}
            _ => continue,
        }
        let mut r = ByteReader::new(&attribute.info);
        let count = r.u2()?;
        for _ in 0..count {
            let type_index = r.u2()?;
            let descriptor = class.constant_pool.utf8(type_index).ok_or_else(|| {
                ClassFormatError::new(
                    r.position(),
                    format!("annotation type {type_index} is not a utf8 constant"),
                )
            })?;
            types.push(descriptor.to_string());
            skip_element_pairs(&mut r)?;
        }
    }
    Ok(types)
}

/// Returns `true` if the class carries an annotation with `descriptor`.
pub fn has_annotation(class: &ClassFile, descriptor: &str) -> Result<bool, ClassFormatError> {
    Ok(annotation_types(class)?.iter().any(|t| t == descriptor))
}

fn skip_element_pairs(r: &mut ByteReader<'_>) -> Result<(), ClassFormatError> {
    let pairs = r.u2()?;
    for _ in 0..pairs {
        r.u2()?;
        skip_element_value(r)?;
    }
    Ok(())
}

fn skip_element_value(r: &mut ByteReader<'_>) -> Result<(), ClassFormatError> {
    let at = r.position();
    match r.u1()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
            r.u2()?;
        }
        b'e' => {
            r.u2()?;
            r.u2()?;
        }
        b'@' => {
            r.u2()?;
            skip_element_pairs(r)?;
        }
        b'[' => {
            let n = r.u2()?;
            for _ in 0..n {
                skip_element_value(r)?;
            }
        }
        tag => {
            return Err(ClassFormatError::new(
                at,
                format!("unknown element value tag 0x{tag:02x}"),
            ))
        }
    }
    Ok(())
}
