//! The class-file constant pool.
//!
//! Entries are kept in their on-disk order and re-emitted unchanged, so a
//! decoded pool that is not modified serializes to the same bytes. New
//! entries are only ever appended.

use crate::error::ClassFormatError;
use crate::reader::ByteReader;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// One constant-pool entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// Slot 0, and the slot following a `Long` or `Double`.
    Unusable,
    /// Modified UTF-8 bytes, kept verbatim.
    Utf8(Vec<u8>),
    /// 32-bit integer.
    Integer(u32),
    /// 32-bit float bits.
    Float(u32),
    /// 64-bit integer; occupies two slots.
    Long(u64),
    /// 64-bit float bits; occupies two slots.
    Double(u64),
    /// A class reference.
    Class {
        /// Index of the `Utf8` internal name.
        name_index: u16,
    },
    /// A string literal.
    String {
        /// Index of the `Utf8` value.
        string_index: u16,
    },
    /// A field reference.
    Fieldref {
        /// Index of the owner `Class`.
        class_index: u16,
        /// Index of the `NameAndType`.
        name_and_type_index: u16,
    },
    /// A class method reference.
    Methodref {
        /// Index of the owner `Class`.
        class_index: u16,
        /// Index of the `NameAndType`.
        name_and_type_index: u16,
    },
    /// An interface method reference.
    InterfaceMethodref {
        /// Index of the owner `Class`.
        class_index: u16,
        /// Index of the `NameAndType`.
        name_and_type_index: u16,
    },
    /// A member name and descriptor.
    NameAndType {
        /// Index of the `Utf8` name.
        name_index: u16,
        /// Index of the `Utf8` descriptor.
        descriptor_index: u16,
    },
    /// A method handle.
    MethodHandle {
        /// The reference kind, 1 to 9.
        reference_kind: u8,
        /// Index of the referenced member.
        reference_index: u16,
    },
    /// A method type.
    MethodType {
        /// Index of the `Utf8` descriptor.
        descriptor_index: u16,
    },
    /// A dynamically computed constant.
    Dynamic {
        /// Bootstrap method table index.
        bootstrap_method_attr_index: u16,
        /// Index of the `NameAndType`.
        name_and_type_index: u16,
    },
    /// An `invokedynamic` call site.
    InvokeDynamic {
        /// Bootstrap method table index.
        bootstrap_method_attr_index: u16,
        /// Index of the `NameAndType`.
        name_and_type_index: u16,
    },
    /// A module name.
    Module {
        /// Index of the `Utf8` name.
        name_index: u16,
    },
    /// A package name.
    Package {
        /// Index of the `Utf8` name.
        name_index: u16,
    },
}

/// An indexed constant pool. Index 0 is never valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// An empty pool, holding only the unusable slot 0.
    pub fn new() -> Self {
        Self {
            entries: vec![Constant::Unusable],
        }
    }

    pub(crate) fn parse(r: &mut ByteReader<'_>) -> Result<Self, ClassFormatError> {
        let count = r.u2()?;
        if count == 0 {
            return Err(ClassFormatError::new(r.position(), "constant pool count is zero"));
        }
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);
        while entries.len() < count as usize {
            let at = r.position();
            let tag = r.u1()?;
            let constant = match tag {
                TAG_UTF8 => {
                    let len = r.u2()? as usize;
                    Constant::Utf8(r.bytes(len)?.to_vec())
                }
                TAG_INTEGER => Constant::Integer(r.u4()?),
                TAG_FLOAT => Constant::Float(r.u4()?),
                TAG_LONG => Constant::Long(r.u8()?),
                TAG_DOUBLE => Constant::Double(r.u8()?),
                TAG_CLASS => Constant::Class {
                    name_index: r.u2()?,
                },
                TAG_STRING => Constant::String {
                    string_index: r.u2()?,
                },
                TAG_FIELDREF => Constant::Fieldref {
                    class_index: r.u2()?,
                    name_and_type_index: r.u2()?,
                },
                TAG_METHODREF => Constant::Methodref {
                    class_index: r.u2()?,
                    name_and_type_index: r.u2()?,
                },
                TAG_INTERFACE_METHODREF => Constant::InterfaceMethodref {
                    class_index: r.u2()?,
                    name_and_type_index: r.u2()?,
                },
                TAG_NAME_AND_TYPE => Constant::NameAndType {
                    name_index: r.u2()?,
                    descriptor_index: r.u2()?,
                },
                TAG_METHOD_HANDLE => Constant::MethodHandle {
                    reference_kind: r.u1()?,
                    reference_index: r.u2()?,
                },
                TAG_METHOD_TYPE => Constant::MethodType {
                    descriptor_index: r.u2()?,
                },
                TAG_DYNAMIC => Constant::Dynamic {
                    bootstrap_method_attr_index: r.u2()?,
                    name_and_type_index: r.u2()?,
                },
                TAG_INVOKE_DYNAMIC => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: r.u2()?,
                    name_and_type_index: r.u2()?,
                },
                TAG_MODULE => Constant::Module {
                    name_index: r.u2()?,
                },
                TAG_PACKAGE => Constant::Package {
                    name_index: r.u2()?,
                },
                other => {
                    return Err(ClassFormatError::new(
                        at,
                        format!("unknown constant pool tag {other}"),
                    ))
                }
            };
            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            if wide {
                entries.push(Constant::Unusable);
            }
        }
        if entries.len() != count as usize {
            return Err(ClassFormatError::new(
                r.position(),
                "wide constant overruns the constant pool",
            ));
        }
        Ok(Self { entries })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
        for constant in &self.entries {
            match constant {
                Constant::Unusable => {}
                Constant::Utf8(bytes) => {
                    out.push(TAG_UTF8);
                    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    out.extend_from_slice(bytes);
                }
                Constant::Integer(v) => {
                    out.push(TAG_INTEGER);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                Constant::Float(v) => {
                    out.push(TAG_FLOAT);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                Constant::Long(v) => {
                    out.push(TAG_LONG);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                Constant::Double(v) => {
                    out.push(TAG_DOUBLE);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                Constant::Class { name_index } => write_u2s(out, TAG_CLASS, &[*name_index]),
                Constant::String { string_index } => write_u2s(out, TAG_STRING, &[*string_index]),
                Constant::Fieldref {
                    class_index,
                    name_and_type_index,
                } => write_u2s(out, TAG_FIELDREF, &[*class_index, *name_and_type_index]),
                Constant::Methodref {
                    class_index,
                    name_and_type_index,
                } => write_u2s(out, TAG_METHODREF, &[*class_index, *name_and_type_index]),
                Constant::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => write_u2s(
                    out,
                    TAG_INTERFACE_METHODREF,
                    &[*class_index, *name_and_type_index],
                ),
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => write_u2s(out, TAG_NAME_AND_TYPE, &[*name_index, *descriptor_index]),
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    out.push(TAG_METHOD_HANDLE);
                    out.push(*reference_kind);
                    out.extend_from_slice(&reference_index.to_be_bytes());
                }
                Constant::MethodType { descriptor_index } => {
                    write_u2s(out, TAG_METHOD_TYPE, &[*descriptor_index])
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => write_u2s(
                    out,
                    TAG_DYNAMIC,
                    &[*bootstrap_method_attr_index, *name_and_type_index],
                ),
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => write_u2s(
                    out,
                    TAG_INVOKE_DYNAMIC,
                    &[*bootstrap_method_attr_index, *name_and_type_index],
                ),
                Constant::Module { name_index } => write_u2s(out, TAG_MODULE, &[*name_index]),
                Constant::Package { name_index } => write_u2s(out, TAG_PACKAGE, &[*name_index]),
            }
        }
    }

    /// The `constant_pool_count` value: one more than the highest index.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// The entry at `index`.
    pub fn get(&self, index: u16) -> Option<&Constant> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => None,
            Some(c) => Some(c),
        }
    }

    /// The text of the `Utf8` entry at `index`, if it is valid UTF-8.
    pub fn utf8(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::Utf8(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// The internal name of the `Class` entry at `index`.
    pub fn class_name(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => None,
        }
    }

    /// Finds an existing `Utf8` entry with exactly this text.
    pub fn find_utf8(&self, text: &str) -> Option<u16> {
        self.position(|c| matches!(c, Constant::Utf8(b) if b == text.as_bytes()))
    }

    /// Finds an existing `Class` entry naming `internal_name`.
    pub fn find_class(&self, internal_name: &str) -> Option<u16> {
        let name_index = self.find_utf8(internal_name)?;
        self.position(|c| matches!(c, Constant::Class { name_index: n } if *n == name_index))
    }

    /// Returns the `Utf8` entry for `text`, appending one if needed.
    pub fn utf8_index(&mut self, text: &str) -> Result<u16, ClassFormatError> {
        match self.find_utf8(text) {
            Some(index) => Ok(index),
            None => self.push(Constant::Utf8(text.as_bytes().to_vec())),
        }
    }

    /// Returns the `Class` entry for `internal_name`, appending one if needed.
    pub fn class_index(&mut self, internal_name: &str) -> Result<u16, ClassFormatError> {
        if let Some(index) = self.find_class(internal_name) {
            return Ok(index);
        }
        let name_index = self.utf8_index(internal_name)?;
        self.push(Constant::Class { name_index })
    }

    /// Returns a `Methodref` for `class_index` and `name_and_type_index`,
    /// appending one if needed.
    pub fn methodref_index(
        &mut self,
        class_index: u16,
        name_and_type_index: u16,
    ) -> Result<u16, ClassFormatError> {
        let wanted = Constant::Methodref {
            class_index,
            name_and_type_index,
        };
        match self.position(|c| *c == wanted) {
            Some(index) => Ok(index),
            None => self.push(wanted),
        }
    }

    /// Appends an entry, returning its index.
    pub fn push(&mut self, constant: Constant) -> Result<u16, ClassFormatError> {
        let slots = if matches!(constant, Constant::Long(_) | Constant::Double(_)) {
            2
        } else {
            1
        };
        let index = self.entries.len();
        if index + slots > u16::MAX as usize {
            return Err(ClassFormatError::new(0, "constant pool is full"));
        }
        self.entries.push(constant);
        if slots == 2 {
            self.entries.push(Constant::Unusable);
        }
        Ok(index as u16)
    }

    fn position(&self, pred: impl Fn(&Constant) -> bool) -> Option<u16> {
        self.entries
            .iter()
            .position(|c| pred(c))
            .map(|i| i as u16)
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

fn write_u2s(out: &mut Vec<u8>, tag: u8, values: &[u16]) {
    out.push(tag);
    for value in values {
        out.extend_from_slice(&value.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_constants_take_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.push(Constant::Long(42)).unwrap();
        let next = pool.utf8_index("after").unwrap();
        assert_eq!(long, 1);
        assert_eq!(next, 3);
        assert!(pool.get(2).is_none());
        assert_eq!(pool.count(), 4);
    }

    #[test]
    fn class_index_reuses_entries() {
        let mut pool = ConstantPool::new();
        let a = pool.class_index("com/example/Hilt_A").unwrap();
        let b = pool.class_index("com/example/Hilt_A").unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.class_name(a), Some("com/example/Hilt_A"));
        assert_eq!(pool.count(), 3);
    }

    #[test]
    fn write_then_parse_preserves_entries() {
        let mut pool = ConstantPool::new();
        let name = pool.utf8_index("<init>").unwrap();
        let desc = pool.utf8_index("()V").unwrap();
        let nat = pool
            .push(Constant::NameAndType {
                name_index: name,
                descriptor_index: desc,
            })
            .unwrap();
        let class = pool.class_index("java/lang/Object").unwrap();
        pool.methodref_index(class, nat).unwrap();
        pool.push(Constant::Double(0x4009_21FB_5444_2D18)).unwrap();
        pool.push(Constant::MethodHandle {
            reference_kind: 6,
            reference_index: 1,
        })
        .unwrap();

        let mut bytes = Vec::new();
        pool.write(&mut bytes);
        let parsed = ConstantPool::parse(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(parsed, pool);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = [0x00, 0x02, 0x63];
        let err = ConstantPool::parse(&mut ByteReader::new(&bytes)).unwrap_err();
        assert!(err.reason.contains("unknown constant pool tag 99"));
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn wide_constant_at_end_is_rejected() {
        // count = 2 leaves room for one slot, but a Long needs two.
        let mut bytes = vec![0x00, 0x02, TAG_LONG];
        bytes.extend_from_slice(&7u64.to_be_bytes());
        assert!(ConstantPool::parse(&mut ByteReader::new(&bytes)).is_err());
    }
}
