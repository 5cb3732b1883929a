//! Class-file decoding and encoding.
//!
//! Fields, methods and attributes are kept as raw attribute blobs. The
//! rewriter only needs the constant pool, the superclass slot, annotation
//! attributes and `Code` attributes, and everything else is re-emitted
//! byte for byte.

use crate::constant_pool::ConstantPool;
use crate::error::ClassFormatError;
use crate::reader::ByteReader;

/// Class-file magic number.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// An attribute with its undecoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Index of the `Utf8` attribute name.
    pub name_index: u16,
    /// The attribute payload, without the name and length header.
    pub info: Vec<u8>,
}

/// A field or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Access flags.
    pub access_flags: u16,
    /// Index of the `Utf8` name.
    pub name_index: u16,
    /// Index of the `Utf8` descriptor.
    pub descriptor_index: u16,
    /// Member attributes, including `Code` for methods.
    pub attributes: Vec<Attribute>,
}

/// A decoded class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Minor version.
    pub minor_version: u16,
    /// Major version.
    pub major_version: u16,
    /// The constant pool.
    pub constant_pool: ConstantPool,
    /// Class access flags.
    pub access_flags: u16,
    /// Index of this class's `Class` entry.
    pub this_class: u16,
    /// Index of the superclass `Class` entry, or 0 for `java/lang/Object`
    /// itself.
    pub super_class: u16,
    /// Indices of implemented interfaces.
    pub interfaces: Vec<u16>,
    /// Declared fields.
    pub fields: Vec<Member>,
    /// Declared methods.
    pub methods: Vec<Member>,
    /// Class-level attributes.
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Decodes a class file.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFormatError> {
        let mut r = ByteReader::new(bytes);
        let magic = r.u4()?;
        if magic != MAGIC {
            return Err(ClassFormatError::new(0, format!("bad magic 0x{magic:08x}")));
        }
        let minor_version = r.u2()?;
        let major_version = r.u2()?;
        let constant_pool = ConstantPool::parse(&mut r)?;
        let access_flags = r.u2()?;
        let this_class = r.u2()?;
        let super_class = r.u2()?;
        let interface_count = r.u2()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(r.u2()?);
        }
        let fields = parse_members(&mut r)?;
        let methods = parse_members(&mut r)?;
        let attributes = parse_attributes(&mut r)?;
        if r.remaining() != 0 {
            return Err(ClassFormatError::new(
                r.position(),
                format!("{} trailing bytes", r.remaining()),
            ));
        }

        let class = Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        if class.name().is_none() {
            return Err(ClassFormatError::new(
                0,
                format!("this_class {} is not a class constant", this_class),
            ));
        }
        Ok(class)
    }

    /// Encodes the class file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.constant_pool.write(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        write_members(&mut out, &self.fields);
        write_members(&mut out, &self.methods);
        write_attributes(&mut out, &self.attributes);
        out
    }

    /// This class's internal name, e.g. `com/example/MainActivity`.
    pub fn name(&self) -> Option<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    /// The superclass's internal name; `None` only for `java/lang/Object`.
    pub fn super_name(&self) -> Option<&str> {
        if self.super_class == 0 {
            return None;
        }
        self.constant_pool.class_name(self.super_class)
    }

    /// Name of an attribute, resolved through the constant pool.
    pub fn attribute_name(&self, attribute: &Attribute) -> Option<&str> {
        self.constant_pool.utf8(attribute.name_index)
    }
}

fn parse_members(r: &mut ByteReader<'_>) -> Result<Vec<Member>, ClassFormatError> {
    let count = r.u2()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        members.push(Member {
            access_flags: r.u2()?,
            name_index: r.u2()?,
            descriptor_index: r.u2()?,
            attributes: parse_attributes(r)?,
        });
    }
    Ok(members)
}

fn parse_attributes(r: &mut ByteReader<'_>) -> Result<Vec<Attribute>, ClassFormatError> {
    let count = r.u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = r.u2()?;
        let len = r.u4()? as usize;
        attributes.push(Attribute {
            name_index,
            info: r.bytes(len)?.to_vec(),
        });
    }
    Ok(attributes)
}

fn write_members(out: &mut Vec<u8>, members: &[Member]) {
    out.extend_from_slice(&(members.len() as u16).to_be_bytes());
    for member in members {
        out.extend_from_slice(&member.access_flags.to_be_bytes());
        out.extend_from_slice(&member.name_index.to_be_bytes());
        out.extend_from_slice(&member.descriptor_index.to_be_bytes());
        write_attributes(out, &member.attributes);
    }
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[Attribute]) {
    out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for attribute in attributes {
        out.extend_from_slice(&attribute.name_index.to_be_bytes());
        out.extend_from_slice(&(attribute.info.len() as u32).to_be_bytes());
        out.extend_from_slice(&attribute.info);
    }
}
