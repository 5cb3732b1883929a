//! Builds small class files for tests.

use crate::classfile::{Attribute, ClassFile, Member};
use crate::constant_pool::{Constant, ConstantPool};

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;

pub(crate) struct ClassBuilder {
    pool: ConstantPool,
    this_class: u16,
    super_class: u16,
    super_name: String,
    visible: Vec<(u16, Option<(u16, u16)>)>,
    invisible: Vec<(u16, Option<(u16, u16)>)>,
    fields: Vec<Member>,
    methods: Vec<Member>,
}

impl ClassBuilder {
    pub(crate) fn new(name: &str, super_name: &str) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.class_index(name).unwrap();
        let super_class = pool.class_index(super_name).unwrap();
        Self {
            pool,
            this_class,
            super_class,
            super_name: super_name.to_string(),
            visible: Vec::new(),
            invisible: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Adds a class annotation with no elements.
    pub(crate) fn annotation(mut self, descriptor: &str, visible: bool) -> Self {
        let type_index = self.pool.utf8_index(descriptor).unwrap();
        self.annotations(visible).push((type_index, None));
        self
    }

    /// Adds a class annotation with one string element.
    pub(crate) fn annotation_with_value(
        mut self,
        descriptor: &str,
        visible: bool,
        element: &str,
        value: &str,
    ) -> Self {
        let type_index = self.pool.utf8_index(descriptor).unwrap();
        let name_index = self.pool.utf8_index(element).unwrap();
        let value_index = self.pool.utf8_index(value).unwrap();
        self.annotations(visible)
            .push((type_index, Some((name_index, value_index))));
        self
    }

    pub(crate) fn field(mut self, name: &str, descriptor: &str) -> Self {
        let name_index = self.pool.utf8_index(name).unwrap();
        let descriptor_index = self.pool.utf8_index(descriptor).unwrap();
        self.fields.push(Member {
            access_flags: 0,
            name_index,
            descriptor_index,
            attributes: Vec::new(),
        });
        self
    }

    /// Adds `<init>()V` that calls the superclass constructor.
    pub(crate) fn constructor_calling_super(mut self) -> Self {
        let init = self.super_methodref("<init>", "()V");
        let [hi, lo] = init.to_be_bytes();
        // aload_0; invokespecial #init; return
        let code = vec![0x2a, 0xb7, hi, lo, 0xb1];
        self.method("<init>", "()V", 1, 1, code);
        self
    }

    /// Adds `<init>()V` that calls the superclass constructor and then
    /// allocates and drops a new instance of the superclass.
    pub(crate) fn constructor_allocating_super(mut self) -> Self {
        let init = self.super_methodref("<init>", "()V");
        let owner = self.pool.class_index(&self.super_name).unwrap();
        let [hi, lo] = init.to_be_bytes();
        let [ohi, olo] = owner.to_be_bytes();
        // aload_0; invokespecial #init; new #owner; dup; invokespecial #init;
        // pop; return
        let code = vec![0x2a, 0xb7, hi, lo, 0xbb, ohi, olo, 0x59, 0xb7, hi, lo, 0x57, 0xb1];
        self.method("<init>", "()V", 3, 1, code);
        self
    }

    /// Adds `<init>()V` that allocates a superclass instance while the
    /// receiver is still uninitialized, as `super(new Super())` does.
    pub(crate) fn constructor_passing_new_super(mut self) -> Self {
        let init = self.super_methodref("<init>", "()V");
        let owner = self.pool.class_index(&self.super_name).unwrap();
        let [hi, lo] = init.to_be_bytes();
        let [ohi, olo] = owner.to_be_bytes();
        // aload_0; new #owner; dup; invokespecial #init; pop;
        // invokespecial #init; return
        let code = vec![0x2a, 0xbb, ohi, olo, 0x59, 0xb7, hi, lo, 0x57, 0xb7, hi, lo, 0xb1];
        self.method("<init>", "()V", 3, 1, code);
        self
    }

    /// Adds a static-like `create()V` that allocates a superclass instance.
    pub(crate) fn factory_allocating_super(mut self) -> Self {
        let init = self.super_methodref("<init>", "()V");
        let owner = self.pool.class_index(&self.super_name).unwrap();
        let [hi, lo] = init.to_be_bytes();
        let [ohi, olo] = owner.to_be_bytes();
        // new #owner; dup; invokespecial #init; pop; return
        let code = vec![0xbb, ohi, olo, 0x59, 0xb7, hi, lo, 0x57, 0xb1];
        self.method("create", "()V", 2, 1, code);
        self
    }

    /// Adds `onCreate()V` that calls `super.onCreate()` after a
    /// `tableswitch`, so instruction decoding has to step over padding.
    pub(crate) fn on_create_calling_super(mut self) -> Self {
        let on_create = self.super_methodref("onCreate", "()V");
        let [hi, lo] = on_create.to_be_bytes();
        let mut code = vec![
            0x03, // iconst_0 at pc 0
            0xaa, // tableswitch at pc 1, pad to pc 4
            0x00, 0x00, // padding
        ];
        // default, low, high, one jump offset; every target is the next
        // instruction at pc 20.
        for word in [19i32, 0, 0, 19] {
            code.extend_from_slice(&word.to_be_bytes());
        }
        code.extend_from_slice(&[0x2a, 0xb7, hi, lo, 0xb1]);
        self.method("onCreate", "()V", 1, 1, code);
        self
    }

    fn super_methodref(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.pool.utf8_index(name).unwrap();
        let descriptor_index = self.pool.utf8_index(descriptor).unwrap();
        let nat = self
            .pool
            .push(Constant::NameAndType {
                name_index,
                descriptor_index,
            })
            .unwrap();
        let owner = self.pool.class_index(&self.super_name).unwrap();
        self.pool.methodref_index(owner, nat).unwrap()
    }

    fn method(&mut self, name: &str, descriptor: &str, stack: u16, locals: u16, code: Vec<u8>) {
        let name_index = self.pool.utf8_index(name).unwrap();
        let descriptor_index = self.pool.utf8_index(descriptor).unwrap();
        let code_name = self.pool.utf8_index("Code").unwrap();
        let mut info = Vec::new();
        info.extend_from_slice(&stack.to_be_bytes());
        info.extend_from_slice(&locals.to_be_bytes());
        info.extend_from_slice(&(code.len() as u32).to_be_bytes());
        info.extend_from_slice(&code);
        info.extend_from_slice(&0u16.to_be_bytes());
        info.extend_from_slice(&0u16.to_be_bytes());
        self.methods.push(Member {
            access_flags: ACC_PUBLIC,
            name_index,
            descriptor_index,
            attributes: vec![Attribute {
                name_index: code_name,
                info,
            }],
        });
    }

    fn annotations(&mut self, visible: bool) -> &mut Vec<(u16, Option<(u16, u16)>)> {
        if visible {
            &mut self.visible
        } else {
            &mut self.invisible
        }
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        let mut attributes = Vec::new();
        for (attr_name, list) in [
            ("RuntimeVisibleAnnotations", &self.visible),
            ("RuntimeInvisibleAnnotations", &self.invisible),
        ] {
            if list.is_empty() {
                continue;
            }
            let mut info = Vec::new();
            info.extend_from_slice(&(list.len() as u16).to_be_bytes());
            for (type_index, element) in list {
                info.extend_from_slice(&type_index.to_be_bytes());
                match element {
                    None => info.extend_from_slice(&0u16.to_be_bytes()),
                    Some((name_index, value_index)) => {
                        info.extend_from_slice(&1u16.to_be_bytes());
                        info.extend_from_slice(&name_index.to_be_bytes());
                        info.push(b's');
                        info.extend_from_slice(&value_index.to_be_bytes());
                    }
                }
            }
            attributes.push((attr_name, info));
        }
        let attributes = attributes
            .into_iter()
            .map(|(name, info)| Attribute {
                name_index: self.pool.utf8_index(name).unwrap(),
                info,
            })
            .collect();

        ClassFile {
            minor_version: 0,
            major_version: 52,
            constant_pool: self.pool,
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class: self.this_class,
            super_class: self.super_class,
            interfaces: Vec::new(),
            fields: self.fields,
            methods: self.methods,
            attributes,
        }
        .to_bytes()
    }
}
