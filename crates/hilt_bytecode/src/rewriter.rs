//! The entry-point superclass rewriter.
//!
//! A class annotated with one of the configured markers is rewritten to
//! extend its generated base class (`Hilt_<Name>` in the same package).
//! The generated class must already exist in the [`ClassPool`]. Unmarked
//! classes pass through untouched, or are dropped in
//! [`RewriteMode::EmitOnlyRewritten`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use hilt_common::files::{
    copy_file, is_class_entry, is_class_file, join_slash_path, to_slash_path, write_file,
};
use hilt_common::InternalError;
use tracing::{debug, info, warn};

use crate::annotations::annotation_types;
use crate::classfile::ClassFile;
use crate::code::redirect_super_calls;
use crate::error::{ClassFormatError, RewriteError};
use crate::name::{descriptor, generated_superclass_name, simple_name, DEFAULT_PREFIX};
use crate::pool::ClassPool;

/// Annotations that mark an entry point, in internal form.
pub const DEFAULT_MARKERS: [&str; 2] = [
    "dagger/hilt/android/AndroidEntryPoint",
    "dagger/hilt/android/HiltAndroidApp",
];

/// What happens to classes that are not rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteMode {
    /// Unmarked classes are copied to the output unchanged.
    #[default]
    CopyThrough,
    /// Only rewritten classes are written.
    EmitOnlyRewritten,
}

/// Rewriter settings.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Marker annotations in internal form (`dagger/hilt/android/AndroidEntryPoint`).
    pub markers: Vec<String>,
    /// Prefix of generated base classes.
    pub prefix: String,
    /// Handling of unmarked classes.
    pub mode: RewriteMode,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            prefix: DEFAULT_PREFIX.to_string(),
            mode: RewriteMode::CopyThrough,
        }
    }
}

impl RewriteOptions {
    /// Same options with a different mode.
    pub fn with_mode(mut self, mode: RewriteMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Result of transforming one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassOutcome {
    /// Not marked; the original bytes apply.
    PassThrough,
    /// Marked, but already extends its generated class; the original bytes
    /// apply.
    AlreadyRewritten,
    /// Marked and rewritten.
    Rewritten {
        /// The new class file.
        bytes: Vec<u8>,
        /// Internal name of the class.
        class: String,
        /// The superclass before rewriting.
        old_super: String,
        /// The generated superclass.
        new_super: String,
    },
}

/// What [`ClassTransformer::transform_file`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A rewritten class was written to this path.
    Rewritten(PathBuf),
    /// The input was copied unchanged to this path.
    Copied(PathBuf),
    /// Nothing was written.
    Dropped,
}

impl FileOutcome {
    /// The written path, if any.
    pub fn output(&self) -> Option<&Path> {
        match self {
            Self::Rewritten(p) | Self::Copied(p) => Some(p),
            Self::Dropped => None,
        }
    }
}

/// Rewrites entry-point classes against a frozen [`ClassPool`].
///
/// The transformer holds no mutable state, so one instance is shared by
/// every worker of a step.
pub struct ClassTransformer<'p> {
    pool: &'p ClassPool,
    options: RewriteOptions,
    marker_descriptors: Vec<String>,
    task_name: String,
}

impl<'p> ClassTransformer<'p> {
    /// Creates a transformer. `task_name` prefixes log lines.
    pub fn new(
        pool: &'p ClassPool,
        options: RewriteOptions,
        task_name: impl Into<String>,
    ) -> Self {
        let marker_descriptors = options.markers.iter().map(|m| descriptor(m)).collect();
        Self {
            pool,
            options,
            marker_descriptors,
            task_name: task_name.into(),
        }
    }

    /// The options in effect.
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Transforms one class file. `origin` names the input in errors.
    pub fn transform_class(
        &self,
        bytes: &[u8],
        origin: &Path,
    ) -> Result<ClassOutcome, RewriteError> {
        let malformed = |source: ClassFormatError| RewriteError::Malformed {
            path: origin.to_path_buf(),
            source,
        };
        let mut class = ClassFile::parse(bytes).map_err(malformed)?;
        let marked = annotation_types(&class)
            .map_err(malformed)?
            .iter()
            .any(|t| self.marker_descriptors.contains(t));
        if !marked {
            return Ok(ClassOutcome::PassThrough);
        }

        let name = class.name().unwrap_or_default().to_string();
        if simple_name(&name).starts_with(&self.options.prefix) {
            warn!(
                task = %self.task_name,
                class = %name,
                prefix = %self.options.prefix,
                "entry point name already carries the generated-class prefix"
            );
        }

        let generated = generated_superclass_name(&name, &self.options.prefix);
        let old_super = class.super_name().unwrap_or("java/lang/Object").to_string();
        if old_super == generated {
            debug!(class = %name, "already extends its generated superclass");
            return Ok(ClassOutcome::AlreadyRewritten);
        }
        if !self.pool.contains(&generated) {
            return Err(RewriteError::MissingSuperclass {
                class: name,
                superclass: generated,
            });
        }

        info!(
            "[{}] Transforming {} to extend {} instead of {}.",
            self.task_name, name, generated, old_super
        );
        let new_index = class.constant_pool.class_index(&generated).map_err(malformed)?;
        class.super_class = new_index;
        let calls = redirect_super_calls(&mut class, &old_super, new_index).map_err(malformed)?;
        debug!(class = %name, calls, "redirected super calls");

        Ok(ClassOutcome::Rewritten {
            bytes: class.to_bytes(),
            class: name,
            old_super,
            new_super: generated,
        })
    }

    /// Transforms one file from a directory root.
    ///
    /// Outputs keep the input's relative path, so removing `<relative>`
    /// from the output root later removes exactly what this wrote.
    pub fn transform_file(
        &self,
        input: &Path,
        relative: &str,
        output_root: &Path,
    ) -> Result<FileOutcome, RewriteError> {
        if !is_class_file(input) {
            let output = join_slash_path(output_root, relative);
            copy_file(input, &output).map_err(|e| RewriteError::io(&output, e))?;
            return Ok(FileOutcome::Copied(output));
        }
        let bytes = std::fs::read(input).map_err(|e| RewriteError::io(input, e))?;
        self.write_class(&bytes, input, relative, output_root)
    }

    /// Transforms the classes inside a jar, writing only rewritten classes
    /// into `output_root`. Returns the number of classes written.
    ///
    /// Only valid in [`RewriteMode::EmitOnlyRewritten`].
    pub fn transform_jar_contents(
        &self,
        jar: &Path,
        output_root: &Path,
    ) -> Result<usize, RewriteError> {
        if self.options.mode != RewriteMode::EmitOnlyRewritten {
            return Err(InternalError::new(format!(
                "jar copying is not supported in copy-through mode ({})",
                jar.display()
            ))
            .into());
        }
        std::fs::create_dir_all(output_root).map_err(|e| RewriteError::io(output_root, e))?;

        let file = File::open(jar).map_err(|e| RewriteError::io(jar, e))?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| RewriteError::archive(jar, e))?;
        let mut written = 0;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| RewriteError::archive(jar, e))?;
            if entry.is_dir() || !is_class_entry(entry.name()) {
                continue;
            }
            let origin = PathBuf::from(format!("{}!/{}", jar.display(), entry.name()));
            let Some(relative) = entry.enclosed_name().as_deref().and_then(to_slash_path) else {
                debug!(entry = %origin.display(), "skipping entry outside the jar root");
                continue;
            };
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| RewriteError::io(&origin, e))?;
            if let FileOutcome::Rewritten(_) =
                self.write_class(&bytes, &origin, &relative, output_root)?
            {
                written += 1;
            }
        }
        Ok(written)
    }

    fn write_class(
        &self,
        bytes: &[u8],
        origin: &Path,
        relative: &str,
        output_root: &Path,
    ) -> Result<FileOutcome, RewriteError> {
        let (out_bytes, rewritten) = match self.transform_class(bytes, origin)? {
            ClassOutcome::Rewritten { bytes, .. } => (bytes, true),
            ClassOutcome::AlreadyRewritten => (bytes.to_vec(), true),
            ClassOutcome::PassThrough => match self.options.mode {
                RewriteMode::CopyThrough => (bytes.to_vec(), false),
                RewriteMode::EmitOnlyRewritten => return Ok(FileOutcome::Dropped),
            },
        };
        let output = join_slash_path(output_root, relative);
        write_file(&output, &out_bytes).map_err(|e| RewriteError::io(&output, e))?;
        Ok(if rewritten {
            FileOutcome::Rewritten(output)
        } else {
            FileOutcome::Copied(output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ClassPoolBuilder;
    use crate::testing::ClassBuilder;
    use std::io::Write;

    const ENTRY_POINT: &str = "Ldagger/hilt/android/AndroidEntryPoint;";

    fn marked_a() -> Vec<u8> {
        ClassBuilder::new("com/example/A", "java/lang/Object")
            .annotation(ENTRY_POINT, false)
            .constructor_calling_super()
            .build()
    }

    fn unmarked_b() -> Vec<u8> {
        ClassBuilder::new("com/example/B", "java/lang/Object")
            .constructor_calling_super()
            .build()
    }

    fn pool_with(classes: &[&str]) -> ClassPool {
        let mut builder = ClassPoolBuilder::new();
        for class in classes {
            builder.add_class(class);
        }
        builder.build()
    }

    fn origin() -> PathBuf {
        PathBuf::from("in/com/example/A.class")
    }

    #[test]
    fn marked_class_extends_generated_superclass() {
        let pool = pool_with(&["com/example/Hilt_A"]);
        let transformer = ClassTransformer::new(&pool, RewriteOptions::default(), "test");

        let outcome = transformer.transform_class(&marked_a(), &origin()).unwrap();
        let ClassOutcome::Rewritten {
            bytes,
            old_super,
            new_super,
            ..
        } = outcome
        else {
            panic!("expected a rewrite, got {outcome:?}");
        };
        assert_eq!(old_super, "java/lang/Object");
        assert_eq!(new_super, "com/example/Hilt_A");
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.super_name(), Some("com/example/Hilt_A"));
    }

    #[test]
    fn missing_generated_superclass_names_the_class() {
        let pool = pool_with(&[]);
        let transformer = ClassTransformer::new(&pool, RewriteOptions::default(), "test");
        let err = transformer.transform_class(&marked_a(), &origin()).unwrap_err();
        match err {
            RewriteError::MissingSuperclass { class, superclass } => {
                assert_eq!(class, "com/example/A");
                assert_eq!(superclass, "com/example/Hilt_A");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn rewriting_is_idempotent() {
        let pool = pool_with(&["com/example/Hilt_A"]);
        let transformer = ClassTransformer::new(&pool, RewriteOptions::default(), "test");
        let ClassOutcome::Rewritten { bytes, .. } =
            transformer.transform_class(&marked_a(), &origin()).unwrap()
        else {
            panic!("expected a rewrite");
        };
        let again = transformer.transform_class(&bytes, &origin()).unwrap();
        assert_eq!(again, ClassOutcome::AlreadyRewritten);
    }

    #[test]
    fn unmarked_class_passes_through() {
        let pool = pool_with(&[]);
        let transformer = ClassTransformer::new(&pool, RewriteOptions::default(), "test");
        let outcome = transformer.transform_class(&unmarked_b(), &origin()).unwrap();
        assert_eq!(outcome, ClassOutcome::PassThrough);
    }

    #[test]
    fn custom_marker_and_prefix() {
        let pool = pool_with(&["x/Gen_Main"]);
        let options = RewriteOptions {
            markers: vec!["x/Marker".to_string()],
            prefix: "Gen_".to_string(),
            mode: RewriteMode::CopyThrough,
        };
        let transformer = ClassTransformer::new(&pool, options, "test");
        let bytes = ClassBuilder::new("x/Main", "x/Base")
            .annotation("Lx/Marker;", true)
            .build();
        let outcome = transformer.transform_class(&bytes, &origin()).unwrap();
        assert!(matches!(
            outcome,
            ClassOutcome::Rewritten { ref new_super, .. } if new_super == "x/Gen_Main"
        ));

        // The default markers no longer apply.
        let unmarked = ClassBuilder::new("x/Other", "x/Base")
            .annotation(ENTRY_POINT, false)
            .build();
        assert_eq!(
            transformer.transform_class(&unmarked, &origin()).unwrap(),
            ClassOutcome::PassThrough
        );
    }

    #[test]
    fn malformed_input_names_the_path() {
        let pool = pool_with(&[]);
        let transformer = ClassTransformer::new(&pool, RewriteOptions::default(), "test");
        let err = transformer.transform_class(b"not a class", &origin()).unwrap_err();
        assert!(matches!(err, RewriteError::Malformed { ref path, .. } if path == &origin()));
    }

    #[test]
    fn copy_through_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        write_file(&input.join("com/example/A.class"), &marked_a()).unwrap();
        write_file(&input.join("com/example/B.class"), &unmarked_b()).unwrap();
        write_file(&input.join("com/example/notes.txt"), b"resource").unwrap();

        let pool = pool_with(&["com/example/Hilt_A"]);
        let transformer = ClassTransformer::new(&pool, RewriteOptions::default(), "test");
        for rel in ["com/example/A.class", "com/example/B.class", "com/example/notes.txt"] {
            let file = join_slash_path(&input, rel);
            transformer.transform_file(&file, rel, &output).unwrap();
        }

        let a_bytes = std::fs::read(output.join("com/example/A.class")).unwrap();
        let a = ClassFile::parse(&a_bytes).unwrap();
        assert_eq!(a.super_name(), Some("com/example/Hilt_A"));
        assert_eq!(
            std::fs::read(output.join("com/example/B.class")).unwrap(),
            unmarked_b()
        );
        assert_eq!(
            std::fs::read(output.join("com/example/notes.txt")).unwrap(),
            b"resource"
        );
    }

    #[test]
    fn outputs_follow_the_input_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in/misplaced/A.class");
        let output = dir.path().join("out");
        write_file(&input, &marked_a()).unwrap();

        let pool = pool_with(&["com/example/Hilt_A"]);
        let transformer = ClassTransformer::new(&pool, RewriteOptions::default(), "test");
        let outcome = transformer
            .transform_file(&input, "misplaced/A.class", &output)
            .unwrap();
        assert_eq!(outcome, FileOutcome::Rewritten(output.join("misplaced/A.class")));
        assert!(!output.join("com/example/A.class").exists());
    }

    #[test]
    fn emit_only_drops_unmarked_classes_but_keeps_resources() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        write_file(&input.join("com/example/B.class"), &unmarked_b()).unwrap();
        write_file(&input.join("notes.txt"), b"resource").unwrap();

        let pool = pool_with(&[]);
        let options = RewriteOptions::default().with_mode(RewriteMode::EmitOnlyRewritten);
        let transformer = ClassTransformer::new(&pool, options, "test");
        let outcome = transformer
            .transform_file(&input.join("com/example/B.class"), "com/example/B.class", &output)
            .unwrap();
        assert_eq!(outcome, FileOutcome::Dropped);
        assert!(!output.join("com/example/B.class").exists());

        let outcome = transformer
            .transform_file(&input.join("notes.txt"), "notes.txt", &output)
            .unwrap();
        assert_eq!(outcome.output(), Some(output.join("notes.txt").as_path()));
    }

    #[test]
    fn jar_contents_emit_only_rewritten_classes() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("classes.jar");
        let mut zip = zip::ZipWriter::new(File::create(&jar).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in [
            ("com/example/A.class", marked_a()),
            ("com/example/B.class", unmarked_b()),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(&bytes).unwrap();
        }
        zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
        zip.write_all(b"Manifest-Version: 1.0\n").unwrap();
        zip.finish().unwrap();

        let pool = pool_with(&["com/example/Hilt_A"]);
        let out = dir.path().join("out");
        let transformer = ClassTransformer::new(
            &pool,
            RewriteOptions::default().with_mode(RewriteMode::EmitOnlyRewritten),
            "test",
        );
        assert_eq!(transformer.transform_jar_contents(&jar, &out).unwrap(), 1);
        assert!(out.join("com/example/A.class").is_file());
        assert!(!out.join("com/example/B.class").exists());
        assert!(!out.join("META-INF").exists());
    }

    #[test]
    fn jar_contents_require_emit_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_with(&[]);
        let transformer = ClassTransformer::new(&pool, RewriteOptions::default(), "test");
        let err = transformer
            .transform_jar_contents(&dir.path().join("x.jar"), &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, RewriteError::Internal(_)));
    }
}
