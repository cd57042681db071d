//! MSVC toolchain implementation.

use std::path::{Path, PathBuf};

use crate::builder::options_file::OptionsFileSyntax;
use crate::core::language::Language;
use crate::core::spec::CompileSpec;
use crate::util::fs::{absolute, absolutize, relativize};

use super::{macro_arg, note_partial_pch, Toolchain, ToolchainPlatform};

/// Extension appended to the object file name to form the debug database.
pub const DEBUG_DATABASE_EXTENSION: &str = "pdb";

/// MSVC toolchain (`cl.exe`).
#[derive(Debug, Clone, Default)]
pub struct MsvcToolchain;

impl MsvcToolchain {
    /// Create a new MSVC toolchain.
    pub fn new() -> Self {
        MsvcToolchain
    }

    /// Debug database written next to `output_file`: `foo.obj` -> `foo.obj.pdb`.
    pub fn debug_database(output_file: &Path) -> PathBuf {
        let name = output_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        output_file.with_file_name(format!("{}.{}", name, DEBUG_DATABASE_EXTENSION))
    }
}

impl Toolchain for MsvcToolchain {
    fn platform(&self) -> ToolchainPlatform {
        ToolchainPlatform::Msvc
    }

    fn common_args(&self, spec: &CompileSpec) -> Vec<String> {
        // Quiet logo, compile only
        let mut args = vec!["/nologo".to_string(), "/c".to_string()];

        // Force the source language regardless of extension
        args.push(
            match spec.language {
                Language::C => "/TC",
                Language::Cxx => "/TP",
            }
            .to_string(),
        );

        if spec.debuggable {
            args.push("/Zi".to_string());
        }
        if spec.optimized {
            args.push("/O2".to_string());
        }

        for m in &spec.macros {
            args.push(macro_arg("/D", m));
        }

        for dir in &spec.include_dirs {
            args.push(format!("/I{}", relativize(&spec.working_dir, dir)));
        }

        args
    }

    fn output_args(&self, spec: &CompileSpec, output_file: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if spec.debuggable {
            let pdb = Self::debug_database(output_file);
            args.push(format!("/Fd{}", relativize(&spec.working_dir, &pdb)));
        }
        // cl.exe rejects a space between /Fo and the file name
        args.push(format!("/Fo{}", relativize(&spec.working_dir, output_file)));
        args
    }

    fn pch_args(&self, spec: &CompileSpec) -> Vec<String> {
        note_partial_pch(spec);

        match spec.precompiled_header() {
            Some((header, object_file)) => {
                // Absolute even when the working directory itself is relative
                let object_file = absolute(&absolutize(&spec.working_dir, object_file));
                vec![
                    format!("/Yu{}", header),
                    format!("/Fp{}", object_file.display()),
                ]
            }
            None => Vec::new(),
        }
    }

    fn options_file_syntax(&self) -> OptionsFileSyntax {
        OptionsFileSyntax::Windows
    }

    fn object_extension(&self) -> &str {
        "obj"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> CompileSpec {
        CompileSpec::new("/build/src/foo.c", "/build/obj/foo.o", "/build")
    }

    fn native(path: &str) -> String {
        Path::new(path).to_string_lossy().into_owned()
    }

    #[test]
    fn test_output_args_debuggable() {
        let spec = spec().debuggable(true);
        let args = MsvcToolchain::new().output_args(&spec, &spec.output);
        assert_eq!(
            args,
            vec![
                format!("/Fd{}", native("obj/foo.o.pdb")),
                format!("/Fo{}", native("obj/foo.o")),
            ]
        );
    }

    #[test]
    fn test_output_args_not_debuggable() {
        let spec = spec();
        let args = MsvcToolchain::new().output_args(&spec, &spec.output);
        assert_eq!(args, vec![format!("/Fo{}", native("obj/foo.o"))]);
        assert!(!args.iter().any(|a| a.starts_with("/Fd")));
    }

    #[test]
    fn test_output_args_exactly_one_debug_database_first() {
        for output in ["/build/obj/a.obj", "/build/x/y/z/b.obj", "/elsewhere/c.obj"] {
            let spec = CompileSpec::new("/build/a.c", output, "/build").debuggable(true);
            let args = MsvcToolchain::new().output_args(&spec, &spec.output);

            let fd: Vec<_> = args.iter().filter(|a| a.starts_with("/Fd")).collect();
            assert_eq!(fd.len(), 1);
            assert!(args[0].starts_with("/Fd"));
            assert!(args[1].starts_with("/Fo"));

            let expected = MsvcToolchain::debug_database(Path::new(output));
            assert_eq!(
                args[0],
                format!("/Fd{}", relativize(Path::new("/build"), &expected))
            );
        }
    }

    #[test]
    fn test_output_outside_working_dir() {
        let spec = CompileSpec::new("/build/a.c", "/out/a.obj", "/build/sub");
        let args = MsvcToolchain::new().output_args(&spec, &spec.output);
        assert_eq!(args, vec![format!("/Fo{}", native("../../out/a.obj"))]);
    }

    #[test]
    fn test_debug_database_name() {
        assert_eq!(
            MsvcToolchain::debug_database(Path::new("/b/obj/foo.obj")),
            Path::new("/b/obj/foo.obj.pdb")
        );
    }

    #[test]
    fn test_pch_args_none() {
        assert!(MsvcToolchain::new().pch_args(&spec()).is_empty());
    }

    #[test]
    fn test_pch_args_both_set() {
        let spec = spec().precompiled("stdafx.h", "/build/pch/stdafx.pch");
        assert_eq!(
            MsvcToolchain::new().pch_args(&spec),
            vec![
                "/Yustdafx.h".to_string(),
                format!("/Fp{}", Path::new("/build/pch/stdafx.pch").display()),
            ]
        );
    }

    #[test]
    fn test_pch_args_relative_object_made_absolute() {
        let spec = spec().precompiled("stdafx.h", "pch/stdafx.pch");
        let args = MsvcToolchain::new().pch_args(&spec);
        assert_eq!(
            args[1],
            format!("/Fp{}", Path::new("/build/pch/stdafx.pch").display())
        );
    }

    #[test]
    fn test_pch_args_relative_working_dir() {
        let spec = CompileSpec::new("build/src/a.c", "build/obj/a.obj", "build")
            .precompiled("stdafx.h", "pch/stdafx.pch");
        let args = MsvcToolchain::new().pch_args(&spec);

        let expected = std::env::current_dir().unwrap().join("build/pch/stdafx.pch");
        assert_eq!(args[0], "/Yustdafx.h");
        assert_eq!(args[1], format!("/Fp{}", expected.display()));
        assert!(Path::new(&args[1][3..]).is_absolute());
    }

    #[test]
    fn test_pch_args_half_set_is_empty() {
        let mut header_only = spec();
        header_only.precompiled_header = Some("stdafx.h".to_string());
        assert!(MsvcToolchain::new().pch_args(&header_only).is_empty());

        let mut object_only = spec();
        object_only.precompiled_header_object_file = Some(PathBuf::from("/build/pch/stdafx.pch"));
        assert!(MsvcToolchain::new().pch_args(&object_only).is_empty());
    }

    #[test]
    fn test_common_args() {
        let spec = spec()
            .language(Language::Cxx)
            .debuggable(true)
            .optimized(true)
            .define("NDEBUG", None)
            .define("LEVEL", Some("3"))
            .include_dir("/build/include");

        assert_eq!(
            MsvcToolchain::new().common_args(&spec),
            vec![
                "/nologo",
                "/c",
                "/TP",
                "/Zi",
                "/O2",
                "/DNDEBUG",
                "/DLEVEL=3",
                "/Iinclude",
            ]
        );
    }

    #[test]
    fn test_builders_do_not_modify_spec() {
        let spec = spec().debuggable(true).precompiled("stdafx.h", "/build/pch/stdafx.pch");
        let before = spec.clone();
        let tc = MsvcToolchain::new();
        let _ = tc.common_args(&spec);
        let _ = tc.output_args(&spec, &spec.output);
        let _ = tc.pch_args(&spec);
        assert_eq!(spec, before);
    }
}
