//! Options files (a.k.a. response files or command files).
//!
//! Long compiler command lines can exceed the host's limit (32K on Windows).
//! Both MSVC and GCC-compatible compilers accept `@path` on the command line
//! and read further arguments from `path`. Each family has its own quoting
//! rules for that file, so rendering and parsing are per [`OptionsFileSyntax`].
//!
//! The writer never decides *whether* to spill; that is up to the caller's
//! configuration (see [`OptionsFileMode`](crate::builder::compiler::OptionsFileMode)).

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::errors::CompileError;
use crate::core::spec::CompileSpec;

/// Quoting rules for an options file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionsFileSyntax {
    /// MSVC / `CommandLineToArgvW` rules: double quotes, backslashes are
    /// literal unless they precede a double quote.
    Windows,
    /// GNU `@file` rules (libiberty `buildargv`): single or double quotes,
    /// backslash escapes any character.
    Gnu,
}

impl OptionsFileSyntax {
    /// Get the syntax name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionsFileSyntax::Windows => "windows",
            OptionsFileSyntax::Gnu => "gnu",
        }
    }

    /// Quote a single argument so that [`split`](Self::split) reads it back unchanged.
    pub fn quote<'a>(&self, arg: &'a str) -> Cow<'a, str> {
        match self {
            OptionsFileSyntax::Windows => quote_windows(arg),
            OptionsFileSyntax::Gnu => quote_gnu(arg),
        }
    }

    /// Split options-file text back into arguments.
    pub fn split(&self, text: &str) -> Vec<String> {
        match self {
            OptionsFileSyntax::Windows => split_windows(text),
            OptionsFileSyntax::Gnu => split_gnu(text),
        }
    }

    /// Render a full argument list, one argument per line.
    pub fn render(&self, args: &[String]) -> String {
        let mut out = String::new();
        for arg in args {
            out.push_str(&self.quote(arg));
            out.push('\n');
        }
        out
    }

    /// The command-line token that makes the compiler read `path`.
    pub fn reference(&self, path: &Path) -> String {
        format!("@{}", path.display())
    }
}

impl std::str::FromStr for OptionsFileSyntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "windows" | "msvc" => Ok(OptionsFileSyntax::Windows),
            "gnu" | "gcc" | "clang" => Ok(OptionsFileSyntax::Gnu),
            other => Err(format!(
                "unknown options file syntax `{}` (expected `windows` or `gnu`)",
                other
            )),
        }
    }
}

fn quote_windows(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '"') {
        return Cow::Borrowed(arg);
    }

    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                // Backslashes before a quote are doubled, plus one to escape it.
                out.extend(std::iter::repeat('\\').take(backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat('\\').take(backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    // Trailing backslashes precede the closing quote.
    out.extend(std::iter::repeat('\\').take(backslashes * 2));
    out.push('"');
    Cow::Owned(out)
}

fn split_windows(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let mut count = 1usize;
                while chars.peek() == Some(&'\\') {
                    chars.next();
                    count += 1;
                }
                if chars.peek() == Some(&'"') {
                    current.extend(std::iter::repeat('\\').take(count / 2));
                    if count % 2 == 1 {
                        chars.next();
                        current.push('"');
                    }
                } else {
                    current.extend(std::iter::repeat('\\').take(count));
                }
                in_token = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }
    args
}

fn quote_gnu(arg: &str) -> Cow<'_, str> {
    let needs_quoting = arg.is_empty()
        || arg.contains(|c: char| c.is_whitespace() || matches!(c, '\\' | '"' | '\''));
    if !needs_quoting {
        return Cow::Borrowed(arg);
    }

    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    Cow::Owned(out)
}

fn split_gnu(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match (c, quote) {
            ('\\', _) => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
                in_token = true;
            }
            (q, Some(open)) if q == open => quote = None,
            ('\'' | '"', None) => {
                quote = Some(c);
                in_token = true;
            }
            (c, None) if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (c, _) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }
    args
}

/// Writes an argument list to an options file and rewrites the list to
/// reference it.
pub struct OptionsFileWriter<'a> {
    syntax: OptionsFileSyntax,
    scratch_dir: PathBuf,
    prefix: String,
    keep: Option<Box<dyn Fn(&str) -> bool + 'a>>,
}

impl<'a> OptionsFileWriter<'a> {
    /// Create a writer placing options files in `scratch_dir`.
    pub fn new(syntax: OptionsFileSyntax, scratch_dir: impl Into<PathBuf>) -> Self {
        OptionsFileWriter {
            syntax,
            scratch_dir: scratch_dir.into(),
            prefix: "options-".to_string(),
            keep: None,
        }
    }

    /// Create a writer whose file names start with the spec's source file stem.
    pub fn for_spec(
        syntax: OptionsFileSyntax,
        scratch_dir: impl Into<PathBuf>,
        spec: &CompileSpec,
    ) -> Self {
        let stem = spec
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "options".to_string());
        Self::new(syntax, scratch_dir).prefix(format!("{}-", stem))
    }

    /// Set the file name prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Keep arguments matching `predicate` on the literal command line.
    pub fn keep_on_command_line<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + 'a,
    {
        self.keep = Some(Box::new(predicate));
        self
    }

    /// Spill `args` into a new options file.
    ///
    /// Afterwards `args` holds the `@file` reference followed by any kept
    /// arguments in their original order. Returns the file written, or
    /// `None` when there was nothing to spill.
    ///
    /// The file is fully written before `args` is touched; on error `args`
    /// is left as it was and no partial file remains.
    pub fn apply(&self, args: &mut Vec<String>) -> Result<Option<PathBuf>, CompileError> {
        let (kept, spilled): (Vec<String>, Vec<String>) = args
            .iter()
            .cloned()
            .partition(|arg| self.keep.as_ref().is_some_and(|keep| keep(arg)));

        if spilled.is_empty() {
            return Ok(None);
        }

        let path = self.write(&self.syntax.render(&spilled))?;

        tracing::debug!(
            "Wrote {} argument(s) to options file {}",
            spilled.len(),
            path.display()
        );

        args.clear();
        args.push(self.syntax.reference(&path));
        args.extend(kept);
        Ok(Some(path))
    }

    fn write(&self, contents: &str) -> Result<PathBuf, CompileError> {
        let scratch_io = |source: io::Error| CompileError::ScratchIo {
            dir: self.scratch_dir.clone(),
            source,
        };

        fs::create_dir_all(&self.scratch_dir).map_err(scratch_io)?;

        // Created with O_EXCL and a random suffix, so concurrent invocations
        // sharing the scratch directory never collide. Dropping the temp file
        // before `keep` removes it.
        let mut file = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(".rsp")
            .rand_bytes(10)
            .tempfile_in(&self.scratch_dir)
            .map_err(scratch_io)?;

        file.write_all(contents.as_bytes()).map_err(scratch_io)?;
        file.flush().map_err(scratch_io)?;

        let (_, path) = file.keep().map_err(|e| scratch_io(e.error))?;
        Ok(path)
    }
}
