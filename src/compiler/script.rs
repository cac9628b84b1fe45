//! Script-backed compiler.
//!
//! Lets third-party conversion logic written in Lua plug into the pipeline
//! without a native conversion library. The program is read and compiled
//! once into a Lua function; every [`compile`](Compiler::compile) call then
//! binds its inputs as globals and runs that function:
//!
//! | Global              | Value                                   |
//! |---------------------|-----------------------------------------|
//! | `<input>`           | source text (name configurable)         |
//! | `sourcePath`        | path of the document being compiled     |
//! | `site`              | site variables as a table               |
//! | `<output>`          | cleared to `nil` before each run        |
//!
//! The result is the program's return value, or, if it returns nothing,
//! the `<output>` global.
//!
//! A Lua state is not reentrant, so each compiler guards its runtime with a
//! mutex held for exactly one call.

use super::{CompileError, Compiler};
use crate::site::Site;
use mlua::{Function, Lua, LuaSerdeExt, Value};
use parking_lot::Mutex;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Global holding the path of the document being compiled.
const SOURCE_PATH_GLOBAL: &str = "sourcePath";

/// Global holding the site variables.
const SITE_GLOBAL: &str = "site";

/// One Lua state plus the compiled conversion program.
struct ScriptRuntime {
    lua: Lua,
    program: Function,
}

impl ScriptRuntime {
    fn load(chunk_name: &str, source: &str) -> mlua::Result<Self> {
        let lua = Lua::new();
        let program = lua.load(source).set_name(chunk_name).into_function()?;
        Ok(Self { lua, program })
    }
}

pub struct ScriptCompiler {
    name: String,
    program: Option<PathBuf>,
    input: String,
    output: String,
    runtime: Mutex<ScriptRuntime>,
}

impl std::fmt::Debug for ScriptCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptCompiler")
            .field("name", &self.name)
            .field("program", &self.program)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl ScriptCompiler {
    /// Load the program at `program` into a fresh runtime.
    pub fn load(
        name: &str,
        program: PathBuf,
        input: &str,
        output: &str,
    ) -> Result<Self, CompileError> {
        let source = read_program(&program)?;
        let runtime = ScriptRuntime::load(&program.display().to_string(), &source)?;
        Ok(Self {
            name: name.to_owned(),
            program: Some(program),
            input: input.to_owned(),
            output: output.to_owned(),
            runtime: Mutex::new(runtime),
        })
    }

    /// Build a compiler from program text that has no backing file.
    ///
    /// [`reload`](Self::reload) is a no-op for such compilers.
    pub fn from_source(
        name: &str,
        source: &str,
        input: &str,
        output: &str,
    ) -> Result<Self, CompileError> {
        let runtime = ScriptRuntime::load(name, source)?;
        Ok(Self {
            name: name.to_owned(),
            program: None,
            input: input.to_owned(),
            output: output.to_owned(),
            runtime: Mutex::new(runtime),
        })
    }

    /// Re-read the program from disk and swap in a fresh runtime.
    ///
    /// The old runtime stays in place if the new program fails to load.
    pub fn reload(&self) -> Result<(), CompileError> {
        let Some(program) = &self.program else {
            return Ok(());
        };
        let source = read_program(program)?;
        let runtime = ScriptRuntime::load(&program.display().to_string(), &source)?;
        *self.runtime.lock() = runtime;
        Ok(())
    }
}

impl Compiler for ScriptCompiler {
    fn compile(&self, source: &Path, text: &str, site: &Site) -> Result<String, CompileError> {
        let runtime = self.runtime.lock();
        let lua = &runtime.lua;
        let globals = lua.globals();

        globals.set(self.input.as_str(), text)?;
        globals.set(SOURCE_PATH_GLOBAL, source.to_string_lossy().into_owned())?;
        globals.set(SITE_GLOBAL, lua.to_value(site.variables())?)?;
        globals.set(self.output.as_str(), Value::Nil)?;

        let returned = runtime.program.call::<Option<String>>(())?;
        let output = match returned {
            Some(output) => Some(output),
            None => globals.get::<Option<String>>(self.output.as_str())?,
        };

        output.ok_or_else(|| CompileError::NoOutput {
            program: self.name.clone(),
            variable: self.output.clone(),
        })
    }
}

fn read_program(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{sync::Arc, thread};
    use tempfile::TempDir;

    const UPPERCASE: &str = "return string.upper(source)";

    fn compile(compiler: &ScriptCompiler, text: &str) -> Result<String, CompileError> {
        compiler.compile(Path::new("doc.adoc"), text, &Site::default())
    }

    #[test]
    fn test_return_value() {
        let compiler = ScriptCompiler::from_source("upper", UPPERCASE, "source", "output").unwrap();
        assert_eq!(compile(&compiler, "hello").unwrap(), "HELLO");
    }

    #[test]
    fn test_output_variable() {
        let program = "html = '<p>' .. asciidocSource .. '</p>'";
        let compiler =
            ScriptCompiler::from_source("adoc", program, "asciidocSource", "html").unwrap();
        assert_eq!(compile(&compiler, "text").unwrap(), "<p>text</p>");
    }

    #[test]
    fn test_output_cleared_between_calls() {
        // Sets the output only for non-empty input.
        let program = "if #source > 0 then output = source end";
        let compiler = ScriptCompiler::from_source("cond", program, "source", "output").unwrap();
        assert_eq!(compile(&compiler, "first").unwrap(), "first");

        let err = compile(&compiler, "").unwrap_err();
        assert!(matches!(err, CompileError::NoOutput { .. }));
    }

    #[test]
    fn test_source_path_and_site_bindings() {
        let program = "return sourcePath .. ':' .. site.title";
        let compiler = ScriptCompiler::from_source("bind", program, "source", "output").unwrap();

        let mut vars = crate::render::Variables::new();
        vars.insert("title".into(), json!("Blog"));
        let out = compiler
            .compile(Path::new("posts/a.adoc"), "", &Site::new(vars))
            .unwrap();
        assert_eq!(out, "posts/a.adoc:Blog");
    }

    #[test]
    fn test_runtime_error_is_fatal() {
        let compiler =
            ScriptCompiler::from_source("boom", "error('conversion failed')", "source", "output")
                .unwrap();
        let err = compile(&compiler, "x").unwrap_err();
        assert!(matches!(err, CompileError::Script(_)));
        assert!(err.to_string().contains("conversion failed"));
    }

    #[test]
    fn test_syntax_error_on_load() {
        let err = ScriptCompiler::from_source("bad", "return (", "source", "output").unwrap_err();
        assert!(matches!(err, CompileError::Script(_)));
    }

    #[test]
    fn test_load_missing_program() {
        let err = ScriptCompiler::load(
            "missing",
            PathBuf::from("/nonexistent/convert.lua"),
            "source",
            "output",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Io { .. }));
    }

    #[test]
    fn test_program_loaded_once() {
        // Top-level state survives between calls: the chunk is compiled once
        // and the same Lua state is reused.
        let program = "calls = (calls or 0) + 1\nreturn tostring(calls)";
        let compiler = ScriptCompiler::from_source("count", program, "source", "output").unwrap();
        assert_eq!(compile(&compiler, "").unwrap(), "1");
        assert_eq!(compile(&compiler, "").unwrap(), "2");
    }

    #[test]
    fn test_reload_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("convert.lua");
        fs::write(&path, "return 'v1'").unwrap();

        let compiler = ScriptCompiler::load("convert", path.clone(), "source", "output").unwrap();
        assert_eq!(compile(&compiler, "").unwrap(), "v1");

        fs::write(&path, "return 'v2'").unwrap();
        assert_eq!(compile(&compiler, "").unwrap(), "v1");
        compiler.reload().unwrap();
        assert_eq!(compile(&compiler, "").unwrap(), "v2");

        // A broken program keeps the previous runtime.
        fs::write(&path, "return (").unwrap();
        assert!(compiler.reload().is_err());
        assert_eq!(compile(&compiler, "").unwrap(), "v2");
    }

    #[test]
    fn test_concurrent_compile() {
        let compiler =
            Arc::new(ScriptCompiler::from_source("upper", UPPERCASE, "source", "output").unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let compiler = Arc::clone(&compiler);
                thread::spawn(move || {
                    let text = format!("doc {i}");
                    (0..20)
                        .map(|_| compile(&compiler, &text).unwrap())
                        .all(|out| out == text.to_uppercase())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
