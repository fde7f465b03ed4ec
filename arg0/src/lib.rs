use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;

use anyhow::anyhow;
use exvi_core::is_editor_name;

/// Name used when argv[0] is missing or unreadable.
const DEFAULT_NAME: &str = "vi";

/// The program name the editor should behave as, plus the arguments after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Resolves the invocation from a raw argv.
    ///
    /// The editor ships as one executable that is linked under the names of
    /// the ex, vi and view families, so the file name of argv[0] normally
    /// decides the behavior. When the executable is run under any other
    /// name, a leading editor name selects the editor instead
    /// (`exvi view notes.txt`).
    pub fn from_args_os<I>(argv: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut argv = argv.into_iter();
        let argv0 = argv.next().unwrap_or_default();
        let mut args = argv.map(into_utf8).collect::<anyhow::Result<Vec<_>>>()?;

        let mut program = invocation_name(&argv0);
        if !is_editor_name(&program) && args.first().is_some_and(|first| is_editor_name(first)) {
            program = args.remove(0);
        }
        Ok(Self { program, args })
    }
}

/// File name component of argv[0].
pub fn invocation_name(argv0: &OsStr) -> String {
    Path::new(argv0)
        .file_name()
        .and_then(OsStr::to_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_NAME)
        .to_string()
}

fn into_utf8(arg: OsString) -> anyhow::Result<String> {
    arg.into_string()
        .map_err(|arg| anyhow!("argument is not valid UTF-8: {}", arg.to_string_lossy()))
}

/// One executable stands in for `ex`, `vi` and `view` (the "arg0 trick").
///
/// Resolves which editor was asked for from the process arguments and hands
/// it to `main_fn`. This function should wrap the `main()` of every binary in
/// this workspace that launches the editor.
pub fn arg0_dispatch_or_else<F>(main_fn: F) -> anyhow::Result<ExitCode>
where
    F: FnOnce(Invocation) -> anyhow::Result<ExitCode>,
{
    let invocation = Invocation::from_args_os(std::env::args_os())?;
    main_fn(invocation)
}
