//! Invocation parsing and compile-stage classification.

use std::path::{Path, PathBuf};

use crate::error::InterceptError;

/// The version-probe flag the orchestrator sends before caching decisions.
pub(crate) const VERSION_PROBE_FLAG: &str = "-V=full";

/// Base name of the per-file compilation tool.
const COMPILE_TOOL_NAME: &str = "compile";

/// Flag that immediately precedes the trailing source-file list.
pub(crate) const FILE_LIST_MARKER: &str = "-pack";

/// The observed `(toolPath, argumentVector)` pair the interceptor was
/// launched with. Immutable once parsed.
///
/// Two launch variants exist: the orchestrator always passes
/// `(tool, toolArgs...)`, and callers that must communicate the project root
/// explicitly prepend it as a working-directory argument. A leading argument
/// naming an existing directory selects the latter variant.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The full argument vector, including the interceptor's own `argv[0]`.
    argv: Vec<String>,
    /// Index of the real tool path within `argv`.
    tool_index: usize,
    /// Explicit project root, when launched with a working-directory argument.
    project_root_arg: Option<PathBuf>,
}

impl Invocation {
    /// Parses an argument vector (including `argv[0]`) into an invocation.
    ///
    /// Fails with [`InterceptError::ProtocolMismatch`] when no tool path is
    /// present at all; any stranger shape is left to [`classify`], which
    /// fails open to pass-through.
    pub fn parse(argv: Vec<String>) -> Result<Self, InterceptError> {
        if argv.len() < 2 {
            return Err(InterceptError::protocol(
                "expected a tool path after the interceptor's own name",
            ));
        }

        let leading = Path::new(&argv[1]);
        let (tool_index, project_root_arg) = if argv.len() >= 3 && leading.is_dir() {
            (2, Some(leading.to_path_buf()))
        } else {
            (1, None)
        };

        Ok(Self {
            argv,
            tool_index,
            project_root_arg,
        })
    }

    /// The path of the real tool to execute.
    pub fn tool(&self) -> &Path {
        Path::new(&self.argv[self.tool_index])
    }

    /// Base name of the real tool, used for stage classification.
    pub fn tool_name(&self) -> &str {
        self.tool()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// The arguments destined for the real tool.
    pub fn tool_args(&self) -> &[String] {
        &self.argv[self.tool_index + 1..]
    }

    /// Offset of the first tool argument within the full argument vector.
    pub fn args_offset(&self) -> usize {
        self.tool_index + 1
    }

    /// The full argument vector, including `argv[0]`.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Index of the real tool path within the argument vector.
    pub fn tool_index(&self) -> usize {
        self.tool_index
    }

    /// Explicit project root from the working-directory launch variant.
    pub fn project_root_arg(&self) -> Option<&Path> {
        self.project_root_arg.as_deref()
    }
}

/// The stage of the toolchain this invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStage {
    /// The orchestrator is probing the tool's version/identity line.
    VersionProbe,
    /// A per-file compilation step eligible for rewriting.
    CompileStep,
    /// Any other stage (assemble, link, ...): always pass through.
    OtherStage,
}

/// Classifies an invocation from its argument shape. Pure; never fails.
///
/// Unrecognized shapes default to [`ToolStage::OtherStage`] so that an
/// unexpected invocation passes through to the real tool instead of
/// blocking the build.
pub fn classify(invocation: &Invocation) -> ToolStage {
    let args = invocation.tool_args();
    if args.len() == 1 && args[0] == VERSION_PROBE_FLAG {
        return ToolStage::VersionProbe;
    }
    if invocation.tool_name() == COMPILE_TOOL_NAME
        && args.iter().any(|a| a == FILE_LIST_MARKER)
    {
        return ToolStage::CompileStep;
    }
    ToolStage::OtherStage
}
