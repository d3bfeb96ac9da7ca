//! Permission pattern extraction for tool invocations.
//!
//! When a tool is denied, the UI offers to allow it with a pattern such as
//! `Bash(git log:*)`. Non-shell tools are allowed as a whole, so their only
//! pattern is the bare tool name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Name of the shell tool whose commands get individual patterns.
pub const SHELL_TOOL: &str = "Bash";

/// Command placeholder meaning "the whole tool".
pub const WILDCARD: &str = "*";

/// Shell builtins that never need their own permission.
const BASH_BUILTINS: &[&str] = &[
    "cd", "pwd", "echo", "export", "unset", "set", "source", ".", "alias", "unalias", "true",
    "false", "test", "[", "exit", "return", "pushd", "popd", "read", "eval", "exec", "shift",
    "wait", "type", "printf",
];

/// Commands whose subcommand is part of the permission (`git log`, `npm test`).
const MULTI_WORD_COMMANDS: &[&str] = &[
    "git", "npm", "yarn", "pnpm", "bun", "cargo", "docker", "kubectl", "go", "pip", "uv", "gh",
    "brew", "deno", "poetry",
];

/// Leading `NAME=value` assignments in front of a command.
static ENV_ASSIGNMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").unwrap());

/// Tool name plus the commands a permission prompt should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub tool_name: String,
    pub commands: Vec<String>,
}

/// Extract the commands covered by a tool invocation.
///
/// Non-shell tools yield the single wildcard command.
pub fn extract_tool_info(tool_name: &str, input: &Map<String, Value>) -> ToolInfo {
    let commands = if tool_name == SHELL_TOOL {
        input
            .get("command")
            .and_then(Value::as_str)
            .map(extract_commands)
            .unwrap_or_default()
    } else {
        vec![WILDCARD.to_string()]
    };

    ToolInfo {
        tool_name: tool_name.to_string(),
        commands,
    }
}

/// Build one permission pattern per command.
pub fn generate_tool_patterns(tool_name: &str, commands: &[String]) -> Vec<String> {
    commands
        .iter()
        .map(|command| {
            if command == WILDCARD {
                tool_name.to_string()
            } else {
                format!("{}({}:*)", tool_name, command)
            }
        })
        .collect()
}

/// Shortcut for [`extract_tool_info`] followed by [`generate_tool_patterns`].
pub fn permission_patterns(tool_name: &str, input: &Map<String, Value>) -> Vec<String> {
    let info = extract_tool_info(tool_name, input);
    generate_tool_patterns(&info.tool_name, &info.commands)
}

/// Split a shell command line into the distinct commands it runs.
///
/// Builtins are dropped when anything else remains, so `cd dir && make`
/// yields `make` while a bare `cd dir` still yields `cd`.
pub fn extract_commands(command: &str) -> Vec<String> {
    let all: Vec<String> = split_compound(command)
        .into_iter()
        .filter_map(|segment| command_name(segment.trim()))
        .collect();

    let has_external = all.iter().any(|c| !is_builtin(c));
    let mut commands: Vec<String> = Vec::new();
    for command in all {
        if has_external && is_builtin(&command) {
            continue;
        }
        if !commands.contains(&command) {
            commands.push(command);
        }
    }
    commands
}

fn is_builtin(command: &str) -> bool {
    BASH_BUILTINS.contains(&command)
}

/// Leading command of one segment, with the subcommand for allow-listed tools.
fn command_name(segment: &str) -> Option<String> {
    let mut tokens = segment
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == '"' || c == '\''))
        .filter(|t| !t.is_empty())
        .skip_while(|t| ENV_ASSIGNMENT_REGEX.is_match(t));

    let first = tokens.next()?;
    if MULTI_WORD_COMMANDS.contains(&first) {
        if let Some(sub) = tokens.next().filter(|t| !t.starts_with('-')) {
            return Some(format!("{} {}", first, sub));
        }
    }
    Some(first.to_string())
}

/// Split on `&&`, `||`, `;`, `|` and newlines outside of quotes.
fn split_compound(command: &str) -> Vec<&str> {
    let bytes = command.as_bytes();
    let mut segments = Vec::new();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' && q == b'"' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        let separator_len = match b {
            b'\'' | b'"' => {
                quote = Some(b);
                0
            }
            b'\\' => {
                i += 2;
                continue;
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => 2,
            b'|' if bytes.get(i + 1) == Some(&b'|') => 2,
            b'|' | b';' | b'\n' => 1,
            _ => 0,
        };

        if separator_len > 0 {
            segments.push(&command[start..i]);
            i += separator_len;
            start = i;
        } else {
            i += 1;
        }
    }

    if start < command.len() {
        segments.push(&command[start..]);
    }
    segments
}
