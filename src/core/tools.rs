// src/core/tools.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Every external binary the engine knows how to drive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, Display, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tool {
    Whois,
    Dig,
    Wafw00f,
    Sublist3r,
    Knockpy,
    Nmap,
    Fierce,
    Dnsmap,
    Dnsenum,
    Subfinder,
    Whatweb,
}

/// How a logical tool is actually started: the program to exec and any
/// arguments that must come before the workflow's own (for example
/// `{"program": "sudo", "args": ["nmap"]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }
}

/// Maps logical tools to invocations. Tools without an entry run under
/// their own name, resolved through `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolRegistry {
    overrides: BTreeMap<Tool, ToolInvocation>,
}

impl ToolRegistry {
    pub fn with(mut self, tool: Tool, invocation: ToolInvocation) -> Self {
        self.overrides.insert(tool, invocation);
        self
    }

    pub fn invocation(&self, tool: Tool) -> ToolInvocation {
        self.overrides
            .get(&tool)
            .cloned()
            .unwrap_or_else(|| ToolInvocation::new(tool.as_ref()))
    }

    /// Builds the argument vector for `tool` followed by `args`.
    pub fn command<I, S>(&self, tool: Tool, args: I) -> ToolCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ToolInvocation { program, args: mut argv } = self.invocation(tool);
        argv.extend(args.into_iter().map(Into::into));
        ToolCommand { tool, program, args: argv }
    }
}

/// A fully-formed command: executed directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCommand {
    pub tool: Tool,
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn defaults_to_tool_name() {
        let registry = ToolRegistry::default();
        let cmd = registry.command(Tool::Wafw00f, ["example.com"]);
        assert_eq!(cmd.program, "wafw00f");
        assert_eq!(cmd.to_string(), "wafw00f example.com");
    }

    #[test]
    fn overrides_prepend_leading_args() {
        let registry = ToolRegistry::default().with(
            Tool::Nmap,
            ToolInvocation { program: "sudo".into(), args: vec!["nmap".into()] },
        );
        let cmd = registry.command(Tool::Nmap, ["-Pn", "example.com"]);
        assert_eq!(cmd.program, "sudo");
        assert_eq!(cmd.args, vec!["nmap", "-Pn", "example.com"]);
        assert_eq!(cmd.tool, Tool::Nmap);
    }

    #[test]
    fn registry_deserializes_from_tool_names() {
        let registry: ToolRegistry =
            serde_json::from_str(r#"{"dig": {"program": "/opt/bind/bin/dig"}}"#).unwrap();
        assert_eq!(registry.invocation(Tool::Dig).program, "/opt/bind/bin/dig");
        assert_eq!(registry.invocation(Tool::Whois).program, "whois");
        assert_eq!(Tool::from_str("sublist3r").unwrap(), Tool::Sublist3r);
    }
}
