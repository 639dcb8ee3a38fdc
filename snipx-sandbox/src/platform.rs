//! Per-platform mapping from runtime kind to script layout and interpreter
//!
//! Each platform family gets its own [`ScriptPlatform`] implementation;
//! [`HostPlatform`] picks the one matching the build target. Both are
//! compiled everywhere, so either mapping can be inspected on any host.

use encoding_rs::Encoding;
use snipx_common::RuntimeKind;
use std::path::Path;

/// How to stage and launch a script for one runtime kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPlan {
    /// Shell variant that actually runs the script, after platform fallback
    pub shell: RuntimeKind,

    /// File extension, including the leading dot
    pub extension: &'static str,

    /// Interpreter program
    pub program: String,

    /// Arguments placed before the script path
    pub args: Vec<String>,

    /// Lines written ahead of the snippet
    pub prologue: Vec<&'static str>,

    /// Transcode the snippet into the native narrow encoding before writing
    pub narrow_payload: bool,

    /// Set the owner execute bit on the staged file
    pub executable: bool,
}

impl ScriptPlan {
    /// Replace the interpreter program, keeping the arguments
    pub fn with_program(mut self, program: Option<&str>) -> Self {
        if let Some(program) = program {
            self.program = program.to_string();
        }
        self
    }

    /// Human-readable command line, for logs
    pub fn command_line(&self, script: &Path) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.push(script.display().to_string());
        parts.join(" ")
    }
}

/// Process-launch strategy for one platform family
pub trait ScriptPlatform: Send + Sync + std::fmt::Debug {
    /// Platform family name
    fn name(&self) -> &'static str;

    /// Resolve staging and launch details; unknown kinds get the default plan
    fn plan(&self, kind: RuntimeKind) -> ScriptPlan;

    /// Legacy narrow encoding console output may arrive in
    fn native_encoding(&self) -> Option<&'static Encoding>;
}

/// Linux and macOS: `bash` by default, `pwsh` for PowerShell
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixPlatform;

impl ScriptPlatform for UnixPlatform {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn plan(&self, kind: RuntimeKind) -> ScriptPlan {
        match kind {
            RuntimeKind::PowerShell => ScriptPlan {
                shell: RuntimeKind::PowerShell,
                extension: ".ps1",
                program: "pwsh".to_string(),
                args: vec!["-ExecutionPolicy".into(), "Bypass".into(), "-File".into()],
                prologue: Vec::new(),
                narrow_payload: false,
                executable: true,
            },
            // bash is also the fallback for kinds this platform has no
            // interpreter for
            RuntimeKind::Bash | RuntimeKind::Batch | RuntimeKind::Embedded => ScriptPlan {
                shell: RuntimeKind::Bash,
                extension: ".sh",
                program: "bash".to_string(),
                args: Vec::new(),
                prologue: vec!["#!/bin/bash"],
                narrow_payload: false,
                executable: true,
            },
        }
    }

    fn native_encoding(&self) -> Option<&'static Encoding> {
        None
    }
}

/// Windows: `cmd.exe` batch files by default, Windows PowerShell for `.ps1`
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPlatform;

impl ScriptPlatform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn plan(&self, kind: RuntimeKind) -> ScriptPlan {
        match kind {
            RuntimeKind::PowerShell => ScriptPlan {
                shell: RuntimeKind::PowerShell,
                extension: ".ps1",
                program: "powershell.exe".to_string(),
                args: vec![
                    "-ExecutionPolicy".into(),
                    "Bypass".into(),
                    "-OutputFormat".into(),
                    "Text".into(),
                    "-NonInteractive".into(),
                    "-File".into(),
                ],
                prologue: Vec::new(),
                narrow_payload: false,
                executable: false,
            },
            RuntimeKind::Batch | RuntimeKind::Bash | RuntimeKind::Embedded => ScriptPlan {
                shell: RuntimeKind::Batch,
                extension: ".bat",
                program: "cmd.exe".to_string(),
                args: vec!["/c".into()],
                prologue: vec!["@echo off", "chcp 65001 >nul 2>&1"],
                narrow_payload: true,
                executable: false,
            },
        }
    }

    fn native_encoding(&self) -> Option<&'static Encoding> {
        Some(encoding_rs::WINDOWS_1252)
    }
}

/// Platform strategy for the build target
#[cfg(windows)]
pub type HostPlatform = WindowsPlatform;

/// Platform strategy for the build target
#[cfg(not(windows))]
pub type HostPlatform = UnixPlatform;
