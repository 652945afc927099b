/// Injectable text sources for system properties and the log buffer
///
/// Both are opaque text producers. The defaults shell out to the platform
/// tools; tests substitute fixed strings.
use std::collections::HashMap;
use std::process::{Command, Stdio};

/// Key/value system property lookup
pub trait PropertySource: Send + Sync {
    /// Trimmed value of `key`, `None` when unset or unavailable
    fn property(&self, key: &str) -> Option<String>;
}

/// Whole log buffer dump
pub trait LogSource: Send + Sync {
    fn dump(&self) -> Option<String>;
}

fn run_command(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| log::debug!("{} unavailable: {}", program, e))
        .ok()?;

    if !output.status.success() {
        log::debug!("{} exited with {}", program, output.status);
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `getprop <key>`
#[derive(Debug, Default, Clone, Copy)]
pub struct GetpropCommand;

impl PropertySource for GetpropCommand {
    fn property(&self, key: &str) -> Option<String> {
        let value = run_command("getprop", &[key])?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// `logcat -d`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogcatCommand;

impl LogSource for LogcatCommand {
    fn dump(&self) -> Option<String> {
        run_command("logcat", &["-d"])
    }
}

/// Fixed property table
#[derive(Debug, Default, Clone)]
pub struct StaticProperties {
    values: HashMap<String, String>,
}

impl StaticProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl PropertySource for StaticProperties {
    fn property(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.trim().to_string())
    }
}

/// Fixed log text
#[derive(Debug, Default, Clone)]
pub struct StaticLog(pub Option<String>);

impl StaticLog {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn text(text: &str) -> Self {
        Self(Some(text.to_string()))
    }
}

impl LogSource for StaticLog {
    fn dump(&self) -> Option<String> {
        self.0.clone()
    }
}
