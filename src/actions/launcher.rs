//! Desktop application launching
//!
//! Spoken names are looked up in an [`AppTable`]. Entries whose program
//! exists on disk are started directly; anything else goes through the
//! platform's run-by-name mechanism.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::LaunchError;

/// Spoken application name → launch descriptor
pub type AppTable = BTreeMap<String, LaunchDescriptor>;

/// How to start one application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "DescriptorRepr")]
pub struct LaunchDescriptor {
    /// Absolute path or bare command name
    pub program: String,
    /// Extra arguments
    pub args: Vec<String>,
}

impl LaunchDescriptor {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

/// Accepts `name = "program"` as well as `name = { program, args }`
#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorRepr {
    Program(String),
    Full {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl From<DescriptorRepr> for LaunchDescriptor {
    fn from(repr: DescriptorRepr) -> Self {
        match repr {
            DescriptorRepr::Program(program) => Self::new(program),
            DescriptorRepr::Full { program, args } => Self { program, args },
        }
    }
}

/// How a process was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMethod {
    /// Program path exists on disk
    Direct,
    /// Bare command resolved on `PATH`
    Path,
    /// Handed to the platform's run-by-name mechanism
    Shell,
}

/// A successfully started application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
    pub program: String,
    pub method: LaunchMethod,
}

/// Starts applications by spoken name
pub trait ProcessLauncher {
    /// Whether the name has an entry in the application table
    fn is_known(&self, app_name: &str) -> bool;

    /// Start the application
    ///
    /// # Errors
    ///
    /// Returns error if nothing could be started
    fn launch(&mut self, app_name: &str) -> Result<Launched, LaunchError>;
}

/// Launches processes on the local desktop
pub struct SystemLauncher {
    table: AppTable,
}

impl SystemLauncher {
    #[must_use]
    pub const fn new(table: AppTable) -> Self {
        Self { table }
    }
}

impl ProcessLauncher for SystemLauncher {
    fn is_known(&self, app_name: &str) -> bool {
        self.table.contains_key(app_name)
    }

    fn launch(&mut self, app_name: &str) -> Result<Launched, LaunchError> {
        let descriptor = self
            .table
            .get(app_name)
            .cloned()
            .unwrap_or_else(|| LaunchDescriptor::new(app_name));

        if Path::new(&descriptor.program).is_file() {
            let mut cmd = Command::new(&descriptor.program);
            cmd.args(&descriptor.args);
            return start(cmd, &descriptor.program, LaunchMethod::Direct);
        }

        run_by_name(&descriptor.program, &descriptor.args)
    }
}

fn start(cmd: Command, program: &str, method: LaunchMethod) -> Result<Launched, LaunchError> {
    spawn_detached(cmd).map_err(|source| LaunchError::Spawn {
        program: program.to_string(),
        source,
    })?;

    tracing::info!(program, ?method, "application started");
    Ok(Launched {
        program: program.to_string(),
        method,
    })
}

/// Start a process without waiting for it
///
/// The child is reaped on a background thread so finished launches do not
/// linger as zombies.
fn spawn_detached(mut cmd: Command) -> std::io::Result<()> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

#[cfg(target_os = "windows")]
fn run_by_name(program: &str, args: &[String]) -> Result<Launched, LaunchError> {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(program).args(args);
    start(cmd, program, LaunchMethod::Shell)
}

#[cfg(target_os = "macos")]
fn run_by_name(program: &str, args: &[String]) -> Result<Launched, LaunchError> {
    let mut cmd = Command::new("open");
    cmd.arg("-a").arg(program);
    if !args.is_empty() {
        cmd.arg("--args").args(args);
    }
    start(cmd, program, LaunchMethod::Shell)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn run_by_name(program: &str, args: &[String]) -> Result<Launched, LaunchError> {
    let resolved =
        which::which(program).map_err(|_| LaunchError::NotFound(program.to_string()))?;
    let mut cmd = Command::new(resolved);
    cmd.args(args);
    start(cmd, program, LaunchMethod::Path)
}

#[cfg(not(any(unix, target_os = "windows")))]
fn run_by_name(_program: &str, _args: &[String]) -> Result<Launched, LaunchError> {
    Err(LaunchError::Unsupported)
}

/// Well-known desktop applications for this platform
#[must_use]
pub fn default_app_table() -> AppTable {
    #[cfg(target_os = "windows")]
    let entries: &[(&str, &str)] = &[
        ("notepad", "notepad.exe"),
        ("calculator", "calc.exe"),
        (
            "chrome",
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        ),
        (
            "edge",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ),
        ("vlc", r"C:\Program Files\VideoLAN\VLC\vlc.exe"),
    ];

    #[cfg(target_os = "macos")]
    let entries: &[(&str, &str)] = &[
        ("calculator", "Calculator"),
        ("safari", "Safari"),
        ("chrome", "Google Chrome"),
        ("vlc", "VLC"),
        ("terminal", "Terminal"),
        ("notes", "Notes"),
    ];

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let entries: &[(&str, &str)] = &[
        ("calculator", "gnome-calculator"),
        ("chrome", "google-chrome"),
        ("firefox", "firefox"),
        ("vlc", "vlc"),
        ("terminal", "x-terminal-emulator"),
        ("notepad", "gedit"),
        ("editor", "gedit"),
    ];

    entries
        .iter()
        .map(|(name, program)| ((*name).to_string(), LaunchDescriptor::new(*program)))
        .collect()
}
