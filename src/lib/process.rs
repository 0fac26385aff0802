//! Running external programs such as `git`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// A program to run, its arguments and the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// The argument list as a string, for log and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs an [`Invocation`] to completion and reports how it exited.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ExitStatus>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ExitStatus> {
        (**self).run(invocation)
    }
}

/// Spawns real processes which share this process' stdin, stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ExitStatus> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command.status()
    }
}

#[cfg(test)]
mod test_invocation {
    use super::*;

    #[test]
    fn builds_command_line() {
        let invocation = Invocation::new("git")
            .args(["clone", "--depth", "1"])
            .arg("https://example.com/a/b.git")
            .arg(Path::new("dest"))
            .current_dir("/tmp");
        assert_eq!(
            invocation.command_line(),
            "git clone --depth 1 https://example.com/a/b.git dest"
        );
        assert_eq!(invocation.cwd.as_deref(), Some(Path::new("/tmp")));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_status() {
        let ok = SystemRunner.run(&Invocation::new("true")).unwrap();
        assert!(ok.success());
        let failed = SystemRunner.run(&Invocation::new("false")).unwrap();
        assert!(!failed.success());
    }
}
