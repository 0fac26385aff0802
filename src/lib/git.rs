//! Fetching a repository with `git clone`.

use std::path::Path;

use crate::cleanup;
use crate::config::DownloadConfiguration;
use crate::descriptor::is_default_branch;
use crate::error::Error;
use crate::process::{Invocation, ProcessRunner};

const GIT: &str = "git";

/// The repository metadata directory removed after cloning.
pub const METADATA_DIR: &str = ".git";

// URLs and refs come from user input. The `--` and `--end-of-options` markers stop git from
// reading a leading `-` as an option.
fn clone_invocation(url: &str, dest: &Path, shallow: bool) -> Invocation {
    let mut git = Invocation::new(GIT).arg("clone");
    if shallow {
        git = git.args(["--depth", "1"]);
    }
    git.arg("--").arg(url).arg(dest)
}

fn checkout_invocation(checkout: &str, dest: &Path) -> Invocation {
    Invocation::new(GIT)
        .args(["checkout", "--end-of-options", checkout])
        .current_dir(dest)
}

fn run<R>(runner: &R, invocation: &Invocation) -> Result<std::process::ExitStatus, Error>
where
    R: ProcessRunner,
{
    log::debug!("running: {}", invocation.command_line());
    runner.run(invocation).map_err(|source| Error::Spawn {
        program: invocation.program.clone(),
        source,
    })
}

/// Clone `url` into `dest`, check out `checkout` and strip the `.git` directory.
///
/// The clone is shallow when the configuration says so or, by default, when `checkout` is
/// `master` or `main`. Any other checkout is run as a separate `git checkout` after cloning,
/// which fails for commits a forced shallow clone didn't fetch.
pub fn clone<R, P>(
    runner: &R,
    url: &str,
    dest: P,
    checkout: &str,
    config: &DownloadConfiguration,
) -> Result<(), Error>
where
    R: ProcessRunner,
    P: AsRef<Path>,
{
    let dest = dest.as_ref();
    let shallow = config.is_shallow_for(checkout);
    log::info!(
        "cloning {url} into {} ({})",
        dest.display(),
        if shallow { "shallow" } else { "full" }
    );

    let status = run(runner, &clone_invocation(url, dest, shallow))?;
    if !status.success() {
        return Err(Error::CloneFailed {
            url: url.to_string(),
            status,
        });
    }

    if !is_default_branch(checkout) {
        let status = run(runner, &checkout_invocation(checkout, dest))?;
        if !status.success() {
            return Err(Error::CheckoutFailed {
                checkout: checkout.to_string(),
                status,
            });
        }
    }

    cleanup::remove_tree(dest.join(METADATA_DIR))
}

#[cfg(all(test, unix))]
mod test_clone {
    use super::*;
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    /// Records invocations. A successful clone creates the destination with a `.git` directory
    /// and a file, like the real thing.
    struct FakeGit {
        calls: RefCell<Vec<Invocation>>,
        clone_code: i32,
        checkout_code: i32,
    }

    impl FakeGit {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                clone_code: 0,
                checkout_code: 0,
            }
        }

        fn args(&self, index: usize) -> Vec<String> {
            self.calls.borrow()[index]
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect()
        }
    }

    impl ProcessRunner for FakeGit {
        fn run(&self, invocation: &Invocation) -> std::io::Result<ExitStatus> {
            self.calls.borrow_mut().push(invocation.clone());
            let code = match invocation.args.first().and_then(|a| a.to_str()) {
                Some("clone") => {
                    if self.clone_code == 0 {
                        let dest = Path::new(invocation.args.last().unwrap());
                        std::fs::create_dir_all(dest.join(".git/refs"))?;
                        std::fs::write(dest.join(".git/HEAD"), "ref: refs/heads/master")?;
                        std::fs::write(dest.join("README.md"), "# fixture")?;
                    }
                    self.clone_code
                }
                _ => self.checkout_code,
            };
            Ok(ExitStatus::from_raw(code << 8))
        }
    }

    #[test]
    fn default_branch_is_shallow_without_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("repo");
        let git = FakeGit::new();
        let config = DownloadConfiguration::default();

        clone(&git, "https://github.com/a/b.git", &dest, "master", &config).unwrap();

        assert_eq!(git.calls.borrow().len(), 1);
        assert_eq!(
            git.args(0),
            vec![
                "clone".to_string(),
                "--depth".to_string(),
                "1".to_string(),
                "--".to_string(),
                "https://github.com/a/b.git".to_string(),
                dest.display().to_string(),
            ]
        );
        assert!(dest.join("README.md").exists());
        assert!(!dest.join(".git").exists());
    }

    #[test]
    fn other_ref_is_full_clone_then_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("repo");
        let git = FakeGit::new();
        let config = DownloadConfiguration::default();

        clone(&git, "https://github.com/a/b.git", &dest, "my-branch", &config).unwrap();

        let calls = git.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].args.contains(&OsString::from("--depth")));
        assert_eq!(
            calls[1].args,
            vec![
                OsString::from("checkout"),
                OsString::from("--end-of-options"),
                OsString::from("my-branch")
            ]
        );
        assert_eq!(calls[1].cwd.as_deref(), Some(dest.as_path()));
        assert!(!dest.join(".git").exists());
    }

    #[test]
    fn forced_shallow_with_other_ref() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("repo");
        let git = FakeGit::new();
        let config = DownloadConfiguration::default().with_shallow(true);

        clone(&git, "u", &dest, "v1.0", &config).unwrap();

        assert!(git.args(0).contains(&"--depth".to_string()));
        assert_eq!(git.args(1), ["checkout", "--end-of-options", "v1.0"]);
    }

    #[test]
    fn forbidden_shallow_on_main() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit::new();
        let config = DownloadConfiguration::default().with_shallow(false);

        clone(&git, "u", dir.path().join("repo"), "main", &config).unwrap();

        assert_eq!(git.calls.borrow().len(), 1);
        assert!(!git.args(0).contains(&"--depth".to_string()));
    }

    #[test]
    fn failed_clone_reports_url_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit {
            clone_code: 128,
            ..FakeGit::new()
        };
        let result = clone(
            &git,
            "https://github.com/a/missing.git",
            dir.path().join("repo"),
            "master",
            &DownloadConfiguration::default(),
        );
        match result {
            Err(Error::CloneFailed { url, status }) => {
                assert_eq!(url, "https://github.com/a/missing.git");
                assert_eq!(status.code(), Some(128));
            }
            other => panic!("expected CloneFailed, got {other:?}"),
        }
        assert_eq!(git.calls.borrow().len(), 1);
    }

    #[test]
    fn failed_checkout_leaves_clone_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("repo");
        let git = FakeGit {
            checkout_code: 1,
            ..FakeGit::new()
        };
        let result = clone(&git, "u", &dest, "deadbeef", &DownloadConfiguration::default());
        assert!(matches!(
            result,
            Err(Error::CheckoutFailed { checkout, .. }) if checkout == "deadbeef"
        ));
        assert!(dest.join(".git").exists());
    }

    #[test]
    fn dash_prefixed_url_and_ref_are_not_options() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("repo");
        let git = FakeGit::new();

        clone(
            &git,
            "--upload-pack=touch /tmp/x",
            &dest,
            "--orphan=x",
            &DownloadConfiguration::default(),
        )
        .unwrap();

        assert_eq!(
            git.args(0),
            [
                "clone".to_string(),
                "--".to_string(),
                "--upload-pack=touch /tmp/x".to_string(),
                dest.display().to_string(),
            ]
        );
        assert_eq!(git.args(1), ["checkout", "--end-of-options", "--orphan=x"]);
    }

    #[test]
    fn missing_git_is_a_spawn_error() {
        struct NoGit;
        impl ProcessRunner for NoGit {
            fn run(&self, _: &Invocation) -> std::io::Result<ExitStatus> {
                Err(std::io::Error::from(std::io::ErrorKind::NotFound))
            }
        }
        let result = clone(&NoGit, "u", "dest", "master", &DownloadConfiguration::default());
        assert!(matches!(result, Err(Error::Spawn { program, .. }) if program == "git"));
    }
}
