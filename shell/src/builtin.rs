use crate::command::{CommandFactory, ExecutableCommand};
use crate::interpreter::Factory;
use crate::parser::CommandLine;
use crate::state::ShellState;
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::path::PathBuf;

/// Ends argh option parsing; everything after it is positional.
const END_OF_OPTIONS: &str = "--";

/// Argument that `cd` treats as "go home".
const HOME_SHORTHAND: &str = "~";

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in the interpreter process. They are never backgrounded and
/// never see redirection; a trailing `&` has already been dropped and any
/// `<`/`>` tokens arrive as plain arguments. Arguments are handed over
/// after an end-of-options marker, so words like `-1` or `help` reach the
/// builtin verbatim.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "status" or "cd".
    fn name() -> &'static str;

    fn execute(self, stdout: &mut dyn Write, state: &mut ShellState) -> Result<()>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, state: &mut ShellState) -> Result<()> {
        if let Err(e) = T::execute(*self, stdout, state) {
            log::debug!("{} failed: {e:#}", T::name());
            eprintln!("{e:#}");
        }
        Ok(())
    }
}

struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _state: &mut ShellState) -> Result<()> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(())
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, line: &CommandLine) -> Option<Box<dyn ExecutableCommand>> {
        if line.name() != T::name() {
            return None;
        }
        let args: Vec<&str> = std::iter::once(END_OF_OPTIONS)
            .chain(line.args().iter().map(String::as_str))
            .collect();
        Some(match T::from_args(&[T::name()], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, .. }) => Box::new(InvalidArgs { output }),
        })
    }
}

fn too_many_arguments(stdout: &mut dyn Write, name: &str) -> Result<()> {
    writeln!(stdout, "{name}: too many arguments")?;
    Ok(())
}

#[derive(FromArgs)]
/// Change the current working directory.
/// Without a target, or with `~`, changes to the directory named by HOME.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to, taken verbatim. At most one is accepted.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, stdout: &mut dyn Write, state: &mut ShellState) -> Result<()> {
        let target = match self.args.as_slice() {
            [] => None,
            [dir] if dir == HOME_SHORTHAND => None,
            [dir] => Some(PathBuf::from(dir)),
            _ => return too_many_arguments(stdout, Self::name()),
        };
        let target = match target {
            Some(dir) => dir,
            None => state
                .env
                .home()
                .ok_or_else(|| anyhow!("cd: HOME not set"))?,
        };
        state
            .env
            .change_dir(&target)
            .map_err(|e| anyhow!("cd: {e:#}"))?;
        log::debug!("cwd is now {}", state.env.current_dir.display());
        Ok(())
    }
}

#[derive(FromArgs)]
/// Print how the last foreground command finished.
pub struct Status {
    #[argh(positional, greedy)]
    /// ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Status {
    fn name() -> &'static str {
        "status"
    }

    fn execute(self, stdout: &mut dyn Write, state: &mut ShellState) -> Result<()> {
        writeln!(stdout, "{}", state.last_status)?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Terminate every running background job, then leave the shell with status 0.
pub struct Exit {
    #[argh(positional, greedy)]
    /// optional exit code; accepted but not used.
    pub args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, stdout: &mut dyn Write, state: &mut ShellState) -> Result<()> {
        if self.args.len() > 1 {
            return too_many_arguments(stdout, Self::name());
        }
        shutdown(stdout, state)
    }
}

/// Kill and collect every unfinished background job, then ask the loop to
/// stop.
pub(crate) fn shutdown(stdout: &mut dyn Write, state: &mut ShellState) -> Result<()> {
    for (pid, status) in state.jobs.terminate_all() {
        writeln!(stdout, "background pid {pid} is done: {status}")?;
    }
    stdout.flush()?;
    state.request_exit(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ExitStatus;
    use crate::config::Config;
    use crate::env::Environment;
    use nix::unistd::Pid;
    use std::collections::HashMap;
    use std::env as stdenv;
    use std::fs;
    use std::io;
    use std::process::Command;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn state() -> ShellState {
        let env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        };
        ShellState::new(env, Config::default())
    }

    fn cd(args: &[&str]) -> Cd {
        Cd {
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn make_unique_temp_dir() -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("smallsh_test_cd_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    #[test]
    fn test_status_reports_last_foreground() {
        let mut state = state();
        let mut out = Vec::new();
        Status { args: Vec::new() }.execute(&mut out, &mut state).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "exit value 0\n");

        state.last_status = ExitStatus::Signaled(2);
        let mut out = Vec::new();
        Status { args: Vec::new() }.execute(&mut out, &mut state).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "terminated by signal 2\n");
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut state = state();
        let target = canonical_temp.to_string_lossy().to_string();
        let res = cd(&[&target]).execute(&mut Vec::new(), &mut state);
        assert!(res.is_ok());

        let new_canonical = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        assert_eq!(new_canonical, canonical_temp);
        assert_eq!(state.env.current_dir, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_without_args_and_tilde_go_home() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        for args in [&[][..], &["~"][..]] {
            stdenv::set_current_dir(&orig).unwrap();
            let mut state = state();
            state
                .env
                .set_var("HOME", canonical_temp.to_string_lossy().to_string());

            let res = cd(args).execute(&mut Vec::new(), &mut state);
            assert!(res.is_ok());

            let new_canonical = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
            assert_eq!(new_canonical, canonical_temp);
        }

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_too_many_arguments_changes_nothing() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut state = state();
        let mut out = Vec::new();
        let res = cd(&["/", "/tmp"]).execute(&mut out, &mut state);

        assert!(res.is_ok());
        assert_eq!(String::from_utf8(out).unwrap(), "cd: too many arguments\n");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut state = state();
        let name = format!("nonexistent_dir_for_smallsh_test_{}", std::process::id());
        let res = cd(&[&name]).execute(&mut Vec::new(), &mut state);

        let err = res.unwrap_err();
        assert!(format!("{err:#}").starts_with(&format!("cd: {name}")));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_exit_with_too_many_arguments_stays() {
        let mut state = state();
        let mut out = Vec::new();
        let exit = Exit {
            args: vec!["1".into(), "2".into()],
        };
        exit.execute(&mut out, &mut state).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "exit: too many arguments\n");
        assert!(!state.should_exit());
    }

    #[test]
    fn test_exit_code_argument_is_ignored() {
        let mut state = state();
        let exit = Exit {
            args: vec!["7".into()],
        };
        exit.execute(&mut Vec::new(), &mut state).unwrap();

        assert!(state.should_exit());
        assert_eq!(state.exit_code(), 0);
    }

    #[test]
    fn test_exit_terminates_background_jobs() {
        let mut state = state();
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = Pid::from_raw(child.id() as i32);
        state.jobs.track(pid).unwrap();

        let mut out = Vec::new();
        Exit { args: Vec::new() }.execute(&mut out, &mut state).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("background pid {pid} is done: terminated by signal 15\n")
        );
        assert!(state.jobs.jobs().iter().all(|job| job.done));
        assert!(state.should_exit());
    }

    #[test]
    fn test_factory_matches_by_exact_name() {
        let factory = Factory::<Status>::default();
        let line = |argv: &[&str]| CommandLine {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            background: false,
        };
        assert!(factory.try_create(&line(&["status"])).is_some());
        assert!(factory.try_create(&line(&["statuses"])).is_none());
        assert!(factory.try_create(&line(&["Status"])).is_none());
    }

    fn dispatch<T: BuiltinCommand + 'static>(argv: &[&str], state: &mut ShellState) -> String {
        let line = CommandLine {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            background: false,
        };
        let cmd = Factory::<T>::default().try_create(&line).unwrap();
        let mut out = Vec::new();
        cmd.execute(&mut out, state).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_exit_takes_option_like_words_verbatim() {
        for word in ["-1", "--help", "help"] {
            let mut state = state();
            let out = dispatch::<Exit>(&["exit", word], &mut state);
            assert_eq!(out, "", "exit {word}");
            assert!(state.should_exit(), "exit {word}");
            assert_eq!(state.exit_code(), 0);
        }
    }

    #[test]
    fn test_status_ignores_arguments() {
        let mut state = state();
        assert_eq!(
            dispatch::<Status>(&["status", "x", "-v"], &mut state),
            "exit value 0\n"
        );
    }

    #[test]
    fn test_cd_takes_option_like_words_verbatim() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        for name in ["-d", "help", "--help"] {
            fs::create_dir(canonical_temp.join(name)).unwrap();
            stdenv::set_current_dir(&canonical_temp).unwrap();

            let mut state = state();
            let out = dispatch::<Cd>(&["cd", name], &mut state);

            assert_eq!(out, "", "cd {name}");
            assert_eq!(stdenv::current_dir().unwrap(), canonical_temp.join(name));
        }

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }
}
