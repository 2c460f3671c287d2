// Scriptable stand-in for the git binary, shared by the engine unit tests.
//
// `remote` subcommands are backed by an in-memory remote table; every other
// command answers from prefix rules (one-shot rules first) and defaults to an
// empty success.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use super::worker::{CommandExecutor, CommandResult};

pub(crate) fn ok(stdout: &str) -> CommandResult {
    CommandResult { success: true, code: Some(0), stdout: stdout.to_string(), stderr: String::new() }
}

pub(crate) fn fail(stderr: &str) -> CommandResult {
    CommandResult { success: false, code: Some(1), stdout: String::new(), stderr: stderr.to_string() }
}

/// Temp directory that already looks like a git repository.
pub(crate) fn repo_dir() -> TempDir {
    let dir = TempDir::new().expect("tempdir should be created");
    std::fs::create_dir(dir.path().join(".git")).expect(".git should be created");
    dir
}

struct Rule {
    prefix: Vec<String>,
    responses: VecDeque<CommandResult>,
    sticky: bool,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Vec<String>>,
    remotes: BTreeMap<String, String>,
    fail_remote_mutations: bool,
    rules: Vec<Rule>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeGit {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_remote(self, name: &str, url: &str) -> Self {
        self.lock().remotes.insert(name.to_string(), url.to_string());
        self
    }

    /// Answer every command starting with `prefix` with `result`.
    pub(crate) fn on(&self, prefix: &[&str], result: CommandResult) -> &Self {
        self.push_rule(prefix, VecDeque::from([result]), true);
        self
    }

    /// Answer the next matching commands with `results`, in order, then fall through.
    pub(crate) fn once(&self, prefix: &[&str], results: Vec<CommandResult>) -> &Self {
        self.push_rule(prefix, VecDeque::from(results), false);
        self
    }

    pub(crate) fn fail_remote_mutations(&self) {
        self.lock().fail_remote_mutations = true;
    }

    pub(crate) fn remotes(&self) -> BTreeMap<String, String> {
        self.lock().remotes.clone()
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.lock().calls.clone()
    }

    pub(crate) fn calls_matching(&self, prefix: &[&str]) -> Vec<Vec<String>> {
        self.calls().into_iter().filter(|call| starts_with(call, prefix)).collect()
    }

    pub(crate) fn was_called(&self, prefix: &[&str]) -> bool {
        !self.calls_matching(prefix).is_empty()
    }

    fn push_rule(&self, prefix: &[&str], responses: VecDeque<CommandResult>, sticky: bool) {
        let rule = Rule { prefix: prefix.iter().map(|s| s.to_string()).collect(), responses, sticky };
        let mut state = self.lock();
        // One-shot rules take precedence over sticky ones.
        if sticky {
            state.rules.push(rule);
        } else {
            state.rules.insert(0, rule);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake git lock poisoned")
    }
}

fn starts_with(call: &[String], prefix: &[&str]) -> bool {
    call.len() >= prefix.len() && call.iter().zip(prefix).all(|(arg, want)| arg == want)
}

impl CommandExecutor for FakeGit {
    fn execute(
        &self,
        _program: &str,
        args: &[String],
        _cwd: &Path,
    ) -> Result<CommandResult, std::io::Error> {
        let mut state = self.lock();
        state.calls.push(args.to_vec());

        let args_ref: Vec<&str> = args.iter().map(String::as_str).collect();
        match args_ref.as_slice() {
            ["remote"] => {
                let listing: String =
                    state.remotes.keys().map(|name| format!("{name}\n")).collect();
                return Ok(ok(&listing));
            }
            ["remote", "get-url", name] => {
                return Ok(match state.remotes.get(*name) {
                    Some(url) => ok(&format!("{url}\n")),
                    None => fail(&format!("error: No such remote '{name}'\n")),
                });
            }
            ["remote", "add", name, url] => {
                if state.fail_remote_mutations {
                    return Ok(fail("error: could not lock config file .git/config\n"));
                }
                if state.remotes.contains_key(*name) {
                    return Ok(fail(&format!("error: remote {name} already exists.\n")));
                }
                state.remotes.insert(name.to_string(), url.to_string());
                return Ok(ok(""));
            }
            ["remote", "remove", name] => {
                if state.fail_remote_mutations {
                    return Ok(fail("error: could not lock config file .git/config\n"));
                }
                return Ok(match state.remotes.remove(*name) {
                    Some(_) => ok(""),
                    None => fail(&format!("error: No such remote: '{name}'\n")),
                });
            }
            _ => {}
        }

        let mut matched = None;
        for (index, rule) in state.rules.iter().enumerate() {
            let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
            if starts_with(args, &prefix) && !rule.responses.is_empty() {
                matched = Some(index);
                break;
            }
        }

        let Some(index) = matched else {
            return Ok(ok(""));
        };

        let rule = &mut state.rules[index];
        let response = if rule.sticky {
            rule.responses.front().cloned().expect("sticky rule has a response")
        } else {
            rule.responses.pop_front().expect("one-shot rule has a response")
        };
        Ok(response)
    }
}
