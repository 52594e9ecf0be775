//! In-memory git backend for unit tests.
#![allow(clippy::unwrap_used, clippy::panic)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::GitCommandError;
use crate::fetch::{Zone, diff_args, listing_args};
use crate::git::GitBackend;

#[derive(Clone)]
enum Reply {
    Lines(Vec<String>),
    Fail(String),
    Panic,
}

/// Canned git output keyed by the exact argument list
#[derive(Default)]
pub(crate) struct FakeGit {
    replies: Mutex<HashMap<String, Reply>>,
    missing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

fn key(args: &[&str]) -> String {
    args.join(" ")
}

impl FakeGit {
    pub(crate) fn set_listing(&self, zone: Zone, files: &[&str]) {
        let lines = files.iter().map(|f| f.to_string()).collect();
        self.replies
            .lock()
            .unwrap()
            .insert(key(&listing_args(zone)), Reply::Lines(lines));
    }

    /// Register a file's diff; the four preamble lines are added here
    pub(crate) fn set_diff(&self, zone: Zone, file: &str, body: &[&str]) {
        let mut lines = vec![
            format!("diff --git a/{file} b/{file}"),
            "index 1111111..2222222 100644".to_string(),
            format!("--- a/{file}"),
            format!("+++ b/{file}"),
        ];
        lines.extend(body.iter().map(|l| l.to_string()));
        self.replies
            .lock()
            .unwrap()
            .insert(key(&diff_args(zone, file)), Reply::Lines(lines));
    }

    pub(crate) fn set_failure(&self, args: &[&str], stderr: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(key(args), Reply::Fail(stderr.to_string()));
    }

    pub(crate) fn set_panic(&self, args: &[&str]) {
        self.replies.lock().unwrap().insert(key(args), Reply::Panic);
    }

    pub(crate) fn set_missing(&self, file: &str) {
        self.missing.lock().unwrap().insert(file.to_string());
    }

    pub(crate) fn was_called(&self, args: &[&str]) -> bool {
        self.calls.lock().unwrap().contains(&key(args))
    }
}

impl GitBackend for FakeGit {
    fn git(&self, args: &[&str]) -> Result<Vec<String>, GitCommandError> {
        let key = key(args);
        self.calls.lock().unwrap().push(key.clone());

        // Clone out so the lock is released before a canned panic
        let reply = self.replies.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::Lines(lines)) => Ok(lines),
            Some(Reply::Fail(stderr)) => Err(GitCommandError::ExitError { args: key, stderr }),
            Some(Reply::Panic) => panic!("fake git asked to panic for {key}"),
            None => Err(GitCommandError::ExitError {
                args: key,
                stderr: "no canned reply".to_string(),
            }),
        }
    }

    fn file_exists(&self, path: &str) -> bool {
        !self.missing.lock().unwrap().contains(path)
    }
}
