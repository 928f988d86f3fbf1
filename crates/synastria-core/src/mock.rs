use crate::process::{LaunchCommand, ProcessLauncher};
use std::io;
use std::sync::Mutex;

/// Records launch commands instead of spawning them.
pub struct MockLauncher {
    spawned: Mutex<Vec<LaunchCommand>>,
    fail_with: Option<io::ErrorKind>,
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self {
            spawned: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A launcher whose every spawn fails with `kind`.
    pub fn failing(kind: io::ErrorKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::default()
        }
    }

    pub fn spawned(&self) -> Vec<LaunchCommand> {
        self.spawned
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl ProcessLauncher for MockLauncher {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn spawn_detached(&self, command: &LaunchCommand) -> io::Result<()> {
        if let Some(kind) = self.fail_with {
            return Err(io::Error::new(kind, "mock spawn failure"));
        }
        let mut spawned = self
            .spawned
            .lock()
            .map_err(|e| io::Error::other(format!("mutex poisoned: {e}")))?;
        spawned.push(command.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_commands_in_order() {
        let mock = MockLauncher::new();
        mock.spawn_detached(&LaunchCommand::new("/a")).unwrap();
        mock.spawn_detached(&LaunchCommand::new("/b").arg("x")).unwrap();

        let spawned = mock.spawned();
        assert_eq!(spawned.len(), 2);
        assert_eq!(spawned[0].program, std::path::PathBuf::from("/a"));
        assert_eq!(spawned[1].args.len(), 1);
    }

    #[test]
    fn failing_mock_records_nothing() {
        let mock = MockLauncher::failing(io::ErrorKind::PermissionDenied);
        let err = mock.spawn_detached(&LaunchCommand::new("/a")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(mock.spawned().is_empty());
    }
}
