// Playback through an external MIDI player.
//
// The converter does no synthesis of its own. `CommandPlayer` hands the
// written file to a host program (timidity by default), then blocks the
// calling thread, polling the child at a coarse interval until it exits.
// There is no cancellation beyond killing the process. The MIDI file is only
// ever read by the child; a playback failure leaves it untouched, and the
// caller treats it as a reportable, non-fatal outcome.

use crate::error::PlaybackError;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Plays a finished MIDI file, blocking until playback ends.
pub trait Player {
    fn play(&self, path: &Path) -> Result<(), PlaybackError>;
}

#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandPlayer {
    pub fn new(program: String, args: Vec<String>, poll_interval: Duration) -> Self {
        Self {
            program,
            args,
            poll_interval,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for one run: `{file}` is substituted, or the path is
    /// appended when no argument mentions it.
    fn command_args(&self, path: &Path) -> Vec<OsString> {
        let file = path.as_os_str();
        let mut substituted = false;
        let mut args: Vec<OsString> = self
            .args
            .iter()
            .map(|arg| {
                if arg == "{file}" {
                    substituted = true;
                    file.to_os_string()
                } else if arg.contains("{file}") {
                    substituted = true;
                    OsString::from(arg.replace("{file}", &path.to_string_lossy()))
                } else {
                    OsString::from(arg)
                }
            })
            .collect();
        if !substituted {
            args.push(file.to_os_string());
        }
        args
    }
}

impl Player for CommandPlayer {
    fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        let mut child = Command::new(&self.program)
            .args(self.command_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        log::info!("playing {} with {}", path.display(), self.program);

        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(PlaybackError::Exit {
                        program: self.program.clone(),
                        status,
                    });
                }
                Ok(None) => std::thread::sleep(self.poll_interval),
                Err(source) => {
                    return Err(PlaybackError::Wait {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        }
    }
}
