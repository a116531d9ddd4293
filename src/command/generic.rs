//! A command sent to the device and the state of its response.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tokio::sync::Notify;

use crate::{Error, protocol::ascii};

/// Progress of a command through the processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandState {
    /// Built but never sent.
    Idle,
    /// Sent and waiting for a response.
    Pending,
    /// A matching response arrived.
    Completed(String),
    /// The device answered with a synchronous error.
    Failed(Error),
    /// No response arrived in time.
    TimedOut,
    /// A response to a later command arrived first.
    Stale,
}

#[derive(Debug)]
struct Progress {
    state: CommandState,
    sent_at: Option<Instant>,
    responded_at: Option<Instant>,
}

/// A device command and its response slot.
///
/// Shared as `Arc<GenericCommand>` between the caller and the command
/// processor. The processor settles the state when a response arrives; the
/// caller may poll [`GenericCommand::state`] or await
/// [`GenericCommand::wait_for_response`].
#[derive(Debug)]
pub struct GenericCommand {
    command: String,
    num_chars_to_match: usize,
    progress: Mutex<Progress>,
    settled: Notify,
}

impl GenericCommand {
    /// Create a command from its text without the `$VN` prefix, matching
    /// responses on their first `num_chars_to_match` characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use vnframe::command::{CommandState, GenericCommand};
    ///
    /// let command = GenericCommand::new("RRG,05", 6);
    /// assert_eq!(command.command(), "RRG,05");
    /// assert_eq!(command.state(), CommandState::Idle);
    /// ```
    #[must_use]
    pub fn new(command: impl Into<String>, num_chars_to_match: usize) -> Self {
        Self {
            command: command.into(),
            num_chars_to_match,
            progress: Mutex::new(Progress {
                state: CommandState::Idle,
                sent_at: None,
                responded_at: None,
            }),
            settled: Notify::new(),
        }
    }

    /// Command text without the `$VN` prefix.
    #[must_use]
    pub fn command(&self) -> &str { &self.command }

    /// Number of leading characters compared against responses.
    #[must_use]
    pub const fn num_chars_to_match(&self) -> usize { self.num_chars_to_match }

    /// Command framed for the wire.
    #[must_use]
    pub fn frame(&self) -> String { ascii::frame_with_crc(&format!("VN{}", self.command)) }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CommandState { self.lock().state.clone() }

    /// Whether the command is still queued for a response.
    #[must_use]
    pub fn is_awaiting_response(&self) -> bool { self.lock().state == CommandState::Pending }

    /// Whether a matching, non-error response arrived.
    #[must_use]
    pub fn has_valid_response(&self) -> bool {
        matches!(self.lock().state, CommandState::Completed(_))
    }

    /// Matching response sentence, without the line terminator.
    #[must_use]
    pub fn response(&self) -> Option<String> {
        match &self.lock().state {
            CommandState::Completed(response) => Some(response.clone()),
            _ => None,
        }
    }

    /// Values following the echoed command in the response.
    ///
    /// For `RRG,05` answered by `$VNRRG,05,115200*XX` this is `["115200"]`.
    #[must_use]
    pub fn response_values(&self) -> Option<Vec<String>> {
        let response = self.response()?;
        let echoed = self.command.split(',').count();
        Some(
            ascii::fields(response.as_bytes())
                .into_iter()
                .skip(echoed.saturating_sub(1))
                .collect(),
        )
    }

    /// Device error carried by the response, if any.
    #[must_use]
    pub fn error(&self) -> Option<Error> {
        match self.lock().state {
            CommandState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// When the command was last sent.
    #[must_use]
    pub fn sent_at(&self) -> Option<Instant> { self.lock().sent_at }

    /// When the response was matched.
    #[must_use]
    pub fn responded_at(&self) -> Option<Instant> { self.lock().responded_at }

    /// Whether `body`, a response sentence without `$`, answers this command.
    #[must_use]
    pub fn matches(&self, body: &str) -> bool {
        let Some(echo) = body.strip_prefix("VN") else {
            return false;
        };
        let wanted = self.command.as_bytes();
        let n = self.num_chars_to_match.min(wanted.len());
        echo.as_bytes().get(..n) == Some(&wanted[..n])
    }

    /// Wait up to `timeout` for the command to leave the pending state.
    ///
    /// Returns the state at the end of the wait.
    pub async fn wait_for_response(&self, timeout: Duration) -> CommandState {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let settled = self.settled.notified();
            let state = self.state();
            if state != CommandState::Pending {
                return state;
            }
            if tokio::time::timeout_at(deadline, settled).await.is_err() {
                return self.state();
            }
        }
    }

    pub(crate) fn prepare_to_send(&self) {
        let mut progress = self.lock();
        progress.state = CommandState::Pending;
        progress.sent_at = Some(Instant::now());
        progress.responded_at = None;
    }

    pub(crate) fn settle(&self, state: CommandState) {
        {
            let mut progress = self.lock();
            if progress.state != CommandState::Pending {
                return;
            }
            if matches!(state, CommandState::Completed(_) | CommandState::Failed(_)) {
                progress.responded_at = Some(Instant::now());
            }
            progress.state = state;
        }
        self.settled.notify_waiters();
    }
}
