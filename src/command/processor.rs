//! FIFO of commands awaiting a response and the response correlation rules.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use super::{CommandState, GenericCommand};
use crate::{
    Error,
    Result,
    async_error::{AsyncError, AsyncErrorQueue},
};

/// Correlates ASCII responses with the commands that asked for them.
#[derive(Debug)]
pub struct CommandProcessor {
    pending: Mutex<VecDeque<Arc<GenericCommand>>>,
    capacity: usize,
    async_errors: Arc<AsyncErrorQueue>,
}

/// Device error code carried by a `VNERR` sentence body.
fn vnerr_code(body: &str) -> Option<Error> {
    let code = body.split(['*', ',']).nth(1)?;
    u16::from_str_radix(code.trim(), 16)
        .ok()
        .and_then(Error::from_code)
}

impl CommandProcessor {
    /// Create a processor queueing up to `capacity` commands.
    #[must_use]
    pub fn new(capacity: usize, async_errors: Arc<AsyncErrorQueue>) -> Self {
        Self {
            pending: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            async_errors,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<GenericCommand>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `command` for a response and return the bytes to transmit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandQueueFull`] when `capacity` commands are
    /// already awaiting responses.
    pub fn register(&self, command: &Arc<GenericCommand>) -> Result<String> {
        let mut pending = self.lock();
        if pending.len() >= self.capacity {
            return Err(Error::CommandQueueFull);
        }
        command.prepare_to_send();
        pending.push_back(Arc::clone(command));
        debug!(command = command.command(), queued = pending.len(), "command registered");
        Ok(command.frame())
    }

    /// Remove `command` from the queue, returning whether it was still there.
    pub fn withdraw(&self, command: &Arc<GenericCommand>) -> bool {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|queued| !Arc::ptr_eq(queued, command));
        before != pending.len()
    }

    /// Offer a non-measurement `VN` sentence.
    ///
    /// `sentence` is the full sentence as received. A response matching a
    /// queued command completes it and marks every command queued ahead of
    /// it stale. A synchronous `VNERR` fails the oldest command; other
    /// `VNERR`s, and synchronous ones with nothing queued, go to the async
    /// error channel.
    pub fn match_response(&self, sentence: &str, header: &str) {
        let trimmed = sentence.trim_end();
        let body = trimmed.trim_start_matches('$');
        let mut pending = self.lock();

        if header == "VNERR" {
            let Some(error) = vnerr_code(body) else {
                drop(pending);
                self.async_errors
                    .push(AsyncError::new(Error::ReceivedInvalidResponse, trimmed));
                return;
            };
            if error.is_command_response()
                && let Some(front) = pending.pop_front()
            {
                debug!(command = front.command(), %error, "command failed");
                front.settle(CommandState::Failed(error));
                return;
            }
            drop(pending);
            self.async_errors.push(AsyncError::new(error, trimmed));
            return;
        }

        let Some(position) = pending.iter().position(|command| command.matches(body)) else {
            debug!(response = trimmed, "response matched no pending command");
            return;
        };
        for stale in pending.drain(..position) {
            debug!(command = stale.command(), "command went stale");
            stale.settle(CommandState::Stale);
        }
        if let Some(command) = pending.pop_front() {
            debug!(command = command.command(), "response matched");
            command.settle(CommandState::Completed(trimmed.to_owned()));
        }
    }

    /// Settle every queued command with `error`.
    pub fn fail_all(&self, error: Error) {
        for command in self.lock().drain(..) {
            command.settle(CommandState::Failed(error));
        }
    }

    /// Number of commands awaiting a response.
    #[must_use]
    pub fn len(&self) -> usize { self.lock().len() }

    /// Whether no command awaits a response.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock().is_empty() }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};

    use super::CommandProcessor;
    use crate::{
        Error,
        async_error::AsyncErrorQueue,
        command::{CommandState, GenericCommand, catalogue},
    };

    struct Harness {
        processor: CommandProcessor,
        errors: Arc<AsyncErrorQueue>,
    }

    #[fixture]
    fn harness() -> Harness {
        let errors = Arc::new(AsyncErrorQueue::new(8));
        Harness {
            processor: CommandProcessor::new(2, Arc::clone(&errors)),
            errors,
        }
    }

    #[rstest]
    fn queue_capacity_is_enforced(harness: Harness) {
        for id in [1, 2] {
            harness
                .processor
                .register(&Arc::new(catalogue::read_register(id)))
                .unwrap();
        }
        let third = Arc::new(catalogue::read_register(3));
        assert_eq!(harness.processor.register(&third), Err(Error::CommandQueueFull));
        assert_eq!(third.state(), CommandState::Idle);
    }

    #[rstest]
    fn later_response_stales_earlier_commands(harness: Harness) {
        let first = Arc::new(catalogue::read_register(1));
        let second = Arc::new(catalogue::read_register(5));
        harness.processor.register(&first).unwrap();
        harness.processor.register(&second).unwrap();

        harness
            .processor
            .match_response("$VNRRG,05,115200*5A\r\n", "VNRRG");

        assert_eq!(first.state(), CommandState::Stale);
        assert_eq!(second.response().as_deref(), Some("$VNRRG,05,115200*5A"));
        assert!(harness.processor.is_empty());
    }

    #[rstest]
    fn unmatched_response_leaves_queue(harness: Harness) {
        let command = Arc::new(catalogue::read_register(1));
        harness.processor.register(&command).unwrap();
        harness.processor.match_response("$VNWRG,06,1*5A\r\n", "VNWRG");
        assert!(command.is_awaiting_response());
        assert_eq!(harness.processor.len(), 1);
    }

    #[rstest]
    #[case::synchronous("$VNERR,08*49\r\n", Some(Error::InvalidRegister), None)]
    #[case::asynchronous("$VNERR,0A*33\r\n", None, Some(Error::WatchdogReset))]
    fn vnerr_routing(
        harness: Harness,
        #[case] sentence: &str,
        #[case] command_error: Option<Error>,
        #[case] async_error: Option<Error>,
    ) {
        let command = Arc::new(GenericCommand::new("RRG,99", 6));
        harness.processor.register(&command).unwrap();
        harness.processor.match_response(sentence, "VNERR");
        assert_eq!(command.error(), command_error);
        assert_eq!(
            harness.errors.next_async_error().map(|entry| entry.error),
            async_error
        );
    }

    #[rstest]
    fn synchronous_vnerr_without_command_is_async(harness: Harness) {
        harness.processor.match_response("$VNERR,03*xx\r\n", "VNERR");
        assert_eq!(harness.errors.throw_if_async_error(), Err(Error::InvalidChecksum));
    }

    #[rstest]
    fn withdraw_and_fail_all(harness: Harness) {
        let first = Arc::new(catalogue::reset());
        let second = Arc::new(catalogue::write_settings());
        harness.processor.register(&first).unwrap();
        harness.processor.register(&second).unwrap();
        assert!(harness.processor.withdraw(&first));
        assert!(!harness.processor.withdraw(&first));
        harness.processor.fail_all(Error::SerialPortClosed);
        assert_eq!(second.error(), Some(Error::SerialPortClosed));
    }
}
