//! Task reading the transport and driving the router.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::LiveState;
use crate::{
    Error,
    async_error::{AsyncError, AsyncErrorQueue},
    command::CommandProcessor,
};

pub(super) struct Listener<R> {
    pub(super) reader: R,
    pub(super) live: Arc<std::sync::Mutex<LiveState>>,
    pub(super) async_errors: Arc<AsyncErrorQueue>,
    pub(super) commands: Arc<CommandProcessor>,
    pub(super) shutdown: CancellationToken,
    pub(super) read_chunk: usize,
}

impl<R> Listener<R>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub(super) async fn run(mut self) {
        let mut chunk = vec![0; self.read_chunk];
        loop {
            let read = tokio::select! {
                () = self.shutdown.cancelled() => {
                    debug!("listener stopped");
                    return;
                }
                read = self.reader.read(&mut chunk) => read,
            };
            let count = match read {
                Ok(0) => {
                    info!("transport closed");
                    self.fail(Error::SerialPortClosed, "transport reached end of stream");
                    return;
                }
                Ok(count) => count,
                Err(err) => {
                    error!(error = %err, "transport read failed");
                    self.fail(Error::SerialReadFailed, &err.to_string());
                    return;
                }
            };

            let bytes = chunk[..count].to_vec();
            let live = Arc::clone(&self.live);
            let processed = tokio::task::spawn_blocking(move || {
                super::lock(&live).load_and_process(&bytes)
            })
            .await;
            match processed {
                Ok(Ok(())) => {}
                Ok(Err(error)) => self
                    .async_errors
                    .push(AsyncError::new(error, "live buffer overflow")),
                Err(join_error) => {
                    error!(error = %join_error, "packet processing task failed");
                    self.fail(Error::UnexpectedSerialError, &join_error.to_string());
                    return;
                }
            }
        }
    }

    fn fail(&self, error: Error, message: &str) {
        self.shutdown.cancel();
        self.async_errors.push(AsyncError::new(error, message));
        self.commands.fail_all(Error::SerialPortClosed);
    }
}
