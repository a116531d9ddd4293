//! A scripted device on the far end of an in-memory transport.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex},
    sync::mpsc,
    task::JoinHandle,
};

const DEFAULT_CAPACITY: usize = 4096;

/// Device half of a duplex transport driven by a reply script.
///
/// Every line the host writes is recorded and passed, with its zero-based
/// position, to the script; the byte strings it returns are written back in
/// order. Bytes can also be pushed unprompted with [`ScriptedDevice::send`].
#[derive(Debug)]
pub struct ScriptedDevice {
    received: Arc<Mutex<Vec<String>>>,
    unsolicited: mpsc::UnboundedSender<Vec<u8>>,
    task: JoinHandle<()>,
}

/// Create a transport for the sensor and the device answering on it.
///
/// ```rust
/// use vnframe_testing::{response_to, scripted_device};
///
/// # async fn demo() {
/// let (transport, device) = scripted_device(|_, line| vec![response_to(line, &[])]);
/// # drop((transport, device));
/// # }
/// ```
pub fn scripted_device<F>(script: F) -> (DuplexStream, ScriptedDevice)
where
    F: FnMut(usize, &str) -> Vec<Vec<u8>> + Send + 'static,
{
    let (host, device) = duplex(DEFAULT_CAPACITY);
    let received = Arc::new(Mutex::new(Vec::new()));
    let (unsolicited, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(device, script, Arc::clone(&received), rx));
    (
        host,
        ScriptedDevice {
            received,
            unsolicited,
            task,
        },
    )
}

async fn run<F>(
    stream: DuplexStream,
    mut script: F,
    received: Arc<Mutex<Vec<String>>>,
    mut unsolicited: mpsc::UnboundedReceiver<Vec<u8>>,
) where
    F: FnMut(usize, &str) -> Vec<Vec<u8>> + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();
    loop {
        let replies = tokio::select! {
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { return };
                let index = {
                    let mut received = received.lock().unwrap_or_else(PoisonError::into_inner);
                    received.push(line.clone());
                    received.len() - 1
                };
                script(index, &format!("{line}\r\n"))
            }
            Some(bytes) = unsolicited.recv() => vec![bytes],
        };
        for reply in replies {
            if writer.write_all(&reply).await.is_err() {
                return;
            }
        }
    }
}

impl ScriptedDevice {
    /// Lines received so far, without line terminators.
    #[must_use]
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of lines received so far.
    #[must_use]
    pub fn received_count(&self) -> usize {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Write `bytes` to the host unprompted.
    ///
    /// # Panics
    ///
    /// Panics if the device task has stopped.
    pub fn send(&self, bytes: impl Into<Vec<u8>>) {
        self.unsolicited
            .send(bytes.into())
            .expect("scripted device stopped");
    }

    /// Stop the device, closing its end of the transport.
    pub async fn close(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}
