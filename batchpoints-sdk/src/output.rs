//! Output backends that receive flushed batches.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use batchpoints_types::Batch;

/// How long a TCP output waits to connect and send before giving up.
pub const TCP_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Function called with every flushed batch.
pub type PublishFn = dyn Fn(Batch) + Send + Sync;

/// Output destination for batches.
///
/// Configure where the batcher hands each flushed batch.
pub enum Output {
    /// Write each batch to a JSON file.
    ///
    /// The file is overwritten with each batch.
    File(PathBuf),

    /// Send batches to a TCP server.
    ///
    /// Each batch is sent as a newline-delimited JSON message.
    Tcp(String),

    /// Send batches through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    #[cfg(feature = "tokio")]
    Channel(tokio::sync::mpsc::Sender<Batch>),

    /// Hand each batch to a host function.
    Callback(Arc<PublishFn>),
}

impl Output {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use batchpoints_sdk::Output;
    ///
    /// let output = Output::file("batch.json");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a TCP output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use batchpoints_sdk::Output;
    ///
    /// let output = Output::tcp("localhost:9090");
    /// ```
    pub fn tcp(addr: impl Into<String>) -> Self {
        Output::Tcp(addr.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use batchpoints_sdk::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive batches
    /// // while let Some(batch) = rx.recv().await {
    /// //     println!("Got batch with {} captures", batch.len());
    /// // }
    /// ```
    #[cfg(feature = "tokio")]
    pub fn channel(buffer: usize) -> (Self, tokio::sync::mpsc::Receiver<Batch>) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Create an output that calls `f` with every batch.
    ///
    /// # Example
    ///
    /// ```rust
    /// use batchpoints_sdk::Output;
    ///
    /// let output = Output::callback(|batch| println!("{} metrics", batch.metric_count()));
    /// ```
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Batch) + Send + Sync + 'static,
    {
        Output::Callback(Arc::new(f))
    }

    /// Short description used in log messages.
    pub fn describe(&self) -> String {
        match self {
            Output::File(path) => format!("file: {}", path.display()),
            Output::Tcp(addr) => format!("tcp: {}", addr),
            #[cfg(feature = "tokio")]
            Output::Channel(_) => "channel".to_string(),
            Output::Callback(_) => "callback".to_string(),
        }
    }

    /// Emit a batch to this output.
    #[cfg(feature = "tokio")]
    pub(crate) async fn emit(&self, batch: &Batch) -> std::io::Result<()> {
        match self {
            Output::File(path) => {
                let json = serde_json::to_string_pretty(batch)?;
                tokio::fs::write(path, json).await?;
            }
            Output::Tcp(addr) => {
                use tokio::io::AsyncWriteExt;
                use tokio::net::TcpStream;

                let mut json = serde_json::to_vec(batch)?;
                json.push(b'\n');

                let send = async {
                    let mut stream = TcpStream::connect(addr).await?;
                    stream.write_all(&json).await
                };
                tokio::time::timeout(TCP_SEND_TIMEOUT, send)
                    .await
                    .map_err(|_| {
                        std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            format!("no response from {} within {:?}", addr, TCP_SEND_TIMEOUT),
                        )
                    })??;
            }
            Output::Channel(tx) => {
                // don't block the schedule if the consumer lags
                tx.try_send(batch.clone())
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            }
            Output::Callback(f) => f(batch.clone()),
        }
        Ok(())
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Output").field(&self.describe()).finish()
    }
}

#[cfg(all(test, feature = "tokio"))]
mod tests {
    use super::*;
    use batchpoints_types::MetricKey;
    use parking_lot::Mutex;
    use tokio::io::AsyncBufReadExt;

    fn sample() -> Batch {
        let mut batch = Batch::new();
        batch.timestamps.push(1607203251539);
        batch.series.insert(
            MetricKey::new("environment.wind.speedApparent", "test-source"),
            vec![0.0],
        );
        batch
    }

    #[tokio::test]
    async fn file_output_overwrites_with_latest_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        let output = Output::file(&path);

        output.emit(&sample()).await.unwrap();
        output.emit(&Batch::new()).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({ "header": [], "data": {} }));
    }

    #[tokio::test]
    async fn channel_output_hands_off_batch() {
        let (output, mut rx) = Output::channel(4);
        output.emit(&sample()).await.unwrap();

        assert_eq!(rx.recv().await, Some(sample()));
    }

    #[tokio::test]
    async fn full_channel_reports_error() {
        let (output, _rx) = Output::channel(1);
        output.emit(&sample()).await.unwrap();
        assert!(output.emit(&sample()).await.is_err());
    }

    #[tokio::test]
    async fn callback_output_receives_batch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let output = Output::callback(move |batch| sink.lock().push(batch));

        output.emit(&sample()).await.unwrap();
        assert_eq!(*seen.lock(), vec![sample()]);
    }

    #[tokio::test]
    async fn tcp_output_sends_one_json_line() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = tokio::io::BufReader::new(socket).lines();
            lines.next_line().await.unwrap()
        });

        Output::tcp(addr).emit(&sample()).await.unwrap();

        let line = server.await.unwrap().unwrap();
        let parsed: Batch = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, sample());
    }

    #[tokio::test]
    async fn tcp_output_reports_connection_failure() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(Output::tcp(addr).emit(&sample()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn tcp_output_gives_up_on_unreachable_peer() {
        // a non-routable address either fails fast or hangs until the timeout
        let started = tokio::time::Instant::now();
        let result = Output::tcp("10.255.255.1:9").emit(&sample()).await;

        assert!(result.is_err());
        assert!(started.elapsed() <= TCP_SEND_TIMEOUT);
    }

    #[test]
    fn describe_names_destination() {
        assert_eq!(Output::file("/tmp/b.json").describe(), "file: /tmp/b.json");
        assert_eq!(Output::tcp("localhost:9090").describe(), "tcp: localhost:9090");
        assert_eq!(Output::callback(|_| {}).describe(), "callback");
    }
}
