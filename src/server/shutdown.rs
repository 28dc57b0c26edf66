use tokio::sync::oneshot;

/// Creates the handle/signal pair that ties an accept loop's lifetime to its
/// owner. Dropping the handle (or sending on it) stops the loop; there is no
/// graceful drain of in-flight connection handlers.
pub(crate) fn shutdown_pair() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (ShutdownHandle { _tx: tx }, ShutdownSignal { rx })
}

pub(crate) struct ShutdownHandle {
    _tx: oneshot::Sender<()>,
}

pub(crate) struct ShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl ShutdownSignal {
    /// Resolves when the handle is dropped or fired; either means stop.
    pub(crate) async fn fired(self) {
        let _ = self.rx.await;
    }
}
