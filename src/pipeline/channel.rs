use tokio::sync::mpsc;

pub type Sender<T> = mpsc::UnboundedSender<T>;
pub type Receiver<T> = mpsc::UnboundedReceiver<T>;

/// Create an unbounded channel.
///
/// Queue depth is limited, when at all, by the control loop before it
/// submits (see [`super::backpressure`]), never by a blocking send.
pub fn create_channel<T>() -> (Sender<T>, Receiver<T>) {
    mpsc::unbounded_channel()
}
