//! Operator console
//!
//! Pumps lines typed on the server operator's terminal into the
//! broadcast queue as chat lines under the operator's name. Operator
//! messages carry no sender id, so every connected client receives
//! them.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::broadcast::OutboundQueue;
use crate::message::OutboundMessage;

/// Broadcast operator input from stdin until it reaches end of file
/// or the queue closes.
pub async fn run(queue: OutboundQueue, operator_name: String) {
    let stdin = BufReader::new(tokio::io::stdin());
    run_with_reader(stdin, queue, &operator_name).await;
}

/// Reader-generic pump, split out so tests can feed it a byte slice.
pub async fn run_with_reader<R>(reader: R, queue: OutboundQueue, operator_name: &str)
where
    R: AsyncBufRead + Unpin,
{
    info!(operator = %operator_name, "operator console ready");

    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                let sent = queue
                    .send(OutboundMessage::operator(operator_name, text))
                    .await;
                if sent.is_err() {
                    debug!("broadcast queue closed, stopping console");
                    break;
                }
            }
            Ok(None) => {
                debug!("operator console input closed");
                break;
            }
            Err(err) => {
                warn!(error = %err, "operator console read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use crate::broadcast::outbound_queue;

    use super::*;

    #[tokio::test]
    async fn test_operator_lines_enter_the_queue() {
        let (queue, mut inbox) = outbound_queue(None);
        let input: &[u8] = b"hello everyone\n\n   \nsecond line\n";

        run_with_reader(input, queue, "Pip").await;

        let first = inbox.recv().await.unwrap();
        assert_eq!(first.text, "Pip: hello everyone");
        assert_eq!(first.sender, None);

        let second = inbox.recv().await.unwrap();
        assert_eq!(second.text, "Pip: second line");

        // Blank lines never made it in, and the producer is gone.
        assert!(inbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_console_stops_when_queue_closes() {
        let (queue, inbox) = outbound_queue(None);
        drop(inbox);

        timeout(
            Duration::from_secs(1),
            run_with_reader(&b"one\ntwo\n"[..], queue, "Pip"),
        )
        .await
        .expect("console should stop once the queue is gone");
    }
}
