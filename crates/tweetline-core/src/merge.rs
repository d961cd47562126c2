//! Fan-in of worker channels into one stream

use futures_util::future::join_all;
use tokio::sync::mpsc;

use crate::CHANNEL_CAPACITY;

/// Merge `inputs` into a single receiver.
///
/// One relay task per input forwards items; a join task holds the last sender
/// and drops it once every relay has finished, so the output closes exactly
/// once, after all inputs have closed. Order is kept per input only.
pub fn merge<T: Send + 'static>(inputs: Vec<mpsc::Receiver<T>>) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    let relays: Vec<_> = inputs
        .into_iter()
        .enumerate()
        .map(|(idx, mut input)| {
            let tx = tx.clone();
            log::debug!("merge: starting relay {idx}");
            tokio::spawn(async move {
                while let Some(item) = input.recv().await {
                    if tx.send(item).await.is_err() {
                        // Consumer gone: drop `input` so the producer sees it
                        log::debug!("merge: relay {idx} lost its consumer");
                        break;
                    }
                }
            })
        })
        .collect();

    tokio::spawn(async move {
        log::debug!("merge: waiting for {} relays", relays.len());
        for result in join_all(relays).await {
            if let Err(e) = result {
                log::error!("merge: relay task failed: {e}");
            }
        }
        log::debug!("merge: all relays done, closing merged stream");
        drop(tx);
    });

    rx
}
