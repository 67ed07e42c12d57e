use std::sync::Weak;

use tokio::select;
use tokio::sync::{mpsc, watch};

use crate::mailbox::Mailbox;
use crate::{Actor, Message};

#[derive(Debug)]
enum StopReason {
    Killed,
    AllHandlesDropped,
}

pub async fn run_actor<S: Send + Sync + 'static>(
    mailbox: Weak<Mailbox<S>>,
    mut state: S,
    mut msg_rx: mpsc::UnboundedReceiver<Box<dyn Message<S>>>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    let reason = loop {
        let msg = select! {
            biased;

            _ = kill_rx.changed() => {
                break StopReason::Killed;
            }
            msg = msg_rx.recv() => {
                let Some(msg) = msg else {
                    break StopReason::AllHandlesDropped;
                };
                msg
            }
        };
        trace!("received message: {msg:?}");

        let Some(mailbox) = mailbox.upgrade() else {
            warn!("last handle has been dropped, discard the message");
            break StopReason::AllHandlesDropped;
        };
        trace_span!("proc msg").in_scope(|| {
            msg.handle(&mut state, &Actor::from_mailbox(mailbox));
        });
    };

    // Refuse further messages before the state goes away.
    msg_rx.close();
    debug!(?reason, "will terminate");
    drop(state);
}
