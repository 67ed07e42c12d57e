use std::collections::HashMap;
use std::time::Duration;

use palaver_actor::{Actor, Message};
use palaver_transport::{
    ConnectionStatus, Endpoint, EventSink, SendError, SocketState,
    TransportEvent, TransportSession,
};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::reconnect::Reconnector;
use super::{Snapshot, Update, notice};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::transcript::{Sender, Transcript, Turn};
use crate::transport_client::TransportClient;

type UpdateFn = Box<dyn Fn(&Update) + Send + Sync>;

#[derive(Clone, Copy, Debug)]
struct Deadline {
    submission: u64,
    task_id: u64,
}

/// State of the conversation actor.
///
/// Every field is only touched from the actor's task.
pub struct ControllerState {
    transport: TransportClient,
    config: ClientConfig,
    endpoint: Endpoint,
    session: Option<Box<dyn TransportSession>>,
    /// Bumped for every session opened. Events carry the generation of
    /// the session that produced them.
    generation: u64,
    initialized: bool,
    shutting_down: bool,

    transcript: Transcript,
    pending: bool,
    draft: String,
    last_error: Option<Error>,
    /// Last status reported through `on_update`.
    reported_status: ConnectionStatus,

    submissions: u64,
    deadline: Option<Deadline>,
    reconnector: Option<Reconnector>,
    reconnect_task: Option<u64>,
    running_tasks: HashMap<u64, JoinHandle<()>>,
    next_task_id: u64,

    on_update: Option<UpdateFn>,
}

impl ControllerState {
    pub fn new(
        transport: TransportClient,
        config: ClientConfig,
        endpoint: Endpoint,
        on_update: Option<UpdateFn>,
    ) -> Self {
        let reconnector = config.reconnect.as_ref().map(Reconnector::new);
        Self {
            transport,
            config,
            endpoint,
            session: None,
            generation: 0,
            initialized: false,
            shutting_down: false,
            transcript: Transcript::default(),
            pending: false,
            draft: String::new(),
            last_error: None,
            reported_status: ConnectionStatus::Connecting,
            submissions: 0,
            deadline: None,
            reconnector,
            reconnect_task: None,
            running_tasks: HashMap::new(),
            next_task_id: 1,
            on_update,
        }
    }

    pub fn current_status(&self) -> ConnectionStatus {
        match &self.session {
            Some(session) => session.status(),
            None if self.shutting_down => ConnectionStatus::Closed,
            None => ConnectionStatus::Connecting,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    #[inline]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    #[inline]
    pub(crate) fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.current_status(),
            pending: self.pending,
            draft: self.draft.clone(),
            last_error: self.last_error.clone(),
            transcript: self.transcript.as_slice().to_vec(),
        }
    }

    fn initialize(&mut self, handle: &Actor<Self>) {
        if self.initialized {
            warn!("conversation is already initialized");
            return;
        }
        self.initialized = true;
        self.open_session(handle);
    }

    fn open_session(&mut self, handle: &Actor<Self>) {
        self.generation += 1;
        let generation = self.generation;

        // A weak handle, since the session is owned by this state.
        let weak = handle.downgrade();
        let sink = EventSink::new(move |event| {
            weak.send(TransportEventMessage { generation, event }).ok();
        });

        if let Some(previous) = self.session.take() {
            previous.close();
        }
        debug!(url = %self.endpoint, generation, "opening transport session");
        self.session = Some(self.transport.open(&self.endpoint, sink));
        self.report_status();
    }

    pub fn submit_turn(
        &mut self,
        text: String,
        handle: &Actor<Self>,
    ) -> Result<(), Error> {
        if self.shutting_down {
            return Err(Error::connection_not_open()
                .with_reason("the conversation has shut down"));
        }
        if text.trim().is_empty() {
            return Err(Error::empty_submission());
        }

        let status = self.current_status();
        if status != ConnectionStatus::Open {
            debug!(%status, "rejecting a submission");
            self.draft = text;
            self.append(Sender::System, notice::NOT_SENT.to_owned());
            return Err(Error::connection_not_open()
                .with_reason(format!("the connection is {status}")));
        }

        // The user turn goes in before the frame goes out.
        self.append(Sender::User, text.clone());
        if !self.draft.is_empty() {
            self.draft.clear();
            self.notify(Update::DraftCleared);
        }
        self.set_pending(true);

        let sent = match &self.session {
            Some(session) => session.send(&text),
            None => Err(SendError::NotConnected(SocketState::Connecting)),
        };
        match sent {
            Ok(()) => {
                self.arm_deadline(handle);
                Ok(())
            }
            Err(err) => {
                // The socket went away between the status check and
                // the send.
                warn!("failed to send: {err}");
                self.set_pending(false);
                self.append(Sender::System, notice::NOT_SENT.to_owned());
                self.report_status();
                Err(Error::connection_not_open().with_reason(format!("{err}")))
            }
        }
    }

    fn handle_transport_event(
        &mut self,
        generation: u64,
        event: TransportEvent,
        handle: &Actor<Self>,
    ) {
        if self.shutting_down || generation != self.generation {
            trace!(
                generation,
                "ignoring event from a retired session: {event:?}"
            );
            return;
        }

        match event {
            TransportEvent::Opened => {
                if let Some(reconnector) = &mut self.reconnector {
                    reconnector.reset();
                }
                self.last_error = None;
                self.append(Sender::System, notice::CONNECTED.to_owned());
            }
            TransportEvent::Message(text) => {
                self.append(Sender::Assistant, text);
                self.settle();
            }
            TransportEvent::Errored(info) => {
                self.append(Sender::System, notice::errored(&info));
                self.last_error = Some(Error::socket_error().with_reason(info));
                self.settle();
            }
            TransportEvent::Closed(info) => {
                self.append(Sender::System, notice::closed(info.as_ref()));
                if self.last_error.is_none() {
                    let error = match &info {
                        Some(info) if !info.reason.is_empty() => {
                            Error::socket_closed()
                                .with_reason(info.reason.clone())
                        }
                        _ => Error::socket_closed(),
                    };
                    self.last_error = Some(error);
                }
                self.settle();
                self.schedule_reconnect(handle);
            }
        }
        self.report_status();
    }

    /// Stops waiting for a reply.
    fn settle(&mut self) {
        self.disarm_deadline();
        self.set_pending(false);
    }

    fn arm_deadline(&mut self, handle: &Actor<Self>) {
        let Some(timeout) = self.config.response_timeout else {
            return;
        };
        self.disarm_deadline();

        self.submissions += 1;
        let submission = self.submissions;
        let weak = handle.downgrade();
        let task_id = self.spawn_task(
            async move {
                sleep(timeout).await;
                weak.send(DeadlineElapsed { submission }).ok();
            },
            handle,
        );
        self.deadline = Some(Deadline {
            submission,
            task_id,
        });
    }

    fn disarm_deadline(&mut self) {
        if let Some(deadline) = self.deadline.take() {
            self.cancel_task(deadline.task_id);
        }
    }

    fn handle_deadline(&mut self, submission: u64) {
        match self.deadline {
            Some(deadline) if deadline.submission == submission => {
                self.deadline = None;
            }
            _ => {
                trace!(submission, "ignoring a stale deadline");
                return;
            }
        }
        if !self.pending {
            return;
        }
        // Only armed when a timeout is configured.
        let timeout = self.config.response_timeout.unwrap_or(Duration::ZERO);
        debug!(?timeout, "no reply in time");
        self.set_pending(false);
        self.append(Sender::System, notice::no_response(timeout));
    }

    fn schedule_reconnect(&mut self, handle: &Actor<Self>) {
        if self.shutting_down || self.reconnect_task.is_some() {
            return;
        }
        let Some(reconnector) = &mut self.reconnector else {
            return;
        };

        let Some(delay) = reconnector.next_delay() else {
            warn!("giving up reconnecting");
            self.append(Sender::System, notice::GAVE_UP.to_owned());
            return;
        };
        let attempt = reconnector.attempts();
        debug!(?delay, attempt, "scheduling a reconnect");
        self.append(Sender::System, notice::reconnecting(delay, attempt));

        let generation = self.generation;
        let weak = handle.downgrade();
        let task_id = self.spawn_task(
            async move {
                sleep(delay).await;
                weak.send(ReconnectDue { generation }).ok();
            },
            handle,
        );
        self.reconnect_task = Some(task_id);
    }

    fn handle_reconnect_due(&mut self, generation: u64, handle: &Actor<Self>) {
        self.reconnect_task = None;
        if self.shutting_down || generation != self.generation {
            return;
        }
        self.open_session(handle);
    }

    pub fn shutdown(&mut self, handle: &Actor<Self>) {
        if self.shutting_down {
            return;
        }
        debug!("shutting down");
        self.shutting_down = true;

        self.deadline = None;
        self.reconnect_task = None;
        for (_, task) in self.running_tasks.drain() {
            task.abort();
        }
        if let Some(session) = &self.session {
            session.close();
        }
        self.set_pending(false);
        self.report_status();
        handle.try_kill();
    }

    fn append(&mut self, sender: Sender, text: String) {
        let index = self.transcript.push(Turn::now(sender, text));
        if self.on_update.is_some() {
            let turn = self.transcript[index].clone();
            self.notify(Update::TurnAppended { index, turn });
            self.notify(Update::ScrollTo(index));
        }
    }

    fn set_pending(&mut self, pending: bool) {
        if self.pending != pending {
            self.pending = pending;
            self.notify(Update::PendingChanged(pending));
        }
    }

    fn report_status(&mut self) {
        let status = self.current_status();
        if status != self.reported_status {
            debug!(from = %self.reported_status, to = %status, "status");
            self.reported_status = status;
            self.notify(Update::StatusChanged(status));
        }
    }

    #[inline]
    fn notify(&self, update: Update) {
        if let Some(on_update) = &self.on_update {
            on_update(&update);
        }
    }

    fn spawn_task<Fut>(&mut self, fut: Fut, handle: &Actor<Self>) -> u64
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_id = self.next_task_id;
        self.next_task_id += 1;

        let weak = handle.downgrade();
        let task = tokio::spawn(async move {
            fut.await;
            weak.send(TaskEndedMessage(task_id)).ok();
        });
        self.running_tasks.insert(task_id, task);
        task_id
    }

    fn cancel_task(&mut self, task_id: u64) {
        if let Some(task) = self.running_tasks.remove(&task_id) {
            task.abort();
        }
    }
}

impl Drop for ControllerState {
    fn drop(&mut self) {
        // Covers every way the actor can stop, not just `shutdown`.
        if let Some(session) = self.session.take() {
            session.close();
        }
        for (_, task) in self.running_tasks.drain() {
            task.abort();
        }
    }
}

#[derive(Debug)]
pub struct Initialize;

impl Message<ControllerState> for Initialize {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        handle: &Actor<ControllerState>,
    ) {
        state.initialize(handle);
    }
}

#[derive(Debug)]
pub struct UpdateDraft(pub String);

impl Message<ControllerState> for UpdateDraft {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) {
        state.draft = self.0;
    }
}

#[derive(Debug)]
struct TransportEventMessage {
    generation: u64,
    event: TransportEvent,
}

impl Message<ControllerState> for TransportEventMessage {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        handle: &Actor<ControllerState>,
    ) {
        state.handle_transport_event(self.generation, self.event, handle);
    }
}

#[derive(Debug)]
struct DeadlineElapsed {
    submission: u64,
}

impl Message<ControllerState> for DeadlineElapsed {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) {
        state.handle_deadline(self.submission);
    }
}

#[derive(Debug)]
struct ReconnectDue {
    generation: u64,
}

impl Message<ControllerState> for ReconnectDue {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        handle: &Actor<ControllerState>,
    ) {
        state.handle_reconnect_due(self.generation, handle);
    }
}

#[derive(Debug)]
struct TaskEndedMessage(u64);

impl Message<ControllerState> for TaskEndedMessage {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) {
        // Cancelled tasks are removed eagerly.
        state.running_tasks.remove(&self.0);
    }
}
