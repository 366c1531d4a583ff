//! `AuthService` builder and actor loop.
//!
//! The service is a single Tokio task that owns the [`Dispatcher`]. The
//! session layer and the UI talk to it through a cheap, cloneable
//! [`AuthHandle`]; retry timers talk to it through the scheduler's fire
//! channel. Every transition therefore runs on one task, one at a time.

use std::time::Duration;

use confgate_auth::{AuthConfig, AuthPhase, AuthStateMachine};
use confgate_dialog::{DialogError, DialogSink};
use confgate_protocol::{
    AuthEvent, ConferenceError, ConnectionError, DialogDescriptor,
    DialogKind, RetryHandle, RetryHandler, WaitForOwner,
};
use confgate_retry::{RetryConfig, TokioRetryScheduler};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::{ConfgateError, Dispatcher, Navigator};

/// Requests sent to the service actor through its channel.
pub(crate) enum ServiceCommand {
    /// Put an event on the bus.
    Event(AuthEvent),
    /// Report the current phase.
    GetPhase { reply: oneshot::Sender<AuthPhase> },
    /// Stop the actor.
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running auth service.
///
/// Sending never blocks (the channel is unbounded), so the handle can be
/// used from synchronous code: retry actions, dialog hooks, session
/// callbacks.
#[derive(Clone)]
pub struct AuthHandle {
    sender: mpsc::UnboundedSender<ServiceCommand>,
    dialogs: watch::Receiver<Option<DialogDescriptor>>,
}

impl AuthHandle {
    /// Puts `event` on the bus.
    pub fn emit(&self, event: AuthEvent) -> Result<(), ConfgateError> {
        self.sender
            .send(ServiceCommand::Event(event))
            .map_err(|_| ConfgateError::ServiceStopped)
    }

    // -- Session layer --

    pub fn connection_established(&self) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::ConnectionEstablished)
    }

    pub fn connection_failed(
        &self,
        reason: ConnectionError,
    ) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::ConnectionFailed(reason))
    }

    pub fn conference_failed(
        &self,
        reason: ConferenceError,
    ) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::ConferenceFailed(reason))
    }

    pub fn conference_joined(&self) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::ConferenceJoined)
    }

    pub fn conference_left(&self) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::ConferenceLeft)
    }

    // -- UI control --

    pub fn cancel_login(&self) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::CancelLoginRequested)
    }

    pub fn cancel_wait_for_owner(&self) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::CancelWaitForOwnerRequested)
    }

    pub fn stop_wait_for_owner(&self) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::StopWaitForOwnerRequested)
    }

    pub fn wait_for_owner(
        &self,
        handler: RetryHandler,
        timeout: Duration,
    ) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::WaitForOwnerRequested(WaitForOwner::new(
            handler, timeout,
        )))
    }

    pub fn request_login(&self) -> Result<(), ConfgateError> {
        self.emit(AuthEvent::LoginRequested)
    }

    // -- Introspection --

    /// Asks the service for its current phase.
    pub async fn phase(&self) -> Result<AuthPhase, ConfgateError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ServiceCommand::GetPhase { reply })
            .map_err(|_| ConfgateError::ServiceStopped)?;
        rx.await.map_err(|_| ConfgateError::ServiceStopped)
    }

    /// Subscribes to the dialog on screen.
    pub fn dialogs(&self) -> watch::Receiver<Option<DialogDescriptor>> {
        self.dialogs.clone()
    }

    /// Tells the service to stop.
    pub fn shutdown(&self) -> Result<(), ConfgateError> {
        self.sender
            .send(ServiceCommand::Shutdown)
            .map_err(|_| ConfgateError::ServiceStopped)
    }
}

impl DialogSink for AuthHandle {
    fn dismiss(&self, kind: DialogKind) -> Result<(), DialogError> {
        self.emit(AuthEvent::DialogDismissed(kind))
            .map_err(|_| DialogError::SinkClosed(kind))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and spawning the auth service.
///
/// # Example
///
/// ```rust,ignore
/// let (auth, task) = AuthService::builder(|| router.go_home())
///     .on_retry(RetryHandler::rearming(move || {
///         session.rejoin();
///         Vec::new()
///     }))
///     .spawn();
/// ```
pub struct AuthServiceBuilder<N: Navigator> {
    auth_config: AuthConfig,
    retry_config: RetryConfig,
    on_retry: RetryHandler,
    navigator: N,
}

impl<N: Navigator> AuthServiceBuilder<N> {
    /// Creates a builder with default settings and a retry action that
    /// only re-arms.
    pub fn new(navigator: N) -> Self {
        Self {
            auth_config: AuthConfig::default(),
            retry_config: RetryConfig::default(),
            on_retry: RetryHandler::rearming(Vec::new),
            navigator,
        }
    }

    /// Sets the state machine configuration.
    pub fn auth_config(mut self, config: AuthConfig) -> Self {
        self.auth_config = config;
        self
    }

    /// Sets the retry timer configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Sets the handler armed when a conference reports that
    /// authentication is required.
    pub fn on_retry(mut self, handler: RetryHandler) -> Self {
        self.on_retry = handler;
        self
    }

    /// Spawns the service on the current Tokio runtime.
    ///
    /// Returns the handle and the actor's task. The task ends after
    /// [`AuthHandle::shutdown`], or when every handle is dropped. A retry
    /// handler that captures a handle keeps the service alive until
    /// shutdown.
    pub fn spawn(self) -> (AuthHandle, JoinHandle<()>) {
        let (scheduler, fired) =
            TokioRetryScheduler::channel(self.retry_config);
        let machine = AuthStateMachine::new(self.auth_config, self.on_retry);
        let dispatcher = Dispatcher::new(machine, scheduler, self.navigator);
        let (sender, commands) = mpsc::unbounded_channel();

        let handle = AuthHandle {
            sender,
            dialogs: dispatcher.dialogs().subscribe(),
        };
        let actor = AuthService {
            dispatcher,
            commands,
            fired,
        };
        let task = tokio::spawn(actor.run());

        (handle, task)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The auth service actor. Runs inside a Tokio task.
pub struct AuthService<N: Navigator> {
    dispatcher: Dispatcher<TokioRetryScheduler, N>,
    commands: mpsc::UnboundedReceiver<ServiceCommand>,
    fired: mpsc::UnboundedReceiver<RetryHandle>,
}

impl AuthService<fn()> {
    /// Creates a builder.
    pub fn builder<N: Navigator>(navigator: N) -> AuthServiceBuilder<N> {
        AuthServiceBuilder::new(navigator)
    }
}

impl<N: Navigator> AuthService<N> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!("auth service started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(ServiceCommand::Event(event)) => {
                        self.dispatcher.dispatch(event);
                    }
                    Some(ServiceCommand::GetPhase { reply }) => {
                        let _ = reply.send(self.dispatcher.phase());
                    }
                    Some(ServiceCommand::Shutdown) | None => break,
                },
                Some(handle) = self.fired.recv() => {
                    self.dispatcher.dispatch(AuthEvent::RetryTimerFired(handle));
                }
            }
        }

        tracing::info!("auth service stopped");
    }
}
