//! The authentication state machine.
//!
//! Some of the asymmetry below comes from the dialog store holding a
//! single slot. `LoginPrompt` always wins visibility: it may sit on top of
//! a wait-for-owner loop that is still running, and the machine is what
//! remembers that the wait prompt has to come back when login is
//! cancelled. A re-armed wait request never replaces a visible login
//! prompt.

use std::time::Duration;

use confgate_protocol::{
    AuthEvent, ConferenceError, ConnectionError, DialogKind, DialogProps,
    RetryHandle, RetryHandler, UpgradeId, UpgradeTask, WaitForOwner,
};
use tracing::{debug, info, trace};

use crate::{AuthConfig, AuthPhase, AuthenticationState, Command, PendingRetry};

/// Consumes [`AuthEvent`]s and produces [`Command`]s.
///
/// The transition function is total: every `(state, event)` pair yields a
/// (possibly empty) list of commands and never fails.
pub struct AuthStateMachine {
    config: AuthConfig,
    /// Handler used when the machine starts the wait loop itself.
    on_retry: RetryHandler,
    state: AuthenticationState,
    next_handle: u64,
}

impl AuthStateMachine {
    /// Creates a machine in the `Idle` phase.
    ///
    /// `on_retry` is the handler armed when a conference reports that
    /// authentication is required; it normally asks the session layer to
    /// try joining again.
    pub fn new(config: AuthConfig, on_retry: RetryHandler) -> Self {
        Self {
            config,
            on_retry,
            state: AuthenticationState::default(),
            next_handle: 1,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn state(&self) -> &AuthenticationState {
        &self.state
    }

    /// The current phase given the dialog on screen.
    pub fn phase(&self, shown: Option<DialogKind>) -> AuthPhase {
        AuthPhase::derive(&self.state, shown)
    }

    /// Applies `event` and returns the commands to carry out.
    ///
    /// `shown` is the kind on screen *before* this event.
    pub fn handle(
        &mut self,
        event: AuthEvent,
        shown: Option<DialogKind>,
    ) -> Vec<Command> {
        trace!(event = event.name(), ?shown, "auth event");
        let mut cmds = Vec::new();

        match event {
            AuthEvent::CancelLoginRequested => {
                self.cancel_login(shown, &mut cmds);
            }

            AuthEvent::CancelWaitForOwnerRequested => {
                self.stop_wait_for_owner(&mut cmds);
                cmds.push(Command::NavigateToEntryPoint);
                info!("wait for owner cancelled by user");
            }

            AuthEvent::ConferenceFailed(ConferenceError::AuthenticationRequired) => {
                info!("conference requires an owner, waiting");
                cmds.push(Command::Emit(AuthEvent::WaitForOwnerRequested(
                    WaitForOwner::new(
                        self.on_retry.clone(),
                        self.config.wait_for_owner_timeout(),
                    ),
                )));
            }

            AuthEvent::ConferenceFailed(reason) => {
                debug!(%reason, "conference failed, stopping wait for owner");
                self.stop_wait_for_owner(&mut cmds);
            }

            AuthEvent::ConferenceJoined => {
                if self.state.is_waiting_for_owner() {
                    info!("conference joined, owner arrived");
                    self.stop_wait_for_owner(&mut cmds);
                }
                cmds.push(Command::HideDialog(DialogKind::LoginPrompt));
            }

            AuthEvent::ConferenceLeft => {
                self.stop_wait_for_owner(&mut cmds);
            }

            AuthEvent::ConnectionEstablished => {
                cmds.push(Command::HideDialog(DialogKind::LoginPrompt));
            }

            AuthEvent::ConnectionFailed(ConnectionError::PasswordRequired) => {
                info!("connection requires credentials");
                self.show_login(&mut cmds);
            }

            AuthEvent::ConnectionFailed(reason) => {
                debug!(%reason, "connection failed, nothing to recover");
            }

            AuthEvent::StopWaitForOwnerRequested => {
                self.stop_wait_for_owner(&mut cmds);
            }

            AuthEvent::WaitForOwnerRequested(request) => {
                self.wait_for_owner(request, shown, &mut cmds);
            }

            AuthEvent::LoginRequested => {
                self.show_login(&mut cmds);
            }

            AuthEvent::DialogDismissed(kind) => {
                cmds.push(Command::HideDialog(kind));
            }

            AuthEvent::RetryTimerFired(handle) => {
                self.retry_fired(handle, &mut cmds);
            }

            AuthEvent::UpgradeStarted(task) => {
                self.upgrade_started(task, &mut cmds);
            }

            AuthEvent::UpgradeFinished { task, error } => {
                self.upgrade_finished(task, error, shown, &mut cmds);
            }
        }

        cmds
    }

    // -- Transitions ------------------------------------------------------

    fn cancel_login(
        &mut self,
        shown: Option<DialogKind>,
        cmds: &mut Vec<Command>,
    ) {
        if let Some(task) = self.state.upgrade.take() {
            cmds.push(Command::CancelUpgrade(task));
        }

        // The wait prompt is the one on screen: login was never visible
        // on top of it, so there is nothing to reveal or leave.
        if shown == Some(DialogKind::WaitForOwnerPrompt) {
            return;
        }

        if let Some(retry) = &self.state.retry {
            // Login was covering the wait prompt; bring it back instead
            // of leaving the conference.
            cmds.push(Command::ShowDialog {
                kind: DialogKind::WaitForOwnerPrompt,
                props: wait_props(retry),
            });
            info!("login cancelled, back to waiting for owner");
        } else {
            cmds.push(Command::HideDialog(DialogKind::LoginPrompt));
            cmds.push(Command::NavigateToEntryPoint);
            info!("login cancelled, leaving");
        }
    }

    fn wait_for_owner(
        &mut self,
        request: WaitForOwner,
        shown: Option<DialogKind>,
        cmds: &mut Vec<Command>,
    ) {
        if let Some(previous) = self.state.retry.take() {
            cmds.push(Command::CancelRetry(previous.handle));
        }

        let handle = self.allocate_handle();
        let retry = PendingRetry {
            handle,
            handler: request.handler,
            timeout: request.timeout,
            fired: false,
        };
        cmds.push(Command::ScheduleRetry {
            handle,
            delay: retry.timeout,
        });

        // The request is cyclic; re-showing the wait prompt every cycle
        // must not knock a login prompt off the screen.
        if shown != Some(DialogKind::LoginPrompt) {
            cmds.push(Command::ShowDialog {
                kind: DialogKind::WaitForOwnerPrompt,
                props: wait_props(&retry),
            });
        }

        debug!(%handle, timeout_ms = millis(retry.timeout), "waiting for owner");
        self.state.retry = Some(retry);
    }

    fn stop_wait_for_owner(&mut self, cmds: &mut Vec<Command>) {
        if let Some(retry) = self.state.retry.take() {
            cmds.push(Command::CancelRetry(retry.handle));
            debug!(handle = %retry.handle, "wait for owner stopped");
        }
        cmds.push(Command::HideDialog(DialogKind::WaitForOwnerPrompt));
    }

    fn retry_fired(&mut self, handle: RetryHandle, cmds: &mut Vec<Command>) {
        let Some(retry) = self.state.retry.as_mut() else {
            debug!(%handle, "retry fired after wait loop stopped, ignoring");
            return;
        };
        if retry.handle != handle || retry.fired {
            debug!(%handle, current = %retry.handle, "stale retry fire, ignoring");
            return;
        }

        retry.fired = true;
        let events = retry.handler.fire(retry.timeout);
        debug!(%handle, follow_ups = events.len(), "retry fired");
        cmds.extend(events.into_iter().map(Command::Emit));
    }

    fn show_login(&mut self, cmds: &mut Vec<Command>) {
        let mut props = DialogProps::new();
        if let Some(error) = &self.state.last_upgrade_error {
            props.insert("error".into(), error.clone().into());
        }
        cmds.push(Command::ShowDialog {
            kind: DialogKind::LoginPrompt,
            props,
        });
    }

    fn upgrade_started(&mut self, task: UpgradeTask, cmds: &mut Vec<Command>) {
        debug!(task = %task.id(), "role upgrade started");
        if let Some(previous) = self.state.upgrade.replace(task) {
            cmds.push(Command::CancelUpgrade(previous));
        }
    }

    fn upgrade_finished(
        &mut self,
        task: UpgradeId,
        error: Option<String>,
        shown: Option<DialogKind>,
        cmds: &mut Vec<Command>,
    ) {
        if self.state.upgrade.as_ref().map(UpgradeTask::id) != Some(task) {
            debug!(%task, "upgrade finished but is no longer in progress, ignoring");
            return;
        }
        self.state.upgrade = None;

        match error {
            Some(error) => {
                info!(%task, %error, "role upgrade failed");
                self.state.last_upgrade_error = Some(error);
                if shown == Some(DialogKind::LoginPrompt) {
                    self.show_login(cmds);
                }
            }
            None => {
                info!(%task, "role upgrade succeeded");
                self.state.last_upgrade_error = None;
            }
        }
    }

    fn allocate_handle(&mut self) -> RetryHandle {
        let handle = RetryHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

fn wait_props(retry: &PendingRetry) -> DialogProps {
    let mut props = DialogProps::new();
    props.insert(
        "retry_interval_ms".into(),
        millis(retry.timeout).into(),
    );
    props
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
