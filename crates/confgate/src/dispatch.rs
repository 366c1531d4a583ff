//! The event bus: feeds events to the state machine and applies its
//! commands.
//!
//! Dispatch is a FIFO queue drained in a loop. A transition runs to
//! completion, its commands are applied in order, and any event it emits
//! ([`Command::Emit`]) waits at the back of the queue. So no two
//! transitions ever interleave, and a cyclic handler can't grow the call
//! stack.

use std::collections::VecDeque;

use confgate_auth::{AuthPhase, AuthStateMachine, Command};
use confgate_dialog::DialogStore;
use confgate_protocol::AuthEvent;
use confgate_retry::RetryScheduler;
use tracing::{debug, info, warn};

use crate::Navigator;

/// Owns the state machine together with everything its commands touch.
pub struct Dispatcher<S: RetryScheduler, N: Navigator> {
    machine: AuthStateMachine,
    dialogs: DialogStore,
    scheduler: S,
    navigator: N,
    queue: VecDeque<AuthEvent>,
}

impl<S: RetryScheduler, N: Navigator> Dispatcher<S, N> {
    /// Creates a dispatcher with an empty dialog store.
    pub fn new(machine: AuthStateMachine, scheduler: S, navigator: N) -> Self {
        Self {
            machine,
            dialogs: DialogStore::new(),
            scheduler,
            navigator,
            queue: VecDeque::new(),
        }
    }

    /// Delivers `event` and everything it transitively emits.
    pub fn dispatch(&mut self, event: AuthEvent) {
        self.queue.push_back(event);

        while let Some(event) = self.queue.pop_front() {
            let shown = self.dialogs.shown_kind();
            let before = self.machine.phase(shown);
            let name = event.name();

            let cmds = self.machine.handle(event, shown);
            for cmd in cmds {
                self.apply(cmd);
            }

            let after = self.phase();
            if before != after {
                info!(event = name, from = %before, to = %after, "auth phase changed");
            }
        }
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::ScheduleRetry { handle, delay } => {
                if let Err(e) = self.scheduler.schedule(handle, delay) {
                    warn!(%handle, error = %e, "failed to arm retry timer");
                }
            }
            Command::CancelRetry(handle) => self.scheduler.cancel(handle),
            Command::ShowDialog { kind, props } => {
                self.dialogs.show(kind, props);
            }
            Command::HideDialog(kind) => {
                self.dialogs.hide(kind);
            }
            Command::CancelUpgrade(task) => {
                debug!(task = %task.id(), "cancelling role upgrade");
                task.cancel();
            }
            Command::NavigateToEntryPoint => {
                debug!("navigating to entry point");
                self.navigator.to_entry_point();
            }
            Command::Emit(event) => self.queue.push_back(event),
        }
    }

    /// The current derived phase.
    pub fn phase(&self) -> AuthPhase {
        self.machine.phase(self.dialogs.shown_kind())
    }

    pub fn machine(&self) -> &AuthStateMachine {
        &self.machine
    }

    pub fn dialogs(&self) -> &DialogStore {
        &self.dialogs
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }
}
