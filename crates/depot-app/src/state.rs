// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Action, DetailKind, EntityKind, Role, can_perform, forbidden_message};

/// Transient modal state of the active screen. Never persisted; a screen
/// change always resets it to `Closed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    DetailOpen {
        kind: DetailKind,
        id: i64,
    },
    DeleteConfirmOpen {
        id: i64,
    },
    ForbiddenOpen {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_screen: EntityKind,
    pub role: Role,
    pub modal: ModalState,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_screen: EntityKind::Trips,
            role: Role::Admin,
            modal: ModalState::Closed,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextScreen,
    PrevScreen,
    OpenScreen(EntityKind),
    OpenDetail { kind: DetailKind, id: i64 },
    RequestForm { action: Action, target: Option<i64> },
    RequestDelete { id: i64 },
    ConfirmDelete,
    MutationResolved,
    CloseModal,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(EntityKind),
    /// The caller should lazily resolve the detail record now.
    DetailRequested { kind: DetailKind, id: i64 },
    FormRequested { action: Action, target: Option<i64> },
    DeleteArmed { id: i64 },
    /// The caller should dispatch the delete mutation; the confirm modal
    /// stays open until `MutationResolved`.
    DeleteDispatched { id: i64 },
    Forbidden,
    ModalClosed,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextScreen => self.rotate_screen(1),
            AppCommand::PrevScreen => self.rotate_screen(-1),
            AppCommand::OpenScreen(screen) => {
                self.active_screen = screen;
                self.modal = ModalState::Closed;
                vec![AppEvent::ScreenChanged(screen)]
            }
            AppCommand::OpenDetail { kind, id } => {
                if self.modal != ModalState::Closed {
                    return Vec::new();
                }
                self.modal = ModalState::DetailOpen { kind, id };
                vec![AppEvent::DetailRequested { kind, id }]
            }
            AppCommand::RequestForm { action, target } => {
                if self.can(action) {
                    vec![AppEvent::FormRequested { action, target }]
                } else {
                    self.forbid(action)
                }
            }
            AppCommand::RequestDelete { id } => {
                if self.can(Action::Delete) {
                    self.modal = ModalState::DeleteConfirmOpen { id };
                    vec![AppEvent::DeleteArmed { id }]
                } else {
                    self.forbid(Action::Delete)
                }
            }
            AppCommand::ConfirmDelete => match self.modal {
                ModalState::DeleteConfirmOpen { id } => vec![AppEvent::DeleteDispatched { id }],
                _ => Vec::new(),
            },
            AppCommand::MutationResolved => match self.modal {
                ModalState::DeleteConfirmOpen { .. } => {
                    self.modal = ModalState::Closed;
                    vec![AppEvent::ModalClosed]
                }
                _ => Vec::new(),
            },
            AppCommand::CloseModal => {
                if self.modal == ModalState::Closed {
                    return Vec::new();
                }
                self.modal = ModalState::Closed;
                vec![AppEvent::ModalClosed]
            }
            AppCommand::SetStatus(message) => {
                vec![self.set_status(&message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn can(&self, action: Action) -> bool {
        can_perform(self.role, action, &self.active_screen.resource_path())
    }

    fn forbid(&mut self, action: Action) -> Vec<AppEvent> {
        self.modal = ModalState::ForbiddenOpen {
            message: forbidden_message(action),
        };
        vec![AppEvent::Forbidden]
    }

    fn rotate_screen(&mut self, delta: isize) -> Vec<AppEvent> {
        let screens = EntityKind::ALL;
        let current = screens
            .iter()
            .position(|screen| *screen == self.active_screen)
            .unwrap_or(0) as isize;
        let len = screens.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_screen = screens[next];
        self.modal = ModalState::Closed;
        vec![AppEvent::ScreenChanged(self.active_screen)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, ModalState};
    use crate::{Action, DetailKind, EntityKind, Role};

    #[test]
    fn screen_rotation_wraps_and_resets_modal() {
        let mut state = AppState {
            active_screen: EntityKind::TripLogs,
            modal: ModalState::DeleteConfirmOpen { id: 3 },
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextScreen);
        assert_eq!(state.active_screen, EntityKind::Trips);
        assert_eq!(state.modal, ModalState::Closed);
        assert_eq!(events, vec![AppEvent::ScreenChanged(EntityKind::Trips)]);
    }

    #[test]
    fn detail_opens_only_from_closed() {
        let mut state = AppState::default();
        state.active_screen = EntityKind::Bookings;

        let events = state.dispatch(AppCommand::OpenDetail {
            kind: DetailKind::Booking,
            id: 42,
        });
        assert_eq!(
            state.modal,
            ModalState::DetailOpen {
                kind: DetailKind::Booking,
                id: 42
            }
        );
        assert_eq!(
            events,
            vec![AppEvent::DetailRequested {
                kind: DetailKind::Booking,
                id: 42
            }]
        );

        let blocked = state.dispatch(AppCommand::OpenDetail {
            kind: DetailKind::Trip,
            id: 7,
        });
        assert!(blocked.is_empty());
    }

    #[test]
    fn denied_delete_opens_forbidden_and_never_dispatches() {
        let mut state = AppState {
            role: Role::Viewer,
            active_screen: EntityKind::Bookings,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::RequestDelete { id: 42 });
        assert_eq!(events, vec![AppEvent::Forbidden]);
        assert_eq!(
            state.modal,
            ModalState::ForbiddenOpen {
                message: "You don't have permission to DELETE".to_owned()
            }
        );

        // Confirm in Forbidden state must be a no-op: no mutation dispatch.
        assert!(state.dispatch(AppCommand::ConfirmDelete).is_empty());
    }

    #[test]
    fn operator_delete_on_users_is_forbidden() {
        let mut state = AppState {
            role: Role::Operator,
            active_screen: EntityKind::Users,
            ..AppState::default()
        };
        assert_eq!(
            state.dispatch(AppCommand::RequestDelete { id: 1 }),
            vec![AppEvent::Forbidden]
        );
    }

    #[test]
    fn confirm_dispatches_and_modal_closes_on_resolution() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::RequestDelete { id: 9 });
        assert_eq!(state.modal, ModalState::DeleteConfirmOpen { id: 9 });

        let events = state.dispatch(AppCommand::ConfirmDelete);
        assert_eq!(events, vec![AppEvent::DeleteDispatched { id: 9 }]);
        // Still open while the mutation is in flight.
        assert_eq!(state.modal, ModalState::DeleteConfirmOpen { id: 9 });

        let events = state.dispatch(AppCommand::MutationResolved);
        assert_eq!(events, vec![AppEvent::ModalClosed]);
        assert_eq!(state.modal, ModalState::Closed);
    }

    #[test]
    fn escape_closes_any_modal() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::OpenDetail {
            kind: DetailKind::Trip,
            id: 4,
        });
        let events = state.dispatch(AppCommand::CloseModal);
        assert_eq!(events, vec![AppEvent::ModalClosed]);
        assert_eq!(state.modal, ModalState::Closed);

        // Closing an already-closed modal emits nothing.
        assert!(state.dispatch(AppCommand::CloseModal).is_empty());
    }

    #[test]
    fn form_request_respects_create_permission() {
        let mut state = AppState {
            role: Role::Viewer,
            ..AppState::default()
        };
        assert_eq!(
            state.dispatch(AppCommand::RequestForm {
                action: Action::Create,
                target: None
            }),
            vec![AppEvent::Forbidden]
        );

        state.role = Role::Admin;
        state.modal = ModalState::Closed;
        assert_eq!(
            state.dispatch(AppCommand::RequestForm {
                action: Action::Create,
                target: None
            }),
            vec![AppEvent::FormRequested {
                action: Action::Create,
                target: None
            }]
        );
    }

    #[test]
    fn status_updates_and_clears() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::SetStatus("saved".to_owned()));
        assert_eq!(events, vec![AppEvent::StatusUpdated("saved".to_owned())]);
        assert_eq!(state.status_line.as_deref(), Some("saved"));

        state.dispatch(AppCommand::ClearStatus);
        assert_eq!(state.status_line, None);
    }
}
