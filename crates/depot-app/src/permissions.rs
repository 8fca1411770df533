// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Synchronous capability lookup, checked before any network call.
/// Admins may do everything; operators may not delete people records;
/// viewers may not mutate at all.
pub fn can_perform(role: Role, action: Action, resource_path: &str) -> bool {
    match role {
        Role::Admin => true,
        Role::Viewer => false,
        Role::Operator => {
            !(action == Action::Delete && matches!(resource_path, "/users" | "/drivers"))
        }
    }
}

pub fn forbidden_message(action: Action) -> String {
    format!("You don't have permission to {}", action.as_str())
}

#[cfg(test)]
mod tests {
    use super::{Action, can_perform, forbidden_message};
    use crate::{EntityKind, Role};

    #[test]
    fn admin_can_do_everything() {
        for kind in EntityKind::ALL {
            for action in [Action::Create, Action::Update, Action::Delete] {
                assert!(can_perform(Role::Admin, action, &kind.resource_path()));
            }
        }
    }

    #[test]
    fn viewer_can_mutate_nothing() {
        assert!(!can_perform(Role::Viewer, Action::Create, "/trips"));
        assert!(!can_perform(Role::Viewer, Action::Delete, "/bookings"));
    }

    #[test]
    fn operator_may_not_delete_people() {
        assert!(!can_perform(Role::Operator, Action::Delete, "/users"));
        assert!(!can_perform(Role::Operator, Action::Delete, "/drivers"));
        assert!(can_perform(Role::Operator, Action::Delete, "/bookings"));
        assert!(can_perform(Role::Operator, Action::Update, "/users"));
    }

    #[test]
    fn forbidden_message_names_the_action() {
        assert_eq!(
            forbidden_message(Action::Delete),
            "You don't have permission to DELETE"
        );
    }
}
