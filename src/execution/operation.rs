//! Nested operations and the order each relation kind applies them in

use crate::core::argument::{ArgumentSet, ArgumentValue};
use crate::core::relation::RelationKind;
use std::fmt;

/// An operation that can appear inside a relation field's input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Connect,
    Update,
    Upsert,
    Disconnect,
    Delete,
    Sync,
    SyncWithoutDetaching,
}

impl OperationKind {
    /// The input field name of the operation
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Connect => "connect",
            OperationKind::Update => "update",
            OperationKind::Upsert => "upsert",
            OperationKind::Disconnect => "disconnect",
            OperationKind::Delete => "delete",
            OperationKind::Sync => "sync",
            OperationKind::SyncWithoutDetaching => "syncWithoutDetaching",
        }
    }

    /// Operations of a relation kind, in the order they are applied
    ///
    /// Later operations observe the effects of earlier ones, so the order is
    /// fixed rather than taken from the client.
    pub fn order_for(kind: RelationKind) -> &'static [OperationKind] {
        use OperationKind::*;

        match kind {
            RelationKind::OwningToOne | RelationKind::OwningToOnePolymorphic => {
                &[Create, Connect, Update, Upsert, Disconnect, Delete]
            }
            RelationKind::OwnedToOne | RelationKind::OwnedToMany => {
                &[Create, Update, Upsert, Connect, Disconnect, Delete]
            }
            RelationKind::ManyToMany => &[
                Sync,
                SyncWithoutDetaching,
                Create,
                Update,
                Upsert,
                Delete,
                Connect,
                Disconnect,
            ],
            RelationKind::None => &[],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation with its payload
#[derive(Debug, Clone, PartialEq)]
pub struct NestedOperation {
    pub kind: OperationKind,
    pub value: ArgumentValue,
}

/// Extract the operations present in `args`, in application order
///
/// Only operations supplied with a non-null value are returned. Fields that
/// are not operations of `kind` are left out.
pub fn plan_operations(kind: RelationKind, mut args: ArgumentSet) -> Vec<NestedOperation> {
    OperationKind::order_for(kind)
        .iter()
        .filter_map(|operation| {
            if !args.has(operation.as_str()) {
                return None;
            }
            args.remove(operation.as_str()).map(|argument| NestedOperation {
                kind: *operation,
                value: argument.value,
            })
        })
        .collect()
}
