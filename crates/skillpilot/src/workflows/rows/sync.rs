use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use super::domain::{EntityKind, EntityRef, EntityRow};
use super::status::{ConfirmationPrompt, StatusRegion};
use super::view::{ListViewModel, RowFilter};
use crate::workflows::portal::PortalGateway;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted(EntityRow),
    Failed { message: String },
}

/// Actions refused before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowSyncError {
    #[error("{0} is not shown on this screen")]
    UnknownRow(EntityRef),
    #[error("a delete for {0} is already in progress")]
    DeleteInFlight(EntityRef),
}

/// Told about every delete the portal confirmed, after the row has left the view.
pub trait DeletionListener: Send + Sync {
    fn entity_deleted(&self, entity: &EntityRef);
}

/// Delete-then-remove discipline for one list screen: rows leave the view only after the
/// portal confirms, and failures land in the screen's error region.
pub struct EntityRowSync<G> {
    gateway: Arc<G>,
    view: Mutex<ListViewModel>,
    status: Mutex<StatusRegion>,
    pending: Mutex<HashSet<String>>,
    listeners: Vec<Arc<dyn DeletionListener>>,
}

impl<G> EntityRowSync<G>
where
    G: PortalGateway + 'static,
{
    pub fn new(gateway: Arc<G>, view: ListViewModel) -> Self {
        Self {
            gateway,
            view: Mutex::new(view),
            status: Mutex::new(StatusRegion::default()),
            pending: Mutex::new(HashSet::new()),
            listeners: Vec::new(),
        }
    }

    /// Registers a screen that must drop its own state for entities deleted here.
    pub fn on_deleted(mut self, listener: Arc<dyn DeletionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.view().kind()
    }

    /// Snapshot of the rendered rows.
    pub fn rows(&self) -> Vec<EntityRow> {
        self.view().rows().to_vec()
    }

    pub fn indexed_ids(&self) -> Vec<String> {
        self.view()
            .indexed_ids()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn filter(&self, filter: &RowFilter) -> Vec<EntityRow> {
        self.view().filter(filter).into_iter().cloned().collect()
    }

    pub fn status(&self) -> StatusRegion {
        self.status.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    /// Replaces the whole view with a fresh list response.
    pub fn reload(&self, rows: impl IntoIterator<Item = EntityRow>) {
        let kind = self.kind();
        *self.view() = ListViewModel::from_rows(kind, rows);
        self.status_mut().clear();
    }

    /// Applies an update the portal already accepted.
    pub fn apply_update(&self, row: EntityRow) -> bool {
        self.view().replace(row)
    }

    pub async fn delete<P>(&self, id: &str, prompt: &P) -> Result<DeleteOutcome, RowSyncError>
    where
        P: ConfirmationPrompt + ?Sized,
    {
        let kind = self.kind();
        let entity = EntityRef::new(kind, id);
        let row = self
            .view()
            .get(id)
            .cloned()
            .ok_or_else(|| RowSyncError::UnknownRow(entity.clone()))?;

        if self.pending_mut().contains(id) {
            return Err(RowSyncError::DeleteInFlight(entity));
        }

        let question = format!(
            "Are you sure you want to delete the {} \"{}\"?",
            kind,
            row.display_name()
        );
        if !prompt.confirm(&question) {
            return Ok(DeleteOutcome::Cancelled);
        }

        if !self.pending_mut().insert(id.to_string()) {
            return Err(RowSyncError::DeleteInFlight(entity));
        }
        let result = self.gateway.delete_entity(&entity).await;
        self.pending_mut().remove(id);

        match result {
            Ok(()) => {
                let removed = self.view().remove(id).unwrap_or(row);
                self.status_mut()
                    .success(format!("{} {} deleted successfully.", kind.title(), id));
                info!(entity = %entity, "row removed after confirmed delete");
                for listener in &self.listeners {
                    listener.entity_deleted(&entity);
                }
                Ok(DeleteOutcome::Deleted(removed))
            }
            Err(err) => {
                let message = match err.user_message() {
                    text if text.trim().is_empty() => format!("Failed to delete {kind}."),
                    text => text,
                };
                self.status_mut().error(message.clone());
                warn!(entity = %entity, error = %err, "delete failed; row kept");
                Ok(DeleteOutcome::Failed { message })
            }
        }
    }

    fn view(&self) -> MutexGuard<'_, ListViewModel> {
        self.view.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn status_mut(&self) -> MutexGuard<'_, StatusRegion> {
        self.status.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn pending_mut(&self) -> MutexGuard<'_, HashSet<String>> {
        self.pending.lock().unwrap_or_else(|err| err.into_inner())
    }
}
