use std::sync::Arc;

use crate::workflows::portal::testing::SpyGateway;
use crate::workflows::rows::{EntityKind, EntityRef, EntityRow, EntityRowSync, ListViewModel};

pub(super) fn course(id: &str, name: &str, lead: &str) -> EntityRow {
    EntityRow::new(
        EntityRef::new(EntityKind::Course, id),
        [("name", name), ("course_lead", lead)],
    )
}

pub(super) fn course_rows() -> Vec<EntityRow> {
    vec![
        course("c-1", "Computer Science", "Dr Ada Byron"),
        course("c-2", "Computational Biology", "Dr Rosalind Franklin"),
        course("c-3", "History of Art", "Prof Ernst Gombrich"),
    ]
}

pub(super) fn course_sync() -> (Arc<SpyGateway>, EntityRowSync<SpyGateway>) {
    let gateway = SpyGateway::new();
    let view = ListViewModel::from_rows(EntityKind::Course, course_rows());
    (gateway.clone(), EntityRowSync::new(gateway, view))
}
