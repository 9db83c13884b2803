// 🔔 Registry events - typed observers instead of string-keyed hooks

use crate::entities::EntityKind;
use crate::geo::LatLng;
use crate::widget::MarkerId;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerAdded {
    pub id: MarkerId,
    pub index: usize,
    pub kind: EntityKind,
    pub title: Option<String>,
    pub position: LatLng,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRemoved {
    pub id: MarkerId,
    pub index: usize,
    pub kind: EntityKind,
}

/// Registry listener. Every method has a no-op default so observers only
/// implement what they care about.
///
/// Handlers run synchronously, in subscription order, after the registry
/// state is fully updated. An `Err` is logged and discarded.
pub trait RegistryObserver: Send {
    fn marker_added(&mut self, _event: &MarkerAdded) -> Result<()> {
        Ok(())
    }

    fn marker_removed(&mut self, _event: &MarkerRemoved) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Ordered observer list.
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, Box<dyn RegistryObserver>)>,
}

impl Observers {
    pub fn subscribe(&mut self, observer: Box<dyn RegistryObserver>) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.entries.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn emit_added(&mut self, event: &MarkerAdded) {
        for (id, observer) in self.entries.iter_mut() {
            if let Err(err) = observer.marker_added(event) {
                tracing::warn!(observer = id.0, marker = %event.id, error = %err, "markerAdded handler failed");
            }
        }
    }

    pub fn emit_removed(&mut self, event: &MarkerRemoved) {
        for (id, observer) in self.entries.iter_mut() {
            if let Err(err) = observer.marker_removed(event) {
                tracing::warn!(observer = id.0, marker = %event.id, error = %err, "markerRemoved handler failed");
            }
        }
    }
}
