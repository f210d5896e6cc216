//! Flag marker bookkeeping.
//!
//! Each text layer owns at most one marker rectangle. The link is a weak
//! back-reference: the marker's id, stored in the text layer's persisted
//! data under [`FlagStyle::data_key`]. The marker can be deleted by the user
//! at any time, so a stored id that no longer resolves reads as "no marker".

use crate::config::FlagStyle;
use crate::error::HostResult;
use crate::host::{Host, NodeId, Paint};

/// What [`FlagRegistry::flag`] did to the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerChange {
    /// A new marker was created.
    Created(NodeId),
    /// The existing marker was updated in place.
    Reused(NodeId),
}

impl MarkerChange {
    /// Id of the marker that now flags the layer.
    pub const fn marker(&self) -> &NodeId {
        match self {
            Self::Created(id) | Self::Reused(id) => id,
        }
    }
}

/// Creates, updates, and removes flag markers.
#[derive(Debug, Clone, Copy)]
pub struct FlagRegistry<'a> {
    style: &'a FlagStyle,
}

impl<'a> FlagRegistry<'a> {
    /// A registry drawing markers with `style`.
    pub const fn new(style: &'a FlagStyle) -> Self {
        Self { style }
    }

    /// Key under which text layers store their marker id.
    pub fn data_key(&self) -> &'a str {
        &self.style.data_key
    }

    /// The marker currently linked from `text`, if it still exists.
    pub fn resolve<H: Host + ?Sized>(
        &self,
        host: &H,
        text: &NodeId,
    ) -> HostResult<Option<NodeId>> {
        let stored = host.plugin_data(text, &self.style.data_key)?;
        if stored.is_empty() {
            return Ok(None);
        }
        let marker = host.node_by_id(&stored);
        if marker.is_none() {
            tracing::debug!(text = %text, stale = %stored, "back-reference no longer resolves");
        }
        Ok(marker)
    }

    /// Flag `text` as `excess` characters over its limit.
    ///
    /// Reuses the linked marker when it still exists, otherwise creates one
    /// on top of the current page. Either way the marker is renamed, laid
    /// over the layer's current bounds, and restyled.
    #[tracing::instrument(level = "debug", skip_all, fields(text = %text))]
    pub fn flag<H: Host + ?Sized>(
        &self,
        host: &mut H,
        text: &NodeId,
        excess: usize,
    ) -> HostResult<MarkerChange> {
        let change = match self.resolve(host, text)? {
            Some(marker) => MarkerChange::Reused(marker),
            None => {
                let marker = host.create_rectangle()?;
                host.append_to_page(&marker)?;
                MarkerChange::Created(marker)
            }
        };
        let marker = change.marker();

        host.set_name(marker, &format!("{}{excess}", self.style.name_prefix))?;
        let bounds = host.absolute_bounds(text)?;
        host.move_to(marker, bounds.x, bounds.y)?;
        host.resize(marker, bounds.width, bounds.height)?;

        // `fills` hands back an owned copy; edit it and write it back whole.
        let mut fills = host.fills(marker)?;
        match fills.first_mut() {
            Some(first) => first.color = self.style.color,
            None => fills.push(Paint::solid(self.style.color)),
        }
        host.set_fills(marker, fills)?;
        host.set_opacity(marker, self.style.opacity)?;

        host.set_plugin_data(text, &self.style.data_key, marker.as_str())?;
        tracing::debug!(marker = %marker, excess, "layer flagged");
        Ok(change)
    }

    /// Remove the marker linked from `text`, if any, and clear the link.
    ///
    /// Returns `true` when a live marker was deleted. Safe to call on a layer
    /// that was never flagged.
    #[tracing::instrument(level = "debug", skip_all, fields(text = %text))]
    pub fn unflag<H: Host + ?Sized>(&self, host: &mut H, text: &NodeId) -> HostResult<bool> {
        let removed = match self.resolve(host, text)? {
            Some(marker) => {
                host.remove(&marker)?;
                tracing::debug!(marker = %marker, "marker removed");
                true
            }
            None => false,
        };
        host.set_plugin_data(text, &self.style.data_key, "")?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Bounds, DocumentTree, Rgb};
    use crate::memory::MemoryDocument;

    fn doc_with_text() -> (MemoryDocument, NodeId) {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let frame = doc.add_frame(&page, "Card", Bounds::new(40.0, 60.0, 300.0, 200.0));
        let text = doc.add_text(
            &frame,
            "Title [CC:10]",
            "Hello World!",
            Bounds::new(8.0, 12.0, 120.0, 24.0),
        );
        (doc, text)
    }

    #[test]
    fn flag_creates_marker_over_text() {
        let (mut doc, text) = doc_with_text();
        let style = FlagStyle::default();
        let registry = FlagRegistry::new(&style);

        let change = registry.flag(&mut doc, &text, 2).unwrap();

        let MarkerChange::Created(marker) = change else {
            panic!("expected a new marker, got {change:?}");
        };
        let node = doc.node(&marker).unwrap();
        assert_eq!(node.name, "FLAGGED: Character count exceeded by 2");
        assert_eq!(doc.absolute_bounds(&marker).unwrap(), Bounds::new(48.0, 72.0, 120.0, 24.0));
        assert_eq!(node.fills[0].color, Rgb::new(1.0, 0.286, 0.286));
        assert!((node.opacity - 0.4).abs() < f64::EPSILON);
        assert_eq!(doc.plugin_data(&text, "FLAG_ID").unwrap(), marker.as_str());
        assert_eq!(doc.markers(&style.name_prefix), vec![marker]);
    }

    #[test]
    fn flag_reuses_live_marker() {
        let (mut doc, text) = doc_with_text();
        let style = FlagStyle::default();
        let registry = FlagRegistry::new(&style);
        let first = registry.flag(&mut doc, &text, 2).unwrap();

        let second = registry.flag(&mut doc, &text, 5).unwrap();

        assert_eq!(second, MarkerChange::Reused(first.marker().clone()));
        assert_eq!(
            doc.node(first.marker()).unwrap().name,
            "FLAGGED: Character count exceeded by 5"
        );
        assert_eq!(doc.markers(&style.name_prefix).len(), 1);
    }

    #[test]
    fn flag_replaces_externally_deleted_marker() {
        let (mut doc, text) = doc_with_text();
        let style = FlagStyle::default();
        let registry = FlagRegistry::new(&style);
        let first = registry.flag(&mut doc, &text, 2).unwrap();
        doc.remove(first.marker()).unwrap();

        let second = registry.flag(&mut doc, &text, 2).unwrap();

        assert!(matches!(second, MarkerChange::Created(ref id) if id != first.marker()));
        assert_eq!(doc.plugin_data(&text, "FLAG_ID").unwrap(), second.marker().as_str());
    }

    #[test]
    fn flag_keeps_other_paints_and_fills_empty_lists() {
        let (mut doc, text) = doc_with_text();
        let style = FlagStyle::default();
        let registry = FlagRegistry::new(&style);
        let marker = registry.flag(&mut doc, &text, 1).unwrap().marker().clone();
        let extra = Paint::solid(Rgb::new(0.0, 0.0, 1.0));
        doc.set_fills(&marker, vec![Paint::solid(Rgb::default()), extra.clone()]).unwrap();

        registry.flag(&mut doc, &text, 1).unwrap();
        assert_eq!(doc.fills(&marker).unwrap()[1], extra);

        doc.set_fills(&marker, Vec::new()).unwrap();
        registry.flag(&mut doc, &text, 1).unwrap();
        assert_eq!(doc.fills(&marker).unwrap(), vec![Paint::solid(style.color)]);
    }

    #[test]
    fn unflag_removes_marker_and_clears_link() {
        let (mut doc, text) = doc_with_text();
        let style = FlagStyle::default();
        let registry = FlagRegistry::new(&style);
        let marker = registry.flag(&mut doc, &text, 2).unwrap().marker().clone();

        assert!(registry.unflag(&mut doc, &text).unwrap());

        assert!(doc.node(&marker).is_none());
        assert_eq!(doc.plugin_data(&text, "FLAG_ID").unwrap(), "");
        assert_eq!(registry.resolve(&doc, &text).unwrap(), None);
    }

    #[test]
    fn unflag_is_idempotent() {
        let (mut doc, text) = doc_with_text();
        let style = FlagStyle::default();
        let registry = FlagRegistry::new(&style);

        assert!(!registry.unflag(&mut doc, &text).unwrap());
        assert!(!registry.unflag(&mut doc, &text).unwrap());
        assert_eq!(doc.plugin_data(&text, "FLAG_ID").unwrap(), "");
    }

    #[test]
    fn stale_reference_resolves_to_none() {
        let (mut doc, text) = doc_with_text();
        doc.set_plugin_data(&text, "FLAG_ID", "9:999").unwrap();
        let style = FlagStyle::default();

        assert_eq!(FlagRegistry::new(&style).resolve(&doc, &text).unwrap(), None);
    }

    #[test]
    fn host_failure_propagates() {
        let (mut doc, text) = doc_with_text();
        doc.make_read_only(&text);
        let style = FlagStyle::default();

        assert!(FlagRegistry::new(&style).flag(&mut doc, &text, 2).is_err());
    }
}
