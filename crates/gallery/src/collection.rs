//! Observable image collection

use crate::decode::DecodedImage;
use crate::placement::Placement;
use crate::ImageId;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Entries shown by the debug listing before it is elided
const DEBUG_LISTING_LIMIT: usize = 3;

/// One image on the table
#[derive(Debug, Clone)]
pub struct ImageRecord {
    id: ImageId,
    path: PathBuf,
    bitmap: Arc<DecodedImage>,
    pub visible: bool,
    /// Degrees clockwise about the anchor
    pub rotation: f32,
    /// Anchor (top-left of the unrotated image), logical units
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl ImageRecord {
    pub fn new(path: impl Into<PathBuf>, bitmap: Arc<DecodedImage>, scale: f32) -> Self {
        Self {
            id: ImageId::new(),
            path: path.into(),
            bitmap,
            visible: true,
            rotation: 0.0,
            x: 0.0,
            y: 0.0,
            scale,
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bitmap(&self) -> &Arc<DecodedImage> {
        &self.bitmap
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Size on the overlay before rotation
    pub fn scaled_size(&self) -> (f32, f32) {
        (
            self.bitmap.width as f32 * self.scale,
            self.bitmap.height as f32 * self.scale,
        )
    }

    pub fn apply(&mut self, placement: &Placement) {
        self.scale = placement.scale;
        self.rotation = placement.rotation;
        self.x = placement.x;
        self.y = placement.y;
    }
}

/// Change notification delivered to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEvent {
    Added(ImageId),
    Updated(ImageId),
    Removed(ImageId),
    Cleared,
}

pub type Observer = Box<dyn FnMut(&CollectionEvent)>;

/// Ordered image records; insertion order is drawing order.
///
/// Every mutation is reported synchronously to all observers.
#[derive(Default)]
pub struct ImageCollection {
    records: Vec<ImageRecord>,
    observers: Vec<Observer>,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    fn notify(&mut self, event: CollectionEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn push(&mut self, record: ImageRecord) -> ImageId {
        let id = record.id;
        tracing::debug!(%id, name = %record.file_name(), "image added");
        self.records.push(record);
        self.notify(CollectionEvent::Added(id));
        id
    }

    pub fn remove(&mut self, id: ImageId) -> Option<ImageRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let record = self.records.remove(index);
        self.notify(CollectionEvent::Removed(id));
        Some(record)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.notify(CollectionEvent::Cleared);
    }

    /// Mutate one record in place. Returns false for unknown ids.
    pub fn update(&mut self, id: ImageId, f: impl FnOnce(&mut ImageRecord)) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        f(record);
        self.notify(CollectionEvent::Updated(id));
        true
    }

    /// Show or hide every record. Returns how many changed.
    pub fn set_all_visible(&mut self, visible: bool) -> usize {
        let changed: Vec<ImageId> = self
            .records
            .iter_mut()
            .filter(|r| r.visible != visible)
            .map(|r| {
                r.visible = visible;
                r.id
            })
            .collect();

        for id in &changed {
            self.notify(CollectionEvent::Updated(*id));
        }
        changed.len()
    }

    /// Short textual summary for the overlay debug panel
    pub fn debug_listing(&self) -> String {
        if self.records.is_empty() {
            return "No images loaded".to_string();
        }

        let mut out = format!("Images: {}\n", self.records.len());
        for record in self.records.iter().take(DEBUG_LISTING_LIMIT) {
            out.push_str(&format!(
                "{}: X={:.1}, Y={:.1}, Visible={}\n",
                record.file_name(),
                record.x,
                record.y,
                record.visible
            ));
        }
        if self.records.len() > DEBUG_LISTING_LIMIT {
            out.push_str("...\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn bitmap(width: u32, height: u32) -> Arc<DecodedImage> {
        Arc::new(DecodedImage::from_rgba(width, height, vec![0; (width * height * 4) as usize]).unwrap())
    }

    fn record(name: &str) -> ImageRecord {
        ImageRecord::new(format!("/maps/{name}"), bitmap(4, 2), 1.0)
    }

    fn recording(collection: &mut ImageCollection) -> Rc<RefCell<Vec<CollectionEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        collection.subscribe(Box::new(move |e| sink.borrow_mut().push(*e)));
        events
    }

    #[test]
    fn mutations_notify_every_observer() {
        let mut collection = ImageCollection::new();
        let first = recording(&mut collection);
        let second = recording(&mut collection);

        let a = collection.push(record("a.png"));
        let b = collection.push(record("b.png"));
        assert!(collection.update(a, |r| r.visible = false));
        assert!(collection.remove(b).is_some());
        assert!(collection.remove(b).is_none());
        collection.clear();

        let expected = vec![
            CollectionEvent::Added(a),
            CollectionEvent::Added(b),
            CollectionEvent::Updated(a),
            CollectionEvent::Removed(b),
            CollectionEvent::Cleared,
        ];
        assert_eq!(*first.borrow(), expected);
        assert_eq!(*second.borrow(), expected);
        assert!(collection.is_empty());
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut collection = ImageCollection::new();
        let ids: Vec<_> = ["x.png", "y.png", "z.png"]
            .iter()
            .map(|n| collection.push(record(n)))
            .collect();
        assert_eq!(collection.iter().map(|r| r.id()).collect::<Vec<_>>(), ids);
        assert_eq!(collection.get(ids[1]).unwrap().file_name(), "y.png");
    }

    #[test]
    fn set_all_visible_reports_only_changes() {
        let mut collection = ImageCollection::new();
        let a = collection.push(record("a.png"));
        collection.push(record("b.png"));
        collection.update(a, |r| r.visible = false);
        let events = recording(&mut collection);

        assert_eq!(collection.set_all_visible(true), 1);
        assert_eq!(*events.borrow(), vec![CollectionEvent::Updated(a)]);
        assert_eq!(collection.set_all_visible(false), 2);
        assert!(collection.iter().all(|r| !r.visible));
    }

    #[test]
    fn debug_listing_shows_first_three() {
        let mut collection = ImageCollection::new();
        assert_eq!(collection.debug_listing(), "No images loaded");

        for (i, name) in ["a.png", "b.png", "c.png", "d.png"].iter().enumerate() {
            let id = collection.push(record(name));
            collection.update(id, |r| {
                r.x = i as f32 * 10.0;
                r.y = 5.0;
            });
        }

        let listing = collection.debug_listing();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "Images: 4");
        assert_eq!(lines[1], "a.png: X=0.0, Y=5.0, Visible=true");
        assert_eq!(lines[3], "c.png: X=20.0, Y=5.0, Visible=true");
        assert_eq!(lines[4], "...");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn apply_takes_placement() {
        let mut r = record("token.png");
        r.apply(&Placement {
            scale: 0.5,
            rotation: 185.0,
            x: 300.0,
            y: 200.0,
            margin: 25.0,
        });
        assert_eq!(r.scaled_size(), (2.0, 1.0));
        assert_eq!((r.x, r.y, r.rotation), (300.0, 200.0, 185.0));
    }
}
