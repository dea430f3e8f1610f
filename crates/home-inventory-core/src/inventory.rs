//! In-memory inventory list fed by scanned barcodes.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_ITEM_NAME: &str = "name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub barcode: String,
    pub date_added: DateTime<Utc>,
    pub order: usize,
}

impl Item {
    pub fn new(name: impl Into<String>, barcode: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            barcode: barcode.into(),
            date_added: Utc::now(),
            order: 0,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inventory seeded with three demonstration items.
    pub fn with_demo_items() -> Self {
        let mut inventory = Self::new();
        for (name, barcode) in [
            ("iMac M1", "1234567890123"),
            ("iPhone 16", "9876543210987"),
            ("", "5555555555555"),
        ] {
            inventory.push(Item::new(name, barcode));
        }
        inventory
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn find_by_barcode(&self, barcode: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.barcode == barcode)
    }

    /// Append an item for `barcode`. Returns `None` if the barcode is
    /// already in the list.
    pub fn add_item(&mut self, barcode: &str) -> Option<&Item> {
        if self.find_by_barcode(barcode).is_some() {
            debug!("Barcode {} already in inventory", barcode);
            return None;
        }
        self.push(Item::new(DEFAULT_ITEM_NAME, barcode));
        self.items.last()
    }

    pub fn rename(&mut self, id: Uuid, name: &str) -> Result<(), Error> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(Error::ItemNotFound(id))?;
        item.name = name.to_string();
        Ok(())
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Item, Error> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(Error::ItemNotFound(id))?;
        let item = self.items.remove(index);
        self.renumber();
        Ok(item)
    }

    /// Remove the items at `indices` (list positions, any order). Out of
    /// range positions are ignored. Returns how many were removed.
    pub fn remove_at(&mut self, indices: &[usize]) -> usize {
        let mut sorted: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|i| *i < self.items.len())
            .collect();
        sorted.sort_unstable();
        sorted.dedup();

        for index in sorted.iter().rev() {
            self.items.remove(*index);
        }
        self.renumber();
        sorted.len()
    }

    /// Move the item at `from` so it ends up at position `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.renumber();
        true
    }

    fn push(&mut self, mut item: Item) {
        item.order = self.items.len();
        self.items.push(item);
    }

    fn renumber(&mut self) {
        for (order, item) in self.items.iter_mut().enumerate() {
            item.order = order;
        }
    }
}
