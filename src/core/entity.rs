//! Record trait - common interface for stored entity types

use serde::{de::DeserializeOwned, Serialize};

/// Common trait for records kept in a project collection
pub trait Record: Serialize + DeserializeOwned {
    /// Human-readable kind, used in messages ("story", "epic", ...)
    const KIND: &'static str;

    /// The record's unique id within its collection
    fn id(&self) -> &str;

    /// Short one-line label for lists and dangling-reference messages
    fn label(&self) -> String;
}

/// Find a record by exact id
pub fn find<'a, T: Record>(records: &'a [T], id: &str) -> Option<&'a T> {
    records.iter().find(|r| r.id() == id)
}

/// Find a record by exact id, mutably
pub fn find_mut<'a, T: Record>(records: &'a mut [T], id: &str) -> Option<&'a mut T> {
    records.iter_mut().find(|r| r.id() == id)
}

/// Remove a record by id, returning it if it existed
pub fn remove<T: Record>(records: &mut Vec<T>, id: &str) -> Option<T> {
    let pos = records.iter().position(|r| r.id() == id)?;
    Some(records.remove(pos))
}
