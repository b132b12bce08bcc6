//! Good interning.
//!
//! Goods are named once at configuration time and handed out as `GoodId`
//! handles. Asking for the same name twice yields the same handle, so catalogs
//! can key on `GoodId` equality alone.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::error::{EconError, Result};
use crate::types::GoodId;

#[derive(Debug, Clone, Default)]
pub struct GoodRegistry {
    names: SlotMap<GoodId, String>,
    by_name: HashMap<String, GoodId>,
}

impl GoodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the given names, in order.
    pub fn with_goods<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.intern(name);
        }
        registry
    }

    /// Return the handle for `name`, registering it on first use.
    pub fn intern(&mut self, name: impl Into<String>) -> GoodId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = self.names.insert(name.clone());
        self.by_name.insert(name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Result<GoodId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| EconError::UnknownGood(name.to_string()))
    }

    /// Display name of a good; `"?"` for a handle from another registry.
    pub fn name(&self, id: GoodId) -> &str {
        self.names.get(id).map(String::as_str).unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All goods in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (GoodId, &str)> {
        self.names.iter().map(|(id, name)| (id, name.as_str()))
    }
}
