//! The script registry.
//!
//! Scripts are kept per type in a list of fixed-capacity extents. New
//! scripts are appended to the tail extent; removal moves the tail's last
//! script into the hole, so enumeration order is creation order until the
//! first removal and unspecified after it.
//!
//! The registry also owns the map's [`LocalVars`] and the [`ScriptCatalog`]
//! that sizes each script's window.

use mapscript_foundation::sid::INDEX_MASK;
use mapscript_foundation::{Error, ErrorKind, ObjectHandle, Result, ScriptId, ScriptType};

use crate::catalog::ScriptCatalog;
use crate::local_vars::LocalVars;
use crate::script::{Script, ScriptFlags};

/// Scripts per extent.
pub const EXTENT_SIZE: usize = 16;

/// Ids are probed for collisions only below this index.
const PROBE_LIMIT: i32 = 32_000;

// =============================================================================
// Extents
// =============================================================================

/// A fixed-capacity block of scripts.
#[derive(Debug, Default)]
pub struct Extent {
    scripts: Vec<Script>,
}

impl Extent {
    fn new() -> Self {
        Self {
            scripts: Vec::with_capacity(EXTENT_SIZE),
        }
    }

    /// Builds an extent from loaded scripts.
    ///
    /// # Errors
    ///
    /// Returns an internal error if more than [`EXTENT_SIZE`] scripts are given.
    pub fn from_scripts(scripts: Vec<Script>) -> Result<Self> {
        if scripts.len() > EXTENT_SIZE {
            return Err(Error::new(ErrorKind::Internal(format!(
                "extent holds {EXTENT_SIZE} scripts, got {}",
                scripts.len()
            ))));
        }
        let mut extent = Self::new();
        extent.scripts.extend(scripts);
        Ok(extent)
    }

    /// The scripts in slot order.
    #[must_use]
    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// True if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    fn is_full(&self) -> bool {
        self.scripts.len() >= EXTENT_SIZE
    }
}

#[derive(Debug, Default)]
struct ScriptList {
    extents: Vec<Extent>,
    next_index: i32,
}

impl ScriptList {
    fn position(&self, sid: ScriptId) -> Option<(usize, usize)> {
        self.extents.iter().enumerate().find_map(|(e, extent)| {
            extent
                .scripts
                .iter()
                .position(|s| s.sid() == sid)
                .map(|slot| (e, slot))
        })
    }

    fn len(&self) -> usize {
        self.extents.iter().map(Extent::len).sum()
    }

    fn iter(&self) -> impl Iterator<Item = &Script> {
        self.extents.iter().flat_map(|e| e.scripts.iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Script> {
        self.extents.iter_mut().flat_map(|e| e.scripts.iter_mut())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// All scripts on the current map.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    lists: [ScriptList; ScriptType::COUNT],
    local_vars: LocalVars,
    catalog: ScriptCatalog,
}

impl ScriptRegistry {
    /// Creates an empty registry with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: ScriptCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// The catalog.
    #[must_use]
    pub fn catalog(&self) -> &ScriptCatalog {
        &self.catalog
    }

    /// Replaces the catalog.
    pub fn set_catalog(&mut self, catalog: ScriptCatalog) {
        self.catalog = catalog;
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Adds a script of the given type and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `AllocationExhausted` once the type's index space is used up.
    pub fn add(&mut self, script_type: ScriptType) -> Result<ScriptId> {
        let list = &mut self.lists[script_type.index()];
        let mut index = list.next_index;
        list.next_index = list.next_index.saturating_add(1);
        while index < PROBE_LIMIT && list.position(ScriptId::new(script_type, index)).is_some() {
            index += 1;
        }
        if index > INDEX_MASK {
            return Err(Error::allocation_exhausted(format!(
                "{} script ids",
                script_type.name()
            )));
        }

        let sid = ScriptId::new(script_type, index);
        if list.extents.last().is_none_or(Extent::is_full) {
            list.extents
                .try_reserve(1)
                .map_err(|e| Error::allocation_exhausted(format!("script extents: {e}")))?;
            list.extents.push(Extent::new());
        }
        if let Some(tail) = list.extents.last_mut() {
            tail.scripts.push(Script::new(sid));
        }
        log::trace!("added script {sid:?}");
        Ok(sid)
    }

    /// Removes a script, returning it.
    ///
    /// Releases the script's local variable window and moves the tail's last
    /// script into the freed slot.
    ///
    /// # Errors
    ///
    /// Returns `ScriptNotFound` for stale or invalid ids.
    pub fn remove(&mut self, sid: ScriptId) -> Result<Script> {
        let script_type = sid
            .script_type()
            .ok_or_else(|| Error::script_not_found(sid))?;
        let list = &mut self.lists[script_type.index()];
        let (e, slot) = list.position(sid).ok_or_else(|| Error::script_not_found(sid))?;

        let tail = list.extents.len() - 1;
        let Some(last) = list.extents[tail].scripts.pop() else {
            return Err(Error::new(ErrorKind::Internal("empty tail extent".to_string())));
        };
        let removed = if e == tail && slot == list.extents[tail].scripts.len() {
            last
        } else {
            std::mem::replace(&mut list.extents[e].scripts[slot], last)
        };
        if list.extents[tail].scripts.is_empty() {
            list.extents.pop();
        }

        self.release_local_vars(&removed);
        log::trace!("removed script {sid:?}");
        Ok(removed)
    }

    /// Removes every script not flagged [`ScriptFlags::PERSISTENT`].
    ///
    /// Returns the removed scripts.
    pub fn remove_all(&mut self) -> Vec<Script> {
        let doomed: Vec<ScriptId> = self
            .iter_all()
            .filter(|s| !s.flags.contains(ScriptFlags::PERSISTENT))
            .map(Script::sid)
            .collect();
        doomed
            .into_iter()
            .filter_map(|sid| self.remove(sid).ok())
            .collect()
    }

    /// Removes everything, including persistent scripts and local variables.
    pub fn clear(&mut self) {
        for list in &mut self.lists {
            *list = ScriptList::default();
        }
        self.local_vars.clear();
    }

    fn release_local_vars(&mut self, removed: &Script) {
        let count = removed.local_vars_count;
        let offset = removed.local_vars_offset;
        if count <= 0 || offset < 0 {
            return;
        }
        let (Ok(start), Ok(width)) = (usize::try_from(offset), usize::try_from(count)) else {
            return;
        };
        if !self.local_vars.release(start, width) {
            log::warn!(
                "script {:?}: local variable window {offset}+{count} outside array",
                removed.sid()
            );
            return;
        }
        for script in self.lists.iter_mut().flat_map(ScriptList::iter_mut) {
            if script.local_vars_offset > offset {
                script.local_vars_offset -= count;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Looks up a script.
    ///
    /// # Errors
    ///
    /// Returns `ScriptNotFound` for stale or invalid ids.
    pub fn get(&self, sid: ScriptId) -> Result<&Script> {
        let list = self.list(sid)?;
        list.position(sid)
            .map(|(e, slot)| &list.extents[e].scripts[slot])
            .ok_or_else(|| Error::script_not_found(sid))
    }

    /// Looks up a script mutably.
    ///
    /// # Errors
    ///
    /// Returns `ScriptNotFound` for stale or invalid ids.
    pub fn get_mut(&mut self, sid: ScriptId) -> Result<&mut Script> {
        Self::find_mut(&mut self.lists, sid)
    }

    fn find_mut(lists: &mut [ScriptList], sid: ScriptId) -> Result<&mut Script> {
        let script_type = sid
            .script_type()
            .ok_or_else(|| Error::script_not_found(sid))?;
        let list = &mut lists[script_type.index()];
        let (e, slot) = list.position(sid).ok_or_else(|| Error::script_not_found(sid))?;
        Ok(&mut list.extents[e].scripts[slot])
    }

    fn list(&self, sid: ScriptId) -> Result<&ScriptList> {
        sid.script_type()
            .map(|t| &self.lists[t.index()])
            .ok_or_else(|| Error::script_not_found(sid))
    }

    /// True if the id refers to a live script.
    #[must_use]
    pub fn contains(&self, sid: ScriptId) -> bool {
        self.get(sid).is_ok()
    }

    /// Number of scripts of a type.
    #[must_use]
    pub fn count(&self, script_type: ScriptType) -> usize {
        self.lists[script_type.index()].len()
    }

    /// Number of scripts of every type.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.iter().map(ScriptList::len).sum()
    }

    /// True if there are no scripts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scripts of one type in enumeration order.
    pub fn iter(&self, script_type: ScriptType) -> impl Iterator<Item = &Script> {
        self.lists[script_type.index()].iter()
    }

    /// Scripts of one type, mutably.
    pub fn iter_mut(&mut self, script_type: ScriptType) -> impl Iterator<Item = &mut Script> {
        self.lists[script_type.index()].iter_mut()
    }

    /// Scripts of every type, system first.
    pub fn iter_all(&self) -> impl Iterator<Item = &Script> {
        self.lists.iter().flat_map(ScriptList::iter)
    }

    /// Scripts of every type, mutably.
    pub fn iter_all_mut(&mut self) -> impl Iterator<Item = &mut Script> {
        self.lists.iter_mut().flat_map(ScriptList::iter_mut)
    }

    /// Ids of every script, for iterating while scripts run.
    #[must_use]
    pub fn all_sids(&self) -> Vec<ScriptId> {
        self.iter_all().map(Script::sid).collect()
    }

    /// The script at an enumeration position within a type.
    #[must_use]
    pub fn nth(&self, script_type: ScriptType, position: usize) -> Option<&Script> {
        let extent = self.lists[script_type.index()]
            .extents
            .get(position / EXTENT_SIZE)?;
        extent.scripts.get(position % EXTENT_SIZE)
    }

    /// Walks the spatial scripts whose trigger area is on `elevation`,
    /// skipping dormant ones.
    pub fn spatials_at(&self, elevation: i32) -> impl Iterator<Item = &Script> {
        self.iter(ScriptType::Spatial).filter(move |s| {
            !s.flags.contains(ScriptFlags::DORMANT)
                && s.built_tile().is_some_and(|t| t.elevation() == elevation)
        })
    }

    /// The extents of one type, for persistence.
    #[must_use]
    pub fn extents(&self, script_type: ScriptType) -> &[Extent] {
        &self.lists[script_type.index()].extents
    }

    /// Replaces one type's scripts with loaded extents.
    ///
    /// The id counter resumes after the highest loaded index.
    pub fn restore_extents(&mut self, script_type: ScriptType, extents: Vec<Extent>) {
        let next_index = extents
            .iter()
            .flat_map(|e| e.scripts.iter())
            .map(|s| s.sid().index() + 1)
            .max()
            .unwrap_or(0);
        self.lists[script_type.index()] = ScriptList {
            extents: extents.into_iter().filter(|e| !e.is_empty()).collect(),
            next_index,
        };
    }

    // -------------------------------------------------------------------------
    // Owners
    // -------------------------------------------------------------------------

    /// Binds a script to its owning object.
    ///
    /// # Errors
    ///
    /// Returns `ScriptNotFound` for stale or invalid ids.
    pub fn bind_owner(&mut self, sid: ScriptId, owner: ObjectHandle, object_id: i32) -> Result<()> {
        let script = self.get_mut(sid)?;
        script.owner = Some(owner);
        script.owner_id = object_id;
        Ok(())
    }

    /// Re-resolves every script's owner from its persistent object id.
    pub fn rebind_owners(&mut self, mut resolve: impl FnMut(i32) -> Option<ObjectHandle>) {
        for script in self.iter_all_mut() {
            script.owner = if script.owner_id == -1 {
                None
            } else {
                resolve(script.owner_id)
            };
        }
    }

    /// Clears source and target bindings that point at `object`.
    pub fn unbind_object(&mut self, object: ObjectHandle) {
        for script in self.iter_all_mut() {
            if script.source == Some(object) {
                script.source = None;
            }
            if script.target == Some(object) {
                script.target = None;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Local variables
    // -------------------------------------------------------------------------

    /// The map's local variable array.
    #[must_use]
    pub fn local_vars(&self) -> &LocalVars {
        &self.local_vars
    }

    /// Replaces the local variable array, e.g. after loading a map.
    pub fn set_local_vars(&mut self, local_vars: LocalVars) {
        self.local_vars = local_vars;
    }

    /// Reads a script's local variable.
    ///
    /// # Errors
    ///
    /// Fails for system scripts, unknown ids, and indexes outside the window.
    pub fn get_local_var(&mut self, sid: ScriptId, index: i32) -> Result<i32> {
        let slot = self.local_slot(sid, index)?;
        self.local_vars
            .get(slot)
            .ok_or_else(|| Error::new(ErrorKind::Internal(format!("local slot {slot} missing"))))
    }

    /// Writes a script's local variable.
    ///
    /// # Errors
    ///
    /// Fails for system scripts, unknown ids, and indexes outside the window.
    pub fn set_local_var(&mut self, sid: ScriptId, index: i32, value: i32) -> Result<()> {
        let slot = self.local_slot(sid, index)?;
        if self.local_vars.set(slot, value) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Internal(format!(
                "local slot {slot} missing"
            ))))
        }
    }

    /// Resolves a variable to an array slot, sizing and allocating the
    /// script's window on first use.
    fn local_slot(&mut self, sid: ScriptId, index: i32) -> Result<usize> {
        if sid.script_type() == Some(ScriptType::System) {
            return Err(Error::new(ErrorKind::InvalidScript {
                sid,
                message: "system scripts have no local variables".to_string(),
            }));
        }
        let script = Self::find_mut(&mut self.lists, sid)?;
        if script.local_vars_count == 0 {
            script.local_vars_count = self.catalog.local_vars(script.script_index);
        }
        let count = script.local_vars_count;
        if index < 0 || index >= count {
            return Err(Error::new(ErrorKind::LocalVarOutOfRange { sid, index, count }));
        }
        if script.local_vars_offset == -1 {
            let width = usize::try_from(count).unwrap_or(0);
            let offset = self.local_vars.allocate(width)?;
            script.local_vars_offset = i32::try_from(offset)
                .map_err(|_| Error::allocation_exhausted("local variable offsets"))?;
        }
        let offset = usize::try_from(script.local_vars_offset).unwrap_or(0);
        Ok(offset + usize::try_from(index).unwrap_or(0))
    }
}
