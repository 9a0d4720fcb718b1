use std::fmt;

use tracing::{debug, info, warn};

use super::process::{ChildRole, SpawnError, Spawner};
use super::tree::{ProcessTree, RowHandle};

/// Grandchildren a slot may carry at once.
pub const MAX_GRANDCHILDREN: usize = 1;

#[derive(Debug, Clone, Default)]
pub struct Slot {
    pub pid: Option<u32>,         // set while the slot is occupied
    pub row: Option<RowHandle>,   // this slot's row in the tree
    pub has_grandchild: bool,
}

impl Slot {
    pub fn is_occupied(&self) -> bool {
        self.pid.is_some()
    }
}

/// What a registry call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SlotSpawned { index: usize, pid: u32 },
    GrandchildSpawned { index: usize, pid: u32 },
    SlotTerminated { index: usize, pid: u32 },
    TerminationRefused { index: usize },
    NothingToTerminate { index: usize },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SlotSpawned { index, pid } => {
                write!(f, "Main Child {} started (PID: {})", index + 1, pid)
            }
            Action::GrandchildSpawned { index, pid } => {
                write!(f, "Child of Main Child {} started (PID: {})", index + 1, pid)
            }
            Action::SlotTerminated { index, pid } => {
                write!(f, "Child process {} (PID: {}) terminated", index + 1, pid)
            }
            Action::TerminationRefused { index } => {
                write!(f, "Main Child process {} has children, cannot terminate", index + 1)
            }
            Action::NothingToTerminate { index } => {
                write!(f, "No child process to terminate for button {}", index + 1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    UnknownSlot(usize),
    SpawningDisabled,
    SlotOccupied(usize),
    SlotEmpty(usize),
    GrandchildLimit(usize),
    Spawn(SpawnError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownSlot(index) => write!(f, "no slot {}", index + 1),
            RegistryError::SpawningDisabled => {
                write!(f, "all slots were filled, spawning is disabled")
            }
            RegistryError::SlotOccupied(index) => write!(f, "slot {} is already occupied", index + 1),
            RegistryError::SlotEmpty(index) => write!(f, "slot {} has no process", index + 1),
            RegistryError::GrandchildLimit(index) => {
                write!(f, "Main Child {} already has a child", index + 1)
            }
            RegistryError::Spawn(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SpawnError> for RegistryError {
    fn from(err: SpawnError) -> Self {
        RegistryError::Spawn(err)
    }
}

/// Fixed table of slot processes plus the tree that mirrors it.
pub struct ProcessRegistry {
    slots: Vec<Slot>,
    tree: ProcessTree,
    parent_row: RowHandle,
    spawning_disabled: bool,
    spawner: Box<dyn Spawner>,
}

impl ProcessRegistry {
    pub fn new(slot_count: usize, parent_pid: u32, spawner: Box<dyn Spawner>) -> Self {
        let mut tree = ProcessTree::new();
        let parent_row = tree.add_root(format!("Parent (PID: {})", parent_pid));

        Self {
            slots: vec![Slot::default(); slot_count],
            tree,
            parent_row,
            spawning_disabled: false,
            spawner,
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn tree(&self) -> &ProcessTree {
        &self.tree
    }

    pub fn parent_row(&self) -> RowHandle {
        self.parent_row
    }

    /// True once every slot has been occupied at the same time. Never resets.
    pub fn spawning_disabled(&self) -> bool {
        self.spawning_disabled
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_occupied()).count()
    }

    /// The "Create Child" button: fills an empty slot, otherwise spawns its grandchild.
    pub fn on_primary_action(&mut self, index: usize) -> Result<Action, RegistryError> {
        let slot = self.slots.get(index).ok_or(RegistryError::UnknownSlot(index))?;
        if slot.is_occupied() {
            self.spawn_grandchild(index)
        } else {
            self.spawn_slot(index)
        }
    }

    pub fn spawn_slot(&mut self, index: usize) -> Result<Action, RegistryError> {
        self.ensure_spawning_enabled()?;
        let slot = self.slots.get(index).ok_or(RegistryError::UnknownSlot(index))?;
        if slot.is_occupied() {
            return Err(RegistryError::SlotOccupied(index));
        }

        let role = ChildRole::MainChild { slot: index };
        let pid = self.spawner.spawn(role)?;
        let row = self.tree.add_root(role.row_label(pid));

        let slot = &mut self.slots[index];
        slot.pid = Some(pid);
        slot.row = Some(row);
        slot.has_grandchild = false;
        info!(slot = index + 1, pid, "main child created");

        if self.occupied_count() == self.slots.len() && !self.spawning_disabled {
            self.spawning_disabled = true;
            info!(slots = self.slots.len(), "all slots occupied, spawning disabled");
        }

        Ok(Action::SlotSpawned { index, pid })
    }

    pub fn spawn_grandchild(&mut self, index: usize) -> Result<Action, RegistryError> {
        self.ensure_spawning_enabled()?;
        let slot = self.slots.get(index).ok_or(RegistryError::UnknownSlot(index))?;
        let row = match (slot.pid, slot.row) {
            (Some(_), Some(row)) => row,
            _ => return Err(RegistryError::SlotEmpty(index)),
        };
        if slot.has_grandchild || self.tree.child_count(row) >= MAX_GRANDCHILDREN {
            return Err(RegistryError::GrandchildLimit(index));
        }

        let role = ChildRole::Grandchild { slot: index };
        let pid = self.spawner.spawn(role)?;
        if self.tree.add_child(row, role.row_label(pid)).is_none() {
            warn!(slot = index + 1, "slot row missing from tree");
        }
        self.slots[index].has_grandchild = true;
        info!(slot = index + 1, pid, "grandchild created");

        Ok(Action::GrandchildSpawned { index, pid })
    }

    /// Stops a childless slot process. Refusals and empty slots are reported, not errors.
    pub fn terminate_slot(&mut self, index: usize) -> Result<Action, RegistryError> {
        let slot = self.slots.get(index).ok_or(RegistryError::UnknownSlot(index))?;
        let pid = match slot.pid {
            Some(pid) => pid,
            None => {
                info!(slot = index + 1, "no child process to terminate");
                return Ok(Action::NothingToTerminate { index });
            }
        };

        let row_children = slot.row.map_or(0, |row| self.tree.child_count(row));
        debug_assert_eq!(slot.has_grandchild, row_children > 0);
        if slot.has_grandchild {
            info!(slot = index + 1, "main child has children, cannot terminate");
            return Ok(Action::TerminationRefused { index });
        }

        if let Err(err) = self.spawner.terminate(pid) {
            warn!(slot = index + 1, pid, error = %err, "termination signal failed");
        }

        let slot = &mut self.slots[index];
        let row = slot.row.take();
        slot.pid = None;
        slot.has_grandchild = false;
        if let Some(row) = row {
            self.tree.remove(row);
        }
        info!(slot = index + 1, pid, "child process terminated");

        Ok(Action::SlotTerminated { index, pid })
    }

    fn ensure_spawning_enabled(&self) -> Result<(), RegistryError> {
        if self.spawning_disabled {
            debug!("spawn rejected, latch engaged");
            return Err(RegistryError::SpawningDisabled);
        }
        Ok(())
    }
}
