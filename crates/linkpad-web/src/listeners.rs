#![forbid(unsafe_code)]

//! Listener bookkeeping for one gesture.
//!
//! The controller never touches DOM listeners itself. It emits
//! [`ListenerCommand`]s and records what it asked for in a [`ListenerSet`],
//! so every exit path can drain the set and each attached listener receives
//! exactly one `Detach`.

/// Host identifier of a scrollable ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u32);

/// A host event subscription owned by the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    /// `scroll` on an `overflow-y: auto` ancestor; cancels an armed gesture.
    ScrollCancel { container: ContainerId },
    /// `pointermove` while armed, for the slop check.
    ArmMove,
    /// `pointerup` while armed.
    ArmRelease,
    /// `pointermove` while dragging.
    DragMove,
    /// `pointerup` while dragging.
    DragRelease,
}

impl Listener {
    /// Listeners that only live during the armed phase.
    #[must_use]
    pub const fn is_armed_phase(self) -> bool {
        matches!(
            self,
            Self::ScrollCancel { .. } | Self::ArmMove | Self::ArmRelease
        )
    }
}

/// Instruction for the host's event wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerCommand {
    Attach(Listener),
    Detach(Listener),
}

/// Listeners currently attached, in attach order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerSet {
    attached: Vec<Listener>,
}

impl ListenerSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attached: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_attached(&self, listener: Listener) -> bool {
        self.attached.contains(&listener)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attached.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Listener> + '_ {
        self.attached.iter().copied()
    }

    /// Attach `listener` unless it already is. Returns whether a command was emitted.
    pub fn attach(&mut self, listener: Listener, commands: &mut Vec<ListenerCommand>) -> bool {
        if self.is_attached(listener) {
            return false;
        }
        self.attached.push(listener);
        commands.push(ListenerCommand::Attach(listener));
        true
    }

    /// Detach every listener matching `pred`, in attach order.
    pub fn detach_where(
        &mut self,
        mut pred: impl FnMut(Listener) -> bool,
        commands: &mut Vec<ListenerCommand>,
    ) {
        self.attached.retain(|&listener| {
            if pred(listener) {
                commands.push(ListenerCommand::Detach(listener));
                false
            } else {
                true
            }
        });
    }

    /// Detach everything.
    pub fn drain(&mut self, commands: &mut Vec<ListenerCommand>) {
        commands.extend(self.attached.drain(..).map(ListenerCommand::Detach));
    }
}
