#![forbid(unsafe_code)]

//! Deterministic palette drag-and-drop controller.
//!
//! Turns raw pointer, scroll, and timer signals into a pick-up gesture:
//! - `Idle → Armed` on pointer-down over a palette item,
//! - `Armed → Dragging` when the host-scheduled arm timer fires,
//! - `Armed → Idle` (canceled) on scroll, movement past the slop, or an
//!   early release,
//! - `Dragging → Idle` (committed) on release.
//!
//! The host owns clocks, timers, and DOM listeners. Every call takes an
//! explicit `now` and returns a [`PaletteDragDispatch`] describing what the
//! host should do: listener attach/detach commands, an arm timer to schedule,
//! and a new [`DragVisual`] snapshot. Sink callbacks are isolated: an `Err`
//! or a panic is recorded and logged, and teardown still completes.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use linkpad_core::{NodeKind, Point, Rect};

use crate::drag_visual::{DragPresenter, DragVisual, GHOST_OPAQUE, Ghost, Overlay, OverlayFade};
use crate::drop_target::{DragOverEvent, DropSink, DropSinkError, DropTargetCoordinator, HitTester};
use crate::listeners::{ContainerId, Listener, ListenerCommand, ListenerSet};

/// Arm delay for mouse-class pointers.
pub const DEFAULT_MOUSE_ARM_DELAY: Duration = Duration::ZERO;
/// Arm delay for touch and pen, long enough to tell a drag from a scroll.
pub const DEFAULT_TOUCH_ARM_DELAY: Duration = Duration::from_millis(300);
/// Movement, in CSS pixels on either axis, that cancels an armed gesture.
pub const DEFAULT_CANCEL_SLOP: f64 = 5.0;
/// Ghost opacity while over a drop target.
pub const DEFAULT_DIM_OPACITY: f32 = 0.5;

/// Controller configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteDragConfig {
    pub mouse_arm_delay: Duration,
    /// Used for every non-mouse pointer.
    pub touch_arm_delay: Duration,
    /// Chebyshev distance from the down position; exceeding it cancels.
    pub cancel_slop: f64,
    pub dim_opacity: f32,
    /// If false the pick-up overlay is never shown.
    pub has_visual_viewport: bool,
}

impl Default for PaletteDragConfig {
    fn default() -> Self {
        Self {
            mouse_arm_delay: DEFAULT_MOUSE_ARM_DELAY,
            touch_arm_delay: DEFAULT_TOUCH_ARM_DELAY,
            cancel_slop: DEFAULT_CANCEL_SLOP,
            dim_opacity: DEFAULT_DIM_OPACITY,
            has_visual_viewport: true,
        }
    }
}

impl PaletteDragConfig {
    /// Arm delay for a pointer of `kind`.
    #[must_use]
    pub const fn arm_delay(&self, kind: PointerKind) -> Duration {
        match kind {
            PointerKind::Mouse => self.mouse_arm_delay,
            PointerKind::Touch | PointerKind::Pen => self.touch_arm_delay,
        }
    }

    pub fn validate(&self) -> Result<(), PaletteDragConfigError> {
        if !(self.cancel_slop.is_finite() && self.cancel_slop > 0.0) {
            return Err(PaletteDragConfigError::InvalidCancelSlop {
                slop: self.cancel_slop,
            });
        }
        if !(0.0..=1.0).contains(&self.dim_opacity) {
            return Err(PaletteDragConfigError::DimOpacityOutOfRange {
                opacity: self.dim_opacity,
            });
        }
        Ok(())
    }
}

/// Rejected [`PaletteDragConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaletteDragConfigError {
    InvalidCancelSlop { slop: f64 },
    DimOpacityOutOfRange { opacity: f32 },
}

impl fmt::Display for PaletteDragConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCancelSlop { slop } => {
                write!(f, "cancel slop must be positive and finite, got {slop}")
            }
            Self::DimOpacityOutOfRange { opacity } => {
                write!(f, "dim opacity must be within 0..=1, got {opacity}")
            }
        }
    }
}

impl std::error::Error for PaletteDragConfigError {}

/// Input device class, from `PointerEvent.pointerType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// Effective `overflow-y` of an ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overflow {
    Visible,
    Hidden,
    Scroll,
    Auto,
}

/// An ancestor of the palette item, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollContainer {
    pub id: ContainerId,
    pub overflow_y: Overflow,
}

/// The draggable palette entry under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteItem {
    pub kind: NodeKind,
    /// Bounding rect in viewport coordinates.
    pub rect: Rect,
}

/// Generation id of one gesture. Events carrying an older token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureToken(u64);

impl GestureToken {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Ask the host to call [`PaletteDragController::arm_timer_fired`] after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmTimerRequest {
    pub token: GestureToken,
    pub delay: Duration,
    /// `now + delay` at pointer-down.
    pub deadline: Duration,
}

/// Coarse controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteDragState {
    Idle,
    Armed,
    Dragging,
}

/// Why an armed or dragging gesture ended without a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteDragCancelReason {
    Scroll { container: ContainerId },
    MovedBeyondSlop,
    ReleasedBeforeArm,
    PointerCancel,
}

/// What a dispatch did, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteDragEffect {
    Armed { token: GestureToken, kind: NodeKind },
    DragStarted { token: GestureToken, kind: NodeKind },
    Hovered { over_target: bool },
    Committed { kind: NodeKind, over_target: bool },
    Canceled { reason: PaletteDragCancelReason },
    OverlayRemoved,
}

/// Which host signal a dispatch answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteDragLifecyclePhase {
    PointerDown,
    ArmTimerFired,
    PointerMove,
    PointerUp,
    PointerCancel,
    Scroll,
    OverlayFadeFinished,
}

/// Deterministic reason an incoming signal was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteDragIgnoredReason {
    NoActiveGesture,
    GestureAlreadyActive,
    PointerMismatch,
    StaleToken,
    ArmDelayPending,
    /// Scroll from a container with no scroll-cancel listener attached.
    ListenerNotAttached,
    NoFadingOverlay,
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteDragLogOutcome {
    Transitioned,
    /// Accepted without a state change (armed move within slop).
    Tracked,
    Ignored(PaletteDragIgnoredReason),
}

/// Structured record of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteDragLogEntry {
    pub phase: PaletteDragLifecyclePhase,
    pub at: Duration,
    pub token: Option<GestureToken>,
    pub pointer_id: Option<u32>,
    pub position: Option<Point>,
    pub outcome: PaletteDragLogOutcome,
}

/// Sink callback that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCallback {
    Accepts,
    DragOver,
    DragLeave,
    Drop,
}

/// How a sink callback failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackFailureKind {
    Error(DropSinkError),
    Panicked(String),
}

/// A sink callback that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackFailure {
    pub callback: SinkCallback,
    pub kind: CallbackFailureKind,
}

/// Result of one controller call.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteDragDispatch {
    pub effect: Option<PaletteDragEffect>,
    pub listener_commands: Vec<ListenerCommand>,
    pub arm_timer: Option<ArmTimerRequest>,
    /// New visual state, only when it changed.
    pub visual: Option<DragVisual>,
    pub callback_failures: Vec<CallbackFailure>,
    pub log: PaletteDragLogEntry,
}

impl PaletteDragDispatch {
    /// Forward the visual snapshot, if any. Returns whether one was presented.
    pub fn present_to(&self, presenter: &mut impl DragPresenter) -> bool {
        match &self.visual {
            Some(visual) => {
                presenter.present(visual);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self.log.outcome, PaletteDragLogOutcome::Ignored(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArmedGesture {
    token: GestureToken,
    pointer_id: u32,
    item: PaletteItem,
    grab_offset: Point,
    down_position: Point,
    /// Latest position seen while armed; the ghost spawns here.
    last_position: Point,
    deadline: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DraggingGesture {
    token: GestureToken,
    pointer_id: u32,
    item: PaletteItem,
    grab_offset: Point,
    over_target: bool,
}

impl DraggingGesture {
    fn ghost_rect(&self, position: Point) -> Rect {
        self.item.rect.with_origin(position - self.grab_offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Armed(ArmedGesture),
    Dragging(DraggingGesture),
}

impl Gesture {
    const fn token(&self) -> Option<GestureToken> {
        match self {
            Self::Idle => None,
            Self::Armed(armed) => Some(armed.token),
            Self::Dragging(dragging) => Some(dragging.token),
        }
    }

    const fn pointer_id(&self) -> Option<u32> {
        match self {
            Self::Idle => None,
            Self::Armed(armed) => Some(armed.pointer_id),
            Self::Dragging(dragging) => Some(dragging.pointer_id),
        }
    }
}

/// Mutable parts of a dispatch while it is being built.
#[derive(Debug, Default)]
struct Pending {
    listener_commands: Vec<ListenerCommand>,
    arm_timer: Option<ArmTimerRequest>,
    callback_failures: Vec<CallbackFailure>,
}

#[derive(Debug, Clone, Copy)]
struct LogContext {
    phase: PaletteDragLifecyclePhase,
    at: Duration,
    token: Option<GestureToken>,
    pointer_id: Option<u32>,
    position: Option<Point>,
}

impl LogContext {
    fn ignored(self, reason: PaletteDragIgnoredReason) -> PaletteDragDispatch {
        tracing::trace!(phase = ?self.phase, ?reason, "palette drag signal ignored");
        PaletteDragDispatch {
            effect: None,
            listener_commands: Vec::new(),
            arm_timer: None,
            visual: None,
            callback_failures: Vec::new(),
            log: self.entry(PaletteDragLogOutcome::Ignored(reason)),
        }
    }

    const fn entry(self, outcome: PaletteDragLogOutcome) -> PaletteDragLogEntry {
        PaletteDragLogEntry {
            phase: self.phase,
            at: self.at,
            token: self.token,
            pointer_id: self.pointer_id,
            position: self.position,
            outcome,
        }
    }
}

/// Host-driven palette drag state machine.
#[derive(Debug, Clone)]
pub struct PaletteDragController<H> {
    config: PaletteDragConfig,
    coordinator: DropTargetCoordinator<H>,
    gesture: Gesture,
    listeners: ListenerSet,
    visual: DragVisual,
    next_token: u64,
}

impl<H: HitTester> PaletteDragController<H> {
    /// Construct a controller with a validated configuration.
    pub fn new(config: PaletteDragConfig, hit_tester: H) -> Result<Self, PaletteDragConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            coordinator: DropTargetCoordinator::new(hit_tester),
            gesture: Gesture::Idle,
            listeners: ListenerSet::new(),
            visual: DragVisual::EMPTY,
            next_token: 1,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PaletteDragConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> PaletteDragState {
        match self.gesture {
            Gesture::Idle => PaletteDragState::Idle,
            Gesture::Armed(_) => PaletteDragState::Armed,
            Gesture::Dragging(_) => PaletteDragState::Dragging,
        }
    }

    /// Token of the gesture in progress.
    #[must_use]
    pub const fn active_token(&self) -> Option<GestureToken> {
        self.gesture.token()
    }

    #[must_use]
    pub const fn active_pointer_id(&self) -> Option<u32> {
        self.gesture.pointer_id()
    }

    /// Current visual state (the last snapshot handed out).
    #[must_use]
    pub const fn visual(&self) -> &DragVisual {
        &self.visual
    }

    #[must_use]
    pub const fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    #[must_use]
    pub const fn coordinator(&self) -> &DropTargetCoordinator<H> {
        &self.coordinator
    }

    /// Hit tester access, e.g. to update regions after a layout change.
    pub fn hit_tester_mut(&mut self) -> &mut H {
        self.coordinator.hit_tester_mut()
    }

    /// Pointer pressed on a palette item.
    ///
    /// `scroll_ancestors` are the item's ancestors; each one whose effective
    /// `overflow-y` is `auto` gets a scroll-cancel listener.
    pub fn pointer_down(
        &mut self,
        item: PaletteItem,
        pointer_id: u32,
        pointer_kind: PointerKind,
        position: Point,
        scroll_ancestors: &[ScrollContainer],
        now: Duration,
    ) -> PaletteDragDispatch {
        let ctx = LogContext {
            phase: PaletteDragLifecyclePhase::PointerDown,
            at: now,
            token: self.gesture.token(),
            pointer_id: Some(pointer_id),
            position: Some(position),
        };
        if !matches!(self.gesture, Gesture::Idle) {
            return ctx.ignored(PaletteDragIgnoredReason::GestureAlreadyActive);
        }

        let before = self.visual;
        let token = self.mint_token();
        let delay = self.config.arm_delay(pointer_kind);
        let deadline = now.saturating_add(delay);
        let mut pending = Pending::default();

        for ancestor in scroll_ancestors {
            if ancestor.overflow_y == Overflow::Auto {
                self.listeners.attach(
                    Listener::ScrollCancel {
                        container: ancestor.id,
                    },
                    &mut pending.listener_commands,
                );
            }
        }
        self.listeners
            .attach(Listener::ArmMove, &mut pending.listener_commands);
        self.listeners
            .attach(Listener::ArmRelease, &mut pending.listener_commands);

        self.visual.overlay = self.config.has_visual_viewport.then_some(Overlay {
            mask: item.rect,
            fade: OverlayFade::In,
        });
        self.visual.ghost = None;

        pending.arm_timer = Some(ArmTimerRequest {
            token,
            delay,
            deadline,
        });
        self.gesture = Gesture::Armed(ArmedGesture {
            token,
            pointer_id,
            item,
            grab_offset: item.rect.offset_of(position),
            down_position: position,
            last_position: position,
            deadline,
        });

        tracing::debug!(
            token = token.get(),
            pointer_id,
            ?pointer_kind,
            kind = %item.kind,
            delay_ms = delay.as_millis() as u64,
            "palette drag armed"
        );
        self.transitioned(
            LogContext {
                token: Some(token),
                ..ctx
            },
            PaletteDragEffect::Armed {
                token,
                kind: item.kind,
            },
            pending,
            before,
        )
    }

    /// The arm timer requested by [`Self::pointer_down`] fired.
    pub fn arm_timer_fired(&mut self, token: GestureToken, now: Duration) -> PaletteDragDispatch {
        let ctx = LogContext {
            phase: PaletteDragLifecyclePhase::ArmTimerFired,
            at: now,
            token: Some(token),
            pointer_id: self.gesture.pointer_id(),
            position: None,
        };
        let Gesture::Armed(armed) = self.gesture else {
            return ctx.ignored(PaletteDragIgnoredReason::StaleToken);
        };
        if armed.token != token {
            return ctx.ignored(PaletteDragIgnoredReason::StaleToken);
        }
        if now < armed.deadline {
            return ctx.ignored(PaletteDragIgnoredReason::ArmDelayPending);
        }

        let before = self.visual;
        let mut pending = Pending::default();
        self.listeners
            .detach_where(Listener::is_armed_phase, &mut pending.listener_commands);

        self.fade_out_overlay();
        let dragging = DraggingGesture {
            token,
            pointer_id: armed.pointer_id,
            item: armed.item,
            grab_offset: armed.grab_offset,
            over_target: false,
        };
        self.visual.ghost = Some(Ghost {
            rect: dragging.ghost_rect(armed.last_position),
            opacity: GHOST_OPAQUE,
        });

        self.listeners
            .attach(Listener::DragMove, &mut pending.listener_commands);
        self.listeners
            .attach(Listener::DragRelease, &mut pending.listener_commands);
        self.gesture = Gesture::Dragging(dragging);

        tracing::debug!(token = token.get(), kind = %armed.item.kind, "palette drag started");
        self.transitioned(
            ctx,
            PaletteDragEffect::DragStarted {
                token,
                kind: armed.item.kind,
            },
            pending,
            before,
        )
    }

    /// Pointer moved.
    pub fn pointer_move<S>(
        &mut self,
        pointer_id: u32,
        position: Point,
        now: Duration,
        sink: &mut S,
    ) -> PaletteDragDispatch
    where
        S: DropSink<H::Element> + ?Sized,
    {
        let ctx = LogContext {
            phase: PaletteDragLifecyclePhase::PointerMove,
            at: now,
            token: self.gesture.token(),
            pointer_id: Some(pointer_id),
            position: Some(position),
        };
        match self.gesture {
            Gesture::Idle => ctx.ignored(PaletteDragIgnoredReason::NoActiveGesture),
            Gesture::Armed(armed) if armed.pointer_id != pointer_id => {
                ctx.ignored(PaletteDragIgnoredReason::PointerMismatch)
            }
            Gesture::Dragging(dragging) if dragging.pointer_id != pointer_id => {
                ctx.ignored(PaletteDragIgnoredReason::PointerMismatch)
            }
            Gesture::Armed(mut armed) => {
                if armed.down_position.chebyshev_distance(position) > self.config.cancel_slop {
                    self.cancel_armed(ctx, PaletteDragCancelReason::MovedBeyondSlop)
                } else {
                    armed.last_position = position;
                    self.gesture = Gesture::Armed(armed);
                    PaletteDragDispatch {
                        effect: None,
                        listener_commands: Vec::new(),
                        arm_timer: None,
                        visual: None,
                        callback_failures: Vec::new(),
                        log: ctx.entry(PaletteDragLogOutcome::Tracked),
                    }
                }
            }
            Gesture::Dragging(mut dragging) => {
                let before = self.visual;
                let mut pending = Pending::default();
                let ghost_rect = dragging.ghost_rect(position);

                let over_target = {
                    let failures = &mut pending.callback_failures;
                    self.coordinator.is_drop_target(position, |element| {
                        guarded(SinkCallback::Accepts, failures, || Ok(sink.accepts(element)))
                            .unwrap_or(false)
                    })
                };

                let opacity = if over_target {
                    let event = DragOverEvent {
                        pointer_id,
                        position,
                        ghost_rect,
                    };
                    let kind = dragging.item.kind;
                    guarded(SinkCallback::DragOver, &mut pending.callback_failures, || {
                        sink.drag_over(&event, kind)
                    });
                    self.config.dim_opacity
                } else {
                    if dragging.over_target {
                        guarded(SinkCallback::DragLeave, &mut pending.callback_failures, || {
                            sink.drag_leave()
                        });
                    }
                    GHOST_OPAQUE
                };

                dragging.over_target = over_target;
                self.gesture = Gesture::Dragging(dragging);
                self.visual.ghost = Some(Ghost {
                    rect: ghost_rect,
                    opacity,
                });
                self.transitioned(
                    ctx,
                    PaletteDragEffect::Hovered { over_target },
                    pending,
                    before,
                )
            }
        }
    }

    /// Pointer released.
    pub fn pointer_up<S>(
        &mut self,
        pointer_id: u32,
        position: Point,
        now: Duration,
        sink: &mut S,
    ) -> PaletteDragDispatch
    where
        S: DropSink<H::Element> + ?Sized,
    {
        let ctx = LogContext {
            phase: PaletteDragLifecyclePhase::PointerUp,
            at: now,
            token: self.gesture.token(),
            pointer_id: Some(pointer_id),
            position: Some(position),
        };
        match self.gesture {
            Gesture::Idle => ctx.ignored(PaletteDragIgnoredReason::NoActiveGesture),
            Gesture::Armed(armed) if armed.pointer_id != pointer_id => {
                ctx.ignored(PaletteDragIgnoredReason::PointerMismatch)
            }
            Gesture::Dragging(dragging) if dragging.pointer_id != pointer_id => {
                ctx.ignored(PaletteDragIgnoredReason::PointerMismatch)
            }
            Gesture::Armed(_) => self.cancel_armed(ctx, PaletteDragCancelReason::ReleasedBeforeArm),
            Gesture::Dragging(dragging) => {
                let before = self.visual;
                let mut pending = Pending::default();
                self.listeners.drain(&mut pending.listener_commands);
                self.visual = DragVisual::EMPTY;
                self.gesture = Gesture::Idle;

                let kind = dragging.item.kind;
                guarded(SinkCallback::Drop, &mut pending.callback_failures, || {
                    sink.drop(kind)
                });

                tracing::debug!(
                    token = dragging.token.get(),
                    kind = %kind,
                    over_target = dragging.over_target,
                    "palette drag committed"
                );
                self.transitioned(
                    ctx,
                    PaletteDragEffect::Committed {
                        kind,
                        over_target: dragging.over_target,
                    },
                    pending,
                    before,
                )
            }
        }
    }

    /// Browser `pointercancel`: the platform took the pointer away.
    pub fn pointer_cancel<S>(
        &mut self,
        pointer_id: u32,
        now: Duration,
        sink: &mut S,
    ) -> PaletteDragDispatch
    where
        S: DropSink<H::Element> + ?Sized,
    {
        let ctx = LogContext {
            phase: PaletteDragLifecyclePhase::PointerCancel,
            at: now,
            token: self.gesture.token(),
            pointer_id: Some(pointer_id),
            position: None,
        };
        match self.gesture {
            Gesture::Idle => ctx.ignored(PaletteDragIgnoredReason::NoActiveGesture),
            Gesture::Armed(armed) if armed.pointer_id != pointer_id => {
                ctx.ignored(PaletteDragIgnoredReason::PointerMismatch)
            }
            Gesture::Dragging(dragging) if dragging.pointer_id != pointer_id => {
                ctx.ignored(PaletteDragIgnoredReason::PointerMismatch)
            }
            Gesture::Armed(_) => self.cancel_armed(ctx, PaletteDragCancelReason::PointerCancel),
            Gesture::Dragging(dragging) => {
                let before = self.visual;
                let mut pending = Pending::default();
                self.listeners.drain(&mut pending.listener_commands);
                self.visual = DragVisual::EMPTY;
                self.gesture = Gesture::Idle;

                if dragging.over_target {
                    guarded(SinkCallback::DragLeave, &mut pending.callback_failures, || {
                        sink.drag_leave()
                    });
                }

                tracing::debug!(
                    token = dragging.token.get(),
                    "palette drag canceled while dragging"
                );
                self.transitioned(
                    ctx,
                    PaletteDragEffect::Canceled {
                        reason: PaletteDragCancelReason::PointerCancel,
                    },
                    pending,
                    before,
                )
            }
        }
    }

    /// A scroll event on `container`.
    pub fn scroll(&mut self, container: ContainerId, now: Duration) -> PaletteDragDispatch {
        let ctx = LogContext {
            phase: PaletteDragLifecyclePhase::Scroll,
            at: now,
            token: self.gesture.token(),
            pointer_id: self.gesture.pointer_id(),
            position: None,
        };
        match self.gesture {
            Gesture::Idle => ctx.ignored(PaletteDragIgnoredReason::NoActiveGesture),
            Gesture::Armed(_)
                if self
                    .listeners
                    .is_attached(Listener::ScrollCancel { container }) =>
            {
                self.cancel_armed(ctx, PaletteDragCancelReason::Scroll { container })
            }
            Gesture::Armed(_) | Gesture::Dragging(_) => {
                ctx.ignored(PaletteDragIgnoredReason::ListenerNotAttached)
            }
        }
    }

    /// The presenter finished fading the overlay out; drop it.
    pub fn finish_overlay_fade(&mut self, now: Duration) -> PaletteDragDispatch {
        let ctx = LogContext {
            phase: PaletteDragLifecyclePhase::OverlayFadeFinished,
            at: now,
            token: self.gesture.token(),
            pointer_id: self.gesture.pointer_id(),
            position: None,
        };
        let fading = self
            .visual
            .overlay
            .is_some_and(|overlay| overlay.fade == OverlayFade::Out);
        if !fading {
            return ctx.ignored(PaletteDragIgnoredReason::NoFadingOverlay);
        }
        let before = self.visual;
        self.visual.overlay = None;
        self.transitioned(ctx, PaletteDragEffect::OverlayRemoved, Pending::default(), before)
    }

    fn cancel_armed(
        &mut self,
        ctx: LogContext,
        reason: PaletteDragCancelReason,
    ) -> PaletteDragDispatch {
        let before = self.visual;
        let mut pending = Pending::default();
        self.listeners.drain(&mut pending.listener_commands);
        self.fade_out_overlay();
        self.visual.ghost = None;
        self.gesture = Gesture::Idle;

        tracing::debug!(token = ctx.token.map(GestureToken::get), ?reason, "palette drag canceled");
        self.transitioned(ctx, PaletteDragEffect::Canceled { reason }, pending, before)
    }

    fn fade_out_overlay(&mut self) {
        if let Some(overlay) = self.visual.overlay.as_mut() {
            overlay.fade = OverlayFade::Out;
        }
    }

    fn transitioned(
        &self,
        ctx: LogContext,
        effect: PaletteDragEffect,
        pending: Pending,
        before: DragVisual,
    ) -> PaletteDragDispatch {
        PaletteDragDispatch {
            effect: Some(effect),
            listener_commands: pending.listener_commands,
            arm_timer: pending.arm_timer,
            visual: (self.visual != before).then_some(self.visual),
            callback_failures: pending.callback_failures,
            log: ctx.entry(PaletteDragLogOutcome::Transitioned),
        }
    }

    fn mint_token(&mut self) -> GestureToken {
        let token = GestureToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        token
    }
}

/// Run a sink callback, converting errors and panics into a recorded failure.
fn guarded<R>(
    callback: SinkCallback,
    failures: &mut Vec<CallbackFailure>,
    f: impl FnOnce() -> Result<R, DropSinkError>,
) -> Option<R> {
    let kind = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(err)) => CallbackFailureKind::Error(err),
        Err(payload) => CallbackFailureKind::Panicked(panic_message(payload.as_ref())),
    };
    tracing::warn!(?callback, failure = ?kind, "drop sink callback failed");
    failures.push(CallbackFailure { callback, kind });
    None
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
