//! End-to-end palette gesture scenarios against a rect-based "DOM".
//!
//! Each scenario drives the controller like a browser host would: apply the
//! listener commands, schedule the arm timer, present visuals, and route
//! callbacks to a sink. The harness tracks attach/detach per listener so
//! every scenario can assert exactly-once teardown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use linkpad_core::{Editor, GraphState, NodeKind, Point, Rect};
use linkpad_web::{
    ContainerId, DragOverEvent, DragPresenter, DropSink, DropSinkError, EditorDropSink,
    GestureToken, Listener, ListenerCommand, Overflow, OverlayFade, PaletteDragCancelReason,
    PaletteDragConfig, PaletteDragController, PaletteDragDispatch, PaletteDragEffect,
    PaletteDragIgnoredReason, PaletteDragLogOutcome, PaletteDragState, PaletteItem, PointerKind,
    RecordingPresenter, RectHitTester, ScrollContainer, SinkCallback,
};
use pretty_assertions::assert_eq;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum El {
    Palette,
    Canvas,
}

const PALETTE: Rect = Rect::new(0.0, 0.0, 120.0, 600.0);
const CANVAS: Rect = Rect::new(200.0, 0.0, 600.0, 600.0);
const ITEM: PaletteItem = PaletteItem {
    kind: NodeKind::ArcTranslating,
    rect: Rect::new(10.0, 40.0, 100.0, 30.0),
};
const POINTER: u32 = 7;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

// ── Sinks ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum SinkEvent {
    Over(Point),
    Leave,
    Drop(NodeKind),
}

#[derive(Default)]
struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl DropSink<El> for RecordingSink {
    fn accepts(&self, element: &El) -> bool {
        *element == El::Canvas
    }

    fn drag_over(&mut self, event: &DragOverEvent, _kind: NodeKind) -> Result<(), DropSinkError> {
        self.events.push(SinkEvent::Over(event.position));
        Ok(())
    }

    fn drag_leave(&mut self) -> Result<(), DropSinkError> {
        self.events.push(SinkEvent::Leave);
        Ok(())
    }

    fn drop(&mut self, kind: NodeKind) -> Result<(), DropSinkError> {
        self.events.push(SinkEvent::Drop(kind));
        Ok(())
    }
}

/// Panics in `drop`, errors in `drag_over`.
struct HostileSink;

impl DropSink<El> for HostileSink {
    fn accepts(&self, element: &El) -> bool {
        *element == El::Canvas
    }

    fn drag_over(&mut self, _event: &DragOverEvent, _kind: NodeKind) -> Result<(), DropSinkError> {
        Err(DropSinkError::new("preview layer missing"))
    }

    fn drag_leave(&mut self) -> Result<(), DropSinkError> {
        Ok(())
    }

    fn drop(&mut self, _kind: NodeKind) -> Result<(), DropSinkError> {
        panic!("drop handler exploded");
    }
}

// ── Host harness ────────────────────────────────────────────────────────

struct Host {
    ctl: PaletteDragController<RectHitTester<El>>,
    attached: HashMap<Listener, u32>,
    detached: HashMap<Listener, u32>,
    timer: Option<(GestureToken, Duration)>,
    presenter: RecordingPresenter,
}

impl Host {
    fn new() -> Self {
        Self::with_config(PaletteDragConfig::default())
    }

    fn with_config(config: PaletteDragConfig) -> Self {
        let mut hits = RectHitTester::new();
        hits.push(PALETTE, El::Palette);
        hits.push(CANVAS, El::Canvas);
        Self {
            ctl: PaletteDragController::new(config, hits).expect("valid config"),
            attached: HashMap::new(),
            detached: HashMap::new(),
            timer: None,
            presenter: RecordingPresenter::new(),
        }
    }

    fn apply(&mut self, dispatch: PaletteDragDispatch) -> PaletteDragDispatch {
        for command in &dispatch.listener_commands {
            match *command {
                ListenerCommand::Attach(listener) => {
                    *self.attached.entry(listener).or_default() += 1;
                }
                ListenerCommand::Detach(listener) => {
                    *self.detached.entry(listener).or_default() += 1;
                }
            }
        }
        if let Some(request) = dispatch.arm_timer {
            self.timer = Some((request.token, request.deadline));
        }
        dispatch.present_to(&mut self.presenter);
        dispatch
    }

    fn down(
        &mut self,
        kind: PointerKind,
        at: Point,
        ancestors: &[ScrollContainer],
        now: Duration,
    ) -> PaletteDragDispatch {
        let dispatch = self.ctl.pointer_down(ITEM, POINTER, kind, at, ancestors, now);
        self.apply(dispatch)
    }

    /// Fire the pending timer at its deadline.
    fn fire_timer(&mut self) -> PaletteDragDispatch {
        let (token, deadline) = self.timer.take().expect("timer scheduled");
        let dispatch = self.ctl.arm_timer_fired(token, deadline);
        self.apply(dispatch)
    }

    fn mv<S>(&mut self, at: Point, now: Duration, sink: &mut S) -> PaletteDragDispatch
    where
        S: DropSink<El>,
    {
        let dispatch = self.ctl.pointer_move(POINTER, at, now, sink);
        self.apply(dispatch)
    }

    fn up<S>(&mut self, at: Point, now: Duration, sink: &mut S) -> PaletteDragDispatch
    where
        S: DropSink<El>,
    {
        let dispatch = self.ctl.pointer_up(POINTER, at, now, sink);
        self.apply(dispatch)
    }

    fn scroll(&mut self, container: ContainerId, now: Duration) -> PaletteDragDispatch {
        let dispatch = self.ctl.scroll(container, now);
        self.apply(dispatch)
    }

    fn assert_torn_down(&self) {
        assert_eq!(self.ctl.state(), PaletteDragState::Idle);
        assert!(self.ctl.listeners().is_empty(), "listeners left: {:?}", self.ctl.listeners());
        assert_eq!(self.attached, self.detached, "attach/detach mismatch");
        assert!(self.detached.values().all(|&count| count == 1));
        assert!(self.ctl.visual().ghost.is_none());
    }

    fn outcome(dispatch: &PaletteDragDispatch) -> PaletteDragLogOutcome {
        dispatch.log.outcome
    }
}

fn grab_point() -> Point {
    Point::new(30.0, 50.0)
}

// ── Timing ──────────────────────────────────────────────────────────────

#[test]
fn mouse_arms_with_zero_delay() {
    let mut host = Host::new();
    let down = host.down(PointerKind::Mouse, grab_point(), &[], ms(1_000));
    let timer = down.arm_timer.expect("timer requested");
    assert_eq!(timer.delay, Duration::ZERO);
    assert_eq!(timer.deadline, ms(1_000));

    let started = host.fire_timer();
    assert!(matches!(started.effect, Some(PaletteDragEffect::DragStarted { .. })));
    assert_eq!(host.ctl.state(), PaletteDragState::Dragging);
}

#[test]
fn touch_waits_three_hundred_ms() {
    let mut host = Host::new();
    let down = host.down(PointerKind::Touch, grab_point(), &[], ms(50));
    let token = down.arm_timer.expect("timer").token;

    let early = host.ctl.arm_timer_fired(token, ms(349));
    assert_eq!(
        Host::outcome(&early),
        PaletteDragLogOutcome::Ignored(PaletteDragIgnoredReason::ArmDelayPending)
    );
    let late = host.ctl.arm_timer_fired(token, ms(350));
    host.apply(late);
    assert_eq!(host.ctl.state(), PaletteDragState::Dragging);
}

#[test]
fn configured_touch_delay_is_used() {
    let mut host = Host::with_config(PaletteDragConfig {
        touch_arm_delay: ms(120),
        ..PaletteDragConfig::default()
    });
    let down = host.down(PointerKind::Pen, grab_point(), &[], ms(0));
    assert_eq!(down.arm_timer.expect("timer").delay, ms(120));
}

// ── Armed-phase cancellation ────────────────────────────────────────────

#[test]
fn movement_within_slop_is_tracked_beyond_slop_cancels() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    host.down(PointerKind::Touch, grab_point(), &[], ms(0));

    let near = host.mv(Point::new(35.0, 45.0), ms(10), &mut sink);
    assert_eq!(Host::outcome(&near), PaletteDragLogOutcome::Tracked);
    assert_eq!(host.ctl.state(), PaletteDragState::Armed);

    let far = host.mv(Point::new(30.0, 55.1), ms(20), &mut sink);
    assert_eq!(
        far.effect,
        Some(PaletteDragEffect::Canceled {
            reason: PaletteDragCancelReason::MovedBeyondSlop
        })
    );
    host.assert_torn_down();
    assert_eq!(host.ctl.visual().overlay.map(|o| o.fade), Some(OverlayFade::Out));
    assert!(sink.events.is_empty());
}

#[test]
fn same_tick_scroll_after_cancel_is_a_no_op() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    let scroller = ScrollContainer {
        id: ContainerId(1),
        overflow_y: Overflow::Auto,
    };
    host.down(PointerKind::Touch, grab_point(), &[scroller], ms(0));
    host.mv(Point::new(60.0, 50.0), ms(16), &mut sink);
    let scroll = host.scroll(ContainerId(1), ms(16));
    assert_eq!(
        Host::outcome(&scroll),
        PaletteDragLogOutcome::Ignored(PaletteDragIgnoredReason::NoActiveGesture)
    );
    host.assert_torn_down();

    let late_timer = host.fire_timer();
    assert_eq!(
        Host::outcome(&late_timer),
        PaletteDragLogOutcome::Ignored(PaletteDragIgnoredReason::StaleToken)
    );
    assert!(host.ctl.visual().ghost.is_none());
}

#[test]
fn only_auto_overflow_ancestors_cancel_on_scroll() {
    let mut host = Host::new();
    let ancestors = [
        ScrollContainer {
            id: ContainerId(1),
            overflow_y: Overflow::Hidden,
        },
        ScrollContainer {
            id: ContainerId(2),
            overflow_y: Overflow::Auto,
        },
        ScrollContainer {
            id: ContainerId(3),
            overflow_y: Overflow::Scroll,
        },
    ];
    let down = host.down(PointerKind::Touch, grab_point(), &ancestors, ms(0));
    assert!(down
        .listener_commands
        .contains(&ListenerCommand::Attach(Listener::ScrollCancel { container: ContainerId(2) })));
    assert_eq!(host.attached.len(), 3);

    let ignored = host.scroll(ContainerId(3), ms(5));
    assert_eq!(
        Host::outcome(&ignored),
        PaletteDragLogOutcome::Ignored(PaletteDragIgnoredReason::ListenerNotAttached)
    );
    let canceled = host.scroll(ContainerId(2), ms(6));
    assert_eq!(
        canceled.effect,
        Some(PaletteDragEffect::Canceled {
            reason: PaletteDragCancelReason::Scroll {
                container: ContainerId(2)
            }
        })
    );
    host.assert_torn_down();
}

#[test]
fn release_before_arm_cancels_and_overlay_fades_away() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    host.down(PointerKind::Mouse, grab_point(), &[], ms(0));
    let up = host.up(grab_point(), ms(0), &mut sink);
    assert_eq!(
        up.effect,
        Some(PaletteDragEffect::Canceled {
            reason: PaletteDragCancelReason::ReleasedBeforeArm
        })
    );
    host.assert_torn_down();

    let removed = host.ctl.finish_overlay_fade(ms(200));
    let removed = host.apply(removed);
    assert_eq!(removed.effect, Some(PaletteDragEffect::OverlayRemoved));
    assert!(host.ctl.visual().is_empty());
    assert!(host.presenter.last().expect("presented").is_empty());

    let again = host.ctl.finish_overlay_fade(ms(201));
    assert_eq!(
        Host::outcome(&again),
        PaletteDragLogOutcome::Ignored(PaletteDragIgnoredReason::NoFadingOverlay)
    );
    assert!(sink.events.is_empty());
}

// ── Dragging ────────────────────────────────────────────────────────────

#[test]
fn hover_dims_leave_restores_and_drop_always_fires() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    host.down(PointerKind::Mouse, grab_point(), &[], ms(0));
    host.fire_timer();
    assert_eq!(
        host.ctl.visual().overlay.map(|o| o.fade),
        Some(OverlayFade::Out),
        "overlay fades out when the drag starts"
    );

    host.mv(Point::new(300.0, 200.0), ms(16), &mut sink);
    assert!(host.ctl.visual().is_dimmed());
    host.mv(Point::new(310.0, 210.0), ms(32), &mut sink);
    host.mv(Point::new(60.0, 200.0), ms(48), &mut sink);
    assert!(!host.ctl.visual().is_dimmed());
    host.mv(Point::new(70.0, 200.0), ms(64), &mut sink);

    let up = host.up(Point::new(70.0, 200.0), ms(80), &mut sink);
    assert_eq!(
        up.effect,
        Some(PaletteDragEffect::Committed {
            kind: NodeKind::ArcTranslating,
            over_target: false
        })
    );
    assert_eq!(
        sink.events,
        vec![
            SinkEvent::Over(Point::new(300.0, 200.0)),
            SinkEvent::Over(Point::new(310.0, 210.0)),
            SinkEvent::Leave,
            SinkEvent::Drop(NodeKind::ArcTranslating),
        ]
    );
    host.assert_torn_down();
    assert!(host.ctl.visual().is_empty(), "commit removes ghost and overlay");
}

#[test]
fn ghost_spawns_under_pointer_after_in_slop_drift() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    host.down(PointerKind::Touch, grab_point(), &[], ms(0));
    let drift = host.mv(Point::new(34.0, 47.0), ms(100), &mut sink);
    assert_eq!(Host::outcome(&drift), PaletteDragLogOutcome::Tracked);

    let started = host.fire_timer();
    let ghost = started
        .visual
        .and_then(|visual| visual.ghost)
        .expect("ghost spawned");
    // Grab offset is (20, 10) from the item's top-left corner.
    assert_eq!(ghost.rect, Rect::new(14.0, 37.0, 100.0, 30.0));
}

#[test]
fn slop_is_measured_from_down_not_last_position() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    host.down(PointerKind::Touch, grab_point(), &[], ms(0));
    host.mv(Point::new(34.0, 50.0), ms(50), &mut sink);
    let far = host.mv(Point::new(36.0, 50.0), ms(100), &mut sink);
    assert_eq!(
        far.effect,
        Some(PaletteDragEffect::Canceled {
            reason: PaletteDragCancelReason::MovedBeyondSlop
        })
    );
    host.assert_torn_down();
}

#[test]
fn relayout_mid_drag_moves_drop_target() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    host.down(PointerKind::Mouse, grab_point(), &[], ms(0));
    host.fire_timer();

    host.mv(Point::new(50.0, 400.0), ms(16), &mut sink);
    assert!(!host.ctl.visual().is_dimmed());

    // Canvas reflows below the palette on a narrow viewport.
    let hits = host.ctl.hit_tester_mut();
    hits.clear();
    hits.push(PALETTE, El::Palette);
    hits.push(Rect::new(0.0, 300.0, 800.0, 300.0), El::Canvas);

    host.mv(Point::new(50.0, 401.0), ms(32), &mut sink);
    assert!(host.ctl.visual().is_dimmed());
    assert_eq!(sink.events, vec![SinkEvent::Over(Point::new(50.0, 401.0))]);
}

#[test]
fn other_pointers_and_second_down_are_ignored() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    host.down(PointerKind::Touch, grab_point(), &[], ms(0));

    let second = host.ctl.pointer_down(ITEM, 99, PointerKind::Touch, grab_point(), &[], ms(1));
    assert_eq!(
        Host::outcome(&second),
        PaletteDragLogOutcome::Ignored(PaletteDragIgnoredReason::GestureAlreadyActive)
    );
    let foreign = host.ctl.pointer_move(99, Point::new(500.0, 500.0), ms(2), &mut sink);
    assert_eq!(
        Host::outcome(&foreign),
        PaletteDragLogOutcome::Ignored(PaletteDragIgnoredReason::PointerMismatch)
    );
    assert_eq!(host.ctl.state(), PaletteDragState::Armed);
    assert_eq!(host.ctl.active_pointer_id(), Some(POINTER));
}

#[test]
fn pointer_cancel_while_dragging_leaves_without_drop() {
    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    host.down(PointerKind::Mouse, grab_point(), &[], ms(0));
    host.fire_timer();
    host.mv(Point::new(300.0, 300.0), ms(16), &mut sink);

    let dispatch = host.ctl.pointer_cancel(POINTER, ms(20), &mut sink);
    let dispatch = host.apply(dispatch);
    assert_eq!(
        dispatch.effect,
        Some(PaletteDragEffect::Canceled {
            reason: PaletteDragCancelReason::PointerCancel
        })
    );
    assert_eq!(sink.events, vec![SinkEvent::Over(Point::new(300.0, 300.0)), SinkEvent::Leave]);
    host.assert_torn_down();
}

#[test]
fn hostile_sink_cannot_leave_ghost_or_listeners() {
    let mut host = Host::new();
    let mut sink = HostileSink;
    host.down(PointerKind::Mouse, grab_point(), &[], ms(0));
    host.fire_timer();

    let over = host.mv(Point::new(400.0, 100.0), ms(16), &mut sink);
    assert_eq!(over.callback_failures.len(), 1);
    assert_eq!(over.callback_failures[0].callback, SinkCallback::DragOver);
    assert!(host.ctl.visual().is_dimmed());

    let up = host.up(Point::new(400.0, 100.0), ms(32), &mut sink);
    assert_eq!(up.callback_failures.len(), 1);
    assert_eq!(up.callback_failures[0].callback, SinkCallback::Drop);
    assert!(matches!(up.effect, Some(PaletteDragEffect::Committed { over_target: true, .. })));
    host.assert_torn_down();
    assert!(host.presenter.last().expect("presented").is_empty());
}

#[test]
fn callback_failures_are_logged_at_warn() {
    #[derive(Clone, Default)]
    struct WarnCapture(Arc<Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCapture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() == tracing::Level::WARN {
                let mut lock = self.0.lock().unwrap();
                lock.push(event.metadata().name().to_owned());
            }
        }
    }

    let capture = WarnCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, || {
        let mut host = Host::new();
        let mut sink = HostileSink;
        host.down(PointerKind::Mouse, grab_point(), &[], ms(0));
        host.fire_timer();
        host.mv(Point::new(400.0, 100.0), ms(16), &mut sink);
        host.up(Point::new(400.0, 100.0), ms(32), &mut sink);
    });
    assert_eq!(capture.0.lock().unwrap().len(), 2);
}

#[test]
fn editor_sink_materializes_node_on_canvas_drop() {
    let mut editor = Editor::new(GraphState::default());
    let mut host = Host::new();
    host.down(PointerKind::Mouse, grab_point(), &[], ms(0));
    host.fire_timer();
    {
        let mut sink = EditorDropSink::new(&mut editor, El::Canvas, CANVAS);
        host.mv(Point::new(250.0, 120.0), ms(16), &mut sink);
        assert!(sink.editor().drop_preview().is_some());
        host.up(Point::new(250.0, 120.0), ms(32), &mut sink);
    }
    assert_eq!(editor.state().nodes.len(), 1);
    assert_eq!(editor.state().nodes[0].kind(), NodeKind::ArcTranslating);
    assert_eq!(editor.state().nodes[0].position(), Point::new(50.0, 120.0));
    assert!(editor.take_redraw());
    host.assert_torn_down();
}

#[test]
fn presenter_only_sees_changed_snapshots() {
    struct Counting(usize);
    impl DragPresenter for Counting {
        fn present(&mut self, _visual: &linkpad_web::DragVisual) {
            self.0 += 1;
        }
    }

    let mut host = Host::new();
    let mut sink = RecordingSink::default();
    let mut counting = Counting(0);
    let down = host.down(PointerKind::Touch, grab_point(), &[], ms(0));
    assert!(down.present_to(&mut counting));
    let tracked = host.mv(Point::new(31.0, 51.0), ms(5), &mut sink);
    assert!(!tracked.present_to(&mut counting));
    assert_eq!(counting.0, 1);
}
