#![no_main]

use std::collections::HashMap;
use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use linkpad_core::{NodeKind, Point, Rect};
use linkpad_web::{
    ContainerId, DragOverEvent, DropSink, DropSinkError, Listener, ListenerCommand, Overflow,
    PaletteDragConfig, PaletteDragController, PaletteDragState, PaletteItem, PointerKind,
    RectHitTester, ScrollContainer,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Down { pointer: u8, touch: bool, x: i16, y: i16 },
    Timer { stale: bool, late: u16 },
    Move { pointer: u8, x: i16, y: i16 },
    Up { pointer: u8 },
    Cancel { pointer: u8 },
    Scroll { container: u8 },
    Fade,
    Advance { ms: u16 },
}

struct Sink {
    fail: bool,
}

impl DropSink<u8> for Sink {
    fn accepts(&self, element: &u8) -> bool {
        *element == 1
    }

    fn drag_over(&mut self, _event: &DragOverEvent, _kind: NodeKind) -> Result<(), DropSinkError> {
        self.fail = !self.fail;
        if self.fail { Err(DropSinkError::new("fuzz")) } else { Ok(()) }
    }

    fn drag_leave(&mut self) -> Result<(), DropSinkError> {
        Ok(())
    }

    fn drop(&mut self, _kind: NodeKind) -> Result<(), DropSinkError> {
        Ok(())
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut hits = RectHitTester::new();
    hits.push(Rect::new(-100.0, -100.0, 300.0, 300.0), 0u8);
    hits.push(Rect::new(200.0, -100.0, 300.0, 300.0), 1u8);
    let Ok(mut ctl) = PaletteDragController::new(PaletteDragConfig::default(), hits) else {
        return;
    };
    let item = PaletteItem {
        kind: NodeKind::Fixed,
        rect: Rect::new(0.0, 0.0, 50.0, 20.0),
    };
    let ancestors = [ScrollContainer {
        id: ContainerId(0),
        overflow_y: Overflow::Auto,
    }];
    let mut sink = Sink { fail: false };
    let mut live: HashMap<Listener, i32> = HashMap::new();
    let mut timer = None;
    let mut now = Duration::ZERO;

    for op in ops {
        let dispatch = match op {
            Op::Down { pointer, touch, x, y } => {
                let kind = if touch { PointerKind::Touch } else { PointerKind::Mouse };
                let at = Point::new(f64::from(x), f64::from(y));
                ctl.pointer_down(item, u32::from(pointer), kind, at, &ancestors, now)
            }
            Op::Timer { stale, late } => {
                let Some((token, deadline)) = timer else { continue };
                now = now.max(deadline) + Duration::from_millis(u64::from(late));
                if stale {
                    let _ = ctl.arm_timer_fired(token, now);
                }
                ctl.arm_timer_fired(token, now)
            }
            Op::Move { pointer, x, y } => {
                let at = Point::new(f64::from(x), f64::from(y));
                ctl.pointer_move(u32::from(pointer), at, now, &mut sink)
            }
            Op::Up { pointer } => ctl.pointer_up(u32::from(pointer), Point::ZERO, now, &mut sink),
            Op::Cancel { pointer } => ctl.pointer_cancel(u32::from(pointer), now, &mut sink),
            Op::Scroll { container } => ctl.scroll(ContainerId(u32::from(container % 2)), now),
            Op::Fade => ctl.finish_overlay_fade(now),
            Op::Advance { ms } => {
                now += Duration::from_millis(u64::from(ms));
                continue;
            }
        };
        if let Some(request) = dispatch.arm_timer {
            timer = Some((request.token, request.deadline));
        }
        for command in &dispatch.listener_commands {
            let delta = match command {
                ListenerCommand::Attach(_) => 1,
                ListenerCommand::Detach(_) => -1,
            };
            let (ListenerCommand::Attach(listener) | ListenerCommand::Detach(listener)) = *command;
            let count = live.entry(listener).or_default();
            *count += delta;
            assert!(*count == 0 || *count == 1);
        }
        if ctl.state() == PaletteDragState::Idle {
            assert!(ctl.listeners().is_empty());
            assert!(ctl.visual().ghost.is_none());
        }
    }
});
