//! Benchmark: full palette gesture lifecycle.
//!
//! Run with: `cargo bench -p linkpad-web --bench palette_drag_bench`
//!
//! One gesture is pointer-down, timer, N moves across palette and canvas,
//! and release. N = 60 approximates one second of drag at 60 Hz.

use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use linkpad_core::{NodeKind, Point, Rect};
use linkpad_web::{
    DragOverEvent, DropSink, DropSinkError, PaletteDragConfig, PaletteDragController, PaletteItem,
    PointerKind, RectHitTester,
};

struct NullSink;

impl DropSink<u8> for NullSink {
    fn accepts(&self, element: &u8) -> bool {
        *element == 1
    }

    fn drag_over(&mut self, event: &DragOverEvent, _kind: NodeKind) -> Result<(), DropSinkError> {
        black_box(event);
        Ok(())
    }

    fn drag_leave(&mut self) -> Result<(), DropSinkError> {
        Ok(())
    }

    fn drop(&mut self, _kind: NodeKind) -> Result<(), DropSinkError> {
        Ok(())
    }
}

fn controller() -> PaletteDragController<RectHitTester<u8>> {
    let mut hits = RectHitTester::new();
    hits.push(Rect::new(0.0, 0.0, 200.0, 800.0), 0);
    hits.push(Rect::new(200.0, 0.0, 1000.0, 800.0), 1);
    PaletteDragController::new(PaletteDragConfig::default(), hits).expect("valid config")
}

fn bench_lifecycle(c: &mut Criterion) {
    let item = PaletteItem {
        kind: NodeKind::Clamped,
        rect: Rect::new(20.0, 20.0, 160.0, 40.0),
    };
    let mut group = c.benchmark_group("palette_drag");
    for moves in [10u32, 60] {
        group.bench_function(format!("gesture_{moves}_moves"), |b| {
            let mut ctl = controller();
            let mut sink = NullSink;
            b.iter(|| {
                let mut now = Duration::ZERO;
                let start = Point::new(40.0, 30.0);
                let down = ctl.pointer_down(item, 1, PointerKind::Mouse, start, &[], now);
                let token = down.arm_timer.map(|t| t.token).expect("timer");
                black_box(ctl.arm_timer_fired(token, now));
                for i in 0..moves {
                    now += Duration::from_millis(16);
                    let x = 40.0 + f64::from(i) * 15.0;
                    black_box(ctl.pointer_move(1, Point::new(x, 300.0), now, &mut sink));
                }
                black_box(ctl.pointer_up(1, Point::new(900.0, 300.0), now, &mut sink))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lifecycle);
criterion_main!(benches);
