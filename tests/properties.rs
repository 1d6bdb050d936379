use physio_tracker::pose::{angle, Landmark, LandmarkFrame, LandmarkIndex};
use physio_tracker::tracker::{GatedPhase, HoldTimer, LandmarkSmoother, Verdict};
use proptest::prelude::*;
use std::time::Duration;

fn verdict() -> impl Strategy<Value = Verdict> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(p, r, t)| Verdict::new(p, r, t))
}

fn uniform_frame(value: f32) -> LandmarkFrame {
    let mut frame = LandmarkFrame::default();
    for index in LandmarkIndex::ALL {
        frame.set(index, Landmark::new(value, value, value, value));
    }
    frame
}

proptest! {
    #[test]
    fn opposite_points_make_straight_angle(
        bx in 0.0f32..1.0,
        by in 0.0f32..1.0,
        theta in 0.0f32..std::f32::consts::TAU,
        d in 0.01f32..1.0,
    ) {
        let (dx, dy) = (d * theta.cos(), d * theta.sin());
        let deg = angle([bx + dx, by + dy], [bx, by], [bx - dx, by - dy]);
        prop_assert!((deg - 180.0).abs() < 0.05, "{}", deg);
    }

    #[test]
    fn hold_credits_at_most_once_per_hold(
        hold_secs in 0.05f32..1.0,
        steps in prop::collection::vec((any::<bool>(), 1u64..200), 1..200),
    ) {
        let mut timer = HoldTimer::new(hold_secs);
        let mut now = Duration::ZERO;
        let mut credited_this_hold = 0;
        for (in_hold, dt_ms) in steps {
            now += Duration::from_millis(dt_ms);
            let update = timer.update(in_hold, now);
            if !in_hold {
                credited_this_hold = 0;
            }
            if update.newly_counted_rep {
                credited_this_hold += 1;
            }
            prop_assert!(credited_this_hold <= 1);
        }
    }

    #[test]
    fn short_hold_never_credits_or_raises(
        required in 0.5f32..5.0,
        fraction in 0.0f32..0.95,
        frames in 1usize..30,
    ) {
        let mut timer = HoldTimer::new(required);
        let held = required * fraction;
        for i in 0..=frames {
            let at = Duration::from_secs_f32(held * i as f32 / frames as f32);
            prop_assert!(!timer.update(true, at).newly_counted_rep);
        }
        timer.update(false, Duration::from_secs_f32(held));
        prop_assert!(timer.required_secs() <= required);
    }

    #[test]
    fn active_implies_resting(
        debounce in 1u32..5,
        verdicts in prop::collection::vec(verdict(), 0..300),
    ) {
        let mut phase = GatedPhase::with_debounce(debounce);
        for v in verdicts {
            phase.update(v);
            prop_assert!(!phase.active() || phase.resting());
        }
    }

    #[test]
    fn reset_is_idempotent(verdicts in prop::collection::vec(verdict(), 0..50)) {
        let mut once = GatedPhase::with_debounce(3);
        for v in verdicts {
            once.update(v);
        }
        let mut twice = once.clone();
        once.reset();
        twice.reset();
        twice.reset();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn exponential_smoother_converges(
        alpha in 0.1f32..=1.0,
        start in 0.0f32..1.0,
        target in 0.0f32..1.0,
    ) {
        let mut smoother = LandmarkSmoother::exponential(alpha);
        smoother.apply(&uniform_frame(start));
        let constant = uniform_frame(target);
        let mut out = constant.clone();
        for _ in 0..100 {
            out = smoother.apply(&constant);
        }
        for l in out.landmarks.iter() {
            prop_assert!((l.x - target).abs() < 1e-3);
            prop_assert!((l.visibility - target).abs() < 1e-3);
        }
    }

    #[test]
    fn moving_average_reaches_constant(
        window in 1usize..10,
        start in 0.0f32..1.0,
        target in 0.0f32..1.0,
    ) {
        let mut smoother = LandmarkSmoother::moving_average(window);
        smoother.apply(&uniform_frame(start));
        let constant = uniform_frame(target);
        let mut out = constant.clone();
        for _ in 0..window {
            out = smoother.apply(&constant);
        }
        prop_assert!(smoother.history_len() <= window);
        for l in out.landmarks.iter() {
            prop_assert!((l.y - target).abs() < 1e-5);
        }
    }
}
