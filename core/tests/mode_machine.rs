//! Mode machine tests with recording modes over a probe context.

use dragonhaven_core::{
    config::TransitionConfig,
    mode::{Flow, InputEvent, Key, Mode, ModeMachine, Surface, TextSurface, TransitionPhase},
};

#[derive(Default)]
struct Probe {
    log:     Vec<String>,
    request: Option<String>,
    quit:    bool,
}

struct Recording {
    name: &'static str,
    next: Option<String>,
}

impl Recording {
    fn boxed(name: &'static str) -> Box<dyn Mode<Probe>> {
        Box::new(Self { name, next: None })
    }
}

impl Mode<Probe> for Recording {
    fn enter(&mut self, previous: Option<&str>, ctx: &mut Probe) {
        ctx.log.push(format!("enter {} from {}", self.name, previous.unwrap_or("-")));
    }

    fn exit(&mut self, ctx: &mut Probe) {
        ctx.log.push(format!("exit {}", self.name));
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut Probe) {
        ctx.log.push(format!("{} got {event:?}", self.name));
    }

    fn update(&mut self, _dt: f64, ctx: &mut Probe) -> Flow {
        if let Some(next) = ctx.request.take() {
            self.next = Some(next);
        }
        if ctx.quit { Flow::Quit } else { Flow::Continue }
    }

    fn draw(&self, _ctx: &Probe, surface: &mut dyn Surface) {
        surface.text(self.name);
    }

    fn take_next_mode(&mut self) -> Option<String> {
        self.next.take()
    }
}

/// Three modes, fade speed 500/s, ceiling 255.
fn build() -> (ModeMachine<Probe>, Probe) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut machine = ModeMachine::new(&TransitionConfig::default());
    for name in ["a", "b", "c"] {
        machine.register(name, Recording::boxed(name));
    }
    (machine, Probe::default())
}

const DT: f64 = 0.1;

/// Run updates until the transition finishes; returns how many it took.
fn finish_transition(machine: &mut ModeMachine<Probe>, probe: &mut Probe) -> usize {
    let mut updates = 0;
    while machine.is_transitioning() {
        assert_eq!(machine.update(DT, probe), Flow::Continue);
        updates += 1;
        assert!(updates < 100, "transition never finished");
    }
    updates
}

/// Before the first set_mode nothing is active and nothing happens.
#[test]
fn machine_is_inert_until_first_activation() {
    let (mut machine, mut probe) = build();
    assert_eq!(machine.current_mode_name(), None);
    assert_eq!(machine.update(DT, &mut probe), Flow::Continue);
    assert!(!machine.handle_event(&InputEvent::Key(Key::Confirm), &mut probe));
    assert!(probe.log.is_empty());
}

/// An immediate switch runs exit, bookkeeping, then enter with provenance.
#[test]
fn immediate_switch_runs_lifecycle_in_order() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    machine.set_mode("b", false, &mut probe);

    assert_eq!(probe.log, vec!["enter a from -", "exit a", "enter b from a"]);
    assert_eq!(machine.current_mode_name(), Some("b"));
    assert_eq!(machine.previous_mode_name(), Some("a"));
    assert!(!machine.is_transitioning());
}

/// A faded switch goes out, switches exactly once at full opacity, and
/// comes back in.
#[test]
fn faded_switch_sequences_three_phases() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    probe.log.clear();

    machine.set_mode("b", true, &mut probe);
    assert_eq!(machine.phase(), Some(TransitionPhase::FadeOut));
    assert_eq!(machine.current_mode_name(), Some("a"), "switch waits for the fade");

    let mut peak = 0.0_f64;
    let mut switched_at_alpha = None;
    let mut updates = 0;
    while machine.is_transitioning() {
        let before = machine.current_mode_name().map(str::to_string);
        machine.update(DT, &mut probe);
        if before.as_deref() != machine.current_mode_name() {
            assert!(switched_at_alpha.is_none(), "switch happened twice");
            switched_at_alpha = Some(machine.fade_alpha());
        }
        peak = peak.max(machine.fade_alpha());
        updates += 1;
        assert!(updates < 100);
    }

    assert_eq!(switched_at_alpha, Some(255.0), "switch happens at full opacity");
    assert_eq!(peak, 255.0);
    assert_eq!(machine.fade_alpha(), 0.0);
    assert_eq!(probe.log, vec!["exit a", "enter b from a"]);
    // 6 updates out, 1 switch, 6 back in.
    assert_eq!(updates, 13);
}

/// Input is swallowed for the whole transition.
#[test]
fn input_is_swallowed_while_transitioning() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    machine.set_mode("b", true, &mut probe);
    probe.log.clear();

    while machine.is_transitioning() {
        assert!(!machine.handle_event(&InputEvent::Key(Key::Confirm), &mut probe));
        machine.update(DT, &mut probe);
    }
    assert!(
        probe.log.iter().all(|l| !l.contains("got")),
        "no mode should see input mid-transition: {:?}",
        probe.log
    );

    assert!(machine.handle_event(&InputEvent::Text('x'), &mut probe));
    assert_eq!(probe.log.last().map(String::as_str), Some("b got Text('x')"));
}

/// The overlay is drawn during both fade directions and never at rest.
#[test]
fn overlay_drawn_only_while_faded() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);

    let mut surface = TextSurface::default();
    machine.draw(&probe, &mut surface);
    assert_eq!(surface.lines, vec!["a"]);
    assert_eq!(surface.overlay, None);

    machine.set_mode("b", true, &mut probe);
    let mut saw_overlay_in = Vec::new();
    while machine.is_transitioning() {
        machine.update(DT, &mut probe);
        let mut surface = TextSurface::default();
        machine.draw(&probe, &mut surface);
        if let (Some(phase), Some(_)) = (machine.phase(), surface.overlay) {
            saw_overlay_in.push(phase);
        }
    }
    assert!(saw_overlay_in.contains(&TransitionPhase::FadeOut));
    assert!(saw_overlay_in.contains(&TransitionPhase::FadeIn));

    let mut surface = TextSurface::default();
    machine.draw(&probe, &mut surface);
    assert_eq!(surface.overlay, None);
    assert_eq!(surface.lines, vec!["b"]);
}

/// A mode's request becomes a faded transition on that update.
#[test]
fn mode_request_starts_a_faded_transition() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    probe.request = Some("c".into());

    machine.update(DT, &mut probe);
    assert!(machine.is_transitioning());
    assert_eq!(machine.transition_target(), Some("c"));

    finish_transition(&mut machine, &mut probe);
    assert_eq!(machine.current_mode_name(), Some("c"));
}

/// A self-transition is legal and re-enters the same mode once.
#[test]
fn self_transition_reenters_once() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    probe.log.clear();
    probe.request = Some("a".into());
    machine.update(DT, &mut probe);
    finish_transition(&mut machine, &mut probe);
    assert_eq!(probe.log, vec!["exit a", "enter a from a"]);
}

/// Quit propagates from the mode, but not mid-transition.
#[test]
fn quit_signal_propagates() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    probe.quit = true;
    assert_eq!(machine.update(DT, &mut probe), Flow::Quit);

    machine.set_mode("b", true, &mut probe);
    assert_eq!(machine.update(DT, &mut probe), Flow::Continue);
}

/// Unknown names are ignored.
#[test]
fn unknown_modes_are_ignored() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    machine.set_mode("nowhere", false, &mut probe);
    assert_eq!(machine.current_mode_name(), Some("a"));
    assert!(!machine.start_transition("nowhere"));
    assert!(!machine.is_transitioning());
}

/// Retargeting mid-fade keeps the opacity and lands on the new target only.
#[test]
fn retarget_keeps_alpha_and_skips_old_target() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    probe.log.clear();

    machine.set_mode("b", true, &mut probe);
    machine.update(DT, &mut probe);
    machine.update(DT, &mut probe);
    let alpha = machine.fade_alpha();
    assert_eq!(alpha, 100.0);

    assert!(machine.start_transition("c"));
    assert_eq!(machine.fade_alpha(), alpha);
    assert_eq!(machine.phase(), Some(TransitionPhase::FadeOut));

    finish_transition(&mut machine, &mut probe);
    assert_eq!(machine.current_mode_name(), Some("c"));
    assert_eq!(probe.log, vec!["exit a", "enter c from a"]);
}

/// Retargeting during fade-in fades back out from the current opacity.
#[test]
fn retarget_during_fade_in_fades_out_again() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    machine.set_mode("b", true, &mut probe);
    while machine.phase() != Some(TransitionPhase::FadeIn) {
        machine.update(DT, &mut probe);
    }
    machine.update(DT, &mut probe);
    let alpha = machine.fade_alpha();
    assert!(alpha > 0.0 && alpha < 255.0, "mid fade-in, got {alpha}");

    assert!(machine.start_transition("c"));
    assert_eq!(machine.phase(), Some(TransitionPhase::FadeOut));
    assert_eq!(machine.fade_alpha(), alpha);

    finish_transition(&mut machine, &mut probe);
    assert_eq!(machine.current_mode_name(), Some("c"));
    assert_eq!(machine.previous_mode_name(), Some("b"));
}

/// An immediate switch cancels any fade in flight.
#[test]
fn immediate_switch_cancels_fade() {
    let (mut machine, mut probe) = build();
    machine.set_mode("a", false, &mut probe);
    machine.set_mode("b", true, &mut probe);
    machine.update(DT, &mut probe);
    machine.set_mode("c", false, &mut probe);
    assert!(!machine.is_transitioning());
    assert_eq!(machine.fade_alpha(), 0.0);
    assert_eq!(machine.current_mode_name(), Some("c"));
}
