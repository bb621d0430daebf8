use anyhow::Result;
use rune_config::MotionConfig;
use rune_motion_core::{
    AnimatedElement, MemoryRouter, MotionEvent, MotionRuntime, NavigationOutcome, ScopeId,
    StaggerDirection, TimelineEngine, TransitionSpec, ViewRetainer, VisualState,
};

const FRAME_MS: f64 = 16.0;

fn fade(id: &str, scope: &str) -> AnimatedElement {
    AnimatedElement::new(id, ScopeId::new(scope))
        .with_initial(VisualState::new().with("opacity", 0.0).with("y", "12px"))
        .with_enter(VisualState::new().with("opacity", 1.0).with("y", "0px"))
        .with_exit(VisualState::new().with("opacity", 0.0).with("y", "-12px"))
}

fn log_events(events: Vec<MotionEvent>, now: f64) {
    for event in events {
        match serde_json::to_string(&event) {
            Ok(json) => log::info!("[{now:>6.0}ms] {json}"),
            Err(e) => log::warn!("failed to serialize event: {e}"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = MotionConfig::load();
    config.validate()?;
    log::info!(
        "fallback={}ms collision={:?} duration={}ms",
        config.gate.fallback_timeout_ms,
        config.gate.collision_policy,
        config.transition.duration_ms
    );

    let mut runtime = MotionRuntime::new(
        config,
        TimelineEngine::new(),
        ViewRetainer::new(),
        MemoryRouter::new("/home".into()),
        "/home".into(),
    );

    runtime.mount(fade("hero", "home"));
    runtime.mount(fade("cta", "home").with_hover(VisualState::new().with("scale", 1.05)));
    runtime.mount(fade("projects", "work").with_transition(
        TransitionSpec::new()
            .with_stagger(60.0, StaggerDirection::Forward)
            .with_delay_children(100.0),
    ));
    for card in ["card-1", "card-2", "card-3"] {
        runtime.mount(fade(card, "work").with_parent("projects"));
    }

    let mut now = 0.0;
    while now < 600.0 {
        runtime.tick(now);
        log_events(runtime.drain_events(), now);
        now += FRAME_MS;
    }

    let mut ticket = runtime.request_navigation("/work");
    log_events(runtime.drain_events(), now);
    let outcome = loop {
        runtime.tick(now);
        log_events(runtime.drain_events(), now);
        if let Some(outcome) = ticket.try_outcome() {
            break outcome;
        }
        now += FRAME_MS;
    };
    match &outcome {
        NavigationOutcome::Committed(location) => log::info!("committed {location} at {now}ms"),
        other => log::warn!("navigation ended without commit: {other:?}"),
    }

    let settle_until = now + 1000.0;
    while now < settle_until {
        now += FRAME_MS;
        runtime.tick(now);
        log_events(runtime.drain_events(), now);
    }

    for element in runtime.registry().all() {
        log::info!("{} [{}] {:?}", element.id, element.scope, element.status);
    }
    Ok(())
}
