use anyhow::Result;
use rune_motion_core::{
    AnimatedElement, ElementEvent, Generation, Location, MemoryRouter, Millis, MotionConfig,
    MotionEvent, MotionRuntime, NoRetention, OrderingPolicy, ScopeId, StaggerDirection,
    TimelineEngine, TransitionSpec, VisualState,
};

type Runtime = MotionRuntime<TimelineEngine, NoRetention, MemoryRouter>;

fn runtime() -> Runtime {
    MotionRuntime::new(
        MotionConfig::default(),
        TimelineEngine::new(),
        NoRetention,
        MemoryRouter::new(Location::new("/home")),
        Location::new("/home"),
    )
}

fn fade_in(id: &str, scope: &str) -> AnimatedElement {
    AnimatedElement::new(id, ScopeId::new(scope))
        .with_initial(VisualState::new().with("opacity", 0.0))
        .with_enter(VisualState::new().with("opacity", 1.0))
}

fn mount_list(rt: &mut Runtime, scope: &str, transition: TransitionSpec) {
    rt.mount(fade_in("list", scope).with_transition(transition));
    for child in ["x", "y", "z"] {
        rt.mount(fade_in(child, scope).with_parent("list"));
    }
}

/// `(element, delay)` of every entrance, in dispatch order.
fn entrances(rt: &mut Runtime) -> Vec<(String, Millis)> {
    rt.drain_events()
        .into_iter()
        .filter_map(|e| match e {
            MotionEvent::Element(ElementEvent::EnterStarted {
                element, delay_ms, ..
            }) => Some((element.to_string(), delay_ms)),
            _ => None,
        })
        .collect()
}

fn owned(expected: &[(&str, Millis)]) -> Vec<(String, Millis)> {
    expected.iter().map(|(id, d)| (id.to_string(), *d)).collect()
}

#[test]
fn forward_stagger_offsets_children() -> Result<()> {
    let mut rt = runtime();
    mount_list(
        &mut rt,
        "home",
        TransitionSpec::new()
            .with_stagger(100.0, StaggerDirection::Forward)
            .with_delay_children(50.0),
    );
    rt.tick(0.0);
    assert_eq!(
        entrances(&mut rt),
        owned(&[("list", 0.0), ("x", 50.0), ("y", 150.0), ("z", 250.0)])
    );
    Ok(())
}

#[test]
fn reverse_stagger_dispatches_last_child_first() -> Result<()> {
    let mut rt = runtime();
    mount_list(
        &mut rt,
        "home",
        TransitionSpec::new()
            .with_stagger(100.0, StaggerDirection::Reverse)
            .with_delay_children(50.0),
    );
    rt.tick(0.0);
    assert_eq!(
        entrances(&mut rt),
        owned(&[("list", 0.0), ("z", 50.0), ("y", 150.0), ("x", 250.0)])
    );
    Ok(())
}

#[test]
fn after_children_parent_waits_for_last_slot() -> Result<()> {
    let mut rt = runtime();
    mount_list(
        &mut rt,
        "home",
        TransitionSpec::new()
            .with_stagger(100.0, StaggerDirection::Forward)
            .with_when(OrderingPolicy::AfterChildren),
    );
    rt.tick(0.0);
    assert_eq!(
        entrances(&mut rt),
        owned(&[("x", 0.0), ("y", 100.0), ("z", 200.0), ("list", 300.0)])
    );
    Ok(())
}

#[test]
fn staggered_children_finish_in_order() -> Result<()> {
    let mut rt = runtime();
    mount_list(
        &mut rt,
        "home",
        TransitionSpec::new().with_stagger(100.0, StaggerDirection::Forward),
    );
    for frame in 0..=42 {
        rt.tick(f64::from(frame) * 10.0);
    }
    let opacity = |rt: &Runtime, id: &str| {
        rt.engine()
            .value(&id.into(), "opacity")
            .and_then(|v| v.as_number())
            .unwrap_or_default()
    };
    // Tweens start on the frame after dispatch (t = 10): x at 10, y at 110, z at 210.
    assert!((opacity(&rt, "x") - 1.0).abs() < 1e-9);
    assert!((opacity(&rt, "y") - 1.0).abs() < 1e-9);
    assert!(opacity(&rt, "z") < 1.0);
    Ok(())
}

#[test]
fn entrance_after_navigation_uses_new_generation() -> Result<()> {
    let mut rt = runtime();
    mount_list(
        &mut rt,
        "work",
        TransitionSpec::new().with_stagger(40.0, StaggerDirection::Forward),
    );
    rt.tick(0.0);
    assert!(entrances(&mut rt).is_empty());

    let mut ticket = rt.request_navigation("/work");
    assert!(ticket.try_outcome().is_some_and(|o| o.is_committed()));

    let generations: Vec<Generation> = rt
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            MotionEvent::Element(ElementEvent::EnterStarted { generation, .. }) => Some(generation),
            _ => None,
        })
        .collect();
    assert_eq!(generations, vec![Generation(1); 4]);
    Ok(())
}

#[test]
fn scope_duration_aggregates() -> Result<()> {
    let mut rt = runtime();
    let exit = |duration: Millis| {
        VisualState::new()
            .with("opacity", 0.0)
            .with_transition(TransitionSpec::new().with_duration(duration))
    };
    rt.mount(AnimatedElement::new("a", ScopeId::new("home")).with_exit(exit(400.0)));
    rt.mount(
        AnimatedElement::new("b", ScopeId::new("home"))
            .with_exit(exit(200.0))
            .with_transition(TransitionSpec::new().with_exit_delay(250.0)),
    );
    let home = ScopeId::new("home");
    assert_eq!(rt.registry().longest_exit_duration(&home), 450.0);
    assert_eq!(rt.registry().total_exit_duration(&home), 850.0);

    rt.unmount(&"b".into());
    assert_eq!(rt.registry().longest_exit_duration(&home), 400.0);
    assert_eq!(rt.registry().longest_exit_duration(&ScopeId::new("work")), 0.0);
    Ok(())
}
