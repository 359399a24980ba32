//! Hook Tests
//!
//! Hooks driven through a real renderer: state persistence across commits,
//! effect timing and dependency gating, memoized values and stable callbacks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use arbor_core::hooks::{Dispatch, HookRef, StateSetter};
use arbor_core::host::MemNodeId;
use arbor_core::prelude::*;

type Shared<T> = Arc<Mutex<Option<T>>>;

fn mount(component: Component) -> (Renderer<MemoryHost>, MemNodeId) {
    let mut host = MemoryHost::new();
    let container = host.create_container("div", "app");
    let mut renderer = Renderer::new(host);
    renderer.render(
        create_element(component, Props::new(), Vec::<Child>::new()),
        container,
    );
    renderer.flush_sync().unwrap();
    (renderer, container)
}

fn grab<T: Clone>(slot: &Shared<T>) -> T {
    slot.lock().clone().unwrap()
}

/// Effects with deps rerun only when a dependency changes, and the previous
/// cleanup always runs first.
#[test]
fn effect_reruns_only_when_deps_change() {
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    let setters: Shared<(StateSetter<i64>, StateSetter<i64>)> = Arc::default();

    let (effect_log, slot) = (Arc::clone(&log), Arc::clone(&setters));
    let app = Component::new(move |_: &Props| -> RenderResult {
        let (watched, set_watched) = use_state(|| 0i64)?;
        let (other, set_other) = use_state(|| 0i64)?;
        *slot.lock() = Some((set_watched, set_other));

        let log = Arc::clone(&effect_log);
        use_effect(Some(deps![watched]), move || {
            log.lock().push(format!("run {watched}"));
            let log = Arc::clone(&log);
            cleanup(move || log.lock().push(format!("cleanup {watched}")))
        })?;
        Ok(create_element("p", Props::new(), vec![Child::from(watched + other)]))
    });

    let (mut renderer, _) = mount(app);
    let (set_watched, set_other) = grab(&setters);
    assert_eq!(*log.lock(), vec!["run 0"]);

    set_other.set(5);
    renderer.flush_sync().unwrap();
    assert_eq!(*log.lock(), vec!["run 0"]);

    set_watched.set(1);
    renderer.flush_sync().unwrap();
    assert_eq!(*log.lock(), vec!["run 0", "cleanup 0", "run 1"]);
    assert_eq!(renderer.last_commit().unwrap().cleanups_run, 1);
    assert_eq!(renderer.last_commit().unwrap().effects_run, 1);
}

/// An effect without deps runs after every commit of its component.
#[test]
fn effect_without_deps_runs_every_commit() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let app = Component::new(move |_: &Props| -> RenderResult {
        let counter = Arc::clone(&counter);
        use_effect(None, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        })?;
        Ok(Element::empty())
    });

    let (mut renderer, _) = mount(app);
    for _ in 0..3 {
        renderer.update_queue().request_render();
        renderer.flush_sync().unwrap();
    }
    assert_eq!(runs.load(Ordering::SeqCst), 4);
}

/// State set inside an effect schedules one more pass, which flush drains.
#[test]
fn state_set_in_effect_triggers_another_commit() {
    let app = Component::new(|_: &Props| -> RenderResult {
        let (ready, set_ready) = use_state(|| false)?;
        use_effect(Some(deps![]), move || {
            set_ready.set(true);
            None
        })?;
        let label = if ready { "ready" } else { "loading" };
        Ok(create_element("span", Props::new(), vec![label.into()]))
    });

    let (renderer, container) = mount(app);
    assert_eq!(renderer.host().text_content(container), "ready");
    assert_eq!(renderer.commit_count(), 2);
    assert!(renderer.is_idle());
}

/// State survives re-renders triggered from outside the component.
#[test]
fn state_persists_across_unrelated_renders() {
    let setter: Shared<StateSetter<String>> = Arc::default();
    let slot = Arc::clone(&setter);
    let app = Component::new(move |_: &Props| -> RenderResult {
        let (name, set_name) = use_state(|| String::from("anon"))?;
        *slot.lock() = Some(set_name);
        Ok(create_element("b", Props::new(), vec![name.into()]))
    });

    let (mut renderer, container) = mount(app);
    grab(&setter).set("ada".to_string());
    renderer.flush_sync().unwrap();

    renderer.update_queue().request_render();
    renderer.flush_sync().unwrap();
    assert_eq!(renderer.host().text_content(container), "ada");
}

/// Updates from another thread are applied on the next drive.
#[test]
fn setter_works_from_another_thread() {
    let setter: Shared<StateSetter<i64>> = Arc::default();
    let slot = Arc::clone(&setter);
    let app = Component::new(move |_: &Props| -> RenderResult {
        let (n, set_n) = use_state(|| 0i64)?;
        *slot.lock() = Some(set_n);
        Ok(create_element("i", Props::new(), vec![Child::from(n)]))
    });

    let (mut renderer, container) = mount(app);
    let set = grab(&setter);
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let set = set.clone();
            std::thread::spawn(move || set.update(|n| n + 1))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(!renderer.is_idle());
    renderer.flush_sync().unwrap();
    assert_eq!(renderer.host().text_content(container), "4");
}

#[derive(Debug)]
enum Action {
    Push(&'static str),
    Clear,
}

/// Reducer actions queued between renders fold in dispatch order.
#[test]
fn reducer_handles_dispatched_actions() {
    let dispatch: Shared<Dispatch<Action>> = Arc::default();
    let slot = Arc::clone(&dispatch);
    let app = Component::new(move |_: &Props| -> RenderResult {
        let (items, send) = use_reducer(
            |items: &Vec<&'static str>, action: &Action| match action {
                Action::Push(item) => {
                    let mut next = items.clone();
                    next.push(*item);
                    next
                }
                Action::Clear => Vec::new(),
            },
            Vec::new,
        )?;
        *slot.lock() = Some(send);
        let children: Vec<Child> = items
            .iter()
            .map(|item| create_element("li", Props::new().key(item), vec![(*item).into()]).into())
            .collect();
        Ok(create_element("ul", Props::new(), children))
    });

    let (mut renderer, container) = mount(app);
    let send = grab(&dispatch);
    send.dispatch(Action::Push("a"));
    send.dispatch(Action::Push("b"));
    renderer.flush_sync().unwrap();
    assert_eq!(renderer.host().text_content(container), "ab");

    send.dispatch(Action::Clear);
    renderer.flush_sync().unwrap();
    assert_eq!(
        renderer.host().to_html(container),
        r#"<div id="app"><ul></ul></div>"#
    );
}

/// `use_memo` recomputes only on dep change; `use_callback` keeps the same
/// handler so the host sees no listener churn.
#[test]
fn memo_and_callback_are_stable_across_renders() {
    let computed = Arc::new(AtomicUsize::new(0));
    let setter: Shared<StateSetter<i64>> = Arc::default();
    let (count, slot) = (Arc::clone(&computed), Arc::clone(&setter));

    let app = Component::new(move |_: &Props| -> RenderResult {
        let (tick, set_tick) = use_state(|| 0i64)?;
        *slot.lock() = Some(set_tick);

        let count = Arc::clone(&count);
        let label = use_memo(deps![], move || {
            count.fetch_add(1, Ordering::SeqCst);
            String::from("total")
        })?;
        let on_click = use_callback(deps![], |_: &Event| {})?;

        Ok(create_element(
            "button",
            Props::new().handler("click", on_click),
            vec![format!("{label} {tick}").into()],
        ))
    });

    let (mut renderer, container) = mount(app);
    let button = renderer.host().find_by_tag(container, "button").unwrap();
    renderer.host_mut().reset_mutations();

    grab(&setter).set(3);
    renderer.flush_sync().unwrap();

    assert_eq!(computed.load(Ordering::SeqCst), 1);
    assert_eq!(renderer.host().text_content(button), "total 3");
    let log = renderer.host().mutations();
    assert_eq!(log.listeners_added + log.listeners_removed, 0);
    assert_eq!(renderer.host().listener_count(button, "click"), 1);
}

/// Writing a ref does not request a render; the value is seen next time.
#[test]
fn ref_writes_do_not_render() {
    let handle: Shared<HookRef<u32>> = Arc::default();
    let slot = Arc::clone(&handle);
    let app = Component::new(move |_: &Props| -> RenderResult {
        let seen = use_ref(|| 0u32)?;
        *slot.lock() = Some(seen.clone());
        Ok(create_element("em", Props::new(), vec![Child::from(i64::from(seen.current()))]))
    });

    let (mut renderer, container) = mount(app);
    let seen = grab(&handle);
    let commits = renderer.commit_count();
    seen.set(7);
    assert!(renderer.is_idle());
    renderer.flush_sync().unwrap();
    assert_eq!(renderer.commit_count(), commits);

    renderer.update_queue().request_render();
    renderer.flush_sync().unwrap();
    assert_eq!(renderer.host().text_content(container), "7");
}

/// Hooks are usable only while a component renders.
#[test]
fn hooks_outside_render_are_rejected() {
    assert!(!arbor_core::hooks::is_rendering());
    let err = use_state(|| 0).unwrap_err();
    assert!(err.to_string().contains("use_state"));
    assert!(use_ref(|| 0).is_err());
}
