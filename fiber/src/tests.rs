use std::cell::RefCell;
use std::rc::Rc;

use undertow_core::{
    ClassComponent, Component, Event, FunctionComponent, Handler, HookViolation, Hooks, Props,
    RenderError, StateSetter, VirtualNode, element, fragment, text,
};
use undertow_memory::{HostOp, MemoryHost, NodeId};

use crate::{CommitReport, Effect, Scheduler, SchedulerConfig, Step, UnitBudget, WorkStatus};

fn session() -> (Scheduler<MemoryHost>, NodeId) {
    session_with(SchedulerConfig::default())
}

fn session_with(config: SchedulerConfig) -> (Scheduler<MemoryHost>, NodeId) {
    let mut host = MemoryHost::new();
    let container = host.create_container("root");
    (Scheduler::with_config(host, config), container)
}

fn list(keys: &[&'static str]) -> VirtualNode {
    element("ul")
        .children(keys.iter().map(|key| element("li").key(*key).text(*key)))
        .build()
}

fn commit(scheduler: &mut Scheduler<MemoryHost>, root: VirtualNode, container: NodeId) -> CommitReport {
    scheduler.render(root, container);
    scheduler
        .flush()
        .expect("render pass failed")
        .expect("nothing was committed")
}

fn items(scheduler: &Scheduler<MemoryHost>, container: NodeId) -> Vec<NodeId> {
    let host = scheduler.host();
    let ul = host.find(container, "ul").expect("no list rendered");
    host.children(ul).to_vec()
}

#[test]
fn first_render_builds_host_tree() {
    let (mut scheduler, container) = session();
    let report = commit(&mut scheduler, list(&["a", "b"]), container);

    assert_eq!(
        scheduler.host().to_markup(container),
        "<root><ul><li>a</li><li>b</li></ul></root>"
    );
    assert_eq!(report.placed(), 5);
    assert_eq!(report.updated(), 0);
    assert_eq!(report.keys(Effect::Place), vec!["a", "b"]);
}

#[test]
fn unchanged_rerender_performs_no_host_mutation() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, list(&["a", "b"]), container);
    scheduler.host_mut().take_operations();

    let report = commit(&mut scheduler, list(&["a", "b"]), container);
    assert!(scheduler.host().operations().is_empty());
    assert_eq!(report.placed(), 0);
    assert_eq!(report.updated(), 5);
    assert_eq!(report.relocated(), 0);
}

#[test]
fn keyed_reorder_moves_and_deletes() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, list(&["a", "b", "c"]), container);
    let before = items(&scheduler, container);

    let report = commit(&mut scheduler, list(&["c", "a"]), container);
    assert_eq!(report.keys(Effect::Delete), vec!["b"]);
    assert_eq!(report.keys(Effect::Update), vec!["c", "a"]);
    assert_eq!(report.keys(Effect::Place), Vec::<String>::new());

    assert_eq!(items(&scheduler, container), vec![before[2], before[0]]);
    assert_eq!(scheduler.host().text_content(container), "ca");
    assert!(!scheduler.host().is_within(before[1], container));
}

#[test]
fn reversed_list_keeps_every_host_node() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, list(&["a", "b", "c", "d"]), container);
    let before = items(&scheduler, container);

    let report = commit(&mut scheduler, list(&["d", "c", "b", "a"]), container);
    assert_eq!(report.relocated(), 3);
    assert_eq!(report.deleted(), 0);
    let after = items(&scheduler, container);
    assert_eq!(after, before.into_iter().rev().collect::<Vec<_>>());
    assert_eq!(scheduler.host().text_content(container), "dcba");
}

#[test]
fn fragment_children_land_between_siblings() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, list(&["a", "c"]), container);

    let tree = element("ul")
        .child(element("li").key("a").text("a"))
        .child(fragment([
            element("li").key("x").text("x"),
            element("li").key("y").text("y"),
        ]))
        .child(element("li").key("c").text("c"))
        .build();
    commit(&mut scheduler, tree, container);

    assert_eq!(scheduler.host().text_content(container), "axyc");
    assert_eq!(items(&scheduler, container).len(), 4);
}

#[test]
fn text_change_only_sets_node_value() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, element("p").text("before").build(), container);
    scheduler.host_mut().take_operations();

    commit(&mut scheduler, element("p").text("after").build(), container);
    let ops = scheduler.host().operations();
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], HostOp::SetProperty { name, .. } if name == "nodeValue"));
    assert_eq!(scheduler.host().text_content(container), "after");
}

#[test]
fn listeners_follow_handler_identity() {
    let (mut scheduler, container) = session();
    let handler = Handler::new(|_: &Event| {});
    let button = |handler: Handler| element("button").on("click", handler).build();

    commit(&mut scheduler, button(handler.clone()), container);
    scheduler.host_mut().take_operations();

    commit(&mut scheduler, button(handler), container);
    assert!(scheduler.host().operations().is_empty());

    commit(&mut scheduler, button(Handler::new(|_: &Event| {})), container);
    let node = scheduler.host().find(container, "button").expect("button");
    assert_eq!(
        scheduler.host().operations(),
        &[
            HostOp::RemoveListener {
                node,
                event: "click".into()
            },
            HostOp::AddListener {
                node,
                event: "click".into()
            },
        ]
    );
    assert_eq!(scheduler.host().listener_count(node), 1);
}

fn counter(hooks: &mut Hooks, _props: &Props) -> VirtualNode {
    let (count, set_count) = hooks.use_state(0_i64);
    element("button")
        .on("click", move |_: &Event| set_count.set(count + 1))
        .text(count.to_string())
        .build()
}

#[test]
fn clicking_counter_rerenders_with_new_state() {
    let (mut scheduler, container) = session();
    let component = FunctionComponent::new(counter);
    commit(&mut scheduler, component.builder().build(), container);
    assert_eq!(scheduler.host().text_content(container), "0");

    let button = scheduler.host().find(container, "button").expect("button");
    assert!(scheduler.host().dispatch(button, &Event::new("click")));
    assert!(scheduler.has_pending_work());

    scheduler.flush().expect("update pass failed");
    assert_eq!(scheduler.host().text_content(container), "1");
    assert_eq!(scheduler.host().find(container, "button"), Some(button));
}

type Exported = Rc<RefCell<Option<StateSetter<i64>>>>;

fn exporting_counter() -> (FunctionComponent, Exported) {
    let slot: Exported = Rc::default();
    let exported = slot.clone();
    let component = FunctionComponent::new(move |hooks: &mut Hooks, _: &Props| {
        let (count, set_count) = hooks.use_state(0_i64);
        *exported.borrow_mut() = Some(set_count);
        element("p").text(count.to_string()).build()
    })
    .named("Counter");
    (component, slot)
}

fn latest(slot: &Exported) -> StateSetter<i64> {
    slot.borrow().clone().expect("component did not render")
}

#[test]
fn setting_current_value_schedules_nothing() {
    let (mut scheduler, container) = session();
    let (component, slot) = exporting_counter();
    commit(&mut scheduler, component.builder().build(), container);

    latest(&slot).set(1);
    assert!(scheduler.has_pending_work());
    scheduler.flush().expect("update pass failed");
    assert_eq!(scheduler.host().text_content(container), "1");

    latest(&slot).set(1);
    assert!(!scheduler.has_pending_work());
    assert_eq!(scheduler.flush(), Ok(None));
}

#[test]
fn queued_updates_fold_in_order() {
    let (mut scheduler, container) = session();
    let (component, slot) = exporting_counter();
    commit(&mut scheduler, component.builder().build(), container);

    let setter = latest(&slot);
    setter.set(5);
    setter.update(|count| count * 2);
    setter.update(|count| count + 1);
    scheduler.flush().expect("update pass failed");
    assert_eq!(scheduler.host().text_content(container), "11");
}

#[test]
fn state_survives_parent_rerender() {
    let (mut scheduler, container) = session();
    let (component, slot) = exporting_counter();
    let tree = |label: &'static str| element("div").text(label).child(component.builder()).build();

    commit(&mut scheduler, tree("first"), container);
    latest(&slot).set(3);
    commit(&mut scheduler, tree("second"), container);
    assert_eq!(scheduler.host().text_content(container), "second3");
}

#[test]
fn state_resets_when_key_changes() {
    let (mut scheduler, container) = session();
    let (component, slot) = exporting_counter();

    commit(&mut scheduler, component.builder().key("x").build(), container);
    latest(&slot).set(4);
    scheduler.flush().expect("update pass failed");
    assert_eq!(scheduler.host().text_content(container), "4");

    commit(&mut scheduler, component.builder().key("y").build(), container);
    assert_eq!(scheduler.host().text_content(container), "0");
}

#[test]
fn state_resets_when_type_changes() {
    let (mut scheduler, container) = session();
    let (component, slot) = exporting_counter();

    commit(&mut scheduler, component.builder().build(), container);
    latest(&slot).set(2);
    scheduler.flush().expect("update pass failed");

    commit(&mut scheduler, element("p").text("plain").build(), container);
    commit(&mut scheduler, component.builder().build(), container);
    assert_eq!(scheduler.host().text_content(container), "0");
}

#[test]
fn keyed_components_relocate_their_host_nodes() {
    let (mut scheduler, container) = session();
    let item = FunctionComponent::new(|_: &mut Hooks, props: &Props| {
        element("li")
            .text(props.get_str("label").unwrap_or_default().to_owned())
            .build()
    });
    let tree = |keys: &[&'static str]| {
        element("ul")
            .children(keys.iter().map(|key| item.builder().key(*key).prop("label", *key)))
            .build()
    };

    commit(&mut scheduler, tree(&["a", "b", "c"]), container);
    let before = items(&scheduler, container);
    let report = commit(&mut scheduler, tree(&["c", "b", "a"]), container);

    assert_eq!(report.relocated(), 2);
    assert_eq!(scheduler.host().text_content(container), "cba");
    assert_eq!(items(&scheduler, container), vec![before[2], before[1], before[0]]);
}

fn flaky(hooks: &mut Hooks, props: &Props) -> VirtualNode {
    let (base, _) = hooks.use_state(1_i64);
    let total = if props.get_bool("extra").unwrap_or(false) {
        base + hooks.use_state(2_i64).0
    } else {
        base
    };
    element("span").text(total.to_string()).build()
}

#[test]
fn changing_hook_count_is_rejected() {
    let (mut scheduler, container) = session();
    let component = FunctionComponent::new(flaky).named("Flaky");
    commit(&mut scheduler, component.builder().prop("extra", true).build(), container);

    scheduler.render(component.builder().prop("extra", false).build(), container);
    let error = scheduler.flush().unwrap_err();
    assert_eq!(
        error,
        RenderError::HookOrderViolation {
            component: "Flaky".into(),
            violation: HookViolation::CountMismatch {
                previous: 2,
                current: 1
            },
        }
    );
    assert!(!scheduler.has_pending_work());
    assert_eq!(scheduler.host().text_content(container), "3");
}

#[test]
fn lenient_hooks_only_warn() {
    let (mut scheduler, container) = session_with(SchedulerConfig::new().with_strict_hooks(false));
    let component = FunctionComponent::new(flaky);
    commit(&mut scheduler, component.builder().prop("extra", true).build(), container);
    commit(&mut scheduler, component.builder().prop("extra", false).build(), container);
    assert_eq!(scheduler.host().text_content(container), "1");
}

struct Title {
    props: Rc<Props>,
}

impl Component for Title {
    fn create(props: Rc<Props>) -> Self {
        Self { props }
    }

    fn render(&self) -> VirtualNode {
        element("h1")
            .text(self.props.get_str("title").unwrap_or_default().to_owned())
            .build()
    }

    fn default_props() -> Props {
        Props::new().with("title", "untitled")
    }
}

#[test]
fn class_components_render_with_defaults() {
    let (mut scheduler, container) = session();
    let title = ClassComponent::of::<Title>();
    commit(&mut scheduler, title.builder().build(), container);
    assert_eq!(scheduler.host().to_markup(container), "<root><h1>untitled</h1></root>");

    commit(&mut scheduler, title.builder().prop("title", "hello").build(), container);
    assert_eq!(scheduler.host().text_content(container), "hello");
}

#[test]
fn invalid_tag_aborts_pass_and_keeps_committed_tree() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, list(&["a"]), container);

    scheduler.render(element("ul").child(element("bad tag")).build(), container);
    let error = scheduler.flush().unwrap_err();
    assert!(matches!(error, RenderError::InvalidDescriptorType { ref type_name, .. } if type_name == "bad tag"));
    assert!(!scheduler.has_pending_work());
    assert_eq!(scheduler.host().text_content(container), "a");

    commit(&mut scheduler, list(&["a", "b"]), container);
    assert_eq!(scheduler.host().text_content(container), "ab");
}

#[test]
fn aborted_pass_releases_its_host_nodes() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, list(&["a"]), container);
    scheduler.host_mut().take_operations();
    let live = scheduler.host().node_count();

    let broken = element("ul")
        .child(element("li").text("x"))
        .child(element("bad tag"))
        .build();
    scheduler.render(broken, container);
    assert!(scheduler.flush().is_err());

    assert_eq!(scheduler.host().node_count(), live);
    assert_eq!(scheduler.host().mutation_count(), 0);
    assert_eq!(scheduler.host().to_markup(container), "<root><ul><li>a</li></ul></root>");
}

#[test]
fn setter_restarts_from_committed_tree() {
    let (mut scheduler, container) = session();
    let (component, slot) = exporting_counter();
    commit(&mut scheduler, element("div").child(component.builder()).build(), container);

    scheduler.render(element("div").child(component.builder()).text("NEW").build(), container);
    latest(&slot).set(1);
    scheduler.flush().expect("update pass failed");

    assert_eq!(scheduler.host().to_markup(container), "<root><div><p>1</p></div></root>");
}

#[test]
fn keyed_text_updates_in_place() {
    let (mut scheduler, container) = session();
    let paragraph = |value: &'static str, key: &'static str| {
        element("p").child(text(value).with_key(key)).build()
    };
    commit(&mut scheduler, paragraph("a", "k1"), container);

    let report = commit(&mut scheduler, paragraph("b", "k2"), container);
    assert_eq!((report.placed(), report.updated(), report.deleted()), (0, 2, 0));
    assert_eq!(scheduler.host().text_content(container), "b");
}

#[test]
fn interrupted_pass_commits_same_tree() {
    let keys = ["a", "b", "c", "d", "e", "f"];

    let (mut reference, reference_container) = session();
    commit(&mut reference, list(&keys), reference_container);

    let (mut scheduler, container) = session();
    scheduler.render(list(&keys), container);
    let mut yields = 0;
    loop {
        match scheduler.perform_work(&UnitBudget::new(2)).expect("render pass failed") {
            WorkStatus::Yielded => {
                yields += 1;
                assert!(scheduler.host().children(container).is_empty());
            }
            WorkStatus::Committed(_) => break,
            WorkStatus::Idle => panic!("pass vanished"),
        }
    }

    assert!(yields > 0);
    assert_eq!(
        scheduler.host().to_markup(container),
        reference.host().to_markup(reference_container)
    );
}

#[test]
fn new_render_abandons_pass_in_progress() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, list(&["a"]), container);
    scheduler.host_mut().take_operations();
    let live = scheduler.host().node_count();

    scheduler.render(list(&["b", "c"]), container);
    // root, ul, li#b and its text node
    assert_eq!(
        scheduler.perform_work(&UnitBudget::new(4)),
        Ok(WorkStatus::Yielded)
    );
    assert_eq!(scheduler.host().text_content(container), "a");
    assert_eq!(scheduler.host().mutation_count(), 0);
    assert_eq!(scheduler.host().node_count(), live + 2);

    commit(&mut scheduler, list(&["a", "d"]), container);
    assert_eq!(scheduler.host().text_content(container), "ad");
    let released = scheduler
        .host()
        .operations()
        .iter()
        .filter(|op| matches!(op, HostOp::ReleaseNode { .. }))
        .count();
    assert_eq!(released, 2);
    // li#d and its text node
    assert_eq!(scheduler.host().node_count(), live + 2);
    // root, ul, two items and their text nodes
    assert_eq!(scheduler.tree().len(), 6);
}

#[test]
fn step_performs_one_unit_at_a_time() {
    let (mut scheduler, container) = session();
    assert_eq!(scheduler.step(), Ok(Step::Idle));

    scheduler.render(element("p").text("x").build(), container);
    for _ in 0..3 {
        assert_eq!(scheduler.step(), Ok(Step::Pending));
    }
    assert!(matches!(scheduler.step(), Ok(Step::Committed(_))));
    assert_eq!(scheduler.step(), Ok(Step::Idle));
    assert_eq!(scheduler.host().text_content(container), "x");
}

#[test]
fn rendering_into_another_container_clears_the_first() {
    let (mut scheduler, first) = session();
    let second = scheduler.host_mut().create_container("other");
    commit(&mut scheduler, list(&["a"]), first);

    commit(&mut scheduler, list(&["b"]), second);
    assert!(scheduler.host().children(first).is_empty());
    assert_eq!(scheduler.host().text_content(second), "b");
}

#[test]
fn arena_only_keeps_committed_tree() {
    let (mut scheduler, container) = session();
    commit(&mut scheduler, list(&["a", "b", "c"]), container);
    commit(&mut scheduler, list(&["b"]), container);
    assert_eq!(scheduler.tree().len(), 4);

    let root = scheduler.committed_root().expect("committed");
    let unit = scheduler.tree().get(root).expect("root unit");
    assert_eq!(unit.effect(), Effect::None);
    assert!(unit.previous().is_none());
}

#[test]
fn commit_records_can_be_disabled() {
    let (mut scheduler, container) = session_with(SchedulerConfig::new().with_record_commits(false));
    let report = commit(&mut scheduler, list(&["a"]), container);
    assert!(report.records().is_empty());
    assert_eq!(report.placed(), 3);
}
