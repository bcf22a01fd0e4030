use dom::snapshot::{DomSnapshotOptions, NodeRef, compare_dom};
use dom::{Document, Mutation, NodeId, dispatch_event};
use runtime::{
    Dispatch, PatchError, Runtime, RuntimeConfig, RuntimeError, ValidationMode, apply, materialize,
};
use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use vdom::{Element, Patch, View, diff};

fn document_with_mounts(ids: &[&str]) -> Rc<RefCell<Document>> {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    let root = doc.root();
    doc.append_child(root, body).unwrap();
    for id in ids {
        let mount = doc.create_element("div");
        doc.set_attribute(mount, "id", *id).unwrap();
        doc.append_child(body, mount).unwrap();
    }
    doc.take_mutations();
    Rc::new(RefCell::new(doc))
}

fn by_id(document: &Rc<RefCell<Document>>, id: &str) -> NodeId {
    document
        .borrow()
        .get_element_by_id(id)
        .unwrap_or_else(|| panic!("no element #{id}"))
}

fn counter_view(count: &i32, dispatch: &Dispatch<i32>) -> View {
    Element::new("div")
        .class("counter")
        .child(
            Element::new("button")
                .id("inc")
                .on("click", dispatch.callback(|n| n + 1))
                .child("+"),
        )
        .child(Element::new("span").id("value").child(count.to_string()))
        .into()
}

fn value_text(document: &Rc<RefCell<Document>>) -> String {
    let doc = document.borrow();
    let span = doc.get_element_by_id("value").unwrap();
    let text = doc.child_nodes(span).unwrap()[0];
    doc.text(text).unwrap().to_string()
}

fn mount_counter(document: &Rc<RefCell<Document>>, id: &str, start: i32) -> Runtime<i32> {
    Runtime::mount(
        Rc::clone(document),
        id,
        start,
        counter_view,
        RuntimeConfig::default(),
    )
    .unwrap()
}

#[test]
fn mount_replaces_existing_children_and_renders() {
    let document = document_with_mounts(&["root"]);
    let mount = by_id(&document, "root");
    {
        let mut doc = document.borrow_mut();
        let stale = doc.create_text("loading");
        doc.append_child(mount, stale).unwrap();
    }
    let runtime = mount_counter(&document, "root", 3);
    assert_eq!(runtime.render_count(), 1);
    assert_eq!(value_text(&document), "3");
    assert_eq!(document.borrow().child_nodes(mount).unwrap().len(), 1);
    assert_eq!(runtime.listened_event_types(), vec!["click".into()]);
}

#[test]
fn mount_on_missing_element_fails() {
    let document = document_with_mounts(&["root"]);
    let result = Runtime::mount(
        document,
        "nope",
        0,
        counter_view,
        RuntimeConfig::default(),
    );
    assert!(matches!(result, Err(RuntimeError::MountNotFound(id)) if id == "nope"));
}

#[test]
fn click_dispatches_and_patches_in_place() {
    let document = document_with_mounts(&["root"]);
    let runtime = mount_counter(&document, "root", 0);
    let button = by_id(&document, "inc");
    let label = document.borrow().child_nodes(button).unwrap()[0];
    document.borrow_mut().take_mutations();

    dispatch_event(&document, label, "click").unwrap();
    dispatch_event(&document, button, "click").unwrap();

    assert_eq!(*runtime.state(), 2);
    assert_eq!(value_text(&document), "2");
    assert_eq!(runtime.render_count(), 3);
    // The button survived both renders.
    assert_eq!(by_id(&document, "inc"), button);
}

#[test]
fn rerendering_identical_state_records_no_mutations() {
    let document = document_with_mounts(&["root"]);
    let runtime = mount_counter(&document, "root", 5);
    document.borrow_mut().take_mutations();

    runtime.dispatch(|n| *n).unwrap();
    assert!(document.borrow().mutations().is_empty());
    assert_eq!(runtime.render_count(), 2);
}

#[test]
fn diff_from_nothing_matches_direct_materialization() {
    let view: View = Element::new("ul")
        .class("list")
        .children(["a", "b"].map(|t| Element::new("li").quirk("data-k", t).child(t)))
        .into();

    let mut patched = Document::new();
    let mount = patched.create_element("div");
    apply(&mut patched, mount, diff(None, Some(&view)).as_ref(), 0).unwrap();
    let patched_root = patched.child_nodes(mount).unwrap()[0];

    let mut built = Document::new();
    let built_root = materialize(&mut built, &view).unwrap();

    compare_dom(
        NodeRef::new(&built, built_root),
        NodeRef::new(&patched, patched_root),
        DomSnapshotOptions::default(),
    )
    .unwrap();
}

#[test]
fn inserting_in_the_middle_rewrites_the_tail() {
    let letters = |items: &[&str]| -> View {
        Element::new("ul")
            .children(items.iter().map(|t| Element::new("li").child(*t)))
            .into()
    };
    let old = letters(&["A", "B", "C"]);
    let new = letters(&["A", "X", "B", "C"]);

    let Some(Patch::Update { children, quirks }) = diff(Some(&old), Some(&new)) else {
        panic!("expected update");
    };
    assert!(quirks.is_empty());
    assert_eq!(children.len(), 4);
    assert!(children[0].as_ref().is_none_or(Patch::is_noop));
    for patch in &children[1..3] {
        assert!(matches!(patch, Some(Patch::Update { .. })));
    }
    assert!(matches!(children[3], Some(Patch::Create(_))));

    let mut doc = Document::new();
    let mount = doc.create_element("div");
    apply(&mut doc, mount, diff(None, Some(&old)).as_ref(), 0).unwrap();
    apply(&mut doc, mount, diff(Some(&old), Some(&new)).as_ref(), 0).unwrap();
    let mut expected = Document::new();
    let expected_root = materialize(&mut expected, &new).unwrap();
    let actual_root = doc.child_nodes(mount).unwrap()[0];
    compare_dom(
        NodeRef::new(&expected, expected_root),
        NodeRef::new(&doc, actual_root),
        DomSnapshotOptions::default(),
    )
    .unwrap();
}

#[test]
fn multiple_mounts_route_independently() {
    let document = document_with_mounts(&["left", "right"]);
    let left = Runtime::mount(
        Rc::clone(&document),
        "left",
        0,
        |n: &i32, dispatch: &Dispatch<i32>| -> View {
            Element::new("button")
                .id("left-inc")
                .on("click", dispatch.callback(|n| n + 1))
                .child(n.to_string())
                .into()
        },
        RuntimeConfig::default(),
    )
    .unwrap();
    let right = Runtime::mount(
        Rc::clone(&document),
        "right",
        100,
        |n: &i32, dispatch: &Dispatch<i32>| -> View {
            Element::new("button")
                .id("right-dec")
                .on("click", dispatch.callback(|n| n - 1))
                .child(n.to_string())
                .into()
        },
        RuntimeConfig::default(),
    )
    .unwrap();

    let left_button = by_id(&document, "left-inc");
    let right_button = by_id(&document, "right-dec");
    dispatch_event(&document, left_button, "click").unwrap();
    dispatch_event(&document, left_button, "click").unwrap();
    dispatch_event(&document, right_button, "click").unwrap();

    assert_eq!(*left.state(), 2);
    assert_eq!(*right.state(), 99);
}

#[test]
fn panicking_update_keeps_previous_state_and_runtime_usable() {
    let document = document_with_mounts(&["root"]);
    let runtime = mount_counter(&document, "root", 1);

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        runtime.dispatch(|_: &i32| -> i32 { panic!("update failed") })
    }));
    assert!(outcome.is_err());
    assert_eq!(*runtime.state(), 1);
    assert_eq!(value_text(&document), "1");
    assert_eq!(runtime.render_count(), 1);

    runtime.dispatch(|n| n + 10).unwrap();
    assert_eq!(*runtime.state(), 11);
    assert_eq!(value_text(&document), "11");
}

#[test]
fn panicking_view_keeps_previous_state_and_runtime_usable() {
    let document = document_with_mounts(&["root"]);
    let runtime = Runtime::mount(
        Rc::clone(&document),
        "root",
        0,
        |n: &i32, dispatch: &Dispatch<i32>| -> View {
            if *n == 1 {
                panic!("cannot render 1");
            }
            counter_view(n, dispatch)
        },
        RuntimeConfig::default(),
    )
    .unwrap();
    document.borrow_mut().take_mutations();

    let outcome = catch_unwind(AssertUnwindSafe(|| runtime.dispatch(|n| n + 1)));
    assert!(outcome.is_err());
    assert_eq!(*runtime.state(), 0);
    assert_eq!(value_text(&document), "0");
    assert_eq!(runtime.render_count(), 1);
    assert!(document.borrow().mutations().is_empty());

    runtime.dispatch(|n| n + 2).unwrap();
    assert_eq!(*runtime.state(), 2);
    assert_eq!(value_text(&document), "2");
    assert_eq!(runtime.render_count(), 2);
}

#[test]
fn dispatch_from_update_function_is_queued() {
    let document = document_with_mounts(&["root"]);
    let runtime = mount_counter(&document, "root", 1);
    let order = Rc::new(RefCell::new(Vec::new()));

    let dispatch = runtime.dispatcher();
    let log = Rc::clone(&order);
    runtime
        .dispatch(move |n| {
            let queued = Rc::clone(&log);
            dispatch
                .dispatch(move |n| {
                    queued.borrow_mut().push(("queued", *n));
                    n * 10
                })
                .unwrap();
            log.borrow_mut().push(("outer", *n));
            n + 1
        })
        .unwrap();

    // The queued update saw the state produced by the outer one.
    assert_eq!(*order.borrow(), vec![("outer", 1), ("queued", 2)]);
    assert_eq!(*runtime.state(), 20);
    assert_eq!(value_text(&document), "20");
    assert_eq!(runtime.render_count(), 3);
}

#[test]
fn rejected_render_drops_updates_it_queued() {
    let document = document_with_mounts(&["root"]);
    let runtime = Runtime::mount(
        Rc::clone(&document),
        "root",
        0,
        |n: &i32, _: &Dispatch<i32>| -> View {
            let mut root = Element::new("div").child(Element::new("span").id("a"));
            if *n == 1 {
                root = root.child(Element::new("span").id("a"));
            }
            root.child(n.to_string()).into()
        },
        RuntimeConfig {
            validation: ValidationMode::Strict,
        },
    )
    .unwrap();

    let dispatch = runtime.dispatcher();
    let err = runtime
        .dispatch(move |n| {
            dispatch.dispatch(|n| n + 100).unwrap();
            n + 1
        })
        .unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidView(_)));
    assert_eq!(*runtime.state(), 0);
    assert_eq!(runtime.render_count(), 1);

    runtime.dispatch(|n| n + 2).unwrap();
    assert_eq!(*runtime.state(), 2);
    assert_eq!(runtime.render_count(), 2);
}

#[test]
fn unwinding_render_drops_updates_it_queued() {
    let document = document_with_mounts(&["root"]);
    let runtime = mount_counter(&document, "root", 0);

    let dispatch = runtime.dispatcher();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        runtime.dispatch(move |_: &i32| -> i32 {
            dispatch.dispatch(|n| n + 100).unwrap();
            panic!("update failed after queueing");
        })
    }));
    assert!(outcome.is_err());
    assert_eq!(*runtime.state(), 0);
    assert_eq!(runtime.render_count(), 1);

    runtime.dispatch(|n| n + 2).unwrap();
    assert_eq!(*runtime.state(), 2);
    assert_eq!(value_text(&document), "2");
    assert_eq!(runtime.render_count(), 2);
}

#[test]
fn failed_patch_rebuilds_mount_from_current_view() {
    let document = document_with_mounts(&["root"]);
    let runtime = mount_counter(&document, "root", 0);
    let mount = runtime.mount_node();
    {
        // Someone else empties the mount behind the runtime's back.
        let mut doc = document.borrow_mut();
        let child = doc.child_nodes(mount).unwrap()[0];
        doc.remove_child(mount, child).unwrap();
    }

    let err = runtime.dispatch(|n| n + 1).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Patch(PatchError::MissingChild { index: 0, .. })
    ));
    assert_eq!(*runtime.state(), 0);
    assert_eq!(runtime.render_count(), 1);

    {
        let doc = document.borrow();
        let mut expected = Document::new();
        let expected_root = materialize(&mut expected, &runtime.view()).unwrap();
        let children = doc.child_nodes(mount).unwrap();
        assert_eq!(children.len(), 1);
        compare_dom(
            NodeRef::new(&expected, expected_root),
            NodeRef::new(&doc, children[0]),
            DomSnapshotOptions::default(),
        )
        .unwrap();
    }

    // The rebuilt tree is routable and patchable again.
    let button = by_id(&document, "inc");
    dispatch_event(&document, button, "click").unwrap();
    assert_eq!(*runtime.state(), 1);
    assert_eq!(value_text(&document), "1");
}

#[test]
fn dispatch_from_view_function_is_queued() {
    let document = document_with_mounts(&["root"]);
    let renders = Rc::new(Cell::new(0));
    let seen = Rc::clone(&renders);
    let runtime = Runtime::mount(
        Rc::clone(&document),
        "root",
        0,
        move |n: &i32, dispatch: &Dispatch<i32>| -> View {
            seen.set(seen.get() + 1);
            // Odd values immediately ask for the next even one.
            if n % 2 == 1 {
                dispatch.dispatch(|n| n + 1).unwrap();
            }
            Element::new("p").child(n.to_string()).into()
        },
        RuntimeConfig::default(),
    )
    .unwrap();

    runtime.dispatch(|n| n + 1).unwrap();
    assert_eq!(*runtime.state(), 2);
    assert_eq!(renders.get(), 3);
    assert_eq!(runtime.render_count(), 3);
}

#[test]
fn new_event_type_gets_a_listener_after_dispatch() {
    let document = document_with_mounts(&["root"]);
    let runtime = Runtime::mount(
        Rc::clone(&document),
        "root",
        false,
        |editing: &bool, dispatch: &Dispatch<bool>| -> View {
            let mut root = Element::new("div").child(
                Element::new("button")
                    .id("edit")
                    .on("click", dispatch.callback(|_| true)),
            );
            if *editing {
                root = root.child(
                    Element::new("input")
                        .id("name")
                        .on("keydown", dispatch.callback(|_| false)),
                );
            }
            root.into()
        },
        RuntimeConfig::default(),
    )
    .unwrap();
    let mount = runtime.mount_node();
    assert_eq!(document.borrow().listener_count(mount, "keydown"), 0);

    let edit = by_id(&document, "edit");
    dispatch_event(&document, edit, "click").unwrap();
    assert!(*runtime.state());
    assert_eq!(document.borrow().listener_count(mount, "keydown"), 1);
    assert_eq!(document.borrow().listener_count(mount, "click"), 1);

    let input = by_id(&document, "name");
    dispatch_event(&document, input, "keydown").unwrap();
    assert!(!*runtime.state());
}

#[test]
fn strict_validation_rejects_render_and_keeps_previous_ui() {
    let document = document_with_mounts(&["root"]);
    let runtime = Runtime::mount(
        Rc::clone(&document),
        "root",
        0,
        |n: &i32, dispatch: &Dispatch<i32>| -> View {
            let mut root = Element::new("div").child(Element::new("span").id("a").child(n.to_string()));
            if *n > 0 {
                root = root.child(Element::new("span").id("a"));
            }
            root = root.on("click", dispatch.callback(|n| n + 1));
            root.id("app").into()
        },
        RuntimeConfig {
            validation: ValidationMode::Strict,
        },
    )
    .unwrap();
    document.borrow_mut().take_mutations();

    let err = runtime.dispatch(|n| n + 1).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidView(ref errors) if errors.len() == 1));
    assert_eq!(*runtime.state(), 0);
    assert!(document.borrow().mutations().is_empty());
    assert_eq!(runtime.render_count(), 1);
}

#[test]
fn warn_validation_renders_anyway() {
    let document = document_with_mounts(&["root"]);
    let runtime = Runtime::mount(
        Rc::clone(&document),
        "root",
        0,
        |_: &i32, dispatch: &Dispatch<i32>| -> View {
            Element::new("div")
                .on("click", dispatch.callback(|n| n + 1))
                .into()
        },
        RuntimeConfig::default(),
    )
    .unwrap();
    assert_eq!(runtime.render_count(), 1);
    // No identity key, so nothing routes.
    assert!(runtime.event_map().is_empty());
}

#[test]
fn unmount_clears_and_rejects_dispatch() {
    let document = document_with_mounts(&["root"]);
    let runtime = mount_counter(&document, "root", 0);
    let dispatch = runtime.dispatcher();
    let mount = runtime.mount_node();

    runtime.unmount().unwrap();
    assert!(document.borrow().child_nodes(mount).unwrap().is_empty());
    assert_eq!(document.borrow().listener_count(mount, "click"), 0);
    assert!(!dispatch.is_live());
    assert!(matches!(dispatch.dispatch(|n| n + 1), Err(RuntimeError::Unmounted)));
    assert!(matches!(runtime.unmount(), Err(RuntimeError::Unmounted)));
}

#[test]
fn dispatch_after_runtime_dropped_reports_unmounted() {
    let document = document_with_mounts(&["root"]);
    let dispatch = mount_counter(&document, "root", 0).dispatcher();
    assert!(matches!(dispatch.dispatch(|n| n + 1), Err(RuntimeError::Unmounted)));
}

#[test]
fn removed_nodes_produce_child_list_records() {
    let document = document_with_mounts(&["root"]);
    let runtime = Runtime::mount(
        Rc::clone(&document),
        "root",
        3usize,
        |n: &usize, _: &Dispatch<usize>| -> View {
            Element::new("ol")
                .children((0..*n).map(|i| Element::new("li").child(i.to_string())))
                .into()
        },
        RuntimeConfig::default(),
    )
    .unwrap();
    document.borrow_mut().take_mutations();

    runtime.dispatch(|_| 1).unwrap();
    let list = document.borrow().child_nodes(runtime.mount_node()).unwrap()[0];
    assert_eq!(document.borrow().child_nodes(list).unwrap().len(), 1);
    let removals = document
        .borrow()
        .mutations()
        .iter()
        .filter(|m| matches!(m, Mutation::ChildList { removed, .. } if !removed.is_empty()))
        .count();
    assert_eq!(removals, 2);
}
