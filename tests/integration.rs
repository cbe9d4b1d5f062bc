//! Integration tests for restyle.
//!
//! These tests exercise the public API from outside the crate: virtualizing
//! style graphs, reassigning through virtual slots, and observing the
//! resulting controller notifications.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use restyle::proxy::{
    is_callable, is_empty_value, is_handle, is_null_value, is_plain_record, is_record,
    is_record_or_null, is_sequence, is_undefined_value,
};
use restyle::testing::{describe, Event, Recorder};
use restyle::*;

fn rule(n: i32) -> Callable {
    Callable::new(move |_| Value::from(n))
}

fn path(s: &str) -> Path {
    s.parse().unwrap()
}

// ---------------------------------------------------------------------------
// Root virtualization and unwrapping
// ---------------------------------------------------------------------------

#[test]
fn test_scalars_pass_through_and_empties_are_wrapped() {
    for scalar in [Value::from(0), Value::from(""), Value::from(true), Value::BigInt(1)] {
        assert_eq!(virtualize(&scalar, false).unwrap(), scalar);
    }
    assert!(is_handle(&virtualize(&Value::Null, false).unwrap()));
    assert!(is_handle(&virtualize(&Value::Undefined, false).unwrap()));
}

#[test]
fn test_unwrap_round_trip() {
    let values = [
        Value::from(Record::new()),
        Value::from(Sequence::new()),
        Value::from(rule(1)),
        Value::Null,
        Value::Undefined,
        Value::from("s"),
    ];
    for value in values {
        let once = virtualize(&value, false).unwrap();
        assert_eq!(unwrap(&once), value);
        let twice = virtualize(&once, false).unwrap();
        assert_eq!(unwrap(&twice), unwrap(&once));
    }
}

#[test]
fn test_empty_predicates() {
    let null = virtualize(&Value::Null, false).unwrap();
    let undefined = virtualize(&Value::Undefined, false).unwrap();
    assert!(is_null_value(&null));
    assert!(is_undefined_value(&undefined));
    assert!(is_empty_value(&null));
    assert!(is_empty_value(&undefined));
    assert!(!is_empty_value(&virtualize(&Value::from(Record::new()), false).unwrap()));
    assert!(is_record_or_null(&null));
    assert!(!is_record(&null));
}

#[test]
fn test_kind_predicates_through_wrapping() {
    let seq = virtualize(&Value::from(Sequence::new()), false).unwrap();
    let rec = virtualize(&Value::from(Record::new()), false).unwrap();
    let func = virtualize(&Value::from(rule(1)), false).unwrap();

    assert!(is_sequence(&seq));
    assert!(is_plain_record(&rec));
    assert!(is_callable(&func));

    let double_rec = virtualize(&rec, false).unwrap();
    assert!(!is_sequence(&double_rec));
    assert!(!is_callable(&double_rec));
    assert!(!is_plain_record(&virtualize(&seq, false).unwrap()));
    assert!(!is_sequence(&virtualize(&func, false).unwrap()));
}

#[test]
fn test_rebind_preserves_identity() {
    let proxy = virtualize(&Value::from(Record::from_entries([("a", 1)])), false).unwrap();
    let before = proxy.clone();
    rebind(&proxy, &Value::from(Record::from_entries([("a", 2)])));
    assert_eq!(unwrap(&proxy).get("a").unwrap(), Value::from(2));
    assert_eq!(proxy, before);
}

// ---------------------------------------------------------------------------
// Update protocol
// ---------------------------------------------------------------------------

#[test]
fn test_merge_on_update_preserves_slot_identity() {
    let owner = Record::from_entries([("child", Value::from(Record::from_entries([("x", 1)])))]);
    virtualize(&Value::from(owner.clone()), true).unwrap();

    let alias = owner.get("child");
    owner
        .set(
            "child",
            Value::from(Record::from_entries([("x", 2), ("y", 3)])),
        )
        .unwrap();

    assert_eq!(owner.get("child"), alias);
    assert_eq!(owner.get("child").get("x").unwrap(), Value::from(2));
    assert_eq!(owner.get("child").get("y").unwrap(), Value::from(3));
}

#[test]
fn test_controller_symmetry() {
    let f = rule(1);
    let owner = Record::from_entries([("fn", Value::from(f.clone()))]);
    let recorder = Rc::new(Recorder::new());
    Virtualizer::with_controller(recorder.clone())
        .virtualize(&Value::from(owner.clone()), true)
        .unwrap();

    assert_eq!(
        recorder.changes(),
        vec![Event::Add {
            path: path("fn"),
            value: Value::from(f.clone()),
        }]
    );

    owner.set("fn", Value::Null).unwrap();
    assert_eq!(
        recorder.changes(),
        vec![
            Event::Add {
                path: path("fn"),
                value: Value::from(f.clone()),
            },
            Event::Delete {
                path: path("fn"),
                value: Value::from(f),
            },
        ]
    );
}

#[test]
fn test_cascade_on_heterogeneous_replacement() {
    let (leaf, replacement) = (rule(1), rule(2));
    let owner = Record::from_entries([(
        "child",
        Value::from(Record::from_entries([("leaf", Value::from(leaf.clone()))])),
    )]);
    let recorder = Rc::new(Recorder::new());
    Virtualizer::with_controller(recorder.clone())
        .virtualize(&Value::from(owner.clone()), true)
        .unwrap();
    recorder.clear();

    owner.set("child", Value::from(replacement.clone())).unwrap();
    assert_eq!(
        recorder.changes(),
        vec![
            Event::Delete {
                path: path("child.leaf"),
                value: Value::from(leaf),
            },
            Event::Add {
                path: path("child"),
                value: Value::from(replacement),
            },
        ]
    );
}

#[test]
fn test_opt_out_respected() {
    let f = rule(1);
    let owner = Record::from_entries([
        ("fn", Value::from(f.clone())),
        ("nested", Value::from(Record::new())),
    ]);
    let recorder = Rc::new(Recorder::new().with_filter(|_, _| false));
    Virtualizer::with_controller(recorder.clone())
        .virtualize(&Value::from(owner.clone()), true)
        .unwrap();

    assert!(!is_handle(&owner.get("fn")));
    assert_eq!(owner.get("fn"), Value::from(f));
    assert!(is_handle(&owner.get("nested")));
}

#[test]
fn test_on_update_can_claim_assignment() {
    struct Freeze {
        claimed: Cell<usize>,
    }

    impl Controller for Freeze {
        fn on_update(&self, _old: &Value, _new: &Value, _path: &Path) -> bool {
            self.claimed.set(self.claimed.get() + 1);
            true
        }
    }

    let f = rule(1);
    let owner = Record::from_entries([("fn", Value::from(f.clone()))]);
    let freeze = Rc::new(Freeze {
        claimed: Cell::new(0),
    });
    Virtualizer::with_controller(freeze.clone())
        .virtualize(&Value::from(owner.clone()), true)
        .unwrap();

    owner.set("fn", Value::from(rule(2))).unwrap();
    owner.set("fn", Value::Null).unwrap();
    assert_eq!(freeze.claimed.get(), 2);
    assert_eq!(unwrap(&owner.get("fn")), Value::from(f));
}

// ---------------------------------------------------------------------------
// Handles, paths and errors
// ---------------------------------------------------------------------------

#[test]
fn test_root_handle_sees_slot_updates() {
    let styles = Record::from_entries([(
        "theme",
        Value::from(Record::from_entries([("color", "red")])),
    )]);
    let root = virtualize(&Value::from(styles.clone()), true).unwrap();

    root.set(
        "theme",
        Value::from(Record::from_entries([("color", "blue")])),
    )
    .unwrap();
    assert_eq!(root.lookup(&path("theme.color")).unwrap(), Value::from("blue"));
    assert_eq!(
        Value::from(styles).lookup(&path("theme.color")).unwrap(),
        Value::from("blue")
    );
}

#[test]
fn test_methods_through_handle_see_real_target() {
    let count = Callable::native(|this, _| Ok(Value::from(this.own_keys()?.len() as f64)));
    let record = Record::from_entries([("a", Value::from(1)), ("count", Value::from(count))]);
    let root = virtualize(&Value::from(record), false).unwrap();
    let method = root.get("count").unwrap();
    assert_eq!(method.call(&[]).unwrap(), Value::from(2));
}

#[test]
fn test_empty_target_errors() {
    let root = virtualize(&Value::Null, false).unwrap();
    let err = root.get("x").unwrap_err();
    assert_eq!(
        err,
        VirtualError::Empty {
            operation: Operation::Get,
            kind: "null",
        }
    );
    assert_eq!(err.to_string(), "cannot read a property of null");
    assert!(root.own_keys().is_err());

    rebind(&root, &Value::from(Record::from_entries([("x", 1)])));
    assert_eq!(root.get("x").unwrap(), Value::from(1));
}

#[test]
fn test_path_parse_errors_convert() {
    fn lookup(root: &Value, text: &str) -> Result<Value, VirtualError> {
        let path: Path = text.parse()?;
        root.lookup(&path)
    }

    let root = Value::from(Record::from_entries([("a", 1)]));
    assert_eq!(lookup(&root, "a").unwrap(), Value::from(1));
    assert!(matches!(lookup(&root, "a..b"), Err(VirtualError::Path(_))));
}

#[test]
fn test_cycle_hits_depth_limit() {
    let owner = Record::new();
    owner.set("me", Value::from(owner.clone())).unwrap();
    let virtualizer =
        Virtualizer::default().with_config(VirtualizeConfig::new().with_max_depth(8));
    virtualizer
        .virtualize(&Value::from(owner.clone()), true)
        .unwrap();

    let other = Record::new();
    other.set("me", Value::from(other.clone())).unwrap();
    assert!(matches!(
        owner.set("me", Value::from(other)),
        Err(VirtualError::DepthExceeded { max: 8, .. })
    ));
}

// ---------------------------------------------------------------------------
// Registry and snapshots
// ---------------------------------------------------------------------------

#[test]
fn test_registry_follows_a_theme_swap() {
    let light = Record::from_entries([
        ("hover", Value::from(rule(1))),
        ("focus", Value::from(rule(2))),
    ]);
    let styles = Record::from_entries([("theme", Value::from(light))]);
    let registry = Rc::new(SlotRegistry::new());
    Virtualizer::with_controller(registry.clone())
        .virtualize(&Value::from(styles.clone()), true)
        .unwrap();
    assert_eq!(registry.paths(), vec![path("theme.focus"), path("theme.hover")]);

    let active = rule(3);
    styles
        .set(
            "theme",
            Value::from(Record::from_entries([
                ("hover", Value::from(rule(4))),
                ("active", Value::from(active.clone())),
            ])),
        )
        .unwrap();
    assert_eq!(registry.paths(), vec![path("theme.active"), path("theme.hover")]);
    assert_eq!(registry.get(&path("theme.active")), Some(Value::from(active)));
}

#[test]
fn test_shallow_policy_keeps_old_keys() {
    let styles = Record::from_entries([(
        "theme",
        Value::from(Record::from_entries([("a", 1), ("b", 2)])),
    )]);
    let virtualizer =
        Virtualizer::default().with_config(VirtualizeConfig::new().with_merge(MergePolicy::Shallow));
    let root = virtualizer
        .virtualize(&Value::from(styles.clone()), true)
        .unwrap();

    styles
        .set("theme", Value::from(Record::from_entries([("c", 3)])))
        .unwrap();
    insta::assert_snapshot!(describe(&root), @"~{theme: ~{a: 1, b: 2, c: 3}}");
}

#[test]
fn test_controller_may_reenter_graph() {
    struct Mirror {
        seen: RefCell<Vec<String>>,
        root: RefCell<Option<Value>>,
    }

    impl Controller for Mirror {
        fn on_add(&self, _value: &Value, path: &Path) {
            if let Some(root) = self.root.borrow().as_ref() {
                let current = root.lookup(path).map(|v| describe(&v));
                self.seen
                    .borrow_mut()
                    .push(format!("{path} = {}", current.unwrap_or_default()));
            }
        }
    }

    let styles = Value::from(Record::from_entries([("hover", Value::from(rule(1)))]));
    let mirror = Rc::new(Mirror {
        seen: RefCell::new(Vec::new()),
        root: RefCell::new(Some(styles.clone())),
    });
    Virtualizer::with_controller(mirror.clone())
        .virtualize(&styles, true)
        .unwrap();
    styles
        .set("hover", Value::from(rule(2).named("second")))
        .unwrap();

    assert_eq!(
        mirror.seen.borrow().clone(),
        vec!["hover = ~fn".to_string(), "hover = ~fn second".to_string()]
    );
}

#[test]
fn test_controller_owning_its_graph_is_freed() {
    struct DropFlag(Rc<Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    struct Owner {
        _styles: Value,
        _flag: DropFlag,
    }

    impl Controller for Owner {}

    let owner_dropped = Rc::new(Cell::new(false));
    let graph_dropped = Rc::new(Cell::new(false));

    let tracker = DropFlag(graph_dropped.clone());
    let hover = Callable::new(move |_| {
        let _held = &tracker;
        Value::Null
    });
    let styles = Value::from(Record::from_entries([
        ("hover", Value::from(hover)),
        (
            "theme",
            Value::from(Record::from_entries([("focus", Value::from(rule(1)))])),
        ),
    ]));
    let owner = Rc::new(Owner {
        _styles: styles.clone(),
        _flag: DropFlag(owner_dropped.clone()),
    });
    let root = Virtualizer::with_controller(owner.clone())
        .virtualize(&styles, true)
        .unwrap();
    assert!(is_handle(&styles.get("hover").unwrap()));

    drop(root);
    drop(styles);
    drop(owner);
    assert!(owner_dropped.get());
    assert!(graph_dropped.get());
}
