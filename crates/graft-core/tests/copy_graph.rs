// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]
//! Copier behaviour on small node/link graphs.

use std::sync::Arc;

use graft_core::{
    copy_entity, from_fn, replicate, AttributeType, CopyAll, CopyOptions, CopySession, EntityDef,
    EntityId, EntityLabel, FilterOutcome, IdentityMap, Model, RuleFilter, SchemaBuilder, TypeName,
    Value,
};
use graft_dry_tests::{chain, cycle, empty_model, graph, graph_schema, GraphBuilder};

fn deep() -> CopyOptions {
    CopyOptions::default()
}

fn text(s: &str) -> Value {
    Value::Text(s.to_owned())
}

fn name_of(model: &Model, id: EntityId) -> Value {
    model.value(id, "Name").unwrap()
}

#[test]
fn chain_is_copied_completely_in_pre_order() {
    let (source, nodes) = chain(4);
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &nodes[..1], deep(), &CopyAll).unwrap();

    assert_eq!(report.created, 4);
    assert_eq!(dest.len(), 4);
    let copies: Vec<EntityId> = nodes
        .iter()
        .map(|n| report.identity.lookup(*n).unwrap())
        .collect();
    for (i, copy) in copies.iter().enumerate() {
        assert_eq!(name_of(&dest, *copy), text(&format!("n{i}")));
        assert_eq!(dest.label_of(*copy), Some(EntityLabel::from_raw(i as u64 + 1)));
    }
    for pair in copies.windows(2) {
        assert_eq!(dest.value(pair[0], "Next").unwrap(), Value::Ref(pair[1]));
    }
    assert_eq!(dest.value(copies[3], "Next").unwrap(), Value::Unset);
}

#[test]
fn cycles_terminate_and_close_in_the_destination() {
    let (source, nodes) = cycle(3);
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &nodes[..1], deep(), &CopyAll).unwrap();

    assert_eq!(report.created, 3);
    let root = report.roots[0];
    let last = report.identity.lookup(nodes[2]).unwrap();
    assert_eq!(dest.value(last, "Next").unwrap(), Value::Ref(root));
}

#[test]
fn self_reference_maps_to_the_copy_itself() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    builder.next(a, a);
    let source = builder.finish();
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[a], deep(), &CopyAll).unwrap();

    assert_eq!(report.created, 1);
    let copy = report.roots[0];
    assert_eq!(dest.value(copy, "Next").unwrap(), Value::Ref(copy));
}

#[test]
fn list_order_and_duplicates_are_preserved() {
    let (source, nodes) = graph(4, &[(0, 3), (0, 1), (0, 3), (0, 2)]);
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &nodes[..1], deep(), &CopyAll).unwrap();

    let copy = |i: usize| report.identity.lookup(nodes[i]).unwrap();
    assert_eq!(
        dest.value(copy(0), "Links").unwrap(),
        Value::List(vec![
            Value::Ref(copy(3)),
            Value::Ref(copy(1)),
            Value::Ref(copy(3)),
            Value::Ref(copy(2)),
        ])
    );
    let labels: Vec<u64> = [0, 3, 1, 2]
        .iter()
        .map(|i| dest.label_of(copy(*i)).unwrap().value())
        .collect();
    assert_eq!(labels, vec![1, 2, 3, 4]);
}

#[test]
fn scalars_copy_verbatim() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("it's");
    builder.weight(a, -2.5e-7);
    let source = builder.finish();
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[a], deep(), &CopyAll).unwrap();

    let copy = report.roots[0];
    assert_eq!(name_of(&dest, copy), text("it's"));
    assert_eq!(dest.value(copy, "Weight").unwrap(), Value::Real(-2.5e-7));
}

#[test]
fn shallow_copy_leaves_references_unset() {
    let (source, nodes) = chain(3);
    let mut dest = empty_model(graph_schema());
    let options = CopyOptions {
        deep: false,
        ..deep()
    };
    let report = replicate(&source, &mut dest, &nodes[..1], options, &CopyAll).unwrap();

    assert_eq!(report.created, 1);
    let copy = report.roots[0];
    assert_eq!(name_of(&dest, copy), text("n0"));
    assert_eq!(dest.value(copy, "Next").unwrap(), Value::Unset);
}

#[test]
fn keep_labels_reuses_source_labels() {
    let (source, nodes) = chain(3);
    let mut dest = empty_model(graph_schema());
    let options = CopyOptions {
        keep_labels: true,
        ..deep()
    };
    let report = replicate(&source, &mut dest, &nodes[1..2], options, &CopyAll).unwrap();

    assert_eq!(report.created, 2);
    for node in &nodes[1..] {
        let copy = report.identity.lookup(*node).unwrap();
        assert_eq!(dest.label_of(copy), source.label_of(*node));
    }
    assert!(dest.by_label(EntityLabel::from_raw(1)).is_none());
}

#[test]
fn session_shares_the_identity_map_across_roots() {
    let (source, nodes) = chain(3);
    let mut dest = empty_model(graph_schema());
    let tx = dest.begin("session").unwrap();
    let identity = {
        let mut session = CopySession::new(&source, &mut dest, tx, deep(), &CopyAll);
        let first = session.copy(nodes[0]).unwrap();
        let again = session.copy(nodes[0]).unwrap();
        assert_eq!(first, again);
        let middle = session.copy(nodes[1]).unwrap();
        assert_eq!(session.identity_map().lookup(nodes[1]), Some(middle));
        session.into_identity_map()
    };
    dest.commit(tx).unwrap();

    assert_eq!(dest.len(), 3);
    assert_eq!(identity.len(), 3);
}

#[test]
fn seeded_identity_map_reuses_earlier_copies() {
    let (source, nodes) = chain(2);
    let mut dest = empty_model(graph_schema());
    let tx = dest.begin("first").unwrap();
    let mut identity = IdentityMap::new();
    copy_entity(&source, nodes[1], &mut dest, tx, &mut identity, deep(), &CopyAll).unwrap();
    dest.commit(tx).unwrap();

    let tx = dest.begin("second").unwrap();
    let mut session =
        CopySession::new(&source, &mut dest, tx, deep(), &CopyAll).with_identity_map(identity);
    let roots = session.copy_all([nodes[0]]).unwrap();
    let identity = session.into_identity_map();
    dest.commit(tx).unwrap();

    assert_eq!(dest.len(), 2);
    let tail = identity.lookup(nodes[1]).unwrap();
    assert_eq!(dest.value(roots[0], "Next").unwrap(), Value::Ref(tail));
}

#[test]
fn suppressed_properties_stay_unset_and_are_not_followed() {
    let (source, nodes) = chain(3);
    let mut dest = empty_model(graph_schema());
    let filter = RuleFilter::new().suppress("Next");
    let report = replicate(&source, &mut dest, &nodes[..1], deep(), &filter).unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(dest.value(report.roots[0], "Next").unwrap(), Value::Unset);
}

#[test]
fn type_scoped_suppression_only_hits_matching_entities() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    let b = builder.node("b");
    builder.weight(a, 1.0).weight(b, 2.0);
    let link = builder.link("ab", a, b);
    let source = builder.finish();

    let filter = RuleFilter::new().suppress_on("LINK", "Name");
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[link], deep(), &filter).unwrap();

    assert_eq!(report.created, 3);
    assert_eq!(name_of(&dest, report.roots[0]), Value::Unset);
    let a_copy = report.identity.lookup(a).unwrap();
    assert_eq!(name_of(&dest, a_copy), text("a"));
}

#[test]
fn substitutes_replace_the_source_value() {
    let (source, nodes) = chain(2);
    let filter = from_fn(|property, parent| {
        if property.name() == "Name" && parent.value("Next").is_ok_and(|v| !v.is_unset()) {
            FilterOutcome::Substitute(Value::Text("redacted".to_owned()))
        } else {
            FilterOutcome::Copy
        }
    });
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &nodes[..1], deep(), &filter).unwrap();

    assert_eq!(name_of(&dest, report.roots[0]), text("redacted"));
    let tail = report.identity.lookup(nodes[1]).unwrap();
    assert_eq!(name_of(&dest, tail), text("n1"));
}

#[test]
fn filter_sees_each_property_once_per_entity() {
    use std::cell::RefCell;

    let (source, nodes) = cycle(2);
    let seen = RefCell::new(Vec::new());
    let filter = from_fn(|property, parent| {
        seen.borrow_mut()
            .push((parent.label().value(), property.name().to_owned()));
        FilterOutcome::Copy
    });
    let mut dest = empty_model(graph_schema());
    replicate(&source, &mut dest, &nodes[..1], deep(), &filter).unwrap();

    let seen = seen.into_inner();
    let forward = ["Name", "Weight", "Next", "Links"];
    assert_eq!(seen.len(), 2 * forward.len());
    for label in [1, 2] {
        let names: Vec<&str> = seen
            .iter()
            .filter(|(l, _)| *l == label)
            .map(|(_, name)| name.as_str())
            .collect();
        assert_eq!(names, forward);
    }
}

#[test]
fn inverse_holders_are_copied_and_relinked() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    let b = builder.node("b");
    let link = builder.link("ab", a, b);
    let source = builder.finish();

    let options = CopyOptions {
        copy_inverse_relations: true,
        ..deep()
    };
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[b], options, &CopyAll).unwrap();

    assert_eq!(report.created, 3);
    let b_copy = report.roots[0];
    let a_copy = report.identity.lookup(a).unwrap();
    let link_copy = report.identity.lookup(link).unwrap();
    assert_eq!(dest.value(link_copy, "From").unwrap(), Value::Ref(a_copy));
    assert_eq!(dest.value(link_copy, "To").unwrap(), Value::Ref(b_copy));
    assert_eq!(
        dest.value(b_copy, "Incoming").unwrap(),
        Value::List(vec![Value::Ref(link_copy)])
    );
    assert_eq!(
        dest.value(a_copy, "Outgoing").unwrap(),
        Value::List(vec![Value::Ref(link_copy)])
    );
}

#[test]
fn inverses_are_ignored_unless_enabled() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    let b = builder.node("b");
    builder.link("ab", a, b);
    let source = builder.finish();

    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[b], deep(), &CopyAll).unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(dest.value(report.roots[0], "Incoming").unwrap(), Value::List(Vec::new()));
}

#[test]
fn inverse_allow_list_limits_which_inverses_are_followed() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    let b = builder.node("b");
    builder.link("ab", a, b);
    let source = builder.finish();

    let options = CopyOptions {
        copy_inverse_relations: true,
        ..deep()
    };
    let filter = RuleFilter::new().allow_inverses(["Outgoing"]);
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[b], options, &filter).unwrap();
    assert_eq!(report.created, 1);

    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[a], options, &filter).unwrap();
    assert_eq!(report.created, 3);
}

#[test]
fn withheld_forward_link_is_not_reattached_through_the_inverse() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    let b = builder.node("b");
    let link = builder.link("ab", a, b);
    let source = builder.finish();

    let options = CopyOptions {
        copy_inverse_relations: true,
        ..deep()
    };
    let filter = RuleFilter::new().suppress_on("LINK", "To");
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[b], options, &filter).unwrap();

    let link_copy = report.identity.lookup(link).unwrap();
    assert_eq!(dest.value(link_copy, "To").unwrap(), Value::Unset);
    assert_eq!(dest.value(report.roots[0], "Incoming").unwrap(), Value::List(Vec::new()));
    assert!(report.identity.lookup(a).is_some());
}

#[test]
fn withheld_link_stays_unset_when_a_later_root_reaches_the_holder() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    let b = builder.node("b");
    let link = builder.link("ab", a, b);
    let source = builder.finish();

    let options = CopyOptions {
        copy_inverse_relations: true,
        ..deep()
    };
    let filter = RuleFilter::new().suppress_on("LINK", "To");
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[a, b], options, &filter).unwrap();

    let a_copy = report.roots[0];
    let b_copy = report.roots[1];
    let link_copy = report.identity.lookup(link).unwrap();
    assert_eq!(report.created, 3);
    assert_eq!(dest.value(link_copy, "From").unwrap(), Value::Ref(a_copy));
    assert_eq!(dest.value(link_copy, "To").unwrap(), Value::Unset);
    assert_eq!(dest.value(b_copy, "Incoming").unwrap(), Value::List(Vec::new()));
}

#[test]
fn session_roots_respect_a_type_aware_filter_on_shared_holders() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    let b = builder.node("b");
    let link = builder.link("ab", a, b);
    let source = builder.finish();
    assert!(source.view(link).unwrap().is_a("ITEM"));
    assert!(!source.view(a).unwrap().is_a("LINK"));

    let filter = from_fn(|property, parent| {
        if parent.is_a("LINK") && property.name() == "To" {
            FilterOutcome::Suppress
        } else {
            FilterOutcome::Copy
        }
    });
    let options = CopyOptions {
        copy_inverse_relations: true,
        ..deep()
    };
    let mut dest = empty_model(graph_schema());
    let tx = dest.begin("session").unwrap();
    let (b_copy, identity) = {
        let mut session = CopySession::new(&source, &mut dest, tx, options, &filter);
        session.copy(a).unwrap();
        let b_copy = session.copy(b).unwrap();
        (b_copy, session.into_identity_map())
    };
    dest.commit(tx).unwrap();

    let link_copy = identity.lookup(link).unwrap();
    assert_eq!(dest.value(link_copy, "To").unwrap(), Value::Unset);
    assert_eq!(dest.value(b_copy, "Incoming").unwrap(), Value::List(Vec::new()));
}

#[test]
fn shallow_copy_attaches_inverse_holders_to_the_root() {
    let mut builder = GraphBuilder::new();
    let a = builder.node("a");
    let b = builder.node("b");
    let link = builder.link("ab", a, b);
    let source = builder.finish();

    let options = CopyOptions {
        copy_inverse_relations: true,
        deep: false,
        keep_labels: false,
    };
    let mut dest = empty_model(graph_schema());
    let report = replicate(&source, &mut dest, &[b], options, &CopyAll).unwrap();

    assert_eq!(report.created, 2);
    assert!(report.identity.lookup(a).is_none());
    let b_copy = report.roots[0];
    let link_copy = report.identity.lookup(link).unwrap();
    assert_eq!(dest.value(link_copy, "To").unwrap(), Value::Ref(b_copy));
    assert_eq!(dest.value(link_copy, "From").unwrap(), Value::Unset);
    assert_eq!(name_of(&dest, link_copy), text("ab"));
    assert_eq!(
        dest.value(b_copy, "Incoming").unwrap(),
        Value::List(vec![Value::Ref(link_copy)])
    );
}

#[test]
fn shallow_copy_appends_the_root_to_aggregate_holders() {
    let member = AttributeType::Entity(TypeName::new("NODE"));
    let schema = SchemaBuilder::new("GROUPS")
        .entity(
            EntityDef::new("NODE")
                .attribute("Name", AttributeType::Text)
                .inverse("Groups", "GROUP", "Members"),
        )
        .entity(
            EntityDef::new("GROUP")
                .attribute("Name", AttributeType::Text)
                .optional("Members", AttributeType::List(Box::new(member))),
        )
        .build()
        .unwrap();
    let schema = Arc::new(schema);

    let mut source = Model::new(Arc::clone(&schema));
    let tx = source.begin("build").unwrap();
    let node = TypeName::new("NODE");
    let first = source.create_entity(&node).unwrap();
    let second = source.create_entity(&node).unwrap();
    let group = source.create_entity(&TypeName::new("GROUP")).unwrap();
    source.set_value(first, "Name", text("first")).unwrap();
    source.set_value(second, "Name", text("second")).unwrap();
    source.set_value(group, "Name", text("g")).unwrap();
    source
        .set_value(
            group,
            "Members",
            Value::List(vec![Value::Ref(first), Value::Ref(second)]),
        )
        .unwrap();
    source.commit(tx).unwrap();

    let options = CopyOptions {
        copy_inverse_relations: true,
        deep: false,
        keep_labels: false,
    };
    let mut dest = Model::new(schema);
    let report = replicate(&source, &mut dest, &[second, first], options, &CopyAll).unwrap();

    assert_eq!(report.created, 3);
    let second_copy = report.roots[0];
    let first_copy = report.roots[1];
    let group_copy = report.identity.lookup(group).unwrap();
    assert_eq!(
        dest.value(group_copy, "Members").unwrap(),
        Value::List(vec![Value::Ref(second_copy), Value::Ref(first_copy)])
    );
    for copy in [first_copy, second_copy] {
        assert_eq!(
            dest.value(copy, "Groups").unwrap(),
            Value::List(vec![Value::Ref(group_copy)])
        );
    }
}

#[test]
fn repeated_runs_produce_identical_destinations() {
    let run = || {
        let (source, nodes) = graph(6, &[(0, 4), (4, 2), (2, 0), (0, 5), (5, 5), (1, 3)]);
        let mut dest = empty_model(graph_schema());
        replicate(&source, &mut dest, &[nodes[0], nodes[1]], deep(), &CopyAll).unwrap();
        dest.iter()
            .map(|(id, record)| {
                (
                    id,
                    record.label(),
                    record.type_name().clone(),
                    record.values().to_vec(),
                )
            })
            .collect::<Vec<_>>()
    };
    let first = run();
    assert_eq!(first.len(), 6);
    assert_eq!(first, run());
}
