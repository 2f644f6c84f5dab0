use proptest::prelude::*;
use stationdb::filter::{NodeFilter, NodeFilterExpression};
use stationdb::node::{NodeDatabase, PropId, Property};
use stationdb::NodeId;

const NAMES: [&str; 6] = ["Alpha", "beta", "Gamma Ray", "delta", "ÉCHO", "alphabet"];

/// Two genres and six stations; station i sits under genre i % 2.
fn fixture() -> (NodeDatabase, Vec<NodeId>) {
    let mut db = NodeDatabase::new("prop");
    let mut ids = Vec::new();
    let genres = [db.create(), db.create()];
    ids.extend(genres);
    for (i, name) in NAMES.iter().enumerate() {
        let id = db.create();
        db.set_property(id, Property::Name(name.to_string())).unwrap();
        db.set_property(id, Property::PlayCount(i as i32)).unwrap();
        db.add_child(genres[i % 2], id).unwrap();
        ids.push(id);
    }
    (db, ids)
}

#[derive(Debug, Clone)]
enum Shape {
    Always,
    Equals(usize),
    HasParent(usize),
    HasChild(usize),
    NodeEquals(usize, usize),
    Contains(String),
    Equal(String),
    PlaysGreater(i64),
    PlaysLess(i64),
}

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        Just(Shape::Always),
        (0..8usize).prop_map(Shape::Equals),
        (0..8usize).prop_map(Shape::HasParent),
        (0..8usize).prop_map(Shape::HasChild),
        (0..8usize, 0..8usize).prop_map(|(a, b)| Shape::NodeEquals(a, b)),
        "[a-eA-E]{0,2}".prop_map(Shape::Contains),
        prop::sample::select(NAMES.to_vec()).prop_map(|s| Shape::Equal(s.to_uppercase())),
        (-1i64..7).prop_map(Shape::PlaysGreater),
        (-1i64..7).prop_map(Shape::PlaysLess),
    ]
}

fn build(shape: &Shape, ids: &[NodeId]) -> NodeFilterExpression {
    match shape {
        Shape::Always => NodeFilterExpression::AlwaysTrue,
        Shape::Equals(i) => NodeFilterExpression::Equals(ids[*i]),
        Shape::HasParent(i) => NodeFilterExpression::HasParent(ids[*i]),
        Shape::HasChild(i) => NodeFilterExpression::HasChild(ids[*i]),
        Shape::NodeEquals(a, b) => NodeFilterExpression::NodeEquals(ids[*a], ids[*b]),
        Shape::Contains(text) => NodeFilterExpression::string_contains(PropId::Name, text),
        Shape::Equal(text) => NodeFilterExpression::string_equals(PropId::Name, text),
        Shape::PlaysGreater(v) => NodeFilterExpression::IntPropertyGreater {
            prop: PropId::PlayCount,
            value: *v,
        },
        Shape::PlaysLess(v) => NodeFilterExpression::IntPropertyLess {
            prop: PropId::PlayCount,
            value: *v,
        },
    }
}

fn levels() -> impl Strategy<Value = Vec<Vec<Shape>>> {
    prop::collection::vec(prop::collection::vec(shape(), 0..4), 0..4)
}

fn filter_from(levels: &[Vec<Shape>], ids: &[NodeId]) -> NodeFilter {
    let mut filter = NodeFilter::new();
    for (level, shapes) in levels.iter().enumerate() {
        for shape in shapes {
            filter.add_expression(build(shape, ids), level);
        }
    }
    filter
}

proptest! {
    #[test]
    fn emptied_filter_matches_every_node(levels in levels()) {
        let (db, ids) = fixture();
        let mut filter = filter_from(&levels, &ids);
        filter.empty();
        for id in &ids {
            prop_assert!(filter.evaluate(&db, *id));
        }
    }

    #[test]
    fn evaluate_is_and_of_ors(levels in levels()) {
        let (db, ids) = fixture();
        let filter = filter_from(&levels, &ids);
        // trailing empty levels are never created by add_expression
        let effective = levels.iter().rposition(|l| !l.is_empty()).map(|p| p + 1).unwrap_or(0);
        for id in &ids {
            let expected = levels[..effective]
                .iter()
                .all(|level| level.iter().any(|s| build(s, &ids).evaluate(&db, *id)));
            prop_assert_eq!(filter.evaluate(&db, *id), expected);
        }
    }

    #[test]
    fn adding_to_a_level_never_narrows(levels in levels(), extra in shape(), pick in 0..4usize) {
        let (db, ids) = fixture();
        let mut filter = filter_from(&levels, &ids);
        prop_assume!(filter.level_count() > 0);
        let level = pick % filter.level_count();
        let before: Vec<bool> = ids.iter().map(|id| filter.evaluate(&db, *id)).collect();
        filter.add_expression(build(&extra, &ids), level);
        for (id, was) in ids.iter().zip(before) {
            if was {
                prop_assert!(filter.evaluate(&db, *id));
            }
        }
    }
}
