#![no_main]

use dom::{Document, NodeId, NodeType};
use libfuzzer_sys::fuzz_target;
use runtime::{apply, materialize};
use vdom::{Element, View, diff};

const TAGS: [&str; 3] = ["div", "span", "p"];
const KEYS: [&str; 3] = ["id", "class", "title"];
const MAX_DEPTH: usize = 4;
const MAX_CHILDREN: usize = 4;

struct Input<'a> {
    data: &'a [u8],
}

impl Input<'_> {
    fn byte(&mut self) -> u8 {
        match self.data.split_first() {
            Some((byte, rest)) => {
                self.data = rest;
                *byte
            }
            None => 0,
        }
    }
}

fn tree(input: &mut Input<'_>, depth: usize) -> View {
    let shape = input.byte();
    if depth == MAX_DEPTH || shape % 4 == 0 {
        return View::text(format!("t{}", shape % 3));
    }
    let mut element = Element::new(TAGS[(shape as usize / 4) % TAGS.len()]);
    let flags = input.byte();
    for (bit, key) in KEYS.iter().enumerate() {
        if flags & (1 << bit) != 0 {
            element = element.quirk(*key, format!("v{}", (flags >> 4) % 3));
        }
    }
    let children = input.byte() as usize % (MAX_CHILDREN + 1);
    for _ in 0..children {
        element = element.child(tree(input, depth + 1));
    }
    element.into()
}

// Attribute order may differ after patching: keys new to an element are
// appended. Compare attributes as sets.
fn assert_same(a: &Document, a_node: NodeId, b: &Document, b_node: NodeId) {
    assert_eq!(a.node_type(a_node), b.node_type(b_node));
    match a.node_type(a_node) {
        Some(NodeType::Text) => assert_eq!(a.text(a_node), b.text(b_node)),
        _ => {
            assert_eq!(a.tag(a_node), b.tag(b_node));
            let mut a_attrs = a.attributes(a_node).to_vec();
            let mut b_attrs = b.attributes(b_node).to_vec();
            a_attrs.sort();
            b_attrs.sort();
            assert_eq!(a_attrs, b_attrs);
            let a_children = a.child_nodes(a_node).unwrap();
            let b_children = b.child_nodes(b_node).unwrap();
            assert_eq!(a_children.len(), b_children.len());
            for (x, y) in a_children.iter().zip(b_children) {
                assert_same(a, *x, b, *y);
            }
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut input = Input { data };
    let old = tree(&mut input, 0);
    let new = tree(&mut input, 0);

    let mut live = Document::new();
    let mount = live.create_element("div");
    apply(&mut live, mount, diff(None, Some(&old)).as_ref(), 0).unwrap();
    apply(&mut live, mount, diff(Some(&old), Some(&new)).as_ref(), 0).unwrap();
    let children = live.child_nodes(mount).unwrap();
    assert_eq!(children.len(), 1);

    let mut expected = Document::new();
    let expected_root = materialize(&mut expected, &new).unwrap();
    assert_same(&expected, expected_root, &live, children[0]);
});
