use crate::View;

/// Pre-order visit of every node in `view`.
pub fn walk<'a>(view: &'a View, f: &mut impl FnMut(&'a View)) {
    f(view);
    for child in view.children() {
        walk(child, f);
    }
}

pub fn find_by_identity<'a>(view: &'a View, identity: &str) -> Option<&'a View> {
    if view.identity() == Some(identity) {
        return Some(view);
    }
    view.children()
        .iter()
        .find_map(|child| find_by_identity(child, identity))
}

pub fn count_nodes(view: &View) -> usize {
    let mut count = 0;
    walk(view, &mut |_| count += 1);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Element;

    fn sample() -> View {
        Element::new("div")
            .id("root")
            .child(Element::new("p").id("a").child("one"))
            .child(Element::new("p").child(Element::new("b").id("deep")))
            .into()
    }

    #[test]
    fn finds_nested_identity() {
        let view = sample();
        assert_eq!(find_by_identity(&view, "deep").and_then(View::tag), Some("b"));
        assert!(find_by_identity(&view, "missing").is_none());
    }

    #[test]
    fn counts_every_node() {
        let view = sample();
        assert_eq!(count_nodes(&view), 5);
    }
}
