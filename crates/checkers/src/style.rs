//! CSS class strings for squares and markers.

use crate::board::{Player, is_dark};
use std::rc::Rc;
use tools::{Memo, MemoStats};

pub fn square_style(y: usize, x: usize) -> String {
    if is_dark(y, x) {
        "square black".to_string()
    } else {
        "square".to_string()
    }
}

pub fn marker_style(player: Player, active: bool, king: bool) -> String {
    let mut style = format!("circle {}", player.class_name());
    if king {
        style.push_str(" king");
    }
    if active {
        style.push_str(" active");
    }
    style
}

/// Memoized style lookups. The key spaces are tiny (64 squares, 8 marker
/// variants), so nothing is ever evicted.
#[derive(Debug, Default)]
pub struct StyleCache {
    squares: Memo<(usize, usize), Rc<str>>,
    markers: Memo<(Player, bool, bool), Rc<str>>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn square(&self, y: usize, x: usize) -> Rc<str> {
        self.squares
            .get_or_insert_with((y, x), |&(y, x)| square_style(y, x).into())
    }

    pub fn marker(&self, player: Player, active: bool, king: bool) -> Rc<str> {
        self.markers
            .get_or_insert_with((player, active, king), |&(player, active, king)| {
                marker_style(player, active, king).into()
            })
    }

    pub fn square_stats(&self) -> MemoStats {
        self.squares.stats()
    }

    pub fn marker_stats(&self) -> MemoStats {
        self.markers.stats()
    }
}
