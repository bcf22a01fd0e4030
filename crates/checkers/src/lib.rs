//! Checkers on the `runtime` render loop.
//!
//! The whole game state is a [`Game`]; every click on a square dispatches
//! [`select_square`] for that square and the board is re-rendered.

pub mod board;
pub mod components;
pub mod rules;
pub mod style;

pub use crate::board::{Board, Game, ParsePosError, Piece, Player, Pos, SIZE};
pub use crate::rules::{Move, legal_move, select_square};
pub use crate::style::{StyleCache, marker_style, square_style};

use dom::Document;
use runtime::{Dispatch, Runtime, RuntimeConfig, RuntimeError};
use std::cell::RefCell;
use std::rc::Rc;
use vdom::View;

/// View function for the game, owning its own style cache.
pub fn view_fn() -> impl Fn(&Game, &Dispatch<Game>) -> View + 'static {
    let styles = StyleCache::new();
    move |game: &Game, dispatch: &Dispatch<Game>| components::app(game, &styles, dispatch)
}

/// Mount a game on the element with id `mount_id`.
pub fn mount(
    document: Rc<RefCell<Document>>,
    mount_id: &str,
    game: Game,
    config: RuntimeConfig,
) -> Result<Runtime<Game>, RuntimeError> {
    let runtime = Runtime::mount(document, mount_id, game, view_fn(), config)?;
    log::debug!(target: "checkers", "board mounted on #{mount_id}");
    Ok(runtime)
}
