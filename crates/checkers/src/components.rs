use crate::board::{Game, Piece, Pos, SIZE};
use crate::rules::select_square;
use crate::style::StyleCache;
use runtime::Dispatch;
use vdom::{Element, View};

pub fn app(game: &Game, styles: &StyleCache, dispatch: &Dispatch<Game>) -> View {
    Element::new("div")
        .class("app")
        .child(board(game, styles, dispatch))
        .child(status(game))
        .into()
}

pub fn board(game: &Game, styles: &StyleCache, dispatch: &Dispatch<Game>) -> View {
    Element::new("div")
        .class("board")
        .children((0..SIZE).map(|y| row(game, y, styles, dispatch)))
        .into()
}

fn row(game: &Game, y: usize, styles: &StyleCache, dispatch: &Dispatch<Game>) -> View {
    Element::new("div")
        .class("row")
        .children(
            (0..SIZE)
                .filter_map(|x| Pos::new(y, x))
                .map(|pos| square(pos, game.piece(pos), game.is_active(pos), styles, dispatch)),
        )
        .into()
}

/// A board square. Empty squares have no children.
pub fn square(
    pos: Pos,
    piece: Option<Piece>,
    active: bool,
    styles: &StyleCache,
    dispatch: &Dispatch<Game>,
) -> View {
    let square = Element::new("div")
        .id(pos.id())
        .class(&*styles.square(pos.y(), pos.x()))
        .on("click", dispatch.callback(move |game| select_square(game, pos)));
    let square = match piece {
        Some(piece) => square.child(marker(piece, active, styles)),
        None => square,
    };
    square.into()
}

pub fn marker(piece: Piece, active: bool, styles: &StyleCache) -> View {
    Element::new("div")
        .class(&*styles.marker(piece.player, active, piece.king))
        .into()
}

pub fn status(game: &Game) -> View {
    Element::new("p")
        .class("status")
        .child(status_text(game))
        .into()
}

pub fn status_text(game: &Game) -> String {
    match game.winner {
        Some(winner) => format!("Player {} wins", winner.name()),
        None => format!("Player {} to move", game.turn.name()),
    }
}
