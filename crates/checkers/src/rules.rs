//! Move legality and the click-driven state transition.

use crate::board::{Game, Piece, Pos};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Step,
    Jump { captured: Pos },
}

/// Apply a click on `pos` to `game`.
///
/// Without a selection, clicking one of the mover's pieces selects it. With a
/// selection, clicking it again deselects, clicking another own piece moves
/// the selection, and clicking a reachable empty square plays the move. Any
/// other click, and every click after the game is won, changes nothing.
pub fn select_square(game: &Game, pos: Pos) -> Game {
    if game.winner.is_some() {
        return game.clone();
    }
    let owned = game.piece(pos).is_some_and(|piece| piece.player == game.turn);
    match game.active {
        None if owned => Game {
            active: Some(pos),
            ..game.clone()
        },
        Some(active) if active == pos => Game {
            active: None,
            ..game.clone()
        },
        Some(_) if owned => Game {
            active: Some(pos),
            ..game.clone()
        },
        Some(active) => match legal_move(game, active, pos) {
            Some(mv) => play(game, active, pos, mv),
            None => game.clone(),
        },
        None => game.clone(),
    }
}

/// Classify `from -> to` for the player to move, or `None` when illegal.
pub fn legal_move(game: &Game, from: Pos, to: Pos) -> Option<Move> {
    let piece = game.piece(from).filter(|piece| piece.player == game.turn)?;
    if game.piece(to).is_some() || !to.is_dark() {
        return None;
    }
    let dy = to.y() as isize - from.y() as isize;
    let dx = to.x() as isize - from.x() as isize;
    if dy.abs() != dx.abs() || !moves_toward(piece, dy) {
        return None;
    }
    match dy.abs() {
        1 => Some(Move::Step),
        2 => {
            let captured = from.offset(dy / 2, dx / 2)?;
            game.piece(captured)
                .filter(|jumped| jumped.player != piece.player)
                .map(|_| Move::Jump { captured })
        }
        _ => None,
    }
}

fn moves_toward(piece: Piece, dy: isize) -> bool {
    piece.king || dy.signum() == piece.player.forward()
}

fn play(game: &Game, from: Pos, to: Pos, mv: Move) -> Game {
    let mut next = game.clone();
    let Some(mut piece) = next.board[from.y()][from.x()].take() else {
        return next;
    };
    if let Move::Jump { captured } = mv {
        next.board[captured.y()][captured.x()] = None;
    }
    if to.y() == piece.player.crown_row() {
        piece.king = true;
    }
    next.board[to.y()][to.x()] = Some(piece);
    next.active = None;
    let opponent = piece.player.opponent();
    if next.count(opponent) == 0 {
        next.winner = Some(piece.player);
        log::debug!(target: "checkers", "player {} wins", piece.player.name());
    }
    next.turn = opponent;
    log::trace!(target: "checkers", "{mv:?} {from} -> {to}");
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Player;

    fn pos(s: &str) -> Pos {
        s.parse().unwrap()
    }

    fn lone(player: Player, at: &str) -> Game {
        Game::empty(player).with_piece(pos(at), Piece::man(player))
    }

    #[test]
    fn select_then_deselect() {
        let game = Game::new();
        let selected = select_square(&game, pos("5-0"));
        assert_eq!(selected.active, Some(pos("5-0")));
        let cleared = select_square(&selected, pos("5-0"));
        assert_eq!(cleared, game);
    }

    #[test]
    fn cannot_select_opponent_or_empty_square() {
        let game = Game::new();
        assert_eq!(select_square(&game, pos("2-1")), game);
        assert_eq!(select_square(&game, pos("4-1")), game);
    }

    #[test]
    fn clicking_another_own_piece_moves_selection() {
        let game = select_square(&Game::new(), pos("5-0"));
        let game = select_square(&game, pos("5-2"));
        assert_eq!(game.active, Some(pos("5-2")));
    }

    #[test]
    fn step_forward_passes_turn() {
        let game = select_square(&Game::new(), pos("5-2"));
        let game = select_square(&game, pos("4-3"));
        assert_eq!(game.piece(pos("5-2")), None);
        assert_eq!(game.piece(pos("4-3")), Some(Piece::man(Player::One)));
        assert_eq!(game.active, None);
        assert_eq!(game.turn, Player::Two);
    }

    #[test]
    fn men_cannot_step_backward_or_sideways() {
        let game = select_square(&lone(Player::One, "4-3"), pos("4-3"));
        assert_eq!(select_square(&game, pos("5-2")), game);
        assert_eq!(select_square(&game, pos("4-5")), game);
        assert_eq!(select_square(&game, pos("2-5")), game);
    }

    #[test]
    fn kings_step_backward() {
        let game = Game::empty(Player::One).with_piece(pos("4-3"), Piece::king(Player::One));
        let game = select_square(&select_square(&game, pos("4-3")), pos("5-4"));
        assert_eq!(game.piece(pos("5-4")), Some(Piece::king(Player::One)));
    }

    #[test]
    fn jump_captures_and_wins_when_last_piece_falls() {
        let game = lone(Player::One, "4-3").with_piece(pos("3-2"), Piece::man(Player::Two));
        let game = select_square(&select_square(&game, pos("4-3")), pos("2-1"));
        assert_eq!(game.piece(pos("3-2")), None);
        assert_eq!(game.piece(pos("2-1")), Some(Piece::man(Player::One)));
        assert_eq!(game.winner, Some(Player::One));

        // Finished games ignore clicks.
        assert_eq!(select_square(&game, pos("2-1")), game);
    }

    #[test]
    fn jump_over_own_piece_is_illegal() {
        let game = lone(Player::One, "4-3").with_piece(pos("3-2"), Piece::man(Player::One));
        let game = select_square(&game, pos("4-3"));
        assert_eq!(legal_move(&game, pos("4-3"), pos("2-1")), None);
    }

    #[test]
    fn reaching_far_row_crowns() {
        let game = lone(Player::Two, "6-1").with_piece(pos("0-1"), Piece::man(Player::One));
        let game = select_square(&select_square(&game, pos("6-1")), pos("7-2"));
        assert_eq!(game.piece(pos("7-2")), Some(Piece::king(Player::Two)));
        assert_eq!(game.winner, None);
        assert_eq!(game.turn, Player::One);
    }

    #[test]
    fn illegal_destination_keeps_selection() {
        let game = select_square(&Game::new(), pos("5-2"));
        assert_eq!(select_square(&game, pos("3-2")), game);
        assert_eq!(legal_move(&game, pos("5-2"), pos("3-4")), None);
    }
}
