//! Keyboard contract of the review surfaces.
//!
//! | key | command | when |
//! |---|---|---|
//! | `j` | move next | list focused |
//! | `k` | move previous | list focused |
//! | `Enter` | request confirmation | list focused |
//! | `u`, `z`, `Z` | undo last | undo token live |
//! | `y`, `Enter` | confirm | modal open |
//! | `n`, `Esc` | cancel | modal open |
//!
//! Nothing is accepted while a mutation is in flight.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKey {
    Char(char),
    Enter,
    Esc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewCommand {
    MoveNext,
    MovePrevious,
    RequestConfirmation,
    Confirm,
    Cancel,
    UndoLast,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyContext {
    pub busy: bool,
    pub modal_open: bool,
    pub undo_live: bool,
}

pub fn command_for_key(key: ReviewKey, ctx: KeyContext) -> Option<ReviewCommand> {
    if ctx.busy {
        return None;
    }

    if ctx.modal_open {
        return match key {
            ReviewKey::Char('y') | ReviewKey::Enter => Some(ReviewCommand::Confirm),
            ReviewKey::Char('n') | ReviewKey::Esc => Some(ReviewCommand::Cancel),
            _ => None,
        };
    }

    match key {
        ReviewKey::Char('j') => Some(ReviewCommand::MoveNext),
        ReviewKey::Char('k') => Some(ReviewCommand::MovePrevious),
        ReviewKey::Enter => Some(ReviewCommand::RequestConfirmation),
        ReviewKey::Char('u' | 'z' | 'Z') if ctx.undo_live => Some(ReviewCommand::UndoLast),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: KeyContext = KeyContext {
        busy: false,
        modal_open: false,
        undo_live: false,
    };

    #[test]
    fn navigation_keys_map_when_idle() {
        assert_eq!(
            command_for_key(ReviewKey::Char('j'), IDLE),
            Some(ReviewCommand::MoveNext)
        );
        assert_eq!(
            command_for_key(ReviewKey::Char('k'), IDLE),
            Some(ReviewCommand::MovePrevious)
        );
        assert_eq!(
            command_for_key(ReviewKey::Enter, IDLE),
            Some(ReviewCommand::RequestConfirmation)
        );
        assert_eq!(command_for_key(ReviewKey::Char('x'), IDLE), None);
    }

    #[test]
    fn undo_keys_need_a_live_token() {
        let live = KeyContext {
            undo_live: true,
            ..IDLE
        };
        for c in ['u', 'z', 'Z'] {
            assert_eq!(command_for_key(ReviewKey::Char(c), IDLE), None);
            assert_eq!(
                command_for_key(ReviewKey::Char(c), live),
                Some(ReviewCommand::UndoLast)
            );
        }
    }

    #[test]
    fn busy_swallows_everything() {
        let busy = KeyContext {
            busy: true,
            modal_open: true,
            undo_live: true,
        };
        for key in [
            ReviewKey::Char('j'),
            ReviewKey::Char('y'),
            ReviewKey::Char('u'),
            ReviewKey::Enter,
            ReviewKey::Esc,
        ] {
            assert_eq!(command_for_key(key, busy), None);
        }
    }

    #[test]
    fn modal_only_accepts_its_exits() {
        let modal = KeyContext {
            modal_open: true,
            undo_live: true,
            ..IDLE
        };
        assert_eq!(command_for_key(ReviewKey::Char('j'), modal), None);
        assert_eq!(command_for_key(ReviewKey::Char('u'), modal), None);
        assert_eq!(
            command_for_key(ReviewKey::Enter, modal),
            Some(ReviewCommand::Confirm)
        );
        assert_eq!(
            command_for_key(ReviewKey::Char('y'), modal),
            Some(ReviewCommand::Confirm)
        );
        assert_eq!(
            command_for_key(ReviewKey::Esc, modal),
            Some(ReviewCommand::Cancel)
        );
        assert_eq!(
            command_for_key(ReviewKey::Char('n'), modal),
            Some(ReviewCommand::Cancel)
        );
    }
}
