//! Pagination termination policy.

use crate::types::session::Session;

/// Decide whether the session should advance to the next page.
///
/// Continue only if the pages completed so far are below the target AND a
/// next page demonstrably exists AND the session has not been stopped. A
/// listing with no pagination controls at all probes as `has_next =
/// false` and finalizes after one page.
pub fn should_turn_page(session: &Session, has_next: bool) -> bool {
    if !session.active {
        return false;
    }
    if session.target.is_reached(session.pages_completed()) {
        return false;
    }
    has_next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::session::{PageTarget, SessionMode};

    fn session(target: PageTarget) -> Session {
        Session::new(SessionMode::Jobs, "https://example.com/jobs", 1).with_target(target)
    }

    #[test]
    fn test_continues_below_target_with_next() {
        let s = session(PageTarget::Pages(3));
        assert!(should_turn_page(&s, true));
    }

    #[test]
    fn test_stops_at_target_even_with_next() {
        let mut s = session(PageTarget::Pages(3));
        s.current_page = 3;
        assert!(!should_turn_page(&s, true));
    }

    #[test]
    fn test_stops_without_next_page() {
        let s = session(PageTarget::Pages(10));
        assert!(!should_turn_page(&s, false));

        let unbounded = session(PageTarget::Unbounded);
        assert!(!should_turn_page(&unbounded, false));
    }

    #[test]
    fn test_unbounded_continues_while_next_exists() {
        let mut s = session(PageTarget::Unbounded);
        s.current_page = 500;
        assert!(should_turn_page(&s, true));
    }

    #[test]
    fn test_stopped_session_never_continues() {
        let mut s = session(PageTarget::Pages(10));
        s.active = false;
        assert!(!should_turn_page(&s, true));
    }
}
