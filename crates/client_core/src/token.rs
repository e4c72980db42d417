use shared::domain::RequestToken;

/// Whether a completion was applied or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Discarded,
}

/// Monotonic request tokens for one workflow. Only the latest issued token is
/// current; completions carrying any other token are stale.
#[derive(Debug, Default)]
pub struct TokenSequence {
    latest: u64,
    issued: bool,
}

impl TokenSequence {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        self.issued = true;
        RequestToken(self.latest)
    }

    /// Makes every outstanding token stale without issuing a new request.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.issued = false;
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.issued && token.0 == self.latest
    }

    /// Consumes `token` if it is current. A token settles at most once.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if self.is_current(token) {
            self.issued = false;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_token_is_current() {
        let mut seq = TokenSequence::default();
        let first = seq.issue();
        let second = seq.issue();
        assert!(first < second);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn invalidate_retires_outstanding_token() {
        let mut seq = TokenSequence::default();
        let token = seq.issue();
        seq.invalidate();
        assert!(!seq.is_current(token));
        assert!(!seq.is_current(RequestToken(token.0 + 1)));
        let next = seq.issue();
        assert!(seq.is_current(next));
    }

    #[test]
    fn token_settles_once() {
        let mut seq = TokenSequence::default();
        let token = seq.issue();
        assert!(seq.is_pending());
        assert!(seq.settle(token));
        assert!(!seq.settle(token));
        assert!(!seq.is_pending());
    }

    #[test]
    fn nothing_is_current_before_first_issue() {
        let seq = TokenSequence::default();
        assert!(!seq.is_current(RequestToken(0)));
    }
}
