use crate::types::ConsoleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Uninitialized,
    /// No payload yet; a first fetch is in flight.
    Loading,
    Ready,
    /// The first fetch failed; only a manual retry leaves this phase.
    Errored,
}

/// How failures of a refresh over an already loaded view are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Keep the data and raise the error indicator.
    #[default]
    Surface,
    /// Keep the data and only log the failure.
    SwallowBackground,
}

/// Identifies one fetch. A result is applied only while its ticket is the
/// newest one issued by the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub struct RefreshableView<T> {
    phase: LoadPhase,
    data: Option<T>,
    error: Option<String>,
    refreshing: bool,
    generation: u64,
    policy: ErrorPolicy,
}

impl<T> Default for RefreshableView<T> {
    fn default() -> Self {
        Self::with_policy(ErrorPolicy::default())
    }
}

impl<T> RefreshableView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ErrorPolicy) -> Self {
        Self {
            phase: LoadPhase::Uninitialized,
            data: None,
            error: None,
            refreshing: false,
            generation: 0,
            policy,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Starts a fetch. Without data the view shows `Loading`; with data it
    /// stays `Ready` and flags `refreshing` instead.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        if self.data.is_some() {
            self.phase = LoadPhase::Ready;
            self.refreshing = true;
        } else {
            self.phase = LoadPhase::Loading;
            self.refreshing = false;
            self.error = None;
        }
        Ticket(self.generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    /// Applies a fetch result. Returns `false` (and changes nothing) when the
    /// ticket was superseded or the view was invalidated meanwhile.
    pub fn complete(&mut self, ticket: Ticket, result: Result<T, ConsoleError>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.refreshing = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.phase = LoadPhase::Ready;
            }
            Err(err) if self.data.is_some() => {
                self.phase = LoadPhase::Ready;
                if self.policy == ErrorPolicy::Surface {
                    self.error = Some(err.to_string());
                }
            }
            Err(err) => {
                self.phase = LoadPhase::Errored;
                self.error = Some(err.to_string());
            }
        }
        true
    }

    /// Orphans every outstanding ticket; data already shown stays.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.refreshing = false;
        if self.phase == LoadPhase::Loading {
            self.phase = LoadPhase::Uninitialized;
        }
    }

    /// Drops everything for a new query key.
    pub fn reset(&mut self) {
        self.invalidate();
        self.phase = LoadPhase::Uninitialized;
        self.data = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> ConsoleError {
        ConsoleError::api(500, Some("database offline".into()))
    }

    #[test]
    fn first_fetch_loads_then_background_fetch_refreshes() {
        let mut view = RefreshableView::new();
        assert_eq!(view.phase(), LoadPhase::Uninitialized);

        let ticket = view.begin();
        assert_eq!(view.phase(), LoadPhase::Loading);
        assert!(!view.is_refreshing());
        assert!(view.complete(ticket, Ok(vec![1, 2])));
        assert_eq!(view.phase(), LoadPhase::Ready);

        let ticket = view.begin();
        assert_eq!(view.phase(), LoadPhase::Ready);
        assert!(view.is_refreshing());
        assert_eq!(view.data(), Some(&vec![1, 2]));
        view.complete(ticket, Ok(vec![3]));
        assert!(!view.is_refreshing());
        assert_eq!(view.data(), Some(&vec![3]));
    }

    #[test]
    fn failed_refresh_keeps_data_and_shows_error() {
        let mut view = RefreshableView::new();
        let ticket = view.begin();
        view.complete(ticket, Ok("D"));

        let ticket = view.begin();
        view.complete(ticket, Err(failure()));
        assert_eq!(view.phase(), LoadPhase::Ready);
        assert_eq!(view.data(), Some(&"D"));
        assert_eq!(view.error(), Some("database offline"));
        assert!(!view.is_refreshing());

        let ticket = view.begin();
        view.complete(ticket, Ok("E"));
        assert_eq!(view.error(), None);
    }

    #[test]
    fn swallowed_background_failure_leaves_no_indicator() {
        let mut view = RefreshableView::with_policy(ErrorPolicy::SwallowBackground);
        let ticket = view.begin();
        view.complete(ticket, Ok(1));
        let ticket = view.begin();
        view.complete(ticket, Err(failure()));
        assert_eq!(view.data(), Some(&1));
        assert_eq!(view.error(), None);
    }

    #[test]
    fn first_failure_is_errored_and_retry_loads_again() {
        let mut view = RefreshableView::<u32>::with_policy(ErrorPolicy::SwallowBackground);
        let ticket = view.begin();
        view.complete(ticket, Err(failure()));
        assert_eq!(view.phase(), LoadPhase::Errored);
        assert_eq!(view.error(), Some("database offline"));

        let ticket = view.begin();
        assert_eq!(view.phase(), LoadPhase::Loading);
        assert_eq!(view.error(), None);
        view.complete(ticket, Ok(7));
        assert_eq!(view.phase(), LoadPhase::Ready);
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let mut view = RefreshableView::new();
        let first = view.begin();
        let second = view.begin();

        assert!(!view.complete(first, Ok("stale")));
        assert_eq!(view.data(), None);
        assert!(view.complete(second, Ok("fresh")));

        let late = view.begin();
        view.invalidate();
        assert!(!view.complete(late, Ok("after teardown")));
        assert_eq!(view.data(), Some(&"fresh"));
    }

    #[test]
    fn same_payload_twice_gives_same_state() {
        let mut view = RefreshableView::new();
        let ticket = view.begin();
        view.complete(ticket, Ok(vec!["a", "b"]));
        let once = (view.phase(), view.data().cloned(), view.error().map(str::to_string));

        let ticket = view.begin();
        view.complete(ticket, Ok(vec!["a", "b"]));
        let twice = (view.phase(), view.data().cloned(), view.error().map(str::to_string));
        assert_eq!(once, twice);
    }
}
