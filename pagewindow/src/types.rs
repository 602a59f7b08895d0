use crate::PagingError;

/// Outcome of a load, returned both by a [`crate::PagingSource`] (`LoadResult<Vec<T>>`) and by
/// every orchestration call (`LoadResult<()>`).
///
/// `Empty` is an expected outcome (window boundary reached, source had nothing, load cancelled)
/// and is never reported as an error.
#[derive(Clone, Debug)]
pub enum LoadResult<R> {
    Success(R),
    Empty,
    Error(PagingError),
}

impl<R> LoadResult<R> {
    /// Wraps a source-side error as [`PagingError::SourceLoadFailure`].
    pub fn failed(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Error(PagingError::source_failure(err))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error(&self) -> Option<&PagingError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(R) -> U) -> LoadResult<U> {
        match self {
            Self::Success(v) => LoadResult::Success(f(v)),
            Self::Empty => LoadResult::Empty,
            Self::Error(err) => LoadResult::Error(err),
        }
    }

    /// Drops the payload, keeping only the outcome.
    pub fn outcome(self) -> LoadResult<()> {
        self.map(|_| ())
    }
}

impl<R> From<PagingError> for LoadResult<R> {
    fn from(err: PagingError) -> Self {
        Self::Error(err)
    }
}

/// A per-call listener notification.
///
/// Each orchestration call drives its listener through `Started`, then one of `Succeeded`,
/// `NothingToLoad` or `Failed`, then `Completed` (always last).
#[derive(Clone, Debug)]
pub enum LoadSignal {
    Started,
    Succeeded,
    NothingToLoad,
    Failed(PagingError),
    Completed,
}

impl LoadSignal {
    pub(crate) fn outcome_of<R>(result: &LoadResult<R>) -> Self {
        match result {
            LoadResult::Success(_) => Self::Succeeded,
            LoadResult::Empty => Self::NothingToLoad,
            LoadResult::Error(err) => Self::Failed(err.clone()),
        }
    }
}
