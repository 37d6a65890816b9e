//! Run-wide failure handling.
//!
//! The mirror decides whether a failure ends the run in exactly one place:
//! [`ErrorPolicy::apply`]. Callers hand it the result of a step and get back
//! either the value, a skipped failure to report, or the error to propagate.

use crate::error::MirrorError;

/// How recoverable failures are handled for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Every failure aborts the run.
    #[default]
    Strict,
    /// Recoverable failures are reported and skipped.
    Tolerant,
}

/// The outcome of a step after the policy has been applied.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The step succeeded.
    Completed(T),
    /// The step failed but the run continues.
    Skipped(MirrorError),
}

impl ErrorPolicy {
    /// Policy matching the `--ignore-errors` flag.
    #[must_use]
    pub const fn from_ignore_errors(ignore_errors: bool) -> Self {
        if ignore_errors {
            Self::Tolerant
        } else {
            Self::Strict
        }
    }

    /// Whether recoverable failures are skipped.
    #[must_use]
    pub const fn is_tolerant(self) -> bool {
        matches!(self, Self::Tolerant)
    }

    /// Decide what a step's result means for the run.
    ///
    /// # Errors
    ///
    /// Returns the step's error when the policy is strict or the failure is
    /// not recoverable.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use chartmirror::error::{FsOperation, MirrorError};
    /// use chartmirror::policy::{Attempt, ErrorPolicy};
    ///
    /// let failure = || -> Result<(), MirrorError> {
    ///     Err(MirrorError::Filesystem {
    ///         operation: FsOperation::WriteFile,
    ///         path: Utf8PathBuf::from("demo/app-1.0.0.tgz"),
    ///         source: std::io::Error::other("disk full"),
    ///     })
    /// };
    ///
    /// assert!(ErrorPolicy::Strict.apply(failure()).is_err());
    /// assert!(matches!(
    ///     ErrorPolicy::Tolerant.apply(failure()),
    ///     Ok(Attempt::Skipped(_))
    /// ));
    /// ```
    pub fn apply<T>(self, result: Result<T, MirrorError>) -> Result<Attempt<T>, MirrorError> {
        match result {
            Ok(value) => Ok(Attempt::Completed(value)),
            Err(err) if self.is_tolerant() && err.is_recoverable() => Ok(Attempt::Skipped(err)),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AcquisitionCause, PublishStage};
    use crate::transport::TransportError;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn rename_failure() -> MirrorError {
        MirrorError::Publish {
            stage: PublishStage::Rename,
            path: Utf8PathBuf::from("demo/index.yaml"),
            source: std::io::Error::other("busy"),
        }
    }

    fn rewrite_failure() -> MirrorError {
        MirrorError::Publish {
            stage: PublishStage::WriteRewrite,
            path: Utf8PathBuf::from("demo/downloaded-index.yaml"),
            source: std::io::Error::other("read-only"),
        }
    }

    fn acquisition_failure() -> MirrorError {
        MirrorError::Acquisition {
            url: "https://repo.example/index.yaml".to_owned(),
            cause: AcquisitionCause::Fetch(TransportError::Http {
                url: "https://repo.example/index.yaml".to_owned(),
                reason: "connection refused".to_owned(),
            }),
        }
    }

    #[rstest]
    #[case::strict(ErrorPolicy::Strict)]
    #[case::tolerant(ErrorPolicy::Tolerant)]
    fn successes_pass_through(#[case] policy: ErrorPolicy) {
        let attempt = policy.apply(Ok::<_, MirrorError>(7)).expect("success");
        assert!(matches!(attempt, Attempt::Completed(7)));
    }

    #[rstest]
    #[case::rename(rename_failure())]
    #[case::acquisition(acquisition_failure())]
    fn fatal_failures_abort_even_when_tolerant(#[case] err: MirrorError) {
        let result = ErrorPolicy::Tolerant.apply(Err::<(), _>(err));
        assert!(result.is_err());
    }

    #[test]
    fn strict_policy_aborts_on_recoverable_failures() {
        let result = ErrorPolicy::Strict.apply(Err::<(), _>(rewrite_failure()));
        assert!(result.is_err());
    }

    #[test]
    fn tolerant_policy_skips_rewrite_write_failures() {
        let attempt = ErrorPolicy::Tolerant
            .apply(Err::<(), _>(rewrite_failure()))
            .expect("tolerated");
        assert!(matches!(attempt, Attempt::Skipped(_)));
    }

    #[rstest]
    #[case::ignore(true, ErrorPolicy::Tolerant)]
    #[case::strict(false, ErrorPolicy::Strict)]
    fn from_ignore_errors_maps_flag(#[case] flag: bool, #[case] expected: ErrorPolicy) {
        assert_eq!(ErrorPolicy::from_ignore_errors(flag), expected);
    }
}
