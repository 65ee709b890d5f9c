//! Status enums for the TEXT `status` columns.
//!
//! Each variant's string matches the `CHECK` constraint in the
//! corresponding table.

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Return the database status string.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }

            /// Parse a database status string.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Queue entry lifecycle.
    QueueStatus {
        Waiting = "waiting",
        Called = "called",
        Served = "served",
        Cancelled = "cancelled",
    }
}

define_status_enum! {
    /// Print job lifecycle: `pending -> claimed -> completed | failed`.
    PrintJobStatus {
        Pending = "pending",
        Claimed = "claimed",
        Completed = "completed",
        Failed = "failed",
    }
}

impl PrintJobStatus {
    /// `completed` and `failed` accept no further agent transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, PrintJobStatus::Completed | PrintJobStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_job_status_round_trips_through_str() {
        for status in [
            PrintJobStatus::Pending,
            PrintJobStatus::Claimed,
            PrintJobStatus::Completed,
            PrintJobStatus::Failed,
        ] {
            assert_eq!(PrintJobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PrintJobStatus::parse("running"), None);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!PrintJobStatus::Pending.is_terminal());
        assert!(!PrintJobStatus::Claimed.is_terminal());
        assert!(PrintJobStatus::Completed.is_terminal());
        assert!(PrintJobStatus::Failed.is_terminal());
    }

    #[test]
    fn queue_status_strings_match_schema() {
        assert_eq!(QueueStatus::Waiting.as_str(), "waiting");
        assert_eq!(QueueStatus::Called.to_string(), "called");
        assert_eq!(QueueStatus::parse("served"), Some(QueueStatus::Served));
    }
}
