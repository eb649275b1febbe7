pub mod cli_consts {
    //! Client Configuration Constants
    //!
    //! Defaults for the view synchronization engine, organized by functional
    //! area. Most of them can be overridden from the config file.

    // =============================================================================
    // QUEUE CONFIGURATION
    // =============================================================================

    /// The maximum number of events to keep in the activity logs.
    pub const MAX_ACTIVITY_LOGS: usize = 100;

    /// Capacity of the event channel between the engine and its display.
    pub const EVENT_QUEUE_SIZE: usize = 100;

    // =============================================================================
    // REFRESH CONFIGURATION
    // =============================================================================

    /// Section refresh timing
    pub mod refresh {
        use std::time::Duration;

        /// Interval of the periodic refresh of every section (seconds)
        pub const PERIODIC_INTERVAL_SECS: u64 = 300;

        /// Delay between a successful write and the refresh that follows it,
        /// giving the server time to settle (milliseconds)
        pub const SETTLE_DELAY_MS: u64 = 1000;

        pub const fn periodic_interval() -> Duration {
            Duration::from_secs(PERIODIC_INTERVAL_SECS)
        }

        pub const fn settle_delay() -> Duration {
            Duration::from_millis(SETTLE_DELAY_MS)
        }
    }

    // =============================================================================
    // NETWORK CONFIGURATION
    // =============================================================================

    /// HTTP client configuration
    pub mod http {
        /// Connect and request timeout (seconds)
        pub const REQUEST_TIMEOUT_SECS: u64 = 10;
    }

    // =============================================================================
    // TRADING CONSTRAINTS
    // =============================================================================

    /// Local constraints checked before any write reaches the server
    pub mod trading {
        /// Smallest fractional share quantity the server accepts
        pub const MIN_QUANTITY: f64 = 0.001;

        /// Feedback rating bounds (inclusive)
        pub const MIN_RATING: u8 = 1;
        pub const MAX_RATING: u8 = 5;
    }
}
