//! Event router for reconciler notifications.
//!
//! An inbound [`Event`](domain::model::event::Event) is matched against the
//! configured alert rules. Each match gets a provider-specific notifier and
//! is delivered in the background.

pub mod domain {
    pub mod error;
    pub mod model {
        pub mod alert;
        pub mod event;
        pub mod provider;
        pub mod severity;
    }
}

pub mod repository {
    pub mod directory;
}

pub mod service {
    pub mod alert_matcher;
    pub mod dispatch_reporter;
    pub mod notification_dispatcher;
}

pub mod usecase {
    pub mod receive_event;
}

pub mod adapter {
    #[cfg(feature = "http")]
    pub mod http {
        pub mod controller;
        pub mod routes;
    }
    pub mod notifier {
        pub mod generic_notifier;
        pub mod gitlab_notifier;
        pub mod notifier_factory;
    }
}

pub mod config {
    pub mod app_config;
}

pub mod telemetry {
    pub mod tracing;
}
