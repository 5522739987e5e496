use crate::editor::{SessionEvent, SessionObserver};

const APP_NAME: &str = "docanalysis";

pub fn send(body: impl Into<String>) {
    let body = body.into();
    if let Err(err) = notify_rust::Notification::new()
        .appname(APP_NAME)
        .summary("Document analysis")
        .body(&body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}

/// Shows session notices as desktop notifications and forwards every event to
/// the wrapped observer.
pub struct DesktopNotices<O: SessionObserver> {
    inner: O,
}

impl<O: SessionObserver> DesktopNotices<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: SessionObserver> SessionObserver for DesktopNotices<O> {
    fn notify(&mut self, event: SessionEvent) {
        if let SessionEvent::Notice(notice) = &event {
            send(notice.message());
        }
        self.inner.notify(event);
    }
}
