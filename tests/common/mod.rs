#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use termexec::engine::{ChannelClient, Session, SessionEvent, SessionRunner};
use termexec::exec::TokioProcessBackend;
use termexec::fs::RealFileSystem;
use termexec_test_utils::builders::ShellSettingsBuilder;
use termexec_test_utils::with_timeout;

/// Runner on the real process backend with the host's standard search path,
/// reporting to a channel.
pub fn host_runner() -> (
    SessionRunner<TokioProcessBackend>,
    UnboundedReceiver<SessionEvent>,
) {
    let environment = ShellSettingsBuilder::new()
        .search_path(&["/usr/local/bin", "/usr/bin", "/bin"])
        .home("/tmp")
        .environment();
    let (client, rx) = ChannelClient::channel();

    let runner = SessionRunner::new(
        TokioProcessBackend::current(),
        environment,
        Arc::new(RealFileSystem),
    )
    .with_client(Arc::new(client));

    (runner, rx)
}

/// Wait (bounded) for the next `Finished` event.
pub async fn next_finished(rx: &mut UnboundedReceiver<SessionEvent>) -> Arc<Session> {
    with_timeout(async {
        loop {
            match rx.recv().await {
                Some(SessionEvent::Finished(session)) => return session,
                Some(SessionEvent::Started(_)) => continue,
                None => panic!("event channel closed before the session finished"),
            }
        }
    })
    .await
}
