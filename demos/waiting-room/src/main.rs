use std::sync::Arc;
use std::time::Duration;

use confgate::prelude::*;
use tracing::info;

// ---------------------------------------------------------------------------
// Session stand-ins
// ---------------------------------------------------------------------------

/// Accepts a single hard-coded moderator account.
struct DemoUpgrader;

impl RoleUpgrader for DemoUpgrader {
    async fn upgrade(
        &self,
        credentials: Credentials,
        task: UpgradeTask,
    ) -> Result<(), String> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        if task.is_cancelled() {
            return Err("upgrade cancelled".into());
        }
        if credentials.username == "host" && credentials.password == "letmein" {
            Ok(())
        } else {
            Err("not-authorized".into())
        }
    }
}

fn describe(dialog: &Option<DialogDescriptor>) -> String {
    match dialog {
        Some(d) if d.props.is_empty() => format!("{}", d.kind),
        Some(d) => format!("{} {}", d.kind, format_props(d)),
        None => "nothing".into(),
    }
}

fn format_props(d: &DialogDescriptor) -> String {
    d.props
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (auth, service) = AuthService::builder(|| info!("back to the lobby"))
        .auth_config(AuthConfig {
            wait_for_owner_timeout_ms: 400,
        })
        .on_retry(RetryHandler::rearming(|| {
            info!("asking the session layer to rejoin");
            Vec::new()
        }))
        .spawn();

    let mut dialogs = auth.dialogs();
    let screen = tokio::spawn(async move {
        while dialogs.changed().await.is_ok() {
            let shown = describe(&dialogs.borrow_and_update());
            eprintln!("  [screen] {shown}");
        }
    });

    eprintln!("joining a members-only room before its owner arrived");
    auth.conference_failed(ConferenceError::AuthenticationRequired)?;
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    eprintln!("phase: {}", auth.phase().await?);

    eprintln!("\"I am the host\"");
    let sink = Arc::new(auth.clone());
    let mut wait = DialogController::new(
        DialogKind::WaitForOwnerPrompt,
        DialogConfig::default(),
        WaitForOwnerPromptBehavior::new(auth.clone()),
        Arc::clone(&sink),
    );
    wait.submit(())?;
    drop(wait);

    let mut login = DialogController::new(
        DialogKind::LoginPrompt,
        DialogConfig::default(),
        LoginPromptBehavior::new(auth.clone(), Arc::new(DemoUpgrader)),
        sink,
    );

    eprintln!("typing the wrong password");
    if let SubmitProgress::Pending(task) =
        login.submit(Credentials::new("host", "hunter2"))?
    {
        eprintln!("  accepted: {}", task.await?);
    }

    eprintln!("typing the right password");
    if let SubmitProgress::Pending(task) =
        login.submit(Credentials::new("host", "letmein"))?
    {
        eprintln!("  accepted: {}", task.await?);
    }
    drop(login);

    eprintln!("rejoining as moderator");
    auth.conference_joined()?;
    eprintln!("phase: {}", auth.phase().await?);

    auth.shutdown()?;
    service.await?;
    screen.await?;
    Ok(())
}
