use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use tokio::fs;

/// Out-of-band delivery of confirmation codes.
///
/// Real SMTP delivery sits outside this service. When `EMAIL_OUTBOX_DIR` is
/// set, each message is written there as a file (a file-based email backend);
/// otherwise the message body is emitted on the debug log.
pub async fn send_confirmation_code(username: &str, email: &str, code: &str) -> Result<()> {
    let subject = "YaMDb confirmation code";
    let body = format!(
        "Welcome, {username}!\n\nYour confirmation code for obtaining an API token is: {code}\n"
    );

    match std::env::var("EMAIL_OUTBOX_DIR") {
        Ok(dir) => {
            let dir = PathBuf::from(dir);
            fs::create_dir_all(&dir).await?;
            let file = dir.join(format!(
                "{}-{username}.txt",
                Utc::now().format("%Y%m%dT%H%M%S%.3f")
            ));
            fs::write(&file, format!("To: {email}\nSubject: {subject}\n\n{body}")).await?;
        }
        Err(_) => {
            tracing::debug!(%email, %subject, %body, "no outbox configured, message not delivered");
        }
    }

    tracing::info!(%username, %email, "confirmation code dispatched");
    Ok(())
}
