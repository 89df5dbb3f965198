use anyhow::Result;
use mailcal_google::{AppConfig, Session, oauth};

pub async fn run() -> Result<()> {
    let app_config = AppConfig::load()?;
    let redirect_uri = oauth::local_redirect_uri();
    let request = oauth::authorization_url(&app_config, &redirect_uri)?;

    println!("Authenticating with Google...");
    println!("\nOpen this URL in your browser to authenticate:\n");
    println!("{}\n", request.url);

    // Try to open the browser automatically
    if open::that(&request.url).is_err() {
        println!("(Could not open browser automatically, please copy the URL above)");
    }

    let callback = oauth::wait_for_callback(oauth::CALLBACK_PORT).await?;

    if callback.state != request.state {
        anyhow::bail!("OAuth state mismatch, run `mailcal auth` again.");
    }

    println!("Received authorization code, exchanging for tokens...");

    let account = oauth::complete(
        &app_config,
        &callback.code,
        &callback.state,
        &redirect_uri,
        &Session::default_path()?,
    )
    .await?;

    println!("\nAuthenticated as: {account}");
    println!("\nRun `mailcal run` to process unread mail.");

    Ok(())
}
