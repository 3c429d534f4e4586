use std::{
    io::{Write, stdout},
    process::ExitCode,
    time::Duration,
};

use chrono::{Local, NaiveDate};
use wcls::{
    config::{Config, DEFAULT_BASE_URL, DEFAULT_SINCE},
    crawl,
    session::{Credentials, Session},
};

/// Collects open assignments and announcements from WebClass and prints
/// them as JSON.
#[derive(clap::Parser)]
#[command(version)]
struct Args {
    #[arg(long, env = "WEBCLASS_URL", default_value = DEFAULT_BASE_URL)]
    url: String,
    #[arg(short, long, env = "WEBCLASS_USERNAME", required_unless_present = "session")]
    username: Option<String>,
    /// Prompted for when absent.
    #[arg(long, env = "WEBCLASS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Reuse an existing WBT_Session cookie instead of logging in.
    #[arg(long, env = "WEBCLASS_SESSION", hide_env_values = true, conflicts_with = "username")]
    session: Option<String>,
    /// Fetch announcements posted since this day.
    #[arg(long, value_name = "YYYY-MM-DD", default_value = DEFAULT_SINCE)]
    since: NaiveDate,
    /// Per-request timeout.
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config {
        base_url: args.url,
        since: args.since,
        timeout: args.timeout.map(Duration::from_secs),
    };
    let now = Local::now().naive_local();

    let report = if let Some(cookie) = args.session {
        let mut session = Session::resume(config, cookie)?;
        let report = crawl::crawl(&mut session, now).await;
        if let Err(e) = session.logout().await {
            tracing::warn!(target: "main", "logout failed: {e}");
        }
        report?
    } else {
        let username = args.username.unwrap_or_default();
        let password = match args.password {
            Some(p) => p,
            None => rpassword::prompt_password("Password: ")?,
        };
        let mut session = Session::new(config)?;
        crawl::run(&mut session, &Credentials::new(username, password), now).await?
    };

    let mut out = stdout().lock();
    serde_json::to_writer_pretty(&mut out, &report)?;
    out.write_all(b"\n")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: "main", "\x1b[31m{e:?}\x1b[0m");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
