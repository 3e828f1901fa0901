use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use robocomp_client::{Client, SessionEvent, Settings};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let settings = Settings::new().context("failed to load settings")?;
    info!(
        "using API at {} ({})",
        settings.api.base_url, settings.environment
    );

    let client = Client::new(&settings)?;

    // Surface forced logouts (failed token refresh) while commands run
    let mut events = client.gateway.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if event == SessionEvent::Expired {
                eprintln!("session expired, please log in again");
            }
        }
    });

    client.auth.bootstrap().await;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("login") => {
            let (email, password) = match (args.get(1), args.get(2)) {
                (Some(email), Some(password)) => (email, password),
                _ => bail!("usage: robocomp-client login <email> <password>"),
            };
            let user = client.auth.login(email, password).await?;
            println!("logged in as {} <{}> ({})", user.name, user.email, user.role.as_str());
        }
        Some("register") => {
            let (email, password, name, role) =
                match (args.get(1), args.get(2), args.get(3), args.get(4)) {
                    (Some(email), Some(password), Some(name), Some(role)) => {
                        (email, password, name, role)
                    }
                    _ => bail!("usage: robocomp-client register <email> <password> <name> <role>"),
                };
            let user = client.auth.register(email, password, name, role).await?;
            println!("registered {} <{}> ({})", user.name, user.email, user.role.as_str());
        }
        Some("whoami") => match client.session.user().await {
            Some(user) => {
                println!("{} <{}> ({})", user.name, user.email, user.role.as_str());
                if let Some(team_id) = user.team_id {
                    println!("team: {}", team_id);
                }
            }
            None => println!("not logged in"),
        },
        Some("logout") => {
            client.auth.logout().await;
            println!("logged out");
        }
        Some("teams") => {
            for team in client.teams.list().await? {
                println!(
                    "{}  {} (captain {}, {} members)",
                    team.team_id, team.name, team.captain_name, team.member_count
                );
            }
        }
        Some("events") => {
            for event in client.events.list().await? {
                println!(
                    "{}  {} ({} to {})",
                    event.event_id, event.title, event.start_date, event.end_date
                );
            }
        }
        Some("submissions") => {
            for submission in client.submissions.list().await? {
                println!(
                    "{}  {:?} (submitted {})",
                    submission.submission_id, submission.status, submission.submitted_at
                );
            }
        }
        _ => {
            eprintln!(
                "usage: robocomp-client <login|register|whoami|logout|teams|events|submissions> [args]"
            );
        }
    }

    Ok(())
}
