use anyhow::Context;
use bookshelf_app::{fixtures, App};
use bookshelf_authz::password::hash_password;
use bookshelf_kernel::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookshelf-cli")]
#[command(about = "Operate a bookshelf deployment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Purge all data and load the demo fixtures")]
    Seed,

    #[command(about = "Print an argon2 hash suitable for the users table")]
    HashPassword {
        #[arg(help = "Plain-text password to hash")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::HashPassword { password } = &cli.command {
        println!("{}", hash_password(password)?);
        return Ok(());
    }

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    // Bootstrapping applies migrations for every command below.
    let app = App::bootstrap(settings).await?;

    match cli.command {
        Commands::Serve => app.serve().await?,
        Commands::Migrate => tracing::info!("database is up to date"),
        Commands::Seed => {
            let summary = fixtures::load(&app.services).await?;
            println!(
                "loaded {} users, {} authors, {} books",
                summary.users, summary.authors, summary.books
            );
        }
        Commands::HashPassword { .. } => {}
    }

    Ok(())
}
