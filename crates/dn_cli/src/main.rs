use clap::{Parser, Subcommand};
use dn_crawlers::{CrawlerKind, Fetcher};
use dn_web::AppState;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP news service
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: String,
    },
    /// Run one crawler and print its envelope as JSON
    Crawl {
        /// Crawler shorthand (ai, cctv, transport, commerce)
        source: String,
    },
    /// List available crawlers
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let fetcher = Fetcher::new()?;

    match cli.command {
        Commands::Serve { addr } => {
            let app = dn_web::create_app(AppState { fetcher }).await;
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("🌐 serving news api on {}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Crawl { source } => {
            let crawler = CrawlerKind::from_name(&source, fetcher)?;
            info!("🦗 crawling {}", crawler.origin());
            let response = crawler.get_news().await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::List => {
            println!("Available crawlers:");
            println!("  ai (aibase)");
            println!("  cctv (xwlb)");
            println!("  transport (mot)");
            println!("  commerce (mofcom)");
        }
    }

    Ok(())
}
