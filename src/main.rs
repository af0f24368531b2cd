use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use techendeavor::config;
use techendeavor::pages::{LoginOutcome, SubmitOutcome};
use techendeavor::render;
use techendeavor::shell::routes::Route;
use techendeavor::shell::{App, Page};

#[derive(Debug, Parser)]
#[command(author, version, about = "Read and publish TechEndeavor articles")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Navigate to a route (`/`, `/login`, `/create-blog`, `/blog/<id>`) and print it
    Open {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print one page of the article feed
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Print a single article
    Show { id: i64 },
    /// Sign in and remember the credential
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored credential
    Logout,
    /// Show who the stored credential belongs to
    Whoami,
    /// Publish a new article
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    /// Print an example config file
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::ExampleConfig = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))?;
    let app = App::start(&cfg).await?;

    match args.command {
        Command::Open { path } => {
            let page = app.open(Route::parse(&path)).await;
            show(&app, &page);
        }
        Command::List { page } => {
            let feed = app.open(Route::Feed).await;
            if let Page::Feed(vm) = &feed {
                if page != 1 && vm.go_to_page(page).await.is_none() {
                    let total = vm.window().total_pages();
                    bail!("page {page} is out of range (1..={total})");
                }
            }
            show(&app, &feed);
        }
        Command::Show { id } => {
            let page = app.open(Route::Article(id)).await;
            show(&app, &page);
        }
        Command::Login { username, password } => {
            let page = app.open(Route::Login).await;
            let Page::Login(vm) = &page else {
                bail!("login page unavailable");
            };
            vm.set_username(username);
            vm.set_password(password);
            match vm.submit().await {
                LoginOutcome::SignedIn => {
                    info!("signed in");
                    show(&app, &app.mount_current().await);
                }
                LoginOutcome::MissingField(field) => bail!("{field} is required"),
                LoginOutcome::Failed(message) => bail!(message),
                LoginOutcome::Busy => bail!("a sign-in is already in progress"),
            }
        }
        Command::Logout => {
            app.navbar().sign_out().await;
            println!("{}", render::header(&app.navbar().view()));
        }
        Command::Whoami => {
            let identity = app.session().validate(app.context().api.as_ref()).await?;
            match identity {
                Some(identity) => {
                    app.navbar().toggle_profile_menu();
                    println!("{}", render::header(&app.navbar().view()));
                    info!(user = %identity.display_name, "credential is valid");
                }
                None => println!("Not signed in."),
            }
        }
        Command::Create { title, body } => {
            let page = app.open(Route::CreateArticle).await;
            let Page::CreateArticle(vm) = &page else {
                show(&app, &page);
                bail!("sign in first: techendeavor login --username <name> --password <secret>");
            };
            vm.set_title(title);
            vm.set_body(body);
            match vm.submit().await {
                SubmitOutcome::Published { id } => {
                    println!("Published article #{id}.");
                    show(&app, &app.mount_current().await);
                }
                SubmitOutcome::Invalid(reason) => bail!(reason),
                SubmitOutcome::LoginRequired => bail!("sign in first"),
                SubmitOutcome::Busy => bail!("a publish is already in progress"),
                SubmitOutcome::Failed(message) => {
                    error!(%message, "publish failed");
                    bail!(message);
                }
            }
        }
        // Printed before the config was loaded.
        Command::ExampleConfig => {}
    }

    Ok(())
}

fn show(app: &App, page: &Page) {
    println!("{}", render::header(&app.navbar().view()));
    println!("{}", app.navigator().current());
    println!();
    println!("{}", render::page(page));
}
