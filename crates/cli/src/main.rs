use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use library_cli::api::DEFAULT_API_BASE_URL;
use library_cli::form::Field;
use library_cli::shell::Shell;
use library_cli::{BookListView, HttpBooksApi};
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(name = "library", version, about = "Manage the library catalog from the terminal")]
struct Cli {
    /// Base URL of the library API
    #[arg(long, env = "LIBRARY_API_URL", default_value = DEFAULT_API_BASE_URL, global = true)]
    api_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show all books
    List,
    /// Add a book
    Add(AddArgs),
    /// Edit a book; omitted fields keep their current values
    Edit(EditArgs),
    /// Delete a book
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Interactive session (the default)
    Interactive,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Args, Debug)]
struct EditArgs {
    id: i64,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let api = HttpBooksApi::new(&cli.api_url);
    let mut view = BookListView::new(api);

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Interactive => {
            let stdin = BufReader::new(tokio::io::stdin());
            Shell::new(view, stdin, tokio::io::stdout()).run().await?;
        }
        Command::List => {
            let loaded = view.load().await;
            print!("{}", view.render());
            if !loaded {
                bail!("could not load books from {}", cli.api_url);
            }
        }
        Command::Add(args) => {
            view.open_add();
            let form = view.form_mut();
            form.set(Field::Title, args.title);
            form.set(Field::Author, args.author);
            form.set(Field::Description, args.description);
            submit(&mut view).await?;
        }
        Command::Edit(args) => {
            load_or_bail(&mut view, &cli.api_url).await?;
            if !view.open_edit(args.id) {
                bail!("no book with id {}", args.id);
            }
            let form = view.form_mut();
            for (field, value) in [
                (Field::Title, args.title),
                (Field::Author, args.author),
                (Field::Description, args.description),
            ] {
                if let Some(value) = value {
                    form.set(field, value);
                }
            }
            submit(&mut view).await?;
        }
        Command::Delete { id, yes } => {
            load_or_bail(&mut view, &cli.api_url).await?;
            if view.book(id).is_none() {
                bail!("no book with id {}", id);
            }

            let confirmed = if yes {
                true
            } else {
                let stdin = BufReader::new(tokio::io::stdin());
                let mut shell = Shell::new(view, stdin, tokio::io::stdout());
                let confirmed = shell.confirm_delete(id).await?;
                view = shell.into_view();
                confirmed
            };
            if !confirmed {
                println!("cancelled");
                return Ok(());
            }

            let deleted = view.delete(id).await;
            print!("{}", view.render());
            if !deleted {
                bail!("failed to delete book {}", id);
            }
        }
    }

    Ok(())
}

async fn load_or_bail(view: &mut BookListView<HttpBooksApi>, api_url: &str) -> anyhow::Result<()> {
    if !view.load().await {
        print!("{}", view.render());
        bail!("could not load books from {}", api_url);
    }
    Ok(())
}

async fn submit(view: &mut BookListView<HttpBooksApi>) -> anyhow::Result<()> {
    let saved = view
        .submit_form()
        .await
        .context("the book was not submitted")?;
    print!("{}", view.render());
    if !saved {
        bail!("the book could not be saved");
    }
    Ok(())
}
