//! Line-oriented interactive front end over [`BookListView`].

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::api::BooksApi;
use crate::form::{Field, FormError};
use crate::view::BookListView;

const HELP: &str = "\
commands:
  list          show all books
  add           add a book
  edit <id>     edit a book
  delete <id>   delete a book (asks first)
  help          show this message
  quit          leave
";

pub struct Shell<A, R, W> {
    view: BookListView<A>,
    input: Lines<R>,
    output: W,
}

impl<A, R, W> Shell<A, R, W>
where
    A: BooksApi,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(view: BookListView<A>, input: R, output: W) -> Self {
        Self {
            view,
            input: input.lines(),
            output,
        }
    }

    pub fn into_view(self) -> BookListView<A> {
        self.view
    }

    /// Read commands until `quit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.view.load().await;
        self.show_list().await?;

        while let Some(line) = self.prompt("> ").await? {
            let mut words = line.split_whitespace();
            let command = words.next().unwrap_or_default();
            let argument = words.next();

            match (command, argument) {
                ("", _) => {}
                ("quit" | "exit" | "q", _) => break,
                ("help" | "?", _) => self.write(HELP).await?,
                ("list" | "ls", _) => {
                    self.view.load().await;
                    self.show_list().await?;
                }
                ("add", _) => {
                    self.view.open_add();
                    self.fill_and_submit().await?;
                }
                ("edit", Some(id)) => {
                    if let Some(id) = self.parse_listed_id(id).await? {
                        self.view.open_edit(id);
                        self.fill_and_submit().await?;
                    }
                }
                ("delete" | "rm", Some(id)) => {
                    if let Some(id) = self.parse_listed_id(id).await? {
                        if self.confirm_delete(id).await? {
                            self.view.delete(id).await;
                            self.show_list().await?;
                        }
                    }
                }
                _ => {
                    let message = format!("unknown command '{}'; try 'help'\n", line.trim());
                    self.write(&message).await?;
                }
            }
        }

        Ok(())
    }

    /// Ask before deleting; anything but `y`/`yes` declines.
    pub async fn confirm_delete(&mut self, id: i64) -> anyhow::Result<bool> {
        let title = self
            .view
            .book(id)
            .map(|book| book.title.clone())
            .unwrap_or_else(|| format!("book {}", id));

        let answer = self
            .prompt(&format!("Delete \"{}\"? [y/N]: ", title))
            .await?
            .unwrap_or_default();
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    async fn fill_and_submit(&mut self) -> anyhow::Result<()> {
        let heading = format!("{}\n", self.view.form().heading());
        self.write(&heading).await?;

        loop {
            for field in Field::ALL {
                let current = self.view.form().value(field).to_string();
                let Some(answer) = self
                    .prompt(&format!("{} [{}]: ", field.label(), current))
                    .await?
                else {
                    self.view.cancel();
                    return Ok(());
                };

                // Blank keeps the current value, "-" clears it.
                match answer.trim() {
                    "" => {}
                    "-" => self.view.form_mut().set(field, ""),
                    value => self.view.form_mut().set(field, value),
                }
            }

            match self.view.submit_form().await {
                Ok(_) => break,
                Err(FormError::Required(field)) => {
                    self.write(&format!("{} is required\n", field)).await?;
                }
                Err(FormError::Closed) => break,
            }
        }

        self.show_list().await
    }

    async fn parse_listed_id(&mut self, raw: &str) -> anyhow::Result<Option<i64>> {
        match raw.parse::<i64>() {
            Ok(id) if self.view.book(id).is_some() => Ok(Some(id)),
            _ => {
                self.write(&format!("no listed book with id '{}'\n", raw))
                    .await?;
                Ok(None)
            }
        }
    }

    async fn show_list(&mut self) -> anyhow::Result<()> {
        let rendered = self.view.render();
        self.write(&rendered).await
    }

    async fn prompt(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        self.write(prompt).await?;
        self.input
            .next_line()
            .await
            .context("failed to read from input")
    }

    async fn write(&mut self, text: &str) -> anyhow::Result<()> {
        self.output
            .write_all(text.as_bytes())
            .await
            .context("failed to write output")?;
        self.output.flush().await.context("failed to flush output")
    }
}
