use std::{
    error::Error,
    io::Stderr,
};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, MIN_PASSWORD_LEN, Role, Tugrik};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, QueryOrder};

/// Read-only view of the `groups` table for listing.
mod groups {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "groups")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub name: String,
        pub monthly_contribution: i64,
        pub max_members: i32,
        pub created_by: Option<String>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "hamtdaa_admin")]
#[command(about = "Admin utilities for Hamtdaa (bootstrap users, promote admins)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./hamtdaa.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Group(Group),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user; the password is read from the terminal.
    Create(UserCreateArgs),
    /// Grant (or with `--revoke`, remove) the admin role.
    Promote(UserPromoteArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    admin: bool,
}

#[derive(Args, Debug)]
struct UserPromoteArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    revoke: bool,
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    List,
}

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Masked terminal input. Raw mode lasts as long as the value.
struct SecretInput {
    out: Stderr,
}

impl SecretInput {
    fn open() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            out: std::io::stderr(),
        })
    }

    /// Prints a full line above the next prompt.
    fn say(&mut self, line: &str) -> CliResult<()> {
        execute!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(line),
            Print("\r\n")
        )?;
        Ok(())
    }

    /// Reads one masked line. `Esc` gives `None`, `Ctrl-C` aborts.
    fn line(&mut self, prompt: &str) -> CliResult<Option<String>> {
        execute!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(prompt)
        )?;

        let mut secret = String::new();
        loop {
            let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = event::read()?
            else {
                continue;
            };
            let ctrl = modifiers.contains(KeyModifiers::CONTROL);
            match code {
                KeyCode::Enter => {
                    execute!(self.out, Print("\r\n"))?;
                    return Ok(Some(secret));
                }
                KeyCode::Esc => {
                    execute!(self.out, Print("\r\n"))?;
                    return Ok(None);
                }
                KeyCode::Char('c') if ctrl => {
                    execute!(self.out, Print("\r\n"))?;
                    return Err("interrupted".into());
                }
                KeyCode::Backspace => {
                    if secret.pop().is_some() {
                        execute!(self.out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    }
                }
                KeyCode::Char(ch) if !ctrl => {
                    secret.push(ch);
                    execute!(self.out, Print("*"))?;
                }
                _ => {}
            }
        }
    }
}

impl Drop for SecretInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Asks for the new account's password until it passes the sign-up length
/// rule and is typed the same way twice.
fn ask_new_password(email: &str) -> CliResult<String> {
    let mut input = SecretInput::open()?;
    input.say(&format!("Choose a password for {email} (Esc to cancel)."))?;
    for _ in 0..3 {
        let Some(password) = input.line("Password: ")? else {
            return Err("cancelled".into());
        };
        if password.chars().count() < MIN_PASSWORD_LEN {
            input.say(&format!(
                "Passwords need at least {MIN_PASSWORD_LEN} characters."
            ))?;
            continue;
        }
        match input.line("Repeat password: ")? {
            Some(repeat) if repeat == password => return Ok(password),
            Some(_) => input.say("The two entries differ.")?,
            None => return Err("cancelled".into()),
        }
    }
    Err("no valid password after 3 attempts".into())
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = ask_new_password(&args.email)?;
            let role = if args.admin { Role::Admin } else { Role::User };

            let engine = Engine::builder().database(db).build().await?;
            let user = engine
                .create_user(&args.email, &password, &args.name, role)
                .await?;
            println!("created user: {} ({}, {})", user.email, user.id, user.role.as_str());
        }
        Command::User(User {
            command: UserCommand::Promote(args),
        }) => {
            let role = if args.revoke { Role::User } else { Role::Admin };
            let engine = Engine::builder().database(db).build().await?;
            let user = engine.bootstrap_role(&args.email, role).await?;
            println!("{} is now {}", user.email, user.role.as_str());
        }
        Command::Group(Group {
            command: GroupCommand::List,
        }) => {
            let rows = groups::Entity::find()
                .order_by_asc(groups::Column::CreatedAt)
                .all(&db)
                .await?;
            if rows.is_empty() {
                println!("no groups");
            }
            for group in rows {
                println!(
                    "{}  {}  {}/month  max {}",
                    group.id,
                    group.name,
                    Tugrik::new(group.monthly_contribution),
                    group.max_members
                );
            }
        }
    }

    Ok(())
}
