pub mod account;
pub mod daily;
pub mod report;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    app::Dasho,
    config::Config,
    utils::{
        clock::{today, Clock},
        logging::{enable_logging, LogSettings, CLI_PREFIX},
        percentage::Percentage,
        time::{parse_day, DateStyle},
    },
};

#[derive(Parser, Debug)]
#[command(name = "dasho", version, long_about = None)]
#[command(about = "Track daily habits and activities", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        env = "DASHO_DIR",
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Create an account and sign into it")]
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "", help = "Name to greet you with")]
        name: String,
    },
    #[command(about = "Sign into an existing account")]
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    #[command(about = "Forget the signed in account")]
    Signout {},
    #[command(about = "Show the signed in account")]
    Whoami {},
    #[command(about = "List the activities every day starts with")]
    Templates {},
    #[command(about = "Show activities of a day")]
    Log {
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(about = "Mark activities as done, or not done if they already are")]
    Toggle {
        #[arg(required = true, help = "Activity ids, see `dasho log`")]
        ids: Vec<String>,
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(about = "Set the amount done for an activity")]
    Set {
        id: String,
        value: f64,
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(about = "Attach notes to an activity")]
    Note {
        id: String,
        text: String,
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(about = "Show progress of today and of all time")]
    Summary {},
    #[command(about = "Show completion of every saved day")]
    History {
        #[arg(
            short = 'p',
            long = "min-percentage",
            help = "Only show days with at least this completion"
        )]
        min_percentage: Option<Percentage>,
    },
    #[command(about = "Rebuild the index of saved days from stored records")]
    Reindex {},
}

#[derive(Debug, Clone, clap::Args)]
pub struct DayArgs {
    #[arg(
        long,
        short,
        help = "Day to work with. Examples are \"2025-03-15\", \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

impl DayArgs {
    pub fn resolve(&self, clock: &dyn Clock) -> Result<NaiveDate> {
        match &self.date {
            Some(value) => parse_day(value, clock.time(), self.date_style),
            None => Ok(today(clock)),
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let config = Config::resolve(args.dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let logs_dir = config.logs_dir();
    enable_logging(&LogSettings {
        prefix: CLI_PREFIX,
        logs_dir: &logs_dir,
        level: logging_level,
        console: args.log,
    })?;

    let app = Dasho::open(&config).await?;

    match args.commands {
        Commands::Signup {
            email,
            password,
            name,
        } => account::sign_up(&app, &email, &password, &name).await,
        Commands::Signin { email, password } => account::sign_in(&app, &email, &password).await,
        Commands::Signout {} => account::sign_out(&app).await,
        Commands::Whoami {} => account::who_am_i(&app),
        Commands::Templates {} => {
            print!("{}", daily::render_templates());
            Ok(())
        }
        Commands::Log { day } => daily::show(&app, &day).await,
        Commands::Toggle { ids, day } => {
            daily::edit(&app, &day, |log| {
                for id in &ids {
                    log.toggle(id)?;
                }
                Ok(())
            })
            .await
        }
        Commands::Set { id, value, day } => {
            daily::edit(&app, &day, |log| Ok(log.set_value(&id, value)?)).await
        }
        Commands::Note { id, text, day } => {
            daily::edit(&app, &day, |log| Ok(log.set_notes(&id, text.as_str())?)).await
        }
        Commands::Summary {} => report::summary(&app).await,
        Commands::History { min_percentage } => report::history(&app, min_percentage).await,
        Commands::Reindex {} => report::reindex(&app).await,
    }
}
