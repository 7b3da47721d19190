mod cli;
mod config;
mod db;
mod error;
mod models;

use clap::Parser;
use cli::{
    prompt_email, prompt_filter, prompt_limit, prompt_new_property, prompt_new_user,
    prompt_user_id, App, Cli, Commands, SeedArgs, UserLookup,
};
use colored::*;
use config::Config;
use dialoguer::{theme::ColorfulTheme, Select};
use error::Result;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sets up stdout logging plus an optional daily log file.
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let stdout = if config.log_json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let (file, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lightbnb.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(stdout)
        .with(file)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let _guard = init_tracing(&config);

    info!("Starting LightBnB CLI...");

    let app = match App::new(config).await {
        Ok(app) => {
            info!("Application initialized successfully.");
            app
        },
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            println!(
                "{}",
                "Error: Failed to connect to the database. Check DATABASE_URL and logs.".red()
            );
            return Err(e);
        },
    };

    if let Some(command) = cli.command {
        return app.run_command(command).await;
    }

    println!("{}", "Welcome to the LightBnB CLI!".cyan().bold());

    // Main interactive loop
    loop {
        let options = &[
            "Initialize Database Schema",
            "Seed Fixture Data",
            "Search Properties",
            "Find User by Email",
            "Find User by Id",
            "Register User",
            "Show Reservations for Guest",
            "List New Property",
            "Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(options)
            .default(0)
            .interact_opt()?
            .unwrap_or(options.len() - 1); // Esc / Ctrl+C exits

        println!("\n---\n");

        let command_result = match selection {
            0 => app.run_command(Commands::InitDb).await,
            1 => app.run_command(Commands::Seed(SeedArgs::default())).await,
            2 => match prompt_filter().and_then(|f| Ok((f, prompt_limit(app.default_limit())?))) {
                Ok((filter, limit)) => app.search(&filter, limit).await,
                Err(e) => Err(e),
            },
            3 => match prompt_email() {
                Ok(email) => app.show_user(UserLookup::Email(email)).await,
                Err(e) => Err(e),
            },
            4 => match prompt_user_id() {
                Ok(id) => app.show_user(UserLookup::Id(id)).await,
                Err(e) => Err(e),
            },
            5 => match prompt_new_user() {
                Ok(user) => app.add_user(user).await,
                Err(e) => Err(e),
            },
            6 => match prompt_user_id().and_then(|id| Ok((id, prompt_limit(app.default_limit())?))) {
                Ok((guest_id, limit)) => app.show_reservations(guest_id, limit).await,
                Err(e) => Err(e),
            },
            7 => match prompt_new_property() {
                Ok(property) => app.add_property(property).await,
                Err(e) => Err(e),
            },
            8 => {
                println!("{}", "Goodbye!".green());
                break;
            },
            _ => unreachable!(),
        };

        if let Err(e) = command_result {
            error!("Command execution failed: {:?}", e);
            println!("{} {}", "Error:".red(), e.to_string().red());
        }

        println!("\n---\n");
    }

    Ok(())
}
