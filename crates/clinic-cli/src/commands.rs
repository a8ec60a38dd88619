//! Command parsing and handlers.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use clinic_core::api::resources::DEFAULT_PAGE_SIZE;
use clinic_core::models::{ArticleKind, DutySchedule, SecurityAnswer};
use clinic_core::utils::{truncate_string, weekday};
use clinic_core::{Clinic, Config};
use serde::Serialize;
use tracing::{debug, warn};

use crate::prompt;

/// Width of truncated introductions in list output
const SUMMARY_WIDTH: usize = 60;

#[derive(Parser)]
#[command(name = "clinic-admin")]
#[command(about = "Campus clinic administration")]
#[command(version)]
#[command(after_help = "Set RUST_LOG=debug for verbose logging.")]
pub struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in (password is prompted)
    Login {
        /// Defaults to the last username used
        username: Option<String>,
    },

    /// Log out and forget stored tokens
    Logout,

    /// Show configuration and session state
    Status,

    /// Change the logged-in user's password
    ChangePassword,

    /// List a user's security questions
    SecurityQuestions { username: String },

    /// Reset a password by answering a security question
    ResetPassword { username: String },

    /// Register security questions for the logged-in user
    SetSecurityQuestions,

    /// List departments
    Departments,

    /// Show one department
    Department { id: i64 },

    /// Show a department's duty roster
    Duty {
        #[arg(value_name = "DEPARTMENT_ID")]
        department: i64,
    },

    /// List doctors
    Doctors {
        #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Show one doctor
    Doctor { id: i64 },

    /// Upload a doctor's avatar image
    UploadAvatar {
        #[arg(value_name = "DOCTOR_ID")]
        doctor: i64,
        file: PathBuf,
    },

    /// List articles (announcement, news, guide, science)
    Articles {
        kind: ArticleKind,
        #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Delete an article
    DeleteArticle { kind: ArticleKind, id: i64 },

    /// Show a department's weekly work days
    DefaultSchedules {
        #[arg(value_name = "DEPARTMENT_ID")]
        department: i64,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn execute(clinic: &Clinic, config: &mut Config, cli: Cli) -> Result<()> {
    let json = cli.json;
    debug!(json, "Executing command");

    match cli.command {
        Commands::Login { username } => login(clinic, config, username).await,
        Commands::Logout => {
            // Local tokens are gone either way
            if let Err(e) = clinic.session.logout().await {
                warn!(error = %e, "Backend did not confirm logout");
                eprintln!("Warning: {}", e);
            }
            println!("Logged out.");
            Ok(())
        }
        Commands::Status => status(clinic, config, json),
        Commands::ChangePassword => {
            let old = prompt::password("Current password")?;
            let new = prompt::new_password()?;
            let reply = clinic.session.change_password(&old, &new).await?;
            println!("{}", reply.message_or("Password changed."));
            Ok(())
        }
        Commands::SecurityQuestions { username } => {
            let questions = clinic.session.security_questions(&username).await?;
            if json {
                return print_json(&questions);
            }
            for q in &questions {
                println!("{:>4}  {}", q.id, q.question);
            }
            Ok(())
        }
        Commands::ResetPassword { username } => reset_password(clinic, &username).await,
        Commands::SetSecurityQuestions => set_security_questions(clinic).await,
        Commands::Departments => {
            let departments = clinic.api.departments().await?;
            if json {
                return print_json(&departments);
            }
            for d in &departments {
                println!(
                    "{:>4}  {:<24} {:>2} doctors  {}",
                    d.id,
                    d.name,
                    d.doctor_count(),
                    truncate_string(&d.introduction, SUMMARY_WIDTH)
                );
            }
            Ok(())
        }
        Commands::Department { id } => {
            let department = clinic.api.department(id).await?;
            if json {
                return print_json(&department);
            }
            println!("{} (#{})", department.name, department.id);
            if !department.introduction.is_empty() {
                println!("{}", department.introduction);
            }
            println!();
            for doctor in &department.doctors {
                println!("{:>4}  {:<16} {}", doctor.id, doctor.name, doctor.title);
            }
            Ok(())
        }
        Commands::Duty { department } => {
            let roster = clinic.api.department_duty(department).await?;
            if json {
                return print_json(&roster);
            }
            print_roster(&roster, Local::now().date_naive());
            Ok(())
        }
        Commands::Doctors { page } => {
            let doctors = clinic.api.doctors(DEFAULT_PAGE_SIZE, page).await?;
            if json {
                return print_json(&doctors);
            }
            for d in &doctors.doctor_list {
                println!(
                    "{:>4}  {:<16} {:<20} {}",
                    d.id,
                    d.name,
                    d.title_display(),
                    truncate_string(d.introduction_display(), SUMMARY_WIDTH)
                );
            }
            if let Some(total) = doctors.total {
                let pages = total.div_ceil(u64::from(DEFAULT_PAGE_SIZE)).max(1);
                println!("\nPage {} of {} ({} doctors)", page, pages, total);
            }
            Ok(())
        }
        Commands::Doctor { id } => {
            let doctor = clinic.api.doctor(id).await?;
            if json {
                return print_json(&doctor);
            }
            println!("{} (#{})", doctor.name, doctor.id);
            println!("Title:  {}", doctor.title_display());
            if let Some(department) = doctor.department {
                println!("Dept:   {}", department);
            }
            let avatar = doctor.avatar_full_url(clinic.api.media_base_url());
            if !avatar.is_empty() {
                println!("Avatar: {}", avatar);
            }
            println!("\n{}", doctor.introduction_display());
            Ok(())
        }
        Commands::UploadAvatar { doctor, file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("Invalid file name: {}", file.display()))?;
            let image = clinic
                .api
                .upload_doctor_avatar(doctor, file_name, bytes)
                .await?;
            if json {
                return print_json(&image);
            }
            println!("Uploaded: {}", image.full_url);
            Ok(())
        }
        Commands::Articles { kind, page } => {
            let articles = clinic.api.articles(kind, DEFAULT_PAGE_SIZE, page).await?;
            if json {
                return print_json(&articles);
            }
            println!("{}", kind.display_name());
            for a in &articles.articles {
                let published = a
                    .published_at
                    .map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!("{:>4}  {:<10}  {}", a.id, published, a.title);
            }
            Ok(())
        }
        Commands::DeleteArticle { kind, id } => {
            clinic.api.delete_article(kind, id).await?;
            println!("Deleted {} article {}.", kind.display_name(), id);
            Ok(())
        }
        Commands::DefaultSchedules { department } => {
            let rules = clinic.api.default_schedules(department).await?;
            if json {
                return print_json(&rules);
            }
            if rules.is_empty() {
                println!("No weekly schedule for department {}.", department);
            }
            for rule in &rules {
                println!("{}", weekday::mask_display(&rule.work_day_mask()));
            }
            Ok(())
        }
    }
}

async fn login(clinic: &Clinic, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(name) => name,
        None => prompt::line_or("Username", config.last_username.as_deref())?,
    };
    if username.is_empty() {
        bail!("Username is required");
    }
    let password = prompt::password("Password")?;

    let reply = clinic.session.login(&username, &password).await?;
    println!("{}", reply.message_or("Logged in."));

    if config.last_username.as_deref() != Some(username.as_str()) {
        config.last_username = Some(username);
        if let Err(e) = config.save() {
            warn!(error = %e, "Failed to remember username");
        }
    }
    Ok(())
}

fn status(clinic: &Clinic, config: &Config, json: bool) -> Result<()> {
    let logged_in = clinic.session.is_authenticated();
    if json {
        return print_json(&serde_json::json!({
            "api_base_url": config.api_base_url,
            "media_base_url": config.media_base_url,
            "token_backend": config.token_backend,
            "last_username": config.last_username,
            "logged_in": logged_in,
        }));
    }
    println!("API:        {}", config.api_base_url);
    println!("Media:      {}", config.media_base_url);
    println!("Tokens:     {:?}", config.token_backend);
    if let Some(username) = &config.last_username {
        println!("Last user:  {}", username);
    }
    println!("Logged in:  {}", if logged_in { "yes" } else { "no" });
    Ok(())
}

async fn reset_password(clinic: &Clinic, username: &str) -> Result<()> {
    let questions = clinic.session.security_questions(username).await?;
    for q in &questions {
        println!("{:>4}  {}", q.id, q.question);
    }

    let default_id = questions.first().map(|q| q.id.to_string());
    let chosen = prompt::line_or("Question id", default_id.as_deref())?;
    let question_id: i64 = chosen.parse().context("Invalid question id")?;
    if !questions.iter().any(|q| q.id == question_id) {
        bail!("Question {} is not one of this user's questions", question_id);
    }

    let answer = prompt::line("Answer: ")?;
    let new_password = prompt::new_password()?;
    let reply = clinic
        .session
        .reset_password(username, question_id, &answer, &new_password)
        .await?;
    println!("{}", reply.message_or("Password reset, you can log in now."));
    Ok(())
}

async fn set_security_questions(clinic: &Clinic) -> Result<()> {
    println!("Enter questions and answers. Leave the question empty to finish.");
    let mut answers = Vec::new();
    loop {
        let question = prompt::line("Question: ")?;
        if question.is_empty() {
            break;
        }
        let answer = prompt::line("Answer: ")?;
        answers.push(SecurityAnswer::new(question, answer));
    }

    let reply = clinic.session.set_security_questions(&answers).await?;
    println!("{}", reply.message_or("Security questions saved."));
    Ok(())
}

fn print_roster(roster: &[DutySchedule], today: NaiveDate) {
    if roster.is_empty() {
        println!("No duty scheduled.");
        return;
    }
    for day in roster {
        let marker = if day.date == today { "*" } else { " " };
        let doctors: Vec<&str> = day.doctors.iter().map(|d| d.name.as_str()).collect();
        println!(
            "{}{}  {}  {}",
            marker,
            day.date.format("%a %Y-%m-%d"),
            day.hours_display(),
            doctors.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("clinic-admin").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_commands() {
        let cli = parse(&["login"]).unwrap();
        assert!(matches!(cli.command, Commands::Login { username: None }));

        let cli = parse(&["doctors", "3", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Doctors { page: 3 }));

        let cli = parse(&["articles", "news"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Articles { kind: ArticleKind::News, page: 1 }
        ));

        let cli = parse(&["delete-article", "kepu", "8"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::DeleteArticle { kind: ArticleKind::Science, id: 8 }
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["department"]).is_err());
        assert!(parse(&["doctor", "abc"]).is_err());
        assert!(parse(&["doctors", "0"]).is_err());
        assert!(parse(&["articles", "blog"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
    }
}
