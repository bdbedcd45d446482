//! Interactive command-line front end for the vaccine scheduler
//!
//! Thin glue over `scheduler-core`: tokenizes one command per line,
//! dispatches to the core API, and renders each result as one of the
//! fixed user-facing message strings. No booking logic lives here.

use anyhow::Result;
use chrono::NaiveDate;
use scheduler_core::{Config, Error, Role, Scheduler, Session};
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    // Default to warnings so log lines don't interleave with the
    // prompt; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let config = Config::from_env()?;
    let scheduler = Scheduler::open(config)?;
    let mut session = Session::new();

    print_menu();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&operation) = tokens.first() else {
            println!("Please try again!");
            continue;
        };

        match operation {
            "create_patient" => create_account(&scheduler, &tokens, Role::Patient).await,
            "create_caregiver" => create_account(&scheduler, &tokens, Role::Caregiver).await,
            "login_patient" => login(&scheduler, &mut session, &tokens, Role::Patient),
            "login_caregiver" => login(&scheduler, &mut session, &tokens, Role::Caregiver),
            "search_caregiver_schedule" => search_schedule(&scheduler, &session, &tokens),
            "reserve" => reserve(&scheduler, &session, &tokens).await,
            "upload_availability" => upload_availability(&scheduler, &session, &tokens).await,
            "add_doses" => add_doses(&scheduler, &session, &tokens).await,
            "show_appointments" => show_appointments(&scheduler, &session, &tokens),
            "logout" => logout(&mut session),
            "quit" => {
                println!("Bye!");
                break;
            }
            _ => println!("Invalid operation name!"),
        }
    }

    scheduler.shutdown().await?;
    Ok(())
}

fn print_menu() {
    println!();
    println!("Welcome to the COVID-19 Vaccine Reservation Scheduling Application!");
    println!("*** Please enter one of the following commands ***");
    println!("> create_patient <username> <password>");
    println!("> create_caregiver <username> <password>");
    println!("> login_patient <username> <password>");
    println!("> login_caregiver <username> <password>");
    println!("> search_caregiver_schedule <date>");
    println!("> reserve <date> <vaccine>");
    println!("> upload_availability <date>");
    println!("> add_doses <vaccine> <number>");
    println!("> show_appointments");
    println!("> logout");
    println!("> quit");
    println!();
}

fn parse_date(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
}

async fn create_account(scheduler: &Scheduler, tokens: &[&str], role: Role) {
    let failure = match role {
        Role::Patient => "Create patient failed",
        Role::Caregiver => "Failed to create user.",
    };
    if tokens.len() != 3 {
        println!("{failure}");
        return;
    }

    match scheduler.register(role, tokens[1], tokens[2]).await {
        Ok(account) => println!("Created user {}", account.username),
        Err(Error::UsernameTaken) => println!("Username taken, try again!"),
        Err(Error::WeakPassword(msg)) => println!("{msg}, try again!"),
        Err(_) => println!("{failure}"),
    }
}

fn login(scheduler: &Scheduler, session: &mut Session, tokens: &[&str], role: Role) {
    let (already, failure) = match role {
        Role::Patient => ("User already logged in, try again", "Login patient failed"),
        Role::Caregiver => ("User already logged in.", "Login failed."),
    };
    if session.identity().is_some() {
        println!("{already}");
        return;
    }
    if tokens.len() != 3 {
        println!("{failure}");
        return;
    }

    match scheduler.login(session, role, tokens[1], tokens[2]) {
        Ok(Some(account)) => match role {
            Role::Patient => println!("Logged in as {}", account.username),
            Role::Caregiver => println!("Logged in as: {}", account.username),
        },
        _ => println!("{failure}"),
    }
}

fn search_schedule(scheduler: &Scheduler, session: &Session, tokens: &[&str]) {
    if session.identity().is_none() {
        println!("Please login first");
        return;
    }
    if tokens.len() != 2 {
        println!("Please try again");
        return;
    }
    let Some(date) = parse_date(tokens[1]) else {
        println!("Please try again");
        return;
    };

    match scheduler.schedule_for(session, date) {
        Ok((caregivers, stocks)) => {
            for caregiver in caregivers {
                println!("{caregiver}");
            }
            for stock in stocks {
                println!("{} {}", stock.name, stock.available_doses);
            }
        }
        Err(_) => println!("Please try again"),
    }
}

async fn reserve(scheduler: &Scheduler, session: &Session, tokens: &[&str]) {
    match session.identity() {
        None => {
            println!("Please login first");
            return;
        }
        Some((Role::Caregiver, _)) => {
            println!("Please login as a patient");
            return;
        }
        Some((Role::Patient, _)) => {}
    }
    if tokens.len() != 3 {
        println!("Please try again");
        return;
    }
    let Some(date) = parse_date(tokens[1]) else {
        println!("Please try again");
        return;
    };

    match scheduler.reserve(session, date, tokens[2]).await {
        Ok(confirmation) => println!(
            "Appointment ID {}, Caregiver username {}",
            confirmation.appointment_id, confirmation.caregiver
        ),
        Err(Error::NoCaregiverAvailable) => println!("No caregiver is available"),
        Err(Error::InsufficientDoses) => println!("Not enough available doses"),
        Err(_) => println!("Please try again"),
    }
}

async fn upload_availability(scheduler: &Scheduler, session: &Session, tokens: &[&str]) {
    if session.require_role(Role::Caregiver).is_err() {
        println!("Please login as a caregiver first!");
        return;
    }
    if tokens.len() != 2 {
        println!("Please try again!");
        return;
    }
    let Some(date) = parse_date(tokens[1]) else {
        println!("Please enter a valid date!");
        return;
    };

    match scheduler.publish(session, date).await {
        Ok(()) => println!("Availability uploaded!"),
        Err(_) => println!("Error occurred when uploading availability"),
    }
}

async fn add_doses(scheduler: &Scheduler, session: &Session, tokens: &[&str]) {
    if session.require_role(Role::Caregiver).is_err() {
        println!("Please login as a caregiver first!");
        return;
    }
    if tokens.len() != 3 {
        println!("Please try again!");
        return;
    }
    let Ok(count) = tokens[2].parse::<u32>() else {
        println!("Please try again!");
        return;
    };

    match scheduler.restock(session, tokens[1], count).await {
        Ok(_) => println!("Doses updated!"),
        Err(_) => println!("Error occurred when adding doses"),
    }
}

fn show_appointments(scheduler: &Scheduler, session: &Session, tokens: &[&str]) {
    let Some((role, _)) = session.identity() else {
        println!("Please login first");
        return;
    };
    if tokens.len() != 1 {
        println!("Please try again");
        return;
    }

    match scheduler.appointments_for(session) {
        Ok(appointments) => {
            for appointment in appointments {
                // Each side sees the counterpart's name
                let other = match role {
                    Role::Caregiver => &appointment.patient,
                    Role::Patient => &appointment.caregiver,
                };
                println!(
                    "{} {} {} {}",
                    appointment.id, appointment.vaccine, appointment.date, other
                );
            }
        }
        Err(_) => println!("Please try again"),
    }
}

fn logout(session: &mut Session) {
    match session.logout() {
        Ok(()) => println!("Successfully logged out"),
        Err(_) => println!("Please login first"),
    }
}
