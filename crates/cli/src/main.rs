mod client;
mod session;

use anyhow::Context;
use api_shared::{
    AddReviewReq, BookAppointmentReq, SavePredictionReq, ScheduleCallReq, SignupReq,
    UpdateProfileReq,
};
use clap::{Parser, Subcommand};
use client::{ApiClient, DEFAULT_API_URL};
use session::{default_session_path, ensure_role, SessionStore};
use skinhub_core::config::iterations_from_env_value;
use skinhub_core::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_PASSWORD_HASH_ITERATIONS, DEFAULT_PUBLIC_DIR,
};
use skinhub_core::seed::read_seed_file;
use skinhub_core::{AppointmentStatus, CoreConfig, Role, SeedService};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "skinhub")]
#[command(about = "SkinHub telehealth client")]
struct Cli {
    /// Base URL of the SkinHub REST API
    #[arg(long, env = "SKINHUB_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,
    /// Session file (defaults to the user config directory)
    #[arg(long, global = true)]
    session: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Full name
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        /// user, doctor or admin
        #[arg(long, default_value = "user")]
        role: String,
    },
    /// Log in and remember the account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored account
    Logout,
    /// Show the stored account
    Whoami,
    /// List doctors with their ratings
    Doctors,
    /// List reviews of a doctor
    Reviews {
        doctor_id: i64,
    },
    /// Book an appointment (patients)
    Book {
        #[arg(long)]
        doctor: i64,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List your appointments
    Appointments,
    /// Confirm an appointment (doctors)
    Accept {
        appointment_id: i64,
    },
    /// Reject an appointment (doctors)
    Reject {
        appointment_id: i64,
    },
    /// Cancel an appointment (patients)
    Cancel {
        appointment_id: i64,
    },
    /// Appointments waiting for your review (patients)
    PendingReviews,
    /// Review a past appointment (patients)
    Review {
        #[arg(long)]
        appointment: i64,
        #[arg(long)]
        doctor: i64,
        /// 1 to 5
        #[arg(long)]
        rating: i64,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Upload, analyse and save a skin image (patients)
    Predict {
        image: PathBuf,
    },
    /// Prediction history; doctors may look up a patient
    History {
        #[arg(long)]
        patient: Option<i64>,
    },
    /// Regional case counts for a disease
    Heatmap {
        /// Defaults to Acne
        #[arg(long)]
        disease: Option<String>,
        /// List the diseases instead
        #[arg(long)]
        list: bool,
    },
    /// Request a reminder call
    Call {
        /// E.164 number, e.g. +14155552671
        #[arg(long)]
        phone: String,
        /// YYYY-MM-DD HH:MM:SS; defaults to now
        #[arg(long)]
        at: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
    /// List your reminder calls
    Calls,
    /// Show your profile
    Profile,
    /// Update your profile
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Doctors only
        #[arg(long)]
        specialization: Option<String>,
        /// Doctors only
        #[arg(long)]
        experience: Option<i64>,
        /// Doctors only
        #[arg(long)]
        bio: Option<String>,
    },
    /// Direct store administration
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create the database and apply migrations
    InitDb,
    /// Insert verified doctors from a YAML file, skipping known emails
    SeedDoctors {
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sessions = SessionStore::new(cli.session.unwrap_or_else(default_session_path));

    let Some(command) = cli.command else {
        println!("No command given. Run `skinhub --help` for usage.");
        return Ok(());
    };

    if let Commands::Admin { command } = command {
        return run_admin(command);
    }

    let api = ApiClient::new(&cli.api_url)?;
    run(command, &api, &sessions)
}

fn run(command: Commands, api: &ApiClient, sessions: &SessionStore) -> anyhow::Result<()> {
    match command {
        Commands::Signup {
            email,
            password,
            name,
            phone,
            role,
        } => {
            let created = api.signup(&SignupReq {
                email: Some(email),
                password: Some(password),
                name: Some(name),
                phone,
                role: Some(role),
            })?;
            println!("{} Account id: {}", created.message, created.id);
        }
        Commands::Login { email, password } => {
            let res = api.login(&email, &password)?;
            sessions.save(&res.user)?;
            println!(
                "{} Welcome, {} ({}).",
                res.message, res.user.name, res.user.role
            );
        }
        Commands::Logout => {
            if sessions.clear()? {
                println!("Logged out.");
            } else {
                println!("Not logged in.");
            }
        }
        Commands::Whoami => match sessions.load()? {
            Some(user) => println!(
                "ID: {}, Name: {}, Email: {}, Role: {}",
                user.id, user.name, user.email, user.role
            ),
            None => println!("Not logged in (session file: {}).", sessions.path().display()),
        },
        Commands::Doctors => {
            let doctors = api.doctors()?;
            if doctors.is_empty() {
                println!("No doctors found.");
            }
            for d in doctors {
                let rating = match d.average_rating {
                    Some(avg) => format!("{avg:.1}/5 ({} reviews)", d.review_count),
                    None => "no reviews".to_owned(),
                };
                println!(
                    "ID: {}, Name: {}{}, Specialization: {}, Experience: {}, Rating: {}",
                    d.id,
                    d.full_name,
                    if d.verified { " [verified]" } else { "" },
                    d.specialization.as_deref().unwrap_or("-"),
                    d.experience_years
                        .map(|y| format!("{y} years"))
                        .unwrap_or_else(|| "-".into()),
                    rating
                );
            }
        }
        Commands::Reviews { doctor_id } => {
            let reviews = api.reviews(doctor_id)?;
            if reviews.is_empty() {
                println!("No reviews yet.");
            }
            for r in reviews {
                println!(
                    "{}/5 by {} on {}: {}",
                    r.rating,
                    r.patient_name,
                    r.appointment_date.as_deref().unwrap_or(&r.created_at),
                    r.comment
                );
            }
        }
        Commands::Book {
            doctor,
            date,
            time,
            notes,
        } => {
            let user = sessions.require_role(Role::User)?;
            let created = api.book(&BookAppointmentReq {
                user_id: Some(user.id.into()),
                doctor_id: Some(doctor.into()),
                date: Some(date),
                time: Some(time),
                notes,
            })?;
            println!("{} Appointment id: {}", created.message, created.id);
        }
        Commands::Appointments => {
            let user = sessions.require()?;
            let as_doctor = user.role == Role::Doctor;
            let appointments = api.appointments(user.id, as_doctor)?;
            if appointments.is_empty() {
                println!("No appointments found.");
            }
            for a in appointments {
                let other = if as_doctor {
                    format!("Patient: {}", a.patient_name.unwrap_or_default())
                } else {
                    format!("Doctor: {}", a.doctor_name.unwrap_or_default())
                };
                println!(
                    "ID: {}, {} {}, {}, Status: {}{}",
                    a.id,
                    a.appointment_date,
                    a.appointment_time,
                    other,
                    a.status,
                    if a.notes.is_empty() {
                        String::new()
                    } else {
                        format!(", Notes: {}", a.notes)
                    }
                );
            }
        }
        Commands::Accept { appointment_id } => {
            sessions.require_role(Role::Doctor)?;
            let res = api.update_status(appointment_id, AppointmentStatus::Confirmed.as_str())?;
            println!("{}", res.message);
        }
        Commands::Reject { appointment_id } => {
            sessions.require_role(Role::Doctor)?;
            let res = api.update_status(appointment_id, AppointmentStatus::Rejected.as_str())?;
            println!("{}", res.message);
        }
        Commands::Cancel { appointment_id } => {
            // Cancellation is recorded as a rejection.
            sessions.require_role(Role::User)?;
            let res = api.update_status(appointment_id, AppointmentStatus::Rejected.as_str())?;
            println!("{}", res.message);
        }
        Commands::PendingReviews => {
            let user = sessions.require_role(Role::User)?;
            let pending = api.pending_reviews(user.id)?;
            if pending.is_empty() {
                println!("Nothing to review.");
            }
            for p in pending {
                println!(
                    "Appointment {}: {} {} with {} (doctor id {})",
                    p.id, p.appointment_date, p.appointment_time, p.doctor_name, p.doctor_id
                );
            }
        }
        Commands::Review {
            appointment,
            doctor,
            rating,
            comment,
        } => {
            let user = sessions.require_role(Role::User)?;
            let created = api.add_review(&AddReviewReq {
                appointment_id: Some(appointment.into()),
                doctor_id: Some(doctor.into()),
                user_id: Some(user.id.into()),
                rating: Some(rating.into()),
                comment,
            })?;
            println!("{}", created.message);
        }
        Commands::Predict { image } => {
            let user = sessions.require_role(Role::User)?;
            let uploaded = api.upload(&image)?;
            let analysis = api.analyze(&image)?;
            let saved = api.save_prediction(&SavePredictionReq {
                user_id: Some(user.id.into()),
                image_path: Some(uploaded.image_path.clone()),
                prediction_result: Some(analysis.predicted_class.clone()),
                confidence_score: Some(percent_to_fraction(analysis.confidence)),
            })?;
            println!(
                "Prediction: {} ({:.1}% confidence). Saved as #{} with image {}.",
                analysis.predicted_class, analysis.confidence, saved.id, uploaded.image_path
            );
        }
        Commands::History { patient } => {
            let user = sessions.require()?;
            let subject = match patient {
                Some(id) if id != user.id => {
                    ensure_role(&user, Role::Doctor)?;
                    id
                }
                _ => user.id,
            };
            let history = api.history(subject)?;
            if history.is_empty() {
                println!("No predictions found.");
            }
            for p in history {
                println!(
                    "#{} {}: {} ({:.1}%), image {}",
                    p.id,
                    p.created_at,
                    p.prediction_result,
                    p.confidence_score * 100.0,
                    p.image_path
                );
            }
        }
        Commands::Heatmap { disease, list } => {
            if list {
                for d in api.heatmap_diseases()? {
                    println!("{d}");
                }
            } else {
                let stats = api.heatmap_stats(disease.as_deref())?;
                println!(
                    "{}: {} cases across {} states",
                    stats.disease, stats.total, stats.states_count
                );
                for s in stats.data {
                    println!("  {:<20} {}", s.state, s.cases);
                }
            }
        }
        Commands::Call { phone, at, message } => {
            let user = sessions.require()?;
            let res = api.schedule_call(&ScheduleCallReq {
                user_id: Some(user.id.into()),
                phone: Some(phone),
                scheduled_at: at,
                message,
            })?;
            println!("{} Reference: {} ({})", res.message, res.call_sid, res.call_status);
            if let Some(warning) = res.database_warning {
                eprintln!("Warning: {warning}");
            }
        }
        Commands::Calls => {
            let user = sessions.require()?;
            let calls = api.calls(user.id)?;
            if calls.is_empty() {
                println!("No calls found.");
            }
            for c in calls {
                println!(
                    "#{} {} to {}: {} ({})",
                    c.id, c.scheduled_at, c.phone_number, c.status, c.call_sid
                );
            }
        }
        Commands::Profile => {
            let user = sessions.require()?;
            let p = api.profile(user.id)?;
            println!("ID: {}", p.id);
            println!("Name: {}", p.full_name);
            println!("Email: {}", p.email);
            println!("Phone: {}", p.phone.as_deref().unwrap_or("-"));
            println!("Role: {}", p.role);
            println!("Member since: {}", p.created_at);
            if p.role == Role::Doctor {
                println!("Specialization: {}", p.specialization.as_deref().unwrap_or("-"));
                println!(
                    "Experience: {}",
                    p.experience_years
                        .map(|y| format!("{y} years"))
                        .unwrap_or_else(|| "-".into())
                );
                println!("Bio: {}", p.bio.as_deref().unwrap_or("-"));
                println!("Verified: {}", p.is_verified.unwrap_or(false));
            }
        }
        Commands::UpdateProfile {
            name,
            phone,
            specialization,
            experience,
            bio,
        } => {
            let user = sessions.require()?;
            let doctor_fields = specialization.is_some() || experience.is_some() || bio.is_some();
            if doctor_fields {
                ensure_role(&user, Role::Doctor)?;
            }
            // The server treats a present `specialization` as a doctor profile update.
            let specialization = match (doctor_fields, specialization) {
                (true, None) => Some(api.profile(user.id)?.specialization.unwrap_or_default()),
                (_, s) => s,
            };
            let res = api.update_profile(&UpdateProfileReq {
                user_id: Some(user.id.into()),
                full_name: name,
                phone,
                specialization,
                experience_years: experience.map(Into::into),
                bio,
            })?;
            println!("{}", res.message);
        }
        Commands::Admin { .. } => unreachable!("admin commands are dispatched before the client"),
    }
    Ok(())
}

fn run_admin(command: AdminCommands) -> anyhow::Result<()> {
    let cfg = Arc::new(core_config_from_env()?);
    match command {
        AdminCommands::InitDb => {
            cfg.open_db()?;
            println!(
                "Database ready at {}",
                cfg.database_path().display()
            );
        }
        AdminCommands::SeedDoctors { file } => {
            let doctors = read_seed_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            let report = SeedService::new(cfg).seed_doctors(&doctors)?;
            println!(
                "Seeded {} doctors ({} already present).",
                report.inserted, report.skipped
            );
        }
    }
    Ok(())
}

/// Store settings, read from the same variables as the server.
fn core_config_from_env() -> anyhow::Result<CoreConfig> {
    let database_path = std::env::var("SKINHUB_DATABASE_PATH")
        .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.into());
    let public_dir =
        std::env::var("SKINHUB_PUBLIC_DIR").unwrap_or_else(|_| DEFAULT_PUBLIC_DIR.into());
    let iterations = iterations_from_env_value(
        std::env::var("SKINHUB_PASSWORD_HASH_ITERATIONS").ok(),
        DEFAULT_PASSWORD_HASH_ITERATIONS,
    )?;
    Ok(CoreConfig::new(
        PathBuf::from(database_path),
        PathBuf::from(public_dir),
        iterations,
    )?)
}

/// The classifier reports a percentage; stored predictions use a fraction.
fn percent_to_fraction(confidence: f64) -> f64 {
    (confidence / 100.0).clamp(0.0, 1.0)
}
