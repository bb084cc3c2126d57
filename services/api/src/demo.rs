use crate::infra::{
    load_reimbursements, seed_staff, staff_member, LoggingMailingList, TracingNotifier,
};
use clap::Args;
use hackreg::config::{AppConfig, RegistrationConfig};
use hackreg::error::AppError;
use hackreg::workflows::registration::{
    ApplicationId, ApplicationSubmission, Diet, Edition, Gender, Hacker,
    InMemoryStore, PermissionTable, RegistrationService, ReimbursementLookup, StaffUser,
    TshirtSize,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional reimbursement CSV (`country,amount`) used for travel grants.
    #[arg(long)]
    pub(crate) reimbursement_csv: Option<PathBuf>,
    /// Print every notification that would have been mailed.
    #[arg(long)]
    pub(crate) show_mail: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReimbursementArgs {
    /// Country to look up
    pub(crate) country: String,
    /// Reimbursement CSV; falls back to REIMBURSEMENT_CSV
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) fn run_reimbursement_lookup(args: ReimbursementArgs) -> Result<(), AppError> {
    let path = match args.csv {
        Some(path) => Some(path),
        None => AppConfig::load()?.registration.reimbursement_csv,
    };
    let table = load_reimbursements(path.as_deref())?;
    println!(
        "{}: {} (table with {} rows)",
        args.country,
        table.lookup(&args.country),
        table.len()
    );
    Ok(())
}

struct DemoApplicant {
    name: &'static str,
    lastname: &'static str,
    country: &'static str,
    origin: &'static str,
    scholarship: bool,
    tech: u8,
    personal: u8,
}

const APPLICANTS: [DemoApplicant; 4] = [
    DemoApplicant {
        name: "Marta",
        lastname: "Puig",
        country: "Spain",
        origin: "Girona",
        scholarship: true,
        tech: 9,
        personal: 8,
    },
    DemoApplicant {
        name: "Joao",
        lastname: "Silva",
        country: "Portugal",
        origin: "Porto",
        scholarship: true,
        tech: 7,
        personal: 9,
    },
    DemoApplicant {
        name: "Chloe",
        lastname: "Martin",
        country: "France",
        origin: "Toulouse",
        scholarship: false,
        tech: 6,
        personal: 5,
    },
    DemoApplicant {
        name: "Sam",
        lastname: "Okafor",
        country: "Nigeria",
        origin: "Lagos",
        scholarship: true,
        tech: 4,
        personal: 6,
    },
];

fn demo_submission(applicant: &DemoApplicant) -> ApplicationSubmission {
    ApplicationSubmission {
        hacker: Hacker {
            name: applicant.name.to_string(),
            lastname: applicant.lastname.to_string(),
            email: format!("{}@example.com", applicant.name.to_lowercase()),
            country: applicant.country.to_string(),
            gender: Some(Gender::NonBinary),
            graduation_year: 2019,
            university: "Universitat Politecnica de Catalunya".to_string(),
            degree: "Computer Science".to_string(),
            github: None,
            devpost: None,
            linkedin: None,
            site: None,
            diet: Diet::None,
            tshirt_size: TshirtSize::M,
        },
        edition: Edition::Fall2017,
        description: "Looking forward to building something fun".to_string(),
        projects: "Side projects on GitHub".to_string(),
        scholarship: applicant.scholarship,
        travel_origin: applicant.origin.to_string(),
        under_age: Some(false),
        first_timer: Some(true),
        team: Some(false),
        teammates: None,
        authorized_mlh: Some(true),
    }
}

fn actor(table: &PermissionTable, id: &str) -> Result<StaffUser, AppError> {
    staff_member(table, id).ok_or_else(|| {
        AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("demo staff member '{id}' is not seeded"),
        ))
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        reimbursement_csv,
        show_mail,
    } = args;

    let config = RegistrationConfig {
        reimbursement_csv,
        ..RegistrationConfig::default()
    };
    let reimbursements = load_reimbursements(config.reimbursement_csv.as_deref())?;
    let staff = Arc::new(seed_staff());
    let notifier = Arc::new(TracingNotifier::default());
    let service = RegistrationService::new(
        Arc::new(InMemoryStore::default()),
        notifier.clone(),
        Arc::new(LoggingMailingList),
        staff.clone(),
        config,
    )
    .with_reimbursements(Arc::new(reimbursements));

    let organizer = actor(&staff, "organizer")?;
    let reviewer = actor(&staff, "reviewer")?;
    let volunteer = actor(&staff, "volunteer")?;

    println!("Hackathon registration demo");
    println!("\nSubmissions");
    let mut ids: Vec<ApplicationId> = Vec::new();
    for applicant in &APPLICANTS {
        let submitted = service.submit(demo_submission(applicant))?;
        let completed = service.complete(&submitted.id, &organizer)?;
        println!(
            "- {} ({}) -> {}",
            completed.hacker.full_name(),
            completed.id,
            completed.status
        );
        ids.push(completed.id);
    }

    println!("\nReview");
    for (id, applicant) in ids.iter().zip(APPLICANTS.iter()) {
        let vote =
            service.record_vote(id, &reviewer, Some(applicant.tech), Some(applicant.personal))?;
        println!(
            "- {} tech {} personal {}",
            id, applicant.tech, applicant.personal
        );
        if let Some(calculated) = vote.calculated_vote {
            println!("  standardized so far: {calculated:.3}");
        }
    }

    let ranking = service.ranking(&organizer)?;
    println!("\nRanking");
    for (position, entry) in ranking.iter().enumerate() {
        println!(
            "{}. {} ({}) score {:.3}",
            position + 1,
            entry.name,
            entry.application_id,
            entry.score
        );
    }

    println!("\nDecisions");
    let (accepted, declined) = ranking.split_at(ranking.len().min(3));
    for entry in accepted {
        let invited = service.invite(&entry.application_id, &organizer)?;
        println!("- {} -> {}", invited.hacker.full_name(), invited.status);
        if invited.scholarship {
            let reimbursed = service.send_reimbursement(&invited.id, &organizer)?;
            println!(
                "  travel grant from {}: {}",
                reimbursed.hacker.country,
                reimbursed.reimbursement_money.unwrap_or_default()
            );
        }
    }
    for entry in declined {
        let rejected = service.reject(&entry.application_id, &organizer)?;
        println!("- {} -> {}", rejected.hacker.full_name(), rejected.status);
    }

    println!("\nApplicant responses");
    for (index, entry) in accepted.iter().enumerate() {
        let updated = match index {
            0 => service.confirm(&entry.application_id)?,
            1 => {
                service.confirm(&entry.application_id)?;
                service.cancel(&entry.application_id)?
            }
            _ => {
                service.send_last_reminder(&entry.application_id, &organizer)?;
                service.expire(&entry.application_id, &organizer)?
            }
        };
        println!("- {} -> {}", updated.hacker.full_name(), updated.status);
        if let Err(err) = service.confirm(&entry.application_id) {
            println!("  confirm again: {err}");
        }
    }

    println!("\nCheck-in");
    for application in service.pending_check_in()? {
        let attended = service.check_in(&application.id, &volunteer)?;
        let records = service.check_ins(&attended.id)?;
        println!(
            "- {} -> {} ({} check-in record)",
            attended.hacker.full_name(),
            attended.status,
            records.len()
        );
    }
    println!("Still not checked in: {}", service.not_checked_in()?.len());

    let sent = notifier.sent();
    println!("\nNotifications sent: {}", sent.len());
    if show_mail {
        for mail in sent {
            println!("- {} -> {}", mail.subject, mail.recipients.join(", "));
        }
    }

    Ok(())
}
